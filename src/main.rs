use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hulud_detect::{
    cache::FeedCache,
    config::Config,
    engine::{Engine, ScanOptions},
    error::ScanError,
    model::ScanReport,
    output::{format_report_to_string, print_report, upload_report, OutputFormat},
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Exit codes for CI integration
mod exit_codes {
    pub const SUCCESS: u8 = 0;
    pub const ERROR: u8 = 1;
}

#[derive(Parser)]
#[command(name = "hulud-detect")]
#[command(
    author,
    version,
    about = "Detect Shai-Hulud compromised npm packages in projects, caches and Node installs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a project (and optionally package caches) for compromised packages
    Scan {
        /// Project directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Also scan npm/Yarn/pnpm caches and every nvm-installed Node version
        #[arg(long)]
        full_scan: bool,

        /// Ignore cached threat intel and fetch fresh feeds
        #[arg(long)]
        no_cache: bool,

        /// Do not upload the report even if an upload URL is configured
        #[arg(long)]
        no_upload: bool,

        /// Output format (table, csv, json)
        #[arg(short, long)]
        format: Option<String>,

        /// Write output to file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Log progress to stderr
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show or create config file
    Config {
        /// Generate default config file
        #[arg(long)]
        init: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Delete cached threat-intel feeds
    ClearCache,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Scan { verbose: true, .. });
    init_logging(verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_codes::ERROR)
        }
    }
}

/// Logs go to stderr so CSV and JSON on stdout stay machine-readable.
fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<u8> {
    let config = Config::load()?;

    match cli.command {
        Commands::Scan {
            path,
            full_scan,
            no_cache,
            no_upload,
            format,
            output,
            verbose: _,
        } => {
            let format_str = format.unwrap_or_else(|| config.default_format.clone());
            let format = OutputFormat::from_str(&format_str).map_err(|e| anyhow::anyhow!(e))?;
            let options = ScanOptions {
                project: path,
                full_scan: full_scan || config.full_scan,
                no_cache,
            };

            run_scan(&config, &options, format, output, !no_upload).await
        }
        Commands::Config { init, path } => {
            handle_config(init, path)?;
            Ok(exit_codes::SUCCESS)
        }
        Commands::ClearCache => {
            let cache = FeedCache::new();
            cache.clear()?;
            println!("Cache cleared: {}", cache.dir().display());
            Ok(exit_codes::SUCCESS)
        }
    }
}

async fn run_scan(
    config: &Config,
    options: &ScanOptions,
    format: OutputFormat,
    output_file: Option<PathBuf>,
    upload: bool,
) -> Result<u8> {
    let is_interactive = format == OutputFormat::Table && output_file.is_none();

    let progress = if is_interactive {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(if options.full_scan {
            "Scanning project, package caches and Node installs..."
        } else {
            "Scanning project..."
        });
        Some(pb)
    } else {
        None
    };

    let mut engine = Engine::from_config(config, options);
    let result = engine.run(options).await;

    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    let report = match result {
        Ok(report) => report,
        Err(e @ ScanError::NoScanRoot { .. }) => {
            eprintln!("Error: {}", e);
            return Ok(exit_codes::ERROR);
        }
    };

    // Handle output
    if let Some(path) = output_file {
        let rendered = format_report_to_string(&report, format)?;
        std::fs::write(&path, rendered)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        eprintln!("Results written to: {}", path.display());
    } else {
        print_report(&report, format)?;
    }

    if upload {
        maybe_upload(config, &report).await;
    }

    Ok(exit_codes::SUCCESS)
}

async fn maybe_upload(config: &Config, report: &ScanReport) {
    let Some(url) = config.upload_url.as_deref().filter(|u| !u.trim().is_empty()) else {
        debug!("no upload URL configured");
        return;
    };

    if let Err(e) = upload_report(url, report, config.fetch_timeout()).await {
        warn!(error = %format!("{:#}", e), "report upload failed");
    }
}

fn handle_config(init: bool, show_path: bool) -> Result<()> {
    let config_path = Config::config_path();

    if show_path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config file already exists at: {}", config_path.display());
            return Ok(());
        }

        let config = Config::default();
        config.save()?;
        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Default configuration:");
        println!("{}", Config::generate_default_config());
        return Ok(());
    }

    // Show current config
    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        println!("Config file: {}", config_path.display());
        println!();
        println!("{}", content);
    } else {
        println!("No config file found.");
        println!("Run 'hulud-detect config --init' to create one.");
        println!();
        println!("Config path: {}", config_path.display());
    }

    Ok(())
}
