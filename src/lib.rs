pub mod cache;
pub mod checker;
pub mod config;
pub mod engine;
pub mod error;
pub mod intel;
pub mod model;
pub mod output;
pub mod platform;
pub mod scanner;

pub use cache::FeedCache;
pub use config::Config;
pub use engine::{Engine, ScanOptions};
pub use error::{FeedError, FetchError, ScanError};
pub use model::{Finding, FindingType, Platform, ScanReport, ScanRoot, Severity};
pub use scanner::Scanner;
