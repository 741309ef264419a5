use crate::error::FetchError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

/// Retrieves the raw body of a threat-intel feed.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Fetches feeds over HTTP(S) with a hard per-request timeout. No retries:
/// a timeout is a terminal failure for the run.
///
/// The timeout is set on every request, so it holds even when the tuned
/// client cannot be built and a plain one is used.
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("hulud-detect/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to build HTTP client, using defaults");
                reqwest::Client::new()
            });
        Self { client, timeout }
    }
}

fn request_error(url: &str, source: reqwest::Error) -> FetchError {
    if source.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            source,
        }
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| request_error(url, e))?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        response.text().await.map_err(|e| request_error(url, e))
    }
}
