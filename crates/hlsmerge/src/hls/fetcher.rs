// HLS Fetcher: raw HTTP downloads of playlists, keys and segments with a retry budget.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, warn};

use crate::hls::config::HlsFetcherConfig;
use crate::hls::error::FetchError;

/// Fetches the full body behind a URI, retrying internally.
#[async_trait]
pub trait ByteFetcher: Send + Sync {
    async fn get(&self, uri: &str) -> Result<Bytes, FetchError>;
}

/// Attempt budget for one request. `max_attempts` counts the first try.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay_base: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay_base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay_base,
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        // attempt is 1-based; doubling stops growing after 16 failures
        let exponent = attempt.saturating_sub(1).min(16);
        self.delay_base.saturating_mul(2_u32.pow(exponent))
    }

    /// Runs `attempt` until it succeeds or the budget is spent.
    pub async fn run<T, F, Fut>(&self, uri: &str, mut attempt: F) -> Result<T, FetchError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempts = 0;
        loop {
            attempts += 1;
            match attempt(attempts).await {
                Ok(value) => return Ok(value),
                Err(e) if attempts >= max_attempts => {
                    return Err(FetchError::Exhausted {
                        attempts,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    warn!(uri, attempt = attempts, max_attempts, error = %e, "Request failed, retrying");
                }
            }

            let delay = self.delay_for(attempts);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

impl From<&HlsFetcherConfig> for RetryPolicy {
    fn from(config: &HlsFetcherConfig) -> Self {
        Self::new(config.max_attempts, config.retry_delay_base)
    }
}

/// `ByteFetcher` over a shared reqwest client.
pub struct HttpFetcher {
    http_client: Client,
    request_timeout: Duration,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(http_client: Client, config: &HlsFetcherConfig) -> Self {
        Self {
            http_client,
            request_timeout: config.request_timeout,
            retry: RetryPolicy::from(config),
        }
    }

    async fn fetch_once(&self, uri: &str) -> Result<Bytes, FetchError> {
        let mut request = self.http_client.get(uri);
        if !self.request_timeout.is_zero() {
            request = request.timeout(self.request_timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(FetchError::EmptyBody);
        }
        Ok(body)
    }
}

#[async_trait]
impl ByteFetcher for HttpFetcher {
    async fn get(&self, uri: &str) -> Result<Bytes, FetchError> {
        let body = self.retry.run(uri, |_| self.fetch_once(uri)).await?;
        debug!(uri, bytes = body.len(), "Fetched");
        Ok(body)
    }
}
