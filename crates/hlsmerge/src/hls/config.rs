use std::time::Duration;

use crate::DownloaderConfig;

// --- Top-Level Configuration ---
#[derive(Debug, Clone, Default)]
pub struct HlsConfig {
    /// Base downloader configuration
    pub base: DownloaderConfig,
    pub scheduler_config: HlsSchedulerConfig,
    pub fetcher_config: HlsFetcherConfig,
    pub output_config: HlsOutputConfig,
}

impl HlsConfig {
    pub fn builder() -> crate::builder::HlsConfigBuilder {
        crate::builder::HlsConfigBuilder::new()
    }
}

// --- Scheduler Configuration ---
#[derive(Debug, Clone)]
pub struct HlsSchedulerConfig {
    pub download_concurrency: usize, // Number of workers draining the job queue
}

impl Default for HlsSchedulerConfig {
    fn default() -> Self {
        Self {
            download_concurrency: 10,
        }
    }
}

// --- Fetcher Configuration ---
#[derive(Debug, Clone)]
pub struct HlsFetcherConfig {
    pub request_timeout: Duration, // Per attempt
    pub max_attempts: u32,
    pub retry_delay_base: Duration, // Base for exponential backoff, zero disables the pause
}

impl Default for HlsFetcherConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            max_attempts: 3,
            retry_delay_base: Duration::from_millis(500),
        }
    }
}

// --- Output Configuration ---
#[derive(Debug, Clone, Default)]
pub struct HlsOutputConfig {
    /// Segments with a lower playlist index are not fetched. Files an earlier
    /// run staged for them are still combined.
    pub start_offset: usize,
    /// Keep the staging directory after a successful run
    pub keep_staging: bool,
}
