//! # Configuration builders
//!
//! Fluent builders for [`DownloaderConfig`] and [`HlsConfig`].
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use hlsmerge_engine::{DownloaderConfig, HlsConfig};
//!
//! let http = DownloaderConfig::builder()
//!     .with_connect_timeout(Duration::from_secs(15))
//!     .with_header("Referer", "https://www.example.com")
//!     .build();
//!
//! let config = HlsConfig::builder()
//!     .with_base_config(http)
//!     .download_concurrency(4)
//!     .max_attempts(5)
//!     .build();
//! assert_eq!(config.scheduler_config.download_concurrency, 4);
//! ```

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::hls::HlsConfig;
use crate::{DownloaderConfig, proxy::ProxyConfig};

/// Builder for creating DownloaderConfig instances with a fluent API
#[derive(Debug, Clone)]
pub struct DownloaderConfigBuilder {
    config: DownloaderConfig,
}

impl DownloaderConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: DownloaderConfig::default(),
        }
    }

    /// Set the overall timeout for every HTTP request
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the connection timeout (time to establish initial connection)
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set whether to follow redirects
    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.config.follow_redirects = follow;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Add a custom HTTP header, invalid names or values are ignored
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.as_ref().parse::<HeaderName>(),
            HeaderValue::from_str(value.as_ref()),
        ) {
            self.config.headers.insert(name, value);
        }
        self
    }

    /// Merge headers over the defaults, custom values win
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        for (name, value) in headers.iter() {
            self.config.headers.insert(name.clone(), value.clone());
        }
        self
    }

    /// Set the proxy configuration
    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.config.proxy = Some(proxy);
        self.config.use_system_proxy = false; // Explicit proxy overrides system proxy
        self
    }

    /// Set whether to use system proxy settings
    pub fn with_system_proxy(mut self, use_system_proxy: bool) -> Self {
        self.config.use_system_proxy = use_system_proxy;
        self
    }

    /// Build the DownloaderConfig instance
    pub fn build(self) -> DownloaderConfig {
        self.config
    }
}

impl Default for DownloaderConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`HlsConfig`]
#[derive(Debug, Clone, Default)]
pub struct HlsConfigBuilder {
    config: HlsConfig,
}

impl HlsConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: HlsConfig::default(),
        }
    }

    pub fn with_base_config(mut self, base_config: DownloaderConfig) -> Self {
        self.config.base = base_config;
        self
    }

    /// Number of concurrent workers, at least one
    pub fn download_concurrency(mut self, concurrency: usize) -> Self {
        self.config.scheduler_config.download_concurrency = concurrency.max(1);
        self
    }

    /// Timeout of a single HTTP attempt
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.fetcher_config.request_timeout = timeout;
        self
    }

    /// Total attempts per request, at least one
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.fetcher_config.max_attempts = attempts.max(1);
        self
    }

    pub fn retry_delay_base(mut self, delay: Duration) -> Self {
        self.config.fetcher_config.retry_delay_base = delay;
        self
    }

    pub fn start_offset(mut self, offset: usize) -> Self {
        self.config.output_config.start_offset = offset;
        self
    }

    pub fn keep_staging(mut self, keep: bool) -> Self {
        self.config.output_config.keep_staging = keep;
        self
    }

    pub fn build(self) -> HlsConfig {
        self.config
    }
}
