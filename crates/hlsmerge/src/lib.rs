//! # hlsmerge-engine
//!
//! Downloads every segment of an HLS media playlist, decrypts AES-128
//! segments and joins them into one file.
//!
//! ## Pipeline
//!
//! - A fixed pool of workers fetches segments concurrently
//! - Keys are fetched once per URI and shared by all workers
//! - Decrypted segments are staged as files, then concatenated in the
//!   numeric order of their file names

pub mod builder;
pub mod config;
pub mod downloader;
pub mod hls;
pub mod proxy;

pub use builder::{DownloaderConfigBuilder, HlsConfigBuilder};
pub use config::DownloaderConfig;
pub use downloader::create_client;
pub use hls::{HlsConfig, HlsMergeError, HlsMerger, MergeSummary, PlaylistSource};
pub use proxy::{ProxyAuth, ProxyConfig};
