// HLS fetch, decrypt and reassemble pipeline

pub mod config;
pub mod coordinator;
pub mod decryption;
pub mod error;
pub mod events;
pub mod fetcher;
pub mod hls_downloader;
pub mod key_cache;
pub mod output;
pub mod playlist;
pub mod processor;
pub mod scheduler;
pub mod segment;

// Re-exports for easier access
pub use config::HlsConfig;
pub use coordinator::{HlsMergeCoordinator, MergeSummary};
pub use error::{FetchError, HlsMergeError};
pub use events::{NoProgress, ProgressPhase, ProgressSink};
pub use fetcher::{ByteFetcher, HttpFetcher, RetryPolicy};
pub use hls_downloader::HlsMerger;
pub use key_cache::KeyCache;
pub use output::Reassembler;
pub use playlist::{PlaylistSource, SegmentPlaylist};
pub use processor::{SegmentHandler, SegmentProcessor};
pub use scheduler::WorkerPool;
pub use segment::{Job, KeyRef, Segment};
