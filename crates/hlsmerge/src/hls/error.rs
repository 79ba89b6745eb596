use std::path::PathBuf;
use std::sync::Arc;

/// Fatal errors of a merge run. Every variant aborts the whole run.
#[derive(Debug, thiserror::Error, Clone)]
pub enum HlsMergeError {
    #[error("Playlist error: {0}")]
    PlaylistError(String),
    #[error("Segment fetch error: segment {index} ({uri}): {reason}")]
    SegmentFetchError {
        index: usize,
        uri: String,
        reason: String,
    },
    #[error("Key fetch error: {uri}: {reason}")]
    KeyFetchError { uri: String, reason: String },
    #[error("Invalid IV '{iv}': {reason}")]
    IvDecodeError { iv: String, reason: String },
    #[error("Decryption error: segment {index}: {reason}")]
    DecryptionError { index: usize, reason: String },
    #[error("Failed to write staged segment {}: {source}", path.display())]
    StageWriteError {
        path: PathBuf,
        source: Arc<std::io::Error>,
    },
    #[error("Reassembly error: {0}")]
    ReassemblyError(String),
    #[error("Network error: {source}")]
    NetworkError {
        #[from]
        source: Arc<reqwest::Error>,
    },
    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: Arc<std::io::Error>,
    },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<reqwest::Error> for HlsMergeError {
    fn from(err: reqwest::Error) -> Self {
        HlsMergeError::NetworkError {
            source: Arc::new(err),
        }
    }
}

impl From<std::io::Error> for HlsMergeError {
    fn from(err: std::io::Error) -> Self {
        HlsMergeError::IoError {
            source: Arc::new(err),
        }
    }
}

/// Failure of a single HTTP fetch, before it is attributed to a segment or key.
#[derive(Debug, thiserror::Error, Clone)]
pub enum FetchError {
    #[error("HTTP status {0}")]
    Status(reqwest::StatusCode),
    #[error("empty response body")]
    EmptyBody,
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),
    #[error("gave up after {attempts} attempt(s), last error: {last}")]
    Exhausted { attempts: u32, last: Box<FetchError> },
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(Arc::new(err))
    }
}
