/// Reference to an AES-128 key, either on a single segment or on the whole playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRef {
    pub uri: String,
    /// Hex encoded IV as written in the playlist, optionally `0x` prefixed.
    pub iv: Option<String>,
}

impl KeyRef {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            iv: None,
        }
    }

    pub fn with_iv(mut self, iv: impl Into<String>) -> Self {
        self.iv = Some(iv.into());
        self
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.uri.is_empty()
    }
}

/// One media segment of a playlist. `index` is the 0-based playlist position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    pub uri: String,
    pub key: Option<KeyRef>,
}

impl Segment {
    pub fn new(index: usize, uri: impl Into<String>) -> Self {
        Self {
            index,
            uri: uri.into(),
            key: None,
        }
    }

    pub fn with_key(mut self, key: KeyRef) -> Self {
        self.key = Some(key);
        self
    }
}

/// Unit of work handed to the worker pool.
#[derive(Debug, Clone)]
pub struct Job {
    pub index: usize,
    pub segment: Segment,
    pub global_key: Option<KeyRef>,
}

impl Job {
    pub fn new(segment: Segment, global_key: Option<KeyRef>) -> Self {
        Self {
            index: segment.index,
            segment,
            global_key,
        }
    }

    /// The segment's own key wins over the playlist key; empty references count as absent.
    pub fn effective_key(&self) -> Option<&KeyRef> {
        self.segment
            .key
            .as_ref()
            .filter(|key| !key.is_empty())
            .or_else(|| self.global_key.as_ref().filter(|key| !key.is_empty()))
    }
}
