// HLS Segment Processor: fetch, decrypt and stage a single segment.

use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::hls::HlsMergeError;
use crate::hls::decryption::{decrypt_segment, parse_iv, sequence_iv};
use crate::hls::fetcher::ByteFetcher;
use crate::hls::key_cache::KeyCache;
use crate::hls::segment::Job;

/// Handles one job taken off the worker pool's queue.
#[async_trait]
pub trait SegmentHandler: Send + Sync {
    async fn process(&self, job: Job) -> Result<PathBuf, HlsMergeError>;
}

/// Name of the staged file for a segment: the percent-decoded last path
/// component of its URI, without query string or fragment.
pub fn staged_file_name(uri: &str) -> Option<String> {
    let raw = match Url::parse(uri) {
        Ok(url) => url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_owned),
        Err(_) => {
            let path = uri.split(['?', '#']).next().unwrap_or(uri);
            path.rsplit(['/', '\\']).next().map(str::to_owned)
        }
    }?;

    // An encoded separator must not turn the name into a path
    let decoded = urlencoding::decode(&raw)
        .ok()
        .filter(|name| !name.contains(['/', '\\']))
        .map(Cow::into_owned);
    let name = decoded.unwrap_or(raw);
    Some(name).filter(|n| !n.is_empty() && n != "." && n != "..")
}

pub struct SegmentProcessor {
    fetcher: Arc<dyn ByteFetcher>,
    key_cache: Arc<KeyCache>,
    staging_dir: PathBuf,
}

impl SegmentProcessor {
    pub fn new(
        fetcher: Arc<dyn ByteFetcher>,
        key_cache: Arc<KeyCache>,
        staging_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            key_cache,
            staging_dir: staging_dir.into(),
        }
    }

    fn staged_path(&self, job: &Job) -> Result<PathBuf, HlsMergeError> {
        let name = staged_file_name(&job.segment.uri).ok_or_else(|| {
            HlsMergeError::StageWriteError {
                path: self.staging_dir.clone(),
                source: Arc::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("segment URI '{}' has no file name", job.segment.uri),
                )),
            }
        })?;
        Ok(self.staging_dir.join(name))
    }
}

#[async_trait]
impl SegmentHandler for SegmentProcessor {
    async fn process(&self, job: Job) -> Result<PathBuf, HlsMergeError> {
        let target = self.staged_path(&job)?;

        let raw_data = self.fetcher.get(&job.segment.uri).await.map_err(|e| {
            HlsMergeError::SegmentFetchError {
                index: job.index,
                uri: job.segment.uri.clone(),
                reason: e.to_string(),
            }
        })?;

        let data = match job.effective_key() {
            Some(key_ref) => {
                let key = self.key_cache.resolve(&key_ref.uri).await?;
                let iv = match key_ref.iv.as_deref().filter(|iv| !iv.is_empty()) {
                    Some(iv_hex) => parse_iv(iv_hex)?,
                    None => sequence_iv(job.index),
                };
                decrypt_segment(job.index, &raw_data, &key, &iv)?
            }
            None => raw_data,
        };

        // Two segments sharing a file name overwrite each other here
        tokio::fs::write(&target, &data)
            .await
            .map_err(|e| HlsMergeError::StageWriteError {
                path: target.clone(),
                source: Arc::new(e),
            })?;

        debug!(index = job.index, path = %target.display(), bytes = data.len(), "Segment staged");
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hls::decryption::tests::encrypt_data;
    use crate::hls::error::FetchError;
    use crate::hls::segment::{KeyRef, Segment};
    use bytes::Bytes;
    use std::collections::HashMap;
    use std::path::Path;

    struct StaticFetcher(HashMap<String, Bytes>);

    impl StaticFetcher {
        fn new(entries: &[(&str, Vec<u8>)]) -> Arc<Self> {
            Arc::new(Self(
                entries
                    .iter()
                    .map(|(uri, body)| (uri.to_string(), Bytes::from(body.clone())))
                    .collect(),
            ))
        }
    }

    #[async_trait]
    impl ByteFetcher for StaticFetcher {
        async fn get(&self, uri: &str) -> Result<Bytes, FetchError> {
            self.0
                .get(uri)
                .cloned()
                .ok_or(FetchError::Status(reqwest::StatusCode::NOT_FOUND))
        }
    }

    fn processor(fetcher: Arc<StaticFetcher>, dir: &Path) -> SegmentProcessor {
        let key_cache = Arc::new(KeyCache::new(fetcher.clone()));
        SegmentProcessor::new(fetcher, key_cache, dir)
    }

    #[test]
    fn test_staged_file_name() {
        assert_eq!(
            staged_file_name("https://cdn.example.com/live/seg12.ts?token=abc").as_deref(),
            Some("seg12.ts")
        );
        assert_eq!(
            staged_file_name("segments/seg3.ts#frag").as_deref(),
            Some("seg3.ts")
        );
        assert_eq!(staged_file_name("https://cdn.example.com/"), None);
    }

    #[test]
    fn test_staged_file_name_is_percent_decoded() {
        assert_eq!(
            staged_file_name("https://cdn.example.com/vod/seg%201.ts").as_deref(),
            Some("seg 1.ts")
        );
        assert_eq!(
            staged_file_name("https://cdn.example.com/vod/%E7%89%87%E6%AE%B53.ts").as_deref(),
            Some("片段3.ts")
        );
        // encoded separators stay encoded
        assert_eq!(
            staged_file_name("https://cdn.example.com/vod/a%2Fseg4.ts").as_deref(),
            Some("a%2Fseg4.ts")
        );
    }

    #[tokio::test]
    async fn test_encoded_name_is_staged_decoded() {
        let dir = tempfile::tempdir().unwrap();
        let uri = "https://cdn.example.com/seg%201.ts";
        let processor = processor(StaticFetcher::new(&[(uri, b"spaced".to_vec())]), dir.path());

        let path = processor
            .process(Job::new(Segment::new(1, uri), None))
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("seg 1.ts"));
        assert_eq!(crate::hls::output::numeric_key("seg 1.ts").as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_clear_segment_is_staged_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let uri = "https://cdn.example.com/seg0.ts";
        let processor = processor(StaticFetcher::new(&[(uri, b"clear bytes".to_vec())]), dir.path());

        let path = processor
            .process(Job::new(Segment::new(0, uri), None))
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("seg0.ts"));
        assert_eq!(std::fs::read(path).unwrap(), b"clear bytes");
    }

    #[tokio::test]
    async fn test_explicit_iv_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let key = *b"0123456789abcdef";
        let iv = [0x11u8; 16];
        let uri = "https://cdn.example.com/seg5.ts";
        let key_uri = "https://keys.example.com/k.key";
        let fetcher = StaticFetcher::new(&[
            (uri, encrypt_data(b"secret", &key, &iv)),
            (key_uri, key.to_vec()),
        ]);

        let segment = Segment::new(5, uri)
            .with_key(KeyRef::new(key_uri).with_iv("0x11111111111111111111111111111111"));
        let path = processor(fetcher, dir.path())
            .process(Job::new(segment, None))
            .await
            .unwrap();

        assert_eq!(std::fs::read(path).unwrap(), b"secret");
    }

    #[tokio::test]
    async fn test_missing_segment_is_a_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = processor(StaticFetcher::new(&[]), dir.path())
            .process(Job::new(Segment::new(4, "https://cdn.example.com/seg4.ts"), None))
            .await
            .unwrap_err();

        assert!(matches!(err, HlsMergeError::SegmentFetchError { index: 4, .. }));
        assert!(!dir.path().join("seg4.ts").exists());
    }

    #[tokio::test]
    async fn test_bad_iv_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let uri = "https://cdn.example.com/seg1.ts";
        let key_uri = "https://keys.example.com/k.key";
        let fetcher = StaticFetcher::new(&[(uri, vec![0u8; 16]), (key_uri, vec![0u8; 16])]);

        let job = Job::new(
            Segment::new(1, uri),
            Some(KeyRef::new(key_uri).with_iv("0xZZ")),
        );
        let err = processor(fetcher, dir.path()).process(job).await.unwrap_err();
        assert!(matches!(err, HlsMergeError::IvDecodeError { .. }));
    }

    #[tokio::test]
    async fn test_missing_staging_dir_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let uri = "https://cdn.example.com/seg0.ts";
        let staging = dir.path().join("does-not-exist");
        let err = processor(StaticFetcher::new(&[(uri, b"x".to_vec())]), &staging)
            .process(Job::new(Segment::new(0, uri), None))
            .await
            .unwrap_err();

        assert!(matches!(err, HlsMergeError::StageWriteError { .. }));
    }
}
