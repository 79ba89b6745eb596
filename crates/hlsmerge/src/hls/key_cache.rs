// Key cache: every distinct key URI is fetched at most once per run.

use std::sync::Arc;

use bytes::Bytes;
use moka::future::Cache;
use tracing::debug;

use crate::hls::HlsMergeError;
use crate::hls::fetcher::ByteFetcher;

/// Shared, never-evicting store of raw key bytes keyed by URI.
///
/// Concurrent lookups of the same URI wait on a single in-flight fetch, so a
/// key endpoint is hit once no matter how many workers need it. Lookups of
/// different URIs proceed independently. A failed fetch is not cached; the
/// error is handed to every caller that was waiting on it.
pub struct KeyCache {
    fetcher: Arc<dyn ByteFetcher>,
    keys: Cache<String, Bytes>,
}

impl KeyCache {
    pub fn new(fetcher: Arc<dyn ByteFetcher>) -> Self {
        Self {
            fetcher,
            // no capacity and no TTL: entries live for the whole run
            keys: Cache::builder().build(),
        }
    }

    pub async fn resolve(&self, uri: &str) -> Result<Bytes, HlsMergeError> {
        self.keys
            .try_get_with(uri.to_owned(), async {
                debug!(uri, "Fetching decryption key");
                self.fetcher
                    .get(uri)
                    .await
                    .map_err(|e| HlsMergeError::KeyFetchError {
                        uri: uri.to_owned(),
                        reason: e.to_string(),
                    })
            })
            .await
            .map_err(Arc::unwrap_or_clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hls::error::FetchError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct CountingFetcher {
        keys: HashMap<String, Bytes>,
        calls: Mutex<HashMap<String, usize>>,
    }

    impl CountingFetcher {
        fn with_key(mut self, uri: &str, key: &'static [u8]) -> Self {
            self.keys.insert(uri.to_owned(), Bytes::from_static(key));
            self
        }

        fn calls(&self, uri: &str) -> usize {
            self.calls.lock().unwrap().get(uri).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl ByteFetcher for CountingFetcher {
        async fn get(&self, uri: &str) -> Result<Bytes, FetchError> {
            *self.calls.lock().unwrap().entry(uri.to_owned()).or_default() += 1;
            // widen the window in which concurrent lookups overlap
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.keys
                .get(uri)
                .cloned()
                .ok_or(FetchError::Status(reqwest::StatusCode::NOT_FOUND))
        }
    }

    const KEY_A: &str = "https://keys.example.com/a.key";
    const KEY_B: &str = "https://keys.example.com/b.key";

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_lookups_fetch_once() {
        let fetcher = Arc::new(
            CountingFetcher::default()
                .with_key(KEY_A, b"0123456789abcdef")
                .with_key(KEY_B, b"fedcba9876543210"),
        );
        let cache = Arc::new(KeyCache::new(fetcher.clone()));

        let mut handles = Vec::new();
        for i in 0..16 {
            let cache = cache.clone();
            let uri = if i % 2 == 0 { KEY_A } else { KEY_B };
            handles.push(tokio::spawn(async move { cache.resolve(uri).await }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap().len(), 16);
        }

        assert_eq!(fetcher.calls(KEY_A), 1);
        assert_eq!(fetcher.calls(KEY_B), 1);
        assert_eq!(
            cache.resolve(KEY_A).await.unwrap(),
            Bytes::from_static(b"0123456789abcdef")
        );
        assert_eq!(fetcher.calls(KEY_A), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_a_key_error() {
        let fetcher = Arc::new(CountingFetcher::default());
        let cache = KeyCache::new(fetcher.clone());

        let err = cache.resolve(KEY_A).await.unwrap_err();
        match err {
            HlsMergeError::KeyFetchError { uri, .. } => assert_eq!(uri, KEY_A),
            other => panic!("expected key fetch error, got {other:?}"),
        }
        assert_eq!(fetcher.calls(KEY_A), 1);
    }
}
