use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::create_client;
use crate::hls::events::{NoProgress, ProgressSink};
use crate::hls::fetcher::{ByteFetcher, HttpFetcher};
use crate::hls::playlist::{PlaylistSource, SegmentPlaylist, load_playlist};
use crate::hls::{HlsConfig, HlsMergeCoordinator, HlsMergeError, MergeSummary};

/// Entry point owning the HTTP fetcher for a playlist download.
pub struct HlsMerger {
    config: Arc<HlsConfig>,
    fetcher: Arc<dyn ByteFetcher>,
    progress: Arc<dyn ProgressSink>,
}

impl HlsMerger {
    pub fn new(config: HlsConfig) -> Result<Self, HlsMergeError> {
        let client = create_client(&config.base)?;
        let fetcher: Arc<dyn ByteFetcher> =
            Arc::new(HttpFetcher::new(client, &config.fetcher_config));
        Ok(Self {
            config: Arc::new(config),
            fetcher,
            progress: Arc::new(NoProgress),
        })
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub async fn load_playlist(
        &self,
        source: &PlaylistSource,
    ) -> Result<SegmentPlaylist, HlsMergeError> {
        load_playlist(source, self.fetcher.as_ref()).await
    }

    pub async fn merge(
        &self,
        playlist: &SegmentPlaylist,
        staging_dir: &Path,
        output_path: &Path,
    ) -> Result<MergeSummary, HlsMergeError> {
        if playlist.is_empty() {
            return Err(HlsMergeError::PlaylistError(
                "Playlist contains no segments".to_string(),
            ));
        }
        info!(
            segments = playlist.len(),
            concurrency = self.config.scheduler_config.download_concurrency,
            max_attempts = self.config.fetcher_config.max_attempts,
            "Starting HLS merge"
        );

        HlsMergeCoordinator::new(
            Arc::clone(&self.config),
            Arc::clone(&self.fetcher),
            Arc::clone(&self.progress),
        )
        .run(playlist, staging_dir, output_path)
        .await
    }
}
