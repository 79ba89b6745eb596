// HLS Merge Coordinator: wires the pipeline together and drives one run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::hls::HlsMergeError;
use crate::hls::config::HlsConfig;
use crate::hls::events::ProgressSink;
use crate::hls::fetcher::ByteFetcher;
use crate::hls::key_cache::KeyCache;
use crate::hls::output::Reassembler;
use crate::hls::playlist::SegmentPlaylist;
use crate::hls::processor::SegmentProcessor;
use crate::hls::scheduler::WorkerPool;
use crate::hls::segment::Job;

/// Outcome of a successful run
#[derive(Debug, Clone)]
pub struct MergeSummary {
    pub segments_downloaded: usize,
    pub files_combined: usize,
    pub bytes_written: u64,
    pub output_path: PathBuf,
    pub elapsed: Duration,
}

pub struct HlsMergeCoordinator {
    config: Arc<HlsConfig>,
    fetcher: Arc<dyn ByteFetcher>,
    progress: Arc<dyn ProgressSink>,
}

impl HlsMergeCoordinator {
    pub fn new(
        config: Arc<HlsConfig>,
        fetcher: Arc<dyn ByteFetcher>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            config,
            fetcher,
            progress,
        }
    }

    /// One job per segment at or after the configured start offset.
    pub fn build_jobs(&self, playlist: &SegmentPlaylist) -> Vec<Job> {
        let start_offset = self.config.output_config.start_offset;
        playlist
            .segments
            .iter()
            .filter(|segment| segment.index >= start_offset)
            .map(|segment| Job::new(segment.clone(), playlist.global_key.clone()))
            .collect()
    }

    /// Downloads every segment into `staging_dir` and combines the staged files
    /// into `output_path`.
    ///
    /// On failure nothing is cleaned up, the staging directory keeps whatever
    /// was written so far.
    pub async fn run(
        &self,
        playlist: &SegmentPlaylist,
        staging_dir: &Path,
        output_path: &Path,
    ) -> Result<MergeSummary, HlsMergeError> {
        let start = Instant::now();

        tokio::fs::create_dir_all(staging_dir).await.map_err(|e| {
            HlsMergeError::StageWriteError {
                path: staging_dir.to_path_buf(),
                source: Arc::new(e),
            }
        })?;

        let jobs = self.build_jobs(playlist);
        let skipped = playlist.len() - jobs.len();
        if skipped > 0 {
            info!(skipped, "Skipping segments before the start offset");
        }

        let key_cache = Arc::new(KeyCache::new(Arc::clone(&self.fetcher)));
        let processor = Arc::new(SegmentProcessor::new(
            Arc::clone(&self.fetcher),
            key_cache,
            staging_dir,
        ));
        let pool = WorkerPool::new(
            self.config.scheduler_config.download_concurrency,
            processor,
            Arc::clone(&self.progress),
        );

        let segments_downloaded = pool.run(jobs).await?;
        info!(
            segments = segments_downloaded,
            staging_dir = %staging_dir.display(),
            elapsed = ?start.elapsed(),
            "Download finished"
        );

        let combined = Reassembler::new(Arc::clone(&self.progress))
            .combine(staging_dir, output_path)
            .await?;

        if !self.config.output_config.keep_staging {
            remove_staging(staging_dir).await;
        }

        Ok(MergeSummary {
            segments_downloaded,
            files_combined: combined.files,
            bytes_written: combined.bytes,
            output_path: output_path.to_path_buf(),
            elapsed: start.elapsed(),
        })
    }
}

/// Failures are only logged, the merged output is already complete.
async fn remove_staging(staging_dir: &Path) {
    match tokio::fs::remove_dir_all(staging_dir).await {
        Ok(()) => debug!(staging_dir = %staging_dir.display(), "Staging directory removed"),
        Err(e) => warn!(
            staging_dir = %staging_dir.display(),
            error = %e,
            "Failed to remove staging directory"
        ),
    }
}
