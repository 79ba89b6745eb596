// HLS Segment Scheduler: a fixed pool of workers draining the job queue.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info, trace};

use crate::hls::HlsMergeError;
use crate::hls::events::{ProgressPhase, ProgressSink};
use crate::hls::processor::SegmentHandler;
use crate::hls::segment::Job;

type JobQueue = Arc<Mutex<mpsc::Receiver<Job>>>;

/// Runs jobs on `concurrency` workers. Jobs are queued in the order given and
/// complete in any order.
pub struct WorkerPool {
    concurrency: usize,
    handler: Arc<dyn SegmentHandler>,
    progress: Arc<dyn ProgressSink>,
}

impl WorkerPool {
    pub fn new(
        concurrency: usize,
        handler: Arc<dyn SegmentHandler>,
        progress: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            concurrency: concurrency.max(1),
            handler,
            progress,
        }
    }

    /// Processes every job, returning how many completed.
    ///
    /// The first failing job aborts the run: the remaining workers are
    /// cancelled and that error is returned.
    pub async fn run(&self, jobs: Vec<Job>) -> Result<usize, HlsMergeError> {
        let total = jobs.len();
        if total == 0 {
            return Ok(0);
        }

        // Room for every job, so filling the queue never waits on a worker
        let (job_tx, job_rx) = mpsc::channel::<Job>(total);
        for job in jobs {
            job_tx
                .try_send(job)
                .map_err(|e| HlsMergeError::InternalError(format!("Job queue rejected job: {e}")))?;
        }
        drop(job_tx);

        let queue: JobQueue = Arc::new(Mutex::new(job_rx));
        let worker_count = self.concurrency.min(total);
        info!(jobs = total, workers = worker_count, "Starting segment workers");
        self.progress.begin(ProgressPhase::Download, total as u64);

        let mut workers = JoinSet::new();
        for worker_id in 0..worker_count {
            workers.spawn(Self::worker_loop(
                worker_id,
                Arc::clone(&queue),
                Arc::clone(&self.handler),
                Arc::clone(&self.progress),
            ));
        }

        let mut completed = 0;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Ok(processed)) => completed += processed,
                Ok(Err(e)) => {
                    error!(error = %e, "Segment job failed, aborting remaining workers");
                    workers.abort_all();
                    return Err(e);
                }
                Err(join_error) => {
                    workers.abort_all();
                    return Err(HlsMergeError::InternalError(format!(
                        "Segment worker panicked or was cancelled: {join_error}"
                    )));
                }
            }
        }

        self.progress.finish(ProgressPhase::Download);
        info!(completed, "All segment workers finished");
        Ok(completed)
    }

    async fn worker_loop(
        worker_id: usize,
        queue: JobQueue,
        handler: Arc<dyn SegmentHandler>,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<usize, HlsMergeError> {
        let mut processed = 0;
        loop {
            // The queue is closed and pre-filled, so recv never parks while holding the lock
            let next = queue.lock().await.recv().await;
            let Some(job) = next else {
                break;
            };

            trace!(worker_id, index = job.index, uri = %job.segment.uri, "Processing segment");
            handler.process(job).await?;
            progress.increment(ProgressPhase::Download);
            processed += 1;
        }
        debug!(worker_id, processed, "Worker done");
        Ok(processed)
    }
}
