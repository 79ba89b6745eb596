/// Pipeline phase a progress update belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgressPhase {
    Download,
    Combine,
}

/// Observer of pipeline progress. Calls never influence control flow.
pub trait ProgressSink: Send + Sync {
    fn begin(&self, _phase: ProgressPhase, _total: u64) {}

    /// One segment staged, or one staged file combined.
    fn increment(&self, phase: ProgressPhase);

    fn finish(&self, _phase: ProgressPhase) {}
}

/// Discards every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn increment(&self, _phase: ProgressPhase) {}
}
