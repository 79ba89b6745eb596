use hlsmerge_engine::hls::{ProgressPhase, ProgressSink};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

fn phase_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{msg:>12} [{elapsed_precise}] [{bar:40.green/white}] {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

fn phase_label(phase: ProgressPhase) -> &'static str {
    match phase {
        ProgressPhase::Download => "Downloading",
        ProgressPhase::Combine => "Combining",
    }
}

/// One bar per pipeline phase.
#[derive(Clone)]
pub struct ProgressManager {
    multi: MultiProgress,
    bars: Arc<Mutex<HashMap<ProgressPhase, ProgressBar>>>,
    disabled: bool,
}

impl ProgressManager {
    pub fn new(multi: MultiProgress) -> Self {
        Self {
            multi,
            bars: Arc::new(Mutex::new(HashMap::new())),
            disabled: false,
        }
    }

    pub fn new_disabled(multi: MultiProgress) -> Self {
        Self {
            multi,
            bars: Arc::new(Mutex::new(HashMap::new())),
            disabled: true,
        }
    }

    fn with_bars(&self, f: impl FnOnce(&mut HashMap<ProgressPhase, ProgressBar>)) {
        if self.disabled {
            return;
        }
        let mut bars = self.bars.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut bars);
    }
}

impl ProgressSink for ProgressManager {
    fn begin(&self, phase: ProgressPhase, total: u64) {
        self.with_bars(|bars| {
            let bar = self.multi.add(ProgressBar::new(total));
            bar.set_style(phase_style());
            bar.set_message(phase_label(phase));
            if let Some(previous) = bars.insert(phase, bar) {
                previous.finish_and_clear();
            }
        });
    }

    fn increment(&self, phase: ProgressPhase) {
        self.with_bars(|bars| {
            if let Some(bar) = bars.get(&phase) {
                bar.inc(1);
            }
        });
    }

    fn finish(&self, phase: ProgressPhase) {
        self.with_bars(|bars| {
            if let Some(bar) = bars.remove(&phase) {
                bar.finish();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indicatif::ProgressDrawTarget;

    #[test]
    fn test_bars_follow_phases() {
        let manager = ProgressManager::new(MultiProgress::with_draw_target(
            ProgressDrawTarget::hidden(),
        ));

        manager.begin(ProgressPhase::Download, 3);
        manager.increment(ProgressPhase::Download);
        manager.increment(ProgressPhase::Download);
        {
            let bars = manager.bars.lock().unwrap();
            assert_eq!(bars[&ProgressPhase::Download].position(), 2);
            assert_eq!(bars[&ProgressPhase::Download].length(), Some(3));
        }

        manager.finish(ProgressPhase::Download);
        assert!(manager.bars.lock().unwrap().is_empty());
    }

    #[test]
    fn test_disabled_manager_creates_no_bars() {
        let manager = ProgressManager::new_disabled(MultiProgress::with_draw_target(
            ProgressDrawTarget::hidden(),
        ));
        manager.begin(ProgressPhase::Combine, 10);
        manager.increment(ProgressPhase::Combine);
        assert!(manager.bars.lock().unwrap().is_empty());
    }
}
