use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Receives the running count of processed items during a reconciliation pass
///
/// Counts never decrease within a pass. Shows are counted before movies.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, processed: usize, total: usize);
}

impl<F> ProgressObserver for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn on_progress(&self, processed: usize, total: usize) {
        self(processed, total)
    }
}

/// Counts per-item outcomes of a pass and emits periodic progress logs
pub struct ProgressTracker {
    total: usize,
    processed: usize,
    changed: usize,
    unchanged: usize,
    failed: usize,
    start_time: Instant,
    progress_interval: usize,
    last_progress_log: usize,
    error_counts: HashMap<String, usize>,
}

impl ProgressTracker {
    /// `progress_interval` is how many items pass between progress log lines
    pub fn new(total: usize, progress_interval: usize) -> Self {
        if total > 10 {
            info!("Starting reconciliation: {} items to check", total);
        }
        Self {
            total,
            processed: 0,
            changed: 0,
            unchanged: 0,
            failed: 0,
            start_time: Instant::now(),
            progress_interval: progress_interval.max(1),
            last_progress_log: 0,
            error_counts: HashMap::new(),
        }
    }

    pub fn record_changed(&mut self) {
        self.processed += 1;
        self.changed += 1;
    }

    pub fn record_unchanged(&mut self) {
        self.processed += 1;
        self.unchanged += 1;
    }

    /// Record a failed item, grouped by error category for the summary
    pub fn record_failed(&mut self, error_category: &str) {
        self.processed += 1;
        self.failed += 1;
        *self.error_counts.entry(error_category.to_string()).or_insert(0) += 1;
    }

    pub fn processed(&self) -> usize {
        self.processed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn log_progress(&mut self) {
        let current = self.processed;
        if current - self.last_progress_log < self.progress_interval && current != self.total {
            return;
        }
        // Small passes finish quickly enough that only the summary matters
        if self.start_time.elapsed().as_secs_f64() < 0.5 && current < self.total {
            return;
        }

        info!(
            "Progress: {}/{} | Changed: {} | Unchanged: {} | Failed: {}",
            current, self.total, self.changed, self.unchanged, self.failed
        );
        self.last_progress_log = current;
    }

    pub fn log_summary(&self, operation_name: &str) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if self.failed > 0 {
            warn!(
                "{} completed: {} items in {:.1}s | Changed: {} | Unchanged: {} | Failed: {}",
                operation_name, self.total, elapsed, self.changed, self.unchanged, self.failed
            );

            let mut entries: Vec<_> = self.error_counts.iter().collect();
            entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            let breakdown: Vec<String> = entries
                .iter()
                .map(|(category, count)| format!("{}: {}", category, count))
                .collect();
            info!("Error breakdown: {}", breakdown.join(", "));
        } else {
            info!(
                "{} completed: {} items in {:.1}s | Changed: {} | Unchanged: {}",
                operation_name, self.total, elapsed, self.changed, self.unchanged
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_counts() {
        let mut tracker = ProgressTracker::new(4, 2);
        tracker.record_changed();
        tracker.record_unchanged();
        tracker.record_failed("fetch");
        tracker.log_progress();
        assert_eq!(tracker.processed(), 3);
        assert_eq!(tracker.failed(), 1);
        assert_eq!(tracker.total(), 4);
    }

    #[test]
    fn test_closure_is_an_observer() {
        let seen = Mutex::new(Vec::new());
        let observer = |processed: usize, total: usize| seen.lock().unwrap().push((processed, total));
        observer.on_progress(1, 2);
        observer.on_progress(2, 2);
        assert_eq!(*seen.lock().unwrap(), vec![(1, 2), (2, 2)]);
    }
}
