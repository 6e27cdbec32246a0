//! Progress reporting and cooperative cancellation
//!
//! Long passes push a percentage into a [`ProgressTask`] once per outer loop
//! iteration and poll [`ProgressTask::is_cancelled`] right after. Nothing is
//! preempted; a cancelled pass stops at its next poll and returns
//! [`Outcome::Cancelled`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Result of a pass that may be cancelled by the user
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The pass ran to completion
    Done(T),
    /// The pass was abandoned at a cancellation poll
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    /// Returns the completed value, or `None` if cancelled
    pub fn done(self) -> Option<T> {
        match self {
            Outcome::Done(value) => Some(value),
            Outcome::Cancelled => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Done(value) => Outcome::Done(f(value)),
            Outcome::Cancelled => Outcome::Cancelled,
        }
    }
}

/// A single labelled unit of progress reporting
pub trait ProgressTask {
    /// Reports progress in percent (0-100)
    fn set_progress(&mut self, percent: u8);

    /// Whether the user asked to stop
    fn is_cancelled(&self) -> bool;
}

/// Opens progress tasks, one per phase of an invocation
pub trait ProgressHost {
    type Task: ProgressTask;

    fn begin(&self, title: &str) -> Self::Task;
}

/// Integer percentage of `done` out of `total`, rounded down.
/// An empty total counts as complete.
pub fn percent_of(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    (done.saturating_mul(100) / total).min(100) as u8
}

/// Shared cancellation flag, cheap to clone across threads
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; every task observing this flag will stop
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Progress task that logs progress with ETA estimation
pub struct ProgressTracker {
    label: String,
    start_time: Instant,
    report_step: u8,
    last_reported: Option<u8>,
    cancel: CancelFlag,
}

impl ProgressTracker {
    /// Creates a new progress tracker observing `cancel`
    pub fn new(label: &str, cancel: CancelFlag) -> Self {
        Self {
            label: label.to_string(),
            start_time: Instant::now(),
            report_step: 10,
            last_reported: None,
            cancel,
        }
    }

    /// Logs only when progress advanced by at least `step` percent (minimum 1)
    pub fn with_report_step(mut self, step: u8) -> Self {
        self.report_step = step.max(1);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn should_report(&self, percent: u8) -> bool {
        match self.last_reported {
            None => true,
            Some(last) => {
                (percent >= 100 && last < 100)
                    || u16::from(percent) >= u16::from(last) + u16::from(self.report_step)
            }
        }
    }

    fn print_progress(&self, percent: u8) {
        let elapsed_secs = self.start_time.elapsed().as_secs_f64();

        if percent >= 100 {
            info!(
                "{} 100% - completed in {}",
                self.label,
                format_duration(elapsed_secs)
            );
        } else if percent > 0 {
            let remaining = elapsed_secs * (100 - percent) as f64 / percent as f64;
            info!(
                "{} {}% - elapsed: {} - ETA: {}",
                self.label,
                percent,
                format_duration(elapsed_secs),
                format_duration(remaining),
            );
        } else {
            info!("{} started", self.label);
        }
    }
}

impl ProgressTask for ProgressTracker {
    fn set_progress(&mut self, percent: u8) {
        let percent = percent.min(100);
        if self.should_report(percent) {
            self.print_progress(percent);
            self.last_reported = Some(percent);
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Hands out [`ProgressTracker`]s that share one cancellation flag
#[derive(Debug, Clone, Default)]
pub struct TrackerHost {
    cancel: CancelFlag,
    report_step: Option<u8>,
}

impl TrackerHost {
    pub fn new(cancel: CancelFlag) -> Self {
        Self {
            cancel,
            report_step: None,
        }
    }

    pub fn with_report_step(mut self, step: u8) -> Self {
        self.report_step = Some(step);
        self
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }
}

impl ProgressHost for TrackerHost {
    type Task = ProgressTracker;

    fn begin(&self, title: &str) -> ProgressTracker {
        let tracker = ProgressTracker::new(title, self.cancel.clone());
        match self.report_step {
            Some(step) => tracker.with_report_step(step),
            None => tracker,
        }
    }
}

/// Silent task that is never cancelled
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressTask for NoProgress {
    fn set_progress(&mut self, _percent: u8) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}

impl ProgressHost for NoProgress {
    type Task = NoProgress;

    fn begin(&self, _title: &str) -> NoProgress {
        NoProgress
    }
}

/// Formats seconds into a human-readable duration string
fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else if secs < 3600.0 {
        let mins = (secs / 60.0).floor() as u64;
        let remaining = secs - (mins as f64 * 60.0);
        format!("{}m {:.0}s", mins, remaining)
    } else {
        let hours = (secs / 3600.0).floor() as u64;
        let remaining = secs - (hours as f64 * 3600.0);
        let mins = (remaining / 60.0).floor() as u64;
        let remaining_secs = remaining - (mins as f64 * 60.0);
        format!("{}h {}m {:.0}s", hours, mins, remaining_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(0, 10), 0);
        assert_eq!(percent_of(3, 10), 30);
        assert_eq!(percent_of(2, 3), 66);
        assert_eq!(percent_of(10, 10), 100);
        assert_eq!(percent_of(0, 0), 100);
    }

    #[test]
    fn test_cancel_flag_is_shared() {
        let host = TrackerHost::new(CancelFlag::new());
        let analysis = host.begin("Analysing Sequence...");
        let assembly = host.begin("Flattening Sequence...");

        assert!(!analysis.is_cancelled());
        host.cancel_flag().cancel();
        assert!(analysis.is_cancelled());
        assert!(assembly.is_cancelled());
        assert_eq!(assembly.label(), "Flattening Sequence...");
    }

    #[test]
    fn test_report_step_throttles() {
        let mut tracker = ProgressTracker::new("test", CancelFlag::new()).with_report_step(25);

        tracker.set_progress(0);
        assert_eq!(tracker.last_reported, Some(0));
        tracker.set_progress(10);
        assert_eq!(tracker.last_reported, Some(0));
        tracker.set_progress(30);
        assert_eq!(tracker.last_reported, Some(30));
        tracker.set_progress(100);
        assert_eq!(tracker.last_reported, Some(100));
    }

    #[test]
    fn test_outcome_helpers() {
        let done: Outcome<u32> = Outcome::Done(2);
        assert_eq!(done.clone().map(|v| v * 2), Outcome::Done(4));
        assert_eq!(done.done(), Some(2));

        let cancelled: Outcome<u32> = Outcome::Cancelled;
        assert!(cancelled.is_cancelled());
        assert_eq!(cancelled.done(), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(5.0), "5.0s");
        assert_eq!(format_duration(125.0), "2m 5s");
        assert_eq!(format_duration(3725.0), "1h 2m 5s");
    }
}
