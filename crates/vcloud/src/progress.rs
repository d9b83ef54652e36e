//! Task progress on stderr via an indicatif bar.

use indicatif::{ProgressBar, ProgressStyle};
use vcloud_core::{ProgressSink, TaskOutcome, TaskSnapshot};

const TEMPLATE: &str = "{spinner} {msg:30} [{bar:30}] {pos:>3}%";

/// Progress bar fed by the task monitor. Hidden when output is structured
/// or stderr is not a terminal.
pub struct BarSink {
    bar: ProgressBar,
    label: String,
}

impl BarSink {
    pub fn new(label: impl Into<String>, visible: bool) -> Self {
        let bar = if visible {
            ProgressBar::new(100)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
            bar.set_style(style.progress_chars("=> "));
        }
        let label = label.into();
        bar.set_message(label.clone());
        Self { bar, label }
    }
}

impl ProgressSink for BarSink {
    fn update(&mut self, snapshot: &TaskSnapshot, progress: u8) {
        self.bar.set_message(format!("{} ({})", self.label, snapshot.state));
        self.bar.set_position(u64::from(progress));
        tracing::debug!(task = %snapshot.id, state = %snapshot.state, progress, "task progress");
    }

    fn finish(&mut self, outcome: &TaskOutcome) {
        tracing::debug!(label = %self.label, ?outcome, "task monitoring finished");
        self.bar.finish_and_clear();
    }
}
