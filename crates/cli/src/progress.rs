use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use wordsense_engine::{BuildObserver, Phase};

/// Spinner on stderr counting records per phase
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    pub fn new(hidden: bool) -> Self {
        let bar = if hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}: {pos} records ({elapsed})")
        {
            bar.set_style(style);
        }
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl BuildObserver for ProgressObserver {
    fn phase_started(&self, phase: Phase) {
        self.bar.reset();
        self.bar.set_message(phase.to_string());
        self.bar.enable_steady_tick(Duration::from_millis(120));
    }

    fn lexemes_normalized(&self, count: usize) {
        self.bar.inc(count as u64);
    }

    fn relations_resolved(&self, count: usize) {
        self.bar.inc(count as u64);
    }

    fn phase_finished(&self, phase: Phase) {
        self.bar.disable_steady_tick();
        self.bar.println(format!("{phase}: done ({} records)", self.bar.position()));
    }
}
