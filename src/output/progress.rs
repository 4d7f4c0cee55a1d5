use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright, bright_green, bright_yellow};

/// Spinner-per-phase progress on stderr for the release notes run.
pub struct PhaseProgress {
    pb: ProgressBar,
    phase: usize,
    total: usize,
}

impl PhaseProgress {
    pub fn start(total: usize, message: &str) -> Self {
        eprintln!("{}  {}", bright("⚙️"), bright("Phases").underlined());
        let pb = create_spinner(phase_label(1, total, message, false));
        Self {
            pb,
            phase: 1,
            total,
        }
    }

    /// Marks the current phase done with `done` and opens the next one.
    pub fn advance(self, done: &str, next: &str) -> Self {
        self.pb
            .finish_with_message(phase_label(self.phase, self.total, done, true));
        let phase = self.phase + 1;
        let pb = create_spinner(phase_label(phase, self.total, next, false));
        Self {
            pb,
            phase,
            total: self.total,
        }
    }

    pub fn finish(self, done: &str) {
        self.pb
            .finish_with_message(phase_label(self.phase, self.total, done, true));
        eprintln!();
    }

    /// Stops the spinner without a success mark, leaving the phase visible.
    pub fn abandon(self) {
        self.pb.abandon();
        eprintln!();
    }
}

fn phase_label(phase: usize, total: usize, message: &str, done: bool) -> String {
    if done {
        bright_green(format!("Phase {phase}/{total}: {message} ✓")).to_string()
    } else {
        bright_yellow(format!("Phase {phase}/{total}: {message}")).to_string()
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("  {msg} {spinner}")
            .unwrap(),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
