use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Transient per-entry progress for verbose listings. Redraws one stderr line in place and
/// clears it when dropped; has no effect on what a listing returns.
pub(crate) struct Progress {
    bar: ProgressBar,
}

impl Progress {
    pub fn new(verbose: bool) -> Self {
        if !verbose {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        if let Ok(style) = ProgressStyle::with_template("{spinner} {pos:>7} {wide_msg}") {
            bar.set_style(style);
        }
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    pub fn visit(&self, path: &str) {
        self.bar.inc(1);
        if !self.bar.is_hidden() {
            self.bar.set_message(path.to_string());
        }
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}
