use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use mediaboard_core::ProgressObserver;
use std::io::IsTerminal;
use std::sync::Arc;

/// Progress display for a reconciliation pass
///
/// Draws a bar when attached to a terminal; otherwise reports progress as
/// structured log events every `log_every` items.
pub struct PassProgress {
    bar: ProgressBar,
    interactive: bool,
    log_every: usize,
}

impl PassProgress {
    pub fn new(quiet: bool) -> Self {
        let interactive = is_interactive() && !quiet;

        let bar = if interactive {
            let bar = ProgressBar::new(0);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            {
                bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏  "));
            }
            bar.set_message("Checking watchlist...");
            bar
        } else {
            tracing::debug!(
                operation = "ui_init",
                mode = "non_interactive",
                "Progress bar disabled, using structured logging"
            );
            ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::hidden())
        };

        Self {
            bar,
            interactive,
            log_every: 25,
        }
    }

    /// Observer to hand to the reconciler; it shares this display's bar
    pub fn observer(&self) -> Arc<dyn ProgressObserver> {
        let bar = self.bar.clone();
        let interactive = self.interactive;
        let log_every = self.log_every;

        Arc::new(move |processed: usize, total: usize| {
            if interactive {
                bar.set_length(total as u64);
                bar.set_position(processed as u64);
            } else if should_log(processed, total, log_every) {
                tracing::info!(
                    operation = "progress",
                    current = processed,
                    total = total,
                    percent = percent(processed, total),
                    "Reconciliation progress"
                );
            }
        })
    }

    pub fn finish(&self) {
        if self.interactive {
            self.bar.finish_and_clear();
        }
    }
}

fn should_log(processed: usize, total: usize, every: usize) -> bool {
    processed == total || processed % every.max(1) == 0
}

fn percent(processed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((processed as f64 / total as f64) * 100.0).round() as u8
}

pub fn is_interactive() -> bool {
    std::io::stdout().is_terminal() && std::io::stderr().is_terminal()
}
