use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use molmin::engine::progress::{Progress, ProgressCallback};
use std::time::Duration;

const SPINNER_TICK_MS: u64 = 80;

/// Terminal display of a minimization: a spinner per phase and an iteration bar
/// carrying the current energy and RMS gradient.
pub struct MinimizationProgress {
    bar: ProgressBar,
}

impl MinimizationProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stderr())
            .with_style(spinner_style());
        bar.finish_and_clear();
        Self { bar }
    }

    pub fn callback(&self) -> ProgressCallback<'static> {
        let bar = self.bar.clone();

        Box::new(move |progress: Progress| match progress {
            Progress::PhaseStart { name } => {
                bar.reset();
                bar.set_length(0);
                bar.set_style(spinner_style());
                bar.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                bar.set_message(name);
            }
            Progress::PhaseFinish => {
                bar.disable_steady_tick();
                bar.finish_with_message("✓ Done");
            }
            Progress::TaskStart { total_steps } => {
                bar.disable_steady_tick();
                bar.reset();
                bar.set_length(total_steps);
                bar.set_style(bar_style());
            }
            Progress::Step {
                iteration,
                energy,
                rms_gradient,
            } => {
                bar.set_position(iteration as u64);
                bar.set_message(format!("E {energy:.4} | RMS {rms_gradient:.4}"));
            }
            // A converged run stops early; the bar ends at the last iteration.
            Progress::TaskFinish => {
                bar.set_length(bar.position());
                bar.finish();
            }
        })
    }
}

impl Default for MinimizationProgress {
    fn default() -> Self {
        Self::new()
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .expect("Failed to create spinner style template")
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:<32} [{bar:40.cyan/blue}] {pos}/{len} iterations ({elapsed})")
        .expect("Failed to create bar style template")
        .with_key(
            "elapsed",
            |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                let _ = write!(w, "{:.1}s", state.elapsed().as_secs_f64());
            },
        )
        .progress_chars("##-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn display_starts_finished_and_empty() {
        let progress = MinimizationProgress::new();
        assert_eq!(progress.bar.length(), Some(0));
        assert!(progress.bar.is_finished());
    }

    #[test]
    fn iteration_bar_tracks_steps_and_ends_at_last_iteration() {
        let progress = MinimizationProgress::new();
        let callback = progress.callback();

        callback(Progress::PhaseStart { name: "Minimization" });
        assert_eq!(progress.bar.message(), "Minimization");
        assert!(!progress.bar.is_finished());

        callback(Progress::TaskStart { total_steps: 1000 });
        assert_eq!(progress.bar.length(), Some(1000));
        assert_eq!(progress.bar.position(), 0);

        callback(Progress::Step {
            iteration: 3,
            energy: -1.5,
            rms_gradient: 0.25,
        });
        assert_eq!(progress.bar.position(), 3);
        assert_eq!(progress.bar.message(), "E -1.5000 | RMS 0.2500");

        callback(Progress::TaskFinish);
        assert!(progress.bar.is_finished());
        assert_eq!(progress.bar.length(), Some(3));

        callback(Progress::PhaseFinish);
        assert_eq!(progress.bar.message(), "✓ Done");
    }

    #[test]
    fn callback_can_run_on_another_thread() {
        let progress = MinimizationProgress::new();
        let callback = progress.callback();

        thread::spawn(move || {
            callback(Progress::PhaseStart { name: "Setup" });
            callback(Progress::PhaseFinish);
        })
        .join()
        .unwrap();

        assert!(progress.bar.is_finished());
        assert_eq!(progress.bar.message(), "✓ Done");
    }
}
