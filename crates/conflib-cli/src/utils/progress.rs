use conflib::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Arc, Mutex};
use tracing::warn;

const BAR_TEMPLATE: &str = "{msg:<24} [{bar:40.cyan/blue}] {pos}/{len} ({eta})";

/// Renders search progress as a single step bar on stderr.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let pb = ProgressBar::with_draw_target(Some(0), target).with_style(Self::bar_style());
        pb.finish_and_clear();
        Self {
            pb: Arc::new(Mutex::new(pb)),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let pb = Arc::clone(&self.pb);

        Box::new(move |progress: Progress| {
            let Ok(pb) = pb.lock() else {
                warn!("Progress bar mutex was poisoned. Cannot update progress.");
                return;
            };

            match progress {
                Progress::SearchStart { total_steps } => {
                    pb.reset();
                    pb.set_length(total_steps);
                    pb.set_position(0);
                    pb.set_message("Searching");
                }
                Progress::StepFinish { step, best_score } => {
                    pb.set_position(step);
                    if let Some(score) = best_score {
                        pb.set_message(format!("best {:.6}", score));
                    }
                }
                Progress::SearchFinish => {
                    let len = pb.length().unwrap_or(0);
                    pb.set_position(len);
                    pb.finish();
                }
                Progress::Message(msg) => {
                    if pb.is_finished() {
                        pb.set_message(msg);
                    } else {
                        pb.println(format!("  {}", msg));
                    }
                }
            }
        })
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
