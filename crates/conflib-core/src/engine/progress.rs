/// Events emitted while a generator runs a multi-step search.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    SearchStart { total_steps: u64 },
    StepFinish { step: u64, best_score: Option<f64> },
    SearchFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards progress events to an optional callback; without one, reporting is a no-op.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn reporter_without_callback_ignores_events() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::SearchFinish);
    }

    #[test]
    fn reporter_forwards_events_in_order() {
        let seen = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            seen.lock().unwrap().push(event);
        }));

        reporter.report(Progress::SearchStart { total_steps: 2 });
        reporter.report(Progress::StepFinish {
            step: 1,
            best_score: Some(-1.5),
        });
        reporter.report(Progress::SearchFinish);
        drop(reporter);

        assert_eq!(
            seen.into_inner().unwrap(),
            vec![
                Progress::SearchStart { total_steps: 2 },
                Progress::StepFinish {
                    step: 1,
                    best_score: Some(-1.5)
                },
                Progress::SearchFinish,
            ]
        );
    }
}
