use crate::config::ScoringSection;
use conflib::core::BoxedError;
use conflib::engine::convert::Configurations;
use conflib::engine::scoring::ScoringFunction;
use std::convert::Infallible;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("Scoring command only accepts raw coordinate samples")]
    NotRaw,
    #[error("Failed to run scoring command '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("Failed to write samples to scoring command: {0}")]
    Input(#[source] BoxedError),
    #[error("Scoring command exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("Scoring command printed an invalid score on line {line}: '{text}'")]
    InvalidScore { line: usize, text: String },
}

/// Scores a batch by piping it, as CSV, into an external command.
///
/// The command reads the batch (header row of coordinate keys, one row per sample) on stdin
/// and prints one score per line on stdout. Blank lines are ignored.
#[derive(Debug, Clone)]
pub struct ExternalScorer {
    command: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    calls: usize,
}

impl ExternalScorer {
    pub fn new(section: &ScoringSection) -> Self {
        Self {
            command: section.command.clone(),
            args: section.args.clone(),
            working_dir: None,
            calls: 0,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn evaluate(&mut self, configurations: &Configurations<Infallible>) -> Result<Vec<f64>, ScorerError> {
        let samples = configurations.as_raw().ok_or(ScorerError::NotRaw)?;
        let mut input = Vec::new();
        samples
            .write_csv(&mut input)
            .map_err(|e| ScorerError::Input(e.into()))?;

        let mut command = Command::new(&self.command);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        self.calls += 1;
        debug!(
            command = %self.command,
            call = self.calls,
            samples = configurations.len(),
            "Invoking scoring command."
        );
        let spawn_error = |source| ScorerError::Spawn {
            command: self.command.clone(),
            source,
        };
        let mut child = command.spawn().map_err(spawn_error)?;
        let stdin = child.stdin.take();
        let (output, written) = thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => feed(&mut stdin, &input),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")));
            (output, written)
        });
        let output = output.map_err(spawn_error)?;

        if !output.status.success() {
            return Err(ScorerError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        written.map_err(|e| ScorerError::Input(e.into()))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        trace!(output = %stdout, "Scoring command finished.");
        parse_scores(&stdout)
    }
}

/// Writes the batch and closes the pipe; a scorer that exits without reading it all is fine.
fn feed(stdin: &mut impl Write, input: &[u8]) -> std::io::Result<()> {
    match stdin.write_all(input) {
        Err(e) if e.kind() == ErrorKind::BrokenPipe => {
            debug!("Scoring command closed its input early.");
            Ok(())
        }
        result => result,
    }
}

fn parse_scores(stdout: &str) -> Result<Vec<f64>, ScorerError> {
    stdout
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            line.trim()
                .parse::<f64>()
                .map_err(|_| ScorerError::InvalidScore {
                    line: i + 1,
                    text: line.to_string(),
                })
        })
        .collect()
}

impl ScoringFunction<Infallible> for ExternalScorer {
    fn score(&mut self, configurations: &Configurations<Infallible>) -> Result<Vec<f64>, BoxedError> {
        Ok(self.evaluate(configurations)?)
    }
}
