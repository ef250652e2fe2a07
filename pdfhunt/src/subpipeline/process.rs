//! An analysis pipeline backed by an external analyzer process.
//!
//! Wire protocol: the initial record is written to the child's stdin as a
//! single JSON line, then stdin is closed. A child that exits without reading
//! stdin is not an error by itself. The child writes one JSON object
//! per stdout line, each a full snapshot. Blank lines are ignored. The stream
//! ends when stdout closes; a non-zero exit status turns the end into an error.

use super::{AnalysisPipeline, SnapshotStream};
use crate::context::NestedState;
use crate::errors::NestedPipelineError;
use futures::stream::{self, StreamExt};
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

/// Runs an external analyzer and streams its snapshots.
#[derive(Debug, Clone)]
pub struct ProcessAnalysis {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl ProcessAnalysis {
    /// Creates an analysis that launches `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    /// Sets the program arguments.
    #[must_use]
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the working directory of the child process.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(ref dir) = self.working_dir {
            command.current_dir(dir);
        }
        command
    }
}

enum ReaderState {
    Start {
        command: Command,
        program: String,
        initial: NestedState,
    },
    Reading {
        child: Child,
        lines: Lines<BufReader<ChildStdout>>,
        line_no: usize,
    },
    Done,
}

impl AnalysisPipeline for ProcessAnalysis {
    fn name(&self) -> &str {
        &self.program
    }

    fn stream(&self, initial: NestedState) -> SnapshotStream<'_> {
        let start = ReaderState::Start {
            command: self.command(),
            program: self.program.clone(),
            initial,
        };

        stream::unfold(start, |state| async move {
            match state {
                ReaderState::Start {
                    mut command,
                    program,
                    initial,
                } => match launch(&mut command, &program, &initial).await {
                    Ok((child, lines)) => next_snapshot(child, lines, 0).await,
                    Err(err) => Some((Err(err), ReaderState::Done)),
                },
                ReaderState::Reading {
                    child,
                    lines,
                    line_no,
                } => next_snapshot(child, lines, line_no).await,
                ReaderState::Done => None,
            }
        })
        .boxed()
    }
}

async fn launch(
    command: &mut Command,
    program: &str,
    initial: &NestedState,
) -> Result<(Child, Lines<BufReader<ChildStdout>>), NestedPipelineError> {
    let mut child = command.spawn().map_err(|source| NestedPipelineError::Spawn {
        program: program.to_string(),
        source,
    })?;
    debug!(program, pid = ?child.id(), "Analyzer started");

    let payload = serde_json::to_string(initial)
        .map_err(|e| NestedPipelineError::failed(format!("cannot encode initial record: {e}")))?;

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| NestedPipelineError::failed("analyzer stdin is not piped"))?;
    match feed(stdin, &payload).await {
        Ok(()) => {}
        // The child closed stdin without reading it; its exit status decides the run.
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
            debug!(program, "Analyzer did not consume the initial record");
        }
        Err(err) => return Err(err.into()),
    }

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| NestedPipelineError::failed("analyzer stdout is not piped"))?;

    Ok((child, BufReader::new(stdout).lines()))
}

async fn feed(mut stdin: ChildStdin, payload: &str) -> io::Result<()> {
    stdin.write_all(payload.as_bytes()).await?;
    stdin.write_all(b"\n").await?;
    stdin.flush().await
}

async fn next_snapshot(
    mut child: Child,
    mut lines: Lines<BufReader<ChildStdout>>,
    mut line_no: usize,
) -> Option<(Result<NestedState, NestedPipelineError>, ReaderState)> {
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                line_no += 1;
                if line.trim().is_empty() {
                    continue;
                }
                return match decode(&line, line_no) {
                    Ok(snapshot) => Some((
                        Ok(snapshot),
                        ReaderState::Reading {
                            child,
                            lines,
                            line_no,
                        },
                    )),
                    Err(err) => {
                        if let Err(kill_err) = child.start_kill() {
                            warn!(error = %kill_err, "Failed to stop analyzer");
                        }
                        Some((Err(err), ReaderState::Done))
                    }
                };
            }
            Ok(None) => {
                return match child.wait().await {
                    Ok(status) if status.success() => {
                        debug!(lines = line_no, "Analyzer finished");
                        None
                    }
                    Ok(status) => Some((
                        Err(NestedPipelineError::Exited(status.to_string())),
                        ReaderState::Done,
                    )),
                    Err(err) => Some((Err(err.into()), ReaderState::Done)),
                };
            }
            Err(err) => return Some((Err(err.into()), ReaderState::Done)),
        }
    }
}

fn decode(line: &str, line_no: usize) -> Result<NestedState, NestedPipelineError> {
    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|e| NestedPipelineError::MalformedSnapshot {
            line: line_no,
            reason: e.to_string(),
        })?;
    NestedState::try_from(value).map_err(|reason| NestedPipelineError::MalformedSnapshot {
        line: line_no,
        reason,
    })
}
