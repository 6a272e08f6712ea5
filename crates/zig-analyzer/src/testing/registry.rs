use std::{
    fmt::{Display, Formatter},
    path::Path,
    process::{ExitStatus, Stdio},
    sync::{
        Arc, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

use dashmap::DashMap;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command,
    sync::{broadcast, watch},
    task::JoinHandle,
};
use tracing::{debug, warn};

static NEXT_RUN_ID: AtomicU64 = AtomicU64::new(1);

/// Signal delivered by [`TestRunRegistry::cancel_all`].
#[cfg(unix)]
const CANCEL_SIGNAL: nix::sys::signal::Signal = nix::sys::signal::Signal::SIGKILL;

const OUTPUT_CHANNEL_CAPACITY: usize = 256;

// ── output sink ─────────────────────────────────────────────────────────────

/// Append-only line sink shared by every test run.
///
/// Lines arrive in per-stream order; interleaving across two concurrently
/// running processes is best-effort arrival order. Readers either take a
/// [`snapshot`](Self::snapshot) or [`subscribe`](Self::subscribe) for live
/// lines.
pub struct OutputSink {
    lines: RwLock<Vec<String>>,
    line_tx: broadcast::Sender<String>,
    /// Bumped whenever a foreground run wants the output surface shown.
    reveal_tx: watch::Sender<u64>,
}

impl OutputSink {
    fn new() -> Self {
        let (line_tx, _) = broadcast::channel(OUTPUT_CHANNEL_CAPACITY);
        let (reveal_tx, _) = watch::channel(0);
        Self {
            lines: RwLock::new(Vec::new()),
            line_tx,
            reveal_tx,
        }
    }

    /// Append one line and fan it out to live subscribers.
    pub fn append_line(&self, line: impl Into<String>) {
        let line = line.into();
        if let Ok(mut lines) = self.lines.write() {
            lines.push(line.clone());
        }
        let _ = self.line_tx.send(line);
    }

    fn clear(&self) {
        if let Ok(mut lines) = self.lines.write() {
            lines.clear();
        }
    }

    fn request_reveal(&self) {
        self.reveal_tx.send_modify(|generation| *generation += 1);
    }

    /// Copy of everything appended since the last clear.
    pub fn snapshot(&self) -> Vec<String> {
        self.lines.read().map(|lines| lines.clone()).unwrap_or_default()
    }

    /// Receive lines appended after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.line_tx.subscribe()
    }

    /// Observe reveal requests from foreground runs (background runs never
    /// bump this).
    pub fn watch_reveal(&self) -> watch::Receiver<u64> {
        self.reveal_tx.subscribe()
    }
}

// ── registry ────────────────────────────────────────────────────────────────

struct RunHandle {
    /// OS pid captured at spawn; used to deliver the cancel signal.
    pid: Option<u32>,
}

/// How a finished test run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunOutcome {
    /// Exit code 0.
    Success,
    /// Non-zero exit code (or the exit status could not be read).
    Failed,
    /// Terminated by the registry's cancel signal.
    Cancelled,
}

impl RunOutcome {
    fn banner(self) -> &'static str {
        match self {
            Self::Success => "Success: tests passed.",
            Self::Failed => "Error: tests failed.",
            Self::Cancelled => "Error: tests terminated by user.",
        }
    }
}

/// Tracks every currently executing test process.
///
/// The registry owns the live-run set and the output sink exclusively; the
/// command layer spawns and cancels through it, and the UI layer observes it
/// through [`watch_live`](Self::watch_live) and the sink. One registry per
/// server.
pub struct TestRunRegistry {
    runs: Arc<DashMap<u64, RunHandle>>,
    output: Arc<OutputSink>,
    live_tx: watch::Sender<bool>,
}

impl TestRunRegistry {
    pub fn new() -> Self {
        let (live_tx, _) = watch::channel(false);
        Self {
            runs: Arc::new(DashMap::new()),
            output: Arc::new(OutputSink::new()),
            live_tx,
        }
    }

    /// The shared output sink.
    pub fn output(&self) -> Arc<OutputSink> {
        Arc::clone(&self.output)
    }

    /// Observe whether any run is currently live (for status surfaces).
    pub fn watch_live(&self) -> watch::Receiver<bool> {
        self.live_tx.subscribe()
    }

    /// Number of runs that have been spawned and not yet terminated.
    pub fn live_count(&self) -> usize {
        self.runs.len()
    }

    /// Launch one test process and track it until it terminates.
    ///
    /// The run is registered before any output is consumed, so it is
    /// cancellable from the instant it exists. The returned handle resolves
    /// to `true` iff the process exits 0, after its terminal banner has been
    /// appended to the sink. A spawn failure registers nothing.
    pub fn spawn(
        &self,
        program: &str,
        args: &[String],
        cwd: Option<&Path>,
        background: bool,
    ) -> Result<JoinHandle<bool>, SpawnError> {
        // Keep prior output while other runs are live; someone may still be
        // reading it.
        if self.runs.is_empty() {
            self.output.clear();
        }
        if !background {
            self.output.request_reveal();
        }

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|error| match error.kind() {
            std::io::ErrorKind::NotFound => SpawnError::CommandNotFound(program.to_string()),
            _ => SpawnError::LaunchFailed {
                command: program.to_string(),
                reason: error.to_string(),
            },
        })?;

        let run_id = NEXT_RUN_ID.fetch_add(1, Ordering::Relaxed);
        self.runs.insert(run_id, RunHandle {
            pid: child.id(),
        });
        self.live_tx.send_replace(true);
        debug!("test run {run_id} started: {program} {}", args.join(" "));

        self.output.append_line(format!("Running tool: {program} {}", args.join(" ")));
        self.output.append_line("");

        let stdout_task = stream_lines(child.stdout.take(), Arc::clone(&self.output));
        let stderr_task = stream_lines(child.stderr.take(), Arc::clone(&self.output));

        let runs = Arc::clone(&self.runs);
        let sink = Arc::clone(&self.output);
        let live_tx = self.live_tx.clone();
        Ok(tokio::spawn(async move {
            let status = child.wait().await;

            // Drain whatever the process wrote before exiting.
            let _ = stdout_task.await;
            let _ = stderr_task.await;

            let outcome = match status {
                Ok(status) => classify_exit(status),
                Err(error) => {
                    warn!("failed to await test run {run_id}: {error}");
                    RunOutcome::Failed
                },
            };
            sink.append_line(outcome.banner());

            // cancel_all may already have emptied the set; removal by id is
            // idempotent across that race.
            runs.remove(&run_id);
            if runs.is_empty() {
                live_tx.send_replace(false);
            }
            debug!("test run {run_id} finished: {outcome:?}");
            outcome == RunOutcome::Success
        }))
    }

    /// Deliver the cancel signal to every live run and empty the set.
    ///
    /// Resolves once signals are delivered; exit bookkeeping (terminal
    /// banner, completion value) still happens in each run's own supervising
    /// task. Calling this with no live runs is a no-op.
    pub async fn cancel_all(&self) {
        let ids: Vec<u64> = self.runs.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            let Some((_, handle)) = self.runs.remove(&id) else {
                continue;
            };
            debug!("cancelling test run {id}");
            handle.kill();
        }
    }
}

impl Default for TestRunRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RunHandle {
    #[cfg(unix)]
    fn kill(&self) {
        use nix::{sys::signal, unistd::Pid};

        let Some(pid) = self.pid else {
            return;
        };
        // ESRCH just means the process already exited; nothing to clean up.
        if let Err(errno) = signal::kill(Pid::from_raw(pid as i32), CANCEL_SIGNAL)
            && errno != nix::errno::Errno::ESRCH
        {
            warn!("failed to signal test process {pid}: {errno}");
        }
    }

    #[cfg(not(unix))]
    fn kill(&self) {}
}

fn classify_exit(status: ExitStatus) -> RunOutcome {
    if status.success() {
        return RunOutcome::Success;
    }
    // A SIGKILL death is attributed to cancellation whether the signal came
    // from cancel_all or from outside; any other non-zero exit is a failure.
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if status.signal() == Some(CANCEL_SIGNAL as i32) {
            return RunOutcome::Cancelled;
        }
    }
    RunOutcome::Failed
}

fn stream_lines(
    stream: Option<impl tokio::io::AsyncRead + Unpin + Send + 'static>,
    sink: Arc<OutputSink>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let Some(stream) = stream else {
            return;
        };
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            sink.append_line(line);
        }
    })
}

#[derive(Debug)]
pub enum SpawnError {
    /// The test runner executable was not found on the search path.
    CommandNotFound(String),
    /// The executable exists but the process could not be started.
    LaunchFailed {
        command: String,
        reason: String,
    },
}

impl Display for SpawnError {
    fn fmt(
        &self,
        f: &mut Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::CommandNotFound(command) => {
                write!(
                    f,
                    "could not find {command}; add it to your PATH or point zig-analyzer.zigPath at the binary"
                )
            },
            Self::LaunchFailed {
                command,
                reason,
            } => {
                write!(f, "failed to launch {command}: {reason}")
            },
        }
    }
}

impl std::error::Error for SpawnError {}

#[cfg(test)]
#[path = "../../tests/src/testing/registry_tests.rs"]
mod tests;
