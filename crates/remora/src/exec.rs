//! Timeout-bounded external process execution.
//!
//! One primitive shared by the probe executor, the converter, and the diagnostic tool:
//! run a command, capture stdout/stderr, and kill the child if it outlives the deadline.

use std::io::Read;
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Outcome of a bounded process run.
///
/// `status` is `None` when the process was killed on timeout or exited via a signal.
#[derive(Debug, Clone)]
pub struct ExecOutcome {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl ExecOutcome {
    pub fn success(&self) -> bool {
        !self.timed_out && self.status == Some(0)
    }

    /// Short excerpt of the captured output for error messages, preferring stderr.
    pub fn diagnostic_excerpt(&self) -> String {
        let text = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let text = text.trim();
        if text.len() <= 200 {
            return text.to_string();
        }
        let cut = text
            .char_indices()
            .take_while(|(i, _)| *i < 200)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &text[..cut])
    }
}

/// Runs `cmd` to completion or until `timeout` elapses, whichever comes first.
///
/// Stdout and stderr are drained on background threads so a chatty child can never
/// fill its pipes and deadlock against our `try_wait` loop. On timeout the child is
/// killed and reaped before returning.
///
/// Returns `Err` only when the process cannot be spawned at all; a non-zero exit or
/// a timeout is reported through [`ExecOutcome`].
pub fn run_with_timeout(mut cmd: Command, timeout: Duration) -> std::io::Result<ExecOutcome> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = cmd.spawn()?;
    let stdout_reader = spawn_reader(child.stdout.take());
    let stderr_reader = spawn_reader(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let mut timed_out = false;
    let status = loop {
        match child.try_wait()? {
            Some(status) => break Some(status),
            None if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                timed_out = true;
                break None;
            }
            None => std::thread::sleep(POLL_INTERVAL),
        }
    };

    Ok(ExecOutcome {
        status: status.and_then(|s| s.code()),
        stdout: join_reader(stdout_reader),
        stderr: join_reader(stderr_reader),
        timed_out,
    })
}

fn spawn_reader<R: Read + Send + 'static>(source: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    source.map(|mut reader| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = reader.read_to_end(&mut buf);
            buf
        })
    })
}

fn join_reader(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
