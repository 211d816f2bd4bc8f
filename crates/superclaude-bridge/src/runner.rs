//! Process execution for agent invocations
//!
//! [`ProcessRunner`] is the seam between the bridge and the operating
//! system: anything that can run a command line with stdin input and a
//! timeout. [`SubprocessRunner`] is the real implementation; tests swap in
//! a scripted fake.
//!
//! The runner never retries. One call starts at most one child.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{BridgeError, Result};
use crate::types::ProcessDiagnostics;

/// Return code reported when the child was killed after timing out
pub const TIMEOUT_RETURNCODE: i32 = -1;

/// How long to keep draining pipes after the child is gone
const PIPE_DRAIN_GRACE: Duration = Duration::from_secs(1);

const READ_CHUNK: usize = 8 * 1024;

/// Output of one process run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; negative signal number when killed by a signal,
    /// [`TIMEOUT_RETURNCODE`] on timeout
    pub returncode: i32,
    /// Captured stdout (partial on timeout)
    pub stdout: String,
    /// Captured stderr (partial on timeout)
    pub stderr: String,
    /// The timeout fired and the child was killed
    pub timed_out: bool,
}

impl ProcessOutput {
    /// Output of a process that exited normally
    pub fn exited(returncode: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            returncode,
            stdout: stdout.into(),
            stderr: stderr.into(),
            timed_out: false,
        }
    }

    /// Output of a process that was killed after its timeout
    pub fn timed_out(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            returncode: TIMEOUT_RETURNCODE,
            stdout: stdout.into(),
            stderr: stderr.into(),
            timed_out: true,
        }
    }

    /// Copy of the raw output for result diagnostics
    pub fn diagnostics(&self) -> ProcessDiagnostics {
        ProcessDiagnostics {
            returncode: self.returncode,
            stdout: self.stdout.clone(),
            stderr: self.stderr.clone(),
        }
    }
}

/// Something that can run a command and report exit code, stdout and stderr
pub trait ProcessRunner: Send + Sync {
    /// Run `cmd`, writing `input` to its stdin, waiting at most `timeout`
    ///
    /// Fails with [`BridgeError::ProcessSpawn`] when the process cannot be
    /// started. A timeout is not an error: it is reported through
    /// [`ProcessOutput::timed_out`].
    fn run(&self, cmd: &[String], input: &str, timeout: Duration) -> Result<ProcessOutput>;
}

impl<R: ProcessRunner + ?Sized> ProcessRunner for Arc<R> {
    fn run(&self, cmd: &[String], input: &str, timeout: Duration) -> Result<ProcessOutput> {
        (**self).run(cmd, input, timeout)
    }
}

/// Runs commands as real child processes
///
/// Each call drives the child on a private single-threaded tokio runtime.
/// The child is killed and reaped when the timeout fires, and also when
/// the call is abandoned, so no process outlives its invocation.
#[derive(Debug, Clone, Default)]
pub struct SubprocessRunner {
    working_dir: Option<PathBuf>,
    env: Vec<(String, String)>,
}

impl SubprocessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run children in `dir` instead of the current directory
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Add an environment variable for every child
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    fn block_on(&self, program: &str, args: &[String], input: &str, timeout: Duration) -> Result<ProcessOutput> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.execute(program, args, input, timeout))
    }

    async fn execute(
        &self,
        program: &str,
        args: &[String],
        input: &str,
        timeout: Duration,
    ) -> Result<ProcessOutput> {
        let mut command = Command::new(program);
        command
            .args(args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| BridgeError::ProcessSpawn {
            program: program.to_string(),
            source,
        })?;
        debug!(program, pid = child.id(), "Spawned agent process");

        let stdin = child.stdin.take();
        let payload = input.as_bytes().to_vec();
        let writer = tokio::spawn(async move {
            if let Some(mut stdin) = stdin {
                // A child that exits without reading closes the pipe early
                let _ = stdin.write_all(&payload).await;
                let _ = stdin.shutdown().await;
            }
        });

        let stdout = Arc::new(Mutex::new(Vec::new()));
        let stderr = Arc::new(Mutex::new(Vec::new()));
        let stdout_reader = tokio::spawn(capture(child.stdout.take(), Arc::clone(&stdout)));
        let stderr_reader = tokio::spawn(capture(child.stderr.take(), Arc::clone(&stderr)));

        let status = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(status) => Some(status?),
            Err(_) => {
                warn!(program, timeout_secs = timeout.as_secs_f64(), "Agent process timed out, killing");
                if let Err(e) = child.kill().await {
                    debug!(program, error = %e, "Kill after timeout failed; process already gone");
                }
                None
            }
        };

        writer.abort();
        // Grandchildren may inherit the pipes and keep them open
        let _ = tokio::time::timeout(PIPE_DRAIN_GRACE, async {
            let _ = stdout_reader.await;
            let _ = stderr_reader.await;
        })
        .await;

        let stdout = drain(&stdout);
        let stderr = drain(&stderr);
        Ok(match status {
            Some(status) => ProcessOutput::exited(exit_code(status), stdout, stderr),
            None => ProcessOutput::timed_out(stdout, stderr),
        })
    }
}

impl ProcessRunner for SubprocessRunner {
    fn run(&self, cmd: &[String], input: &str, timeout: Duration) -> Result<ProcessOutput> {
        let (program, args) = cmd.split_first().ok_or_else(|| BridgeError::ProcessSpawn {
            program: String::new(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command line"),
        })?;

        if tokio::runtime::Handle::try_current().is_err() {
            return self.block_on(program, args, input, timeout);
        }

        // Called from inside a runtime: a nested block_on would panic
        std::thread::scope(|scope| {
            scope
                .spawn(|| self.block_on(program, args, input, timeout))
                .join()
                .unwrap_or_else(|_| Err(BridgeError::Io(std::io::Error::other("runner thread panicked"))))
        })
    }
}

async fn capture<R>(reader: Option<R>, sink: Arc<Mutex<Vec<u8>>>)
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return;
    };
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if let Ok(mut buf) = sink.lock() {
                    buf.extend_from_slice(&chunk[..n]);
                }
            }
        }
    }
}

fn drain(buf: &Mutex<Vec<u8>>) -> String {
    buf.lock()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| -signal))
        .unwrap_or(TIMEOUT_RETURNCODE)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(TIMEOUT_RETURNCODE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[test]
    fn test_empty_command_is_spawn_error() {
        let err = SubprocessRunner::new()
            .run(&[], "", Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, BridgeError::ProcessSpawn { .. }));
    }

    #[test]
    fn test_missing_executable_is_spawn_error() {
        let cmd = vec!["/nonexistent/superclaude-agent-runtime".to_string()];
        let err = SubprocessRunner::new()
            .run(&cmd, "", Duration::from_secs(1))
            .unwrap_err();
        match err {
            BridgeError::ProcessSpawn { program, .. } => {
                assert_eq!(program, "/nonexistent/superclaude-agent-runtime")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_echoes_stdin() {
        let output = SubprocessRunner::new()
            .run(&sh("cat"), "{\"action\":\"ping\"}", Duration::from_secs(5))
            .unwrap();
        assert_eq!(output.returncode, 0);
        assert_eq!(output.stdout, "{\"action\":\"ping\"}");
        assert!(!output.timed_out);
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_exit_code_and_stderr() {
        let output = SubprocessRunner::new()
            .run(&sh("echo boom >&2; exit 3"), "", Duration::from_secs(5))
            .unwrap();
        assert_eq!(output.returncode, 3);
        assert_eq!(output.stderr.trim(), "boom");
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_and_keeps_partial_output() {
        let started = std::time::Instant::now();
        let output = SubprocessRunner::new()
            .run(&sh("echo partial; exec sleep 30"), "", Duration::from_millis(500))
            .unwrap();
        assert!(output.timed_out);
        assert_eq!(output.returncode, TIMEOUT_RETURNCODE);
        assert_eq!(output.stdout.trim(), "partial");
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    /// Present and not a zombie waiting to be reaped
    #[cfg(target_os = "linux")]
    fn is_running(pid: u32) -> bool {
        std::fs::read_to_string(format!("/proc/{}/stat", pid))
            .ok()
            .and_then(|stat| {
                stat.rsplit_once(')')
                    .map(|(_, rest)| !rest.trim_start().starts_with('Z'))
            })
            .unwrap_or(false)
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_dropped_call_kills_child() {
        let temp = tempfile::TempDir::new().unwrap();
        let pid_file = temp.path().join("child.pid");
        let script = format!("echo $$ > '{}'; exec sleep 30", pid_file.display());
        let runner = SubprocessRunner::new();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let abandoned = runtime.block_on(async {
            tokio::time::timeout(
                Duration::from_secs(1),
                runner.execute("sh", &["-c".to_string(), script], "", Duration::from_secs(30)),
            )
            .await
        });
        assert!(abandoned.is_err(), "call finished instead of being dropped");
        drop(runtime);

        let pid: u32 = std::fs::read_to_string(&pid_file)
            .unwrap()
            .trim()
            .parse()
            .unwrap();
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while is_running(pid) && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(50));
        }
        assert!(!is_running(pid), "child {pid} outlived the dropped call");
    }

    #[cfg(unix)]
    #[test]
    fn test_child_ignoring_stdin() {
        let input = "x".repeat(1 << 20);
        let output = SubprocessRunner::new()
            .run(&sh("echo done"), &input, Duration::from_secs(5))
            .unwrap();
        assert_eq!(output.returncode, 0);
        assert_eq!(output.stdout.trim(), "done");
    }

    #[cfg(unix)]
    #[test]
    fn test_env_and_working_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let output = SubprocessRunner::new()
            .with_working_dir(temp.path())
            .with_env("SUPERCLAUDE_TEST_VALUE", "42")
            .run(&sh("echo $SUPERCLAUDE_TEST_VALUE; pwd"), "", Duration::from_secs(5))
            .unwrap();
        let lines: Vec<&str> = output.stdout.lines().collect();
        assert_eq!(lines[0], "42");
        let reported = std::fs::canonicalize(lines[1]).unwrap();
        assert_eq!(reported, std::fs::canonicalize(temp.path()).unwrap());
    }
}
