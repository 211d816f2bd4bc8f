//! [`FakeRunner`]: a `ProcessRunner` that replays scripted outputs.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use superclaude_bridge::{BridgeError, ProcessOutput, ProcessRunner, Result};

/// What the fake does for one call
#[derive(Debug, Clone)]
enum Step {
    Output(ProcessOutput),
    SpawnFailure,
}

/// One call the fake received
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub command: Vec<String>,
    pub input: String,
    pub timeout: Duration,
}

/// Scripted process runner.
///
/// Steps are consumed in order; the last step repeats once the script runs
/// out. Every call is recorded, so tests can assert how many processes the
/// bridge would have spawned and what it wrote to them.
///
/// # Example
///
/// ```rust,no_run
/// use superclaude_test_utils::FakeRunner;
///
/// let runner = FakeRunner::stdout("not json");
/// // ... hand `runner.clone()` to an AgentBridge ...
/// assert_eq!(runner.call_count(), 0);
/// ```
#[derive(Debug)]
pub struct FakeRunner {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl FakeRunner {
    fn from_steps(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Return `output` for every call.
    pub fn always(output: ProcessOutput) -> Arc<Self> {
        Self::from_steps(vec![Step::Output(output)])
    }

    /// Return each output in turn, repeating the last.
    ///
    /// # Panics
    /// Panics if `outputs` is empty.
    pub fn sequence(outputs: Vec<ProcessOutput>) -> Arc<Self> {
        assert!(!outputs.is_empty(), "FakeRunner::sequence needs at least one output");
        Self::from_steps(outputs.into_iter().map(Step::Output).collect())
    }

    /// Exit 0 with `stdout` on every call.
    pub fn stdout(stdout: &str) -> Arc<Self> {
        Self::always(ProcessOutput::exited(0, stdout, ""))
    }

    /// Exit 0 with a well-formed success response carrying `data`.
    pub fn success(data: Value) -> Arc<Self> {
        let body = serde_json::json!({"status": "success", "data": data});
        Self::stdout(&body.to_string())
    }

    /// Time out on every call.
    pub fn timeout() -> Arc<Self> {
        Self::always(ProcessOutput::timed_out("", ""))
    }

    /// Fail to spawn on every call.
    pub fn spawn_failure() -> Arc<Self> {
        Self::from_steps(vec![Step::SpawnFailure])
    }

    /// Number of `run` calls so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Every call received, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn next_step(&self) -> Step {
        let mut steps = self.steps.lock().unwrap();
        if steps.len() > 1 {
            steps.pop_front().unwrap()
        } else {
            steps.front().cloned().unwrap()
        }
    }
}

impl ProcessRunner for FakeRunner {
    fn run(&self, cmd: &[String], input: &str, timeout: Duration) -> Result<ProcessOutput> {
        self.calls.lock().unwrap().push(RecordedCall {
            command: cmd.to_vec(),
            input: input.to_string(),
            timeout,
        });
        match self.next_step() {
            Step::Output(output) => Ok(output),
            Step::SpawnFailure => Err(BridgeError::ProcessSpawn {
                program: cmd.first().cloned().unwrap_or_default(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
            }),
        }
    }
}
