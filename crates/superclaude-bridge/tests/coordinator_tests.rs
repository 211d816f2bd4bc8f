//! Tests for batch coordination

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use superclaude_bridge::{
    AgentBridge, AgentCoordinator, AgentTask, BridgeError, ProcessOutput, ProcessRunner,
    SuperClaudeConfig,
};
use superclaude_test_utils::FakeRunner;

fn bridge(runner: &Arc<FakeRunner>) -> AgentBridge {
    let config = SuperClaudeConfig::builder("/project")
        .agent_retry_count(0)
        .build()
        .unwrap();
    AgentBridge::builder(config)
        .runner(Arc::clone(runner) as Arc<dyn ProcessRunner>)
        .build()
}

fn tasks() -> Vec<AgentTask> {
    vec![AgentTask::new("pm", "a"), AgentTask::new("index", "b")]
}

#[test]
fn test_run_sequential_preserves_order() {
    let runner = FakeRunner::sequence(vec![
        ProcessOutput::exited(0, r#"{"status":"success","data":{"step":1}}"#, ""),
        ProcessOutput::exited(0, r#"{"status":"success","data":{"step":2}}"#, ""),
    ]);
    let bridge = bridge(&runner);

    let results = AgentCoordinator::new(&bridge).run_sequential(&tasks()).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].data().unwrap()["step"], 1);
    assert_eq!(results[1].data().unwrap()["step"], 2);

    let calls = runner.calls();
    assert!(calls[0].command[1].ends_with("pm/dist/index.js"));
    assert!(calls[1].command[1].ends_with("index/dist/index.js"));
}

#[test]
fn test_run_parallel_matches_sequential() {
    let sequential_runner = FakeRunner::success(json!({"ok": true}));
    let parallel_runner = FakeRunner::success(json!({"ok": true}));

    let sequential = AgentCoordinator::new(&bridge(&sequential_runner))
        .run_sequential(&tasks())
        .unwrap();
    let parallel = AgentCoordinator::new(&bridge(&parallel_runner))
        .run_parallel(&tasks())
        .unwrap();

    assert_eq!(sequential, parallel);
    assert_eq!(
        parallel_runner
            .calls()
            .iter()
            .map(|c| serde_json::from_str::<serde_json::Value>(&c.input).unwrap()["action"].clone())
            .collect::<Vec<_>>(),
        vec![json!("a"), json!("b")]
    );
}

#[test]
fn test_unknown_agent_fails_batch_before_running() {
    let runner = FakeRunner::success(json!({}));
    let bridge = bridge(&runner);
    let tasks = vec![AgentTask::new("pm", "a"), AgentTask::new("nope", "b")];

    let err = AgentCoordinator::new(&bridge).run_sequential(&tasks).unwrap_err();

    assert!(matches!(err, BridgeError::UnknownAgent { .. }));
    assert_eq!(runner.call_count(), 0);
}

#[test]
fn test_failures_do_not_stop_the_batch() {
    let runner = FakeRunner::sequence(vec![
        ProcessOutput::exited(2, "", "boom"),
        ProcessOutput::exited(0, r#"{"status":"success","data":{}}"#, ""),
    ]);
    let bridge = bridge(&runner);

    let results = AgentCoordinator::new(&bridge).run_sequential(&tasks()).unwrap();

    assert_eq!(results[0].error_message(), Some("boom"));
    assert!(results[1].is_success());
}

#[test]
fn test_empty_batch() {
    let runner = FakeRunner::success(json!({}));
    let bridge = bridge(&runner);
    assert!(AgentCoordinator::new(&bridge).run_parallel(&[]).unwrap().is_empty());
}

#[test]
fn test_tasks_from_json_array() {
    let tasks: Vec<AgentTask> = serde_json::from_value(json!([
        {"agent": "pm", "action": "a"},
        {"agent": "index", "action": "b", "params": {"path": "."}}
    ]))
    .unwrap();
    assert_eq!(tasks[0], AgentTask::new("pm", "a"));
    assert_eq!(tasks[1].params["path"], ".");
}
