//! Tests for the invocation policy, using a scripted runner

use std::sync::Arc;
use std::time::{Duration, Instant};

use proptest::prelude::*;
use serde_json::json;
use superclaude_bridge::{
    AgentBridge, BridgeError, FailureKind, InMemoryMetrics, MetricsSink, Params, ProcessOutput,
    ProcessRunner, SuperClaudeConfig,
};
use superclaude_test_utils::FakeRunner;

fn config(retry_count: u32) -> SuperClaudeConfig {
    SuperClaudeConfig::builder("/project")
        .agent_retry_count(retry_count)
        .build()
        .unwrap()
}

fn bridge_with(config: SuperClaudeConfig, runner: &Arc<FakeRunner>) -> AgentBridge {
    AgentBridge::builder(config)
        .runner(Arc::clone(runner) as Arc<dyn ProcessRunner>)
        .build()
}

fn params(value: serde_json::Value) -> Params {
    value.as_object().cloned().unwrap()
}

mod scenarios {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_success() {
        let runner = FakeRunner::stdout(r#"{"status":"success","data":{"result":"ok"}}"#);
        let bridge = bridge_with(config(3), &runner);

        let result = bridge.invoke_agent("pm", "track_tasks", Params::new()).unwrap();

        assert_eq!(
            result.to_value(),
            json!({"status": "success", "data": {"result": "ok"}, "attempts": 1})
        );
        assert_eq!(runner.call_count(), 1);
    }

    #[test]
    fn test_malformed_output_retried_then_exhausted() {
        let runner = FakeRunner::stdout("not json");
        let bridge = bridge_with(config(2), &runner);

        let result = bridge.invoke_agent("pm", "track_tasks", Params::new()).unwrap();

        assert_eq!(
            result.to_value(),
            json!({"status": "error", "error": "invalid response", "attempts": 3})
        );
        assert_eq!(result.failure, Some(FailureKind::MalformedResponse));
        assert_eq!(runner.call_count(), 3);
    }

    #[test]
    fn test_disabled_agent_is_skipped() {
        let config = SuperClaudeConfig::builder("/project")
            .agent_enabled("research", false)
            .build()
            .unwrap();
        let runner = FakeRunner::stdout("{}");
        let bridge = bridge_with(config, &runner);

        let result = bridge.invoke_agent("research", "index", Params::new()).unwrap();

        assert_eq!(result.to_value(), json!({"status": "skipped"}));
        assert_eq!(runner.call_count(), 0);
    }

    #[test]
    fn test_unknown_agent_spawns_nothing() {
        let runner = FakeRunner::stdout("{}");
        let bridge = bridge_with(config(3), &runner);

        let err = bridge
            .invoke_agent("nonexistent", "ping", Params::new())
            .unwrap_err();

        assert!(matches!(err, BridgeError::UnknownAgent { ref name, .. } if name == "nonexistent"));
        assert!(err.to_string().contains("nonexistent"));
        assert_eq!(runner.call_count(), 0);
    }
}

mod policy {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_idempotent_for_deterministic_process() {
        let runner = FakeRunner::success(json!({"tasks": [1, 2, 3]}));
        let bridge = bridge_with(config(3), &runner);
        let request = params(json!({"filter": "open"}));

        let first = bridge.invoke_agent("pm", "get_tasks", request.clone()).unwrap();
        let second = bridge.invoke_agent("pm", "get_tasks", request).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_recovers_after_transient_failure() {
        let runner = FakeRunner::sequence(vec![
            ProcessOutput::timed_out("", ""),
            ProcessOutput::exited(1, "", "ECONNRESET"),
            ProcessOutput::exited(0, r#"{"status":"success","data":{"n":1}}"#, ""),
        ]);
        let bridge = bridge_with(config(3), &runner);

        let result = bridge.invoke_agent("index", "index_repository", Params::new()).unwrap();

        assert!(result.is_success());
        assert_eq!(result.attempts, Some(3));
        assert_eq!(runner.call_count(), 3);
    }

    #[test]
    fn test_application_error_from_data_not_retried() {
        let runner =
            FakeRunner::stdout(r#"{"status":"error","data":{"error":"Unknown action: fly"}}"#);
        let bridge = bridge_with(config(3), &runner);

        let result = bridge.invoke_agent("research", "fly", Params::new()).unwrap();

        assert_eq!(
            result.to_value(),
            json!({"status": "error", "error": "Unknown action: fly", "attempts": 1})
        );
        assert_eq!(runner.call_count(), 1);
    }

    #[test]
    fn test_spawn_failure_is_error_result() {
        let runner = FakeRunner::spawn_failure();
        let bridge = bridge_with(config(1), &runner);

        let result = bridge.invoke_agent("pm", "track_tasks", Params::new()).unwrap();

        assert!(result.is_error());
        assert_eq!(result.failure, Some(FailureKind::Spawn));
        assert_eq!(result.attempts, Some(2));
    }

    #[test]
    fn test_timeout_maps_to_timeout_error() {
        let runner = FakeRunner::timeout();
        let bridge = bridge_with(config(1), &runner);

        let err = bridge
            .invoke_agent("pm", "track_tasks", Params::new())
            .unwrap()
            .into_result("pm", "track_tasks")
            .unwrap_err();

        assert!(matches!(err, BridgeError::AgentTimeout { attempts: 2, .. }));
    }

    #[test]
    fn test_request_written_to_every_attempt() {
        let runner = FakeRunner::stdout("garbage");
        let bridge = bridge_with(config(1), &runner);

        bridge
            .invoke_agent("pm", "track_tasks", params(json!({"id": 7})))
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        for call in &calls {
            assert_eq!(
                serde_json::from_str::<serde_json::Value>(&call.input).unwrap(),
                json!({"action": "track_tasks", "params": {"id": 7}})
            );
            assert_eq!(call.command[1], "/project/pm/dist/index.js");
            assert_eq!(call.timeout, Duration::from_secs(30));
        }
    }

    #[test]
    fn test_all_agents_disabled() {
        let config = SuperClaudeConfig::builder("/project")
            .agents_enabled(false)
            .build()
            .unwrap();
        let runner = FakeRunner::stdout("{}");
        let bridge = bridge_with(config, &runner);

        for name in ["pm", "research", "index"] {
            let result = bridge.invoke_agent(name, "anything", Params::new()).unwrap();
            assert!(result.is_skipped());
        }
        assert_eq!(runner.call_count(), 0);
    }

    #[test]
    fn test_fake_timeout_returns_promptly() {
        let runner = FakeRunner::timeout();
        let bridge = bridge_with(config(3), &runner);

        let started = Instant::now();
        let result = bridge.invoke_agent("pm", "track_tasks", Params::new()).unwrap();

        assert!(result.is_error());
        assert!(started.elapsed() < Duration::from_secs(30 * 4));
        assert_eq!(runner.call_count(), 4);
    }
}

mod metrics {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_one_observation_per_call() {
        let metrics = Arc::new(InMemoryMetrics::new());
        let runner = FakeRunner::sequence(vec![
            ProcessOutput::exited(0, "junk", ""),
            ProcessOutput::exited(0, r#"{"status":"success","data":{}}"#, ""),
        ]);
        let bridge = AgentBridge::builder(config(3))
            .runner(Arc::clone(&runner) as Arc<dyn ProcessRunner>)
            .metrics(Arc::clone(&metrics) as Arc<dyn MetricsSink>)
            .build();

        bridge.invoke_agent("pm", "track_tasks", Params::new()).unwrap();
        bridge.invoke_agent("pm", "track_tasks", Params::new()).unwrap();

        let snapshot = metrics.snapshot("pm", "track_tasks");
        assert_eq!(snapshot.success, 2);
        assert_eq!(snapshot.error, 0);
        assert_eq!(snapshot.attempts, 3);
    }

    #[test]
    fn test_unknown_agent_not_recorded() {
        let metrics = Arc::new(InMemoryMetrics::new());
        let runner = FakeRunner::stdout("{}");
        let bridge = AgentBridge::builder(config(0))
            .runner(Arc::clone(&runner) as Arc<dyn ProcessRunner>)
            .metrics(Arc::clone(&metrics) as Arc<dyn MetricsSink>)
            .build();

        let _ = bridge.invoke_agent("ghost", "boo", Params::new());

        assert!(metrics.snapshots().is_empty());
    }

    #[test]
    fn test_shared_bridge_across_threads() {
        let metrics = Arc::new(InMemoryMetrics::new());
        let runner = FakeRunner::success(json!({}));
        let bridge = Arc::new(
            AgentBridge::builder(config(0))
                .runner(Arc::clone(&runner) as Arc<dyn ProcessRunner>)
                .metrics(Arc::clone(&metrics) as Arc<dyn MetricsSink>)
                .build(),
        );

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let bridge = Arc::clone(&bridge);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        bridge.invoke_agent("index", "search", Params::new()).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(runner.call_count(), 100);
        assert_eq!(metrics.snapshot("index", "search").success, 100);
    }
}

fn transient_output() -> impl Strategy<Value = Option<ProcessOutput>> {
    prop_oneof![
        Just(Some(ProcessOutput::timed_out("", ""))),
        Just(Some(ProcessOutput::exited(1, "", "crash"))),
        Just(Some(ProcessOutput::exited(0, "not json", ""))),
        Just(Some(ProcessOutput::exited(0, r#"{"status":"maybe"}"#, ""))),
        Just(None),
    ]
}

proptest! {
    #[test]
    fn prop_retry_bound(retry_count in 0u32..8, output in transient_output()) {
        let runner = match output {
            Some(output) => FakeRunner::always(output),
            None => FakeRunner::spawn_failure(),
        };
        let bridge = bridge_with(config(retry_count), &runner);

        let result = bridge.invoke_agent("pm", "track_tasks", Params::new()).unwrap();

        prop_assert!(result.is_error());
        prop_assert_eq!(result.attempts, Some(retry_count + 1));
        prop_assert_eq!(runner.call_count(), retry_count as usize + 1);
    }

    #[test]
    fn prop_status_is_always_known(stdout in ".{0,64}", returncode in -9i32..4) {
        let runner = FakeRunner::always(ProcessOutput::exited(returncode, stdout, ""));
        let bridge = bridge_with(config(1), &runner);

        let result = bridge.invoke_agent("index", "search", Params::new()).unwrap();

        prop_assert!(["success", "error", "skipped"].contains(&result.status()));
        prop_assert!(runner.call_count() <= 2);
    }
}
