//! End-to-end execution tests with a scripted oracle and environment
//!
//! Covers the full plan-then-execute path, including the stop-on-first-
//! failure contract and cancellation between dispatches.

use robopilot::command::{Pilot, TaskStatus};
use robopilot::core::config::PilotConfig;
use robopilot::core::error::Result;
use robopilot::environment::{RemoteEnv, SkillOutcome};
use robopilot::oracle::Oracle;
use std::sync::{Arc, Mutex};

struct ScriptedOracle {
    responses: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    fn new(responses: Vec<&str>) -> Self {
        let mut responses: Vec<String> = responses.into_iter().map(String::from).collect();
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
        }
    }
}

impl Oracle for ScriptedOracle {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop()
            .expect("scripted oracle exhausted"))
    }
}

/// Environment failing at one scripted call index, recording every call.
/// The call log is shared so tests can inspect it after the environment
/// moves into the pilot.
struct ScriptedEnv {
    fail_at: Option<usize>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedEnv {
    fn new(fail_at: Option<usize>) -> Self {
        Self {
            fail_at,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn record(&self, call: String) -> Result<SkillOutcome> {
        let mut calls = self.calls.lock().unwrap();
        let index = calls.len();
        calls.push(call);
        if self.fail_at == Some(index) {
            Ok(SkillOutcome::failed("object out of reach"))
        } else {
            Ok(SkillOutcome::ok())
        }
    }
}

impl RemoteEnv for ScriptedEnv {
    async fn go_to(&self, target: &str) -> Result<SkillOutcome> {
        self.record(format!("go_to {}", target))
    }

    async fn pick(&self, target: &str) -> Result<SkillOutcome> {
        self.record(format!("pick {}", target))
    }

    async fn place(&self, target: &str, destination: Option<&str>) -> Result<SkillOutcome> {
        self.record(format!("place {} in {}", target, destination.unwrap_or("?")))
    }
}

const GOAL_RESPONSE: &str = r#"{"subgoals": ["move red block to bowl"]}"#;

const TASK_RESPONSE: &str = r#"{
    "plans": [
        {
            "subgoal_index": 0,
            "tasks": [
                {"skill": "GoToObject", "target": "red block"},
                {"skill": "PickObject", "target": "red block"},
                {"skill": "GoToObject", "target": "bowl"},
                {"skill": "PlaceObject", "target": "red block", "destination": "bowl"}
            ]
        }
    ]
}"#;

fn object_text() -> String {
    "{\n\"object_name\": \"red block\",\n\"object_name\": \"bowl\",\n}".to_string()
}

fn pilot(env: ScriptedEnv) -> Pilot<ScriptedOracle, ScriptedEnv> {
    Pilot::new(
        PilotConfig::default(),
        ScriptedOracle::new(vec![GOAL_RESPONSE]),
        ScriptedOracle::new(vec![TASK_RESPONSE]),
        env,
    )
    .unwrap()
}

/// Happy path: every task dispatched in order, all succeed.
#[tokio::test]
async fn test_full_run_succeeds() {
    let mut pilot = pilot(ScriptedEnv::new(None));

    let plan = pilot
        .plan_with_object_text("move the red block to the bowl", object_text())
        .await
        .unwrap();
    let log = pilot.execute(&plan).await.unwrap();

    assert!(log.all_succeeded());
    assert_eq!(log.results.len(), 4);
}

/// Failure scenario: the third environment call is rejected.
/// Log shows Succeeded, Succeeded, Failed; the fourth task is never
/// attempted, only marked skipped.
#[tokio::test]
async fn test_failure_halts_execution() {
    let env = ScriptedEnv::new(Some(2));
    let calls = env.calls.clone();
    let mut pilot = pilot(env);

    let plan = pilot
        .plan_with_object_text("move the red block to the bowl", object_text())
        .await
        .unwrap();
    let log = pilot.execute(&plan).await.unwrap();

    assert!(!log.all_succeeded());
    assert_eq!(log.results[0].status, TaskStatus::Succeeded);
    assert_eq!(log.results[1].status, TaskStatus::Succeeded);
    assert_eq!(log.results[2].status, TaskStatus::Failed);
    assert_eq!(
        log.results[2].error.as_deref(),
        Some("object out of reach")
    );
    assert_eq!(log.results[3].status, TaskStatus::Skipped);

    // The fourth task was never dispatched
    assert_eq!(calls.lock().unwrap().len(), 3);
}

/// The dispatched call order matches the plan exactly.
#[tokio::test]
async fn test_dispatch_order_matches_plan() {
    let env = ScriptedEnv::new(None);
    let calls = env.calls.clone();
    let mut pilot = pilot(env);

    let plan = pilot
        .plan_with_object_text("move the red block to the bowl", object_text())
        .await
        .unwrap();
    pilot.execute(&plan).await.unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(
        *calls,
        vec![
            "go_to red block",
            "pick red block",
            "go_to bowl",
            "place red block in bowl",
        ]
    );
}

/// Cancelling before execution marks everything skipped without a single
/// environment call.
#[tokio::test]
async fn test_cancel_before_execution() {
    let mut pilot = pilot(ScriptedEnv::new(None));

    let plan = pilot
        .plan_with_object_text("move the red block to the bowl", object_text())
        .await
        .unwrap();

    pilot.cancel_flag().cancel();
    let log = pilot.execute(&plan).await.unwrap();

    assert!(log
        .results
        .iter()
        .all(|r| r.status == TaskStatus::Skipped));
}

/// continue_on_failure keeps dispatching after the rejected call.
#[tokio::test]
async fn test_continue_on_failure_mode() {
    let mut config = PilotConfig::default();
    config.continue_on_failure = true;

    let mut pilot = Pilot::new(
        config,
        ScriptedOracle::new(vec![GOAL_RESPONSE]),
        ScriptedOracle::new(vec![TASK_RESPONSE]),
        ScriptedEnv::new(Some(1)),
    )
    .unwrap();

    let plan = pilot
        .plan_with_object_text("move the red block to the bowl", object_text())
        .await
        .unwrap();
    let log = pilot.execute(&plan).await.unwrap();

    assert_eq!(log.results[1].status, TaskStatus::Failed);
    assert_eq!(log.results[2].status, TaskStatus::Succeeded);
    assert_eq!(log.results[3].status, TaskStatus::Succeeded);
}
