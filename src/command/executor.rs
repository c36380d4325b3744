//! Task execution - replays the flattened task sequence against the
//! remote environment
//!
//! Dispatch is a closed match from skill kind to one remote call shape.
//! Tasks run strictly in order, one at a time; the default policy is
//! stop-on-first-failure, with remaining tasks marked `Skipped`.

use crate::core::error::{PilotError, Result};
use crate::environment::RemoteEnv;
use crate::pipeline::SkillTask;
use crate::skills::{SkillCatalog, SkillKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Outcome of one task in the execution log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Succeeded,
    Failed,
    /// Never attempted: an earlier task failed or the run was cancelled.
    Skipped,
}

/// One entry in the execution log.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub task: SkillTask,
    pub status: TaskStatus,
    pub error: Option<String>,
}

/// Ordered execution log for one run.
#[derive(Debug, Default)]
pub struct ExecutionLog {
    pub results: Vec<ExecutionResult>,
}

impl ExecutionLog {
    pub fn all_succeeded(&self) -> bool {
        self.results
            .iter()
            .all(|r| r.status == TaskStatus::Succeeded)
    }
}

/// Cooperative cancellation handle, checked before each dispatch.
///
/// Cancelling mid-flight is best-effort: an in-progress remote call may
/// still complete server-side.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Executes the flattened task sequence against a remote environment.
pub struct TaskExecutor<'a, E: RemoteEnv> {
    env: &'a E,
    catalog: &'a SkillCatalog,
    continue_on_failure: bool,
    cancel: CancelFlag,
}

impl<'a, E: RemoteEnv> TaskExecutor<'a, E> {
    pub fn new(env: &'a E, catalog: &'a SkillCatalog) -> Self {
        Self {
            env,
            catalog,
            continue_on_failure: false,
            cancel: CancelFlag::new(),
        }
    }

    /// Keep dispatching after a failed task instead of halting.
    pub fn continue_on_failure(mut self, yes: bool) -> Self {
        self.continue_on_failure = yes;
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Execute each task strictly in order, producing one log entry per
    /// task.
    ///
    /// A task the environment rejects (or a transport failure) records
    /// `Failed`; under the default policy every later task records
    /// `Skipped` without being attempted. Catalog violations that somehow
    /// reached execution are a fatal configuration error, not a log entry.
    pub async fn execute(&self, tasks: Vec<SkillTask>) -> Result<ExecutionLog> {
        // Re-validate defensively; stage 2 already enforced this.
        for task in &tasks {
            if !self.catalog.contains(task.skill) {
                return Err(PilotError::Config(format!(
                    "task uses skill '{}' outside robot '{}' catalog",
                    task.skill, self.catalog.robot_name
                )));
            }
        }

        let mut log = ExecutionLog::default();
        let mut halted = false;

        for task in tasks {
            if halted || self.cancel.is_cancelled() {
                log.results.push(ExecutionResult {
                    task,
                    status: TaskStatus::Skipped,
                    error: None,
                });
                continue;
            }

            tracing::info!("dispatch {} -> {}", task.skill, task.target);
            let outcome = self.dispatch(&task).await;

            match outcome {
                Ok(outcome) if outcome.success => {
                    log.results.push(ExecutionResult {
                        task,
                        status: TaskStatus::Succeeded,
                        error: None,
                    });
                }
                Ok(outcome) => {
                    tracing::warn!("task failed: {:?}", outcome.detail);
                    log.results.push(ExecutionResult {
                        task,
                        status: TaskStatus::Failed,
                        error: outcome.detail,
                    });
                    halted = !self.continue_on_failure;
                }
                Err(e) => {
                    tracing::warn!("environment call failed: {}", e);
                    log.results.push(ExecutionResult {
                        task,
                        status: TaskStatus::Failed,
                        error: Some(e.to_string()),
                    });
                    halted = !self.continue_on_failure;
                }
            }
        }

        Ok(log)
    }

    /// Closed mapping from skill kind to remote call shape.
    async fn dispatch(&self, task: &SkillTask) -> Result<crate::environment::SkillOutcome> {
        match task.skill {
            SkillKind::GoToObject => self.env.go_to(&task.target).await,
            SkillKind::PickObject => self.env.pick(&task.target).await,
            SkillKind::PlaceObject => {
                self.env
                    .place(&task.target, task.destination.as_deref())
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::SkillOutcome;
    use std::sync::Mutex;

    /// Scripted environment: fails on the nth call, records call order.
    struct ScriptedEnv {
        fail_at: Option<usize>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedEnv {
        fn new(fail_at: Option<usize>) -> Self {
            Self {
                fail_at,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, call: String) -> Result<SkillOutcome> {
            let mut calls = self.calls.lock().unwrap();
            let index = calls.len();
            calls.push(call);
            if self.fail_at == Some(index) {
                Ok(SkillOutcome::failed("gripper slipped"))
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
            self.record(format!("place {} {:?}", target, destination))
        }
    }

    fn catalog() -> SkillCatalog {
        SkillCatalog::new(
            "robot1",
            &[
                "GoToObject".to_string(),
                "PickObject".to_string(),
                "PlaceObject".to_string(),
            ],
        )
    }

    fn task(skill: SkillKind, target: &str, ordinal: u32) -> SkillTask {
        SkillTask {
            subgoal_index: 0,
            skill,
            target: target.into(),
            destination: None,
            ordinal,
        }
    }

    #[tokio::test]
    async fn test_all_tasks_succeed_in_order() {
        let env = ScriptedEnv::new(None);
        let catalog = catalog();
        let executor = TaskExecutor::new(&env, &catalog);

        let tasks = vec![
            task(SkillKind::GoToObject, "red block", 0),
            task(SkillKind::PickObject, "red block", 1),
        ];
        let log = executor.execute(tasks).await.unwrap();

        assert!(log.all_succeeded());
        assert_eq!(log.results.len(), 2);
        let calls = env.calls.lock().unwrap();
        assert_eq!(*calls, vec!["go_to red block", "pick red block"]);
    }

    #[tokio::test]
    async fn test_stop_on_first_failure() {
        let env = ScriptedEnv::new(Some(1));
        let catalog = catalog();
        let executor = TaskExecutor::new(&env, &catalog);

        let tasks = vec![
            task(SkillKind::GoToObject, "t1", 0),
            task(SkillKind::PickObject, "t2", 1),
            task(SkillKind::GoToObject, "t3", 2),
        ];
        let log = executor.execute(tasks).await.unwrap();

        assert!(!log.all_succeeded());
        assert_eq!(log.results[0].status, TaskStatus::Succeeded);
        assert_eq!(log.results[1].status, TaskStatus::Failed);
        assert_eq!(log.results[1].error.as_deref(), Some("gripper slipped"));
        assert_eq!(log.results[2].status, TaskStatus::Skipped);

        // Third task was never dispatched
        assert_eq!(env.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_continue_on_failure_keeps_dispatching() {
        let env = ScriptedEnv::new(Some(0));
        let catalog = catalog();
        let executor = TaskExecutor::new(&env, &catalog).continue_on_failure(true);

        let tasks = vec![
            task(SkillKind::GoToObject, "t1", 0),
            task(SkillKind::PickObject, "t2", 1),
        ];
        let log = executor.execute(tasks).await.unwrap();

        assert_eq!(log.results[0].status, TaskStatus::Failed);
        assert_eq!(log.results[1].status, TaskStatus::Succeeded);
        assert_eq!(env.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cancellation_skips_remaining() {
        let env = ScriptedEnv::new(None);
        let catalog = catalog();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let executor = TaskExecutor::new(&env, &catalog).with_cancel_flag(cancel);

        let tasks = vec![task(SkillKind::GoToObject, "t1", 0)];
        let log = executor.execute(tasks).await.unwrap();

        assert_eq!(log.results[0].status, TaskStatus::Skipped);
        assert!(env.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_catalog_violation_is_fatal() {
        let env = ScriptedEnv::new(None);
        let narrow = SkillCatalog::new("robot1", &["GoToObject".to_string()]);
        let executor = TaskExecutor::new(&env, &narrow);

        let tasks = vec![task(SkillKind::PickObject, "t1", 0)];
        let err = executor.execute(tasks).await.unwrap_err();

        assert!(matches!(err, PilotError::Config(_)));
        assert!(env.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_place_passes_destination() {
        let env = ScriptedEnv::new(None);
        let catalog = catalog();
        let executor = TaskExecutor::new(&env, &catalog);

        let mut place = task(SkillKind::PlaceObject, "red block", 0);
        place.destination = Some("bowl".into());
        executor.execute(vec![place]).await.unwrap();

        let calls = env.calls.lock().unwrap();
        assert_eq!(*calls, vec!["place red block Some(\"bowl\")"]);
    }
}
