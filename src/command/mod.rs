//! Command entry point
//!
//! Wires the snapshot provider, skill catalog, decomposition pipeline, and
//! task executor into one front door: plan a command, or plan and execute
//! it. Transport framing of this entry point (HTTP or otherwise) is the
//! caller's business.

pub mod executor;

pub use executor::{CancelFlag, ExecutionLog, ExecutionResult, TaskExecutor, TaskStatus};

use crate::core::config::PilotConfig;
use crate::core::error::{PilotError, Result};
use crate::environment::{fetch_object_text, HttpEnv, RemoteEnv};
use crate::oracle::{LlmClient, Oracle};
use crate::pipeline::{self, CommandContext, Plan};
use crate::skills::SkillCatalog;

/// One command session: owns the oracles, the environment handle, and the
/// catalog for the target robot. Each `plan`/`run` call is one pipeline
/// run with its own state.
pub struct Pilot<O: Oracle, E: RemoteEnv> {
    config: PilotConfig,
    goal_oracle: O,
    task_oracle: O,
    env: E,
    catalog: SkillCatalog,
    history: Vec<String>,
    cancel: CancelFlag,
}

impl Pilot<LlmClient, HttpEnv> {
    /// Build a pilot for the first configured robot, using the HTTP oracle
    /// and environment clients.
    pub fn from_config(config: PilotConfig) -> Result<Self> {
        config.validate()?;
        let goal_oracle =
            LlmClient::for_stage(&config.oracle, &config.oracle.goal_decomp, config.retry)?;
        let task_oracle =
            LlmClient::for_stage(&config.oracle, &config.oracle.task_decomp, config.retry)?;
        let env = HttpEnv::new(config.env_url.clone(), config.retry);
        Self::new(config, goal_oracle, task_oracle, env)
    }
}

impl<O: Oracle, E: RemoteEnv> Pilot<O, E> {
    /// Build a pilot with explicit oracle and environment implementations.
    pub fn new(config: PilotConfig, goal_oracle: O, task_oracle: O, env: E) -> Result<Self> {
        let robot = config
            .robots
            .first()
            .ok_or_else(|| PilotError::Config("no robots configured".into()))?;
        let catalog = SkillCatalog::new(&robot.name, &robot.skills);
        Ok(Self {
            config,
            goal_oracle,
            task_oracle,
            env,
            catalog,
            history: Vec::new(),
            cancel: CancelFlag::new(),
        })
    }

    /// Handle for cancelling execution between task dispatches.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn catalog(&self) -> &SkillCatalog {
        &self.catalog
    }

    /// Decompose one command into an ordered task sequence.
    ///
    /// Fetches a fresh environment snapshot, then runs both stages and the
    /// sequencer. The command joins the session history afterwards.
    pub async fn plan(&mut self, command: &str) -> Result<Plan> {
        let object_text = fetch_object_text(&self.config.env_url, self.config.retry).await?;
        self.plan_with_object_text(command, object_text).await
    }

    /// Plan against an already-fetched snapshot.
    pub async fn plan_with_object_text(
        &mut self,
        command: &str,
        object_text: String,
    ) -> Result<Plan> {
        let context = CommandContext {
            user_command: command.to_string(),
            history: self.history.clone(),
            object_text,
            skill_text: self.catalog.skill_text(),
        };

        let plan =
            pipeline::run(&self.goal_oracle, &self.task_oracle, context, &self.catalog).await?;
        self.history.push(command.to_string());
        Ok(plan)
    }

    /// Plan one command and execute the resulting sequence.
    pub async fn run(&mut self, command: &str) -> Result<(Plan, ExecutionLog)> {
        let plan = self.plan(command).await?;
        let log = self.execute(&plan).await?;
        Ok((plan, log))
    }

    /// Execute a previously produced plan.
    pub async fn execute(&self, plan: &Plan) -> Result<ExecutionLog> {
        let executor = TaskExecutor::new(&self.env, &self.catalog)
            .continue_on_failure(self.config.continue_on_failure)
            .with_cancel_flag(self.cancel.clone());
        executor.execute(plan.tasks.clone()).await
    }
}
