//! Two-stage decomposition pipeline
//!
//! `goal_decomp` turns the user command plus the environment snapshot into
//! an ordered list of subgoals; `task_decomp` turns those subgoals into
//! catalog-constrained skill invocations in one batched oracle call. The
//! stages are strictly ordered with no retry loop between them: a failure
//! in either fails the whole run.

pub mod goal_decomp;
pub mod sequencer;
pub mod task_decomp;

use crate::core::error::Result;
use crate::oracle::Oracle;
use crate::skills::{SkillCatalog, SkillKind};
use serde::{Deserialize, Serialize};

/// Immutable input to one pipeline run, built once before stage 1.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// The command being decomposed.
    pub user_command: String,
    /// Prior commands from the same session, oldest first. Auxiliary
    /// context only; the latest command is authoritative.
    pub history: Vec<String>,
    /// Textual snapshot of currently visible environment objects.
    pub object_text: String,
    /// The legal action vocabulary, formatted for prompting.
    pub skill_text: String,
}

/// One intermediate objective produced by stage 1. Order is execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subgoal {
    pub description: String,
}

/// One concrete, catalog-validated action instance produced by stage 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillTask {
    /// Index into the stage-1 subgoal list this task belongs to.
    pub subgoal_index: usize,
    pub skill: SkillKind,
    pub target: String,
    /// Secondary target; only meaningful for place-type skills.
    pub destination: Option<String>,
    /// Position within the subgoal's task list, used as a stable-sort
    /// tiebreak by the sequencer.
    pub ordinal: u32,
}

/// Stage-2 output for one subgoal: its ordered task list.
#[derive(Debug, Clone)]
pub struct SubgoalPlan {
    pub subgoal_index: usize,
    pub tasks: Vec<SkillTask>,
}

/// Pipeline stages. `Failed` is reachable from either decomposition stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    GoalDecomp,
    TaskDecomp,
    Done,
    Failed,
}

/// Mutable accumulator threaded through the two stages. Owned by exactly
/// one run; discarded when the run completes or fails.
#[derive(Debug)]
pub struct PipelineState {
    pub context: CommandContext,
    pub stage: Stage,
    pub subgoals: Vec<Subgoal>,
    pub plans: Vec<SubgoalPlan>,
}

impl PipelineState {
    pub fn new(context: CommandContext) -> Self {
        Self {
            context,
            stage: Stage::Start,
            subgoals: Vec::new(),
            plans: Vec::new(),
        }
    }
}

/// The finished decomposition: subgoals plus the flattened task sequence.
#[derive(Debug)]
pub struct Plan {
    pub subgoals: Vec<Subgoal>,
    pub tasks: Vec<SkillTask>,
}

/// Run the full pipeline: stage 1, stage 2, then sequencing.
///
/// The two stages may be served by different oracle instances (different
/// models per stage); both must implement the same [`Oracle`] contract.
pub async fn run<O: Oracle>(
    goal_oracle: &O,
    task_oracle: &O,
    context: CommandContext,
    catalog: &SkillCatalog,
) -> Result<Plan> {
    let mut state = PipelineState::new(context);

    state.stage = Stage::GoalDecomp;
    tracing::info!("============= GOAL_DECOMP =============");
    state.subgoals = match goal_decomp::run_goal_decomp(goal_oracle, &state.context).await {
        Ok(subgoals) => subgoals,
        Err(e) => {
            state.stage = Stage::Failed;
            return Err(e);
        }
    };
    for (i, subgoal) in state.subgoals.iter().enumerate() {
        tracing::info!("subgoal {}: {}", i, subgoal.description);
    }

    state.stage = Stage::TaskDecomp;
    tracing::info!("============= TASK_DECOMP =============");
    state.plans = match task_decomp::run_task_decomp(
        task_oracle,
        &state.context,
        &state.subgoals,
        catalog,
    )
    .await
    {
        Ok(plans) => plans,
        Err(e) => {
            state.stage = Stage::Failed;
            return Err(e);
        }
    };

    let tasks = sequencer::flatten(&state.subgoals, &state.plans)?;
    state.stage = Stage::Done;
    tracing::info!("pipeline done: {} tasks", tasks.len());

    Ok(Plan {
        subgoals: state.subgoals,
        tasks,
    })
}
