//! Task sequencer
//!
//! Pure flattening of per-subgoal task plans into one globally ordered
//! sequence. Subgoal order is authoritative: all tasks for subgoal i
//! precede all tasks for subgoal i+1. Within a subgoal the produced order
//! is kept, with the per-task ordinal as a stable-sort tiebreak. No
//! reordering by skill, object, or heuristic.

use crate::core::error::{PilotError, Result};
use crate::pipeline::{SkillTask, Subgoal, SubgoalPlan};

/// Flatten per-subgoal plans into one ordered task sequence.
///
/// A subgoal with no plan or an empty task list is a valid no-op. A plan
/// index outside the subgoal list, or a duplicated index, is a
/// `SequencingInconsistency` and fails the run.
pub fn flatten(subgoals: &[Subgoal], plans: &[SubgoalPlan]) -> Result<Vec<SkillTask>> {
    let mut by_subgoal: Vec<Option<&SubgoalPlan>> = vec![None; subgoals.len()];
    for plan in plans {
        if plan.subgoal_index >= subgoals.len() {
            return Err(PilotError::SequencingInconsistency(format!(
                "plan references subgoal {} but only {} subgoals exist",
                plan.subgoal_index,
                subgoals.len()
            )));
        }
        if by_subgoal[plan.subgoal_index].is_some() {
            return Err(PilotError::SequencingInconsistency(format!(
                "subgoal {} has more than one task plan",
                plan.subgoal_index
            )));
        }
        by_subgoal[plan.subgoal_index] = Some(plan);
    }

    let mut flattened = Vec::new();
    for slot in by_subgoal {
        let Some(plan) = slot else {
            continue; // no-op subgoal
        };
        let mut tasks = plan.tasks.clone();
        tasks.sort_by_key(|t| t.ordinal);
        flattened.extend(tasks);
    }

    Ok(flattened)
}
