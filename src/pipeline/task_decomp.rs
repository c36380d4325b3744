//! Stage 2: task decomposition
//!
//! One batched oracle call covering every subgoal from stage 1 (not one
//! call per subgoal). The prompt restates the skill catalog as the only
//! legal action vocabulary; any task naming a skill outside the catalog is
//! a contract violation for the stage.

use crate::core::error::{PilotError, Result};
use crate::oracle::{extract_json, Oracle};
use crate::pipeline::{CommandContext, SkillTask, Subgoal, SubgoalPlan};
use crate::skills::{SkillCatalog, SkillKind};
use serde::Deserialize;

/// Expected stage-2 output schema.
#[derive(Deserialize)]
struct TaskDecompResponse {
    plans: Vec<PlanRecord>,
}

#[derive(Deserialize)]
struct PlanRecord {
    subgoal_index: usize,
    tasks: Vec<TaskRecord>,
}

#[derive(Deserialize)]
struct TaskRecord {
    skill: String,
    target: String,
    #[serde(default)]
    destination: Option<String>,
}

/// Run task decomposition against the oracle for the full subgoal set.
pub async fn run_task_decomp<O: Oracle>(
    oracle: &O,
    context: &CommandContext,
    subgoals: &[Subgoal],
    catalog: &SkillCatalog,
) -> Result<Vec<SubgoalPlan>> {
    let user_prompt = build_user_prompt(context, subgoals);
    let response = oracle.complete(TASK_DECOMP_PROMPT, &user_prompt).await?;

    let json_str = extract_json(&response)?;
    let parsed: TaskDecompResponse = serde_json::from_str(json_str).map_err(|e| {
        PilotError::contract(format!("failed to parse task plans: {}", e), &response)
    })?;

    let mut plans = Vec::with_capacity(parsed.plans.len());
    for record in parsed.plans {
        let mut tasks = Vec::with_capacity(record.tasks.len());
        for (ordinal, task) in record.tasks.into_iter().enumerate() {
            let skill = validate_skill(&task.skill, catalog, &response)?;
            tasks.push(SkillTask {
                subgoal_index: record.subgoal_index,
                skill,
                target: task.target,
                destination: task.destination,
                ordinal: ordinal as u32,
            });
        }
        plans.push(SubgoalPlan {
            subgoal_index: record.subgoal_index,
            tasks,
        });
    }

    Ok(plans)
}

/// Reject skill names outside the robot's catalog.
fn validate_skill(name: &str, catalog: &SkillCatalog, raw: &str) -> Result<SkillKind> {
    let skill = SkillKind::from_name(name).ok_or_else(|| {
        PilotError::contract(format!("unknown skill '{}' in task plan", name), raw)
    })?;
    if !catalog.contains(skill) {
        return Err(PilotError::contract(
            format!(
                "skill '{}' is not permitted for robot '{}'",
                name, catalog.robot_name
            ),
            raw,
        ));
    }
    Ok(skill)
}

fn build_user_prompt(context: &CommandContext, subgoals: &[Subgoal]) -> String {
    let subgoal_list = subgoals
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}: {}", i, s.description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "AVAILABLE SKILLS:\n{}\n\nVISIBLE OBJECTS:\n{}\n\nSUBGOALS:\n{}\n\nProduce the task plan as JSON:",
        context.skill_text, context.object_text, subgoal_list
    )
}

/// System prompt for task decomposition
const TASK_DECOMP_PROMPT: &str = r#"You are converting robot subgoals into concrete skill invocations.
For EVERY subgoal, produce an ordered list of skill calls.

RULES:
- Use ONLY skills listed under AVAILABLE SKILLS. No other action names exist.
- Every skill call names exactly one target object from VISIBLE OBJECTS.
- PlaceObject may additionally name a destination object.
- Keep each subgoal's tasks in execution order.
- A typical manipulation subgoal is: go to the object, pick it, go to the destination, place it.

OUTPUT FORMAT (JSON only, no explanation):
{
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
}
"#;
