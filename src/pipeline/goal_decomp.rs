//! Stage 1: goal decomposition
//!
//! One oracle call turning the user command plus the object snapshot into
//! an ordered list of subgoal descriptions. Each subgoal must be grounded
//! in concrete object attributes from the snapshot (color, type), not
//! vague references. An empty list or unparseable output is a hard error;
//! there is no partial acceptance.

use crate::core::error::{PilotError, Result};
use crate::oracle::{extract_json, Oracle};
use crate::pipeline::{CommandContext, Subgoal};
use serde::Deserialize;

/// Expected stage-1 output schema.
#[derive(Deserialize)]
struct GoalDecompResponse {
    subgoals: Vec<String>,
}

/// Run goal decomposition against the oracle.
pub async fn run_goal_decomp<O: Oracle>(
    oracle: &O,
    context: &CommandContext,
) -> Result<Vec<Subgoal>> {
    let user_prompt = build_user_prompt(context);
    let response = oracle.complete(GOAL_DECOMP_PROMPT, &user_prompt).await?;

    let json_str = extract_json(&response)?;
    let parsed: GoalDecompResponse = serde_json::from_str(json_str).map_err(|e| {
        PilotError::contract(format!("failed to parse subgoals: {}", e), &response)
    })?;

    if parsed.subgoals.is_empty() {
        return Err(PilotError::contract("oracle returned no subgoals", &response));
    }

    Ok(parsed
        .subgoals
        .into_iter()
        .map(|description| Subgoal { description })
        .collect())
}

fn build_user_prompt(context: &CommandContext) -> String {
    let mut prompt = String::new();
    if !context.history.is_empty() {
        prompt.push_str(&format!(
            "PRIOR COMMANDS:\n{}\n\n",
            context.history.join("\n")
        ));
    }
    prompt.push_str(&format!(
        "VISIBLE OBJECTS:\n{}\n\nUSER COMMAND:\n{}\n\nDecompose this command into subgoals as JSON:",
        context.object_text, context.user_command
    ));
    prompt
}

/// System prompt for goal decomposition
const GOAL_DECOMP_PROMPT: &str = r#"You are decomposing a natural language command for a robot into subgoals.
Break the command into an ordered list of intermediate objectives.

RULES:
- Ground every subgoal in the concrete attributes of objects listed in VISIBLE OBJECTS (color, type), never vague references like "it" or "the thing".
- Keep subgoals in the order they must be carried out.
- Each subgoal is one short imperative sentence.
- Only reference objects that appear in VISIBLE OBJECTS.

OUTPUT FORMAT (JSON only, no explanation):
{
  "subgoals": ["first subgoal", "second subgoal"]
}

Examples:
"move the red block to the bowl" with a red block and a bowl visible
-> {"subgoals": ["move red block to bowl"]}

"put the green cube on the tray and bring the mug to the sink" with those objects visible
-> {"subgoals": ["place green cube on tray", "move mug to sink"]}
"#;
