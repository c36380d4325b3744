//! Robopilot - Entry Point
//!
//! Plans (and optionally executes) natural language robot commands.
//! With a command argument this is a one-shot run; without one it drops
//! into an interactive loop.

use clap::Parser;
use robopilot::command::{ExecutionLog, Pilot, TaskStatus};
use robopilot::core::config::PilotConfig;
use robopilot::core::error::Result;
use robopilot::pipeline::Plan;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "robopilot", about = "Decompose natural language commands into robot actions")]
struct Args {
    /// Command to decompose; omit for an interactive session
    command: Option<String>,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the remote environment URL
    #[arg(long)]
    env_url: Option<String>,

    /// Execute the plan against the environment after decomposition
    #[arg(long)]
    execute: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "robopilot=info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PilotConfig::from_toml_file(path)?,
        None => PilotConfig::default(),
    };
    if let Some(env_url) = args.env_url {
        config.env_url = env_url;
    }

    let mut pilot = Pilot::from_config(config)?;

    if let Some(command) = args.command {
        handle_command(&mut pilot, &command, args.execute).await?;
        return Ok(());
    }

    println!("=== ROBOPILOT ===");
    println!("Type a command for the robot, 'quit' or 'q' to exit.");
    println!();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();

        if input.is_empty() {
            continue;
        }
        if input == "quit" || input == "q" {
            break;
        }

        if let Err(e) = handle_command(&mut pilot, input, args.execute).await {
            println!("Error: {}", e);
        }
    }

    Ok(())
}

async fn handle_command(
    pilot: &mut Pilot<robopilot::oracle::LlmClient, robopilot::environment::HttpEnv>,
    command: &str,
    execute: bool,
) -> Result<()> {
    let plan = pilot.plan(command).await?;
    print_plan(&plan);

    if execute {
        let log = pilot.execute(&plan).await?;
        print_log(&log);
    }

    Ok(())
}

fn print_plan(plan: &Plan) {
    println!("Subgoals:");
    for (i, subgoal) in plan.subgoals.iter().enumerate() {
        println!("  {}: {}", i, subgoal.description);
    }
    println!("Tasks:");
    for task in &plan.tasks {
        match &task.destination {
            Some(dest) => println!(
                "  [{}] {}({} -> {})",
                task.subgoal_index, task.skill, task.target, dest
            ),
            None => println!("  [{}] {}({})", task.subgoal_index, task.skill, task.target),
        }
    }
}

fn print_log(log: &ExecutionLog) {
    println!("Execution:");
    for result in &log.results {
        let status = match result.status {
            TaskStatus::Succeeded => "ok",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Skipped => "skipped",
        };
        match &result.error {
            Some(error) => println!(
                "  {} {}({}) - {}",
                status, result.task.skill, result.task.target, error
            ),
            None => println!("  {} {}({})", status, result.task.skill, result.task.target),
        }
    }
    if log.all_succeeded() {
        println!("All tasks succeeded.");
    } else {
        println!("Run did not complete.");
    }
}
