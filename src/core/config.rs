//! Pipeline configuration
//!
//! One explicit, immutable value constructed at startup and handed to each
//! component. Nothing here is process-global: two concurrent runs with
//! different configs must not observe each other.

use crate::core::error::{PilotError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Settings for one decomposition stage's oracle call.
#[derive(Debug, Clone, Deserialize)]
pub struct StageConfig {
    /// Model identifier passed through to the oracle API.
    pub model: String,
    /// Optional prompt cache key forwarded to OpenAI-compatible APIs.
    #[serde(default)]
    pub prompt_cache_key: Option<String>,
}

/// Oracle endpoint plus per-stage model settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    /// API endpoint URL. Anthropic vs OpenAI-compatible format is detected
    /// from this URL.
    pub api_url: String,
    pub goal_decomp: StageConfig,
    pub task_decomp: StageConfig,
}

/// Retry/timeout bounds for the two suspension-point kinds (oracle calls
/// and remote environment calls). Distinct from the task-level
/// stop-on-first-failure policy.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RetryConfig {
    /// Additional attempts after the first failure. Default 0: fail fast.
    #[serde(default)]
    pub max_retries: u32,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RetryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// The permitted skills for one robot.
#[derive(Debug, Clone, Deserialize)]
pub struct RobotSkillsConfig {
    pub name: String,
    pub skills: Vec<String>,
}

/// Top-level configuration for a pipeline run.
#[derive(Debug, Clone, Deserialize)]
pub struct PilotConfig {
    pub oracle: OracleConfig,
    /// Base URL of the remote environment service.
    #[serde(default = "default_env_url")]
    pub env_url: String,
    #[serde(default)]
    pub retry: RetryConfig,
    pub robots: Vec<RobotSkillsConfig>,
    /// Keep dispatching after a failed task instead of halting.
    /// Stop-on-first-failure is the default contract.
    #[serde(default)]
    pub continue_on_failure: bool,
}

fn default_env_url() -> String {
    "http://127.0.0.1:8800".into()
}

impl Default for PilotConfig {
    fn default() -> Self {
        Self {
            oracle: OracleConfig {
                api_url: "https://api.anthropic.com/v1/messages".into(),
                goal_decomp: StageConfig {
                    model: "claude-3-haiku-20240307".into(),
                    prompt_cache_key: Some("goal_decomp".into()),
                },
                task_decomp: StageConfig {
                    model: "claude-3-haiku-20240307".into(),
                    prompt_cache_key: Some("task_decomp".into()),
                },
            },
            env_url: default_env_url(),
            retry: RetryConfig::default(),
            robots: vec![RobotSkillsConfig {
                name: "robot1".into(),
                skills: vec![
                    "GoToObject".into(),
                    "PickObject".into(),
                    "PlaceObject".into(),
                ],
            }],
            continue_on_failure: false,
        }
    }
}

impl PilotConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&text).map_err(|e| PilotError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.robots.is_empty() {
            return Err(PilotError::Config("no robots configured".into()));
        }
        for robot in &self.robots {
            if robot.skills.is_empty() {
                return Err(PilotError::Config(format!(
                    "robot '{}' has an empty skill list",
                    robot.name
                )));
            }
            for skill in &robot.skills {
                if crate::skills::SkillKind::from_name(skill).is_none() {
                    return Err(PilotError::Config(format!(
                        "robot '{}' lists unknown skill '{}'",
                        robot.name, skill
                    )));
                }
            }
        }
        if self.retry.timeout_secs == 0 {
            return Err(PilotError::Config("timeout_secs must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PilotConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.robots[0].name, "robot1");
        assert_eq!(config.robots[0].skills.len(), 3);
        assert!(!config.continue_on_failure);
    }

    #[test]
    fn test_empty_robots_rejected() {
        let mut config = PilotConfig::default();
        config.robots.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_skill_rejected() {
        let mut config = PilotConfig::default();
        config.robots[0].skills.push("FlyToMoon".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_toml() {
        let text = r#"
            env_url = "http://localhost:9000"
            continue_on_failure = true

            [oracle]
            api_url = "https://api.deepseek.com/chat/completions"

            [oracle.goal_decomp]
            model = "deepseek-chat"

            [oracle.task_decomp]
            model = "deepseek-chat"
            prompt_cache_key = "task_decomp"

            [retry]
            max_retries = 2
            timeout_secs = 10

            [[robots]]
            name = "robot1"
            skills = ["GoToObject", "PickObject"]
        "#;
        let config: PilotConfig = toml::from_str(text).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.env_url, "http://localhost:9000");
        assert!(config.continue_on_failure);
        assert!(config.oracle.goal_decomp.prompt_cache_key.is_none());
    }
}
