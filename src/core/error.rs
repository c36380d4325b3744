use thiserror::Error;

/// Structured error kinds for a pipeline run.
///
/// Every variant carries enough payload for the caller to distinguish
/// "ask the oracle again" from "replan needed" from "environment is broken".
/// A task failing at the remote environment is NOT an error here: the
/// executor records it in the execution log and halts (stop-on-first-failure).
#[derive(Error, Debug)]
pub enum PilotError {
    /// Oracle output failed the required schema, or referenced a skill or
    /// object outside the allowed vocabulary. Carries the raw output for
    /// diagnosis. Not retried.
    #[error("contract violation: {message}")]
    ContractViolation { message: String, raw: String },

    /// Oracle or remote environment unreachable or timed out after the
    /// configured retry bound.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Subgoal/task-index mismatch between the two decomposition stages.
    /// Fatal for the run; never silently patched.
    #[error("sequencing inconsistency: {0}")]
    SequencingInconsistency(String),

    /// Invalid configuration (unknown robot, empty catalog, zero timeout).
    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl PilotError {
    /// Shorthand for a contract violation with the offending raw output.
    pub fn contract(message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self::ContractViolation {
            message: message.into(),
            raw: raw.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PilotError>;
