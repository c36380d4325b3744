//! Remote environment interface
//!
//! The environment service owns the physical (or simulated) world. This
//! module fetches object snapshots for prompting and exposes one call per
//! skill kind for the task executor. Everything is behind the [`RemoteEnv`]
//! trait so tests can script outcomes without a live service.

pub mod client;
pub mod snapshot;

pub use client::HttpEnv;
pub use snapshot::fetch_object_text;

use crate::core::error::Result;

/// Outcome of one dispatched skill call.
#[derive(Debug, Clone)]
pub struct SkillOutcome {
    pub success: bool,
    /// Optional diagnostic payload from the environment.
    pub detail: Option<String>,
}

impl SkillOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            detail: None,
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            detail: Some(detail.into()),
        }
    }
}

/// One call per skill kind.
///
/// A returned `SkillOutcome` with `success == false` means the environment
/// rejected the action (an execution failure, handled by the executor's
/// stop-on-first-failure policy). An `Err` means the environment itself was
/// unreachable after the configured retries.
pub trait RemoteEnv {
    fn go_to(
        &self,
        target: &str,
    ) -> impl std::future::Future<Output = Result<SkillOutcome>> + Send;

    fn pick(
        &self,
        target: &str,
    ) -> impl std::future::Future<Output = Result<SkillOutcome>> + Send;

    fn place(
        &self,
        target: &str,
        destination: Option<&str>,
    ) -> impl std::future::Future<Output = Result<SkillOutcome>> + Send;
}
