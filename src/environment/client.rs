//! HTTP implementation of the remote environment interface
//!
//! Skill calls post to `{env_url}/skills/<skill>` with a JSON target
//! payload and read back `{"success": bool, "detail": ...}`.

use crate::core::config::RetryConfig;
use crate::core::error::{PilotError, Result};
use crate::environment::{RemoteEnv, SkillOutcome};
use serde::{Deserialize, Serialize};

pub struct HttpEnv {
    client: reqwest::Client,
    env_url: String,
    max_retries: u32,
}

#[derive(Serialize)]
struct SkillRequest<'a> {
    target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    destination: Option<&'a str>,
}

#[derive(Deserialize)]
struct SkillResponse {
    success: bool,
    #[serde(default)]
    detail: Option<String>,
}

impl HttpEnv {
    pub fn new(env_url: impl Into<String>, retry: RetryConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(retry.timeout())
            .build()
            .unwrap_or_default();
        Self {
            client,
            env_url: env_url.into(),
            max_retries: retry.max_retries,
        }
    }

    /// Post one skill call, retrying transport failures up to the bound.
    async fn call(&self, skill: &str, target: &str, destination: Option<&str>) -> Result<SkillOutcome> {
        let url = format!("{}/skills/{}", self.env_url, skill);
        let body = SkillRequest {
            target,
            destination,
        };

        let mut attempt = 0;
        loop {
            let result = self.post_once(&url, &body).await;
            match result {
                Ok(outcome) => return Ok(outcome),
                Err(err) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        "environment call {} failed ({}), retry {}/{}",
                        skill,
                        err,
                        attempt,
                        self.max_retries
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn post_once(&self, url: &str, body: &SkillRequest<'_>) -> Result<SkillOutcome> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| PilotError::UpstreamUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PilotError::UpstreamUnavailable(format!(
                "environment returned {}",
                response.status()
            )));
        }

        let outcome: SkillResponse = response
            .json()
            .await
            .map_err(|e| PilotError::UpstreamUnavailable(e.to_string()))?;

        Ok(SkillOutcome {
            success: outcome.success,
            detail: outcome.detail,
        })
    }
}

impl RemoteEnv for HttpEnv {
    async fn go_to(&self, target: &str) -> Result<SkillOutcome> {
        self.call("GoToObject", target, None).await
    }

    async fn pick(&self, target: &str) -> Result<SkillOutcome> {
        self.call("PickObject", target, None).await
    }

    async fn place(&self, target: &str, destination: Option<&str>) -> Result<SkillOutcome> {
        self.call("PlaceObject", target, destination).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_request_skips_absent_destination() {
        let body = SkillRequest {
            target: "red block",
            destination: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"target":"red block"}"#);
    }

    #[test]
    fn test_skill_request_includes_destination() {
        let body = SkillRequest {
            target: "red block",
            destination: Some("bowl"),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"destination\":\"bowl\""));
    }

    #[test]
    fn test_skill_response_default_detail() {
        let response: SkillResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(response.success);
        assert!(response.detail.is_none());
    }
}
