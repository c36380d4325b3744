//! Environment snapshot provider
//!
//! Fetches the list of currently visible objects from the environment
//! service and formats it into the `object_text` block fed to stage 1.
//! Fetched once per pipeline run, before goal decomposition.

use crate::core::config::RetryConfig;
use crate::core::error::{PilotError, Result};
use serde::Deserialize;

#[derive(Deserialize)]
struct EnvSnapshot {
    objects: Vec<String>,
}

/// Fetch the current object list from `GET {env_url}/env` and format it.
pub async fn fetch_object_text(env_url: &str, retry: RetryConfig) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(retry.timeout())
        .build()
        .unwrap_or_default();

    let mut attempt = 0;
    let snapshot: EnvSnapshot = loop {
        let result = fetch_snapshot(&client, env_url).await;
        match result {
            Ok(snapshot) => break snapshot,
            Err(err) if attempt < retry.max_retries => {
                attempt += 1;
                tracing::warn!(
                    "snapshot fetch failed ({}), retry {}/{}",
                    err,
                    attempt,
                    retry.max_retries
                );
            }
            Err(err) => return Err(err),
        }
    };

    Ok(format_object_text(&snapshot.objects))
}

async fn fetch_snapshot(client: &reqwest::Client, env_url: &str) -> Result<EnvSnapshot> {
    let response = client
        .get(format!("{}/env", env_url))
        .send()
        .await
        .map_err(|e| PilotError::UpstreamUnavailable(e.to_string()))?;

    if !response.status().is_success() {
        return Err(PilotError::UpstreamUnavailable(format!(
            "environment returned {}",
            response.status()
        )));
    }

    response
        .json()
        .await
        .map_err(|e| PilotError::UpstreamUnavailable(e.to_string()))
}

/// Format object names into the prompt block, one entry per line.
pub fn format_object_text(objects: &[String]) -> String {
    let mut text = String::from("{\n");
    for obj in objects {
        text.push_str(&format!("\"object_name\": \"{}\",\n", obj));
    }
    text.push('}');
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_object_text() {
        let objects = vec!["red block".to_string(), "bowl".to_string()];
        let text = format_object_text(&objects);
        assert!(text.starts_with("{\n"));
        assert!(text.ends_with('}'));
        assert!(text.contains("\"object_name\": \"red block\","));
        assert!(text.contains("\"object_name\": \"bowl\","));
    }

    #[test]
    fn test_format_empty_snapshot() {
        assert_eq!(format_object_text(&[]), "{\n}");
    }
}
