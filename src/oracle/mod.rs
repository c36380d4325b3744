//! Structured oracle interface
//!
//! The two decomposition stages call a large language model treated as a
//! black box: free-form text in, schema-conformant JSON out. The pipeline
//! depends only on the [`Oracle`] trait so the underlying provider is
//! swappable (and mockable in tests).

pub mod client;

pub use client::LlmClient;

use crate::core::error::{PilotError, Result};

/// A text-to-text completion oracle.
///
/// Implementations are responsible for their own timeout and bounded retry;
/// exhausting retries surfaces as `UpstreamUnavailable`.
pub trait Oracle {
    fn complete(
        &self,
        system: &str,
        user: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// Extract the outermost JSON object from a free-form oracle response.
///
/// Models often wrap JSON in prose; everything before the first `{` and
/// after the last `}` is discarded. No braces at all is a contract
/// violation carrying the raw response.
pub fn extract_json(response: &str) -> Result<&str> {
    let start = response
        .find('{')
        .ok_or_else(|| PilotError::contract("no JSON object in oracle response", response))?;
    let end = response
        .rfind('}')
        .ok_or_else(|| PilotError::contract("no closing brace in oracle response", response))?;
    if end < start {
        return Err(PilotError::contract(
            "malformed JSON braces in oracle response",
            response,
        ));
    }
    Ok(&response[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_simple() {
        let response = r#"{"subgoals": ["move red block to bowl"]}"#;
        assert_eq!(extract_json(response).unwrap(), response);
    }

    #[test]
    fn test_extract_json_with_surrounding_text() {
        let response = "Here is the decomposition:\n{\"subgoals\": [\"a\"]}\nDone.";
        let json = extract_json(response).unwrap();
        assert!(json.starts_with('{'));
        assert!(json.ends_with('}'));
        assert!(json.contains("subgoals"));
    }

    #[test]
    fn test_extract_json_no_json() {
        let err = extract_json("I cannot decompose that command").unwrap_err();
        assert!(matches!(
            err,
            PilotError::ContractViolation { .. }
        ));
    }

    #[test]
    fn test_extract_json_reversed_braces() {
        assert!(extract_json("} nothing {").is_err());
    }
}
