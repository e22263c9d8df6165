//! Collaborator contracts for the two external oracles.
//!
//! Both oracles are black boxes injected at pipeline construction, so
//! tests substitute deterministic fakes and no global client state
//! exists. The wire shapes are transport-agnostic serde records; how a
//! request reaches an LLM (or anything else) is the caller's concern.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Request for rewriting one CLI wrapper function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefactorRequest {
    /// Current text of the function block
    pub code: String,
    /// Normalized signature of the function
    pub signature: String,
    /// Function name
    pub name: String,
    /// File the function lives in
    pub source_filename: String,
    /// File its tests will live in
    pub test_filename: String,
}

/// Oracle response for a refactor request.
///
/// `refactored_code` is a single text blob; `original_cli_function` is
/// the signature text to look for inside that blob when carving out the
/// updated CLI function. The oracle guarantees no structural separation
/// beyond that.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RefactorResponse {
    pub refactored_code: String,
    pub pure_function_signature: String,
    pub original_cli_function: String,
    pub refactor_successful: bool,
    pub notes: String,
}

/// Request for generating a test suite for one testable function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestGenRequest {
    pub code: String,
    pub function_signature: String,
    pub function_name: String,
    pub import_path: String,
}

/// Supplies rewrites for CLI wrapper functions.
pub trait RefactorOracle {
    fn refactor(&self, request: &RefactorRequest) -> Result<RefactorResponse>;
}

/// Supplies raw test source for testable functions. The reply must pass
/// through the staging Clean stage before use.
pub trait TestGenOracle {
    fn generate(&self, request: &TestGenRequest) -> Result<String>;
}

/// Extract a [`RefactorResponse`] from a free-text oracle reply.
///
/// Takes the span from the first `{` to the last `}` and parses it as
/// JSON. Anything unparseable degrades to an unsuccessful response with
/// the reason in `notes`, which the patcher treats as a no-op.
pub fn parse_refactor_response(raw: &str) -> RefactorResponse {
    let Some(start) = raw.find('{') else {
        return unparsed("no JSON object in oracle reply");
    };
    let Some(end) = raw.rfind('}') else {
        return unparsed("no JSON object in oracle reply");
    };
    if end < start {
        return unparsed("no JSON object in oracle reply");
    }

    match serde_json::from_str::<RefactorResponse>(&raw[start..=end]) {
        Ok(response) => response,
        Err(err) => unparsed(format!("failed to parse oracle reply: {err}")),
    }
}

fn unparsed(notes: impl Into<String>) -> RefactorResponse {
    RefactorResponse {
        refactor_successful: false,
        notes: notes.into(),
        ..RefactorResponse::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_embedded_in_prose() {
        let raw = concat!(
            "Here is the refactor you asked for:\n",
            "{\"refactored_code\": \"def g():\\n    pass\", ",
            "\"pure_function_signature\": \"def g_logic(v):\", ",
            "\"original_cli_function\": \"def g():\", ",
            "\"refactor_successful\": true, \"notes\": \"ok\"}\n",
            "Let me know if you need anything else."
        );
        let response = parse_refactor_response(raw);
        assert!(response.refactor_successful);
        assert_eq!(response.original_cli_function, "def g():");
        assert_eq!(response.pure_function_signature, "def g_logic(v):");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let response = parse_refactor_response("{\"refactor_successful\": true}");
        assert!(response.refactor_successful);
        assert_eq!(response.refactored_code, "");
        assert_eq!(response.notes, "");
    }

    #[test]
    fn garbage_degrades_to_unsuccessful() {
        let response = parse_refactor_response("I could not do that, sorry.");
        assert!(!response.refactor_successful);
        assert!(response.notes.contains("no JSON object"));

        let response = parse_refactor_response("{not json}");
        assert!(!response.refactor_successful);
        assert!(response.notes.contains("failed to parse"));
    }
}
