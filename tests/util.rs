//! Shared test utilities for integration tests
//!
//! Scripted oracle fakes keyed by function name, plus fixture helpers.
//! The fakes clone cheaply and share their call logs, so a test can keep
//! one handle for inspection after the pipeline takes its boxed copy.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use refract::{RefactorOracle, RefactorRequest, RefactorResponse, TestGenOracle, TestGenRequest};

/// Refactor oracle with per-function scripted responses. Functions
/// without a script fail the call itself (transport-level error).
#[derive(Clone, Default)]
pub struct ScriptedRefactor {
    responses: HashMap<String, RefactorResponse>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedRefactor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, name: &str, response: RefactorResponse) -> Self {
        self.responses.insert(name.to_string(), response);
        self
    }

    /// Script an explicit "refactor_successful = false" reply.
    pub fn with_refusal(mut self, name: &str) -> Self {
        self.responses.insert(
            name.to_string(),
            RefactorResponse {
                refactor_successful: false,
                notes: "declined".to_string(),
                ..RefactorResponse::default()
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl RefactorOracle for ScriptedRefactor {
    fn refactor(&self, request: &RefactorRequest) -> Result<RefactorResponse> {
        self.calls.lock().unwrap().push(request.name.clone());
        self.responses
            .get(&request.name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no scripted refactor for `{}`", request.name))
    }
}

/// Test-generation oracle with per-function replies and a failure list.
#[derive(Clone, Default)]
pub struct ScriptedTestGen {
    replies: HashMap<String, String>,
    failing: HashSet<String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedTestGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(mut self, name: &str, reply: &str) -> Self {
        self.replies.insert(name.to_string(), reply.to_string());
        self
    }

    pub fn with_failure(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl TestGenOracle for ScriptedTestGen {
    fn generate(&self, request: &TestGenRequest) -> Result<String> {
        self.calls.lock().unwrap().push(request.function_name.clone());
        if self.failing.contains(&request.function_name) {
            anyhow::bail!("scripted generation failure for `{}`", request.function_name);
        }
        Ok(self
            .replies
            .get(&request.function_name)
            .cloned()
            .unwrap_or_else(|| {
                format!(
                    "```python\ndef test_{name}():\n    assert {name} is not None\n```",
                    name = request.function_name
                )
            }))
    }
}

/// Route pipeline tracing through the test harness; honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Build a refactor response that extracts `{name}_logic` out of a CLI
/// wrapper, in the single-blob shape real oracles produce.
pub fn extraction_response(name: &str, param: &str, expr: &str) -> RefactorResponse {
    RefactorResponse {
        refactored_code: format!(
            "def {name}_logic({param}):\n    return {expr}\n\n\
             def {name}():\n    {param} = input()\n    print({name}_logic({param}))\n"
        ),
        pure_function_signature: format!("def {name}_logic({param}):"),
        original_cli_function: format!("def {name}():"),
        refactor_successful: true,
        notes: String::new(),
    }
}
