//! Test suite staging: generate, clean, write.
//!
//! Each testable blueprint moves through three stages independently of
//! every other function. A stage failure terminates that function's
//! processing with a recorded status but never aborts the batch.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, warn};

use crate::core::blueprint::Blueprint;
use crate::core::fault::Fault;
use crate::infra::io::write_atomic;
use crate::oracle::{TestGenOracle, TestGenRequest};

/// Lifecycle states of one generated test suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Generated,
    Cleaned,
    Written,
    SkippedEmpty,
    Error,
}

/// Generated test content plus its lifecycle state.
#[derive(Debug, Clone, Serialize)]
pub struct TestArtifact {
    pub test_code: String,
    pub status: TestStatus,
}

/// Per-function staging outcome, aggregated into the pipeline report.
#[derive(Debug, Clone, Serialize)]
pub struct TestOutcome {
    pub function_name: String,
    pub test_filename: PathBuf,
    pub status: TestStatus,
    pub fault: Option<Fault>,
}

/// Idempotently strip markdown code-fence wrapping.
///
/// A leading fence line (optional language tag), a bare leading
/// `python` tag line, and a trailing fence line are each stripped
/// independently; a reply wrapped on only one side still gets cleaned.
/// Stripping repeats until nothing changes, so
/// `clean(clean(x)) == clean(x)` holds for every input.
pub fn clean_fences(raw: &str) -> String {
    let mut text = raw.trim().to_string();
    loop {
        let stripped = strip_wrapping(&text);
        if stripped == text {
            return text;
        }
        text = stripped;
    }
}

/// One stripping round over the wrapper lines.
fn strip_wrapping(text: &str) -> String {
    let mut lines: Vec<&str> = text.lines().collect();

    let opener = lines.first().map(|l| l.trim()).is_some_and(|l| {
        (l.starts_with("```") && !l[3..].contains('`')) || l.eq_ignore_ascii_case("python")
    });
    if opener {
        lines.remove(0);
    }

    let closer = lines
        .last()
        .map(|l| l.trim())
        .is_some_and(|l| !l.is_empty() && l.chars().all(|c| c == '`'));
    if closer {
        lines.pop();
    }

    lines.join("\n").trim().to_string()
}

/// Three-stage state machine over testable blueprints.
pub struct TestSuiteStaging<'a> {
    oracle: &'a dyn TestGenOracle,
}

impl<'a> TestSuiteStaging<'a> {
    pub fn new(oracle: &'a dyn TestGenOracle) -> Self {
        Self { oracle }
    }

    /// Run generate, clean, write for one blueprint.
    pub fn stage(&self, blueprint: &Blueprint) -> TestOutcome {
        let artifact = match self.generate(blueprint) {
            Ok(artifact) => artifact,
            Err(fault) => return self.outcome(blueprint, TestStatus::Error, Some(fault)),
        };

        let artifact = Self::clean(artifact);

        self.write(blueprint, &artifact)
    }

    /// Generate: ask the oracle for raw test source.
    fn generate(&self, blueprint: &Blueprint) -> Result<TestArtifact, Fault> {
        let request = TestGenRequest {
            code: blueprint.code.clone(),
            function_signature: blueprint.function_signature.clone(),
            function_name: blueprint.function_name.clone(),
            import_path: blueprint.import_path.clone(),
        };

        let raw = self.oracle.generate(&request).map_err(|err| {
            warn!(function = %blueprint.function_name, error = %err, "test generation failed");
            Fault::oracle(format!("{err:#}"))
        })?;
        debug!(function = %blueprint.function_name, bytes = raw.len(), "test suite generated");

        Ok(TestArtifact {
            test_code: raw,
            status: TestStatus::Generated,
        })
    }

    /// Clean: strip markdown fence wrapping (idempotent).
    fn clean(artifact: TestArtifact) -> TestArtifact {
        TestArtifact {
            test_code: clean_fences(&artifact.test_code),
            status: TestStatus::Cleaned,
        }
    }

    /// Write: persist to the blueprint's test file, skipping blank output.
    fn write(&self, blueprint: &Blueprint, artifact: &TestArtifact) -> TestOutcome {
        if artifact.test_code.trim().is_empty() {
            warn!(function = %blueprint.function_name, "generated test suite empty after cleaning");
            let fault = Fault::empty_artifact(format!(
                "no test content for `{}`",
                blueprint.function_name
            ));
            return self.outcome(blueprint, TestStatus::SkippedEmpty, Some(fault));
        }

        if let Err(err) = write_atomic(&blueprint.test_filename, &artifact.test_code) {
            return self.outcome(blueprint, TestStatus::Error, Some(Fault::io(format!("{err:#}"))));
        }

        self.outcome(blueprint, TestStatus::Written, None)
    }

    fn outcome(&self, blueprint: &Blueprint, status: TestStatus, fault: Option<Fault>) -> TestOutcome {
        TestOutcome {
            function_name: blueprint.function_name.clone(),
            test_filename: blueprint.test_filename.clone(),
            status,
            fault,
        }
    }
}
