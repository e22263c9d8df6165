//! Heuristic testability classification over function block text.
//!
//! Classification is purely lexical: two marker sets (user interaction,
//! internal logic) are compiled into Aho-Corasick automatons and matched
//! against the block's text. No semantic evaluation happens here, so
//! every input maps to exactly one report.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::split::{extract_signature, function_name};
use crate::infra::config::MarkerConfig;

/// The three-way routing decision for a classified block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Testable,
    RefactorRequired,
    Skip,
}

/// Per-function classification outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestabilityReport {
    pub function_name: String,
    pub function_signature: String,
    pub is_testable: bool,
    pub requires_refactor: bool,
    pub reason: String,
    pub action: Action,
}

/// Marker-driven rule engine producing one [`TestabilityReport`] per block.
pub struct Classifier {
    interaction: AhoCorasick,
    logic: AhoCorasick,
}

impl Classifier {
    /// Compile the marker sets once for reuse across blocks.
    pub fn new(markers: &MarkerConfig) -> Result<Self> {
        // Interaction markers match case-insensitively (`Print(` counts);
        // logic markers are exact, `Return` as an identifier should not.
        let interaction = AhoCorasickBuilder::new()
            .ascii_case_insensitive(true)
            .build(&markers.interaction)
            .context("compile interaction markers")?;
        let logic = AhoCorasick::new(&markers.logic).context("compile logic markers")?;
        Ok(Self { interaction, logic })
    }

    /// Classify one block's code. The signature is extracted from the
    /// block itself; a missing signature forces `skip` regardless of the
    /// block's textual content.
    pub fn classify(&self, code: &str) -> TestabilityReport {
        let signature = extract_signature(code);
        let name = signature.as_deref().and_then(function_name);

        let (Some(signature), Some(name)) = (signature.clone(), name) else {
            return TestabilityReport {
                function_name: "unknown".to_string(),
                function_signature: signature.unwrap_or_default(),
                is_testable: false,
                requires_refactor: false,
                reason: "Missing or malformed function signature.".to_string(),
                action: Action::Skip,
            };
        };

        let is_cli = self.interaction.is_match(code);
        let has_logic = self.logic.is_match(code);

        let (is_testable, requires_refactor, reason, action) = match (is_cli, has_logic) {
            (true, true) => (
                false,
                true,
                "CLI wrapper around logic; needs refactor.",
                Action::RefactorRequired,
            ),
            (true, false) => (
                false,
                false,
                "Pure CLI/IO function with no testable logic.",
                Action::Skip,
            ),
            (false, true) => (true, false, "Pure logic with no CLI.", Action::Testable),
            (false, false) => (false, false, "No testable logic detected.", Action::Skip),
        };

        TestabilityReport {
            function_name: name,
            function_signature: signature,
            is_testable,
            requires_refactor,
            reason: reason.to_string(),
            action,
        }
    }
}
