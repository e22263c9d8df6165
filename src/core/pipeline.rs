//! Pipeline orchestration: split, classify, refactor, stage.
//!
//! Per-function failures are recorded and skipped over; the batch always
//! runs to completion. The refactor phase is serialized per file because
//! each patch re-reads then rewrites the whole file (single-writer rule);
//! staging writes to distinct test files and has no such constraint.

use std::path::Path;

use anyhow::Result;
use itertools::Itertools;
use serde::Serialize;
use tracing::{info, instrument};

use crate::core::blueprint::{Blueprint, BlueprintSet};
use crate::core::classify::{Action, Classifier, TestabilityReport};
use crate::core::patch::{PatchOutcome, RefactorPatcher};
use crate::core::staging::{TestOutcome, TestSuiteStaging};
use crate::infra::config::Config;
use crate::infra::io::read_source;
use crate::oracle::{RefactorOracle, TestGenOracle};

/// Aggregated outcome of one pipeline run over one source file.
#[derive(Debug, Serialize)]
pub struct PipelineReport {
    /// Classification reports, one per detected function, source order
    pub reports: Vec<TestabilityReport>,
    /// Final blueprint set: `skip` dropped, refactored records replaced
    pub blueprints: Vec<Blueprint>,
    /// Refactor phase outcomes (empty when nothing required refactor)
    pub patches: Vec<PatchOutcome>,
    /// Staging outcomes for testable functions
    pub tests: Vec<TestOutcome>,
}

/// Sequences the full split -> classify -> patch/stage pipeline.
///
/// Both oracles are injected at construction; their lifecycle belongs to
/// the caller.
pub struct Pipeline {
    refactor_oracle: Box<dyn RefactorOracle>,
    testgen_oracle: Box<dyn TestGenOracle>,
    config: Config,
}

impl Pipeline {
    pub fn new(
        refactor_oracle: Box<dyn RefactorOracle>,
        testgen_oracle: Box<dyn TestGenOracle>,
        config: Config,
    ) -> Self {
        Self {
            refactor_oracle,
            testgen_oracle,
            config,
        }
    }

    /// Run the pipeline over one source file.
    ///
    /// Only whole-file concerns (unreadable source, unbuildable marker
    /// sets) surface as `Err`; per-function failures land in the report.
    #[instrument(skip(self), fields(source = %source_path.display()))]
    pub fn run(&self, source_path: &Path) -> Result<PipelineReport> {
        let source = read_source(source_path)?;
        let target = self.config.target.for_source(source_path);

        let mut blueprints = BlueprintSet::from_source(&source, &target);
        let classifier = Classifier::new(&self.config.markers)?;
        let reports: Vec<TestabilityReport> = blueprints
            .iter()
            .map(|bp| classifier.classify(&bp.code))
            .collect();
        info!(functions = reports.len(), "classified top-level functions");

        let refactor_names: Vec<String> = reports
            .iter()
            .filter(|r| r.action == Action::RefactorRequired)
            .map(|r| r.function_name.clone())
            .collect();
        let testable_names: Vec<String> = reports
            .iter()
            .filter(|r| r.action == Action::Testable)
            .map(|r| r.function_name.clone())
            .collect();
        // Drop `skip` blueprints by position while reports and records
        // still line up; the refactor splice below reorders the set, and
        // a redefined function can pair a skip record with a kept one
        // under the same name.
        let skip_positions: Vec<usize> = reports
            .iter()
            .positions(|r| r.action == Action::Skip)
            .collect();
        blueprints.drop_positions(&skip_positions);

        // Refactor phase, entered only when at least one report asks for
        // it. Strictly sequential: patches share the source file.
        let mut patches = Vec::new();
        if !refactor_names.is_empty() {
            info!(count = refactor_names.len(), "entering refactor phase");
            let patcher = RefactorPatcher::new(self.refactor_oracle.as_ref());

            for name in &refactor_names {
                let Some(blueprint) = blueprints.get(name).cloned() else {
                    continue;
                };
                let outcome = patcher.patch(&blueprint);
                if outcome.applied {
                    blueprints.splice(name, outcome.replacements.clone());
                }
                patches.push(outcome);
            }
        }

        // Staging phase: testable functions only, each isolated from the
        // others. Blueprints produced by the refactor phase are staged on
        // a later run, once they have been re-classified.
        let staging = TestSuiteStaging::new(self.testgen_oracle.as_ref());
        let tests: Vec<TestOutcome> = testable_names
            .iter()
            .filter_map(|name| blueprints.get(name).cloned())
            .map(|bp| staging.stage(&bp))
            .collect();

        let written = tests
            .iter()
            .filter(|t| t.status == crate::core::staging::TestStatus::Written)
            .count();
        info!(staged = tests.len(), written, "staging phase complete");

        Ok(PipelineReport {
            reports,
            blueprints: blueprints.into_vec(),
            patches,
            tests,
        })
    }
}
