//! **refract** - Function-level testability analysis and CLI-logic extraction for Python sources
//!
//! Splits a source file into top-level function blocks, classifies each for
//! unit-testability, routes CLI-wrapper functions through an oracle-driven
//! refactor with exact-range patching, and stages generated test suites.
//! Boundary detection is lexical and every file mutation re-validates its
//! target range against freshly-read content.

/// Core processing pipeline - boundary detection, classification, patching
pub mod core {
    /// Lexical top-level function boundary detection and signatures
    pub mod split;
    pub use split::{FunctionBlock, extract_signature, function_name, split_functions};

    /// Marker-based testability classification
    pub mod classify;
    pub use classify::{Action, Classifier, TestabilityReport};

    /// Per-function blueprint records and the ordered set
    pub mod blueprint;
    pub use blueprint::{Blueprint, BlueprintSet};

    /// Exact-range patch application with live re-detection
    pub mod patch;
    pub use patch::{PatchOutcome, RefactorPatcher};

    /// Test suite staging state machine (generate, clean, write)
    pub mod staging;
    pub use staging::{TestArtifact, TestStatus, TestSuiteStaging, clean_fences};

    /// Pipeline orchestration and aggregate reporting
    pub mod pipeline;
    pub use pipeline::{Pipeline, PipelineReport};

    /// Function-scoped error taxonomy
    pub mod fault;
    pub use fault::{Fault, FaultKind};
}

/// Oracle collaborator contracts (refactor and test generation)
pub mod oracle;

/// Infrastructure - configuration and I/O
pub mod infra {
    /// Configuration with TOML/env layering
    pub mod config;
    pub use config::{Config, MarkerConfig, TargetSpec, load_config};

    /// File reading and atomic whole-file writes
    pub mod io;
    pub use io::{read_source, write_atomic};
}

// Strategic re-exports for external consumers
pub use core::{
    Action, Blueprint, BlueprintSet, Classifier, Fault, FaultKind, FunctionBlock, PatchOutcome,
    Pipeline, PipelineReport, RefactorPatcher, TestStatus, TestSuiteStaging, TestabilityReport,
    split_functions,
};
pub use infra::{Config, load_config};
pub use oracle::{
    RefactorOracle, RefactorRequest, RefactorResponse, TestGenOracle, TestGenRequest,
    parse_refactor_response,
};
