//! Per-function records flowing through the pipeline.
//!
//! A [`Blueprint`] carries a function's code, signature, and file targets
//! from splitting through refactor and test staging. The [`BlueprintSet`]
//! preserves source order and supports the refactor splice: remove one
//! record, append its 0-2 replacements.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::split::{self, FunctionBlock};
use crate::infra::config::TargetSpec;

/// Content ID for drift detection (xxh64 over normalized text).
pub type ContentId = String;

/// Normalize text before hashing or comparison: strip trailing spaces,
/// tabs, and carriage returns per line so editors that touch only
/// whitespace do not read as drift.
pub fn normalize_for_cid(s: &str) -> String {
    s.lines()
        .map(|l| l.trim_end_matches([' ', '\t', '\r']))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Deterministic content ID with a fixed seed.
pub fn content_id(content: &str) -> ContentId {
    let normalized = normalize_for_cid(content);
    let h = xxhash_rust::xxh64::xxh64(normalized.as_bytes(), 0);
    format!("{h:016x}")
}

/// One function's record: code, identity, and file targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blueprint {
    pub function_signature: String,
    pub function_name: String,
    pub code: String,
    pub filename: PathBuf,
    pub test_filename: PathBuf,
    pub import_path: String,
    pub description: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl Blueprint {
    /// Build a blueprint from one split block. A block whose signature
    /// cannot be extracted still gets a record (empty signature/name);
    /// the classifier downgrades it to `skip`.
    pub fn from_block(block: &FunctionBlock, target: &TargetSpec) -> Self {
        let signature = split::extract_signature(&block.text).unwrap_or_default();
        let name = split::function_name(&signature).unwrap_or_default();

        Self {
            function_signature: signature,
            function_name: name,
            code: block.text.clone(),
            filename: target.source_file.clone(),
            test_filename: target.test_file.clone(),
            import_path: target.import_path.clone(),
            description: String::new(),
            dependencies: Vec::new(),
        }
    }

    /// Drift guard: the identity of this record's code at capture time.
    pub fn content_id(&self) -> ContentId {
        content_id(&self.code)
    }
}

/// Ordered collection of blueprints for one source file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlueprintSet {
    items: Vec<Blueprint>,
}

impl BlueprintSet {
    /// Split `source` and build one blueprint per top-level function,
    /// in source order.
    pub fn from_source(source: &str, target: &TargetSpec) -> Self {
        let items = split::split_functions(source)
            .iter()
            .map(|block| Blueprint::from_block(block, target))
            .collect();
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Blueprint> {
        self.items.iter()
    }

    pub fn get(&self, function_name: &str) -> Option<&Blueprint> {
        self.items.iter().find(|bp| bp.function_name == function_name)
    }

    /// Refactor splice: drop the named blueprint and append its
    /// replacements. Untouched records keep their relative order;
    /// replacements always land at the end, so exact original ordering
    /// is not preserved across a refactor pass.
    pub fn splice(&mut self, function_name: &str, replacements: Vec<Blueprint>) {
        self.items.retain(|bp| bp.function_name != function_name);
        self.items.extend(replacements);
    }

    /// Drop the blueprints at the given positions. Positions refer to
    /// the current ordering, so this must run before any splice
    /// invalidates them. Dropping by name would be wrong here: a source
    /// that redefines a function can hold same-named records with
    /// different classifications.
    pub fn drop_positions(&mut self, positions: &[usize]) {
        let mut index = 0;
        self.items.retain(|_| {
            let keep = !positions.contains(&index);
            index += 1;
            keep
        });
    }

    pub fn into_vec(self) -> Vec<Blueprint> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn target() -> TargetSpec {
        TargetSpec::default().for_source(Path::new("billing.py"))
    }

    #[test]
    fn builds_one_blueprint_per_function() {
        let source = "def f(x):\n    return x+1\n\ndef g():\n    v = input()\n    print(v*2)\n";
        let set = BlueprintSet::from_source(source, &target());
        assert_eq!(set.len(), 2);

        let f = set.get("f").unwrap();
        assert_eq!(f.function_signature, "def f(x):");
        assert_eq!(f.code, "def f(x):\n    return x+1");
        assert_eq!(f.filename, Path::new("billing.py"));
        assert_eq!(f.test_filename, Path::new("test_suite.py"));
        assert!(f.dependencies.is_empty());
    }

    #[test]
    fn malformed_block_yields_empty_identity() {
        let block = FunctionBlock {
            start: 0,
            end: 5,
            text: "x = 1".to_string(),
        };
        let bp = Blueprint::from_block(&block, &target());
        assert_eq!(bp.function_signature, "");
        assert_eq!(bp.function_name, "");
    }

    #[test]
    fn splice_removes_original_and_appends_replacements() {
        let source = "def a():\n    return 1\n\ndef b():\n    v = input()\n    print(v*2)\n\ndef c():\n    return 3\n";
        let mut set = BlueprintSet::from_source(source, &target());

        let replacement = Blueprint {
            function_name: "b".to_string(),
            function_signature: "def b():".to_string(),
            ..set.get("b").unwrap().clone()
        };
        set.splice("b", vec![replacement]);

        let order: Vec<&str> = set.iter().map(|bp| bp.function_name.as_str()).collect();
        assert_eq!(order, vec!["a", "c", "b"]);
    }

    #[test]
    fn drop_positions_distinguishes_same_named_records() {
        let source = "def dup():\n    print(\"hi\")\n\ndef dup():\n    return 1\n";
        let mut set = BlueprintSet::from_source(source, &target());
        assert_eq!(set.len(), 2);

        set.drop_positions(&[0]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("dup").unwrap().code, "def dup():\n    return 1");
    }

    #[test]
    fn content_id_ignores_trailing_whitespace() {
        assert_eq!(
            content_id("def f():\n    pass"),
            content_id("def f():  \n    pass\t")
        );
        assert_ne!(content_id("def f():\n    pass"), content_id("def f():\n    return 1"));
    }
}
