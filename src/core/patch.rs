//! Exact-range application of oracle-produced rewrites.
//!
//! The source file is treated as a transactional resource: every patch
//! re-reads the live content and re-detects its target range immediately
//! before writing, so sequential refactors against one file never
//! corrupt each other's offsets. Validation happens at patch time, not
//! at plan time; any drift aborts the patch and the original blueprint
//! survives untouched. Concurrent patches against the same file are
//! forbidden (single-writer discipline).

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::blueprint::Blueprint;
use crate::core::fault::Fault;
use crate::core::split::{self, FunctionBlock};
use crate::infra::io::{read_source, write_atomic};
use crate::oracle::{RefactorOracle, RefactorRequest};

/// Result of one patch attempt. On abort the caller keeps the original
/// blueprint; on success it splices in the replacements (updated CLI
/// function, plus the extracted pure function when the oracle named one).
#[derive(Debug, Clone, Serialize)]
pub struct PatchOutcome {
    pub function_name: String,
    pub applied: bool,
    pub replacements: Vec<Blueprint>,
    pub fault: Option<Fault>,
}

impl PatchOutcome {
    fn aborted(function_name: &str, fault: Fault) -> Self {
        warn!(function = function_name, fault = %fault, "refactor patch aborted");
        Self {
            function_name: function_name.to_string(),
            applied: false,
            replacements: Vec::new(),
            fault: Some(fault),
        }
    }
}

/// Applies one oracle rewrite into the live source file.
pub struct RefactorPatcher<'a> {
    oracle: &'a dyn RefactorOracle,
}

impl<'a> RefactorPatcher<'a> {
    pub fn new(oracle: &'a dyn RefactorOracle) -> Self {
        Self { oracle }
    }

    /// Run the full patch protocol for one `refactor_required` blueprint.
    pub fn patch(&self, blueprint: &Blueprint) -> PatchOutcome {
        let name = blueprint.function_name.as_str();

        let request = RefactorRequest {
            code: blueprint.code.clone(),
            signature: blueprint.function_signature.clone(),
            name: name.to_string(),
            source_filename: blueprint.filename.display().to_string(),
            test_filename: blueprint.test_filename.display().to_string(),
        };

        let response = match self.oracle.refactor(&request) {
            Ok(response) => response,
            Err(err) => {
                return PatchOutcome::aborted(name, Fault::oracle(format!("{err:#}")));
            }
        };

        if !response.refactor_successful {
            return PatchOutcome::aborted(
                name,
                Fault::oracle(format!("oracle reported failure: {}", response.notes)),
            );
        }
        if response.refactored_code.trim().is_empty()
            || response.original_cli_function.trim().is_empty()
        {
            return PatchOutcome::aborted(name, Fault::oracle("oracle returned empty rewrite"));
        }

        // Carve the updated CLI function out of the oracle's single blob,
        // anchored at the signature text it supplied.
        let Some(cli_block) =
            split::locate_by_signature(&response.refactored_code, &response.original_cli_function)
        else {
            return PatchOutcome::aborted(
                name,
                Fault::patch_not_found(format!(
                    "CLI function `{}` not found in oracle output",
                    response.original_cli_function.trim()
                )),
            );
        };

        // Re-read live content; cached copies may predate earlier patches
        // in this pass.
        let live = match read_source(&blueprint.filename) {
            Ok(live) => live,
            Err(err) => return PatchOutcome::aborted(name, Fault::io(format!("{err:#}"))),
        };

        // Re-detect the target range against the live content.
        let Some(target) = split::locate_function(&live, name) else {
            return PatchOutcome::aborted(
                name,
                Fault::patch_not_found(format!("function `{name}` not found in live content")),
            );
        };

        // Drift guard: same name but different body means the function was
        // already patched or edited since capture.
        if crate::core::blueprint::content_id(&target.text) != blueprint.content_id() {
            return PatchOutcome::aborted(
                name,
                Fault::patch_not_found(format!(
                    "function `{name}` drifted since capture; refusing to patch"
                )),
            );
        }

        debug!(
            function = name,
            start = target.start,
            end = target.end,
            "recomputed live target range"
        );

        let patched = splice_range(&live, &target, &cli_block.text);
        if let Err(err) = write_atomic(&blueprint.filename, &patched) {
            return PatchOutcome::aborted(name, Fault::io(format!("{err:#}")));
        }
        info!(
            function = name,
            file = %blueprint.filename.display(),
            "applied refactor patch"
        );

        let mut replacements = vec![self.updated_cli_blueprint(blueprint, &cli_block)];
        if let Some(pure) = self.pure_blueprint(blueprint, &response.pure_function_signature, &response.refactored_code)
        {
            replacements.push(pure);
        }

        PatchOutcome {
            function_name: name.to_string(),
            applied: true,
            replacements,
            fault: None,
        }
    }

    /// Blueprint for the rewritten CLI wrapper, keeping the original's
    /// file targets and metadata.
    fn updated_cli_blueprint(&self, original: &Blueprint, cli_block: &FunctionBlock) -> Blueprint {
        let signature = split::extract_signature(&cli_block.text).unwrap_or_default();
        let name = split::function_name(&signature)
            .unwrap_or_else(|| original.function_name.clone());

        Blueprint {
            function_signature: signature,
            function_name: name,
            code: cli_block.text.clone(),
            filename: original.filename.clone(),
            test_filename: original.test_filename.clone(),
            import_path: original.import_path.clone(),
            description: original.description.clone(),
            dependencies: original.dependencies.clone(),
        }
    }

    /// Blueprint for the extracted pure function, when the oracle named
    /// one. Its code is carved from the oracle blob when locatable.
    fn pure_blueprint(
        &self,
        original: &Blueprint,
        pure_signature: &str,
        refactored_code: &str,
    ) -> Option<Blueprint> {
        let signature = pure_signature.trim();
        if signature.is_empty() {
            return None;
        }

        let name = split::function_name(signature).unwrap_or_default();
        let code = split::locate_by_signature(refactored_code, signature)
            .map(|block| block.text)
            .unwrap_or_default();

        Some(Blueprint {
            function_signature: signature.to_string(),
            function_name: name,
            code,
            filename: original.filename.clone(),
            test_filename: original.test_filename.clone(),
            import_path: original.import_path.clone(),
            description: format!(
                "Pure logic extracted from {}.",
                original.function_signature
            ),
            dependencies: Vec::new(),
        })
    }
}

/// Replace exactly `[target.start, target.end)` in `content` with
/// `replacement`, preserving every byte outside the range. A single
/// newline separates the replacement from following content; when the
/// range is already followed by a line break none is added, which makes
/// patching a range with its own text a byte-for-byte no-op.
pub fn splice_range(content: &str, target: &FunctionBlock, replacement: &str) -> String {
    let trimmed = replacement.trim_end();
    let rest = &content[target.end..];

    // A block's end excludes trailing whitespace, so `rest` may open
    // with trimmed spaces or tabs ahead of its newline; that still
    // counts as separated.
    let after_pad = rest.trim_start_matches([' ', '\t']);
    let separated =
        after_pad.is_empty() || after_pad.starts_with('\n') || after_pad.starts_with('\r');

    let mut out = String::with_capacity(content.len() + trimmed.len());
    out.push_str(&content[..target.start]);
    out.push_str(trimmed);
    if !separated {
        out.push('\n');
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_for(source: &str, name: &str) -> FunctionBlock {
        split::locate_function(source, name).unwrap()
    }

    #[test]
    fn identity_patch_leaves_content_unchanged() {
        let source = "# header\n\ndef f(x):\n    return x+1\n\ndef g():\n    pass\n";
        let target = block_for(source, "f");
        let patched = splice_range(source, &target, &target.text.clone());
        assert_eq!(patched, source);
    }

    #[test]
    fn splice_preserves_all_outside_bytes() {
        let source = "# header\n\ndef f(x):\n    return x+1\n\ndef g():\n    pass\n";
        let target = block_for(source, "f");
        let patched = splice_range(source, &target, "def f(x):\n    return plus_one(x)");
        assert_eq!(
            patched,
            "# header\n\ndef f(x):\n    return plus_one(x)\n\ndef g():\n    pass\n"
        );
    }

    #[test]
    fn splice_at_end_of_file_keeps_no_trailing_newline_shape() {
        let source = "def f():\n    pass";
        let target = block_for(source, "f");
        let patched = splice_range(source, &target, &target.text.clone());
        assert_eq!(patched, source);
    }

    #[test]
    fn identity_patch_survives_trailing_spaces_at_the_boundary() {
        // The detected range stops before the trailing spaces, so the
        // remainder opens with them; no separator may be injected.
        let source = "def f():\n    pass  \ndef g():\n    pass\n";
        let target = block_for(source, "f");
        let patched = splice_range(source, &target, &target.text.clone());
        assert_eq!(patched, source);

        let rewritten = splice_range(source, &target, "def f():\n    return 1");
        assert_eq!(rewritten, "def f():\n    return 1  \ndef g():\n    pass\n");
    }

    #[test]
    fn splice_does_not_duplicate_separator_newlines() {
        // The replacement's own trailing newline is trimmed before the
        // separator rule runs, so no blank line creeps in between blocks.
        let source = "def f():\n    pass\ndef g():\n    pass\n";
        let target = block_for(source, "f");
        let patched = splice_range(source, &target, "def f():\n    return 1\n");
        assert_eq!(patched, "def f():\n    return 1\ndef g():\n    pass\n");
    }
}
