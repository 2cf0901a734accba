//! Text splicing against the original file.
//!
//! All edits carry offsets into the untouched input and are applied from the end
//! of the file backwards, so no edit can shift the offsets of one still pending.

use crate::scope::IdentifierOccurrence;

/// Replace `start..end` of the original text with `replacement`. An empty
/// range is an insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

impl Edit {
    pub fn replace(start: usize, end: usize, replacement: &str) -> Self {
        Self {
            start,
            end,
            replacement: replacement.to_string(),
        }
    }

    pub fn insert(at: usize, text: &str) -> Self {
        Self::replace(at, at, text)
    }
}

/// Where the synthesized statement goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertionPoint {
    /// Content start of an existing script block.
    ScriptContent(usize),
    /// No script block: append a new one at the end of the file.
    AppendBlock,
}

/// Apply non-overlapping edits. At equal starts the wider edit goes first, so an
/// insertion lands in front of a replacement beginning at the same offset.
pub fn apply_edits(source: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by(|a, b| (b.start, b.end).cmp(&(a.start, a.end)));

    let mut result = source.to_string();
    for edit in edits {
        result.replace_range(edit.start..edit.end, &edit.replacement);
    }
    result
}

/// Rename every dispatch call site and insert `statement` at `insertion`.
pub fn splice(
    source: &str,
    dispatch_calls: &[IdentifierOccurrence],
    declaration_name: Option<&str>,
    statement: &str,
    insertion: InsertionPoint,
) -> String {
    let mut edits: Vec<Edit> = match declaration_name {
        Some(name) => dispatch_calls
            .iter()
            .map(|call| Edit::replace(call.start, call.end, name))
            .collect(),
        None => Vec::new(),
    };

    edits.push(match insertion {
        InsertionPoint::ScriptContent(at) => Edit::insert(at, statement),
        InsertionPoint::AppendBlock => {
            Edit::insert(source.len(), &format!("\n<script>{}</script>", statement))
        }
    });

    apply_edits(source, edits)
}
