#[cfg(feature = "napi")]
use napi_derive::napi;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ERROR CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_SCRIPT_SYNTAX: &str = "AI-ERR-SYNTAX-001";
pub const ERR_EXPRESSION_SYNTAX: &str = "AI-ERR-SYNTAX-002";
pub const ERR_UNTERMINATED_EXPRESSION: &str = "AI-ERR-SYNTAX-003";
pub const ERR_DUPLICATE_SCRIPT: &str = "AI-ERR-SCRIPT-001";
pub const ERR_INVALID_OPTIONS: &str = "AI-ERR-CONFIG-001";

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILER ERROR
// ═══════════════════════════════════════════════════════════════════════════════

/// A hard failure for one component file. Nothing is emitted for a file that
/// produced one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[cfg_attr(feature = "napi", napi(object))]
#[error("[{code}] {message} ({file}:{line}:{column})")]
pub struct CompilerError {
    pub code: String,
    pub message: String,
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl CompilerError {
    pub fn new(code: &str, message: &str, file: &str, line: u32, column: u32) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            file: file.to_string(),
            line,
            column,
        }
    }

    /// Build an error located at a byte offset of `source`.
    pub fn at_offset(code: &str, message: &str, file: &str, source: &str, offset: usize) -> Self {
        let (line, column) = line_column(source, offset);
        Self::new(code, message, file, line, column)
    }
}

/// 1-based line and column of a byte offset. Offsets past the end clamp to the end.
pub fn line_column(source: &str, offset: usize) -> (u32, u32) {
    let offset = offset.min(source.len());
    let before = &source.as_bytes()[..offset];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    (line as u32, (offset - line_start + 1) as u32)
}
