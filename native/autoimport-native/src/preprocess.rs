//! Markup preprocessor entry points.

#[cfg(feature = "napi")]
use napi_derive::napi;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::codegen::synthesize;
use crate::config::{ConfigInput, ResolvedConfig};
use crate::error::CompilerError;
use crate::parse::parse_component;
use crate::scope::IdentifierWalker;
use crate::splice::{splice, InsertionPoint};

/// One file handed over by the host pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkupInput {
    pub content: String,
    /// Only used in diagnostics.
    pub filename: String,
}

impl MarkupInput {
    pub fn new(content: &str, filename: &str) -> Self {
        Self {
            content: content.to_string(),
            filename: filename.to_string(),
        }
    }
}

/// Result of preprocessing one file. No source map is ever produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "napi", napi(object))]
pub struct Processed {
    pub code: String,
    pub map: Option<String>,
}

impl Processed {
    fn code(code: String) -> Self {
        Self { code, map: None }
    }
}

/// A configured preprocessor. Holds no per-file state and can be shared across
/// threads.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    config: ResolvedConfig,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(ConfigInput::Default)
    }
}

impl Preprocessor {
    pub fn new(input: ConfigInput) -> Self {
        Self {
            config: ResolvedConfig::resolve(input),
        }
    }

    /// Inject the imports (and dispatcher) one component needs.
    #[tracing::instrument(level = "debug", skip_all, fields(filename = %input.filename))]
    pub fn markup(&self, input: &MarkupInput) -> Result<Processed, CompilerError> {
        let content = &input.content;
        let component = parse_component(content, &input.filename)?;

        let walk = IdentifierWalker::walk(
            &component,
            &input.filename,
            &self.config.aliases,
            self.config.dispatch.as_ref(),
        )?;

        let Some(synthesized) =
            synthesize(&walk, &self.config.aliases, self.config.dispatch.as_ref())
        else {
            tracing::trace!("nothing to inject");
            return Ok(Processed::code(content.clone()));
        };

        let insertion = match component.primary_script() {
            Some(script) => InsertionPoint::ScriptContent(script.content_start),
            None => InsertionPoint::AppendBlock,
        };
        tracing::debug!(
            candidates = walk.alias_candidates.len(),
            dispatch_calls = walk.dispatch_calls.len(),
            ?insertion,
            statement = %synthesized.statement,
            "injecting statements"
        );

        Ok(Processed::code(splice(
            content,
            &walk.dispatch_calls,
            synthesized.declaration_name.as_deref(),
            &synthesized.statement,
            insertion,
        )))
    }

    /// Preprocess independent files in parallel. Results keep input order.
    pub fn markup_many(&self, inputs: &[MarkupInput]) -> Vec<Result<Processed, CompilerError>> {
        inputs.par_iter().map(|input| self.markup(input)).collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
#[napi]
pub fn preprocess_markup_native(
    content: String,
    filename: Option<String>,
    options_json: Option<String>,
) -> napi::Result<Processed> {
    use crate::config::PreprocessorOptions;

    let config = match options_json {
        Some(json) => ConfigInput::Options(
            PreprocessorOptions::from_json(&json)
                .map_err(|e| napi::Error::from_reason(e.to_string()))?,
        ),
        None => ConfigInput::Default,
    };
    let input = MarkupInput {
        content,
        filename: filename.unwrap_or_default(),
    };
    Preprocessor::new(config)
        .markup(&input)
        .map_err(|e| napi::Error::from_reason(e.to_string()))
}
