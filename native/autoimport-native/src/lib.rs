//! # Auto-import preprocessor for single-file components
//!
//! Scans a component's scripts and markup for names listed in an alias table
//! (lifecycle hooks, stores, transitions...) and prepends the imports the author
//! left out. Optionally rewires a configured trigger name (`dispatch`,
//! `$$dispatch`) to a component event dispatcher it declares itself.
//!
//! ## Pipeline
//!
//! `parse` → `scope` (walk + classify) → `codegen` (statements) → `splice` (text).
//!
//! ## Invariants
//!
//! 1. **Offsets**: every recorded position is a byte offset into the original
//!    input. Style blocks are blanked in place, never removed.
//!
//! 2. **Shadowing**: a name bound anywhere in the file (variable declarator,
//!    import, function or class declaration, markup pattern, snippet parameter,
//!    `let:` slot binding) is never imported and never rewired, wherever its
//!    uses sit relative to the binding.
//!
//! 3. **Aliased imports**: `import { onMount as x } from 'y'` binds `x`, not
//!    `onMount`.
//!
//! 4. **Determinism**: clauses are sorted within a module, modules keep
//!    first-use order. Identical input yields identical output.
//!
//! 5. **No-op**: when nothing is found the input is returned byte for byte.

mod codegen;
mod config;
mod error;
mod parse;
mod preprocess;
mod scope;
mod splice;
mod visitor;

#[cfg(test)]
mod parse_tests;
#[cfg(test)]
mod preprocess_tests;

pub use codegen::{synthesize, ImportGroups, Synthesized, RESERVED_FACTORY_ALIAS};
pub use config::{
    default_aliases, AliasEntry, AliasSpec, AliasTable, ConfigInput, DispatchConfig,
    PreprocessorOptions, ResolvedConfig, DEFAULT_ALIASES, DEFAULT_TRIGGER,
};
pub use error::*;
pub use parse::{
    blank_style_blocks, parse_component, CodeSite, ComponentAst, DirectiveKind, DirectiveSite,
    MarkupNode, ScriptBlock, ScriptContext,
};
pub use preprocess::{MarkupInput, Preprocessor, Processed};
pub use scope::{IdentifierOccurrence, IdentifierRole, IdentifierWalker, ShadowSet, WalkResult};
pub use splice::{apply_edits, splice, Edit, InsertionPoint};
pub use visitor::{walk_component, walk_node, MarkupVisitor};

#[cfg(feature = "napi")]
pub use preprocess::preprocess_markup_native;
