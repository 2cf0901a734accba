//! Alias table and preprocessor configuration.
//!
//! The default alias table is built once per process and never mutated; every
//! configured preprocessor owns a freshly derived copy.

use lazy_static::lazy_static;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::{CompilerError, ERR_INVALID_OPTIONS};

/// Trigger name used when the options do not mention one.
pub const DEFAULT_TRIGGER: &str = "dispatch";

// ═══════════════════════════════════════════════════════════════════════════════
// ALIAS TABLE
// ═══════════════════════════════════════════════════════════════════════════════

/// One importable alias: `import { export_name as local_name } from 'source_module'`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasEntry {
    pub source_module: String,
    pub export_name: String,
    pub local_name: String,
}

impl AliasEntry {
    pub fn new(local_name: &str, source_module: &str, export_name: &str) -> Self {
        Self {
            source_module: source_module.to_string(),
            export_name: export_name.to_string(),
            local_name: local_name.to_string(),
        }
    }

    /// The specifier text inside the import braces.
    pub fn clause(&self) -> String {
        if self.export_name == self.local_name {
            self.export_name.clone()
        } else {
            format!("{} as {}", self.export_name, self.local_name)
        }
    }
}

/// Alias entries keyed by the local name an author writes.
pub type AliasTable = HashMap<String, AliasEntry>;

/// User-facing alias value: either a bare module name (`"svelte"`) or an object
/// naming the module and, optionally, a different export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AliasSpec {
    Module(String),
    Import {
        #[serde(default)]
        import: Option<String>,
        from: String,
    },
}

impl AliasSpec {
    pub fn into_entry(self, local_name: &str) -> AliasEntry {
        match self {
            AliasSpec::Module(from) => AliasEntry::new(local_name, &from, local_name),
            AliasSpec::Import { import, from } => {
                let export = import.unwrap_or_else(|| local_name.to_string());
                AliasEntry::new(local_name, &from, &export)
            }
        }
    }
}

/// Build an alias table from user-facing specs.
pub fn alias_table_from_specs<I>(specs: I) -> AliasTable
where
    I: IntoIterator<Item = (String, AliasSpec)>,
{
    specs
        .into_iter()
        .map(|(local, spec)| {
            let entry = spec.into_entry(&local);
            (local, entry)
        })
        .collect()
}

lazy_static! {
    /// Built-in aliases: lifecycle and context helpers, stores, motion,
    /// transitions and animations.
    pub static ref DEFAULT_ALIASES: AliasTable = {
        let groups: [(&str, &[&str]); 5] = [
            (
                "svelte",
                &[
                    "onMount",
                    "beforeUpdate",
                    "afterUpdate",
                    "onDestroy",
                    "tick",
                    "setContext",
                    "getContext",
                    "createEventDispatcher",
                ],
            ),
            ("svelte/store", &["writable", "readable", "derived", "get"]),
            ("svelte/motion", &["tweened", "spring"]),
            (
                "svelte/transition",
                &["fade", "blur", "fly", "slide", "scale", "draw"],
            ),
            ("svelte/animate", &["flip"]),
        ];

        let mut table = HashMap::new();
        for (module, names) in groups {
            for name in names {
                table.insert(name.to_string(), AliasEntry::new(name, module, name));
            }
        }
        table
    };
}

pub fn default_aliases() -> AliasTable {
    DEFAULT_ALIASES.clone()
}

// ═══════════════════════════════════════════════════════════════════════════════
// DISPATCH
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchConfig {
    pub trigger_name: String,
}

impl DispatchConfig {
    pub fn new(trigger_name: &str) -> Self {
        Self {
            trigger_name: trigger_name.to_string(),
        }
    }

    /// `$$dispatch` -> `__dispatch`: the leading run of `$` becomes an equally
    /// long run of underscores.
    pub fn declaration_name(&self) -> String {
        let sigils = self
            .trigger_name
            .bytes()
            .take_while(|&b| b == b'$')
            .count();
        format!(
            "{}{}",
            "_".repeat(sigils),
            &self.trigger_name[sigils..]
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// OPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize)]
#[serde(untagged)]
enum TriggerValue {
    Name(String),
    Flag(bool),
}

fn default_trigger() -> Option<String> {
    Some(DEFAULT_TRIGGER.to_string())
}

fn deserialize_trigger<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<TriggerValue>::deserialize(deserializer)? {
        Some(TriggerValue::Name(name)) if !name.is_empty() => Some(name),
        Some(TriggerValue::Flag(true)) => default_trigger(),
        _ => None,
    })
}

/// Object form of the configuration, as a host would pass it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreprocessorOptions {
    /// Replaces the default table when present.
    #[serde(default)]
    pub aliases: Option<HashMap<String, AliasSpec>>,
    /// `None` disables dispatch rewiring.
    #[serde(
        default = "default_trigger",
        deserialize_with = "deserialize_trigger"
    )]
    pub create_event_dispatcher: Option<String>,
}

impl Default for PreprocessorOptions {
    fn default() -> Self {
        Self {
            aliases: None,
            create_event_dispatcher: default_trigger(),
        }
    }
}

impl PreprocessorOptions {
    pub fn from_json(json: &str) -> Result<Self, CompilerError> {
        serde_json::from_str(json).map_err(|e| {
            CompilerError::new(
                ERR_INVALID_OPTIONS,
                &format!("Invalid preprocessor options: {}", e),
                "<options>",
                e.line() as u32,
                e.column() as u32,
            )
        })
    }
}

/// Everything a host may hand over at construction time.
pub enum ConfigInput {
    Default,
    Options(PreprocessorOptions),
    /// Receives the default table; its return value is the complete table.
    /// Entries are re-keyed so their local name matches the table key.
    Function(Box<dyn FnOnce(&AliasTable) -> AliasTable + Send>),
}

impl fmt::Debug for ConfigInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigInput::Default => f.write_str("Default"),
            ConfigInput::Options(options) => f.debug_tuple("Options").field(options).finish(),
            ConfigInput::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl From<PreprocessorOptions> for ConfigInput {
    fn from(options: PreprocessorOptions) -> Self {
        ConfigInput::Options(options)
    }
}

/// Fully resolved configuration of one preprocessor instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub aliases: AliasTable,
    pub dispatch: Option<DispatchConfig>,
}

impl ResolvedConfig {
    pub fn resolve(input: ConfigInput) -> Self {
        match input {
            ConfigInput::Default => Self::resolve_options(PreprocessorOptions::default()),
            ConfigInput::Options(options) => Self::resolve_options(options),
            ConfigInput::Function(build) => Self {
                aliases: build(&DEFAULT_ALIASES)
                    .into_iter()
                    .map(|(local, mut entry)| {
                        entry.local_name = local.clone();
                        (local, entry)
                    })
                    .collect(),
                dispatch: Some(DispatchConfig::new(DEFAULT_TRIGGER)),
            },
        }
    }

    fn resolve_options(options: PreprocessorOptions) -> Self {
        let aliases = match options.aliases {
            Some(specs) => alias_table_from_specs(specs),
            None => default_aliases(),
        };
        Self {
            aliases,
            dispatch: options
                .create_event_dispatcher
                .as_deref()
                .map(DispatchConfig::new),
        }
    }
}
