//! Statement synthesis: collected occurrences in, one line of JavaScript out.

use indexmap::IndexMap;
use std::collections::BTreeSet;

use crate::config::{AliasTable, DispatchConfig};
use crate::scope::WalkResult;

/// Module exporting the dispatcher factory.
pub const DISPATCH_SOURCE: &str = "svelte";
pub const DISPATCHER_FACTORY: &str = "createEventDispatcher";
/// Local name the factory is imported under when the plain name may already be taken.
pub const RESERVED_FACTORY_ALIAS: &str = "___spài_createEventDispatcher";

/// Import clauses grouped by source module. Modules keep first-seen order,
/// clauses are deduplicated and sorted.
#[derive(Debug, Default)]
pub struct ImportGroups {
    groups: IndexMap<String, BTreeSet<String>>,
}

impl ImportGroups {
    pub fn add(&mut self, source_module: &str, clause: String) {
        self.groups
            .entry(source_module.to_string())
            .or_insert_with(BTreeSet::new)
            .insert(clause);
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// `import { a, b } from 'x'; import { c } from 'y'`
    pub fn render(&self) -> String {
        self.groups
            .iter()
            .map(|(from, clauses)| {
                let clauses: Vec<&str> = clauses.iter().map(String::as_str).collect();
                format!("import {{ {} }} from '{}'", clauses.join(", "), from)
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// What to splice into the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesized {
    /// Imports then the dispatcher declaration, `;`-terminated.
    pub statement: String,
    /// Replacement for every dispatch call site, when there are any.
    pub declaration_name: Option<String>,
}

/// Build the statement to prepend, or `None` when there is nothing to inject.
pub fn synthesize(
    walk: &WalkResult,
    aliases: &AliasTable,
    dispatch: Option<&DispatchConfig>,
) -> Option<Synthesized> {
    let mut groups = ImportGroups::default();
    let mut declaration = None;
    let mut declaration_name = None;

    if let Some(dispatch) = dispatch.filter(|_| !walk.dispatch_calls.is_empty()) {
        // The plain factory name is off limits when the author may bind or
        // auto-import it too.
        let factory = if aliases.contains_key(DISPATCHER_FACTORY)
            || walk.shadowed.contains(DISPATCHER_FACTORY)
        {
            groups.add(
                DISPATCH_SOURCE,
                format!("{} as {}", DISPATCHER_FACTORY, RESERVED_FACTORY_ALIAS),
            );
            RESERVED_FACTORY_ALIAS
        } else {
            groups.add(DISPATCH_SOURCE, DISPATCHER_FACTORY.to_string());
            DISPATCHER_FACTORY
        };

        let name = dispatch.declaration_name();
        declaration = Some(format!("const {} = {}()", name, factory));
        declaration_name = Some(name);
    }

    for candidate in &walk.alias_candidates {
        if let Some(entry) = aliases.get(&candidate.name) {
            groups.add(&entry.source_module, entry.clause());
        }
    }

    let mut statements = Vec::new();
    if !groups.is_empty() {
        statements.push(groups.render());
    }
    statements.extend(declaration);
    if statements.is_empty() {
        return None;
    }

    Some(Synthesized {
        statement: statements.join("; ") + ";",
        declaration_name,
    })
}
