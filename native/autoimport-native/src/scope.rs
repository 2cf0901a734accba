//! Shadow-aware identifier collection.
//!
//! Every code site of a component (script blocks, markup expressions, block-tag
//! patterns, directive names) is parsed with oxc and visited once. Identifiers
//! come out as raw declarations or references; classification then happens
//! against the final shadow set, so a local binding shadows its name everywhere
//! in the file, including occurrences that textually precede it.

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    ArrowFunctionExpression, BindingIdentifier, Class, ClassType, FormalParameters, Function,
    FunctionType, IdentifierReference, ImportDefaultSpecifier, ImportNamespaceSpecifier, ImportSpecifier,
    VariableDeclarator,
};
use oxc_ast_visit::{walk, Visit};
use oxc_parser::Parser;
use oxc_span::{SourceType, Span};
use oxc_syntax::scope::ScopeFlags;
use std::collections::HashSet;

use crate::config::{AliasTable, DispatchConfig};
use crate::error::{CompilerError, ERR_EXPRESSION_SYNTAX, ERR_SCRIPT_SYNTAX};
use crate::parse::{CodeSite, ComponentAst, DirectiveSite, ScriptBlock};
use crate::visitor::MarkupVisitor;

/// Markup patterns are parsed as the binding of a `let` declaration.
const PATTERN_PREFIX: &str = "let ";
const PATTERN_SUFFIX: &str = " = 0;";
/// Snippet parameter lists are parsed as the parameters of a function expression.
const PARAMETERS_PREFIX: &str = "(function(";
const PARAMETERS_SUFFIX: &str = ") {});";

// ═══════════════════════════════════════════════════════════════════════════════
// OCCURRENCES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierRole {
    Declaration,
    DispatchCall,
    AliasCandidate,
}

/// A name at `start..end` of the original file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierOccurrence {
    pub name: String,
    pub start: usize,
    pub end: usize,
    pub role: IdentifierRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawRole {
    Binding,
    Reference,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RawOccurrence {
    name: String,
    start: usize,
    end: usize,
    role: RawRole,
}

/// Names bound locally anywhere in the file. Only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShadowSet {
    names: HashSet<String>,
}

impl ShadowSet {
    pub fn insert(&mut self, name: &str) {
        self.names.insert(name.to_string());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Output of the walk. Both occurrence lists are in document order.
#[derive(Debug, Clone, Default)]
pub struct WalkResult {
    pub shadowed: ShadowSet,
    pub declarations: Vec<IdentifierOccurrence>,
    pub alias_candidates: Vec<IdentifierOccurrence>,
    pub dispatch_calls: Vec<IdentifierOccurrence>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// OXC COLLECTOR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BindingContext {
    None,
    Declarator,
}

/// Collects identifiers of one parsed snippet, translating its spans back to
/// file offsets: `file = span - prefix + origin`.
struct IdentifierCollector<'o> {
    origin: usize,
    prefix: usize,
    binding: BindingContext,
    /// Treat the parameters of the next function as declarations.
    bind_parameters: bool,
    occurrences: &'o mut Vec<RawOccurrence>,
}

impl<'o> IdentifierCollector<'o> {
    fn new(origin: usize, prefix: usize, occurrences: &'o mut Vec<RawOccurrence>) -> Self {
        Self {
            origin,
            prefix,
            binding: BindingContext::None,
            bind_parameters: false,
            occurrences,
        }
    }

    fn binding_parameters(mut self) -> Self {
        self.bind_parameters = true;
        self
    }

    fn push(&mut self, name: &str, span: Span, role: RawRole) {
        let start = (span.start as usize).saturating_sub(self.prefix) + self.origin;
        let end = (span.end as usize).saturating_sub(self.prefix) + self.origin;
        self.occurrences.push(RawOccurrence {
            name: name.to_string(),
            start,
            end,
            role,
        });
    }

    fn with_binding<F: FnOnce(&mut Self)>(&mut self, binding: BindingContext, f: F) {
        let saved = std::mem::replace(&mut self.binding, binding);
        f(self);
        self.binding = saved;
    }
}

impl<'a, 'o> Visit<'a> for IdentifierCollector<'o> {
    fn visit_identifier_reference(&mut self, ident: &IdentifierReference<'a>) {
        self.push(ident.name.as_str(), ident.span, RawRole::Reference);
    }

    fn visit_binding_identifier(&mut self, ident: &BindingIdentifier<'a>) {
        if self.binding == BindingContext::Declarator {
            self.push(ident.name.as_str(), ident.span, RawRole::Binding);
        }
    }

    fn visit_variable_declarator(&mut self, decl: &VariableDeclarator<'a>) {
        self.with_binding(BindingContext::Declarator, |this| {
            walk::walk_variable_declarator(this, decl)
        });
    }

    fn visit_function(&mut self, func: &Function<'a>, flags: ScopeFlags) {
        if matches!(
            func.r#type,
            FunctionType::FunctionDeclaration | FunctionType::TSDeclareFunction
        ) {
            if let Some(id) = &func.id {
                self.push(id.name.as_str(), id.span, RawRole::Binding);
            }
        }
        // Parameters and inner bindings are not file-level declarations.
        self.with_binding(BindingContext::None, |this| {
            walk::walk_function(this, func, flags)
        });
    }

    fn visit_formal_parameters(&mut self, params: &FormalParameters<'a>) {
        let binding = if std::mem::take(&mut self.bind_parameters) {
            BindingContext::Declarator
        } else {
            BindingContext::None
        };
        self.with_binding(binding, |this| walk::walk_formal_parameters(this, params));
    }

    fn visit_arrow_function_expression(&mut self, func: &ArrowFunctionExpression<'a>) {
        self.with_binding(BindingContext::None, |this| {
            walk::walk_arrow_function_expression(this, func)
        });
    }

    fn visit_class(&mut self, class: &Class<'a>) {
        if matches!(class.r#type, ClassType::ClassDeclaration) {
            if let Some(id) = &class.id {
                self.push(id.name.as_str(), id.span, RawRole::Binding);
            }
        }
        self.with_binding(BindingContext::None, |this| walk::walk_class(this, class));
    }

    fn visit_import_specifier(&mut self, specifier: &ImportSpecifier<'a>) {
        // `imported` is a module export name, never a reference.
        self.push(
            specifier.local.name.as_str(),
            specifier.local.span,
            RawRole::Binding,
        );
    }

    fn visit_import_default_specifier(&mut self, specifier: &ImportDefaultSpecifier<'a>) {
        self.push(
            specifier.local.name.as_str(),
            specifier.local.span,
            RawRole::Binding,
        );
    }

    fn visit_import_namespace_specifier(&mut self, specifier: &ImportNamespaceSpecifier<'a>) {
        self.push(
            specifier.local.name.as_str(),
            specifier.local.span,
            RawRole::Binding,
        );
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SNIPPET PARSING
// ═══════════════════════════════════════════════════════════════════════════════

fn source_type(typescript: bool) -> SourceType {
    SourceType::default()
        .with_module(true)
        .with_typescript(typescript)
}

// ═══════════════════════════════════════════════════════════════════════════════
// WALKER
// ═══════════════════════════════════════════════════════════════════════════════

/// Parses every code site of a component and gathers raw occurrences.
pub struct IdentifierWalker<'s> {
    source: &'s str,
    file_path: &'s str,
    typescript: bool,
    occurrences: Vec<RawOccurrence>,
}

impl<'s> IdentifierWalker<'s> {
    pub fn new(component: &'s ComponentAst, file_path: &'s str) -> Self {
        Self {
            source: &component.source,
            file_path,
            typescript: component.is_typescript(),
            occurrences: Vec::new(),
        }
    }

    /// Walk `component` and classify what was found.
    pub fn walk(
        component: &'s ComponentAst,
        file_path: &'s str,
        aliases: &AliasTable,
        dispatch: Option<&DispatchConfig>,
    ) -> Result<WalkResult, CompilerError> {
        let mut walker = Self::new(component, file_path);
        walker.visit_component(component)?;
        Ok(walker.classify(aliases, dispatch))
    }

    fn syntax_error(&self, code: &str, detail: String, offset: usize) -> CompilerError {
        CompilerError::at_offset(code, &detail, self.file_path, self.source, offset)
    }

    /// Parse `code` as a program; it sits at file offset `origin` after `prefix`
    /// synthetic bytes.
    fn collect_program(
        &mut self,
        code: &str,
        origin: usize,
        prefix: usize,
        error_code: &str,
        bind_parameters: bool,
    ) -> Result<(), CompilerError> {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, code, source_type(self.typescript)).parse();

        if ret.panicked || !ret.errors.is_empty() {
            let detail = ret
                .errors
                .first()
                .map(|e| format!("Invalid syntax: {}", e))
                .unwrap_or_else(|| "Invalid syntax".to_string());
            return Err(self.syntax_error(error_code, detail, origin));
        }

        let mut collector = IdentifierCollector::new(origin, prefix, &mut self.occurrences);
        if bind_parameters {
            collector = collector.binding_parameters();
        }
        collector.visit_program(&ret.program);
        Ok(())
    }

    fn collect_expression(&mut self, site: &CodeSite) -> Result<(), CompilerError> {
        let allocator = Allocator::default();
        let source = self.source;
        let code = site.text(source);
        let ret = Parser::new(&allocator, code, source_type(self.typescript)).parse_expression();

        match ret {
            Ok(expr) => {
                let mut collector = IdentifierCollector::new(site.start, 0, &mut self.occurrences);
                collector.visit_expression(&expr);
                Ok(())
            }
            Err(errors) => {
                let detail = errors
                    .first()
                    .map(|e| format!("Invalid expression syntax: {}", e))
                    .unwrap_or_else(|| "Invalid expression syntax".to_string());
                Err(self.syntax_error(ERR_EXPRESSION_SYNTAX, detail, site.start))
            }
        }
    }

    /// Hoisted classification: declarations anywhere shadow every reference.
    fn classify(mut self, aliases: &AliasTable, dispatch: Option<&DispatchConfig>) -> WalkResult {
        self.occurrences.sort_by_key(|o| (o.start, o.end));

        let mut result = WalkResult::default();
        for occurrence in &self.occurrences {
            if occurrence.role == RawRole::Binding {
                result.shadowed.insert(&occurrence.name);
            }
        }

        for occurrence in self.occurrences {
            let role = if occurrence.role == RawRole::Binding {
                IdentifierRole::Declaration
            } else if result.shadowed.contains(&occurrence.name) {
                continue;
            } else if dispatch.map_or(false, |d| d.trigger_name == occurrence.name) {
                IdentifierRole::DispatchCall
            } else if aliases.contains_key(&occurrence.name) {
                IdentifierRole::AliasCandidate
            } else {
                continue;
            };

            let classified = IdentifierOccurrence {
                name: occurrence.name,
                start: occurrence.start,
                end: occurrence.end,
                role,
            };
            match role {
                IdentifierRole::Declaration => result.declarations.push(classified),
                IdentifierRole::DispatchCall => result.dispatch_calls.push(classified),
                IdentifierRole::AliasCandidate => result.alias_candidates.push(classified),
            }
        }

        tracing::trace!(
            shadowed = result.shadowed.len(),
            candidates = result.alias_candidates.len(),
            dispatch_calls = result.dispatch_calls.len(),
            "classified identifiers"
        );
        result
    }
}

impl<'s> MarkupVisitor for IdentifierWalker<'s> {
    fn visit_script(&mut self, script: &ScriptBlock) -> Result<(), CompilerError> {
        let source = self.source;
        let code = &source[script.content_start..script.content_end];
        self.collect_program(code, script.content_start, 0, ERR_SCRIPT_SYNTAX, false)
    }

    fn visit_expression(&mut self, site: &CodeSite) -> Result<(), CompilerError> {
        self.collect_expression(site)
    }

    fn visit_pattern(&mut self, site: &CodeSite) -> Result<(), CompilerError> {
        let code = format!("{}{}{}", PATTERN_PREFIX, site.text(self.source), PATTERN_SUFFIX);
        self.collect_program(
            &code,
            site.start,
            PATTERN_PREFIX.len(),
            ERR_EXPRESSION_SYNTAX,
            false,
        )
    }

    fn visit_const_tag(&mut self, site: &CodeSite) -> Result<(), CompilerError> {
        let code = format!("{};", site.text(self.source));
        self.collect_program(&code, site.start, 0, ERR_EXPRESSION_SYNTAX, false)
    }

    fn visit_parameters(&mut self, site: &CodeSite) -> Result<(), CompilerError> {
        let code = format!(
            "{}{}{}",
            PARAMETERS_PREFIX,
            site.text(self.source),
            PARAMETERS_SUFFIX
        );
        self.collect_program(
            &code,
            site.start,
            PARAMETERS_PREFIX.len(),
            ERR_EXPRESSION_SYNTAX,
            true,
        )
    }

    fn visit_directive(&mut self, directive: &DirectiveSite) -> Result<(), CompilerError> {
        tracing::trace!(kind = ?directive.kind, name = %directive.name, "directive reference");
        self.occurrences.push(RawOccurrence {
            name: directive.name.clone(),
            start: directive.start,
            end: directive.end,
            role: RawRole::Reference,
        });
        Ok(())
    }
}
