//! Parse Module for the auto-import preprocessor
//!
//! Splits a component file into its script blocks and the code-bearing sites of
//! its markup (expression tags, block tags, directive names). Every position is a
//! byte offset into the original file: style blocks are blanked in place rather
//! than removed, so nothing downstream ever needs to re-map offsets.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::ops::Range;

use crate::error::{CompilerError, ERR_DUPLICATE_SCRIPT, ERR_UNTERMINATED_EXPRESSION};

lazy_static! {
    /// Closing script tag; script content runs up to the first one.
    static ref SCRIPT_CLOSE_REGEX: Regex = Regex::new(r"(?i)</script\s*>").unwrap();

    /// Style block regex, tags included.
    static ref STYLE_REGEX: Regex =
        Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").unwrap();

    /// Attribute regex for parsing script attributes
    static ref ATTR_REGEX: Regex =
        Regex::new(r#"(?i)([a-z0-9:-]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^>\s]+)))?"#).unwrap();

    static ref IDENTIFIER_REGEX: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*").unwrap();
}

/// Directive prefixes whose name part refers to a function in scope.
const DIRECTIVE_PREFIXES: [(&str, DirectiveKind); 5] = [
    ("in", DirectiveKind::Transition),
    ("out", DirectiveKind::Transition),
    ("transition", DirectiveKind::Transition),
    ("animate", DirectiveKind::Animation),
    ("use", DirectiveKind::Action),
];

// ═══════════════════════════════════════════════════════════════════════════════
// COMPONENT AST
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptContext {
    Instance,
    Module,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptBlock {
    pub context: ScriptContext,
    /// Offset of the opening `<script`.
    pub start: usize,
    pub content_start: usize,
    pub content_end: usize,
    pub typescript: bool,
}

/// A byte range of the file holding code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeSite {
    pub start: usize,
    pub end: usize,
}

impl CodeSite {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.start..self.end]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Transition,
    Animation,
    Action,
}

/// `in:fade`, `animate:flip`, `use:tooltip`... `start..end` spans the name only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveSite {
    pub kind: DirectiveKind,
    pub name: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    /// A JavaScript expression: `{count}`, `{#if ok}`, `on:click={handler}`.
    Expression(CodeSite),
    /// A binding pattern introduced by markup: `{#each items as item, i}`.
    Pattern(CodeSite),
    /// `{@const name = value}`; the site starts at `const`.
    ConstTag(CodeSite),
    /// Parameter list of a `{#snippet name(a, b)}` header, parentheses excluded.
    Parameters(CodeSite),
    Directive(DirectiveSite),
    Script(ScriptBlock),
}

#[derive(Debug, Clone)]
pub struct ComponentAst {
    /// The file with style blocks blanked; same byte length as the input.
    pub source: String,
    /// Document order.
    pub nodes: Vec<MarkupNode>,
    pub instance: Option<ScriptBlock>,
    pub module: Option<ScriptBlock>,
}

impl ComponentAst {
    /// Module script first: its bindings are visible to the instance script too.
    pub fn primary_script(&self) -> Option<&ScriptBlock> {
        self.module.as_ref().or(self.instance.as_ref())
    }

    pub fn is_typescript(&self) -> bool {
        self.instance.iter().chain(self.module.iter()).any(|s| s.typescript)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STYLE BLANKING
// ═══════════════════════════════════════════════════════════════════════════════

/// Replace every byte of every style block, tags included, with a space.
/// Newlines survive so that diagnostics keep their line numbers.
pub fn blank_style_blocks(source: &str) -> String {
    let mut bytes = source.as_bytes().to_vec();
    for m in STYLE_REGEX.find_iter(source) {
        for b in &mut bytes[m.start()..m.end()] {
            if *b != b'\n' {
                *b = b' ';
            }
        }
    }
    // Whole multi-byte sequences are overwritten, never split.
    String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCRIPT BLOCKS
// ═══════════════════════════════════════════════════════════════════════════════

fn parse_attributes(attr_string: &str) -> HashMap<String, String> {
    let mut attributes = HashMap::new();
    for attr_caps in ATTR_REGEX.captures_iter(attr_string) {
        if let Some(name) = attr_caps.get(1) {
            let value = attr_caps
                .get(2)
                .or_else(|| attr_caps.get(3))
                .or_else(|| attr_caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| "true".to_string());
            attributes.insert(name.as_str().to_lowercase(), value);
        }
    }
    attributes
}

/// Build a script block from its positions and raw attribute string.
fn script_block(
    start: usize,
    content_start: usize,
    content_end: usize,
    attr_string: &str,
) -> ScriptBlock {
    let attributes = parse_attributes(attr_string);
    let context = if attributes.get("context").map(String::as_str) == Some("module")
        || attributes.contains_key("module")
    {
        ScriptContext::Module
    } else {
        ScriptContext::Instance
    };
    let typescript = matches!(
        attributes.get("lang").map(String::as_str),
        Some("ts") | Some("typescript")
    );

    ScriptBlock {
        context,
        start,
        content_start,
        content_end,
        typescript,
    }
}

/// Index of the `>` closing the tag whose attributes start at `start`.
/// Quoted attribute values may contain `>`.
fn find_tag_end(src: &[u8], start: usize) -> Option<usize> {
    let mut in_quote: Option<u8> = None;
    for (i, &c) in src.iter().enumerate().skip(start) {
        match in_quote {
            Some(quote) if c == quote => in_quote = None,
            Some(_) => {}
            None if c == b'"' || c == b'\'' => in_quote = Some(c),
            None if c == b'>' => return Some(i),
            None => {}
        }
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXPRESSION SCANNING
// ═══════════════════════════════════════════════════════════════════════════════

/// Find the end of a balanced brace expression, handling strings and template literals.
/// Returns the index after the closing brace, or None if unbalanced.
pub fn find_balanced_brace_end(src: &[u8], start_index: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = start_index;
    let mut in_string: Option<u8> = None;
    let mut in_template_literal = false;

    while i < src.len() {
        let c = src[i];

        // Handle escape sequences
        if c == b'\\' && (in_string.is_some() || in_template_literal) {
            i += 2;
            continue;
        }

        if let Some(quote) = in_string {
            if c == quote {
                in_string = None;
            }
            i += 1;
            continue;
        }

        if in_template_literal {
            if c == b'`' {
                in_template_literal = false;
            } else if c == b'$' && src.get(i + 1) == Some(&b'{') {
                // Interpolations nest arbitrarily; recurse on them.
                i = find_balanced_brace_end(src, i + 1)?;
                continue;
            }
            i += 1;
            continue;
        }

        match c {
            b'"' | b'\'' => in_string = Some(c),
            b'`' => in_template_literal = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }

        i += 1;
    }

    None
}

/// Offset of `keyword` inside `range` at bracket depth zero, delimited by
/// whitespace before and whitespace or the range end after.
fn find_top_level_keyword(src: &[u8], range: Range<usize>, keyword: &str) -> Option<usize> {
    let kw = keyword.as_bytes();
    let mut depth = 0i32;
    let mut in_string: Option<u8> = None;
    let mut i = range.start;

    while i < range.end {
        let c = src[i];
        if let Some(quote) = in_string {
            if c == b'\\' {
                i += 2;
                continue;
            }
            if c == quote {
                in_string = None;
            }
            i += 1;
            continue;
        }
        match c {
            b'"' | b'\'' | b'`' => in_string = Some(c),
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            _ if depth == 0
                && i > range.start
                && src[i - 1].is_ascii_whitespace()
                && src[i..range.end].starts_with(kw)
                && src
                    .get(i + kw.len())
                    .map_or(true, |b| i + kw.len() >= range.end || b.is_ascii_whitespace()) =>
            {
                return Some(i);
            }
            _ => {}
        }
        i += 1;
    }

    None
}

/// First byte at depth zero in `range` that is one of `stops`.
fn find_top_level_byte(src: &[u8], range: Range<usize>, stops: &[u8]) -> Option<usize> {
    let mut depth = 0i32;
    let mut in_string: Option<u8> = None;
    let mut i = range.start;

    while i < range.end {
        let c = src[i];
        if let Some(quote) = in_string {
            if c == b'\\' {
                i += 2;
                continue;
            }
            if c == quote {
                in_string = None;
            }
            i += 1;
            continue;
        }
        if depth == 0 && stops.contains(&c) {
            return Some(i);
        }
        match c {
            b'"' | b'\'' | b'`' => in_string = Some(c),
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            _ => {}
        }
        i += 1;
    }

    None
}

/// Narrow `range` to its non-whitespace part.
fn trim_range(src: &[u8], range: Range<usize>) -> Range<usize> {
    let mut start = range.start;
    let mut end = range.end;
    while start < end && src[start].is_ascii_whitespace() {
        start += 1;
    }
    while end > start && src[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    start..end
}

fn read_word(src: &[u8], start: usize, end: usize) -> usize {
    let mut i = start;
    while i < end && (src[i].is_ascii_alphanumeric() || src[i] == b'_') {
        i += 1;
    }
    i
}

// ═══════════════════════════════════════════════════════════════════════════════
// MARKUP SCANNER
// ═══════════════════════════════════════════════════════════════════════════════

struct MarkupScanner<'s> {
    source: &'s str,
    src: &'s [u8],
    file_path: &'s str,
    pos: usize,
    nodes: Vec<MarkupNode>,
    instance: Option<ScriptBlock>,
    module: Option<ScriptBlock>,
}

impl<'s> MarkupScanner<'s> {
    fn new(source: &'s str, file_path: &'s str) -> Self {
        Self {
            source,
            src: source.as_bytes(),
            file_path,
            pos: 0,
            nodes: Vec::new(),
            instance: None,
            module: None,
        }
    }

    fn scan(&mut self) -> Result<(), CompilerError> {
        while self.pos < self.src.len() {
            let rest = &self.src[self.pos..];
            if rest.starts_with(b"<!--") {
                self.pos = self.source[self.pos..]
                    .find("-->")
                    .map_or(self.src.len(), |i| self.pos + i + 3);
                continue;
            }

            match rest[0] {
                b'<' if rest.get(1).map_or(false, |b| b.is_ascii_alphabetic()) => {
                    if !(self.at_script_tag() && self.scan_script()?) {
                        self.scan_tag()?;
                    }
                }
                b'{' => self.scan_mustache()?,
                _ => self.pos += 1,
            }
        }

        Ok(())
    }

    fn at_script_tag(&self) -> bool {
        let name = &self.src[self.pos + 1..];
        // Capitalised `<Script>` is a component.
        name.starts_with(b"script")
            && name
                .get(6)
                .map_or(true, |&b| b.is_ascii_whitespace() || b == b'>' || b == b'/')
    }

    /// Consume the `<script ...>...</script>` element at the current position.
    /// Returns false, without moving, when the element is never closed.
    fn scan_script(&mut self) -> Result<bool, CompilerError> {
        let start = self.pos;
        let source = self.source;
        let attrs_start = start + "<script".len();
        let Some(open_end) = find_tag_end(self.src, attrs_start) else {
            return Ok(false);
        };
        if self.src[open_end - 1] == b'/' {
            // `<script src="..." />` has no content.
            self.pos = open_end + 1;
            return Ok(true);
        }
        let content_start = open_end + 1;
        let Some(close) = SCRIPT_CLOSE_REGEX.find_at(source, content_start) else {
            return Ok(false);
        };

        let block = script_block(
            start,
            content_start,
            close.start(),
            &source[attrs_start..open_end],
        );
        let slot = match block.context {
            ScriptContext::Instance => &mut self.instance,
            ScriptContext::Module => &mut self.module,
        };
        if slot.is_some() {
            let kind = match block.context {
                ScriptContext::Instance => "instance",
                ScriptContext::Module => "context=\"module\"",
            };
            return Err(CompilerError::at_offset(
                ERR_DUPLICATE_SCRIPT,
                &format!("A component can only have one {} <script> element", kind),
                self.file_path,
                source,
                start,
            ));
        }
        *slot = Some(block.clone());
        self.nodes.push(MarkupNode::Script(block));
        self.pos = close.end();
        Ok(true)
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.src.len() && self.src[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn scan_tag(&mut self) -> Result<(), CompilerError> {
        self.pos += 1;
        while self.pos < self.src.len()
            && !self.src[self.pos].is_ascii_whitespace()
            && !matches!(self.src[self.pos], b'>' | b'/')
        {
            self.pos += 1;
        }

        loop {
            self.skip_whitespace();
            let Some(&c) = self.src.get(self.pos) else {
                return Ok(());
            };
            match c {
                b'>' => {
                    self.pos += 1;
                    return Ok(());
                }
                b'/' if self.src.get(self.pos + 1) == Some(&b'>') => {
                    self.pos += 2;
                    return Ok(());
                }
                b'{' => self.scan_mustache()?,
                _ => self.scan_attribute()?,
            }
        }
    }

    fn scan_attribute(&mut self) -> Result<(), CompilerError> {
        let name_start = self.pos;
        while self.pos < self.src.len() {
            let c = self.src[self.pos];
            if c.is_ascii_whitespace()
                || matches!(c, b'=' | b'>' | b'{' | b'"' | b'\'')
                || (c == b'/' && self.src.get(self.pos + 1) == Some(&b'>'))
            {
                break;
            }
            self.pos += 1;
        }
        if self.pos == name_start {
            // Stray quote or similar; step over it.
            self.pos += 1;
            return Ok(());
        }
        let name_end = self.pos;
        self.record_directive(name_start, name_end);
        // `let:item` binds `item`, `let:item={pattern}` binds the pattern.
        let slot_binding = self.source[name_start..name_end].starts_with("let:");

        self.skip_whitespace();
        if self.src.get(self.pos) != Some(&b'=') {
            if slot_binding {
                self.push_pattern(name_start + "let:".len()..name_end);
            }
            return Ok(());
        }
        self.pos += 1;
        self.skip_whitespace();

        match self.src.get(self.pos) {
            Some(b'{') if slot_binding => {
                let open = self.pos;
                let end = self.mustache_end(open)?;
                self.push_pattern(open + 1..end - 1);
                self.pos = end;
            }
            Some(&quote) if quote == b'"' || quote == b'\'' => {
                self.pos += 1;
                while self.pos < self.src.len() && self.src[self.pos] != quote {
                    if self.src[self.pos] == b'{' {
                        self.scan_mustache()?;
                    } else {
                        self.pos += 1;
                    }
                }
                self.pos += 1;
            }
            Some(b'{') => self.scan_mustache()?,
            _ => {
                while self.pos < self.src.len()
                    && !self.src[self.pos].is_ascii_whitespace()
                    && self.src[self.pos] != b'>'
                {
                    self.pos += 1;
                }
            }
        }
        Ok(())
    }

    fn record_directive(&mut self, start: usize, end: usize) {
        let source = self.source;
        let attr = &source[start..end];
        let Some((prefix, rest)) = attr.split_once(':') else {
            return;
        };
        let Some(&(_, kind)) = DIRECTIVE_PREFIXES.iter().find(|(p, _)| *p == prefix) else {
            return;
        };
        let Some(m) = IDENTIFIER_REGEX.find(rest) else {
            return;
        };
        let name_start = start + prefix.len() + 1;
        self.nodes.push(MarkupNode::Directive(DirectiveSite {
            kind,
            name: m.as_str().to_string(),
            start: name_start,
            end: name_start + m.end(),
        }));
    }

    fn mustache_end(&self, open: usize) -> Result<usize, CompilerError> {
        find_balanced_brace_end(self.src, open).ok_or_else(|| {
            CompilerError::at_offset(
                ERR_UNTERMINATED_EXPRESSION,
                "Expected '}' to close the expression",
                self.file_path,
                self.source,
                open,
            )
        })
    }

    fn scan_mustache(&mut self) -> Result<(), CompilerError> {
        let open = self.pos;
        let end = self.mustache_end(open)?;
        self.classify_tag(open + 1, end - 1);
        self.pos = end;
        Ok(())
    }

    fn push_expression(&mut self, range: Range<usize>) {
        let range = trim_range(self.src, range);
        if !range.is_empty() {
            self.nodes
                .push(MarkupNode::Expression(CodeSite::new(range.start, range.end)));
        }
    }

    fn push_pattern(&mut self, range: Range<usize>) {
        let range = trim_range(self.src, range);
        if !range.is_empty() {
            self.nodes
                .push(MarkupNode::Pattern(CodeSite::new(range.start, range.end)));
        }
    }

    /// Sort the inside of `{ ... }` into expressions, patterns and const tags.
    fn classify_tag(&mut self, start: usize, end: usize) {
        let inner = trim_range(self.src, start..end);
        if inner.is_empty() {
            return;
        }
        let src = self.src;
        let source = self.source;
        let sigil = src[inner.start];
        let kw_start = inner.start + 1;
        let kw_end = read_word(src, kw_start, inner.end);
        let keyword = if matches!(sigil, b'#' | b':' | b'/' | b'@') {
            &source[kw_start..kw_end]
        } else {
            ""
        };
        let rest = kw_end..inner.end;

        match (sigil, keyword) {
            (b'#', "if") | (b'#', "key") => self.push_expression(rest),
            (b'#', "each") => self.classify_each(rest),
            (b'#', "snippet") => self.classify_snippet(rest),
            (b'#', "await") => {
                let then = find_top_level_keyword(src, rest.clone(), "then");
                let catch = find_top_level_keyword(src, rest.clone(), "catch");
                match then.or(catch) {
                    Some(at) => {
                        let kw_len = if then.is_some() { 4 } else { 5 };
                        self.push_expression(rest.start..at);
                        self.push_pattern(at + kw_len..rest.end);
                    }
                    None => self.push_expression(rest),
                }
            }
            (b':', "else") => {
                let after = trim_range(src, rest.clone());
                if src[after.clone()].starts_with(b"if")
                    && src.get(after.start + 2).map_or(false, |b| b.is_ascii_whitespace())
                {
                    self.push_expression(after.start + 2..after.end);
                }
            }
            (b':', "then") | (b':', "catch") => self.push_pattern(rest),
            (b'@', "html") | (b'@', "render") | (b'@', "debug") => self.push_expression(rest),
            (b'@', "const") => {
                let site = trim_range(src, kw_start..inner.end);
                self.nodes
                    .push(MarkupNode::ConstTag(CodeSite::new(site.start, site.end)));
            }
            (b'#', _) | (b':', _) | (b'/', _) | (b'@', _) => {}
            _ if src[inner.clone()].starts_with(b"...") => {
                self.push_expression(inner.start + 3..inner.end)
            }
            _ => self.push_expression(inner),
        }
    }

    /// `{#snippet name(a, { b })}`: the name and every parameter are bindings.
    fn classify_snippet(&mut self, rest: Range<usize>) {
        let src = self.src;
        let Some(open) = find_top_level_byte(src, rest.clone(), b"(") else {
            self.push_pattern(rest);
            return;
        };
        self.push_pattern(rest.start..open);

        let close = src[open..rest.end]
            .iter()
            .rposition(|&b| b == b')')
            .map_or(rest.end, |i| open + i);
        let params = trim_range(src, open + 1..close);
        if !params.is_empty() {
            self.nodes
                .push(MarkupNode::Parameters(CodeSite::new(params.start, params.end)));
        }
    }

    /// `{#each list as item, index (key)}`
    fn classify_each(&mut self, rest: Range<usize>) {
        let src = self.src;
        let Some(as_at) = find_top_level_keyword(src, rest.clone(), "as") else {
            self.push_expression(rest);
            return;
        };
        self.push_expression(rest.start..as_at);

        let binding = as_at + 2..rest.end;
        let key_open = find_top_level_byte(src, binding.clone(), b"(");
        let context_end = find_top_level_byte(src, binding.clone(), b",(").unwrap_or(binding.end);
        self.push_pattern(binding.start..context_end);

        if src.get(context_end) == Some(&b',') {
            self.push_pattern(context_end + 1..key_open.unwrap_or(binding.end));
        }
        if let Some(open) = key_open {
            let close = src[open..binding.end]
                .iter()
                .rposition(|&b| b == b')')
                .map_or(binding.end, |i| open + i);
            self.push_expression(open + 1..close);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MAIN PARSING FUNCTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse a component file into its scripts and markup code sites.
pub fn parse_component(source: &str, file_path: &str) -> Result<ComponentAst, CompilerError> {
    // Step 1: Blank styles so their contents never look like code
    let blanked = blank_style_blocks(source);

    // Step 2: Scan markup; scripts count only where a tag can start
    let mut scanner = MarkupScanner::new(&blanked, file_path);
    scanner.scan()?;
    let MarkupScanner {
        nodes,
        instance,
        module,
        ..
    } = scanner;

    Ok(ComponentAst {
        source: blanked,
        nodes,
        instance,
        module,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
