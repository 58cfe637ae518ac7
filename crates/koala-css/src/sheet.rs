//! Style sheet builder: turns a token stream into an ordered collection of
//! rules, per [CSS Syntax Level 3 § 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing).
//!
//! A [`Stylesheet`] is built by one pass of [`Stylesheet::parse`] over the
//! source text: [`crate::tokenizer::Tokenizer`] produces tokens,
//! [`crate::value`] groups a declaration's tokens into component values,
//! [`crate::selector::parse_selector`] compiles each selector in a
//! prelude, and [`crate::media::parse_media_query_list`] compiles an
//! `@media`/`@import` prelude. Network-fed sheets go through
//! [`SheetBuilder`], which accepts byte chunks as they arrive and parses
//! once the feed is complete (between feeds, the buffered bytes are the
//! parser's stable suspended state). Once built, a sheet is immutable —
//! there is no in-place rule mutation API, matching the "being built /
//! complete / in use" lifecycle the cascade relies on.
//!
//! `@charset` and `@import` are position-sensitive: the builder tracks a
//! phase (before-charset, before-rules, had-rule) and drops a late
//! `@charset` or `@import` instead of letting it take effect.

use crate::error::CssError;
use crate::media::MediaQueryList;
use crate::selector::ParsedSelector;
use crate::token::Token;
use crate::tokenizer::Tokenizer;
use crate::value::{self, ComponentValue, Declaration};
use koala_common::atom::Atom;
use koala_common::diagnostics;
use std::cell::OnceCell;
use std::rc::Rc;

/// Where a style sheet's rules enter the cascade.
///
/// [CSS Cascading Level 4 § 6.1 Cascade
/// Sorting](https://www.w3.org/TR/css-cascade-4/#cascade-sort): "Each
/// style rule has a cascade origin... CSS defines three core origins:
/// Author, User, and User-Agent."
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Origin {
    /// Lowest priority: the engine's own baseline rules.
    UserAgent,
    /// The reader's own style sheet, if any.
    User,
    /// The document's own style sheets. Highest priority, except that an
    /// `!important` declaration inverts User and UserAgent above Author
    /// (applied by [`crate::cascade`], not represented here).
    Author,
}

/// A style rule: a selector list plus its declaration block.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    /// Every selector in the prelude's comma-separated list, each
    /// compiled independently. An unparseable selector in the list is
    /// dropped (per [§ 5.1 Selector
    /// Lists](https://www.w3.org/TR/selectors-4/#invalid)), not treated
    /// as invalidating the whole rule.
    pub selectors: Vec<ParsedSelector>,
    /// The declarations in this rule's block, in source order.
    pub declarations: Vec<Declaration>,
    /// This rule's position in its sheet, used as the final cascade
    /// tie-break (source order).
    pub source_order: u32,
}

/// An `@media` rule: a condition plus the rules it guards. Children may
/// themselves be `@media` rules — nesting runs through the same state
/// machine as the top level.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRule {
    /// The parsed `<media-query-list>`.
    pub condition: MediaQueryList,
    /// The rules nested inside the `@media` block.
    pub rules: Vec<Rule>,
    /// This rule's position in the sheet.
    pub source_order: u32,
}

/// An `@import` rule: a target URL plus an optional media-query guard,
/// and a lazily attached handle to the imported sheet once the client
/// has fetched and parsed it.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRule {
    /// The target URL exactly as written (resolve against the sheet's
    /// base URL via [`ImportRule::resolve_url`]).
    pub url: Atom,
    /// The import's media-query condition, if any (an unconditional
    /// `@import` has an empty-list condition, matching everything).
    pub condition: MediaQueryList,
    /// The imported sheet, once attached. The engine never fetches;
    /// the client resolves the URL, feeds the bytes through a
    /// [`SheetBuilder`], and attaches the result here.
    pub imported: OnceCell<Rc<Stylesheet>>,
    /// This rule's position in the sheet.
    pub source_order: u32,
}

impl ImportRule {
    /// Resolve this import's target against the owning sheet's base URL.
    #[must_use]
    pub fn resolve_url(&self, base: Option<&str>) -> String {
        koala_common::url::resolve_url(self.url.as_str(), base)
    }

    /// Attach the fetched-and-parsed sheet. Returns `false` if a sheet
    /// was already attached (the attach is once-only).
    #[must_use]
    pub fn attach(&self, sheet: Rc<Stylesheet>) -> bool {
        self.imported.set(sheet).is_ok()
    }
}

/// An `@page` rule: an optional page selector (`:first`, `:left`,
/// `:right`, or none) plus declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRule {
    /// The page pseudo-class, if any, lowercased and without its `:`.
    pub pseudo: Option<Atom>,
    /// The page's declaration block.
    pub declarations: Vec<Declaration>,
    /// This rule's position in the sheet.
    pub source_order: u32,
}

/// An `@font-face` rule: a block of font descriptors (`font-family`,
/// `src`, …). Stored as raw declarations since descriptor resolution
/// (fetching, format negotiation) is out of scope for this crate.
#[derive(Debug, Clone, PartialEq)]
pub struct FontFaceRule {
    /// The descriptor block, in source order.
    pub descriptors: Vec<Declaration>,
    /// This rule's position in the sheet.
    pub source_order: u32,
}

/// One top-level production out of the CSS rule grammar.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// A qualified rule: selectors plus declarations.
    Style(StyleRule),
    /// `@media`
    Media(MediaRule),
    /// `@import`
    Import(ImportRule),
    /// `@page`
    Page(PageRule),
    /// `@font-face`
    FontFace(FontFaceRule),
    /// `@charset "encoding"`, preserved only for round-trip diagnostics —
    /// this crate always treats its input as already-decoded `&str`, so
    /// the named encoding has no further effect.
    Charset(Atom),
}

/// Extra sheet-level inputs beyond the source text and origin.
#[derive(Debug, Clone, Default)]
pub struct SheetOptions {
    /// Parse under quirks-mode compatibility rules (bare numbers as px
    /// lengths, unprefixed hex colors).
    pub quirks: bool,
    /// The sheet's own URL, for `@import` resolution and diagnostics.
    pub url: Option<Atom>,
}

/// A parsed, immutable style sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Stylesheet {
    /// Every rule, in source order.
    pub rules: Vec<Rule>,
    /// This sheet's cascade origin.
    pub origin: Origin,
    /// Whether declarations in this sheet parse under quirks rules.
    pub quirks: bool,
    /// The sheet's own URL, if known.
    pub url: Option<Atom>,
    /// The encoding named by a leading `@charset`, if one was accepted.
    pub declared_charset: Option<Atom>,
}

impl Stylesheet {
    /// Parse a complete style sheet from source text.
    ///
    /// [§ 5.3.3 Parse a
    /// stylesheet](https://www.w3.org/TR/css-syntax-3/#parse-stylesheet):
    /// "Consume a list of rules from input, with the top-level flag set."
    #[must_use]
    pub fn parse(source: &str, origin: Origin) -> Self {
        Self::parse_with(source, origin, &SheetOptions::default())
    }

    /// [`Stylesheet::parse`] with explicit sheet options (quirks flag,
    /// base URL).
    #[must_use]
    pub fn parse_with(source: &str, origin: Origin, options: &SheetOptions) -> Self {
        let mut parser = Parser {
            tokens: Tokenizer::new(source).peekable(),
            next_source_order: 0,
            phase: Phase::BeforeCharset,
        };
        let rules = parser.consume_list_of_rules(true);
        let declared_charset = rules.iter().find_map(|rule| match rule {
            Rule::Charset(encoding) => Some(encoding.clone()),
            _ => None,
        });
        Self {
            rules,
            origin,
            quirks: options.quirks,
            url: options.url.clone(),
            declared_charset,
        }
    }

    /// Every style rule visible from this sheet under the current media
    /// — including rules nested in matching `@media` blocks (at any
    /// depth) and rules from attached `@import`ed sheets whose condition
    /// matches — in document order, imports inlined at their position.
    #[must_use]
    pub fn effective_style_rules(
        &self,
        media_matches: impl Fn(&MediaQueryList) -> bool + Copy,
    ) -> Vec<&StyleRule> {
        let mut out = Vec::new();
        collect_style_rules(&self.rules, media_matches, &mut out, 0);
        out
    }
}

/// Nested-import recursion cap; an import cycle would otherwise recurse
/// forever since attached sheets are reference-counted and can alias.
const MAX_IMPORT_DEPTH: u32 = 16;

fn collect_style_rules<'a>(
    rules: &'a [Rule],
    media_matches: impl Fn(&MediaQueryList) -> bool + Copy,
    out: &mut Vec<&'a StyleRule>,
    depth: u32,
) {
    for rule in rules {
        match rule {
            Rule::Style(style) => out.push(style),
            Rule::Media(media) if media_matches(&media.condition) => {
                collect_style_rules(&media.rules, media_matches, out, depth);
            }
            Rule::Import(import) if media_matches(&import.condition) => {
                if depth >= MAX_IMPORT_DEPTH {
                    diagnostics::warn_once("sheet", "import nesting too deep, subtree skipped");
                    continue;
                }
                if let Some(sheet) = import.imported.get() {
                    collect_style_rules(&sheet.rules, media_matches, out, depth + 1);
                }
            }
            _ => {}
        }
    }
}

/// Incremental sheet construction for network-fed sources: bytes are
/// appended as they arrive and parsed when [`SheetBuilder::finish`] is
/// called. Abandoning the builder mid-feed just drops the buffer.
#[derive(Debug)]
pub struct SheetBuilder {
    origin: Origin,
    options: SheetOptions,
    buffer: Vec<u8>,
}

impl SheetBuilder {
    /// Start building a sheet of the given origin.
    #[must_use]
    pub fn new(origin: Origin) -> Self {
        Self::with_options(origin, SheetOptions::default())
    }

    /// Start building with explicit sheet options.
    #[must_use]
    pub fn with_options(origin: Origin, options: SheetOptions) -> Self {
        Self {
            origin,
            options,
            buffer: Vec::new(),
        }
    }

    /// Declare the transport- or client-supplied charset. Only UTF-8 and
    /// its ASCII subset are supported.
    ///
    /// # Errors
    ///
    /// [`CssError::BadCharset`] for any other encoding name.
    pub fn charset_hint(self, charset: &str) -> Result<Self, CssError> {
        let supported = ["utf-8", "utf8", "us-ascii", "ascii"]
            .iter()
            .any(|name| charset.eq_ignore_ascii_case(name));
        if supported {
            Ok(self)
        } else {
            Err(CssError::BadCharset(charset.to_string()))
        }
    }

    /// Append a chunk of source bytes. Chunk boundaries may fall
    /// anywhere, including mid-token or mid-UTF-8-sequence.
    pub fn append(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Whether the buffered bytes end mid-UTF-8-sequence — in which case
    /// [`SheetBuilder::finish`] would return [`CssError::NeedData`] and
    /// the caller should append the rest first.
    #[must_use]
    pub fn needs_data(&self) -> bool {
        match std::str::from_utf8(&self.buffer) {
            Ok(_) => false,
            Err(e) => e.error_len().is_none(),
        }
    }

    /// Finish the feed and parse the sheet.
    ///
    /// # Errors
    ///
    /// [`CssError::NeedData`] when the buffer ends in an incomplete
    /// UTF-8 sequence (more bytes are genuinely outstanding). Invalid
    /// sequences in the interior decode lossily with a diagnostic, the
    /// same recovery posture as any other malformed construct.
    pub fn finish(self) -> Result<Stylesheet, CssError> {
        let source = match std::str::from_utf8(&self.buffer) {
            Ok(source) => std::borrow::Cow::Borrowed(source),
            Err(e) if e.error_len().is_none() => return Err(CssError::NeedData),
            Err(_) => {
                diagnostics::warn_once("sheet", "invalid UTF-8 in sheet source, decoded lossily");
                String::from_utf8_lossy(&self.buffer)
            }
        };
        Ok(Stylesheet::parse_with(&source, self.origin, &self.options))
    }
}

/// Where the sheet is in its `@charset`/`@import` window.
///
/// `@charset` is only honored as the very first construct; `@import`
/// only before the first real rule. A disallowed occurrence is dropped
/// with a diagnostic and the phase is unchanged — the boundary the rest
/// of the sheet parses against stays consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    BeforeCharset,
    BeforeRules,
    HadRule,
}

struct Parser<'a> {
    tokens: std::iter::Peekable<Tokenizer<'a>>,
    next_source_order: u32,
    phase: Phase,
}

impl Parser<'_> {
    /// [§ 5.4.1 Consume a list of
    /// rules](https://www.w3.org/TR/css-syntax-3/#consume-list-of-rules).
    /// `nested` additionally stops (and consumes) at a `}`, for an
    /// `@media` block's contents.
    fn consume_rules(&mut self, top_level: bool, nested: bool) -> Vec<Rule> {
        let mut rules = Vec::new();
        loop {
            match self.tokens.peek() {
                Some(Token::Whitespace) => {
                    let _ = self.tokens.next();
                }
                None | Some(Token::Eof) => return rules,
                Some(Token::RightBrace) if nested => {
                    let _ = self.tokens.next();
                    return rules;
                }
                Some(Token::Cdo | Token::Cdc) => {
                    if top_level {
                        let _ = self.tokens.next();
                    } else if let Some(rule) = self.consume_qualified_rule() {
                        rules.push(rule);
                    }
                }
                Some(Token::AtKeyword(_)) => {
                    if let Some(rule) = self.consume_at_rule() {
                        rules.push(rule);
                    }
                }
                Some(_) => {
                    if let Some(rule) = self.consume_qualified_rule() {
                        rules.push(rule);
                    }
                }
            }
        }
    }

    fn consume_list_of_rules(&mut self, top_level: bool) -> Vec<Rule> {
        self.consume_rules(top_level, false)
    }

    /// [§ 5.4.2 Consume an
    /// at-rule](https://www.w3.org/TR/css-syntax-3/#consume-at-rule),
    /// dispatching each recognized name to its own rule type. The
    /// prelude is kept as raw tokens (not grouped component values) since
    /// every supported at-rule here only needs to re-derive a small
    /// media-query or identifier from it.
    fn consume_at_rule(&mut self) -> Option<Rule> {
        let Some(Token::AtKeyword(name)) = self.tokens.next() else {
            return None;
        };
        let source_order = self.next_source_order();
        let lower = name.as_str().to_ascii_lowercase();

        let mut prelude = Vec::new();
        while !matches!(
            self.tokens.peek(),
            None | Some(Token::Eof | Token::Semicolon | Token::LeftBrace)
        ) {
            prelude.push(self.tokens.next()?);
        }

        match self.tokens.peek() {
            Some(Token::Semicolon) => {
                let _ = self.tokens.next();
                self.finish_blockless_at_rule(&lower, &prelude, source_order)
            }
            None | Some(Token::Eof) => self.finish_blockless_at_rule(&lower, &prelude, source_order),
            Some(Token::LeftBrace) => {
                let _ = self.tokens.next();
                self.finish_block_at_rule(&lower, &prelude, source_order)
            }
            _ => None,
        }
    }

    fn finish_blockless_at_rule(&mut self, lower: &str, prelude: &[Token], source_order: u32) -> Option<Rule> {
        match lower {
            "charset" => {
                if self.phase != Phase::BeforeCharset {
                    diagnostics::warn_once("sheet", "@charset after other content ignored");
                    return None;
                }
                let encoding = prelude.iter().find_map(|t| match t {
                    Token::String(s) => Some(s.clone()),
                    _ => None,
                })?;
                self.phase = Phase::BeforeRules;
                Some(Rule::Charset(encoding))
            }
            "import" => {
                if self.phase > Phase::BeforeRules {
                    diagnostics::warn_once("sheet", "@import after first rule rejected");
                    return None;
                }
                let url = prelude.iter().find_map(token_as_url)?;
                let condition = crate::media::parse_media_query_list(&tokens_to_source_text(media_tokens_after_url(prelude)));
                self.phase = Phase::BeforeRules;
                Some(Rule::Import(ImportRule {
                    url,
                    condition,
                    imported: OnceCell::new(),
                    source_order,
                }))
            }
            other => {
                diagnostics::warn_once("sheet", &format!("unsupported at-rule @{other}, dropped"));
                None
            }
        }
    }

    /// Consumes through the block's closing `}` before returning.
    fn finish_block_at_rule(&mut self, lower: &str, prelude: &[Token], source_order: u32) -> Option<Rule> {
        match lower {
            "media" => {
                self.phase = Phase::HadRule;
                let condition = crate::media::parse_media_query_list(&tokens_to_source_text(prelude));
                let rules = self.consume_rules(false, true);
                Some(Rule::Media(MediaRule { condition, rules, source_order }))
            }
            "page" => {
                self.phase = Phase::HadRule;
                let pseudo = prelude.iter().find_map(|t| match t {
                    Token::Ident(a) => Some(Atom::new_case_folded(a.as_str())),
                    _ => None,
                });
                let declarations = self.consume_list_of_declarations();
                self.consume_closing_brace();
                Some(Rule::Page(PageRule { pseudo, declarations, source_order }))
            }
            "font-face" => {
                self.phase = Phase::HadRule;
                let descriptors = self.consume_list_of_declarations();
                self.consume_closing_brace();
                Some(Rule::FontFace(FontFaceRule { descriptors, source_order }))
            }
            other => {
                self.skip_simple_block();
                diagnostics::warn_once("sheet", &format!("unsupported at-rule @{other}, dropped"));
                None
            }
        }
    }

    fn consume_closing_brace(&mut self) {
        if matches!(self.tokens.peek(), Some(Token::RightBrace)) {
            let _ = self.tokens.next();
        }
    }

    /// Discards an already-opened `{ ... }` block's contents, honoring
    /// nested braces.
    fn skip_simple_block(&mut self) {
        let mut depth = 1u32;
        loop {
            match self.tokens.next() {
                None | Some(Token::Eof) => return,
                Some(Token::LeftBrace) => depth += 1,
                Some(Token::RightBrace) => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    /// [§ 5.4.3 Consume a qualified
    /// rule](https://www.w3.org/TR/css-syntax-3/#consume-qualified-rule),
    /// specialized to style rules (the only qualified-rule production
    /// this engine's grammar accepts).
    fn consume_qualified_rule(&mut self) -> Option<Rule> {
        let mut prelude_tokens = Vec::new();
        loop {
            match self.tokens.peek() {
                None | Some(Token::Eof) => return None,
                Some(Token::LeftBrace) => {
                    let _ = self.tokens.next();
                    self.phase = Phase::HadRule;
                    let source_order = self.next_source_order();
                    let selectors = split_selector_list(&prelude_tokens);
                    let declarations = self.consume_list_of_declarations();
                    self.consume_closing_brace();
                    return Some(Rule::Style(StyleRule { selectors, declarations, source_order }));
                }
                Some(_) => {
                    prelude_tokens.push(self.tokens.next()?);
                }
            }
        }
    }

    /// [§ 5.4.5 Consume a list of
    /// declarations](https://www.w3.org/TR/css-syntax-3/#consume-list-of-declarations)
    fn consume_list_of_declarations(&mut self) -> Vec<Declaration> {
        let mut declarations = Vec::new();
        loop {
            match self.tokens.peek() {
                Some(Token::Whitespace | Token::Semicolon) => {
                    let _ = self.tokens.next();
                }
                None | Some(Token::Eof | Token::RightBrace) => return declarations,
                Some(Token::AtKeyword(_)) => {
                    let _ = self.consume_at_rule();
                }
                Some(Token::Ident(_)) => {
                    if let Some(decl) = self.consume_declaration() {
                        declarations.push(decl);
                    }
                }
                Some(_) => {
                    let _ = self.tokens.next();
                    while !matches!(
                        self.tokens.peek(),
                        None | Some(Token::Semicolon | Token::RightBrace | Token::Eof)
                    ) {
                        let _ = value::consume_one(&mut self.tokens);
                    }
                }
            }
        }
    }

    /// [§ 5.4.6 Consume a
    /// declaration](https://www.w3.org/TR/css-syntax-3/#consume-declaration)
    fn consume_declaration(&mut self) -> Option<Declaration> {
        let Some(Token::Ident(name)) = self.tokens.next() else {
            return None;
        };
        while matches!(self.tokens.peek(), Some(Token::Whitespace)) {
            let _ = self.tokens.next();
        }
        if !matches!(self.tokens.peek(), Some(Token::Colon)) {
            return None;
        }
        let _ = self.tokens.next();
        while matches!(self.tokens.peek(), Some(Token::Whitespace)) {
            let _ = self.tokens.next();
        }

        let mut components = Vec::new();
        while !matches!(
            self.tokens.peek(),
            None | Some(Token::Eof | Token::Semicolon | Token::RightBrace)
        ) {
            match value::consume_one(&mut self.tokens) {
                Some(v) => components.push(v),
                None => break,
            }
        }

        Some(finish_declaration(name.as_str(), components))
    }

    fn next_source_order(&mut self) -> u32 {
        let order = self.next_source_order;
        self.next_source_order += 1;
        order
    }
}

fn finish_declaration(name: &str, mut value: Vec<ComponentValue>) -> Declaration {
    while matches!(value.last(), Some(ComponentValue::Token(Token::Whitespace))) {
        let _ = value.pop();
    }
    let important = strip_important_suffix(&mut value);
    while matches!(value.last(), Some(ComponentValue::Token(Token::Whitespace))) {
        let _ = value.pop();
    }
    while matches!(value.first(), Some(ComponentValue::Token(Token::Whitespace))) {
        let _ = value.remove(0);
    }
    Declaration { property: Atom::new_case_folded(name), value, important }
}

/// Parse a style attribute's text (`color: red; width: 10px`) into the
/// declaration list an inline style contributes to the cascade.
#[must_use]
pub fn parse_inline_declarations(source: &str) -> Vec<Declaration> {
    let mut parser = Parser {
        tokens: Tokenizer::new(source).peekable(),
        next_source_order: 0,
        phase: Phase::HadRule,
    };
    parser.consume_list_of_declarations()
}

/// [CSS Cascading Level 4 § 6.4.2 Important
/// declarations](https://www.w3.org/TR/css-cascade-4/#importance): "the
/// last two (non-whitespace) tokens in its value are a delim-token '!'
/// followed by an ident-token that is an ASCII case-insensitive match for
/// 'important'".
fn strip_important_suffix(value: &mut Vec<ComponentValue>) -> bool {
    let mut i = value.len();
    while i > 0 && matches!(value[i - 1], ComponentValue::Token(Token::Whitespace)) {
        i -= 1;
    }
    if i == 0 {
        return false;
    }
    let Some(ComponentValue::Token(Token::Ident(ident))) = value.get(i - 1) else {
        return false;
    };
    if !ident.eq_ignore_ascii_case("important") {
        return false;
    }
    let mut j = i - 1;
    while j > 0 && matches!(value[j - 1], ComponentValue::Token(Token::Whitespace)) {
        j -= 1;
    }
    if j == 0 || !matches!(value.get(j - 1), Some(ComponentValue::Token(Token::Delim('!')))) {
        return false;
    }
    value.truncate(j - 1);
    true
}

/// [§ 5.1 Selector Lists](https://www.w3.org/TR/selectors-4/#selector-list):
/// "A selector list is a comma-separated list of selectors." An entry
/// that fails to parse is dropped rather than invalidating the rule.
fn split_selector_list(tokens: &[Token]) -> Vec<ParsedSelector> {
    tokens
        .split(|t| matches!(t, Token::Comma))
        .filter_map(|group| {
            let text = tokens_to_source_text(group);
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                crate::selector::parse_selector(trimmed)
            }
        })
        .collect()
}

/// A simplified re-serialization of raw tokens back to source text,
/// sufficient for [`crate::selector::parse_selector`]'s hand-rolled
/// character scanner and for [`crate::media::parse_media_query_list`]'s
/// own re-tokenizing parser. Not a spec-faithful serializer (escapes and
/// exact numeric formatting aren't preserved) — only round-trips what
/// this crate's own tokenizer can produce for selector and media-feature
/// text.
fn tokens_to_source_text(tokens: &[Token]) -> String {
    let mut s = String::new();
    for token in tokens {
        match token {
            Token::Ident(v) => s.push_str(v.as_str()),
            Token::Function(v) => {
                s.push_str(v.as_str());
                s.push('(');
            }
            Token::Hash { value, .. } => {
                s.push('#');
                s.push_str(value.as_str());
            }
            Token::String(v) => {
                s.push('"');
                s.push_str(v.as_str());
                s.push('"');
            }
            Token::Number { value, .. } => s.push_str(&value.to_f64().to_string()),
            Token::Percentage { value, .. } => {
                s.push_str(&value.to_f64().to_string());
                s.push('%');
            }
            Token::Dimension { value, unit, .. } => {
                s.push_str(&value.to_f64().to_string());
                s.push_str(unit.as_str());
            }
            Token::Delim(c) => s.push(*c),
            Token::Whitespace => s.push(' '),
            Token::Colon => s.push(':'),
            Token::Comma => s.push(','),
            Token::LeftBracket => s.push('['),
            Token::RightBracket => s.push(']'),
            Token::LeftParen => s.push('('),
            Token::RightParen => s.push(')'),
            _ => {}
        }
    }
    s.trim().to_string()
}

fn token_as_url(token: &Token) -> Option<Atom> {
    match token {
        Token::Url(s) | Token::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// The tokens remaining after `@import`'s URL (and, for the `url(...)`
/// function form, its closing paren), for re-parsing as the import's
/// media-query list.
fn media_tokens_after_url(prelude: &[Token]) -> &[Token] {
    for (i, t) in prelude.iter().enumerate() {
        match t {
            Token::Url(_) => return &prelude[i + 1..],
            Token::String(_) => {
                let after_paren = prelude
                    .get(i + 1)
                    .is_some_and(|next| matches!(next, Token::RightParen));
                return &prelude[i + 1 + usize::from(after_paren)..];
            }
            _ => {}
        }
    }
    &[]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_style_rule() {
        let sheet = Stylesheet::parse("p { color: red; }", Origin::Author);
        assert_eq!(sheet.rules.len(), 1);
        let Rule::Style(rule) = &sheet.rules[0] else { panic!("expected a style rule") };
        assert_eq!(rule.selectors.len(), 1);
        assert_eq!(rule.declarations.len(), 1);
        assert_eq!(rule.declarations[0].property.as_str(), "color");
    }

    #[test]
    fn selector_list_splits_on_commas() {
        let sheet = Stylesheet::parse("h1, h2 { font-weight: bold; }", Origin::Author);
        let Rule::Style(rule) = &sheet.rules[0] else { panic!("expected a style rule") };
        assert_eq!(rule.selectors.len(), 2);
    }

    #[test]
    fn important_declaration_is_flagged_and_stripped() {
        let sheet = Stylesheet::parse("p { color: red !important; }", Origin::Author);
        let Rule::Style(rule) = &sheet.rules[0] else { panic!("expected a style rule") };
        assert!(rule.declarations[0].important);
        assert_eq!(rule.declarations[0].value.len(), 1);
    }

    #[test]
    fn media_rule_nests_style_rules() {
        let sheet = Stylesheet::parse("@media screen { p { color: blue; } }", Origin::Author);
        let Rule::Media(media) = &sheet.rules[0] else { panic!("expected a media rule") };
        assert_eq!(media.rules.len(), 1);
        let Rule::Style(style) = &media.rules[0] else { panic!("expected a style rule") };
        assert_eq!(style.declarations[0].property.as_str(), "color");
    }

    #[test]
    fn media_rules_nest_inside_media_rules() {
        let sheet = Stylesheet::parse(
            "@media screen { @media (min-width: 100px) { p { color: blue; } } }",
            Origin::Author,
        );
        let effective = sheet.effective_style_rules(|_| true);
        assert_eq!(effective.len(), 1);
        let gated = sheet.effective_style_rules(|mq| mq.queries.is_empty());
        assert!(gated.is_empty());
    }

    #[test]
    fn media_rule_condition_matches_its_feature() {
        let sheet = Stylesheet::parse("@media (min-width: 100px) { a { color: red; } }", Origin::Author);
        let Rule::Media(media) = &sheet.rules[0] else { panic!() };
        let wide = crate::media::MediaDescription { width: crate::unit::Dimension::new(200.0, crate::unit::Unit::Px), ..crate::media::MediaDescription::screen_default() };
        assert!(media.condition.matches(&wide));
    }

    #[test]
    fn import_rule_captures_url_and_media() {
        let sheet = Stylesheet::parse(r#"@import "print.css" print;"#, Origin::Author);
        let Rule::Import(import) = &sheet.rules[0] else { panic!("expected an import rule") };
        assert_eq!(import.url.as_str(), "print.css");
    }

    #[test]
    fn import_rule_with_url_function_form() {
        let sheet = Stylesheet::parse(r#"@import url("screen.css");"#, Origin::Author);
        let Rule::Import(import) = &sheet.rules[0] else { panic!() };
        assert_eq!(import.url.as_str(), "screen.css");
    }

    #[test]
    fn attached_import_contributes_its_rules_inline() {
        let sheet = Stylesheet::parse(r#"@import "a.css"; p { color: red; }"#, Origin::Author);
        let Rule::Import(import) = &sheet.rules[0] else { panic!() };
        let imported = Rc::new(Stylesheet::parse("a { display: block; }", Origin::Author));
        assert!(import.attach(imported.clone()));
        assert!(!import.attach(imported));

        let effective = sheet.effective_style_rules(|_| true);
        assert_eq!(effective.len(), 2);
        // The imported rule comes first: imports sit before the sheet's
        // own rules in document order.
        assert_eq!(effective[0].declarations[0].property.as_str(), "display");
        assert_eq!(effective[1].declarations[0].property.as_str(), "color");
    }

    #[test]
    fn unattached_import_contributes_nothing() {
        let sheet = Stylesheet::parse(r#"@import "a.css"; p { color: red; }"#, Origin::Author);
        assert_eq!(sheet.effective_style_rules(|_| true).len(), 1);
    }

    #[test]
    fn import_resolves_against_the_sheet_url() {
        let sheet = Stylesheet::parse(r#"@import "reset.css";"#, Origin::Author);
        let Rule::Import(import) = &sheet.rules[0] else { panic!() };
        assert_eq!(
            import.resolve_url(Some("https://example.com/styles/main.css")),
            "https://example.com/styles/reset.css"
        );
    }

    #[test]
    fn charset_rule_captures_encoding_name() {
        let sheet = Stylesheet::parse(r#"@charset "utf-8";"#, Origin::Author);
        let Rule::Charset(encoding) = &sheet.rules[0] else { panic!("expected a charset rule") };
        assert_eq!(encoding.as_str(), "utf-8");
        assert_eq!(sheet.declared_charset.as_ref().unwrap().as_str(), "utf-8");
    }

    #[test]
    fn late_charset_is_ignored_and_declared_charset_unchanged() {
        let sheet = Stylesheet::parse(
            r#"p { color: red; } @charset "utf-16";"#,
            Origin::Author,
        );
        assert_eq!(sheet.rules.len(), 1);
        assert!(sheet.declared_charset.is_none());
    }

    #[test]
    fn charset_after_import_is_ignored() {
        let sheet = Stylesheet::parse(
            r#"@import "a.css"; @charset "utf-16";"#,
            Origin::Author,
        );
        assert_eq!(sheet.rules.len(), 1);
        assert!(matches!(sheet.rules[0], Rule::Import(_)));
    }

    #[test]
    fn import_after_style_rule_is_rejected() {
        let sheet = Stylesheet::parse(
            r#"p { color: red; } @import "late.css";"#,
            Origin::Author,
        );
        assert_eq!(sheet.rules.len(), 1);
        assert!(matches!(sheet.rules[0], Rule::Style(_)));
    }

    #[test]
    fn import_before_rules_is_accepted_even_without_charset() {
        let sheet = Stylesheet::parse(
            r#"@import "a.css"; @import "b.css"; p { color: red; }"#,
            Origin::Author,
        );
        assert_eq!(sheet.rules.len(), 3);
    }

    #[test]
    fn font_face_rule_collects_descriptors() {
        let sheet = Stylesheet::parse(r#"@font-face { font-family: "Foo"; }"#, Origin::Author);
        let Rule::FontFace(rule) = &sheet.rules[0] else { panic!() };
        assert_eq!(rule.descriptors.len(), 1);
    }

    #[test]
    fn unsupported_at_rule_is_dropped_without_panicking() {
        let sheet = Stylesheet::parse(
            "@supports (display: flex) { p { color: red; } } a { color: blue; }",
            Origin::Author,
        );
        assert_eq!(sheet.rules.len(), 1);
        assert!(matches!(sheet.rules[0], Rule::Style(_)));
    }

    #[test]
    fn source_order_increases_monotonically() {
        let sheet = Stylesheet::parse("a { color: red; } b { color: blue; }", Origin::Author);
        let Rule::Style(first) = &sheet.rules[0] else { panic!() };
        let Rule::Style(second) = &sheet.rules[1] else { panic!() };
        assert!(first.source_order < second.source_order);
    }

    #[test]
    fn invalid_selector_in_a_list_is_dropped_not_fatal() {
        let sheet = Stylesheet::parse("p:::: , a { color: red; }", Origin::Author);
        let Rule::Style(rule) = &sheet.rules[0] else { panic!() };
        assert_eq!(rule.selectors.len(), 1);
    }

    #[test]
    fn effective_style_rules_skips_non_matching_media() {
        let sheet = Stylesheet::parse("@media print { a { color: red; } } b { color: blue; }", Origin::Author);
        let effective = sheet.effective_style_rules(|_| false);
        assert_eq!(effective.len(), 1);
        assert_eq!(effective[0].declarations[0].property.as_str(), "color");
    }

    #[test]
    fn builder_accepts_bytes_split_mid_sequence() {
        let source = "p { color: red; } /* déjà vu */ a { color: blue; }".as_bytes();
        let mut builder = SheetBuilder::new(Origin::Author);
        // Split inside the multi-byte 'é'.
        let split = source.iter().position(|&b| b > 0x7F).unwrap() + 1;
        builder.append(&source[..split]);
        assert!(builder.needs_data());
        builder.append(&source[split..]);
        assert!(!builder.needs_data());
        let sheet = builder.finish().unwrap();
        assert_eq!(sheet.rules.len(), 2);
    }

    #[test]
    fn builder_reports_need_data_for_a_truncated_feed() {
        let mut builder = SheetBuilder::new(Origin::Author);
        builder.append("p { color: red; } /* déjà".as_bytes());
        let truncated = {
            let mut b = SheetBuilder::new(Origin::Author);
            b.append(&"é".as_bytes()[..1]);
            b
        };
        assert!(truncated.needs_data());
        assert_eq!(truncated.finish(), Err(CssError::NeedData));
        // A complete feed parses fine even with an unterminated comment.
        assert!(builder.finish().is_ok());
    }

    #[test]
    fn builder_rejects_unsupported_charsets() {
        let builder = SheetBuilder::new(Origin::Author);
        let err = builder.charset_hint("utf-16le").unwrap_err();
        assert_eq!(err, CssError::BadCharset("utf-16le".to_string()));
        assert!(SheetBuilder::new(Origin::Author).charset_hint("UTF-8").is_ok());
    }

    #[test]
    fn quirks_flag_and_url_are_carried_on_the_sheet() {
        let options = SheetOptions {
            quirks: true,
            url: Some(Atom::new("https://example.com/quirky.css")),
        };
        let sheet = Stylesheet::parse_with("p { width: 100 }", Origin::Author, &options);
        assert!(sheet.quirks);
        assert_eq!(sheet.url.as_ref().unwrap().as_str(), "https://example.com/quirky.css");
    }

    #[test]
    fn inline_declarations_parse_like_a_block_body() {
        let decls = parse_inline_declarations("color: red; width: 10px");
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].property.as_str(), "color");
    }
}
