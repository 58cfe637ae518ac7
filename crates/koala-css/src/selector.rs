//! Selector parsing and matching per [Selectors Level
//! 4](https://www.w3.org/TR/selectors-4/).
//!
//! Matching never touches a concrete DOM directly — every function that
//! needs tree context takes a `&impl `[`NodeHandler`] and a node handle, so
//! this module works against whatever tree the embedder has.

use crate::handler::NodeHandler;
use koala_common::atom::Atom;

/// [§ 5](https://www.w3.org/TR/selectors-4/#elemental-selectors) /
/// [§ 6](https://www.w3.org/TR/selectors-4/#attribute-selectors) — one
/// condition on a single element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    /// [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors) — `div`.
    Type(Atom),
    /// [§ 6.6 Class selector](https://www.w3.org/TR/selectors-4/#class-html) — `.highlight`.
    Class(Atom),
    /// [§ 6.7 ID selector](https://www.w3.org/TR/selectors-4/#id-selectors) — `#main`.
    Id(Atom),
    /// [§ 5.2 Universal selector](https://www.w3.org/TR/selectors-4/#universal-selector) — `*`.
    Universal,
    /// A pseudo-class or pseudo-element this engine doesn't implement
    /// (`:nth-child()`, `:not()`, `::selection`, ...). Kept rather than
    /// rejected outright so the rest of a compound selector still
    /// contributes to specificity and the rule isn't silently dropped.
    NeverMatch,
    /// [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes) requiring tree context.
    PseudoClass(PseudoClass),
    /// [§ 6.4 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors).
    Attribute(AttributeSelector),
}

/// Structural pseudo-classes per [§
/// 4](https://www.w3.org/TR/selectors-4/#pseudo-classes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PseudoClass {
    /// [`:root`](https://www.w3.org/TR/selectors-4/#the-root-pseudo)
    Root,
    /// [`:first-child`](https://www.w3.org/TR/selectors-4/#the-first-child-pseudo)
    FirstChild,
    /// [`:last-child`](https://www.w3.org/TR/selectors-4/#the-last-child-pseudo)
    LastChild,
    /// [`:first-of-type`](https://www.w3.org/TR/selectors-4/#the-first-of-type-pseudo)
    FirstOfType,
    /// [`:last-of-type`](https://www.w3.org/TR/selectors-4/#the-last-of-type-pseudo)
    LastOfType,
    /// [`:only-child`](https://www.w3.org/TR/selectors-4/#the-only-child-pseudo)
    OnlyChild,
    /// [`:empty`](https://www.w3.org/TR/selectors-4/#the-empty-pseudo)
    Empty,
    /// [`:link`](https://www.w3.org/TR/selectors-4/#the-link-pseudo) — an unvisited `<a href>`/`<area href>`.
    Link,
    /// `:visited` — a link the client reports as visited.
    Visited,
    /// `:hover`
    Hover,
    /// `:active`
    Active,
    /// `:focus`
    Focus,
    /// `:disabled`
    Disabled,
    /// `:enabled`
    Enabled,
}

/// [§ 14 Pseudo-elements](https://www.w3.org/TR/selectors-4/#pseudo-elements)
/// this engine can be asked to select for. A selector carrying one only
/// matches when the selection requests that same pseudo; the resulting
/// style is computed as a separate record parented to the element's own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PseudoElement {
    /// `::before`
    Before,
    /// `::after`
    After,
    /// `::first-line`
    FirstLine,
    /// `::first-letter`
    FirstLetter,
}

impl PseudoElement {
    /// Look a pseudo-element up by name (without colons). The four CSS2
    /// pseudo-elements also parse with single-colon legacy syntax.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "before" => Some(Self::Before),
            "after" => Some(Self::After),
            "first-line" => Some(Self::FirstLine),
            "first-letter" => Some(Self::FirstLetter),
            _ => None,
        }
    }
}

/// Attribute selectors per [§
/// 6.4](https://www.w3.org/TR/selectors-4/#attribute-selectors).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeSelector {
    /// `[attr]`
    Exists(Atom),
    /// `[attr=value]`
    Equals(Atom, String),
    /// `[attr~=value]` — whitespace-separated word match.
    Includes(Atom, String),
    /// `[attr|=value]` — exact, or prefix followed by `-`.
    DashMatch(Atom, String),
    /// `[attr^=value]`
    PrefixMatch(Atom, String),
    /// `[attr$=value]`
    SuffixMatch(Atom, String),
    /// `[attr*=value]`
    SubstringMatch(Atom, String),
}

/// [§ 4.2 Compound selectors](https://www.w3.org/TR/selectors-4/#compound) — simple selectors
/// with no combinator between them, all conditions on one element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    /// The simple selectors that must all match.
    pub simple_selectors: Vec<SimpleSelector>,
}

/// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `A B` — B is an arbitrary descendant of A.
    Descendant,
    /// `A > B` — B is a direct child of A.
    Child,
    /// `A + B` — B immediately follows A, same parent.
    NextSibling,
    /// `A ~ B` — B follows A, not necessarily immediately, same parent.
    SubsequentSibling,
}

/// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex) — a chain of compound
/// selectors linked by combinators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    /// The rightmost compound selector — what actually gets matched against
    /// a candidate element.
    pub subject: CompoundSelector,
    /// `(combinator, compound)` pairs walking left from the subject.
    pub combinators: Vec<(Combinator, CompoundSelector)>,
}

/// [§ 17 Specificity](https://www.w3.org/TR/selectors-4/#specificity-rules) — (id count, class/attr/pseudo-class
/// count, type/pseudo-element count). Ordered lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl Specificity {
    /// Build a specificity from its three components directly.
    #[must_use]
    pub const fn new(a: u32, b: u32, c: u32) -> Self {
        Self(a, b, c)
    }
}

/// A parsed selector, ready for repeated matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSelector {
    /// The compound/combinator chain.
    pub complex: ComplexSelector,
    /// Precomputed per [§ 17](https://www.w3.org/TR/selectors-4/#specificity-rules) —
    /// computed once at parse time since it never changes afterward.
    pub specificity: Specificity,
    /// The pseudo-element this selector targets, if any. Recorded here
    /// rather than in the compound: the element-matching walk ignores
    /// it, and the cascade compares it against the pseudo the selection
    /// was asked for.
    pub pseudo_element: Option<PseudoElement>,
}

impl ParsedSelector {
    /// Whether this selector has no combinators (a single compound
    /// selector).
    #[must_use]
    pub const fn is_simple(&self) -> bool {
        self.complex.combinators.is_empty()
    }

    /// [§ 4.1 Selector matching](https://www.w3.org/TR/selectors-4/#match-a-selector-against-an-element) —
    /// does this selector match `node`?
    #[must_use]
    pub fn matches<H: NodeHandler>(&self, handler: &H, node: H::Node) -> bool {
        if !compound_matches(&self.complex.subject, handler, node) {
            return false;
        }
        if self.complex.combinators.is_empty() {
            return true;
        }
        matches_combinators(&self.complex.combinators, handler, node)
    }
}

fn matches_combinators<H: NodeHandler>(
    chain: &[(Combinator, CompoundSelector)],
    handler: &H,
    subject: H::Node,
) -> bool {
    let mut current = subject;
    for (combinator, compound) in chain {
        match combinator {
            Combinator::Descendant => {
                let mut ancestor = handler.parent(current);
                let found = loop {
                    match ancestor {
                        Some(a) if compound_matches(compound, handler, a) => break Some(a),
                        Some(a) => ancestor = handler.parent(a),
                        None => break None,
                    }
                };
                match found {
                    Some(a) => current = a,
                    None => return false,
                }
            }
            Combinator::Child => {
                let Some(parent) = handler.parent(current) else {
                    return false;
                };
                if !compound_matches(compound, handler, parent) {
                    return false;
                }
                current = parent;
            }
            Combinator::NextSibling => {
                let Some(prev) = handler.previous_element_sibling(current) else {
                    return false;
                };
                if !compound_matches(compound, handler, prev) {
                    return false;
                }
                current = prev;
            }
            Combinator::SubsequentSibling => {
                let found = handler
                    .preceding_siblings(current)
                    .into_iter()
                    .filter(|&n| handler.is_element(n))
                    .find(|&n| compound_matches(compound, handler, n));
                match found {
                    Some(n) => current = n,
                    None => return false,
                }
            }
        }
    }
    true
}

fn compound_matches<H: NodeHandler>(
    compound: &CompoundSelector,
    handler: &H,
    node: H::Node,
) -> bool {
    if !handler.is_element(node) {
        return false;
    }
    compound
        .simple_selectors
        .iter()
        .all(|simple| simple_matches(simple, handler, node))
}

fn simple_matches<H: NodeHandler>(simple: &SimpleSelector, handler: &H, node: H::Node) -> bool {
    match simple {
        SimpleSelector::Type(name) => handler
            .tag_name(node)
            .is_some_and(|tag| tag.eq_ignore_ascii_case(name.as_str())),
        SimpleSelector::Class(class) => handler
            .classes(node)
            .iter()
            .any(|c| *c == class.as_str()),
        SimpleSelector::Id(id) => handler.id(node).is_some_and(|el_id| el_id == id.as_str()),
        SimpleSelector::Universal => true,
        SimpleSelector::NeverMatch => false,
        SimpleSelector::PseudoClass(pc) => pseudo_class_matches(pc, handler, node),
        SimpleSelector::Attribute(attr) => attribute_matches(attr, handler, node),
    }
}

/// [§ 4 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes) matching.
fn pseudo_class_matches<H: NodeHandler>(pc: &PseudoClass, handler: &H, node: H::Node) -> bool {
    match pc {
        PseudoClass::Root => handler.is_root(node),
        PseudoClass::FirstChild => handler
            .preceding_siblings(node)
            .iter()
            .all(|&s| !handler.is_element(s)),
        PseudoClass::LastChild => handler
            .following_siblings(node)
            .iter()
            .all(|&s| !handler.is_element(s)),
        PseudoClass::FirstOfType => {
            let Some(tag) = handler.tag_name(node) else {
                return false;
            };
            handler
                .preceding_siblings(node)
                .iter()
                .filter(|&&s| handler.is_element(s))
                .all(|&s| handler.tag_name(s) != Some(tag))
        }
        PseudoClass::LastOfType => {
            let Some(tag) = handler.tag_name(node) else {
                return false;
            };
            handler
                .following_siblings(node)
                .iter()
                .filter(|&&s| handler.is_element(s))
                .all(|&s| handler.tag_name(s) != Some(tag))
        }
        PseudoClass::OnlyChild => {
            handler
                .preceding_siblings(node)
                .iter()
                .all(|&s| !handler.is_element(s))
                && handler
                    .following_siblings(node)
                    .iter()
                    .all(|&s| !handler.is_element(s))
        }
        PseudoClass::Empty => handler.has_no_content(node),
        PseudoClass::Link => {
            let is_anchor = handler
                .tag_name(node)
                .is_some_and(|tag| tag.eq_ignore_ascii_case("a") || tag.eq_ignore_ascii_case("area"));
            is_anchor && handler.attribute(node, "href").is_some() && !handler.is_visited(node)
        }
        PseudoClass::Visited => handler.is_visited(node),
        PseudoClass::Hover => handler.is_hovered(node),
        PseudoClass::Active => handler.is_active(node),
        PseudoClass::Focus => handler.is_focused(node),
        PseudoClass::Disabled => handler.is_disabled(node),
        PseudoClass::Enabled => !handler.is_disabled(node),
    }
}

fn attribute_matches<H: NodeHandler>(attr: &AttributeSelector, handler: &H, node: H::Node) -> bool {
    match attr {
        AttributeSelector::Exists(name) => handler.attribute(node, name.as_str()).is_some(),
        AttributeSelector::Equals(name, val) => {
            handler.attribute(node, name.as_str()).is_some_and(|v| v == val)
        }
        AttributeSelector::Includes(name, val) => handler
            .attribute(node, name.as_str())
            .is_some_and(|v| v.split_ascii_whitespace().any(|w| w == val)),
        AttributeSelector::DashMatch(name, val) => handler
            .attribute(node, name.as_str())
            .is_some_and(|v| v == val || v.starts_with(&format!("{val}-"))),
        AttributeSelector::PrefixMatch(name, val) => handler
            .attribute(node, name.as_str())
            .is_some_and(|v| v.starts_with(val.as_str())),
        AttributeSelector::SuffixMatch(name, val) => handler
            .attribute(node, name.as_str())
            .is_some_and(|v| v.ends_with(val.as_str())),
        AttributeSelector::SubstringMatch(name, val) => handler
            .attribute(node, name.as_str())
            .is_some_and(|v| v.contains(val.as_str())),
    }
}

impl ComplexSelector {
    /// [§ 17 Specificity](https://www.w3.org/TR/selectors-4/#specificity-rules), summed over
    /// every compound selector in the chain.
    #[must_use]
    pub fn calculate_specificity(&self) -> Specificity {
        let mut spec = compound_specificity(&self.subject);
        for (_, compound) in &self.combinators {
            let s = compound_specificity(compound);
            spec.0 += s.0;
            spec.1 += s.1;
            spec.2 += s.2;
        }
        spec
    }
}

fn compound_specificity(compound: &CompoundSelector) -> Specificity {
    let mut spec = Specificity::default();
    for simple in &compound.simple_selectors {
        match simple {
            SimpleSelector::Id(_) => spec.0 += 1,
            SimpleSelector::Class(_) | SimpleSelector::PseudoClass(_) | SimpleSelector::Attribute(_) => {
                spec.1 += 1;
            }
            SimpleSelector::Type(_) => spec.2 += 1,
            SimpleSelector::Universal | SimpleSelector::NeverMatch => {}
        }
    }
    spec
}

const fn is_ident_start_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

const fn is_ident_char(c: char) -> bool {
    is_ident_start_char(c) || c.is_ascii_digit() || c == '-'
}

fn parse_attr_value(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<String> {
    while chars.peek().is_some_and(|&ch| ch.is_ascii_whitespace()) {
        let _ = chars.next();
    }
    match chars.peek() {
        Some(&q @ ('"' | '\'')) => {
            let _ = chars.next();
            let mut val = String::new();
            for ch in chars.by_ref() {
                if ch == q {
                    return Some(val);
                }
                val.push(ch);
            }
            None
        }
        Some(_) => {
            let mut val = String::new();
            while chars.peek().is_some_and(|&ch| is_ident_char(ch) || ch == '.') {
                val.push(chars.next().unwrap());
            }
            if val.is_empty() {
                None
            } else {
                Some(val)
            }
        }
        None => None,
    }
}

/// Parse a raw selector string, per [§ 4 Selector
/// syntax](https://www.w3.org/TR/selectors-4/#syntax): type/class/id/
/// universal/attribute/pseudo-class simple selectors, compounded, chained
/// by descendant/child/sibling combinators.
///
/// Functional pseudo-classes (`:nth-child()`, `:not()`, `:is()`) and
/// unknown pseudos parse successfully but compile to
/// [`SimpleSelector::NeverMatch`] rather than being rejected — the rest
/// of the compound still contributes its specificity and the rule isn't
/// dropped outright. Interaction pseudo-classes (`:hover`, `:focus`, ...)
/// match through the [`NodeHandler`] state callbacks.
#[must_use]
pub fn parse_selector(raw: &str) -> Option<ParsedSelector> {
    fn flush_ident(ident: &mut String, compound: &mut Vec<SimpleSelector>) {
        if !ident.is_empty() {
            compound.push(SimpleSelector::Type(Atom::new(ident)));
            ident.clear();
        }
    }

    fn flush_compound(
        ident: &mut String,
        compound: &mut Vec<SimpleSelector>,
        compounds: &mut Vec<CompoundSelector>,
    ) -> bool {
        flush_ident(ident, compound);
        if compound.is_empty() {
            return false;
        }
        compounds.push(CompoundSelector {
            simple_selectors: std::mem::take(compound),
        });
        true
    }

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut compounds: Vec<CompoundSelector> = Vec::new();
    let mut combinators_between: Vec<Combinator> = Vec::new();
    let mut chars = trimmed.chars().peekable();
    let mut current_compound = Vec::new();
    let mut current_ident = String::new();
    let mut pseudo_element: Option<PseudoElement> = None;

    while let Some(c) = chars.next() {
        // A pseudo-element is only valid on the rightmost compound;
        // anything after it except trailing whitespace is malformed.
        if pseudo_element.is_some() && !c.is_ascii_whitespace() {
            return None;
        }
        match c {
            '.' => {
                flush_ident(&mut current_ident, &mut current_compound);
                while chars.peek().is_some_and(|&ch| is_ident_char(ch)) {
                    current_ident.push(chars.next().unwrap());
                }
                if current_ident.is_empty() {
                    return None;
                }
                current_compound.push(SimpleSelector::Class(Atom::new(&current_ident)));
                current_ident.clear();
            }
            '#' => {
                flush_ident(&mut current_ident, &mut current_compound);
                while chars.peek().is_some_and(|&ch| is_ident_char(ch)) {
                    current_ident.push(chars.next().unwrap());
                }
                if current_ident.is_empty() {
                    return None;
                }
                current_compound.push(SimpleSelector::Id(Atom::new(&current_ident)));
                current_ident.clear();
            }
            '*' => {
                flush_ident(&mut current_ident, &mut current_compound);
                current_compound.push(SimpleSelector::Universal);
            }
            ' ' | '\t' | '\n' | '\r' => {
                if current_ident.is_empty() && current_compound.is_empty() && compounds.is_empty() {
                    continue;
                }
                while chars.peek().is_some_and(|&ch| ch.is_ascii_whitespace()) {
                    let _ = chars.next();
                }
                match chars.peek() {
                    None => {
                        let _ = flush_compound(&mut current_ident, &mut current_compound, &mut compounds);
                    }
                    Some('>' | '+' | '~') => {
                        flush_ident(&mut current_ident, &mut current_compound);
                    }
                    Some(_) => {
                        if !flush_compound(&mut current_ident, &mut current_compound, &mut compounds) {
                            continue;
                        }
                        combinators_between.push(Combinator::Descendant);
                    }
                }
            }
            '>' => {
                if !flush_compound(&mut current_ident, &mut current_compound, &mut compounds) {
                    return None;
                }
                while chars.peek().is_some_and(|&ch| ch.is_ascii_whitespace()) {
                    let _ = chars.next();
                }
                combinators_between.push(Combinator::Child);
            }
            '+' => {
                if !flush_compound(&mut current_ident, &mut current_compound, &mut compounds) {
                    return None;
                }
                while chars.peek().is_some_and(|&ch| ch.is_ascii_whitespace()) {
                    let _ = chars.next();
                }
                combinators_between.push(Combinator::NextSibling);
            }
            '~' => {
                if !flush_compound(&mut current_ident, &mut current_compound, &mut compounds) {
                    return None;
                }
                while chars.peek().is_some_and(|&ch| ch.is_ascii_whitespace()) {
                    let _ = chars.next();
                }
                combinators_between.push(Combinator::SubsequentSibling);
            }
            _ if current_ident.is_empty() && (is_ident_start_char(c) || c == '-') => {
                current_ident.push(c);
            }
            _ if !current_ident.is_empty() && is_ident_char(c) => {
                current_ident.push(c);
            }
            ':' => {
                flush_ident(&mut current_ident, &mut current_compound);
                let is_pseudo_element = chars.peek() == Some(&':');
                if is_pseudo_element {
                    let _ = chars.next();
                }
                let mut pseudo_name = String::new();
                while chars.peek().is_some_and(|&ch| is_ident_char(ch)) {
                    pseudo_name.push(chars.next().unwrap());
                }
                if pseudo_name.is_empty() {
                    return None;
                }
                if chars.peek() == Some(&'(') {
                    let _ = chars.next();
                    let mut depth = 1u32;
                    for ch in chars.by_ref() {
                        match ch {
                            '(' => depth += 1,
                            ')' => {
                                depth -= 1;
                                if depth == 0 {
                                    break;
                                }
                            }
                            _ => {}
                        }
                    }
                    if depth != 0 {
                        return None;
                    }
                }
                if is_pseudo_element {
                    match PseudoElement::from_name(&pseudo_name) {
                        Some(pe) => pseudo_element = Some(pe),
                        None => current_compound.push(SimpleSelector::NeverMatch),
                    }
                } else {
                    let pc = match pseudo_name.to_ascii_lowercase().as_str() {
                        "root" => Some(PseudoClass::Root),
                        "first-child" => Some(PseudoClass::FirstChild),
                        "last-child" => Some(PseudoClass::LastChild),
                        "first-of-type" => Some(PseudoClass::FirstOfType),
                        "last-of-type" => Some(PseudoClass::LastOfType),
                        "only-child" => Some(PseudoClass::OnlyChild),
                        "empty" => Some(PseudoClass::Empty),
                        "link" => Some(PseudoClass::Link),
                        "visited" => Some(PseudoClass::Visited),
                        "hover" => Some(PseudoClass::Hover),
                        "active" => Some(PseudoClass::Active),
                        "focus" => Some(PseudoClass::Focus),
                        "disabled" => Some(PseudoClass::Disabled),
                        "enabled" => Some(PseudoClass::Enabled),
                        _ => None,
                    };
                    match pc {
                        Some(pc) => current_compound.push(SimpleSelector::PseudoClass(pc)),
                        // The CSS2 pseudo-elements still parse with
                        // single-colon legacy syntax.
                        None => match PseudoElement::from_name(&pseudo_name) {
                            Some(pe) => pseudo_element = Some(pe),
                            None => current_compound.push(SimpleSelector::NeverMatch),
                        },
                    }
                }
            }
            '[' => {
                flush_ident(&mut current_ident, &mut current_compound);
                while chars.peek().is_some_and(|&ch| ch.is_ascii_whitespace()) {
                    let _ = chars.next();
                }
                let mut attr_name = String::new();
                while chars.peek().is_some_and(|&ch| is_ident_char(ch)) {
                    attr_name.push(chars.next().unwrap());
                }
                if attr_name.is_empty() {
                    return None;
                }
                while chars.peek().is_some_and(|&ch| ch.is_ascii_whitespace()) {
                    let _ = chars.next();
                }
                let name = Atom::new(&attr_name);
                match chars.peek() {
                    Some(']') => {
                        let _ = chars.next();
                        current_compound.push(SimpleSelector::Attribute(AttributeSelector::Exists(name)));
                    }
                    Some('=') => {
                        let _ = chars.next();
                        let val = parse_attr_value(&mut chars)?;
                        while chars.peek().is_some_and(|&ch| ch.is_ascii_whitespace()) {
                            let _ = chars.next();
                        }
                        if chars.next() != Some(']') {
                            return None;
                        }
                        current_compound
                            .push(SimpleSelector::Attribute(AttributeSelector::Equals(name, val)));
                    }
                    Some(&op @ ('~' | '|' | '^' | '$' | '*')) => {
                        let _ = chars.next();
                        if chars.next() != Some('=') {
                            return None;
                        }
                        let val = parse_attr_value(&mut chars)?;
                        while chars.peek().is_some_and(|&ch| ch.is_ascii_whitespace()) {
                            let _ = chars.next();
                        }
                        if chars.next() != Some(']') {
                            return None;
                        }
                        let attr_sel = match op {
                            '~' => AttributeSelector::Includes(name, val),
                            '|' => AttributeSelector::DashMatch(name, val),
                            '^' => AttributeSelector::PrefixMatch(name, val),
                            '$' => AttributeSelector::SuffixMatch(name, val),
                            '*' => AttributeSelector::SubstringMatch(name, val),
                            _ => unreachable!(),
                        };
                        current_compound.push(SimpleSelector::Attribute(attr_sel));
                    }
                    _ => return None,
                }
            }
            _ => return None,
        }
    }

    // A bare `::before` is `*::before`.
    if current_compound.is_empty() && current_ident.is_empty() && pseudo_element.is_some() {
        current_compound.push(SimpleSelector::Universal);
    }
    let _ = flush_compound(&mut current_ident, &mut current_compound, &mut compounds);
    if compounds.is_empty() {
        return None;
    }
    if compounds.len() != combinators_between.len() + 1 {
        return None;
    }

    let subject = compounds.pop().expect("checked non-empty above");
    let mut combinator_chain = Vec::new();
    for (compound, combinator) in compounds.into_iter().zip(combinators_between).rev() {
        combinator_chain.push((combinator, compound));
    }

    let complex = ComplexSelector {
        subject,
        combinators: combinator_chain,
    };
    let mut specificity = complex.calculate_specificity();
    if pseudo_element.is_some() {
        // [§ 17](https://www.w3.org/TR/selectors-4/#specificity-rules):
        // pseudo-elements count with type selectors.
        specificity.2 += 1;
    }

    Some(ParsedSelector {
        complex,
        specificity,
        pseudo_element,
    })
}
