//! Cascade resolution: selecting the declarations that apply to an
//! element, sorting them to [CSS Cascading Level 4 § 6.1
//! order](https://www.w3.org/TR/css-cascade-4/#cascade-sort), and folding
//! them into a [`ComputedStyle`].
//!
//! Selection runs in the phases the module functions mirror: filter the
//! candidate rules through their `@media` conditions and a hash index
//! keyed on each selector's rightmost simple selector ([`RuleIndex`]),
//! match the survivors right-to-left against the node, sort every
//! matched declaration by origin/importance, specificity, and source
//! order, then resolve each property by walking its matches from the
//! winner downward — which is where the CSS-wide keywords (`inherit`,
//! `initial`, `unset`, `revert`) and `calc()` resolution are applied.

use crate::color::Color;
use crate::computed::{self, ComputedStyle};
use crate::handler::NodeHandler;
use crate::media::MediaDescription;
use crate::properties::{self, PropertyId, PropertyValue, ValueContext, PROPERTY_TABLE};
use crate::selector::{ParsedSelector, PseudoElement, Specificity};
use crate::sheet::{Origin, StyleRule, Stylesheet};
use crate::unit::{Dimension, Unit, UnitContext};
use crate::value::ComponentValue;
use koala_common::atom::Atom;
use koala_common::fixed::Fixed;
use std::collections::{HashMap, HashSet};

/// Everything a selection needs beyond the node and the sheets: the
/// runtime media, the unit-resolution context, and the client's
/// system-color resolver.
#[derive(Clone, Copy)]
pub struct SelectionContext<'a> {
    /// The media the sheets' `@media` conditions are evaluated against.
    pub media: &'a MediaDescription,
    /// Viewport and font metrics for resolving relative lengths and
    /// `calc()`.
    pub units: &'a UnitContext,
    /// Maps system colors and unknown color names to RGBA; `None` means
    /// such names fail to parse.
    pub color_resolver: Option<&'a dyn Fn(&str) -> Option<Color>>,
}

impl<'a> SelectionContext<'a> {
    /// A context with default unit metrics and no color resolver.
    #[must_use]
    pub fn new(media: &'a MediaDescription, units: &'a UnitContext) -> Self {
        Self {
            media,
            units,
            color_resolver: None,
        }
    }
}

/// Cascade tier, ascending priority. Inline style sits inside the author
/// origin but above every author selector; `!important` reverses the
/// origin order above all normal declarations.
fn tier(origin: Origin, inline: bool, important: bool) -> u8 {
    match (origin, inline, important) {
        (Origin::UserAgent, _, false) => 0,
        (Origin::User, _, false) => 1,
        (Origin::Author, false, false) => 2,
        (Origin::Author, true, false) => 3,
        (Origin::Author, false, true) => 4,
        (Origin::Author, true, true) => 5,
        (Origin::User, _, true) => 6,
        (Origin::UserAgent, _, true) => 7,
    }
}

/// One candidate (selector, rule) pair in the index, with the sheet-level
/// facts the cascade sort needs.
struct Candidate<'a> {
    selector: &'a ParsedSelector,
    declarations: &'a [crate::value::Declaration],
    rule_key: *const StyleRule,
    origin: Origin,
    quirks: bool,
    /// Document-global position: sheets in the order given, each sheet's
    /// effective rules in document order with imports inlined.
    order: u32,
}

/// Rule filter acceleration: candidates are bucketed by the most
/// selective simple selector of their rightmost compound (id, then
/// class, then element name), so matching a node only visits the
/// buckets its own id/classes/name select, plus the universal bucket.
struct RuleIndex<'a> {
    by_id: HashMap<Atom, Vec<Candidate<'a>>>,
    by_class: HashMap<Atom, Vec<Candidate<'a>>>,
    by_type: HashMap<Atom, Vec<Candidate<'a>>>,
    universal: Vec<Candidate<'a>>,
}

impl<'a> RuleIndex<'a> {
    fn build(sheets: &[&'a Stylesheet], media: &MediaDescription) -> Self {
        let mut index = Self {
            by_id: HashMap::new(),
            by_class: HashMap::new(),
            by_type: HashMap::new(),
            universal: Vec::new(),
        };
        let mut order = 0u32;
        for sheet in sheets {
            for rule in sheet.effective_style_rules(|mq| mq.matches(media)) {
                for selector in &rule.selectors {
                    index.insert(Candidate {
                        selector,
                        declarations: &rule.declarations,
                        rule_key: std::ptr::from_ref(rule),
                        origin: sheet.origin,
                        quirks: sheet.quirks,
                        order,
                    });
                }
                order += 1;
            }
        }
        index
    }

    fn insert(&mut self, candidate: Candidate<'a>) {
        use crate::selector::SimpleSelector;
        let subject = &candidate.selector.complex.subject.simple_selectors;
        let id = subject.iter().find_map(|s| match s {
            SimpleSelector::Id(name) => Some(name.clone()),
            _ => None,
        });
        if let Some(id) = id {
            self.by_id.entry(id).or_default().push(candidate);
            return;
        }
        let class = subject.iter().find_map(|s| match s {
            SimpleSelector::Class(name) => Some(name.clone()),
            _ => None,
        });
        if let Some(class) = class {
            self.by_class.entry(class).or_default().push(candidate);
            return;
        }
        let type_name = subject.iter().find_map(|s| match s {
            SimpleSelector::Type(name) => Some(Atom::new_case_folded(name.as_str())),
            _ => None,
        });
        if let Some(type_name) = type_name {
            self.by_type.entry(type_name).or_default().push(candidate);
            return;
        }
        self.universal.push(candidate);
    }

    /// Every candidate whose bucket the node's own id, classes, and
    /// element name select.
    fn candidates_for<H: NodeHandler>(&self, handler: &H, node: H::Node) -> Vec<&Candidate<'a>> {
        let mut out: Vec<&Candidate<'a>> = Vec::new();
        if let Some(id) = handler.id(node) {
            if let Some(bucket) = self.by_id.get(&Atom::new(id)) {
                out.extend(bucket);
            }
        }
        for class in handler.classes(node) {
            if let Some(bucket) = self.by_class.get(&Atom::new(class)) {
                out.extend(bucket);
            }
        }
        if let Some(tag) = handler.tag_name(node) {
            if let Some(bucket) = self.by_type.get(&Atom::new_case_folded(tag)) {
                out.extend(bucket);
            }
        }
        out.extend(&self.universal);
        out
    }
}

/// One declaration that matched an element, expanded to a single
/// longhand, carrying everything the cascade sort needs.
struct Matched {
    tier: u8,
    origin: Origin,
    specificity: Specificity,
    order: u32,
    id: PropertyId,
    components: Vec<ComponentValue>,
    quirks: bool,
}

/// A matched custom-property declaration, kept separate from the typed
/// longhands.
struct MatchedCustom {
    tier: u8,
    specificity: Specificity,
    order: u32,
    name: Atom,
    components: Vec<ComponentValue>,
}

fn collect_matches<H: NodeHandler>(
    index: &RuleIndex<'_>,
    handler: &H,
    node: H::Node,
    pseudo: Option<PseudoElement>,
    matched: &mut Vec<Matched>,
    custom: &mut Vec<MatchedCustom>,
) {
    // A rule's declarations apply once, with the highest specificity
    // among its matching selectors.
    let mut per_rule: HashMap<*const StyleRule, (Specificity, &Candidate<'_>)> = HashMap::new();
    for candidate in index.candidates_for(handler, node) {
        if candidate.selector.pseudo_element != pseudo {
            continue;
        }
        if !candidate.selector.matches(handler, node) {
            continue;
        }
        let entry = per_rule
            .entry(candidate.rule_key)
            .or_insert((candidate.selector.specificity, candidate));
        if candidate.selector.specificity > entry.0 {
            *entry = (candidate.selector.specificity, candidate);
        }
    }

    for (specificity, candidate) in per_rule.into_values() {
        for decl in candidate.declarations {
            let name = decl.property.as_str();
            let decl_tier = tier(candidate.origin, false, decl.important);
            if name.starts_with("--") {
                custom.push(MatchedCustom {
                    tier: decl_tier,
                    specificity,
                    order: candidate.order,
                    name: decl.property.clone(),
                    components: decl.value.clone(),
                });
                continue;
            }
            let expanded = match properties::expand_shorthand(name, &decl.value) {
                Some(expanded) => expanded,
                None => match PropertyId::from_name(name) {
                    Some(id) => vec![(id, decl.value.clone())],
                    None => continue,
                },
            };
            for (id, components) in expanded {
                matched.push(Matched {
                    tier: decl_tier,
                    origin: candidate.origin,
                    specificity,
                    order: candidate.order,
                    id,
                    components,
                    quirks: candidate.quirks,
                });
            }
        }
    }
}

fn collect_inline(inline_style: &str, matched: &mut Vec<Matched>, custom: &mut Vec<MatchedCustom>) {
    for decl in crate::sheet::parse_inline_declarations(inline_style) {
        let name = decl.property.as_str();
        let decl_tier = tier(Origin::Author, true, decl.important);
        if name.starts_with("--") {
            custom.push(MatchedCustom {
                tier: decl_tier,
                specificity: Specificity::default(),
                order: u32::MAX,
                name: decl.property.clone(),
                components: decl.value.clone(),
            });
            continue;
        }
        let expanded = match properties::expand_shorthand(name, &decl.value) {
            Some(expanded) => expanded,
            None => match PropertyId::from_name(name) {
                Some(id) => vec![(id, decl.value.clone())],
                None => continue,
            },
        };
        for (id, components) in expanded {
            matched.push(Matched {
                tier: decl_tier,
                origin: Origin::Author,
                specificity: Specificity::default(),
                order: u32::MAX,
                id,
                components,
                quirks: false,
            });
        }
    }
}

/// Winner-first cascade order: highest tier, then highest specificity,
/// then latest source position.
fn sort_winner_first(matched: &mut [Matched]) {
    matched.sort_by(|a, b| {
        b.tier
            .cmp(&a.tier)
            .then(b.specificity.cmp(&a.specificity))
            .then(b.order.cmp(&a.order))
    });
}

/// The CSS-wide keywords, detected after `var()` substitution.
enum WideKeyword {
    Inherit,
    Initial,
    Unset,
    Revert,
}

fn wide_keyword(components: &[ComponentValue]) -> Option<WideKeyword> {
    let non_ws: Vec<_> = components
        .iter()
        .filter(|cv| !matches!(cv, ComponentValue::Token(crate::token::Token::Whitespace)))
        .collect();
    let [ComponentValue::Token(crate::token::Token::Ident(kw))] = non_ws.as_slice() else {
        return None;
    };
    match kw.as_str() {
        s if s.eq_ignore_ascii_case("inherit") => Some(WideKeyword::Inherit),
        s if s.eq_ignore_ascii_case("initial") => Some(WideKeyword::Initial),
        s if s.eq_ignore_ascii_case("unset") => Some(WideKeyword::Unset),
        s if s.eq_ignore_ascii_case("revert") => Some(WideKeyword::Revert),
        _ => None,
    }
}

/// Resolve one element's (or pseudo's) style from its matched, sorted
/// declarations.
///
/// [§ 7 Inheritance](https://www.w3.org/TR/css-cascade-4/#inheriting):
/// the base style starts from the parent's inherited properties with
/// every non-inherited property at its initial value; each property is
/// then resolved by walking its matches from the cascade winner
/// downward, stopping at the first declaration that yields a concrete
/// value. `revert` removes its own origin from the walk and continues.
fn apply_matches(
    matched: &[Matched],
    custom_properties: &HashMap<Atom, Vec<ComponentValue>>,
    parent: Option<&ComputedStyle>,
    ctx: &SelectionContext<'_>,
) -> ComputedStyle {
    let mut style = parent.map_or_else(ComputedStyle::default, ComputedStyle::inherited);

    // font-size resolves first: every other property's em/ex/ch lengths
    // and calc() operands are relative to it.
    let parent_font_size = style.font_size();
    if let Some(value) = resolve_property(
        PropertyId::FontSize,
        matched,
        custom_properties,
        parent,
        ctx,
        parent_font_size.value,
    ) {
        let value = resolve_font_size(value, parent_font_size, ctx);
        style = style.with_property(PropertyId::FontSize, value);
    }
    let em_reference = style.font_size().value;

    for meta in PROPERTY_TABLE {
        if meta.id == PropertyId::FontSize {
            continue;
        }
        if let Some(value) =
            resolve_property(meta.id, matched, custom_properties, parent, ctx, em_reference)
        {
            style = style.with_property(meta.id, value);
        }
    }

    computed::resolve_current_color(&style)
}

/// Walk `id`'s matches winner-first and produce its cascaded value, or
/// `None` when nothing concrete applies (the base inherited/initial
/// value stands).
fn resolve_property(
    id: PropertyId,
    matched: &[Matched],
    custom_properties: &HashMap<Atom, Vec<ComponentValue>>,
    parent: Option<&ComputedStyle>,
    ctx: &SelectionContext<'_>,
    em_reference: Fixed,
) -> Option<PropertyValue> {
    let mut reverted_origins: HashSet<Origin> = HashSet::new();

    for decl in matched.iter().filter(|m| m.id == id) {
        if reverted_origins.contains(&decl.origin) {
            continue;
        }

        let components = if crate::value::contains_var(&decl.components) {
            match crate::value::substitute_var(&decl.components, custom_properties, 0) {
                Some(substituted) => substituted,
                None => continue,
            }
        } else {
            decl.components.clone()
        };

        match wide_keyword(&components) {
            Some(WideKeyword::Inherit) => {
                return Some(inherited_value(id, parent));
            }
            Some(WideKeyword::Initial) => {
                return Some(properties::initial_value(id));
            }
            Some(WideKeyword::Unset) => {
                return Some(if id.is_inherited() {
                    inherited_value(id, parent)
                } else {
                    properties::initial_value(id)
                });
            }
            Some(WideKeyword::Revert) => {
                let _ = reverted_origins.insert(decl.origin);
                continue;
            }
            None => {}
        }

        let value_ctx = ValueContext {
            quirks: decl.quirks,
            color_resolver: ctx.color_resolver,
        };
        if let Some(value) = properties::parse_value_in(id, &components, &value_ctx) {
            return Some(
                resolve_calc(value, em_reference, ctx)
                    .unwrap_or_else(|| properties::initial_value(id)),
            );
        }
    }
    None
}

fn inherited_value(id: PropertyId, parent: Option<&ComputedStyle>) -> PropertyValue {
    parent.map_or_else(|| properties::initial_value(id), |p| p.property_value(id))
}

/// Resolve a `calc()` value at apply time. Percentages stay symbolic
/// (their reference length is layout-dependent, so the interned program
/// is kept and re-evaluated at the use site); any other evaluation
/// failure is a type mismatch — `None` here, which the caller turns
/// into the property's initial value.
fn resolve_calc(
    value: PropertyValue,
    em_reference: Fixed,
    ctx: &SelectionContext<'_>,
) -> Option<PropertyValue> {
    let PropertyValue::Calc(calc) = &value else {
        return Some(value);
    };
    match calc.expr().eval_in(ctx.units, em_reference, None) {
        Ok(dimension) => Some(PropertyValue::Dimension(dimension)),
        Err(crate::calc::EvalError::UnresolvedRelativeUnits) => Some(value),
        Err(_) => None,
    }
}

/// Compute font-size's absolute value: relative units and percentages
/// resolve against the parent's font size, clamped to the context's
/// minimum.
fn resolve_font_size(
    value: PropertyValue,
    parent_font_size: Dimension,
    ctx: &SelectionContext<'_>,
) -> PropertyValue {
    let resolved = match &value {
        PropertyValue::Dimension(d) => ctx
            .units
            .length_to_px(*d, parent_font_size.value, Some(parent_font_size.value)),
        PropertyValue::Calc(calc) => calc
            .expr()
            .eval_in(ctx.units, parent_font_size.value, Some(parent_font_size.value))
            .ok()
            .map(|d| d.value),
        _ => None,
    };
    match resolved {
        Some(px) => {
            let px = if px < ctx.units.font_size_minimum {
                ctx.units.font_size_minimum
            } else {
                px
            };
            PropertyValue::Dimension(Dimension { value: px, unit: Unit::Px })
        }
        None => value,
    }
}

fn resolve_custom_properties(
    custom: &mut Vec<MatchedCustom>,
    parent_custom: &HashMap<Atom, Vec<ComponentValue>>,
) -> HashMap<Atom, Vec<ComponentValue>> {
    custom.sort_by(|a, b| {
        b.tier
            .cmp(&a.tier)
            .then(b.specificity.cmp(&a.specificity))
            .then(b.order.cmp(&a.order))
    });
    let mut resolved = parent_custom.clone();
    let mut seen: HashSet<Atom> = HashSet::new();
    for decl in custom.iter() {
        if seen.insert(decl.name.clone()) {
            let _ = resolved.insert(decl.name.clone(), decl.components.clone());
        }
    }
    resolved
}

fn resolve_style<H: NodeHandler>(
    index: &RuleIndex<'_>,
    handler: &H,
    node: H::Node,
    inline_style: Option<&str>,
    parent: Option<&ComputedStyle>,
    parent_custom: &HashMap<Atom, Vec<ComponentValue>>,
    ctx: &SelectionContext<'_>,
) -> (ComputedStyle, HashMap<Atom, Vec<ComponentValue>>) {
    let mut matched = Vec::new();
    let mut custom = Vec::new();
    collect_matches(index, handler, node, None, &mut matched, &mut custom);
    if let Some(inline) = inline_style {
        collect_inline(inline, &mut matched, &mut custom);
    }
    sort_winner_first(&mut matched);
    let custom_properties = resolve_custom_properties(&mut custom, parent_custom);
    let style = apply_matches(&matched, &custom_properties, parent, ctx);
    (style, custom_properties)
}

/// Compute the style of `node` alone, given its parent's already-resolved
/// style (or `None` for the document root). Useful for incremental
/// re-styling of a single subtree, or for tests that don't want to walk
/// a whole document.
#[must_use]
pub fn select_one<H: NodeHandler>(
    handler: &H,
    node: H::Node,
    sheets: &[&Stylesheet],
    media: &MediaDescription,
    parent: Option<&ComputedStyle>,
) -> ComputedStyle {
    let units = UnitContext::default();
    let ctx = SelectionContext::new(media, &units);
    select_one_in(handler, node, sheets, &ctx, None, parent)
}

/// [`select_one`] with an explicit [`SelectionContext`] and optional
/// inline (`style="..."`) declarations, which cascade above every author
/// selector.
#[must_use]
pub fn select_one_in<H: NodeHandler>(
    handler: &H,
    node: H::Node,
    sheets: &[&Stylesheet],
    ctx: &SelectionContext<'_>,
    inline_style: Option<&str>,
    parent: Option<&ComputedStyle>,
) -> ComputedStyle {
    let index = RuleIndex::build(sheets, ctx.media);
    resolve_style(&index, handler, node, inline_style, parent, &HashMap::new(), ctx).0
}

/// Compute a pseudo-element's style: only selectors targeting `pseudo`
/// participate, and the result inherits from the generating element's
/// own computed style. Returns `None` when no declaration matched — the
/// pseudo-element generates no box.
#[must_use]
pub fn select_pseudo<H: NodeHandler>(
    handler: &H,
    node: H::Node,
    pseudo: PseudoElement,
    sheets: &[&Stylesheet],
    ctx: &SelectionContext<'_>,
    element_style: &ComputedStyle,
) -> Option<ComputedStyle> {
    let index = RuleIndex::build(sheets, ctx.media);
    let mut matched = Vec::new();
    let mut custom = Vec::new();
    collect_matches(&index, handler, node, Some(pseudo), &mut matched, &mut custom);
    if matched.is_empty() {
        return None;
    }
    sort_winner_first(&mut matched);
    let custom_properties = resolve_custom_properties(&mut custom, &HashMap::new());
    Some(apply_matches(&matched, &custom_properties, Some(element_style), ctx))
}

/// Compute styles for every element in the tree rooted at `root`,
/// returning a map from node handle to its resolved [`ComputedStyle`].
///
/// [§ 6 Cascading](https://www.w3.org/TR/css-cascade-4/#cascading): each
/// element's declared values are resolved from every applicable sheet,
/// in cascade order, then [§ 7
/// Inheritance](https://www.w3.org/TR/css-cascade-4/#inheriting) carries
/// inherited properties down to its children before they're cascaded in
/// turn.
#[must_use]
pub fn select<H: NodeHandler>(
    handler: &H,
    root: H::Node,
    sheets: &[&Stylesheet],
    media: &MediaDescription,
) -> HashMap<H::Node, ComputedStyle> {
    let units = UnitContext::default();
    let ctx = SelectionContext::new(media, &units);
    select_in(handler, root, sheets, &ctx)
}

/// [`select`] with an explicit [`SelectionContext`].
#[must_use]
pub fn select_in<H: NodeHandler>(
    handler: &H,
    root: H::Node,
    sheets: &[&Stylesheet],
    ctx: &SelectionContext<'_>,
) -> HashMap<H::Node, ComputedStyle> {
    let index = RuleIndex::build(sheets, ctx.media);
    let mut styles = HashMap::new();
    walk(&index, handler, root, None, &HashMap::new(), ctx, &mut styles);
    styles
}

fn walk<H: NodeHandler>(
    index: &RuleIndex<'_>,
    handler: &H,
    node: H::Node,
    parent: Option<&ComputedStyle>,
    parent_custom: &HashMap<Atom, Vec<ComponentValue>>,
    ctx: &SelectionContext<'_>,
    styles: &mut HashMap<H::Node, ComputedStyle>,
) {
    if handler.is_element(node) {
        let inline = handler.attribute(node, "style").map(str::to_owned);
        let (style, custom) = resolve_style(
            index,
            handler,
            node,
            inline.as_deref(),
            parent,
            parent_custom,
            ctx,
        );
        for child in handler.children(node) {
            walk(index, handler, child, Some(&style), &custom, ctx, styles);
        }
        let _ = styles.insert(node, style);
    } else {
        for child in handler.children(node) {
            walk(index, handler, child, parent, parent_custom, ctx, styles);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::test_support::TestTree;

    fn sheet(css: &str) -> Stylesheet {
        Stylesheet::parse(css, Origin::Author)
    }

    fn screen() -> MediaDescription {
        MediaDescription::screen_default()
    }

    #[test]
    fn type_selector_sets_color() {
        let mut tree = TestTree::new();
        let body = tree.add_element(None, "body");
        let s = sheet("body { color: #333333; }");
        let styles = select(&tree, body, &[&s], &screen());
        assert_eq!(styles[&body].color(), Color::from_hex("#333333").unwrap());
    }

    #[test]
    fn color_is_inherited_to_children() {
        let mut tree = TestTree::new();
        let body = tree.add_element(None, "body");
        let p = tree.add_element(Some(body), "p");
        let s = sheet("body { color: red; }");
        let styles = select(&tree, body, &[&s], &screen());
        assert_eq!(styles[&p].color(), styles[&body].color());
    }

    #[test]
    fn background_color_is_not_inherited() {
        let mut tree = TestTree::new();
        let body = tree.add_element(None, "body");
        let p = tree.add_element(Some(body), "p");
        let s = sheet("body { background-color: #f5f5f5; }");
        let styles = select(&tree, body, &[&s], &screen());
        assert_ne!(styles[&p].background_color(), styles[&body].background_color());
    }

    #[test]
    fn class_selector_beats_type_selector_on_specificity() {
        let mut tree = TestTree::new();
        let p = tree.add_element(None, "p");
        tree.set_attr(p, "class", "highlight");
        let s = sheet("p { color: red; } .highlight { color: green; }");
        let styles = select(&tree, p, &[&s], &screen());
        assert_eq!(styles[&p].color(), Color::from_named("green").unwrap());
    }

    #[test]
    fn later_source_order_wins_at_equal_specificity() {
        let mut tree = TestTree::new();
        let p = tree.add_element(None, "p");
        let s = sheet("p { color: red; } p { color: blue; }");
        let styles = select(&tree, p, &[&s], &screen());
        assert_eq!(styles[&p].color(), Color::from_named("blue").unwrap());
    }

    #[test]
    fn important_author_declaration_beats_higher_specificity_non_important() {
        let mut tree = TestTree::new();
        let p = tree.add_element(None, "p");
        tree.set_attr(p, "id", "x");
        let s = sheet("p { color: red !important; } #x { color: blue; }");
        let styles = select(&tree, p, &[&s], &screen());
        assert_eq!(styles[&p].color(), Color::from_named("red").unwrap());
    }

    #[test]
    fn author_origin_beats_user_agent_origin() {
        let mut tree = TestTree::new();
        let p = tree.add_element(None, "p");
        let ua = Stylesheet::parse("p { color: black; }", Origin::UserAgent);
        let author = Stylesheet::parse("p { color: red; }", Origin::Author);
        let styles = select(&tree, p, &[&ua, &author], &screen());
        assert_eq!(styles[&p].color(), Color::from_named("red").unwrap());
    }

    #[test]
    fn user_agent_important_beats_author_important() {
        let mut tree = TestTree::new();
        let p = tree.add_element(None, "p");
        let ua = Stylesheet::parse("p { color: black !important; }", Origin::UserAgent);
        let author = Stylesheet::parse("p { color: red !important; }", Origin::Author);
        let styles = select(&tree, p, &[&ua, &author], &screen());
        assert_eq!(styles[&p].color(), Color::from_named("black").unwrap());
    }

    #[test]
    fn user_important_beats_author_important() {
        let mut tree = TestTree::new();
        let p = tree.add_element(None, "p");
        let user = Stylesheet::parse("p { color: red !important; }", Origin::User);
        let author = Stylesheet::parse("p { color: blue; }", Origin::Author);
        let styles = select(&tree, p, &[&user, &author], &screen());
        assert_eq!(styles[&p].color(), Color::from_named("red").unwrap());
    }

    #[test]
    fn inline_style_beats_any_selector_specificity() {
        let mut tree = TestTree::new();
        let p = tree.add_element(None, "p");
        tree.set_attr(p, "id", "x");
        tree.set_attr(p, "style", "color: green");
        let s = sheet("#x { color: blue; }");
        let styles = select(&tree, p, &[&s], &screen());
        assert_eq!(styles[&p].color(), Color::from_named("green").unwrap());
    }

    #[test]
    fn important_author_rule_beats_inline_normal() {
        let mut tree = TestTree::new();
        let p = tree.add_element(None, "p");
        tree.set_attr(p, "style", "color: green");
        let s = sheet("p { color: blue !important; }");
        let styles = select(&tree, p, &[&s], &screen());
        assert_eq!(styles[&p].color(), Color::from_named("blue").unwrap());
    }

    #[test]
    fn inherit_keyword_copies_the_parent_value() {
        let mut tree = TestTree::new();
        let body = tree.add_element(None, "body");
        let p = tree.add_element(Some(body), "p");
        let s = sheet("body { background-color: #123456; } p { background-color: inherit; }");
        let styles = select(&tree, body, &[&s], &screen());
        assert_eq!(styles[&p].background_color(), styles[&body].background_color());
    }

    #[test]
    fn initial_keyword_resets_an_inherited_property() {
        let mut tree = TestTree::new();
        let body = tree.add_element(None, "body");
        let p = tree.add_element(Some(body), "p");
        let s = sheet("body { color: red; } p { color: initial; }");
        let styles = select(&tree, body, &[&s], &screen());
        assert_eq!(styles[&p].color(), Color::BLACK);
    }

    #[test]
    fn unset_acts_as_inherit_for_inherited_and_initial_otherwise() {
        let mut tree = TestTree::new();
        let body = tree.add_element(None, "body");
        let p = tree.add_element(Some(body), "p");
        let s = sheet(
            "body { color: red; background-color: #123456; } \
             p { color: unset; background-color: unset; }",
        );
        let styles = select(&tree, body, &[&s], &screen());
        assert_eq!(styles[&p].color(), Color::from_named("red").unwrap());
        assert_eq!(styles[&p].background_color(), Color::Transparent);
    }

    #[test]
    fn revert_rolls_back_to_the_previous_origin() {
        let mut tree = TestTree::new();
        let p = tree.add_element(None, "p");
        let ua = Stylesheet::parse("p { color: purple; }", Origin::UserAgent);
        let author = Stylesheet::parse("p { color: blue; } p { color: revert; }", Origin::Author);
        let styles = select(&tree, p, &[&ua, &author], &screen());
        assert_eq!(styles[&p].color(), Color::from_named("purple").unwrap());
    }

    #[test]
    fn revert_with_no_lower_origin_leaves_the_inherited_value() {
        let mut tree = TestTree::new();
        let body = tree.add_element(None, "body");
        let p = tree.add_element(Some(body), "p");
        let s = sheet("body { color: red; } p { color: revert; }");
        let styles = select(&tree, body, &[&s], &screen());
        assert_eq!(styles[&p].color(), Color::from_named("red").unwrap());
    }

    #[test]
    fn margin_shorthand_fills_in_all_four_sides() {
        use crate::unit::Unit;

        let mut tree = TestTree::new();
        let div = tree.add_element(None, "div");
        let s = sheet("div { margin: 20px; }");
        let styles = select(&tree, div, &[&s], &screen());
        let style = &styles[&div];
        for side in [style.margin_top(), style.margin_right(), style.margin_bottom(), style.margin_left()] {
            match side {
                PropertyValue::Dimension(d) => assert_eq!((d.value.to_f64(), d.unit), (20.0, Unit::Px)),
                other => panic!("expected a 20px dimension, got {other:?}"),
            }
        }
    }

    #[test]
    fn border_side_shorthand_fills_missing_longhands_with_initials() {
        let mut tree = TestTree::new();
        let p = tree.add_element(None, "p");
        let s = sheet("p { color: teal; border-top: 2px solid; }");
        let styles = select(&tree, p, &[&s], &screen());
        let style = &styles[&p];
        assert_eq!(style.border_top_width().value.to_f64(), 2.0);
        assert_eq!(style.border_top_style(), "solid");
        // border-top-color was not given: its initial currentColor
        // resolves to the element's own color.
        assert_eq!(style.border_top_color(), Color::from_named("teal").unwrap());
    }

    #[test]
    fn calc_width_resolves_against_the_element_font_size() {
        let mut tree = TestTree::new();
        let div = tree.add_element(None, "div");
        let s = sheet("div { font-size: 16px; width: calc(10px + (4em / 2)); }");
        let styles = select(&tree, div, &[&s], &screen());
        match styles[&div].width() {
            PropertyValue::Dimension(d) => {
                assert_eq!(d.unit, Unit::Px);
                assert_eq!(d.value.to_f64(), 42.0);
            }
            other => panic!("expected a resolved px width, got {other:?}"),
        }
    }

    #[test]
    fn calc_with_percentage_stays_symbolic() {
        let mut tree = TestTree::new();
        let div = tree.add_element(None, "div");
        let s = sheet("div { width: calc(50% + 10px); }");
        let styles = select(&tree, div, &[&s], &screen());
        assert!(matches!(styles[&div].width(), PropertyValue::Calc(_)));
    }

    #[test]
    fn calc_type_mismatch_falls_back_to_the_initial_value() {
        let mut tree = TestTree::new();
        let div = tree.add_element(None, "div");
        let s = sheet("div { width: calc(10px + 2s); }");
        let styles = select(&tree, div, &[&s], &screen());
        // width's initial value is auto.
        assert_eq!(styles[&div].width(), &PropertyValue::Auto);
    }

    #[test]
    fn font_size_em_resolves_against_the_parent() {
        let mut tree = TestTree::new();
        let body = tree.add_element(None, "body");
        let p = tree.add_element(Some(body), "p");
        let s = sheet("body { font-size: 20px; } p { font-size: 2em; }");
        let styles = select(&tree, body, &[&s], &screen());
        assert_eq!(styles[&p].font_size().value.to_f64(), 40.0);
        assert_eq!(styles[&p].font_size().unit, Unit::Px);
    }

    #[test]
    fn custom_property_is_substituted_through_var() {
        let mut tree = TestTree::new();
        let div = tree.add_element(None, "div");
        let s = sheet(":root { --brand: blue; } div { color: var(--brand); }");
        let styles = select(&tree, div, &[&s], &screen());
        assert_eq!(styles[&div].color(), Color::from_named("blue").unwrap());
    }

    #[test]
    fn custom_property_inherits_to_descendant() {
        let mut tree = TestTree::new();
        let body = tree.add_element(None, "body");
        let p = tree.add_element(Some(body), "p");
        let s = sheet("body { --brand: green; } p { color: var(--brand); }");
        let styles = select(&tree, body, &[&s], &screen());
        assert_eq!(styles[&p].color(), Color::from_named("green").unwrap());
    }

    #[test]
    fn media_guarded_rule_only_applies_when_matching() {
        let mut tree = TestTree::new();
        let p = tree.add_element(None, "p");
        let s = sheet("@media print { p { color: red; } }");
        let styles = select(&tree, p, &[&s], &screen());
        assert_eq!(styles[&p].color(), Color::BLACK);
    }

    #[test]
    fn pseudo_element_rules_do_not_style_the_element_itself() {
        let mut tree = TestTree::new();
        let p = tree.add_element(None, "p");
        let s = sheet("p::before { color: red; }");
        let styles = select(&tree, p, &[&s], &screen());
        assert_eq!(styles[&p].color(), Color::BLACK);
    }

    #[test]
    fn pseudo_selection_computes_a_record_parented_to_the_element() {
        let mut tree = TestTree::new();
        let p = tree.add_element(None, "p");
        let s = sheet("p { color: teal; } p::before { background-color: currentcolor; }");
        let units = UnitContext::default();
        let media = screen();
        let ctx = SelectionContext::new(&media, &units);
        let element = select_one_in(&tree, p, &[&s], &ctx, None, None);
        let before = select_pseudo(&tree, p, PseudoElement::Before, &[&s], &ctx, &element)
            .expect("::before matched");
        // color inherits from the element; currentcolor resolves to it.
        assert_eq!(before.color(), Color::from_named("teal").unwrap());
        assert_eq!(before.background_color(), Color::from_named("teal").unwrap());
    }

    #[test]
    fn pseudo_selection_without_matching_rules_is_none() {
        let mut tree = TestTree::new();
        let p = tree.add_element(None, "p");
        let s = sheet("p { color: teal; }");
        let units = UnitContext::default();
        let media = screen();
        let ctx = SelectionContext::new(&media, &units);
        let element = select_one_in(&tree, p, &[&s], &ctx, None, None);
        assert!(select_pseudo(&tree, p, PseudoElement::After, &[&s], &ctx, &element).is_none());
    }

    #[test]
    fn repeated_selection_returns_pointer_equal_handles() {
        let mut tree = TestTree::new();
        let p = tree.add_element(None, "p");
        let s = sheet("p { color: teal; margin: 4px; }");
        let a = select_one(&tree, p, &[&s], &screen(), None);
        let b = select_one(&tree, p, &[&s], &screen(), None);
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn quirks_sheet_parses_unitless_lengths_standards_sheet_does_not() {
        use crate::sheet::SheetOptions;

        let mut tree = TestTree::new();
        let div = tree.add_element(None, "div");
        let quirky = Stylesheet::parse_with(
            "div { width: 100 }",
            Origin::Author,
            &SheetOptions { quirks: true, url: None },
        );
        let styles = select(&tree, div, &[&quirky], &screen());
        assert!(matches!(styles[&div].width(), PropertyValue::Dimension(d) if d.unit == Unit::Px));

        let strict = Stylesheet::parse("div { width: 100 }", Origin::Author);
        let styles = select(&tree, div, &[&strict], &screen());
        assert_eq!(styles[&div].width(), &PropertyValue::Auto);
    }

    #[test]
    fn color_resolver_feeds_system_colors_through_the_cascade() {
        let mut tree = TestTree::new();
        let div = tree.add_element(None, "div");
        let s = sheet("div { color: buttonface; }");
        let resolve = |name: &str| {
            (name == "buttonface").then(|| Color::from_rgba(221, 221, 221, 255))
        };
        let units = UnitContext::default();
        let media = screen();
        let mut ctx = SelectionContext::new(&media, &units);
        ctx.color_resolver = Some(&resolve);
        let style = select_one_in(&tree, div, &[&s], &ctx, None, None);
        assert_eq!(style.color(), Color::from_rgba(221, 221, 221, 255));
    }
}
