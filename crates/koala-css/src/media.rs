//! `@media` query parsing and evaluation.
//!
//! A query list matches the runtime media if *any* query in it matches
//! (comma is OR at the top level); each query optionally restricts by
//! media type (`screen`, `print`) and/or a boolean-combined feature
//! condition (`and`/`or`/`not`, [§ 5 Media
//! Queries](https://www.w3.org/TR/mediaqueries-5/#mq-syntax)).
//!
//! Feature tests are stored with their operator orientation normalized:
//! `name op value` is inverted at parse time so the internal form is
//! always `value OP name`, with two-sided ranges carrying a second
//! `OP2 value2` pair evaluated as `name OP2 value2`. A plain
//! `min-width: 600px` is the one-sided range `600px <= width`.
//!
//! Length constraints are converted to device-independent px before
//! comparison, so `(min-width: 50em)` compares correctly against a px
//! viewport.

use crate::token::Token;
use crate::tokenizer::Tokenizer;
use crate::unit::{Dimension, Unit, UnitCategory, UnitContext};
use koala_common::atom::Atom;
use koala_common::fixed::Fixed;

/// The media type a query restricts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    /// Matches every media type.
    All,
    /// Visual, interactive displays.
    Screen,
    /// Paged, physical, or print-preview output.
    Print,
    /// A type keyword this engine doesn't know (`tv`, `aural`, ...). It
    /// parses, but matches nothing.
    Unknown,
}

impl MediaType {
    fn from_keyword(keyword: &str) -> Self {
        match keyword.to_ascii_lowercase().as_str() {
            "all" => Self::All,
            "screen" => Self::Screen,
            "print" => Self::Print,
            _ => Self::Unknown,
        }
    }
}

/// A relational operator in a feature test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureOp {
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `:` or `=`
    Eq,
    /// `>=`
    Gte,
    /// `>`
    Gt,
}

impl FeatureOp {
    /// Flip the operator's orientation, for rewriting `name op value`
    /// into the internal `value op name` form.
    const fn inverted(self) -> Self {
        match self {
            Self::Lt => Self::Gt,
            Self::Lte => Self::Gte,
            Self::Eq => Self::Eq,
            Self::Gte => Self::Lte,
            Self::Gt => Self::Lt,
        }
    }

    fn compare(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Lt => lhs < rhs,
            Self::Lte => lhs <= rhs,
            Self::Eq => (lhs - rhs).abs() < 1e-6,
            Self::Gte => lhs >= rhs,
            Self::Gt => lhs > rhs,
        }
    }
}

/// A feature test's operand.
#[derive(Debug, Clone, PartialEq)]
pub enum MqValue {
    /// A dimensioned length (or resolution).
    Length(Dimension),
    /// A bare number, or an `a/b` ratio already divided through.
    Number(Fixed),
    /// An identifier (`landscape`, `portrait`, ...), lowercased.
    Ident(Atom),
}

/// One feature test: a bare-presence check, a one-sided comparison in
/// `value OP name` orientation, or a two-sided range adding
/// `name OP2 value2`.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFeature {
    /// The feature name (`width`, `orientation`, ...), with `min-`/`max-`
    /// prefixes already normalized away into `op`.
    pub name: Atom,
    /// The first comparison, as `value OP name`; `None` for a bare
    /// `(feature)` presence test.
    pub op: Option<FeatureOp>,
    /// The first comparison's left operand.
    pub value: Option<MqValue>,
    /// The second comparison of a two-sided range, as `name OP2 value2`.
    pub op2: Option<FeatureOp>,
    /// The second comparison's right operand.
    pub value2: Option<MqValue>,
}

impl MediaFeature {
    fn matches(&self, media: &MediaDescription) -> bool {
        let Some(client) = media.feature_value(self.name.as_str()) else {
            return false;
        };
        let Some(op) = self.op else {
            // Bare presence: true unless the feature's value is zero/none.
            return match client {
                MqValue::Number(n) => !n.is_zero(),
                MqValue::Length(d) => !d.value.is_zero(),
                MqValue::Ident(_) => true,
            };
        };
        let first = self
            .value
            .as_ref()
            .is_some_and(|value| compare_values(op, value, &client, media));
        if !first {
            return false;
        }
        match (self.op2, &self.value2) {
            (Some(op2), Some(value2)) => compare_values(op2.inverted(), value2, &client, media),
            _ => true,
        }
    }
}

/// Evaluate `value OP client`, converting both operands to a common
/// scale first (lengths to px, resolutions to dpi).
fn compare_values(
    op: FeatureOp,
    value: &MqValue,
    client: &MqValue,
    media: &MediaDescription,
) -> bool {
    match (value, client) {
        (MqValue::Length(value), MqValue::Length(client)) => {
            let Some(value) = media.to_comparable(*value) else {
                return false;
            };
            let Some(client) = media.to_comparable(*client) else {
                return false;
            };
            op.compare(value.to_f64(), client.to_f64())
        }
        (MqValue::Number(value), MqValue::Number(client)) => {
            op.compare(value.to_f64(), client.to_f64())
        }
        (MqValue::Ident(value), MqValue::Ident(client)) => {
            op == FeatureOp::Eq && value.eq_ignore_ascii_case(client.as_str())
        }
        _ => false,
    }
}

/// A boolean combination of features and nested conditions.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaCondition {
    /// A single feature test.
    Feature(MediaFeature),
    /// `not <condition>`.
    Not(Box<MediaCondition>),
    /// `<a> and <b> and ...`
    And(Vec<MediaCondition>),
    /// `<a> or <b> or ...`
    Or(Vec<MediaCondition>),
}

impl MediaCondition {
    fn matches(&self, media: &MediaDescription) -> bool {
        match self {
            Self::Feature(f) => f.matches(media),
            Self::Not(inner) => !inner.matches(media),
            Self::And(parts) => parts.iter().all(|p| p.matches(media)),
            Self::Or(parts) => parts.iter().any(|p| p.matches(media)),
        }
    }
}

/// One query in a comma-separated media query list: an optional media
/// type restriction, optionally negated, combined with an optional
/// feature condition.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaQuery {
    /// The media type to match, or `None` if unrestricted (`all`).
    pub media_type: Option<MediaType>,
    /// Set for `not screen and (...)`.
    pub negate_type: bool,
    /// The feature condition, if any.
    pub condition: Option<MediaCondition>,
}

impl MediaQuery {
    fn matches(&self, media: &MediaDescription) -> bool {
        let type_matches = match self.media_type {
            Some(MediaType::Unknown) => false,
            Some(t) => t == MediaType::All || t == media.media_type,
            None => true,
        };
        let result =
            type_matches && self.condition.as_ref().is_none_or(|c| c.matches(media));
        // `not` negates the whole query, not just the type restriction.
        result != self.negate_type
    }
}

/// A parsed `@media` prelude: one or more comma-separated queries, any of
/// which matching means the whole list matches.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MediaQueryList {
    /// The queries, OR-combined.
    pub queries: Vec<MediaQuery>,
}

impl MediaQueryList {
    /// Whether this list applies under `media`. An empty list (no
    /// `@media` condition at all) matches unconditionally.
    #[must_use]
    pub fn matches(&self, media: &MediaDescription) -> bool {
        self.queries.is_empty() || self.queries.iter().any(|q| q.matches(media))
    }
}

/// The runtime environment a media query is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaDescription {
    /// The current output medium.
    pub media_type: MediaType,
    /// Viewport width.
    pub width: Dimension,
    /// Viewport height.
    pub height: Dimension,
    /// Device resolution in dots per inch.
    pub device_dpi: Fixed,
    /// The default font size in px, the `em` reference for feature
    /// constraints written in font-relative units.
    pub font_size_default: Fixed,
}

impl MediaDescription {
    /// A reasonable desktop-screen default: 1024x768 px at 96dpi, 16px
    /// default font.
    #[must_use]
    pub fn screen_default() -> Self {
        Self {
            media_type: MediaType::Screen,
            width: Dimension::new(1024.0, Unit::Px),
            height: Dimension::new(768.0, Unit::Px),
            device_dpi: Fixed::from_int(96),
            font_size_default: Fixed::from_int(16),
        }
    }

    /// This description as a unit-resolution context, for converting
    /// feature constraints to device-independent px. The viewport fields
    /// only honor absolute units here (a viewport described in `em`
    /// would be circular).
    fn unit_context(&self) -> UnitContext {
        UnitContext {
            viewport_width: self.width.to_canonical().unwrap_or(Fixed::from_int(1024)),
            viewport_height: self.height.to_canonical().unwrap_or(Fixed::from_int(768)),
            font_size_default: self.font_size_default,
            root_font_size: self.font_size_default,
            device_dpi: self.device_dpi,
            ..UnitContext::default()
        }
    }

    /// Convert a dimensioned operand to the scale comparisons happen on:
    /// lengths to px, resolutions to dpi.
    fn to_comparable(&self, dim: Dimension) -> Option<Fixed> {
        match dim.unit.category() {
            UnitCategory::Length => self
                .unit_context()
                .length_to_px(dim, self.font_size_default, None),
            UnitCategory::Resolution => dim.to_canonical(),
            _ => None,
        }
    }

    fn feature_value(&self, name: &str) -> Option<MqValue> {
        match name {
            "width" | "device-width" => Some(MqValue::Length(self.width)),
            "height" | "device-height" => Some(MqValue::Length(self.height)),
            "orientation" => {
                let landscape = self.to_comparable(self.width)? >= self.to_comparable(self.height)?;
                Some(MqValue::Ident(Atom::new(if landscape { "landscape" } else { "portrait" })))
            }
            "resolution" => Some(MqValue::Length(Dimension {
                value: self.device_dpi,
                unit: Unit::Dpi,
            })),
            "aspect-ratio" => {
                let w = self.to_comparable(self.width)?;
                let h = self.to_comparable(self.height)?;
                if h.is_zero() {
                    return None;
                }
                Some(MqValue::Number(w / h))
            }
            // Bits per color channel; this engine always renders color.
            "color" => Some(MqValue::Number(Fixed::from_int(8))),
            "monochrome" => Some(MqValue::Number(Fixed::ZERO)),
            _ => None,
        }
    }
}

/// Parse an `@media` prelude (the text between `@media` and the rule's
/// `{`) into a [`MediaQueryList`]. An unparseable query in the list is
/// dropped; per [§ 3.2](https://www.w3.org/TR/mediaqueries-5/#error-handling)
/// it should evaluate to `not all`, which dropping approximates for every
/// surrounding construct this engine has.
#[must_use]
pub fn parse_media_query_list(input: &str) -> MediaQueryList {
    let queries = input
        .split(',')
        .filter_map(|part| parse_media_query(part.trim()))
        .collect();
    MediaQueryList { queries }
}

fn parse_media_query(input: &str) -> Option<MediaQuery> {
    if input.is_empty() {
        return None;
    }

    let mut rest = input;
    let mut negate_type = false;

    if let Some(stripped) = strip_word_prefix(rest, "not") {
        if stripped.trim_start().starts_with('(') {
            // `not (...)` is a condition-level negation; the condition
            // parser handles it.
        } else {
            negate_type = true;
            rest = stripped;
        }
    } else if let Some(stripped) = strip_word_prefix(rest, "only") {
        // `only` exists to opt out of legacy parsers; it changes nothing.
        rest = stripped;
    }

    // `type and <condition>`
    if let Some(and_pos) = find_top_level_word(rest, "and") {
        let (type_part, cond_part) = rest.split_at(and_pos);
        let type_part = type_part.trim();
        let cond_part = cond_part["and".len()..].trim_start();
        if !type_part.is_empty() && !type_part.contains('(') && !type_part.contains(' ') {
            let media_type = Some(MediaType::from_keyword(type_part));
            let condition = parse_condition(cond_part);
            let _ = condition.as_ref()?;
            return Some(MediaQuery { media_type, negate_type, condition });
        }
    }

    let trimmed = rest.trim();
    if !trimmed.starts_with('(') && !trimmed.contains('(') {
        // A bare type keyword, known or not.
        return Some(MediaQuery {
            media_type: Some(MediaType::from_keyword(trimmed)),
            negate_type,
            condition: None,
        });
    }

    let condition = parse_condition(trimmed)?;
    Some(MediaQuery {
        media_type: None,
        negate_type,
        condition: Some(condition),
    })
}

fn strip_word_prefix<'a>(s: &'a str, word: &str) -> Option<&'a str> {
    let s = s.trim_start();
    if s.len() > word.len()
        && s[..word.len()].eq_ignore_ascii_case(word)
        && s.as_bytes()[word.len()].is_ascii_whitespace()
    {
        Some(s[word.len()..].trim_start())
    } else {
        None
    }
}

/// Find a standalone word at paren-depth zero, or `None`.
fn find_top_level_word(input: &str, word: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut depth = 0i32;
    let mut i = 0;
    while i < input.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => depth -= 1,
            _ => {}
        }
        if depth == 0
            && input.len() - i >= word.len()
            && input[i..i + word.len()].eq_ignore_ascii_case(word)
            && (i == 0 || bytes[i - 1].is_ascii_whitespace())
            && input
                .as_bytes()
                .get(i + word.len())
                .is_none_or(|b| b.is_ascii_whitespace() || *b == b'(')
        {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Parse a `<media-condition>`. `and` and `or` may not mix at the same
/// nesting level without parentheses; a clause mixing them is invalid
/// and yields `None`.
fn parse_condition(input: &str) -> Option<MediaCondition> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(stripped) = strip_word_prefix(trimmed, "not") {
        return Some(MediaCondition::Not(Box::new(parse_condition(stripped)?)));
    }

    let or_parts = split_top_level(trimmed, "or");
    let and_parts = split_top_level(trimmed, "and");
    if or_parts.len() > 1 && and_parts.len() > 1 {
        return None;
    }
    if or_parts.len() > 1 {
        let conditions = or_parts
            .iter()
            .map(|p| parse_in_parens(p.trim()))
            .collect::<Option<Vec<_>>>()?;
        return Some(MediaCondition::Or(conditions));
    }
    if and_parts.len() > 1 {
        let conditions = and_parts
            .iter()
            .map(|p| parse_in_parens(p.trim()))
            .collect::<Option<Vec<_>>>()?;
        return Some(MediaCondition::And(conditions));
    }

    parse_in_parens(trimmed)
}

/// `<media-in-parens>`: a parenthesized nested condition, or a feature
/// test.
fn parse_in_parens(input: &str) -> Option<MediaCondition> {
    let inner = input.strip_prefix('(')?.strip_suffix(')')?.trim();
    // A nested boolean combination rather than a feature test?
    if inner.starts_with('(')
        || strip_word_prefix(inner, "not").is_some_and(|rest| rest.starts_with('('))
    {
        return parse_condition(inner);
    }
    parse_feature(inner).map(MediaCondition::Feature)
}

/// Split on a connective word only at paren-depth zero, so `(a) and ((b)
/// or (c))` doesn't fragment the nested `or`.
fn split_top_level<'a>(input: &'a str, connective: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut search_from = 0;
    while let Some(offset) = find_top_level_word(&input[search_from..], connective) {
        let pos = search_from + offset;
        parts.push(&input[start..pos]);
        start = pos + connective.len();
        search_from = start;
    }
    parts.push(&input[start..]);
    parts
}

/// Parse the inside of a feature test's parentheses into a normalized
/// [`MediaFeature`].
fn parse_feature(input: &str) -> Option<MediaFeature> {
    let mut tokens: Vec<Token> = Tokenizer::new(input)
        .filter(|t| !t.is_whitespace())
        .collect();
    if tokens.last() == Some(&Token::Eof) {
        let _ = tokens.pop();
    }
    if tokens.is_empty() {
        return None;
    }

    // `(name)` — boolean presence.
    if let [Token::Ident(name)] = tokens.as_slice() {
        return Some(MediaFeature {
            name: Atom::new_case_folded(name.as_str()),
            op: None,
            value: None,
            op2: None,
            value2: None,
        });
    }

    // `(name: value)` — plain, with min-/max- prefixes folded into ops.
    if tokens.get(1) == Some(&Token::Colon) {
        let Token::Ident(raw_name) = &tokens[0] else {
            return None;
        };
        let value = read_value(&tokens[2..])?;
        let name_text = raw_name.as_str().to_ascii_lowercase();
        let (name, op) = if let Some(feature) = name_text.strip_prefix("min-") {
            (feature, FeatureOp::Lte) // min-width: v  ==  v <= width
        } else if let Some(feature) = name_text.strip_prefix("max-") {
            (feature, FeatureOp::Gte) // max-width: v  ==  v >= width
        } else {
            (name_text.as_str(), FeatureOp::Eq)
        };
        return Some(MediaFeature {
            name: Atom::new(name),
            op: Some(op),
            value: Some(value),
            op2: None,
            value2: None,
        });
    }

    // Range forms.
    let mut cursor = FeatureCursor { tokens: &tokens, position: 0 };
    if let Token::Ident(raw_name) = &tokens[0] {
        // `name op value` — invert so the value sits on the left.
        let name = Atom::new_case_folded(raw_name.as_str());
        cursor.position = 1;
        let op = cursor.read_op()?;
        let value = cursor.read_value()?;
        if !cursor.at_end() {
            return None;
        }
        return Some(MediaFeature {
            name,
            op: Some(op.inverted()),
            value: Some(value),
            op2: None,
            value2: None,
        });
    }

    // `value op name [op2 value2]` — already in normalized orientation.
    let value = cursor.read_value()?;
    let op = cursor.read_op()?;
    let name = cursor.read_name()?;
    if cursor.at_end() {
        return Some(MediaFeature {
            name,
            op: Some(op),
            value: Some(value),
            op2: None,
            value2: None,
        });
    }
    let op2 = cursor.read_op()?;
    let value2 = cursor.read_value()?;
    if !cursor.at_end() {
        return None;
    }
    // Both operators of a range must point the same way.
    let same_direction = matches!(
        (op, op2),
        (FeatureOp::Lt | FeatureOp::Lte, FeatureOp::Lt | FeatureOp::Lte)
            | (FeatureOp::Gt | FeatureOp::Gte, FeatureOp::Gt | FeatureOp::Gte)
    );
    if !same_direction {
        return None;
    }
    Some(MediaFeature {
        name,
        op: Some(op),
        value: Some(value),
        op2: Some(op2),
        value2: Some(value2),
    })
}

struct FeatureCursor<'a> {
    tokens: &'a [Token],
    position: usize,
}

impl FeatureCursor<'_> {
    fn at_end(&self) -> bool {
        self.position == self.tokens.len()
    }

    fn read_op(&mut self) -> Option<FeatureOp> {
        let first = self.tokens.get(self.position)?;
        let op = match first {
            Token::Delim('<') => {
                if self.tokens.get(self.position + 1) == Some(&Token::Delim('=')) {
                    self.position += 1;
                    FeatureOp::Lte
                } else {
                    FeatureOp::Lt
                }
            }
            Token::Delim('>') => {
                if self.tokens.get(self.position + 1) == Some(&Token::Delim('=')) {
                    self.position += 1;
                    FeatureOp::Gte
                } else {
                    FeatureOp::Gt
                }
            }
            Token::Delim('=') => FeatureOp::Eq,
            _ => return None,
        };
        self.position += 1;
        Some(op)
    }

    fn read_value(&mut self) -> Option<MqValue> {
        let remaining = &self.tokens[self.position..];
        // `a/b` ratio: three tokens.
        if let [Token::Number { value: a, .. }, Token::Delim('/'), Token::Number { value: b, .. }, ..] =
            remaining
        {
            if b.is_zero() {
                return None;
            }
            self.position += 3;
            return Some(MqValue::Number(*a / *b));
        }
        let value = read_value(&remaining[..1.min(remaining.len())])?;
        self.position += 1;
        Some(value)
    }

    fn read_name(&mut self) -> Option<Atom> {
        match self.tokens.get(self.position)? {
            Token::Ident(name) => {
                self.position += 1;
                Some(Atom::new_case_folded(name.as_str()))
            }
            _ => None,
        }
    }
}

/// Read a feature value out of a token slice: a single number, a
/// dimension, an identifier, or a `a/b` ratio.
fn read_value(tokens: &[Token]) -> Option<MqValue> {
    match tokens {
        [Token::Number { value: a, .. }, Token::Delim('/'), Token::Number { value: b, .. }] => {
            if b.is_zero() {
                None
            } else {
                Some(MqValue::Number(*a / *b))
            }
        }
        [Token::Number { value, .. }] => Some(MqValue::Number(*value)),
        [Token::Dimension { value, unit, .. }] => {
            Unit::from_keyword(unit.as_str()).map(|u| MqValue::Length(Dimension { value: *value, unit: u }))
        }
        [Token::Ident(ident)] => Some(MqValue::Ident(Atom::new_case_folded(ident.as_str()))),
        _ => None,
    }
}
