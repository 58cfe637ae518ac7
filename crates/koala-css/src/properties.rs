//! The property dispatch table: for every property this engine
//! understands, whether it inherits, which computed-style group it
//! belongs to, how to parse its specified value, and what its initial
//! value is.
//!
//! A single table indexed by property id carries everything the engine
//! needs to know about a property: one [`PropertyMeta`] per
//! [`PropertyId`] for the static facts (inheritable flag, storage
//! group), plus free `parse_value`/`initial_value` functions — `match`
//! over the id enum is the dispatch.

use crate::calc::{self, CalcRef};
use crate::color::Color;
use crate::token::Token;
use crate::unit::{Dimension, Unit};
use crate::value::ComponentValue;
use koala_common::atom::Atom;
use koala_common::fixed::Fixed;

/// A recognized longhand property.
///
/// Shorthands (`margin`, `padding`, `border`, `outline`, `columns`, …)
/// never appear here — [`expand_shorthand`] rewrites them into the
/// longhands below before cascade ever sees them, so the dispatch table
/// only needs entries for physical longhands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PropertyId {
    /// `color`
    Color,
    /// `background-color`
    BackgroundColor,
    /// `background-image`
    BackgroundImage,
    /// `display`
    Display,
    /// `position`
    Position,
    /// `float`
    Float,
    /// `clear`
    Clear,
    /// `visibility`
    Visibility,
    /// `overflow`
    Overflow,
    /// `text-align`
    TextAlign,
    /// `text-decoration`
    TextDecoration,
    /// `text-transform`
    TextTransform,
    /// `text-indent`
    TextIndent,
    /// `white-space`
    WhiteSpace,
    /// `vertical-align`
    VerticalAlign,
    /// `font-family`
    FontFamily,
    /// `font-size`
    FontSize,
    /// `font-style`
    FontStyle,
    /// `font-weight`
    FontWeight,
    /// `line-height`
    LineHeight,
    /// `width`
    Width,
    /// `height`
    Height,
    /// `min-width`
    MinWidth,
    /// `min-height`
    MinHeight,
    /// `max-width`
    MaxWidth,
    /// `max-height`
    MaxHeight,
    /// `top`
    Top,
    /// `right`
    Right,
    /// `bottom`
    Bottom,
    /// `left`
    Left,
    /// `z-index`
    ZIndex,
    /// `margin-top`
    MarginTop,
    /// `margin-right`
    MarginRight,
    /// `margin-bottom`
    MarginBottom,
    /// `margin-left`
    MarginLeft,
    /// `padding-top`
    PaddingTop,
    /// `padding-right`
    PaddingRight,
    /// `padding-bottom`
    PaddingBottom,
    /// `padding-left`
    PaddingLeft,
    /// `border-top-width`
    BorderTopWidth,
    /// `border-right-width`
    BorderRightWidth,
    /// `border-bottom-width`
    BorderBottomWidth,
    /// `border-left-width`
    BorderLeftWidth,
    /// `border-top-style`
    BorderTopStyle,
    /// `border-right-style`
    BorderRightStyle,
    /// `border-bottom-style`
    BorderBottomStyle,
    /// `border-left-style`
    BorderLeftStyle,
    /// `border-top-color`
    BorderTopColor,
    /// `border-right-color`
    BorderRightColor,
    /// `border-bottom-color`
    BorderBottomColor,
    /// `border-left-color`
    BorderLeftColor,
    /// `outline-color`
    OutlineColor,
    /// `outline-style`
    OutlineStyle,
    /// `outline-width`
    OutlineWidth,
    /// `cursor`
    Cursor,
    /// `list-style-type`
    ListStyleType,
    /// `list-style-position`
    ListStylePosition,
    /// `list-style-image`
    ListStyleImage,
    /// `letter-spacing`
    LetterSpacing,
    /// `word-spacing`
    WordSpacing,
    /// `writing-mode`
    WritingMode,
    /// `break-before`
    BreakBefore,
    /// `break-after`
    BreakAfter,
    /// `break-inside`
    BreakInside,
    /// `clip`
    Clip,
    /// `column-count`
    ColumnCount,
    /// `column-width`
    ColumnWidth,
    /// `quotes`
    Quotes,
    /// `content`
    Content,
    /// `counter-increment`
    CounterIncrement,
    /// `counter-reset`
    CounterReset,
    /// `flex-grow`
    FlexGrow,
    /// `flex-shrink`
    FlexShrink,
    /// `flex-basis`
    FlexBasis,
}

/// Which computed-style record a property's storage belongs to.
///
/// Page-margin and aural-only properties are out of scope here, so there
/// are no page/aural groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    /// Stored in the common block: set densely on most elements.
    Normal,
    /// Stored in the uncommon block: rare enough to share a sentinel
    /// when unset.
    Uncommon,
}

/// Static metadata about one property: its inheritance behavior and
/// which group its computed value is stored in.
#[derive(Debug, Clone, Copy)]
pub struct PropertyMeta {
    /// The property's id.
    pub id: PropertyId,
    /// Its CSS source name.
    pub name: &'static str,
    /// Whether an unset value on an element computes to its parent's
    /// computed value (`true`) or to the property's initial value
    /// (`false`), per [CSS Cascade § 6.1
    /// Inheritance](https://www.w3.org/TR/css-cascade-4/#inheriting).
    pub inherited: bool,
    /// Which computed-style block stores this property.
    pub group: Group,
}

macro_rules! prop_table {
    ($(($id:ident, $name:expr, $inherited:expr, $group:expr)),+ $(,)?) => {
        /// The full property dispatch table, in declaration order.
        pub static PROPERTY_TABLE: &[PropertyMeta] = &[
            $(PropertyMeta { id: PropertyId::$id, name: $name, inherited: $inherited, group: $group }),+
        ];
    };
}

prop_table! {
    (Color, "color", true, Group::Normal),
    (BackgroundColor, "background-color", false, Group::Normal),
    (BackgroundImage, "background-image", false, Group::Normal),
    (Display, "display", false, Group::Normal),
    (Position, "position", false, Group::Normal),
    (Float, "float", false, Group::Normal),
    (Clear, "clear", false, Group::Normal),
    (Visibility, "visibility", true, Group::Normal),
    (Overflow, "overflow", false, Group::Normal),
    (TextAlign, "text-align", true, Group::Normal),
    (TextDecoration, "text-decoration", false, Group::Normal),
    (TextTransform, "text-transform", true, Group::Normal),
    (TextIndent, "text-indent", true, Group::Normal),
    (WhiteSpace, "white-space", true, Group::Normal),
    (VerticalAlign, "vertical-align", false, Group::Normal),
    (FontFamily, "font-family", true, Group::Normal),
    (FontSize, "font-size", true, Group::Normal),
    (FontStyle, "font-style", true, Group::Normal),
    (FontWeight, "font-weight", true, Group::Normal),
    (LineHeight, "line-height", true, Group::Normal),
    (Width, "width", false, Group::Normal),
    (Height, "height", false, Group::Normal),
    (MinWidth, "min-width", false, Group::Normal),
    (MinHeight, "min-height", false, Group::Normal),
    (MaxWidth, "max-width", false, Group::Normal),
    (MaxHeight, "max-height", false, Group::Normal),
    (Top, "top", false, Group::Normal),
    (Right, "right", false, Group::Normal),
    (Bottom, "bottom", false, Group::Normal),
    (Left, "left", false, Group::Normal),
    (ZIndex, "z-index", false, Group::Normal),
    (MarginTop, "margin-top", false, Group::Normal),
    (MarginRight, "margin-right", false, Group::Normal),
    (MarginBottom, "margin-bottom", false, Group::Normal),
    (MarginLeft, "margin-left", false, Group::Normal),
    (PaddingTop, "padding-top", false, Group::Normal),
    (PaddingRight, "padding-right", false, Group::Normal),
    (PaddingBottom, "padding-bottom", false, Group::Normal),
    (PaddingLeft, "padding-left", false, Group::Normal),
    (BorderTopWidth, "border-top-width", false, Group::Normal),
    (BorderRightWidth, "border-right-width", false, Group::Normal),
    (BorderBottomWidth, "border-bottom-width", false, Group::Normal),
    (BorderLeftWidth, "border-left-width", false, Group::Normal),
    (BorderTopStyle, "border-top-style", false, Group::Normal),
    (BorderRightStyle, "border-right-style", false, Group::Normal),
    (BorderBottomStyle, "border-bottom-style", false, Group::Normal),
    (BorderLeftStyle, "border-left-style", false, Group::Normal),
    (BorderTopColor, "border-top-color", false, Group::Normal),
    (BorderRightColor, "border-right-color", false, Group::Normal),
    (BorderBottomColor, "border-bottom-color", false, Group::Normal),
    (BorderLeftColor, "border-left-color", false, Group::Normal),
    (OutlineColor, "outline-color", false, Group::Uncommon),
    (OutlineStyle, "outline-style", false, Group::Normal),
    (OutlineWidth, "outline-width", false, Group::Uncommon),
    (Cursor, "cursor", true, Group::Uncommon),
    (ListStyleType, "list-style-type", true, Group::Normal),
    (ListStylePosition, "list-style-position", true, Group::Normal),
    (ListStyleImage, "list-style-image", true, Group::Normal),
    (LetterSpacing, "letter-spacing", true, Group::Uncommon),
    (WordSpacing, "word-spacing", true, Group::Uncommon),
    (WritingMode, "writing-mode", true, Group::Uncommon),
    (BreakBefore, "break-before", false, Group::Uncommon),
    (BreakAfter, "break-after", false, Group::Uncommon),
    (BreakInside, "break-inside", false, Group::Uncommon),
    (Clip, "clip", false, Group::Uncommon),
    (ColumnCount, "column-count", false, Group::Uncommon),
    (ColumnWidth, "column-width", false, Group::Uncommon),
    (Quotes, "quotes", true, Group::Normal),
    (Content, "content", false, Group::Uncommon),
    (CounterIncrement, "counter-increment", false, Group::Uncommon),
    (CounterReset, "counter-reset", false, Group::Uncommon),
    (FlexGrow, "flex-grow", false, Group::Normal),
    (FlexShrink, "flex-shrink", false, Group::Normal),
    (FlexBasis, "flex-basis", false, Group::Normal),
}

impl PropertyId {
    /// Look up a property by its CSS source name, case-insensitively.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        PROPERTY_TABLE
            .iter()
            .find(|meta| meta.name.eq_ignore_ascii_case(name))
            .map(|meta| meta.id)
    }

    /// This property's static metadata.
    #[must_use]
    pub fn meta(self) -> &'static PropertyMeta {
        PROPERTY_TABLE
            .iter()
            .find(|meta| meta.id == self)
            .expect("every PropertyId has a PROPERTY_TABLE entry")
    }

    /// Whether this property's computed value is inherited from the
    /// parent when unset.
    #[must_use]
    pub fn is_inherited(self) -> bool {
        self.meta().inherited
    }
}

/// A resolved (but not yet computed, e.g. percentages aren't yet
/// resolved against a containing block) property value.
#[derive(Debug, Clone, PartialEq, Hash)]
pub enum PropertyValue {
    /// The `auto` keyword.
    Auto,
    /// The `normal` keyword.
    Normal,
    /// The `none` keyword.
    None,
    /// A bare identifier keyword (`block`, `solid`, `italic`, …),
    /// lowercased.
    Keyword(Atom),
    /// A length, percentage, or other dimensioned number.
    Dimension(Dimension),
    /// A bare, unitless number (`line-height: 1.5`, `z-index: 3`,
    /// `font-weight: 700`).
    Number(Fixed),
    /// A resolved color.
    Color(Color),
    /// An ordered list of identifiers or strings (`font-family`,
    /// `quotes`, `content` string items).
    List(Vec<Atom>),
    /// A compiled, interned `calc()` program, deferred to apply time
    /// (and, for percentages, to read time).
    Calc(CalcRef),
    /// A `rect(top, right, bottom, left)` clip region.
    Rect([Dimension; 4]),
    /// A resource reference (`background-image: url(...)`,
    /// `list-style-image: url(...)`).
    Url(Atom),
    /// Counter name/delta pairs (`counter-increment: section 2 page`).
    Counters(Vec<(Atom, i32)>),
}

/// The enclosing sheet's context a value parse needs: whether the sheet
/// is in quirks mode, and the client's resolver for system colors and
/// named colors the engine's own table doesn't know.
#[derive(Clone, Copy, Default)]
pub struct ValueContext<'a> {
    /// The enclosing sheet's quirks flag. In quirks mode, a bare number
    /// is accepted as a px length, and number/dimension/ident tokens
    /// whose lexeme is exactly 3 or 6 hex digits are accepted as colors.
    pub quirks: bool,
    /// Maps system colors (`canvas`, `buttonface`) and names the engine
    /// doesn't know to an RGBA. `None` means such names fail.
    pub color_resolver: Option<&'a dyn Fn(&str) -> Option<Color>>,
}

/// Parse a declaration's component values into a [`PropertyValue`] for
/// `id`, or `None` if the value doesn't match the property's grammar.
///
/// This never sees `var()` references — callers substitute those first
/// via [`crate::value::substitute_var`].
#[must_use]
pub fn parse_value(id: PropertyId, components: &[ComponentValue]) -> Option<PropertyValue> {
    parse_value_in(id, components, &ValueContext::default())
}

/// [`parse_value`] with an explicit sheet context (quirks flag, client
/// color resolver).
#[must_use]
pub fn parse_value_in(
    id: PropertyId,
    components: &[ComponentValue],
    ctx: &ValueContext<'_>,
) -> Option<PropertyValue> {
    let components = strip_whitespace(components);
    if components.is_empty() {
        return None;
    }

    if let [ComponentValue::Token(Token::Ident(kw))] = components.as_slice() {
        match kw.as_str() {
            s if s.eq_ignore_ascii_case("auto") && accepts_auto(id) => return Some(PropertyValue::Auto),
            s if s.eq_ignore_ascii_case("normal") && accepts_normal(id) => {
                return Some(PropertyValue::Normal);
            }
            s if s.eq_ignore_ascii_case("none") && accepts_none(id) => return Some(PropertyValue::None),
            _ => {}
        }
    }

    match id {
        PropertyId::Color
        | PropertyId::BackgroundColor
        | PropertyId::BorderTopColor
        | PropertyId::BorderRightColor
        | PropertyId::BorderBottomColor
        | PropertyId::BorderLeftColor
        | PropertyId::OutlineColor => parse_color_value(&components, ctx),

        PropertyId::Width
        | PropertyId::Height
        | PropertyId::MinWidth
        | PropertyId::MinHeight
        | PropertyId::MaxWidth
        | PropertyId::MaxHeight
        | PropertyId::Top
        | PropertyId::Right
        | PropertyId::Bottom
        | PropertyId::Left
        | PropertyId::MarginTop
        | PropertyId::MarginRight
        | PropertyId::MarginBottom
        | PropertyId::MarginLeft
        | PropertyId::PaddingTop
        | PropertyId::PaddingRight
        | PropertyId::PaddingBottom
        | PropertyId::PaddingLeft
        | PropertyId::TextIndent
        | PropertyId::LetterSpacing
        | PropertyId::WordSpacing
        | PropertyId::ColumnWidth
        | PropertyId::FlexBasis
        | PropertyId::FontSize => parse_dimension_value(&components, ctx),

        PropertyId::BorderTopWidth
        | PropertyId::BorderRightWidth
        | PropertyId::BorderBottomWidth
        | PropertyId::BorderLeftWidth
        | PropertyId::OutlineWidth => parse_line_width(&components, ctx),

        PropertyId::ZIndex | PropertyId::FlexGrow | PropertyId::FlexShrink => {
            parse_number_value(&components)
        }
        PropertyId::ColumnCount => parse_positive_integer(&components),
        PropertyId::LineHeight => {
            parse_number_value(&components).or_else(|| parse_dimension_value(&components, ctx))
        }
        PropertyId::FontWeight => parse_font_weight(&components),

        PropertyId::FontFamily => parse_family_list(&components),
        PropertyId::Quotes => parse_string_pairs(&components),
        PropertyId::Content => parse_content(&components),
        PropertyId::CounterIncrement | PropertyId::CounterReset => parse_counter_list(&components),
        PropertyId::Clip => parse_clip_rect(&components, ctx),
        PropertyId::BackgroundImage | PropertyId::ListStyleImage => parse_image(&components),

        PropertyId::Display
        | PropertyId::Position
        | PropertyId::Float
        | PropertyId::Clear
        | PropertyId::Visibility
        | PropertyId::Overflow
        | PropertyId::TextAlign
        | PropertyId::TextDecoration
        | PropertyId::TextTransform
        | PropertyId::WhiteSpace
        | PropertyId::VerticalAlign
        | PropertyId::FontStyle
        | PropertyId::BorderTopStyle
        | PropertyId::BorderRightStyle
        | PropertyId::BorderBottomStyle
        | PropertyId::BorderLeftStyle
        | PropertyId::OutlineStyle
        | PropertyId::WritingMode
        | PropertyId::BreakBefore
        | PropertyId::BreakAfter
        | PropertyId::BreakInside
        | PropertyId::Cursor
        | PropertyId::ListStyleType
        | PropertyId::ListStylePosition => parse_keyword_value(&components),
    }
}

fn accepts_auto(id: PropertyId) -> bool {
    matches!(
        id,
        PropertyId::Width
            | PropertyId::Height
            | PropertyId::MinWidth
            | PropertyId::MinHeight
            | PropertyId::MaxWidth
            | PropertyId::MaxHeight
            | PropertyId::Top
            | PropertyId::Right
            | PropertyId::Bottom
            | PropertyId::Left
            | PropertyId::MarginTop
            | PropertyId::MarginRight
            | PropertyId::MarginBottom
            | PropertyId::MarginLeft
            | PropertyId::ZIndex
            | PropertyId::Cursor
            | PropertyId::Clip
            | PropertyId::ColumnCount
            | PropertyId::ColumnWidth
            | PropertyId::FlexBasis
    )
}

fn accepts_normal(id: PropertyId) -> bool {
    matches!(
        id,
        PropertyId::LineHeight
            | PropertyId::LetterSpacing
            | PropertyId::WordSpacing
            | PropertyId::WhiteSpace
            | PropertyId::Content
    )
}

fn accepts_none(id: PropertyId) -> bool {
    matches!(
        id,
        PropertyId::MaxWidth
            | PropertyId::MaxHeight
            | PropertyId::Float
            | PropertyId::TextDecoration
            | PropertyId::ListStyleImage
            | PropertyId::BackgroundImage
            | PropertyId::Quotes
            | PropertyId::Content
            | PropertyId::CounterIncrement
            | PropertyId::CounterReset
    )
}

fn strip_whitespace(components: &[ComponentValue]) -> Vec<ComponentValue> {
    components
        .iter()
        .filter(|cv| !matches!(cv, ComponentValue::Token(Token::Whitespace)))
        .cloned()
        .collect()
}

/// The CSS-wide keywords no bare identifier list may swallow, plus the
/// generic family names that may stand alone but not inside a longer
/// multi-word family name.
fn is_css_wide_keyword(s: &str) -> bool {
    ["inherit", "initial", "unset", "revert", "default"]
        .iter()
        .any(|kw| s.eq_ignore_ascii_case(kw))
}

fn is_generic_family(s: &str) -> bool {
    ["serif", "sans-serif", "monospace", "cursive", "fantasy"]
        .iter()
        .any(|kw| s.eq_ignore_ascii_case(kw))
}

// ---------------------------------------------------------------------------
// Colors

fn parse_color_value(
    components: &[ComponentValue],
    ctx: &ValueContext<'_>,
) -> Option<PropertyValue> {
    parse_color(components, ctx).map(PropertyValue::Color)
}

/// Parse a single `<color>` out of (whitespace-stripped) component
/// values. Shared by the color-valued longhands and the shorthand
/// decomposers.
pub(crate) fn parse_color(
    components: &[ComponentValue],
    ctx: &ValueContext<'_>,
) -> Option<Color> {
    match components {
        [ComponentValue::Token(Token::Ident(kw))] => {
            if let Some(color) = Color::from_named(kw.as_str()) {
                return Some(color);
            }
            if ctx.quirks && matches!(kw.as_str().len(), 3 | 6) {
                if let Some(color) = Color::from_hex(kw.as_str()) {
                    return Some(color);
                }
            }
            ctx.color_resolver.and_then(|resolve| resolve(kw.as_str()))
        }
        [ComponentValue::Token(Token::Hash { value, .. })] => Color::from_hex(value.as_str()),
        [ComponentValue::Token(Token::Number { repr, .. })] if ctx.quirks => {
            quirks_hex(repr.as_str())
        }
        [ComponentValue::Token(Token::Dimension { repr, unit, .. })] if ctx.quirks => {
            quirks_hex(&format!("{}{}", repr.as_str(), unit.as_str()))
        }
        [ComponentValue::Function { name, value }] => {
            let name = name.as_str();
            if name.eq_ignore_ascii_case("rgb") || name.eq_ignore_ascii_case("rgba") {
                parse_rgb_function(value)
            } else if name.eq_ignore_ascii_case("hsl") || name.eq_ignore_ascii_case("hsla") {
                parse_hsl_function(value)
            } else if name.eq_ignore_ascii_case("hwb") {
                parse_hwb_function(value)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// The quirks-mode hash-color compatibility rule: a token whose lexeme is
/// exactly six hex digits is treated as if it were `#RRGGBB`.
fn quirks_hex(lexeme: &str) -> Option<Color> {
    if lexeme.len() == 6 && lexeme.bytes().all(|b| b.is_ascii_hexdigit()) {
        Color::from_hex(lexeme)
    } else {
        None
    }
}

/// One argument channel of a color function, before interpretation.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Channel {
    Number(f64),
    Percent(f64),
    Angle(f64),
    None,
}

fn channel_of(cv: &ComponentValue) -> Option<Channel> {
    match cv {
        ComponentValue::Token(Token::Number { value, .. }) => Some(Channel::Number(value.to_f64())),
        ComponentValue::Token(Token::Percentage { value, .. }) => {
            Some(Channel::Percent(value.to_f64()))
        }
        ComponentValue::Token(Token::Dimension { value, unit, .. }) => {
            let unit = Unit::from_keyword(unit.as_str())?;
            let degrees = value.to_f64() * unit.absolute_factor()?.to_f64();
            match unit.category() {
                crate::unit::UnitCategory::Angle => Some(Channel::Angle(degrees)),
                _ => None,
            }
        }
        ComponentValue::Token(Token::Ident(kw)) if kw.eq_ignore_ascii_case("none") => {
            Some(Channel::None)
        }
        _ => None,
    }
}

/// Split a color function's arguments into channels plus an optional
/// alpha. Accepts the legacy comma-separated form (`rgb(1, 2, 3)`,
/// `rgba(1, 2, 3, 0.5)`), where `none` is rejected, and the modern
/// whitespace form with `/ alpha` (`rgb(1 2 3 / 50%)`), where a missing
/// channel may be written `none` (treated as zero).
fn split_color_arguments(args: &[ComponentValue]) -> Option<(Vec<Channel>, Option<Channel>)> {
    let legacy = args
        .iter()
        .any(|cv| matches!(cv, ComponentValue::Token(Token::Comma)));
    let mut channels = Vec::new();
    let mut alpha = None;
    let mut after_slash = false;

    for cv in args {
        match cv {
            ComponentValue::Token(Token::Whitespace | Token::Comma) => {}
            ComponentValue::Token(Token::Delim('/')) if !legacy && !after_slash => {
                after_slash = true;
            }
            _ => {
                let channel = channel_of(cv)?;
                if legacy && channel == Channel::None {
                    return None;
                }
                if after_slash {
                    if alpha.is_some() {
                        return None;
                    }
                    alpha = Some(channel);
                } else {
                    channels.push(channel);
                }
            }
        }
    }

    // Legacy syntax carries alpha as a fourth comma-separated channel.
    if legacy && channels.len() == 4 {
        alpha = channels.pop();
    }
    Some((channels, alpha))
}

fn alpha_fraction(alpha: Option<Channel>) -> Option<f64> {
    Some(match alpha {
        None => 1.0,
        Some(Channel::Number(n)) => n.clamp(0.0, 1.0),
        Some(Channel::Percent(p)) => (p / 100.0).clamp(0.0, 1.0),
        Some(Channel::None) => 0.0,
        Some(Channel::Angle(_)) => return None,
    })
}

fn parse_rgb_function(args: &[ComponentValue]) -> Option<Color> {
    let (channels, alpha) = split_color_arguments(args)?;
    let [r, g, b] = channels.as_slice() else {
        return None;
    };
    let byte = |c: &Channel| -> Option<u8> {
        Some(match c {
            Channel::Number(n) => n.clamp(0.0, 255.0).round() as u8,
            Channel::Percent(p) => ((p / 100.0).clamp(0.0, 1.0) * 255.0).round() as u8,
            Channel::None => 0,
            Channel::Angle(_) => return None,
        })
    };
    let alpha = (alpha_fraction(alpha)? * 255.0).round() as u8;
    Some(Color::from_rgba(byte(r)?, byte(g)?, byte(b)?, alpha))
}

fn hue_degrees(c: &Channel) -> Option<f64> {
    Some(match c {
        Channel::Number(n) => *n,
        Channel::Angle(d) => *d,
        Channel::None => 0.0,
        Channel::Percent(_) => return None,
    })
}

fn percent_fraction(c: &Channel) -> Option<f64> {
    Some(match c {
        Channel::Percent(p) => p / 100.0,
        Channel::Number(n) => n / 100.0,
        Channel::None => 0.0,
        Channel::Angle(_) => return None,
    })
}

fn parse_hsl_function(args: &[ComponentValue]) -> Option<Color> {
    let (channels, alpha) = split_color_arguments(args)?;
    let [h, s, l] = channels.as_slice() else {
        return None;
    };
    Some(Color::from_hsla(
        hue_degrees(h)?,
        percent_fraction(s)?,
        percent_fraction(l)?,
        alpha_fraction(alpha)?,
    ))
}

fn parse_hwb_function(args: &[ComponentValue]) -> Option<Color> {
    let (channels, alpha) = split_color_arguments(args)?;
    let [h, w, b] = channels.as_slice() else {
        return None;
    };
    Some(Color::from_hwba(
        hue_degrees(h)?,
        percent_fraction(w)?,
        percent_fraction(b)?,
        alpha_fraction(alpha)?,
    ))
}

// ---------------------------------------------------------------------------
// Lengths and numbers

fn parse_dimension_value(
    components: &[ComponentValue],
    ctx: &ValueContext<'_>,
) -> Option<PropertyValue> {
    let [component] = components else {
        return None;
    };
    match component {
        ComponentValue::Token(Token::Dimension { value, unit, .. }) => {
            Some(PropertyValue::Dimension(Dimension {
                value: *value,
                unit: Unit::from_keyword(unit.as_str())?,
            }))
        }
        ComponentValue::Token(Token::Percentage { value, .. }) => {
            Some(PropertyValue::Dimension(Dimension { value: *value, unit: Unit::Percent }))
        }
        // A unitless zero is a valid length everywhere; any other bare
        // number is a length only under the quirks compatibility rule.
        ComponentValue::Token(Token::Number { value, int_value, .. }) => {
            if *int_value == Some(0) || ctx.quirks {
                Some(PropertyValue::Dimension(Dimension { value: *value, unit: Unit::Px }))
            } else {
                None
            }
        }
        ComponentValue::Function { name, value } if name.eq_ignore_ascii_case("calc") => {
            calc::compile(value).map(PropertyValue::Calc)
        }
        _ => None,
    }
}

/// `<line-width>`: a length or one of the `thin`/`medium`/`thick`
/// keywords, mapped to fixed 1/3/5 px widths.
fn parse_line_width(
    components: &[ComponentValue],
    ctx: &ValueContext<'_>,
) -> Option<PropertyValue> {
    if let [ComponentValue::Token(Token::Ident(kw))] = components {
        let px = match kw.as_str() {
            s if s.eq_ignore_ascii_case("thin") => 1.0,
            s if s.eq_ignore_ascii_case("medium") => 3.0,
            s if s.eq_ignore_ascii_case("thick") => 5.0,
            _ => return None,
        };
        return Some(PropertyValue::Dimension(Dimension::new(px, Unit::Px)));
    }
    parse_dimension_value(components, ctx)
}

fn parse_number_value(components: &[ComponentValue]) -> Option<PropertyValue> {
    let [ComponentValue::Token(Token::Number { value, .. })] = components else {
        return None;
    };
    Some(PropertyValue::Number(*value))
}

fn parse_positive_integer(components: &[ComponentValue]) -> Option<PropertyValue> {
    let [ComponentValue::Token(Token::Number { value, int_value: Some(n), .. })] = components
    else {
        return None;
    };
    if *n < 1 {
        return None;
    }
    Some(PropertyValue::Number(*value))
}

fn parse_font_weight(components: &[ComponentValue]) -> Option<PropertyValue> {
    match components {
        [ComponentValue::Token(Token::Number { value, .. })] => Some(PropertyValue::Number(*value)),
        [ComponentValue::Token(Token::Ident(kw))] => {
            let numeric = match kw.as_str() {
                s if s.eq_ignore_ascii_case("normal") => 400.0,
                s if s.eq_ignore_ascii_case("bold") => 700.0,
                s if s.eq_ignore_ascii_case("lighter") || s.eq_ignore_ascii_case("bolder") => {
                    return Some(PropertyValue::Keyword(kw.clone()));
                }
                _ => return None,
            };
            Some(PropertyValue::Number(Fixed::from_f64(numeric)))
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Lists

/// `font-family`: comma-separated families. A quoted string passes
/// through as-is; consecutive bare identifiers coalesce into one family
/// name with single spaces (`Times New Roman`). A CSS-wide keyword
/// anywhere in a bare identifier run, or a generic family as *part of* a
/// longer run, invalidates the whole declaration rather than being
/// swallowed into a name.
fn parse_family_list(components: &[ComponentValue]) -> Option<PropertyValue> {
    let mut families = Vec::new();
    for group in components.split(|cv| matches!(cv, ComponentValue::Token(Token::Comma))) {
        let mut words: Vec<&str> = Vec::new();
        let mut string_family = None;
        for cv in group {
            match cv {
                ComponentValue::Token(Token::Ident(ident)) => words.push(ident.as_str()),
                ComponentValue::Token(Token::String(s)) if words.is_empty() => {
                    string_family = Some(s.clone());
                }
                _ => return None,
            }
        }
        if let Some(s) = string_family {
            if !words.is_empty() {
                return None;
            }
            families.push(s);
            continue;
        }
        if words.is_empty() {
            return None;
        }
        if words.iter().any(|w| is_css_wide_keyword(w)) {
            return None;
        }
        if words.len() > 1 && words.iter().any(|w| is_generic_family(w)) {
            return None;
        }
        families.push(Atom::new(&words.join(" ")));
    }
    if families.is_empty() {
        None
    } else {
        Some(PropertyValue::List(families))
    }
}

/// `quotes`: one or more open/close string pairs.
fn parse_string_pairs(components: &[ComponentValue]) -> Option<PropertyValue> {
    let strings: Vec<Atom> = components
        .iter()
        .map(|cv| match cv {
            ComponentValue::Token(Token::String(s)) => Some(s.clone()),
            _ => None,
        })
        .collect::<Option<_>>()?;
    if strings.is_empty() || strings.len() % 2 != 0 {
        return None;
    }
    Some(PropertyValue::List(strings))
}

/// `content`: a sequence of strings and quote keywords. Counters and
/// `attr()` references aren't modeled; a declaration using them is
/// dropped like any other unparseable value.
fn parse_content(components: &[ComponentValue]) -> Option<PropertyValue> {
    let mut items = Vec::new();
    for cv in components {
        match cv {
            ComponentValue::Token(Token::String(s)) => items.push(s.clone()),
            ComponentValue::Token(Token::Ident(kw))
                if ["open-quote", "close-quote", "no-open-quote", "no-close-quote"]
                    .iter()
                    .any(|k| kw.eq_ignore_ascii_case(k)) =>
            {
                items.push(Atom::new_case_folded(kw.as_str()));
            }
            _ => return None,
        }
    }
    if items.is_empty() {
        None
    } else {
        Some(PropertyValue::List(items))
    }
}

/// `counter-increment` / `counter-reset`: identifiers, each optionally
/// followed by an integer delta (default 1).
fn parse_counter_list(components: &[ComponentValue]) -> Option<PropertyValue> {
    let mut counters: Vec<(Atom, i32)> = Vec::new();
    for cv in components {
        match cv {
            ComponentValue::Token(Token::Ident(name)) => {
                if is_css_wide_keyword(name.as_str()) {
                    return None;
                }
                counters.push((name.clone(), 1));
            }
            ComponentValue::Token(Token::Number { int_value: Some(n), .. }) => {
                let last = counters.last_mut()?;
                last.1 = i32::try_from(*n).ok()?;
            }
            _ => return None,
        }
    }
    if counters.is_empty() {
        None
    } else {
        Some(PropertyValue::Counters(counters))
    }
}

/// `clip`: `rect(top, right, bottom, left)`, commas optional. Each side
/// is a length or `auto` (stored as a zero px placeholder — layout is
/// out of scope, so nothing downstream distinguishes them yet).
fn parse_clip_rect(
    components: &[ComponentValue],
    ctx: &ValueContext<'_>,
) -> Option<PropertyValue> {
    let [ComponentValue::Function { name, value }] = components else {
        return None;
    };
    if !name.eq_ignore_ascii_case("rect") {
        return None;
    }
    let mut sides = Vec::new();
    for cv in value {
        match cv {
            ComponentValue::Token(Token::Whitespace | Token::Comma) => {}
            ComponentValue::Token(Token::Ident(kw)) if kw.eq_ignore_ascii_case("auto") => {
                sides.push(Dimension::new(0.0, Unit::Px));
            }
            other => match parse_dimension_value(std::slice::from_ref(other), ctx) {
                Some(PropertyValue::Dimension(d)) => sides.push(d),
                _ => return None,
            },
        }
    }
    let sides: [Dimension; 4] = sides.try_into().ok()?;
    Some(PropertyValue::Rect(sides))
}

fn parse_image(components: &[ComponentValue]) -> Option<PropertyValue> {
    match components {
        [ComponentValue::Token(Token::Url(url))] => Some(PropertyValue::Url(url.clone())),
        [ComponentValue::Function { name, value }] if name.eq_ignore_ascii_case("url") => {
            let url = value.iter().find_map(|cv| match cv {
                ComponentValue::Token(Token::String(s)) => Some(s.clone()),
                _ => None,
            })?;
            Some(PropertyValue::Url(url))
        }
        _ => None,
    }
}

fn parse_keyword_value(components: &[ComponentValue]) -> Option<PropertyValue> {
    let [ComponentValue::Token(Token::Ident(kw))] = components else {
        return None;
    };
    Some(PropertyValue::Keyword(Atom::new_case_folded(kw.as_str())))
}

/// A property's initial value, per its specification's "Initial" line.
#[must_use]
pub fn initial_value(id: PropertyId) -> PropertyValue {
    use PropertyValue::{Auto, Color as C, Dimension as D, Keyword as K, None as N, Normal, Number as Num};
    match id {
        PropertyId::Color => C(Color::BLACK),
        PropertyId::BackgroundColor => C(Color::Transparent),
        PropertyId::BackgroundImage | PropertyId::ListStyleImage => N,
        PropertyId::Display => K(Atom::new("inline")),
        PropertyId::Position => K(Atom::new("static")),
        PropertyId::Float => K(Atom::new("none")),
        PropertyId::Clear => K(Atom::new("none")),
        PropertyId::Visibility => K(Atom::new("visible")),
        PropertyId::Overflow => K(Atom::new("visible")),
        PropertyId::TextAlign => K(Atom::new("start")),
        PropertyId::TextDecoration => K(Atom::new("none")),
        PropertyId::TextTransform => K(Atom::new("none")),
        PropertyId::TextIndent => D(Dimension::new(0.0, Unit::Px)),
        PropertyId::WhiteSpace => K(Atom::new("normal")),
        PropertyId::VerticalAlign => K(Atom::new("baseline")),
        PropertyId::FontFamily => PropertyValue::List(vec![Atom::new("serif")]),
        PropertyId::FontSize => D(Dimension::new(16.0, Unit::Px)),
        PropertyId::FontStyle => K(Atom::new("normal")),
        PropertyId::FontWeight => Num(Fixed::from_f64(400.0)),
        PropertyId::LineHeight => Normal,
        PropertyId::Width
        | PropertyId::Height
        | PropertyId::Top
        | PropertyId::Right
        | PropertyId::Bottom
        | PropertyId::Left
        | PropertyId::MarginTop
        | PropertyId::MarginRight
        | PropertyId::MarginBottom
        | PropertyId::MarginLeft => Auto,
        PropertyId::MinWidth | PropertyId::MinHeight => D(Dimension::new(0.0, Unit::Px)),
        PropertyId::MaxWidth | PropertyId::MaxHeight => N,
        PropertyId::ZIndex => Auto,
        PropertyId::PaddingTop | PropertyId::PaddingRight | PropertyId::PaddingBottom | PropertyId::PaddingLeft => {
            D(Dimension::new(0.0, Unit::Px))
        }
        PropertyId::BorderTopWidth
        | PropertyId::BorderRightWidth
        | PropertyId::BorderBottomWidth
        | PropertyId::BorderLeftWidth
        | PropertyId::OutlineWidth => D(Dimension::new(3.0, Unit::Px)),
        PropertyId::BorderTopStyle
        | PropertyId::BorderRightStyle
        | PropertyId::BorderBottomStyle
        | PropertyId::BorderLeftStyle
        | PropertyId::OutlineStyle => K(Atom::new("none")),
        PropertyId::BorderTopColor
        | PropertyId::BorderRightColor
        | PropertyId::BorderBottomColor
        | PropertyId::BorderLeftColor
        | PropertyId::OutlineColor => C(Color::CurrentColor),
        PropertyId::Cursor => K(Atom::new("auto")),
        PropertyId::ListStyleType => K(Atom::new("disc")),
        PropertyId::ListStylePosition => K(Atom::new("outside")),
        PropertyId::LetterSpacing | PropertyId::WordSpacing => Normal,
        PropertyId::WritingMode => K(Atom::new("horizontal-tb")),
        PropertyId::BreakBefore | PropertyId::BreakAfter | PropertyId::BreakInside => {
            K(Atom::new("auto"))
        }
        PropertyId::Clip | PropertyId::ColumnCount | PropertyId::ColumnWidth => Auto,
        PropertyId::Quotes => PropertyValue::List(vec![
            Atom::new("\u{201C}"),
            Atom::new("\u{201D}"),
            Atom::new("\u{2018}"),
            Atom::new("\u{2019}"),
        ]),
        PropertyId::Content => Normal,
        PropertyId::CounterIncrement | PropertyId::CounterReset => N,
        PropertyId::FlexGrow => Num(Fixed::ZERO),
        PropertyId::FlexShrink => Num(Fixed::ONE),
        PropertyId::FlexBasis => Auto,
    }
}

// ---------------------------------------------------------------------------
// Shorthands

/// Expand a shorthand property into its longhands, or `None` if `name`
/// isn't a recognized shorthand (callers then try it as a longhand via
/// [`PropertyId::from_name`]).
///
/// Per-side shorthands (`margin`, `padding`, `border-width`,
/// `border-style`, `border-color`) use the standard 1/2/3/4-value
/// top/right/bottom/left expansion; `border-top`/`-right`/`-bottom`/
/// `-left`, `outline`, `list-style`, `columns`, `background`, and `flex`
/// try each of their longhands against each value in turn; `border`
/// expands to all twelve side longhands; `font` follows its positional
/// `[style||weight]? size[/line-height] family` grammar.
///
/// Longhands the shorthand doesn't mention are reset to their initial
/// values by the caller marking the whole set — here, by emitting every
/// longhand id with either the parsed value or no components (which the
/// cascade resolves to the initial value).
#[must_use]
pub fn expand_shorthand(name: &str, components: &[ComponentValue]) -> Option<Vec<(PropertyId, Vec<ComponentValue>)>> {
    let values = split_on_whitespace(components);

    match name.to_ascii_lowercase().as_str() {
        "margin" => Some(four_sides(
            &values,
            [PropertyId::MarginTop, PropertyId::MarginRight, PropertyId::MarginBottom, PropertyId::MarginLeft],
        )),
        "padding" => Some(four_sides(
            &values,
            [PropertyId::PaddingTop, PropertyId::PaddingRight, PropertyId::PaddingBottom, PropertyId::PaddingLeft],
        )),
        "border-width" => Some(four_sides(
            &values,
            [PropertyId::BorderTopWidth, PropertyId::BorderRightWidth, PropertyId::BorderBottomWidth, PropertyId::BorderLeftWidth],
        )),
        "border-style" => Some(four_sides(
            &values,
            [PropertyId::BorderTopStyle, PropertyId::BorderRightStyle, PropertyId::BorderBottomStyle, PropertyId::BorderLeftStyle],
        )),
        "border-color" => Some(four_sides(
            &values,
            [PropertyId::BorderTopColor, PropertyId::BorderRightColor, PropertyId::BorderBottomColor, PropertyId::BorderLeftColor],
        )),
        "border-top" => Some(try_each(&values, &[PropertyId::BorderTopWidth, PropertyId::BorderTopStyle, PropertyId::BorderTopColor])),
        "border-right" => Some(try_each(&values, &[PropertyId::BorderRightWidth, PropertyId::BorderRightStyle, PropertyId::BorderRightColor])),
        "border-bottom" => Some(try_each(&values, &[PropertyId::BorderBottomWidth, PropertyId::BorderBottomStyle, PropertyId::BorderBottomColor])),
        "border-left" => Some(try_each(&values, &[PropertyId::BorderLeftWidth, PropertyId::BorderLeftStyle, PropertyId::BorderLeftColor])),
        "border" => {
            let sides = [
                [PropertyId::BorderTopWidth, PropertyId::BorderTopStyle, PropertyId::BorderTopColor],
                [PropertyId::BorderRightWidth, PropertyId::BorderRightStyle, PropertyId::BorderRightColor],
                [PropertyId::BorderBottomWidth, PropertyId::BorderBottomStyle, PropertyId::BorderBottomColor],
                [PropertyId::BorderLeftWidth, PropertyId::BorderLeftStyle, PropertyId::BorderLeftColor],
            ];
            let mut out = Vec::with_capacity(12);
            for side in sides {
                out.extend(try_each(&values, &side));
            }
            Some(out)
        }
        "outline" => Some(try_each(&values, &[PropertyId::OutlineWidth, PropertyId::OutlineStyle, PropertyId::OutlineColor])),
        "list-style" => Some(try_each(
            &values,
            &[PropertyId::ListStyleType, PropertyId::ListStylePosition, PropertyId::ListStyleImage],
        )),
        "columns" => Some(try_each(&values, &[PropertyId::ColumnWidth, PropertyId::ColumnCount])),
        "background" => Some(try_each(&values, &[PropertyId::BackgroundColor, PropertyId::BackgroundImage])),
        "flex" => Some(expand_flex(&values)),
        "font" => expand_font(&values),
        _ => None,
    }
}

fn split_on_whitespace(components: &[ComponentValue]) -> Vec<Vec<ComponentValue>> {
    let mut groups: Vec<Vec<ComponentValue>> = vec![Vec::new()];
    for cv in components {
        if matches!(cv, ComponentValue::Token(Token::Whitespace)) {
            if !groups.last().unwrap().is_empty() {
                groups.push(Vec::new());
            }
        } else {
            groups.last_mut().unwrap().push(cv.clone());
        }
    }
    groups.retain(|g| !g.is_empty());
    groups
}

/// [CSS Box § 6.1](https://www.w3.org/TR/css-box-4/#margin-shorthand):
/// one value sets all four sides, two set vertical/horizontal, three set
/// top/horizontal/bottom, four set top/right/bottom/left in order.
fn four_sides(values: &[Vec<ComponentValue>], ids: [PropertyId; 4]) -> Vec<(PropertyId, Vec<ComponentValue>)> {
    let resolved: [&Vec<ComponentValue>; 4] = match values.len() {
        1 => [&values[0], &values[0], &values[0], &values[0]],
        2 => [&values[0], &values[1], &values[0], &values[1]],
        3 => [&values[0], &values[1], &values[2], &values[1]],
        4 => [&values[0], &values[1], &values[2], &values[3]],
        _ => return Vec::new(),
    };
    ids.into_iter().zip(resolved).map(|(id, v)| (id, v.clone())).collect()
}

/// The "try each longhand in turn on each value" decomposition shared by
/// `border-top`-style shorthands, `outline`, `list-style`, `columns`, and
/// `background`: every value claims the first still-unset longhand whose
/// grammar accepts it.
fn try_each(
    values: &[Vec<ComponentValue>],
    ids: &[PropertyId],
) -> Vec<(PropertyId, Vec<ComponentValue>)> {
    let mut out: Vec<(PropertyId, Vec<ComponentValue>)> = Vec::new();
    for value in values {
        let claimed = ids.iter().find(|id| {
            !out.iter().any(|(set, _)| set == *id) && parse_value(**id, value).is_some()
        });
        if let Some(id) = claimed {
            out.push((*id, value.clone()));
        }
    }
    out
}

/// `flex: none | <grow> <shrink>? <basis>?` — the first bare number is
/// flex-grow, a second is flex-shrink, and a length/`auto` is flex-basis.
fn expand_flex(values: &[Vec<ComponentValue>]) -> Vec<(PropertyId, Vec<ComponentValue>)> {
    if let [value] = values {
        if let [ComponentValue::Token(Token::Ident(kw))] = value.as_slice() {
            if kw.eq_ignore_ascii_case("none") {
                // flex: none == 0 0 auto
                let zero = || {
                    ComponentValue::Token(Token::Number {
                        value: Fixed::ZERO,
                        int_value: Some(0),
                        numeric_type: crate::token::NumericType::Integer,
                        repr: Atom::new("0"),
                    })
                };
                return vec![
                    (PropertyId::FlexGrow, vec![zero()]),
                    (PropertyId::FlexShrink, vec![zero()]),
                    (PropertyId::FlexBasis, vec![ComponentValue::Token(Token::Ident(Atom::new("auto")))]),
                ];
            }
        }
    }
    let mut out = Vec::new();
    let mut numbers_seen = 0;
    for value in values {
        if parse_number_value(value).is_some() {
            let id = if numbers_seen == 0 { PropertyId::FlexGrow } else { PropertyId::FlexShrink };
            numbers_seen += 1;
            out.push((id, value.clone()));
        } else if parse_value(PropertyId::FlexBasis, value).is_some() {
            out.push((PropertyId::FlexBasis, value.clone()));
        }
    }
    out
}

/// `font: [style||weight]? size[/line-height]? family...` — positional:
/// everything before the size is tried as style/weight, the size may
/// carry `/line-height`, and everything after is the family list.
fn expand_font(values: &[Vec<ComponentValue>]) -> Option<Vec<(PropertyId, Vec<ComponentValue>)>> {
    let mut out = Vec::new();
    let mut size_index = None;

    for (i, value) in values.iter().enumerate() {
        let (size_part, line_height_part) = split_on_slash(value);
        if parse_value(PropertyId::FontSize, &size_part).is_some() {
            out.push((PropertyId::FontSize, size_part));
            if let Some(lh) = line_height_part {
                out.push((PropertyId::LineHeight, lh));
            }
            size_index = Some(i);
            break;
        }
        // Weight first: the style parser is keyword-shaped and would
        // otherwise swallow `bold`.
        if parse_value(PropertyId::FontWeight, value).is_some() {
            out.push((PropertyId::FontWeight, value.clone()));
        } else if parse_value(PropertyId::FontStyle, value).is_some() {
            out.push((PropertyId::FontStyle, value.clone()));
        } else {
            return None;
        }
    }

    let size_index = size_index?;
    let family: Vec<ComponentValue> = values[size_index + 1..]
        .iter()
        .flat_map(|group| {
            group.iter().cloned().chain(std::iter::once(ComponentValue::Token(Token::Whitespace)))
        })
        .collect();
    if strip_whitespace(&family).is_empty() {
        return None;
    }
    out.push((PropertyId::FontFamily, family));
    Some(out)
}

/// Split `12px/1.5` (one whitespace group) into the size before the `/`
/// and the line-height after it, if any.
fn split_on_slash(value: &[ComponentValue]) -> (Vec<ComponentValue>, Option<Vec<ComponentValue>>) {
    let slash = value
        .iter()
        .position(|cv| matches!(cv, ComponentValue::Token(Token::Delim('/'))));
    match slash {
        Some(i) => (value[..i].to_vec(), Some(value[i + 1..].to_vec())),
        None => (value.to_vec(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::Tokenizer;

    fn components(src: &str) -> Vec<ComponentValue> {
        crate::value::parse_component_values(&mut Tokenizer::new(src).peekable())
    }

    fn color_of(src: &str) -> Option<Color> {
        match parse_value(PropertyId::Color, &components(src)) {
            Some(PropertyValue::Color(c)) => Some(c),
            _ => None,
        }
    }

    #[test]
    fn every_property_resolves_to_a_table_entry() {
        for meta in PROPERTY_TABLE {
            assert_eq!(PropertyId::from_name(meta.name), Some(meta.id));
        }
    }

    #[test]
    fn color_inherits_background_color_does_not() {
        assert!(PropertyId::Color.is_inherited());
        assert!(!PropertyId::BackgroundColor.is_inherited());
    }

    #[test]
    fn parses_named_color() {
        assert_eq!(color_of("red"), Color::from_named("red"));
    }

    #[test]
    fn rgb_legacy_comma_syntax() {
        assert_eq!(color_of("rgb(255, 0, 128)"), Some(Color::from_rgba(255, 0, 128, 255)));
        assert_eq!(color_of("rgba(255, 0, 0, 0.5)"), Some(Color::from_rgba(255, 0, 0, 128)));
    }

    #[test]
    fn rgb_modern_space_syntax_with_slash_alpha() {
        assert_eq!(color_of("rgb(255 0 128)"), Some(Color::from_rgba(255, 0, 128, 255)));
        assert_eq!(color_of("rgb(255 0 0 / 50%)"), Some(Color::from_rgba(255, 0, 0, 128)));
    }

    #[test]
    fn rgb_percentage_channels_scale_to_bytes() {
        assert_eq!(color_of("rgb(100%, 0%, 50%)"), Some(Color::from_rgba(255, 0, 128, 255)));
    }

    #[test]
    fn rgb_none_channel_is_zero_in_modern_syntax_only() {
        assert_eq!(color_of("rgb(none 255 0)"), Some(Color::from_rgba(0, 255, 0, 255)));
        assert_eq!(color_of("rgb(none, 255, 0)"), None);
    }

    #[test]
    fn rgb_channels_are_clamped() {
        assert_eq!(color_of("rgb(300, -10, 128)"), Some(Color::from_rgba(255, 0, 128, 255)));
    }

    #[test]
    fn hex_and_rgb_with_the_same_components_pack_identically() {
        assert_eq!(color_of("#ff0080"), color_of("rgb(255, 0, 128)"));
        assert_eq!(color_of("#12345678"), color_of("rgb(18 52 86 / 0.4706)"));
    }

    #[test]
    fn hsl_parses_and_normalizes_hue() {
        assert_eq!(color_of("hsl(0, 100%, 50%)"), Some(Color::from_rgba(255, 0, 0, 255)));
        assert_eq!(color_of("hsl(450, 100%, 50%)"), color_of("hsl(90, 100%, 50%)"));
    }

    #[test]
    fn hsl_accepts_angle_dimension_hues() {
        assert_eq!(color_of("hsl(0.25turn 100% 50%)"), color_of("hsl(90 100% 50%)"));
    }

    #[test]
    fn hsla_alpha_applies() {
        assert_eq!(color_of("hsla(0, 100%, 50%, 0.5)"), Some(Color::from_rgba(255, 0, 0, 128)));
    }

    #[test]
    fn hwb_parses_and_collapses_overfull_white_black() {
        assert_eq!(color_of("hwb(0 0% 0%)"), Some(Color::from_rgba(255, 0, 0, 255)));
        assert_eq!(color_of("hwb(120 75% 25%)"), Some(Color::from_rgba(191, 191, 191, 255)));
    }

    #[test]
    fn quirks_mode_accepts_unprefixed_hex_colors() {
        let quirks = ValueContext { quirks: true, color_resolver: None };
        let parsed = parse_value_in(PropertyId::Color, &components("ff0000"), &quirks);
        assert_eq!(parsed, Some(PropertyValue::Color(Color::from_rgba(255, 0, 0, 255))));
        let numeric = parse_value_in(PropertyId::Color, &components("123456"), &quirks);
        assert_eq!(numeric, Some(PropertyValue::Color(Color::from_hex("123456").unwrap())));
        // Standards mode rejects both.
        assert_eq!(color_of("ff0000"), None);
        assert_eq!(color_of("123456"), None);
    }

    #[test]
    fn color_resolver_supplies_system_colors() {
        let resolve = |name: &str| {
            (name == "canvas").then(|| Color::from_rgba(250, 250, 250, 255))
        };
        let ctx = ValueContext { quirks: false, color_resolver: Some(&resolve) };
        let parsed = parse_value_in(PropertyId::Color, &components("canvas"), &ctx);
        assert_eq!(parsed, Some(PropertyValue::Color(Color::from_rgba(250, 250, 250, 255))));
        assert_eq!(color_of("canvas"), None);
    }

    #[test]
    fn parses_length_dimension() {
        let value = parse_value(PropertyId::Width, &components("10px"));
        assert!(matches!(value, Some(PropertyValue::Dimension(d)) if d.unit == Unit::Px));
    }

    #[test]
    fn bare_number_is_a_length_only_in_quirks_mode() {
        assert_eq!(parse_value(PropertyId::Width, &components("100")), None);
        let quirks = ValueContext { quirks: true, color_resolver: None };
        let parsed = parse_value_in(PropertyId::Width, &components("100"), &quirks);
        assert!(matches!(parsed, Some(PropertyValue::Dimension(d)) if d.unit == Unit::Px));
    }

    #[test]
    fn calc_value_compiles_to_an_interned_program() {
        let a = parse_value(PropertyId::Width, &components("calc(10px + 2px)"));
        let b = parse_value(PropertyId::Width, &components("calc(10px + 2px)"));
        let (Some(PropertyValue::Calc(a)), Some(PropertyValue::Calc(b))) = (a, b) else {
            panic!("expected calc values");
        };
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn width_accepts_auto_but_color_does_not() {
        assert_eq!(parse_value(PropertyId::Width, &components("auto")), Some(PropertyValue::Auto));
        assert_eq!(parse_value(PropertyId::Color, &components("auto")), None);
    }

    #[test]
    fn line_width_keywords_map_to_fixed_px() {
        let thin = parse_value(PropertyId::BorderTopWidth, &components("thin"));
        assert!(matches!(thin, Some(PropertyValue::Dimension(d)) if d.value.to_f64() == 1.0));
        let thick = parse_value(PropertyId::OutlineWidth, &components("thick"));
        assert!(matches!(thick, Some(PropertyValue::Dimension(d)) if d.value.to_f64() == 5.0));
    }

    #[test]
    fn font_family_coalesces_multi_word_names() {
        let parsed = parse_value(PropertyId::FontFamily, &components("Times New Roman, serif"));
        let Some(PropertyValue::List(families)) = parsed else { panic!("expected a list") };
        assert_eq!(families.len(), 2);
        assert_eq!(families[0].as_str(), "Times New Roman");
        assert_eq!(families[1].as_str(), "serif");
    }

    #[test]
    fn font_family_rejects_reserved_words_in_bare_name_runs() {
        assert_eq!(parse_value(PropertyId::FontFamily, &components("Times inherit")), None);
        assert_eq!(parse_value(PropertyId::FontFamily, &components("Fancy serif")), None);
    }

    #[test]
    fn counter_increment_pairs_names_with_deltas() {
        let parsed = parse_value(PropertyId::CounterIncrement, &components("section 2 page"));
        let Some(PropertyValue::Counters(counters)) = parsed else { panic!("expected counters") };
        assert_eq!(counters.len(), 2);
        assert_eq!(counters[0].1, 2);
        assert_eq!(counters[1].1, 1);
    }

    #[test]
    fn clip_rect_reads_four_sides() {
        let parsed = parse_value(PropertyId::Clip, &components("rect(1px, 2px, 3px, 4px)"));
        let Some(PropertyValue::Rect(sides)) = parsed else { panic!("expected a rect") };
        assert_eq!(sides[3].value.to_f64(), 4.0);
    }

    #[test]
    fn quotes_require_even_string_count() {
        assert!(parse_value(PropertyId::Quotes, &components("\"<\" \">\"")).is_some());
        assert_eq!(parse_value(PropertyId::Quotes, &components("\"<\"")), None);
    }

    #[test]
    fn margin_shorthand_two_values_sets_vertical_and_horizontal() {
        let expanded = expand_shorthand("margin", &components("1px 2px")).unwrap();
        assert_eq!(expanded.len(), 4);
        assert_eq!(expanded[0].0, PropertyId::MarginTop);
        assert_eq!(expanded[1].0, PropertyId::MarginRight);
        assert_eq!(expanded[2].0, PropertyId::MarginBottom);
        assert_eq!(expanded[3].0, PropertyId::MarginLeft);
        assert_eq!(expanded[0].1, expanded[2].1);
        assert_eq!(expanded[1].1, expanded[3].1);
    }

    #[test]
    fn border_top_shorthand_splits_width_style_color() {
        let expanded = expand_shorthand("border-top", &components("1px solid red")).unwrap();
        assert_eq!(expanded.len(), 3);
        assert!(expanded.iter().any(|(id, _)| *id == PropertyId::BorderTopWidth));
        assert!(expanded.iter().any(|(id, _)| *id == PropertyId::BorderTopStyle));
        assert!(expanded.iter().any(|(id, _)| *id == PropertyId::BorderTopColor));
    }

    #[test]
    fn outline_shorthand_expands_like_a_border_side() {
        let expanded = expand_shorthand("outline", &components("2px dotted blue")).unwrap();
        assert_eq!(expanded.len(), 3);
        assert!(expanded.iter().any(|(id, _)| *id == PropertyId::OutlineStyle));
    }

    #[test]
    fn columns_shorthand_assigns_width_and_count() {
        let expanded = expand_shorthand("columns", &components("12em 2")).unwrap();
        assert!(expanded.iter().any(|(id, _)| *id == PropertyId::ColumnWidth));
        assert!(expanded.iter().any(|(id, _)| *id == PropertyId::ColumnCount));
    }

    #[test]
    fn font_shorthand_positions_size_and_family() {
        let expanded = expand_shorthand("font", &components("italic bold 12px/1.5 serif")).unwrap();
        assert!(expanded.iter().any(|(id, _)| *id == PropertyId::FontStyle));
        assert!(expanded.iter().any(|(id, _)| *id == PropertyId::FontWeight));
        assert!(expanded.iter().any(|(id, _)| *id == PropertyId::FontSize));
        assert!(expanded.iter().any(|(id, _)| *id == PropertyId::LineHeight));
        assert!(expanded.iter().any(|(id, _)| *id == PropertyId::FontFamily));
    }

    #[test]
    fn flex_none_expands_to_zero_zero_auto() {
        let expanded = expand_shorthand("flex", &components("none")).unwrap();
        assert_eq!(expanded.len(), 3);
        assert_eq!(expanded[2].0, PropertyId::FlexBasis);
    }

    #[test]
    fn unknown_shorthand_returns_none() {
        assert!(expand_shorthand("not-a-shorthand", &components("1px")).is_none());
    }

    #[test]
    fn font_weight_keyword_normal_resolves_to_400() {
        let value = parse_value(PropertyId::FontWeight, &components("normal"));
        assert_eq!(value, Some(PropertyValue::Number(Fixed::from_f64(400.0))));
    }
}
