//! Hash-consed, reference-counted computed style storage.
//!
//! Most elements on a page end up with byte-identical computed styles
//! (every `<p>` with no matching rules gets the same style, say), so
//! rather than allocate one style record per element, every distinct
//! style is interned once and shared via a reference-counted handle. A
//! computed style splits into a "normal" block (properties set on most
//! elements) and an "uncommon" block (`cursor`, `clip`, `column-*`,
//! `letter-spacing`, `outline-color`/`-width`, `writing-mode`,
//! `break-*`, `content`, counters) that almost every element shares at
//! its all-initial value, each behind its own hash table (5101 and 3037
//! buckets — both prime, to spread hash collisions evenly). The tables
//! hold [`Weak`] entries: `Rc` strong counts are the record refcounts,
//! and a record whose last handle drops falls out of the table on the
//! next intern.

use crate::color::Color;
use crate::properties::{Group, PropertyId, PropertyValue, PROPERTY_TABLE};
use crate::unit::Dimension;
use koala_common::atom::Atom;
use koala_common::fixed::Fixed;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// The densely-populated half of a computed style: properties set on
/// most elements, stored inline rather than behind a sentinel-shared
/// pointer.
#[derive(Debug, Clone, PartialEq, Hash)]
struct Normal {
    color: Color,
    background_color: Color,
    background_image: PropertyValue,
    display: Atom,
    position: Atom,
    float: Atom,
    clear: Atom,
    visibility: Atom,
    overflow: Atom,
    text_align: Atom,
    text_decoration: Atom,
    text_transform: Atom,
    text_indent: Dimension,
    white_space: Atom,
    vertical_align: Atom,
    font_family: Vec<Atom>,
    font_size: Dimension,
    font_style: Atom,
    font_weight: Fixed,
    line_height: PropertyValue,
    width: PropertyValue,
    height: PropertyValue,
    min_width: PropertyValue,
    min_height: PropertyValue,
    max_width: PropertyValue,
    max_height: PropertyValue,
    top: PropertyValue,
    right: PropertyValue,
    bottom: PropertyValue,
    left: PropertyValue,
    z_index: PropertyValue,
    margin_top: PropertyValue,
    margin_right: PropertyValue,
    margin_bottom: PropertyValue,
    margin_left: PropertyValue,
    padding_top: Dimension,
    padding_right: Dimension,
    padding_bottom: Dimension,
    padding_left: Dimension,
    border_top_width: Dimension,
    border_right_width: Dimension,
    border_bottom_width: Dimension,
    border_left_width: Dimension,
    border_top_style: Atom,
    border_right_style: Atom,
    border_bottom_style: Atom,
    border_left_style: Atom,
    border_top_color: Color,
    border_right_color: Color,
    border_bottom_color: Color,
    border_left_color: Color,
    outline_style: Atom,
    list_style_type: Atom,
    list_style_position: Atom,
    list_style_image: PropertyValue,
    quotes: Vec<Atom>,
    flex_grow: Fixed,
    flex_shrink: Fixed,
    flex_basis: PropertyValue,
}

/// The sparsely-populated half of a computed style, per
/// [`Group::Uncommon`] — rare enough on a typical page that most
/// elements share the all-initial instance.
#[derive(Debug, Clone, PartialEq, Hash)]
struct Uncommon {
    cursor: Atom,
    letter_spacing: PropertyValue,
    word_spacing: PropertyValue,
    outline_color: Color,
    outline_width: Dimension,
    writing_mode: Atom,
    break_before: Atom,
    break_after: Atom,
    break_inside: Atom,
    clip: PropertyValue,
    column_count: PropertyValue,
    column_width: PropertyValue,
    content: PropertyValue,
    counter_increment: PropertyValue,
    counter_reset: PropertyValue,
}

fn initial_normal() -> Normal {
    Normal {
        color: expect_color(PropertyId::Color),
        background_color: expect_color(PropertyId::BackgroundColor),
        background_image: crate::properties::initial_value(PropertyId::BackgroundImage),
        display: expect_keyword(PropertyId::Display),
        position: expect_keyword(PropertyId::Position),
        float: expect_keyword(PropertyId::Float),
        clear: expect_keyword(PropertyId::Clear),
        visibility: expect_keyword(PropertyId::Visibility),
        overflow: expect_keyword(PropertyId::Overflow),
        text_align: expect_keyword(PropertyId::TextAlign),
        text_decoration: expect_keyword(PropertyId::TextDecoration),
        text_transform: expect_keyword(PropertyId::TextTransform),
        text_indent: expect_dimension(PropertyId::TextIndent),
        white_space: expect_keyword(PropertyId::WhiteSpace),
        vertical_align: expect_keyword(PropertyId::VerticalAlign),
        font_family: expect_list(PropertyId::FontFamily),
        font_size: expect_dimension(PropertyId::FontSize),
        font_style: expect_keyword(PropertyId::FontStyle),
        font_weight: expect_number(PropertyId::FontWeight),
        line_height: crate::properties::initial_value(PropertyId::LineHeight),
        width: crate::properties::initial_value(PropertyId::Width),
        height: crate::properties::initial_value(PropertyId::Height),
        min_width: crate::properties::initial_value(PropertyId::MinWidth),
        min_height: crate::properties::initial_value(PropertyId::MinHeight),
        max_width: crate::properties::initial_value(PropertyId::MaxWidth),
        max_height: crate::properties::initial_value(PropertyId::MaxHeight),
        top: crate::properties::initial_value(PropertyId::Top),
        right: crate::properties::initial_value(PropertyId::Right),
        bottom: crate::properties::initial_value(PropertyId::Bottom),
        left: crate::properties::initial_value(PropertyId::Left),
        z_index: crate::properties::initial_value(PropertyId::ZIndex),
        margin_top: crate::properties::initial_value(PropertyId::MarginTop),
        margin_right: crate::properties::initial_value(PropertyId::MarginRight),
        margin_bottom: crate::properties::initial_value(PropertyId::MarginBottom),
        margin_left: crate::properties::initial_value(PropertyId::MarginLeft),
        padding_top: expect_dimension(PropertyId::PaddingTop),
        padding_right: expect_dimension(PropertyId::PaddingRight),
        padding_bottom: expect_dimension(PropertyId::PaddingBottom),
        padding_left: expect_dimension(PropertyId::PaddingLeft),
        border_top_width: expect_dimension(PropertyId::BorderTopWidth),
        border_right_width: expect_dimension(PropertyId::BorderRightWidth),
        border_bottom_width: expect_dimension(PropertyId::BorderBottomWidth),
        border_left_width: expect_dimension(PropertyId::BorderLeftWidth),
        border_top_style: expect_keyword(PropertyId::BorderTopStyle),
        border_right_style: expect_keyword(PropertyId::BorderRightStyle),
        border_bottom_style: expect_keyword(PropertyId::BorderBottomStyle),
        border_left_style: expect_keyword(PropertyId::BorderLeftStyle),
        border_top_color: expect_color(PropertyId::BorderTopColor),
        border_right_color: expect_color(PropertyId::BorderRightColor),
        border_bottom_color: expect_color(PropertyId::BorderBottomColor),
        border_left_color: expect_color(PropertyId::BorderLeftColor),
        outline_style: expect_keyword(PropertyId::OutlineStyle),
        list_style_type: expect_keyword(PropertyId::ListStyleType),
        list_style_position: expect_keyword(PropertyId::ListStylePosition),
        list_style_image: crate::properties::initial_value(PropertyId::ListStyleImage),
        quotes: expect_list(PropertyId::Quotes),
        flex_grow: expect_number(PropertyId::FlexGrow),
        flex_shrink: expect_number(PropertyId::FlexShrink),
        flex_basis: crate::properties::initial_value(PropertyId::FlexBasis),
    }
}

fn initial_uncommon() -> Uncommon {
    Uncommon {
        cursor: expect_keyword(PropertyId::Cursor),
        letter_spacing: crate::properties::initial_value(PropertyId::LetterSpacing),
        word_spacing: crate::properties::initial_value(PropertyId::WordSpacing),
        outline_color: expect_color(PropertyId::OutlineColor),
        outline_width: expect_dimension(PropertyId::OutlineWidth),
        writing_mode: expect_keyword(PropertyId::WritingMode),
        break_before: expect_keyword(PropertyId::BreakBefore),
        break_after: expect_keyword(PropertyId::BreakAfter),
        break_inside: expect_keyword(PropertyId::BreakInside),
        clip: crate::properties::initial_value(PropertyId::Clip),
        column_count: crate::properties::initial_value(PropertyId::ColumnCount),
        column_width: crate::properties::initial_value(PropertyId::ColumnWidth),
        content: crate::properties::initial_value(PropertyId::Content),
        counter_increment: crate::properties::initial_value(PropertyId::CounterIncrement),
        counter_reset: crate::properties::initial_value(PropertyId::CounterReset),
    }
}

fn expect_keyword(id: PropertyId) -> Atom {
    match crate::properties::initial_value(id) {
        PropertyValue::Keyword(a) => a,
        PropertyValue::Auto => Atom::new("auto"),
        PropertyValue::Normal => Atom::new("normal"),
        PropertyValue::None => Atom::new("none"),
        other => panic!("property {id:?} initial value {other:?} is not a keyword"),
    }
}

fn expect_dimension(id: PropertyId) -> Dimension {
    match crate::properties::initial_value(id) {
        PropertyValue::Dimension(d) => d,
        other => panic!("property {id:?} initial value {other:?} is not a dimension"),
    }
}

fn expect_color(id: PropertyId) -> Color {
    match crate::properties::initial_value(id) {
        PropertyValue::Color(c) => c,
        other => panic!("property {id:?} initial value {other:?} is not a color"),
    }
}

fn expect_number(id: PropertyId) -> Fixed {
    match crate::properties::initial_value(id) {
        PropertyValue::Number(n) => n,
        other => panic!("property {id:?} initial value {other:?} is not a number"),
    }
}

fn expect_list(id: PropertyId) -> Vec<Atom> {
    match crate::properties::initial_value(id) {
        PropertyValue::List(l) => l,
        other => panic!("property {id:?} initial value {other:?} is not a list"),
    }
}

thread_local! {
    static NORMAL_TABLE: RefCell<HashMap<u64, Vec<Weak<Normal>>>> = RefCell::new(HashMap::new());
    static UNCOMMON_TABLE: RefCell<HashMap<u64, Vec<Weak<Uncommon>>>> = RefCell::new(HashMap::new());
}

/// Prime bucket counts — chosen prime so hashes that happen to share low
/// bits still spread across buckets, and coprime with common struct
/// sizes.
const NORMAL_BUCKETS: u64 = 5101;
const UNCOMMON_BUCKETS: u64 = 3037;

/// FNV-1a, folded byte by byte over whatever the payload's `Hash` impl
/// feeds it — for [`Normal`]/[`Uncommon`], every field in declaration
/// order, which is the packed-payload rollup the arena keys on. Cheap
/// (one xor and one multiply per byte, no allocation) and agreeing with
/// `PartialEq`, which the dedup in [`intern_bucketed`] relies on.
struct Fnv(u64);

impl Default for Fnv {
    fn default() -> Self {
        Self(0xcbf2_9ce4_8422_2325)
    }
}

impl std::hash::Hasher for Fnv {
    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.0 ^= u64::from(byte);
            self.0 = self.0.wrapping_mul(0x100_0000_01b3);
        }
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

fn hash_payload<T: std::hash::Hash>(value: &T) -> u64 {
    use std::hash::Hasher;
    let mut hasher = Fnv::default();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Intern into a weak-keyed bucket table: hand back the existing record
/// when an identical one is live, otherwise insert. Expired entries
/// (records whose last strong handle dropped) are pruned from the bucket
/// on the way through, so release-to-zero removes a record from the
/// arena, just lazily.
fn intern_bucketed<T: PartialEq + std::hash::Hash>(
    table: &RefCell<HashMap<u64, Vec<Weak<T>>>>,
    bucket_count: u64,
    value: T,
) -> Rc<T> {
    let hash = hash_payload(&value) % bucket_count;
    let mut table = table.borrow_mut();
    let bucket = table.entry(hash).or_default();
    bucket.retain(|weak| weak.strong_count() > 0);
    for weak in bucket.iter() {
        if let Some(existing) = weak.upgrade() {
            if *existing == value {
                return existing;
            }
        }
    }
    let rc = Rc::new(value);
    bucket.push(Rc::downgrade(&rc));
    rc
}

fn intern_normal(value: Normal) -> Rc<Normal> {
    NORMAL_TABLE.with(|table| intern_bucketed(table, NORMAL_BUCKETS, value))
}

fn intern_uncommon(value: Uncommon) -> Rc<Uncommon> {
    UNCOMMON_TABLE.with(|table| intern_bucketed(table, UNCOMMON_BUCKETS, value))
}

/// Number of live interned (normal, uncommon) records on this thread.
///
/// Exposed so tests can assert the arena's lifecycle invariant: dropping
/// every handle from a selection returns both counts to their prior
/// values.
#[must_use]
pub fn arena_live_counts() -> (usize, usize) {
    let normal = NORMAL_TABLE.with(|table| {
        table
            .borrow()
            .values()
            .flatten()
            .filter(|w| w.strong_count() > 0)
            .count()
    });
    let uncommon = UNCOMMON_TABLE.with(|table| {
        table
            .borrow()
            .values()
            .flatten()
            .filter(|w| w.strong_count() > 0)
            .count()
    });
    (normal, uncommon)
}

/// A fully resolved, interned computed style.
///
/// Cloning a `ComputedStyle` is a pair of `Rc` clones — two elements with
/// the same resolved style (the overwhelmingly common case on a real
/// page) share the same backing allocations, and [`ComputedStyle::ptr_eq`]
/// holds exactly when the two styles are value-equal.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    normal: Rc<Normal>,
    uncommon: Rc<Uncommon>,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            normal: intern_normal(initial_normal()),
            uncommon: intern_uncommon(initial_uncommon()),
        }
    }
}

impl ComputedStyle {
    /// Whether `self` and `other` are the same interned records. Because
    /// every record is hash-consed, this is equivalent to value equality
    /// and is the comparison selection results should be checked with.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.normal, &other.normal) && Rc::ptr_eq(&self.uncommon, &other.uncommon)
    }

    /// The computed `color`.
    #[must_use]
    pub fn color(&self) -> Color {
        self.normal.color
    }

    /// The computed `background-color`.
    #[must_use]
    pub fn background_color(&self) -> Color {
        self.normal.background_color
    }

    /// The computed `background-image`.
    #[must_use]
    pub fn background_image(&self) -> &PropertyValue {
        &self.normal.background_image
    }

    /// The computed `display` keyword.
    #[must_use]
    pub fn display(&self) -> &str {
        self.normal.display.as_str()
    }

    /// The computed `font-size`, always in px after cascade.
    #[must_use]
    pub fn font_size(&self) -> Dimension {
        self.normal.font_size
    }

    /// The computed `font-family` list, most preferred first.
    #[must_use]
    pub fn font_family(&self) -> &[Atom] {
        &self.normal.font_family
    }

    /// The computed `font-weight` as its numeric value.
    #[must_use]
    pub fn font_weight(&self) -> Fixed {
        self.normal.font_weight
    }

    /// The computed `line-height`.
    #[must_use]
    pub fn line_height(&self) -> &PropertyValue {
        &self.normal.line_height
    }

    /// The computed `cursor` keyword.
    #[must_use]
    pub fn cursor(&self) -> &str {
        self.uncommon.cursor.as_str()
    }

    /// The computed `letter-spacing`.
    #[must_use]
    pub fn letter_spacing(&self) -> &PropertyValue {
        &self.uncommon.letter_spacing
    }

    /// The computed `word-spacing`.
    #[must_use]
    pub fn word_spacing(&self) -> &PropertyValue {
        &self.uncommon.word_spacing
    }

    /// The computed `outline-color`.
    #[must_use]
    pub fn outline_color(&self) -> Color {
        self.uncommon.outline_color
    }

    /// The computed `outline-style` keyword.
    #[must_use]
    pub fn outline_style(&self) -> &str {
        self.normal.outline_style.as_str()
    }

    /// The computed `outline-width`.
    #[must_use]
    pub fn outline_width(&self) -> Dimension {
        self.uncommon.outline_width
    }

    /// The computed `writing-mode` keyword.
    #[must_use]
    pub fn writing_mode(&self) -> &str {
        self.uncommon.writing_mode.as_str()
    }

    /// The computed `column-count`.
    #[must_use]
    pub fn column_count(&self) -> &PropertyValue {
        &self.uncommon.column_count
    }

    /// The computed `clip` region.
    #[must_use]
    pub fn clip(&self) -> &PropertyValue {
        &self.uncommon.clip
    }

    /// The computed `content` items.
    #[must_use]
    pub fn content(&self) -> &PropertyValue {
        &self.uncommon.content
    }

    /// The computed `quotes` open/close string pairs, flattened.
    #[must_use]
    pub fn quotes(&self) -> &[Atom] {
        &self.normal.quotes
    }

    /// The computed `margin-top`.
    #[must_use]
    pub fn margin_top(&self) -> &PropertyValue {
        &self.normal.margin_top
    }

    /// The computed `margin-right`.
    #[must_use]
    pub fn margin_right(&self) -> &PropertyValue {
        &self.normal.margin_right
    }

    /// The computed `margin-bottom`.
    #[must_use]
    pub fn margin_bottom(&self) -> &PropertyValue {
        &self.normal.margin_bottom
    }

    /// The computed `margin-left`.
    #[must_use]
    pub fn margin_left(&self) -> &PropertyValue {
        &self.normal.margin_left
    }

    /// The computed `padding-top`.
    #[must_use]
    pub fn padding_top(&self) -> Dimension {
        self.normal.padding_top
    }

    /// The computed `width`.
    #[must_use]
    pub fn width(&self) -> &PropertyValue {
        &self.normal.width
    }

    /// The computed `height`.
    #[must_use]
    pub fn height(&self) -> &PropertyValue {
        &self.normal.height
    }

    /// The computed `border-top-width`.
    #[must_use]
    pub fn border_top_width(&self) -> Dimension {
        self.normal.border_top_width
    }

    /// The computed `border-top-style` keyword.
    #[must_use]
    pub fn border_top_style(&self) -> &str {
        self.normal.border_top_style.as_str()
    }

    /// The computed `border-top-color`.
    #[must_use]
    pub fn border_top_color(&self) -> Color {
        self.normal.border_top_color
    }

    /// The computed `list-style-type` keyword.
    #[must_use]
    pub fn list_style_type(&self) -> &Atom {
        &self.normal.list_style_type
    }

    /// Render `ordinal` as this element's list marker text, or `None` for
    /// `list-style-type: none`. Thin wrapper over
    /// [`crate::list_style::format_counter`].
    #[must_use]
    pub fn format_list_marker(&self, ordinal: i64) -> Option<String> {
        crate::list_style::format_counter(self.list_style_type(), ordinal)
    }

    /// Buffer-filling variant of [`Self::format_list_marker`] with
    /// [`crate::list_style::format_into`]'s semantics: the marker's full
    /// byte length is returned even when `buf` is too small.
    #[must_use]
    pub fn format_list_marker_into(&self, ordinal: i64, buf: &mut [u8]) -> usize {
        crate::list_style::format_into(self.list_style_type(), ordinal, buf)
    }

    /// Number of computed styles sharing this style's normal block's
    /// backing allocation (including this one).
    #[must_use]
    pub fn normal_share_count(&self) -> usize {
        Rc::strong_count(&self.normal)
    }

    /// [§ 7 Inheritance](https://www.w3.org/TR/css-cascade-4/#inheriting):
    /// start a child's style from the parent's inherited properties, with
    /// every non-inherited property reset to its initial value.
    #[must_use]
    pub fn inherited(&self) -> Self {
        let mut normal = initial_normal();
        normal.color = self.normal.color;
        normal.visibility = self.normal.visibility.clone();
        normal.text_align = self.normal.text_align.clone();
        normal.text_transform = self.normal.text_transform.clone();
        normal.text_indent = self.normal.text_indent;
        normal.white_space = self.normal.white_space.clone();
        normal.font_family = self.normal.font_family.clone();
        normal.font_size = self.normal.font_size;
        normal.font_style = self.normal.font_style.clone();
        normal.font_weight = self.normal.font_weight;
        normal.line_height = self.normal.line_height.clone();
        normal.list_style_type = self.normal.list_style_type.clone();
        normal.list_style_position = self.normal.list_style_position.clone();
        normal.list_style_image = self.normal.list_style_image.clone();
        normal.quotes = self.normal.quotes.clone();

        let mut uncommon = initial_uncommon();
        uncommon.cursor = self.uncommon.cursor.clone();
        uncommon.letter_spacing = self.uncommon.letter_spacing.clone();
        uncommon.word_spacing = self.uncommon.word_spacing.clone();
        uncommon.writing_mode = self.uncommon.writing_mode.clone();

        Self {
            normal: intern_normal(normal),
            uncommon: intern_uncommon(uncommon),
        }
    }

    /// Apply one resolved `(property, value)` pair, producing a new
    /// interned style (this style itself is never mutated in place —
    /// every other element still holding it is unaffected).
    #[must_use]
    pub fn with_property(&self, id: PropertyId, value: PropertyValue) -> Self {
        match id.meta().group {
            Group::Normal => {
                let mut normal = (*self.normal).clone();
                apply_normal(&mut normal, id, value);
                Self {
                    normal: intern_normal(normal),
                    uncommon: self.uncommon.clone(),
                }
            }
            Group::Uncommon => {
                let mut uncommon = (*self.uncommon).clone();
                apply_uncommon(&mut uncommon, id, value);
                Self {
                    normal: self.normal.clone(),
                    uncommon: intern_uncommon(uncommon),
                }
            }
        }
    }

    /// Read back a property as a [`PropertyValue`], for the cascade's
    /// `inherit` keyword and for tests. Scalar-typed fields are widened
    /// back into the enum.
    #[must_use]
    pub fn property_value(&self, id: PropertyId) -> PropertyValue {
        use PropertyValue as V;
        let n = &self.normal;
        let u = &self.uncommon;
        match id {
            PropertyId::Color => V::Color(n.color),
            PropertyId::BackgroundColor => V::Color(n.background_color),
            PropertyId::BackgroundImage => n.background_image.clone(),
            PropertyId::Display => V::Keyword(n.display.clone()),
            PropertyId::Position => V::Keyword(n.position.clone()),
            PropertyId::Float => V::Keyword(n.float.clone()),
            PropertyId::Clear => V::Keyword(n.clear.clone()),
            PropertyId::Visibility => V::Keyword(n.visibility.clone()),
            PropertyId::Overflow => V::Keyword(n.overflow.clone()),
            PropertyId::TextAlign => V::Keyword(n.text_align.clone()),
            PropertyId::TextDecoration => V::Keyword(n.text_decoration.clone()),
            PropertyId::TextTransform => V::Keyword(n.text_transform.clone()),
            PropertyId::TextIndent => V::Dimension(n.text_indent),
            PropertyId::WhiteSpace => V::Keyword(n.white_space.clone()),
            PropertyId::VerticalAlign => V::Keyword(n.vertical_align.clone()),
            PropertyId::FontFamily => V::List(n.font_family.clone()),
            PropertyId::FontSize => V::Dimension(n.font_size),
            PropertyId::FontStyle => V::Keyword(n.font_style.clone()),
            PropertyId::FontWeight => V::Number(n.font_weight),
            PropertyId::LineHeight => n.line_height.clone(),
            PropertyId::Width => n.width.clone(),
            PropertyId::Height => n.height.clone(),
            PropertyId::MinWidth => n.min_width.clone(),
            PropertyId::MinHeight => n.min_height.clone(),
            PropertyId::MaxWidth => n.max_width.clone(),
            PropertyId::MaxHeight => n.max_height.clone(),
            PropertyId::Top => n.top.clone(),
            PropertyId::Right => n.right.clone(),
            PropertyId::Bottom => n.bottom.clone(),
            PropertyId::Left => n.left.clone(),
            PropertyId::ZIndex => n.z_index.clone(),
            PropertyId::MarginTop => n.margin_top.clone(),
            PropertyId::MarginRight => n.margin_right.clone(),
            PropertyId::MarginBottom => n.margin_bottom.clone(),
            PropertyId::MarginLeft => n.margin_left.clone(),
            PropertyId::PaddingTop => V::Dimension(n.padding_top),
            PropertyId::PaddingRight => V::Dimension(n.padding_right),
            PropertyId::PaddingBottom => V::Dimension(n.padding_bottom),
            PropertyId::PaddingLeft => V::Dimension(n.padding_left),
            PropertyId::BorderTopWidth => V::Dimension(n.border_top_width),
            PropertyId::BorderRightWidth => V::Dimension(n.border_right_width),
            PropertyId::BorderBottomWidth => V::Dimension(n.border_bottom_width),
            PropertyId::BorderLeftWidth => V::Dimension(n.border_left_width),
            PropertyId::BorderTopStyle => V::Keyword(n.border_top_style.clone()),
            PropertyId::BorderRightStyle => V::Keyword(n.border_right_style.clone()),
            PropertyId::BorderBottomStyle => V::Keyword(n.border_bottom_style.clone()),
            PropertyId::BorderLeftStyle => V::Keyword(n.border_left_style.clone()),
            PropertyId::BorderTopColor => V::Color(n.border_top_color),
            PropertyId::BorderRightColor => V::Color(n.border_right_color),
            PropertyId::BorderBottomColor => V::Color(n.border_bottom_color),
            PropertyId::BorderLeftColor => V::Color(n.border_left_color),
            PropertyId::OutlineColor => V::Color(u.outline_color),
            PropertyId::OutlineStyle => V::Keyword(n.outline_style.clone()),
            PropertyId::OutlineWidth => V::Dimension(u.outline_width),
            PropertyId::Cursor => V::Keyword(u.cursor.clone()),
            PropertyId::ListStyleType => V::Keyword(n.list_style_type.clone()),
            PropertyId::ListStylePosition => V::Keyword(n.list_style_position.clone()),
            PropertyId::ListStyleImage => n.list_style_image.clone(),
            PropertyId::LetterSpacing => u.letter_spacing.clone(),
            PropertyId::WordSpacing => u.word_spacing.clone(),
            PropertyId::WritingMode => V::Keyword(u.writing_mode.clone()),
            PropertyId::BreakBefore => V::Keyword(u.break_before.clone()),
            PropertyId::BreakAfter => V::Keyword(u.break_after.clone()),
            PropertyId::BreakInside => V::Keyword(u.break_inside.clone()),
            PropertyId::Clip => u.clip.clone(),
            PropertyId::ColumnCount => u.column_count.clone(),
            PropertyId::ColumnWidth => u.column_width.clone(),
            PropertyId::Quotes => V::List(n.quotes.clone()),
            PropertyId::Content => u.content.clone(),
            PropertyId::CounterIncrement => u.counter_increment.clone(),
            PropertyId::CounterReset => u.counter_reset.clone(),
            PropertyId::FlexGrow => V::Number(n.flex_grow),
            PropertyId::FlexShrink => V::Number(n.flex_shrink),
            PropertyId::FlexBasis => n.flex_basis.clone(),
        }
    }
}

fn as_keyword(value: PropertyValue) -> Atom {
    match value {
        PropertyValue::Keyword(a) => a,
        PropertyValue::Auto => Atom::new("auto"),
        PropertyValue::Normal => Atom::new("normal"),
        PropertyValue::None => Atom::new("none"),
        _ => Atom::new("initial"),
    }
}

fn as_dimension(value: PropertyValue, fallback: Dimension) -> Dimension {
    match value {
        PropertyValue::Dimension(d) => d,
        _ => fallback,
    }
}

fn as_color(value: PropertyValue, fallback: Color) -> Color {
    match value {
        PropertyValue::Color(c) => c,
        _ => fallback,
    }
}

fn apply_normal(normal: &mut Normal, id: PropertyId, value: PropertyValue) {
    match id {
        PropertyId::Color => normal.color = as_color(value, normal.color),
        PropertyId::BackgroundColor => normal.background_color = as_color(value, normal.background_color),
        PropertyId::BackgroundImage => normal.background_image = value,
        PropertyId::Display => normal.display = as_keyword(value),
        PropertyId::Position => normal.position = as_keyword(value),
        PropertyId::Float => normal.float = as_keyword(value),
        PropertyId::Clear => normal.clear = as_keyword(value),
        PropertyId::Visibility => normal.visibility = as_keyword(value),
        PropertyId::Overflow => normal.overflow = as_keyword(value),
        PropertyId::TextAlign => normal.text_align = as_keyword(value),
        PropertyId::TextDecoration => normal.text_decoration = as_keyword(value),
        PropertyId::TextTransform => normal.text_transform = as_keyword(value),
        PropertyId::TextIndent => normal.text_indent = as_dimension(value, normal.text_indent),
        PropertyId::WhiteSpace => normal.white_space = as_keyword(value),
        PropertyId::VerticalAlign => normal.vertical_align = as_keyword(value),
        PropertyId::FontFamily => {
            if let PropertyValue::List(list) = value {
                normal.font_family = list;
            }
        }
        PropertyId::FontSize => normal.font_size = as_dimension(value, normal.font_size),
        PropertyId::FontStyle => normal.font_style = as_keyword(value),
        PropertyId::FontWeight => {
            if let PropertyValue::Number(n) = value {
                normal.font_weight = n;
            }
        }
        PropertyId::LineHeight => normal.line_height = value,
        PropertyId::Width => normal.width = value,
        PropertyId::Height => normal.height = value,
        PropertyId::MinWidth => normal.min_width = value,
        PropertyId::MinHeight => normal.min_height = value,
        PropertyId::MaxWidth => normal.max_width = value,
        PropertyId::MaxHeight => normal.max_height = value,
        PropertyId::Top => normal.top = value,
        PropertyId::Right => normal.right = value,
        PropertyId::Bottom => normal.bottom = value,
        PropertyId::Left => normal.left = value,
        PropertyId::ZIndex => normal.z_index = value,
        PropertyId::MarginTop => normal.margin_top = value,
        PropertyId::MarginRight => normal.margin_right = value,
        PropertyId::MarginBottom => normal.margin_bottom = value,
        PropertyId::MarginLeft => normal.margin_left = value,
        PropertyId::PaddingTop => normal.padding_top = as_dimension(value, normal.padding_top),
        PropertyId::PaddingRight => normal.padding_right = as_dimension(value, normal.padding_right),
        PropertyId::PaddingBottom => normal.padding_bottom = as_dimension(value, normal.padding_bottom),
        PropertyId::PaddingLeft => normal.padding_left = as_dimension(value, normal.padding_left),
        PropertyId::BorderTopWidth => normal.border_top_width = as_dimension(value, normal.border_top_width),
        PropertyId::BorderRightWidth => normal.border_right_width = as_dimension(value, normal.border_right_width),
        PropertyId::BorderBottomWidth => normal.border_bottom_width = as_dimension(value, normal.border_bottom_width),
        PropertyId::BorderLeftWidth => normal.border_left_width = as_dimension(value, normal.border_left_width),
        PropertyId::BorderTopStyle => normal.border_top_style = as_keyword(value),
        PropertyId::BorderRightStyle => normal.border_right_style = as_keyword(value),
        PropertyId::BorderBottomStyle => normal.border_bottom_style = as_keyword(value),
        PropertyId::BorderLeftStyle => normal.border_left_style = as_keyword(value),
        PropertyId::BorderTopColor => normal.border_top_color = as_color(value, normal.border_top_color),
        PropertyId::BorderRightColor => normal.border_right_color = as_color(value, normal.border_right_color),
        PropertyId::BorderBottomColor => normal.border_bottom_color = as_color(value, normal.border_bottom_color),
        PropertyId::BorderLeftColor => normal.border_left_color = as_color(value, normal.border_left_color),
        PropertyId::OutlineStyle => normal.outline_style = as_keyword(value),
        PropertyId::ListStyleType => normal.list_style_type = as_keyword(value),
        PropertyId::ListStylePosition => normal.list_style_position = as_keyword(value),
        PropertyId::ListStyleImage => normal.list_style_image = value,
        PropertyId::Quotes => match value {
            PropertyValue::List(list) => normal.quotes = list,
            PropertyValue::None => normal.quotes = Vec::new(),
            _ => {}
        },
        PropertyId::FlexGrow => {
            if let PropertyValue::Number(n) = value {
                normal.flex_grow = n;
            }
        }
        PropertyId::FlexShrink => {
            if let PropertyValue::Number(n) = value {
                normal.flex_shrink = n;
            }
        }
        PropertyId::FlexBasis => normal.flex_basis = value,
        PropertyId::Cursor
        | PropertyId::LetterSpacing
        | PropertyId::WordSpacing
        | PropertyId::OutlineColor
        | PropertyId::OutlineWidth
        | PropertyId::WritingMode
        | PropertyId::BreakBefore
        | PropertyId::BreakAfter
        | PropertyId::BreakInside
        | PropertyId::Clip
        | PropertyId::ColumnCount
        | PropertyId::ColumnWidth
        | PropertyId::Content
        | PropertyId::CounterIncrement
        | PropertyId::CounterReset => {
            unreachable!("uncommon-group property routed to apply_normal")
        }
    }
}

fn apply_uncommon(uncommon: &mut Uncommon, id: PropertyId, value: PropertyValue) {
    match id {
        PropertyId::Cursor => uncommon.cursor = as_keyword(value),
        PropertyId::LetterSpacing => uncommon.letter_spacing = value,
        PropertyId::WordSpacing => uncommon.word_spacing = value,
        PropertyId::OutlineColor => uncommon.outline_color = as_color(value, uncommon.outline_color),
        PropertyId::OutlineWidth => uncommon.outline_width = as_dimension(value, uncommon.outline_width),
        PropertyId::WritingMode => uncommon.writing_mode = as_keyword(value),
        PropertyId::BreakBefore => uncommon.break_before = as_keyword(value),
        PropertyId::BreakAfter => uncommon.break_after = as_keyword(value),
        PropertyId::BreakInside => uncommon.break_inside = as_keyword(value),
        PropertyId::Clip => uncommon.clip = value,
        PropertyId::ColumnCount => uncommon.column_count = value,
        PropertyId::ColumnWidth => uncommon.column_width = value,
        PropertyId::Content => uncommon.content = value,
        PropertyId::CounterIncrement => uncommon.counter_increment = value,
        PropertyId::CounterReset => uncommon.counter_reset = value,
        _ => unreachable!("normal-group property routed to apply_uncommon"),
    }
}

/// Resolve `currentColor` in every color-valued property against this
/// style's own computed `color`, per [§ 4.5
/// currentcolor](https://www.w3.org/TR/css-color-4/#currentcolor-color).
/// Called once computed values are final, not during cascade.
#[must_use]
pub fn resolve_current_color(style: &ComputedStyle) -> ComputedStyle {
    let current = style.normal.color;
    let mut normal = (*style.normal).clone();
    normal.background_color = normal.background_color.resolve_current(current);
    normal.border_top_color = normal.border_top_color.resolve_current(current);
    normal.border_right_color = normal.border_right_color.resolve_current(current);
    normal.border_bottom_color = normal.border_bottom_color.resolve_current(current);
    normal.border_left_color = normal.border_left_color.resolve_current(current);
    let uncommon = if style.uncommon.outline_color == Color::CurrentColor {
        let mut uncommon = (*style.uncommon).clone();
        uncommon.outline_color = current;
        intern_uncommon(uncommon)
    } else {
        style.uncommon.clone()
    };
    ComputedStyle {
        normal: intern_normal(normal),
        uncommon,
    }
}

/// Every property name the table knows, for diagnostics and testing.
#[must_use]
pub fn known_property_names() -> Vec<&'static str> {
    PROPERTY_TABLE.iter().map(|meta| meta.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color as CssColor;

    #[test]
    fn default_style_has_initial_values() {
        let style = ComputedStyle::default();
        assert_eq!(style.color(), CssColor::BLACK);
        assert_eq!(style.display(), "inline");
        assert_eq!(style.writing_mode(), "horizontal-tb");
    }

    #[test]
    fn identical_styles_share_the_same_allocation() {
        let a = ComputedStyle::default();
        let b = ComputedStyle::default();
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn with_property_does_not_mutate_the_original() {
        let base = ComputedStyle::default();
        let red = base.with_property(PropertyId::Color, PropertyValue::Color(CssColor::from_rgba(255, 0, 0, 255)));
        assert_eq!(base.color(), CssColor::BLACK);
        assert_eq!(red.color(), CssColor::from_rgba(255, 0, 0, 255));
    }

    #[test]
    fn two_elements_with_the_same_override_share_storage() {
        let base = ComputedStyle::default();
        let a = base.with_property(PropertyId::Display, PropertyValue::Keyword(Atom::new("block")));
        let b = base.with_property(PropertyId::Display, PropertyValue::Keyword(Atom::new("block")));
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn inherited_style_keeps_inherited_properties_only() {
        let base = ComputedStyle::default();
        let red = base.with_property(PropertyId::Color, PropertyValue::Color(CssColor::from_rgba(255, 0, 0, 255)));
        let blue_bg = red.with_property(
            PropertyId::BackgroundColor,
            PropertyValue::Color(CssColor::from_rgba(0, 0, 255, 255)),
        );
        let child = blue_bg.inherited();
        assert_eq!(child.color(), CssColor::from_rgba(255, 0, 0, 255));
        assert_eq!(child.background_color(), CssColor::Transparent);
    }

    #[test]
    fn resolve_current_color_substitutes_background_and_outline() {
        let base = ComputedStyle::default();
        let red = base.with_property(PropertyId::Color, PropertyValue::Color(CssColor::from_rgba(255, 0, 0, 255)));
        let current_bg = red.with_property(PropertyId::BackgroundColor, PropertyValue::Color(CssColor::CurrentColor));
        let resolved = resolve_current_color(&current_bg);
        assert_eq!(resolved.background_color(), CssColor::from_rgba(255, 0, 0, 255));
        // outline-color's initial value is currentColor, so it resolves too.
        assert_eq!(resolved.outline_color(), CssColor::from_rgba(255, 0, 0, 255));
    }

    #[test]
    fn normal_only_changes_leave_the_uncommon_block_shared() {
        let base = ComputedStyle::default();
        let a = base.with_property(PropertyId::Cursor, PropertyValue::Keyword(Atom::new("pointer")));
        let b = base.with_property(PropertyId::Color, PropertyValue::Color(CssColor::from_rgba(1, 2, 3, 255)));
        assert!(!Rc::ptr_eq(&a.uncommon, &base.uncommon));
        assert!(Rc::ptr_eq(&b.uncommon, &base.uncommon));
    }

    #[test]
    fn dropping_every_handle_returns_the_arena_to_its_prior_size() {
        let base = ComputedStyle::default();
        let (normal_before, uncommon_before) = arena_live_counts();
        {
            let unusual = base
                .with_property(PropertyId::Color, PropertyValue::Color(CssColor::from_rgba(9, 9, 9, 255)))
                .with_property(PropertyId::Cursor, PropertyValue::Keyword(Atom::new("crosshair")));
            let (normal_during, uncommon_during) = arena_live_counts();
            assert_eq!(normal_during, normal_before + 1);
            assert_eq!(uncommon_during, uncommon_before + 1);
            drop(unusual);
        }
        assert_eq!(arena_live_counts(), (normal_before, uncommon_before));
    }

    #[test]
    fn fnv_rollup_matches_the_published_test_vectors() {
        use std::hash::Hasher;
        let mut empty = Fnv::default();
        empty.write(b"");
        assert_eq!(empty.finish(), 0xcbf2_9ce4_8422_2325);
        let mut single = Fnv::default();
        single.write(b"a");
        assert_eq!(single.finish(), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn equal_payloads_hash_equal() {
        let a = initial_normal();
        let b = initial_normal();
        assert_eq!(hash_payload(&a), hash_payload(&b));
        let mut c = initial_normal();
        c.color = CssColor::from_rgba(1, 2, 3, 255);
        assert_ne!(hash_payload(&a), hash_payload(&c));
    }

    #[test]
    fn property_value_round_trips_through_with_property() {
        let base = ComputedStyle::default();
        let set = base.with_property(
            PropertyId::WritingMode,
            PropertyValue::Keyword(Atom::new("vertical-rl")),
        );
        assert_eq!(
            set.property_value(PropertyId::WritingMode),
            PropertyValue::Keyword(Atom::new("vertical-rl"))
        );
        assert_eq!(
            base.property_value(PropertyId::WritingMode),
            PropertyValue::Keyword(Atom::new("horizontal-tb"))
        );
    }
}
