//! Units and unit categories for CSS numeric values.
//!
//! Every CSS `<length>`, `<angle>`, `<time>`, `<frequency>`, `<resolution>`,
//! and `<percentage>` reduces to a [`Fixed`] magnitude plus a [`Unit`] tag.
//! The tag alone determines the value's category ([`Unit::category`]),
//! which is what `calc()` ([`crate::calc`]) and property value matching use
//! to decide whether two operands are compatible.

use koala_common::fixed::Fixed;

/// The kind of quantity a unit measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitCategory {
    /// `px`, `em`, `rem`, `vh`, ... and plain `<number>` zero lengths.
    Length,
    /// `deg`, `rad`, `grad`, `turn`.
    Angle,
    /// `s`, `ms`.
    Time,
    /// `hz`, `khz`.
    Frequency,
    /// `dpi`, `dpcm`, `dppx`.
    Resolution,
    /// `%`.
    Percentage,
    /// A bare number inside `calc()`, unitless until combined with a
    /// dimensioned operand.
    Number,
}

impl UnitCategory {
    /// The unit arithmetic on this category normalizes to before combining
    /// two differently-unitted operands of the same category (`px`, `deg`,
    /// `ms`, `hz`, `dpi`; percentages and bare numbers have no smaller
    /// canonical unit to fold into, so they map to themselves).
    #[must_use]
    pub const fn canonical_unit(self) -> Unit {
        match self {
            Self::Length => Unit::Px,
            Self::Angle => Unit::Deg,
            Self::Time => Unit::Ms,
            Self::Frequency => Unit::Hz,
            Self::Resolution => Unit::Dpi,
            Self::Percentage => Unit::Percent,
            Self::Number => Unit::Number,
        }
    }
}

/// A CSS unit keyword, or the absence of one (`<number>`/`<percentage>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    /// `px` — absolute, 1px = 1/96in.
    Px,
    /// `em` — font-size relative.
    Em,
    /// `ex` — x-height relative.
    Ex,
    /// `ch` — advance measure of "0" relative.
    Ch,
    /// `rem` — root element font-size relative.
    Rem,
    /// `lh` — computed line-height relative.
    Lh,
    /// `in` — absolute, 96px.
    In,
    /// `cm` — absolute, 1in / 2.54.
    Cm,
    /// `mm` — absolute, 1in / 25.4.
    Mm,
    /// `q` — absolute, 1mm / 4.
    Q,
    /// `pt` — absolute, 1in / 72.
    Pt,
    /// `pc` — absolute, 1in / 6.
    Pc,
    /// `vh` — 1% of viewport height.
    Vh,
    /// `vw` — 1% of viewport width.
    Vw,
    /// `vi` — 1% of viewport size in the inline axis.
    Vi,
    /// `vb` — 1% of viewport size in the block axis.
    Vb,
    /// `vmin` — smaller of `vh`/`vw`.
    Vmin,
    /// `vmax` — larger of `vh`/`vw`.
    Vmax,
    /// `deg` — 1/360 of a full circle.
    Deg,
    /// `rad` — radians.
    Rad,
    /// `grad` — 1/400 of a full circle.
    Grad,
    /// `turn` — full circles.
    Turn,
    /// `s` — seconds.
    S,
    /// `ms` — milliseconds.
    Ms,
    /// `hz` — cycles per second.
    Hz,
    /// `khz` — kilohertz.
    Khz,
    /// `dpi` — dots per inch.
    Dpi,
    /// `dpcm` — dots per centimeter.
    Dpcm,
    /// `dppx` — dots per pixel.
    Dppx,
    /// `%` — percentage, resolved against a context-dependent reference.
    Percent,
    /// No unit: a bare `<number>`.
    Number,
}

impl Unit {
    /// Look up a unit by its CSS keyword (case-insensitive).
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match_ignore_ascii_case(keyword)?)
    }

    /// This unit's category.
    #[must_use]
    pub const fn category(self) -> UnitCategory {
        match self {
            Self::Px
            | Self::Em
            | Self::Ex
            | Self::Ch
            | Self::Rem
            | Self::Lh
            | Self::In
            | Self::Cm
            | Self::Mm
            | Self::Q
            | Self::Pt
            | Self::Pc
            | Self::Vh
            | Self::Vw
            | Self::Vi
            | Self::Vb
            | Self::Vmin
            | Self::Vmax => UnitCategory::Length,
            Self::Deg | Self::Rad | Self::Grad | Self::Turn => UnitCategory::Angle,
            Self::S | Self::Ms => UnitCategory::Time,
            Self::Hz | Self::Khz => UnitCategory::Frequency,
            Self::Dpi | Self::Dpcm | Self::Dppx => UnitCategory::Resolution,
            Self::Percent => UnitCategory::Percentage,
            Self::Number => UnitCategory::Number,
        }
    }

    /// Conversion factor to this category's canonical unit (`px`, `deg`,
    /// `ms`, `hz`, `dpi`), for units whose ratio to the canonical unit is a
    /// fixed constant independent of context (font size, viewport, line
    /// height are resolved by the caller before reaching this table).
    #[must_use]
    pub fn absolute_factor(self) -> Option<Fixed> {
        let f = match self {
            Self::Px => 1.0,
            Self::In => 96.0,
            Self::Cm => 96.0 / 2.54,
            Self::Mm => 96.0 / 25.4,
            Self::Q => 96.0 / 25.4 / 4.0,
            Self::Pt => 96.0 / 72.0,
            Self::Pc => 96.0 / 6.0,
            Self::Deg => 1.0,
            Self::Grad => 360.0 / 400.0,
            Self::Rad => 360.0 / std::f64::consts::TAU,
            Self::Turn => 360.0,
            Self::S => 1000.0,
            Self::Ms => 1.0,
            Self::Hz => 1.0,
            Self::Khz => 1000.0,
            Self::Dpi => 1.0,
            Self::Dpcm => 2.54,
            Self::Dppx => 96.0,
            _ => return None,
        };
        Some(Fixed::from_f64(f))
    }
}

fn match_ignore_ascii_case(s: &str) -> Option<Unit> {
    const TABLE: &[(&str, Unit)] = &[
        ("px", Unit::Px),
        ("em", Unit::Em),
        ("ex", Unit::Ex),
        ("ch", Unit::Ch),
        ("rem", Unit::Rem),
        ("lh", Unit::Lh),
        ("in", Unit::In),
        ("cm", Unit::Cm),
        ("mm", Unit::Mm),
        ("q", Unit::Q),
        ("pt", Unit::Pt),
        ("pc", Unit::Pc),
        ("vh", Unit::Vh),
        ("vw", Unit::Vw),
        ("vi", Unit::Vi),
        ("vb", Unit::Vb),
        ("vmin", Unit::Vmin),
        ("vmax", Unit::Vmax),
        ("deg", Unit::Deg),
        ("rad", Unit::Rad),
        ("grad", Unit::Grad),
        ("turn", Unit::Turn),
        ("s", Unit::S),
        ("ms", Unit::Ms),
        ("hz", Unit::Hz),
        ("khz", Unit::Khz),
        ("dpi", Unit::Dpi),
        ("dpcm", Unit::Dpcm),
        ("dppx", Unit::Dppx),
    ];
    TABLE
        .iter()
        .find(|(kw, _)| kw.eq_ignore_ascii_case(s))
        .map(|(_, u)| *u)
}

/// A magnitude paired with its unit: the runtime value of a `<length>`,
/// `<angle>`, `<time>`, `<frequency>`, `<resolution>`, or `<percentage>`.
#[derive(Debug, Clone, Copy, PartialEq, Hash)]
pub struct Dimension {
    /// The numeric magnitude.
    pub value: Fixed,
    /// The unit the magnitude is measured in.
    pub unit: Unit,
}

impl Dimension {
    /// Build a dimension from a raw float and unit keyword.
    #[must_use]
    pub fn new(value: f64, unit: Unit) -> Self {
        Self {
            value: Fixed::from_f64(value),
            unit,
        }
    }

    /// An absolute-unit dimension converted to its category's canonical
    /// unit (px/deg/s/hz/dppx), or `None` for a relative unit (`em`,
    /// viewport units, `%`) that needs external context to resolve.
    #[must_use]
    pub fn to_canonical(self) -> Option<Fixed> {
        self.unit.absolute_factor().map(|f| self.value * f)
    }
}

/// Measurement callback for font-relative units the engine can't derive
/// itself: given the reference font size in px and a unit (only ever
/// [`Unit::Ex`] or [`Unit::Ch`]), return the unit's size in px.
pub type LengthMeasure = fn(font_size_px: Fixed, unit: Unit) -> Fixed;

/// Everything needed to resolve a relative length to device-independent
/// pixels: the viewport, the document's font metrics, and an optional
/// measurement callback for `ex`/`ch`.
///
/// Built once per document by the embedder and passed by reference into
/// selection; nothing here is mutated by the engine.
#[derive(Clone, Copy)]
pub struct UnitContext {
    /// Viewport width in px (the `vw` reference).
    pub viewport_width: Fixed,
    /// Viewport height in px (the `vh` reference).
    pub viewport_height: Fixed,
    /// Default font size in px, used for `em` where no reference style is
    /// supplied and for media-query length conversion.
    pub font_size_default: Fixed,
    /// Smallest font size in px the engine will compute.
    pub font_size_minimum: Fixed,
    /// Device resolution in dots per inch.
    pub device_dpi: Fixed,
    /// The root element's font size in px (the `rem` reference). Falls
    /// back to `font_size_default` until the root is styled.
    pub root_font_size: Fixed,
    /// Optional `ex`/`ch` measurement callback. Without one, `ex` falls
    /// back to 0.6em and `ch` to 0.4em — close enough for the common
    /// latin text faces when no font metrics are available.
    pub measure: Option<LengthMeasure>,
}

impl std::fmt::Debug for UnitContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitContext")
            .field("viewport_width", &self.viewport_width)
            .field("viewport_height", &self.viewport_height)
            .field("font_size_default", &self.font_size_default)
            .field("font_size_minimum", &self.font_size_minimum)
            .field("device_dpi", &self.device_dpi)
            .field("root_font_size", &self.root_font_size)
            .field("measure", &self.measure.is_some())
            .finish()
    }
}

impl Default for UnitContext {
    /// A 1024x768 viewport at 96dpi with a 16px default font.
    fn default() -> Self {
        Self {
            viewport_width: Fixed::from_int(1024),
            viewport_height: Fixed::from_int(768),
            font_size_default: Fixed::from_int(16),
            font_size_minimum: Fixed::from_int(6),
            device_dpi: Fixed::from_int(96),
            root_font_size: Fixed::from_int(16),
            measure: None,
        }
    }
}

impl UnitContext {
    /// Resolve a length (or percentage) to device-independent px.
    ///
    /// `font_size` is the reference font size for `em`/`ex`/`ch`/`lh` —
    /// the element's own computed font size everywhere except within the
    /// `font-size` property itself, where the parent's is used.
    /// `percent_ref` is the reference length for `%`; `None` means
    /// percentages can't be resolved here and yields `None`. A negative
    /// `percent_ref` also yields `None`.
    #[must_use]
    pub fn length_to_px(
        &self,
        dim: Dimension,
        font_size: Fixed,
        percent_ref: Option<Fixed>,
    ) -> Option<Fixed> {
        let vmin = if self.viewport_width <= self.viewport_height {
            self.viewport_width
        } else {
            self.viewport_height
        };
        let vmax = if self.viewport_width >= self.viewport_height {
            self.viewport_width
        } else {
            self.viewport_height
        };
        let hundredth = |v: Fixed| v / Fixed::from_int(100);
        Some(match dim.unit {
            Unit::Em => dim.value * font_size,
            Unit::Rem => dim.value * self.root_font_size,
            Unit::Ex => dim.value * self.measure_or(font_size, Unit::Ex),
            Unit::Ch => dim.value * self.measure_or(font_size, Unit::Ch),
            Unit::Lh => dim.value * font_size,
            Unit::Vw | Unit::Vi => dim.value * hundredth(self.viewport_width),
            Unit::Vh | Unit::Vb => dim.value * hundredth(self.viewport_height),
            Unit::Vmin => dim.value * hundredth(vmin),
            Unit::Vmax => dim.value * hundredth(vmax),
            Unit::Percent => {
                let reference = percent_ref?;
                if reference.is_negative() {
                    return None;
                }
                dim.value * reference / Fixed::from_int(100)
            }
            _ => {
                if dim.unit.category() != UnitCategory::Length {
                    return None;
                }
                dim.value * dim.unit.absolute_factor()?
            }
        })
    }

    fn measure_or(&self, font_size: Fixed, unit: Unit) -> Fixed {
        match self.measure {
            Some(measure) => measure(font_size, unit),
            None => {
                let factor = if unit == Unit::Ex { 0.6 } else { 0.4 };
                font_size * Fixed::from_f64(factor)
            }
        }
    }

    /// Normalize any dimensioned value to its category's canonical unit
    /// (lengths to px via [`Self::length_to_px`], angles to deg, times to
    /// s, frequencies to hz, resolutions to dppx). Used by `calc()`
    /// evaluation and media-feature comparison.
    #[must_use]
    pub fn to_base(
        &self,
        dim: Dimension,
        font_size: Fixed,
        percent_ref: Option<Fixed>,
    ) -> Option<Dimension> {
        match dim.unit.category() {
            UnitCategory::Length | UnitCategory::Percentage => self
                .length_to_px(dim, font_size, percent_ref)
                .map(|value| Dimension { value, unit: Unit::Px }),
            UnitCategory::Number => Some(dim),
            category => dim.to_canonical().map(|value| Dimension {
                value,
                unit: category.canonical_unit(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn px_is_its_own_category_canonical() {
        let d = Dimension::new(10.0, Unit::Px);
        assert_eq!(d.to_canonical().unwrap().to_f64(), 10.0);
    }

    #[test]
    fn cm_converts_to_px() {
        let d = Dimension::new(1.0, Unit::Cm);
        let px = d.to_canonical().unwrap().to_f64();
        assert!((px - 37.795_275_59).abs() < 0.01);
    }

    #[test]
    fn relative_units_have_no_canonical_conversion() {
        assert!(Dimension::new(2.0, Unit::Em).to_canonical().is_none());
        assert!(Dimension::new(50.0, Unit::Percent).to_canonical().is_none());
    }

    #[test]
    fn category_groups_match_spec() {
        assert_eq!(Unit::Px.category(), UnitCategory::Length);
        assert_eq!(Unit::Deg.category(), UnitCategory::Angle);
        assert_eq!(Unit::Hz.category(), UnitCategory::Frequency);
        assert_eq!(Unit::Dpi.category(), UnitCategory::Resolution);
    }

    #[test]
    fn unit_keyword_lookup_is_case_insensitive() {
        assert_eq!(Unit::from_keyword("PX"), Some(Unit::Px));
        assert_eq!(Unit::from_keyword("Rem"), Some(Unit::Rem));
        assert_eq!(Unit::from_keyword("bogus"), None);
    }

    #[test]
    fn canonical_unit_matches_each_category() {
        assert_eq!(UnitCategory::Length.canonical_unit(), Unit::Px);
        assert_eq!(UnitCategory::Angle.canonical_unit(), Unit::Deg);
        assert_eq!(UnitCategory::Time.canonical_unit(), Unit::Ms);
        assert_eq!(UnitCategory::Frequency.canonical_unit(), Unit::Hz);
        assert_eq!(UnitCategory::Resolution.canonical_unit(), Unit::Dpi);
    }

    #[test]
    fn context_resolves_em_against_reference_font_size() {
        let ctx = UnitContext::default();
        let px = ctx
            .length_to_px(Dimension::new(2.0, Unit::Em), Fixed::from_int(20), None)
            .unwrap();
        assert_eq!(px.to_f64(), 40.0);
    }

    #[test]
    fn context_resolves_rem_against_root_font_size() {
        let ctx = UnitContext {
            root_font_size: Fixed::from_int(10),
            ..UnitContext::default()
        };
        let px = ctx
            .length_to_px(Dimension::new(3.0, Unit::Rem), Fixed::from_int(99), None)
            .unwrap();
        assert_eq!(px.to_f64(), 30.0);
    }

    #[test]
    fn viewport_units_take_a_hundredth_of_the_viewport() {
        let ctx = UnitContext::default();
        let font = Fixed::from_int(16);
        let vw = ctx.length_to_px(Dimension::new(50.0, Unit::Vw), font, None).unwrap();
        assert_eq!(vw.to_f64(), 512.0);
        let vmin = ctx.length_to_px(Dimension::new(100.0, Unit::Vmin), font, None).unwrap();
        assert_eq!(vmin.to_f64(), 768.0);
    }

    #[test]
    fn ex_and_ch_fall_back_to_em_fractions_without_a_measure_callback() {
        let ctx = UnitContext::default();
        let font = Fixed::from_int(10);
        let ex = ctx.length_to_px(Dimension::new(1.0, Unit::Ex), font, None).unwrap();
        assert!((ex.to_f64() - 6.0).abs() < 0.01);
        let ch = ctx.length_to_px(Dimension::new(1.0, Unit::Ch), font, None).unwrap();
        assert!((ch.to_f64() - 4.0).abs() < 0.01);
    }

    #[test]
    fn measure_callback_overrides_the_ex_fallback() {
        fn half(font: Fixed, _unit: Unit) -> Fixed {
            font / Fixed::from_int(2)
        }
        let ctx = UnitContext { measure: Some(half), ..UnitContext::default() };
        let ex = ctx
            .length_to_px(Dimension::new(1.0, Unit::Ex), Fixed::from_int(10), None)
            .unwrap();
        assert_eq!(ex.to_f64(), 5.0);
    }

    #[test]
    fn percentage_needs_a_non_negative_reference() {
        let ctx = UnitContext::default();
        let font = Fixed::from_int(16);
        let pct = Dimension::new(50.0, Unit::Percent);
        assert_eq!(
            ctx.length_to_px(pct, font, Some(Fixed::from_int(200))).unwrap().to_f64(),
            100.0
        );
        assert!(ctx.length_to_px(pct, font, None).is_none());
        assert!(ctx.length_to_px(pct, font, Some(Fixed::from_int(-1))).is_none());
    }
}
