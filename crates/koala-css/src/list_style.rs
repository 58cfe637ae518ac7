//! Counter-style formatting for `list-style-type`, per [CSS Counter Styles
//! Level 3](https://www.w3.org/TR/css-counter-styles-3/).
//!
//! Each style is described by a [`CounterSystem`] (how symbol values are
//! derived from the marker number) plus a symbol table. `format_counter`
//! looks the style up by keyword, runs the system, and maps the resulting
//! symbol indices to their textual glyphs, falling back to `decimal` when a
//! style can't represent the given value (negative ordinals in an additive
//! system, an out-of-range roman numeral, and so on).

use koala_common::atom::Atom;

/// How a counter style turns a marker value into a sequence of symbol
/// indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CounterSystem {
    /// Place-value numbering in a base equal to the symbol count, most
    /// significant digit first (`decimal`, `binary`, `lower-hexadecimal`, ...).
    Numeric,
    /// Bijective base-N numbering with no zero digit (`lower-alpha`,
    /// `lower-greek`, `cjk-heavenly-stem`, ...): `z` is followed by `aa`,
    /// not a digit reset.
    Alphabetic,
    /// Each symbol carries a weight; the value is greedily decomposed into
    /// the largest weights that fit (`georgian`, `upper-armenian`, `hebrew`).
    Additive,
    /// Roman numeral subtractive notation, restricted to the classical
    /// 1..=3999 range.
    Roman,
    /// A single fixed symbol repeated for every marker, ignoring the value
    /// entirely (`disc`, `circle`, `square`).
    Cyclic,
}

struct CounterStyle {
    system: CounterSystem,
    symbols: &'static [&'static str],
    /// Parallel to `symbols` for `Additive` and `Roman` systems.
    weights: &'static [i64],
    /// Smallest value this style can format; outside `range` callers fall
    /// back to decimal. `None` means unbounded below (still bounded above
    /// for additive/roman systems via `weights`).
    range: Option<(i64, i64)>,
    pad_to: usize,
    prefix: &'static str,
    suffix: &'static str,
}

const DEFAULT_SUFFIX: &str = ". ";
const MARKER_SUFFIX: &str = " ";

const DECIMAL: CounterStyle = CounterStyle {
    system: CounterSystem::Numeric,
    symbols: &["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"],
    weights: &[],
    range: None,
    pad_to: 0,
    prefix: "",
    suffix: DEFAULT_SUFFIX,
};

fn style_for(name: &str) -> Option<CounterStyle> {
    Some(match name {
        "decimal" => DECIMAL,
        "decimal-leading-zero" => CounterStyle { pad_to: 2, ..DECIMAL },
        "binary" => CounterStyle { symbols: &["0", "1"], ..DECIMAL },
        "octal" => CounterStyle {
            symbols: &["0", "1", "2", "3", "4", "5", "6", "7"],
            ..DECIMAL
        },
        "lower-hexadecimal" => CounterStyle {
            symbols: &[
                "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "a", "b", "c", "d", "e", "f",
            ],
            ..DECIMAL
        },
        "upper-hexadecimal" => CounterStyle {
            symbols: &[
                "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "A", "B", "C", "D", "E", "F",
            ],
            ..DECIMAL
        },
        "arabic-indic" => CounterStyle {
            symbols: &["٠", "١", "٢", "٣", "٤", "٥", "٦", "٧", "٨", "٩"],
            ..DECIMAL
        },
        "bengali" => CounterStyle {
            symbols: &["০", "১", "২", "৩", "৪", "৫", "৬", "৭", "৮", "৯"],
            ..DECIMAL
        },
        "cambodian" | "khmer" => CounterStyle {
            symbols: &["០", "១", "២", "៣", "៤", "៥", "៦", "៧", "៨", "៩"],
            ..DECIMAL
        },
        "cjk-decimal" => CounterStyle {
            symbols: &["〇", "一", "二", "三", "四", "五", "六", "七", "八", "九"],
            suffix: "、",
            ..DECIMAL
        },
        "devanagari" => CounterStyle {
            symbols: &["०", "१", "२", "३", "४", "५", "६", "७", "८", "९"],
            ..DECIMAL
        },
        "gujarati" => CounterStyle {
            symbols: &["૦", "૧", "૨", "૩", "૪", "૫", "૬", "૭", "૮", "૯"],
            ..DECIMAL
        },
        "gurmukhi" => CounterStyle {
            symbols: &["੦", "੧", "੨", "੩", "੪", "੫", "੬", "੭", "੮", "੯"],
            ..DECIMAL
        },
        "kannada" => CounterStyle {
            symbols: &["೦", "೧", "೨", "೩", "೪", "೫", "೬", "೭", "೮", "೯"],
            ..DECIMAL
        },
        "lao" => CounterStyle {
            symbols: &["໐", "໑", "໒", "໓", "໔", "໕", "໖", "໗", "໘", "໙"],
            ..DECIMAL
        },
        "malayalam" => CounterStyle {
            symbols: &["൦", "൧", "൨", "൩", "൪", "൫", "൬", "൭", "൮", "൯"],
            ..DECIMAL
        },
        "mongolian" => CounterStyle {
            symbols: &["᠐", "᠑", "᠒", "᠓", "᠔", "᠕", "᠖", "᠗", "᠘", "᠙"],
            ..DECIMAL
        },
        "myanmar" => CounterStyle {
            symbols: &["၀", "၁", "၂", "၃", "၄", "၅", "၆", "၇", "၈", "၉"],
            ..DECIMAL
        },
        "oriya" => CounterStyle {
            symbols: &["୦", "୧", "୨", "୩", "୪", "୫", "୬", "୭", "୮", "୯"],
            ..DECIMAL
        },
        "persian" => CounterStyle {
            symbols: &["۰", "۱", "۲", "۳", "۴", "۵", "۶", "۷", "۸", "۹"],
            ..DECIMAL
        },
        "tamil" => CounterStyle {
            symbols: &["௦", "௧", "௨", "௩", "௪", "௫", "௬", "௭", "௮", "௯"],
            ..DECIMAL
        },
        "telugu" => CounterStyle {
            symbols: &["౦", "౧", "౨", "౩", "౪", "౫", "౬", "౭", "౮", "౯"],
            ..DECIMAL
        },
        "thai" => CounterStyle {
            symbols: &["๐", "๑", "๒", "๓", "๔", "๕", "๖", "๗", "๘", "๙"],
            ..DECIMAL
        },
        "tibetan" => CounterStyle {
            symbols: &["༠", "༡", "༢", "༣", "༤", "༥", "༦", "༧", "༨", "༩"],
            ..DECIMAL
        },

        "lower-alpha" | "lower-latin" => CounterStyle {
            system: CounterSystem::Alphabetic,
            symbols: &[
                "a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p",
                "q", "r", "s", "t", "u", "v", "w", "x", "y", "z",
            ],
            weights: &[],
            range: Some((1, i64::MAX)),
            pad_to: 0,
            prefix: "",
            suffix: DEFAULT_SUFFIX,
        },
        "upper-alpha" | "upper-latin" => CounterStyle {
            system: CounterSystem::Alphabetic,
            symbols: &[
                "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P",
                "Q", "R", "S", "T", "U", "V", "W", "X", "Y", "Z",
            ],
            weights: &[],
            range: Some((1, i64::MAX)),
            pad_to: 0,
            prefix: "",
            suffix: DEFAULT_SUFFIX,
        },
        "lower-greek" => CounterStyle {
            system: CounterSystem::Alphabetic,
            symbols: &[
                "α", "β", "γ", "δ", "ε", "ζ", "η", "θ", "ι", "κ", "λ", "μ", "ν", "ξ", "ο", "π",
                "ρ", "σ", "τ", "υ", "φ", "χ", "ψ", "ω",
            ],
            weights: &[],
            range: Some((1, i64::MAX)),
            pad_to: 0,
            prefix: "",
            suffix: DEFAULT_SUFFIX,
        },
        "cjk-earthly-branch" => CounterStyle {
            system: CounterSystem::Alphabetic,
            symbols: &[
                "子", "丑", "寅", "卯", "辰", "巳", "午", "未", "申", "酉", "戌", "亥",
            ],
            weights: &[],
            range: Some((1, i64::MAX)),
            pad_to: 0,
            prefix: "",
            suffix: "、",
        },
        "cjk-heavenly-stem" => CounterStyle {
            system: CounterSystem::Alphabetic,
            symbols: &["甲", "乙", "丙", "丁", "戊", "己", "庚", "辛", "壬", "癸"],
            weights: &[],
            range: Some((1, i64::MAX)),
            pad_to: 0,
            prefix: "",
            suffix: "、",
        },

        "upper-roman" => CounterStyle {
            system: CounterSystem::Roman,
            symbols: &["M", "CM", "D", "CD", "C", "XC", "L", "XL", "X", "IX", "V", "IV", "I"],
            weights: &[1000, 900, 500, 400, 100, 90, 50, 40, 10, 9, 5, 4, 1],
            range: Some((1, 3999)),
            pad_to: 0,
            prefix: "",
            suffix: DEFAULT_SUFFIX,
        },
        "lower-roman" => CounterStyle {
            system: CounterSystem::Roman,
            symbols: &["m", "cm", "d", "cd", "c", "xc", "l", "xl", "x", "ix", "v", "iv", "i"],
            weights: &[1000, 900, 500, 400, 100, 90, 50, 40, 10, 9, 5, 4, 1],
            range: Some((1, 3999)),
            pad_to: 0,
            prefix: "",
            suffix: DEFAULT_SUFFIX,
        },

        "georgian" => CounterStyle {
            system: CounterSystem::Additive,
            symbols: &[
                "ჵ", "ჰ", "ჯ", "ჴ", "ხ", "ჭ", "წ", "ძ", "ც", "ჩ", "შ", "ყ", "ღ", "ქ", "ფ", "ჳ",
                "ტ", "ს", "რ", "ჟ", "პ", "ო", "ჲ", "ნ", "მ", "ლ", "კ", "ი", "თ", "ჱ", "ზ", "ვ",
                "ე", "დ", "გ", "ბ", "ა",
            ],
            weights: &[
                10000, 9000, 8000, 7000, 6000, 5000, 4000, 3000, 2000, 1000, 900, 800, 700, 600,
                500, 400, 300, 200, 100, 90, 80, 70, 60, 50, 40, 30, 20, 10, 9, 8, 7, 6, 5, 4, 3,
                2, 1,
            ],
            range: Some((1, 19999)),
            pad_to: 0,
            prefix: "",
            suffix: DEFAULT_SUFFIX,
        },
        "upper-armenian" | "armenian" => CounterStyle {
            system: CounterSystem::Additive,
            symbols: &[
                "Ք", "Փ", "Ւ", "Ց", "Ր", "Տ", "Վ", "Ս", "Ռ", "Ջ", "Պ", "Չ", "Ո", "Շ", "Ն", "Յ",
                "Մ", "Ճ", "Ղ", "Ձ", "Հ", "Կ", "Ծ", "Խ", "Լ", "Ի", "Ժ", "Թ", "Ը", "Է", "Զ", "Ե",
                "Դ", "Գ", "Բ", "Ա",
            ],
            weights: &[
                9000, 8000, 7000, 6000, 5000, 4000, 3000, 2000, 1000, 900, 800, 700, 600, 500,
                400, 300, 200, 100, 90, 80, 70, 60, 50, 40, 30, 20, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1,
            ],
            range: Some((1, 9999)),
            pad_to: 0,
            prefix: "",
            suffix: DEFAULT_SUFFIX,
        },
        "lower-armenian" => CounterStyle {
            system: CounterSystem::Additive,
            symbols: &[
                "ք", "փ", "ւ", "ց", "ր", "տ", "վ", "ս", "ռ", "ջ", "պ", "չ", "ո", "շ", "ն", "յ",
                "մ", "ճ", "ղ", "ձ", "հ", "կ", "ծ", "խ", "լ", "ի", "ժ", "թ", "ը", "է", "զ", "ե",
                "դ", "գ", "բ", "ա",
            ],
            weights: &[
                9000, 8000, 7000, 6000, 5000, 4000, 3000, 2000, 1000, 900, 800, 700, 600, 500,
                400, 300, 200, 100, 90, 80, 70, 60, 50, 40, 30, 20, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1,
            ],
            range: Some((1, 9999)),
            pad_to: 0,
            prefix: "",
            suffix: DEFAULT_SUFFIX,
        },

        "disc" => CounterStyle {
            system: CounterSystem::Cyclic,
            symbols: &["\u{2022}"],
            weights: &[],
            range: None,
            pad_to: 0,
            prefix: "",
            suffix: MARKER_SUFFIX,
        },
        "circle" => CounterStyle {
            system: CounterSystem::Cyclic,
            symbols: &["\u{25CB}"],
            weights: &[],
            range: None,
            pad_to: 0,
            prefix: "",
            suffix: MARKER_SUFFIX,
        },
        "square" => CounterStyle {
            system: CounterSystem::Cyclic,
            symbols: &["\u{25AA}"],
            weights: &[],
            range: None,
            pad_to: 0,
            prefix: "",
            suffix: MARKER_SUFFIX,
        },

        _ => return None,
    })
}

/// Numeric place-value digits, most significant first, in base
/// `symbols.len()`. `0` formats as a single zero digit.
fn numeric_digits(style: &CounterStyle, mut value: i64) -> Vec<usize> {
    let base = style.symbols.len() as i64;
    if value == 0 {
        return vec![0];
    }
    let negative = value < 0;
    if negative {
        value = -value;
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push((value % base) as usize);
        value /= base;
    }
    digits.reverse();
    digits
}

/// Bijective base-N digits (no zero symbol): after the last symbol the
/// count rolls over into an extra digit instead of repeating a zero.
fn alphabetic_digits(style: &CounterStyle, mut value: i64) -> Option<Vec<usize>> {
    if value <= 0 {
        return None;
    }
    let base = style.symbols.len() as i64;
    let mut digits = Vec::new();
    while value > 0 {
        value -= 1;
        digits.push((value % base) as usize);
        value /= base;
    }
    digits.reverse();
    Some(digits)
}

/// Greedy decomposition into the largest available weights, each mapped to
/// a repeated symbol index (`georgian`, `armenian`, `hebrew`).
fn additive_digits(style: &CounterStyle, mut value: i64) -> Option<Vec<usize>> {
    if value <= 0 {
        return None;
    }
    let mut digits = Vec::new();
    for (idx, &weight) in style.weights.iter().enumerate() {
        if weight <= 0 {
            continue;
        }
        let times = value / weight;
        for _ in 0..times {
            digits.push(idx);
        }
        value -= times * weight;
    }
    if value != 0 {
        return None;
    }
    Some(digits)
}

/// Subtractive roman numerals: symbols already include the subtractive
/// pairs (`CM`, `CD`, ...) so this reduces to the same greedy pass as
/// `additive_digits`, just against that extended symbol set.
fn roman_digits(style: &CounterStyle, value: i64) -> Option<Vec<usize>> {
    let (lo, hi) = style.range.unwrap_or((1, i64::MAX));
    if value < lo || value > hi {
        return None;
    }
    additive_digits(style, value)
}

fn symbol_digits(style: &CounterStyle, value: i64) -> Option<Vec<usize>> {
    if let Some((lo, hi)) = style.range {
        if value < lo || value > hi {
            return None;
        }
    }
    match style.system {
        CounterSystem::Numeric => Some(numeric_digits(style, value)),
        CounterSystem::Alphabetic => alphabetic_digits(style, value),
        CounterSystem::Additive => additive_digits(style, value),
        CounterSystem::Roman => roman_digits(style, value),
        CounterSystem::Cyclic => Some(vec![0]),
    }
}

fn render(style: &CounterStyle, digits: &[usize], negative: bool) -> String {
    let mut out = String::new();
    out.push_str(style.prefix);
    if negative {
        out.push('-');
    }
    for _ in digits.len()..style.pad_to {
        out.push_str(style.symbols[0]);
    }
    for &digit in digits {
        out.push_str(style.symbols[digit]);
    }
    out.push_str(style.suffix);
    out
}

/// Format `value` as a list marker in the named counter style, falling
/// back to `decimal` when the style can't represent it (and, failing that,
/// returning `None` only if `decimal` itself somehow can't — which never
/// happens since it accepts every `i64`).
pub fn format_counter(style_name: &Atom, value: i64) -> Option<String> {
    if style_name.eq_str("none") {
        return None;
    }
    let style = style_for(style_name.as_str()).unwrap_or(DECIMAL);
    // Only the numeric system has a sensible notion of negative markers;
    // every other system rejects negative values and falls back to decimal.
    let negative = value < 0 && style.system == CounterSystem::Numeric;
    let magnitude = if negative { -value } else { value };
    match symbol_digits(&style, magnitude) {
        Some(digits) => Some(render(&style, &digits, negative)),
        None => {
            let negative = magnitude < 0;
            let digits = numeric_digits(&DECIMAL, magnitude.abs());
            Some(render(&DECIMAL, &digits, negative))
        }
    }
}

/// Format `value` into a caller-supplied byte buffer, returning the full
/// byte length the marker text requires. When `buf` is too small the
/// required length is still reported and the buffer is filled as far as
/// it can be without splitting a UTF-8 sequence; a caller can size a
/// second buffer from the first call's return value. A `none` style
/// writes nothing and reports zero.
#[must_use]
pub fn format_into(style_name: &Atom, value: i64, buf: &mut [u8]) -> usize {
    let Some(text) = format_counter(style_name, value) else {
        return 0;
    };
    let bytes = text.as_bytes();
    let mut fits = bytes.len().min(buf.len());
    while fits > 0 && !text.is_char_boundary(fits) {
        fits -= 1;
    }
    buf[..fits].copy_from_slice(&bytes[..fits]);
    bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(name: &str, value: i64) -> String {
        format_counter(&Atom::new(name), value).expect("style should format")
    }

    #[test]
    fn decimal_counts_up() {
        assert_eq!(fmt("decimal", 0), "0. ");
        assert_eq!(fmt("decimal", 42), "42. ");
        assert_eq!(fmt("decimal", -3), "-3. ");
    }

    #[test]
    fn decimal_leading_zero_pads_single_digits() {
        assert_eq!(fmt("decimal-leading-zero", 3), "03. ");
        assert_eq!(fmt("decimal-leading-zero", 42), "42. ");
    }

    #[test]
    fn lower_alpha_rolls_over_bijectively() {
        assert_eq!(fmt("lower-alpha", 1), "a. ");
        assert_eq!(fmt("lower-alpha", 26), "z. ");
        assert_eq!(fmt("lower-alpha", 27), "aa. ");
        assert_eq!(fmt("lower-alpha", 28), "ab. ");
    }

    #[test]
    fn upper_roman_handles_classical_range() {
        assert_eq!(fmt("upper-roman", 1994), "MCMXCIV. ");
        assert_eq!(fmt("upper-roman", 4), "IV. ");
        assert_eq!(fmt("upper-roman", 9), "IX. ");
    }

    #[test]
    fn roman_out_of_range_falls_back_to_decimal() {
        assert_eq!(fmt("upper-roman", 4000), "4000. ");
        assert_eq!(fmt("lower-roman", 0), "0. ");
    }

    #[test]
    fn cyclic_styles_ignore_the_value() {
        assert_eq!(fmt("disc", 1), "\u{2022} ");
        assert_eq!(fmt("disc", 500), "\u{2022} ");
    }

    #[test]
    fn none_suppresses_the_marker() {
        assert_eq!(format_counter(&Atom::new("none"), 3), None);
    }

    #[test]
    fn unknown_style_name_falls_back_to_decimal() {
        assert_eq!(fmt("not-a-real-style", 7), "7. ");
    }

    #[test]
    fn additive_georgian_matches_known_value() {
        // 2021 = 2000 + 20 + 1
        assert_eq!(fmt("georgian", 2021), "ცკა. ");
    }

    #[test]
    fn format_into_reports_full_length_even_when_truncating() {
        let style = Atom::new("upper-roman");
        let mut big = [0u8; 32];
        let needed = format_into(&style, 1999, &mut big);
        assert_eq!(&big[..needed], "MCMXCIX. ".as_bytes());

        let mut small = [0u8; 4];
        let still_needed = format_into(&style, 1999, &mut small);
        assert_eq!(still_needed, needed);
        assert_eq!(&small, b"MCMX");
    }

    #[test]
    fn format_into_truncates_on_character_boundaries() {
        let style = Atom::new("georgian");
        // The first symbol of 2021 is a 3-byte sequence; a 4-byte buffer
        // holds one symbol plus an unsplittable fragment of the next.
        let mut buf = [0u8; 4];
        let needed = format_into(&style, 2021, &mut buf);
        assert_eq!(needed, "ცკა. ".len());
        assert_eq!(&buf[..3], "ც".as_bytes());
        assert_eq!(buf[3], 0);
    }

    #[test]
    fn format_into_reports_zero_for_none() {
        let mut buf = [0u8; 8];
        assert_eq!(format_into(&Atom::new("none"), 3, &mut buf), 0);
    }
}
