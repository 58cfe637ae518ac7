//! 32-bit colors.
//!
//! [CSS Color Level 4 § 4](https://www.w3.org/TR/css-color-4/#color-syntax)
//!
//! A resolved color is packed as AARRGGBB. `currentColor` and
//! `transparent` are *not* resolved colors — they're sentinels the cascade
//! substitutes during computed-value resolution (`currentColor` pulls the
//! element's own computed `color`; `transparent` is alpha-zero black,
//! which colors all channels correctly under `color-interpolation`).

use serde::Serialize;

/// A color value: either a resolved 32-bit AARRGGBB color, or one of the
/// two keyword sentinels that must be resolved against computed-style
/// context before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Color {
    /// A resolved color, packed as `0xAARRGGBB`.
    Rgba(u32),
    /// [§ 4.5 `currentcolor`](https://www.w3.org/TR/css-color-4/#currentcolor-color)
    /// "the value of the `color` property on the current element".
    CurrentColor,
    /// [§ 4.2.4 `transparent`](https://www.w3.org/TR/css-color-4/#transparent-color)
    /// Alpha-zero black.
    Transparent,
}

impl Color {
    /// Opaque black, the initial value of `color`.
    pub const BLACK: Self = Self::Rgba(0xFF00_0000);
    /// Opaque white.
    pub const WHITE: Self = Self::Rgba(0xFFFF_FFFF);

    /// Pack discrete RGBA channels (0-255 each) into a resolved color.
    #[must_use]
    pub const fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::Rgba(
            ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32),
        )
    }

    /// Channel accessors: (r, g, b, a), each 0-255. `currentColor` and
    /// `transparent` are not resolved here — callers must substitute
    /// `currentColor` against computed `color` first.
    #[must_use]
    pub const fn channels(self) -> Option<(u8, u8, u8, u8)> {
        match self {
            Self::Rgba(packed) => Some((
                ((packed >> 16) & 0xFF) as u8,
                ((packed >> 8) & 0xFF) as u8,
                (packed & 0xFF) as u8,
                ((packed >> 24) & 0xFF) as u8,
            )),
            Self::CurrentColor | Self::Transparent => None,
        }
    }

    /// [§ 4.2.1 RGB hexadecimal notations](https://www.w3.org/TR/css-color-4/#hex-notation)
    /// "The syntax of a `<hex-color>` is a `<hash-token>` token whose value
    /// consists of 3, 4, 6, or 8 hexadecimal digits."
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let digit = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let r = digit(&hex[0..1].repeat(2))?;
                let g = digit(&hex[1..2].repeat(2))?;
                let b = digit(&hex[2..3].repeat(2))?;
                Some(Self::from_rgba(r, g, b, 255))
            }
            4 => {
                let r = digit(&hex[0..1].repeat(2))?;
                let g = digit(&hex[1..2].repeat(2))?;
                let b = digit(&hex[2..3].repeat(2))?;
                let a = digit(&hex[3..4].repeat(2))?;
                Some(Self::from_rgba(r, g, b, a))
            }
            6 => {
                let r = digit(&hex[0..2])?;
                let g = digit(&hex[2..4])?;
                let b = digit(&hex[4..6])?;
                Some(Self::from_rgba(r, g, b, 255))
            }
            8 => {
                let r = digit(&hex[0..2])?;
                let g = digit(&hex[2..4])?;
                let b = digit(&hex[4..6])?;
                let a = digit(&hex[6..8])?;
                Some(Self::from_rgba(r, g, b, a))
            }
            _ => None,
        }
    }

    /// [§ 6.1 Named colors](https://www.w3.org/TR/css-color-4/#named-colors)
    ///
    /// Looks up the extended CSS named-color keyword table. A pragmatic
    /// subset — the commonly-authored names plus the handful CSS2
    /// inherited from the X11 table — rather than the full ~150-entry
    /// table; unknown names fall through to the client's color resolver.
    #[must_use]
    pub fn from_named(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        Some(match lower.as_str() {
            "transparent" => return Some(Self::Transparent),
            "currentcolor" => return Some(Self::CurrentColor),
            "black" => Self::from_rgba(0, 0, 0, 255),
            "white" => Self::from_rgba(255, 255, 255, 255),
            "red" => Self::from_rgba(255, 0, 0, 255),
            "green" => Self::from_rgba(0, 128, 0, 255),
            "blue" => Self::from_rgba(0, 0, 255, 255),
            "yellow" => Self::from_rgba(255, 255, 0, 255),
            "orange" => Self::from_rgba(255, 165, 0, 255),
            "purple" => Self::from_rgba(128, 0, 128, 255),
            "gray" | "grey" => Self::from_rgba(128, 128, 128, 255),
            "silver" => Self::from_rgba(192, 192, 192, 255),
            "maroon" => Self::from_rgba(128, 0, 0, 255),
            "navy" => Self::from_rgba(0, 0, 128, 255),
            "teal" => Self::from_rgba(0, 128, 128, 255),
            "olive" => Self::from_rgba(128, 128, 0, 255),
            "lime" => Self::from_rgba(0, 255, 0, 255),
            "aqua" | "cyan" => Self::from_rgba(0, 255, 255, 255),
            "fuchsia" | "magenta" => Self::from_rgba(255, 0, 255, 255),
            _ => return None,
        })
    }

    /// Resolve `currentColor` against the element's own computed `color`,
    /// leaving any other color unchanged.
    #[must_use]
    pub fn resolve_current(self, current: Self) -> Self {
        match self {
            Self::CurrentColor => current,
            other => other,
        }
    }

    /// [§ 7.1 HSL to RGB](https://www.w3.org/TR/css-color-4/#hsl-to-rgb).
    ///
    /// `hue` is in degrees and may be any value — it's normalized into
    /// [0, 360) first, so `hsl(450, ...)` and `hsl(90, ...)` are the same
    /// color. `saturation`/`lightness` are fractions clamped to [0, 1].
    #[must_use]
    pub fn from_hsla(hue: f64, saturation: f64, lightness: f64, alpha: f64) -> Self {
        let hue = hue.rem_euclid(360.0);
        let saturation = saturation.clamp(0.0, 1.0);
        let lightness = lightness.clamp(0.0, 1.0);

        let channel = |n: f64| {
            let k = (n + hue / 30.0).rem_euclid(12.0);
            let a = saturation * lightness.min(1.0 - lightness);
            lightness - a * (k - 3.0).min(9.0 - k).clamp(-1.0, 1.0)
        };

        Self::from_rgba(
            unit_to_byte(channel(0.0)),
            unit_to_byte(channel(8.0)),
            unit_to_byte(channel(4.0)),
            unit_to_byte(alpha),
        )
    }

    /// [§ 8 HWB](https://www.w3.org/TR/css-color-4/#hwb-to-rgb).
    ///
    /// When `white + black >= 1`, the color is an achromatic grey at
    /// `white / (white + black)` regardless of hue.
    #[must_use]
    pub fn from_hwba(hue: f64, white: f64, black: f64, alpha: f64) -> Self {
        let white = white.clamp(0.0, 1.0);
        let black = black.clamp(0.0, 1.0);
        if white + black >= 1.0 {
            let grey = unit_to_byte(white / (white + black));
            return Self::from_rgba(grey, grey, grey, unit_to_byte(alpha));
        }
        // Start from the fully saturated hue, then mix toward white and
        // away from black.
        let Some((r, g, b, _)) = Self::from_hsla(hue, 1.0, 0.5, 1.0).channels() else {
            return Self::BLACK;
        };
        let mix = |c: u8| {
            let normalized = f64::from(c) / 255.0;
            unit_to_byte(normalized * (1.0 - white - black) + white)
        };
        Self::from_rgba(mix(r), mix(g), mix(b), unit_to_byte(alpha))
    }
}

fn unit_to_byte(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_three_digit_replicates_nibbles() {
        assert_eq!(Color::from_hex("#f00"), Some(Color::from_rgba(255, 0, 0, 255)));
    }

    #[test]
    fn hex_eight_digit_carries_alpha() {
        assert_eq!(
            Color::from_hex("#11223344"),
            Some(Color::from_rgba(0x11, 0x22, 0x33, 0x44))
        );
    }

    #[test]
    fn named_transparent_is_sentinel_not_rgba() {
        assert_eq!(Color::from_named("transparent"), Some(Color::Transparent));
    }

    #[test]
    fn current_color_resolves_against_element_color() {
        let resolved = Color::CurrentColor.resolve_current(Color::from_rgba(1, 2, 3, 255));
        assert_eq!(resolved, Color::from_rgba(1, 2, 3, 255));
    }

    #[test]
    fn channels_round_trip() {
        let c = Color::from_rgba(10, 20, 30, 200);
        assert_eq!(c.channels(), Some((10, 20, 30, 200)));
    }

    #[test]
    fn hsl_primary_hues_hit_exact_rgb() {
        assert_eq!(Color::from_hsla(0.0, 1.0, 0.5, 1.0), Color::from_rgba(255, 0, 0, 255));
        assert_eq!(Color::from_hsla(120.0, 1.0, 0.5, 1.0), Color::from_rgba(0, 255, 0, 255));
        assert_eq!(Color::from_hsla(240.0, 1.0, 0.5, 1.0), Color::from_rgba(0, 0, 255, 255));
    }

    #[test]
    fn hsl_hue_wraps_past_a_full_turn() {
        assert_eq!(
            Color::from_hsla(450.0, 1.0, 0.5, 1.0),
            Color::from_hsla(90.0, 1.0, 0.5, 1.0)
        );
        assert_eq!(
            Color::from_hsla(-120.0, 1.0, 0.5, 1.0),
            Color::from_hsla(240.0, 1.0, 0.5, 1.0)
        );
    }

    #[test]
    fn hsl_zero_saturation_is_grey() {
        let grey = Color::from_hsla(200.0, 0.0, 0.5, 1.0);
        let Some((r, g, b, _)) = grey.channels() else { panic!("resolved") };
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn hwb_white_plus_black_at_or_over_one_collapses_to_grey() {
        let c = Color::from_hwba(120.0, 0.75, 0.25, 1.0);
        let Some((r, g, b, _)) = c.channels() else { panic!("resolved") };
        assert_eq!((r, g, b), (191, 191, 191));
    }

    #[test]
    fn hwb_no_white_no_black_is_the_pure_hue() {
        assert_eq!(Color::from_hwba(0.0, 0.0, 0.0, 1.0), Color::from_rgba(255, 0, 0, 255));
    }
}
