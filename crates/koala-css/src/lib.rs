//! Style-sheet builder and selector/cascade engine for the Koala browser.
//!
//! # Scope
//!
//! This crate turns raw CSS bytes into style sheets ([`sheet`]), matches a
//! DOM node against them, and produces a fully resolved computed style
//! ([`computed`]):
//!
//! - **Tokenizer** ([`token`], [`tokenizer`]) — [CSS Syntax Level 3 § 4
//!   Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization), as a
//!   lazy stream rather than an up-front `Vec`.
//! - **Values** ([`unit`], [`color`], [`calc`], [`value`]) — fixed-point
//!   numbers with units, 32-bit colors, the compiled-and-interned `calc()`
//!   stack machine, and declaration component values.
//! - **Selectors** ([`selector`]) — [Selectors Level
//!   4](https://www.w3.org/TR/selectors-4/): compound/complex selectors,
//!   combinators, specificity.
//! - **Media queries** ([`media`]) — feature tests combined by and/or/not,
//!   evaluated against a runtime [`media::MediaDescription`].
//! - **Style sheet** ([`sheet`]) — the rule grammar: style rules, `@media`,
//!   `@import`, `@charset`, `@page`, `@font-face`.
//! - **Cascade & computed style** ([`cascade`], [`computed`]) — selection,
//!   cascade ordering, and a hash-consed, reference-counted computed-style
//!   arena.
//! - **List markers** ([`list_style`]) — numeric, alphabetic, additive, and
//!   cyclic counter-style formatting.
//!
//! The engine is decoupled from any concrete DOM: it consumes one through
//! the small [`handler::NodeHandler`] trait. A real DOM implementation,
//! rendering/layout, and fetching are all out of scope for this crate.

/// The `calc()` expression evaluator: a postfix stack machine over
/// [`unit::Dimension`] values.
pub mod calc;
/// Cascade resolution: selecting, sorting, and applying matched rules.
pub mod cascade;
/// 32-bit AARRGGBB colors, including the `currentColor`/`transparent`
/// sentinels.
pub mod color;
/// Hash-consed, reference-counted computed-style storage.
pub mod computed;
/// Recoverable-error and fatal-error types for the engine.
pub mod error;
/// The `NodeHandler` trait the engine consumes a DOM through.
pub mod handler;
/// Counter-style list-marker formatting (`format_list_style`-equivalent).
pub mod list_style;
/// Media query parsing and evaluation.
pub mod media;
/// The property dispatch table: cascade/initial/compose per property.
pub mod properties;
/// Selector parsing, specificity, and node matching.
pub mod selector;
/// Style sheets, rules, and the sheet-building state machine.
pub mod sheet;
/// CSS token type.
pub mod token;
/// The lazy CSS tokenizer.
pub mod tokenizer;
/// Fixed-point dimensioned values: units, categories, conversions.
pub mod unit;
/// Declaration values: component-value trees and `var()` substitution.
pub mod value;

pub use cascade::{select, select_in, select_one, select_one_in, select_pseudo, SelectionContext};
pub use computed::ComputedStyle;
pub use error::CssError;
pub use handler::NodeHandler;
pub use media::MediaDescription;
pub use selector::PseudoElement;
pub use sheet::{Origin, SheetBuilder, SheetOptions, Stylesheet};
pub use unit::UnitContext;
