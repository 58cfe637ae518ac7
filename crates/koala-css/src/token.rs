//! CSS tokens per [CSS Syntax Level 3 § 4](https://www.w3.org/TR/css-syntax-3/#tokenization).
//!
//! "The output of the tokenization step is a stream of zero or more of the
//! following tokens: <ident-token>, <function-token>, <at-keyword-token>,
//! <hash-token>, <string-token>, <bad-string-token>, <url-token>,
//! <bad-url-token>, <delim-token>, <number-token>, <percentage-token>,
//! <dimension-token>, <whitespace-token>, <CDO-token>, <CDC-token>,
//! <colon-token>, <semicolon-token>, <comma-token>, and the bracket/brace/
//! paren tokens."
//!
//! Every token that carries text (idents, at-keywords, hash values,
//! strings, urls, dimension units) stores an [`Atom`] rather than a
//! `String` — property names, keywords, and units recur constantly across
//! a sheet, and interning lets later stages (selector matching, property
//! dispatch) compare by pointer instead of by byte.

use core::fmt;
use koala_common::atom::Atom;
use koala_common::fixed::Fixed;

/// Whether a hash token's value is usable as an identifier on its own.
///
/// [§ 4.2 Definitions](https://www.w3.org/TR/css-syntax-3/#token-diagrams)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashType {
    /// The hash token's value is a valid identifier (`#foo`, an ID
    /// selector candidate).
    Id,
    /// The hash token's value is not a valid identifier on its own
    /// (`#123`, a hex color candidate).
    Unrestricted,
}

/// Whether a numeric token's representation had a decimal point or
/// exponent.
///
/// [§ 4.2 Definitions](https://www.w3.org/TR/css-syntax-3/#token-diagrams)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericType {
    /// No decimal point or exponent; `int_value` is populated.
    Integer,
    /// Had a decimal point or exponent.
    Number,
}

/// A single CSS token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `<ident-token>`
    Ident(Atom),
    /// `<function-token>` — an ident immediately followed by `(`.
    Function(Atom),
    /// `<at-keyword-token>` — `@` followed by an ident sequence.
    AtKeyword(Atom),
    /// `<hash-token>` — `#` followed by an ident sequence.
    Hash {
        /// The text after the `#`.
        value: Atom,
        /// Whether `value` alone is a valid identifier.
        hash_type: HashType,
    },
    /// `<string-token>`
    String(Atom),
    /// `<bad-string-token>` — an unterminated string (hit a bare newline).
    BadString,
    /// `<url-token>` — an unquoted `url(...)`.
    Url(Atom),
    /// `<bad-url-token>` — a `url(...)` with unexpected content inside.
    BadUrl,
    /// `<delim-token>` — any single character that didn't match a more
    /// specific production.
    Delim(char),
    /// `<number-token>`
    Number {
        /// The numeric value.
        value: Fixed,
        /// Populated when `numeric_type` is [`NumericType::Integer`].
        int_value: Option<i64>,
        /// Whether the source representation had a `.` or exponent.
        numeric_type: NumericType,
        /// The raw source lexeme, needed by quirks-mode color parsing
        /// (`color: 123456` is a hex color only if the lexeme is exactly
        /// six hex digits, which the converted value can't tell us).
        repr: Atom,
    },
    /// `<percentage-token>` — a number immediately followed by `%`.
    Percentage {
        /// The numeric value, without the `%` applied.
        value: Fixed,
        /// Populated when `numeric_type` is [`NumericType::Integer`].
        int_value: Option<i64>,
        /// Whether the source representation had a `.` or exponent.
        numeric_type: NumericType,
    },
    /// `<dimension-token>` — a number immediately followed by an ident
    /// (its unit).
    Dimension {
        /// The numeric magnitude.
        value: Fixed,
        /// Populated when `numeric_type` is [`NumericType::Integer`].
        int_value: Option<i64>,
        /// Whether the source representation had a `.` or exponent.
        numeric_type: NumericType,
        /// The unit text, not yet validated against [`crate::unit::Unit`].
        unit: Atom,
        /// The raw numeric-prefix lexeme, excluding the unit. The full
        /// source lexeme is `repr` + `unit`.
        repr: Atom,
    },
    /// `<whitespace-token>` — one or more whitespace code points, collapsed.
    Whitespace,
    /// `<CDO-token>` — `<!--`.
    Cdo,
    /// `<CDC-token>` — `-->`.
    Cdc,
    /// `<colon-token>`
    Colon,
    /// `<semicolon-token>`
    Semicolon,
    /// `<comma-token>`
    Comma,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// End of input. The tokenizer yields this once and then stops.
    Eof,
}

impl Token {
    /// Whether this is the terminal [`Token::Eof`].
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }

    /// Whether this is [`Token::Whitespace`]. Convenient for "skip
    /// whitespace" loops in the sheet builder and selector parser.
    #[must_use]
    pub const fn is_whitespace(&self) -> bool {
        matches!(self, Self::Whitespace)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(v) => write!(f, "<ident:{v}>"),
            Self::Function(v) => write!(f, "<function:{v}(>"),
            Self::AtKeyword(v) => write!(f, "<at-keyword:@{v}>"),
            Self::Hash { value, hash_type } => {
                let t = match hash_type {
                    HashType::Id => "id",
                    HashType::Unrestricted => "unrestricted",
                };
                write!(f, "<hash:#{value} ({t})>")
            }
            Self::String(v) => write!(f, "<string:\"{v}\">"),
            Self::BadString => write!(f, "<bad-string>"),
            Self::Url(v) => write!(f, "<url:{v}>"),
            Self::BadUrl => write!(f, "<bad-url>"),
            Self::Delim(c) => write!(f, "<delim:{c}>"),
            Self::Number { value, .. } => write!(f, "<number:{}>", value.to_f64()),
            Self::Percentage { value, .. } => write!(f, "<percentage:{}%>", value.to_f64()),
            Self::Dimension { value, unit, .. } => {
                write!(f, "<dimension:{}{unit}>", value.to_f64())
            }
            Self::Whitespace => write!(f, "<whitespace>"),
            Self::Cdo => write!(f, "<CDO>"),
            Self::Cdc => write!(f, "<CDC>"),
            Self::Colon => write!(f, "<colon>"),
            Self::Semicolon => write!(f, "<semicolon>"),
            Self::Comma => write!(f, "<comma>"),
            Self::LeftBracket => write!(f, "<[>"),
            Self::RightBracket => write!(f, "<]>"),
            Self::LeftParen => write!(f, "<(>"),
            Self::RightParen => write!(f, "<)>"),
            Self::LeftBrace => write!(f, "<{{>"),
            Self::RightBrace => write!(f, "<}}>"),
            Self::Eof => write!(f, "<EOF>"),
        }
    }
}
