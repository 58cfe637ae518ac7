//! Fatal engine errors.
//!
//! Most malformed input (an unparseable selector, an unknown property, a
//! declaration with the wrong value type) is handled by *recovering*:
//! dropping the offending construct and reporting it through
//! [`koala_common::diagnostics`] rather than failing the whole sheet, per
//! the error-recovery grammar in [`sheet`](crate::sheet). `CssError` is
//! reserved for conditions a caller needs to act on — a sheet with no more
//! bytes to give a resumed parse, a charset the engine doesn't recognize, a
//! URL a client refuses to resolve.
//!
//! One variant exists per failure condition a caller can meaningfully
//! distinguish; a successful operation is simply `Result::Ok(_)`.

use thiserror::Error;

/// A fatal engine error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CssError {
    /// An allocation failed. The engine has no allocation failure path of
    /// its own (Rust's global allocator aborts on exhaustion), but the
    /// variant is kept for parity with embedders that pre-flight a budget.
    #[error("out of memory")]
    NoMem,

    /// A caller passed a parameter the engine rejects (e.g. an empty base
    /// URL where one is required).
    #[error("bad parameter: {0}")]
    BadParam(String),

    /// The input is not valid CSS at a point recovery can't paper over
    /// (e.g. a completely unparseable `@` rule prelude consumed to EOF).
    #[error("invalid CSS: {0}")]
    Invalid(String),

    /// A referenced resource (an `@import`ed sheet) could not be located.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// The sheet builder was asked to finish parsing but is mid-construct
    /// and needs more bytes appended before it can proceed.
    #[error("more data needed to continue parsing")]
    NeedData,

    /// An `@charset` or transport-supplied charset names an encoding this
    /// engine does not support.
    #[error("unsupported charset: {0}")]
    BadCharset(String),

    /// The input ended where a token was expected mid-construct.
    #[error("unexpected end of input")]
    Eof,
}

/// Convenience alias for engine operations that can fail fatally.
pub type Result<T> = std::result::Result<T, CssError>;
