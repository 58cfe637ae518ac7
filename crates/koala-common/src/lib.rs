//! Shared infrastructure for the Koala CSS engine.
//!
//! This crate provides the primitives every other part of the engine builds
//! on top of:
//! - **Atoms** ([`atom`]) — reference-counted interned strings, one table
//!   per thread, so every identifier (property name, keyword, selector
//!   name, URI, font family) is stored exactly once per engine.
//! - **Fixed-point numbers** ([`fixed`]) — the 32-bit, 10-fractional-bit
//!   representation every CSS numeric value (length, percentage, angle,
//!   ratio, time, frequency, resolution) is stored and computed in.
//! - **Diagnostics** ([`diagnostics`]) — a deduplicating warning channel for
//!   recoverable parse/cascade errors.
//! - **URL resolution** ([`url`]) — resolving `@import` URIs against a
//!   sheet's base URL.

/// Reference-counted interned strings, one table per thread.
pub mod atom;
/// Deduplicating diagnostic/warning channel for recoverable errors.
pub mod diagnostics;
/// 32-bit fixed-point number with 10 fractional bits.
pub mod fixed;
/// URL resolution for `@import` and similar relative references.
pub mod url;
