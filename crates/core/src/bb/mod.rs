//! Basic-block extraction.
//!
//! Builds a [`BasicBlockMap`] — a partial function from PC to a stable
//! basic-block id — from a single pass over a trace, using the sorted
//! marker-list-with-bisection representation described in the redesign
//! notes (a plain sorted `Vec` instead of an interval tree, since the map
//! is built once and then only ever read).

/// The single-pass raw interval extraction and its `UnexpectedControlTransfer`
/// failure mode.
pub mod extractor;
/// Interval-to-marker sweep and the [`BasicBlockMap`] bisection lookup.
pub mod markers;

pub use extractor::extract;
pub use markers::BasicBlockMap;
