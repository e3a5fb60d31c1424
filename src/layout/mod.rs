//! Pure text placement helpers. Nothing here touches pixels or fonts directly.

/// Vertical caption block placement.
pub mod caption;
/// Greedy word wrapping against a measurement oracle.
pub mod wrap;
