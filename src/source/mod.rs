//! Looping background video: loop geometry, bounded decoder seeks and crossfade layering.

/// Loop and crossfade arithmetic.
pub mod looping;
/// Decoder ownership and per-frame layer resolution.
pub mod manager;
/// Decoder worker threads.
pub mod worker;
