/// Per-frame render driver and job entry points.
pub mod render;
