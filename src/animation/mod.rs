/// Caption entrance animation resolver.
pub mod caption;
/// Easing curves.
pub mod ease;
