//! Display helpers shared by front ends.

pub mod format;

pub use format::{display_or_dash, format_date, truncate_string};
