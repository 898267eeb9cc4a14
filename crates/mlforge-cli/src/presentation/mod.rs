//! Shared CLI presentation utilities.
//!
//! Keep this module format-only: no domain transforms.

pub mod model_display;
pub mod tables;

pub use model_display::{display_model, display_summary};
pub use tables::{format_optional, format_timestamp, print_separator, truncate_string};
