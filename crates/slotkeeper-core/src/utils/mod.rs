//! Utility functions for date-time parsing and display formatting.

pub mod format;

pub use format::{format_datetime, parse_local_datetime, truncate_string};
