//! Utility functions for string formatting and comparison.

pub mod format;

pub use format::{
    age_display, cmp_ignore_case, contains_ignore_case, file_date, normalize_key, truncate_string,
};
