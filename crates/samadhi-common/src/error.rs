//! Error categories shared across SAMADhi crates
//!
//! Each crate keeps its own `thiserror` enum; this module only fixes the
//! coarse taxonomy those enums report, so callers can pick an exit status
//! or decide whether a failure happened before the database was touched.

use serde::{Deserialize, Serialize};

/// Coarse classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Missing, malformed or over-permissive credentials file
    Configuration,
    /// A field holds a value outside its allowed set
    Validation,
    /// The caller asked for something that cannot be expressed
    /// (missing mandatory field, unsupported filter combination)
    Usage,
    /// Anything raised by the database layer
    Storage,
}

impl ErrorCategory {
    /// Process exit status for a failure of this category.
    ///
    /// Usage errors follow the argument-parser convention of `2`.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorCategory::Usage => 2,
            ErrorCategory::Configuration | ErrorCategory::Validation | ErrorCategory::Storage => 1,
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::Usage => write!(f, "usage"),
            ErrorCategory::Storage => write!(f, "storage"),
        }
    }
}

/// Implemented by error types that can say which category they belong to
pub trait Categorized {
    fn category(&self) -> ErrorCategory;
}
