//! Creation-time validation helpers
//!
//! Constructors call these before anything is written, so a rejected
//! record never leaves a partial row behind.
//!
//! ```rust
//! use samadhi_store::validation::{check_choice, require_text};
//!
//! let name = Some("ttbar".to_string());
//! assert_eq!(require_text("Dataset", "name", &name).unwrap(), "ttbar");
//! assert!(check_choice("Dataset", "datatype", "MC", &["mc", "data"]).is_err());
//! ```

use samadhi_common::{Categorized, ErrorCategory};
use thiserror::Error;

/// Rejections raised before a record is inserted
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A mandatory field was not supplied
    #[error("Argument '{field}' is required to construct {entity}")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },

    /// A field holds a value outside its enumerated set
    #[error("{entity} {field} must be one of {allowed}, not '{value}'")]
    InvalidChoice {
        entity: &'static str,
        field: &'static str,
        value: String,
        allowed: String,
    },
}

impl Categorized for ValidationError {
    fn category(&self) -> ErrorCategory {
        match self {
            ValidationError::MissingField { .. } => ErrorCategory::Usage,
            ValidationError::InvalidChoice { .. } => ErrorCategory::Validation,
        }
    }
}

/// Require a non-text mandatory field
pub fn require<'a, T>(
    entity: &'static str,
    field: &'static str,
    value: &'a Option<T>,
) -> Result<&'a T, ValidationError> {
    value
        .as_ref()
        .ok_or(ValidationError::MissingField { entity, field })
}

/// Require a mandatory text field; blank strings count as missing
pub fn require_text<'a>(
    entity: &'static str,
    field: &'static str,
    value: &'a Option<String>,
) -> Result<&'a str, ValidationError> {
    match value.as_deref() {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ValidationError::MissingField { entity, field }),
    }
}

/// Check `value` against an exact (case-sensitive) list of allowed values
pub fn check_choice(
    entity: &'static str,
    field: &'static str,
    value: &str,
    allowed: &[&str],
) -> Result<(), ValidationError> {
    if allowed.contains(&value) {
        return Ok(());
    }
    Err(ValidationError::InvalidChoice {
        entity,
        field,
        value: value.to_string(),
        allowed: allowed.join(", "),
    })
}
