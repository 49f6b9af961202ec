//! Structured error types for the Quire layout engine.
//!
//! Overflow is never an error: an element that does not fit is reported
//! through [`LayoutResult`](crate::layout::LayoutResult). The variants here
//! cover what must fail fast, before layout begins.

use crate::model::ElementType;
use thiserror::Error;

/// The unified error type returned by all public Quire API functions.
#[derive(Debug, Error)]
pub enum QuireError {
    /// JSON input failed to parse as a valid Quire document.
    #[error("failed to parse document: {source}{}", hint_suffix(.hint))]
    ParseError {
        source: serde_json::Error,
        hint: String,
    },

    /// A dimension was negative, NaN or infinite.
    #[error("invalid {what}: {value} (dimensions must be finite and non-negative)")]
    InvalidDimension { what: &'static str, value: f64 },

    /// A table was declared without any columns.
    #[error("a table needs at least one column")]
    NoColumns,

    /// A custom layout strategy was assigned to an element it cannot lay out.
    #[error("a {strategy} strategy cannot lay out a {element} element")]
    IncompatibleStrategy {
        element: ElementType,
        strategy: ElementType,
    },

    /// The document driver gave up after producing too many pages.
    #[error("layout exceeded the page limit of {0}")]
    PageLimitExceeded(usize),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for QuireError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the Quire document schema. Check element types and property names.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        QuireError::ParseError { source: e, hint }
    }
}

/// Check that a dimension is finite and non-negative.
pub(crate) fn check_dimension(what: &'static str, value: f64) -> Result<(), QuireError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(QuireError::InvalidDimension { what, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_and_nan_dimensions_are_rejected() {
        assert!(check_dimension("width", 10.0).is_ok());
        assert!(check_dimension("width", 0.0).is_ok());
        assert!(matches!(
            check_dimension("width", -1.0),
            Err(QuireError::InvalidDimension { what: "width", .. })
        ));
        assert!(check_dimension("height", f64::NAN).is_err());
        assert!(check_dimension("height", f64::INFINITY).is_err());
    }

    #[test]
    fn parse_error_carries_hint() {
        let err: QuireError = serde_json::from_str::<serde_json::Value>("{\"a\": 1,}")
            .unwrap_err()
            .into();
        let message = err.to_string();
        assert!(message.starts_with("failed to parse document"));
        assert!(message.contains("Hint: Check for trailing commas"));
    }
}
