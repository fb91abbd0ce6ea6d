//! Filter error types.

use thiserror::Error;

/// Result type for filter parsing.
pub type Result<T> = std::result::Result<T, FilterError>;

/// Errors produced while parsing filter expressions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// The expression is not of the form `KEY==VALUE` or `KEY!=VALUE`.
    #[error("invalid filter '{expr}': {reason}")]
    Format {
        /// The offending expression as given on the command line.
        expr: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl FilterError {
    pub(crate) fn format(expr: &str, reason: impl Into<String>) -> Self {
        Self::Format {
            expr: expr.to_string(),
            reason: reason.into(),
        }
    }
}
