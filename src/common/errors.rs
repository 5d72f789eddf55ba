//! Error types for the workbench

use thiserror::Error;

use crate::strategy::FieldName;

/// Result type alias using our WorkbenchError
pub type Result<T> = std::result::Result<T, WorkbenchError>;

/// Main error type for strategy, evaluation, aggregation and engine operations
#[derive(Error, Debug)]
pub enum WorkbenchError {
    /// Malformed strategy, condition or action
    #[error("Validation error: {0}")]
    Validation(String),

    /// A condition references a field the market state does not carry
    #[error("Rule {rule_id}: field '{field}' is not present in the market state")]
    InvalidField { rule_id: String, field: FieldName },

    /// A `between` condition without a usable upper bound
    #[error("Rule {rule_id}: invalid range on '{field}' (low {low}, high {high:?})")]
    InvalidRange {
        rule_id: String,
        field: FieldName,
        low: f64,
        high: Option<f64>,
    },

    /// A bet outcome is missing a numeric field the aggregator needs
    #[error("Malformed bet outcome at index {index}: missing '{field}'")]
    MalformedOutcome { index: usize, field: &'static str },

    /// An aggregate figure left the range `Decimal` can represent
    #[error("Aggregate '{0}' is outside the representable decimal range")]
    Overflow(&'static str),

    /// The engine answered with a non-success status
    #[error("Transport error: engine returned status {status}: {body}")]
    Transport { status: u16, body: String },

    /// HTTP request errors (connection, timeout, body decoding)
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Invalid API response
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl WorkbenchError {
    /// Returns true when the failure came from talking to the engine rather
    /// than from the strategy or the outcome data.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            WorkbenchError::Transport { .. } | WorkbenchError::HttpRequest(_)
        )
    }
}
