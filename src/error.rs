//! Error types for Crew Desk.

use crate::operators::validators::FieldErrors;
use crate::operators::wizard::WizardStep;

/// Top-level error type for the back-office core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Encoding error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),

    #[error("Assignment error: {0}")]
    Assignment(#[from] AssignmentError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors from the operator create/update endpoints.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Request failed: {0}")]
    Transport(String),

    /// The server refused the request. `message` is already flattened for display.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Cannot read image {uri}: {reason}")]
    ImageRead { uri: String, reason: String },
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// Multipart encoding errors.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("Field {field} has no encoding rule")]
    UnhandledField { field: String },

    #[error("Field {field} expected a {expected} value")]
    KindMismatch { field: String, expected: String },

    #[error("Field {field} could not be serialized: {reason}")]
    Serialization { field: String, reason: String },
}

/// Operator wizard errors.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("{step} has {} invalid field(s)", .errors.len())]
    Invalid { step: WizardStep, errors: FieldErrors },

    #[error("Cannot move {direction} from {step}")]
    InvalidTransition { step: WizardStep, direction: String },

    #[error("Submit is only allowed from step3 (currently {step})")]
    NotOnFinalStep { step: WizardStep },

    #[error("Not every step has been validated")]
    Incomplete,

    #[error("The wizard session was closed")]
    SessionClosed,

    #[error("Encoding error: {0}")]
    Encode(#[from] EncodeError),

    /// Server message, surfaced verbatim.
    #[error("{0}")]
    Gateway(String),
}

/// Assignment roster errors.
#[derive(Debug, thiserror::Error)]
pub enum AssignmentError {
    #[error("Operator {operator_id} is already in the list")]
    DuplicateOperator { operator_id: i64 },

    #[error("Operator {operator_id} is not in the list")]
    UnknownOperator { operator_id: i64 },

    #[error("Assignment belongs to order {got}, list is for order {expected}")]
    OrderMismatch { expected: i64, got: i64 },

    #[error("Additional costs cannot be negative ({0})")]
    NegativeCost(rust_decimal::Decimal),

    #[error("There are no assignments to submit")]
    EmptyBatch,

    #[error("A submission is already in progress")]
    AlreadySubmitting,

    #[error("The roster session was closed")]
    SessionClosed,
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
