//! Errors that reach the caller of the gateway.
//!
//! Provider failures never show up here: fallback chains absorb them and
//! answer from local synthesis instead. Only caller mistakes and
//! caller-initiated cancellation are surfaced.

use std::error::Error;
use std::fmt;
use std::time::Duration;

/// The caller handed the gateway input it cannot work with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    field: &'static str,
    message: String,
}

impl ValidationError {
    pub fn empty(field: &'static str) -> Self {
        Self {
            field,
            message: format!("{field} is required"),
        }
    }

    pub fn field(&self) -> &'static str {
        self.field
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for ValidationError {}

/// Marker returned by chains and pollers when the caller's cancellation
/// token fired mid-resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("request cancelled")
    }
}

impl Error for Cancelled {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    Validation(ValidationError),
    Cancelled,
    DeadlineExceeded(Duration),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Validation(err) => write!(f, "Invalid request: {err}"),
            GatewayError::Cancelled => f.write_str("Request cancelled"),
            GatewayError::DeadlineExceeded(deadline) => write!(
                f,
                "Request exceeded its {}ms deadline",
                deadline.as_millis()
            ),
        }
    }
}

impl Error for GatewayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GatewayError::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for GatewayError {
    fn from(err: ValidationError) -> Self {
        GatewayError::Validation(err)
    }
}

impl From<Cancelled> for GatewayError {
    fn from(_: Cancelled) -> Self {
        GatewayError::Cancelled
    }
}
