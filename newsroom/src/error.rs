//! Error types for the newsroom client

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for newsroom operations
pub type Result<T> = std::result::Result<T, NewsError>;

/// A single failed field check, reported back to the form that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field name as the form knows it (e.g. "title", "card_image_url")
    pub field: String,
    /// Human readable message
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Newsroom error types
#[derive(Error, Debug)]
pub enum NewsError {
    /// Local pre-flight check failed; nothing was sent
    #[error("Validation failed: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    /// Action needs an authenticated viewer and there is none
    #[error("Sign in required")]
    MissingViewer,

    /// Collaborator rejected the action for this identity
    #[error("Not permitted: {0}")]
    Authorization(String),

    /// Network or collaborator failure, safe to retry
    #[error("Network error: {0}")]
    Transient(String),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Collaborator refused because of the entity's current state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Collaborator-owned invariant observed broken
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// How a failure propagates to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Inline feedback, no optimistic state touched
    Validation,
    /// Rollback plus a "not permitted" notice
    Authorization,
    /// Rollback plus a dismissible notice
    Transient,
    /// Background log only
    Invariant,
}

impl NewsError {
    /// Shorthand for a single-field validation failure
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        NewsError::Validation(vec![FieldError::new(field, message)])
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            NewsError::Validation(_) | NewsError::MissingViewer => ErrorClass::Validation,
            NewsError::Authorization(_) | NewsError::Conflict(_) => ErrorClass::Authorization,
            NewsError::InvariantViolation(_) => ErrorClass::Invariant,
            NewsError::Transient(_)
            | NewsError::NotFound(_)
            | NewsError::Serialization(_)
            | NewsError::Config(_) => ErrorClass::Transient,
        }
    }

    /// Whether the failed action may simply be tried again
    pub fn is_retryable(&self) -> bool {
        matches!(self, NewsError::Transient(_))
    }

    /// Map a non-success HTTP status from a collaborator onto the taxonomy
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            401 | 403 => NewsError::Authorization(body),
            404 => NewsError::NotFound(body),
            409 => NewsError::Conflict(body),
            _ => NewsError::Transient(format!("HTTP {} - {}", status, body)),
        }
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<reqwest::Error> for NewsError {
    fn from(err: reqwest::Error) -> Self {
        NewsError::Transient(err.to_string())
    }
}

impl From<serde_json::Error> for NewsError {
    fn from(err: serde_json::Error) -> Self {
        NewsError::Serialization(err.to_string())
    }
}
