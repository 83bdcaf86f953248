//! Error types for pipeline commands.
//!
//! Errors are classified by who can fix them:
//! - User-correctable: missing fields, illegal transitions, unknown ids
//! - System: storage and configuration failures
//!
//! Text-generation failures never appear here; they are absorbed by
//! `intelligence::Assistant` and replaced with fallback values.

use thiserror::Error;

use crate::db::DbError;

/// Error returned by a pipeline command. A failed command leaves the store
/// untouched.
#[derive(Debug, Error)]
pub enum CrmError {
    #[error("{field} is required: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Cannot {command} {entity} {id} while it is {from}")]
    InvalidTransition {
        entity: &'static str,
        id: String,
        from: String,
        command: &'static str,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] DbError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not render output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CrmError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        CrmError::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: &str) -> Self {
        CrmError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn invalid_transition(
        entity: &'static str,
        id: &str,
        from: impl ToString,
        command: &'static str,
    ) -> Self {
        CrmError::InvalidTransition {
            entity,
            id: id.to_string(),
            from: from.to_string(),
            command,
        }
    }

    /// Returns true if the caller can fix this by changing the command input.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            CrmError::Validation { .. }
                | CrmError::NotFound { .. }
                | CrmError::InvalidTransition { .. }
        )
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CrmError::Validation { .. } => "Fill in the required field and try again.",
            CrmError::NotFound { .. } => "The record may have been deleted. Refresh the list.",
            CrmError::InvalidTransition { .. } => {
                "This action is not available for the record's current status."
            }
            CrmError::Storage(_) => "Check disk space and permissions on the data directory.",
            CrmError::Config(_) => "Check your configuration in ~/.leadbook/config.json",
            CrmError::Output(_) => "Retry the command with RUST_LOG=debug and report the failing record.",
        }
    }
}

pub type CrmResult<T> = Result<T, CrmError>;

/// Serializable error representation for UI callers.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub message: String,
    pub error_type: ErrorType,
    pub recovery_suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    Validation,
    NotFound,
    Transition,
    System,
}

impl From<&CrmError> for CommandError {
    fn from(err: &CrmError) -> Self {
        let error_type = match err {
            CrmError::Validation { .. } => ErrorType::Validation,
            CrmError::NotFound { .. } => ErrorType::NotFound,
            CrmError::InvalidTransition { .. } => ErrorType::Transition,
            CrmError::Storage(_) | CrmError::Config(_) | CrmError::Output(_) => ErrorType::System,
        };

        CommandError {
            message: err.to_string(),
            error_type,
            recovery_suggestion: err.recovery_suggestion().to_string(),
        }
    }
}
