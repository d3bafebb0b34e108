use crate::config::error::ConfigError;
use crate::error::DatabaseErrorConverter;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Application-wide error type.
///
/// Every failure that can reach an HTTP client is one of these variants; the
/// mapping to status codes and the JSON envelope lives in
/// `api::middleware::error_handler`.
#[derive(Error, Debug)]
pub enum AppError {
    /// A reservation or resource does not exist
    #[error("{message}")]
    NotFound { entity: String, message: String },

    /// The requested booking cannot be honored; `details` carries the
    /// computed availability figures returned to the client
    #[error("{message}")]
    Conflict {
        message: String,
        details: Map<String, Value>,
    },

    /// Single-field validation error
    #[error("{field}: {reason}")]
    Validation { field: String, reason: String },

    /// Field-level errors collected by `validator`
    #[error("Validation failed")]
    ValidationErrors { errors: Vec<ValidationFieldError> },

    /// Malformed body, query or path
    #[error("{message}")]
    BadRequest { message: String },

    #[error("Database operation failed: {operation}: {source}")]
    Database {
        operation: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Configuration error: {key}: {source}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Connection pool error: {source}")]
    ConnectionPool {
        #[source]
        source: anyhow::Error,
    },

    #[error("{source}")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

/// One failed field from a `validator` run
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ValidationFieldError {
    pub field: String,
    pub message: String,
}

impl AppError {
    pub fn reservation_not_found() -> Self {
        AppError::NotFound {
            entity: "prenotazione".to_string(),
            message: "Prenotazione non trovata".to_string(),
        }
    }

    pub fn material_not_found() -> Self {
        AppError::NotFound {
            entity: "materiale".to_string(),
            message: "Materiale non trovato".to_string(),
        }
    }

    pub fn vehicle_not_found() -> Self {
        AppError::NotFound {
            entity: "veicolo".to_string(),
            message: "Veicolo non trovato".to_string(),
        }
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest {
            message: message.into(),
        }
    }

    /// Builds a conflict from any serializable figures; non-object values
    /// leave `details` empty
    pub fn conflict<T: Serialize>(message: impl Into<String>, details: &T) -> Self {
        let details = match serde_json::to_value(details) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        AppError::Conflict {
            message: message.into(),
            details,
        }
    }

    /// Attaches one more field to a conflict's details; other variants pass
    /// through unchanged
    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        if let AppError::Conflict { details, .. } = &mut self {
            details.insert(key.to_string(), value.into());
        }
        self
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(error: diesel::result::Error) -> Self {
        DatabaseErrorConverter::convert_diesel_error(error, "database operation")
    }
}

impl From<bb8::RunError<diesel_async::pooled_connection::PoolError>> for AppError {
    fn from(error: bb8::RunError<diesel_async::pooled_connection::PoolError>) -> Self {
        AppError::ConnectionPool {
            source: anyhow::Error::from(error),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<ValidationFieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, field_errors)| {
                field_errors.iter().map(move |error| ValidationFieldError {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string()),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));

        AppError::ValidationErrors { errors: fields }
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        let key = match &error {
            ConfigError::ValidationError { field, .. } => field.clone(),
            _ => "configuration".to_string(),
        };
        AppError::Configuration {
            key,
            source: anyhow::Error::from(error),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::bad_request(rejection.body_text())
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;
