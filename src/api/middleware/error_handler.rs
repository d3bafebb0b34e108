//! Error handler for converting AppError to HTTP responses.
//!
//! Every `AppError` leaves the API through `IntoResponse` below, so status
//! mapping, the JSON envelope and error logging live in one place.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

use crate::api::dto::ErrorResponse;
use crate::error::AppError;

/// Maps an AppError variant to its HTTP status code.
///
/// - NotFound → 404
/// - Conflict, Validation, ValidationErrors, BadRequest → 400
/// - Database, Configuration, ConnectionPool, Internal → 500
pub fn error_to_status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::Conflict { .. }
        | AppError::Validation { .. }
        | AppError::ValidationErrors { .. }
        | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        AppError::Database { .. }
        | AppError::Configuration { .. }
        | AppError::ConnectionPool { .. }
        | AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Machine-readable code carried next to the message
pub fn error_to_code(error: &AppError) -> &'static str {
    match error {
        AppError::NotFound { .. } => "NOT_FOUND",
        AppError::Conflict { .. } => "AVAILABILITY_CONFLICT",
        AppError::Validation { .. } | AppError::ValidationErrors { .. } => "VALIDATION_ERROR",
        AppError::BadRequest { .. } => "BAD_REQUEST",
        AppError::Database { .. } => "DATABASE_ERROR",
        AppError::Configuration { .. } => "CONFIGURATION_ERROR",
        AppError::ConnectionPool { .. } => "SERVICE_UNAVAILABLE",
        AppError::Internal { .. } => "INTERNAL_ERROR",
    }
}

fn error_body(error: &AppError) -> ErrorResponse {
    let code = error_to_code(error);

    match error {
        AppError::Conflict { message, details } => {
            ErrorResponse::new(code, message).with_extra(details.clone())
        }
        AppError::Validation { field, reason } => {
            ErrorResponse::new(code, reason).with_field("field", field.as_str())
        }
        AppError::ValidationErrors { errors } => {
            let message = errors
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect::<Vec<_>>()
                .join("; ");
            ErrorResponse::new(code, &message).with_field("errors", json!(errors))
        }
        other => ErrorResponse::new(code, &other.to_string()),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = error_to_status_code(&self);

        if status.is_server_error() {
            error!(error = %self, error_debug = ?self, status = status.as_u16(), "Request failed");
        } else {
            warn!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(error_body(&self))).into_response()
    }
}

/// Wraps non-JSON error responses produced outside the handlers (unknown
/// route, wrong method) in the standard envelope.
pub async fn global_error_handler(
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let response = next.run(request).await;
    let status = response.status();

    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));
    if is_json {
        return response;
    }

    let (parts, body) = response.into_parts();
    let body_bytes = axum::body::to_bytes(body, 64 * 1024)
        .await
        .unwrap_or_default();
    let original = String::from_utf8_lossy(&body_bytes).trim().to_string();

    let message = if original.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Errore sconosciuto")
            .to_string()
    } else {
        original
    };
    let code = match status {
        StatusCode::NOT_FOUND => "NOT_FOUND",
        StatusCode::METHOD_NOT_ALLOWED => "METHOD_NOT_ALLOWED",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "UNSUPPORTED_MEDIA_TYPE",
        StatusCode::PAYLOAD_TOO_LARGE => "PAYLOAD_TOO_LARGE",
        StatusCode::REQUEST_TIMEOUT => "REQUEST_TIMEOUT",
        s if s.is_server_error() => "INTERNAL_ERROR",
        _ => "BAD_REQUEST",
    };

    let mut response = (status, Json(ErrorResponse::new(code, &message))).into_response();
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            response.headers_mut().insert(name.clone(), value.clone());
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::MaterialAvailability;
    use crate::error::ValidationFieldError;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            error_to_status_code(&AppError::reservation_not_found()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_to_status_code(&AppError::validation("quantita", "troppo poco")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_to_status_code(&AppError::bad_request("json")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_to_status_code(&AppError::Internal {
                source: anyhow::anyhow!("boom")
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            error_to_status_code(&AppError::ConnectionPool {
                source: anyhow::anyhow!("timed out")
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_not_found_body() {
        let response = AppError::reservation_not_found().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert_eq!(json["error"], "Prenotazione non trovata");
        assert_eq!(json["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_conflict_body_carries_figures() {
        let error = MaterialAvailability::compute(1, 10, 2, 0, 9).into_conflict();
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["error"], "Quantità non disponibile: richiesti 9, disponibili 8");
        assert_eq!(json["disponibile"], 8);
        assert_eq!(json["richiesta"], 9);
        assert_eq!(json["mancante"], 1);
        assert_eq!(json["quantita_totale"], 10);
    }

    #[tokio::test]
    async fn test_validation_errors_body() {
        let error = AppError::ValidationErrors {
            errors: vec![ValidationFieldError {
                field: "quantita".to_string(),
                message: "La quantità deve essere almeno 1".to_string(),
            }],
        };

        let json = body_json(error.into_response()).await;
        assert_eq!(json["error"], "quantita: La quantità deve essere almeno 1");
        assert_eq!(json["errors"][0]["field"], "quantita");
    }

    #[tokio::test]
    async fn test_internal_message_is_surfaced() {
        let error = AppError::Internal {
            source: anyhow::anyhow!("disk on fire"),
        };

        let json = body_json(error.into_response()).await;
        assert_eq!(json["error"], "disk on fire");
        assert_eq!(json["code"], "INTERNAL_ERROR");
    }
}
