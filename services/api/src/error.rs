//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how it is
//! rendered as an HTTP response.

use crate::config::ConfigError;
use crate::web::auth::AuthError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use perfumery_core::ports::PortError;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from the product store port.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Login or bearer token verification failed.
    #[error("Auth Error: {0}")]
    Auth(#[from] AuthError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure to apply the embedded database migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The request itself is malformed (bad id, unparsable body, wrong field types).
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// The JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Port(PortError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Port(PortError::Validation(_) | PortError::DuplicateName(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Auth(AuthError::Forbidden) => StatusCode::FORBIDDEN,
            ApiError::Auth(AuthError::Signing(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Port(PortError::StorageUnavailable(_))
            | ApiError::Config(_)
            | ApiError::Database(_)
            | ApiError::Migration(_)
            | ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The user-safe message. Server-side failures never leak their detail.
    fn public_message(&self) -> String {
        match self {
            ApiError::Port(
                e @ (PortError::NotFound(_)
                | PortError::Validation(_)
                | PortError::DuplicateName(_)),
            ) => e.to_string(),
            ApiError::Auth(AuthError::Signing(_)) => "Internal server error.".to_string(),
            ApiError::Auth(e) => e.to_string(),
            ApiError::BadRequest(msg) => msg.clone(),
            _ => "Internal server error.".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {:?}", self);
        }
        let body = ErrorResponse {
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_errors_map_to_their_status_codes() {
        let cases = [
            (PortError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (PortError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (PortError::DuplicateName("x".into()), StatusCode::BAD_REQUEST),
            (
                PortError::StorageUnavailable("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn auth_errors_map_to_401_and_403() {
        assert_eq!(
            ApiError::from(AuthError::InvalidToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::InvalidCredentials).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::Forbidden).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn storage_detail_is_not_exposed() {
        let err = ApiError::from(PortError::StorageUnavailable(
            "/srv/data/products.json: permission denied".into(),
        ));
        assert_eq!(err.public_message(), "Internal server error.");
    }
}
