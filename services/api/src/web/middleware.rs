//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting the admin routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::web::{auth::AuthError, state::AppState};

/// Middleware that validates the `Authorization: Bearer <token>` header.
///
/// If the token is valid and carries the admin role, the decoded claims are
/// inserted into the request extensions for handlers to use. A missing or
/// invalid token is rejected with 401, a non-admin role with 403.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)?;

    let claims = state.auth.verify(token)?;
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
