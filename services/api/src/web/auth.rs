//! services/api/src/web/auth.rs
//!
//! The Auth Service and the login endpoint.
//!
//! There is no user registry: a single admin identity is configured at startup.
//! A successful login yields an HS256-signed bearer token carrying the admin
//! identity and role; nothing is stored server-side. Every token carries an
//! expiry and expired tokens are rejected; there is no refresh flow.

use crate::{config::Config, error::ApiError, web::state::AppState};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

/// The only role allowed through the admin routes.
pub const ADMIN_ROLE: &str = "admin";

/// The fixed subject id embedded in admin tokens.
const ADMIN_ID: u32 = 1;

//=========================================================================================
// Errors and Claims
//=========================================================================================

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials.")]
    InvalidCredentials,
    #[error("Access denied. Missing or malformed bearer token.")]
    MissingToken,
    #[error("Invalid or expired token.")]
    InvalidToken,
    #[error("Forbidden. Administrator role required.")]
    Forbidden,
    #[error("Failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// The decoded token payload. Inserted into request extensions by the admin middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: u32,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

//=========================================================================================
// Auth Service
//=========================================================================================

/// Issues and verifies admin bearer tokens.
pub struct AuthService {
    admin_username: String,
    admin_password: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl_secs: i64,
}

impl AuthService {
    /// Builds the service from the startup configuration.
    pub fn new(config: &Config) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        let secret = config.jwt_secret.as_bytes();
        Self {
            admin_username: config.admin_username.clone(),
            admin_password: config.admin_password.clone(),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            token_ttl_secs: i64::try_from(config.token_ttl.as_secs()).unwrap_or(i64::MAX),
        }
    }

    /// Checks the submitted credentials and, on a match, issues an admin token.
    pub fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        // Both comparisons always run so timing does not reveal which one failed.
        let username_ok = constant_time_eq(username, &self.admin_username);
        let password_ok = constant_time_eq(password, &self.admin_password);
        if !(username_ok & password_ok) {
            warn!("Rejected admin login attempt");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_token(ADMIN_ID, ADMIN_ROLE)?;
        info!("Admin login succeeded");
        Ok(token)
    }

    /// Signs a token for the given identity, expiring after the configured lifetime.
    pub fn issue_token(&self, id: u32, role: &str) -> Result<String, AuthError> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            id,
            role: role.to_string(),
            iat,
            exp: iat.saturating_add(self.token_ttl_secs),
        };
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)?)
    }

    /// Validates signature and expiry, then requires the admin role.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!("Token rejected: {}", e);
            AuthError::InvalidToken
        })?;

        if data.claims.role != ADMIN_ROLE {
            warn!(role = %data.claims.role, "Token with insufficient role used on an admin route");
            return Err(AuthError::Forbidden);
        }
        Ok(data.claims)
    }
}

/// Constant-time string comparison over fixed-length SHA-256 digests.
fn constant_time_eq(provided: &str, expected: &str) -> bool {
    let provided = Sha256::digest(provided.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    provided.as_slice().ct_eq(expected.as_slice()).into()
}

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub role: String,
    pub message: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/login - Exchange the admin credentials for a bearer token
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Malformed request body", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let token = state.auth.login(&req.username, &req.password)?;

    Ok(Json(LoginResponse {
        token,
        role: ADMIN_ROLE.to_string(),
        message: "Login successful.".to_string(),
    }))
}
