// handlers/public/auth/login.rs - POST /api/login.json handler

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::app::AppState;
use crate::auth::{verify_password, AuthError};
use crate::database::models::Account;
use crate::error::ApiError;
use crate::handlers::utils::{required, JsonBody};
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "Email")]
    pub email: Option<String>,
    #[serde(alias = "Password")]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub data: Account,
    pub token: String,
}

/**
 * POST /api/login.json - Exchange admin credentials for a bearer token
 *
 * Expected Input:
 * ```json
 * { "email": "admin@example.com", "password": "string" }
 * ```
 *
 * Expected Output (Success):
 * ```json
 * { "message": "login successful", "data": { "ID": "...", "Email": "..." }, "token": "eyJ..." }
 * ```
 *
 * The admin allow-list is checked before the store is touched, so a
 * non-admin email is rejected with 401 whatever the password.
 */
pub async fn login_post(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let (email, password) = match (
        required(payload.email.as_deref(), "email"),
        payload.password.as_deref().filter(|p| !p.is_empty()),
    ) {
        (Ok(email), Some(password)) => (email, password),
        _ => return Err(ApiError::bad_request("email and password are required")),
    };

    if !state.config.is_admin(email) {
        warn!("Login refused for non-admin email {}", email);
        return Err(ApiError::unauthorized("administrator privileges required"));
    }

    let account = state
        .store
        .find_account_by_email(email)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let (hash, salt) = account.credential().ok_or(AuthError::CredentialNotSet)?;
    if !verify_password(password, hash, salt)? {
        warn!("Wrong password for {}", email);
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state.tokens.issue(account.id, &account.email)?;
    info!("Admin {} logged in", account.email);

    Ok(ApiResponse::success(LoginResponse {
        message: "login successful".to_string(),
        data: account,
        token,
    }))
}
