use axum::extract::Extension;

use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/whoami.json - the identity carried by the caller's token
///
/// ```json
/// { "id": "account_uuid", "email": "admin@example.com" }
/// ```
pub async fn whoami(Extension(auth_user): Extension<AuthUser>) -> ApiResult<AuthUser> {
    Ok(ApiResponse::success(auth_user))
}
