// handlers/protected/accounts.rs - account listing, creation, deletion and password reset

use axum::extract::State;
use serde::Deserialize;
use tracing::info;

use crate::app::AppState;
use crate::auth::hash_password;
use crate::database::models::Account;
use crate::error::ApiError;
use crate::handlers::utils::{required, required_uuid, JsonBody, ListQuery, QueryParams};
use crate::middleware::{ApiResponse, ApiResult, MessageResponse, PageResponse};

#[derive(Debug, Deserialize)]
pub struct AddAccountRequest {
    #[serde(alias = "Name")]
    pub name: Option<String>,
    #[serde(alias = "Email")]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AccountIdRequest {
    #[serde(alias = "ID")]
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    #[serde(alias = "ID")]
    pub id: Option<String>,
    #[serde(alias = "Password")]
    pub password: Option<String>,
}

/// GET /api/accounts.json
pub async fn list(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<PageResponse<Account>> {
    let page = state.store.list_accounts(query.page_request()).await?;
    Ok(ApiResponse::success(page.into()))
}

/// POST /api/add_account.json - `{name, email}`; profile fields get fixed defaults
pub async fn add(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<AddAccountRequest>,
) -> ApiResult<Account> {
    let name = required(payload.name.as_deref(), "name")?;
    let email = required(payload.email.as_deref(), "email")?;

    let account = Account::new(name, email);
    state.store.insert_account(&account).await?;
    info!("Created account {} <{}>", account.id, account.email);

    Ok(ApiResponse::success(account))
}

/// POST /api/del_account.json - removes the account together with all its memberships
pub async fn delete(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<AccountIdRequest>,
) -> ApiResult<MessageResponse> {
    let id = required_uuid(payload.id.as_deref(), "id")?;
    state.store.delete_account_cascade(id).await?;
    Ok(ApiResponse::success(MessageResponse::new("account deleted")))
}

/// POST /api/set_account_password.json
pub async fn set_password(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<SetPasswordRequest>,
) -> ApiResult<MessageResponse> {
    let id = required_uuid(payload.id.as_deref(), "id")?;
    let password = payload
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::bad_request("password is required"))?;

    let hashed = hash_password(password)?;
    if state.store.update_credential(id, &hashed.hash, &hashed.salt).await? == 0 {
        return Err(ApiError::not_found("account not found"));
    }
    info!("Password updated for account {}", id);

    Ok(ApiResponse::success(MessageResponse::new("password updated")))
}
