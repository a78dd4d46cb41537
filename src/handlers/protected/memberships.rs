// handlers/protected/memberships.rs - tenant_account_joins

use axum::extract::{Extension, State};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::TenantAccountJoin;
use crate::database::MembershipFilter;
use crate::error::ApiError;
use crate::handlers::utils::{required, required_uuid, JsonBody, ListQuery, QueryParams};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, MessageResponse, PageResponse};
use crate::types::Role;

#[derive(Debug, Deserialize)]
pub struct MembershipRequest {
    #[serde(alias = "AccountID")]
    pub account_id: Option<String>,
    #[serde(alias = "TenantID")]
    pub tenant_id: Option<String>,
    #[serde(alias = "Role")]
    pub role: Option<String>,
}

impl MembershipRequest {
    fn ids(&self) -> Result<(Uuid, Uuid), ApiError> {
        Ok((
            required_uuid(self.account_id.as_deref(), "account_id")?,
            required_uuid(self.tenant_id.as_deref(), "tenant_id")?,
        ))
    }
}

async fn list_filtered(
    state: &AppState,
    filter: MembershipFilter,
    query: &ListQuery,
) -> ApiResult<PageResponse<TenantAccountJoin>> {
    let page = state.store.list_memberships(filter, query.page_request()).await?;
    Ok(ApiResponse::success(page.into()))
}

/// GET /api/list_tenant_account.json
pub async fn list(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<PageResponse<TenantAccountJoin>> {
    list_filtered(&state, MembershipFilter::All, &query).await
}

/// GET /api/list_tenant_account_by_account.json?account_id=
pub async fn list_by_account(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<PageResponse<TenantAccountJoin>> {
    let account_id = required_uuid(query.account_id.as_deref(), "account_id")?;
    list_filtered(&state, MembershipFilter::Account(account_id), &query).await
}

/// GET /api/list_tenant_account_by_tenant.json?tenant_id=
pub async fn list_by_tenant(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<PageResponse<TenantAccountJoin>> {
    let tenant_id = required_uuid(query.tenant_id.as_deref(), "tenant_id")?;
    list_filtered(&state, MembershipFilter::Tenant(tenant_id), &query).await
}

/**
 * POST /api/add_tenant_account.json - Add an account to a tenant
 *
 * Expected Input:
 * ```json
 * { "account_id": "uuid", "tenant_id": "uuid", "role": "owner|admin|editor|normal" }
 * ```
 *
 * `role` is optional and defaults to `normal`. One membership per
 * (account, tenant) pair; a second add is rejected with 400.
 */
pub async fn add(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    JsonBody(payload): JsonBody<MembershipRequest>,
) -> ApiResult<TenantAccountJoin> {
    let (account_id, tenant_id) = payload.ids()?;
    let role = Role::parse_or_default(payload.role.as_deref())?;

    if state.store.membership_exists(account_id, tenant_id).await? {
        return Err(ApiError::bad_request("membership already exists"));
    }

    let join = TenantAccountJoin::new(account_id, tenant_id, role, Some(auth_user.id));
    state.store.insert_membership(&join).await?;
    info!("Added account {} to tenant {} as {}", account_id, tenant_id, role);

    Ok(ApiResponse::success(join))
}

/// POST /api/del_tenant_account.json
pub async fn delete(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<MembershipRequest>,
) -> ApiResult<MessageResponse> {
    let (account_id, tenant_id) = payload.ids()?;
    if state.store.delete_membership(account_id, tenant_id).await? == 0 {
        return Err(ApiError::not_found("membership not found"));
    }
    Ok(ApiResponse::success(MessageResponse::new("membership deleted")))
}

/// POST /api/update_tenant_account_role.json - role is required here
pub async fn update_role(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<MembershipRequest>,
) -> ApiResult<MessageResponse> {
    let (account_id, tenant_id) = payload.ids()?;
    let role: Role = required(payload.role.as_deref(), "role")?.parse()?;

    if state.store.update_membership_role(account_id, tenant_id, role).await? == 0 {
        return Err(ApiError::not_found("membership not found"));
    }
    Ok(ApiResponse::success(MessageResponse::new("role updated")))
}
