// handlers/protected/tenants.rs

use axum::extract::State;
use serde::Deserialize;

use crate::app::AppState;
use crate::database::models::Tenant;
use crate::handlers::utils::{required, JsonBody, ListQuery, QueryParams};
use crate::middleware::{ApiResponse, ApiResult, PageResponse};

#[derive(Debug, Deserialize)]
pub struct AddTenantRequest {
    #[serde(alias = "Name")]
    pub name: Option<String>,
    #[serde(alias = "Plan")]
    pub plan: Option<String>,
    #[serde(alias = "Status")]
    pub status: Option<String>,
}

/// GET /api/tenants.json
pub async fn list(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<PageResponse<Tenant>> {
    let page = state.store.list_tenants(query.page_request()).await?;
    Ok(ApiResponse::success(page.into()))
}

/// POST /api/add_tenant.json - plan and status fall back to `basic` / `normal`
pub async fn add(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<AddTenantRequest>,
) -> ApiResult<Tenant> {
    let name = required(payload.name.as_deref(), "name")?;
    let tenant = Tenant::new(name, payload.plan, payload.status);
    state.store.insert_tenant(&tenant).await?;
    tracing::info!("Created tenant {} ({})", tenant.id, tenant.name);
    Ok(ApiResponse::success(tenant))
}
