// handlers/protected/datasets.rs - datasets and their tenant association

use axum::extract::{Extension, State};
use serde::Deserialize;
use tracing::info;

use crate::app::AppState;
use crate::database::models::dataset::{Dataset, NewDataset};
use crate::error::ApiError;
use crate::handlers::utils::{
    optional_uuid, present, required, required_uuid, JsonBody, ListQuery, QueryParams,
};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, MessageResponse, PageResponse};

#[derive(Debug, Deserialize)]
pub struct AddDatasetRequest {
    #[serde(alias = "Name")]
    pub name: Option<String>,
    #[serde(alias = "Description")]
    pub description: Option<String>,
    #[serde(alias = "Permission")]
    pub permission: Option<String>,
    #[serde(alias = "DataSourceType")]
    pub data_source_type: Option<String>,
    #[serde(alias = "IndexingTechnique")]
    pub indexing_technique: Option<String>,
    #[serde(alias = "TenantID")]
    pub tenant_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DatasetTenantRequest {
    #[serde(alias = "id", alias = "ID")]
    pub dataset_id: Option<String>,
    #[serde(alias = "TenantID")]
    pub tenant_id: Option<String>,
}

impl DatasetTenantRequest {
    fn ids(&self) -> Result<(uuid::Uuid, uuid::Uuid), ApiError> {
        Ok((
            required_uuid(self.dataset_id.as_deref(), "dataset_id")?,
            required_uuid(self.tenant_id.as_deref(), "tenant_id")?,
        ))
    }
}

/// GET /api/datasets.json
pub async fn list(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<PageResponse<Dataset>> {
    let page = state.store.list_datasets(None, query.page_request()).await?;
    Ok(ApiResponse::success(page.into()))
}

/// GET /api/list_dataset_tenant.json?tenant_id= - filter is optional
pub async fn list_by_tenant(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<PageResponse<Dataset>> {
    let tenant_id = optional_uuid(query.tenant_id.as_deref(), "tenant_id")?;
    let page = state.store.list_datasets(tenant_id, query.page_request()).await?;
    Ok(ApiResponse::success(page.into()))
}

/// POST /api/add_dataset.json - the caller is recorded as creator
pub async fn add(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    JsonBody(payload): JsonBody<AddDatasetRequest>,
) -> ApiResult<Dataset> {
    let name = required(payload.name.as_deref(), "name")?.to_string();
    let tenant_id = optional_uuid(payload.tenant_id.as_deref(), "tenant_id")?;

    let dataset = Dataset::new(
        NewDataset {
            name,
            description: payload.description,
            permission: present(payload.permission.as_deref()).map(str::to_string),
            data_source_type: payload.data_source_type,
            indexing_technique: payload.indexing_technique,
            tenant_id,
        },
        auth_user.id,
    );
    state.store.insert_dataset(&dataset).await?;
    info!("Created dataset {} by {}", dataset.id, auth_user.email);

    Ok(ApiResponse::success(dataset))
}

/// POST /api/add_dataset_tenant.json
pub async fn attach(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<DatasetTenantRequest>,
) -> ApiResult<MessageResponse> {
    let (dataset_id, tenant_id) = payload.ids()?;
    if state.store.attach_dataset(dataset_id, tenant_id).await? == 0 {
        return Err(ApiError::not_found("dataset not found"));
    }
    Ok(ApiResponse::success(MessageResponse::new("dataset attached to tenant")))
}

/// POST /api/del_dataset_tenant.json - only detaches from the named tenant
pub async fn detach(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<DatasetTenantRequest>,
) -> ApiResult<MessageResponse> {
    let (dataset_id, tenant_id) = payload.ids()?;
    if state.store.detach_dataset(dataset_id, tenant_id).await? == 0 {
        return Err(ApiError::not_found("dataset is not associated with this tenant"));
    }
    Ok(ApiResponse::success(MessageResponse::new("dataset detached from tenant")))
}
