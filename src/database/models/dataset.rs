use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::now_naive;
use crate::database::repository::Entity;

pub const DEFAULT_PROVIDER: &str = "vendor";
pub const DEFAULT_PERMISSION: &str = "only_me";

/// Row of the `datasets` table. Provider and indexing metadata are opaque text.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "PascalCase")]
pub struct Dataset {
    #[serde(rename = "ID")]
    pub id: Uuid,
    #[serde(rename = "TenantID")]
    pub tenant_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub provider: Option<String>,
    pub permission: Option<String>,
    pub data_source_type: Option<String>,
    pub indexing_technique: Option<String>,
    pub index_struct: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_by: Option<Uuid>,
    pub updated_at: NaiveDateTime,
    pub embedding_model: Option<String>,
    pub embedding_model_provider: Option<String>,
    #[serde(rename = "CollectionBindingID")]
    pub collection_binding_id: Option<Uuid>,
    pub retrieval_model: Option<String>,
}

/// Caller-supplied fields of a new dataset.
#[derive(Debug, Clone, Default)]
pub struct NewDataset {
    pub name: String,
    pub description: Option<String>,
    pub permission: Option<String>,
    pub data_source_type: Option<String>,
    pub indexing_technique: Option<String>,
    pub tenant_id: Option<Uuid>,
}

impl Dataset {
    pub fn new(input: NewDataset, created_by: Uuid) -> Self {
        let now = now_naive();
        Self {
            id: Uuid::new_v4(),
            tenant_id: input.tenant_id,
            name: input.name,
            description: input.description,
            provider: Some(DEFAULT_PROVIDER.to_string()),
            permission: Some(
                input
                    .permission
                    .filter(|p| !p.is_empty())
                    .unwrap_or_else(|| DEFAULT_PERMISSION.to_string()),
            ),
            data_source_type: input.data_source_type,
            indexing_technique: input.indexing_technique,
            index_struct: None,
            created_by: Some(created_by),
            created_at: now,
            updated_by: None,
            updated_at: now,
            embedding_model: None,
            embedding_model_provider: None,
            collection_binding_id: None,
            retrieval_model: None,
        }
    }
}

impl Entity for Dataset {
    const TABLE: &'static str = "datasets";
    // retrieval_model is jsonb upstream
    const COLUMNS: &'static str = "id, tenant_id, name, description, provider, permission, \
        data_source_type, indexing_technique, index_struct, created_by, created_at, updated_by, \
        updated_at, embedding_model, embedding_model_provider, collection_binding_id, \
        retrieval_model::text AS retrieval_model";
}
