use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::now_naive;
use crate::database::repository::Entity;
use crate::types::Role;

/// Membership of one account in one tenant.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "PascalCase")]
pub struct TenantAccountJoin {
    #[serde(rename = "ID")]
    pub id: Uuid,
    #[serde(rename = "TenantID")]
    pub tenant_id: Uuid,
    #[serde(rename = "AccountID")]
    pub account_id: Uuid,
    pub role: String,
    pub invited_by: Option<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub current: bool,
}

impl TenantAccountJoin {
    pub fn new(account_id: Uuid, tenant_id: Uuid, role: Role, invited_by: Option<Uuid>) -> Self {
        let now = now_naive();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            account_id,
            role: role.to_string(),
            invited_by,
            created_at: now,
            updated_at: now,
            current: false,
        }
    }
}

impl Entity for TenantAccountJoin {
    const TABLE: &'static str = "tenant_account_joins";
    const COLUMNS: &'static str =
        "id, tenant_id, account_id, role, invited_by, created_at, updated_at, current";
}
