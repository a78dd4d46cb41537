use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::now_naive;
use crate::database::repository::Entity;

pub const DEFAULT_PLAN: &str = "basic";
pub const DEFAULT_STATUS: &str = "normal";

/// Public key stamped on every tenant created through this service.
pub const ENCRYPT_PUBLIC_KEY: &str = "-----BEGIN PUBLIC KEY-----
MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEA6DgcAPwYgeVRla/LH/S9
9TQ6MmQNZRO7PRilu8NdQxRO4UP9KvRaIE8Jv0TozcbvqyTx7rjYU5nQsEvbRh6s
toq3Id7+pF/rQZX1DWCsg9Tn9rCkwBdZLd4dA2/5I6AWYjMQtPf5XBFDfIf+hgBQ
s8pSrmDO+g1LTD8qwcbx/VzsSR7SMxL7voPxByr5kUtyG+K80OkDl7ruddzdbUG3
LF9VQvaiw7ocMVGN+FE/wvPPbtnTuQ1bkE0h771huTYGJ93kL9hd9SlpkYcLpUWP
it/6tjkt7M8Z3DUJpdCMYeMjmaWuENBEKu8DFpehf7n3UoCo56Luqi4TNEkcG9Df
uQIDAQAB
-----END PUBLIC KEY-----";

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "PascalCase")]
pub struct Tenant {
    #[serde(rename = "ID")]
    pub id: Uuid,
    pub name: String,
    pub encrypt_public_key: Option<String>,
    pub plan: String,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub custom_config: Option<String>,
}

impl Tenant {
    pub fn new(name: impl Into<String>, plan: Option<String>, status: Option<String>) -> Self {
        let now = now_naive();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            encrypt_public_key: Some(ENCRYPT_PUBLIC_KEY.to_string()),
            plan: non_empty_or(plan, DEFAULT_PLAN),
            status: non_empty_or(status, DEFAULT_STATUS),
            created_at: now,
            updated_at: now,
            custom_config: None,
        }
    }
}

fn non_empty_or(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

impl Entity for Tenant {
    const TABLE: &'static str = "tenants";
    const COLUMNS: &'static str =
        "id, name, encrypt_public_key, plan, status, created_at, updated_at, custom_config";
}
