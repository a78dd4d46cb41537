use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::repository::Entity;

pub const DEFAULT_INTERFACE_LANGUAGE: &str = "zh-Hans";
pub const DEFAULT_AVATAR: &str = "99371728-eb21-49b2-a83c-26303f7c11b2";
pub const DEFAULT_INTERFACE_THEME: &str = "light";
pub const DEFAULT_TIMEZONE: &str = "Asia/Shanghai";
pub const DEFAULT_STATUS: &str = "active";

/// Row of the `accounts` table.
///
/// The credential columns are read for login but never leave the process.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "PascalCase")]
pub struct Account {
    #[serde(rename = "ID")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    #[serde(skip_serializing)]
    pub password_salt: Option<String>,
    pub avatar: Option<String>,
    pub interface_language: Option<String>,
    pub interface_theme: Option<String>,
    pub timezone: Option<String>,
    pub status: String,
}

impl Account {
    /// New account with a fresh id and the fixed profile defaults. No credential is set.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            password: None,
            password_salt: None,
            avatar: Some(DEFAULT_AVATAR.to_string()),
            interface_language: Some(DEFAULT_INTERFACE_LANGUAGE.to_string()),
            interface_theme: Some(DEFAULT_INTERFACE_THEME.to_string()),
            timezone: Some(DEFAULT_TIMEZONE.to_string()),
            status: DEFAULT_STATUS.to_string(),
        }
    }

    /// Stored `(hash, salt)` pair, when both halves are present and non-empty.
    pub fn credential(&self) -> Option<(&str, &str)> {
        match (self.password.as_deref(), self.password_salt.as_deref()) {
            (Some(hash), Some(salt)) if !hash.is_empty() && !salt.is_empty() => Some((hash, salt)),
            _ => None,
        }
    }
}

impl Entity for Account {
    const TABLE: &'static str = "accounts";
    const COLUMNS: &'static str = "id, name, email, password, password_salt, avatar, \
        interface_language, interface_theme, timezone, status";
}
