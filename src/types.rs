//! Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed page size of every list endpoint.
pub const PAGE_SIZE: i64 = 10;

/// Role carried by a tenant membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    Editor,
    #[default]
    Normal,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Owner, Role::Admin, Role::Editor, Role::Normal];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Normal => "normal",
        }
    }

    /// Empty input means "not specified" and yields the default role.
    pub fn parse_or_default(raw: Option<&str>) -> Result<Role, InvalidRole> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Role::default()),
            Some(value) => value.parse(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role '{0}', expected one of owner, admin, editor, normal")]
pub struct InvalidRole(pub String);

impl FromStr for Role {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| InvalidRole(s.to_string()))
    }
}

/// A 1-indexed page request with the fixed page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
}

impl PageRequest {
    pub fn new(page: i64) -> Self {
        Self { page: page.max(1) }
    }

    /// Lenient parse of the `page` query parameter: absent, non-numeric or
    /// non-positive values fall back to the first page.
    pub fn from_query(raw: Option<&str>) -> Self {
        let page = raw.and_then(|s| s.trim().parse::<i64>().ok()).unwrap_or(1);
        Self::new(page)
    }

    pub fn limit(&self) -> i64 {
        PAGE_SIZE
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(PAGE_SIZE)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1)
    }
}

/// One page of rows plus the total row count of the same (filtered) set.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub request: PageRequest,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> i64 {
        total_pages(self.total, PAGE_SIZE)
    }
}

pub fn total_pages(total: i64, page_size: i64) -> i64 {
    if total <= 0 || page_size <= 0 {
        return 0;
    }
    (total + page_size - 1) / page_size
}
