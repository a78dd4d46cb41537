use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Account, Dataset, Tenant, TenantAccountJoin};
use crate::types::{Page, PageRequest, Role};

/// Which memberships a list covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipFilter {
    All,
    Account(Uuid),
    Tenant(Uuid),
}

/// Access patterns of the account, tenant, dataset and membership tables.
///
/// Mutations that target rows by key report the number of rows they touched
/// so callers decide whether "nothing matched" is an error.
#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    // Accounts
    async fn list_accounts(&self, page: PageRequest) -> Result<Page<Account>, DatabaseError>;
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError>;
    async fn insert_account(&self, account: &Account) -> Result<(), DatabaseError>;
    /// Replace hash and salt in a single row update.
    async fn update_credential(&self, id: Uuid, hash: &str, salt: &str) -> Result<u64, DatabaseError>;
    /// Delete every membership of the account, then the account, atomically.
    /// Returns the number of memberships removed; `NotFound` rolls everything back.
    async fn delete_account_cascade(&self, id: Uuid) -> Result<u64, DatabaseError>;

    // Tenants
    async fn list_tenants(&self, page: PageRequest) -> Result<Page<Tenant>, DatabaseError>;
    async fn insert_tenant(&self, tenant: &Tenant) -> Result<(), DatabaseError>;

    // Datasets
    async fn list_datasets(
        &self,
        tenant_id: Option<Uuid>,
        page: PageRequest,
    ) -> Result<Page<Dataset>, DatabaseError>;
    async fn insert_dataset(&self, dataset: &Dataset) -> Result<(), DatabaseError>;
    async fn attach_dataset(&self, dataset_id: Uuid, tenant_id: Uuid) -> Result<u64, DatabaseError>;
    /// Clears the tenant only when the dataset currently belongs to `tenant_id`.
    async fn detach_dataset(&self, dataset_id: Uuid, tenant_id: Uuid) -> Result<u64, DatabaseError>;

    // Memberships
    async fn list_memberships(
        &self,
        filter: MembershipFilter,
        page: PageRequest,
    ) -> Result<Page<TenantAccountJoin>, DatabaseError>;
    async fn membership_exists(&self, account_id: Uuid, tenant_id: Uuid) -> Result<bool, DatabaseError>;
    async fn insert_membership(&self, join: &TenantAccountJoin) -> Result<(), DatabaseError>;
    async fn delete_membership(&self, account_id: Uuid, tenant_id: Uuid) -> Result<u64, DatabaseError>;
    async fn update_membership_role(
        &self,
        account_id: Uuid,
        tenant_id: Uuid,
        role: Role,
    ) -> Result<u64, DatabaseError>;
}
