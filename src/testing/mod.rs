//! In-memory `AdminStore` for router tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::database::models::{now_naive, Account, Dataset, Tenant, TenantAccountJoin};
use crate::database::{AdminStore, DatabaseError, MembershipFilter};
use crate::types::{Page, PageRequest, Role};

/// Where an injected failure fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    /// First statement of the account cascade.
    DeleteMemberships,
    /// Second statement of the account cascade, after memberships are gone.
    DeleteAccount,
    HealthCheck,
    /// Health check never answers.
    HealthCheckStalls,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    accounts: Vec<Account>,
    tenants: Vec<Tenant>,
    datasets: Vec<Dataset>,
    memberships: Vec<TenantAccountJoin>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail: Mutex<Option<FailPoint>>,
    email_lookups: AtomicUsize,
}

impl MemoryStore {
    pub fn fail_at(&self, point: FailPoint) {
        *self.fail.lock().unwrap() = Some(point);
    }

    /// How many times the credential lookup by email ran.
    pub fn email_lookups(&self) -> usize {
        self.email_lookups.load(Ordering::SeqCst)
    }

    pub fn account(&self, id: Uuid) -> Option<Account> {
        self.tables.lock().unwrap().accounts.iter().find(|a| a.id == id).cloned()
    }

    pub fn membership_count(&self) -> usize {
        self.tables.lock().unwrap().memberships.len()
    }

    pub fn memberships_of(&self, account_id: Uuid) -> Vec<TenantAccountJoin> {
        self.tables
            .lock()
            .unwrap()
            .memberships
            .iter()
            .filter(|m| m.account_id == account_id)
            .cloned()
            .collect()
    }

    pub fn dataset_tenant(&self, dataset_id: &str) -> Option<Uuid> {
        let id = Uuid::parse_str(dataset_id).ok()?;
        self.tables
            .lock()
            .unwrap()
            .datasets
            .iter()
            .find(|d| d.id == id)
            .and_then(|d| d.tenant_id)
    }

    fn armed(&self, point: FailPoint) -> bool {
        *self.fail.lock().unwrap() == Some(point)
    }

    fn check(&self, point: FailPoint) -> Result<(), DatabaseError> {
        if self.armed(point) {
            return Err(DatabaseError::Sqlx(sqlx::Error::Protocol(format!(
                "injected failure at {:?}",
                point
            ))));
        }
        Ok(())
    }
}

fn page_of<T: Clone>(rows: Vec<T>, request: PageRequest) -> Page<T> {
    let total = rows.len() as i64;
    let items = rows
        .into_iter()
        .skip(request.offset() as usize)
        .take(request.limit() as usize)
        .collect();
    Page { items, total, request }
}

#[async_trait]
impl AdminStore for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        if self.armed(FailPoint::HealthCheckStalls) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        self.check(FailPoint::HealthCheck)
    }

    async fn list_accounts(&self, page: PageRequest) -> Result<Page<Account>, DatabaseError> {
        let rows = self.tables.lock().unwrap().accounts.clone();
        Ok(page_of(rows, page))
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError> {
        self.email_lookups.fetch_add(1, Ordering::SeqCst);
        let tables = self.tables.lock().unwrap();
        Ok(tables.accounts.iter().find(|a| a.email == email).cloned())
    }

    async fn insert_account(&self, account: &Account) -> Result<(), DatabaseError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.accounts.iter().any(|a| a.email == account.email) {
            return Err(DatabaseError::Conflict("an account with this email already exists".into()));
        }
        tables.accounts.push(account.clone());
        Ok(())
    }

    async fn update_credential(&self, id: Uuid, hash: &str, salt: &str) -> Result<u64, DatabaseError> {
        let mut tables = self.tables.lock().unwrap();
        match tables.accounts.iter_mut().find(|a| a.id == id) {
            Some(account) => {
                account.password = Some(hash.to_string());
                account.password_salt = Some(salt.to_string());
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_account_cascade(&self, id: Uuid) -> Result<u64, DatabaseError> {
        let mut tables = self.tables.lock().unwrap();
        // Work on a copy and swap it in only when both steps succeed.
        let mut tx = tables.clone();

        self.check(FailPoint::DeleteMemberships)?;
        let before = tx.memberships.len();
        tx.memberships.retain(|m| m.account_id != id);
        let removed = (before - tx.memberships.len()) as u64;

        self.check(FailPoint::DeleteAccount)?;
        let before = tx.accounts.len();
        tx.accounts.retain(|a| a.id != id);
        if tx.accounts.len() == before {
            return Err(DatabaseError::NotFound(format!("account {}", id)));
        }

        *tables = tx;
        Ok(removed)
    }

    async fn list_tenants(&self, page: PageRequest) -> Result<Page<Tenant>, DatabaseError> {
        let rows = self.tables.lock().unwrap().tenants.clone();
        Ok(page_of(rows, page))
    }

    async fn insert_tenant(&self, tenant: &Tenant) -> Result<(), DatabaseError> {
        self.tables.lock().unwrap().tenants.push(tenant.clone());
        Ok(())
    }

    async fn list_datasets(
        &self,
        tenant_id: Option<Uuid>,
        page: PageRequest,
    ) -> Result<Page<Dataset>, DatabaseError> {
        let rows: Vec<_> = self
            .tables
            .lock()
            .unwrap()
            .datasets
            .iter()
            .filter(|d| tenant_id.is_none() || d.tenant_id == tenant_id)
            .cloned()
            .collect();
        Ok(page_of(rows, page))
    }

    async fn insert_dataset(&self, dataset: &Dataset) -> Result<(), DatabaseError> {
        self.tables.lock().unwrap().datasets.push(dataset.clone());
        Ok(())
    }

    async fn attach_dataset(&self, dataset_id: Uuid, tenant_id: Uuid) -> Result<u64, DatabaseError> {
        let mut tables = self.tables.lock().unwrap();
        match tables.datasets.iter_mut().find(|d| d.id == dataset_id) {
            Some(dataset) => {
                dataset.tenant_id = Some(tenant_id);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn detach_dataset(&self, dataset_id: Uuid, tenant_id: Uuid) -> Result<u64, DatabaseError> {
        let mut tables = self.tables.lock().unwrap();
        match tables
            .datasets
            .iter_mut()
            .find(|d| d.id == dataset_id && d.tenant_id == Some(tenant_id))
        {
            Some(dataset) => {
                dataset.tenant_id = None;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn list_memberships(
        &self,
        filter: MembershipFilter,
        page: PageRequest,
    ) -> Result<Page<TenantAccountJoin>, DatabaseError> {
        let rows: Vec<_> = self
            .tables
            .lock()
            .unwrap()
            .memberships
            .iter()
            .filter(|m| match filter {
                MembershipFilter::All => true,
                MembershipFilter::Account(id) => m.account_id == id,
                MembershipFilter::Tenant(id) => m.tenant_id == id,
            })
            .cloned()
            .collect();
        Ok(page_of(rows, page))
    }

    async fn membership_exists(&self, account_id: Uuid, tenant_id: Uuid) -> Result<bool, DatabaseError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .memberships
            .iter()
            .any(|m| m.account_id == account_id && m.tenant_id == tenant_id))
    }

    async fn insert_membership(&self, join: &TenantAccountJoin) -> Result<(), DatabaseError> {
        self.tables.lock().unwrap().memberships.push(join.clone());
        Ok(())
    }

    async fn delete_membership(&self, account_id: Uuid, tenant_id: Uuid) -> Result<u64, DatabaseError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.memberships.len();
        tables
            .memberships
            .retain(|m| !(m.account_id == account_id && m.tenant_id == tenant_id));
        Ok((before - tables.memberships.len()) as u64)
    }

    async fn update_membership_role(
        &self,
        account_id: Uuid,
        tenant_id: Uuid,
        role: Role,
    ) -> Result<u64, DatabaseError> {
        let mut tables = self.tables.lock().unwrap();
        let mut touched = 0;
        for m in tables
            .memberships
            .iter_mut()
            .filter(|m| m.account_id == account_id && m.tenant_id == tenant_id)
        {
            m.role = role.to_string();
            m.updated_at = now_naive();
            touched += 1;
        }
        Ok(touched)
    }
}
