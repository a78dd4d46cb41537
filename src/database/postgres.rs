use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::manager::{self, DatabaseError, RetryPolicy};
use crate::database::models::{now_naive, Account, Dataset, Tenant, TenantAccountJoin};
use crate::database::repository::{EqFilter, Entity, Repository};
use crate::database::store::{AdminStore, MembershipFilter};
use crate::types::{Page, PageRequest, Role};

/// `AdminStore` backed by the upstream Postgres schema.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    retry: RetryPolicy,
}

impl PgStore {
    pub fn new(pool: PgPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    async fn page<T: Entity>(
        &self,
        what: &str,
        filter: Option<EqFilter>,
        request: PageRequest,
    ) -> Result<Page<T>, DatabaseError> {
        let repo = &Repository::<T>::new(self.pool.clone());
        self.retry.read(what, move || repo.page(filter, request)).await
    }
}

fn select_account_by_email() -> String {
    format!("SELECT {} FROM \"{}\" WHERE email = $1", Account::COLUMNS, Account::TABLE)
}

#[async_trait]
impl AdminStore for PgStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        manager::health_check(&self.pool).await
    }

    async fn list_accounts(&self, page: PageRequest) -> Result<Page<Account>, DatabaseError> {
        self.page("list accounts", None, page).await
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, DatabaseError> {
        let sql = select_account_by_email();
        let (sql, pool) = (sql.as_str(), &self.pool);
        self.retry
            .read("find account by email", move || async move {
                Ok(sqlx::query_as::<_, Account>(sql)
                    .bind(email)
                    .fetch_optional(pool)
                    .await?)
            })
            .await
    }

    async fn insert_account(&self, account: &Account) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO accounts (id, name, email, avatar, interface_language, interface_theme, timezone, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(account.id)
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.avatar)
        .bind(&account.interface_language)
        .bind(&account.interface_theme)
        .bind(&account.timezone)
        .bind(&account.status)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e.into(), "an account with this email already exists"))?;
        Ok(())
    }

    async fn update_credential(&self, id: Uuid, hash: &str, salt: &str) -> Result<u64, DatabaseError> {
        let result = sqlx::query("UPDATE accounts SET password = $1, password_salt = $2 WHERE id = $3")
            .bind(hash)
            .bind(salt)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_account_cascade(&self, id: Uuid) -> Result<u64, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        // Dropping `tx` on any early return rolls both statements back.
        let memberships = sqlx::query("DELETE FROM tenant_account_joins WHERE account_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let accounts = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if accounts == 0 {
            tx.rollback().await?;
            return Err(DatabaseError::NotFound(format!("account {}", id)));
        }

        tx.commit().await?;
        info!("Deleted account {} and {} membership(s)", id, memberships);
        Ok(memberships)
    }

    async fn list_tenants(&self, page: PageRequest) -> Result<Page<Tenant>, DatabaseError> {
        self.page("list tenants", None, page).await
    }

    async fn insert_tenant(&self, tenant: &Tenant) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO tenants (id, name, encrypt_public_key, plan, status, created_at, updated_at, custom_config) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(tenant.id)
        .bind(&tenant.name)
        .bind(&tenant.encrypt_public_key)
        .bind(&tenant.plan)
        .bind(&tenant.status)
        .bind(tenant.created_at)
        .bind(tenant.updated_at)
        .bind(&tenant.custom_config)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_datasets(
        &self,
        tenant_id: Option<Uuid>,
        page: PageRequest,
    ) -> Result<Page<Dataset>, DatabaseError> {
        let filter = tenant_id.map(|id| EqFilter::new("tenant_id", id));
        self.page("list datasets", filter, page).await
    }

    async fn insert_dataset(&self, dataset: &Dataset) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO datasets (id, tenant_id, name, description, provider, permission, data_source_type, \
             indexing_technique, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(dataset.id)
        .bind(dataset.tenant_id)
        .bind(&dataset.name)
        .bind(&dataset.description)
        .bind(&dataset.provider)
        .bind(&dataset.permission)
        .bind(&dataset.data_source_type)
        .bind(&dataset.indexing_technique)
        .bind(dataset.created_by)
        .bind(dataset.created_at)
        .bind(dataset.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn attach_dataset(&self, dataset_id: Uuid, tenant_id: Uuid) -> Result<u64, DatabaseError> {
        let result = sqlx::query("UPDATE datasets SET tenant_id = $1 WHERE id = $2")
            .bind(tenant_id)
            .bind(dataset_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn detach_dataset(&self, dataset_id: Uuid, tenant_id: Uuid) -> Result<u64, DatabaseError> {
        let result = sqlx::query("UPDATE datasets SET tenant_id = NULL WHERE id = $1 AND tenant_id = $2")
            .bind(dataset_id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn list_memberships(
        &self,
        filter: MembershipFilter,
        page: PageRequest,
    ) -> Result<Page<TenantAccountJoin>, DatabaseError> {
        let filter = match filter {
            MembershipFilter::All => None,
            MembershipFilter::Account(id) => Some(EqFilter::new("account_id", id)),
            MembershipFilter::Tenant(id) => Some(EqFilter::new("tenant_id", id)),
        };
        self.page("list memberships", filter, page).await
    }

    async fn membership_exists(&self, account_id: Uuid, tenant_id: Uuid) -> Result<bool, DatabaseError> {
        let pool = &self.pool;
        self.retry
            .read("check membership", move || async move {
                Ok(sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS (SELECT 1 FROM tenant_account_joins WHERE account_id = $1 AND tenant_id = $2)",
                )
                .bind(account_id)
                .bind(tenant_id)
                .fetch_one(pool)
                .await?)
            })
            .await
    }

    async fn insert_membership(&self, join: &TenantAccountJoin) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO tenant_account_joins (id, tenant_id, account_id, role, invited_by, created_at, updated_at, current) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(join.id)
        .bind(join.tenant_id)
        .bind(join.account_id)
        .bind(&join.role)
        .bind(join.invited_by)
        .bind(join.created_at)
        .bind(join.updated_at)
        .bind(join.current)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e.into(), "membership already exists"))?;
        Ok(())
    }

    async fn delete_membership(&self, account_id: Uuid, tenant_id: Uuid) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM tenant_account_joins WHERE tenant_id = $1 AND account_id = $2")
            .bind(tenant_id)
            .bind(account_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn update_membership_role(
        &self,
        account_id: Uuid,
        tenant_id: Uuid,
        role: Role,
    ) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "UPDATE tenant_account_joins SET role = $1, updated_at = $2 WHERE tenant_id = $3 AND account_id = $4",
        )
        .bind(role.as_str())
        .bind(now_naive())
        .bind(tenant_id)
        .bind(account_id)
        .execute(&self.pool)
        .await?;
        debug!("Role update for {}/{} touched {} row(s)", tenant_id, account_id, result.rows_affected());
        Ok(result.rows_affected())
    }
}

fn conflict_on_unique(err: DatabaseError, message: &str) -> DatabaseError {
    if err.is_unique_violation() {
        DatabaseError::Conflict(message.to_string())
    } else {
        err
    }
}
