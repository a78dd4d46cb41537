//! `PgStore` against a real Postgres.
//!
//! Run with `DATABASE_URL=postgres://... cargo test --test 40_pg_store -- --ignored`.
//! Every test works in its own throwaway schema, dropped at the end.

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Executor, PgPool};
use uuid::Uuid;

use dify_admin_api::database::models::dataset::{Dataset, NewDataset};
use dify_admin_api::database::models::{Account, Tenant, TenantAccountJoin};
use dify_admin_api::database::{AdminStore, DatabaseError, MembershipFilter, PgStore, RetryPolicy};
use dify_admin_api::types::{PageRequest, Role};

const NEEDS_DB: &str = "needs DATABASE_URL pointing at a scratch Postgres";

const SCHEMA: &[&str] = &[
    "CREATE TABLE accounts (
        id uuid PRIMARY KEY,
        name varchar(255) NOT NULL,
        email varchar(255) NOT NULL,
        password varchar(255),
        password_salt varchar(255),
        avatar varchar(255),
        interface_language varchar(255),
        interface_theme varchar(255),
        timezone varchar(255),
        status varchar(16) NOT NULL DEFAULT 'active',
        created_at timestamp NOT NULL DEFAULT CURRENT_TIMESTAMP(0)
    )",
    "CREATE TABLE tenants (
        id uuid PRIMARY KEY,
        name varchar(255) NOT NULL,
        encrypt_public_key text,
        plan varchar(255) NOT NULL,
        status varchar(255) NOT NULL,
        created_at timestamp NOT NULL,
        updated_at timestamp NOT NULL,
        custom_config text
    )",
    "CREATE TABLE datasets (
        id uuid PRIMARY KEY,
        tenant_id uuid,
        name varchar(255) NOT NULL,
        description text,
        provider varchar(255),
        permission varchar(255),
        data_source_type varchar(255),
        indexing_technique varchar(255),
        index_struct text,
        created_by uuid,
        created_at timestamp NOT NULL,
        updated_by uuid,
        updated_at timestamp NOT NULL,
        embedding_model varchar(255),
        embedding_model_provider varchar(255),
        collection_binding_id uuid,
        retrieval_model jsonb
    )",
    "CREATE TABLE tenant_account_joins (
        id uuid PRIMARY KEY,
        tenant_id uuid NOT NULL,
        account_id uuid NOT NULL,
        role varchar(16) NOT NULL,
        invited_by uuid,
        created_at timestamp NOT NULL,
        updated_at timestamp NOT NULL,
        current boolean NOT NULL DEFAULT false,
        CONSTRAINT unique_tenant_account_join UNIQUE (tenant_id, account_id)
    )",
    "CREATE FUNCTION refuse_delete() RETURNS trigger LANGUAGE plpgsql AS $$
     BEGIN
        RAISE EXCEPTION 'deletes from % are refused', TG_TABLE_NAME;
     END
     $$",
];

/// A schema of its own with the four upstream tables.
struct Scratch {
    admin: PgPool,
    pool: PgPool,
    schema: String,
    store: PgStore,
}

impl Scratch {
    async fn create() -> Result<Self> {
        let url = std::env::var("DATABASE_URL").context(NEEDS_DB)?;
        let options: PgConnectOptions = url.parse().context("DATABASE_URL is not a Postgres URL")?;
        let schema = format!("dify_admin_it_{}", Uuid::new_v4().simple());

        let admin = PgPoolOptions::new()
            .max_connections(1)
            .connect_with(options.clone())
            .await?;
        admin.execute(format!("CREATE SCHEMA {}", schema).as_str()).await?;

        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options.options([("search_path", schema.as_str())]))
            .await?;
        for statement in SCHEMA {
            pool.execute(*statement).await?;
        }

        let retry = RetryPolicy { max_retries: 0, backoff: Duration::from_millis(1) };
        let store = PgStore::new(pool.clone(), retry);
        Ok(Self { admin, pool, schema, store })
    }

    async fn refuse_deletes_on(&self, table: &str) -> Result<()> {
        self.pool
            .execute(
                format!(
                    "CREATE TRIGGER {table}_refuse_delete BEFORE DELETE ON {table} \
                     FOR EACH ROW EXECUTE FUNCTION refuse_delete()"
                )
                .as_str(),
            )
            .await?;
        Ok(())
    }

    async fn count(&self, sql: &str, id: Uuid) -> Result<i64> {
        Ok(sqlx::query_scalar::<_, i64>(sql).bind(id).fetch_one(&self.pool).await?)
    }

    async fn accounts_with_id(&self, id: Uuid) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM accounts WHERE id = $1", id).await
    }

    async fn memberships_of(&self, account_id: Uuid) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM tenant_account_joins WHERE account_id = $1", account_id)
            .await
    }

    /// An account that belongs to two tenants.
    async fn member_of_two(&self) -> Result<Account> {
        let account = Account::new("Ada", format!("ada-{}@example.com", Uuid::new_v4()));
        self.store.insert_account(&account).await?;
        for name in ["acme", "globex"] {
            let tenant = Tenant::new(name, None, None);
            self.store.insert_tenant(&tenant).await?;
            self.store
                .insert_membership(&TenantAccountJoin::new(account.id, tenant.id, Role::Normal, None))
                .await?;
        }
        Ok(account)
    }

    async fn drop(self) -> Result<()> {
        self.pool.close().await;
        self.admin
            .execute(format!("DROP SCHEMA {} CASCADE", self.schema).as_str())
            .await?;
        self.admin.close().await;
        Ok(())
    }
}

#[tokio::test]
#[ignore = "needs DATABASE_URL pointing at a scratch Postgres"]
async fn cascade_delete_removes_account_and_memberships() -> Result<()> {
    let db = Scratch::create().await?;
    let account = db.member_of_two().await?;

    let removed = db.store.delete_account_cascade(account.id).await?;
    assert_eq!(removed, 2);
    assert_eq!(db.accounts_with_id(account.id).await?, 0);
    assert_eq!(db.memberships_of(account.id).await?, 0);

    db.drop().await
}

#[tokio::test]
#[ignore = "needs DATABASE_URL pointing at a scratch Postgres"]
async fn cascade_delete_failing_on_account_keeps_memberships() -> Result<()> {
    let db = Scratch::create().await?;
    let account = db.member_of_two().await?;
    db.refuse_deletes_on("accounts").await?;

    let err = db.store.delete_account_cascade(account.id).await.unwrap_err();
    assert!(matches!(err, DatabaseError::Sqlx(_)), "unexpected error: {err}");
    assert_eq!(db.accounts_with_id(account.id).await?, 1);
    assert_eq!(db.memberships_of(account.id).await?, 2);

    db.drop().await
}

#[tokio::test]
#[ignore = "needs DATABASE_URL pointing at a scratch Postgres"]
async fn cascade_delete_failing_on_memberships_keeps_everything() -> Result<()> {
    let db = Scratch::create().await?;
    let account = db.member_of_two().await?;
    db.refuse_deletes_on("tenant_account_joins").await?;

    assert!(db.store.delete_account_cascade(account.id).await.is_err());
    assert_eq!(db.accounts_with_id(account.id).await?, 1);
    assert_eq!(db.memberships_of(account.id).await?, 2);

    db.drop().await
}

#[tokio::test]
#[ignore = "needs DATABASE_URL pointing at a scratch Postgres"]
async fn cascade_delete_of_unknown_account_is_not_found() -> Result<()> {
    let db = Scratch::create().await?;

    let err = db.store.delete_account_cascade(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, DatabaseError::NotFound(_)));

    db.drop().await
}

#[tokio::test]
#[ignore = "needs DATABASE_URL pointing at a scratch Postgres"]
async fn dataset_pages_are_filtered_by_tenant() -> Result<()> {
    let db = Scratch::create().await?;
    let tenant = Uuid::new_v4();
    let creator = Uuid::new_v4();

    for i in 0..12 {
        let input = NewDataset { name: format!("docs-{i}"), tenant_id: Some(tenant), ..Default::default() };
        db.store.insert_dataset(&Dataset::new(input, creator)).await?;
    }
    for i in 0..3 {
        let input = NewDataset { name: format!("loose-{i}"), ..Default::default() };
        db.store.insert_dataset(&Dataset::new(input, creator)).await?;
    }
    db.pool
        .execute(r#"UPDATE datasets SET retrieval_model = '{"top_k": 2}'::jsonb"#)
        .await?;

    let second = db.store.list_datasets(Some(tenant), PageRequest::new(2)).await?;
    assert_eq!(second.total, 12);
    assert_eq!(second.total_pages(), 2);
    assert_eq!(second.items.len(), 2);
    assert!(second.items.iter().all(|d| d.tenant_id == Some(tenant)));
    let model = second.items[0].retrieval_model.as_deref().unwrap_or_default();
    assert!(model.contains("top_k"), "retrieval_model read back as {model:?}");

    let all = db.store.list_datasets(None, PageRequest::new(1)).await?;
    assert_eq!(all.total, 15);
    assert_eq!(all.items.len(), 10);

    db.drop().await
}

#[tokio::test]
#[ignore = "needs DATABASE_URL pointing at a scratch Postgres"]
async fn duplicate_membership_is_a_conflict() -> Result<()> {
    let db = Scratch::create().await?;
    let account = db.member_of_two().await?;
    let page = db
        .store
        .list_memberships(MembershipFilter::Account(account.id), PageRequest::default())
        .await?;
    let existing = &page.items[0];
    assert!(db.store.membership_exists(account.id, existing.tenant_id).await?);

    let again = TenantAccountJoin::new(account.id, existing.tenant_id, Role::Admin, None);
    let err = db.store.insert_membership(&again).await.unwrap_err();
    assert!(matches!(err, DatabaseError::Conflict(_)), "unexpected error: {err}");
    assert_eq!(db.memberships_of(account.id).await?, 2);

    db.drop().await
}

#[tokio::test]
#[ignore = "needs DATABASE_URL pointing at a scratch Postgres"]
async fn detach_only_clears_the_named_tenant() -> Result<()> {
    let db = Scratch::create().await?;
    let (tenant, other) = (Uuid::new_v4(), Uuid::new_v4());
    let dataset = Dataset::new(
        NewDataset { name: "docs".into(), tenant_id: Some(tenant), ..Default::default() },
        Uuid::new_v4(),
    );
    db.store.insert_dataset(&dataset).await?;

    assert_eq!(db.store.detach_dataset(dataset.id, other).await?, 0);
    assert_eq!(db.store.list_datasets(Some(tenant), PageRequest::default()).await?.total, 1);

    assert_eq!(db.store.detach_dataset(dataset.id, tenant).await?, 1);
    assert_eq!(db.store.list_datasets(Some(tenant), PageRequest::default()).await?.total, 0);

    assert_eq!(db.store.attach_dataset(dataset.id, other).await?, 1);
    assert_eq!(db.store.list_datasets(Some(other), PageRequest::default()).await?.total, 1);

    db.drop().await
}
