use sqlx::{self, postgres::PgRow, FromRow, PgPool};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::query_builder::QueryBuilder;
use crate::types::{Page, PageRequest};

/// A table that can be listed page by page.
pub trait Entity: for<'r> FromRow<'r, PgRow> + Send + Unpin {
    const TABLE: &'static str;
    /// Select list, in `FromRow` field order.
    const COLUMNS: &'static str;
    const ORDER_BY: &'static str = "created_at DESC, id";
}

/// Single equality predicate applied before paging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EqFilter {
    pub column: &'static str,
    pub value: Uuid,
}

impl EqFilter {
    pub fn new(column: &'static str, value: Uuid) -> Self {
        Self { column, value }
    }
}

pub struct Repository<T> {
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: Entity> Repository<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Count and page in one read-only snapshot, so `total` always describes
    /// the same set of rows the page was cut from.
    pub async fn page(
        &self,
        filter: Option<EqFilter>,
        request: PageRequest,
    ) -> Result<Page<T>, DatabaseError> {
        let builder = QueryBuilder::for_entity::<T>().filter(filter.map(|f| f.column));
        let count_sql = builder.count_sql();
        let select_sql = builder.select_sql();

        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let mut count = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(f) = &filter {
            count = count.bind(f.value);
        }
        let total = count.fetch_one(&mut *tx).await?;

        let mut rows = sqlx::query_as::<_, T>(&select_sql);
        if let Some(f) = &filter {
            rows = rows.bind(f.value);
        }
        let items = rows
            .bind(request.limit())
            .bind(request.offset())
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Page { items, total, request })
    }
}
