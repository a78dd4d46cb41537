use crate::database::repository::Entity;

/// Builds the count and page statements of one paginated list.
///
/// Table and column names only ever come from `Entity` constants, never from
/// request data; the filter value and paging arguments are bound parameters.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table_name: &'static str,
    columns: &'static str,
    order_by: &'static str,
    filter_column: Option<&'static str>,
}

impl QueryBuilder {
    pub fn for_entity<T: Entity>() -> Self {
        Self {
            table_name: T::TABLE,
            columns: T::COLUMNS,
            order_by: T::ORDER_BY,
            filter_column: None,
        }
    }

    /// Restrict both statements to `column = $1`.
    pub fn filter(mut self, column: Option<&'static str>) -> Self {
        self.filter_column = column;
        self
    }

    pub fn count_sql(&self) -> String {
        format!(
            "SELECT COUNT(*) AS count FROM \"{}\"{}",
            self.table_name,
            self.where_clause()
        )
    }

    /// Page statement; LIMIT and OFFSET are the last two placeholders.
    pub fn select_sql(&self) -> String {
        let next = if self.filter_column.is_some() { 2 } else { 1 };
        format!(
            "SELECT {} FROM \"{}\"{} ORDER BY {} LIMIT ${} OFFSET ${}",
            self.columns,
            self.table_name,
            self.where_clause(),
            self.order_by,
            next,
            next + 1
        )
    }

    fn where_clause(&self) -> String {
        match self.filter_column {
            Some(column) => format!(" WHERE \"{}\" = $1", column),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Dataset, Tenant, TenantAccountJoin};

    #[test]
    fn unfiltered_statements() {
        let qb = QueryBuilder::for_entity::<Tenant>();
        assert_eq!(qb.count_sql(), "SELECT COUNT(*) AS count FROM \"tenants\"");
        let select = qb.select_sql();
        assert!(select.starts_with("SELECT id, name, encrypt_public_key"));
        assert!(select.ends_with("FROM \"tenants\" ORDER BY created_at DESC, id LIMIT $1 OFFSET $2"));
    }

    #[test]
    fn filtered_statements_shift_placeholders() {
        let qb = QueryBuilder::for_entity::<TenantAccountJoin>().filter(Some("account_id"));
        assert_eq!(
            qb.count_sql(),
            "SELECT COUNT(*) AS count FROM \"tenant_account_joins\" WHERE \"account_id\" = $1"
        );
        assert!(qb
            .select_sql()
            .ends_with("WHERE \"account_id\" = $1 ORDER BY created_at DESC, id LIMIT $2 OFFSET $3"));
    }

    #[test]
    fn dataset_select_casts_opaque_json() {
        let select = QueryBuilder::for_entity::<Dataset>().select_sql();
        assert!(select.contains("retrieval_model::text AS retrieval_model"));
    }
}
