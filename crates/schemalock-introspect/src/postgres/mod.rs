use async_trait::async_trait;
use sqlx::PgConnection;

use schemalock_core::{Error, Result, TableSchema};

use crate::catalog::Catalog;
use crate::options::IntrospectOptions;

mod mapper;
mod queries;

/// Catalog reader over a borrowed PostgreSQL connection.
///
/// Borrowing the connection lets the caller keep introspection and DDL on the
/// same session, inside or outside a transaction.
pub struct PostgresCatalog<'c> {
    conn: &'c mut PgConnection,
    opts: &'c IntrospectOptions,
}

impl<'c> PostgresCatalog<'c> {
    pub fn new(conn: &'c mut PgConnection, opts: &'c IntrospectOptions) -> Self {
        Self { conn, opts }
    }
}

#[async_trait]
impl Catalog for PostgresCatalog<'_> {
    fn engine(&self) -> &'static str {
        "postgres"
    }

    async fn list_tables(&mut self) -> Result<Vec<String>> {
        queries::list_tables(self.conn, &self.opts.schema).await
    }

    async fn describe(&mut self, table: &str) -> Result<TableSchema> {
        describe(self.conn, self.opts, table).await
    }
}

/// Introspect one table of the configured namespace.
pub async fn describe(
    conn: &mut PgConnection,
    opts: &IntrospectOptions,
    name: &str,
) -> Result<TableSchema> {
    let schema = opts.schema.as_str();
    let raw_table = queries::fetch_table(conn, schema, name)
        .await?
        .ok_or_else(|| Error::InvalidSchema(format!("table `{schema}.{name}` does not exist")))?;

    let mut table = TableSchema::new(name);
    for raw in queries::list_columns(conn, schema, name).await? {
        table.add_column(mapper::map_column(raw, opts))?;
    }

    if opts.include_indexes {
        for raw in queries::list_indexes(conn, schema, name).await? {
            table.add_index(mapper::map_index(raw))?;
        }
    }

    for raw in queries::list_constraints(conn, schema, name).await? {
        if let Some(constraint) = mapper::map_constraint(raw) {
            table.add_constraint(constraint)?;
        }
    }

    mapper::apply_table_options(&mut table, raw_table, opts);

    tracing::debug!(
        event = "table_described",
        table = name,
        columns = table.columns().len(),
        indexes = table.indexes().len(),
        constraints = table.constraints().len()
    );
    Ok(table)
}
