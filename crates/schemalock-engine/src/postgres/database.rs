use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::pool::PoolConnection;
use sqlx::postgres::PgPoolOptions;
use sqlx::Postgres;

use schemalock_core::{ColumnType, Error, Result, Row, TableSchema};
use schemalock_introspect::{Catalog, IntrospectOptions, PostgresCatalog};

use crate::database::{Database, RowQuery, Statement};
use crate::dialect::Dialect;

use super::dialect::PostgresDialect;

/// Single-session PostgreSQL connection.
///
/// Every statement of an invocation runs on the same session so that
/// `BEGIN`/`COMMIT` issued through [`Database`] bracket them.
pub struct PgDatabase {
    conn: PoolConnection<Postgres>,
    dialect: PostgresDialect,
    introspect: IntrospectOptions,
}

impl PgDatabase {
    /// Connect and pin the session to UTC and the configured namespace.
    pub async fn connect(url: &str, introspect: IntrospectOptions) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await
            .map_err(|err| Error::Db(err.to_string()))?;
        let conn = pool
            .acquire()
            .await
            .map_err(|err| Error::Db(err.to_string()))?;

        let mut db = Self {
            conn,
            dialect: PostgresDialect,
            introspect,
        };

        let mut search_path = db.dialect.quote_identifier(&db.introspect.schema);
        if db.introspect.schema != "public" {
            search_path.push_str(", public");
        }
        db.execute(&Statement::new("SET TIME ZONE 'UTC'")).await?;
        db.execute(&Statement::new(format!("SET search_path TO {search_path}")))
            .await?;

        tracing::debug!(event = "connected", driver = "postgres", schema = %db.introspect.schema);
        Ok(db)
    }

    /// Select list that renders each column as JSON without losing precision.
    fn select_list(&self, table: &TableSchema) -> String {
        table
            .columns()
            .iter()
            .map(|column| {
                let name = self.dialect.quote_identifier(&column.name);
                match column.column_type {
                    // numeric goes through text; JSON numbers would be parsed as f64
                    ColumnType::Decimal => format!("{name}::text AS {name}"),
                    _ => name,
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn statement_error(statement: &Statement, err: sqlx::Error) -> Error {
    match err {
        sqlx::Error::Database(db_err) => Error::StatementExecution {
            statement: statement.sql.clone(),
            message: db_err.message().to_string(),
        },
        other => Error::Db(other.to_string()),
    }
}

#[async_trait]
impl Database for PgDatabase {
    fn driver_kind(&self) -> &str {
        "postgres"
    }

    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    async fn list_tables(&mut self) -> Result<Vec<String>> {
        PostgresCatalog::new(&mut self.conn, &self.introspect)
            .list_tables()
            .await
    }

    async fn describe(&mut self, table: &str) -> Result<TableSchema> {
        PostgresCatalog::new(&mut self.conn, &self.introspect)
            .describe(table)
            .await
    }

    async fn execute(&mut self, statement: &Statement) -> Result<u64> {
        let result = if statement.params.is_empty() {
            sqlx::Executor::execute(&mut *self.conn, sqlx::raw_sql(&statement.sql)).await
        } else {
            let mut query = sqlx::query(&statement.sql);
            for param in &statement.params {
                query = query.bind(param.as_deref());
            }
            query.execute(&mut *self.conn).await
        };

        result
            .map(|done| done.rows_affected())
            .map_err(|err| statement_error(statement, err))
    }

    async fn fetch_rows(&mut self, table: &TableSchema, query: &RowQuery) -> Result<Vec<Row>> {
        let mut sql = format!(
            "SELECT row_to_json(t)::text FROM (SELECT {} FROM {}",
            self.select_list(table),
            self.dialect.quote_identifier(&table.name)
        );
        if let Some(filter) = query.filter.as_deref() {
            sql.push_str(&format!(" WHERE {filter}"));
        }
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        sql.push_str(") t");

        let statement = Statement::new(sql);
        let rows = sqlx::query_scalar::<_, String>(&statement.sql)
            .fetch_all(&mut *self.conn)
            .await
            .map_err(|err| statement_error(&statement, err))?;

        rows.iter()
            .map(|text| match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(row)) => Ok(row),
                Ok(_) | Err(_) => Err(Error::Db(format!(
                    "row of `{}` did not decode as a JSON object",
                    table.name
                ))),
            })
            .collect()
    }

    async fn begin(&mut self) -> Result<()> {
        self.execute(&Statement::new("BEGIN")).await.map(|_| ())
    }

    async fn commit(&mut self) -> Result<()> {
        self.execute(&Statement::new("COMMIT")).await.map(|_| ())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.execute(&Statement::new("ROLLBACK")).await.map(|_| ())
    }
}
