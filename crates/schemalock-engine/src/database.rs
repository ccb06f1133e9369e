use std::fmt;

use async_trait::async_trait;

use schemalock_core::{Error, Result, Row, TableSchema};

use crate::dialect::Dialect;

/// One SQL statement with positional text parameters.
///
/// `None` binds SQL `NULL`. Dialects cast parameters to the column type in the
/// statement text, so every value travels as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Option<String>>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(sql: impl Into<String>, params: Vec<Option<String>>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Row selection for seed generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowQuery {
    /// Maximum number of rows; `None` fetches every matching row.
    pub limit: Option<u64>,
    /// Raw SQL condition; `None` matches all rows.
    pub filter: Option<String>,
}

/// A live connection the engine drives.
///
/// Catalog access is optional: connections that cannot enumerate tables keep
/// the default methods, which fail with [`Error::ConnectionCapability`].
#[async_trait]
pub trait Database: Send {
    /// Driver identifier used in logs and capability errors (e.g. `postgres`).
    fn driver_kind(&self) -> &str;

    fn dialect(&self) -> &dyn Dialect;

    /// Names of the existing tables.
    async fn list_tables(&mut self) -> Result<Vec<String>> {
        Err(Error::ConnectionCapability(format!(
            "{} connections cannot list tables",
            self.driver_kind()
        )))
    }

    /// Definition of one existing table.
    async fn describe(&mut self, table: &str) -> Result<TableSchema> {
        Err(Error::ConnectionCapability(format!(
            "{} connections cannot describe table `{table}`",
            self.driver_kind()
        )))
    }

    /// Run one statement, returning the number of affected rows.
    async fn execute(&mut self, statement: &Statement) -> Result<u64>;

    /// Fetch rows of `table`, keyed by column name.
    async fn fetch_rows(&mut self, table: &TableSchema, query: &RowQuery) -> Result<Vec<Row>>;

    async fn begin(&mut self) -> Result<()>;

    async fn commit(&mut self) -> Result<()>;

    async fn rollback(&mut self) -> Result<()>;
}
