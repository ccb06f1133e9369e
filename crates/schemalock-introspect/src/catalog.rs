use async_trait::async_trait;

use schemalock_core::{Result, TableSchema};

/// Read access to the table catalog of a live connection.
#[async_trait]
pub trait Catalog: Send {
    /// Returns the engine identifier (e.g. `postgres`).
    fn engine(&self) -> &'static str;

    /// Names of the existing tables, ordered by name.
    async fn list_tables(&mut self) -> Result<Vec<String>>;

    /// Full definition of one existing table.
    async fn describe(&mut self, table: &str) -> Result<TableSchema>;
}
