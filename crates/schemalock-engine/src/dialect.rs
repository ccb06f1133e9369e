use serde_json::Value;

use schemalock_core::{ColumnDefinition, ForeignKey, Result, TableSchema};

use crate::database::Statement;

/// SQL generation for one database vendor.
///
/// Only the statement text differs between vendors; the engine decides the
/// order in which statements run and the transaction around them.
pub trait Dialect: Send + Sync {
    fn name(&self) -> &'static str;

    fn quote_identifier(&self, name: &str) -> String;

    /// `CREATE TABLE` plus the table's indexes and comments.
    ///
    /// Foreign keys are not emitted here; callers pass a table stripped of
    /// them and apply them later through [`Dialect::add_foreign_key_sql`].
    fn create_table_sql(&self, table: &TableSchema) -> Result<Vec<Statement>>;

    fn drop_table_sql(&self, table: &str) -> Statement;

    fn truncate_table_sql(&self, table: &str) -> Statement;

    fn add_foreign_key_sql(&self, table: &str, name: &str, fk: &ForeignKey) -> Statement;

    /// Statements that suspend foreign-key checking inside a transaction.
    fn disable_foreign_keys_sql(&self) -> Vec<Statement>;

    fn enable_foreign_keys_sql(&self) -> Vec<Statement>;

    /// Whether explicit identity values need a per-table toggle around inserts.
    fn requires_identity_insert_toggle(&self) -> bool {
        false
    }

    fn identity_insert_sql(&self, _table: &str, _enabled: bool) -> Option<Statement> {
        None
    }

    /// Multi-row insert; `rows` hold the bound text of each column in order.
    fn insert_sql(
        &self,
        table: &TableSchema,
        columns: &[&ColumnDefinition],
        rows: Vec<Vec<Option<String>>>,
    ) -> Statement;

    /// Statements run after explicit values were written into generated keys.
    fn reset_sequences_sql(&self, _table: &TableSchema, _columns: &[&ColumnDefinition]) -> Vec<Statement> {
        Vec::new()
    }

    /// Upper bound on parameters in one statement.
    fn max_bind_params(&self) -> usize;

    /// Text form of `value` as bound for `column`; `None` is SQL `NULL`.
    fn bind_value(&self, column: &ColumnDefinition, value: &Value) -> Option<String> {
        let _ = column;
        schemalock_core::value::to_text(value)
    }
}
