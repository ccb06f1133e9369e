#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use schemalock_core::{
    ColumnDefinition, ColumnType, ConstraintDefinition, Error, ForeignKey, Result, Row,
    TableSchema,
};
use schemalock_engine::{
    Confirm, Database, Dialect, PostgresDialect, Progress, RowQuery, Statement,
};

/// In-memory connection that records every statement it is asked to run.
pub struct FakeDatabase {
    pub tables: Vec<TableSchema>,
    pub rows: BTreeMap<String, Vec<Row>>,
    pub executed: Vec<Statement>,
    pub queries: Vec<(String, RowQuery)>,
    /// Statements whose SQL contains this text fail.
    pub fail_on: Option<String>,
    pub catalog: bool,
    dialect: Box<dyn Dialect>,
}

impl FakeDatabase {
    pub fn new() -> Self {
        Self::with_dialect(Box::new(PostgresDialect))
    }

    pub fn with_dialect(dialect: Box<dyn Dialect>) -> Self {
        Self {
            tables: Vec::new(),
            rows: BTreeMap::new(),
            executed: Vec::new(),
            queries: Vec::new(),
            fail_on: None,
            catalog: true,
            dialect,
        }
    }

    pub fn with_tables(mut self, tables: Vec<TableSchema>) -> Self {
        self.tables = tables;
        self
    }

    pub fn without_catalog(mut self) -> Self {
        self.catalog = false;
        self
    }

    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }

    pub fn sql(&self) -> Vec<&str> {
        self.executed
            .iter()
            .map(|statement| statement.sql.as_str())
            .collect()
    }

    /// Index of the first executed statement that starts with `prefix`.
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.sql().iter().position(|sql| sql.starts_with(prefix))
    }

    pub fn positions(&self, prefix: &str) -> Vec<usize> {
        self.sql()
            .iter()
            .enumerate()
            .filter(|(_, sql)| sql.starts_with(prefix))
            .map(|(idx, _)| idx)
            .collect()
    }

    fn record(&mut self, statement: Statement) -> Result<()> {
        let failed = self
            .fail_on
            .as_deref()
            .is_some_and(|needle| statement.sql.contains(needle));
        let sql = statement.sql.clone();
        self.executed.push(statement);
        if failed {
            return Err(Error::StatementExecution {
                statement: sql,
                message: "simulated failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Database for FakeDatabase {
    fn driver_kind(&self) -> &str {
        "fake"
    }

    fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    async fn list_tables(&mut self) -> Result<Vec<String>> {
        if !self.catalog {
            return Err(Error::ConnectionCapability(
                "fake connection without catalog".to_string(),
            ));
        }
        Ok(self.tables.iter().map(|table| table.name.clone()).collect())
    }

    async fn describe(&mut self, table: &str) -> Result<TableSchema> {
        if !self.catalog {
            return Err(Error::ConnectionCapability(
                "fake connection without catalog".to_string(),
            ));
        }
        self.tables
            .iter()
            .find(|candidate| candidate.name == table)
            .cloned()
            .ok_or_else(|| Error::InvalidSchema(format!("no table `{table}`")))
    }

    async fn execute(&mut self, statement: &Statement) -> Result<u64> {
        self.record(statement.clone())?;
        Ok(0)
    }

    async fn fetch_rows(&mut self, table: &TableSchema, query: &RowQuery) -> Result<Vec<Row>> {
        self.queries.push((table.name.clone(), query.clone()));
        let rows = self.rows.get(&table.name).cloned().unwrap_or_default();
        Ok(match query.limit {
            Some(limit) => rows.into_iter().take(limit as usize).collect(),
            None => rows,
        })
    }

    async fn begin(&mut self) -> Result<()> {
        self.record(Statement::new("BEGIN"))
    }

    async fn commit(&mut self) -> Result<()> {
        self.record(Statement::new("COMMIT"))
    }

    async fn rollback(&mut self) -> Result<()> {
        self.record(Statement::new("ROLLBACK"))
    }
}

/// Dialect with a per-table identity toggle and a configurable parameter limit.
pub struct ToggleDialect {
    pub max_params: usize,
}

impl Dialect for ToggleDialect {
    fn name(&self) -> &'static str {
        "toggle"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("[{name}]")
    }

    fn create_table_sql(&self, table: &TableSchema) -> Result<Vec<Statement>> {
        PostgresDialect.create_table_sql(table)
    }

    fn drop_table_sql(&self, table: &str) -> Statement {
        Statement::new(format!("DROP TABLE [{table}]"))
    }

    fn truncate_table_sql(&self, table: &str) -> Statement {
        Statement::new(format!("TRUNCATE TABLE [{table}]"))
    }

    fn add_foreign_key_sql(&self, table: &str, name: &str, fk: &ForeignKey) -> Statement {
        PostgresDialect.add_foreign_key_sql(table, name, fk)
    }

    fn disable_foreign_keys_sql(&self) -> Vec<Statement> {
        vec![Statement::new("EXEC sp_MSforeachtable 'ALTER TABLE ? NOCHECK CONSTRAINT ALL'")]
    }

    fn enable_foreign_keys_sql(&self) -> Vec<Statement> {
        vec![Statement::new("EXEC sp_MSforeachtable 'ALTER TABLE ? WITH CHECK CHECK CONSTRAINT ALL'")]
    }

    fn requires_identity_insert_toggle(&self) -> bool {
        true
    }

    fn identity_insert_sql(&self, table: &str, enabled: bool) -> Option<Statement> {
        let state = if enabled { "ON" } else { "OFF" };
        Some(Statement::new(format!("SET IDENTITY_INSERT [{table}] {state}")))
    }

    fn insert_sql(
        &self,
        table: &TableSchema,
        columns: &[&ColumnDefinition],
        rows: Vec<Vec<Option<String>>>,
    ) -> Statement {
        let names: Vec<String> = columns.iter().map(|column| format!("[{}]", column.name)).collect();
        let tuples: Vec<String> = rows
            .iter()
            .map(|row| format!("({})", vec!["?"; row.len()].join(", ")))
            .collect();
        Statement::with_params(
            format!(
                "INSERT INTO [{}] ({}) VALUES {}",
                table.name,
                names.join(", "),
                tuples.join(", ")
            ),
            rows.into_iter().flatten().collect(),
        )
    }

    fn max_bind_params(&self) -> usize {
        self.max_params
    }
}

/// Confirmation that answers from a script and records its prompts.
pub struct ScriptedConfirm {
    answer: bool,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedConfirm {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> usize {
        self.prompts.lock().map(|prompts| prompts.len()).unwrap_or(0)
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.answer
    }
}

#[derive(Default)]
pub struct RecordingProgress {
    pub tables: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn seen(&self) -> Vec<String> {
        self.tables.lock().map(|tables| tables.clone()).unwrap_or_default()
    }
}

impl Progress for RecordingProgress {
    fn on_table(&self, table: &str) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.push(table.to_string());
        }
    }
}

pub fn users_table() -> TableSchema {
    let mut table = TableSchema::new("users");
    table
        .add_column(
            ColumnDefinition::new("id", ColumnType::Integer)
                .not_null()
                .auto_increment(),
        )
        .unwrap()
        .add_column(ColumnDefinition::new("name", ColumnType::String).with_length(80))
        .unwrap()
        .add_column(ColumnDefinition::new("email", ColumnType::String))
        .unwrap()
        .add_column(ColumnDefinition::new("created", ColumnType::DateTime))
        .unwrap()
        .add_constraint(ConstraintDefinition::primary_key("users_pkey", &["id"]))
        .unwrap();
    table
}

pub fn orders_table() -> TableSchema {
    let mut table = TableSchema::new("orders");
    table
        .add_column(ColumnDefinition::new("id", ColumnType::Integer).not_null())
        .unwrap()
        .add_column(ColumnDefinition::new("user_id", ColumnType::Integer).not_null())
        .unwrap()
        .add_column(ColumnDefinition::new("placed", ColumnType::Date))
        .unwrap()
        .add_constraint(ConstraintDefinition::primary_key("orders_pkey", &["id"]))
        .unwrap()
        .add_constraint(ConstraintDefinition::foreign_key(
            "orders_user_fk",
            &["user_id"],
            "users",
            &["id"],
        ))
        .unwrap();
    table
}

pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("rows are objects, got {other}"),
    }
}

pub fn scratch_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("schemalock-engine-{label}-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
