use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::schema::TableSchema;

/// One data row: column name to value, in column order.
pub type Row = Map<String, Value>;

/// Full schema of a database at a point in time.
///
/// Tables keep insertion order; dependency order is computed at load time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    tables: Vec<TableSchema>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a table. Table names are unique within a snapshot.
    pub fn push(&mut self, table: TableSchema) -> Result<()> {
        if self.table(&table.name).is_some() {
            return Err(Error::InvalidSchema(format!(
                "duplicate table name: {}",
                table.name
            )));
        }
        self.tables.push(table);
        Ok(())
    }

    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|table| table.name == name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|table| table.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Seed rows for a subset of tables, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedSet {
    tables: Vec<(String, Vec<Row>)>,
}

impl SeedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append rows for a table; rows for an already present table are appended to it.
    pub fn push(&mut self, table: impl Into<String>, rows: Vec<Row>) {
        let table = table.into();
        match self.tables.iter_mut().find(|(name, _)| *name == table) {
            Some((_, existing)) => existing.extend(rows),
            None => self.tables.push((table, rows)),
        }
    }

    pub fn tables(&self) -> impl Iterator<Item = (&str, &[Row])> {
        self.tables
            .iter()
            .map(|(name, rows)| (name.as_str(), rows.as_slice()))
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|(name, _)| name.as_str())
    }

    pub fn rows(&self, table: &str) -> Option<&[Row]> {
        self.tables
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, rows)| rows.as_slice())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.tables.iter().map(|(_, rows)| rows.len()).sum()
    }
}

/// Union of the keys across `rows`, in first-seen order.
pub fn union_columns(rows: &[Row]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !columns.iter().any(|column| column == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test rows are objects"),
        }
    }

    #[test]
    fn union_keeps_first_seen_order() {
        let rows = vec![
            row(json!({"a": 1, "b": 2})),
            row(json!({"a": 3})),
            row(json!({"c": 4, "a": 5})),
        ];
        assert_eq!(union_columns(&rows), vec!["a", "b", "c"]);
    }

    #[test]
    fn rejects_duplicate_tables() {
        let mut snapshot = Snapshot::new();
        snapshot.push(TableSchema::new("users")).unwrap();
        assert!(snapshot.push(TableSchema::new("users")).is_err());
    }

    #[test]
    fn seed_rows_for_same_table_are_merged() {
        let mut seed = SeedSet::new();
        seed.push("users", vec![row(json!({"id": 1}))]);
        seed.push("users", vec![row(json!({"id": 2}))]);
        assert_eq!(seed.len(), 1);
        assert_eq!(seed.row_count(), 2);
    }
}
