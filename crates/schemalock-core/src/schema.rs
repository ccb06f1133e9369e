use serde_json::{Map, Value};

use crate::constraints::{ConstraintDefinition, ConstraintKind, ForeignKey, IndexDefinition};
use crate::error::{Error, Result};
use crate::types::ColumnType;

/// Column metadata for a table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    /// Literal default. `None` means no default (or `DEFAULT NULL`).
    pub default: Option<Value>,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub auto_increment: bool,
    /// Vendor-specific attributes, kept in insertion order.
    pub extra: Map<String, Value>,
}

impl ColumnDefinition {
    /// Nullable column without default or bounds.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            default: None,
            length: None,
            precision: None,
            scale: None,
            auto_increment: false,
            extra: Map::new(),
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = if value.is_null() { None } else { Some(value) };
        self
    }

    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_precision(mut self, precision: u32, scale: Option<u32>) -> Self {
        self.precision = Some(precision);
        self.scale = scale;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// String-valued extra attribute.
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }
}

/// In-memory representation of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub name: String,
    columns: Vec<ColumnDefinition>,
    indexes: Vec<IndexDefinition>,
    constraints: Vec<ConstraintDefinition>,
    options: Map<String, Value>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
            constraints: Vec::new(),
            options: Map::new(),
        }
    }

    /// Append a column. Column names are unique within a table.
    ///
    /// A `Some(Value::Null)` default is stored as no default.
    pub fn add_column(&mut self, mut column: ColumnDefinition) -> Result<&mut Self> {
        if self.has_column(&column.name) {
            return Err(Error::InvalidSchema(format!(
                "duplicate column name: {}.{}",
                self.name, column.name
            )));
        }
        column.default = column.default.filter(|value| !value.is_null());
        self.columns.push(column);
        Ok(self)
    }

    /// Replace an existing column in place, keeping its position.
    pub fn replace_column(&mut self, mut column: ColumnDefinition) -> Result<&mut Self> {
        column.default = column.default.filter(|value| !value.is_null());
        let slot = self
            .columns
            .iter_mut()
            .find(|existing| existing.name == column.name)
            .ok_or_else(|| {
                Error::InvalidSchema(format!(
                    "cannot replace missing column: {}.{}",
                    self.name, column.name
                ))
            })?;
        *slot = column;
        Ok(self)
    }

    pub fn add_index(&mut self, index: IndexDefinition) -> Result<&mut Self> {
        if self.index(&index.name).is_some() {
            return Err(Error::InvalidSchema(format!(
                "duplicate index name: {}.{}",
                self.name, index.name
            )));
        }
        self.indexes.push(index);
        Ok(self)
    }

    pub fn add_constraint(&mut self, constraint: ConstraintDefinition) -> Result<&mut Self> {
        if self.constraint(&constraint.name).is_some() {
            return Err(Error::InvalidSchema(format!(
                "duplicate constraint name: {}.{}",
                self.name, constraint.name
            )));
        }
        self.constraints.push(constraint);
        Ok(self)
    }

    pub fn set_option(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.options.insert(key.into(), value);
        self
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|column| column.name.as_str())
    }

    pub fn indexes(&self) -> &[IndexDefinition] {
        &self.indexes
    }

    pub fn index(&self, name: &str) -> Option<&IndexDefinition> {
        self.indexes.iter().find(|index| index.name == name)
    }

    pub fn constraints(&self) -> &[ConstraintDefinition] {
        &self.constraints
    }

    pub fn constraint(&self, name: &str) -> Option<&ConstraintDefinition> {
        self.constraints
            .iter()
            .find(|constraint| constraint.name == name)
    }

    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(Value::as_str)
    }

    /// Foreign keys with their constraint names.
    pub fn foreign_keys(&self) -> impl Iterator<Item = (&str, &ForeignKey)> {
        self.constraints.iter().filter_map(|constraint| {
            constraint
                .as_foreign_key()
                .map(|fk| (constraint.name.as_str(), fk))
        })
    }

    /// Split the table into a copy without foreign keys and the held-aside keys.
    pub fn split_foreign_keys(&self) -> (TableSchema, Vec<ConstraintDefinition>) {
        let (foreign, local): (Vec<_>, Vec<_>) = self
            .constraints
            .iter()
            .cloned()
            .partition(ConstraintDefinition::is_foreign_key);

        let table = TableSchema {
            constraints: local,
            ..self.clone()
        };
        (table, foreign)
    }

    pub fn primary_key(&self) -> Option<&[String]> {
        self.constraints.iter().find_map(|constraint| match &constraint.kind {
            ConstraintKind::PrimaryKey { columns } => Some(columns.as_slice()),
            _ => None,
        })
    }

    pub fn has_auto_increment(&self) -> bool {
        self.columns.iter().any(|column| column.auto_increment)
    }
}
