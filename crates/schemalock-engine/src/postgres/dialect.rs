use serde_json::Value;

use schemalock_core::{
    ColumnDefinition, ColumnType, ConstraintKind, Error, ForeignKey, IndexDefinition, Result,
    TableSchema,
};

use crate::database::Statement;
use crate::dialect::Dialect;

/// Bind parameters per statement accepted by the PostgreSQL protocol.
pub const MAX_BIND_PARAMS: usize = 65_535;

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Column type as written in `CREATE TABLE`.
    fn column_type_sql(&self, table: &str, column: &ColumnDefinition) -> Result<String> {
        if column.auto_increment && column.extra_str("identity").is_none() {
            return match column.column_type {
                ColumnType::SmallInteger => Ok("smallserial".to_string()),
                ColumnType::Integer => Ok("serial".to_string()),
                ColumnType::BigInteger => Ok("bigserial".to_string()),
                _ => Err(Error::ddl(
                    table,
                    &column.name,
                    format!(
                        "auto-increment needs an integer column, found `{}`",
                        column.column_type
                    ),
                )),
            };
        }
        Ok(type_sql(column))
    }

    fn column_sql(&self, table: &str, column: &ColumnDefinition) -> Result<String> {
        let mut sql = format!(
            "{} {}",
            self.quote_identifier(&column.name),
            self.column_type_sql(table, column)?
        );

        if let Some(collation) = column.extra_str("collate") {
            sql.push_str(&format!(" COLLATE {}", self.quote_identifier(collation)));
        }
        match column.extra_str("identity") {
            Some("always") => sql.push_str(" GENERATED ALWAYS AS IDENTITY"),
            Some(_) => sql.push_str(" GENERATED BY DEFAULT AS IDENTITY"),
            None => {}
        }
        if !column.nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(expression) = column.extra_str("default_expression") {
            sql.push_str(&format!(" DEFAULT {expression}"));
        } else if let Some(default) = &column.default {
            sql.push_str(&format!(" DEFAULT {}", literal_sql(default)));
        }
        Ok(sql)
    }

    fn column_list(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|column| self.quote_identifier(column))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn index_sql(&self, table: &str, index: &IndexDefinition) -> Statement {
        let unique = if index.unique { "UNIQUE " } else { "" };
        if let Some(definition) = &index.definition {
            return Statement::new(format!(
                "CREATE {unique}INDEX {} ON {} USING {definition}",
                self.quote_identifier(&index.name),
                self.quote_identifier(table)
            ));
        }
        let method = index
            .kind
            .as_deref()
            .map(|kind| format!(" USING {kind}"))
            .unwrap_or_default();
        Statement::new(format!(
            "CREATE {unique}INDEX {} ON {}{method} ({})",
            self.quote_identifier(&index.name),
            self.quote_identifier(table),
            self.column_list(&index.columns)
        ))
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn create_table_sql(&self, table: &TableSchema) -> Result<Vec<Statement>> {
        let mut lines = Vec::new();
        for column in table.columns() {
            lines.push(self.column_sql(&table.name, column)?);
        }

        for constraint in table.constraints() {
            let name = self.quote_identifier(&constraint.name);
            let line = match &constraint.kind {
                ConstraintKind::PrimaryKey { columns } => {
                    format!("CONSTRAINT {name} PRIMARY KEY ({})", self.column_list(columns))
                }
                ConstraintKind::Unique { columns } => {
                    format!("CONSTRAINT {name} UNIQUE ({})", self.column_list(columns))
                }
                ConstraintKind::Check { expression } => {
                    format!("CONSTRAINT {name} CHECK ({expression})")
                }
                ConstraintKind::Exclusion { definition, .. } => {
                    format!("CONSTRAINT {name} {definition}")
                }
                ConstraintKind::ForeignKey(_) => {
                    return Err(Error::ddl(
                        &table.name,
                        &constraint.name,
                        "foreign keys are applied after every table exists",
                    ));
                }
            };
            lines.push(line);
        }

        let mut create = format!(
            "CREATE TABLE {} (\n    {}\n)",
            self.quote_identifier(&table.name),
            lines.join(",\n    ")
        );
        if let Some(Value::Array(storage)) = table.options().get("storage") {
            let params: Vec<&str> = storage.iter().filter_map(Value::as_str).collect();
            if !params.is_empty() {
                create.push_str(&format!(" WITH ({})", params.join(", ")));
            }
        }

        let mut statements = vec![Statement::new(create)];
        statements.extend(
            table
                .indexes()
                .iter()
                .map(|index| self.index_sql(&table.name, index)),
        );

        if let Some(comment) = table.option_str("comment") {
            statements.push(Statement::new(format!(
                "COMMENT ON TABLE {} IS {}",
                self.quote_identifier(&table.name),
                quote_literal(comment)
            )));
        }
        for column in table.columns() {
            if let Some(comment) = column.extra_str("comment") {
                statements.push(Statement::new(format!(
                    "COMMENT ON COLUMN {}.{} IS {}",
                    self.quote_identifier(&table.name),
                    self.quote_identifier(&column.name),
                    quote_literal(comment)
                )));
            }
        }

        Ok(statements)
    }

    fn drop_table_sql(&self, table: &str) -> Statement {
        Statement::new(format!(
            "DROP TABLE IF EXISTS {} CASCADE",
            self.quote_identifier(table)
        ))
    }

    fn truncate_table_sql(&self, table: &str) -> Statement {
        Statement::new(format!(
            "TRUNCATE TABLE {} RESTART IDENTITY CASCADE",
            self.quote_identifier(table)
        ))
    }

    fn add_foreign_key_sql(&self, table: &str, name: &str, fk: &ForeignKey) -> Statement {
        Statement::new(format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({}) ON UPDATE {} ON DELETE {}",
            self.quote_identifier(table),
            self.quote_identifier(name),
            self.column_list(&fk.columns),
            self.quote_identifier(&fk.referenced_table),
            self.column_list(&fk.referenced_columns),
            fk.on_update.sql(),
            fk.on_delete.sql()
        ))
    }

    fn disable_foreign_keys_sql(&self) -> Vec<Statement> {
        vec![Statement::new("SET CONSTRAINTS ALL DEFERRED")]
    }

    fn enable_foreign_keys_sql(&self) -> Vec<Statement> {
        vec![Statement::new("SET CONSTRAINTS ALL IMMEDIATE")]
    }

    fn insert_sql(
        &self,
        table: &TableSchema,
        columns: &[&ColumnDefinition],
        rows: Vec<Vec<Option<String>>>,
    ) -> Statement {
        let names: Vec<String> = columns
            .iter()
            .map(|column| self.quote_identifier(&column.name))
            .collect();
        let overriding = if columns
            .iter()
            .any(|column| column.extra_str("identity") == Some("always"))
        {
            " OVERRIDING SYSTEM VALUE"
        } else {
            ""
        };

        let mut params = Vec::with_capacity(rows.len() * columns.len());
        let mut tuples = Vec::with_capacity(rows.len());
        for row in rows {
            let placeholders: Vec<String> = columns
                .iter()
                .zip(row)
                .map(|(column, value)| {
                    params.push(value);
                    format!("CAST(${} AS {})", params.len(), cast_type_sql(column))
                })
                .collect();
            tuples.push(format!("({})", placeholders.join(", ")));
        }

        Statement::with_params(
            format!(
                "INSERT INTO {} ({}){overriding} VALUES {}",
                self.quote_identifier(&table.name),
                names.join(", "),
                tuples.join(", ")
            ),
            params,
        )
    }

    fn reset_sequences_sql(&self, table: &TableSchema, columns: &[&ColumnDefinition]) -> Vec<Statement> {
        let qualified = quote_literal(&self.quote_identifier(&table.name));
        columns
            .iter()
            .filter(|column| column.auto_increment)
            .map(|column| {
                let name = self.quote_identifier(&column.name);
                Statement::new(format!(
                    "SELECT setval(pg_get_serial_sequence({qualified}, {}), COALESCE(MAX({name}), 1), MAX({name}) IS NOT NULL) FROM {}",
                    quote_literal(&column.name),
                    self.quote_identifier(&table.name)
                ))
            })
            .collect()
    }

    fn max_bind_params(&self) -> usize {
        MAX_BIND_PARAMS
    }

    fn bind_value(&self, column: &ColumnDefinition, value: &Value) -> Option<String> {
        match value {
            Value::Null => None,
            // json text keeps strings quoted so `"42"` stays a string
            _ if matches!(column.column_type, ColumnType::Json | ColumnType::Jsonb) => {
                Some(value.to_string())
            }
            Value::Array(items) if column.column_type.as_str().ends_with("[]") => {
                Some(array_literal(items))
            }
            _ => schemalock_core::value::to_text(value),
        }
    }
}

fn type_sql(column: &ColumnDefinition) -> String {
    match &column.column_type {
        ColumnType::String => match column.length {
            Some(length) => format!("varchar({length})"),
            None => "varchar".to_string(),
        },
        ColumnType::Char => format!("char({})", column.length.unwrap_or(1)),
        ColumnType::Text => "text".to_string(),
        ColumnType::SmallInteger => "smallint".to_string(),
        ColumnType::Integer => "integer".to_string(),
        ColumnType::BigInteger => "bigint".to_string(),
        ColumnType::Float => "real".to_string(),
        ColumnType::Double => "double precision".to_string(),
        ColumnType::Decimal => match (column.precision, column.scale) {
            (Some(precision), Some(scale)) => format!("numeric({precision}, {scale})"),
            (Some(precision), None) => format!("numeric({precision})"),
            _ => "numeric".to_string(),
        },
        ColumnType::Boolean => "boolean".to_string(),
        ColumnType::Date => "date".to_string(),
        ColumnType::Time => with_precision("time", column.precision),
        ColumnType::DateTime => with_precision("timestamp", column.precision),
        ColumnType::Timestamp => with_precision("timestamptz", column.precision),
        ColumnType::Binary => "bytea".to_string(),
        ColumnType::Json => "json".to_string(),
        ColumnType::Jsonb => "jsonb".to_string(),
        ColumnType::Uuid => "uuid".to_string(),
        ColumnType::Native(name) => name.clone(),
    }
}

fn with_precision(base: &str, precision: Option<u32>) -> String {
    match precision {
        Some(precision) => format!("{base}({precision})"),
        None => base.to_string(),
    }
}

/// Cast target for bound values; length modifiers are left to the column so
/// oversized values fail instead of being truncated by the cast.
fn cast_type_sql(column: &ColumnDefinition) -> String {
    match &column.column_type {
        ColumnType::String => "varchar".to_string(),
        ColumnType::Char => "bpchar".to_string(),
        ColumnType::Decimal => "numeric".to_string(),
        ColumnType::Time => "time".to_string(),
        ColumnType::DateTime => "timestamp".to_string(),
        ColumnType::Timestamp => "timestamptz".to_string(),
        _ => type_sql(column),
    }
}

pub(crate) fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn literal_sql(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => quote_literal(text),
        Value::Array(_) | Value::Object(_) => quote_literal(&value.to_string()),
    }
}

/// PostgreSQL array input syntax for a JSON array, e.g. `{"a","b",NULL}`.
fn array_literal(items: &[Value]) -> String {
    let elements: Vec<String> = items
        .iter()
        .map(|item| match item {
            Value::Null => "NULL".to_string(),
            Value::Array(nested) => array_literal(nested),
            Value::String(text) => quote_element(text),
            Value::Bool(_) | Value::Number(_) => item.to_string(),
            Value::Object(_) => quote_element(&item.to_string()),
        })
        .collect();
    format!("{{{}}}", elements.join(","))
}

fn quote_element(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}
