//! Snapshot file encoding.
//!
//! A snapshot is a JSON mapping with a single `tables` key. Each table maps
//! column names to column entries, followed by the optional `_indexes`,
//! `_constraints`, and `_options` blocks in that order. The decoder accepts
//! the special blocks anywhere in the table mapping.

use std::path::Path;

use serde_json::{Map, Value};

use schemalock_core::{
    ColumnDefinition, ColumnType, ConstraintDefinition, ConstraintKind, Error, FkAction,
    ForeignKey, IndexDefinition, Result, Snapshot, TableSchema,
};

use crate::atomic::write_bytes_atomic;
use crate::format::{Reader, parse_json, read_json, string_list, to_text};

pub const INDEXES_KEY: &str = "_indexes";
pub const CONSTRAINTS_KEY: &str = "_constraints";
pub const OPTIONS_KEY: &str = "_options";

/// Keys of a column entry that map to typed fields; everything else is an extra.
pub const RESERVED_COLUMN_KEYS: &[&str] = &[
    "type",
    "length",
    "precision",
    "scale",
    "null",
    "default",
    "autoIncrement",
];

/// Encode a snapshot into its canonical text form.
pub fn encode_snapshot(snapshot: &Snapshot) -> Result<String> {
    let mut tables = Map::new();
    for table in snapshot.tables() {
        tables.insert(table.name.clone(), encode_table(table)?);
    }

    let mut root = Map::new();
    root.insert("tables".to_string(), Value::Object(tables));
    Ok(to_text(&Value::Object(root)))
}

/// Decode snapshot text; `path` is only used for error reporting.
pub fn decode_snapshot(text: &str, path: &Path) -> Result<Snapshot> {
    let root = parse_json(text, path)?;
    decode_root(&root, path)
}

/// Read and decode a snapshot file.
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let root = read_json(path)?;
    decode_root(&root, path)
}

/// Encode a snapshot and atomically replace `path` with it.
pub fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let text = encode_snapshot(snapshot)?;
    write_bytes_atomic(path, text.as_bytes())
}

fn encode_table(table: &TableSchema) -> Result<Value> {
    let mut entry = Map::new();

    for column in table.columns() {
        if is_special_key(&column.name) {
            return Err(Error::InvalidSchema(format!(
                "column name `{}.{}` collides with a reserved snapshot key",
                table.name, column.name
            )));
        }
        entry.insert(column.name.clone(), encode_column(&table.name, column)?);
    }

    if !table.indexes().is_empty() {
        let indexes = table
            .indexes()
            .iter()
            .map(|index| (index.name.clone(), encode_index(index)))
            .collect();
        entry.insert(INDEXES_KEY.to_string(), Value::Object(indexes));
    }

    if !table.constraints().is_empty() {
        let constraints = table
            .constraints()
            .iter()
            .map(|constraint| (constraint.name.clone(), encode_constraint(&constraint.kind)))
            .collect();
        entry.insert(CONSTRAINTS_KEY.to_string(), Value::Object(constraints));
    }

    if !table.options().is_empty() {
        entry.insert(
            OPTIONS_KEY.to_string(),
            Value::Object(table.options().clone()),
        );
    }

    Ok(Value::Object(entry))
}

fn encode_column(table: &str, column: &ColumnDefinition) -> Result<Value> {
    if let Some(key) = column
        .extra
        .keys()
        .find(|key| RESERVED_COLUMN_KEYS.contains(&key.as_str()))
    {
        return Err(Error::InvalidSchema(format!(
            "extra attribute `{key}` of `{table}.{}` shadows a column field",
            column.name
        )));
    }

    let mut entry = Map::new();
    entry.insert(
        "type".to_string(),
        Value::String(column.column_type.as_str().to_string()),
    );
    if let Some(length) = column.length {
        entry.insert("length".to_string(), Value::from(length));
    }
    if let Some(precision) = column.precision {
        entry.insert("precision".to_string(), Value::from(precision));
    }
    if let Some(scale) = column.scale {
        entry.insert("scale".to_string(), Value::from(scale));
    }
    entry.insert("null".to_string(), Value::Bool(column.nullable));
    if let Some(default) = column.default.as_ref().filter(|value| !value.is_null()) {
        entry.insert("default".to_string(), default.clone());
    }
    if column.auto_increment {
        entry.insert("autoIncrement".to_string(), Value::Bool(true));
    }
    for (key, value) in &column.extra {
        entry.insert(key.clone(), value.clone());
    }
    Ok(Value::Object(entry))
}

fn encode_index(index: &IndexDefinition) -> Value {
    let mut entry = Map::new();
    entry.insert("columns".to_string(), string_list(&index.columns));
    entry.insert("unique".to_string(), Value::Bool(index.unique));
    if let Some(kind) = &index.kind {
        entry.insert("type".to_string(), Value::String(kind.clone()));
    }
    if let Some(definition) = &index.definition {
        entry.insert("definition".to_string(), Value::String(definition.clone()));
    }
    Value::Object(entry)
}

fn encode_constraint(kind: &ConstraintKind) -> Value {
    let mut entry = Map::new();
    entry.insert(
        "type".to_string(),
        Value::String(kind.type_name().to_string()),
    );

    match kind {
        ConstraintKind::PrimaryKey { columns } | ConstraintKind::Unique { columns } => {
            entry.insert("columns".to_string(), string_list(columns));
        }
        ConstraintKind::Check { expression } => {
            entry.insert("expression".to_string(), Value::String(expression.clone()));
        }
        ConstraintKind::Exclusion {
            columns,
            definition,
        } => {
            entry.insert("columns".to_string(), string_list(columns));
            entry.insert("definition".to_string(), Value::String(definition.clone()));
        }
        ConstraintKind::ForeignKey(fk) => {
            entry.insert("columns".to_string(), string_list(&fk.columns));

            let mut references = Map::new();
            references.insert(
                "table".to_string(),
                Value::String(fk.referenced_table.clone()),
            );
            references.insert("columns".to_string(), string_list(&fk.referenced_columns));
            entry.insert("references".to_string(), Value::Object(references));

            entry.insert(
                "update".to_string(),
                Value::String(fk.on_update.as_str().to_string()),
            );
            entry.insert(
                "delete".to_string(),
                Value::String(fk.on_delete.as_str().to_string()),
            );
        }
    }

    Value::Object(entry)
}

fn is_special_key(key: &str) -> bool {
    matches!(key, INDEXES_KEY | CONSTRAINTS_KEY | OPTIONS_KEY)
}

fn decode_root(root: &Value, path: &Path) -> Result<Snapshot> {
    let reader = Reader::new(path, "snapshot");
    let tables = root
        .as_object()
        .ok_or_else(|| reader.error("top level must be a mapping"))?
        .get("tables")
        .ok_or_else(|| reader.error("missing `tables` key"))?
        .as_object()
        .ok_or_else(|| reader.error("`tables` must be a mapping"))?;

    let mut snapshot = Snapshot::new();
    for (name, fields) in tables {
        let reader = Reader::new(path, format!("table `{name}`"));
        let table = decode_table(&reader, name, reader.object(fields)?)?;
        snapshot.push(table).map_err(|err| reader.error(err.to_string()))?;
    }
    Ok(snapshot)
}

fn decode_table(reader: &Reader<'_>, name: &str, fields: &Map<String, Value>) -> Result<TableSchema> {
    let mut table = TableSchema::new(name);

    for (column, entry) in fields.iter().filter(|(key, _)| !is_special_key(key)) {
        let reader = reader.nested(format!("column `{column}`"));
        let definition = decode_column(&reader, column, reader.object(entry)?)?;
        table
            .add_column(definition)
            .map_err(|err| reader.error(err.to_string()))?;
    }

    if let Some(indexes) = fields.get(INDEXES_KEY) {
        for (index, entry) in reader.nested(INDEXES_KEY).object(indexes)? {
            let reader = reader.nested(format!("index `{index}`"));
            let entry = reader.object(entry)?;
            let definition = IndexDefinition {
                name: index.clone(),
                columns: reader.strings(entry, "columns")?,
                unique: reader.bool_or(entry, "unique", false)?,
                kind: reader.optional_string(entry, "type")?,
                definition: reader.optional_string(entry, "definition")?,
            };
            table
                .add_index(definition)
                .map_err(|err| reader.error(err.to_string()))?;
        }
    }

    if let Some(constraints) = fields.get(CONSTRAINTS_KEY) {
        for (constraint, entry) in reader.nested(CONSTRAINTS_KEY).object(constraints)? {
            let reader = reader.nested(format!("constraint `{constraint}`"));
            let kind = decode_constraint(&reader, reader.object(entry)?)?;
            table
                .add_constraint(ConstraintDefinition::new(constraint.clone(), kind))
                .map_err(|err| reader.error(err.to_string()))?;
        }
    }

    if let Some(options) = fields.get(OPTIONS_KEY) {
        for (key, value) in reader.nested(OPTIONS_KEY).object(options)? {
            table.set_option(key.clone(), value.clone());
        }
    }

    Ok(table)
}

fn decode_column(
    reader: &Reader<'_>,
    name: &str,
    entry: &Map<String, Value>,
) -> Result<ColumnDefinition> {
    let mut column = ColumnDefinition::new(name, ColumnType::from_name(&reader.string(entry, "type")?));
    column.length = reader.optional_u32(entry, "length")?;
    column.precision = reader.optional_u32(entry, "precision")?;
    column.scale = reader.optional_u32(entry, "scale")?;
    column.nullable = reader.bool_or(entry, "null", true)?;
    column.default = entry.get("default").filter(|value| !value.is_null()).cloned();
    column.auto_increment = reader.bool_or(entry, "autoIncrement", false)?;

    for (key, value) in entry {
        if !RESERVED_COLUMN_KEYS.contains(&key.as_str()) {
            column.extra.insert(key.clone(), value.clone());
        }
    }

    Ok(column)
}

fn decode_constraint(reader: &Reader<'_>, entry: &Map<String, Value>) -> Result<ConstraintKind> {
    let kind = match reader.string(entry, "type")?.as_str() {
        "primary" => ConstraintKind::PrimaryKey {
            columns: reader.strings(entry, "columns")?,
        },
        "unique" => ConstraintKind::Unique {
            columns: reader.strings(entry, "columns")?,
        },
        "check" => ConstraintKind::Check {
            expression: reader.string(entry, "expression")?,
        },
        "exclude" => ConstraintKind::Exclusion {
            columns: reader.strings(entry, "columns")?,
            definition: reader.string(entry, "definition")?,
        },
        "foreign" => {
            let references = entry
                .get("references")
                .ok_or_else(|| reader.error("`references` is required"))?;
            let refs = reader.nested("references");
            let references = refs.object(references)?;

            ConstraintKind::ForeignKey(ForeignKey {
                columns: reader.strings(entry, "columns")?,
                referenced_table: refs.string(references, "table")?,
                referenced_columns: refs.strings(references, "columns")?,
                on_update: decode_action(reader, entry, "update")?,
                on_delete: decode_action(reader, entry, "delete")?,
            })
        }
        other => return Err(reader.error(format!("unknown constraint type `{other}`"))),
    };
    Ok(kind)
}

fn decode_action(reader: &Reader<'_>, entry: &Map<String, Value>, key: &str) -> Result<FkAction> {
    match reader.optional_string(entry, key)? {
        None => Ok(FkAction::NoAction),
        Some(name) => FkAction::from_name(&name)
            .ok_or_else(|| reader.error(format!("unknown `{key}` action `{name}`"))),
    }
}
