//! Seed file encoding: a JSON mapping of table name to a list of row mappings.

use std::path::Path;

use serde_json::{Map, Value};

use schemalock_core::{Result, Row, SeedSet};

use crate::atomic::write_bytes_atomic;
use crate::format::{Reader, parse_json, read_json, to_text};

/// Encode a seed set into its canonical text form.
pub fn encode_seed(seed: &SeedSet) -> String {
    let tables: Map<String, Value> = seed
        .tables()
        .map(|(table, rows)| {
            let rows = rows.iter().cloned().map(Value::Object).collect();
            (table.to_string(), Value::Array(rows))
        })
        .collect();
    to_text(&Value::Object(tables))
}

/// Decode seed text; `path` is only used for error reporting.
pub fn decode_seed(text: &str, path: &Path) -> Result<SeedSet> {
    let root = parse_json(text, path)?;
    decode_root(&root, path)
}

/// Read and decode a seed file.
pub fn read_seed(path: &Path) -> Result<SeedSet> {
    let root = read_json(path)?;
    decode_root(&root, path)
}

/// Encode a seed set and atomically replace `path` with it.
pub fn write_seed(path: &Path, seed: &SeedSet) -> Result<()> {
    write_bytes_atomic(path, encode_seed(seed).as_bytes())
}

fn decode_root(root: &Value, path: &Path) -> Result<SeedSet> {
    let reader = Reader::new(path, "seed");
    let tables = root
        .as_object()
        .ok_or_else(|| reader.error("top level must be a mapping of tables"))?;

    let mut seed = SeedSet::new();
    for (table, rows) in tables {
        let reader = Reader::new(path, format!("table `{table}`"));
        let rows = rows
            .as_array()
            .ok_or_else(|| reader.error("rows must be a list"))?
            .iter()
            .enumerate()
            .map(|(idx, row)| -> Result<Row> {
                Ok(reader.nested(format!("row {idx}")).object(row)?.clone())
            })
            .collect::<Result<Vec<_>>>()?;
        seed.push(table.clone(), rows);
    }
    Ok(seed)
}
