use std::path::Path;

use schemalock_codec::{decode_seed, encode_seed, read_seed};
use schemalock_core::{Error, Row, SeedSet};
use serde_json::{Value, json};

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("rows are objects, got {other}"),
    }
}

#[test]
fn round_trips_mixed_values() {
    let mut seed = SeedSet::new();
    seed.push(
        "users",
        vec![
            row(json!({"id": 1, "name": "Ada", "score": 1.0000000000000002, "born": "1815-12-10 00:00:00"})),
            row(json!({"id": 2, "name": null, "prefs": {"langs": ["en", "fr"], "beta": true}})),
        ],
    );
    seed.push("orders", vec![row(json!({"id": 10, "user_id": 1, "amounts": [1.5, -0.0, 1e300]}))]);

    let text = encode_seed(&seed);
    let decoded = decode_seed(&text, Path::new("seed.json")).unwrap();
    assert_eq!(decoded, seed);

    let names: Vec<&str> = decoded.table_names().collect();
    assert_eq!(names, vec!["users", "orders"]);
}

#[test]
fn empty_seed_encodes_as_empty_mapping() {
    assert_eq!(encode_seed(&SeedSet::new()), "{}\n");
    assert!(decode_seed("{}", Path::new("seed.json")).unwrap().is_empty());
}

#[test]
fn rejects_rows_that_are_not_mappings() {
    let err = decode_seed(r#"{"users": [{"id": 1}, 7]}"#, Path::new("seed.json")).unwrap_err();
    assert!(matches!(err, Error::InvalidFormat { .. }));
    assert!(err.to_string().contains("row 1"));

    let err = decode_seed(r#"{"users": {"id": 1}}"#, Path::new("seed.json")).unwrap_err();
    assert!(matches!(err, Error::InvalidFormat { .. }));
}

#[test]
fn missing_seed_file_is_not_found() {
    assert!(matches!(
        read_seed(Path::new("/nonexistent/schemalock/seed.json")),
        Err(Error::FileNotFound { .. })
    ));
}
