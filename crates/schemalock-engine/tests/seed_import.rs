mod common;

use common::{
    FakeDatabase, RecordingProgress, ToggleDialect, orders_table, row, users_table,
};
use pretty_assertions::assert_eq;
use schemalock_core::{Error, SeedSet};
use schemalock_engine::{NoProgress, Outcome, SeedImportOptions, import_seed, import_seed_file};
use serde_json::json;

fn seeded_users() -> SeedSet {
    let mut seed = SeedSet::new();
    seed.push(
        "users",
        vec![
            row(json!({"id": 1, "name": "Ada"})),
            row(json!({"id": 2, "email": "grace@example.com", "nickname": "amazing"})),
        ],
    );
    seed
}

#[tokio::test]
async fn missing_keys_bind_null_in_union_order() {
    let mut db = FakeDatabase::new().with_tables(vec![users_table()]);
    import_seed(&mut db, &seeded_users(), &SeedImportOptions::default(), &NoProgress)
        .await
        .unwrap();

    let insert = db
        .executed
        .iter()
        .find(|statement| statement.sql.starts_with("INSERT INTO"))
        .unwrap();
    assert!(insert.sql.starts_with("INSERT INTO \"users\" (\"id\", \"name\", \"email\") VALUES"));
    assert_eq!(
        insert.params,
        vec![
            Some("1".to_string()),
            Some("Ada".to_string()),
            None,
            Some("2".to_string()),
            None,
            Some("grace@example.com".to_string()),
        ]
    );
    assert!(!insert.sql.contains("nickname"));
}

#[tokio::test]
async fn inserts_follow_seed_order_inside_one_transaction() {
    let mut seed = SeedSet::new();
    seed.push("orders", vec![row(json!({"id": 10, "user_id": 1}))]);
    seed.push("users", vec![row(json!({"id": 1, "name": "Ada"}))]);

    let mut db = FakeDatabase::new().with_tables(vec![users_table(), orders_table()]);
    let progress = RecordingProgress::default();
    let outcome = import_seed(&mut db, &seed, &SeedImportOptions::default(), &progress)
        .await
        .unwrap();

    let orders = db.position("INSERT INTO \"orders\"").unwrap();
    let users = db.position("INSERT INTO \"users\"").unwrap();
    assert!(orders < users);
    assert_eq!(db.positions("BEGIN").len(), 1);
    assert_eq!(db.sql()[1], "SET CONSTRAINTS ALL DEFERRED");
    assert_eq!(db.sql().last(), Some(&"COMMIT"));
    assert_eq!(progress.seen(), vec!["orders", "users"]);

    match outcome {
        Outcome::Completed(summary) => {
            assert_eq!(summary.tables, 2);
            assert_eq!(summary.rows, 2);
        }
        Outcome::Cancelled => panic!("seed import has no prompt"),
    }
}

#[tokio::test]
async fn truncate_runs_in_its_own_transaction_first() {
    let mut db = FakeDatabase::new().with_tables(vec![users_table()]);
    import_seed(
        &mut db,
        &seeded_users(),
        &SeedImportOptions { truncate: true },
        &NoProgress,
    )
    .await
    .unwrap();

    let begins = db.positions("BEGIN");
    let commits = db.positions("COMMIT");
    let truncate = db.position("TRUNCATE TABLE \"users\"").unwrap();
    let insert = db.position("INSERT INTO").unwrap();
    assert_eq!(begins.len(), 2);
    assert_eq!(commits.len(), 2);
    assert!(begins[0] < truncate && truncate < commits[0]);
    assert!(begins[1] < insert && insert < commits[1]);
}

#[tokio::test]
async fn failed_insert_rolls_back_and_restores_checks() {
    let mut seed = seeded_users();
    seed.push("orders", vec![row(json!({"id": 10, "user_id": 99}))]);

    let mut db = FakeDatabase::new()
        .with_tables(vec![users_table(), orders_table()])
        .failing_on("INSERT INTO \"orders\"");
    let err = import_seed(&mut db, &seed, &SeedImportOptions::default(), &NoProgress)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::StatementExecution { .. }));
    let sql = db.sql();
    assert_eq!(sql[sql.len() - 2], "SET CONSTRAINTS ALL IMMEDIATE");
    assert_eq!(sql.last(), Some(&"ROLLBACK"));
    assert!(db.position("COMMIT").is_none());
}

#[tokio::test]
async fn identity_toggle_brackets_each_table() {
    let dialect = ToggleDialect { max_params: 1_000 };
    let mut db = FakeDatabase::with_dialect(Box::new(dialect)).with_tables(vec![users_table()]);
    import_seed(&mut db, &seeded_users(), &SeedImportOptions::default(), &NoProgress)
        .await
        .unwrap();

    let on = db.position("SET IDENTITY_INSERT [users] ON").unwrap();
    let insert = db.position("INSERT INTO [users]").unwrap();
    let off = db.position("SET IDENTITY_INSERT [users] OFF").unwrap();
    assert!(on < insert && insert < off);
}

#[tokio::test]
async fn batches_split_only_at_the_parameter_limit() {
    let rows = (1..=5)
        .map(|id| row(json!({"id": id, "name": format!("user {id}")})))
        .collect();
    let mut seed = SeedSet::new();
    seed.push("users", rows);

    let mut db = FakeDatabase::with_dialect(Box::new(ToggleDialect { max_params: 4 }))
        .with_tables(vec![users_table()]);
    import_seed(&mut db, &seed, &SeedImportOptions::default(), &NoProgress)
        .await
        .unwrap();

    let inserts: Vec<usize> = db
        .executed
        .iter()
        .filter(|statement| statement.sql.starts_with("INSERT INTO"))
        .map(|statement| statement.params.len())
        .collect();
    assert_eq!(inserts, vec![4, 4, 2]);

    let mut db = FakeDatabase::with_dialect(Box::new(ToggleDialect { max_params: 10 }))
        .with_tables(vec![users_table()]);
    import_seed(&mut db, &seed, &SeedImportOptions::default(), &NoProgress)
        .await
        .unwrap();
    assert_eq!(db.positions("INSERT INTO").len(), 1);
}

#[tokio::test]
async fn identity_sequences_are_resynchronised() {
    let mut db = FakeDatabase::new().with_tables(vec![users_table()]);
    import_seed(&mut db, &seeded_users(), &SeedImportOptions::default(), &NoProgress)
        .await
        .unwrap();

    let insert = db.position("INSERT INTO").unwrap();
    let reset = db.position("SELECT setval(").unwrap();
    assert!(insert < reset);
}

#[tokio::test]
async fn empty_seed_succeeds_without_statements() {
    let mut db = FakeDatabase::new();
    let outcome = import_seed(&mut db, &SeedSet::new(), &SeedImportOptions { truncate: true }, &NoProgress)
        .await
        .unwrap();
    assert!(!outcome.is_cancelled());
    assert!(db.executed.is_empty());
}

#[tokio::test]
async fn unknown_seed_table_fails_before_truncating() {
    let mut seed = SeedSet::new();
    seed.push("ghosts", vec![row(json!({"id": 1}))]);

    let mut db = FakeDatabase::new().with_tables(vec![users_table()]);
    let result = import_seed(&mut db, &seed, &SeedImportOptions { truncate: true }, &NoProgress).await;
    assert!(result.is_err());
    assert!(db.executed.is_empty());
}

#[tokio::test]
async fn missing_seed_file_is_reported() {
    let mut db = FakeDatabase::new();
    let path = common::scratch_dir("seed-missing").join("seed.json");
    let err = import_seed_file(&mut db, &path, &SeedImportOptions::default(), &NoProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
}
