//! Snapshot, restore, and seed operations over a [`Database`] connection.
//!
//! Each operation is a plain async function taking the connection and its
//! injected capabilities ([`Confirm`], [`Progress`]). Destructive work runs
//! through [`transaction::run_phase`], which owns begin/commit/rollback and
//! the foreign-key suspension around a list of statements.

pub mod database;
pub mod dialect;
pub mod generate;
pub mod loader;
pub mod observer;
pub mod options;
pub mod postgres;
pub mod seed;
pub mod transaction;
pub mod writer;

pub use database::{Database, RowQuery, Statement};
pub use dialect::Dialect;
pub use generate::{generate_seed, write_generated_seed};
pub use loader::{drop_tables, load, load_snapshot};
pub use observer::{Confirm, NoProgress, Outcome, Progress, Summary};
pub use options::{GenerateOptions, LoadOptions, SeedImportOptions};
pub use postgres::{PgDatabase, PostgresDialect};
pub use seed::{import_seed, import_seed_file};
pub use transaction::{Batch, run_phase};
pub use writer::{capture_snapshot, save};
