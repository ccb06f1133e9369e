//! PostgreSQL backend.

mod database;
mod dialect;

pub use database::PgDatabase;
pub use dialect::{MAX_BIND_PARAMS, PostgresDialect};
