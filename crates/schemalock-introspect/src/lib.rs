//! Catalog introspection: turn a live database's tables into [`TableSchema`]s.

pub mod catalog;
pub mod options;
pub mod postgres;

pub use catalog::Catalog;
pub use options::IntrospectOptions;
pub use postgres::PostgresCatalog;

pub use schemalock_core::TableSchema;
