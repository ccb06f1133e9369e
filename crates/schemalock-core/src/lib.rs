//! Core contracts for schemalock.
//!
//! This crate defines the dialect-independent schema model, the snapshot and
//! seed containers, the error taxonomy, and the checks shared by the codec,
//! the introspector, and the engine.

pub mod constraints;
pub mod error;
pub mod graph;
pub mod schema;
pub mod snapshot;
pub mod types;
pub mod validation;
pub mod value;

pub use constraints::{ConstraintDefinition, ConstraintKind, ForeignKey, IndexDefinition};
pub use error::{Error, Result};
pub use graph::{OrderViolation, forward_references};
pub use schema::{ColumnDefinition, TableSchema};
pub use snapshot::{Row, SeedSet, Snapshot, union_columns};
pub use types::{ColumnType, FkAction};
pub use validation::validate_snapshot;

pub use serde_json::Value;
