//! On-disk formats for schema snapshots and seed data.
//!
//! Both files are pretty-printed JSON with keys in model order, so identical
//! input always produces identical bytes. Writes are atomic.

mod atomic;
mod format;
pub mod seed;
pub mod snapshot;

pub use atomic::write_bytes_atomic;
pub use seed::{decode_seed, encode_seed, read_seed, write_seed};
pub use snapshot::{
    CONSTRAINTS_KEY, INDEXES_KEY, OPTIONS_KEY, RESERVED_COLUMN_KEYS, decode_snapshot,
    encode_snapshot, read_snapshot, write_snapshot,
};
