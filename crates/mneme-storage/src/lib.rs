//! # mneme-storage
//!
//! SQLite persistence for the Mneme memory engine. One write connection behind
//! a mutex, a read pool for file-backed databases, numbered migrations, and
//! batch-first query modules. [`StorageEngine`] implements every storage trait
//! from `mneme-core`.

pub mod engine;
pub mod labels;
pub mod migrations;
pub mod pool;
pub mod queries;

pub use engine::StorageEngine;

use mneme_core::errors::{MnemeError, StorageError};

/// Wrap a low-level message as a storage error.
pub(crate) fn to_storage_err(message: String) -> MnemeError {
    StorageError::SqliteError { message }.into()
}
