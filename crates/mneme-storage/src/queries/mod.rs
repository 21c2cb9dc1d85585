//! SQL query modules, one per table group. Every function takes a borrowed
//! connection so callers decide between the writer and a reader.

pub mod causal_ops;
pub mod entry_ops;
pub mod maintenance;
pub mod memrl_ops;
pub mod metadata_ops;
pub mod pattern_ops;
pub mod provenance_ops;
pub mod vector_ops;

use rusqlite::{Connection, ErrorCode};

use mneme_core::errors::{MnemeError, MnemeResult, StorageError};

use crate::to_storage_err;

/// `?, ?, ?` for an `IN (...)` list of `n` parameters.
pub(crate) fn placeholders(n: usize) -> String {
    let mut out = String::with_capacity(n * 3);
    for i in 0..n {
        if i > 0 {
            out.push_str(", ");
        }
        out.push('?');
    }
    out
}

/// Run `f` inside a transaction: commit on success, roll back on error.
pub(crate) fn with_tx<T, F>(conn: &Connection, op: &str, f: F) -> MnemeResult<T>
where
    F: FnOnce(&Connection) -> MnemeResult<T>,
{
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(format!("{op} begin: {e}")))?;
    match f(&tx) {
        Ok(value) => {
            tx.commit()
                .map_err(|e| to_storage_err(format!("{op} commit: {e}")))?;
            Ok(value)
        }
        Err(e) => {
            let _ = tx.rollback();
            Err(e)
        }
    }
}

pub(crate) fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation)
}

/// Map a write error, keeping constraint violations distinguishable.
pub(crate) fn write_err(e: rusqlite::Error) -> MnemeError {
    if is_constraint_violation(&e) {
        StorageError::ConstraintViolation {
            message: e.to_string(),
        }
        .into()
    } else {
        to_storage_err(e.to_string())
    }
}
