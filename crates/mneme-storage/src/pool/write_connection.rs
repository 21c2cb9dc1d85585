//! The single write connection. Every mutation goes through here, serialized by
//! a mutex so the engine stays usable from any thread or runtime.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use mneme_core::errors::{MnemeError, MnemeResult};

use super::pragmas::apply_pragmas;
use crate::to_storage_err;

pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    pub fn open(path: &Path, busy_timeout_ms: u32) -> MnemeResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| to_storage_err(format!("open writer {}: {e}", path.display())))?;
        apply_pragmas(&conn, busy_timeout_ms)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory(busy_timeout_ms: u32) -> MnemeResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        apply_pragmas(&conn, busy_timeout_ms)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run `f` with exclusive access to the write connection.
    pub fn with_conn_sync<F, T>(&self, f: F) -> MnemeResult<T>
    where
        F: FnOnce(&Connection) -> MnemeResult<T>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|e| MnemeError::ConcurrencyError(format!("writer lock poisoned: {e}")))?;
        f(&guard)
    }
}
