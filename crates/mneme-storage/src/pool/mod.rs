//! Connection pool: a single writer plus, for file-backed databases, a pool of
//! read-only connections.

pub mod pragmas;
pub mod read_pool;
pub mod write_connection;

use std::path::{Path, PathBuf};

use mneme_core::errors::MnemeResult;

pub use read_pool::ReadPool;
pub use write_connection::WriteConnection;

/// Owns the write connection and the optional read pool.
pub struct ConnectionPool {
    pub writer: WriteConnection,
    /// `None` for in-memory databases, whose separate connections would each
    /// see a different empty database.
    pub readers: Option<ReadPool>,
    pub db_path: Option<PathBuf>,
}

impl ConnectionPool {
    /// Open a pool for the given database file. The writer is opened first so
    /// the file exists (and WAL is enabled) before readers attach.
    pub fn open(path: &Path, read_pool_size: usize, busy_timeout_ms: u32) -> MnemeResult<Self> {
        let writer = WriteConnection::open(path, busy_timeout_ms)?;
        let readers = ReadPool::open(path, read_pool_size, busy_timeout_ms)?;
        Ok(Self {
            writer,
            readers: Some(readers),
            db_path: Some(path.to_path_buf()),
        })
    }

    /// Open a writer-only in-memory pool.
    pub fn open_in_memory(busy_timeout_ms: u32) -> MnemeResult<Self> {
        Ok(Self {
            writer: WriteConnection::open_in_memory(busy_timeout_ms)?,
            readers: None,
            db_path: None,
        })
    }

    pub fn is_file_backed(&self) -> bool {
        self.db_path.is_some()
    }
}
