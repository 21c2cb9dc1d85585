//! Vector label allocation.
//!
//! Labels come from an in-process counter seeded from the persisted maximum.
//! A uniqueness collision (another writer got there first, or the counter is
//! stale) resyncs the counter from storage and retries a bounded number of
//! times, then falls back to computing the label inside the INSERT itself.

use std::sync::atomic::{AtomicU64, Ordering};

use rusqlite::Connection;
use tracing::{debug, warn};

use mneme_core::errors::{MnemeError, MnemeResult, StorageError};

use crate::queries::{entry_ops, vector_ops};

pub struct LabelAllocator {
    next: AtomicU64,
    retry_limit: u32,
}

impl LabelAllocator {
    /// Seed from `MAX(label) + 1` (0 for an empty table).
    pub fn seeded(conn: &Connection, retry_limit: u32) -> MnemeResult<Self> {
        let allocator = Self {
            next: AtomicU64::new(0),
            retry_limit,
        };
        allocator.resync(conn)?;
        Ok(allocator)
    }

    /// Reset the counter from storage.
    pub fn resync(&self, conn: &Connection) -> MnemeResult<u64> {
        let next = vector_ops::max_label(conn)?.map_or(0, |max| max + 1);
        self.next.store(next, Ordering::SeqCst);
        Ok(next)
    }

    /// Next label the counter would hand out.
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }

    /// Return the entry's existing label or assign a fresh one.
    pub fn assign(&self, conn: &Connection, entry_id: &str) -> MnemeResult<u64> {
        if !entry_ops::entry_exists(conn, entry_id)? {
            return Err(MnemeError::EntryNotFound {
                id: entry_id.to_string(),
            });
        }
        let now = mneme_core::time::now();

        for attempt in 0..=self.retry_limit {
            if let Some(existing) = vector_ops::get_mapping(conn, entry_id)? {
                return Ok(existing.label);
            }
            let label = self.next.fetch_add(1, Ordering::SeqCst);
            if vector_ops::try_insert_mapping(conn, entry_id, label, now)? {
                debug!(entry_id, label, "assigned vector label");
                return Ok(label);
            }
            let resynced = self.resync(conn)?;
            debug!(entry_id, label, attempt, resynced, "label collision, resynced");
        }

        warn!(entry_id, attempts = self.retry_limit + 1, "label retries exhausted, rescanning");
        if let Some(existing) = vector_ops::get_mapping(conn, entry_id)? {
            return Ok(existing.label);
        }
        let label = match vector_ops::insert_mapping_rescan(conn, entry_id, now) {
            Ok(label) => label,
            Err(MnemeError::StorageError(StorageError::ConstraintViolation { message })) => {
                warn!(entry_id, %message, "rescan insert collided");
                return Err(StorageError::LabelAllocationFailed {
                    attempts: self.retry_limit + 1,
                }
                .into());
            }
            Err(e) => return Err(e),
        };
        self.next.fetch_max(label + 1, Ordering::SeqCst);
        Ok(label)
    }
}
