/// Storage-layer errors for SQLite operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("migration failed at version {version}: {reason}")]
    MigrationFailed { version: u32, reason: String },

    #[error("constraint violation: {message}")]
    ConstraintViolation { message: String },

    #[error("vector label allocation failed after {attempts} attempts")]
    LabelAllocationFailed { attempts: u32 },

    #[error("stored record is unreadable: {details}")]
    CorruptRecord { details: String },
}
