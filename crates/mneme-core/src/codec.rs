//! Versioned JSON envelope for structured values persisted as text.
//!
//! Written form: `{"v": 1, "data": <value>}`. Readers accept any version up to
//! [`ENVELOPE_VERSION`] plus the legacy bare form (the value without an
//! envelope), so adding fields later never breaks existing rows.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::constants::ENVELOPE_VERSION;
use crate::errors::{MnemeResult, StorageError};

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    v: u32,
    data: &'a T,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Stored<T> {
    Versioned { v: u32, data: T },
    Legacy(T),
}

/// Serialize a value inside the current envelope version.
pub fn encode<T: Serialize>(value: &T) -> MnemeResult<String> {
    Ok(serde_json::to_string(&EnvelopeRef {
        v: ENVELOPE_VERSION,
        data: value,
    })?)
}

/// Deserialize a value written by [`encode`] or stored in the legacy bare form.
pub fn decode<T: DeserializeOwned>(raw: &str) -> MnemeResult<T> {
    let stored: Stored<T> = serde_json::from_str(raw).map_err(|e| StorageError::CorruptRecord {
        details: format!("undecodable payload: {e}"),
    })?;
    match stored {
        Stored::Versioned { v, data } if v <= ENVELOPE_VERSION => Ok(data),
        Stored::Versioned { v, .. } => Err(StorageError::CorruptRecord {
            details: format!("payload version {v} is newer than supported {ENVELOPE_VERSION}"),
        }
        .into()),
        Stored::Legacy(data) => Ok(data),
    }
}
