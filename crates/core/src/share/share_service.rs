//! Share codes: a one-shot durable copy of the current snapshot.
//!
//! Sharing sits outside the synchronization core's consistency model: a
//! published code is a frozen copy under its own storage key, not a
//! replicated value, and loading one goes through the normal
//! whole-collection replacement path.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Utc;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::seating::{Guest, SeatingSnapshot, Table};
use crate::store::DurableStore;

pub const SHARE_CODE_LENGTH: usize = 8;
pub const SHARE_CODE_PREFIX: &str = "shared-";

/// Stored payload behind a share code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedSnapshot {
    pub guests: Vec<Guest>,
    pub tables: Vec<Table>,
    pub timestamp: i64,
}

pub struct ShareCodeService {
    store: Arc<dyn DurableStore>,
}

impl ShareCodeService {
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self { store }
    }

    /// Freeze `snapshot` under a short code and return the code.
    pub fn publish_snapshot(&self, snapshot: &SeatingSnapshot) -> Result<String> {
        if snapshot.guests.is_empty() && snapshot.tables.is_empty() {
            return Err(Error::validation("there is no data to share"));
        }
        let shared = SharedSnapshot {
            guests: snapshot.guests.clone(),
            tables: snapshot.tables.clone(),
            timestamp: Utc::now().timestamp_millis(),
        };
        let code = derive_code(&shared)?;
        let value = serde_json::to_value(&shared)?;
        self.store.set(&storage_key(&code), &value)?;
        Ok(code)
    }

    /// Look up a share code. Unknown or expired codes yield `None`, as
    /// does a stored payload that no longer decodes.
    pub fn load_snapshot(&self, code: &str) -> Result<Option<SharedSnapshot>> {
        let code = code.trim();
        if code.is_empty() {
            return Err(Error::validation("share code must not be empty"));
        }
        let key = storage_key(&code.to_ascii_uppercase());
        match self.store.get(&key)? {
            Some(value) => match serde_json::from_value(value) {
                Ok(shared) => Ok(Some(shared)),
                Err(err) => {
                    warn!("stored share payload under '{key}' does not decode: {err}");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }
}

fn storage_key(code: &str) -> String {
    format!("{SHARE_CODE_PREFIX}{code}")
}

fn derive_code(shared: &SharedSnapshot) -> Result<String> {
    let encoded = STANDARD.encode(serde_json::to_vec(shared)?);
    Ok(encoded
        .chars()
        .take(SHARE_CODE_LENGTH)
        .collect::<String>()
        .to_ascii_uppercase())
}
