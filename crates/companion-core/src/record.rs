//! JSON records on top of [`StoragePort`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use companion_types::Result;
use crate::ports::StoragePort;

/// Read and parse the record at `key`. A missing key is `Ok(None)`;
/// unparseable data is an error so callers can decide to discard it.
pub fn read_json<T: DeserializeOwned>(storage: &dyn StoragePort, key: &str) -> Result<Option<T>> {
    match storage.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Serialize `value` and write it under `key` in a single `set`.
pub fn write_json<T: Serialize + ?Sized>(storage: &dyn StoragePort, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    storage.set(key, &json)
}
