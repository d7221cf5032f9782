//! `window.localStorage` backend.
//! Persistent per origin, shared by every tab of the app.

use companion_core::ports::StoragePort;
use companion_types::{CompanionError, Result};
use wasm_bindgen::JsValue;

pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    /// Grab the origin's `localStorage`. Fails outside a window context or
    /// when the browser denies access.
    pub fn open() -> Result<Self> {
        let window = web_sys::window()
            .ok_or_else(|| CompanionError::Storage("No window object".to_string()))?;

        let storage = window
            .local_storage()
            .map_err(storage_err)?
            .ok_or_else(|| CompanionError::Storage("localStorage not available".to_string()))?;

        Ok(Self { storage })
    }
}

impl StoragePort for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.storage.get_item(key).map_err(storage_err)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        // Quota errors surface here
        self.storage.set_item(key, value).map_err(storage_err)
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.storage.remove_item(key).map_err(storage_err)
    }

    fn backend_name(&self) -> &str {
        "localStorage"
    }
}

fn storage_err(e: JsValue) -> CompanionError {
    CompanionError::Storage(format!("{:?}", e))
}
