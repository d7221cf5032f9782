//! Pick the storage backend.
//!
//! Priority: localStorage → Memory (fallback)

use std::rc::Rc;
use companion_core::ports::StoragePort;
use companion_types::config::StorageBackendType;
use super::{LocalStorage, MemoryStorage};

/// Open the best available backend.
/// Returns a trait object so callers are backend-agnostic.
pub fn auto_detect_storage() -> Rc<dyn StoragePort> {
    match LocalStorage::open() {
        Ok(local) => {
            log::info!("Storage backend: localStorage");
            Rc::new(local)
        }
        Err(e) => {
            log::warn!("localStorage unavailable ({}), falling back to memory", e);
            Rc::new(MemoryStorage::new())
        }
    }
}

/// Open the backend named in config. An explicit `LocalStorage` choice
/// still degrades to memory rather than leaving the app without a store.
pub fn open_storage(backend: &StorageBackendType) -> Rc<dyn StoragePort> {
    match backend {
        StorageBackendType::Memory => {
            log::info!("Storage backend: memory (configured)");
            Rc::new(MemoryStorage::new())
        }
        StorageBackendType::Auto | StorageBackendType::LocalStorage => auto_detect_storage(),
    }
}
