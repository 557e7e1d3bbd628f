//! Browser localStorage backend for the visualizer store

use crate::core::{Persistence, PersistenceError};
use leptos::web_sys;

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStoragePersistence;

fn storage() -> Result<web_sys::Storage, PersistenceError> {
    web_sys::window()
        .and_then(|window| window.local_storage().ok().flatten())
        .ok_or(PersistenceError::Unavailable)
}

impl Persistence for LocalStoragePersistence {
    fn load(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        storage()?
            .get_item(key)
            .map_err(|e| PersistenceError::Read {
                key: key.to_string(),
                message: format!("{:?}", e),
            })
    }

    fn save(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        storage()?
            .set_item(key, value)
            .map_err(|e| PersistenceError::Write {
                key: key.to_string(),
                message: format!("{:?}", e),
            })
    }
}
