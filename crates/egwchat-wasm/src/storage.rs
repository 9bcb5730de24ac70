use egwchat_core::{ClientError, Result, SessionStore};
use egwchat_types::TOKEN_STORAGE_KEY;
use wasm_bindgen::JsValue;
use web_sys::Storage;

/// Session token kept in `localStorage`
pub struct LocalStorageStore {
    storage: Storage,
}

impl LocalStorageStore {
    pub fn new() -> std::result::Result<Self, JsValue> {
        let storage = crate::window()?
            .local_storage()?
            .ok_or_else(|| JsValue::from_str("localStorage is unavailable"))?;
        Ok(Self { storage })
    }
}

fn storage_error(err: JsValue) -> ClientError {
    ClientError::Storage(format!("{:?}", err))
}

impl SessionStore for LocalStorageStore {
    fn load(&self) -> Option<String> {
        self.storage
            .get_item(TOKEN_STORAGE_KEY)
            .ok()
            .flatten()
            .filter(|token| !token.is_empty())
    }

    fn save(&mut self, token: &str) -> Result<()> {
        self.storage
            .set_item(TOKEN_STORAGE_KEY, token)
            .map_err(storage_error)
    }

    fn clear(&mut self) -> Result<()> {
        self.storage
            .remove_item(TOKEN_STORAGE_KEY)
            .map_err(storage_error)
    }
}

/// Token currently in `localStorage`, read fresh for every authenticated call
pub fn stored_token() -> Option<String> {
    LocalStorageStore::new().ok()?.load()
}
