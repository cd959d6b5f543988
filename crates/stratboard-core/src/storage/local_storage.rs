//! Browser `localStorage` backend for guest mode on WASM.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use wasm_bindgen::JsValue;

/// Keys are stored verbatim in `window.localStorage`.
pub struct LocalStorage {
    inner: web_sys::Storage,
}

fn js_error(e: JsValue) -> StorageError {
    StorageError::Io(format!("{:?}", e))
}

impl LocalStorage {
    pub fn new() -> StorageResult<Self> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Other("No window object".to_string()))?;
        let inner = window
            .local_storage()
            .map_err(js_error)?
            .ok_or_else(|| StorageError::Other("localStorage is unavailable".to_string()))?;
        Ok(Self { inner })
    }
}

impl Storage for LocalStorage {
    fn save(&self, key: &str, data: &str) -> BoxFuture<'_, StorageResult<()>> {
        let result = self.inner.set_item(key, data).map_err(js_error);
        Box::pin(async move { result })
    }

    fn load(&self, key: &str) -> BoxFuture<'_, StorageResult<String>> {
        let result = self
            .inner
            .get_item(key)
            .map_err(js_error)
            .and_then(|value| value.ok_or_else(|| StorageError::NotFound(key.to_string())));
        Box::pin(async move { result })
    }

    fn delete(&self, key: &str) -> BoxFuture<'_, StorageResult<()>> {
        let result = self.inner.remove_item(key).map_err(js_error);
        Box::pin(async move { result })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let len = self.inner.length().map_err(js_error)?;
            let mut keys = Vec::with_capacity(len as usize);
            for i in 0..len {
                if let Some(key) = self.inner.key(i).map_err(js_error)? {
                    keys.push(key);
                }
            }
            keys.sort();
            Ok(keys)
        })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let result = self
            .inner
            .get_item(key)
            .map(|value| value.is_some())
            .map_err(js_error);
        Box::pin(async move { result })
    }
}
