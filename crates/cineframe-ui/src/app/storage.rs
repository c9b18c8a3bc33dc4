//! LocalStorage-backed token persistence with cross-tab change events.

use gloo::console;
use gloo::events::EventListener;
use gloo::storage::{LocalStorage, Storage};
use gloo::utils::window;
use wasm_bindgen::JsCast;
use web_sys::StorageEvent;

use crate::core::session::{StoreWatch, TOKEN_KEY, TokenChange, TokenStore};

/// [`TokenStore`] over `window.localStorage`, stored as a plain string under `token`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserTokenStore;

impl TokenStore for BrowserTokenStore {
    fn load(&self) -> Option<String> {
        match LocalStorage::raw().get_item(TOKEN_KEY) {
            Ok(value) => value,
            Err(err) => {
                log_storage_error("get", &format!("{err:?}"));
                None
            }
        }
    }

    fn save(&self, token: &str) {
        if let Err(err) = LocalStorage::raw().set_item(TOKEN_KEY, token) {
            log_storage_error("set", &format!("{err:?}"));
        }
    }

    fn clear(&self) {
        if let Err(err) = LocalStorage::raw().remove_item(TOKEN_KEY) {
            log_storage_error("delete", &format!("{err:?}"));
        }
    }

    fn watch(&self, on_change: TokenChange) -> StoreWatch {
        // `storage` only fires for writes made by other documents.
        let listener = EventListener::new(&window(), "storage", move |event| {
            let Some(event) = event.dyn_ref::<StorageEvent>() else {
                return;
            };
            // A missing key means the whole storage area was cleared.
            if event.key().is_some_and(|key| key != TOKEN_KEY) {
                return;
            }
            on_change(event.new_value());
        });
        StoreWatch::new(listener)
    }
}

fn log_storage_error(operation: &'static str, detail: &str) {
    console::error!("storage operation failed", operation, TOKEN_KEY, detail);
}
