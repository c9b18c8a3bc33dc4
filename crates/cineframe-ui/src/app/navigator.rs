//! History-backed [`Navigator`] for the browser.

use gloo::console;
use gloo::utils::window;
use wasm_bindgen::JsValue;

use crate::core::filters::Navigator;

/// Reads `location.search` and rewrites it with `history.replaceState`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn query(&self) -> String {
        window().location().search().unwrap_or_default()
    }

    fn replace_query(&self, query: &str) {
        let location = window().location();
        let path = location.pathname().unwrap_or_else(|_| "/".to_string());
        let hash = location.hash().unwrap_or_default();
        let url = if query.is_empty() {
            format!("{path}{hash}")
        } else {
            format!("{path}?{query}{hash}")
        };
        let replaced = window()
            .history()
            .and_then(|history| history.replace_state_with_url(&JsValue::NULL, "", Some(&url)));
        if let Err(err) = replaced {
            console::error!("history replace failed", url, format!("{err:?}"));
        }
    }
}
