//! Browser wiring: configuration, session restore and the shared API client.

mod navigator;
mod storage;

use std::future::Future;
use std::rc::Rc;

use gloo::utils::window;

use crate::config::ClientConfig;
use crate::core::filters::UrlFilters;
use crate::core::session::Session;
use crate::services::api::ApiClient;
use crate::services::transport::GlooTransport;

pub use navigator::BrowserNavigator;
pub use storage::BrowserTokenStore;

/// Everything a page needs, built once at start-up.
#[derive(Clone, Debug)]
pub struct AppContext {
    /// Client for every backend call.
    pub api: ApiClient<GlooTransport>,
    /// Shared authentication state.
    pub session: Session,
}

impl AppContext {
    /// Resolve configuration from the build and the page origin, then restore the
    /// session from LocalStorage.
    #[must_use]
    pub fn boot() -> Self {
        let origin = window().location().origin().ok();
        let config = ClientConfig::from_build_env(origin.as_deref());
        let session = Session::restore(Rc::new(BrowserTokenStore));
        tracing::debug!(base_url = %config.base_url, "app context ready");
        Self {
            api: ApiClient::new(GlooTransport, session.clone(), config),
            session,
        }
    }

    /// Filter controls bound to the address bar.
    #[must_use]
    pub fn url_filters(&self) -> UrlFilters<BrowserNavigator> {
        UrlFilters::new(BrowserNavigator)
    }
}

/// Run `task` on the browser event loop.
pub fn spawn(task: impl Future<Output = ()> + 'static) {
    wasm_bindgen_futures::spawn_local(task);
}
