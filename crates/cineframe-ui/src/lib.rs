#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::multiple_crate_versions)]
//! Cineframe browser data layer.
//! Filter state lives in the URL, lists load page by page through a shared API client,
//! and the session token follows LocalStorage across tabs.

pub mod config;
pub mod core;
pub mod error;
pub mod features;
pub mod services;

#[cfg(target_arch = "wasm32")]
pub mod app;

pub use config::ClientConfig;
pub use error::{ApiError, ApiResult, FormError, ListError};
