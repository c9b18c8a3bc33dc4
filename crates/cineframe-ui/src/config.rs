//! Client configuration: API base URL and list page size.
//!
//! # Design
//! - The base URL is fixed at build time through `CINEFRAME_API_BASE_URL` when set.
//! - Without an override the browser shell derives it from the page origin.
//! - Everything here is pure so the resolution order is testable off-wasm.

/// Items requested per page by paginated listings.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Base URL used when neither an override nor a page origin is available.
pub const FALLBACK_BASE_URL: &str = "http://localhost:8000/api";

const BUILD_BASE_URL: Option<&str> = option_env!("CINEFRAME_API_BASE_URL");

/// Settings shared by every client built for one app instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root without a trailing slash, e.g. `https://example.com/api`.
    pub base_url: String,
    /// Page size for paginated listings.
    pub page_size: u32,
}

impl ClientConfig {
    /// Build a config for `base_url` with the default page size.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Resolve the base URL: explicit override, then `<origin>/api`, then the fallback.
    #[must_use]
    pub fn from_base_url_override(base_override: Option<&str>, origin: Option<&str>) -> Self {
        if let Some(value) = base_override.map(str::trim).filter(|v| !v.is_empty()) {
            return Self::new(value);
        }
        if let Some(origin) = origin.map(str::trim).filter(|o| !o.is_empty() && *o != "null") {
            return Self::new(format!("{}/api", origin.trim_end_matches('/')));
        }
        Self::new(FALLBACK_BASE_URL)
    }

    /// Resolve using the value baked in at build time.
    #[must_use]
    pub fn from_build_env(origin: Option<&str>) -> Self {
        Self::from_base_url_override(BUILD_BASE_URL, origin)
    }

    /// Override the page size; zero is clamped to one.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Absolute URL for an API path such as `/movies/3`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(FALLBACK_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins_and_is_normalised() {
        let config = ClientConfig::from_base_url_override(
            Some(" https://api.example.com/v1/ "),
            Some("https://app.example.com"),
        );
        assert_eq!(config.base_url, "https://api.example.com/v1");
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn origin_is_used_when_override_blank() {
        let config = ClientConfig::from_base_url_override(Some(""), Some("https://app.example.com/"));
        assert_eq!(config.base_url, "https://app.example.com/api");
    }

    #[test]
    fn opaque_origin_falls_back() {
        let config = ClientConfig::from_base_url_override(None, Some("null"));
        assert_eq!(config.base_url, FALLBACK_BASE_URL);
    }

    #[test]
    fn endpoint_joins_single_slash() {
        let config = ClientConfig::new("http://localhost:8000/api/");
        assert_eq!(config.endpoint("/movies/4"), "http://localhost:8000/api/movies/4");
        assert_eq!(config.endpoint("genres"), "http://localhost:8000/api/genres");
    }

    #[test]
    fn zero_page_size_is_clamped() {
        assert_eq!(ClientConfig::default().with_page_size(0).page_size, 1);
    }
}
