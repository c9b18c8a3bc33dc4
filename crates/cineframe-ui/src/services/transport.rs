//! HTTP transport seam between the API clients and the network stack.
//!
//! # Design
//! - Clients build an [`ApiRequest`] and hand it to a [`Transport`]; the transport only
//!   moves bytes and never interprets status codes.
//! - Futures are `?Send`: everything runs on the browser's single event loop.
//! - `gloo-net` backs the browser build and `reqwest` the native one.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

/// HTTP verbs used by the catalog API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl Method {
    /// Upper-case verb.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

/// Fully resolved outbound request.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiRequest {
    /// Verb.
    pub method: Method,
    /// Absolute URL without query string.
    pub url: String,
    /// Query parameters in order.
    pub query: Vec<(String, String)>,
    /// Bearer credential for the `Authorization` header.
    pub bearer: Option<String>,
    /// JSON body.
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Request with no query, credential, or body.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            bearer: None,
            body: None,
        }
    }

    /// Value of query parameter `name`, if sent.
    #[must_use]
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// URL including the encoded query string.
    #[must_use]
    pub fn full_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }
        let query = self
            .query
            .iter()
            .map(|(key, value)| {
                format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
            })
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{query}", self.url)
    }
}

/// Raw response: status plus body text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Body text, possibly empty.
    pub body: String,
}

impl ApiResponse {
    /// Whether the status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Sends requests to the backend.
#[async_trait(?Send)]
pub trait Transport {
    /// Perform `request`, failing only when no response was received.
    async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse>;
}

/// `reqwest`-backed transport for native targets.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

#[cfg(not(target_arch = "wasm32"))]
impl ReqwestTransport {
    /// Wrap a preconfigured client (timeouts, default headers).
    #[must_use]
    pub const fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[async_trait(?Send)]
impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };
        let mut builder = self
            .client
            .request(method, &request.url)
            .header(reqwest::header::ACCEPT, "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder.send().await.map_err(ApiError::network)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(ApiError::network)?;
        Ok(ApiResponse { status, body })
    }
}

/// `gloo-net` (fetch) transport for the browser.
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Copy, Debug, Default)]
pub struct GlooTransport;

#[cfg(target_arch = "wasm32")]
#[async_trait(?Send)]
impl Transport for GlooTransport {
    async fn send(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        use gloo_net::http::Request;

        let url = request.full_url();
        let mut req = match request.method {
            Method::Get => Request::get(&url),
            Method::Post => Request::post(&url),
            Method::Put => Request::put(&url),
            Method::Delete => Request::delete(&url),
        }
        .header("Accept", "application/json");
        if let Some(token) = &request.bearer {
            req = req.header("Authorization", &format!("Bearer {token}"));
        }
        if let Some(body) = &request.body {
            req = req.json(body).map_err(ApiError::network)?;
        }
        let response = req.send().await.map_err(ApiError::network)?;
        let status = response.status();
        let body = response.text().await.map_err(ApiError::network)?;
        Ok(ApiResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_url_encodes_query_in_order() {
        let mut request = ApiRequest::new(Method::Get, "http://api.test/movies");
        request.query = vec![
            ("page".into(), "2".into()),
            ("search".into(), "star wars".into()),
        ];
        assert_eq!(
            request.full_url(),
            "http://api.test/movies?page=2&search=star%20wars"
        );
        assert_eq!(request.query_value("page"), Some("2"));
        assert_eq!(request.query_value("limit"), None);
    }

    #[test]
    fn full_url_without_query_is_bare() {
        let request = ApiRequest::new(Method::Delete, "http://api.test/genres/4");
        assert_eq!(request.full_url(), "http://api.test/genres/4");
        assert_eq!(request.method.as_str(), "DELETE");
    }

    #[test]
    fn success_range_is_2xx() {
        assert!(ApiResponse { status: 204, body: String::new() }.is_success());
        assert!(!ApiResponse { status: 302, body: String::new() }.is_success());
    }
}
