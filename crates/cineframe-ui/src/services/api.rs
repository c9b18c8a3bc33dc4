//! Typed clients for the catalog REST API.
//!
//! # Design
//! - [`ApiClient`] owns the transport, the shared [`Session`] and the [`ClientConfig`];
//!   clones are cheap and share all three.
//! - [`ResourceClient`] is a thin pass-through: one call, one request, nothing cached.
//! - The bearer token is read from the session when a request is built, so a login is
//!   visible to the very next call.

use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use cineframe_api_models::{
    Genre, GenrePayload, Movie, MoviePayload, Pagination, ResourceId, User, UserPayload,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::core::session::Session;
use crate::error::{ApiError, ApiResult};
use crate::services::auth::AuthClient;
use crate::services::transport::{ApiRequest, Method, Transport};

/// A REST collection exposed by the backend.
pub trait Resource: DeserializeOwned + Clone + 'static {
    /// Identifier type used in item paths.
    type Id: Copy + fmt::Display + PartialEq;
    /// Body sent on create and update.
    type Payload: Serialize;

    /// Collection path, e.g. `/movies`.
    const PATH: &'static str;
    /// Envelope key holding a page of items.
    const COLLECTION_KEY: &'static str;
    /// Envelope key holding a single item.
    const ITEM_KEY: &'static str;
    /// Plural noun used in user-facing messages.
    const LABEL: &'static str;
    /// Whether reads also carry the bearer credential.
    const READS_REQUIRE_AUTH: bool = false;

    /// Identifier of this item.
    fn id(&self) -> Self::Id;
}

impl Resource for Movie {
    type Id = ResourceId;
    type Payload = MoviePayload;

    const PATH: &'static str = "/movies";
    const COLLECTION_KEY: &'static str = "movies";
    const ITEM_KEY: &'static str = "movie";
    const LABEL: &'static str = "movies";

    fn id(&self) -> ResourceId {
        self.id
    }
}

impl Resource for Genre {
    type Id = ResourceId;
    type Payload = GenrePayload;

    const PATH: &'static str = "/genres";
    const COLLECTION_KEY: &'static str = "genres";
    const ITEM_KEY: &'static str = "genre";
    const LABEL: &'static str = "genres";

    fn id(&self) -> ResourceId {
        self.id
    }
}

impl Resource for User {
    type Id = ResourceId;
    type Payload = UserPayload;

    const PATH: &'static str = "/users";
    const COLLECTION_KEY: &'static str = "users";
    const ITEM_KEY: &'static str = "user";
    const LABEL: &'static str = "users";
    const READS_REQUIRE_AUTH: bool = true;

    fn id(&self) -> ResourceId {
        self.id
    }
}

/// One decoded page of a collection.
#[derive(Clone, Debug, PartialEq)]
pub struct ListResult<R> {
    /// Items in server order.
    pub items: Vec<R>,
    /// Pagination block, synthesised as a single page when the server omits it.
    pub pagination: Pagination,
}

/// Entry point shared by every resource and the auth client.
pub struct ApiClient<T> {
    transport: Rc<T>,
    session: Session,
    config: Rc<ClientConfig>,
}

impl<T> Clone for ApiClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Rc::clone(&self.transport),
            session: self.session.clone(),
            config: Rc::clone(&self.config),
        }
    }
}

impl<T> fmt::Debug for ApiClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> ApiClient<T> {
    /// Build a client over `transport`, reading credentials from `session`.
    pub fn new(transport: T, session: Session, config: ClientConfig) -> Self {
        Self {
            transport: Rc::new(transport),
            session,
            config: Rc::new(config),
        }
    }

    /// Session whose token authorises requests.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Client for resource `R`.
    #[must_use]
    pub fn resource<R: Resource>(&self) -> ResourceClient<R, T> {
        ResourceClient {
            api: self.clone(),
            _resource: PhantomData,
        }
    }

    /// `/movies`
    #[must_use]
    pub fn movies(&self) -> ResourceClient<Movie, T> {
        self.resource()
    }

    /// `/genres`
    #[must_use]
    pub fn genres(&self) -> ResourceClient<Genre, T> {
        self.resource()
    }

    /// `/users`
    #[must_use]
    pub fn users(&self) -> ResourceClient<User, T> {
        self.resource()
    }

    /// `/auth`
    #[must_use]
    pub fn auth(&self) -> AuthClient<T> {
        AuthClient::new(self.clone())
    }

    /// Send one request and return the body of a 2xx response.
    pub(crate) async fn execute(
        &self,
        method: Method,
        path: &str,
        query: Vec<(String, String)>,
        body: Option<Value>,
        authorize: bool,
    ) -> ApiResult<String> {
        let mut request = ApiRequest::new(method, self.config.endpoint(path));
        request.query = query;
        request.body = body;
        if authorize {
            request.bearer = self.session.token();
        }
        tracing::debug!(
            method = method.as_str(),
            path,
            authorized = request.bearer.is_some(),
            "issuing api request"
        );
        let response = self.transport.send(request).await?;
        if response.is_success() {
            Ok(response.body)
        } else {
            tracing::debug!(status = response.status, path, "api request rejected");
            Err(ApiError::from_response(response.status, &response.body))
        }
    }
}

/// CRUD operations on one [`Resource`].
pub struct ResourceClient<R, T> {
    api: ApiClient<T>,
    _resource: PhantomData<fn() -> R>,
}

impl<R, T> Clone for ResourceClient<R, T> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource, T> fmt::Debug for ResourceClient<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceClient")
            .field("path", &R::PATH)
            .finish_non_exhaustive()
    }
}

impl<R: Resource, T: Transport> ResourceClient<R, T> {
    /// Underlying API client.
    #[must_use]
    pub const fn api(&self) -> &ApiClient<T> {
        &self.api
    }

    /// Fetch one page (or the whole collection when no `page` is sent).
    pub async fn list(&self, query: Vec<(String, String)>) -> ApiResult<ListResult<R>> {
        let requested_page = query
            .iter()
            .find(|(key, _)| key == "page")
            .and_then(|(_, value)| value.parse::<u32>().ok())
            .unwrap_or(1);
        let body = self
            .api
            .execute(Method::Get, R::PATH, query, None, R::READS_REQUIRE_AUTH)
            .await?;
        decode_list(&body, R::COLLECTION_KEY, requested_page)
    }

    /// Fetch a single item.
    pub async fn get_by_id(&self, id: R::Id) -> ApiResult<R> {
        let body = self
            .api
            .execute(
                Method::Get,
                &item_path::<R>(id),
                Vec::new(),
                None,
                R::READS_REQUIRE_AUTH,
            )
            .await?;
        decode_item(&body, R::ITEM_KEY)
    }

    /// Create an item. Returns the stored representation when the backend echoes one;
    /// a bare acknowledgement such as `{"message": "..."}` yields `None`.
    pub async fn create(&self, payload: &R::Payload) -> ApiResult<Option<R>> {
        let body = self
            .api
            .execute(Method::Post, R::PATH, Vec::new(), Some(to_body(payload)?), true)
            .await?;
        decode_written(&body, R::ITEM_KEY)
    }

    /// Replace an item; the result follows [`Self::create`].
    pub async fn update(&self, id: R::Id, payload: &R::Payload) -> ApiResult<Option<R>> {
        let body = self
            .api
            .execute(
                Method::Put,
                &item_path::<R>(id),
                Vec::new(),
                Some(to_body(payload)?),
                true,
            )
            .await?;
        decode_written(&body, R::ITEM_KEY)
    }

    /// Delete an item; the response body is ignored.
    pub async fn delete(&self, id: R::Id) -> ApiResult<()> {
        self.api
            .execute(Method::Delete, &item_path::<R>(id), Vec::new(), None, true)
            .await?;
        Ok(())
    }
}

fn item_path<R: Resource>(id: R::Id) -> String {
    format!("{}/{id}", R::PATH)
}

fn to_body(payload: &impl Serialize) -> ApiResult<Value> {
    serde_json::to_value(payload).map_err(ApiError::decode)
}

/// Decode a collection envelope: `{<key>: [...]}`, `{data: [...]}` or a bare array.
pub(crate) fn decode_list<R: DeserializeOwned>(
    body: &str,
    key: &str,
    requested_page: u32,
) -> ApiResult<ListResult<R>> {
    let value: Value = serde_json::from_str(body).map_err(ApiError::decode)?;
    let (items, pagination) = match value {
        Value::Array(items) => (Value::Array(items), None),
        Value::Object(mut map) => {
            let items = map
                .remove(key)
                .filter(|v| !v.is_null())
                .or_else(|| map.remove("data").filter(|v| !v.is_null()))
                .unwrap_or_else(|| Value::Array(Vec::new()));
            (items, map.remove("pagination").filter(|v| !v.is_null()))
        }
        other => {
            return Err(ApiError::Decode {
                detail: format!("expected a list envelope, got {other}"),
            });
        }
    };
    let items: Vec<R> = serde_json::from_value(items).map_err(ApiError::decode)?;
    let pagination = match pagination {
        Some(mut block) => {
            let reported_page = block
                .as_object_mut()
                .and_then(|map| map.remove("current_page"))
                .and_then(|page| page_number(&page));
            let mut pagination: Pagination =
                serde_json::from_value(block).map_err(ApiError::decode)?;
            pagination.current_page = reported_page.unwrap_or_else(|| requested_page.max(1));
            if pagination.total == 0 {
                pagination.total = u64::try_from(items.len()).unwrap_or(u64::MAX);
            }
            pagination
        }
        None => Pagination {
            current_page: requested_page.max(1),
            ..Pagination::single_page(items.len())
        },
    };
    Ok(ListResult { items, pagination })
}

/// Positive page number from a JSON number or numeric string.
fn page_number(value: &Value) -> Option<u32> {
    let raw = match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }?;
    u32::try_from(raw).ok().filter(|page| *page > 0)
}

/// Decode a single entity from `{<key>: …}`, `{data: …}` or the bare body.
pub(crate) fn decode_item<R: DeserializeOwned>(body: &str, key: &str) -> ApiResult<R> {
    let value: Value = serde_json::from_str(body).map_err(ApiError::decode)?;
    let entity = match value {
        Value::Object(mut map) => {
            let inner = map
                .remove(key)
                .filter(|v| !v.is_null())
                .or_else(|| map.remove("data").filter(|v| !v.is_null()));
            inner.unwrap_or(Value::Object(map))
        }
        other => other,
    };
    serde_json::from_value(entity).map_err(ApiError::decode)
}

/// Decode the entity a write echoed back, if any.
///
/// An envelope key that is present must decode. Without one the bare body is tried, and a
/// body that is not an entity (empty, a message, `true`) counts as success with no echo.
pub(crate) fn decode_written<R: DeserializeOwned>(body: &str, key: &str) -> ApiResult<Option<R>> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        tracing::debug!(key, "write response was not json; treating as acknowledgement");
        return Ok(None);
    };
    match value {
        Value::Object(mut map) => {
            let envelope = map
                .remove(key)
                .filter(|v| !v.is_null())
                .or_else(|| map.remove("data").filter(|v| v.is_object()));
            match envelope {
                Some(entity) => serde_json::from_value(entity)
                    .map(Some)
                    .map_err(ApiError::decode),
                None => Ok(serde_json::from_value(Value::Object(map)).ok()),
            }
        }
        _ => Ok(None),
    }
}
