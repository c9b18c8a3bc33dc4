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
//! Shared HTTP DTOs for the Cineframe catalog API.
//!
//! The backend is loose about scalar types (booleans arrive as `0`/`1`, ratings as
//! numbers or strings, timestamps in more than one layout), so the entity types decode
//! leniently and normalise on the way in. Write payloads serialise exactly what the
//! backend expects.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier type used by every catalog resource.
pub type ResourceId = i64;

/// Genre as returned by `/genres` and embedded on movies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Genre {
    /// Backend identifier.
    pub id: ResourceId,
    /// Display name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// Movie or series entry from `/movies`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    /// Backend identifier.
    pub id: ResourceId,
    /// Display title.
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Whether the entry is a series rather than a single film.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_series: bool,
    /// Poster image URL.
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Wide backdrop image URL.
    #[serde(default)]
    pub backdrop_image: Option<String>,
    /// Plot synopsis.
    #[serde(default)]
    pub synopsis: Option<String>,
    /// Rating label, normalised to text.
    #[serde(default, deserialize_with = "lenient_text")]
    pub rating: Option<String>,
    /// Release year.
    #[serde(default)]
    pub year: Option<i32>,
    /// Episode count; only meaningful for series.
    #[serde(default)]
    pub episodes: Option<u32>,
    /// Embedded genre summaries in backend order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<Genre>,
    /// Pre-joined genre label some list endpoints include.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre_names: Option<String>,
}

impl Movie {
    /// Whether the movie carries the given genre.
    #[must_use]
    pub fn has_genre(&self, genre_id: ResourceId) -> bool {
        self.genres.iter().any(|genre| genre.id == genre_id)
    }

    /// Genre label for cards: the backend-provided join, else the embedded names.
    #[must_use]
    pub fn genre_label(&self) -> Option<String> {
        if let Some(names) = self.genre_names.as_ref().filter(|n| !n.trim().is_empty()) {
            return Some(names.clone());
        }
        if self.genres.is_empty() {
            return None;
        }
        Some(
            self.genres
                .iter()
                .map(|genre| genre.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

/// Registered account from `/users`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Backend identifier.
    pub id: ResourceId,
    /// Full name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Login email.
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    /// Account creation time when the backend reports a parseable timestamp.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body for `POST /movies` and `PUT /movies/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoviePayload {
    /// Display title.
    pub title: String,
    /// Series flag.
    pub is_series: bool,
    /// Poster image URL.
    pub thumbnail: Option<String>,
    /// Backdrop image URL.
    pub backdrop_image: Option<String>,
    /// Plot synopsis.
    pub synopsis: Option<String>,
    /// Rating label.
    pub rating: Option<String>,
    /// Release year.
    pub year: i32,
    /// Episode count; `None` for films.
    pub episodes: Option<u32>,
    /// Genres to attach, in selection order.
    pub genre_ids: Vec<ResourceId>,
}

/// Body for `POST /genres` and `PUT /genres/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenrePayload {
    /// Display name.
    pub name: String,
}

/// Body for `POST /users` and `PUT /users/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserPayload {
    /// Full name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// New password; omitted to keep the current one on update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Confirmation matching `password`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_confirmation: Option<String>,
}

/// Body for `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Response from `POST /auth/login`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    /// Bearer token; absent when the backend accepted the call but issued nothing.
    #[serde(default)]
    pub token: Option<String>,
}

/// Body for `POST /auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterRequest {
    /// Full name.
    pub name: String,
    /// Account email.
    pub email: String,
    /// Chosen password.
    pub password: String,
    /// Confirmation matching `password`.
    pub password_confirmation: String,
}

/// Pagination block attached to paginated list responses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    /// Page the response belongs to (1-based).
    #[serde(default = "first_page")]
    pub current_page: u32,
    /// Last page available for the current query.
    #[serde(default = "first_page")]
    pub last_page: u32,
    /// Total matches across all pages.
    #[serde(default)]
    pub total: u64,
}

impl Pagination {
    /// Pagination describing a complete, unpaginated result of `len` items.
    #[must_use]
    pub fn single_page(len: usize) -> Self {
        Self {
            current_page: 1,
            last_page: 1,
            total: u64::try_from(len).unwrap_or(u64::MAX),
        }
    }

    /// Whether pages remain after `current_page`.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.current_page < self.last_page
    }
}

const fn first_page() -> u32 {
    1
}

/// Error document returned on failed requests.
///
/// Validation failures carry `errors` (field → messages, in backend order); other
/// failures usually carry a `message`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// Human-readable failure summary.
    #[serde(default)]
    pub message: Option<String>,
    /// Field-level validation messages.
    #[serde(default)]
    pub errors: Option<FieldErrors>,
}

impl ErrorBody {
    /// Collapse the body into one display string: validation messages joined with
    /// `". "`, else the message. `None` when the body carries neither.
    #[must_use]
    pub fn display_message(&self) -> Option<String> {
        if let Some(errors) = self.errors.as_ref().filter(|errors| !errors.is_empty()) {
            return Some(errors.joined());
        }
        self.message
            .as_ref()
            .map(|message| message.trim())
            .filter(|message| !message.is_empty())
            .map(str::to_string)
    }
}

/// Ordered field → messages mapping from a validation failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(pub Vec<(String, Vec<String>)>);

impl FieldErrors {
    /// Whether no message is present for any field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|(_, messages)| messages.is_empty())
    }

    /// Messages recorded for `field`.
    #[must_use]
    pub fn messages_for(&self, field: &str) -> &[String] {
        self.0
            .iter()
            .find(|(name, _)| name == field)
            .map_or(&[], |(_, messages)| messages.as_slice())
    }

    /// Every message, flattened in field order and joined with `". "`.
    #[must_use]
    pub fn joined(&self) -> String {
        self.0
            .iter()
            .flat_map(|(_, messages)| messages.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(". ")
    }
}

impl<'de> Deserialize<'de> for FieldErrors {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct FieldErrorsVisitor;

        impl<'de> Visitor<'de> for FieldErrorsVisitor {
            type Value = FieldErrors;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a map of field names to validation messages")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut fields = Vec::new();
                while let Some((field, messages)) = map.next_entry::<String, OneOrMany>()? {
                    fields.push((field, messages.into_vec()));
                }
                Ok(FieldErrors(fields))
            }
        }

        deserializer.deserialize_map(FieldErrorsVisitor)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(message) => vec![message],
            Self::Many(messages) => messages,
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BoolLike {
    Bool(bool),
    Int(i64),
    Text(String),
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<BoolLike>::deserialize(deserializer)? {
        None => Ok(false),
        Some(BoolLike::Bool(value)) => Ok(value),
        Some(BoolLike::Int(value)) => Ok(value != 0),
        Some(BoolLike::Text(value)) => match value.trim() {
            "1" | "true" => Ok(true),
            "0" | "false" | "" => Ok(false),
            other => Err(de::Error::invalid_value(
                de::Unexpected::Str(other),
                &"a boolean, 0/1, or \"true\"/\"false\"",
            )),
        },
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextLike {
    Text(String),
    Int(i64),
    Float(f64),
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<TextLike>::deserialize(deserializer)? {
        None => None,
        Some(TextLike::Text(value)) if value.trim().is_empty() => None,
        Some(TextLike::Text(value)) => Some(value),
        Some(TextLike::Int(value)) => Some(value.to_string()),
        Some(TextLike::Float(value)) => Some(value.to_string()),
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    Ok(NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    #[test]
    fn movie_decodes_loose_backend_scalars() -> Result<()> {
        let movie: Movie = serde_json::from_value(json!({
            "id": 7,
            "title": "Dark",
            "is_series": 1,
            "thumbnail": null,
            "rating": 8.5,
            "year": 2017,
            "episodes": 26,
            "genres": [{ "id": 3, "name": "Thriller" }, { "id": 9, "name": "Sci-Fi" }]
        }))?;
        assert!(movie.is_series);
        assert_eq!(movie.rating.as_deref(), Some("8.5"));
        assert_eq!(movie.thumbnail, None);
        assert!(movie.has_genre(9));
        assert!(!movie.has_genre(1));
        assert_eq!(movie.genre_label().as_deref(), Some("Thriller, Sci-Fi"));
        Ok(())
    }

    #[test]
    fn movie_defaults_missing_fields() -> Result<()> {
        let movie: Movie = serde_json::from_value(json!({ "id": 1, "genres": null }))?;
        assert_eq!(movie.title, "");
        assert!(!movie.is_series);
        assert!(movie.genres.is_empty());
        assert_eq!(movie.genre_label(), None);
        Ok(())
    }

    #[test]
    fn movie_rejects_unrecognised_series_flag() {
        let decoded = serde_json::from_value::<Movie>(json!({ "id": 1, "is_series": "maybe" }));
        assert!(decoded.is_err());
    }

    #[test]
    fn user_timestamp_accepts_both_layouts() -> Result<()> {
        let rfc: User = serde_json::from_value(json!({
            "id": 1, "name": "Ana", "email": "ana@example.com",
            "created_at": "2024-03-01T10:20:30.000000Z"
        }))?;
        let created = rfc.created_at.ok_or_else(|| anyhow::anyhow!("timestamp"))?;
        assert_eq!((created.year(), created.month(), created.hour()), (2024, 3, 10));

        let sql: User = serde_json::from_value(json!({
            "id": 2, "name": "Bo", "email": "bo@example.com",
            "created_at": "2023-12-31 23:59:00"
        }))?;
        assert!(sql.created_at.is_some());

        let garbage: User = serde_json::from_value(json!({
            "id": 3, "name": "Cy", "email": "cy@example.com", "created_at": "yesterday"
        }))?;
        assert_eq!(garbage.created_at, None);
        Ok(())
    }

    #[test]
    fn error_body_joins_validation_messages_in_field_order() -> Result<()> {
        let body: ErrorBody = serde_json::from_str(
            r#"{
                "message": "The given data was invalid.",
                "errors": {
                    "title": ["The title field is required"],
                    "year": ["The year must be a number.", "The year must be at least 1900"],
                    "email": "The email has already been taken."
                }
            }"#,
        )?;
        assert_eq!(
            body.display_message().as_deref(),
            Some(
                "The title field is required. The year must be a number.. \
                 The year must be at least 1900. The email has already been taken."
            )
        );
        let errors = body.errors.clone().unwrap_or_default();
        let fields: Vec<&str> = errors.0.iter().map(|(field, _)| field.as_str()).collect();
        assert_eq!(fields, ["title", "year", "email"]);
        let errors = body.errors.ok_or_else(|| anyhow::anyhow!("errors"))?;
        assert_eq!(errors.messages_for("year").len(), 2);
        assert!(errors.messages_for("missing").is_empty());
        Ok(())
    }

    #[test]
    fn error_body_falls_back_to_message_then_nothing() -> Result<()> {
        let body: ErrorBody = serde_json::from_value(json!({ "message": "Unauthenticated." }))?;
        assert_eq!(body.display_message().as_deref(), Some("Unauthenticated."));

        let empty: ErrorBody = serde_json::from_value(json!({ "errors": {}, "message": "  " }))?;
        assert_eq!(empty.display_message(), None);
        Ok(())
    }

    #[test]
    fn user_payload_omits_absent_password() -> Result<()> {
        let payload = UserPayload {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password: None,
            password_confirmation: None,
        };
        let value = serde_json::to_value(&payload)?;
        assert_eq!(value, json!({ "name": "Ana", "email": "ana@example.com" }));
        Ok(())
    }

    #[test]
    fn pagination_reports_remaining_pages() -> Result<()> {
        let pagination: Pagination =
            serde_json::from_value(json!({ "current_page": 1, "last_page": 3, "total": 25 }))?;
        assert!(pagination.has_more());
        assert!(!Pagination::single_page(4).has_more());
        assert_eq!(Pagination::single_page(4).total, 4);
        Ok(())
    }
}
