//! Back-office form models and client-side list filters.
//!
//! Edit screens hydrate from a fetch-all listing, so lookups and searches here operate
//! on slices already held by a [`crate::features::catalog::ListController`].

use cineframe_api_models::{
    Genre, GenrePayload, Movie, MoviePayload, ResourceId, User, UserPayload,
};

use crate::error::{ApiError, FormError};
use crate::services::api::Resource;

/// Status line after a successful save.
pub const SAVED: &str = "Saved!";
/// Status line after a failed delete.
pub const DELETE_FAILED: &str = "Failed to delete";

/// Status line for a failed save of `noun` (`movie`, `genre`, `user`).
#[must_use]
pub fn save_failure_message(noun: &str, err: &ApiError) -> String {
    err.display_message(&format!("Error saving {noun}"))
}

/// Whether a catalog entry is a single film or a series.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MovieKind {
    /// Single film.
    #[default]
    Movie,
    /// Episodic series.
    Series,
}

/// Editable movie fields as typed into the form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MovieForm {
    /// Title.
    pub title: String,
    /// Film or series.
    pub kind: MovieKind,
    /// Poster URL.
    pub thumbnail: String,
    /// Backdrop URL.
    pub backdrop_image: String,
    /// Synopsis.
    pub synopsis: String,
    /// Rating text.
    pub rating: String,
    /// Release year as typed.
    pub year: String,
    /// Episode count as typed; only sent for series.
    pub episodes: String,
    /// Selected genres in selection order.
    pub genre_ids: Vec<ResourceId>,
}

impl MovieForm {
    /// Blank form defaulting to a film released in `current_year`.
    #[must_use]
    pub fn new(current_year: i32) -> Self {
        Self {
            title: String::new(),
            kind: MovieKind::Movie,
            thumbnail: String::new(),
            backdrop_image: String::new(),
            synopsis: String::new(),
            rating: String::new(),
            year: current_year.to_string(),
            episodes: String::new(),
            genre_ids: Vec::new(),
        }
    }

    /// Form prefilled from `movie`; a missing year falls back to `current_year`.
    #[must_use]
    pub fn from_movie(movie: &Movie, current_year: i32) -> Self {
        Self {
            title: movie.title.clone(),
            kind: if movie.is_series {
                MovieKind::Series
            } else {
                MovieKind::Movie
            },
            thumbnail: movie.thumbnail.clone().unwrap_or_default(),
            backdrop_image: movie.backdrop_image.clone().unwrap_or_default(),
            synopsis: movie.synopsis.clone().unwrap_or_default(),
            rating: movie.rating.clone().unwrap_or_default(),
            year: movie.year.unwrap_or(current_year).to_string(),
            episodes: movie.episodes.map(|n| n.to_string()).unwrap_or_default(),
            genre_ids: movie.genres.iter().map(|genre| genre.id).collect(),
        }
    }

    /// Select `genre_id`, or deselect it when already selected.
    pub fn toggle_genre(&mut self, genre_id: ResourceId) {
        if let Some(pos) = self.genre_ids.iter().position(|id| *id == genre_id) {
            self.genre_ids.remove(pos);
        } else {
            self.genre_ids.push(genre_id);
        }
    }

    /// Names of the selected genres, in catalog order.
    #[must_use]
    pub fn selected_genre_names<'a>(&self, genres: &'a [Genre]) -> Vec<&'a str> {
        genres
            .iter()
            .filter(|genre| self.genre_ids.contains(&genre.id))
            .map(|genre| genre.name.as_str())
            .collect()
    }

    /// Validate and build the request body.
    pub fn to_payload(&self) -> Result<MoviePayload, FormError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(FormError::Required { field: "Title" });
        }
        let year = self
            .year
            .trim()
            .parse::<i32>()
            .map_err(|_| FormError::NotANumber { field: "Year" })?;
        let is_series = self.kind == MovieKind::Series;
        let episodes = if is_series {
            self.episodes.trim().parse::<u32>().ok().filter(|n| *n > 0)
        } else {
            None
        };
        Ok(MoviePayload {
            title: title.to_string(),
            is_series,
            thumbnail: non_blank(&self.thumbnail),
            backdrop_image: non_blank(&self.backdrop_image),
            synopsis: non_blank(&self.synopsis),
            rating: non_blank(&self.rating),
            year,
            episodes,
            genre_ids: self.genre_ids.clone(),
        })
    }
}

/// Genre form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenreForm {
    /// Genre name.
    pub name: String,
}

impl GenreForm {
    /// Prefill from `genre`.
    #[must_use]
    pub fn from_genre(genre: &Genre) -> Self {
        Self {
            name: genre.name.clone(),
        }
    }

    /// Validate and build the request body.
    pub fn to_payload(&self) -> Result<GenrePayload, FormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormError::Required { field: "Name" });
        }
        Ok(GenrePayload {
            name: name.to_string(),
        })
    }
}

/// User form. Passwords are never prefilled.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserForm {
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// New password; blank keeps the current one on edit.
    pub password: String,
    /// Confirmation of `password`.
    pub password_confirmation: String,
}

impl UserForm {
    /// Prefill identity fields from `user`.
    #[must_use]
    pub fn from_user(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            ..Self::default()
        }
    }

    /// Validate and build the request body. `creating` makes the password mandatory.
    pub fn to_payload(&self, creating: bool) -> Result<UserPayload, FormError> {
        let has_password = !self.password.is_empty();
        if has_password && self.password != self.password_confirmation {
            return Err(FormError::PasswordMismatch);
        }
        if creating && !has_password {
            return Err(FormError::Required { field: "Password" });
        }
        Ok(UserPayload {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: has_password.then(|| self.password.clone()),
            password_confirmation: has_password.then(|| self.password_confirmation.clone()),
        })
    }
}

/// Genres whose name contains `query`, ignoring case.
#[must_use]
pub fn filter_genres<'a>(genres: &'a [Genre], query: &str) -> Vec<&'a Genre> {
    let needle = query.to_lowercase();
    genres
        .iter()
        .filter(|genre| genre.name.to_lowercase().contains(&needle))
        .collect()
}

/// Users whose name or email contains `query`, ignoring case.
#[must_use]
pub fn filter_users<'a>(users: &'a [User], query: &str) -> Vec<&'a User> {
    let needle = query.to_lowercase();
    users
        .iter()
        .filter(|user| {
            user.name.to_lowercase().contains(&needle)
                || user.email.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Movies tagged with `genre_id`.
#[must_use]
pub fn movies_in_genre(movies: &[Movie], genre_id: ResourceId) -> Vec<&Movie> {
    movies
        .iter()
        .filter(|movie| movie.has_genre(genre_id))
        .collect()
}

/// Entry with `id` in an already fetched list.
#[must_use]
pub fn find_by_id<R: Resource>(items: &[R], id: R::Id) -> Option<&R> {
    items.iter().find(|item| item.id() == id)
}

/// Parse a route parameter such as `/admin/movies/:id`.
#[must_use]
pub fn parse_route_id(raw: &str) -> Option<ResourceId> {
    raw.trim().parse().ok()
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
