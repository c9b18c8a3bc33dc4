//! Catalog listing: filtered, paginated movie, genre and user lists.

pub mod state;

pub use state::{ListController, ListMode, ListPage, ListSnapshot, ListStatus};
