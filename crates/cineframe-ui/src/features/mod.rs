//! Feature surfaces consumed by the view layer.
pub mod admin;
pub mod auth;
pub mod catalog;
