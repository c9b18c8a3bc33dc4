//! Core, DOM-free primitives: URL filter codec, change notification, session.
pub mod filters;
pub mod observe;
pub mod session;
