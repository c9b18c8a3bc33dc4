//! Backend access: transport seam, resource and auth clients.
pub mod api;
pub mod auth;
pub mod stub;
pub mod transport;
