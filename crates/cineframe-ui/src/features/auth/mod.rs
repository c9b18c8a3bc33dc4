//! Sign-in and registration surface.

pub mod forms;
