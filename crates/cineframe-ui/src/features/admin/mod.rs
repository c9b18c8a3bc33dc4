//! Back-office CRUD helpers.

pub mod forms;
