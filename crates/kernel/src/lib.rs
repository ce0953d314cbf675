//! Vellum Kernel Library
//!
//! Publication-state aware content reads: root filtering, nested populate
//! under the same publication filter, and pagination over the result.
//! The main entry point for running the server is the `vellum` binary.

pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod models;
pub mod pagination;
pub mod populate;
pub mod publication;
pub mod routes;
pub mod state;
pub mod store;

pub use error::{AppError, AppResult};
pub use publication::{PublicationFilter, PublicationState};
pub use state::AppState;
