//! HTTP API for the gangsheet engine.
//!
//! Handlers, tenant extraction, error rendering, and application setup.

mod api_doc;

pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod tenant;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
