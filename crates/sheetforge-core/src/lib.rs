//! Sheetforge Core Library
//!
//! This crate provides the domain models, error types, configuration, and the
//! gangsheet store abstraction shared across all Sheetforge components.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
pub use store::GangsheetStore;
