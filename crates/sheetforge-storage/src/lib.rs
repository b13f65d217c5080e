//! Blob storage for rendered gangsheet artifacts.
//!
//! This crate provides the Storage trait and implementations for S3,
//! local filesystem, and in-memory (tests).
//!
//! # Storage key format
//!
//! Keys are tenant-scoped and job-scoped: every artifact of a gangsheet job
//! lives under `gangsheets/{tenant_id}/{gangsheet_id}/`, so a whole job can
//! be removed with a single prefix delete. Keys must not contain `..` or a
//! leading `/`. Key generation is centralized in the `keys` module so all
//! backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod memory;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use sheetforge_core::StorageBackend;
pub use traits::{Storage, StorageError, StorageResult};
