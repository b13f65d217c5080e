//! Gangsheet job orchestration.
//!
//! [`GangsheetService`] owns the whole job lifecycle: submission, the
//! claim-and-run pipeline (resolve -> pack -> fetch -> render -> archive ->
//! upload), queries, and deletion with cancellation of in-flight jobs. It is
//! wired from traits only (store, blob storage, design source, settings
//! resolver, image fetcher) so every stage can be substituted in tests.

pub mod archive;
pub mod design_source;
pub mod fetch;
pub mod memory;
pub mod service;
pub mod settings;

pub use design_source::{DesignSource, DesignSourceError, HttpDesignSource};
pub use fetch::{fetch_all, FetchError, HttpImageFetcher, SourceImageFetcher};
pub use memory::InMemoryGangsheetStore;
pub use service::{GangsheetService, StageError};
pub use settings::{SettingsResolver, StaticSettingsResolver};
