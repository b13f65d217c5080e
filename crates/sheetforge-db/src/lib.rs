//! Postgres persistence for gangsheet records.
//!
//! The repository here is the only component that writes gangsheet rows.
//! Status transitions are compare-and-set updates so concurrent workers and
//! API handlers cannot race a record into an inconsistent state.

pub mod gangsheet;

pub use gangsheet::PgGangsheetStore;
