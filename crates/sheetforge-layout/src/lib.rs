//! Shelf packing for gangsheet layout.
//!
//! Items are laid out in horizontal rows ("shelves") left to right; when a
//! row is full a new shelf opens below it, and when a sheet runs out of
//! height (or hits the per-sheet item cap) a new sheet opens. With
//! auto-arrange enabled, units are sorted by height descending before packing
//! and may be rotated 90 degrees to reduce wasted shelf height.
//!
//! The packing is greedy and deterministic: the same items in the same order
//! with the same settings always produce the same placements. It does not
//! minimize sheet count (true 2D bin packing is NP-hard).

mod packer;

pub use packer::{pack, Packing, PackingError};
