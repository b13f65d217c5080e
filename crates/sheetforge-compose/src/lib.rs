//! Raster composition of packed placements into print-ready sheets.
//!
//! Each sheet becomes one RGBA canvas at the configured DPI; source images
//! are scaled anisotropically to their exact print size, rotated when the
//! packing says so, framed with an optional border, and blitted in placement
//! order. Canvases are encoded as PNG.
//!
//! Inch-to-pixel conversions round consistently (canvas size up, placement
//! offsets down) so adjacent items never drift apart over many shelves.

mod color;
mod renderer;

pub use color::parse_hex_color;
pub use renderer::{render, render_sheet, RasterSheet, RenderError, SourceImages};
