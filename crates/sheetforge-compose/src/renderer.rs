use crate::color::parse_hex_color;
use bytes::Bytes;
use image::{imageops, ImageFormat, ImageReader, Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use sheetforge_core::models::{DesignItem, Placement, SheetSettings};
use std::collections::HashMap;
use std::io::Cursor;
use thiserror::Error;

/// Fetched source image bytes, keyed by `DesignItem::source_image_ref`.
pub type SourceImages = HashMap<String, Bytes>;

#[derive(Debug, Error)]
pub enum RenderError {
    /// A missing ordered item is a production-correctness defect, so an
    /// unavailable or undecodable source fails the whole render rather than
    /// silently omitting the item.
    #[error("source image unavailable: {reference}: {reason}")]
    SourceImageUnavailable { reference: String, reason: String },

    #[error("failed to encode sheet {sheet_index} as PNG: {source}")]
    Encode {
        sheet_index: usize,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid color: {0}")]
    InvalidColor(String),
}

/// One finished sheet: an encoded PNG at `roll_width_in x roll_height_in`
/// inches rasterized at the configured DPI.
#[derive(Debug, Clone)]
pub struct RasterSheet {
    pub sheet_index: usize,
    pub width_px: u32,
    pub height_px: u32,
    pub png: Bytes,
}

/// Rasterize every sheet present in the placements, in sheet order.
pub fn render(
    placements: &[Placement],
    items: &[DesignItem],
    sources: &SourceImages,
    settings: &SheetSettings,
) -> Result<Vec<RasterSheet>, RenderError> {
    let sheet_count = placements
        .iter()
        .map(|p| p.sheet_index + 1)
        .max()
        .unwrap_or(0);

    let mut sheets = Vec::with_capacity(sheet_count);
    for sheet_index in 0..sheet_count {
        sheets.push(render_sheet(
            sheet_index,
            placements,
            items,
            sources,
            settings,
        )?);
    }
    Ok(sheets)
}

/// Rasterize a single sheet. Items are blitted in placement order.
pub fn render_sheet(
    sheet_index: usize,
    placements: &[Placement],
    items: &[DesignItem],
    sources: &SourceImages,
    settings: &SheetSettings,
) -> Result<RasterSheet, RenderError> {
    let dpi = settings.dpi as f64;
    // Canvas size rounds up, placement offsets round down.
    let width_px = px_ceil(settings.roll_width_in, dpi);
    let height_px = px_ceil(settings.roll_height_in, dpi);

    let background = match settings.background_color.as_deref() {
        Some(hex) => parse_hex_color(hex)?,
        None => Rgba([0, 0, 0, 0]),
    };
    let border_color = match settings.border_color.as_deref() {
        Some(hex) => parse_hex_color(hex)?,
        None => Rgba([0, 0, 0, 255]),
    };

    let mut canvas = RgbaImage::from_pixel(width_px, height_px, background);

    // Scaled (and rotated) source rasters, reused across duplicate units.
    let mut scaled: HashMap<(usize, bool), RgbaImage> = HashMap::new();

    let margin = settings.border_margin_in();
    for placement in placements.iter().filter(|p| p.sheet_index == sheet_index) {
        let item = &items[placement.item_index];

        if settings.border {
            let (fw, fh) = placement.footprint_in(item, settings);
            draw_border(
                &mut canvas,
                px_floor(placement.x_in, dpi),
                px_floor(placement.y_in, dpi),
                px_round(fw, dpi),
                px_round(fh, dpi),
                settings.dpi,
                border_color,
            );
        }

        let raster = match scaled.entry((placement.item_index, placement.rotated90)) {
            std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
            std::collections::hash_map::Entry::Vacant(e) => {
                e.insert(scale_item(item, placement.rotated90, dpi, sources)?)
            }
        };

        let x = px_floor(placement.x_in + margin, dpi) as i64;
        let y = px_floor(placement.y_in + margin, dpi) as i64;
        imageops::overlay(&mut canvas, raster, x, y);
    }

    let mut buffer = Vec::new();
    canvas
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|source| RenderError::Encode {
            sheet_index,
            source,
        })?;

    tracing::debug!(
        sheet_index,
        width_px,
        height_px,
        png_bytes = buffer.len(),
        "Sheet rendered"
    );

    Ok(RasterSheet {
        sheet_index,
        width_px,
        height_px,
        png: Bytes::from(buffer),
    })
}

/// Decode a source image and scale it anisotropically to the item's exact
/// print size in pixels, rotating 90 degrees afterwards when requested.
fn scale_item(
    item: &DesignItem,
    rotated90: bool,
    dpi: f64,
    sources: &SourceImages,
) -> Result<RgbaImage, RenderError> {
    let reference = item.source_image_ref.as_str();
    let data = sources
        .get(reference)
        .ok_or_else(|| RenderError::SourceImageUnavailable {
            reference: reference.to_string(),
            reason: "not fetched".to_string(),
        })?;

    let decoded = ImageReader::new(Cursor::new(data.as_ref()))
        .with_guessed_format()
        .map_err(|e| RenderError::SourceImageUnavailable {
            reference: reference.to_string(),
            reason: e.to_string(),
        })?
        .decode()
        .map_err(|e| RenderError::SourceImageUnavailable {
            reference: reference.to_string(),
            reason: e.to_string(),
        })?
        .to_rgba8();

    let target_w = px_round(item.width_in, dpi);
    let target_h = px_round(item.height_in, dpi);
    let resized = imageops::resize(
        &decoded,
        target_w,
        target_h,
        imageops::FilterType::Lanczos3,
    );

    Ok(if rotated90 {
        imageops::rotate90(&resized)
    } else {
        resized
    })
}

/// Stroke a rectangle outline at the footprint boundary. The stroke is
/// roughly 0.01" thick, at least one pixel.
fn draw_border(canvas: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, dpi: u32, color: Rgba<u8>) {
    let thickness = (dpi / 100).max(1);
    for inset in 0..thickness {
        let iw = w.saturating_sub(2 * inset);
        let ih = h.saturating_sub(2 * inset);
        if iw == 0 || ih == 0 {
            break;
        }
        let rect = Rect::at((x + inset) as i32, (y + inset) as i32).of_size(iw, ih);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}

fn px_ceil(inches: f64, dpi: f64) -> u32 {
    (inches * dpi).ceil().max(1.0) as u32
}

fn px_floor(inches: f64, dpi: f64) -> u32 {
    (inches * dpi).floor().max(0.0) as u32
}

fn px_round(inches: f64, dpi: f64) -> u32 {
    (inches * dpi).round().max(1.0) as u32
}
