//! Download archive assembly.
//!
//! A completed job is delivered as one zip holding every sheet PNG plus a
//! `manifest.json` describing where each ordered item landed.

use anyhow::{Context, Result};
use serde::Serialize;
use sheetforge_compose::RasterSheet;
use sheetforge_core::models::{DesignItem, Gangsheet, Placement};
use std::io::Write;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct Manifest {
    pub gangsheet_id: Uuid,
    pub name: String,
    pub settings: sheetforge_core::models::SheetSettings,
    pub sheets: Vec<ManifestSheet>,
}

#[derive(Debug, Serialize)]
pub struct ManifestSheet {
    pub file: String,
    pub width_px: u32,
    pub height_px: u32,
    pub placements: Vec<ManifestPlacement>,
}

/// One placed unit. `width_in`/`height_in` are the printed size, already
/// swapped when the unit is rotated; `x_in`/`y_in` locate the top-left of the
/// unit's footprint (item plus border frame).
#[derive(Debug, Serialize)]
pub struct ManifestPlacement {
    pub order_id: Uuid,
    pub source_image_ref: String,
    pub x_in: f64,
    pub y_in: f64,
    pub width_in: f64,
    pub height_in: f64,
    pub rotated90: bool,
}

pub fn build_manifest(
    gangsheet: &Gangsheet,
    sheets: &[RasterSheet],
    placements: &[Placement],
    items: &[DesignItem],
) -> Manifest {
    let sheets = sheets
        .iter()
        .map(|sheet| ManifestSheet {
            file: format!("sheet_{}.png", sheet.sheet_index + 1),
            width_px: sheet.width_px,
            height_px: sheet.height_px,
            placements: placements
                .iter()
                .filter(|p| p.sheet_index == sheet.sheet_index)
                .map(|p| {
                    let item = &items[p.item_index];
                    let (width_in, height_in) = if p.rotated90 {
                        (item.height_in, item.width_in)
                    } else {
                        (item.width_in, item.height_in)
                    };
                    ManifestPlacement {
                        order_id: item.order_id,
                        source_image_ref: item.source_image_ref.clone(),
                        x_in: p.x_in,
                        y_in: p.y_in,
                        width_in,
                        height_in,
                        rotated90: p.rotated90,
                    }
                })
                .collect(),
        })
        .collect();

    Manifest {
        gangsheet_id: gangsheet.id,
        name: gangsheet.name.clone(),
        settings: gangsheet.settings.clone(),
        sheets,
    }
}

/// Assemble the downloadable zip: every sheet PNG plus `manifest.json`.
pub fn build_archive(
    gangsheet: &Gangsheet,
    sheets: &[RasterSheet],
    placements: &[Placement],
    items: &[DesignItem],
) -> Result<Vec<u8>> {
    use zip::write::{FileOptions, ZipWriter};
    use zip::CompressionMethod;

    let manifest = build_manifest(gangsheet, sheets, placements, items);
    let manifest_json =
        serde_json::to_vec_pretty(&manifest).context("Failed to serialize manifest")?;

    let mut buffer = Vec::new();
    {
        let mut zip = ZipWriter::new(std::io::Cursor::new(&mut buffer));

        // PNG payloads are already compressed; store them as-is.
        let png_options = FileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .unix_permissions(0o644);
        let manifest_options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        for sheet in sheets {
            let filename = format!("sheet_{}.png", sheet.sheet_index + 1);
            zip.start_file(filename.as_str(), png_options)
                .with_context(|| format!("Failed to add file to ZIP: {}", filename))?;
            zip.write_all(&sheet.png)
                .with_context(|| format!("Failed to write file data to ZIP: {}", filename))?;
        }

        zip.start_file("manifest.json", manifest_options)
            .context("Failed to add manifest to ZIP")?;
        zip.write_all(&manifest_json)
            .context("Failed to write manifest to ZIP")?;

        zip.finish().context("Failed to finalize ZIP archive")?;
    }

    Ok(buffer)
}
