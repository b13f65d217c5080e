use crate::error::AppError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Layout configuration for one gangsheet run, either a tenant default or a
/// per-job override. A snapshot is frozen onto the gangsheet record at
/// submission time; later changes to tenant defaults never affect a running
/// or completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct SheetSettings {
    /// Sheet width in inches.
    pub roll_width_in: f64,
    /// Sheet height in inches.
    pub roll_height_in: f64,
    /// Pixels per inch for rasterization (typical 150/300/600).
    pub dpi: u32,
    /// Minimum spacing in inches between any two placed items, and between
    /// items and sheet edges when no border is set.
    pub gap_in: f64,
    /// When true, reserve `border_size_in` around every item and stroke an
    /// outline in `border_color`.
    pub border: bool,
    pub border_size_in: f64,
    /// Hex color ("#RRGGBB" or "#RRGGBBAA") for the item outline.
    pub border_color: Option<String>,
    /// Hex background color for the sheet canvas; `None` renders transparent.
    pub background_color: Option<String>,
    /// When true the layout engine may reorder and rotate items to reduce
    /// sheet count; when false items are placed in input order, unrotated.
    pub auto_arrange: bool,
    /// Optional cap on items per sheet, enforced even if space remains.
    pub max_designs_per_sheet_count: Option<u32>,
}

impl Default for SheetSettings {
    fn default() -> Self {
        // 22" x 72" DTF roll at 300 DPI, white background.
        Self {
            roll_width_in: 22.0,
            roll_height_in: 72.0,
            dpi: 300,
            gap_in: 0.25,
            border: false,
            border_size_in: 0.1,
            border_color: Some("#000000".to_string()),
            background_color: Some("#FFFFFF".to_string()),
            auto_arrange: true,
            max_designs_per_sheet_count: None,
        }
    }
}

impl SheetSettings {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(self.roll_width_in > 0.0) || !(self.roll_height_in > 0.0) {
            return Err(AppError::InvalidInput(format!(
                "Sheet dimensions must be positive, got {}\" x {}\"",
                self.roll_width_in, self.roll_height_in
            )));
        }
        if self.dpi == 0 {
            return Err(AppError::InvalidInput("DPI must be positive".to_string()));
        }
        if self.gap_in < 0.0 {
            return Err(AppError::InvalidInput(format!(
                "Gap must be non-negative, got {}\"",
                self.gap_in
            )));
        }
        if self.border && self.border_size_in < 0.0 {
            return Err(AppError::InvalidInput(format!(
                "Border size must be non-negative, got {}\"",
                self.border_size_in
            )));
        }
        if self.max_designs_per_sheet_count == Some(0) {
            return Err(AppError::InvalidInput(
                "Max designs per sheet must be positive when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Margin reserved around each item footprint; zero unless bordering is on.
    pub fn border_margin_in(&self) -> f64 {
        if self.border {
            self.border_size_in
        } else {
            0.0
        }
    }

    /// Spacing enforced against the sheet edges. The reserved border margin
    /// already keeps ink off the edge, so the gap only applies without one.
    pub fn edge_margin_in(&self) -> f64 {
        if self.border {
            0.0
        } else {
            self.gap_in
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(SheetSettings::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_dimensions() {
        let mut s = SheetSettings::default();
        s.roll_width_in = 0.0;
        assert!(s.validate().is_err());

        let mut s = SheetSettings::default();
        s.roll_height_in = -10.0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_dpi() {
        let mut s = SheetSettings::default();
        s.dpi = 0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_rejects_negative_gap() {
        let mut s = SheetSettings::default();
        s.gap_in = -0.1;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_sheet_cap() {
        let mut s = SheetSettings::default();
        s.max_designs_per_sheet_count = Some(0);
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_edge_margin_depends_on_border() {
        let mut s = SheetSettings::default();
        s.gap_in = 0.25;
        s.border = false;
        assert_eq!(s.edge_margin_in(), 0.25);
        assert_eq!(s.border_margin_in(), 0.0);

        s.border = true;
        s.border_size_in = 0.1;
        assert_eq!(s.edge_margin_in(), 0.0);
        assert_eq!(s.border_margin_in(), 0.1);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let s: SheetSettings = serde_json::from_str(r#"{"dpi": 150, "gap_in": 0.5}"#).unwrap();
        assert_eq!(s.dpi, 150);
        assert_eq!(s.gap_in, 0.5);
        assert_eq!(s.roll_width_in, 22.0);
    }
}
