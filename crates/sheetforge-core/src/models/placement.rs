use crate::models::{DesignItem, SheetSettings};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Result of packing one placement unit (one physical copy of a design item).
///
/// `x_in`/`y_in` address the top-left corner of the unit's *effective
/// footprint*: the printed image plus the reserved border margin when
/// bordering is enabled. The compositor offsets the image blit by the border
/// margin and strokes the outline at the footprint boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Placement {
    /// Index into the design item slice the packing was computed from.
    pub item_index: usize,
    /// Zero-based index of the output sheet.
    pub sheet_index: usize,
    /// Top-left offset in inches within the sheet.
    pub x_in: f64,
    pub y_in: f64,
    /// True if the unit was rotated 90 degrees to fit.
    pub rotated90: bool,
}

impl Placement {
    /// Size in inches of the effective footprint this placement occupies:
    /// the item's print size (swapped when rotated) plus the reserved border
    /// margin on every side when bordering is enabled.
    pub fn footprint_in(&self, item: &DesignItem, settings: &SheetSettings) -> (f64, f64) {
        let margin = 2.0 * settings.border_margin_in();
        if self.rotated90 {
            (item.height_in + margin, item.width_in + margin)
        } else {
            (item.width_in + margin, item.height_in + margin)
        }
    }
}
