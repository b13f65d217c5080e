use sheetforge_core::models::{DesignItem, Placement, SheetSettings};
use std::cmp::Ordering;
use thiserror::Error;
use uuid::Uuid;

/// Tolerance for inch arithmetic; placements are compared against sheet
/// bounds after repeated additions of gaps and footprints.
const EPS: f64 = 1e-9;

#[derive(Debug, Error)]
pub enum PackingError {
    #[error("no design items to place")]
    EmptyInput,

    #[error("invalid sheet settings: {0}")]
    InvalidSettings(String),

    #[error(
        "design item for order {order_id} ({width_in}\" x {height_in}\") \
         cannot fit on a {roll_width_in}\" x {roll_height_in}\" sheet"
    )]
    ItemTooLarge {
        order_id: Uuid,
        width_in: f64,
        height_in: f64,
        roll_width_in: f64,
        roll_height_in: f64,
    },
}

/// Result of packing: one placement per placement unit, grouped by sheet.
#[derive(Debug, Clone)]
pub struct Packing {
    pub placements: Vec<Placement>,
    pub sheet_count: usize,
}

impl Packing {
    pub fn placements_on(&self, sheet_index: usize) -> impl Iterator<Item = &Placement> {
        self.placements
            .iter()
            .filter(move |p| p.sheet_index == sheet_index)
    }
}

/// One physical copy of a design item, carrying its unrotated print size.
#[derive(Debug, Clone, Copy)]
struct Unit {
    item_index: usize,
    width_in: f64,
    height_in: f64,
}

/// Compute a packing for the given design items.
///
/// Each item expands to `quantity` independent units. Every unit receives
/// exactly one placement or the call fails as a whole; no unit is silently
/// dropped.
pub fn pack(items: &[DesignItem], settings: &SheetSettings) -> Result<Packing, PackingError> {
    settings
        .validate()
        .map_err(|e| PackingError::InvalidSettings(e.to_string()))?;

    for item in items {
        if !item.width_in.is_finite()
            || !item.height_in.is_finite()
            || item.width_in <= 0.0
            || item.height_in <= 0.0
        {
            return Err(PackingError::InvalidSettings(format!(
                "design item for order {} has invalid print size {}\" x {}\"",
                item.order_id, item.width_in, item.height_in
            )));
        }
    }

    let mut units = flatten(items);
    if units.is_empty() {
        return Err(PackingError::EmptyInput);
    }

    let gap = settings.gap_in;
    let edge = settings.edge_margin_in();
    let margin2 = 2.0 * settings.border_margin_in();
    let max_x = settings.roll_width_in - edge;
    let max_y = settings.roll_height_in - edge;
    let usable_w = settings.roll_width_in - 2.0 * edge;
    let usable_h = settings.roll_height_in - 2.0 * edge;

    // Fail fast on any unit that could never be placed, even on an empty
    // sheet (rotation is only an option under auto-arrange).
    for unit in &units {
        let (w, h) = (unit.width_in + margin2, unit.height_in + margin2);
        let fits_sheet = |w: f64, h: f64| w <= usable_w + EPS && h <= usable_h + EPS;
        if !fits_sheet(w, h) && !(settings.auto_arrange && fits_sheet(h, w)) {
            return Err(PackingError::ItemTooLarge {
                order_id: items[unit.item_index].order_id,
                width_in: unit.width_in,
                height_in: unit.height_in,
                roll_width_in: settings.roll_width_in,
                roll_height_in: settings.roll_height_in,
            });
        }
    }

    if settings.auto_arrange {
        // Height descending, ties by width descending; stable sort keeps the
        // remaining order deterministic. Reduces shelf fragmentation.
        units.sort_by(|a, b| {
            b.height_in
                .partial_cmp(&a.height_in)
                .unwrap_or(Ordering::Equal)
                .then(b.width_in.partial_cmp(&a.width_in).unwrap_or(Ordering::Equal))
        });
    }

    let cap = settings.max_designs_per_sheet_count.map(|c| c as usize);

    let mut placements = Vec::with_capacity(units.len());
    let mut sheet_index = 0usize;
    let mut shelf_y = edge;
    let mut shelf_height = 0.0f64;
    let mut cursor_x = edge;
    let mut items_on_sheet = 0usize;

    for unit in &units {
        let eff_w = unit.width_in + margin2;
        let eff_h = unit.height_in + margin2;

        loop {
            let cap_reached = cap.is_some_and(|c| items_on_sheet >= c);

            if !cap_reached {
                if let Some((w, h, rotated)) = fit_orientation(
                    eff_w,
                    eff_h,
                    cursor_x,
                    shelf_y,
                    shelf_height,
                    max_x,
                    max_y,
                    settings.auto_arrange,
                ) {
                    placements.push(Placement {
                        item_index: unit.item_index,
                        sheet_index,
                        x_in: cursor_x,
                        y_in: shelf_y,
                        rotated90: rotated,
                    });
                    cursor_x += w + gap;
                    if h > shelf_height {
                        shelf_height = h;
                    }
                    items_on_sheet += 1;
                    break;
                }

                if shelf_height > 0.0 {
                    // The open shelf cannot take this unit; start a new shelf
                    // below it and retry on the same sheet.
                    shelf_y += shelf_height + gap;
                    cursor_x = edge;
                    shelf_height = 0.0;
                    continue;
                }
            }

            // Sheet exhausted, by height or by the per-sheet cap.
            if items_on_sheet == 0 && shelf_y <= edge + EPS {
                // Empty sheet and still no fit; unreachable after the upfront
                // size check, kept as a hard stop instead of looping.
                return Err(PackingError::ItemTooLarge {
                    order_id: items[unit.item_index].order_id,
                    width_in: unit.width_in,
                    height_in: unit.height_in,
                    roll_width_in: settings.roll_width_in,
                    roll_height_in: settings.roll_height_in,
                });
            }
            sheet_index += 1;
            shelf_y = edge;
            shelf_height = 0.0;
            cursor_x = edge;
            items_on_sheet = 0;
        }
    }

    tracing::debug!(
        units = units.len(),
        sheets = sheet_index + 1,
        auto_arrange = settings.auto_arrange,
        "Packing computed"
    );

    Ok(Packing {
        placements,
        sheet_count: sheet_index + 1,
    })
}

fn flatten(items: &[DesignItem]) -> Vec<Unit> {
    let mut units = Vec::new();
    for (item_index, item) in items.iter().enumerate() {
        for _ in 0..item.quantity {
            units.push(Unit {
                item_index,
                width_in: item.width_in,
                height_in: item.height_in,
            });
        }
    }
    units
}

/// Pick an orientation for a unit of effective size `eff_w` x `eff_h` placed
/// at `(cursor_x, shelf_y)`, or `None` if neither orientation fits the open
/// shelf. Rotation is only considered under auto-arrange; when both
/// orientations fit an already-open shelf, the one wasting less shelf height
/// wins (growing the shelf counts as waste), ties keep the unrotated one.
#[allow(clippy::too_many_arguments)]
fn fit_orientation(
    eff_w: f64,
    eff_h: f64,
    cursor_x: f64,
    shelf_y: f64,
    shelf_height: f64,
    max_x: f64,
    max_y: f64,
    auto_arrange: bool,
) -> Option<(f64, f64, bool)> {
    let fits = |w: f64, h: f64| cursor_x + w <= max_x + EPS && shelf_y + h <= max_y + EPS;

    let unrotated = fits(eff_w, eff_h);
    if !auto_arrange {
        return unrotated.then_some((eff_w, eff_h, false));
    }

    let rotated = fits(eff_h, eff_w);
    match (unrotated, rotated) {
        (false, false) => None,
        (true, false) => Some((eff_w, eff_h, false)),
        (false, true) => Some((eff_h, eff_w, true)),
        (true, true) => {
            if shelf_height > 0.0 {
                let waste = |h: f64| (shelf_height - h).abs();
                if waste(eff_w) + EPS < waste(eff_h) {
                    return Some((eff_h, eff_w, true));
                }
            }
            Some((eff_w, eff_h, false))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(width_in: f64, height_in: f64, quantity: u32) -> DesignItem {
        DesignItem {
            source_image_ref: format!("designs/{}x{}.png", width_in, height_in),
            width_in,
            height_in,
            quantity,
            order_id: Uuid::new_v4(),
        }
    }

    fn settings() -> SheetSettings {
        SheetSettings {
            roll_width_in: 22.0,
            roll_height_in: 72.0,
            dpi: 300,
            gap_in: 0.25,
            border: false,
            border_size_in: 0.0,
            border_color: None,
            background_color: None,
            auto_arrange: false,
            max_designs_per_sheet_count: None,
        }
    }

    /// Check the non-overlap invariant: no two footprints on the same sheet
    /// intersect once each is inflated by gap/2 on all sides.
    fn assert_no_overlap(packing: &Packing, items: &[DesignItem], settings: &SheetSettings) {
        let half_gap = settings.gap_in / 2.0;
        for (i, a) in packing.placements.iter().enumerate() {
            for b in packing.placements.iter().skip(i + 1) {
                if a.sheet_index != b.sheet_index {
                    continue;
                }
                let (aw, ah) = a.footprint_in(&items[a.item_index], settings);
                let (bw, bh) = b.footprint_in(&items[b.item_index], settings);
                let separated = a.x_in + aw + half_gap <= b.x_in - half_gap + EPS
                    || b.x_in + bw + half_gap <= a.x_in - half_gap + EPS
                    || a.y_in + ah + half_gap <= b.y_in - half_gap + EPS
                    || b.y_in + bh + half_gap <= a.y_in - half_gap + EPS;
                assert!(
                    separated,
                    "placements overlap: {:?} ({}x{}) vs {:?} ({}x{})",
                    a, aw, ah, b, bw, bh
                );
            }
        }
    }

    /// Check the containment invariant: every footprint lies within the sheet.
    fn assert_contained(packing: &Packing, items: &[DesignItem], settings: &SheetSettings) {
        for p in &packing.placements {
            let (w, h) = p.footprint_in(&items[p.item_index], settings);
            assert!(p.x_in >= -EPS, "x_in negative: {:?}", p);
            assert!(p.y_in >= -EPS, "y_in negative: {:?}", p);
            assert!(
                p.x_in + w <= settings.roll_width_in + EPS,
                "footprint exceeds roll width: {:?}",
                p
            );
            assert!(
                p.y_in + h <= settings.roll_height_in + EPS,
                "footprint exceeds roll height: {:?}",
                p
            );
        }
    }

    #[test]
    fn test_three_small_items_share_one_shelf() {
        let items = vec![item(5.0, 5.0, 1), item(5.0, 5.0, 1), item(5.0, 5.0, 1)];
        let packing = pack(&items, &settings()).unwrap();

        assert_eq!(packing.sheet_count, 1);
        assert_eq!(packing.placements.len(), 3);
        for p in &packing.placements {
            assert_eq!(p.sheet_index, 0);
            assert_eq!(p.y_in, 0.25); // single shelf at the top edge margin
        }
        assert_no_overlap(&packing, &items, &settings());
        assert_contained(&packing, &items, &settings());
    }

    #[test]
    fn test_oversized_item_fails_without_partial_result() {
        let items = vec![item(5.0, 5.0, 1), item(10.0, 80.0, 1)];
        let err = pack(&items, &settings()).unwrap_err();
        assert!(matches!(err, PackingError::ItemTooLarge { .. }));
    }

    #[test]
    fn test_oversized_even_after_rotation() {
        let mut s = settings();
        s.auto_arrange = true;
        // 80" exceeds both 22" and 72", so rotation does not help.
        let items = vec![item(10.0, 80.0, 1)];
        assert!(matches!(
            pack(&items, &s).unwrap_err(),
            PackingError::ItemTooLarge { .. }
        ));
    }

    #[test]
    fn test_rotation_disallowed_without_auto_arrange() {
        let mut s = settings();
        s.auto_arrange = false;
        // Fits only rotated (30 > 22 unrotated, 5 x 30 rotated fits).
        let items = vec![item(30.0, 5.0, 1)];
        assert!(matches!(
            pack(&items, &s).unwrap_err(),
            PackingError::ItemTooLarge { .. }
        ));

        s.auto_arrange = true;
        let packing = pack(&items, &s).unwrap();
        assert!(packing.placements[0].rotated90);
    }

    #[test]
    fn test_per_sheet_cap_splits_sheets() {
        let mut s = settings();
        s.max_designs_per_sheet_count = Some(20);
        let items = vec![item(4.0, 4.0, 50)];
        let packing = pack(&items, &s).unwrap();

        assert_eq!(packing.sheet_count, 3);
        assert_eq!(packing.placements.len(), 50);
        assert_eq!(packing.placements_on(0).count(), 20);
        assert_eq!(packing.placements_on(1).count(), 20);
        assert_eq!(packing.placements_on(2).count(), 10);
        assert_no_overlap(&packing, &items, &s);
        assert_contained(&packing, &items, &s);
    }

    #[test]
    fn test_conservation_across_quantities() {
        let items = vec![item(3.0, 2.0, 7), item(6.0, 4.0, 3), item(2.0, 2.0, 5)];
        let packing = pack(&items, &settings()).unwrap();
        let total: u32 = items.iter().map(|i| i.quantity).sum();
        assert_eq!(packing.placements.len(), total as usize);

        // every item index accounted for with its exact multiplicity
        for (idx, it) in items.iter().enumerate() {
            let count = packing
                .placements
                .iter()
                .filter(|p| p.item_index == idx)
                .count();
            assert_eq!(count, it.quantity as usize);
        }
    }

    #[test]
    fn test_deterministic_output() {
        let items = vec![item(3.0, 5.0, 4), item(7.0, 2.0, 2), item(4.5, 4.5, 3)];
        let mut s = settings();
        s.auto_arrange = true;

        let a = pack(&items, &s).unwrap();
        let b = pack(&items, &s).unwrap();
        assert_eq!(a.placements, b.placements);
        assert_eq!(a.sheet_count, b.sheet_count);
    }

    #[test]
    fn test_rotation_reduces_shelf_waste() {
        let mut s = settings();
        s.roll_width_in = 20.0;
        s.roll_height_in = 20.0;
        s.gap_in = 0.0;
        s.auto_arrange = true;

        // Sorted order keeps the 2x6 first (taller); the 6x2 then rotates to
        // 2x6 to sit flush under the 6" shelf instead of wasting 4".
        let items = vec![item(2.0, 6.0, 1), item(6.0, 2.0, 1)];
        let packing = pack(&items, &s).unwrap();

        let six_by_two = packing
            .placements
            .iter()
            .find(|p| p.item_index == 1)
            .unwrap();
        assert!(six_by_two.rotated90);
        assert_eq!(six_by_two.y_in, 0.0);
        assert_no_overlap(&packing, &items, &s);
    }

    #[test]
    fn test_input_order_preserved_without_auto_arrange() {
        let items = vec![item(2.0, 2.0, 1), item(8.0, 8.0, 1), item(3.0, 3.0, 1)];
        let packing = pack(&items, &settings()).unwrap();
        let order: Vec<usize> = packing.placements.iter().map(|p| p.item_index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn test_auto_arrange_sorts_by_height_desc() {
        let mut s = settings();
        s.auto_arrange = true;
        let items = vec![item(2.0, 2.0, 1), item(8.0, 8.0, 1), item(3.0, 3.0, 1)];
        let packing = pack(&items, &s).unwrap();
        let order: Vec<usize> = packing.placements.iter().map(|p| p.item_index).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn test_overflow_to_second_sheet_by_height() {
        let mut s = settings();
        s.roll_width_in = 10.0;
        s.roll_height_in = 10.0;
        s.gap_in = 0.5;
        // Each unit takes a full shelf (9" wide of 9.0 usable); two shelves of
        // 4" plus gaps exhaust the 10" height, pushing the third unit over.
        let items = vec![item(8.0, 4.0, 3)];
        let packing = pack(&items, &s).unwrap();
        assert_eq!(packing.sheet_count, 2);
        assert_eq!(packing.placements_on(0).count(), 2);
        assert_eq!(packing.placements_on(1).count(), 1);
        assert_contained(&packing, &items, &s);
    }

    #[test]
    fn test_border_margin_inflates_footprints() {
        let mut s = settings();
        s.border = true;
        s.border_size_in = 0.5;
        s.roll_width_in = 10.0;
        s.roll_height_in = 12.0;
        s.gap_in = 0.25;

        // 4" + 2*0.5" = 5" effective; two across would need 10.25" with the
        // gap, so they stack on separate shelves.
        let items = vec![item(4.0, 4.0, 2)];
        let packing = pack(&items, &s).unwrap();
        assert_eq!(packing.sheet_count, 1);
        let ys: Vec<f64> = packing.placements.iter().map(|p| p.y_in).collect();
        assert_ne!(ys[0], ys[1]);
        assert_no_overlap(&packing, &items, &s);
        assert_contained(&packing, &items, &s);
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            pack(&[], &settings()).unwrap_err(),
            PackingError::EmptyInput
        ));
        // zero total quantity flattens to nothing as well, but quantity 0 is
        // rejected upstream by DesignItem::validate
    }

    #[test]
    fn test_invalid_settings() {
        let mut s = settings();
        s.dpi = 0;
        assert!(matches!(
            pack(&[item(1.0, 1.0, 1)], &s).unwrap_err(),
            PackingError::InvalidSettings(_)
        ));
    }

    #[test]
    fn test_gap_enforced_against_edges_without_border() {
        let items = vec![item(5.0, 5.0, 1)];
        let s = settings();
        let packing = pack(&items, &s).unwrap();
        let p = &packing.placements[0];
        assert_eq!(p.x_in, s.gap_in);
        assert_eq!(p.y_in, s.gap_in);
    }
}
