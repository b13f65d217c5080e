use crate::error::AppError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One physical piece to be printed.
///
/// Constructed per generation request by the design source and never mutated;
/// `quantity` expands to that many independent placement units during packing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DesignItem {
    /// Opaque reference to the source raster (URL or blob key).
    pub source_image_ref: String,
    /// Target print width in inches.
    pub width_in: f64,
    /// Target print height in inches.
    pub height_in: f64,
    /// Number of copies to place.
    pub quantity: u32,
    /// Owning order, used for traceability in the output manifest.
    pub order_id: Uuid,
}

impl DesignItem {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.source_image_ref.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "Design item for order {} has an empty source image reference",
                self.order_id
            )));
        }
        if !(self.width_in > 0.0) || !(self.height_in > 0.0) {
            return Err(AppError::InvalidInput(format!(
                "Design item for order {} has non-positive print size {}\" x {}\"",
                self.order_id, self.width_in, self.height_in
            )));
        }
        if self.quantity == 0 {
            return Err(AppError::InvalidInput(format!(
                "Design item for order {} has zero quantity",
                self.order_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> DesignItem {
        DesignItem {
            source_image_ref: "designs/front.png".to_string(),
            width_in: 5.0,
            height_in: 5.0,
            quantity: 2,
            order_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_valid_item() {
        assert!(item().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_quantity() {
        let mut it = item();
        it.quantity = 0;
        assert!(it.validate().is_err());
    }

    #[test]
    fn test_rejects_non_positive_size() {
        let mut it = item();
        it.width_in = 0.0;
        assert!(it.validate().is_err());

        let mut it = item();
        it.height_in = -1.0;
        assert!(it.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_ref() {
        let mut it = item();
        it.source_image_ref = String::new();
        assert!(it.validate().is_err());
    }
}
