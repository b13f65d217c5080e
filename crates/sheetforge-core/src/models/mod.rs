mod design;
mod gangsheet;
mod placement;
mod settings;

pub use design::DesignItem;
pub use gangsheet::{
    CreateGangsheetRequest, Gangsheet, GangsheetResponse, GangsheetStatus, ListGangsheetsQuery,
};
pub use placement::Placement;
pub use settings::SheetSettings;
