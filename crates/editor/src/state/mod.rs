pub mod inventory;
pub mod settings;

pub use inventory::{Contents, Inventory, LoadReport, Removed};
pub use settings::{EditorSettings, PlacementSettings};
