//! Schema module - form definitions and their file format

mod types;
pub mod loader;

pub use types::*;
pub use loader::{export_schema, load_schema, load_values, save_schema};
