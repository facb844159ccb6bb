pub mod export;

pub use export::{ExportApplicationCommand, ExportApplicationError, ExportApplicationResponse};
