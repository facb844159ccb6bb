//! Star-schema export of submitted applications

pub mod export;
pub mod manifest;
pub mod paths;
pub mod star_schema;

pub use export::{content_type_for, EtlExportService, ExportError};
pub use manifest::{DocumentEntry, ExportManifest, WrittenRecord};
pub use paths::{build_document_key, build_key, validate_segment, EntityType, InvalidKeyError};
