//! Recruitment Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the recruitment export
//! workspace.
//!
//! # Overview
//!
//! - **Types**: the application aggregate handed to the export pipeline by the
//!   relational collaborator (application, candidate, profile, job offer,
//!   documents)
//! - **Error Handling**: shared error and result types
//! - **Checksums**: SHA-256 helpers for exported payloads
//! - **Logging**: tracing subscriber initialisation
//!
//! # Example
//!
//! ```no_run
//! use recruit_common::types::ApplicationSnapshot;
//!
//! fn load(raw: &[u8]) -> recruit_common::Result<()> {
//!     let snapshot = ApplicationSnapshot::from_json_slice(raw)?;
//!     println!("{} documents", snapshot.documents.len());
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{RecruitError, Result};
