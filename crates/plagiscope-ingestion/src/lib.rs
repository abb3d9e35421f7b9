//! plagiscope-ingestion: Getting text into a check.
//! - Document and reference file extraction (PDF via lopdf, plain text)
//! - The ordered reference store the user edits

pub mod extraction;
pub mod references;

pub use extraction::{extract_text, extract_text_async, DocumentFormat, UploadedFile};
pub use references::{ReferenceField, ReferenceStore};
