//! Factura Domain Layer
//!
//! This crate contains the value types shared by every other crate: the fixed
//! field vocabulary, tax identifiers, the extracted-fields/error-flags pair,
//! and the trait seam towards completion providers.
//!
//! ## Key Concepts
//!
//! - **Field**: one of ten invoice fields, named by its `pdf_*` wire name
//! - **Placeholder**: `"0"` / `0.0`, the "not found" convention
//! - **Tax ID**: an RFC-shaped token scanned from the raw invoice text
//! - **Error flags**: per-field booleans, true where the value is the placeholder
//!
//! ## Architecture
//!
//! - Only `serde` as an external dependency
//! - No I/O, no async runtime
//! - Infrastructure implementations live in other crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod field;
pub mod invoice;
pub mod traits;

// Re-exports for convenience
pub use field::{FieldName, PLACEHOLDER};
pub use invoice::{ErrorFlags, ExtractedFields, InvoiceExtraction, TaxId, TaxIdField};
pub use traits::CompletionProvider;
