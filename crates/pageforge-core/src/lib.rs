//! Page-level PDF transformation engine.
//!
//! Every operation reduces to the same pipeline: parse uploads into a
//! [`SourceSet`], describe the desired output as an ordered list of
//! [`PageInstruction`]s, [`assemble`] a fresh document per list, and [`pack`]
//! the results into a single response body (raw PDF for one output, ZIP for
//! several). Split policies and watermarks are layers over that core.
//!
//! Indices are 0-based throughout the crate; 1-based client page numbers are
//! converted once, at the HTTP boundary.

pub mod assemble;
pub mod error;
pub mod instruction;
pub mod package;
pub mod partition;
pub mod source;
pub mod watermark;

pub use assemble::assemble;
pub use error::PageForgeError;
pub use instruction::{all_pages, PageInstruction};
pub use package::{
    pack, serialize_document, PackagedOutput, PDF_CONTENT_TYPE, ZIP_CONTENT_TYPE,
};
pub use partition::{partition, Partition, SplitPolicy};
pub use source::{load_document, SourceSet};
pub use watermark::{apply_watermark, Placement, TargetPages, WatermarkKind, WatermarkSpec};

/// Page count of a PDF without keeping the parsed document around.
pub fn page_count(bytes: &[u8]) -> Result<usize, PageForgeError> {
    Ok(load_document(bytes)?.get_pages().len())
}
