use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageForgeError {
    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("Document is password-protected")]
    PasswordRequired,

    #[error("Invalid instruction: {0}")]
    InvalidInstruction(String),

    #[error("Page index {page} out of range for source {source_index} ({page_count} pages)")]
    PageOutOfRange {
        source_index: usize,
        page: usize,
        page_count: usize,
    },

    #[error("Invalid split parameters: {0}")]
    InvalidSplit(String),

    #[error("Invalid watermark parameters: {0}")]
    InvalidWatermark(String),

    #[error("PDF operation failed: {0}")]
    Operation(String),
}
