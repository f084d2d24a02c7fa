//! Output packaging.
//!
//! Exactly one assembled document is returned as raw PDF bytes; two or more
//! are bundled into a ZIP archive whose entry order matches output order.

use std::io::{Cursor, Write};

use lopdf::Document;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::PageForgeError;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const ZIP_CONTENT_TYPE: &str = "application/zip";

/// A response-ready packaging of one or more assembled documents.
#[derive(Debug, Clone)]
pub struct PackagedOutput {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub filename: String,
}

/// Compress and serialize one document to PDF bytes.
pub fn serialize_document(doc: &mut Document) -> Result<Vec<u8>, PageForgeError> {
    doc.compress();
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PageForgeError::Operation(format!("failed to save PDF: {}", e)))?;
    Ok(buffer)
}

/// Package named outputs into a single response body.
///
/// `archive_name` is only used when the fan-out produces an archive; a single
/// output keeps its own name and the PDF content type regardless of size.
pub fn pack(
    mut outputs: Vec<(String, Document)>,
    archive_name: &str,
) -> Result<PackagedOutput, PageForgeError> {
    if outputs.is_empty() {
        return Err(PageForgeError::Operation(
            "no documents to package".into(),
        ));
    }

    if outputs.len() == 1 {
        let (name, mut doc) = outputs.remove(0);
        let bytes = serialize_document(&mut doc)?;
        return Ok(PackagedOutput {
            bytes,
            content_type: PDF_CONTENT_TYPE,
            filename: name,
        });
    }

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, mut doc) in outputs {
        let bytes = serialize_document(&mut doc)?;
        writer
            .start_file(name, options)
            .map_err(|e| PageForgeError::Operation(format!("failed to add archive entry: {}", e)))?;
        writer
            .write_all(&bytes)
            .map_err(|e| PageForgeError::Operation(format!("failed to write archive entry: {}", e)))?;
    }
    let cursor = writer
        .finish()
        .map_err(|e| PageForgeError::Operation(format!("failed to finish archive: {}", e)))?;

    Ok(PackagedOutput {
        bytes: cursor.into_inner(),
        content_type: ZIP_CONTENT_TYPE,
        filename: archive_name.to_string(),
    })
}
