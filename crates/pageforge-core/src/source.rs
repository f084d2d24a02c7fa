//! Request-scoped set of parsed source documents.
//!
//! Uploaded bytes are parsed exactly once per source index and the resulting
//! document handles are reused by every instruction in the request, so an
//! instruction list that pulls many pages from few files never re-parses.

use lopdf::{Document, ObjectId};

use crate::error::PageForgeError;

/// The parsed input documents available to one request, keyed by source index.
#[derive(Debug)]
pub struct SourceSet {
    sources: Vec<LoadedSource>,
}

#[derive(Debug)]
pub(crate) struct LoadedSource {
    pub(crate) doc: Document,
    /// Page object ids in document page order.
    pub(crate) pages: Vec<ObjectId>,
}

impl SourceSet {
    /// Parse every uploaded file, in order. Source index = position in `files`.
    pub fn load(files: &[Vec<u8>]) -> Result<Self, PageForgeError> {
        let mut sources = Vec::with_capacity(files.len());
        for (index, bytes) in files.iter().enumerate() {
            let doc = load_indexed(bytes, index)?;
            let pages = doc.get_pages().into_values().collect();
            sources.push(LoadedSource { doc, pages });
        }
        Ok(SourceSet { sources })
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn page_count(&self, source: usize) -> Option<usize> {
        self.sources.get(source).map(|s| s.pages.len())
    }

    pub(crate) fn loaded(&self, source: usize) -> Option<&LoadedSource> {
        self.sources.get(source)
    }
}

/// Parse one PDF, distinguishing "needs a password" from "unreadable".
pub fn load_document(bytes: &[u8]) -> Result<Document, PageForgeError> {
    let doc = Document::load_mem(bytes).map_err(|e| PageForgeError::Parse(e.to_string()))?;
    if doc.trailer.get(b"Encrypt").is_ok() {
        return Err(PageForgeError::PasswordRequired);
    }
    Ok(doc)
}

fn load_indexed(bytes: &[u8], index: usize) -> Result<Document, PageForgeError> {
    match load_document(bytes) {
        Ok(doc) => Ok(doc),
        Err(PageForgeError::Parse(e)) => Err(PageForgeError::Parse(format!(
            "source {}: {}",
            index, e
        ))),
        Err(other) => Err(other),
    }
}
