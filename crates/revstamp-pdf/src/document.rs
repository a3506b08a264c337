//! Source/destination document handle

use std::path::{Path, PathBuf};

use lopdf::{Document, ObjectId};
use revstamp_core::EngineError;

/// A drawing opened for revision work. Reads come from the source file;
/// [`RevisionDocument::commit`] writes the modified document to the
/// destination path given at open time.
pub struct RevisionDocument {
    doc: Document,
    dest: Option<PathBuf>,
}

impl RevisionDocument {
    /// Open `source` for editing, to be written to `dest` on commit.
    pub fn open(
        source: impl AsRef<Path>,
        dest: impl Into<PathBuf>,
    ) -> Result<Self, EngineError> {
        let doc = Document::load(source).map_err(EngineError::accessor)?;
        Ok(Self {
            doc,
            dest: Some(dest.into()),
        })
    }

    /// Open `source` without a destination. `commit` is unavailable; use
    /// [`RevisionDocument::save_to_mem`] or read-only accessors.
    pub fn open_for_read(source: impl AsRef<Path>) -> Result<Self, EngineError> {
        let doc = Document::load(source).map_err(EngineError::accessor)?;
        Ok(Self { doc, dest: None })
    }

    /// Parse an in-memory document. No destination is attached.
    pub fn load_mem(bytes: &[u8]) -> Result<Self, EngineError> {
        let doc = Document::load_mem(bytes).map_err(EngineError::accessor)?;
        Ok(Self { doc, dest: None })
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Object id of the first page. Revision blocks live on the drawing's
    /// single sheet, so this is the page every operation targets.
    pub fn first_page(&self) -> Result<ObjectId, EngineError> {
        self.doc
            .get_pages()
            .into_values()
            .next()
            .ok_or_else(|| EngineError::Accessor("document has no pages".into()))
    }

    /// Object id of a 1-based page number.
    pub fn page(&self, number: u32) -> Result<ObjectId, EngineError> {
        self.doc
            .get_pages()
            .get(&number)
            .copied()
            .ok_or_else(|| EngineError::Accessor(format!("document has no page {number}")))
    }

    /// Write the document to the destination path given at open time.
    pub fn commit(&mut self) -> Result<(), EngineError> {
        let dest = self
            .dest
            .clone()
            .ok_or_else(|| EngineError::Accessor("document opened without destination".into()))?;
        self.doc.save(dest).map_err(EngineError::accessor)?;
        Ok(())
    }

    /// Serialize the document to bytes.
    pub fn save_to_mem(&mut self) -> Result<Vec<u8>, EngineError> {
        let mut out = Vec::new();
        self.doc.save_to(&mut out).map_err(EngineError::accessor)?;
        Ok(out)
    }
}
