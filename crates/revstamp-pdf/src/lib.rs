//! lopdf-backed document accessor for the revision-block engine
//!
//! `revstamp-core` is format-independent and works against the
//! [`DrawingPage`] trait; this crate realizes that trait over lopdf
//! documents and exposes the document-level operations a drawing workflow
//! calls: stamp a revision row, accept pending markup, relabel pending
//! content, and copy pending markup between drawings.
//!
//! The document-level functions reduce failures to `bool`/`Option` and log
//! the underlying error with `tracing`; callers that need the error itself
//! use [`RevisionDocument`] and the core operations directly.

use std::path::Path;

use revstamp_core::{
    accept_revisions, classify_color, stamp_new_revision, update_content_by_pattern, ColorState,
    DrawingPage, EngineError, StampRequest,
};
use tracing::warn;

mod annots;
mod document;
mod signature;
mod textrect;

pub use annots::PdfDrawingPage;
pub use document::RevisionDocument;
pub use textrect::extract_text_in_rect;

/// Stamp a new pending revision row into `source`, writing the result to
/// `dest`. Returns `false` when the table is full or the document cannot be
/// processed.
pub fn stamp_revision(
    source: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    request: &StampRequest,
) -> bool {
    match try_stamp_revision(source.as_ref(), dest.as_ref(), request) {
        Ok(()) => true,
        Err(err) => {
            warn!(source = %source.as_ref().display(), %err, "stamp_revision failed");
            false
        }
    }
}

fn try_stamp_revision(
    source: &Path,
    dest: &Path,
    request: &StampRequest,
) -> Result<(), EngineError> {
    let mut doc = RevisionDocument::open(source, dest)?;
    let page_id = doc.first_page()?;
    let mut page = PdfDrawingPage::new(doc.doc_mut(), page_id);
    stamp_new_revision(&mut page, request)?;
    doc.commit()
}

/// Recolor every pending annotation in `source` to the accepted color,
/// writing the result to `dest`.
pub fn accept_pending(source: impl AsRef<Path>, dest: impl AsRef<Path>) -> bool {
    match try_accept_pending(source.as_ref(), dest.as_ref()) {
        Ok(_) => true,
        Err(err) => {
            warn!(source = %source.as_ref().display(), %err, "accept_pending failed");
            false
        }
    }
}

fn try_accept_pending(source: &Path, dest: &Path) -> Result<usize, EngineError> {
    let mut doc = RevisionDocument::open(source, dest)?;
    let page_id = doc.first_page()?;
    let mut page = PdfDrawingPage::new(doc.doc_mut(), page_id);
    let touched = accept_revisions(&mut page, ColorState::Pending, ColorState::Accepted)?;
    doc.commit()?;
    Ok(touched)
}

/// Replace the content of pending annotations in `source` that match the
/// grammar `new_content` satisfies, writing the result to `dest`.
pub fn relabel_pending(
    source: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    new_content: &str,
) -> bool {
    match try_relabel_pending(source.as_ref(), dest.as_ref(), new_content) {
        Ok(_) => true,
        Err(err) => {
            warn!(source = %source.as_ref().display(), %err, "relabel_pending failed");
            false
        }
    }
}

fn try_relabel_pending(
    source: &Path,
    dest: &Path,
    new_content: &str,
) -> Result<usize, EngineError> {
    let mut doc = RevisionDocument::open(source, dest)?;
    let page_id = doc.first_page()?;
    let mut page = PdfDrawingPage::new(doc.doc_mut(), page_id);
    let touched = update_content_by_pattern(&mut page, new_content)?;
    doc.commit()?;
    Ok(touched)
}

/// Copy every pending annotation from the first page of `source` onto the
/// first page of `dest`, writing the merged document to `out`. Used when a
/// revised drawing supersedes an older sheet that still carries open markup.
pub fn copy_pending_annotations(
    source: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    out: impl AsRef<Path>,
) -> bool {
    match try_copy_pending(source.as_ref(), dest.as_ref(), out.as_ref()) {
        Ok(_) => true,
        Err(err) => {
            warn!(source = %source.as_ref().display(), %err, "copy_pending_annotations failed");
            false
        }
    }
}

fn try_copy_pending(source: &Path, dest: &Path, out: &Path) -> Result<usize, EngineError> {
    let mut source_doc = RevisionDocument::open_for_read(source)?;
    let source_page_id = source_doc.first_page()?;
    let pending: Vec<lopdf::Dictionary> = {
        let page = PdfDrawingPage::new(source_doc.doc_mut(), source_page_id);
        let annots = page.annotations()?;
        annots
            .iter()
            .filter(|a| classify_color(a) == ColorState::Pending)
            .map(|a| page.annotation_object(a.id))
            .collect::<Result<_, _>>()?
    };

    let mut dest_doc = RevisionDocument::open(dest, out)?;
    let dest_page_id = dest_doc.first_page()?;
    let copied = pending.len();
    let mut page = PdfDrawingPage::new(dest_doc.doc_mut(), dest_page_id);
    for dict in &pending {
        page.adopt_annotation(source_doc.doc(), dict)?;
    }
    drop(page);
    dest_doc.commit()?;
    Ok(copied)
}

/// Number of annotations on the first page, or `None` when the document
/// cannot be read.
pub fn annotation_count(path: impl AsRef<Path>) -> Option<usize> {
    match try_annotation_count(path.as_ref()) {
        Ok(count) => Some(count),
        Err(err) => {
            warn!(path = %path.as_ref().display(), %err, "annotation_count failed");
            None
        }
    }
}

fn try_annotation_count(path: &Path) -> Result<usize, EngineError> {
    let mut doc = RevisionDocument::open_for_read(path)?;
    let page_id = doc.first_page()?;
    let page = PdfDrawingPage::new(doc.doc_mut(), page_id);
    Ok(page.annotations()?.len())
}
