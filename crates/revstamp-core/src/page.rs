//! Accessor seam between the engine and the underlying document

use crate::annotation::{Annotation, AnnotationPatch, NewAnnotation, Rect};
use crate::error::EngineError;
use crate::lifecycle::SignatureImage;

/// One page of an open drawing document, as the engine sees it.
///
/// Implemented by `revstamp-pdf` over lopdf; core tests use an in-memory
/// page. All methods surface accessor problems as
/// [`EngineError::Accessor`].
pub trait DrawingPage {
    /// Snapshot of the page's markup annotations, in document order. The
    /// returned `id`s index into this order and stay valid for patches
    /// applied within the same operation.
    fn annotations(&self) -> Result<Vec<Annotation>, EngineError>;

    /// Plain text extractable from within `rect`, empty when the region
    /// holds none.
    fn extract_text(&self, rect: &Rect) -> Result<String, EngineError>;

    fn add_annotation(&mut self, annot: NewAnnotation) -> Result<(), EngineError>;

    fn apply_patch(&mut self, patch: AnnotationPatch) -> Result<(), EngineError>;

    fn place_signature(&mut self, rect: Rect, image: &SignatureImage)
        -> Result<(), EngineError>;
}
