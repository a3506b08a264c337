//! Revision-block stamping engine for engineering drawing PDFs
//!
//! This crate holds the document-format-independent core: it classifies
//! existing markup annotations by their implicit approval-state color,
//! resolves the next free row of the fixed-geometry revision table, and
//! composes both into the lifecycle operations (stamp a new revision row,
//! accept pending rows, relabel pending content).
//!
//! All access to the underlying document goes through the [`DrawingPage`]
//! trait; the lopdf-backed implementation lives in `revstamp-pdf`.

pub mod annotation;
pub mod classify;
pub mod error;
pub mod geometry;
pub mod label;
pub mod layout;
pub mod lifecycle;
pub mod page;
pub mod patterns;
pub mod richtext;

pub use annotation::{
    Annotation, AnnotationKind, AnnotationPatch, NewAnnotation, Rect, SubjectTag,
};
pub use classify::{classify_color, classify_content, ColorState, ContentCategory};
pub use error::EngineError;
pub use geometry::{detect_profile, next_free_row, FreeRow};
pub use label::RevisionLabel;
pub use layout::{profile_config, LayoutConfig, LayoutProfile, SignatureCell};
pub use lifecycle::{
    accept_revisions, stamp_new_revision, update_content_by_pattern, SignatureImage,
    SignatureSet, StampRequest,
};
pub use page::DrawingPage;
