//! Color-state and content-category classification for annotations
//!
//! Free-text annotations carry their working color inside the retained
//! markup, so classification scans for the embedded color token. Line and
//! polygon marks store a color triple directly; those are matched against
//! the two reference colors by squared-Euclidean distance in the 0-255 cube.

use crate::annotation::{Annotation, AnnotationKind};
use crate::patterns::{BLACK_TOKEN, CHANGE_REQUEST, HIGH_RED_TOKEN, REVISION_LABEL};

/// Reference color for pending (newly proposed) markup.
pub const PENDING_RGB: [i32; 3] = [255, 0, 0];
/// Reference color for formally accepted markup.
pub const ACCEPTED_RGB: [i32; 3] = [0, 0, 0];
/// Distance tolerance in the 0-255 RGB cube.
pub const COLOR_TOLERANCE: i32 = 20;

/// Approval state inferred from an annotation's color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorState {
    Pending,
    Accepted,
    Unknown,
}

impl ColorState {
    /// Hex token used when regenerating markup in this state.
    pub fn hex(&self) -> Option<&'static str> {
        match self {
            ColorState::Pending => Some("#FF0000"),
            ColorState::Accepted => Some(BLACK_TOKEN),
            ColorState::Unknown => None,
        }
    }

    /// Color triple in [0, 1] used for appearance descriptors.
    pub fn rgb(&self) -> Option<[f32; 3]> {
        self.hex().map(crate::richtext::parse_hex_color)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCategory {
    RevisionLabel,
    ChangeRequest,
    Other,
}

/// Whether two colors are within `tolerance` of each other, comparing
/// squared distances to avoid the square root.
pub fn colors_within_tolerance(a: [i32; 3], b: [i32; 3], tolerance: i32) -> bool {
    let dist_sq: i32 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum();
    dist_sq <= tolerance * tolerance
}

fn scale_to_rgb(color: [f32; 3]) -> [i32; 3] {
    [
        (color[0] * 255.0).round() as i32,
        (color[1] * 255.0).round() as i32,
        (color[2] * 255.0).round() as i32,
    ]
}

/// Infer the approval state of a single annotation. Missing color data
/// classifies Unknown, never an error.
pub fn classify_color(annot: &Annotation) -> ColorState {
    match annot.kind {
        AnnotationKind::FreeTextNote => match annot.rich_text.as_deref() {
            Some(markup) if HIGH_RED_TOKEN.is_match(markup) => ColorState::Pending,
            Some(markup) if markup.contains(BLACK_TOKEN) => ColorState::Accepted,
            _ => ColorState::Unknown,
        },
        AnnotationKind::LineMark | AnnotationKind::PolygonMark => match annot.color {
            Some(triple) => {
                let rgb = scale_to_rgb(triple);
                if colors_within_tolerance(rgb, PENDING_RGB, COLOR_TOLERANCE) {
                    ColorState::Pending
                } else if colors_within_tolerance(rgb, ACCEPTED_RGB, COLOR_TOLERANCE) {
                    ColorState::Accepted
                } else {
                    ColorState::Unknown
                }
            }
            None => ColorState::Unknown,
        },
    }
}

pub fn classify_content(text: &str) -> ContentCategory {
    if REVISION_LABEL.is_match(text) {
        ContentCategory::RevisionLabel
    } else if CHANGE_REQUEST.is_match(text) {
        ContentCategory::ChangeRequest
    } else {
        ContentCategory::Other
    }
}

/// Annotations classified as `target`. Unknown classifications never match,
/// so an annotation with missing color data is excluded rather than guessed.
pub fn filter_by_color(annots: &[Annotation], target: ColorState) -> Vec<&Annotation> {
    annots
        .iter()
        .filter(|a| classify_color(a) == target)
        .collect()
}

/// Annotations whose plain content fully matches `category`'s grammar.
pub fn filter_by_content(annots: &[Annotation], category: ContentCategory) -> Vec<&Annotation> {
    annots
        .iter()
        .filter(|a| classify_content(&a.contents) == category)
        .collect()
}
