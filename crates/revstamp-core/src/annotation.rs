//! Annotation snapshot and patch types exchanged with the document accessor

use serde::{Deserialize, Serialize};

/// Page-space rectangle with its origin at the lower-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y + self.height
    }

    pub fn expand(&self, margin: f64) -> Rect {
        Rect {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + 2.0 * margin,
            height: self.height + 2.0 * margin,
        }
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.top()
    }

    /// Whether `other` lies entirely inside this rectangle.
    pub fn contains(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.top() <= self.top()
    }
}

/// Index of an annotation within its page's annotation array.
pub type AnnotId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationKind {
    FreeTextNote,
    LineMark,
    PolygonMark,
}

/// The `Subj` tag carried by markup annotations. Stamped revision rows get
/// `RevisionRow`; interactive tools write `Textbox` or `Typewriter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubjectTag {
    Textbox,
    Typewriter,
    RevisionRow,
    Unspecified,
}

impl SubjectTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectTag::Textbox => "Textbox",
            SubjectTag::Typewriter => "Typewriter",
            SubjectTag::RevisionRow => "Revision Row",
            SubjectTag::Unspecified => "",
        }
    }

    pub fn parse(subject: &str) -> Self {
        match subject.trim() {
            "Textbox" => SubjectTag::Textbox,
            "Typewriter" => SubjectTag::Typewriter,
            "Revision Row" => SubjectTag::RevisionRow,
            _ => SubjectTag::Unspecified,
        }
    }
}

/// Read-side snapshot of a single page annotation.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub id: AnnotId,
    pub kind: AnnotationKind,
    pub rect: Rect,
    /// Plain content label, e.g. "A.02" or "FCR 123456".
    pub contents: String,
    /// Retained styled markup (the RC fragment), when present.
    pub rich_text: Option<String>,
    /// Stored stroke color triple in [0, 1], when present.
    pub color: Option<[f32; 3]>,
    pub subject: SubjectTag,
}

/// Write-side delta for one annotation. `None` fields are left untouched by
/// the accessor, so a patch never clobbers state the engine did not compute.
#[derive(Debug, Clone)]
pub struct AnnotationPatch {
    pub id: AnnotId,
    pub contents: Option<String>,
    pub rich_text: Option<String>,
    pub default_appearance: Option<String>,
    pub default_style: Option<String>,
    pub color: Option<[f32; 3]>,
    pub modified: Option<String>,
}

impl AnnotationPatch {
    pub fn new(id: AnnotId) -> Self {
        Self {
            id,
            contents: None,
            rich_text: None,
            default_appearance: None,
            default_style: None,
            color: None,
            modified: None,
        }
    }
}

/// Full description of a freshly stamped free-text row.
#[derive(Debug, Clone)]
pub struct NewAnnotation {
    pub rect: Rect,
    pub contents: String,
    pub rich_text: String,
    pub default_appearance: String,
    pub default_style: String,
    pub subject: SubjectTag,
    pub author: String,
    /// PDF date string, used for both creation and modification date.
    pub created: String,
}
