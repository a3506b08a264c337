//! Lifecycle operations over one drawing page
//!
//! These compose the geometry resolver, the classifier and the markup
//! generators into the three operations a revision workflow needs: stamp a
//! new pending row, accept pending markup, and relabel pending content that
//! matches a recognized grammar.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::annotation::{
    Annotation, AnnotationKind, AnnotationPatch, NewAnnotation, Rect, SubjectTag,
};
use crate::classify::{classify_color, classify_content, ColorState, ContentCategory};
use crate::error::EngineError;
use crate::geometry::{detect_profile, next_free_row};
use crate::label::RevisionLabel;
use crate::layout::profile_config;
use crate::page::DrawingPage;
use crate::richtext::{
    default_appearance, default_style, font_size_from_markup, render_markup,
    render_revision_block_markup, DEFAULT_FONT_SIZE,
};

/// Signature image for one title-block cell; PNG bytes as captured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureImage {
    pub png: Vec<u8>,
}

/// Optional signature images for the author, checker and approver cells.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignatureSet {
    pub author: Option<SignatureImage>,
    pub checker: Option<SignatureImage>,
    pub approver: Option<SignatureImage>,
}

impl SignatureSet {
    /// Cell order matches `LayoutConfig::cells`.
    fn as_array(&self) -> [Option<&SignatureImage>; 3] {
        [
            self.author.as_ref(),
            self.checker.as_ref(),
            self.approver.as_ref(),
        ]
    }
}

/// Everything needed to stamp one revision row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StampRequest {
    pub label: RevisionLabel,
    pub date: String,
    pub author: String,
    pub checker: String,
    pub department: String,
    pub reason: String,
    pub approver: String,
    #[serde(default)]
    pub signatures: SignatureSet,
}

impl StampRequest {
    /// Fixed-column row text, matching the ruled cells of the table.
    fn row_text(&self) -> String {
        format!(
            "{}  {}  {}  {}  {}  {}  {}",
            self.label,
            self.date,
            self.author,
            self.checker,
            self.department,
            self.reason,
            self.approver
        )
    }
}

/// Current time as a PDF date string.
fn pdf_now() -> String {
    format!("D:{}+00'00'", Utc::now().format("%Y%m%d%H%M%S"))
}

/// Stamp a new pending revision row into the next free row of the table.
/// Fails with [`EngineError::TableFull`] (creating nothing) when every row
/// is occupied.
pub fn stamp_new_revision(
    page: &mut dyn DrawingPage,
    request: &StampRequest,
) -> Result<(), EngineError> {
    let profile = detect_profile(&*page);
    let cfg = profile_config(profile);
    let slot = next_free_row(&*page, cfg);
    if slot.table_full {
        return Err(EngineError::TableFull);
    }

    // stamped rows always start out pending
    let hex = "#FF0000";
    let rgb = [1.0, 0.0, 0.0];
    let text = request.row_text();
    let now = pdf_now();
    page.add_annotation(NewAnnotation {
        rect: Rect::new(cfg.origin_x, slot.y, cfg.block_width, cfg.row_height),
        contents: text.clone(),
        rich_text: render_revision_block_markup(DEFAULT_FONT_SIZE, hex, &text),
        default_appearance: default_appearance(DEFAULT_FONT_SIZE, rgb),
        default_style: default_style(DEFAULT_FONT_SIZE, hex),
        subject: SubjectTag::RevisionRow,
        author: request.author.clone(),
        created: now,
    })?;

    for (cell, image) in cfg.cells.iter().zip(request.signatures.as_array()) {
        if let Some(image) = image {
            page.place_signature(cfg.cell_rect(slot.y, cell), image)?;
        }
    }

    debug!(label = %request.label, row = slot.index, ?profile, "stamped revision row");
    Ok(())
}

/// Recolor every annotation currently classified as `from` to `to`,
/// preserving content and rectangle. Free-text annotations get their markup
/// and appearance regenerated; line and polygon marks get their color triple
/// replaced. Returns the number of annotations touched.
pub fn accept_revisions(
    page: &mut dyn DrawingPage,
    from: ColorState,
    to: ColorState,
) -> Result<usize, EngineError> {
    let annots = page.annotations()?;
    let matched: Vec<Annotation> = annots
        .into_iter()
        .filter(|a| classify_color(a) == from)
        .collect();

    let mut touched = 0;
    for annot in &matched {
        let patch = match annot.kind {
            AnnotationKind::FreeTextNote => regenerate_free_text(annot, to, None),
            AnnotationKind::LineMark | AnnotationKind::PolygonMark => {
                to.rgb().map(|rgb| {
                    let mut patch = AnnotationPatch::new(annot.id);
                    patch.color = Some(rgb);
                    patch.modified = Some(pdf_now());
                    patch
                })
            }
        };
        let Some(patch) = patch else { continue };
        page.apply_patch(patch)?;
        touched += 1;
    }
    debug!(?from, ?to, touched, "recolored annotations");
    Ok(touched)
}

/// Regenerated markup patch for a free-text annotation in color `state`,
/// optionally replacing its content. The revision-block row subject keeps
/// its spacer paragraph; every other subject gets the plain fragment.
fn regenerate_free_text(
    annot: &Annotation,
    state: ColorState,
    new_contents: Option<&str>,
) -> Option<AnnotationPatch> {
    let hex = state.hex()?;
    let rgb = state.rgb()?;
    let size = annot
        .rich_text
        .as_deref()
        .and_then(font_size_from_markup)
        .unwrap_or(DEFAULT_FONT_SIZE);
    let text = new_contents
        .unwrap_or(&annot.contents)
        .trim_end_matches(' ')
        .to_string();
    let rich_text = match annot.subject {
        SubjectTag::RevisionRow => render_revision_block_markup(size, hex, &text),
        SubjectTag::Textbox | SubjectTag::Typewriter | SubjectTag::Unspecified => {
            render_markup(size, hex, &text)
        }
    };

    let mut patch = AnnotationPatch::new(annot.id);
    patch.contents = new_contents.map(|_| text);
    patch.rich_text = Some(rich_text);
    patch.default_appearance = Some(default_appearance(size, rgb));
    patch.default_style = Some(default_style(size, hex));
    // The modification date advances even when the visible text is
    // unchanged, so repeating an update yields byte-different output.
    patch.modified = Some(pdf_now());
    Some(patch)
}

/// Replace the content of pending annotations matching the grammar that
/// `new_content` satisfies. Content matching no recognized grammar is a
/// controlled no-op, not an error. Rectangle and subject are untouched.
pub fn update_content_by_pattern(
    page: &mut dyn DrawingPage,
    new_content: &str,
) -> Result<usize, EngineError> {
    let category = classify_content(new_content);
    if category == ContentCategory::Other {
        debug!(new_content, "content matches no recognized grammar, skipping");
        return Ok(0);
    }

    let annots = page.annotations()?;
    let mut touched = 0;
    for annot in annots
        .iter()
        .filter(|a| a.kind == AnnotationKind::FreeTextNote)
    {
        if classify_color(annot) != ColorState::Pending {
            continue;
        }
        if classify_content(&annot.contents) != category {
            continue;
        }
        if let Some(patch) = regenerate_free_text(annot, ColorState::Pending, Some(new_content)) {
            page.apply_patch(patch)?;
            touched += 1;
        }
    }
    debug!(?category, touched, "replaced pending content");
    Ok(touched)
}
