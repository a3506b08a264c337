//! Revision-block geometry resolver
//!
//! Decides which layout profile a page uses and where the next free row of
//! the revision table sits. The resolver never fails the caller: probe or
//! scan problems degrade to a best-guess position, and a full table is
//! reported as a flag for the lifecycle layer to reject.

use tracing::{debug, warn};

use crate::annotation::AnnotationKind;
use crate::layout::{profile_config, LayoutConfig, LayoutProfile};
use crate::page::DrawingPage;

/// Resolved placement for the next revision row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreeRow {
    /// Row index counted from the bottom of the block; equals the row count
    /// when the table is full.
    pub index: usize,
    /// Page-space y origin for the new row.
    pub y: f64,
    pub table_full: bool,
}

/// Detect the page's layout profile with the single probe rectangle.
/// Extractable text at the Normal profile's probe location means standard
/// margins; an empty probe means the wide-margin Small profile. A failing
/// probe falls back to Normal rather than failing the caller.
pub fn detect_profile(page: &dyn DrawingPage) -> LayoutProfile {
    let probe = &profile_config(LayoutProfile::Normal).probe;
    match page.extract_text(probe) {
        Ok(text) if !text.trim().is_empty() => {
            debug!(profile = ?LayoutProfile::Normal, "probe found title-block text");
            LayoutProfile::Normal
        }
        Ok(_) => {
            debug!(profile = ?LayoutProfile::Small, "probe region empty");
            LayoutProfile::Small
        }
        Err(err) => {
            warn!(error = %err, "profile probe failed, assuming standard margins");
            LayoutProfile::Normal
        }
    }
}

/// Find the first unoccupied row of the revision table, scanning row text
/// from the bottom upward and then sweeping free-text annotations that sit
/// inside the block without extractable text.
///
/// Rows are assumed packed without gaps, so the text scan stops at the first
/// empty row. A text-extraction failure mid-scan keeps the estimate built so
/// far instead of surfacing an error.
pub fn next_free_row(page: &dyn DrawingPage, cfg: &LayoutConfig) -> FreeRow {
    let mut next = 0usize;
    for index in 0..cfg.row_count {
        match page.extract_text(&cfg.row_rect(index)) {
            Ok(text) if !text.trim().is_empty() => next = index + 1,
            Ok(_) => break,
            Err(err) => {
                warn!(row = index, error = %err, "row scan failed, keeping current estimate");
                break;
            }
        }
    }

    // Some rows carry annotations without extractable text (overlapping
    // markup); advance past the row band of any such annotation.
    let bounds = cfg.block_bounds().expand(cfg.sweep_margin);
    let estimate_y = cfg.origin_y + next as f64 * (cfg.row_height + cfg.row_gap);
    match page.annotations() {
        Ok(annots) => {
            for annot in annots
                .iter()
                .filter(|a| a.kind == AnnotationKind::FreeTextNote)
            {
                if !bounds.contains(&annot.rect) || annot.rect.top() < estimate_y {
                    continue;
                }
                let center_y = annot.rect.y + annot.rect.height / 2.0;
                match cfg.row_band(center_y) {
                    Some(band) => next = next.max(band + 1),
                    // inside the expanded bounds but above every band: the
                    // top row is occupied
                    None if center_y >= cfg.block_bounds().top() => next = cfg.row_count,
                    None => {}
                }
            }
        }
        Err(err) => {
            warn!(error = %err, "annotation sweep failed, keeping text-scan estimate");
        }
    }

    if next >= cfg.row_count {
        let y = cfg.block_bounds().top() - cfg.row_height;
        debug!(y, "revision table full");
        FreeRow {
            index: cfg.row_count,
            y,
            table_full: true,
        }
    } else {
        let row = cfg.row_rect(next);
        debug!(index = next, y = row.y, "next free revision row");
        FreeRow {
            index: next,
            y: row.y,
            table_full: false,
        }
    }
}
