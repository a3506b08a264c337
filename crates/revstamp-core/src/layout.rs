//! Title-block layout profiles
//!
//! The revision block sits at a fixed position that depends only on which of
//! two margin conventions the sheet was plotted with. Each profile is a
//! static configuration record; the resolver picks one per page with a
//! single text probe and never re-derives geometry from page content.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

use crate::annotation::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutProfile {
    /// Standard plot margins.
    Normal,
    /// Wider margins; all title-block coordinates shift inward.
    Small,
}

/// One signature cell inside a revision row, relative to the block origin.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SignatureCell {
    pub x_offset: f64,
    pub width: f64,
    /// Inset applied on every side when placing an image in the cell.
    pub margin: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub profile: LayoutProfile,
    pub origin_x: f64,
    pub origin_y: f64,
    pub block_width: f64,
    pub row_height: f64,
    /// Vertical gap between adjacent rows.
    pub row_gap: f64,
    pub row_count: usize,
    /// Margin by which the block bounds are expanded for the annotation
    /// sweep, to catch markup hanging slightly outside the ruled table.
    pub sweep_margin: f64,
    /// Probe rectangle outside the revision block; extractable text here
    /// means the sheet uses this profile's margin convention.
    pub probe: Rect,
    /// Author, checker, approver cells, in that order.
    pub cells: [SignatureCell; 3],
}

impl LayoutConfig {
    fn row_pitch(&self) -> f64 {
        self.row_height + self.row_gap
    }

    /// Rectangle of the `index`-th row, counted from the bottom of the block.
    pub fn row_rect(&self, index: usize) -> Rect {
        Rect::new(
            self.origin_x,
            self.origin_y + index as f64 * self.row_pitch(),
            self.block_width,
            self.row_height,
        )
    }

    /// Outer bounds of the whole revision table.
    pub fn block_bounds(&self) -> Rect {
        Rect::new(
            self.origin_x,
            self.origin_y,
            self.block_width,
            self.row_count as f64 * self.row_pitch(),
        )
    }

    /// Which fixed row band contains the vertical position `y`, if any.
    pub fn row_band(&self, y: f64) -> Option<usize> {
        let offset = y - self.origin_y;
        if offset < 0.0 {
            return None;
        }
        let index = (offset / self.row_pitch()).floor() as usize;
        (index < self.row_count).then_some(index)
    }

    /// Placement rectangle for a signature image in `cell` of the row whose
    /// origin is `row_y`, shrunk by the cell margin.
    pub fn cell_rect(&self, row_y: f64, cell: &SignatureCell) -> Rect {
        Rect::new(
            self.origin_x + cell.x_offset + cell.margin,
            row_y + cell.margin,
            cell.width - 2.0 * cell.margin,
            self.row_height - 2.0 * cell.margin,
        )
    }
}

lazy_static! {
    static ref NORMAL: LayoutConfig = LayoutConfig {
        profile: LayoutProfile::Normal,
        origin_x: 2871.0,
        origin_y: 326.0,
        block_width: 440.0,
        row_height: 22.5,
        row_gap: 0.27,
        row_count: 8,
        sweep_margin: 6.0,
        probe: Rect::new(3311.0, 254.0, 120.0, 36.0),
        cells: [
            SignatureCell { x_offset: 284.0, width: 52.0, margin: 3.0 },
            SignatureCell { x_offset: 336.0, width: 52.0, margin: 3.0 },
            SignatureCell { x_offset: 388.0, width: 52.0, margin: 3.0 },
        ],
    };
    static ref SMALL: LayoutConfig = LayoutConfig {
        profile: LayoutProfile::Small,
        origin_x: 2823.0,
        origin_y: 338.0,
        block_width: 440.0,
        row_height: 22.5,
        row_gap: 0.27,
        row_count: 8,
        sweep_margin: 6.0,
        probe: Rect::new(3263.0, 266.0, 120.0, 36.0),
        cells: [
            SignatureCell { x_offset: 284.0, width: 52.0, margin: 3.0 },
            SignatureCell { x_offset: 336.0, width: 52.0, margin: 3.0 },
            SignatureCell { x_offset: 388.0, width: 52.0, margin: 3.0 },
        ],
    };
}

pub fn profile_config(profile: LayoutProfile) -> &'static LayoutConfig {
    match profile {
        LayoutProfile::Normal => &NORMAL,
        LayoutProfile::Small => &SMALL,
    }
}
