//! Drawing operations.
//!
//! Each op is a free function taking a [`DrawTarget`] (one layer's cells plus
//! its dimensions), the active [`Selection`], and the [`History`] engine.
//! Ops only ever write through [`write_pixel`], which enforces the selection
//! mask, skips no-op writes, and records every real change into the open
//! history action.

pub mod brush;
pub mod fill;
pub mod line;
pub mod shapes;

use crate::history::History;
use crate::selection::Selection;

/// A mutable view over one layer's pixel buffer for the duration of an op.
pub struct DrawTarget<'a> {
    pub layer_id: &'a str,
    pub cells: &'a mut Vec<String>,
    pub width: u32,
    pub height: u32,
}

impl<'a> DrawTarget<'a> {
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width && (y as u32) < self.height
    }

    pub fn index(&self, x: i32, y: i32) -> usize {
        (y as u32 * self.width + x as u32) as usize
    }
}

/// Write one pixel if it is in bounds, inside the selection, and actually
/// changes value. Returns whether a write happened.
pub(crate) fn write_pixel(
    target: &mut DrawTarget<'_>,
    selection: &Selection,
    history: &mut History,
    x: i32,
    y: i32,
    value: &str,
) -> bool {
    if !target.in_bounds(x, y) || !selection.contains(x, y) {
        return false;
    }
    let idx = target.index(x, y);
    if target.cells[idx] == value {
        return false;
    }
    history.record(target.layer_id, idx, &target.cells[idx], value);
    target.cells[idx] = value.to_string();
    true
}
