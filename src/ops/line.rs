//! Line drawing: Bresenham path, square pen.

use crate::geometry::line_points;
use crate::history::History;
use crate::selection::Selection;

use super::{DrawTarget, write_pixel};

/// Draw a line from `(x0, y0)` to `(x1, y1)` with a square pen of
/// `thickness` pixels. Endpoints are clamped to the buffer first, so a drag
/// that leaves the canvas still draws up to the edge. Returns how many cells
/// changed.
pub fn draw_line(
    target: &mut DrawTarget<'_>,
    selection: &Selection,
    history: &mut History,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    thickness: u32,
    color: &str,
) -> usize {
    let max_x = target.width as i32 - 1;
    let max_y = target.height as i32 - 1;
    if max_x < 0 || max_y < 0 {
        return 0;
    }
    let (x0, y0) = (x0.clamp(0, max_x), y0.clamp(0, max_y));
    let (x1, y1) = (x1.clamp(0, max_x), y1.clamp(0, max_y));
    let thickness = thickness.max(1) as i32;
    let offset = (thickness - 1) / 2;
    let mut changed = 0;
    for (px, py) in line_points(x0, y0, x1, y1) {
        for dy in 0..thickness {
            for dx in 0..thickness {
                if write_pixel(
                    target,
                    selection,
                    history,
                    px - offset + dx,
                    py - offset + dy,
                    color,
                ) {
                    changed += 1;
                }
            }
        }
    }
    changed
}
