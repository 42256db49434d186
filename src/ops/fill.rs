//! 4-connected flood fill.

use crate::history::History;
use crate::selection::Selection;

use super::{DrawTarget, write_pixel};

/// Flood-fill the 4-connected region of same-colored cells containing the
/// seed. `value` of `""` erases the region. Returns how many cells changed.
///
/// The fill never crosses the selection boundary, and a seed outside the
/// selection does nothing. Filling a region with its own color is a no-op
/// (and would otherwise never terminate region-growth).
pub fn flood_fill(
    target: &mut DrawTarget<'_>,
    selection: &Selection,
    history: &mut History,
    seed_x: i32,
    seed_y: i32,
    value: &str,
) -> usize {
    if !target.in_bounds(seed_x, seed_y) || !selection.contains(seed_x, seed_y) {
        return 0;
    }
    let match_color = target.cells[target.index(seed_x, seed_y)].clone();
    if match_color == value {
        return 0;
    }
    let mut changed = 0;
    let mut stack = vec![(seed_x, seed_y)];
    while let Some((x, y)) = stack.pop() {
        if !target.in_bounds(x, y) {
            continue;
        }
        let idx = target.index(x, y);
        if target.cells[idx] != match_color {
            continue;
        }
        if !write_pixel(target, selection, history, x, y, value) {
            continue;
        }
        changed += 1;
        stack.push((x + 1, y));
        stack.push((x - 1, y));
        stack.push((x, y + 1));
        stack.push((x, y - 1));
    }
    changed
}
