//! Brush and eraser stamps.

use crate::color::erase_blend;
use crate::history::History;
use crate::selection::Selection;

use super::{DrawTarget, write_pixel};

/// What a stamp deposits at each covered cell.
pub enum StampMode<'a> {
    /// Overwrite with a color string.
    Paint(&'a str),
    /// Fade alpha by the eraser strength percentage.
    Erase(u8),
}

/// Stamp a square of `size` pixels centered on `(cx, cy)`.
///
/// The square spans `size` cells per axis with its top-left offset at
/// `-floor((size - 1) / 2)`, so even sizes lean toward the bottom-right of
/// the cursor cell. Returns how many cells changed.
pub fn stamp(
    target: &mut DrawTarget<'_>,
    selection: &Selection,
    history: &mut History,
    cx: i32,
    cy: i32,
    size: u32,
    mode: &StampMode<'_>,
) -> usize {
    let size = size.max(1) as i32;
    let offset = (size - 1) / 2;
    let mut changed = 0;
    for dy in 0..size {
        for dx in 0..size {
            let x = cx - offset + dx;
            let y = cy - offset + dy;
            let wrote = match mode {
                StampMode::Paint(color) => {
                    write_pixel(target, selection, history, x, y, color)
                }
                StampMode::Erase(strength) => {
                    if !target.in_bounds(x, y) {
                        false
                    } else {
                        let faded = erase_blend(&target.cells[target.index(x, y)], *strength);
                        write_pixel(target, selection, history, x, y, &faded)
                    }
                }
            };
            if wrote {
                changed += 1;
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(w: u32, h: u32) -> Vec<String> {
        vec![String::new(); (w * h) as usize]
    }

    #[test]
    fn size_one_paints_a_single_cell() {
        let mut cells = make(5, 5);
        let mut target = DrawTarget { layer_id: "l1", cells: &mut cells, width: 5, height: 5 };
        let sel = Selection::default();
        let mut history = History::default();
        let n = stamp(&mut target, &sel, &mut history, 2, 2, 1, &StampMode::Paint("#ff0000"));
        assert_eq!(n, 1);
        assert_eq!(cells[2 * 5 + 2], "#ff0000");
        assert_eq!(cells.iter().filter(|c| !c.is_empty()).count(), 1);
    }

    #[test]
    fn even_size_leans_bottom_right() {
        let mut cells = make(5, 5);
        let mut target = DrawTarget { layer_id: "l1", cells: &mut cells, width: 5, height: 5 };
        let sel = Selection::default();
        let mut history = History::default();
        stamp(&mut target, &sel, &mut history, 2, 2, 2, &StampMode::Paint("x"));
        // offset floor((2-1)/2) = 0: covers (2..=3, 2..=3)
        for (x, y) in [(2, 2), (3, 2), (2, 3), (3, 3)] {
            assert_eq!(cells[y * 5 + x], "x", "({x},{y})");
        }
        assert_eq!(cells.iter().filter(|c| !c.is_empty()).count(), 4);
    }

    #[test]
    fn stamp_clips_at_edges() {
        let mut cells = make(3, 3);
        let mut target = DrawTarget { layer_id: "l1", cells: &mut cells, width: 3, height: 3 };
        let sel = Selection::default();
        let mut history = History::default();
        let n = stamp(&mut target, &sel, &mut history, 0, 0, 3, &StampMode::Paint("x"));
        // 3x3 centered at origin: only the 2x2 in-bounds quadrant lands
        assert_eq!(n, 4);
    }

    #[test]
    fn full_strength_erase_clears() {
        let mut cells = make(3, 3);
        cells[4] = "#112233".to_string();
        let mut target = DrawTarget { layer_id: "l1", cells: &mut cells, width: 3, height: 3 };
        let sel = Selection::default();
        let mut history = History::default();
        let n = stamp(&mut target, &sel, &mut history, 1, 1, 1, &StampMode::Erase(100));
        assert_eq!(n, 1);
        assert_eq!(cells[4], "");
    }

    #[test]
    fn partial_erase_fades_alpha() {
        let mut cells = make(1, 1);
        cells[0] = "#ff0000".to_string();
        let mut target = DrawTarget { layer_id: "l1", cells: &mut cells, width: 1, height: 1 };
        let sel = Selection::default();
        let mut history = History::default();
        stamp(&mut target, &sel, &mut history, 0, 0, 1, &StampMode::Erase(50));
        assert_eq!(cells[0], "rgba(255,0,0,0.5)");
    }

    #[test]
    fn erasing_transparent_records_nothing() {
        let mut cells = make(1, 1);
        let mut target = DrawTarget { layer_id: "l1", cells: &mut cells, width: 1, height: 1 };
        let sel = Selection::default();
        let mut history = History::default();
        history.begin_action("erase");
        let n = stamp(&mut target, &sel, &mut history, 0, 0, 1, &StampMode::Erase(50));
        assert_eq!(n, 0);
        assert!(!history.end_action());
    }
}
