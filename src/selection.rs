//! Selection model: a bounding rect plus a shape tag, and for lasso
//! selections the freehand polygon itself.
//!
//! A `None` rect means no selection, so every pixel is eligible. When a
//! selection exists, drawing operations consult [`Selection::contains`] for
//! every pixel they would touch.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, point_in_polygon};

/// Which membership test the selection uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionShape {
    #[default]
    Rect,
    Ellipse,
    Lasso,
}

/// Axis-aligned selection bounds in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// A finalized selection, as stored in history entries and snapshots.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectionState {
    pub rect: SelectionRect,
    pub shape: SelectionShape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Vec<Point>>,
}

/// The current selection region, if any.
#[derive(Clone, Debug, Default)]
pub struct Selection {
    rect: Option<SelectionRect>,
    shape: SelectionShape,
    polygon: Option<Vec<Point>>,
    /// Drag anchor set by `begin`; rect/ellipse updates measure from here.
    anchor: Option<Point>,
}

impl Selection {
    /// Start a new selection at `(x, y)`.
    ///
    /// Rect/ellipse selections begin as a zero-size rect anchored there (they
    /// select nothing until the first `update`); a lasso begins as a
    /// one-point polygon with a 1×1 bounding rect.
    pub fn begin(&mut self, x: i32, y: i32, shape: SelectionShape) {
        self.shape = shape;
        self.anchor = Some(Point::new(x, y));
        if shape == SelectionShape::Lasso {
            self.polygon = Some(vec![Point::new(x, y)]);
            self.rect = Some(SelectionRect { x, y, width: 1, height: 1 });
        } else {
            self.polygon = None;
            self.rect = Some(SelectionRect { x, y, width: 0, height: 0 });
        }
    }

    /// Recompute the bounding rect from the anchor to `(x, y)`, normalizing
    /// negative extents. No-op for lasso selections (those grow point by
    /// point) or when no selection is in progress.
    pub fn update(&mut self, x: i32, y: i32) {
        if self.shape == SelectionShape::Lasso || self.rect.is_none() {
            return;
        }
        let Some(anchor) = self.anchor else { return };
        self.rect = Some(SelectionRect {
            x: anchor.x.min(x),
            y: anchor.y.min(y),
            width: (x - anchor.x).abs() + 1,
            height: (y - anchor.y).abs() + 1,
        });
    }

    /// Append a lasso point (skipping consecutive duplicates) and grow the
    /// bounding rect to the polygon's bounds.
    pub fn add_point(&mut self, x: i32, y: i32) {
        let Some(polygon) = self.polygon.as_mut() else { return };
        if polygon.last() == Some(&Point::new(x, y)) {
            return;
        }
        polygon.push(Point::new(x, y));
        let (mut min_x, mut min_y) = (i32::MAX, i32::MAX);
        let (mut max_x, mut max_y) = (i32::MIN, i32::MIN);
        for p in polygon.iter() {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        self.rect = Some(SelectionRect {
            x: min_x.max(0),
            y: min_y.max(0),
            width: (max_x - min_x + 1).max(1),
            height: (max_y - min_y + 1).max(1),
        });
    }

    /// Drop the selection entirely.
    pub fn reset(&mut self) {
        self.rect = None;
        self.shape = SelectionShape::Rect;
        self.polygon = None;
        self.anchor = None;
    }

    pub fn is_active(&self) -> bool {
        self.rect.is_some()
    }

    pub fn rect(&self) -> Option<SelectionRect> {
        self.rect
    }

    pub fn shape(&self) -> SelectionShape {
        self.shape
    }

    pub fn polygon(&self) -> Option<&[Point]> {
        self.polygon.as_deref()
    }

    /// Snapshot for history meta changes / serialization.
    pub fn state(&self) -> Option<SelectionState> {
        self.rect.map(|rect| SelectionState {
            rect,
            shape: self.shape,
            polygon: self.polygon.clone(),
        })
    }

    /// Restore a snapshot (or `None` for "no selection").
    pub fn set_state(&mut self, state: Option<SelectionState>) {
        match state {
            None => self.reset(),
            Some(s) => {
                self.rect = Some(SelectionRect {
                    x: s.rect.x.max(0),
                    y: s.rect.y.max(0),
                    width: s.rect.width.max(0),
                    height: s.rect.height.max(0),
                });
                self.shape = s.shape;
                self.polygon = s.polygon;
                self.anchor = None;
            }
        }
    }

    /// Whether drawing may touch pixel `(x, y)`.
    ///
    /// No selection: always true. Rect: half-open box test. Ellipse:
    /// normalized-distance test against pixel centers, radii floored to 0.5
    /// so a degenerate selection behaves as a 1-pixel ellipse. Lasso:
    /// ray-cast against pixel centers; polygons with fewer than 3 points
    /// fall back to the bounding-rect test.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let Some(rect) = self.rect else { return true };
        match self.shape {
            SelectionShape::Ellipse => {
                let cx = rect.x as f64 + rect.width as f64 / 2.0 - 0.5;
                let cy = rect.y as f64 + rect.height as f64 / 2.0 - 0.5;
                let rx = (rect.width as f64 / 2.0).max(0.5);
                let ry = (rect.height as f64 / 2.0).max(0.5);
                let dx = (x as f64 - cx) / rx;
                let dy = (y as f64 - cy) / ry;
                dx * dx + dy * dy <= 1.0
            }
            SelectionShape::Lasso => {
                if let Some(polygon) = self.polygon.as_deref()
                    && polygon.len() > 2
                {
                    return point_in_polygon(x as f64 + 0.5, y as f64 + 0.5, polygon);
                }
                rect_contains(&rect, x, y)
            }
            SelectionShape::Rect => rect_contains(&rect, x, y),
        }
    }
}

fn rect_contains(rect: &SelectionRect, x: i32, y: i32) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_selection_contains_everything() {
        let sel = Selection::default();
        assert!(sel.contains(0, 0));
        assert!(sel.contains(-5, 99));
    }

    #[test]
    fn rect_drag_normalizes_negative_extents() {
        let mut sel = Selection::default();
        sel.begin(5, 5, SelectionShape::Rect);
        assert!(!sel.contains(5, 5)); // zero-size until dragged
        sel.update(2, 3);
        assert_eq!(
            sel.rect(),
            Some(SelectionRect { x: 2, y: 3, width: 4, height: 3 })
        );
        // anchor stays put when the drag crosses back over it
        sel.update(8, 9);
        assert_eq!(
            sel.rect(),
            Some(SelectionRect { x: 5, y: 5, width: 4, height: 5 })
        );
    }

    #[test]
    fn rect_membership_is_half_open() {
        let mut sel = Selection::default();
        sel.begin(2, 2, SelectionShape::Rect);
        sel.update(4, 4);
        assert!(sel.contains(2, 2));
        assert!(sel.contains(4, 4));
        assert!(!sel.contains(5, 4));
        assert!(!sel.contains(1, 3));
    }

    #[test]
    fn degenerate_ellipse_acts_as_one_pixel() {
        let mut sel = Selection::default();
        sel.set_state(Some(SelectionState {
            rect: SelectionRect { x: 3, y: 3, width: 1, height: 1 },
            shape: SelectionShape::Ellipse,
            polygon: None,
        }));
        assert!(sel.contains(3, 3));
        assert!(!sel.contains(4, 3));
    }

    #[test]
    fn lasso_skips_duplicate_points_and_tracks_bounds() {
        let mut sel = Selection::default();
        sel.begin(0, 0, SelectionShape::Lasso);
        sel.add_point(0, 0); // duplicate, dropped
        sel.add_point(4, 0);
        sel.add_point(0, 4);
        assert_eq!(sel.polygon().unwrap().len(), 3);
        assert_eq!(
            sel.rect(),
            Some(SelectionRect { x: 0, y: 0, width: 5, height: 5 })
        );
        assert!(sel.contains(1, 1));
        assert!(!sel.contains(3, 3));
    }

    #[test]
    fn tiny_lasso_falls_back_to_rect_test() {
        let mut sel = Selection::default();
        sel.begin(2, 2, SelectionShape::Lasso);
        sel.add_point(3, 2);
        // 2-point polygon: bounding-rect membership applies
        assert!(sel.contains(2, 2));
        assert!(sel.contains(3, 2));
        assert!(!sel.contains(4, 2));
    }
}
