//! Rectangle and ellipse shapes with stroke, solid and gradient fills.

use crate::color::{Rgb, mix, parse_hex};
use crate::history::History;
use crate::selection::Selection;
use crate::tools::{GradientKind, ShapeFillMode, ShapeSettings};

use super::{DrawTarget, write_pixel};

/// Normalized inclusive bounds of a two-corner drag.
struct Bounds {
    min_x: i32,
    max_x: i32,
    min_y: i32,
    max_y: i32,
}

/// Clamp both corners into the buffer and normalize. With `uniform` set,
/// both axes are extended to `max(|dx|, |dy|)` stepped from the anchor, so
/// the shape stays square/circular no matter the drag direction.
fn drag_bounds(target: &DrawTarget<'_>, x0: i32, y0: i32, x1: i32, y1: i32, uniform: bool) -> Bounds {
    let max_x = target.width as i32 - 1;
    let max_y = target.height as i32 - 1;
    let start_x = x0.clamp(0, max_x);
    let start_y = y0.clamp(0, max_y);
    let mut end_x = x1.clamp(0, max_x);
    let mut end_y = y1.clamp(0, max_y);
    if uniform {
        let span = (end_x - start_x).abs().max((end_y - start_y).abs());
        let step_x = if end_x >= start_x { 1 } else { -1 };
        let step_y = if end_y >= start_y { 1 } else { -1 };
        end_x = (start_x + step_x * span).clamp(0, max_x);
        end_y = (start_y + step_y * span).clamp(0, max_y);
    }
    Bounds {
        min_x: start_x.min(end_x),
        max_x: start_x.max(end_x),
        min_y: start_y.min(end_y),
        max_y: start_y.max(end_y),
    }
}

/// Gradient endpoint resolution shared by both shapes.
///
/// Endpoints default to the fill color, then to each other. Only strict
/// 6-digit hex endpoints blend; otherwise `mix` degrades to the literal
/// 50%-switch between the fallback strings.
struct GradientPlan {
    start: Option<Rgb>,
    end: Option<Rgb>,
    fallback_start: String,
    fallback_end: String,
}

impl GradientPlan {
    fn new(options: &ShapeSettings) -> Option<GradientPlan> {
        let fill = options.fill_color.trim();
        let mut start_color = options.gradient_start_color.trim();
        if start_color.is_empty() {
            start_color = fill;
        }
        let mut end_color = options.gradient_end_color.trim();
        if end_color.is_empty() {
            end_color = start_color;
        }
        let fallback_start = [start_color, end_color, fill]
            .into_iter()
            .find(|c| !c.is_empty())
            .unwrap_or("");
        let fallback_end = [end_color, start_color, fill]
            .into_iter()
            .find(|c| !c.is_empty())
            .unwrap_or("");
        if fallback_start.is_empty() && fallback_end.is_empty() {
            return None;
        }
        Some(GradientPlan {
            start: parse_hex(start_color),
            end: parse_hex(end_color),
            fallback_start: fallback_start.to_string(),
            fallback_end: fallback_end.to_string(),
        })
    }

    fn color_at(&self, ratio: f64) -> String {
        mix(
            self.start,
            self.end,
            ratio.clamp(0.0, 1.0) as f32,
            &self.fallback_start,
            &self.fallback_end,
        )
    }
}

/// Linear-gradient projection onto the angle's direction vector, normalized
/// against the projections of the four bounding-box corners.
struct LinearAxis {
    dir_x: f64,
    dir_y: f64,
    min_proj: f64,
    span: f64,
}

impl LinearAxis {
    fn new(bounds: &Bounds, angle_degrees: f32) -> LinearAxis {
        let radians = (angle_degrees as f64).to_radians();
        let dir_x = radians.cos();
        let dir_y = radians.sin();
        let corners = [
            (bounds.min_x, bounds.min_y),
            (bounds.max_x, bounds.min_y),
            (bounds.min_x, bounds.max_y),
            (bounds.max_x, bounds.max_y),
        ];
        let mut min_proj = f64::INFINITY;
        let mut max_proj = f64::NEG_INFINITY;
        for (cx, cy) in corners {
            let proj = (cx as f64 + 0.5) * dir_x + (cy as f64 + 0.5) * dir_y;
            min_proj = min_proj.min(proj);
            max_proj = max_proj.max(proj);
        }
        if max_proj == min_proj {
            max_proj = min_proj + 1.0;
        }
        LinearAxis { dir_x, dir_y, min_proj, span: max_proj - min_proj }
    }

    fn ratio(&self, x: i32, y: i32) -> f64 {
        let proj = (x as f64 + 0.5) * self.dir_x + (y as f64 + 0.5) * self.dir_y;
        (proj - self.min_proj) / self.span
    }
}

/// Draw a rectangle between two drag corners. Returns how many cells
/// changed.
///
/// Per cell, in priority order: stroke band (within `strokeThickness` of the
/// nearest edge, when a stroke color is set), solid fill, gradient fill.
/// Radial gradients over rectangles use the perimeter-walk ratio
/// `(dx + dy) / (spanX + spanY)` from the top-left corner.
pub fn draw_rect(
    target: &mut DrawTarget<'_>,
    selection: &Selection,
    history: &mut History,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    uniform: bool,
    options: &ShapeSettings,
) -> usize {
    if target.width == 0 || target.height == 0 {
        return 0;
    }
    let bounds = drag_bounds(target, x0, y0, x1, y1, uniform);
    let stroke = options.stroke_thickness as i32;
    let stroke_color = options.stroke_color.trim();
    let fill_color = options.fill_color.trim();
    let gradient = if options.fill_mode == ShapeFillMode::Gradient {
        GradientPlan::new(options)
    } else {
        None
    };
    let linear = gradient
        .as_ref()
        .filter(|_| options.gradient_type == GradientKind::Linear)
        .map(|_| LinearAxis::new(&bounds, options.gradient_angle));
    let perimeter_span = ((bounds.max_x - bounds.min_x) + (bounds.max_y - bounds.min_y)).max(1);
    let mut changed = 0;
    for y in bounds.min_y..=bounds.max_y {
        for x in bounds.min_x..=bounds.max_x {
            let edge_distance = (x - bounds.min_x)
                .min(bounds.max_x - x)
                .min(y - bounds.min_y)
                .min(bounds.max_y - y);
            let value = if stroke > 0 && edge_distance < stroke && !stroke_color.is_empty() {
                stroke_color.to_string()
            } else if options.fill_mode == ShapeFillMode::Solid {
                if fill_color.is_empty() {
                    continue;
                }
                fill_color.to_string()
            } else if let Some(plan) = &gradient {
                let ratio = match &linear {
                    Some(axis) => axis.ratio(x, y),
                    None => {
                        ((x - bounds.min_x) + (y - bounds.min_y)) as f64 / perimeter_span as f64
                    }
                };
                plan.color_at(ratio)
            } else {
                continue;
            };
            if write_pixel(target, selection, history, x, y, &value) {
                changed += 1;
            }
        }
    }
    changed
}

/// Draw an ellipse inscribed in the drag's bounding box. Returns how many
/// cells changed.
///
/// Membership tests the cell center against the ellipse; the stroke is the
/// band just inside the rim where the remaining distance to it is below the
/// stroke thickness. Radial gradients use the normalized center distance.
pub fn draw_ellipse(
    target: &mut DrawTarget<'_>,
    selection: &Selection,
    history: &mut History,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    uniform: bool,
    options: &ShapeSettings,
) -> usize {
    if target.width == 0 || target.height == 0 {
        return 0;
    }
    let bounds = drag_bounds(target, x0, y0, x1, y1, uniform);
    let rx = (bounds.max_x - bounds.min_x + 1) as f64 / 2.0;
    let ry = (bounds.max_y - bounds.min_y + 1) as f64 / 2.0;
    let cx = bounds.min_x as f64 + rx;
    let cy = bounds.min_y as f64 + ry;
    let rim_scale = rx.min(ry);
    let stroke = options.stroke_thickness as f64;
    let stroke_color = options.stroke_color.trim();
    let fill_color = options.fill_color.trim();
    let gradient = if options.fill_mode == ShapeFillMode::Gradient {
        GradientPlan::new(options)
    } else {
        None
    };
    let linear = gradient
        .as_ref()
        .filter(|_| options.gradient_type == GradientKind::Linear)
        .map(|_| LinearAxis::new(&bounds, options.gradient_angle));
    let mut changed = 0;
    for y in bounds.min_y..=bounds.max_y {
        for x in bounds.min_x..=bounds.max_x {
            let nx = (x as f64 + 0.5 - cx) / rx;
            let ny = (y as f64 + 0.5 - cy) / ry;
            let norm = (nx * nx + ny * ny).sqrt();
            if norm > 1.0 {
                continue;
            }
            let rim_distance = (1.0 - norm) * rim_scale;
            let value = if stroke > 0.0 && rim_distance < stroke && !stroke_color.is_empty() {
                stroke_color.to_string()
            } else if options.fill_mode == ShapeFillMode::Solid {
                if fill_color.is_empty() {
                    continue;
                }
                fill_color.to_string()
            } else if let Some(plan) = &gradient {
                let ratio = match &linear {
                    Some(axis) => axis.ratio(x, y),
                    None => norm,
                };
                plan.color_at(ratio)
            } else {
                continue;
            };
            if write_pixel(target, selection, history, x, y, &value) {
                changed += 1;
            }
        }
    }
    changed
}
