//! Project snapshot export and restore.
//!
//! The snapshot is a plain JSON object (camelCase keys) carrying the whole
//! editor state except history. Restore is deliberately forgiving: it reads
//! field by field, keeps the current value wherever the input is missing or
//! malformed, and reports success as a boolean rather than an error.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::document::{DEFAULT_FRAME_DURATION_MS, Document, Frame, Layer, MAX_CANVAS_DIM};
use crate::geometry::Point;
use crate::selection::{SelectionRect, SelectionShape, SelectionState};
use crate::tools::{
    BrushSettings, EraserSettings, FillSettings, LineSettings, ShapeSettings, ToolId,
};

#[derive(Clone, Copy, Debug, Serialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

/// Everything a project file stores.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSnapshot {
    pub canvas: CanvasSize,
    pub layers: Vec<Layer>,
    pub layer_buffers: HashMap<String, Vec<String>>,
    pub selected_layer_id: String,
    pub current_tool: ToolId,
    pub brush: BrushSettings,
    pub eraser: EraserSettings,
    pub line: LineSettings,
    pub fill: FillSettings,
    pub circle: ShapeSettings,
    pub square: ShapeSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionRect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection_polygon: Option<Vec<Point>>,
    pub frames: Vec<Frame>,
}

impl Document {
    /// Capture the full editor state (history excluded).
    pub fn export_snapshot(&self) -> ProjectSnapshot {
        let mut layer_buffers = HashMap::new();
        for layer in &self.layers {
            layer_buffers.insert(layer.id.clone(), self.store.cells(&layer.id).to_vec());
        }
        ProjectSnapshot {
            canvas: CanvasSize { width: self.width, height: self.height },
            layers: self.layers.clone(),
            layer_buffers,
            selected_layer_id: self.selected_layer_id.clone(),
            current_tool: self.tools.current_tool,
            brush: self.tools.brush.clone(),
            eraser: self.tools.eraser.clone(),
            line: self.tools.line.clone(),
            fill: self.tools.fill.clone(),
            circle: self.tools.circle.clone(),
            square: self.tools.square.clone(),
            selection: self.selection.rect(),
            selection_polygon: self.selection.polygon().map(<[Point]>::to_vec),
            frames: self.frames.clone(),
        }
    }

    /// Load a snapshot value into the document. Unknown or malformed fields
    /// are skipped; only a non-object input fails outright. History is left
    /// untouched.
    pub fn restore_snapshot(&mut self, parsed: &Value) -> bool {
        if !parsed.is_object() {
            log::warn!("snapshot restore rejected: input is not a JSON object");
            return false;
        }

        if let Some(canvas) = parsed.get("canvas") {
            if let Some(width) = read_dimension(canvas.get("width")) {
                self.width = width;
            }
            if let Some(height) = read_dimension(canvas.get("height")) {
                self.height = height;
            }
        }

        if let Some(layers) = parsed.get("layers").and_then(Value::as_array) {
            let restored: Vec<Layer> = layers.iter().filter_map(read_layer).collect();
            if !restored.is_empty() {
                self.layers = restored;
            }
        }

        self.store.clear();
        if let Some(buffers) = parsed.get("layerBuffers").and_then(Value::as_object) {
            for (id, buf) in buffers {
                if let Some(cells) = buf.as_array() {
                    let cells: Vec<String> = cells
                        .iter()
                        .map(|v| v.as_str().unwrap_or("").to_string())
                        .collect();
                    self.store.insert_raw(id, self.width, self.height, &cells);
                }
            }
        }
        let ids: Vec<String> = self.layers.iter().map(|l| l.id.clone()).collect();
        for id in ids {
            self.store.ensure(&id, self.width, self.height);
        }

        if let Some(selected) = parsed.get("selectedLayerId").and_then(Value::as_str)
            && self.layers.iter().any(|l| l.id == selected)
        {
            self.selected_layer_id = selected.to_string();
        }
        if !self.layers.iter().any(|l| l.id == self.selected_layer_id)
            && let Some(first) = self.layers.first()
        {
            self.selected_layer_id = first.id.clone();
        }

        let max_brush = self.width.max(self.height);
        self.tools.restore_from_value(parsed, max_brush);

        self.restore_selection(parsed);

        if let Some(frames) = parsed.get("frames").and_then(Value::as_array) {
            let restored: Vec<Frame> = frames.iter().filter_map(read_frame).collect();
            if !restored.is_empty() {
                self.frames = restored;
            }
        }
        self.current_frame_index = self.current_frame_index.min(self.frames.len() - 1);

        self.saved = true;
        true
    }

    fn restore_selection(&mut self, parsed: &Value) {
        let rect = parsed.get("selection").and_then(read_selection_rect);
        let polygon = parsed.get("selectionPolygon").and_then(read_polygon);
        let Some(rect) = rect else {
            self.selection.reset();
            return;
        };
        let shape = if polygon.is_some() { SelectionShape::Lasso } else { SelectionShape::Rect };
        self.selection.set_state(Some(SelectionState { rect, shape, polygon }));
    }
}

fn read_dimension(value: Option<&Value>) -> Option<u32> {
    let n = value?.as_f64()?;
    if !n.is_finite() || n < 1.0 {
        return None;
    }
    Some((n.floor() as u32).min(MAX_CANVAS_DIM))
}

fn read_layer(value: &Value) -> Option<Layer> {
    Some(Layer {
        id: value.get("id")?.as_str()?.to_string(),
        name: value.get("name").and_then(Value::as_str).unwrap_or("Layer").to_string(),
        visible: value.get("visible").and_then(Value::as_bool).unwrap_or(true),
        locked: value.get("locked").and_then(Value::as_bool).unwrap_or(false),
    })
}

fn read_frame(value: &Value) -> Option<Frame> {
    let duration = value
        .get("duration")
        .and_then(Value::as_f64)
        .filter(|d| d.is_finite() && *d >= 1.0)
        .map(|d| d.floor() as u32)
        .unwrap_or(DEFAULT_FRAME_DURATION_MS);
    Some(Frame {
        id: value.get("id")?.as_str()?.to_string(),
        name: value.get("name").and_then(Value::as_str).unwrap_or("Frame").to_string(),
        duration,
    })
}

fn read_selection_rect(value: &Value) -> Option<SelectionRect> {
    let coord = |key: &str| value.get(key).and_then(Value::as_f64).map(|v| v.floor() as i32);
    Some(SelectionRect {
        x: coord("x")?.max(0),
        y: coord("y")?.max(0),
        width: coord("width").unwrap_or(0).max(0),
        height: coord("height").unwrap_or(0).max(0),
    })
}

fn read_polygon(value: &Value) -> Option<Vec<Point>> {
    let points: Vec<Point> = value
        .as_array()?
        .iter()
        .filter_map(|p| {
            let x = p.get("x")?.as_f64()?;
            let y = p.get("y")?.as_f64()?;
            Some(Point::new(x.floor() as i32, y.floor() as i32))
        })
        .collect();
    if points.is_empty() { None } else { Some(points) }
}
