//! Per-tool parameters and their history wiring.
//!
//! Every setter clamps its input, and when the value actually changes it
//! returns the `MetaChange` describing the transition. The document service
//! forwards that change to the history engine, which is how tool tweaks
//! become undoable. `apply_meta` is the reverse path: undo/redo dispatches a
//! recorded key/state pair back into the settings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::history::{MetaChange, MetaKey, MetaState};

/// Every tool the editor exposes. Wire names are the kebab-case ids used in
/// project snapshots.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolId {
    #[default]
    SelectLayer,
    RectSelect,
    EllipseSelect,
    LassoSelect,
    Eyedropper,
    Fill,
    Brush,
    Eraser,
    Line,
    Circle,
    Square,
}

impl ToolId {
    pub fn all() -> &'static [ToolId] {
        &[
            ToolId::SelectLayer,
            ToolId::RectSelect,
            ToolId::EllipseSelect,
            ToolId::LassoSelect,
            ToolId::Eyedropper,
            ToolId::Fill,
            ToolId::Brush,
            ToolId::Eraser,
            ToolId::Line,
            ToolId::Circle,
            ToolId::Square,
        ]
    }
}

/// Whether the fill tool paints a color or erases the region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    #[default]
    Color,
    Erase,
}

/// How a shape's interior is painted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeFillMode {
    #[default]
    Solid,
    Gradient,
}

/// Gradient interpolation scheme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradientKind {
    #[default]
    Linear,
    Radial,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BrushSettings {
    pub size: u32,
    pub color: String,
}

impl Default for BrushSettings {
    fn default() -> Self {
        BrushSettings { size: 1, color: "#000000".to_string() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EraserSettings {
    pub size: u32,
    pub strength: u8,
}

impl Default for EraserSettings {
    fn default() -> Self {
        EraserSettings { size: 1, strength: 100 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineSettings {
    pub thickness: u32,
    pub color: String,
}

impl Default for LineSettings {
    fn default() -> Self {
        LineSettings { thickness: 1, color: "#000000".to_string() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FillSettings {
    pub color: String,
    pub mode: FillMode,
}

impl Default for FillSettings {
    fn default() -> Self {
        FillSettings { color: "#000000".to_string(), mode: FillMode::Color }
    }
}

/// Shared by the circle and square tools.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeSettings {
    pub stroke_thickness: u32,
    pub stroke_color: String,
    pub fill_mode: ShapeFillMode,
    pub fill_color: String,
    pub gradient_start_color: String,
    pub gradient_end_color: String,
    pub gradient_type: GradientKind,
    pub gradient_angle: f32,
}

impl Default for ShapeSettings {
    fn default() -> Self {
        ShapeSettings {
            stroke_thickness: 1,
            stroke_color: "#000000".to_string(),
            fill_mode: ShapeFillMode::Solid,
            fill_color: String::new(),
            gradient_start_color: "#000000".to_string(),
            gradient_end_color: "#ffffff".to_string(),
            gradient_type: GradientKind::Linear,
            gradient_angle: 0.0,
        }
    }
}

/// Which shape tool a `ShapeSettings` mutation targets (circle and square
/// carry independent settings but identical fields).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeTool {
    Circle,
    Square,
}

/// The full tool-settings registry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ToolSettings {
    pub current_tool: ToolId,
    pub fill: FillSettings,
    pub brush: BrushSettings,
    pub eraser: EraserSettings,
    pub line: LineSettings,
    pub circle: ShapeSettings,
    pub square: ShapeSettings,
}

fn clamp_size(size: u32, max: Option<u32>) -> u32 {
    let limit = match max {
        Some(m) if m > 0 => m,
        _ => u32::MAX,
    };
    size.clamp(1, limit)
}

fn change(key: MetaKey, previous: MetaState, next: MetaState) -> Option<MetaChange> {
    Some(MetaChange { key, previous, next })
}

impl ToolSettings {
    // ---- setters (each returns the meta change when the value moved) ----

    pub fn select_tool(&mut self, id: ToolId) -> Option<MetaChange> {
        if self.current_tool == id {
            return None;
        }
        let prev = self.current_tool;
        self.current_tool = id;
        change(MetaKey::CurrentTool, MetaState::Tool(prev), MetaState::Tool(id))
    }

    pub fn set_fill_color(&mut self, color: &str) -> Option<MetaChange> {
        if color.is_empty() || self.fill.color == color {
            return None;
        }
        let prev = std::mem::replace(&mut self.fill.color, color.to_string());
        change(MetaKey::FillColor, MetaState::Text(prev), MetaState::Text(color.to_string()))
    }

    pub fn set_fill_mode(&mut self, mode: FillMode) -> Option<MetaChange> {
        if self.fill.mode == mode {
            return None;
        }
        let prev = std::mem::replace(&mut self.fill.mode, mode);
        change(MetaKey::FillMode, MetaState::Fill(prev), MetaState::Fill(mode))
    }

    pub fn set_brush_size(&mut self, size: u32, max: Option<u32>) -> Option<MetaChange> {
        let next = clamp_size(size, max);
        if self.brush.size == next {
            return None;
        }
        let prev = std::mem::replace(&mut self.brush.size, next);
        change(MetaKey::BrushSize, MetaState::Int(prev as i64), MetaState::Int(next as i64))
    }

    pub fn set_brush_color(&mut self, color: &str) -> Option<MetaChange> {
        if color.is_empty() || self.brush.color == color {
            return None;
        }
        let prev = std::mem::replace(&mut self.brush.color, color.to_string());
        change(MetaKey::BrushColor, MetaState::Text(prev), MetaState::Text(color.to_string()))
    }

    pub fn set_eraser_size(&mut self, size: u32, max: Option<u32>) -> Option<MetaChange> {
        let next = clamp_size(size, max);
        if self.eraser.size == next {
            return None;
        }
        let prev = std::mem::replace(&mut self.eraser.size, next);
        change(MetaKey::EraserSize, MetaState::Int(prev as i64), MetaState::Int(next as i64))
    }

    pub fn set_eraser_strength(&mut self, strength: u8) -> Option<MetaChange> {
        let next = strength.min(100);
        if self.eraser.strength == next {
            return None;
        }
        let prev = std::mem::replace(&mut self.eraser.strength, next);
        change(
            MetaKey::EraserStrength,
            MetaState::Int(prev as i64),
            MetaState::Int(next as i64),
        )
    }

    pub fn set_line_thickness(&mut self, thickness: u32, max: Option<u32>) -> Option<MetaChange> {
        let next = clamp_size(thickness, max);
        if self.line.thickness == next {
            return None;
        }
        let prev = std::mem::replace(&mut self.line.thickness, next);
        change(MetaKey::LineThickness, MetaState::Int(prev as i64), MetaState::Int(next as i64))
    }

    pub fn set_line_color(&mut self, color: &str) -> Option<MetaChange> {
        if color.is_empty() || self.line.color == color {
            return None;
        }
        let prev = std::mem::replace(&mut self.line.color, color.to_string());
        change(MetaKey::LineColor, MetaState::Text(prev), MetaState::Text(color.to_string()))
    }

    fn shape_mut(&mut self, tool: ShapeTool) -> &mut ShapeSettings {
        match tool {
            ShapeTool::Circle => &mut self.circle,
            ShapeTool::Square => &mut self.square,
        }
    }

    pub fn shape(&self, tool: ShapeTool) -> &ShapeSettings {
        match tool {
            ShapeTool::Circle => &self.circle,
            ShapeTool::Square => &self.square,
        }
    }

    pub fn set_shape_stroke_thickness(
        &mut self,
        tool: ShapeTool,
        thickness: u32,
        max: Option<u32>,
    ) -> Option<MetaChange> {
        // unlike pen sizes, zero is valid here: it means "no stroke"
        let limit = match max {
            Some(m) if m > 0 => m,
            _ => u32::MAX,
        };
        let next = thickness.min(limit);
        let shape = self.shape_mut(tool);
        if shape.stroke_thickness == next {
            return None;
        }
        let prev = std::mem::replace(&mut shape.stroke_thickness, next);
        let key = match tool {
            ShapeTool::Circle => MetaKey::CircleStrokeThickness,
            ShapeTool::Square => MetaKey::SquareStrokeThickness,
        };
        change(key, MetaState::Int(prev as i64), MetaState::Int(next as i64))
    }

    pub fn set_shape_stroke_color(&mut self, tool: ShapeTool, color: &str) -> Option<MetaChange> {
        let shape = self.shape_mut(tool);
        if shape.stroke_color == color {
            return None;
        }
        let prev = std::mem::replace(&mut shape.stroke_color, color.to_string());
        let key = match tool {
            ShapeTool::Circle => MetaKey::CircleStrokeColor,
            ShapeTool::Square => MetaKey::SquareStrokeColor,
        };
        change(key, MetaState::Text(prev), MetaState::Text(color.to_string()))
    }

    pub fn set_shape_fill_mode(&mut self, tool: ShapeTool, mode: ShapeFillMode) -> Option<MetaChange> {
        let shape = self.shape_mut(tool);
        if shape.fill_mode == mode {
            return None;
        }
        let prev = std::mem::replace(&mut shape.fill_mode, mode);
        let key = match tool {
            ShapeTool::Circle => MetaKey::CircleFillMode,
            ShapeTool::Square => MetaKey::SquareFillMode,
        };
        change(key, MetaState::ShapeFill(prev), MetaState::ShapeFill(mode))
    }

    pub fn set_shape_fill_color(&mut self, tool: ShapeTool, color: &str) -> Option<MetaChange> {
        let shape = self.shape_mut(tool);
        if shape.fill_color == color {
            return None;
        }
        let prev = std::mem::replace(&mut shape.fill_color, color.to_string());
        let key = match tool {
            ShapeTool::Circle => MetaKey::CircleFillColor,
            ShapeTool::Square => MetaKey::SquareFillColor,
        };
        change(key, MetaState::Text(prev), MetaState::Text(color.to_string()))
    }

    pub fn set_shape_gradient_start(&mut self, tool: ShapeTool, color: &str) -> Option<MetaChange> {
        let shape = self.shape_mut(tool);
        if shape.gradient_start_color == color {
            return None;
        }
        let prev = std::mem::replace(&mut shape.gradient_start_color, color.to_string());
        let key = match tool {
            ShapeTool::Circle => MetaKey::CircleGradientStart,
            ShapeTool::Square => MetaKey::SquareGradientStart,
        };
        change(key, MetaState::Text(prev), MetaState::Text(color.to_string()))
    }

    pub fn set_shape_gradient_end(&mut self, tool: ShapeTool, color: &str) -> Option<MetaChange> {
        let shape = self.shape_mut(tool);
        if shape.gradient_end_color == color {
            return None;
        }
        let prev = std::mem::replace(&mut shape.gradient_end_color, color.to_string());
        let key = match tool {
            ShapeTool::Circle => MetaKey::CircleGradientEnd,
            ShapeTool::Square => MetaKey::SquareGradientEnd,
        };
        change(key, MetaState::Text(prev), MetaState::Text(color.to_string()))
    }

    pub fn set_shape_gradient_type(&mut self, tool: ShapeTool, kind: GradientKind) -> Option<MetaChange> {
        let shape = self.shape_mut(tool);
        if shape.gradient_type == kind {
            return None;
        }
        let prev = std::mem::replace(&mut shape.gradient_type, kind);
        let key = match tool {
            ShapeTool::Circle => MetaKey::CircleGradientType,
            ShapeTool::Square => MetaKey::SquareGradientType,
        };
        change(key, MetaState::Gradient(prev), MetaState::Gradient(kind))
    }

    pub fn set_shape_gradient_angle(&mut self, tool: ShapeTool, angle: f32) -> Option<MetaChange> {
        if !angle.is_finite() {
            return None;
        }
        let shape = self.shape_mut(tool);
        if shape.gradient_angle == angle {
            return None;
        }
        let prev = std::mem::replace(&mut shape.gradient_angle, angle);
        let key = match tool {
            ShapeTool::Circle => MetaKey::CircleGradientAngle,
            ShapeTool::Square => MetaKey::SquareGradientAngle,
        };
        change(key, MetaState::Float(prev), MetaState::Float(angle))
    }

    // ---- undo/redo dispatch ----

    /// Apply a recorded meta state back into the settings. Returns false
    /// when the key is not a tool key or the payload has the wrong shape.
    pub fn apply_meta(&mut self, key: &MetaKey, state: &MetaState) -> bool {
        match (key, state) {
            (MetaKey::CurrentTool, MetaState::Tool(id)) => {
                self.current_tool = *id;
                true
            }
            (MetaKey::FillColor, MetaState::Text(c)) if !c.is_empty() => {
                self.fill.color = c.clone();
                true
            }
            (MetaKey::FillMode, MetaState::Fill(m)) => {
                self.fill.mode = *m;
                true
            }
            (MetaKey::BrushSize, MetaState::Int(v)) => {
                self.brush.size = (*v).max(1) as u32;
                true
            }
            (MetaKey::BrushColor, MetaState::Text(c)) if !c.is_empty() => {
                self.brush.color = c.clone();
                true
            }
            (MetaKey::EraserSize, MetaState::Int(v)) => {
                self.eraser.size = (*v).max(1) as u32;
                true
            }
            (MetaKey::EraserStrength, MetaState::Int(v)) => {
                self.eraser.strength = (*v).clamp(0, 100) as u8;
                true
            }
            (MetaKey::LineThickness, MetaState::Int(v)) => {
                self.line.thickness = (*v).max(1) as u32;
                true
            }
            (MetaKey::LineColor, MetaState::Text(c)) if !c.is_empty() => {
                self.line.color = c.clone();
                true
            }
            (MetaKey::CircleStrokeThickness, MetaState::Int(v)) => {
                self.circle.stroke_thickness = (*v).max(0) as u32;
                true
            }
            (MetaKey::CircleStrokeColor, MetaState::Text(c)) => {
                self.circle.stroke_color = c.clone();
                true
            }
            (MetaKey::CircleFillMode, MetaState::ShapeFill(m)) => {
                self.circle.fill_mode = *m;
                true
            }
            (MetaKey::CircleFillColor, MetaState::Text(c)) => {
                self.circle.fill_color = c.clone();
                true
            }
            (MetaKey::CircleGradientStart, MetaState::Text(c)) => {
                self.circle.gradient_start_color = c.clone();
                true
            }
            (MetaKey::CircleGradientEnd, MetaState::Text(c)) => {
                self.circle.gradient_end_color = c.clone();
                true
            }
            (MetaKey::CircleGradientType, MetaState::Gradient(k)) => {
                self.circle.gradient_type = *k;
                true
            }
            (MetaKey::CircleGradientAngle, MetaState::Float(a)) => {
                self.circle.gradient_angle = *a;
                true
            }
            (MetaKey::SquareStrokeThickness, MetaState::Int(v)) => {
                self.square.stroke_thickness = (*v).max(0) as u32;
                true
            }
            (MetaKey::SquareStrokeColor, MetaState::Text(c)) => {
                self.square.stroke_color = c.clone();
                true
            }
            (MetaKey::SquareFillMode, MetaState::ShapeFill(m)) => {
                self.square.fill_mode = *m;
                true
            }
            (MetaKey::SquareFillColor, MetaState::Text(c)) => {
                self.square.fill_color = c.clone();
                true
            }
            (MetaKey::SquareGradientStart, MetaState::Text(c)) => {
                self.square.gradient_start_color = c.clone();
                true
            }
            (MetaKey::SquareGradientEnd, MetaState::Text(c)) => {
                self.square.gradient_end_color = c.clone();
                true
            }
            (MetaKey::SquareGradientType, MetaState::Gradient(k)) => {
                self.square.gradient_type = *k;
                true
            }
            (MetaKey::SquareGradientAngle, MetaState::Float(a)) => {
                self.square.gradient_angle = *a;
                true
            }
            _ => false,
        }
    }

    // ---- snapshot restore ----

    /// Defensive restore from a snapshot value: nested blocks first, then
    /// the legacy flat keys older snapshots used (`lineThickness`,
    /// `circleStrokeColor`, ...). Absent or malformed fields keep the
    /// current value; nothing here touches history.
    pub(crate) fn restore_from_value(&mut self, parsed: &Value, max_brush: u32) {
        if let Some(tool) = parsed
            .get("currentTool")
            .and_then(|v| serde_json::from_value::<ToolId>(v.clone()).ok())
        {
            self.current_tool = tool;
        }
        if let Some(brush) = parsed.get("brush") {
            if let Some(size) = read_u32(brush.get("size")) {
                self.brush.size = size.clamp(1, max_brush.max(1));
            }
            if let Some(color) = read_string(brush.get("color")) {
                self.brush.color = color;
            }
        }
        if let Some(eraser) = parsed.get("eraser") {
            if let Some(size) = read_u32(eraser.get("size")) {
                self.eraser.size = size.clamp(1, max_brush.max(1));
            }
            if let Some(strength) = read_u32(eraser.get("strength")) {
                self.eraser.strength = strength.min(100) as u8;
            }
        }
        if let Some(fill) = parsed.get("fill") {
            if let Some(color) = read_string(fill.get("color")) {
                self.fill.color = color;
            }
            if let Some(mode) = fill
                .get("mode")
                .and_then(|v| serde_json::from_value::<FillMode>(v.clone()).ok())
            {
                self.fill.mode = mode;
            }
        }
        if let Some(line) = parsed.get("line") {
            if let Some(thickness) = read_u32(line.get("thickness")) {
                self.line.thickness = thickness.max(1);
            }
            if let Some(color) = read_string(line.get("color")) {
                self.line.color = color;
            }
        }
        if let Some(thickness) = read_u32(parsed.get("lineThickness")) {
            self.line.thickness = thickness.max(1);
        }
        if let Some(color) = read_string(parsed.get("lineColor")) {
            self.line.color = color;
        }
        restore_shape_value(&mut self.circle, parsed.get("circle"));
        restore_shape_flat(&mut self.circle, parsed, "circle");
        restore_shape_value(&mut self.square, parsed.get("square"));
        restore_shape_flat(&mut self.square, parsed, "square");
    }
}

fn read_u32(value: Option<&Value>) -> Option<u32> {
    let n = value?.as_f64()?;
    if !n.is_finite() || n < 0.0 {
        return None;
    }
    Some(n.floor() as u32)
}

fn read_f32(value: Option<&Value>) -> Option<f32> {
    let n = value?.as_f64()?;
    if !n.is_finite() {
        return None;
    }
    Some(n as f32)
}

fn read_string(value: Option<&Value>) -> Option<String> {
    let s = value?.as_str()?;
    if s.is_empty() { None } else { Some(s.to_string()) }
}

fn restore_shape_value(shape: &mut ShapeSettings, block: Option<&Value>) {
    let Some(block) = block else { return };
    if let Some(thickness) = read_u32(block.get("strokeThickness")) {
        shape.stroke_thickness = thickness;
    }
    if let Some(color) = read_string(block.get("strokeColor")) {
        shape.stroke_color = color;
    }
    if let Some(mode) = block
        .get("fillMode")
        .and_then(|v| serde_json::from_value::<ShapeFillMode>(v.clone()).ok())
    {
        shape.fill_mode = mode;
    }
    if let Some(color) = read_string(block.get("fillColor")) {
        shape.fill_color = color;
    }
    if let Some(color) = read_string(block.get("gradientStartColor")) {
        shape.gradient_start_color = color;
    }
    if let Some(color) = read_string(block.get("gradientEndColor")) {
        shape.gradient_end_color = color;
    }
    if let Some(kind) = block
        .get("gradientType")
        .and_then(|v| serde_json::from_value::<GradientKind>(v.clone()).ok())
    {
        shape.gradient_type = kind;
    }
    if let Some(angle) = read_f32(block.get("gradientAngle")) {
        shape.gradient_angle = angle;
    }
}

/// Legacy flat keys: `circleStrokeThickness`, `squareFillColor`, and the
/// oldest form `circleColor`/`squareColor` (a bare fill color).
fn restore_shape_flat(shape: &mut ShapeSettings, parsed: &Value, prefix: &str) {
    if let Some(thickness) = read_u32(parsed.get(format!("{prefix}StrokeThickness"))) {
        shape.stroke_thickness = thickness;
    }
    if let Some(color) = read_string(parsed.get(format!("{prefix}StrokeColor"))) {
        shape.stroke_color = color;
    }
    if let Some(mode) = parsed
        .get(format!("{prefix}FillMode"))
        .and_then(|v| serde_json::from_value::<ShapeFillMode>(v.clone()).ok())
    {
        shape.fill_mode = mode;
    }
    if let Some(color) = read_string(parsed.get(format!("{prefix}FillColor"))) {
        shape.fill_color = color;
    }
    if let Some(color) = read_string(parsed.get(format!("{prefix}GradientStartColor"))) {
        shape.gradient_start_color = color;
    }
    if let Some(color) = read_string(parsed.get(format!("{prefix}GradientEndColor"))) {
        shape.gradient_end_color = color;
    }
    if let Some(kind) = parsed
        .get(format!("{prefix}GradientType"))
        .and_then(|v| serde_json::from_value::<GradientKind>(v.clone()).ok())
    {
        shape.gradient_type = kind;
    }
    if let Some(angle) = read_f32(parsed.get(format!("{prefix}GradientAngle"))) {
        shape.gradient_angle = angle;
    }
    if shape.fill_color.is_empty()
        && let Some(color) = read_string(parsed.get(format!("{prefix}Color")))
    {
        shape.fill_color = color;
    }
}
