//! Raster document engine for a pixel-art editor.
//!
//! Pixels are CSS-style color strings in flat row-major buffers, one buffer
//! per layer. Everything routes through [`Document`]: drawing operations,
//! layer and frame management, selections, tool settings, undo/redo, and
//! whole-project snapshots.
//!
//! ```
//! use pixart_core::Document;
//!
//! let mut doc = Document::new(16, 16);
//! let layer = doc.selected_layer_id().to_string();
//! doc.begin_action("stroke");
//! doc.apply_brush(&layer, 4, 4);
//! doc.end_action();
//! assert!(doc.undo());
//! ```

#![warn(clippy::all, rust_2018_idioms)]

pub mod buffer;
pub mod color;
pub mod document;
pub mod geometry;
pub mod history;
pub mod ops;
pub mod selection;
pub mod snapshot;
pub mod tools;

pub use buffer::{PixelBuffer, PixelStore};
pub use color::{Rgb, Rgba, erase_blend, mix, parse_color, parse_hex};
pub use document::{Document, Frame, Layer};
pub use geometry::Point;
pub use history::{History, HistoryEntry, MetaChange, MetaKey, MetaState};
pub use selection::{Selection, SelectionRect, SelectionShape, SelectionState};
pub use snapshot::ProjectSnapshot;
pub use tools::{
    BrushSettings, EraserSettings, FillMode, FillSettings, GradientKind, LineSettings,
    ShapeFillMode, ShapeSettings, ShapeTool, ToolId, ToolSettings,
};
