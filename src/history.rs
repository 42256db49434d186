//! Undo/redo history.
//!
//! Low-level pixel writes and settings changes are grouped into atomic,
//! reversible actions. While an action is open (between `begin_action` and
//! `end_action`) every recorded pixel delta is coalesced to one
//! (first-previous, last-next) pair per index, so a long stroke revisiting
//! the same pixel stores one entry instead of one per stamp. Applying all
//! `previous` values of an entry exactly reverses applying all its `next`
//! values.
//!
//! The engine owns the two stacks; the meta-change dispatch table lives in
//! the document service, which drives `pop_undo`/`finish_undo` (and the redo
//! counterparts) around each replay.

use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::document::Layer;
use crate::selection::SelectionState;
use crate::tools::{FillMode, GradientKind, ShapeFillMode, ToolId};

/// Default cap on the undo stack; the oldest entry is evicted past it.
pub const DEFAULT_HISTORY_LIMIT: usize = 200;

/// Identifies what a meta change affects.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MetaKey {
    CurrentTool,
    FillColor,
    FillMode,
    BrushSize,
    BrushColor,
    EraserSize,
    EraserStrength,
    LineThickness,
    LineColor,
    CircleStrokeThickness,
    CircleStrokeColor,
    CircleFillMode,
    CircleFillColor,
    CircleGradientStart,
    CircleGradientEnd,
    CircleGradientType,
    CircleGradientAngle,
    SquareStrokeThickness,
    SquareStrokeColor,
    SquareFillMode,
    SquareFillColor,
    SquareGradientStart,
    SquareGradientEnd,
    SquareGradientType,
    SquareGradientAngle,
    LayersSnapshot,
    CanvasSnapshot,
    SelectionSnapshot,
    /// Forward-compatible escape hatch: unknown keys replay as a no-op.
    Other(String),
}

/// Full layer-list + buffer capture, recorded around structural layer
/// operations (add/remove/reorder/toggle-visibility) so their undo is always
/// whole-state correct.
#[derive(Clone, Debug, PartialEq)]
pub struct LayersSnapshot {
    pub width: u32,
    pub height: u32,
    pub layers: Vec<Layer>,
    pub buffers: HashMap<String, Vec<String>>,
}

/// Canvas-size + buffer capture recorded around a resize.
#[derive(Clone, Debug, PartialEq)]
pub struct CanvasSnapshot {
    pub width: u32,
    pub height: u32,
    pub buffers: HashMap<String, Vec<String>>,
}

/// The typed previous/next payload of a meta change.
#[derive(Clone, Debug, PartialEq)]
pub enum MetaState {
    None,
    Int(i64),
    Float(f32),
    Text(String),
    Tool(ToolId),
    Fill(FillMode),
    ShapeFill(ShapeFillMode),
    Gradient(GradientKind),
    Layers(LayersSnapshot),
    Canvas(CanvasSnapshot),
    Selection(Option<SelectionState>),
}

/// One reversible settings/structure change.
#[derive(Clone, Debug, PartialEq)]
pub struct MetaChange {
    pub key: MetaKey,
    pub previous: MetaState,
    pub next: MetaState,
}

/// Net pixel deltas for one layer within one action (parallel arrays).
#[derive(Clone, Debug, PartialEq)]
pub struct LayerDelta {
    pub layer_id: String,
    pub indices: Vec<usize>,
    pub previous: Vec<String>,
    pub next: Vec<String>,
}

/// One undoable unit.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub pixel_changes: Vec<LayerDelta>,
    pub meta_changes: Vec<MetaChange>,
    pub label: String,
}

/// In-progress accumulation between `begin_action` and `end_action`.
/// Per layer, a map from pixel index to (first previous, latest next).
struct ActionBuilder {
    label: String,
    pixels: BTreeMap<String, BTreeMap<usize, (String, String)>>,
    meta: Vec<MetaChange>,
}

/// Bounded undo/redo stacks plus the open action, if any.
pub struct History {
    undo: VecDeque<HistoryEntry>,
    redo: Vec<HistoryEntry>,
    limit: usize,
    open: Option<ActionBuilder>,
    undo_version: u64,
    redo_version: u64,
}

impl Default for History {
    fn default() -> Self {
        History::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn with_limit(limit: usize) -> Self {
        History {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit: limit.max(1),
            open: None,
            undo_version: 0,
            redo_version: 0,
        }
    }

    /// Open a fresh action. An already-open action is closed first; that is
    /// the defined recovery policy for unpaired brackets, not an error.
    pub fn begin_action(&mut self, label: &str) {
        if self.open.is_some() {
            self.end_action();
        }
        self.open = Some(ActionBuilder {
            label: label.to_string(),
            pixels: BTreeMap::new(),
            meta: Vec::new(),
        });
    }

    pub fn is_recording(&self) -> bool {
        self.open.is_some()
    }

    /// Record one pixel mutation into the open action. Outside an action
    /// this is a no-op (the mutation is then not undoable, matching direct
    /// un-bracketed writes).
    pub fn record(&mut self, layer_id: &str, index: usize, previous: &str, next: &str) {
        let Some(action) = self.open.as_mut() else { return };
        let layer = action.pixels.entry(layer_id.to_string()).or_default();
        layer
            .entry(index)
            .and_modify(|delta| delta.1 = next.to_string())
            .or_insert_with(|| (previous.to_string(), next.to_string()));
    }

    /// Close the open action. Actions that accumulated nothing are
    /// discarded so no-ops never pollute the undo stack. Returns whether an
    /// entry was pushed.
    pub fn end_action(&mut self) -> bool {
        let Some(action) = self.open.take() else { return false };
        let mut pixel_changes = Vec::with_capacity(action.pixels.len());
        for (layer_id, deltas) in action.pixels {
            let mut change = LayerDelta {
                layer_id,
                indices: Vec::with_capacity(deltas.len()),
                previous: Vec::with_capacity(deltas.len()),
                next: Vec::with_capacity(deltas.len()),
            };
            for (index, (prev, next)) in deltas {
                change.indices.push(index);
                change.previous.push(prev);
                change.next.push(next);
            }
            pixel_changes.push(change);
        }
        if pixel_changes.is_empty() && action.meta.is_empty() {
            return false;
        }
        self.push_entry(HistoryEntry {
            pixel_changes,
            meta_changes: action.meta,
            label: action.label,
        });
        true
    }

    /// Record a settings/structure change: appended to the open action when
    /// recording, otherwise pushed as a standalone one-entry record.
    pub fn commit_meta(&mut self, change: MetaChange) {
        if let Some(action) = self.open.as_mut() {
            action.meta.push(change);
            return;
        }
        let label = format!("{:?}", change.key);
        self.push_entry(HistoryEntry {
            pixel_changes: Vec::new(),
            meta_changes: vec![change],
            label,
        });
    }

    fn push_entry(&mut self, entry: HistoryEntry) {
        self.undo.push_back(entry);
        while self.undo.len() > self.limit {
            self.undo.pop_front();
            log::debug!("history limit {} reached, oldest entry evicted", self.limit);
        }
        // any new action invalidates the redo branch
        self.redo.clear();
        self.undo_version += 1;
        self.redo_version += 1;
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Take the entry to undo. The caller applies its `previous` values and
    /// hands it back through [`History::finish_undo`].
    pub(crate) fn pop_undo(&mut self) -> Option<HistoryEntry> {
        self.undo.pop_back()
    }

    pub(crate) fn finish_undo(&mut self, entry: HistoryEntry) {
        self.redo.push(entry);
        self.undo_version += 1;
        self.redo_version += 1;
    }

    pub(crate) fn pop_redo(&mut self) -> Option<HistoryEntry> {
        self.redo.pop()
    }

    pub(crate) fn finish_redo(&mut self, entry: HistoryEntry) {
        self.undo.push_back(entry);
        self.undo_version += 1;
        self.redo_version += 1;
    }

    /// Empty both stacks (new project).
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.open = None;
        self.undo_version = 0;
        self.redo_version = 0;
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn undo_version(&self) -> u64 {
        self.undo_version
    }

    pub fn redo_version(&self) -> u64 {
        self.redo_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel_entry(history: &mut History) -> bool {
        history.begin_action("stroke");
        history.record("l1", 0, "", "#000000");
        history.end_action()
    }

    #[test]
    fn empty_action_is_discarded() {
        let mut history = History::default();
        history.begin_action("noop");
        assert!(!history.end_action());
        assert!(!history.can_undo());
    }

    #[test]
    fn revisited_pixel_coalesces_to_net_delta() {
        let mut history = History::default();
        history.begin_action("scribble");
        history.record("l1", 5, "", "#111111");
        history.record("l1", 5, "#111111", "#222222");
        history.record("l1", 5, "#222222", "#333333");
        assert!(history.end_action());

        let entry = history.pop_undo().unwrap();
        assert_eq!(entry.pixel_changes.len(), 1);
        let delta = &entry.pixel_changes[0];
        assert_eq!(delta.indices, vec![5]);
        assert_eq!(delta.previous, vec![String::new()]);
        assert_eq!(delta.next, vec!["#333333".to_string()]);
    }

    #[test]
    fn nested_begin_closes_previous_action() {
        let mut history = History::default();
        history.begin_action("first");
        history.record("l1", 0, "", "a");
        history.begin_action("second");
        history.record("l1", 1, "", "b");
        history.end_action();
        assert_eq!(history.undo_len(), 2);
    }

    #[test]
    fn new_entry_clears_redo() {
        let mut history = History::default();
        pixel_entry(&mut history);
        let entry = history.pop_undo().unwrap();
        history.finish_undo(entry);
        assert!(history.can_redo());
        pixel_entry(&mut history);
        assert!(!history.can_redo());
    }

    #[test]
    fn limit_evicts_oldest() {
        let mut history = History::with_limit(3);
        for i in 0..5 {
            history.begin_action("a");
            history.record("l1", i, "", "x");
            history.end_action();
        }
        assert_eq!(history.undo_len(), 3);
        // oldest surviving entry touches index 2
        let mut indices = Vec::new();
        while let Some(entry) = history.pop_undo() {
            indices.push(entry.pixel_changes[0].indices[0]);
        }
        assert_eq!(indices, vec![4, 3, 2]);
    }

    #[test]
    fn standalone_meta_outside_action() {
        let mut history = History::default();
        history.commit_meta(MetaChange {
            key: MetaKey::BrushSize,
            previous: MetaState::Int(1),
            next: MetaState::Int(4),
        });
        assert_eq!(history.undo_len(), 1);
        let entry = history.pop_undo().unwrap();
        assert!(entry.pixel_changes.is_empty());
        assert_eq!(entry.meta_changes[0].key, MetaKey::BrushSize);
    }

    #[test]
    fn meta_inside_action_rides_along() {
        let mut history = History::default();
        history.begin_action("combo");
        history.record("l1", 0, "", "x");
        history.commit_meta(MetaChange {
            key: MetaKey::SelectionSnapshot,
            previous: MetaState::Selection(None),
            next: MetaState::Selection(None),
        });
        history.end_action();
        assert_eq!(history.undo_len(), 1);
        let entry = history.pop_undo().unwrap();
        assert_eq!(entry.pixel_changes.len(), 1);
        assert_eq!(entry.meta_changes.len(), 1);
    }
}
