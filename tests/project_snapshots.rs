//! Snapshot export/restore against a live editing session.

use pixart_core::{Document, SelectionShape};
use serde_json::json;

#[test]
fn snapshot_survives_a_full_editing_session() {
    let mut doc = Document::new(12, 12);
    let base = doc.selected_layer_id().to_string();
    let top = doc.add_layer(Some("Outline"));

    doc.set_brush_color("#aa5500");
    doc.begin_action("paint");
    doc.apply_brush(&base, 2, 2);
    doc.apply_brush(&top, 3, 3);
    doc.end_action();

    doc.begin_selection(1, 1, SelectionShape::Ellipse);
    doc.update_selection(6, 6);
    doc.end_selection();

    let value = serde_json::to_value(doc.export_snapshot()).unwrap();

    let mut restored = Document::new(1, 1);
    assert!(restored.restore_snapshot(&value));
    assert_eq!(restored.width(), 12);
    assert_eq!(restored.layers().len(), 2);
    assert_eq!(restored.layers()[0].name, "Outline");
    assert_eq!(restored.selected_layer_id(), top);
    assert_eq!(restored.buffer(&base)[2 * 12 + 2], "#aa5500");
    assert_eq!(restored.buffer(&top)[3 * 12 + 3], "#aa5500");
    assert_eq!(restored.tools().brush.color, "#aa5500");
    // the ellipse selection comes back as its bounding rect (shape is not
    // part of the wire format unless a lasso polygon is present)
    assert!(restored.selection().is_active());
    assert_eq!(restored.selection().rect().map(|r| r.width), Some(6));
}

#[test]
fn editing_continues_normally_after_a_restore() {
    let mut doc = Document::new(4, 4);
    let snapshot = json!({
        "canvas": { "width": 6, "height": 6 },
        "layers": [{ "id": "art", "name": "Art", "visible": true, "locked": false }],
        "layerBuffers": { "art": [] },
        "selectedLayerId": "art",
    });
    assert!(doc.restore_snapshot(&snapshot));
    assert!(doc.is_saved());

    doc.begin_action("paint");
    assert_eq!(doc.apply_brush("art", 0, 0), 1);
    doc.end_action();
    assert!(!doc.is_saved());
    assert!(doc.undo());
    assert_eq!(doc.buffer("art")[0], "");
}

#[test]
fn restore_never_panics_on_hostile_input() {
    let mut doc = Document::new(4, 4);
    let hostile = json!({
        "canvas": { "width": -3, "height": 1e18 },
        "layers": "not an array",
        "layerBuffers": { "x": { "nested": "object" } },
        "selectedLayerId": 7,
        "selection": { "x": "left" },
        "selectionPolygon": [{ "x": 1 }, "point"],
        "frames": [],
        "brush": [],
    });
    assert!(doc.restore_snapshot(&hostile));
    // untouched where the input was garbage
    assert_eq!(doc.width(), 4);
    assert_eq!(doc.layers().len(), 1);
    assert_eq!(doc.frames().len(), 1);
    assert!(!doc.selection().is_active());
}
