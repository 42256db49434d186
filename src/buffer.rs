//! Per-layer pixel buffer storage.
//!
//! Each layer owns one flat, row-major `Vec<String>` of color strings
//! (`index = y * width + x`, `""` = transparent). Buffers are keyed by layer
//! id and live exactly as long as their layer. A monotonically increasing
//! version counter lets renderers poll for "something changed, repaint".

use std::collections::HashMap;

/// One layer's pixels plus the dimensions they were allocated for.
///
/// Dimensions are tracked per buffer so a resize that changes the shape but
/// not the total cell count (e.g. 4×2 -> 2×4) still triggers a content-
/// preserving reallocation instead of silently garbling row alignment.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    cells: Vec<String>,
}

impl PixelBuffer {
    fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        PixelBuffer {
            width,
            height,
            cells: vec![String::new(); width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut Vec<String> {
        &mut self.cells
    }

    /// Content-preserving resize: the overlapping top-left rectangle is
    /// copied cell by cell, newly exposed cells are transparent.
    fn resized(&self, width: u32, height: u32) -> PixelBuffer {
        let mut next = PixelBuffer::new(width, height);
        let copy_w = self.width.min(next.width);
        let copy_h = self.height.min(next.height);
        for y in 0..copy_h {
            for x in 0..copy_w {
                let old_idx = (y * self.width + x) as usize;
                let new_idx = (y * next.width + x) as usize;
                next.cells[new_idx] = self.cells[old_idx].clone();
            }
        }
        next
    }
}

/// Owns every layer's pixel buffer, keyed by layer id.
#[derive(Debug, Default)]
pub struct PixelStore {
    buffers: HashMap<String, PixelBuffer>,
    version: u64,
}

impl PixelStore {
    pub fn new() -> Self {
        PixelStore::default()
    }

    /// Guarantee a `width * height` buffer exists for `layer_id`.
    ///
    /// No-op when the dimensions already match; otherwise reallocates with
    /// top-left content preserved.
    pub fn ensure(&mut self, layer_id: &str, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        match self.buffers.get(layer_id) {
            Some(existing) if existing.width == width && existing.height == height => {}
            Some(existing) => {
                let next = existing.resized(width, height);
                self.buffers.insert(layer_id.to_string(), next);
                self.version += 1;
            }
            None => {
                self.buffers
                    .insert(layer_id.to_string(), PixelBuffer::new(width, height));
                self.version += 1;
            }
        }
    }

    /// The live cell slice for a layer, or an empty slice if absent.
    pub fn cells(&self, layer_id: &str) -> &[String] {
        self.buffers.get(layer_id).map(|b| b.cells()).unwrap_or(&[])
    }

    pub(crate) fn buffer_mut(&mut self, layer_id: &str) -> Option<&mut PixelBuffer> {
        self.buffers.get_mut(layer_id)
    }

    pub fn contains(&self, layer_id: &str) -> bool {
        self.buffers.contains_key(layer_id)
    }

    /// Remove a layer's buffer (when the layer itself is removed).
    pub fn remove(&mut self, layer_id: &str) -> bool {
        let removed = self.buffers.remove(layer_id).is_some();
        if removed {
            self.version += 1;
        }
        removed
    }

    /// Replace a buffer wholesale, padding/truncating `cells` to
    /// `width * height`. Used by history restores and snapshot loading.
    pub(crate) fn insert_raw(&mut self, layer_id: &str, width: u32, height: u32, cells: &[String]) {
        let mut buffer = PixelBuffer::new(width, height);
        let need = buffer.cells.len();
        for (slot, value) in buffer.cells.iter_mut().zip(cells.iter().take(need)) {
            *slot = value.clone();
        }
        self.buffers.insert(layer_id.to_string(), buffer);
        self.version += 1;
    }

    pub(crate) fn clear(&mut self) {
        self.buffers.clear();
        self.version += 1;
    }

    /// Version counter observers poll to know a redraw is needed.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Bump the version after in-place cell mutation by a drawing op.
    pub(crate) fn mark_changed(&mut self) {
        self.version += 1;
    }

    /// Ids of every stored buffer (order unspecified).
    pub(crate) fn layer_ids(&self) -> impl Iterator<Item = &String> {
        self.buffers.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(x: u32, y: u32) -> String {
        format!("m{x}-{y}")
    }

    fn filled_store(w: u32, h: u32) -> PixelStore {
        let mut store = PixelStore::new();
        store.ensure("l1", w, h);
        let buf = store.buffer_mut("l1").unwrap();
        for y in 0..h {
            for x in 0..w {
                buf.cells_mut()[(y * w + x) as usize] = marker(x, y);
            }
        }
        store
    }

    #[test]
    fn resize_preserves_top_left_content() {
        let mut store = filled_store(4, 3);
        store.ensure("l1", 6, 2);
        let cells = store.cells("l1");
        assert_eq!(cells.len(), 12);
        for y in 0..2 {
            for x in 0..4 {
                assert_eq!(cells[(y * 6 + x) as usize], marker(x, y));
            }
            // newly exposed columns are transparent
            assert_eq!(cells[(y * 6 + 4) as usize], "");
            assert_eq!(cells[(y * 6 + 5) as usize], "");
        }
    }

    #[test]
    fn same_length_different_shape_still_reallocates() {
        let mut store = filled_store(4, 2);
        store.ensure("l1", 2, 4);
        let cells = store.cells("l1");
        assert_eq!(cells.len(), 8);
        // the 2x2 overlap keeps its content, everything below is fresh
        assert_eq!(cells[0], marker(0, 0));
        assert_eq!(cells[1], marker(1, 0));
        assert_eq!(cells[2], marker(0, 1));
        assert_eq!(cells[3], marker(1, 1));
        assert!(cells[4..].iter().all(String::is_empty));
    }

    #[test]
    fn ensure_matching_size_is_a_noop() {
        let mut store = filled_store(3, 3);
        let before = store.version();
        store.ensure("l1", 3, 3);
        assert_eq!(store.version(), before);
        assert_eq!(store.cells("l1")[4], marker(1, 1));
    }

    #[test]
    fn missing_layer_reads_empty() {
        let store = PixelStore::new();
        assert!(store.cells("ghost").is_empty());
        assert!(!store.contains("ghost"));
    }

    #[test]
    fn remove_and_version_bumps() {
        let mut store = PixelStore::new();
        let v0 = store.version();
        store.ensure("a", 2, 2);
        assert!(store.version() > v0);
        assert!(store.remove("a"));
        assert!(!store.remove("a"));
        assert!(store.cells("a").is_empty());
    }

    #[test]
    fn insert_raw_pads_and_truncates() {
        let mut store = PixelStore::new();
        store.insert_raw("a", 2, 2, &["x".into(), "y".into()]);
        assert_eq!(store.cells("a"), &["x", "y", "", ""]);
        store.insert_raw("a", 1, 2, &["1".into(), "2".into(), "3".into()]);
        assert_eq!(store.cells("a"), &["1", "2"]);
    }
}
