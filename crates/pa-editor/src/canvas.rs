//! Per-page drawing surfaces.
//!
//! One `PageCanvas` exists for each mounted page. Its `Layer` holds the live
//! shape groups in paint order (last = topmost).

use kurbo::Point;
use pa_core::geometry::{ClientRect, Viewport};
use pa_core::{AnnotationId, ShapeGroup};

#[derive(Debug, Clone, Default)]
pub struct Layer {
    groups: Vec<ShapeGroup>,
}

impl Layer {
    /// Append a group, replacing any existing group with the same id in place.
    pub fn add(&mut self, group: ShapeGroup) {
        match self.groups.iter_mut().find(|g| g.id == group.id) {
            Some(slot) => *slot = group,
            None => self.groups.push(group),
        }
    }

    pub fn remove(&mut self, id: AnnotationId) -> Option<ShapeGroup> {
        let pos = self.groups.iter().position(|g| g.id == id)?;
        Some(self.groups.remove(pos))
    }

    pub fn get(&self, id: AnnotationId) -> Option<&ShapeGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn get_mut(&mut self, id: AnnotationId) -> Option<&mut ShapeGroup> {
        self.groups.iter_mut().find(|g| g.id == id)
    }

    pub fn contains(&self, id: AnnotationId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ShapeGroup> {
        self.groups.iter()
    }

    pub fn ids(&self) -> Vec<AnnotationId> {
        self.groups.iter().map(|g| g.id).collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Topmost visible group whose bounds, grown by `tolerance`, contain `p`.
    pub fn hit_test(&self, p: Point, tolerance: f64) -> Option<AnnotationId> {
        self.groups
            .iter()
            .rev()
            .filter(|g| g.visible)
            .find(|g| g.client_rect().is_some_and(|r| r.inflate(tolerance).contains(p)))
            .map(|g| g.id)
    }
}

#[derive(Debug, Clone)]
pub struct PageCanvas {
    pub page_number: u32,
    pub viewport: Viewport,
    pub layer: Layer,
}

impl PageCanvas {
    pub fn new(page_number: u32, viewport: Viewport) -> Self {
        Self {
            page_number,
            viewport,
            layer: Layer::default(),
        }
    }

    /// Unscaled page height, the flip axis for document space.
    pub fn canvas_height(&self) -> f64 {
        self.viewport.canvas_height()
    }

    /// Adopt a new viewport. Groups stay in canvas space, so only the
    /// surface scale changes.
    pub fn rescale(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// A client rect in page pixels, for the host UI.
    pub fn to_screen(&self, rect: &ClientRect) -> ClientRect {
        rect.scaled(self.viewport.scale)
    }
}
