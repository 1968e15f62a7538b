//! Shape-group registry.
//!
//! Each editor tracks the ids of the groups it owns on its page. The groups
//! themselves live on the page canvas layer, so remounting a page only needs
//! the serialized form to rebuild them.

use crate::canvas::PageCanvas;
use indexmap::IndexSet;
use pa_core::{AnnotationId, ShapeError, ShapeGroup};

#[derive(Debug, Default)]
pub struct ShapeGroupRegistry {
    ids: IndexSet<AnnotationId>,
}

impl ShapeGroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an empty group with a fresh id and attach it to the canvas.
    /// The group is not in the store yet.
    pub fn create_group(&mut self, canvas: &mut PageCanvas) -> AnnotationId {
        let id = AnnotationId::generate();
        canvas.layer.add(ShapeGroup::new(id));
        self.ids.insert(id);
        id
    }

    /// Attach an already built group.
    pub fn add_group(&mut self, canvas: &mut PageCanvas, group: ShapeGroup) -> AnnotationId {
        let id = group.id;
        canvas.layer.add(group);
        self.ids.insert(id);
        id
    }

    /// Rebuild a group from its serialized form onto `canvas`.
    pub fn add_serialized_group_to_layer(
        &mut self,
        canvas: &mut PageCanvas,
        serialized: &str,
    ) -> Result<AnnotationId, ShapeError> {
        let group = ShapeGroup::from_json(serialized)?;
        log::trace!("restored group {} on page {}", group.id, canvas.page_number);
        Ok(self.add_group(canvas, group))
    }

    /// Remove a group from the canvas and the registry. Idempotent.
    pub fn delete_group(&mut self, id: AnnotationId, canvas: &mut PageCanvas) {
        self.ids.shift_remove(&id);
        canvas.layer.remove(id);
    }

    pub fn get_group_by_id<'c>(&self, id: AnnotationId, canvas: &'c PageCanvas) -> Option<&'c ShapeGroup> {
        if !self.ids.contains(&id) {
            return None;
        }
        canvas.layer.get(id)
    }

    pub fn get_group_mut<'c>(&self, id: AnnotationId, canvas: &'c mut PageCanvas) -> Option<&'c mut ShapeGroup> {
        if !self.ids.contains(&id) {
            return None;
        }
        canvas.layer.get_mut(id)
    }

    pub fn contains(&self, id: AnnotationId) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = AnnotationId> + '_ {
        self.ids.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Forget every id without touching a canvas (the canvas is gone).
    pub fn clear(&mut self) {
        self.ids.clear();
    }
}
