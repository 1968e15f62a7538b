//! Versioned annotation store.
//!
//! Every non-original mutation pushes a full snapshot of the id → record
//! mapping. Undo/redo move a cursor over the snapshots and replace the live
//! mapping wholesale; callers reconcile their shape groups afterwards.
//!
//! Originals (loaded from the host document or an external feed) never push
//! a snapshot. They are folded into every existing snapshot instead, so
//! undoing past the load point cannot make them disappear.

use crate::error::StoreError;
use crate::id::AnnotationId;
use crate::record::{AnnotationRecord, RecordPatch, timestamp_now};
use indexmap::IndexMap;

type Snapshot = IndexMap<AnnotationId, AnnotationRecord>;

pub struct AnnotationStore {
    live: Snapshot,
    originals: Snapshot,
    history: Vec<Snapshot>,
    cursor: usize,
    /// Maximum number of snapshots kept, including the oldest one.
    max_history: usize,
    dirty: bool,
}

impl AnnotationStore {
    pub fn new(max_history: usize) -> Self {
        Self {
            live: Snapshot::new(),
            originals: Snapshot::new(),
            history: vec![Snapshot::new()],
            cursor: 0,
            max_history: max_history.max(1),
            dirty: false,
        }
    }

    fn push_history(&mut self) {
        self.history.truncate(self.cursor + 1);
        self.history.push(self.live.clone());
        self.cursor += 1;
        if self.history.len() > self.max_history {
            self.history.remove(0);
            self.cursor -= 1;
        }
        self.dirty = true;
    }

    /// Insert or replace a record. Originals bypass history.
    pub fn save(&mut self, record: AnnotationRecord, is_original: bool) -> &AnnotationRecord {
        let id = record.id;
        if is_original {
            self.originals.insert(id, record.clone());
            for snapshot in &mut self.history {
                snapshot.insert(id, record.clone());
            }
            self.live.insert(id, record);
        } else {
            self.live.insert(id, record);
            self.push_history();
        }
        &self.live[&id]
    }

    /// Merge `patch` into an existing record and stamp its date.
    ///
    /// # Errors
    /// `StoreError::NotFound` when `id` is absent; history is untouched.
    pub fn update(&mut self, id: AnnotationId, patch: RecordPatch) -> Result<&AnnotationRecord, StoreError> {
        let Some(record) = self.live.get_mut(&id) else {
            log::warn!("update: annotation {id} not found");
            return Err(StoreError::NotFound(id));
        };
        record.apply(patch);
        record.date = timestamp_now();
        self.push_history();
        Ok(&self.live[&id])
    }

    /// Remove a record. A missing id is a logged no-op.
    pub fn delete(&mut self, id: AnnotationId) -> Option<AnnotationRecord> {
        let Some(removed) = self.live.shift_remove(&id) else {
            log::warn!("delete: annotation {id} not found");
            return None;
        };
        self.push_history();
        Some(removed)
    }

    pub fn get(&self, id: AnnotationId) -> Option<&AnnotationRecord> {
        self.live.get(&id)
    }

    pub fn contains(&self, id: AnnotationId) -> bool {
        self.live.contains_key(&id)
    }

    pub fn by_page(&self, page_number: u32) -> Vec<&AnnotationRecord> {
        self.live
            .values()
            .filter(|r| r.page_number == page_number)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnnotationRecord> {
        self.live.values()
    }

    /// Every live record, in insertion order.
    pub fn records(&self) -> Vec<AnnotationRecord> {
        self.live.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn is_original(&self, id: AnnotationId) -> bool {
        self.originals.contains_key(&id)
    }

    pub fn original(&self, id: AnnotationId) -> Option<&AnnotationRecord> {
        self.originals.get(&id)
    }

    // ─── History ────────────────────────────────────────────────────────

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.history.len()
    }

    /// Number of snapshots held, including the oldest.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.cursor -= 1;
        self.restore();
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.cursor += 1;
        self.restore();
        true
    }

    fn restore(&mut self) {
        self.live = self.history[self.cursor].clone();
        self.dirty = true;
        log::trace!("store restored snapshot {}/{}", self.cursor, self.history.len());
    }

    // ─── Dirty tracking ─────────────────────────────────────────────────

    /// True when something changed since the last `mark_saved`.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new(50)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::AnnotationType;
    use crate::geometry::ClientRect;
    use pretty_assertions::assert_eq;

    fn record(id: &str, page: u32) -> AnnotationRecord {
        AnnotationRecord::new(
            AnnotationId::intern(id),
            page,
            AnnotationType::Rectangle.definition(),
            String::new(),
            ClientRect::new(0.0, 0.0, 10.0, 10.0),
            "tester",
        )
    }

    #[test]
    fn starts_with_single_snapshot() {
        let store = AnnotationStore::new(50);
        assert_eq!(store.history_len(), 1);
        assert!(!store.can_undo());
        assert!(!store.can_redo());
        assert!(!store.is_dirty());
    }

    #[test]
    fn save_pushes_history() {
        let mut store = AnnotationStore::new(50);
        store.save(record("a", 1), false);
        assert_eq!(store.history_len(), 2);
        assert!(store.can_undo());
        assert!(store.is_dirty());
    }

    #[test]
    fn update_merges_and_restamps() {
        let mut store = AnnotationStore::new(50);
        let id = store.save(record("upd", 1), false).id;
        let updated = store.update(id, RecordPatch::title("x")).unwrap();
        assert_eq!(updated.title, "x");
        assert_eq!(store.history_len(), 3);
    }

    #[test]
    fn update_missing_leaves_history() {
        let mut store = AnnotationStore::new(50);
        store.save(record("present", 1), false);
        let before = store.history_len();
        let err = store.update(AnnotationId::intern("missing-id"), RecordPatch::title("x"));
        assert!(matches!(err, Err(StoreError::NotFound(id)) if id.as_str() == "missing-id"));
        assert_eq!(store.history_len(), before);
    }

    #[test]
    fn delete_missing_is_noop() {
        let mut store = AnnotationStore::new(50);
        assert!(store.delete(AnnotationId::intern("ghost")).is_none());
        assert_eq!(store.history_len(), 1);
    }

    #[test]
    fn redo_branch_discarded_on_new_edit() {
        let mut store = AnnotationStore::new(50);
        store.save(record("r1", 1), false);
        store.save(record("r2", 1), false);
        assert!(store.undo());
        assert!(store.can_redo());
        store.save(record("r3", 1), false);
        assert!(!store.can_redo());
        assert!(store.contains(AnnotationId::intern("r1")));
        assert!(!store.contains(AnnotationId::intern("r2")));
        assert!(store.contains(AnnotationId::intern("r3")));
    }

    #[test]
    fn max_history_evicts_oldest() {
        let mut store = AnnotationStore::new(3);
        for i in 0..5 {
            store.save(record(&format!("ev{i}"), 1), false);
        }
        assert_eq!(store.history_len(), 3);
        assert!(store.undo());
        assert!(store.undo());
        assert!(!store.undo());
        // The oldest surviving snapshot already holds ev0..ev2
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn originals_bypass_history_and_survive_undo() {
        let mut store = AnnotationStore::new(50);
        for i in 0..3 {
            store.save(record(&format!("orig{i}"), 1), true);
        }
        assert!(!store.can_undo());
        assert!(!store.is_dirty());
        assert!(store.is_original(AnnotationId::intern("orig0")));

        store.save(record("user", 1), false);
        assert!(store.undo());
        assert_eq!(store.len(), 3);
        assert!(!store.contains(AnnotationId::intern("user")));
    }

    #[test]
    fn by_page_filters() {
        let mut store = AnnotationStore::new(50);
        store.save(record("p1", 1), false);
        store.save(record("p2a", 2), false);
        store.save(record("p2b", 2), false);
        let ids: Vec<_> = store.by_page(2).iter().map(|r| r.id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["p2a", "p2b"]);
    }

    #[test]
    fn mark_saved_clears_dirty() {
        let mut store = AnnotationStore::new(50);
        store.save(record("d", 1), false);
        store.mark_saved();
        assert!(!store.is_dirty());
        store.undo();
        assert!(store.is_dirty());
    }
}
