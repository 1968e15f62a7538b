//! Integration tests: annotation store history (pa-core).
//!
//! Exercises the snapshot history through the public API the painter uses:
//! saves, updates and deletes interleaved with undo/redo.

use pa_core::definitions::AnnotationType;
use pa_core::geometry::ClientRect;
use pa_core::shape::{Paint, Shape, ShapeGroup};
use pa_core::{AnnotationId, AnnotationRecord, AnnotationStore, Color, RecordPatch};
use pretty_assertions::assert_eq;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn rect_record(id: &str, page: u32, x: f64) -> AnnotationRecord {
    let group = ShapeGroup::with_shape(
        AnnotationId::intern(id),
        Shape::Rect {
            x,
            y: 10.0,
            width: 40.0,
            height: 20.0,
            paint: Paint::stroke(Color::RED, 2.0, 1.0),
        },
    );
    AnnotationRecord::new(
        group.id,
        page,
        AnnotationType::Rectangle.definition(),
        group.to_json().unwrap(),
        group.client_rect().unwrap(),
        "tester",
    )
}

fn ids(store: &AnnotationStore) -> Vec<String> {
    store.iter().map(|r| r.id.to_string()).collect()
}

// ─── Monotonicity ───────────────────────────────────────────────────────

#[test]
fn n_mutations_make_n_entries_and_unwind_fully() {
    init_logging();
    let mut store = AnnotationStore::new(50);

    let a = store.save(rect_record("hm-a", 1, 0.0), false).id;
    let b = store.save(rect_record("hm-b", 2, 50.0), false).id;
    store.update(a, RecordPatch::title("edited")).unwrap();
    store.delete(b);
    store
        .update(
            a,
            RecordPatch::shape("{}".to_string(), ClientRect::new(1.0, 1.0, 1.0, 1.0)),
        )
        .unwrap();
    let n = 5;

    assert_eq!(store.history_len(), n + 1);
    let final_state = store.records();

    for _ in 0..n {
        assert!(store.undo());
    }
    assert!(store.is_empty());
    assert!(!store.undo(), "undo at the oldest entry must report false");

    for _ in 0..n {
        assert!(store.redo());
    }
    assert_eq!(store.records(), final_state);
    assert!(!store.redo(), "redo at the newest entry must report false");
}

#[test]
fn boundary_calls_do_not_mutate() {
    init_logging();
    let mut store = AnnotationStore::new(50);
    store.save(rect_record("bd", 1, 0.0), false);
    let before = store.records();
    assert!(!store.redo());
    assert_eq!(store.records(), before);
    assert_eq!(store.history_len(), 2);
}

// ─── Originals ──────────────────────────────────────────────────────────

#[test]
fn repeated_original_loads_never_enable_undo() {
    init_logging();
    let mut store = AnnotationStore::new(50);
    for round in 0..3 {
        for page in 1..=4 {
            store.save(rect_record(&format!("orig-{page}"), page, round as f64), true);
        }
        assert!(!store.can_undo());
    }
    assert_eq!(store.len(), 4);
    assert_eq!(store.history_len(), 1);
}

#[test]
fn undo_after_load_keeps_loaded_records() {
    init_logging();
    let mut store = AnnotationStore::new(50);
    store.save(rect_record("keep-1", 1, 0.0), true);
    store.save(rect_record("drawn", 1, 80.0), false);
    store.save(rect_record("keep-2", 2, 0.0), true);

    assert!(store.undo());
    assert_eq!(ids(&store), vec!["keep-1", "keep-2"]);
    assert!(store.redo());
    assert_eq!(store.len(), 3);
}
