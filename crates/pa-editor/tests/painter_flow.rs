//! Integration tests: painter orchestration (pa-editor).
//!
//! Drives the painter through host page events and pointer input with a
//! recording host, then checks the store, the live canvases and every
//! callback the host saw.

use pa_core::definitions::{AnnotationTypeDefinition, HostEditorType};
use pa_core::geometry::ClientRect;
use pa_core::native::{HostAnnotation, HostPage, NativeAnnotation, NativeBody};
use pa_core::shape::{Paint, Shape};
use pa_core::{
    AnnotationId, AnnotationRecord, AnnotationType, Color, CommentStatus, PainterConfig, PainterError, RecordPatch,
    ShapeGroup, StoreError, Viewport,
};
use pa_editor::bindings::PageSelection;
use pa_editor::input::{InputEvent, KeyEvent};
use pa_editor::{HostBindings, HostEvent, Painter, PainterMode, TextInput, TextRequest, TextSelection, TextSpan};
use pretty_assertions::assert_eq;

const PAGE_HEIGHT: f64 = 792.0;

// ─── Recording host ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Call {
    StoreAdd { id: String, is_original: bool },
    StoreDelete(String),
    Selected { id: String, is_click: bool },
    Change(String),
    Changing,
    Changed(String),
    WebSelection(String),
    DefaultMode,
    TextRequested(AnnotationType),
}

#[derive(Debug, Default)]
struct RecordingHost {
    calls: Vec<Call>,
    natives: Vec<(String, NativeAnnotation)>,
    scrolled: Vec<u32>,
    pages: Vec<HostPage>,
}

impl RecordingHost {
    fn last_native(&self) -> &(String, NativeAnnotation) {
        self.natives.last().expect("nothing mirrored")
    }

    fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }
}

impl HostBindings for RecordingHost {
    fn on_store_add(
        &mut self,
        record: &AnnotationRecord,
        is_original: bool,
        _definition: Option<&'static AnnotationTypeDefinition>,
    ) {
        self.calls.push(Call::StoreAdd {
            id: record.id.to_string(),
            is_original,
        });
    }

    fn on_store_delete(&mut self, id: AnnotationId) {
        self.calls.push(Call::StoreDelete(id.to_string()));
    }

    fn on_annotation_selected(&mut self, record: &AnnotationRecord, is_click: bool, _rect: ClientRect) {
        self.calls.push(Call::Selected {
            id: record.id.to_string(),
            is_click,
        });
    }

    fn on_annotation_change(&mut self, record: &AnnotationRecord) {
        self.calls.push(Call::Change(record.id.to_string()));
    }

    fn on_annotation_changing(&mut self) {
        self.calls.push(Call::Changing);
    }

    fn on_annotation_changed(&mut self, record: &AnnotationRecord, _rect: ClientRect) {
        self.calls.push(Call::Changed(record.id.to_string()));
    }

    fn on_web_selection_selected(&mut self, selection: &TextSelection) {
        let text = selection.pages.iter().map(PageSelection::text).collect();
        self.calls.push(Call::WebSelection(text));
    }

    fn set_default_mode(&mut self) {
        self.calls.push(Call::DefaultMode);
    }

    fn request_text_input(&mut self, request: &TextRequest) {
        self.calls.push(Call::TextRequested(request.kind));
    }

    fn write_native(&mut self, id: &str, value: &NativeAnnotation) {
        self.natives.push((id.to_string(), value.clone()));
    }

    fn host_pages(&mut self) -> Vec<HostPage> {
        self.pages.clone()
    }

    fn scroll_into_view(&mut self, page_number: u32, _rect: ClientRect) {
        self.scrolled.push(page_number);
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn painter() -> Painter<RecordingHost> {
    painter_with(PainterConfig::default())
}

fn painter_with(config: PainterConfig) -> Painter<RecordingHost> {
    init_logging();
    Painter::new(RecordingHost::default(), config)
}

fn render(painter: &mut Painter<RecordingHost>, page_number: u32) -> Result<(), PainterError> {
    painter.handle_host_event(HostEvent::PageRendered {
        page_number,
        viewport: Viewport::new(612.0, PAGE_HEIGHT, 1.0),
    })
}

fn drag(painter: &mut Painter<RecordingHost>, page: u32, from: (f64, f64), to: (f64, f64)) {
    painter.pointer_event(page, InputEvent::down(from.0, from.1)).unwrap();
    painter.pointer_event(page, InputEvent::moved(to.0, to.1)).unwrap();
    painter.pointer_event(page, InputEvent::up(to.0, to.1)).unwrap();
}

/// Draw a rectangle on page 1 and return its id.
fn draw_rectangle(painter: &mut Painter<RecordingHost>, from: (f64, f64), to: (f64, f64)) -> AnnotationId {
    painter.activate(Some(AnnotationType::Rectangle.definition()), None);
    drag(painter, 1, from, to);
    painter.get_data().last().map(|r| r.id).expect("no rectangle saved")
}

fn rect_record(id: &str, page: u32) -> AnnotationRecord {
    let group = ShapeGroup::with_shape(
        AnnotationId::intern(id),
        Shape::Rect {
            x: 40.0,
            y: 40.0,
            width: 60.0,
            height: 30.0,
            paint: Paint::stroke(Color::RED, 2.0, 1.0),
        },
    );
    AnnotationRecord::new(
        group.id,
        page,
        AnnotationType::Rectangle.definition(),
        group.to_json().unwrap(),
        group.client_rect().unwrap(),
        "loader",
    )
}

fn selection(page_number: u32, spans: &[(&str, f64)]) -> TextSelection {
    TextSelection {
        pages: vec![PageSelection {
            page_number,
            origin: ClientRect::new(0.0, 0.0, 612.0, PAGE_HEIGHT),
            spans: spans
                .iter()
                .map(|(text, x)| TextSpan::new(*text, ClientRect::new(*x, 100.0, 50.0, 12.0)))
                .collect(),
        }],
    }
}

// ─── Drawing ────────────────────────────────────────────────────────────

#[test]
fn rectangle_drag_saves_record_and_mirrors_native_rect() {
    let mut painter = painter();
    render(&mut painter, 1).unwrap();
    painter.activate(Some(AnnotationType::Rectangle.definition()), None);
    assert_eq!(painter.mode(), PainterMode::Painting(AnnotationType::Rectangle));

    drag(&mut painter, 1, (10.0, 10.0), (110.0, 60.0));

    let data = painter.get_data();
    assert_eq!(data.len(), 1);
    let record = &data[0];
    assert_eq!(record.kind, AnnotationType::Rectangle);
    assert!(
        record
            .bounding_client_rect
            .approx_eq(&ClientRect::new(10.0, 10.0, 100.0, 50.0), 1e-9)
    );
    let group = ShapeGroup::from_json(&record.serialized_shape).unwrap();
    assert_eq!(group.id, record.id);

    let (native_key, native) = painter.bindings().last_native();
    assert_eq!(native_key, &format!("pdfjs_internal_editor_{}", record.id));
    assert_eq!(native.annotation_type, HostEditorType::Ink);
    assert_eq!(native.rect, [10.0, PAGE_HEIGHT - 60.0, 110.0, PAGE_HEIGHT - 10.0]);

    // Rectangle is single-use.
    assert_eq!(painter.mode(), PainterMode::Default);
    assert_eq!(
        painter.bindings().calls,
        vec![
            Call::StoreAdd {
                id: record.id.to_string(),
                is_original: false,
            },
            Call::DefaultMode,
        ]
    );
    painter.check_consistency().unwrap();
}

#[test]
fn zero_size_drag_creates_nothing_and_keeps_tool() {
    let mut painter = painter();
    render(&mut painter, 1).unwrap();
    painter.activate(Some(AnnotationType::Rectangle.definition()), None);
    drag(&mut painter, 1, (30.0, 30.0), (30.0, 30.0));

    assert!(painter.get_data().is_empty());
    assert!(painter.bindings().calls.is_empty());
    assert_eq!(painter.mode(), PainterMode::Painting(AnnotationType::Rectangle));
    assert!(painter.canvas(1).unwrap().layer.is_empty());
}

#[test]
fn pointer_on_unmounted_page_is_unknown() {
    let mut painter = painter();
    painter.activate(Some(AnnotationType::Freehand.definition()), None);
    let err = painter.pointer_event(4, InputEvent::down(1.0, 1.0)).unwrap_err();
    assert!(matches!(err, PainterError::UnknownPage(4)));
}

#[test]
fn free_text_waits_for_text_then_finishes() {
    let mut painter = painter();
    render(&mut painter, 1).unwrap();
    painter.activate(Some(AnnotationType::FreeText.definition()), None);
    painter.pointer_event(1, InputEvent::down(50.0, 50.0)).unwrap();
    painter.pointer_event(1, InputEvent::up(50.0, 50.0)).unwrap();
    assert_eq!(painter.bindings().calls, vec![Call::TextRequested(AnnotationType::FreeText)]);
    assert!(painter.get_data().is_empty());

    painter.complete_text_input(Some(TextInput::new("Hello"))).unwrap();
    let data = painter.get_data();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].kind, AnnotationType::FreeText);
    assert_eq!(data[0].contents.text, "Hello");
    assert_eq!(painter.mode(), PainterMode::Default);
    match &painter.bindings().last_native().1.body {
        NativeBody::FreeText { value, .. } => assert_eq!(value, "Hello"),
        other => panic!("expected free text body, got {other:?}"),
    }
    painter.check_consistency().unwrap();
}

#[test]
fn escape_cancels_pending_placement() {
    let mut painter = painter();
    render(&mut painter, 1).unwrap();
    painter.activate(Some(AnnotationType::FreeText.definition()), None);
    painter.pointer_event(1, InputEvent::down(50.0, 50.0)).unwrap();
    painter.pointer_event(1, InputEvent::up(50.0, 50.0)).unwrap();

    assert!(painter.key_event(&KeyEvent::plain("Escape")).unwrap());
    assert_eq!(painter.mode(), PainterMode::Default);
    assert_eq!(painter.bindings().count(&Call::DefaultMode), 1);
    assert!(painter.canvas(1).unwrap().layer.is_empty());

    // A late answer to the dismissed request is ignored.
    painter.complete_text_input(Some(TextInput::new("late"))).unwrap();
    assert!(painter.get_data().is_empty());
}

#[test]
fn stamp_payload_places_image() {
    let mut painter = painter();
    render(&mut painter, 1).unwrap();
    painter.activate(
        Some(AnnotationType::Stamp.definition()),
        Some("https://example.org/approved.png"),
    );
    painter.pointer_event(1, InputEvent::moved(200.0, 150.0)).unwrap();
    painter.pointer_event(1, InputEvent::down(200.0, 150.0)).unwrap();
    painter.pointer_event(1, InputEvent::up(200.0, 150.0)).unwrap();

    let data = painter.get_data();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].contents.image.as_deref(), Some("https://example.org/approved.png"));
    assert_eq!(painter.mode(), PainterMode::Default);
    match &painter.bindings().last_native().1.body {
        NativeBody::Stamp { image } => assert_eq!(image, "https://example.org/approved.png"),
        other => panic!("expected stamp body, got {other:?}"),
    }
}

// ─── Eraser and deletion ────────────────────────────────────────────────

#[test]
fn eraser_stroke_deletes_touched_records_once() {
    let mut painter = painter();
    render(&mut painter, 1).unwrap();
    let id = draw_rectangle(&mut painter, (10.0, 10.0), (110.0, 60.0));

    painter.activate(Some(AnnotationType::Eraser.definition()), None);
    painter.pointer_event(1, InputEvent::down(5.0, 35.0)).unwrap();
    painter.pointer_event(1, InputEvent::moved(8.0, 36.0)).unwrap();
    painter.pointer_event(1, InputEvent::moved(12.0, 37.0)).unwrap();
    painter.pointer_event(1, InputEvent::up(12.0, 37.0)).unwrap();

    assert!(painter.get_data().is_empty());
    assert_eq!(painter.bindings().count(&Call::StoreDelete(id.to_string())), 1);
    assert!(!painter.canvas(1).unwrap().layer.contains(id));
    assert_eq!(painter.mode(), PainterMode::Painting(AnnotationType::Eraser));
    match &painter.bindings().last_native().1.body {
        NativeBody::Deleted { deleted } => assert!(*deleted),
        other => panic!("expected deleted marker, got {other:?}"),
    }
    painter.check_consistency().unwrap();
}

#[test]
fn click_select_then_delete_key_removes_record() {
    let mut painter = painter();
    render(&mut painter, 1).unwrap();
    let id = draw_rectangle(&mut painter, (10.0, 10.0), (110.0, 60.0));

    painter.pointer_event(1, InputEvent::down(60.0, 35.0)).unwrap();
    painter.pointer_event(1, InputEvent::up(60.0, 35.0)).unwrap();
    assert_eq!(painter.selector().selected(), Some(id));
    assert_eq!(
        painter.bindings().count(&Call::Selected {
            id: id.to_string(),
            is_click: true,
        }),
        1
    );

    assert!(painter.key_event(&KeyEvent::plain("Delete")).unwrap());
    assert!(painter.get_data().is_empty());
    assert_eq!(painter.selector().selected(), None);
    assert_eq!(painter.bindings().count(&Call::StoreDelete(id.to_string())), 1);
}

#[test]
fn dragging_selection_updates_record() {
    let mut painter = painter();
    render(&mut painter, 1).unwrap();
    let id = draw_rectangle(&mut painter, (10.0, 10.0), (110.0, 60.0));

    drag(&mut painter, 1, (60.0, 35.0), (70.0, 45.0));

    let record = painter.store().get(id).unwrap().clone();
    assert!(
        record
            .bounding_client_rect
            .approx_eq(&ClientRect::new(20.0, 20.0, 100.0, 50.0), 1e-9)
    );
    let calls = &painter.bindings().calls;
    assert!(calls.contains(&Call::Changing));
    assert!(calls.contains(&Call::Change(id.to_string())));
    assert_eq!(calls.last(), Some(&Call::Changed(id.to_string())));

    // The move is one history step.
    assert!(painter.undo().unwrap());
    let restored = painter.store().get(id).unwrap();
    assert!(
        restored
            .bounding_client_rect
            .approx_eq(&ClientRect::new(10.0, 10.0, 100.0, 50.0), 1e-9)
    );
    painter.check_consistency().unwrap();
}

#[test]
fn delete_of_unmounted_record_needs_no_group() {
    let mut painter = painter();
    painter.init_annotations(vec![rect_record("far-away", 7)], false);
    let removed = painter.delete(AnnotationId::intern("far-away"), false).unwrap();
    assert!(removed.is_some());
    assert!(painter.get_data().is_empty());
    assert!(
        !painter
            .bindings()
            .calls
            .contains(&Call::StoreDelete("far-away".to_string()))
    );
}

#[test]
fn missing_group_on_mounted_page_is_desync() {
    let mut painter = painter();
    render(&mut painter, 1).unwrap();
    let mut broken = rect_record("broken-shape", 1);
    broken.serialized_shape = "not a shape".to_string();
    painter.init_annotations(vec![broken], false);

    let id = AnnotationId::intern("broken-shape");
    assert!(matches!(painter.check_consistency(), Err(PainterError::Desync(d)) if d == id));
    assert!(matches!(painter.delete(id, true), Err(PainterError::Desync(d)) if d == id));
    // The record survives the failed delete.
    assert!(painter.store().contains(id));
}

// ─── Store operations ───────────────────────────────────────────────────

#[test]
fn update_of_missing_id_is_not_found_and_leaves_history() {
    let mut painter = painter();
    render(&mut painter, 1).unwrap();
    draw_rectangle(&mut painter, (10.0, 10.0), (110.0, 60.0));
    let history = painter.store().history_len();

    let err = painter
        .update(AnnotationId::intern("missing-id"), RecordPatch::title("x"))
        .unwrap_err();
    assert!(matches!(err, PainterError::Store(StoreError::NotFound(_))));
    assert_eq!(painter.store().history_len(), history);
}

#[test]
fn update_with_new_shape_rebuilds_live_group() {
    let mut painter = painter();
    render(&mut painter, 1).unwrap();
    let id = draw_rectangle(&mut painter, (10.0, 10.0), (110.0, 60.0));

    let moved = ShapeGroup::with_shape(
        id,
        Shape::Rect {
            x: 200.0,
            y: 300.0,
            width: 10.0,
            height: 10.0,
            paint: Paint::stroke(Color::BLACK, 1.0, 1.0),
        },
    );
    let patch = RecordPatch::shape(moved.to_json().unwrap(), moved.client_rect().unwrap());
    let record = painter.update(id, patch).unwrap();
    assert_eq!(record.bounding_client_rect, ClientRect::new(200.0, 300.0, 10.0, 10.0));

    let live = painter.canvas(1).unwrap().layer.get(id).unwrap();
    assert_eq!(live.client_rect(), Some(ClientRect::new(200.0, 300.0, 10.0, 10.0)));
    assert_eq!(painter.bindings().last_native().1.rect, [200.0, 482.0, 210.0, 492.0]);
}

#[test]
fn style_change_applies_editable_fields() {
    let mut painter = painter();
    render(&mut painter, 1).unwrap();
    let id = draw_rectangle(&mut painter, (10.0, 10.0), (110.0, 60.0));

    let style = pa_core::definitions::AnnotationStyle {
        color: Some(Color::rgb(0, 0, 255)),
        ..pa_core::definitions::AnnotationStyle::EMPTY
    };
    let record = painter.update_annotation_style(id, &style).unwrap().unwrap();
    assert_eq!(record.color, Some(Color::rgb(0, 0, 255)));
    let live = painter.canvas(1).unwrap().layer.get(id).unwrap();
    assert_eq!(live.color(), Some(Color::rgb(0, 0, 255)));
}

#[test]
fn comments_round_through_history() {
    let mut painter = painter();
    render(&mut painter, 1).unwrap();
    let id = draw_rectangle(&mut painter, (10.0, 10.0), (110.0, 60.0));

    let comment = painter.add_comment(id, "looks good").unwrap();
    assert_eq!(comment.title, painter.config().user_name);
    assert!(
        painter
            .update_comment(id, &comment.id, "edited", Some(CommentStatus::Accepted))
            .unwrap()
    );
    assert!(!painter.remove_comment(id, "no-such-comment").unwrap());
    assert!(painter.remove_comment(id, &comment.id).unwrap());
    assert!(painter.store().get(id).unwrap().comments.is_empty());

    assert!(painter.undo().unwrap());
    let comments = &painter.store().get(id).unwrap().comments;
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].content, "edited");
    assert_eq!(comments[0].status, CommentStatus::Accepted);
}

#[test]
fn comment_on_missing_record_is_not_found() {
    let mut painter = painter();
    let err = painter.add_comment(AnnotationId::intern("nobody"), "hi").unwrap_err();
    assert!(matches!(err, PainterError::Store(StoreError::NotFound(_))));
}

// ─── History ────────────────────────────────────────────────────────────

#[test]
fn undo_and_redo_reconcile_live_groups() {
    let mut painter = painter();
    render(&mut painter, 1).unwrap();
    let id = draw_rectangle(&mut painter, (10.0, 10.0), (110.0, 60.0));

    assert!(painter.undo().unwrap());
    assert!(painter.get_data().is_empty());
    assert!(!painter.canvas(1).unwrap().layer.contains(id));
    assert_eq!(painter.bindings().count(&Call::StoreDelete(id.to_string())), 1);
    assert!(matches!(painter.bindings().last_native().1.body, NativeBody::Deleted { .. }));
    painter.check_consistency().unwrap();

    // Nothing further back.
    assert!(!painter.undo().unwrap());

    assert!(painter.redo().unwrap());
    assert!(painter.canvas(1).unwrap().layer.contains(id));
    assert_eq!(
        painter.bindings().count(&Call::StoreAdd {
            id: id.to_string(),
            is_original: false,
        }),
        2
    );
    assert!(!painter.redo().unwrap());
    painter.check_consistency().unwrap();
}

#[test]
fn undo_never_removes_originals() {
    let mut painter = painter();
    render(&mut painter, 1).unwrap();
    painter.init_annotations(vec![rect_record("original-rect", 1)], false);
    assert!(!painter.can_undo());

    draw_rectangle(&mut painter, (200.0, 200.0), (260.0, 240.0));
    assert!(painter.undo().unwrap());
    let ids: Vec<String> = painter.get_data().iter().map(|r| r.id.to_string()).collect();
    assert_eq!(ids, vec!["original-rect".to_string()]);
    assert!(painter.canvas(1).unwrap().layer.contains(AnnotationId::intern("original-rect")));
    painter.check_consistency().unwrap();
}

#[test]
fn dirty_flag_tracks_user_changes() {
    let mut painter = painter();
    render(&mut painter, 1).unwrap();
    painter.init_annotations(vec![rect_record("loaded-clean", 1)], false);
    assert!(!painter.has_unsaved_changes());

    draw_rectangle(&mut painter, (10.0, 10.0), (110.0, 60.0));
    assert!(painter.has_unsaved_changes());
    painter.mark_saved();
    assert!(!painter.has_unsaved_changes());

    painter.undo().unwrap();
    assert!(painter.has_unsaved_changes());
}

// ─── Page lifecycle ─────────────────────────────────────────────────────

#[test]
fn unmount_keeps_records_and_remount_rebuilds_groups() {
    let mut painter = painter();
    render(&mut painter, 1).unwrap();
    let id = draw_rectangle(&mut painter, (10.0, 10.0), (110.0, 60.0));

    painter
        .handle_host_event(HostEvent::PageUnmounted { page_number: 1 })
        .unwrap();
    assert!(painter.canvas(1).is_none());
    assert_eq!(painter.get_data().len(), 1);
    painter.check_consistency().unwrap();

    render(&mut painter, 1).unwrap();
    assert!(painter.canvas(1).unwrap().layer.contains(id));
    painter.check_consistency().unwrap();
}

#[test]
fn rescale_of_unknown_page_fails() {
    let mut painter = painter();
    let err = painter
        .handle_host_event(HostEvent::PageRescaled {
            page_number: 9,
            viewport: Viewport::new(918.0, 1188.0, 1.5),
        })
        .unwrap_err();
    assert!(matches!(err, PainterError::UnknownPage(9)));
}

#[test]
fn host_events_parse_from_camel_case_json() {
    let event: HostEvent =
        serde_json::from_str(r#"{"type":"pageRendered","pageNumber":2,"viewport":{"width":918,"height":1188,"scale":1.5}}"#)
            .unwrap();
    assert_eq!(
        event,
        HostEvent::PageRendered {
            page_number: 2,
            viewport: Viewport::new(918.0, 1188.0, 1.5),
        }
    );
}

#[test]
fn highlight_on_mounted_page_selects_immediately() {
    let mut painter = painter();
    render(&mut painter, 1).unwrap();
    painter.init_annotations(vec![rect_record("near-rect", 1)], false);

    painter.highlight(AnnotationId::intern("near-rect")).unwrap();
    assert_eq!(painter.bindings().scrolled, vec![1]);
    assert_eq!(painter.selector().selected(), Some(AnnotationId::intern("near-rect")));
    assert_eq!(
        painter.bindings().calls.last(),
        Some(&Call::Selected {
            id: "near-rect".to_string(),
            is_click: false,
        })
    );
}

#[test]
fn highlight_waits_for_page_render() {
    let mut painter = painter();
    painter.init_annotations(vec![rect_record("pending-rect", 3)], false);

    painter.highlight(AnnotationId::intern("pending-rect")).unwrap();
    assert_eq!(painter.bindings().scrolled, vec![3]);
    assert_eq!(painter.selector().selected(), None);

    render(&mut painter, 2).unwrap();
    render(&mut painter, 3).unwrap();
    assert_eq!(painter.selector().selected(), Some(AnnotationId::intern("pending-rect")));
}

#[test]
fn highlight_gives_up_after_retry_budget() {
    let mut painter = painter_with(PainterConfig {
        selection_retry_limit: 2,
        ..PainterConfig::default()
    });
    painter.init_annotations(vec![rect_record("never-rect", 5)], false);
    painter.highlight(AnnotationId::intern("never-rect")).unwrap();

    render(&mut painter, 1).unwrap();
    let err = render(&mut painter, 2).unwrap_err();
    assert!(matches!(err, PainterError::NotReady { page: 5, .. }));
    // The budget is spent; later renders are quiet.
    render(&mut painter, 5).unwrap();
    assert_eq!(painter.selector().selected(), None);
}

// ─── Loading ────────────────────────────────────────────────────────────

#[test]
fn init_merges_host_annotations_without_duplicates() {
    let mut painter = painter();
    painter.bindings_mut().pages = vec![HostPage {
        page_number: 1,
        viewport: Viewport::new(612.0, PAGE_HEIGHT, 1.0),
        annotations: vec![
            HostAnnotation {
                id: "host-square".to_string(),
                annotation_type: 5,
                rect: Some([10.0, 700.0, 110.0, 750.0]),
                color: Some([0.0, 0.0, 1.0]),
                border_style: pa_core::native::BorderStyle {
                    width: 2.0,
                    ..Default::default()
                },
                ..Default::default()
            },
            HostAnnotation {
                id: "near-dup".to_string(),
                annotation_type: 5,
                rect: Some([10.0, 10.0, 20.0, 20.0]),
                ..Default::default()
            },
            HostAnnotation {
                id: "host-link".to_string(),
                annotation_type: 2,
                ..Default::default()
            },
        ],
    }];

    let loaded = painter.init_annotations(vec![rect_record("near-dup", 1)], true);
    assert_eq!(loaded, 2);
    assert!(!painter.can_undo());
    let square = painter.store().get(AnnotationId::intern("host-square")).unwrap();
    assert!(
        square
            .bounding_client_rect
            .approx_eq(&ClientRect::new(10.0, 42.0, 100.0, 50.0), 1e-9)
    );
    assert_eq!(square.title, "");
    assert_eq!(painter.store().get(AnnotationId::intern("near-dup")).unwrap().title, "loader");
    assert!(painter.bindings().calls.iter().all(|c| matches!(
        c,
        Call::StoreAdd {
            is_original: true,
            ..
        }
    )));

    render(&mut painter, 1).unwrap();
    painter.check_consistency().unwrap();
}

// ─── Text selection ─────────────────────────────────────────────────────

#[test]
fn selection_with_markup_tool_is_annotated_immediately() {
    let mut painter = painter();
    render(&mut painter, 1).unwrap();
    painter.activate(Some(AnnotationType::Highlight.definition()), None);

    let created = painter
        .handle_text_selection(&selection(1, &[("Hello", 100.0), (" ", 150.0), ("World", 160.0)]))
        .unwrap();
    assert_eq!(created.len(), 1);
    let record = painter.store().get(created[0]).unwrap();
    assert_eq!(record.kind, AnnotationType::Highlight);
    assert_eq!(record.contents.text, "Hello World");
    assert_eq!(painter.mode(), PainterMode::Painting(AnnotationType::Highlight));
    match &painter.bindings().last_native().1.body {
        NativeBody::Highlight { quad_points, .. } => assert_eq!(quad_points.len(), 16),
        other => panic!("expected highlight body, got {other:?}"),
    }
    painter.check_consistency().unwrap();
}

#[test]
fn selection_without_markup_tool_goes_to_ui() {
    let mut painter = painter();
    render(&mut painter, 1).unwrap();

    let created = painter.handle_text_selection(&selection(1, &[("Hi", 10.0)])).unwrap();
    assert!(created.is_empty());
    assert_eq!(painter.bindings().calls, vec![Call::WebSelection("Hi".to_string())]);

    let created = painter
        .highlight_selection(&selection(1, &[("Hi", 10.0)]), AnnotationType::Underline)
        .unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(painter.store().get(created[0]).unwrap().kind, AnnotationType::Underline);
}
