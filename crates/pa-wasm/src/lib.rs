//! WASM bridge for PA. Exposes the painter to the viewer's JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. Structured values cross the
//! boundary as JSON strings in both directions.

use js_sys::{Function, Object, Reflect};
use pa_core::definitions::{AnnotationStyle, AnnotationTypeDefinition};
use pa_core::geometry::ClientRect;
use pa_core::native::{HostPage, NativeAnnotation};
use pa_core::{AnnotationId, AnnotationRecord, AnnotationType, Color, CommentStatus, PainterConfig, RecordPatch};
use pa_editor::input::{InputEvent, KeyEvent, Modifiers};
use pa_editor::{HostBindings, HostEvent, Painter, TextInput, TextRequest, TextSelection};
use serde::Serialize;
use serde_json::json;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

// ─── Host bindings over JS callbacks ─────────────────────────────────────

/// Callback names looked up on the object passed to `PainterHandle::new`.
const CALLBACKS: [&str; 13] = [
    "onStoreAdd",
    "onStoreDelete",
    "onAnnotationSelected",
    "onAnnotationChange",
    "onAnnotationChanging",
    "onAnnotationChanged",
    "onWebSelectionSelected",
    "setDefaultMode",
    "requestTextInput",
    "setValue",
    "hostPages",
    "scrollIntoView",
    "measureText",
];

/// Forwards painter callbacks to JS functions. Missing callbacks are
/// skipped.
struct JsBindings {
    callbacks: Vec<Option<Function>>,
}

impl JsBindings {
    fn new(object: &Object) -> Self {
        let callbacks = CALLBACKS
            .iter()
            .map(|name| {
                Reflect::get(object, &JsValue::from_str(name))
                    .ok()
                    .and_then(|v| v.dyn_into::<Function>().ok())
            })
            .collect();
        Self { callbacks }
    }

    fn get(&self, name: &str) -> Option<&Function> {
        let index = CALLBACKS.iter().position(|n| *n == name)?;
        self.callbacks.get(index)?.as_ref()
    }

    fn call(&self, name: &str, args: &[JsValue]) -> Option<JsValue> {
        let f = self.get(name)?;
        let result = match args {
            [] => f.call0(&JsValue::NULL),
            [a] => f.call1(&JsValue::NULL, a),
            [a, b] => f.call2(&JsValue::NULL, a, b),
            [a, b, c, ..] => f.call3(&JsValue::NULL, a, b, c),
        };
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("{name} callback threw: {e:?}");
                None
            }
        }
    }

    fn call_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(s) => {
                self.call(name, &[JsValue::from_str(&s)]);
            }
            Err(e) => log::error!("cannot serialize {name} payload: {e}"),
        }
    }
}

impl HostBindings for JsBindings {
    fn on_store_add(
        &mut self,
        record: &AnnotationRecord,
        is_original: bool,
        definition: Option<&'static AnnotationTypeDefinition>,
    ) {
        self.call_json(
            "onStoreAdd",
            &json!({ "record": record, "isOriginal": is_original, "definition": definition }),
        );
    }

    fn on_store_delete(&mut self, id: AnnotationId) {
        self.call("onStoreDelete", &[JsValue::from_str(id.as_str())]);
    }

    fn on_annotation_selected(&mut self, record: &AnnotationRecord, is_click: bool, rect: ClientRect) {
        self.call_json(
            "onAnnotationSelected",
            &json!({ "record": record, "isClick": is_click, "rect": rect }),
        );
    }

    fn on_annotation_change(&mut self, record: &AnnotationRecord) {
        self.call_json("onAnnotationChange", record);
    }

    fn on_annotation_changing(&mut self) {
        self.call("onAnnotationChanging", &[]);
    }

    fn on_annotation_changed(&mut self, record: &AnnotationRecord, rect: ClientRect) {
        self.call_json("onAnnotationChanged", &json!({ "record": record, "rect": rect }));
    }

    fn on_web_selection_selected(&mut self, selection: &TextSelection) {
        self.call_json("onWebSelectionSelected", selection);
    }

    fn set_default_mode(&mut self) {
        self.call("setDefaultMode", &[]);
    }

    fn request_text_input(&mut self, request: &TextRequest) {
        self.call_json("requestTextInput", request);
    }

    fn write_native(&mut self, id: &str, value: &NativeAnnotation) {
        match serde_json::to_string(value) {
            Ok(s) => {
                self.call("setValue", &[JsValue::from_str(id), JsValue::from_str(&s)]);
            }
            Err(e) => log::error!("cannot serialize native value {id}: {e}"),
        }
    }

    fn host_pages(&mut self) -> Vec<HostPage> {
        let Some(raw) = self.call("hostPages", &[]).and_then(|v| v.as_string()) else {
            return Vec::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            log::warn!("hostPages returned malformed JSON: {e}");
            Vec::new()
        })
    }

    fn scroll_into_view(&mut self, page_number: u32, rect: ClientRect) {
        let rect = serde_json::to_string(&rect).unwrap_or_default();
        self.call(
            "scrollIntoView",
            &[JsValue::from(page_number), JsValue::from_str(&rect)],
        );
    }

    fn measure_text(&self, text: &str, font_size: f64) -> f64 {
        self.call("measureText", &[JsValue::from_str(text), JsValue::from_f64(font_size)])
            .and_then(|v| v.as_f64())
            .unwrap_or_else(|| text.chars().count() as f64 * font_size * 0.6)
    }
}

// ─── JSON helpers ────────────────────────────────────────────────────────

/// `{"ok":true,"value":...}` or `{"ok":false,"error":"..."}`.
fn result_json<T: Serialize, E: std::fmt::Display>(result: Result<T, E>) -> String {
    let value = match result {
        Ok(v) => json!({ "ok": true, "value": v }),
        Err(e) => json!({ "ok": false, "error": e.to_string() }),
    };
    value.to_string()
}

fn parse<T: serde::de::DeserializeOwned>(what: &str, raw: &str) -> Result<T, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid {what}: {e}"))
}

/// Annotation type from its catalog number; negative means no tool.
fn annotation_type(value: i32) -> Result<Option<AnnotationType>, String> {
    if value < 0 {
        return Ok(None);
    }
    let v = i8::try_from(value).map_err(|_| format!("unknown annotation type {value}"))?;
    AnnotationType::try_from(v).map(Some)
}

fn comment_status(raw: Option<String>) -> Option<CommentStatus> {
    raw.filter(|s| !s.is_empty()).map(|s| CommentStatus::from_host_state(&s))
}

fn modifiers(shift: bool, ctrl: bool, alt: bool, meta: bool) -> Modifiers {
    Modifiers {
        shift,
        ctrl,
        alt,
        meta,
    }
}

// ─── Painter handle ──────────────────────────────────────────────────────

/// The WASM-facing painter. All interaction from the viewer goes through
/// this struct.
#[wasm_bindgen]
pub struct PainterHandle {
    painter: Painter<JsBindings>,
}

#[wasm_bindgen]
impl PainterHandle {
    /// `callbacks` is an object of optional functions named after the host
    /// callbacks; `config_json` is a possibly partial `PainterConfig`.
    #[wasm_bindgen(constructor)]
    pub fn new(callbacks: &Object, config_json: &str) -> Self {
        console_error_panic_hook_setup();
        console_logger_setup();

        let config = if config_json.trim().is_empty() {
            PainterConfig::default()
        } else {
            PainterConfig::from_json(config_json).unwrap_or_else(|e| {
                log::warn!("invalid painter config, using defaults: {e}");
                PainterConfig::default()
            })
        };
        Self {
            painter: Painter::new(JsBindings::new(callbacks), config),
        }
    }

    /// Activate a tool by catalog number (`-1` or Select for none).
    pub fn activate(&mut self, kind: i32, payload: Option<String>) -> String {
        let result = annotation_type(kind).map(|kind| {
            self.painter
                .activate(kind.map(AnnotationType::definition), payload.as_deref());
        });
        result_json(result)
    }

    /// Current mode as JSON, e.g. `{"mode":"painting","type":6}`.
    pub fn mode(&self) -> String {
        serde_json::to_string(&self.painter.mode()).unwrap_or_default()
    }

    /// Change future drawing style for a tool.
    pub fn set_tool_style(&mut self, kind: i32, style_json: &str) -> String {
        let result = annotation_type(kind).and_then(|kind| {
            let kind = kind.ok_or_else(|| "no tool".to_string())?;
            let style: AnnotationStyle = parse("style", style_json)?;
            self.painter.set_tool_style(kind, style);
            Ok(())
        });
        result_json(result)
    }

    /// A page lifecycle event, e.g. `{"type":"pageRendered",...}`.
    pub fn host_event(&mut self, event_json: &str) -> String {
        let result = parse::<HostEvent>("host event", event_json)
            .and_then(|event| self.painter.handle_host_event(event).map_err(|e| e.to_string()));
        result_json(result)
    }

    // ─── Pointer input (page pixels) ─────────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    pub fn pointer_down(
        &mut self,
        page: u32,
        x: f64,
        y: f64,
        on_canvas: bool,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> String {
        self.pointer(
            page,
            InputEvent::PointerDown {
                x,
                y,
                on_canvas,
                modifiers: modifiers(shift, ctrl, alt, meta),
            },
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn pointer_move(&mut self, page: u32, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> String {
        self.pointer(
            page,
            InputEvent::PointerMove {
                x,
                y,
                modifiers: modifiers(shift, ctrl, alt, meta),
            },
        )
    }

    pub fn pointer_up(&mut self, page: u32, x: f64, y: f64) -> String {
        self.pointer(page, InputEvent::up(x, y))
    }

    fn pointer(&mut self, page: u32, event: InputEvent) -> String {
        let scale = self.painter.canvas(page).map_or(1.0, |c| c.viewport.scale);
        result_json(self.painter.pointer_event(page, event.unscaled(scale)))
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    /// Returns `{"ok":true,"value":<handled>}`.
    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool) -> String {
        let event = KeyEvent {
            key: key.to_string(),
            ctrl,
            shift,
            alt,
            meta,
        };
        result_json(self.painter.key_event(&event))
    }

    /// Answer a text-entry request; `None` dismisses it.
    pub fn complete_text_input(&mut self, input_json: Option<String>) -> String {
        let result = input_json
            .map(|raw| parse::<TextInput>("text input", &raw))
            .transpose()
            .and_then(|input| self.painter.complete_text_input(input).map_err(|e| e.to_string()));
        result_json(result)
    }

    // ─── Text selection ──────────────────────────────────────────────────

    /// Returns the ids created by auto-annotate, if any.
    pub fn text_selection(&mut self, selection_json: &str) -> String {
        let result = parse::<TextSelection>("selection", selection_json).and_then(|selection| {
            self.painter
                .handle_text_selection(&selection)
                .map_err(|e| e.to_string())
        });
        result_json(result)
    }

    pub fn highlight_selection(&mut self, selection_json: &str, kind: i32) -> String {
        let result = parse::<TextSelection>("selection", selection_json).and_then(|selection| {
            let kind = annotation_type(kind)?.ok_or_else(|| "no tool".to_string())?;
            self.painter
                .highlight_selection(&selection, kind)
                .map_err(|e| e.to_string())
        });
        result_json(result)
    }

    // ─── Records ─────────────────────────────────────────────────────────

    /// Load an array of records; with `merge_host` the host document's own
    /// annotations are decoded and merged.
    pub fn init_annotations(&mut self, records_json: &str, merge_host: bool) -> String {
        let result = parse::<Vec<AnnotationRecord>>("records", records_json)
            .map(|records| self.painter.init_annotations(records, merge_host));
        result_json(result)
    }

    pub fn update(&mut self, id: &str, patch_json: &str) -> String {
        let result = parse::<RecordPatch>("patch", patch_json).and_then(|patch| {
            self.painter
                .update(AnnotationId::intern(id), patch)
                .map_err(|e| e.to_string())
        });
        result_json(result)
    }

    pub fn delete(&mut self, id: &str, emit: bool) -> String {
        result_json(self.painter.delete(AnnotationId::intern(id), emit))
    }

    /// Scroll to and select an annotation.
    pub fn highlight(&mut self, id: &str) -> String {
        result_json(self.painter.highlight(AnnotationId::intern(id)))
    }

    pub fn update_annotation_style(&mut self, id: &str, style_json: &str) -> String {
        let result = parse::<AnnotationStyle>("style", style_json).and_then(|style| {
            self.painter
                .update_annotation_style(AnnotationId::intern(id), &style)
                .map_err(|e| e.to_string())
        });
        result_json(result)
    }

    pub fn add_comment(&mut self, id: &str, content: &str) -> String {
        result_json(self.painter.add_comment(AnnotationId::intern(id), content))
    }

    /// `status` is a host review state name such as `"Accepted"`.
    pub fn update_comment(&mut self, id: &str, comment_id: &str, content: &str, status: Option<String>) -> String {
        result_json(self.painter.update_comment(
            AnnotationId::intern(id),
            comment_id,
            content,
            comment_status(status),
        ))
    }

    pub fn remove_comment(&mut self, id: &str, comment_id: &str) -> String {
        result_json(self.painter.remove_comment(AnnotationId::intern(id), comment_id))
    }

    // ─── History and persistence ─────────────────────────────────────────

    pub fn undo(&mut self) -> String {
        result_json(self.painter.undo())
    }

    pub fn redo(&mut self) -> String {
        result_json(self.painter.redo())
    }

    pub fn can_undo(&self) -> bool {
        self.painter.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.painter.can_redo()
    }

    /// Every live record as a JSON array.
    pub fn get_data(&self) -> String {
        serde_json::to_string(&self.painter.get_data()).unwrap_or_else(|e| {
            log::error!("cannot serialize records: {e}");
            "[]".to_string()
        })
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.painter.has_unsaved_changes()
    }

    pub fn mark_saved(&mut self) {
        self.painter.mark_saved();
    }
}

// ─── Standalone helpers (no painter needed) ──────────────────────────────

/// Normalize a CSS color to `#rrggbb`. Returns JSON like `result_json`.
#[wasm_bindgen]
pub fn normalize_color(css: &str) -> String {
    result_json(Color::parse(css).map(Color::to_hex))
}

/// The annotation type catalog as JSON.
#[wasm_bindgen]
pub fn annotation_types() -> String {
    let defs: Vec<&AnnotationTypeDefinition> = AnnotationType::ALL.iter().map(|t| t.definition()).collect();
    serde_json::to_string(&defs).unwrap_or_else(|_| "[]".to_string())
}

// ─── Console logging ─────────────────────────────────────────────────────

#[cfg(target_arch = "wasm32")]
struct ConsoleLogger;

#[cfg(target_arch = "wasm32")]
impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::Level::Info
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = JsValue::from(format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&msg),
            log::Level::Warn => web_sys::console::warn_1(&msg),
            _ => web_sys::console::log_1(&msg),
        }
    }

    fn flush(&self) {}
}

#[cfg(target_arch = "wasm32")]
static LOGGER: ConsoleLogger = ConsoleLogger;

fn console_logger_setup() {
    #[cfg(target_arch = "wasm32")]
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Info);
    }
}

// ─── Panic hook for WASM debugging ───────────────────────────────────────

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("PA WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
