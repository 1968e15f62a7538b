//! Painter orchestrator.
//!
//! Owns the page canvases and every per-page editor, routes host events and
//! user input to them, and keeps the annotation store, the shape-group
//! registries and the host bindings in step.
//!
//! Mutations always go store first, then registry, then host callbacks.

use crate::bindings::{HostBindings, TextInput, TextSelection};
use crate::canvas::PageCanvas;
use crate::decoder::DecoderBank;
use crate::editors::{Editor, EditorContext, EditorEffect, create_editor, restyle_group};
use crate::input::{InputEvent, KeyEvent};
use crate::selector::{Permissions, Selector, SelectorEvent};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use indexmap::{IndexMap, IndexSet};
use pa_core::definitions::{AnnotationStyle, AnnotationTypeDefinition};
use pa_core::native::{NativeAnnotation, native_id};
use pa_core::record::timestamp_now;
use pa_core::{
    AnnotationId, AnnotationRecord, AnnotationStore, AnnotationType, Comment, CommentStatus, PainterConfig,
    PainterError, RecordPatch, ShapeGroup, StoreError, Viewport,
};
use serde::{Deserialize, Serialize};

type EditorMap = IndexMap<(u32, AnnotationType), Box<dyn Editor>>;

/// Page lifecycle events from the host viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostEvent {
    /// A page finished rendering; mount (or rescale) its canvas.
    PageRendered { page_number: u32, viewport: Viewport },
    /// A CSS-only zoom of an already mounted page.
    PageRescaled { page_number: u32, viewport: Viewport },
    /// The page left the rendered range and its canvas is gone.
    PageUnmounted { page_number: u32 },
    PageChanging { page_number: u32 },
    DocumentLoaded { page_count: u32 },
    ScaleChanging { scale: f64 },
}

/// What the UI should indicate as the current mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "mode", content = "type", rename_all = "camelCase")]
pub enum PainterMode {
    /// No tool; clicking selects existing annotations.
    #[default]
    Default,
    /// A tool is active.
    Painting(AnnotationType),
}

#[derive(Debug, Clone, Copy)]
struct PendingSelection {
    id: AnnotationId,
    page_number: u32,
    retries: u32,
}

pub struct Painter<B: HostBindings> {
    bindings: B,
    config: PainterConfig,
    store: AnnotationStore,
    canvases: IndexMap<u32, PageCanvas>,
    /// Last known canvas height per page, kept after unmount for mirroring.
    page_heights: IndexMap<u32, f64>,
    editors: EditorMap,
    selector: Selector,
    decoders: DecoderBank,
    mode: PainterMode,
    active: Option<&'static AnnotationTypeDefinition>,
    payload: Option<String>,
    tool_styles: IndexMap<AnnotationType, AnnotationStyle>,
    awaiting_text: Option<(u32, AnnotationType)>,
    pending_selection: Option<PendingSelection>,
    current_page: u32,
    page_count: u32,
}

/// The editor for `(page, kind)`, created on first use. `None` for kinds
/// that have no editor.
fn ensure_editor(editors: &mut EditorMap, page: u32, kind: AnnotationType) -> Option<&mut Box<dyn Editor>> {
    let key = (page, kind);
    if !editors.contains_key(&key) {
        let editor = create_editor(kind, page)?;
        log::trace!("created {kind:?} editor for page {page}");
        editors.insert(key, editor);
    }
    editors.get_mut(&key)
}

/// Rebuild a record's group on a mounted canvas under its owning editor.
fn mount_record(editors: &mut EditorMap, canvas: &mut PageCanvas, record: &AnnotationRecord) -> bool {
    let Some(editor) = ensure_editor(editors, record.page_number, record.kind) else {
        log::warn!("record {} has kind {:?} with no editor", record.id, record.kind);
        return false;
    };
    match editor
        .registry_mut()
        .add_serialized_group_to_layer(canvas, &record.serialized_shape)
    {
        Ok(_) => true,
        Err(e) => {
            log::warn!("cannot rebuild group {}: {e}", record.id);
            false
        }
    }
}

impl<B: HostBindings> Painter<B> {
    pub fn new(bindings: B, config: PainterConfig) -> Self {
        Self {
            bindings,
            store: AnnotationStore::new(config.max_history),
            selector: Selector::new(config.handle_size),
            config,
            canvases: IndexMap::new(),
            page_heights: IndexMap::new(),
            editors: IndexMap::new(),
            decoders: DecoderBank::default(),
            mode: PainterMode::Default,
            active: None,
            payload: None,
            tool_styles: IndexMap::new(),
            awaiting_text: None,
            pending_selection: None,
            current_page: 1,
            page_count: 0,
        }
    }

    pub fn bindings(&self) -> &B {
        &self.bindings
    }

    pub fn bindings_mut(&mut self) -> &mut B {
        &mut self.bindings
    }

    pub fn config(&self) -> &PainterConfig {
        &self.config
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn mode(&self) -> PainterMode {
        self.mode
    }

    pub fn canvas(&self, page_number: u32) -> Option<&PageCanvas> {
        self.canvases.get(&page_number)
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Replace the decoders used by `init_annotations`.
    pub fn set_decoders(&mut self, decoders: DecoderBank) {
        self.decoders = decoders;
    }

    // ─── Activation ─────────────────────────────────────────────────────

    /// Make `definition` the active tool, or return to default mode with
    /// `None` (or `Select`). `payload` carries auxiliary data such as the
    /// image for signature and stamp tools.
    pub fn activate(&mut self, definition: Option<&'static AnnotationTypeDefinition>, payload: Option<&str>) {
        self.cancel_in_progress();
        let events = self.selector.deactivate();
        self.apply_selector_events_lossy(events);

        self.payload = payload.map(str::to_owned);
        match definition.filter(|d| d.kind != AnnotationType::Select) {
            None => {
                self.active = None;
                self.mode = PainterMode::Default;
                log::debug!("painter in default mode");
            }
            Some(def) => {
                self.active = Some(def);
                self.mode = PainterMode::Painting(def.kind);
                let pages: Vec<u32> = self.canvases.keys().copied().collect();
                for page in pages {
                    self.enable_editor(page);
                }
                log::debug!(
                    "painting mode {:?}, host editor type {:?}",
                    def.kind,
                    def.host_editor_type
                );
            }
        }
    }

    /// Activate the active tool's editor on `page`, handing it the payload
    /// when it takes one.
    fn enable_editor(&mut self, page: u32) {
        let Some(def) = self.active else {
            return;
        };
        let style = self.tool_style(def.kind);
        let Some(editor) = ensure_editor(&mut self.editors, page, def.kind) else {
            return;
        };
        if let Some(payload) = self.payload.as_deref()
            && let Some(target) = editor.payload_target()
        {
            target.activate_with_payload(def, style, payload);
            return;
        }
        editor.activate(def, style);
    }

    /// Drawing style for new annotations of `kind`.
    pub fn tool_style(&self, kind: AnnotationType) -> AnnotationStyle {
        let base = kind.definition().style_with_defaults(&self.config);
        match self.tool_styles.get(&kind) {
            Some(delta) => base.merged(delta),
            None => base,
        }
    }

    /// Change the drawing style for future annotations of `kind`.
    pub fn set_tool_style(&mut self, kind: AnnotationType, delta: AnnotationStyle) {
        let merged = self
            .tool_styles
            .get(&kind)
            .copied()
            .unwrap_or(AnnotationStyle::EMPTY)
            .merged(&delta);
        self.tool_styles.insert(kind, merged);
        let style = self.tool_style(kind);
        for ((_, k), editor) in self.editors.iter_mut() {
            if *k == kind {
                editor.base_mut().style = style;
            }
        }
    }

    /// A single-use tool produced its annotation; back to default mode.
    fn finish_tool(&mut self) {
        self.cancel_in_progress();
        self.active = None;
        self.payload = None;
        self.mode = PainterMode::Default;
        self.bindings.set_default_mode();
        log::debug!("tool finished, default mode");
    }

    /// Abandon every in-progress placement and discard partial groups.
    fn cancel_in_progress(&mut self) {
        self.awaiting_text = None;
        for ((page, _), editor) in self.editors.iter_mut() {
            if editor.is_busy()
                && let Some(canvas) = self.canvases.get_mut(page)
            {
                editor.cancel(canvas);
            }
        }
    }

    // ─── Host events ────────────────────────────────────────────────────

    /// # Errors
    /// `PainterError::NotReady` when a pending `highlight` ran out of page
    /// renders; `PainterError::UnknownPage` for a rescale of an unmounted
    /// page.
    pub fn handle_host_event(&mut self, event: HostEvent) -> Result<(), PainterError> {
        match event {
            HostEvent::PageRendered {
                page_number,
                viewport,
            } => {
                self.page_heights.insert(page_number, viewport.canvas_height());
                if let Some(canvas) = self.canvases.get_mut(&page_number) {
                    canvas.rescale(viewport);
                } else {
                    self.mount_page(page_number, viewport);
                }
                self.resolve_pending(page_number)
            }
            HostEvent::PageRescaled {
                page_number,
                viewport,
            } => {
                let canvas = self
                    .canvases
                    .get_mut(&page_number)
                    .ok_or(PainterError::UnknownPage(page_number))?;
                canvas.rescale(viewport);
                self.page_heights.insert(page_number, viewport.canvas_height());
                log::trace!("page {page_number} rescaled to {}", viewport.scale);
                Ok(())
            }
            HostEvent::PageUnmounted { page_number } => {
                self.unmount_page(page_number);
                Ok(())
            }
            HostEvent::PageChanging { page_number } => {
                self.current_page = page_number;
                log::trace!("page changing to {page_number}");
                Ok(())
            }
            HostEvent::DocumentLoaded { page_count } => {
                self.page_count = page_count;
                log::debug!("document loaded with {page_count} pages");
                Ok(())
            }
            HostEvent::ScaleChanging { scale } => {
                log::trace!("scale changing to {scale}");
                let events = self.selector.cancel();
                self.apply_selector_events(events)
            }
        }
    }

    fn mount_page(&mut self, page_number: u32, viewport: Viewport) {
        let mut canvas = PageCanvas::new(page_number, viewport);
        let mut mounted = 0;
        for record in self.store.by_page(page_number) {
            if mount_record(&mut self.editors, &mut canvas, record) {
                mounted += 1;
            }
        }
        self.canvases.insert(page_number, canvas);
        if self.active.is_some() {
            self.enable_editor(page_number);
        }
        log::debug!("mounted page {page_number} with {mounted} groups");
    }

    /// Drop the page's live groups. Store records are untouched.
    fn unmount_page(&mut self, page_number: u32) {
        if let Some(id) = self.selector.selected()
            && self.store.get(id).is_some_and(|r| r.page_number == page_number)
        {
            let events = self.selector.cancel();
            self.apply_selector_events_lossy(events);
        }
        if self.awaiting_text.is_some_and(|(page, _)| page == page_number) {
            self.awaiting_text = None;
        }
        let Some(mut canvas) = self.canvases.shift_remove(&page_number) else {
            return;
        };
        for ((page, _), editor) in self.editors.iter_mut() {
            if *page == page_number {
                editor.cancel(&mut canvas);
                editor.registry_mut().clear();
            }
        }
        log::debug!("unmounted page {page_number}");
    }

    fn resolve_pending(&mut self, page_number: u32) -> Result<(), PainterError> {
        let Some(mut pending) = self.pending_selection.take() else {
            return Ok(());
        };
        if pending.page_number == page_number {
            return match self.store.get(pending.id).cloned() {
                Some(record) => self.select_mounted(&record),
                None => Ok(()),
            };
        }
        pending.retries = pending.retries.saturating_sub(1);
        if pending.retries == 0 {
            log::warn!("gave up selecting {} on page {}", pending.id, pending.page_number);
            return Err(PainterError::NotReady {
                id: pending.id,
                page: pending.page_number,
            });
        }
        self.pending_selection = Some(pending);
        Ok(())
    }

    // ─── Input ──────────────────────────────────────────────────────────

    /// Run an editor against its page canvas.
    fn run_editor<F>(&mut self, page: u32, kind: AnnotationType, f: F) -> Result<Vec<EditorEffect>, PainterError>
    where
        F: FnOnce(&mut dyn Editor, &mut EditorContext<'_>) -> Vec<EditorEffect>,
    {
        let canvas = self
            .canvases
            .get_mut(&page)
            .ok_or(PainterError::UnknownPage(page))?;
        let Some(editor) = ensure_editor(&mut self.editors, page, kind) else {
            return Ok(Vec::new());
        };
        let bindings = &self.bindings;
        let measure = |text: &str, font_size: f64| bindings.measure_text(text, font_size);
        let mut ctx = EditorContext {
            canvas,
            config: &self.config,
            measure_text: &measure,
        };
        Ok(f(editor.as_mut(), &mut ctx))
    }

    /// Route a pointer event on `page` (canvas space) to the active tool or
    /// to the selector.
    pub fn pointer_event(&mut self, page: u32, event: InputEvent) -> Result<(), PainterError> {
        match self.mode {
            PainterMode::Default => {
                let mut events = Vec::new();
                if self.selector.active_page() != Some(page) {
                    events.extend(self.selector.activate(page));
                }
                let store = &self.store;
                let canvas = self
                    .canvases
                    .get_mut(&page)
                    .ok_or(PainterError::UnknownPage(page))?;
                events.extend(
                    self.selector
                        .handle(canvas, &event, |id| store.get(id).map(Permissions::of)),
                );
                self.apply_selector_events(events)
            }
            PainterMode::Painting(kind) if kind.is_text_markup() => Ok(()),
            PainterMode::Painting(kind) => {
                if !self.editors.contains_key(&(page, kind)) {
                    self.enable_editor(page);
                }
                let effects = self.run_editor(page, kind, |editor, ctx| editor.handle(ctx, &event))?;
                self.apply_effects(effects)
            }
        }
    }

    /// Apply a keyboard shortcut. Returns whether the key was bound.
    pub fn key_event(&mut self, event: &KeyEvent) -> Result<bool, PainterError> {
        let Some(action) = ShortcutMap::resolve_event(event) else {
            return Ok(false);
        };
        log::trace!("shortcut {action:?}");
        match action {
            ShortcutAction::Undo => {
                self.undo()?;
            }
            ShortcutAction::Redo => {
                self.redo()?;
            }
            ShortcutAction::Delete => {
                if let Some(event) = self.selector.delete_selected() {
                    self.apply_selector_events(vec![event])?;
                }
            }
            ShortcutAction::Cancel => match self.mode {
                PainterMode::Painting(_) => self.finish_tool(),
                PainterMode::Default => {
                    let events = self.selector.cancel();
                    self.apply_selector_events(events)?;
                }
            },
        }
        Ok(true)
    }

    /// Answer the pending text-entry step. `None` means it was dismissed.
    pub fn complete_text_input(&mut self, input: Option<TextInput>) -> Result<(), PainterError> {
        let Some((page, kind)) = self.awaiting_text.take() else {
            log::warn!("text input arrived with no pending request");
            return Ok(());
        };
        let effects = self.run_editor(page, kind, |editor, ctx| editor.complete_text(ctx, input))?;
        self.apply_effects(effects)
    }

    /// A text selection from the web layer. With a text-markup tool active
    /// it is annotated right away; otherwise the UI is told about it.
    pub fn handle_text_selection(&mut self, selection: &TextSelection) -> Result<Vec<AnnotationId>, PainterError> {
        match self.mode {
            PainterMode::Painting(kind) if kind.is_text_markup() => self.highlight_selection(selection, kind),
            _ => {
                if !selection.is_empty() {
                    self.bindings.on_web_selection_selected(selection);
                }
                Ok(Vec::new())
            }
        }
    }

    /// Annotate `selection` as `kind` on every mounted page it covers.
    pub fn highlight_selection(
        &mut self,
        selection: &TextSelection,
        kind: AnnotationType,
    ) -> Result<Vec<AnnotationId>, PainterError> {
        if !kind.is_text_markup() {
            log::warn!("{kind:?} cannot annotate a text selection");
            return Ok(Vec::new());
        }
        let def = kind.definition();
        let style = self.tool_style(kind);
        let mut created = Vec::new();
        for page in &selection.pages {
            if !self.canvases.contains_key(&page.page_number) {
                log::warn!("selection on unmounted page {}", page.page_number);
                continue;
            }
            let effects = self.run_editor(page.page_number, kind, |editor, ctx| {
                editor.activate(def, style);
                editor.convert_text_selection(ctx, page)
            })?;
            created.extend(effects.iter().filter_map(|e| match e {
                EditorEffect::Created(r) => Some(r.id),
                _ => None,
            }));
            self.apply_effects(effects)?;
        }
        Ok(created)
    }

    // ─── Effects ────────────────────────────────────────────────────────

    fn apply_effects(&mut self, effects: Vec<EditorEffect>) -> Result<(), PainterError> {
        for effect in effects {
            match effect {
                EditorEffect::Created(record) => self.commit_created(record),
                EditorEffect::Changed { id, patch } => {
                    self.store_update(id, patch)?;
                }
                EditorEffect::Erased(id) => {
                    self.delete(id, true)?;
                }
                EditorEffect::AwaitText(request) => {
                    self.awaiting_text = Some((request.page_number, request.kind));
                    self.bindings.request_text_input(&request);
                }
                EditorEffect::Finished => self.finish_tool(),
            }
        }
        Ok(())
    }

    fn commit_created(&mut self, record: AnnotationRecord) {
        let def = record.definition();
        let stored = self.store.save(record, false).clone();
        log::debug!("saved {:?} {} on page {}", stored.kind, stored.id, stored.page_number);
        self.bindings.on_store_add(&stored, false, Some(def));
        self.mirror(&stored);
    }

    fn apply_selector_events(&mut self, events: Vec<SelectorEvent>) -> Result<(), PainterError> {
        for event in events {
            match event {
                SelectorEvent::Selected { id, is_click, rect } => match self.store.get(id) {
                    Some(record) => self.bindings.on_annotation_selected(record, is_click, rect),
                    None => log::warn!("selected group {id} has no record"),
                },
                SelectorEvent::Changing(_) | SelectorEvent::Cancel(_) => self.bindings.on_annotation_changing(),
                SelectorEvent::Changed {
                    id,
                    serialized_shape,
                    rect,
                    transformer_rect,
                } => {
                    let record = self.store_update(id, RecordPatch::shape(serialized_shape, rect))?;
                    self.bindings.on_annotation_changed(&record, transformer_rect);
                }
                SelectorEvent::Delete(id) => {
                    self.delete(id, true)?;
                }
            }
        }
        Ok(())
    }

    /// For paths whose selector events cannot fail (cancel only).
    fn apply_selector_events_lossy(&mut self, events: Vec<SelectorEvent>) {
        if let Err(e) = self.apply_selector_events(events) {
            log::error!("selector event failed: {e}");
        }
    }

    // ─── Host mirroring ─────────────────────────────────────────────────

    fn mirror(&mut self, record: &AnnotationRecord) {
        let Some(&height) = self.page_heights.get(&record.page_number) else {
            log::debug!("page {} never rendered; not mirroring {}", record.page_number, record.id);
            return;
        };
        let group = match ShapeGroup::from_json(&record.serialized_shape) {
            Ok(g) => g,
            Err(e) => {
                log::warn!("cannot mirror {}: {e}", record.id);
                return;
            }
        };
        if let Some(native) = NativeAnnotation::encode(record, &group, height, &self.config) {
            self.bindings.write_native(&native_id(record.id.as_str()), &native);
        }
    }

    fn mirror_deleted(&mut self, record: &AnnotationRecord) {
        if record.kind == AnnotationType::Note {
            return;
        }
        self.bindings
            .write_native(&native_id(record.id.as_str()), &NativeAnnotation::deleted(record));
    }

    // ─── Registry sync ──────────────────────────────────────────────────

    /// The editor owning a record's group, or `None` if its page is not
    /// mounted.
    ///
    /// # Errors
    /// `PainterError::Desync` when the page is mounted and no editor owns
    /// the group.
    fn owner(&self, record: &AnnotationRecord) -> Result<Option<(u32, AnnotationType)>, PainterError> {
        if !self.canvases.contains_key(&record.page_number) {
            return Ok(None);
        }
        let key = (record.page_number, record.kind);
        match self.editors.get(&key) {
            Some(editor) if editor.registry().contains(record.id) => Ok(Some(key)),
            _ => {
                log::error!(
                    "no {:?} editor on page {} owns group {}",
                    record.kind,
                    record.page_number,
                    record.id
                );
                Err(PainterError::Desync(record.id))
            }
        }
    }

    fn unmount_record(&mut self, record: &AnnotationRecord) {
        let Some(canvas) = self.canvases.get_mut(&record.page_number) else {
            return;
        };
        if let Some(editor) = self.editors.get_mut(&(record.page_number, record.kind)) {
            editor.registry_mut().delete_group(record.id, canvas);
        } else {
            canvas.layer.remove(record.id);
        }
    }

    fn remount_record(&mut self, record: &AnnotationRecord) {
        if let Some(canvas) = self.canvases.get_mut(&record.page_number) {
            mount_record(&mut self.editors, canvas, record);
        }
    }

    /// Every store record on a mounted page has a live group under its
    /// editor, and every live group outside an in-progress placement has a
    /// record.
    pub fn check_consistency(&self) -> Result<(), PainterError> {
        for record in self.store.iter() {
            if let Some(key) = self.owner(record)?
                && !self.canvases[&key.0].layer.contains(record.id)
            {
                return Err(PainterError::Desync(record.id));
            }
        }
        let in_progress: IndexSet<AnnotationId> = self.editors.values().filter_map(|e| e.base().current).collect();
        for canvas in self.canvases.values() {
            for id in canvas.layer.ids() {
                if !self.store.contains(id) && !in_progress.contains(&id) {
                    log::error!("group {id} on page {} has no record", canvas.page_number);
                    return Err(PainterError::Desync(id));
                }
            }
        }
        Ok(())
    }

    // ─── Store operations ───────────────────────────────────────────────

    /// Load annotations as originals (no history). With `merge_host`, the
    /// host document's own annotations are decoded and added, skipping any
    /// id already present in `external`.
    pub fn init_annotations(&mut self, external: Vec<AnnotationRecord>, merge_host: bool) -> usize {
        let mut records = external;
        if merge_host {
            let pages = self.bindings.host_pages();
            for page in &pages {
                self.page_heights
                    .entry(page.page_number)
                    .or_insert(page.viewport.canvas_height());
            }
            let known: IndexSet<AnnotationId> = records.iter().map(|r| r.id).collect();
            records.extend(
                self.decoders
                    .decode_all(&pages)
                    .into_iter()
                    .filter(|r| !known.contains(&r.id)),
            );
        }
        let count = records.len();
        for record in records {
            if let Some(canvas) = self.canvases.get_mut(&record.page_number) {
                mount_record(&mut self.editors, canvas, &record);
            }
            let def = record.definition();
            let stored = self.store.save(record, true);
            self.bindings.on_store_add(stored, true, Some(def));
        }
        log::info!("loaded {count} original annotations");
        count
    }

    /// Merge `patch` into a record and notify the host.
    fn store_update(&mut self, id: AnnotationId, patch: RecordPatch) -> Result<AnnotationRecord, PainterError> {
        let record = match self.store.update(id, patch) {
            Ok(r) => r.clone(),
            Err(e) => {
                log::warn!("{e}");
                return Err(e.into());
            }
        };
        self.bindings.on_annotation_change(&record);
        self.mirror(&record);
        Ok(record)
    }

    /// Merge `patch` into record `id`. A new serialized shape rebuilds the
    /// live group.
    ///
    /// # Errors
    /// `PainterError::Store` with `StoreError::NotFound` when `id` is
    /// absent.
    pub fn update(&mut self, id: AnnotationId, patch: RecordPatch) -> Result<AnnotationRecord, PainterError> {
        let rebuild = patch.serialized_shape.is_some();
        let record = self.store_update(id, patch)?;
        if rebuild {
            self.remount_record(&record);
        }
        Ok(record)
    }

    /// Remove record `id` and its group. `emit` controls `on_store_delete`.
    /// Absent ids are a no-op.
    pub fn delete(&mut self, id: AnnotationId, emit: bool) -> Result<Option<AnnotationRecord>, PainterError> {
        let Some(record) = self.store.get(id).cloned() else {
            log::warn!("delete of unknown annotation {id}");
            return Ok(None);
        };
        self.owner(&record)?;
        self.store.delete(id);
        self.unmount_record(&record);
        self.selector.forget(id);
        if emit {
            self.bindings.on_store_delete(id);
        }
        self.mirror_deleted(&record);
        log::debug!("deleted {id}");
        Ok(Some(record))
    }

    /// Scroll to and select record `id`. If its page is not mounted yet the
    /// selection completes on the page's next render.
    pub fn highlight(&mut self, id: AnnotationId) -> Result<(), PainterError> {
        let record = self.store.get(id).cloned().ok_or(StoreError::NotFound(id))?;
        if self.mode != PainterMode::Default {
            self.finish_tool();
        }
        self.bindings
            .scroll_into_view(record.page_number, record.bounding_client_rect);
        if self.canvases.contains_key(&record.page_number) {
            self.select_mounted(&record)
        } else {
            log::debug!("waiting for page {} to select {id}", record.page_number);
            self.pending_selection = Some(PendingSelection {
                id,
                page_number: record.page_number,
                retries: self.config.selection_retry_limit,
            });
            Ok(())
        }
    }

    fn select_mounted(&mut self, record: &AnnotationRecord) -> Result<(), PainterError> {
        self.owner(record)?;
        let Some(canvas) = self.canvases.get(&record.page_number) else {
            return Err(PainterError::UnknownPage(record.page_number));
        };
        let events = self.selector.select(canvas, record.id, Permissions::of(record));
        self.apply_selector_events(events)
    }

    /// Apply a style delta to an existing annotation. Fields the type does
    /// not allow editing are ignored; returns `None` if nothing changed.
    pub fn update_annotation_style(
        &mut self,
        id: AnnotationId,
        style: &AnnotationStyle,
    ) -> Result<Option<AnnotationRecord>, PainterError> {
        let record = self.store.get(id).cloned().ok_or(StoreError::NotFound(id))?;
        let effect = match self.owner(&record)? {
            Some(key) => {
                let canvas = self
                    .canvases
                    .get_mut(&key.0)
                    .ok_or(PainterError::UnknownPage(key.0))?;
                self.editors
                    .get_mut(&key)
                    .and_then(|editor| editor.change_style(canvas, id, style))
            }
            None => {
                let mut group = ShapeGroup::from_json(&record.serialized_shape)?;
                restyle_group(&mut group, style, record.definition().style_editable)
            }
        };
        match effect {
            Some(EditorEffect::Changed { id, patch }) => Ok(Some(self.store_update(id, patch)?)),
            _ => Ok(None),
        }
    }

    // ─── Comments ───────────────────────────────────────────────────────

    fn set_comments(&mut self, id: AnnotationId, comments: Vec<Comment>) -> Result<AnnotationRecord, PainterError> {
        self.store_update(
            id,
            RecordPatch {
                comments: Some(comments),
                ..RecordPatch::default()
            },
        )
    }

    fn comments_of(&self, id: AnnotationId) -> Result<Vec<Comment>, PainterError> {
        self.store
            .get(id)
            .map(|r| r.comments.clone())
            .ok_or_else(|| StoreError::NotFound(id).into())
    }

    /// Append a reply by the configured user.
    pub fn add_comment(&mut self, id: AnnotationId, content: &str) -> Result<Comment, PainterError> {
        let mut comments = self.comments_of(id)?;
        let comment = Comment {
            id: AnnotationId::generate().to_string(),
            title: self.config.user_name.clone(),
            date: timestamp_now(),
            content: content.to_owned(),
            status: CommentStatus::None,
        };
        comments.push(comment.clone());
        self.set_comments(id, comments)?;
        Ok(comment)
    }

    /// Edit a reply's text and optionally its review status. Returns
    /// whether the reply existed.
    pub fn update_comment(
        &mut self,
        id: AnnotationId,
        comment_id: &str,
        content: &str,
        status: Option<CommentStatus>,
    ) -> Result<bool, PainterError> {
        let mut comments = self.comments_of(id)?;
        let Some(comment) = comments.iter_mut().find(|c| c.id == comment_id) else {
            return Ok(false);
        };
        comment.content = content.to_owned();
        comment.date = timestamp_now();
        if let Some(status) = status {
            comment.status = status;
        }
        self.set_comments(id, comments)?;
        Ok(true)
    }

    pub fn remove_comment(&mut self, id: AnnotationId, comment_id: &str) -> Result<bool, PainterError> {
        let mut comments = self.comments_of(id)?;
        let before = comments.len();
        comments.retain(|c| c.id != comment_id);
        if comments.len() == before {
            return Ok(false);
        }
        self.set_comments(id, comments)?;
        Ok(true)
    }

    // ─── History ────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> Result<bool, PainterError> {
        self.step_history(AnnotationStore::undo)
    }

    pub fn redo(&mut self) -> Result<bool, PainterError> {
        self.step_history(AnnotationStore::redo)
    }

    pub fn can_undo(&self) -> bool {
        self.store.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.store.can_redo()
    }

    /// Move the history cursor and reconcile live groups with the restored
    /// mapping: vanished records lose their group, new ones gain one, and
    /// changed ones are rebuilt.
    fn step_history(&mut self, step: fn(&mut AnnotationStore) -> bool) -> Result<bool, PainterError> {
        self.cancel_in_progress();
        let events = self.selector.cancel();
        self.apply_selector_events(events)?;

        let before: IndexMap<AnnotationId, AnnotationRecord> = self.store.iter().map(|r| (r.id, r.clone())).collect();
        if !step(&mut self.store) {
            return Ok(false);
        }
        let after: IndexMap<AnnotationId, AnnotationRecord> = self.store.iter().map(|r| (r.id, r.clone())).collect();

        for (id, old) in &before {
            if !after.contains_key(id) {
                self.unmount_record(old);
                self.bindings.on_store_delete(*id);
                self.mirror_deleted(old);
            }
        }
        for (id, new) in &after {
            match before.get(id) {
                None => {
                    self.remount_record(new);
                    let is_original = self.store.is_original(*id);
                    self.bindings.on_store_add(new, is_original, Some(new.definition()));
                    self.mirror(new);
                }
                Some(old) if old != new => {
                    if old.serialized_shape != new.serialized_shape {
                        self.remount_record(new);
                    }
                    self.bindings.on_annotation_change(new);
                    self.mirror(new);
                }
                Some(_) => {}
            }
        }
        log::debug!("history moved, {} records live", after.len());
        Ok(true)
    }

    // ─── Data ───────────────────────────────────────────────────────────

    /// Every live record, for persistence.
    pub fn get_data(&self) -> Vec<AnnotationRecord> {
        self.store.records()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.store.is_dirty()
    }

    pub fn mark_saved(&mut self) {
        self.store.mark_saved();
    }
}
