//! Editor dispatch.
//!
//! One editor exists per (page, annotation type). Editors turn pointer
//! events on their page canvas into shape groups and report finished work as
//! `EditorEffect`s; the painter applies those to the store and notifies the
//! host.

mod eraser;
mod freehand;
mod highlight;
mod shapes;
mod stamp;
mod text;

pub use eraser::EraserEditor;
pub use freehand::FreehandEditor;
pub use highlight::{HighlightEditor, merge_span_rects};
pub use shapes::ShapeEditor;
pub use stamp::{StampEditor, StampPayload};
pub use text::TextEditor;

use crate::bindings::{PageSelection, TextInput, TextRequest};
use crate::canvas::PageCanvas;
use crate::input::{InputEvent, Modifiers};
use crate::registry::ShapeGroupRegistry;
use kurbo::Point;
use pa_core::definitions::{AnnotationStyle, AnnotationTypeDefinition};
use pa_core::{AnnotationId, AnnotationRecord, AnnotationType, Color, Contents, PainterConfig, RecordPatch, ShapeGroup};

/// Work an editor hands back to the painter.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEffect {
    /// A finished group, to be saved as a new record.
    Created(AnnotationRecord),
    /// New serialized form or style for an existing record.
    Changed { id: AnnotationId, patch: RecordPatch },
    /// The eraser hid this group during the current stroke.
    Erased(AnnotationId),
    /// Ask the host for text before finishing the group.
    AwaitText(TextRequest),
    /// A single-use tool produced its annotation.
    Finished,
}

/// What an editor may touch while handling an event.
pub struct EditorContext<'a> {
    pub canvas: &'a mut PageCanvas,
    pub config: &'a PainterConfig,
    pub measure_text: &'a dyn Fn(&str, f64) -> f64,
}

/// Editors that take an auxiliary payload on activation (signature and
/// stamp images).
pub trait AcceptsPayload {
    fn activate_with_payload(
        &mut self,
        definition: &'static AnnotationTypeDefinition,
        style: AnnotationStyle,
        payload: &str,
    );
}

pub trait Editor {
    fn base(&self) -> &EditorBase;
    fn base_mut(&mut self) -> &mut EditorBase;

    fn kind(&self) -> AnnotationType {
        self.base().kind
    }

    fn page_number(&self) -> u32 {
        self.base().page_number
    }

    fn registry(&self) -> &ShapeGroupRegistry {
        &self.base().registry
    }

    fn registry_mut(&mut self) -> &mut ShapeGroupRegistry {
        &mut self.base_mut().registry
    }

    /// Make this editor the active tool with `style` as its drawing style.
    fn activate(&mut self, _definition: &'static AnnotationTypeDefinition, style: AnnotationStyle) {
        self.base_mut().style = style;
    }

    /// Payload capability; `None` for editors that take no payload.
    fn payload_target(&mut self) -> Option<&mut dyn AcceptsPayload> {
        None
    }

    fn pointer_down(&mut self, _ctx: &mut EditorContext<'_>, _p: Point, _m: Modifiers) -> Vec<EditorEffect> {
        Vec::new()
    }

    fn pointer_move(&mut self, _ctx: &mut EditorContext<'_>, _p: Point, _m: Modifiers) -> Vec<EditorEffect> {
        Vec::new()
    }

    fn pointer_up(&mut self, _ctx: &mut EditorContext<'_>, _p: Point) -> Vec<EditorEffect> {
        Vec::new()
    }

    /// Route an event. Presses on an existing shape are left to the selector.
    fn handle(&mut self, ctx: &mut EditorContext<'_>, event: &InputEvent) -> Vec<EditorEffect> {
        match *event {
            InputEvent::PointerDown {
                on_canvas: false, ..
            } => Vec::new(),
            InputEvent::PointerDown { x, y, modifiers, .. } => {
                self.pointer_down(ctx, Point::new(x, y), modifiers)
            }
            InputEvent::PointerMove { x, y, modifiers } => self.pointer_move(ctx, Point::new(x, y), modifiers),
            InputEvent::PointerUp { x, y } => self.pointer_up(ctx, Point::new(x, y)),
        }
    }

    /// Apply a style delta to a group this editor owns.
    fn change_style(
        &mut self,
        canvas: &mut PageCanvas,
        id: AnnotationId,
        style: &AnnotationStyle,
    ) -> Option<EditorEffect> {
        let editable = self.kind().definition().style_editable;
        let group = self.registry().get_group_mut(id, canvas)?;
        restyle_group(group, style, editable)
    }

    /// Build annotations from selected text. Only the text-markup editors
    /// respond.
    fn convert_text_selection(&mut self, _ctx: &mut EditorContext<'_>, _selection: &PageSelection) -> Vec<EditorEffect> {
        Vec::new()
    }

    /// Finish a pending text-entry step. `None` means the host dismissed it.
    fn complete_text(&mut self, _ctx: &mut EditorContext<'_>, _input: Option<TextInput>) -> Vec<EditorEffect> {
        Vec::new()
    }

    /// Abandon any in-progress placement and discard its partial group.
    fn cancel(&mut self, canvas: &mut PageCanvas) {
        let base = self.base_mut();
        if let Some(id) = base.current.take() {
            base.registry.delete_group(id, canvas);
        }
    }

    /// True while a placement is in progress.
    fn is_busy(&self) -> bool {
        self.base().current.is_some()
    }
}

/// Construct the editor for `kind` on `page_number`. `Select` is handled by
/// the selector and has no editor.
pub fn create_editor(kind: AnnotationType, page_number: u32) -> Option<Box<dyn Editor>> {
    let editor: Box<dyn Editor> = match kind {
        AnnotationType::Select => return None,
        AnnotationType::Highlight
        | AnnotationType::Strikeout
        | AnnotationType::Underline
        | AnnotationType::Squiggly => Box::new(HighlightEditor::new(kind, page_number)),
        AnnotationType::Rectangle
        | AnnotationType::Circle
        | AnnotationType::Arrow
        | AnnotationType::Cloud => Box::new(ShapeEditor::new(kind, page_number)),
        AnnotationType::Freehand | AnnotationType::FreeHighlight => {
            Box::new(FreehandEditor::new(kind, page_number))
        }
        AnnotationType::FreeText | AnnotationType::Note => Box::new(TextEditor::new(kind, page_number)),
        AnnotationType::Signature | AnnotationType::Stamp => Box::new(StampEditor::new(kind, page_number)),
        AnnotationType::Eraser => Box::new(EraserEditor::new(page_number)),
    };
    Some(editor)
}

// ─── Shared state ───────────────────────────────────────────────────────

/// State every editor carries.
#[derive(Debug)]
pub struct EditorBase {
    pub kind: AnnotationType,
    pub page_number: u32,
    pub registry: ShapeGroupRegistry,
    pub style: AnnotationStyle,
    /// Group under construction.
    pub current: Option<AnnotationId>,
    pub anchor: Point,
}

impl EditorBase {
    pub fn new(kind: AnnotationType, page_number: u32) -> Self {
        Self {
            kind,
            page_number,
            registry: ShapeGroupRegistry::new(),
            style: kind.definition().style,
            current: None,
            anchor: Point::ZERO,
        }
    }

    pub fn definition(&self) -> &'static AnnotationTypeDefinition {
        self.kind.definition()
    }

    pub fn color(&self, config: &PainterConfig) -> Color {
        self.style.color.unwrap_or(config.default_color)
    }

    pub fn stroke_width(&self, config: &PainterConfig) -> f64 {
        self.style.stroke_width.unwrap_or(config.stroke_width)
    }

    pub fn opacity(&self, config: &PainterConfig) -> f64 {
        self.style.opacity.unwrap_or(config.opacity)
    }

    pub fn font_size(&self, config: &PainterConfig) -> f64 {
        self.style.font_size.unwrap_or(config.font_size)
    }

    /// Start a fresh group at `anchor`.
    pub fn begin(&mut self, canvas: &mut PageCanvas, anchor: Point) -> AnnotationId {
        let id = self.registry.create_group(canvas);
        self.current = Some(id);
        self.anchor = anchor;
        id
    }

    /// Tear down a partial group.
    pub fn discard(&mut self, canvas: &mut PageCanvas, id: AnnotationId) {
        log::trace!("discarding partial group {id} on page {}", self.page_number);
        self.registry.delete_group(id, canvas);
        if self.current == Some(id) {
            self.current = None;
        }
    }

    /// Turn a finished group into a record. Empty groups are discarded.
    pub fn finish(
        &mut self,
        ctx: &mut EditorContext<'_>,
        id: AnnotationId,
        contents: Contents,
        font_size: Option<f64>,
    ) -> Option<AnnotationRecord> {
        if self.current == Some(id) {
            self.current = None;
        }
        let group = self.registry.get_group_by_id(id, ctx.canvas)?;
        let (Some(rect), false) = (group.client_rect(), group.is_empty()) else {
            self.discard(ctx.canvas, id);
            return None;
        };
        let color = group.color();
        let serialized = match group.to_json() {
            Ok(s) => s,
            Err(e) => {
                log::error!("cannot serialize group {id}: {e}");
                self.discard(ctx.canvas, id);
                return None;
            }
        };
        let mut record = AnnotationRecord::new(
            id,
            self.page_number,
            self.definition(),
            serialized,
            rect,
            ctx.config.user_name.clone(),
        );
        record.color = color;
        record.font_size = font_size;
        record.contents = contents;
        Some(record)
    }

    /// `Finished` for single-use tools, nothing otherwise.
    pub fn once_effect(&self) -> Option<EditorEffect> {
        self.definition().is_once.then_some(EditorEffect::Finished)
    }
}

/// Apply the editable parts of `style` to every primitive of `group` and
/// report the new serialized form.
pub fn restyle_group(
    group: &mut ShapeGroup,
    style: &AnnotationStyle,
    editable: pa_core::definitions::StyleEditable,
) -> Option<EditorEffect> {
    if !editable.any() {
        return None;
    }
    for shape in group.children.iter_mut() {
        let Some(paint) = shape.paint_mut() else {
            continue;
        };
        if editable.color
            && let Some(color) = style.color
        {
            paint.set_color(color);
        }
        if editable.stroke_width
            && let Some(width) = style.stroke_width
        {
            paint.stroke_width = width;
        }
        if editable.opacity
            && let Some(opacity) = style.opacity
        {
            paint.opacity = opacity;
        }
    }
    let patch = group_patch(group)?;
    Some(EditorEffect::Changed { id: group.id, patch })
}

/// Serialized form, bounds and color of a group as a record patch.
pub fn group_patch(group: &ShapeGroup) -> Option<RecordPatch> {
    let rect = group.client_rect()?;
    match group.to_json() {
        Ok(serialized) => Some(RecordPatch {
            color: group.color(),
            ..RecordPatch::shape(serialized, rect)
        }),
        Err(e) => {
            log::error!("cannot serialize group {}: {e}", group.id);
            None
        }
    }
}
