//! Free text and sticky notes. A click opens a host text-entry step; the
//! group is built once the host answers.

use super::{Editor, EditorBase, EditorContext, EditorEffect};
use crate::bindings::{TextInput, TextRequest};
use crate::canvas::PageCanvas;
use crate::input::Modifiers;
use kurbo::Point;
use pa_core::geometry::ClientRect;
use pa_core::shape::{Paint, Shape};
use pa_core::{AnnotationType, Contents};

const NOTE_ICON_SIZE: f64 = 20.0;
const LINE_HEIGHT: f64 = 1.2;

pub struct TextEditor {
    base: EditorBase,
    armed: bool,
}

impl TextEditor {
    pub fn new(kind: AnnotationType, page_number: u32) -> Self {
        Self {
            base: EditorBase::new(kind, page_number),
            armed: false,
        }
    }

    fn text_shape(&self, ctx: &EditorContext<'_>, value: &str, font_size: f64, paint: Paint) -> Shape {
        let anchor = self.base.anchor;
        let max_width = ctx.config.free_text_max_width;
        let widths: Vec<f64> = value.lines().map(|l| (ctx.measure_text)(l, font_size)).collect();
        let width = widths.iter().copied().fold(0.0, f64::max).min(max_width).max(1.0);
        let rows: f64 = widths.iter().map(|w| (w / width).ceil().max(1.0)).sum();
        Shape::Text {
            x: anchor.x,
            y: anchor.y + 2.0,
            width,
            height: rows.max(1.0) * font_size * LINE_HEIGHT,
            text: value.to_owned(),
            font_size,
            paint,
        }
    }
}

impl Editor for TextEditor {
    fn base(&self) -> &EditorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EditorBase {
        &mut self.base
    }

    fn pointer_down(&mut self, ctx: &mut EditorContext<'_>, _p: Point, _m: Modifiers) -> Vec<EditorEffect> {
        // A second click while the host is still asking for text drops the first.
        self.cancel(ctx.canvas);
        self.armed = true;
        Vec::new()
    }

    fn pointer_up(&mut self, ctx: &mut EditorContext<'_>, p: Point) -> Vec<EditorEffect> {
        if !std::mem::take(&mut self.armed) {
            return Vec::new();
        }
        let id = self.base.begin(ctx.canvas, p);
        let request = TextRequest {
            id,
            page_number: self.base.page_number,
            kind: self.base.kind,
            anchor: ctx.canvas.to_screen(&ClientRect::new(p.x, p.y, 0.0, 0.0)),
            color: self.base.color(ctx.config),
            font_size: self.base.font_size(ctx.config),
        };
        vec![EditorEffect::AwaitText(request)]
    }

    fn complete_text(&mut self, ctx: &mut EditorContext<'_>, input: Option<TextInput>) -> Vec<EditorEffect> {
        let Some(id) = self.base.current else {
            return Vec::new();
        };
        let Some(input) = input.filter(|i| !i.value.trim().is_empty()) else {
            self.base.discard(ctx.canvas, id);
            return Vec::new();
        };

        let color = input.color.unwrap_or_else(|| self.base.color(ctx.config));
        let font_size = input.font_size.unwrap_or_else(|| self.base.font_size(ctx.config));
        let paint = Paint::fill(color, self.base.opacity(ctx.config));
        let (shape, font) = match self.base.kind {
            AnnotationType::Note => (
                Shape::NoteIcon {
                    x: self.base.anchor.x,
                    y: self.base.anchor.y,
                    size: NOTE_ICON_SIZE,
                    paint,
                },
                None,
            ),
            _ => (self.text_shape(ctx, &input.value, font_size, paint), Some(font_size)),
        };
        if let Some(group) = self.base.registry.get_group_mut(id, ctx.canvas) {
            group.children.clear();
            group.children.push(shape);
        }
        match self.base.finish(ctx, id, Contents::text(input.value), font) {
            Some(record) => {
                let mut effects = vec![EditorEffect::Created(record)];
                effects.extend(self.base.once_effect());
                effects
            }
            None => Vec::new(),
        }
    }

    fn cancel(&mut self, canvas: &mut PageCanvas) {
        self.armed = false;
        if let Some(id) = self.base.current.take() {
            self.base.registry.delete_group(id, canvas);
        }
    }

    fn is_busy(&self) -> bool {
        self.armed || self.base.current.is_some()
    }
}
