//! Freehand pen and free highlighter.

use super::{Editor, EditorBase, EditorContext, EditorEffect};
use crate::input::Modifiers;
use kurbo::Point;
use pa_core::shape::{Paint, Shape};
use pa_core::{AnnotationType, Contents};

/// Minimum pointer travel before another point is recorded.
const MIN_STEP: f64 = 0.5;

pub struct FreehandEditor {
    base: EditorBase,
    points: Vec<f64>,
    last: Option<Point>,
}

impl FreehandEditor {
    pub fn new(kind: AnnotationType, page_number: u32) -> Self {
        Self {
            base: EditorBase::new(kind, page_number),
            points: Vec::new(),
            last: None,
        }
    }

    fn paint(&self, ctx: &EditorContext<'_>) -> Paint {
        let mut paint = Paint::stroke(
            self.base.color(ctx.config),
            self.base.stroke_width(ctx.config),
            self.base.opacity(ctx.config),
        );
        paint.multiply = self.base.kind == AnnotationType::FreeHighlight;
        paint
    }

    fn push(&mut self, p: Point) -> bool {
        if self.last.is_some_and(|last| last.distance(p) < MIN_STEP) {
            return false;
        }
        self.points.extend([p.x, p.y]);
        self.last = Some(p);
        true
    }

    fn sync(&mut self, ctx: &mut EditorContext<'_>) {
        let Some(id) = self.base.current else {
            return;
        };
        let shape = Shape::Line {
            points: self.points.clone(),
            closed: false,
            paint: self.paint(ctx),
        };
        if let Some(group) = self.base.registry.get_group_mut(id, ctx.canvas) {
            group.children.clear();
            group.children.push(shape);
        }
    }
}

impl Editor for FreehandEditor {
    fn base(&self) -> &EditorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EditorBase {
        &mut self.base
    }

    fn pointer_down(&mut self, ctx: &mut EditorContext<'_>, p: Point, _m: Modifiers) -> Vec<EditorEffect> {
        if let Some(stale) = self.base.current {
            self.base.discard(ctx.canvas, stale);
        }
        self.points.clear();
        self.last = None;
        self.base.begin(ctx.canvas, p);
        self.push(p);
        Vec::new()
    }

    fn pointer_move(&mut self, ctx: &mut EditorContext<'_>, p: Point, _m: Modifiers) -> Vec<EditorEffect> {
        if self.base.current.is_some() && self.push(p) {
            self.sync(ctx);
        }
        Vec::new()
    }

    fn pointer_up(&mut self, ctx: &mut EditorContext<'_>, p: Point) -> Vec<EditorEffect> {
        let Some(id) = self.base.current else {
            return Vec::new();
        };
        self.push(p);
        let points = std::mem::take(&mut self.points);
        self.last = None;
        if points.len() < 4 {
            self.base.discard(ctx.canvas, id);
            return Vec::new();
        }
        self.points = points;
        self.sync(ctx);
        self.points.clear();
        match self.base.finish(ctx, id, Contents::default(), None) {
            Some(record) => {
                log::debug!("stroke {} created on page {}", record.id, record.page_number);
                let mut effects = vec![EditorEffect::Created(record)];
                effects.extend(self.base.once_effect());
                effects
            }
            None => Vec::new(),
        }
    }

    fn cancel(&mut self, canvas: &mut crate::canvas::PageCanvas) {
        self.points.clear();
        self.last = None;
        if let Some(id) = self.base.current.take() {
            self.base.registry.delete_group(id, canvas);
        }
    }
}
