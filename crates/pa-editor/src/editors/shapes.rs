//! Drag-to-size shapes: rectangle, ellipse, arrow and cloud.

use super::{Editor, EditorBase, EditorContext, EditorEffect};
use crate::input::Modifiers;
use kurbo::Point;
use pa_core::geometry::{self, ClientRect};
use pa_core::shape::{Paint, Shape};
use pa_core::{AnnotationType, Contents};

pub struct ShapeEditor {
    base: EditorBase,
    drawing: bool,
}

impl ShapeEditor {
    pub fn new(kind: AnnotationType, page_number: u32) -> Self {
        Self {
            base: EditorBase::new(kind, page_number),
            drawing: false,
        }
    }

    /// Geometry for a drag from the anchor to `p`.
    fn shape_for(&self, p: Point, shift: bool, paint: Paint) -> Shape {
        let anchor = self.base.anchor;
        let mut rect = ClientRect::from_corners(anchor, p);
        // Shift: constrain to square / circle
        if shift && self.base.kind != AnnotationType::Arrow {
            let side = rect.width.max(rect.height);
            rect.width = side;
            rect.height = side;
            if p.x < anchor.x {
                rect.x = anchor.x - side;
            }
            if p.y < anchor.y {
                rect.y = anchor.y - side;
            }
        }
        match self.base.kind {
            AnnotationType::Circle => Shape::Ellipse {
                cx: rect.x + rect.width / 2.0,
                cy: rect.y + rect.height / 2.0,
                rx: rect.width / 2.0,
                ry: rect.height / 2.0,
                paint,
            },
            AnnotationType::Arrow => {
                let head = (paint.stroke_width * 4.0).max(8.0);
                Shape::Arrow {
                    points: [anchor.x, anchor.y, p.x, p.y],
                    pointer_length: head,
                    pointer_width: head,
                    paint,
                }
            }
            AnnotationType::Cloud => Shape::Line {
                points: geometry::cloud_outline(&rect, (paint.stroke_width * 6.0).max(12.0)),
                closed: true,
                paint,
            },
            _ => Shape::Rect {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
                paint,
            },
        }
    }

    fn is_degenerate(&self, p: Point, min: f64) -> bool {
        let anchor = self.base.anchor;
        match self.base.kind {
            AnnotationType::Arrow => anchor.distance(p) < min,
            _ => ClientRect::from_corners(anchor, p).is_degenerate(min),
        }
    }

    fn update(&mut self, ctx: &mut EditorContext<'_>, p: Point, shift: bool) {
        let Some(id) = self.base.current else {
            return;
        };
        let paint = Paint::stroke(
            self.base.color(ctx.config),
            self.base.stroke_width(ctx.config),
            self.base.opacity(ctx.config),
        );
        let shape = self.shape_for(p, shift, paint);
        if let Some(group) = self.base.registry.get_group_mut(id, ctx.canvas) {
            group.children.clear();
            group.children.push(shape);
        }
    }
}

impl Editor for ShapeEditor {
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
        self.drawing = true;
        self.base.begin(ctx.canvas, p);
        Vec::new()
    }

    fn pointer_move(&mut self, ctx: &mut EditorContext<'_>, p: Point, m: Modifiers) -> Vec<EditorEffect> {
        if self.drawing {
            self.update(ctx, p, m.shift);
        }
        Vec::new()
    }

    fn pointer_up(&mut self, ctx: &mut EditorContext<'_>, p: Point) -> Vec<EditorEffect> {
        if !self.drawing {
            return Vec::new();
        }
        self.drawing = false;
        let Some(id) = self.base.current else {
            return Vec::new();
        };
        let group_empty = self
            .base
            .registry
            .get_group_by_id(id, ctx.canvas)
            .is_none_or(|g| g.is_empty());
        if group_empty || self.is_degenerate(p, ctx.config.min_shape_size) {
            self.base.discard(ctx.canvas, id);
            return Vec::new();
        }
        let Some(record) = self.base.finish(ctx, id, Contents::default(), None) else {
            return Vec::new();
        };
        log::debug!("{:?} {} created on page {}", self.base.kind, record.id, record.page_number);
        let mut effects = vec![EditorEffect::Created(record)];
        effects.extend(self.base.once_effect());
        effects
    }

    fn is_busy(&self) -> bool {
        self.drawing
    }
}
