//! Text markup: highlight, underline, strikeout and squiggly.
//!
//! These editors ignore the pointer. They turn a text selection on their page
//! into one group with a markup box per merged span run.

use super::{Editor, EditorBase, EditorContext, EditorEffect};
use crate::bindings::PageSelection;
use kurbo::Point;
use pa_core::geometry::{self, ClientRect};
use pa_core::shape::{MarkupKind, Paint, Shape};
use pa_core::{AnnotationType, Contents};

/// Merge span rects into the boxes to draw.
///
/// Each entry is `(blank, rect)`. A blank span is folded forward into the
/// next non-blank span; a trailing run of blank spans is folded into the
/// last box.
pub fn merge_span_rects(spans: &[(bool, ClientRect)]) -> Vec<ClientRect> {
    let mut boxes: Vec<ClientRect> = Vec::new();
    let mut pending: Option<ClientRect> = None;
    for &(blank, rect) in spans {
        let merged = pending.take().map_or(rect, |p| p.union(&rect));
        if blank {
            pending = Some(merged);
        } else {
            boxes.push(merged);
        }
    }
    if let (Some(tail), Some(last)) = (pending, boxes.last_mut()) {
        *last = last.union(&tail);
    }
    boxes
}

fn markup_kind(kind: AnnotationType) -> MarkupKind {
    match kind {
        AnnotationType::Underline => MarkupKind::Underline,
        AnnotationType::Strikeout => MarkupKind::StrikeOut,
        AnnotationType::Squiggly => MarkupKind::Squiggly,
        _ => MarkupKind::Highlight,
    }
}

pub struct HighlightEditor {
    base: EditorBase,
}

impl HighlightEditor {
    pub fn new(kind: AnnotationType, page_number: u32) -> Self {
        Self {
            base: EditorBase::new(kind, page_number),
        }
    }

    fn paint(&self, ctx: &EditorContext<'_>) -> Paint {
        let color = self.base.color(ctx.config);
        match self.base.kind {
            AnnotationType::Highlight => {
                let mut paint = Paint::fill(color, self.base.style.opacity.unwrap_or(0.5));
                paint.multiply = true;
                paint
            }
            _ => Paint::stroke(
                color,
                self.base.style.stroke_width.unwrap_or(1.0),
                self.base.opacity(ctx.config),
            ),
        }
    }
}

impl Editor for HighlightEditor {
    fn base(&self) -> &EditorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EditorBase {
        &mut self.base
    }

    fn convert_text_selection(&mut self, ctx: &mut EditorContext<'_>, selection: &PageSelection) -> Vec<EditorEffect> {
        let origin = Point::new(selection.origin.x, selection.origin.y);
        let scale = ctx.canvas.viewport.scale;
        let spans: Vec<(bool, ClientRect)> = selection
            .spans
            .iter()
            .map(|s| (s.is_blank(), geometry::relative_span_rect(&s.rect, origin, scale)))
            .collect();
        let boxes = merge_span_rects(&spans);
        if boxes.is_empty() {
            log::debug!("selection on page {} has no text to mark", selection.page_number);
            return Vec::new();
        }

        let markup = markup_kind(self.base.kind);
        let paint = self.paint(ctx);
        let id = self.base.begin(ctx.canvas, origin);
        if let Some(group) = self.base.registry.get_group_mut(id, ctx.canvas) {
            group.children.extend(boxes.iter().map(|b| Shape::Markup {
                markup,
                x: b.x,
                y: b.y,
                width: b.width,
                height: b.height,
                paint: paint.clone(),
            }));
        }
        match self.base.finish(ctx, id, Contents::text(selection.text()), None) {
            Some(record) => {
                log::debug!("{:?} {} over {} boxes", self.base.kind, record.id, boxes.len());
                vec![EditorEffect::Created(record)]
            }
            None => Vec::new(),
        }
    }
}
