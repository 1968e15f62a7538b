//! Stroke eraser. Any visible group on the page that the eraser circle
//! touches is hidden and reported once per stroke.

use super::{Editor, EditorBase, EditorContext, EditorEffect};
use crate::canvas::PageCanvas;
use crate::input::{InputEvent, Modifiers};
use kurbo::Point;
use pa_core::definitions::AnnotationStyle;
use pa_core::{AnnotationId, AnnotationType, geometry};
use std::collections::HashSet;

pub struct EraserEditor {
    base: EditorBase,
    erasing: bool,
    visited: HashSet<AnnotationId>,
}

impl EraserEditor {
    pub fn new(page_number: u32) -> Self {
        Self {
            base: EditorBase::new(AnnotationType::Eraser, page_number),
            erasing: false,
            visited: HashSet::new(),
        }
    }

    fn erase_at(&mut self, ctx: &mut EditorContext<'_>, p: Point) -> Vec<EditorEffect> {
        let radius = ctx.config.eraser_radius;
        let hits: Vec<AnnotationId> = ctx
            .canvas
            .layer
            .iter()
            .filter(|g| g.visible && !self.visited.contains(&g.id))
            .filter(|g| g.client_rect().is_some_and(|r| geometry::circle_intersects_rect(p, radius, &r)))
            .map(|g| g.id)
            .collect();
        hits.into_iter()
            .map(|id| {
                self.visited.insert(id);
                if let Some(group) = ctx.canvas.layer.get_mut(id) {
                    group.visible = false;
                }
                log::debug!("erased {id} on page {}", self.base.page_number);
                EditorEffect::Erased(id)
            })
            .collect()
    }
}

impl Editor for EraserEditor {
    fn base(&self) -> &EditorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EditorBase {
        &mut self.base
    }

    fn pointer_down(&mut self, ctx: &mut EditorContext<'_>, p: Point, _m: Modifiers) -> Vec<EditorEffect> {
        self.visited.clear();
        self.erasing = true;
        self.erase_at(ctx, p)
    }

    fn pointer_move(&mut self, ctx: &mut EditorContext<'_>, p: Point, _m: Modifiers) -> Vec<EditorEffect> {
        if !self.erasing {
            return Vec::new();
        }
        self.erase_at(ctx, p)
    }

    fn pointer_up(&mut self, _ctx: &mut EditorContext<'_>, _p: Point) -> Vec<EditorEffect> {
        self.erasing = false;
        self.visited.clear();
        Vec::new()
    }

    /// The eraser presses on shapes too.
    fn handle(&mut self, ctx: &mut EditorContext<'_>, event: &InputEvent) -> Vec<EditorEffect> {
        let p = event.position();
        match *event {
            InputEvent::PointerDown { modifiers, .. } => self.pointer_down(ctx, p, modifiers),
            InputEvent::PointerMove { modifiers, .. } => self.pointer_move(ctx, p, modifiers),
            InputEvent::PointerUp { .. } => self.pointer_up(ctx, p),
        }
    }

    fn change_style(&mut self, _canvas: &mut PageCanvas, _id: AnnotationId, _style: &AnnotationStyle) -> Option<EditorEffect> {
        None
    }

    fn cancel(&mut self, _canvas: &mut PageCanvas) {
        self.erasing = false;
        self.visited.clear();
    }

    fn is_busy(&self) -> bool {
        self.erasing
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use pa_core::shape::{Paint, Shape, ShapeGroup};
    use pa_core::{Color, PainterConfig};

    fn square(id: &str, x: f64, y: f64) -> ShapeGroup {
        ShapeGroup::with_shape(
            AnnotationId::intern(id),
            Shape::Rect {
                x,
                y,
                width: 20.0,
                height: 20.0,
                paint: Paint::stroke(Color::RED, 2.0, 1.0),
            },
        )
    }

    #[test]
    fn each_group_erased_once_per_stroke() {
        let config = PainterConfig::default();
        let mut canvas = canvas(1);
        canvas.layer.add(square("era-a", 0.0, 0.0));
        let mut eraser = EraserEditor::new(1);
        let mut ctx = EditorContext {
            canvas: &mut canvas,
            config: &config,
            measure_text: &measure,
        };
        let mut effects = eraser.handle(&mut ctx, &InputEvent::down(5.0, 5.0));
        effects.extend(eraser.handle(&mut ctx, &InputEvent::moved(6.0, 6.0)));
        effects.extend(eraser.handle(&mut ctx, &InputEvent::moved(7.0, 7.0)));
        effects.extend(eraser.handle(&mut ctx, &InputEvent::up(7.0, 7.0)));
        assert_eq!(effects, vec![EditorEffect::Erased(AnnotationId::intern("era-a"))]);
        assert!(!canvas.layer.get(AnnotationId::intern("era-a")).unwrap().visible);
    }

    #[test]
    fn one_stroke_can_erase_several_groups() {
        let config = PainterConfig::default();
        let mut canvas = canvas(1);
        canvas.layer.add(square("era-b", 0.0, 0.0));
        canvas.layer.add(square("era-c", 100.0, 0.0));
        canvas.layer.add(square("era-d", 300.0, 300.0));
        let mut eraser = EraserEditor::new(1);
        let mut ctx = EditorContext {
            canvas: &mut canvas,
            config: &config,
            measure_text: &measure,
        };
        let mut effects = eraser.handle(&mut ctx, &InputEvent::down(10.0, 10.0));
        effects.extend(eraser.handle(&mut ctx, &InputEvent::moved(60.0, 10.0)));
        effects.extend(eraser.handle(&mut ctx, &InputEvent::moved(105.0, 10.0)));
        assert_eq!(
            effects,
            vec![
                EditorEffect::Erased(AnnotationId::intern("era-b")),
                EditorEffect::Erased(AnnotationId::intern("era-c")),
            ]
        );
    }

    #[test]
    fn moving_without_press_erases_nothing() {
        let config = PainterConfig::default();
        let mut canvas = canvas(1);
        canvas.layer.add(square("era-e", 0.0, 0.0));
        let mut eraser = EraserEditor::new(1);
        let mut ctx = EditorContext {
            canvas: &mut canvas,
            config: &config,
            measure_text: &measure,
        };
        assert!(eraser.handle(&mut ctx, &InputEvent::moved(5.0, 5.0)).is_empty());
        assert!(eraser.change_style(ctx.canvas, AnnotationId::intern("era-e"), &AnnotationStyle::EMPTY).is_none());
    }
}
