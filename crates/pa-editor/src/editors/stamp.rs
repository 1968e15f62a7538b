//! Signature and stamp placement. The image arrives as an activation
//! payload; a preview follows the pointer until the user clicks.

use super::{AcceptsPayload, Editor, EditorBase, EditorContext, EditorEffect};
use crate::canvas::PageCanvas;
use crate::input::Modifiers;
use kurbo::Point;
use pa_core::definitions::{AnnotationStyle, AnnotationTypeDefinition};
use pa_core::shape::Shape;
use pa_core::{AnnotationType, Contents, PainterConfig};
use serde::Deserialize;

/// Image to place. Unset dimensions fall back to `PainterConfig::stamp_size`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StampPayload {
    pub src: String,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

impl StampPayload {
    /// Accepts `{"src": .., "width": .., "height": ..}` or a bare image URL.
    pub fn parse(payload: &str) -> Option<Self> {
        let payload = payload.trim();
        if payload.is_empty() {
            return None;
        }
        if payload.starts_with('{') {
            return match serde_json::from_str(payload) {
                Ok(p) => Some(p),
                Err(e) => {
                    log::warn!("ignoring malformed stamp payload: {e}");
                    None
                }
            };
        }
        Some(Self {
            src: payload.to_owned(),
            width: None,
            height: None,
        })
    }

    fn size(&self, config: &PainterConfig) -> (f64, f64) {
        (
            self.width.unwrap_or(config.stamp_size.width),
            self.height.unwrap_or(config.stamp_size.height),
        )
    }
}

pub struct StampEditor {
    base: EditorBase,
    payload: Option<StampPayload>,
}

impl StampEditor {
    pub fn new(kind: AnnotationType, page_number: u32) -> Self {
        Self {
            base: EditorBase::new(kind, page_number),
            payload: None,
        }
    }

    fn image_at(&self, config: &PainterConfig, p: Point) -> Option<Shape> {
        let payload = self.payload.as_ref()?;
        let (width, height) = payload.size(config);
        Some(Shape::Image {
            x: p.x - width / 2.0,
            y: p.y - height / 2.0,
            width,
            height,
            src: payload.src.clone(),
        })
    }

    fn place(&mut self, ctx: &mut EditorContext<'_>, p: Point) -> Option<pa_core::AnnotationId> {
        let shape = self.image_at(ctx.config, p)?;
        let id = match self.base.current {
            Some(id) => id,
            None => self.base.begin(ctx.canvas, p),
        };
        let group = self.base.registry.get_group_mut(id, ctx.canvas)?;
        group.children.clear();
        group.children.push(shape);
        Some(id)
    }
}

impl AcceptsPayload for StampEditor {
    fn activate_with_payload(
        &mut self,
        _definition: &'static AnnotationTypeDefinition,
        style: AnnotationStyle,
        payload: &str,
    ) {
        self.base.style = style;
        self.payload = StampPayload::parse(payload);
        if self.payload.is_none() {
            log::warn!("{:?} activated without an image", self.base.kind);
        }
    }
}

impl Editor for StampEditor {
    fn base(&self) -> &EditorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EditorBase {
        &mut self.base
    }

    fn payload_target(&mut self) -> Option<&mut dyn AcceptsPayload> {
        Some(self)
    }

    fn pointer_move(&mut self, ctx: &mut EditorContext<'_>, p: Point, _m: Modifiers) -> Vec<EditorEffect> {
        self.place(ctx, p);
        Vec::new()
    }

    fn pointer_up(&mut self, ctx: &mut EditorContext<'_>, p: Point) -> Vec<EditorEffect> {
        let Some(id) = self.place(ctx, p) else {
            return Vec::new();
        };
        let contents = Contents {
            text: String::new(),
            image: self.payload.take().map(|payload| payload.src),
        };
        match self.base.finish(ctx, id, contents, None) {
            Some(record) => {
                log::debug!("{:?} {} placed on page {}", self.base.kind, record.id, record.page_number);
                let mut effects = vec![EditorEffect::Created(record)];
                effects.extend(self.base.once_effect());
                effects
            }
            None => Vec::new(),
        }
    }

    fn cancel(&mut self, canvas: &mut PageCanvas) {
        self.payload = None;
        if let Some(id) = self.base.current.take() {
            self.base.registry.delete_group(id, canvas);
        }
    }

    fn is_busy(&self) -> bool {
        self.payload.is_some()
    }
}
