//! Host-native annotation formats.
//!
//! Input: annotations enumerated from the host document at load time.
//! Output: editor values mirrored into the host's annotation storage so
//! that the host's own save path includes user-drawn shapes.

use crate::config::PainterConfig;
use crate::definitions::{AnnotationType, HostEditorType};
use crate::geometry::{self, PdfRect, Viewport};
use crate::record::AnnotationRecord;
use crate::shape::{Shape, ShapeGroup};
use serde::{Deserialize, Serialize};

/// Storage key prefix for mirrored editor values.
pub const NATIVE_ID_PREFIX: &str = "pdfjs_internal_editor_";

pub fn native_id(id: &str) -> String {
    format!("{NATIVE_ID_PREFIX}{id}")
}

// ─── Input ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BorderStyle {
    pub width: f64,
    /// 1 solid, 2 dashed, as numbered by the host.
    pub style: i32,
    pub dash_array: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DefaultAppearance {
    pub font_size: f64,
    pub font_color: [f32; 3],
}

/// One annotation as reported by the host document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostAnnotation {
    pub id: String,
    pub annotation_type: i32,
    pub subtype: Option<String>,
    pub rect: Option<PdfRect>,
    pub color: Option<[f32; 3]>,
    pub opacity: Option<f64>,
    pub quad_points: Option<Vec<f64>>,
    pub line_coordinates: Option<[f64; 4]>,
    pub ink_lists: Option<Vec<Vec<f64>>>,
    pub border_style: BorderStyle,
    pub title: String,
    pub contents: String,
    pub modification_date: Option<String>,
    pub creation_date: Option<String>,
    pub in_reply_to: Option<String>,
    pub state: Option<String>,
    pub default_appearance: Option<DefaultAppearance>,
}

/// Every host annotation on one page, with the page's current viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostPage {
    pub page_number: u32,
    pub viewport: Viewport,
    pub annotations: Vec<HostAnnotation>,
}

// ─── Output ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InkPath {
    pub bezier: Vec<f64>,
    pub points: Vec<f64>,
}

impl InkPath {
    fn polyline(points: Vec<f64>) -> Self {
        Self {
            bezier: points.clone(),
            points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum NativeBody {
    Ink {
        color: [f32; 3],
        thickness: f64,
        opacity: f64,
        paths: Vec<InkPath>,
    },
    Highlight {
        color: [f32; 3],
        opacity: f64,
        quad_points: Vec<f64>,
        outlines: Vec<[f64; 8]>,
    },
    FreeText {
        color: [f32; 3],
        font_size: f64,
        value: String,
    },
    Stamp {
        image: String,
    },
    Deleted {
        deleted: bool,
    },
}

/// An editor value in the host's storage format.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeAnnotation {
    pub annotation_type: HostEditorType,
    pub page_index: u32,
    pub rect: PdfRect,
    pub rotation: i32,
    #[serde(flatten)]
    pub body: NativeBody,
}

impl NativeAnnotation {
    /// Tombstone for a previously mirrored value.
    pub fn deleted(record: &AnnotationRecord) -> Self {
        Self {
            annotation_type: record.host_editor_type,
            page_index: record.page_number.saturating_sub(1),
            rect: [0.0; 4],
            rotation: 0,
            body: NativeBody::Deleted { deleted: true },
        }
    }

    /// Encode a record's group for the host. Returns `None` for kinds the
    /// host has no editor for.
    pub fn encode(
        record: &AnnotationRecord,
        group: &ShapeGroup,
        canvas_height: f64,
        config: &PainterConfig,
    ) -> Option<Self> {
        let bounds = group.client_rect()?;
        let children = group.baked_children();
        let body = match record.kind {
            AnnotationType::Rectangle
            | AnnotationType::Circle
            | AnnotationType::Freehand
            | AnnotationType::FreeHighlight
            | AnnotationType::Arrow
            | AnnotationType::Cloud => ink_body(&children, canvas_height, config)?,
            AnnotationType::Highlight
            | AnnotationType::Strikeout
            | AnnotationType::Underline
            | AnnotationType::Squiggly => highlight_body(&children, canvas_height)?,
            AnnotationType::FreeText => children.iter().find_map(|s| match s {
                Shape::Text {
                    text,
                    font_size,
                    paint,
                    ..
                } => Some(NativeBody::FreeText {
                    color: paint.color().unwrap_or_default().to_host(),
                    font_size: *font_size,
                    value: text.clone(),
                }),
                _ => None,
            })?,
            AnnotationType::Signature | AnnotationType::Stamp => {
                children.iter().find_map(|s| match s {
                    Shape::Image { src, .. } => Some(NativeBody::Stamp { image: src.clone() }),
                    _ => None,
                })?
            }
            AnnotationType::Note | AnnotationType::Select | AnnotationType::Eraser => return None,
        };
        Some(Self {
            annotation_type: record.host_editor_type,
            page_index: record.page_number.saturating_sub(1),
            rect: geometry::to_document_space(&bounds, canvas_height),
            rotation: 0,
            body,
        })
    }
}

fn ink_body(children: &[Shape], h: f64, config: &PainterConfig) -> Option<NativeBody> {
    let mut paths = Vec::new();
    for shape in children {
        match shape {
            Shape::Rect {
                x,
                y,
                width,
                height,
                ..
            } => {
                let r = geometry::ClientRect::new(*x, *y, *width, *height);
                paths.push(InkPath::polyline(geometry::rect_outline(&r, h, config.rect_outline_step)));
            }
            Shape::Ellipse { cx, cy, rx, ry, .. } => {
                paths.push(InkPath::polyline(geometry::ellipse_outline(
                    kurbo::Point::new(*cx, *cy),
                    *rx,
                    *ry,
                    h,
                    config.ellipse_step_degrees,
                )));
            }
            Shape::Line { points, .. } => {
                paths.push(InkPath::polyline(geometry::points_to_document_space(points, h)));
            }
            Shape::Arrow {
                points,
                pointer_length,
                pointer_width,
                ..
            } => {
                paths.push(InkPath::polyline(geometry::points_to_document_space(points, h)));
                let head = geometry::arrow_head(points, *pointer_length, *pointer_width);
                paths.push(InkPath::polyline(geometry::points_to_document_space(&head, h)));
            }
            _ => {}
        }
    }
    let paint = children.iter().find_map(Shape::paint)?;
    Some(NativeBody::Ink {
        color: paint.color().unwrap_or_default().to_host(),
        thickness: paint.stroke_width,
        opacity: paint.opacity,
        paths,
    })
}

fn highlight_body(children: &[Shape], h: f64) -> Option<NativeBody> {
    let mut quad_points = Vec::new();
    let mut outlines = Vec::new();
    let mut first_paint = None;
    for shape in children {
        if let Shape::Markup {
            x,
            y,
            width,
            height,
            paint,
            ..
        } = shape
        {
            let r = geometry::ClientRect::new(*x, *y, *width, *height);
            quad_points.extend(geometry::quad_points(&r, h));
            outlines.push(geometry::highlight_outline(&r, h));
            first_paint.get_or_insert(paint);
        }
    }
    let paint = first_paint?;
    Some(NativeBody::Highlight {
        color: paint.color().unwrap_or_default().to_host(),
        opacity: paint.opacity,
        quad_points,
        outlines,
    })
}
