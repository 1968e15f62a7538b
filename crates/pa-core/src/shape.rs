//! Shape groups: the drawable form of one annotation.
//!
//! A `ShapeGroup` is a list of primitives plus a group transform (set by the
//! selector when the user drags or resizes). Its JSON form is the record's
//! `serialized_shape` and is sufficient to rebuild an identical group.

use crate::color::Color;
use crate::error::ShapeError;
use crate::geometry::{self, ClientRect};
use crate::id::AnnotationId;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

// ─── Transform ──────────────────────────────────────────────────────────

/// Scale about the canvas origin, then translate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        x: 0.0,
        y: 0.0,
        scale_x: 1.0,
        scale_y: 1.0,
    };

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(p.x * self.scale_x + self.x, p.y * self.scale_y + self.y)
    }

    pub fn apply_rect(&self, r: &ClientRect) -> ClientRect {
        ClientRect::from_corners(
            self.apply(Point::new(r.x, r.y)),
            self.apply(Point::new(r.right(), r.bottom())),
        )
    }

    fn apply_points(&self, points: &[f64]) -> Vec<f64> {
        points
            .chunks_exact(2)
            .flat_map(|p| {
                let q = self.apply(Point::new(p[0], p[1]));
                [q.x, q.y]
            })
            .collect()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ─── Paint ──────────────────────────────────────────────────────────────

fn one() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Color>,
    #[serde(default)]
    pub stroke_width: f64,
    #[serde(default = "one")]
    pub opacity: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dash: Vec<f64>,
    /// Multiply blending, used by the free highlighter.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub multiply: bool,
}

impl Paint {
    pub fn stroke(color: Color, width: f64, opacity: f64) -> Self {
        Self {
            fill: None,
            stroke: Some(color),
            stroke_width: width,
            opacity,
            dash: Vec::new(),
            multiply: false,
        }
    }

    pub fn fill(color: Color, opacity: f64) -> Self {
        Self {
            fill: Some(color),
            stroke: None,
            stroke_width: 0.0,
            opacity,
            dash: Vec::new(),
            multiply: false,
        }
    }

    /// The color that represents this paint in a record.
    pub fn color(&self) -> Option<Color> {
        self.stroke.or(self.fill)
    }

    /// Recolor whichever of stroke / fill is in use.
    pub fn set_color(&mut self, color: Color) {
        if self.stroke.is_some() {
            self.stroke = Some(color);
        }
        if self.fill.is_some() || self.stroke.is_none() {
            self.fill = Some(color);
        }
    }
}

impl Default for Paint {
    fn default() -> Self {
        Self::stroke(Color::default(), 1.0, 1.0)
    }
}

// ─── Primitives ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkupKind {
    Highlight,
    Underline,
    StrikeOut,
    Squiggly,
}

impl MarkupKind {
    /// Stroke geometry drawn for a text box; empty for a filled highlight.
    pub fn stroke_points(self, rect: &ClientRect, stroke_width: f64) -> Vec<f64> {
        match self {
            Self::Highlight => Vec::new(),
            Self::Underline => vec![rect.x, rect.bottom(), rect.right(), rect.bottom()],
            Self::StrikeOut => {
                let mid = rect.y + rect.height / 2.0;
                vec![rect.x, mid, rect.right(), mid]
            }
            Self::Squiggly => geometry::squiggly_points(rect, stroke_width),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Shape {
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        paint: Paint,
    },
    Ellipse {
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
        paint: Paint,
    },
    /// Polyline as a flat `x, y` list.
    Line {
        points: Vec<f64>,
        #[serde(default)]
        closed: bool,
        paint: Paint,
    },
    Arrow {
        points: [f64; 4],
        pointer_length: f64,
        pointer_width: f64,
        paint: Paint,
    },
    /// Text-markup box; strokes are derived via `MarkupKind::stroke_points`.
    Markup {
        markup: MarkupKind,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        paint: Paint,
    },
    Text {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        text: String,
        font_size: f64,
        paint: Paint,
    },
    Image {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        src: String,
    },
    NoteIcon {
        x: f64,
        y: f64,
        size: f64,
        paint: Paint,
    },
}

impl Shape {
    /// Untransformed bounds; `None` for an empty polyline.
    pub fn bounds(&self) -> Option<ClientRect> {
        match self {
            Shape::Rect {
                x,
                y,
                width,
                height,
                ..
            }
            | Shape::Markup {
                x,
                y,
                width,
                height,
                ..
            }
            | Shape::Text {
                x,
                y,
                width,
                height,
                ..
            }
            | Shape::Image {
                x,
                y,
                width,
                height,
                ..
            } => Some(ClientRect::new(*x, *y, *width, *height)),
            Shape::Ellipse { cx, cy, rx, ry, .. } => Some(ClientRect::new(
                cx - rx.abs(),
                cy - ry.abs(),
                2.0 * rx.abs(),
                2.0 * ry.abs(),
            )),
            Shape::Line { points, .. } => {
                geometry::bounds_of_path(points).map(|[x0, y0, x1, y1]| ClientRect::new(x0, y0, x1 - x0, y1 - y0))
            }
            Shape::Arrow { points, .. } => Some(ClientRect::from_corners(
                Point::new(points[0], points[1]),
                Point::new(points[2], points[3]),
            )),
            Shape::NoteIcon { x, y, size, .. } => Some(ClientRect::new(*x, *y, *size, *size)),
        }
    }

    pub fn paint(&self) -> Option<&Paint> {
        match self {
            Shape::Rect { paint, .. }
            | Shape::Ellipse { paint, .. }
            | Shape::Line { paint, .. }
            | Shape::Arrow { paint, .. }
            | Shape::Markup { paint, .. }
            | Shape::Text { paint, .. }
            | Shape::NoteIcon { paint, .. } => Some(paint),
            Shape::Image { .. } => None,
        }
    }

    pub fn paint_mut(&mut self) -> Option<&mut Paint> {
        match self {
            Shape::Rect { paint, .. }
            | Shape::Ellipse { paint, .. }
            | Shape::Line { paint, .. }
            | Shape::Arrow { paint, .. }
            | Shape::Markup { paint, .. }
            | Shape::Text { paint, .. }
            | Shape::NoteIcon { paint, .. } => Some(paint),
            Shape::Image { .. } => None,
        }
    }

    /// The same primitive with `t` baked into its geometry.
    /// Stroke widths and font sizes are left unscaled.
    pub fn transformed(&self, t: &Transform) -> Shape {
        if t.is_identity() {
            return self.clone();
        }
        let mut out = self.clone();
        match &mut out {
            Shape::Rect {
                x,
                y,
                width,
                height,
                ..
            }
            | Shape::Markup {
                x,
                y,
                width,
                height,
                ..
            }
            | Shape::Text {
                x,
                y,
                width,
                height,
                ..
            }
            | Shape::Image {
                x,
                y,
                width,
                height,
                ..
            } => {
                let r = t.apply_rect(&ClientRect::new(*x, *y, *width, *height));
                (*x, *y, *width, *height) = (r.x, r.y, r.width, r.height);
            }
            Shape::Ellipse { cx, cy, rx, ry, .. } => {
                let c = t.apply(Point::new(*cx, *cy));
                (*cx, *cy) = (c.x, c.y);
                *rx *= t.scale_x.abs();
                *ry *= t.scale_y.abs();
            }
            Shape::Line { points, .. } => *points = t.apply_points(points),
            Shape::Arrow { points, .. } => {
                let p = t.apply_points(points.as_slice());
                points.copy_from_slice(&p);
            }
            Shape::NoteIcon { x, y, .. } => {
                let p = t.apply(Point::new(*x, *y));
                (*x, *y) = (p.x, p.y);
            }
        }
        out
    }
}

// ─── Group ──────────────────────────────────────────────────────────────

fn visible_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeGroup {
    pub id: AnnotationId,
    #[serde(default = "visible_default")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Transform::is_identity")]
    pub transform: Transform,
    pub children: SmallVec<[Shape; 2]>,
}

impl ShapeGroup {
    pub fn new(id: AnnotationId) -> Self {
        Self {
            id,
            visible: true,
            transform: Transform::IDENTITY,
            children: SmallVec::new(),
        }
    }

    pub fn with_shape(id: AnnotationId, shape: Shape) -> Self {
        let mut group = Self::new(id);
        group.children.push(shape);
        group
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Bounds of all children with the group transform applied.
    pub fn client_rect(&self) -> Option<ClientRect> {
        self.children
            .iter()
            .filter_map(Shape::bounds)
            .map(|b| self.transform.apply_rect(&b))
            .reduce(|a, b| a.union(&b))
    }

    /// Untransformed bounds of all children.
    pub fn local_rect(&self) -> Option<ClientRect> {
        self.children
            .iter()
            .filter_map(Shape::bounds)
            .reduce(|a, b| a.union(&b))
    }

    /// Children in canvas coordinates with the transform baked in.
    pub fn baked_children(&self) -> Vec<Shape> {
        self.children
            .iter()
            .map(|s| s.transformed(&self.transform))
            .collect()
    }

    /// First child's representative color, used to mirror style into records.
    pub fn color(&self) -> Option<Color> {
        self.children.iter().find_map(|s| s.paint().and_then(Paint::color))
    }

    pub fn to_json(&self) -> Result<String, ShapeError> {
        serde_json::to_string(self).map_err(ShapeError::Serialize)
    }

    pub fn from_json(json: &str) -> Result<Self, ShapeError> {
        serde_json::from_str(json).map_err(ShapeError::Deserialize)
    }
}
