//! Geometry codec: canvas space ↔ document space.
//!
//! Canvas space has its origin at the top-left of a page and is unscaled
//! (the drawing surface applies the viewport zoom). Document space has its
//! origin at the bottom-left, as the host's native annotation format expects.
//! Every function here is pure.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Document-space rectangle `[x0, y0, x1, y1]`.
pub type PdfRect = [f64; 4];

/// Axis-aligned box in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClientRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ClientRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Box spanned by two corners: min corner, absolute delta.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self::from_kurbo(kurbo::Rect::from_points(a, b))
    }

    pub fn from_kurbo(r: kurbo::Rect) -> Self {
        let r = r.abs();
        Self::new(r.x0, r.y0, r.width(), r.height())
    }

    pub fn to_kurbo(&self) -> kurbo::Rect {
        kurbo::Rect::new(self.x, self.y, self.right(), self.bottom())
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        self.to_kurbo().center()
    }

    pub fn union(&self, other: &ClientRect) -> ClientRect {
        Self::from_kurbo(self.to_kurbo().union(other.to_kurbo()))
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    pub fn inflate(&self, d: f64) -> ClientRect {
        Self::new(self.x - d, self.y - d, self.width + 2.0 * d, self.height + 2.0 * d)
    }

    /// Multiply every component, e.g. to move from canvas to screen pixels.
    pub fn scaled(&self, scale: f64) -> ClientRect {
        Self::new(
            self.x * scale,
            self.y * scale,
            self.width * scale,
            self.height * scale,
        )
    }

    /// True when either side is shorter than `min`.
    pub fn is_degenerate(&self, min: f64) -> bool {
        self.width < min || self.height < min
    }

    pub fn approx_eq(&self, other: &ClientRect, eps: f64) -> bool {
        (self.x - other.x).abs() <= eps
            && (self.y - other.y).abs() <= eps
            && (self.width - other.width).abs() <= eps
            && (self.height - other.height).abs() <= eps
    }
}

/// Host page viewport: rendered size in pixels and the zoom factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scale: f64,
}

impl Viewport {
    pub const fn new(width: f64, height: f64, scale: f64) -> Self {
        Self {
            width,
            height,
            scale,
        }
    }

    /// Page height in unscaled canvas units.
    pub fn canvas_height(&self) -> f64 {
        self.height / self.scale
    }

    pub fn canvas_width(&self) -> f64 {
        self.width / self.scale
    }
}

// ─── Canvas → document ──────────────────────────────────────────────────

/// Flip the y-axis: `[x0, h - y1, x1, h - y0]`.
pub fn to_document_space(rect: &ClientRect, canvas_height: f64) -> PdfRect {
    [
        rect.x,
        canvas_height - rect.bottom(),
        rect.right(),
        canvas_height - rect.y,
    ]
}

/// Flip a flat `x, y, x, y, ...` list of canvas points into document space.
pub fn points_to_document_space(points: &[f64], canvas_height: f64) -> Vec<f64> {
    points
        .chunks_exact(2)
        .flat_map(|p| [p[0], canvas_height - p[1]])
        .collect()
}

/// Dense polyline around a rectangle, walking clockwise from the top-left
/// corner at a fixed linear step. The first point is repeated at the end.
pub fn rect_outline(rect: &ClientRect, canvas_height: f64, step: f64) -> Vec<f64> {
    let corners = [
        Point::new(rect.x, rect.y),
        Point::new(rect.right(), rect.y),
        Point::new(rect.right(), rect.bottom()),
        Point::new(rect.x, rect.bottom()),
    ];
    let step = step.max(f64::EPSILON);
    let mut out = Vec::new();
    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        let n = ((b - a).hypot() / step).ceil().max(1.0) as usize;
        for k in 0..n {
            let p = a.lerp(b, k as f64 / n as f64);
            out.extend([p.x, canvas_height - p.y]);
        }
    }
    out.extend([corners[0].x, canvas_height - corners[0].y]);
    out
}

/// Polyline approximation of an ellipse from 0° to 360° inclusive.
pub fn ellipse_outline(
    center: Point,
    rx: f64,
    ry: f64,
    canvas_height: f64,
    step_degrees: f64,
) -> Vec<f64> {
    let step = step_degrees.max(0.01);
    let n = (360.0 / step).round() as usize;
    let mut out = Vec::with_capacity((n + 1) * 2);
    for i in 0..=n {
        let angle = (i as f64 * step).to_radians();
        let x = center.x + rx * angle.cos();
        let y = center.y + ry * angle.sin();
        out.extend([x, canvas_height - y]);
    }
    out
}

/// Exact corners in host quad-point order: top-left, top-right,
/// bottom-left, bottom-right.
pub fn quad_points(rect: &ClientRect, canvas_height: f64) -> [f64; 8] {
    let top = canvas_height - rect.y;
    let bottom = canvas_height - rect.bottom();
    [
        rect.x,
        top,
        rect.right(),
        top,
        rect.x,
        bottom,
        rect.right(),
        bottom,
    ]
}

/// Closed outline of a highlighted box, counter-clockwise from top-left.
pub fn highlight_outline(rect: &ClientRect, canvas_height: f64) -> [f64; 8] {
    let top = canvas_height - rect.y;
    let bottom = canvas_height - rect.bottom();
    [
        rect.x,
        top,
        rect.x,
        bottom,
        rect.right(),
        bottom,
        rect.right(),
        top,
    ]
}

// ─── Document → canvas ──────────────────────────────────────────────────

pub fn from_document_space(rect: &PdfRect, canvas_height: f64) -> ClientRect {
    let [x0, y0, x1, y1] = *rect;
    ClientRect::new(
        x0.min(x1),
        canvas_height - y0.max(y1),
        (x1 - x0).abs(),
        (y1 - y0).abs(),
    )
}

/// Host rect (unscaled document units) into canvas space for a page
/// rendered at `scale` with a pixel height of `viewport_height`.
pub fn from_host_rect(rect: &PdfRect, scale: f64, viewport_height: f64) -> ClientRect {
    from_document_space(rect, viewport_height / scale)
}

/// Bounding canvas rect of one or more host quads (8 values each).
pub fn from_host_quad_points(quad: &[f64], scale: f64, viewport_height: f64) -> Option<ClientRect> {
    let bounds = bounds_of_path(quad)?;
    Some(from_host_rect(&bounds, scale, viewport_height))
}

/// Host line coordinates `[x1, y1, x2, y2]` into canvas points.
pub fn from_host_line(coords: &[f64; 4], scale: f64, viewport_height: f64) -> [f64; 4] {
    let h = viewport_height / scale;
    [coords[0], h - coords[1], coords[2], h - coords[3]]
}

/// Axis-aligned bounds of a flat coordinate list, as `[x0, y0, x1, y1]`.
pub fn bounds_of_path(points: &[f64]) -> Option<PdfRect> {
    let mut it = points.chunks_exact(2);
    let first = it.next()?;
    let mut b = [first[0], first[1], first[0], first[1]];
    for p in it {
        b[0] = b[0].min(p[0]);
        b[1] = b[1].min(p[1]);
        b[2] = b[2].max(p[0]);
        b[3] = b[3].max(p[1]);
    }
    Some(b)
}

// ─── Shape construction helpers ─────────────────────────────────────────

/// Closest-point test between a circle and an axis-aligned box.
pub fn circle_intersects_rect(center: Point, radius: f64, rect: &ClientRect) -> bool {
    let closest = Point::new(
        center.x.clamp(rect.x, rect.right()),
        center.y.clamp(rect.y, rect.bottom()),
    );
    center.distance(closest) <= radius
}

/// Sine wave sampled under a text box. Amplitude scales with stroke width.
pub fn squiggly_points(rect: &ClientRect, stroke_width: f64) -> Vec<f64> {
    let amplitude = rect.height * 0.2 * stroke_width;
    let frequency = 4.0;
    let base_y = rect.bottom() + 1.0;
    let steps = (rect.width / 2.0).max(20.0).floor() as usize;
    let mut out = Vec::with_capacity((steps + 1) * 2);
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let x = rect.x + t * rect.width;
        let y = base_y + (t * frequency * std::f64::consts::TAU).sin() * amplitude;
        out.extend([x, y]);
    }
    out
}

/// Map a selected text span's screen rect into canvas space relative to the
/// page origin. The vertical nudge and 0.92 height factor trim line leading.
pub fn relative_span_rect(span: &ClientRect, origin: Point, scale: f64) -> ClientRect {
    ClientRect::new(
        (span.x - origin.x) / scale,
        (span.y - origin.y + span.height / 12.0) / scale,
        span.width / scale,
        span.height / scale * 0.92,
    )
}

/// Arrow head as `wing, tip, wing` for a segment `[x0, y0, x1, y1]`.
pub fn arrow_head(points: &[f64; 4], length: f64, width: f64) -> [f64; 6] {
    let tail = Point::new(points[0], points[1]);
    let tip = Point::new(points[2], points[3]);
    let v = tip - tail;
    let len = v.hypot();
    if len <= f64::EPSILON {
        return [tip.x, tip.y, tip.x, tip.y, tip.x, tip.y];
    }
    let dir = v / len;
    let normal = Vec2::new(-dir.y, dir.x) * (width / 2.0);
    let base = tip - dir * length;
    let a = base + normal;
    let b = base - normal;
    [a.x, a.y, tip.x, tip.y, b.x, b.y]
}

/// Scalloped closed path around a box, bumps of roughly `arc` diameter.
pub fn cloud_outline(rect: &ClientRect, arc: f64) -> Vec<f64> {
    const SEGMENTS: usize = 8;
    let corners = [
        Point::new(rect.x, rect.y),
        Point::new(rect.right(), rect.y),
        Point::new(rect.right(), rect.bottom()),
        Point::new(rect.x, rect.bottom()),
    ];
    let mut out = Vec::new();
    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        let len = (b - a).hypot();
        if len <= f64::EPSILON {
            continue;
        }
        let dir = (b - a) / len;
        let normal = Vec2::new(dir.y, -dir.x);
        let bumps = (len / arc.max(1.0)).round().max(1.0) as usize;
        let bump_len = len / bumps as f64;
        let r = bump_len / 2.0;
        for k in 0..bumps {
            let c = a + dir * ((k as f64 + 0.5) * bump_len);
            for s in 0..SEGMENTS {
                let t = std::f64::consts::PI * s as f64 / SEGMENTS as f64;
                let p = c - dir * (r * t.cos()) + normal * (r * t.sin());
                out.extend([p.x, p.y]);
            }
        }
    }
    if out.len() >= 2 {
        out.extend([out[0], out[1]]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn document_space_flips_y() {
        let r = ClientRect::new(10.0, 10.0, 100.0, 50.0);
        assert_eq!(to_document_space(&r, 800.0), [10.0, 740.0, 110.0, 790.0]);
    }

    #[test]
    fn rect_inverts_exactly() {
        let r = ClientRect::new(12.5, 40.0, 33.0, 7.25);
        let back = from_document_space(&to_document_space(&r, 842.0), 842.0);
        assert!(back.approx_eq(&r, EPS));
    }

    #[test]
    fn rect_outline_is_closed_and_bounded() {
        let r = ClientRect::new(10.0, 10.0, 100.0, 50.0);
        let path = rect_outline(&r, 800.0, 0.5);
        let n = path.len();
        assert_eq!(&path[..2], &path[n - 2..]);
        let back = from_document_space(&bounds_of_path(&path).unwrap(), 800.0);
        assert!(back.approx_eq(&r, EPS));
        // 300 units of perimeter at 0.5 each, plus the closing point
        assert_eq!(n / 2, 601);
    }

    #[test]
    fn ellipse_outline_inverts_to_bounding_box() {
        let center = Point::new(60.0, 35.0);
        let path = ellipse_outline(center, 50.0, 25.0, 800.0, 0.5);
        assert_eq!(path.len() / 2, 721);
        let back = from_document_space(&bounds_of_path(&path).unwrap(), 800.0);
        assert!(back.approx_eq(&ClientRect::new(10.0, 10.0, 100.0, 50.0), 1e-6));
    }

    #[test]
    fn quad_points_invert_with_zoom() {
        let r = ClientRect::new(72.0, 100.0, 200.0, 14.0);
        let canvas_height = 792.0;
        let q = quad_points(&r, canvas_height);
        let back = from_host_quad_points(&q, 1.5, canvas_height * 1.5).unwrap();
        assert!(back.approx_eq(&r, EPS));
    }

    #[test]
    fn host_line_flips_both_endpoints() {
        assert_eq!(
            from_host_line(&[0.0, 0.0, 10.0, 20.0], 2.0, 200.0),
            [0.0, 100.0, 10.0, 80.0]
        );
    }

    #[test]
    fn circle_rect_collision() {
        let r = ClientRect::new(0.0, 0.0, 10.0, 10.0);
        assert!(circle_intersects_rect(Point::new(5.0, 5.0), 1.0, &r));
        assert!(circle_intersects_rect(Point::new(15.0, 5.0), 5.0, &r));
        assert!(!circle_intersects_rect(Point::new(15.0, 5.0), 4.9, &r));
        // Corner distance is sqrt(2) * 3
        assert!(!circle_intersects_rect(Point::new(13.0, 13.0), 4.0, &r));
        assert!(circle_intersects_rect(Point::new(13.0, 13.0), 4.3, &r));
    }

    #[test]
    fn squiggly_stays_below_text() {
        let r = ClientRect::new(0.0, 0.0, 100.0, 10.0);
        let pts = squiggly_points(&r, 1.0);
        assert_eq!(pts.len() / 2, 51);
        let b = bounds_of_path(&pts).unwrap();
        assert!(b[1] >= r.bottom() + 1.0 - 2.0 - EPS);
        assert!(b[3] <= r.bottom() + 1.0 + 2.0 + EPS);
        assert!((b[2] - 100.0).abs() < EPS);
    }

    #[test]
    fn span_rect_is_relative_and_unscaled() {
        let span = ClientRect::new(120.0, 224.0, 40.0, 24.0);
        let r = relative_span_rect(&span, Point::new(100.0, 200.0), 2.0);
        assert!(r.approx_eq(&ClientRect::new(10.0, 13.0, 20.0, 11.04), EPS));
    }

    #[test]
    fn arrow_head_points_back_from_tip() {
        let head = arrow_head(&[0.0, 0.0, 20.0, 0.0], 10.0, 6.0);
        assert_eq!(head, [10.0, 3.0, 20.0, 0.0, 10.0, -3.0]);
    }

    #[test]
    fn cloud_outline_surrounds_box() {
        let r = ClientRect::new(10.0, 10.0, 100.0, 50.0);
        let pts = cloud_outline(&r, 20.0);
        let b = bounds_of_path(&pts).unwrap();
        assert!(b[0] < r.x && b[1] < r.y);
        assert!(b[2] > r.right() && b[3] > r.bottom());
    }
}
