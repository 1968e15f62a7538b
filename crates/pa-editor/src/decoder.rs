//! Decoder bank: host-native annotations into records.
//!
//! Decoding runs once at load. Each decoder builds a throwaway shape group
//! to obtain the serialized form and bounds; nothing stays on a canvas.

use indexmap::IndexMap;
use pa_core::geometry::{self, ClientRect};
use pa_core::native::{HostAnnotation, HostPage};
use pa_core::record::parse_pdf_date;
use pa_core::shape::{MarkupKind, Paint, Shape};
use pa_core::{
    AnnotationId, AnnotationRecord, AnnotationType, Color, Comment, CommentStatus, Contents, DecodeError,
    HostAnnotationType, ShapeGroup,
};

const NOTE_ICON_SIZE: f64 = 20.0;

/// Everything a decoder may consult about the page an annotation sits on.
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext<'a> {
    pub page: &'a HostPage,
}

impl DecodeContext<'_> {
    fn scale(&self) -> f64 {
        self.page.viewport.scale
    }

    fn viewport_height(&self) -> f64 {
        self.page.viewport.height
    }

    fn rect(&self, a: &HostAnnotation) -> Result<ClientRect, DecodeError> {
        let rect = a.rect.as_ref().ok_or_else(|| missing(a, "rect"))?;
        Ok(geometry::from_host_rect(rect, self.scale(), self.viewport_height()))
    }

    /// Host points `[x, y, ..]` into canvas space.
    fn points(&self, points: &[f64]) -> Vec<f64> {
        let h = self.viewport_height() / self.scale();
        points
            .chunks_exact(2)
            .flat_map(|p| [p[0], h - p[1]])
            .collect()
    }

    /// Replies addressed to `parent`, in host order.
    fn comments(&self, parent: &HostAnnotation) -> Vec<Comment> {
        self.page
            .annotations
            .iter()
            .filter(|a| a.in_reply_to.as_deref() == Some(parent.id.as_str()))
            .map(|reply| Comment {
                id: reply.id.clone(),
                title: reply.title.clone(),
                date: host_date(reply.creation_date.as_ref().or(reply.modification_date.as_ref())),
                content: reply.contents.clone(),
                status: reply
                    .state
                    .as_deref()
                    .map(CommentStatus::from_host_state)
                    .unwrap_or_default(),
            })
            .collect()
    }
}

fn missing(a: &HostAnnotation, field: &'static str) -> DecodeError {
    DecodeError::MissingField {
        id: a.id.clone(),
        field,
    }
}

fn host_date(raw: Option<&String>) -> String {
    raw.map(|d| parse_pdf_date(d).unwrap_or_else(|| d.clone()))
        .unwrap_or_default()
}

fn host_color(a: &HostAnnotation, fallback: Color) -> Color {
    a.color.map(Color::from_host).unwrap_or(fallback)
}

/// Host convention: a width of exactly 1 renders as 2.
fn border_width(a: &HostAnnotation) -> f64 {
    let w = a.border_style.width;
    if w == 1.0 { w + 1.0 } else { w }
}

fn border_dash(a: &HostAnnotation) -> Vec<f64> {
    if a.border_style.style == 2 {
        a.border_style.dash_array.clone()
    } else {
        Vec::new()
    }
}

/// Serialize `children` as group `a.id` and wrap it in a record of `kind`.
fn build_record(
    ctx: &DecodeContext<'_>,
    a: &HostAnnotation,
    kind: AnnotationType,
    children: impl IntoIterator<Item = Shape>,
) -> Result<AnnotationRecord, DecodeError> {
    let id = AnnotationId::intern(&a.id);
    let mut group = ShapeGroup::new(id);
    group.children.extend(children);
    let rect = group.client_rect().ok_or_else(|| missing(a, "geometry"))?;
    let serialized = group.to_json()?;

    let mut record = AnnotationRecord::new(id, ctx.page.page_number, kind.definition(), serialized, rect, a.title.clone());
    record.color = group.color();
    record.date = host_date(a.modification_date.as_ref());
    record.contents = Contents::text(a.contents.clone());
    record.comments = ctx.comments(a);
    if let Ok(host) = HostAnnotationType::try_from(a.annotation_type) {
        record.host_annotation_type = host;
    }
    Ok(record)
}

/// One host annotation subtype into a record. `Ok(None)` means the
/// annotation should not become a record of its own.
pub trait Decoder {
    fn decode(
        &self,
        ctx: &DecodeContext<'_>,
        annotation: &HostAnnotation,
    ) -> Result<Option<AnnotationRecord>, DecodeError>;
}

// ─── Decoders ───────────────────────────────────────────────────────────

pub struct FreeTextDecoder;

impl Decoder for FreeTextDecoder {
    fn decode(&self, ctx: &DecodeContext<'_>, a: &HostAnnotation) -> Result<Option<AnnotationRecord>, DecodeError> {
        let da = a
            .default_appearance
            .as_ref()
            .ok_or_else(|| missing(a, "defaultAppearance"))?;
        let rect = ctx.rect(a)?;
        let text = Shape::Text {
            x: rect.x,
            y: rect.y + 2.0,
            width: rect.width,
            height: rect.height,
            text: a.contents.clone(),
            font_size: da.font_size,
            paint: Paint::fill(Color::from_host(da.font_color), 1.0),
        };
        let mut record = build_record(ctx, a, AnnotationType::FreeText, [text])?;
        record.font_size = Some(da.font_size);
        Ok(Some(record))
    }
}

/// Highlight, underline, strikeout and squiggly. One box per quad.
pub struct HighlightDecoder;

impl Decoder for HighlightDecoder {
    fn decode(&self, ctx: &DecodeContext<'_>, a: &HostAnnotation) -> Result<Option<AnnotationRecord>, DecodeError> {
        let (kind, markup) = match HostAnnotationType::try_from(a.annotation_type) {
            Ok(HostAnnotationType::Underline) => (AnnotationType::Underline, MarkupKind::Underline),
            Ok(HostAnnotationType::StrikeOut) => (AnnotationType::Strikeout, MarkupKind::StrikeOut),
            Ok(HostAnnotationType::Squiggly) => (AnnotationType::Squiggly, MarkupKind::Squiggly),
            _ => (AnnotationType::Highlight, MarkupKind::Highlight),
        };
        let quads = a.quad_points.as_deref().ok_or_else(|| missing(a, "quadPoints"))?;
        let color = host_color(a, kind.definition().style.color.unwrap_or_default());
        let paint = match markup {
            MarkupKind::Highlight => {
                let mut p = Paint::fill(color, 0.5);
                p.multiply = true;
                p
            }
            MarkupKind::Squiggly => Paint::stroke(color, 1.0, 1.0),
            _ => Paint::stroke(color, 0.5, 1.0),
        };
        let boxes: Vec<Shape> = quads
            .chunks_exact(8)
            .filter_map(|q| geometry::from_host_quad_points(q, ctx.scale(), ctx.viewport_height()))
            .map(|r| Shape::Markup {
                markup,
                x: r.x,
                y: r.y,
                width: r.width,
                height: r.height,
                paint: paint.clone(),
            })
            .collect();
        if boxes.is_empty() {
            return Err(missing(a, "quadPoints"));
        }
        Ok(Some(build_record(ctx, a, kind, boxes)?))
    }
}

/// Straight lines decode as freehand strokes.
pub struct LineDecoder;

impl Decoder for LineDecoder {
    fn decode(&self, ctx: &DecodeContext<'_>, a: &HostAnnotation) -> Result<Option<AnnotationRecord>, DecodeError> {
        let coords = a.line_coordinates.as_ref().ok_or_else(|| missing(a, "lineCoordinates"))?;
        let points = geometry::from_host_line(coords, ctx.scale(), ctx.viewport_height());
        let mut paint = Paint::stroke(host_color(a, Color::default()), border_width(a), 1.0);
        paint.dash = border_dash(a);
        let line = Shape::Line {
            points: points.to_vec(),
            closed: false,
            paint,
        };
        Ok(Some(build_record(ctx, a, AnnotationType::Freehand, [line])?))
    }
}

/// Borderless squares render as a translucent fill.
fn outline_paint(a: &HostAnnotation) -> Paint {
    let color = host_color(a, Color::default());
    let mut paint = Paint::stroke(color, border_width(a), 1.0);
    if a.border_style.width == 0.0 {
        paint.fill = Some(color);
        paint.opacity = 0.5;
    }
    paint.dash = border_dash(a);
    paint
}

pub struct SquareDecoder;

impl Decoder for SquareDecoder {
    fn decode(&self, ctx: &DecodeContext<'_>, a: &HostAnnotation) -> Result<Option<AnnotationRecord>, DecodeError> {
        let r = ctx.rect(a)?;
        let rect = Shape::Rect {
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
            paint: outline_paint(a),
        };
        Ok(Some(build_record(ctx, a, AnnotationType::Rectangle, [rect])?))
    }
}

pub struct CircleDecoder;

impl Decoder for CircleDecoder {
    fn decode(&self, ctx: &DecodeContext<'_>, a: &HostAnnotation) -> Result<Option<AnnotationRecord>, DecodeError> {
        let r = ctx.rect(a)?;
        let c = r.center();
        let ellipse = Shape::Ellipse {
            cx: c.x,
            cy: c.y,
            rx: r.width / 2.0,
            ry: r.height / 2.0,
            paint: outline_paint(a),
        };
        Ok(Some(build_record(ctx, a, AnnotationType::Circle, [ellipse])?))
    }
}

pub struct InkDecoder;

impl Decoder for InkDecoder {
    fn decode(&self, ctx: &DecodeContext<'_>, a: &HostAnnotation) -> Result<Option<AnnotationRecord>, DecodeError> {
        let lists = a.ink_lists.as_deref().ok_or_else(|| missing(a, "inkLists"))?;
        let mut paint = Paint::stroke(host_color(a, Color::default()), border_width(a), a.opacity.unwrap_or(1.0));
        paint.dash = border_dash(a);
        let strokes: Vec<Shape> = lists
            .iter()
            .filter(|l| l.len() >= 4)
            .map(|l| Shape::Line {
                points: ctx.points(l),
                closed: false,
                paint: paint.clone(),
            })
            .collect();
        if strokes.is_empty() {
            return Err(missing(a, "inkLists"));
        }
        Ok(Some(build_record(ctx, a, AnnotationType::Freehand, strokes)?))
    }
}

/// Sticky notes. A note that replies to another annotation is folded into
/// its parent's comments instead.
pub struct TextDecoder;

impl Decoder for TextDecoder {
    fn decode(&self, ctx: &DecodeContext<'_>, a: &HostAnnotation) -> Result<Option<AnnotationRecord>, DecodeError> {
        if a.in_reply_to.is_some() {
            return Ok(None);
        }
        let r = ctx.rect(a)?;
        let icon = Shape::NoteIcon {
            x: r.x,
            y: r.y,
            size: NOTE_ICON_SIZE,
            paint: Paint::fill(host_color(a, Color::NOTE_YELLOW), 1.0),
        };
        Ok(Some(build_record(ctx, a, AnnotationType::Note, [icon])?))
    }
}

// ─── Bank ───────────────────────────────────────────────────────────────

/// Decoders keyed by host annotation type.
pub struct DecoderBank {
    decoders: IndexMap<HostAnnotationType, Box<dyn Decoder>>,
}

impl DecoderBank {
    pub fn empty() -> Self {
        Self {
            decoders: IndexMap::new(),
        }
    }

    /// Install or replace the decoder for `kind`.
    pub fn register(&mut self, kind: HostAnnotationType, decoder: Box<dyn Decoder>) {
        self.decoders.insert(kind, decoder);
    }

    pub fn supports(&self, kind: HostAnnotationType) -> bool {
        self.decoders.contains_key(&kind)
    }

    pub fn decode(
        &self,
        ctx: &DecodeContext<'_>,
        annotation: &HostAnnotation,
    ) -> Result<Option<AnnotationRecord>, DecodeError> {
        let decoder = HostAnnotationType::try_from(annotation.annotation_type)
            .ok()
            .and_then(|kind| self.decoders.get(&kind))
            .ok_or(DecodeError::Unsupported(annotation.annotation_type))?;
        decoder.decode(ctx, annotation)
    }

    /// Decode one page, skipping annotations that fail.
    pub fn decode_page(&self, page: &HostPage) -> Vec<AnnotationRecord> {
        let ctx = DecodeContext { page };
        page.annotations
            .iter()
            .filter_map(|a| match self.decode(&ctx, a) {
                Ok(record) => record,
                Err(DecodeError::Unsupported(kind)) => {
                    log::debug!("skipping host annotation {} of type {kind}", a.id);
                    None
                }
                Err(e) => {
                    log::warn!("skipping host annotation {}: {e}", a.id);
                    None
                }
            })
            .collect()
    }

    pub fn decode_all(&self, pages: &[HostPage]) -> Vec<AnnotationRecord> {
        let records: Vec<_> = pages.iter().flat_map(|p| self.decode_page(p)).collect();
        log::info!("decoded {} host annotations from {} pages", records.len(), pages.len());
        records
    }
}

impl Default for DecoderBank {
    fn default() -> Self {
        let mut bank = Self::empty();
        bank.register(HostAnnotationType::FreeText, Box::new(FreeTextDecoder));
        for kind in [
            HostAnnotationType::Highlight,
            HostAnnotationType::Underline,
            HostAnnotationType::StrikeOut,
            HostAnnotationType::Squiggly,
        ] {
            bank.register(kind, Box::new(HighlightDecoder));
        }
        bank.register(HostAnnotationType::Line, Box::new(LineDecoder));
        bank.register(HostAnnotationType::Square, Box::new(SquareDecoder));
        bank.register(HostAnnotationType::Circle, Box::new(CircleDecoder));
        bank.register(HostAnnotationType::Ink, Box::new(InkDecoder));
        bank.register(HostAnnotationType::Text, Box::new(TextDecoder));
        bank
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pa_core::Viewport;
    use pa_core::native::{BorderStyle, DefaultAppearance};
    use pretty_assertions::assert_eq;

    /// Letter page rendered at 1.5x.
    fn page(annotations: Vec<HostAnnotation>) -> HostPage {
        HostPage {
            page_number: 3,
            viewport: Viewport::new(918.0, 1188.0, 1.5),
            annotations,
        }
    }

    fn host(id: &str, kind: HostAnnotationType) -> HostAnnotation {
        HostAnnotation {
            id: id.into(),
            annotation_type: kind.into(),
            rect: Some([100.0, 600.0, 200.0, 700.0]),
            color: Some([1.0, 0.0, 0.0]),
            title: "reviewer".into(),
            border_style: BorderStyle {
                width: 1.0,
                style: 1,
                dash_array: vec![3.0],
            },
            ..HostAnnotation::default()
        }
    }

    fn decode_one(a: HostAnnotation) -> AnnotationRecord {
        let page = page(vec![a]);
        let mut records = DecoderBank::default().decode_page(&page);
        assert_eq!(records.len(), 1);
        records.remove(0)
    }

    #[test]
    fn square_lands_in_canvas_space() {
        let mut a = host("dec-sq", HostAnnotationType::Square);
        a.modification_date = Some("D:20240315093000+01'00'".into());
        let r = decode_one(a);
        assert_eq!(r.kind, AnnotationType::Rectangle);
        assert_eq!(r.page_number, 3);
        // Canvas height is 1188 / 1.5 = 792.
        assert_eq!(r.bounding_client_rect, ClientRect::new(100.0, 92.0, 100.0, 100.0));
        assert_eq!(r.color, Some(Color::RED));
        assert_eq!(r.date, "2024-03-15 09:30:00");
        assert_eq!(r.title, "reviewer");

        let group = ShapeGroup::from_json(&r.serialized_shape).unwrap();
        let paint = group.children[0].paint().unwrap();
        assert_eq!(paint.stroke_width, 2.0);
        assert_eq!(paint.fill, None);
        assert!(paint.dash.is_empty());
    }

    #[test]
    fn borderless_square_is_translucent_fill() {
        let mut a = host("dec-fill", HostAnnotationType::Square);
        a.border_style.width = 0.0;
        let group = ShapeGroup::from_json(&decode_one(a).serialized_shape).unwrap();
        let paint = group.children[0].paint().unwrap();
        assert_eq!(paint.fill, Some(Color::RED));
        assert_eq!(paint.opacity, 0.5);
    }

    #[test]
    fn dashed_line_decodes_as_freehand() {
        let mut a = host("dec-line", HostAnnotationType::Line);
        a.line_coordinates = Some([10.0, 700.0, 300.0, 700.0]);
        a.border_style.style = 2;
        a.border_style.width = 3.0;
        let r = decode_one(a);
        assert_eq!(r.kind, AnnotationType::Freehand);
        assert_eq!(r.host_annotation_type, HostAnnotationType::Line);
        let group = ShapeGroup::from_json(&r.serialized_shape).unwrap();
        match &group.children[0] {
            Shape::Line { points, paint, .. } => {
                assert_eq!(points, &vec![10.0, 92.0, 300.0, 92.0]);
                assert_eq!(paint.stroke_width, 3.0);
                assert_eq!(paint.dash, vec![3.0]);
            }
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn highlight_builds_one_box_per_quad() {
        let mut a = host("dec-hl", HostAnnotationType::Highlight);
        a.quad_points = Some(vec![
            100.0, 700.0, 200.0, 700.0, 100.0, 690.0, 200.0, 690.0, //
            100.0, 680.0, 150.0, 680.0, 100.0, 670.0, 150.0, 670.0,
        ]);
        let r = decode_one(a);
        assert_eq!(r.kind, AnnotationType::Highlight);
        assert!(!r.draggable && !r.resizable);
        let group = ShapeGroup::from_json(&r.serialized_shape).unwrap();
        assert_eq!(group.children.len(), 2);
        assert_eq!(group.children[0].bounds(), Some(ClientRect::new(100.0, 92.0, 100.0, 10.0)));
        assert_eq!(group.children[0].paint().unwrap().opacity, 0.5);
    }

    #[test]
    fn strikeout_maps_its_kind() {
        let mut a = host("dec-so", HostAnnotationType::StrikeOut);
        a.quad_points = Some(vec![100.0, 700.0, 200.0, 700.0, 100.0, 690.0, 200.0, 690.0]);
        assert_eq!(decode_one(a).kind, AnnotationType::Strikeout);
    }

    #[test]
    fn free_text_uses_default_appearance() {
        let mut a = host("dec-ft", HostAnnotationType::FreeText);
        a.contents = "Looks good".into();
        a.default_appearance = Some(DefaultAppearance {
            font_size: 12.0,
            font_color: [0.0, 0.0, 1.0],
        });
        let r = decode_one(a);
        assert_eq!(r.kind, AnnotationType::FreeText);
        assert_eq!(r.font_size, Some(12.0));
        assert_eq!(r.color, Some(Color::rgb(0, 0, 255)));
        assert_eq!(r.contents.text, "Looks good");
    }

    #[test]
    fn replies_fold_into_parent_comments() {
        let parent = host("dec-note", HostAnnotationType::Text);
        let mut reply = host("dec-reply", HostAnnotationType::Text);
        reply.in_reply_to = Some("dec-note".into());
        reply.contents = "agreed".into();
        reply.state = Some("Accepted".into());
        let page = page(vec![parent, reply]);

        let records = DecoderBank::default().decode_page(&page);
        assert_eq!(records.len(), 1);
        let note = &records[0];
        assert_eq!(note.kind, AnnotationType::Note);
        assert_eq!(note.comments.len(), 1);
        assert_eq!(note.comments[0].id, "dec-reply");
        assert_eq!(note.comments[0].content, "agreed");
        assert_eq!(note.comments[0].status, CommentStatus::Accepted);
    }

    #[test]
    fn failures_are_skipped_and_decoding_continues() {
        let mut broken = host("dec-broken", HostAnnotationType::Ink);
        broken.ink_lists = None;
        let link = host("dec-link", HostAnnotationType::Link);
        let mut ink = host("dec-ink", HostAnnotationType::Ink);
        ink.ink_lists = Some(vec![vec![10.0, 700.0, 20.0, 690.0, 30.0, 700.0]]);
        let pages = vec![page(vec![broken, link]), page(vec![ink])];

        let records = DecoderBank::default().decode_all(&pages);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, AnnotationId::intern("dec-ink"));
    }

    #[test]
    fn unsupported_kind_is_reported() {
        let page = page(Vec::new());
        let ctx = DecodeContext { page: &page };
        let err = DecoderBank::default()
            .decode(&ctx, &host("dec-x", HostAnnotationType::Widget))
            .unwrap_err();
        assert!(matches!(err, DecodeError::Unsupported(20)));
    }
}
