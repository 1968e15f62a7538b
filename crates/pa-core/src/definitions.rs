//! Annotation type catalog.
//!
//! One static entry per tool, mapping it onto the host document's native
//! annotation taxonomy and carrying its interaction flags and default style.

use crate::color::Color;
use crate::config::PainterConfig;
use serde::{Deserialize, Serialize};

/// Tool / annotation kinds known to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum AnnotationType {
    Select = 0,
    Highlight = 1,
    Strikeout = 2,
    Underline = 3,
    Squiggly = 4,
    FreeText = 5,
    Rectangle = 6,
    Circle = 7,
    Freehand = 8,
    FreeHighlight = 9,
    Signature = 10,
    Stamp = 11,
    Note = 12,
    Arrow = 13,
    Cloud = 14,
    Eraser = 15,
}

impl AnnotationType {
    pub const ALL: [AnnotationType; 16] = [
        Self::Select,
        Self::Highlight,
        Self::Strikeout,
        Self::Underline,
        Self::Squiggly,
        Self::FreeText,
        Self::Rectangle,
        Self::Circle,
        Self::Freehand,
        Self::FreeHighlight,
        Self::Signature,
        Self::Stamp,
        Self::Note,
        Self::Arrow,
        Self::Cloud,
        Self::Eraser,
    ];

    /// Text-markup kinds created from a text selection.
    pub fn is_text_markup(self) -> bool {
        matches!(
            self,
            Self::Highlight | Self::Strikeout | Self::Underline | Self::Squiggly
        )
    }

    /// Kinds that are drawn with the pointer on the page canvas.
    pub fn is_painting(self) -> bool {
        matches!(
            self,
            Self::FreeText
                | Self::Rectangle
                | Self::Circle
                | Self::Freehand
                | Self::FreeHighlight
                | Self::Signature
                | Self::Stamp
                | Self::Note
                | Self::Arrow
                | Self::Cloud
                | Self::Eraser
        )
    }

    pub fn definition(self) -> &'static AnnotationTypeDefinition {
        &DEFINITIONS[self as usize]
    }
}

impl From<AnnotationType> for i8 {
    fn from(t: AnnotationType) -> i8 {
        t as i8
    }
}

impl TryFrom<i8> for AnnotationType {
    type Error = String;

    fn try_from(v: i8) -> Result<Self, Self::Error> {
        usize::try_from(v)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or_else(|| format!("unknown annotation type {v}"))
    }
}

/// Host (pdf.js) annotation type numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum HostAnnotationType {
    None = 0,
    Text = 1,
    Link = 2,
    FreeText = 3,
    Line = 4,
    Square = 5,
    Circle = 6,
    Polygon = 7,
    PolyLine = 8,
    Highlight = 9,
    Underline = 10,
    Squiggly = 11,
    StrikeOut = 12,
    Stamp = 13,
    Caret = 14,
    Ink = 15,
    Popup = 16,
    FileAttachment = 17,
    Widget = 20,
    Redact = 26,
    Note = 27,
}

impl From<HostAnnotationType> for i32 {
    fn from(t: HostAnnotationType) -> i32 {
        t as i32
    }
}

impl TryFrom<i32> for HostAnnotationType {
    type Error = String;

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        use HostAnnotationType::*;
        Ok(match v {
            0 => None,
            1 => Text,
            2 => Link,
            3 => FreeText,
            4 => Line,
            5 => Square,
            6 => Circle,
            7 => Polygon,
            8 => PolyLine,
            9 => Highlight,
            10 => Underline,
            11 => Squiggly,
            12 => StrikeOut,
            13 => Stamp,
            14 => Caret,
            15 => Ink,
            16 => Popup,
            17 => FileAttachment,
            20 => Widget,
            26 => Redact,
            27 => Note,
            other => return Err(format!("unknown host annotation type {other}")),
        })
    }
}

/// Host editor modes that accept serialized editor values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum HostEditorType {
    Disable = -1,
    None = 0,
    FreeText = 3,
    Highlight = 9,
    Stamp = 13,
    Ink = 15,
}

impl From<HostEditorType> for i32 {
    fn from(t: HostEditorType) -> i32 {
        t as i32
    }
}

impl TryFrom<i32> for HostEditorType {
    type Error = String;

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        Ok(match v {
            -1 => Self::Disable,
            0 => Self::None,
            3 => Self::FreeText,
            9 => Self::Highlight,
            13 => Self::Stamp,
            15 => Self::Ink,
            other => return Err(format!("unknown host editor type {other}")),
        })
    }
}

/// Host annotation subtype names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostSubtype {
    Highlight,
    StrikeOut,
    Underline,
    Squiggly,
    FreeText,
    Square,
    Circle,
    Ink,
    Caret,
    Stamp,
    Note,
    Arrow,
    Cloud,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
}

impl AnnotationStyle {
    pub const EMPTY: AnnotationStyle = AnnotationStyle {
        color: None,
        font_size: None,
        opacity: None,
        stroke_width: None,
    };

    /// Fields set in `delta` win over `self`.
    pub fn merged(&self, delta: &AnnotationStyle) -> AnnotationStyle {
        AnnotationStyle {
            color: delta.color.or(self.color),
            font_size: delta.font_size.or(self.font_size),
            opacity: delta.opacity.or(self.opacity),
            stroke_width: delta.stroke_width.or(self.stroke_width),
        }
    }
}

/// Which style fields the user may edit for a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleEditable {
    pub color: bool,
    pub stroke_width: bool,
    pub opacity: bool,
}

impl StyleEditable {
    pub const NONE: StyleEditable = StyleEditable::new(false, false, false);
    pub const ALL: StyleEditable = StyleEditable::new(true, true, true);
    pub const COLOR: StyleEditable = StyleEditable::new(true, false, false);
    pub const COLOR_OPACITY: StyleEditable = StyleEditable::new(true, false, true);

    pub const fn new(color: bool, stroke_width: bool, opacity: bool) -> Self {
        Self {
            color,
            stroke_width,
            opacity,
        }
    }

    pub fn any(&self) -> bool {
        self.color || self.stroke_width || self.opacity
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationTypeDefinition {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: AnnotationType,
    pub host_editor_type: HostEditorType,
    pub host_annotation_type: HostAnnotationType,
    pub subtype: Option<HostSubtype>,
    pub is_once: bool,
    pub resizable: bool,
    pub draggable: bool,
    pub style: AnnotationStyle,
    pub style_editable: StyleEditable,
}

impl AnnotationTypeDefinition {
    /// The type's default style with unset fields taken from `config`.
    pub fn style_with_defaults(&self, config: &PainterConfig) -> AnnotationStyle {
        AnnotationStyle {
            color: self.style.color.or(Some(config.default_color)),
            font_size: self.style.font_size.or(Some(config.font_size)),
            opacity: self.style.opacity.or(Some(config.opacity)),
            stroke_width: self.style.stroke_width.or(Some(config.stroke_width)),
        }
    }

    /// Look up a definition by its host annotation type and subtype.
    pub fn for_host(
        host: HostAnnotationType,
        subtype: Option<HostSubtype>,
    ) -> Option<&'static AnnotationTypeDefinition> {
        DEFINITIONS
            .iter()
            .filter(|d| d.host_annotation_type == host)
            .find(|d| subtype.is_none() || d.subtype == subtype)
            .or_else(|| DEFINITIONS.iter().find(|d| d.host_annotation_type == host))
    }
}

const fn style(color: Option<Color>, stroke_width: Option<f64>, opacity: Option<f64>) -> AnnotationStyle {
    AnnotationStyle {
        color,
        font_size: None,
        opacity,
        stroke_width,
    }
}

const HIGHLIGHT_COLOR: Color = Color::rgb(255, 222, 33);
const STRIKEOUT_COLOR: Color = Color::rgb(255, 0, 0);
const UNDERLINE_COLOR: Color = Color::rgb(0, 128, 255);
const SQUIGGLY_COLOR: Color = Color::rgb(0, 160, 0);

/// Indexed by `AnnotationType as usize`.
pub static DEFINITIONS: [AnnotationTypeDefinition; 16] = [
    AnnotationTypeDefinition {
        name: "select",
        kind: AnnotationType::Select,
        host_editor_type: HostEditorType::None,
        host_annotation_type: HostAnnotationType::None,
        subtype: None,
        is_once: false,
        resizable: false,
        draggable: false,
        style: AnnotationStyle::EMPTY,
        style_editable: StyleEditable::NONE,
    },
    AnnotationTypeDefinition {
        name: "highlight",
        kind: AnnotationType::Highlight,
        host_editor_type: HostEditorType::Highlight,
        host_annotation_type: HostAnnotationType::Highlight,
        subtype: Some(HostSubtype::Highlight),
        is_once: false,
        resizable: false,
        draggable: false,
        style: style(Some(HIGHLIGHT_COLOR), None, Some(0.5)),
        style_editable: StyleEditable::COLOR,
    },
    AnnotationTypeDefinition {
        name: "strikeout",
        kind: AnnotationType::Strikeout,
        host_editor_type: HostEditorType::Highlight,
        host_annotation_type: HostAnnotationType::StrikeOut,
        subtype: Some(HostSubtype::StrikeOut),
        is_once: false,
        resizable: false,
        draggable: false,
        style: style(Some(STRIKEOUT_COLOR), Some(0.5), None),
        style_editable: StyleEditable::COLOR_OPACITY,
    },
    AnnotationTypeDefinition {
        name: "underline",
        kind: AnnotationType::Underline,
        host_editor_type: HostEditorType::Highlight,
        host_annotation_type: HostAnnotationType::Underline,
        subtype: Some(HostSubtype::Underline),
        is_once: false,
        resizable: false,
        draggable: false,
        style: style(Some(UNDERLINE_COLOR), Some(0.5), None),
        style_editable: StyleEditable::COLOR_OPACITY,
    },
    AnnotationTypeDefinition {
        name: "squiggly",
        kind: AnnotationType::Squiggly,
        host_editor_type: HostEditorType::Highlight,
        host_annotation_type: HostAnnotationType::Squiggly,
        subtype: Some(HostSubtype::Squiggly),
        is_once: false,
        resizable: false,
        draggable: false,
        style: style(Some(SQUIGGLY_COLOR), Some(1.0), None),
        style_editable: StyleEditable::ALL,
    },
    AnnotationTypeDefinition {
        name: "freeText",
        kind: AnnotationType::FreeText,
        host_editor_type: HostEditorType::FreeText,
        host_annotation_type: HostAnnotationType::FreeText,
        subtype: Some(HostSubtype::FreeText),
        is_once: true,
        resizable: true,
        draggable: true,
        style: AnnotationStyle::EMPTY,
        style_editable: StyleEditable::COLOR_OPACITY,
    },
    AnnotationTypeDefinition {
        name: "rectangle",
        kind: AnnotationType::Rectangle,
        host_editor_type: HostEditorType::Ink,
        host_annotation_type: HostAnnotationType::Square,
        subtype: Some(HostSubtype::Square),
        is_once: true,
        resizable: true,
        draggable: true,
        style: AnnotationStyle::EMPTY,
        style_editable: StyleEditable::ALL,
    },
    AnnotationTypeDefinition {
        name: "circle",
        kind: AnnotationType::Circle,
        host_editor_type: HostEditorType::Ink,
        host_annotation_type: HostAnnotationType::Circle,
        subtype: Some(HostSubtype::Circle),
        is_once: true,
        resizable: true,
        draggable: true,
        style: AnnotationStyle::EMPTY,
        style_editable: StyleEditable::ALL,
    },
    AnnotationTypeDefinition {
        name: "freehand",
        kind: AnnotationType::Freehand,
        host_editor_type: HostEditorType::Ink,
        host_annotation_type: HostAnnotationType::Ink,
        subtype: Some(HostSubtype::Ink),
        is_once: false,
        resizable: true,
        draggable: true,
        style: AnnotationStyle::EMPTY,
        style_editable: StyleEditable::ALL,
    },
    AnnotationTypeDefinition {
        name: "freeHighlight",
        kind: AnnotationType::FreeHighlight,
        host_editor_type: HostEditorType::Ink,
        host_annotation_type: HostAnnotationType::Ink,
        subtype: Some(HostSubtype::Highlight),
        is_once: false,
        resizable: true,
        draggable: true,
        style: style(Some(HIGHLIGHT_COLOR), Some(10.0), Some(0.5)),
        style_editable: StyleEditable::ALL,
    },
    AnnotationTypeDefinition {
        name: "signature",
        kind: AnnotationType::Signature,
        host_editor_type: HostEditorType::Stamp,
        host_annotation_type: HostAnnotationType::Stamp,
        subtype: Some(HostSubtype::Caret),
        is_once: true,
        resizable: true,
        draggable: true,
        style: AnnotationStyle::EMPTY,
        style_editable: StyleEditable::NONE,
    },
    AnnotationTypeDefinition {
        name: "stamp",
        kind: AnnotationType::Stamp,
        host_editor_type: HostEditorType::Stamp,
        host_annotation_type: HostAnnotationType::Stamp,
        subtype: Some(HostSubtype::Stamp),
        is_once: true,
        resizable: true,
        draggable: true,
        style: AnnotationStyle::EMPTY,
        style_editable: StyleEditable::NONE,
    },
    AnnotationTypeDefinition {
        name: "note",
        kind: AnnotationType::Note,
        host_editor_type: HostEditorType::Ink,
        host_annotation_type: HostAnnotationType::Text,
        subtype: Some(HostSubtype::Note),
        is_once: true,
        resizable: false,
        draggable: true,
        style: style(Some(Color::NOTE_YELLOW), None, None),
        style_editable: StyleEditable::COLOR,
    },
    AnnotationTypeDefinition {
        name: "arrow",
        kind: AnnotationType::Arrow,
        host_editor_type: HostEditorType::Ink,
        host_annotation_type: HostAnnotationType::Line,
        subtype: Some(HostSubtype::Arrow),
        is_once: true,
        resizable: true,
        draggable: true,
        style: AnnotationStyle::EMPTY,
        style_editable: StyleEditable::ALL,
    },
    AnnotationTypeDefinition {
        name: "cloud",
        kind: AnnotationType::Cloud,
        host_editor_type: HostEditorType::Ink,
        host_annotation_type: HostAnnotationType::PolyLine,
        subtype: Some(HostSubtype::Cloud),
        is_once: true,
        resizable: true,
        draggable: true,
        style: AnnotationStyle::EMPTY,
        style_editable: StyleEditable::ALL,
    },
    AnnotationTypeDefinition {
        name: "eraser",
        kind: AnnotationType::Eraser,
        host_editor_type: HostEditorType::None,
        host_annotation_type: HostAnnotationType::None,
        subtype: None,
        is_once: false,
        resizable: false,
        draggable: false,
        style: AnnotationStyle::EMPTY,
        style_editable: StyleEditable::NONE,
    },
];
