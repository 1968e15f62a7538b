//! The persistent annotation record and its partial-update patch.

use crate::color::Color;
use crate::definitions::{
    AnnotationType, AnnotationTypeDefinition, HostAnnotationType, HostEditorType, HostSubtype,
    StyleEditable,
};
use crate::geometry::ClientRect;
use crate::id::AnnotationId;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local time in record date format.
pub fn timestamp_now() -> String {
    Local::now().format(DATE_FORMAT).to_string()
}

/// Parse a PDF date string (`D:YYYYMMDDHHmmSS` with optional offset and
/// truncated trailing fields) into record date format.
pub fn parse_pdf_date(raw: &str) -> Option<String> {
    let s = raw.strip_prefix("D:").unwrap_or(raw);
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).take(14).collect();
    if digits.len() < 4 {
        return None;
    }
    let field = |start: usize, len: usize, default: u32| -> Option<u32> {
        match digits.get(start..start + len) {
            Some(v) => v.parse().ok(),
            None => Some(default),
        }
    };
    let year = i32::try_from(field(0, 4, 0)?).ok()?;
    let date = NaiveDate::from_ymd_opt(year, field(4, 2, 1)?, field(6, 2, 1)?)?;
    let time = date.and_hms_opt(field(8, 2, 0)?, field(10, 2, 0)?, field(12, 2, 0)?)?;
    Some(time.format(DATE_FORMAT).to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CommentStatus {
    Accepted,
    Rejected,
    Cancelled,
    Completed,
    #[default]
    None,
    Closed,
}

impl CommentStatus {
    /// Map a host review state name; unknown names become `None`.
    pub fn from_host_state(state: &str) -> Self {
        match state {
            "Accepted" => Self::Accepted,
            "Rejected" => Self::Rejected,
            "Cancelled" => Self::Cancelled,
            "Completed" => Self::Completed,
            "Closed" => Self::Closed,
            _ => Self::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub title: String,
    pub date: String,
    pub content: String,
    #[serde(default)]
    pub status: CommentStatus,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contents {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Contents {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: None,
        }
    }
}

/// One annotation, as stored and exchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationRecord {
    pub id: AnnotationId,
    pub page_number: u32,
    #[serde(rename = "type")]
    pub kind: AnnotationType,
    /// Portable shape-group form, see `ShapeGroup::to_json`.
    pub serialized_shape: String,
    pub bounding_client_rect: ClientRect,
    pub title: String,
    pub date: String,
    #[serde(default)]
    pub color: Option<Color>,
    #[serde(default)]
    pub font_size: Option<f64>,
    #[serde(default)]
    pub style_editable: StyleEditable,
    #[serde(default)]
    pub subtype: Option<HostSubtype>,
    pub host_annotation_type: HostAnnotationType,
    pub host_editor_type: HostEditorType,
    #[serde(default)]
    pub contents: Contents,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub resizable: bool,
    pub draggable: bool,
}

impl AnnotationRecord {
    /// A record for `definition` with the catalog's host mappings and flags.
    pub fn new(
        id: AnnotationId,
        page_number: u32,
        definition: &AnnotationTypeDefinition,
        serialized_shape: String,
        bounding_client_rect: ClientRect,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id,
            page_number,
            kind: definition.kind,
            serialized_shape,
            bounding_client_rect,
            title: title.into(),
            date: timestamp_now(),
            color: definition.style.color,
            font_size: definition.style.font_size,
            style_editable: definition.style_editable,
            subtype: definition.subtype,
            host_annotation_type: definition.host_annotation_type,
            host_editor_type: definition.host_editor_type,
            contents: Contents::default(),
            comments: Vec::new(),
            resizable: definition.resizable,
            draggable: definition.draggable,
        }
    }

    pub fn definition(&self) -> &'static AnnotationTypeDefinition {
        self.kind.definition()
    }

    /// Merge every field set in `patch`. The page number never changes.
    pub fn apply(&mut self, patch: RecordPatch) {
        if let Some(v) = patch.serialized_shape {
            self.serialized_shape = v;
        }
        if let Some(v) = patch.bounding_client_rect {
            self.bounding_client_rect = v;
        }
        if let Some(v) = patch.title {
            self.title = v;
        }
        if let Some(v) = patch.color {
            self.color = Some(v);
        }
        if let Some(v) = patch.font_size {
            self.font_size = Some(v);
        }
        if let Some(v) = patch.contents {
            self.contents = v;
        }
        if let Some(v) = patch.comments {
            self.comments = v;
        }
    }
}

/// Partial fields for `AnnotationStore::update`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serialized_shape: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_client_rect: Option<ClientRect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<Contents>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
}

impl RecordPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn shape(serialized_shape: String, bounding_client_rect: ClientRect) -> Self {
        Self {
            serialized_shape: Some(serialized_shape),
            bounding_client_rect: Some(bounding_client_rect),
            ..Self::default()
        }
    }
}
