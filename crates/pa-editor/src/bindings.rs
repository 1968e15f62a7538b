//! The surface the painter talks to: UI callbacks and host viewer hooks.

use pa_core::definitions::AnnotationTypeDefinition;
use pa_core::geometry::ClientRect;
use pa_core::native::{HostPage, NativeAnnotation};
use pa_core::{AnnotationId, AnnotationRecord, AnnotationType, Color};
use serde::{Deserialize, Serialize};

/// A selected run of text, with its rect in screen pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    pub rect: ClientRect,
}

impl TextSpan {
    pub fn new(text: impl Into<String>, rect: ClientRect) -> Self {
        Self {
            text: text.into(),
            rect,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// The part of a text selection that falls on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSelection {
    pub page_number: u32,
    /// The page element's rect in screen pixels.
    pub origin: ClientRect,
    pub spans: Vec<TextSpan>,
}

impl PageSelection {
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextSelection {
    pub pages: Vec<PageSelection>,
}

impl TextSelection {
    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(|p| p.spans.is_empty())
    }
}

/// Sent to the host when a text-entry step begins.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRequest {
    pub id: AnnotationId,
    pub page_number: u32,
    #[serde(rename = "type")]
    pub kind: AnnotationType,
    /// Where the entry widget should appear, in page pixels.
    pub anchor: ClientRect,
    pub color: Color,
    pub font_size: f64,
}

/// The host's answer to a `TextRequest`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextInput {
    pub value: String,
    pub color: Option<Color>,
    pub font_size: Option<f64>,
}

impl TextInput {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }
}

/// Callbacks into the surrounding UI and the host viewer.
///
/// Every method is invoked synchronously from painter operations.
pub trait HostBindings {
    fn on_store_add(
        &mut self,
        record: &AnnotationRecord,
        is_original: bool,
        definition: Option<&'static AnnotationTypeDefinition>,
    );

    fn on_store_delete(&mut self, id: AnnotationId);

    /// `rect` is the selection box in page pixels.
    fn on_annotation_selected(&mut self, record: &AnnotationRecord, is_click: bool, rect: ClientRect);

    fn on_annotation_change(&mut self, record: &AnnotationRecord);

    /// A selection is being cleared or transformed.
    fn on_annotation_changing(&mut self);

    fn on_annotation_changed(&mut self, record: &AnnotationRecord, rect: ClientRect);

    fn on_web_selection_selected(&mut self, selection: &TextSelection);

    /// A single-use tool finished; the toolbar should return to default.
    fn set_default_mode(&mut self);

    /// Open a text-entry step; answer with `Painter::complete_text_input`.
    fn request_text_input(&mut self, request: &TextRequest);

    /// Mirror a value into the host's native annotation storage.
    fn write_native(&mut self, id: &str, value: &NativeAnnotation);

    /// Host annotations to decode at load time.
    fn host_pages(&mut self) -> Vec<HostPage> {
        Vec::new()
    }

    /// Bring a page region into view.
    fn scroll_into_view(&mut self, _page_number: u32, _rect: ClientRect) {}

    /// Rendered width of a single line of text.
    fn measure_text(&self, text: &str, font_size: f64) -> f64 {
        text.chars().count() as f64 * font_size * 0.6
    }
}
