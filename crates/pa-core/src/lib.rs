pub mod color;
pub mod config;
pub mod definitions;
pub mod error;
pub mod geometry;
pub mod id;
pub mod native;
pub mod record;
pub mod shape;
pub mod store;

pub use color::Color;
pub use config::PainterConfig;
pub use definitions::{AnnotationType, AnnotationTypeDefinition, HostAnnotationType, HostEditorType};
pub use error::{ColorError, DecodeError, PainterError, ShapeError, StoreError};
pub use geometry::{ClientRect, PdfRect, Viewport};
pub use id::AnnotationId;
pub use record::{AnnotationRecord, Comment, CommentStatus, Contents, RecordPatch};
pub use shape::{Shape, ShapeGroup};
pub use store::AnnotationStore;
