//! Error taxonomy shared by the store, codecs and decoders.

use crate::id::AnnotationId;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("annotation {0} not found")]
    NotFound(AnnotationId),
}

#[derive(Debug, thiserror::Error)]
pub enum ShapeError {
    #[error("failed to deserialize shape group: {0}")]
    Deserialize(#[source] serde_json::Error),
    #[error("failed to serialize shape group: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ColorError {
    #[error("invalid color {0:?}")]
    Invalid(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unsupported host annotation type {0}")]
    Unsupported(i32),
    #[error("host annotation {id} is missing {field}")]
    MissingField { id: String, field: &'static str },
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

#[derive(Debug, thiserror::Error)]
pub enum PainterError {
    /// A store record and the shape-group registry disagree.
    #[error("registry out of sync: no editor owns shape group {0}")]
    Desync(AnnotationId),
    #[error("page {0} has no mounted canvas")]
    UnknownPage(u32),
    #[error("annotation {id} not selectable: page {page} did not render in time")]
    NotReady { id: AnnotationId, page: u32 },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
}
