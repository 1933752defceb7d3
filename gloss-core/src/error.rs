//! Error types for gloss-core
//!
//! Only precondition violations escape `Annotator::inject`. Everything that
//! can go wrong while placing an annotation is recorded in the report.

use thiserror::Error;

/// Failure of a single host-document operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("document has no body")]
    NoBody,

    #[error("node is not a text node")]
    NotText,

    #[error("node is not an element")]
    NotElement,

    #[error("offset {offset} is out of bounds for text of length {len}")]
    OffsetOutOfBounds { offset: usize, len: usize },

    #[error("hierarchy request: {0}")]
    Hierarchy(String),

    #[error("host document rejected the operation: {0}")]
    Host(String),
}

/// Reasons a located span could not be wrapped
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WrapError {
    #[error("range boundaries do not share a parent")]
    StructuralConflict,

    #[error("range no longer matches the document: {0}")]
    InvalidRange(String),

    #[error(transparent)]
    Dom(#[from] DomError),
}

/// Errors returned to callers of `Annotator::inject`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotateError {
    #[error("duplicate request id in batch: {0}")]
    DuplicateRequestId(String),
}
