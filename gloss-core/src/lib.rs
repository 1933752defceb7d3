//! Gloss Core - Platform-agnostic page annotation engine
//!
//! This crate locates quoted passages in a rendered document, wraps them in
//! styled, tooltip-bearing highlights and reports which requests could be
//! placed. It runs against the in-memory [`ArenaDocument`] natively and
//! against a live page in WASM through the [`Dom`] trait.

pub mod annotator;
pub mod config;
pub mod dom;
pub mod error;
pub mod isolation;
pub mod locate;
pub mod materialize;
pub mod model;
pub mod report;
pub mod supervisor;

pub use annotator::Annotator;
pub use config::AnnotatorConfig;
pub use dom::{ArenaDocument, Dom, DomRange, NodeId, NodeKind};
pub use error::{AnnotateError, DomError, WrapError};
pub use isolation::IsolationHost;
pub use locate::{Locator, MatchCandidate, MatchOptions, Tier};
pub use materialize::{Materializer, Wrapped};
pub use model::{
    AnnotationRequest, AttemptOutcome, BatchReport, Category, CategoryStyle, FallbackItem,
    MatchMethod, Palette,
};
pub use report::{EventSink, LogSink, MemorySink, Notification, Reporter};
pub use supervisor::{ChangeNotifier, ManualNotifier, Supervisor, SupervisorState};
