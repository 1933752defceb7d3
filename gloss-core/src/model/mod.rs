mod annotation;
mod outcome;
mod palette;

pub use annotation::{AnnotationRequest, Category};
pub use outcome::{AttemptOutcome, BatchReport, FallbackItem, MatchMethod};
pub use palette::{CategoryStyle, Palette};
