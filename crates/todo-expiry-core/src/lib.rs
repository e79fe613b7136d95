//! TODO/FIXME extraction, blame attribution and expiry ordering.

pub mod annotation;
pub mod blame;
mod error;
pub mod identifier;
pub mod language;
pub mod pipeline;
pub mod sort_key;

pub use annotation::{Annotation, AnnotationKind, parse_annotation};
pub use blame::{Attribution, parse_attribution};
pub use error::PipelineError;
pub use identifier::issue_identifier;
pub use language::{DelimiterStyle, is_comment};
pub use pipeline::{CandidateLine, Finding, HistoryLookup, Pipeline, any_expired, build_results};
