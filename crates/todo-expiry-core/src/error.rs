use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("candidate lines could not be enumerated: {0}")]
    Enumeration(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("run did not finish within {0:?}; in-flight history lookups were abandoned")]
    DeadlineElapsed(Duration),
}
