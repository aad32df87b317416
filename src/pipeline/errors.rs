use thiserror::Error;

/// Startup-fatal failures while reading the durable artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact file not found: {path}")]
    MissingFile { path: String },

    #[error("classifier model artifact is malformed: {0}")]
    MalformedModel(String),

    #[error("class mapping artifact is malformed: {0}")]
    MalformedMapping(String),

    #[error("failed to load cascade definition {path}: {reason}")]
    CascadeLoad { path: String, reason: String },

    #[error("classifier artifact declares input length {artifact} but the feature layout produces {expected}")]
    DimensionMismatch { expected: usize, artifact: usize },

    #[error("artifacts have not been loaded")]
    NotLoaded,
}

/// Per-request pipeline failures. A "no qualified face" outcome is not an
/// error, it is an empty result.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to decode image payload: {0}")]
    Decode(String),

    #[error("feature vector length {actual} does not match classifier input length {expected}")]
    UnscoredInput { expected: usize, actual: usize },

    #[error("image operation failed: {0}")]
    Vision(#[from] opencv::Error),
}
