use thiserror::Error;

pub type MetricResult<T> = std::result::Result<T, MetricError>;
pub type LifecycleResult<T> = std::result::Result<T, LifecycleError>;
pub type CheckpointResult<T> = std::result::Result<T, CheckpointError>;

/// Errors raised while feeding values into metric aggregates.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricError {
    /// Two sequences that must line up element-for-element do not.
    #[error("input shape mismatch: {what} has {left} entries but {right} were expected")]
    InputShape {
        what: &'static str,
        left: usize,
        right: usize,
    },

    #[error("class index {index} is out of range for {num_classes} classes")]
    ClassOutOfRange { index: usize, num_classes: usize },

    #[error("non-finite value {0} cannot be aggregated")]
    NonFinite(f64),

    #[error("batch is empty")]
    EmptyBatch,
}

/// Errors raised by the epoch lifecycle hooks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LifecycleError {
    /// A hook was called out of order (e.g. `process_batch` while idle).
    #[error("invalid lifecycle state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Metric(#[from] MetricError),

    /// The model returned a different number of logit rows than it was fed.
    #[error("model produced {got} output rows for a batch of {expected}")]
    ModelOutput { expected: usize, got: usize },
}

impl LifecycleError {
    /// True for the batch-shape family of errors (`InputShapeError`).
    pub fn is_input_shape(&self) -> bool {
        matches!(self, LifecycleError::Metric(MetricError::InputShape { .. }))
    }
}

/// Errors raised while locating, fetching or decoding a checkpoint.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint not found: {0}")]
    NotFound(String),

    #[error("checkpoint '{id}' is corrupt: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("invalid checkpoint identifier: {0}")]
    InvalidId(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("registry request failed: {0}")]
    Http(String),
}

impl From<reqwest::Error> for CheckpointError {
    fn from(e: reqwest::Error) -> Self {
        CheckpointError::Http(e.to_string())
    }
}
