use thiserror::Error;

#[derive(Error, Debug)]
pub enum NameOriginError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream malformed: {0}")]
    UpstreamMalformed(String),

    #[error("Prediction unavailable: {0}")]
    PredictionUnavailable(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl NameOriginError {
    /// Collapses upstream failure kinds into the caller-facing
    /// `PredictionUnavailable`. Callers of the aggregation engine only need
    /// to know that no prediction could be produced this request.
    pub fn into_prediction_unavailable(self) -> Self {
        match self {
            Self::UpstreamUnavailable(msg) | Self::UpstreamMalformed(msg) => {
                Self::PredictionUnavailable(msg)
            }
            other => other,
        }
    }

    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::UpstreamUnavailable(_) | Self::UpstreamMalformed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, NameOriginError>;
