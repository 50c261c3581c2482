use thiserror::Error;

pub type NarrativeResult<T> = Result<T, NarrativeError>;

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("invalid viewport size: width={width}, height={height}")]
    InvalidViewport { width: f64, height: f64 },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("data load failed at row {row}: {reason}")]
    DataLoad { row: usize, reason: String },

    #[error("scale window is empty and no default window is available")]
    EmptyWindow,

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
}
