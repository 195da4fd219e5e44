use thiserror::Error;

#[derive(Error, Debug)]
pub enum CropwiseError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl CropwiseError {
    /// True for errors a caller caused and can fix by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CropwiseError::MissingField(_) | CropwiseError::InvalidInput(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CropwiseError>;
