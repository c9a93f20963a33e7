use std::path::PathBuf;

/// Failure talking to the listings backend
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("session expired or not authorized")]
    Unauthorized,
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid JSON payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("failed to read image {path:?}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}
