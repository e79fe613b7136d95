use thiserror::Error;

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("repository must be `owner/name`, got {0:?}")]
    InvalidRepository(String),

    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[cfg(feature = "http")]
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[cfg(feature = "http")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}
