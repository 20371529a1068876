use thiserror::Error;

#[derive(Error, Debug)]
pub enum FreshetError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Timed out fetching {url}")]
    Timeout { url: String },

    #[error("Connection error fetching {url}: {message}")]
    Connection { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Selector error: {0}")]
    Selector(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl FreshetError {
    /// Timeouts, connection failures and non-success HTTP statuses.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FreshetError::Timeout { .. }
                | FreshetError::Connection { .. }
                | FreshetError::Status { .. }
        )
    }

    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return FreshetError::Timeout {
                url: url.to_string(),
            };
        }
        if let Some(status) = err.status() {
            return FreshetError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            };
        }
        FreshetError::Connection {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FreshetError>;
