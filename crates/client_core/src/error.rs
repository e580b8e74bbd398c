use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum TokenStoreError {
    #[error("token storage I/O failed at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("token storage at {path} is corrupt: {source}")]
    Corrupt {
        path: String,
        source: serde_json::Error,
    },
    #[error("no local data directory available for token storage")]
    NoDataDir,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("api error {status}: {detail}")]
    Api {
        status: u16,
        code: ErrorCode,
        detail: String,
    },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid api url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("token storage failed: {0}")]
    TokenStore(#[from] TokenStoreError),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ClientError::Api { code, .. } => *code,
            _ => ErrorCode::Internal,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.code() == ErrorCode::Unauthorized
    }

    /// The message shown to users: the server's detail when there is one,
    /// otherwise `fallback`.
    pub fn display_message(&self, fallback: &str) -> String {
        match self {
            ClientError::Api { detail, .. } if !detail.trim().is_empty() => detail.clone(),
            _ => fallback.to_string(),
        }
    }

    pub fn to_api_error(&self) -> ApiError {
        match self {
            ClientError::Api { code, detail, .. } => ApiError::new(*code, detail.clone()),
            other => ApiError::new(ErrorCode::Internal, other.to_string()),
        }
    }

    /// Structured form of [`ClientError::display_message`].
    pub fn to_view_error(&self, fallback: &str) -> ApiError {
        ApiError::new(self.code(), self.display_message(fallback))
    }
}
