use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenscopeError {
    #[error("{endpoint} timed out after {}ms", .after.as_millis())]
    Timeout { endpoint: String, after: Duration },

    #[error("Server error ({status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Server { status: u16, detail: Option<String> },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TokenscopeError {
    pub fn server(status: u16, detail: Option<String>) -> Self {
        Self::Server { status, detail }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Text shown inline to the user. Each failure class gets its own wording
    /// so a slow server, an unreachable server and a rejected request can be
    /// told apart at a glance.
    pub fn user_message(&self) -> String {
        match self {
            Self::Timeout { .. } => "Request timed out. The server is taking longer than expected; \
                 please check the model path and try again."
                .to_string(),
            Self::Server { detail, .. } => detail
                .clone()
                .unwrap_or_else(|| "The server rejected the request".to_string()),
            Self::Connection(_) => {
                "Unable to connect to the server. Please ensure the backend is running.".to_string()
            }
            Self::Validation(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

pub type Result<T> = std::result::Result<T, TokenscopeError>;
