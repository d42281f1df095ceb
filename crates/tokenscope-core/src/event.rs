use crate::api::{LoadModelResponse, PredictionResponse, TokenInfo};
use crate::error::{Result, TokenscopeError};
use crate::request::RequestTag;

/// Completions fed back into the session's event loop by timers and
/// network tasks. Every variant carries the tag it was issued under.
#[derive(Debug)]
pub enum SessionEvent {
    TokenizeTimerFired {
        generation: u64,
    },
    Tokenized {
        tag: RequestTag,
        result: Result<Vec<TokenInfo>>,
    },
    Predicted {
        tag: RequestTag,
        result: Result<PredictionResponse>,
    },
    ModelLoaded {
        epoch: u64,
        result: Result<LoadModelResponse>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    LoadModel,
    Tokenize,
    Predict,
}

impl NoticeKind {
    fn fallback(self) -> &'static str {
        match self {
            Self::LoadModel => "Failed to load model",
            Self::Tokenize => "Failed to tokenize text",
            Self::Predict => "Failed to fetch predictions",
        }
    }
}

/// A transient, non-fatal failure shown inline until the same kind of
/// operation succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn from_error(kind: NoticeKind, err: &TokenscopeError) -> Self {
        let message = match err {
            TokenscopeError::Server { detail: None, .. } => kind.fallback().to_string(),
            other => other.user_message(),
        };
        Self { kind, message }
    }
}

/// Model currently loaded on the server, as reported by the load call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub model_path: String,
    pub device: Option<String>,
    pub vocab_size: Option<u64>,
}

impl ModelInfo {
    pub fn named(model_path: impl Into<String>) -> Self {
        Self {
            model_path: model_path.into(),
            device: None,
            vocab_size: None,
        }
    }
}

/// What changed after the session applied an event. Stale completions
/// produce no update at all.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    TokenizeStarted,
    TokensReplaced { count: usize },
    TokensCleared,
    DistributionReady { index: usize },
    ModelLoaded(ModelInfo),
    Failed(Notice),
}
