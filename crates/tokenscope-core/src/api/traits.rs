use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// One token as reported by the server's tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub token: String,
    pub token_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_pos: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_pos: Option<usize>,
}

impl TokenInfo {
    pub fn new(token: impl Into<String>, token_id: i64) -> Self {
        Self {
            token: token.into(),
            token_id,
            start_pos: None,
            end_pos: None,
        }
    }
}

/// Candidate next-token surface string -> probability in [0, 1].
///
/// Iteration order is unspecified; use [`crate::rank::rank`] for a stable view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Distribution(HashMap<String, f64>);

impl Distribution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: impl Into<String>, probability: f64) {
        self.0.insert(token.into(), probability);
    }

    pub fn get(&self, token: &str) -> Option<f64> {
        self.0.get(token).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Distribution {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadModelRequest {
    pub model_path: String,
    pub custom_weights_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadModelResponse {
    pub status: String,
    #[serde(default)]
    pub model_path: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
    #[serde(default)]
    pub vocab_size: Option<u64>,
}

impl LoadModelResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionResponse {
    #[serde(default)]
    pub tokens: Option<Vec<TokenInfo>>,
    #[serde(default)]
    pub conditional_predictions: Option<Distribution>,
    #[serde(default)]
    pub next_token_predictions: Option<Distribution>,
}

/// Response of the server root, used as a health probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStatus {
    pub status: String,
    #[serde(default)]
    pub model_loaded: bool,
}

/// Per-call deadlines. Model loading may download weights, so it gets its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request: Duration,
    pub load_model: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(30),
            load_model: Duration::from_secs(600),
        }
    }
}

/// The remote model server. Tokenizer and forward pass live entirely behind
/// this trait; the session only ever sees its responses.
#[async_trait::async_trait]
pub trait ModelBackend: Send + Sync {
    async fn load_model(&self, request: &LoadModelRequest) -> Result<LoadModelResponse>;

    async fn tokenize(&self, text: &str) -> Result<Vec<TokenInfo>>;

    /// Distribution over the token at `token_index`, conditioned on the text before it.
    async fn predict_conditional(&self, text: &str, token_index: usize)
        -> Result<PredictionResponse>;

    /// Distribution over the token following the whole text.
    async fn predict_next(&self, text: &str) -> Result<PredictionResponse>;

    async fn status(&self) -> Result<ServerStatus>;
}
