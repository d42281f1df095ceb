use crate::api::traits::*;
use crate::error::{Result, TokenscopeError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// `ModelBackend` over the server's JSON HTTP API.
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    timeouts: Timeouts,
}

#[derive(Debug, Serialize)]
struct TextRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct ConditionalRequest<'a> {
    text: &'a str,
    token_index: usize,
}

/// Error body shapes seen from the server: FastAPI's `detail` or a generic `message`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
    message: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B, R>(&self, path: &str, body: &B, timeout: Duration) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!("POST {}", path);
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_transport(path, timeout, e))?;
        read_json(path, timeout, response).await
    }

    async fn get<R: DeserializeOwned>(&self, path: &str, timeout: Duration) -> Result<R> {
        debug!("GET {}", path);
        let response = self
            .client
            .get(self.url(path))
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_transport(path, timeout, e))?;
        read_json(path, timeout, response).await
    }
}

async fn read_json<R: DeserializeOwned>(
    path: &str,
    timeout: Duration,
    response: reqwest::Response,
) -> Result<R> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| classify_transport(path, timeout, e))?;

    if !status.is_success() {
        return Err(TokenscopeError::server(status.as_u16(), error_detail(&bytes)));
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| TokenscopeError::Decode(format!("{path}: {e}")))
}

/// Pull a human-readable message out of an error body, if it has one.
fn error_detail(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
    let detail = parsed.detail.and_then(|d| match d {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Null => None,
        // FastAPI validation errors arrive as a list of objects
        other => Some(other.to_string()),
    });
    detail.or(parsed.message).filter(|s| !s.trim().is_empty())
}

fn classify_transport(path: &str, timeout: Duration, err: reqwest::Error) -> TokenscopeError {
    if err.is_timeout() {
        TokenscopeError::Timeout {
            endpoint: path.to_string(),
            after: timeout,
        }
    } else if let Some(status) = err.status() {
        TokenscopeError::server(status.as_u16(), None)
    } else if err.is_decode() {
        TokenscopeError::Decode(format!("{path}: {err}"))
    } else {
        TokenscopeError::Connection(format!("{path}: {err}"))
    }
}

#[async_trait::async_trait]
impl ModelBackend for HttpBackend {
    async fn load_model(&self, request: &LoadModelRequest) -> Result<LoadModelResponse> {
        info!("Requesting model load: {}", request.model_path);
        self.post("/api/load-model", request, self.timeouts.load_model)
            .await
    }

    async fn tokenize(&self, text: &str) -> Result<Vec<TokenInfo>> {
        self.post("/api/tokenize", &TextRequest { text }, self.timeouts.request)
            .await
    }

    async fn predict_conditional(
        &self,
        text: &str,
        token_index: usize,
    ) -> Result<PredictionResponse> {
        self.post(
            "/api/predict-conditional",
            &ConditionalRequest { text, token_index },
            self.timeouts.request,
        )
        .await
    }

    async fn predict_next(&self, text: &str) -> Result<PredictionResponse> {
        self.post(
            "/api/predict-next-token",
            &TextRequest { text },
            self.timeouts.request,
        )
        .await
    }

    async fn status(&self) -> Result<ServerStatus> {
        self.get("/", self.timeouts.request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_detail_prefers_detail_over_message() {
        let body = br#"{"detail": "Invalid token index", "message": "ignored"}"#;
        assert_eq!(error_detail(body).as_deref(), Some("Invalid token index"));
    }

    #[test]
    fn test_error_detail_falls_back_to_message() {
        let body = br#"{"message": "Model not loaded"}"#;
        assert_eq!(error_detail(body).as_deref(), Some("Model not loaded"));
    }

    #[test]
    fn test_error_detail_none_for_non_json_body() {
        assert!(error_detail(b"<html>502 Bad Gateway</html>").is_none());
        assert!(error_detail(br#"{"detail": "  "}"#).is_none());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let backend = HttpBackend::new("http://localhost:8000/");
        assert_eq!(backend.url("/api/tokenize"), "http://localhost:8000/api/tokenize");
    }
}
