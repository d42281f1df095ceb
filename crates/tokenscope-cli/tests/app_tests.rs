use std::sync::{Arc, Mutex};

use tokenscope_cli::app::{inspect, OneShot};
use tokenscope_core::api::{
    LoadModelRequest, LoadModelResponse, PredictionResponse, ServerStatus,
};
use tokenscope_core::{Distribution, ModelBackend, Result, Settings, TokenInfo};

/// Server that already has a model loaded. Tokenizes on whitespace.
struct StubServer {
    predict_tokens: Option<Vec<TokenInfo>>,
    predicted: Mutex<Vec<(String, usize)>>,
}

impl StubServer {
    fn new(predict_tokens: Option<Vec<TokenInfo>>) -> Arc<Self> {
        Arc::new(Self {
            predict_tokens,
            predicted: Mutex::new(Vec::new()),
        })
    }
}

fn distribution() -> Distribution {
    [("mat", 0.7), ("hat", 0.2), ("bat", 0.1)].into_iter().collect()
}

#[async_trait::async_trait]
impl ModelBackend for StubServer {
    async fn load_model(&self, request: &LoadModelRequest) -> Result<LoadModelResponse> {
        Ok(LoadModelResponse {
            status: "success".to_string(),
            model_path: Some(request.model_path.clone()),
            device: None,
            vocab_size: None,
        })
    }

    async fn tokenize(&self, text: &str) -> Result<Vec<TokenInfo>> {
        Ok(text
            .split_whitespace()
            .enumerate()
            .map(|(i, t)| TokenInfo::new(t, i as i64))
            .collect())
    }

    async fn predict_conditional(
        &self,
        text: &str,
        token_index: usize,
    ) -> Result<PredictionResponse> {
        self.predicted
            .lock()
            .unwrap()
            .push((text.to_string(), token_index));
        Ok(PredictionResponse {
            tokens: self.predict_tokens.clone(),
            conditional_predictions: Some(distribution()),
            next_token_predictions: None,
        })
    }

    async fn predict_next(&self, _text: &str) -> Result<PredictionResponse> {
        Ok(PredictionResponse {
            next_token_predictions: Some(distribution()),
            ..Default::default()
        })
    }

    async fn status(&self) -> Result<ServerStatus> {
        Ok(ServerStatus {
            status: "ok".to_string(),
            model_loaded: true,
        })
    }
}

fn one_shot(text: &str, index: Option<usize>) -> OneShot {
    OneShot {
        text: text.to_string(),
        index,
        ..Default::default()
    }
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_inspect_selected_token() {
    let server = StubServer::new(None);

    let ranked = inspect(
        server.clone(),
        &Settings::default(),
        one_shot("the cat sat", Some(2)),
    )
    .await
    .unwrap();

    assert_eq!(ranked.top().unwrap().full_token, "mat");
    assert_eq!(ranked.total_candidates, 3);
    assert_eq!(
        *server.predicted.lock().unwrap(),
        vec![("the cat sat".to_string(), 2)]
    );
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_inspect_without_index_uses_next_token_distribution() {
    let server = StubServer::new(None);

    let ranked = inspect(server.clone(), &Settings::default(), one_shot("the cat", None))
        .await
        .unwrap();

    assert_eq!(ranked.len(), 3);
    assert!(server.predicted.lock().unwrap().is_empty());
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_inspect_fails_when_retokenization_drops_selected_token() {
    // the prediction endpoint merges everything into one token
    let server = StubServer::new(Some(vec![TokenInfo::new("the cat sat", 9)]));

    let result = tokio::time::timeout(
        std::time::Duration::from_secs(30),
        inspect(server, &Settings::default(), one_shot("the cat sat", Some(2))),
    )
    .await
    .expect("one-shot must not hang");

    let err = result.unwrap_err().to_string();
    assert!(err.contains("no longer exists"), "{err}");
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_inspect_rejects_out_of_range_index() {
    let server = StubServer::new(None);

    let err = inspect(server, &Settings::default(), one_shot("the cat", Some(5)))
        .await
        .unwrap_err()
        .to_string();

    assert!(err.contains("No token at that index"), "{err}");
}
