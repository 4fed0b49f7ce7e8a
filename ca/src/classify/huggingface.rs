//! Hugging Face Inference API client
//!
//! Text classification (`[[{label, score}]]`) and image-to-text
//! (`[{generated_text}]`) against hosted pipelines.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use super::{ClassifyError, EmotionClassifier, ImageCaptioner, LabelScore, ToxicityClassifier};
use crate::config::ClassifiersConfig;
use crate::retry;

enum Payload {
    Json(serde_json::Value),
    Bytes(Vec<u8>),
}

/// Shared HTTP client for the Inference API
pub struct HfInferenceClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    max_retries: u32,
    initial_backoff: Duration,
}

impl HfInferenceClient {
    pub fn from_config(config: &ClassifiersConfig) -> Result<Self, ClassifyError> {
        debug!(base_url = %config.base_url, "HfInferenceClient::from_config: called");
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key(),
            max_retries: config.max_retries,
            initial_backoff: retry::INITIAL_BACKOFF,
        })
    }

    /// Classify `text` with a text-classification model, best label first
    pub async fn text_classification(&self, model: &str, text: &str) -> Result<Vec<LabelScore>, ClassifyError> {
        debug!(%model, text_len = text.len(), "text_classification: called");
        let value = self
            .post(model, Payload::Json(serde_json::json!({ "inputs": text })))
            .await?;
        parse_label_scores(value)
    }

    /// Caption raw image bytes with an image-to-text model
    pub async fn image_to_text(&self, model: &str, image: Vec<u8>) -> Result<String, ClassifyError> {
        debug!(%model, image_len = image.len(), "image_to_text: called");
        let value = self.post(model, Payload::Bytes(image)).await?;
        parse_generated_text(value)
    }

    async fn post(&self, model: &str, payload: Payload) -> Result<serde_json::Value, ClassifyError> {
        let url = format!("{}/models/{}", self.base_url, model);

        let mut attempt = 0;
        loop {
            match self.send_once(&url, &payload).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = retry::backoff(self.initial_backoff, attempt);
                    warn!(
                        %model,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "post: retrying after transient error"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    debug!(%model, attempt, error = %e, "post: giving up");
                    return Err(e);
                }
            }
        }
    }

    async fn send_once(&self, url: &str, payload: &Payload) -> Result<serde_json::Value, ClassifyError> {
        let mut builder = self.http.post(url);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }
        builder = match payload {
            Payload::Json(body) => builder.json(body),
            Payload::Bytes(bytes) => builder
                .header("content-type", "application/octet-stream")
                .body(bytes.clone()),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        if !response.status().is_success() {
            debug!(%status, "send_once: API error");
            let message = response.text().await.unwrap_or_default();
            return Err(ClassifyError::ApiError { status, message });
        }

        Ok(response.json().await?)
    }
}

/// Parse `[[{label, score}, ...]]` or `[{label, score}, ...]`, sorted by score
fn parse_label_scores(value: serde_json::Value) -> Result<Vec<LabelScore>, ClassifyError> {
    let flat = match value {
        serde_json::Value::Array(mut outer) if matches!(outer.first(), Some(serde_json::Value::Array(_))) => {
            outer.swap_remove(0)
        }
        other => other,
    };

    let mut scores: Vec<LabelScore> =
        serde_json::from_value(flat).map_err(|e| ClassifyError::Malformed(e.to_string()))?;
    if scores.is_empty() {
        return Err(ClassifyError::Malformed("no labels returned".to_string()));
    }
    scores.sort_by(|a, b| b.score.total_cmp(&a.score));
    Ok(scores)
}

/// Parse `[{generated_text}]`
fn parse_generated_text(value: serde_json::Value) -> Result<String, ClassifyError> {
    value
        .get(0)
        .and_then(|v| v.get("generated_text"))
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| ClassifyError::Malformed(format!("expected [{{generated_text}}], got {}", value)))
}

/// A hosted text-classification model
///
/// As an [`EmotionClassifier`] it reports the best label; as a
/// [`ToxicityClassifier`] it reports the best label's score.
pub struct HfTextClassifier {
    client: Arc<HfInferenceClient>,
    model: String,
}

impl HfTextClassifier {
    pub fn new(client: Arc<HfInferenceClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    async fn top(&self, text: &str) -> Result<LabelScore, ClassifyError> {
        let scores = self.client.text_classification(&self.model, text).await?;
        scores
            .into_iter()
            .next()
            .ok_or_else(|| ClassifyError::Malformed("no labels returned".to_string()))
    }
}

#[async_trait]
impl EmotionClassifier for HfTextClassifier {
    async fn classify_emotion(&self, text: &str) -> Result<String, ClassifyError> {
        Ok(self.top(text).await?.label)
    }
}

#[async_trait]
impl ToxicityClassifier for HfTextClassifier {
    async fn non_toxicity(&self, text: &str) -> Result<f64, ClassifyError> {
        Ok(self.top(text).await?.score)
    }
}

/// A hosted image-to-text model reading images from disk
pub struct HfCaptioner {
    client: Arc<HfInferenceClient>,
    model: String,
}

impl HfCaptioner {
    pub fn new(client: Arc<HfInferenceClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl ImageCaptioner for HfCaptioner {
    async fn caption(&self, path: &Path) -> Result<String, ClassifyError> {
        debug!(?path, "HfCaptioner::caption: called");
        let bytes = tokio::fs::read(path).await.map_err(|source| ClassifyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.client.image_to_text(&self.model, bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::test_server::{Reply, serve};
    use std::sync::atomic::Ordering;

    fn server_client(base_url: String, max_retries: u32) -> Arc<HfInferenceClient> {
        let config = ClassifiersConfig {
            base_url,
            max_retries,
            api_key_env: "CHATAGENT_TEST_UNSET_TOKEN".to_string(),
            ..Default::default()
        };
        let mut client = HfInferenceClient::from_config(&config).unwrap();
        client.initial_backoff = Duration::from_millis(1);
        Arc::new(client)
    }

    fn labels() -> Reply {
        Reply::json(
            200,
            serde_json::json!([[
                { "label": "joy", "score": 0.9 },
                { "label": "anger", "score": 0.1 }
            ]]),
        )
    }

    #[test]
    fn test_parse_nested_label_scores_sorted() {
        let value = serde_json::json!([[
            { "label": "neutral", "score": 0.2 },
            { "label": "sadness", "score": 0.7 },
            { "label": "joy", "score": 0.1 }
        ]]);

        let scores = parse_label_scores(value).unwrap();

        assert_eq!(scores[0].label, "sadness");
        assert_eq!(scores[1].label, "neutral");
        assert_eq!(scores.len(), 3);
    }

    #[test]
    fn test_parse_flat_label_scores() {
        let value = serde_json::json!([{ "label": "LABEL_0", "score": 0.93 }]);

        let scores = parse_label_scores(value).unwrap();

        assert_eq!(scores, vec![LabelScore {
            label: "LABEL_0".to_string(),
            score: 0.93
        }]);
    }

    #[test]
    fn test_parse_label_scores_rejects_garbage() {
        assert!(parse_label_scores(serde_json::json!({ "error": "Model is loading" })).is_err());
        assert!(parse_label_scores(serde_json::json!([])).is_err());
        assert!(parse_label_scores(serde_json::json!([[]])).is_err());
    }

    #[test]
    fn test_parse_generated_text() {
        let value = serde_json::json!([{ "generated_text": " a cat sitting on a couch " }]);
        assert_eq!(parse_generated_text(value).unwrap(), "a cat sitting on a couch");

        assert!(parse_generated_text(serde_json::json!({})).is_err());
    }

    #[test]
    fn test_from_config_trims_base_url() {
        let config = ClassifiersConfig {
            base_url: "https://example.test/".to_string(),
            ..Default::default()
        };
        let client = HfInferenceClient::from_config(&config).unwrap();
        assert_eq!(client.base_url, "https://example.test");
    }

    #[tokio::test]
    async fn test_caption_missing_file_is_io_error() {
        let client = Arc::new(HfInferenceClient::from_config(&ClassifiersConfig::default()).unwrap());
        let captioner = HfCaptioner::new(client, "blip");

        let result = captioner.caption(Path::new("/nonexistent/cat.png")).await;
        assert!(matches!(result, Err(ClassifyError::Io { .. })));
    }

    #[tokio::test]
    async fn test_model_loading_is_retried() {
        let loading = Reply::json(503, serde_json::json!({ "error": "Model is currently loading" }));
        let (url, hits) = serve(vec![loading, labels()]).await;
        let classifier = HfTextClassifier::new(server_client(url, 3), "emotions");

        let label = classifier.classify_emotion("I'm so happy").await.unwrap();

        assert_eq!(label, "joy");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_model_is_not_retried() {
        let missing = Reply::json(404, serde_json::json!({ "error": "Model not found" }));
        let (url, hits) = serve(vec![missing, labels()]).await;
        let classifier = HfTextClassifier::new(server_client(url, 3), "nope");

        let result = classifier.non_toxicity("hello").await;

        assert!(matches!(result, Err(ClassifyError::ApiError { status: 404, .. })));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let busy = || Reply::json(429, serde_json::json!({ "error": "busy" }));
        let (url, hits) = serve(vec![busy(), busy(), labels()]).await;
        let classifier = HfTextClassifier::new(server_client(url, 1), "emotions");

        let result = classifier.classify_emotion("hello").await;

        assert!(matches!(result, Err(ClassifyError::ApiError { status: 429, .. })));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
