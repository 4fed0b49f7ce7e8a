//! Classifier collaborators
//!
//! Stateless scoring services applied to the latest user utterance, plus the
//! image captioner used when observations reference image files.

mod huggingface;

pub use huggingface::{HfCaptioner, HfInferenceClient, HfTextClassifier};

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry;

/// Errors from a classifier or captioner call
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Score {0} is outside [0, 1]")]
    ScoreOutOfRange(f64),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ClassifyError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ClassifyError::Network(e) => !e.is_decode() && !e.is_builder(),
            ClassifyError::ApiError { status, .. } => retry::is_transient_status(*status),
            ClassifyError::Malformed(_) | ClassifyError::ScoreOutOfRange(_) | ClassifyError::Io { .. } => false,
        }
    }
}

/// Toxicity in [0, 1] from a model's non-toxicity score
///
/// Scores outside [0, 1] (including NaN) are rejected.
pub fn toxicity_from_non_toxicity(score: f64) -> Result<f64, ClassifyError> {
    if (0.0..=1.0).contains(&score) {
        Ok(1.0 - score)
    } else {
        Err(ClassifyError::ScoreOutOfRange(score))
    }
}

/// One label with its probability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// Emotion classifier: single best label for an utterance
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    async fn classify_emotion(&self, text: &str) -> Result<String, ClassifyError>;
}

/// Toxicity model reporting a non-toxicity reward in [0, 1]
#[async_trait]
pub trait ToxicityClassifier: Send + Sync {
    async fn non_toxicity(&self, text: &str) -> Result<f64, ClassifyError>;
}

/// Image-to-text captioner
#[async_trait]
pub trait ImageCaptioner: Send + Sync {
    async fn caption(&self, path: &Path) -> Result<String, ClassifyError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toxicity_inverts_score() {
        assert_eq!(toxicity_from_non_toxicity(1.0).unwrap(), 0.0);
        assert_eq!(toxicity_from_non_toxicity(0.0).unwrap(), 1.0);
        assert!((toxicity_from_non_toxicity(0.8).unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_toxicity_rejects_out_of_range_scores() {
        assert!(matches!(toxicity_from_non_toxicity(1.5), Err(ClassifyError::ScoreOutOfRange(_))));
        assert!(matches!(toxicity_from_non_toxicity(-0.1), Err(ClassifyError::ScoreOutOfRange(_))));
        assert!(toxicity_from_non_toxicity(f64::NAN).is_err());
    }

    #[test]
    fn test_retryable_errors() {
        let api = |status| ClassifyError::ApiError {
            status,
            message: String::new(),
        };
        assert!(api(503).is_retryable());
        assert!(api(429).is_retryable());
        assert!(!api(404).is_retryable());
        assert!(!ClassifyError::Malformed("x".to_string()).is_retryable());
    }
}
