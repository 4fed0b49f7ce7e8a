//! Observation normalization
//!
//! Upstream tools may wrap parts of an observation in delimiters (backticks by
//! default). Before classification the planner runs the observation through an
//! [`ObservationNormalizer`]; the policy is pluggable.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::classify::ImageCaptioner;
use crate::config::NormalizerKind;

/// Default delimiter around tool output fragments
pub const DEFAULT_DELIMITER: char = '`';

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Turns a raw observation into the text that gets classified
///
/// Never fails: a policy that cannot do its job returns its best effort.
#[async_trait]
pub trait ObservationNormalizer: Send + Sync {
    async fn normalize(&self, observation: &str) -> String;
}

/// Split on a delimiter and concatenate the fragments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimiterJoin {
    pub delimiter: char,
}

impl DelimiterJoin {
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }

    /// The fragments between delimiters, including empty ones
    pub fn fragments<'a>(&self, observation: &'a str) -> Vec<&'a str> {
        observation.split(self.delimiter).collect()
    }
}

impl Default for DelimiterJoin {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER)
    }
}

#[async_trait]
impl ObservationNormalizer for DelimiterJoin {
    async fn normalize(&self, observation: &str) -> String {
        self.fragments(observation).concat()
    }
}

/// Leave observations untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

#[async_trait]
impl ObservationNormalizer for Passthrough {
    async fn normalize(&self, observation: &str) -> String {
        observation.to_string()
    }
}

/// Replace delimited image paths with captions
///
/// `"look `img/cat.png`"` becomes `"look a cat on a couch"` when the file exists.
/// Fragments that are not readable images, or whose captioning fails, are kept
/// verbatim.
pub struct CaptioningNormalizer {
    captioner: Arc<dyn ImageCaptioner>,
    splitter: DelimiterJoin,
}

impl CaptioningNormalizer {
    pub fn new(captioner: Arc<dyn ImageCaptioner>, delimiter: char) -> Self {
        Self {
            captioner,
            splitter: DelimiterJoin::new(delimiter),
        }
    }
}

fn is_image_path(fragment: &str) -> bool {
    let path = Path::new(fragment);
    let has_image_ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    has_image_ext && path.is_file()
}

#[async_trait]
impl ObservationNormalizer for CaptioningNormalizer {
    async fn normalize(&self, observation: &str) -> String {
        debug!(observation_len = observation.len(), "CaptioningNormalizer::normalize: called");
        let mut out = String::with_capacity(observation.len());
        for fragment in self.splitter.fragments(observation) {
            let candidate = fragment.trim();
            if !is_image_path(candidate) {
                out.push_str(fragment);
                continue;
            }
            match self.captioner.caption(Path::new(candidate)).await {
                Ok(caption) => {
                    debug!(path = %candidate, %caption, "CaptioningNormalizer::normalize: captioned");
                    out.push_str(&caption);
                }
                Err(e) => {
                    warn!(path = %candidate, error = %e, "CaptioningNormalizer::normalize: captioning failed");
                    out.push_str(fragment);
                }
            }
        }
        out
    }
}

/// Build the normalizer named in the `agent` config section
///
/// The captioning policy falls back to a plain delimiter join when no captioner is available.
pub fn normalizer_for(
    kind: NormalizerKind,
    delimiter: char,
    captioner: Option<Arc<dyn ImageCaptioner>>,
) -> Box<dyn ObservationNormalizer> {
    debug!(?kind, %delimiter, "normalizer_for: called");
    match (kind, captioner) {
        (NormalizerKind::DelimiterJoin, _) => Box::new(DelimiterJoin::new(delimiter)),
        (NormalizerKind::Passthrough, _) => Box::new(Passthrough),
        (NormalizerKind::Captioning, Some(captioner)) => Box::new(CaptioningNormalizer::new(captioner, delimiter)),
        (NormalizerKind::Captioning, None) => {
            warn!("normalizer_for: captioning requested without a captioner, using delimiter join");
            Box::new(DelimiterJoin::new(delimiter))
        }
    }
}
