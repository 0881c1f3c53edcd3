
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

use crate::CurriculumError;
use crate::config::ClassifierConfig;

const DEFAULT_RETRY_ATTEMPTS: u32 = 2;
const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

/// Ranked label scores returned by a classification call.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub labels: Vec<LabelScore>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelScore {
    pub label: String,
    pub score: f32,
}

impl ClassificationResult {
    /// Case-insensitive lookup by label string. The service may return
    /// labels in any order, so positional access is never valid.
    #[inline]
    pub fn score_for(&self, label: &str) -> Option<f32> {
        self.labels
            .iter()
            .find(|entry| entry.label.eq_ignore_ascii_case(label))
            .map(|entry| entry.score)
    }
}

/// Zero-shot text classification against arbitrary candidate labels.
pub trait TextClassifier: Send + Sync {
    fn classify(&self, text: &str, candidate_labels: &[String])
    -> crate::Result<ClassificationResult>;
}

/// Client for a Hugging Face Inference style zero-shot endpoint.
#[derive(Debug, Clone)]
pub struct ZeroShotClient {
    endpoint: Url,
    api_token: Option<String>,
    agent: ureq::Agent,
    retry_attempts: u32,
}

#[derive(Debug, Serialize)]
struct ZeroShotRequest<'a> {
    inputs: &'a str,
    parameters: ZeroShotParameters<'a>,
}

#[derive(Debug, Serialize)]
struct ZeroShotParameters<'a> {
    candidate_labels: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ZeroShotResponse {
    labels: Vec<String>,
    scores: Vec<f32>,
}

impl ZeroShotClient {
    #[inline]
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        let endpoint = config
            .endpoint_url()
            .context("Failed to generate classifier endpoint URL from config")?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_seconds)))
            .build()
            .into();

        Ok(Self {
            endpoint,
            api_token: config.api_token.clone(),
            agent,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Classify `text` against `candidate_labels`, returning ranked scores.
    #[inline]
    pub fn classify_text(
        &self,
        text: &str,
        candidate_labels: &[String],
    ) -> Result<ClassificationResult> {
        debug!(
            "Classifying text (length: {}) against {} labels",
            text.len(),
            candidate_labels.len()
        );

        let request = ZeroShotRequest {
            inputs: text,
            parameters: ZeroShotParameters { candidate_labels },
        };
        let request_json = serde_json::to_string(&request)
            .context("Failed to serialize classification request")?;

        let response_text = self
            .make_request_with_retry(&request_json)
            .context("Failed to call classification service")?;

        parse_response(&response_text)
    }

    fn make_request_with_retry(&self, request_json: &str) -> Result<String> {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            debug!("HTTP request attempt {}/{}", attempt, self.retry_attempts);

            let mut request = self
                .agent
                .post(self.endpoint.as_str())
                .header("Content-Type", "application/json");
            if let Some(token) = &self.api_token {
                request = request.header("Authorization", format!("Bearer {token}"));
            }

            match request
                .send(request_json)
                .and_then(|mut resp| resp.body_mut().read_to_string())
            {
                Ok(response_text) => return Ok(response_text),
                Err(error) => {
                    let should_retry = match &error {
                        ureq::Error::StatusCode(status) => {
                            if *status >= 500 {
                                warn!(
                                    "Server error (status {}), attempt {}/{}",
                                    status, attempt, self.retry_attempts
                                );
                                true
                            } else {
                                warn!("Client error (status {}), not retrying", status);
                                return Err(anyhow::anyhow!("Client error: HTTP {}", status));
                            }
                        }
                        ureq::Error::ConnectionFailed
                        | ureq::Error::HostNotFound
                        | ureq::Error::Timeout(_)
                        | ureq::Error::Io(_) => {
                            warn!(
                                "Transport error: {}, attempt {}/{}",
                                error, attempt, self.retry_attempts
                            );
                            true
                        }
                        _ => {
                            warn!("Non-retryable error: {}", error);
                            false
                        }
                    };

                    if !should_retry {
                        return Err(anyhow::anyhow!("Non-retryable error: {}", error));
                    }

                    last_error = Some(anyhow::anyhow!("Request error: {}", error));

                    if attempt < self.retry_attempts {
                        let delay_ms = EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1) * 500;
                        std::thread::sleep(Duration::from_millis(delay_ms));
                    }
                }
            }
        }

        error!(
            "All retry attempts failed for classification request to {}",
            self.endpoint
        );

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Request failed after retries")))
    }
}

/// Parse and validate a zero-shot classification response body.
fn parse_response(body: &str) -> Result<ClassificationResult> {
    let response: ZeroShotResponse =
        serde_json::from_str(body).context("Failed to parse classification response")?;

    if response.labels.len() != response.scores.len() {
        return Err(anyhow::anyhow!(
            "Mismatched labels and scores: {} labels, {} scores",
            response.labels.len(),
            response.scores.len()
        ));
    }

    if response.labels.is_empty() {
        return Err(anyhow::anyhow!("Classification response has no labels"));
    }

    for score in &response.scores {
        if !(0.0..=1.0).contains(score) {
            return Err(anyhow::anyhow!("Score {} outside the [0, 1] range", score));
        }
    }

    let labels = response
        .labels
        .into_iter()
        .zip(response.scores)
        .map(|(label, score)| LabelScore { label, score })
        .collect();

    Ok(ClassificationResult { labels })
}

impl TextClassifier for ZeroShotClient {
    #[inline]
    fn classify(
        &self,
        text: &str,
        candidate_labels: &[String],
    ) -> crate::Result<ClassificationResult> {
        self.classify_text(text, candidate_labels)
            .map_err(|e| CurriculumError::Classification(format!("{e:#}")))
    }
}
