// Admission gate module
// Accept/reject screening applied to every question before retrieval

#[cfg(test)]
mod tests;

pub mod classifier;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::Result;
use crate::config::{Config, FallbackMode, GateConfig, GateStrategy};
use crate::corpus::normalize_subject;
use classifier::{TextClassifier, ZeroShotClient};

const EDUCATIONAL_LABEL: &str = "educational";
const NON_EDUCATIONAL_LABEL: &str = "non-educational";

/// Outcome of admission screening.
///
/// A rejection is an expected result, not a fault; infrastructure failures
/// surface as errors instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Accept,
    Reject(RejectReason),
}

impl GateDecision {
    #[inline]
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateDecision::Accept)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    SubjectNotSupported,
    NotEducational,
    SubjectMismatch,
    ClassifierUnavailable,
}

impl RejectReason {
    #[inline]
    pub fn describe(&self) -> &'static str {
        match self {
            RejectReason::SubjectNotSupported => "subject is not in the supported list",
            RejectReason::NotEducational => "question does not look educational",
            RejectReason::SubjectMismatch => "question does not match the requested subject",
            RejectReason::ClassifierUnavailable => "classification service is unavailable",
        }
    }
}

/// Accept or reject a (question, subject) pair before any retrieval work.
///
/// Stateless per call; implementations must never let a service outage
/// silently accept.
#[async_trait]
pub trait AdmissionGate: Send + Sync {
    async fn validate(&self, question: &str, subject: &str) -> Result<GateDecision>;
}

/// Accepts any question whose subject is in a fixed configured set.
pub struct AllowListGate {
    subjects: HashSet<String>,
}

impl AllowListGate {
    #[inline]
    pub fn new<I, S>(subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            subjects: subjects
                .into_iter()
                .map(|s| normalize_subject(s.as_ref()))
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    fn decide(&self, subject: &str) -> GateDecision {
        if self.subjects.contains(&normalize_subject(subject)) {
            GateDecision::Accept
        } else {
            GateDecision::Reject(RejectReason::SubjectNotSupported)
        }
    }
}

#[async_trait]
impl AdmissionGate for AllowListGate {
    #[inline]
    async fn validate(&self, _question: &str, subject: &str) -> Result<GateDecision> {
        Ok(self.decide(subject))
    }
}

/// What the classifier gate does when the classification service fails.
pub enum FallbackPolicy {
    /// Fail closed: reject the question.
    Reject,
    /// Fall back to the allow-list check.
    AllowList(AllowListGate),
}

/// Two-stage zero-shot classification gate.
///
/// Stage 1 checks that the question is educational; stage 2 checks that it
/// matches the requested subject. Stage 2 only runs when stage 1 accepted.
pub struct ClassifierGate {
    classifier: Arc<dyn TextClassifier>,
    educational_threshold: f32,
    subject_threshold: f32,
    fallback: FallbackPolicy,
}

impl ClassifierGate {
    #[inline]
    pub fn new(classifier: Arc<dyn TextClassifier>, gate_config: &GateConfig) -> Self {
        let fallback = match gate_config.fallback {
            FallbackMode::Reject => FallbackPolicy::Reject,
            FallbackMode::AllowList => {
                FallbackPolicy::AllowList(AllowListGate::new(gate_config.subjects.iter()))
            }
        };

        Self {
            classifier,
            educational_threshold: gate_config.educational_threshold,
            subject_threshold: gate_config.subject_threshold,
            fallback,
        }
    }

    fn fall_back(&self, subject: &str, cause: &str) -> GateDecision {
        warn!(
            "Classification unavailable ({}), applying fallback policy",
            cause
        );
        match &self.fallback {
            FallbackPolicy::Reject => GateDecision::Reject(RejectReason::ClassifierUnavailable),
            FallbackPolicy::AllowList(gate) => gate.decide(subject),
        }
    }
}

#[async_trait]
impl AdmissionGate for ClassifierGate {
    #[inline]
    async fn validate(&self, question: &str, subject: &str) -> Result<GateDecision> {
        let labels = vec![
            EDUCATIONAL_LABEL.to_string(),
            NON_EDUCATIONAL_LABEL.to_string(),
        ];
        let educational_score = match self.classifier.classify(question, &labels) {
            Ok(result) => match result.score_for(EDUCATIONAL_LABEL) {
                Some(score) => score,
                None => {
                    return Ok(self.fall_back(subject, "educational label missing from response"));
                }
            },
            Err(e) => return Ok(self.fall_back(subject, &e.to_string())),
        };

        if educational_score <= self.educational_threshold {
            debug!(
                "Educational score {} below threshold {}",
                educational_score, self.educational_threshold
            );
            return Ok(GateDecision::Reject(RejectReason::NotEducational));
        }

        // Stage 2 runs only after stage 1 accepted
        let subject_label = normalize_subject(subject);
        let labels = vec![subject_label.clone(), format!("not {subject_label}")];
        match self.classifier.classify(question, &labels) {
            Ok(result) => match result.score_for(&subject_label) {
                Some(score) if score > self.subject_threshold => Ok(GateDecision::Accept),
                Some(score) => {
                    debug!(
                        "Subject score {} below threshold {}",
                        score, self.subject_threshold
                    );
                    Ok(GateDecision::Reject(RejectReason::SubjectMismatch))
                }
                None => Ok(self.fall_back(subject, "subject label missing from response")),
            },
            Err(e) => Ok(self.fall_back(subject, &e.to_string())),
        }
    }
}

/// Build the configured admission gate.
#[inline]
pub fn gate_from_config(config: &Config) -> Result<Box<dyn AdmissionGate>> {
    match config.gate.strategy {
        GateStrategy::AllowList => Ok(Box::new(AllowListGate::new(config.gate.subjects.iter()))),
        GateStrategy::Classifier => {
            let client = ZeroShotClient::new(&config.classifier)?;
            Ok(Box::new(ClassifierGate::new(
                Arc::new(client),
                &config.gate,
            )))
        }
    }
}
