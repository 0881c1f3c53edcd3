use super::*;
use crate::config::GateConfig;
use super::classifier::{ClassificationResult, LabelScore};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Classifier stub with scripted stage scores and per-stage call counters.
struct ScriptedClassifier {
    educational_score: Option<f32>,
    subject_score: Option<f32>,
    educational_calls: AtomicUsize,
    subject_calls: AtomicUsize,
}

impl ScriptedClassifier {
    fn new(educational_score: Option<f32>, subject_score: Option<f32>) -> Self {
        Self {
            educational_score,
            subject_score,
            educational_calls: AtomicUsize::new(0),
            subject_calls: AtomicUsize::new(0),
        }
    }
}

impl TextClassifier for ScriptedClassifier {
    fn classify(
        &self,
        _text: &str,
        candidate_labels: &[String],
    ) -> crate::Result<ClassificationResult> {
        if candidate_labels.iter().any(|l| l == EDUCATIONAL_LABEL) {
            self.educational_calls.fetch_add(1, Ordering::SeqCst);
            let score = self.educational_score.ok_or_else(|| {
                crate::CurriculumError::Classification("service unavailable".to_string())
            })?;
            // Labels intentionally out of request order
            Ok(ClassificationResult {
                labels: vec![
                    LabelScore {
                        label: NON_EDUCATIONAL_LABEL.to_string(),
                        score: 1.0 - score,
                    },
                    LabelScore {
                        label: EDUCATIONAL_LABEL.to_string(),
                        score,
                    },
                ],
            })
        } else {
            self.subject_calls.fetch_add(1, Ordering::SeqCst);
            let score = self.subject_score.ok_or_else(|| {
                crate::CurriculumError::Classification("service unavailable".to_string())
            })?;
            Ok(ClassificationResult {
                labels: vec![
                    LabelScore {
                        label: candidate_labels[1].clone(),
                        score: 1.0 - score,
                    },
                    LabelScore {
                        label: candidate_labels[0].clone(),
                        score,
                    },
                ],
            })
        }
    }
}

fn classifier_gate(
    classifier: Arc<ScriptedClassifier>,
    fallback: FallbackMode,
) -> ClassifierGate {
    let gate_config = GateConfig {
        strategy: GateStrategy::Classifier,
        subjects: vec!["mathematics".to_string(), "biology".to_string()],
        educational_threshold: 0.7,
        subject_threshold: 0.7,
        fallback,
    };
    ClassifierGate::new(classifier, &gate_config)
}

#[tokio::test]
async fn allow_list_accepts_any_question_for_configured_subject() {
    let gate = AllowListGate::new(["mathematics", "biology"]);

    for question in [
        "what is a quadratic equation?",
        "tell me a joke",
        "lorem ipsum",
    ] {
        let decision = gate
            .validate(question, "mathematics")
            .await
            .expect("allow-list never errors");
        assert!(decision.is_accepted());
    }
}

#[tokio::test]
async fn allow_list_rejects_unconfigured_subject() {
    let gate = AllowListGate::new(["mathematics", "biology"]);

    let decision = gate
        .validate("who won the battle of hastings?", "history")
        .await
        .expect("allow-list never errors");

    assert_eq!(
        decision,
        GateDecision::Reject(RejectReason::SubjectNotSupported)
    );
}

#[tokio::test]
async fn allow_list_matching_is_case_insensitive() {
    let gate = AllowListGate::new(["Mathematics"]);

    let decision = gate
        .validate("solve for x", "MATHEMATICS")
        .await
        .expect("allow-list never errors");
    assert!(decision.is_accepted());
}

#[tokio::test]
async fn classifier_accepts_when_both_stages_pass() {
    let classifier = Arc::new(ScriptedClassifier::new(Some(0.95), Some(0.9)));
    let gate = classifier_gate(Arc::clone(&classifier), FallbackMode::Reject);

    let decision = gate
        .validate("what is a quadratic equation?", "mathematics")
        .await
        .expect("gate should not error");

    assert!(decision.is_accepted());
    assert_eq!(classifier.educational_calls.load(Ordering::SeqCst), 1);
    assert_eq!(classifier.subject_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stage_two_is_not_invoked_when_stage_one_rejects() {
    let classifier = Arc::new(ScriptedClassifier::new(Some(0.2), Some(0.9)));
    let gate = classifier_gate(Arc::clone(&classifier), FallbackMode::Reject);

    let decision = gate
        .validate("tell me a joke", "mathematics")
        .await
        .expect("gate should not error");

    assert_eq!(decision, GateDecision::Reject(RejectReason::NotEducational));
    assert_eq!(classifier.educational_calls.load(Ordering::SeqCst), 1);
    assert_eq!(classifier.subject_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn subject_mismatch_is_rejected() {
    let classifier = Arc::new(ScriptedClassifier::new(Some(0.95), Some(0.3)));
    let gate = classifier_gate(classifier, FallbackMode::Reject);

    let decision = gate
        .validate("explain photosynthesis", "mathematics")
        .await
        .expect("gate should not error");

    assert_eq!(decision, GateDecision::Reject(RejectReason::SubjectMismatch));
}

#[tokio::test]
async fn score_equal_to_threshold_is_rejected() {
    let classifier = Arc::new(ScriptedClassifier::new(Some(0.7), Some(0.9)));
    let gate = classifier_gate(classifier, FallbackMode::Reject);

    let decision = gate
        .validate("borderline question", "mathematics")
        .await
        .expect("gate should not error");

    assert_eq!(decision, GateDecision::Reject(RejectReason::NotEducational));
}

#[tokio::test]
async fn classifier_outage_fails_closed_by_default() {
    let classifier = Arc::new(ScriptedClassifier::new(None, None));
    let gate = classifier_gate(classifier, FallbackMode::Reject);

    let decision = gate
        .validate("what is a quadratic equation?", "mathematics")
        .await
        .expect("outage degrades to a decision, not an error");

    assert_eq!(
        decision,
        GateDecision::Reject(RejectReason::ClassifierUnavailable)
    );
}

#[tokio::test]
async fn classifier_outage_can_fall_back_to_allow_list() {
    let classifier = Arc::new(ScriptedClassifier::new(None, None));
    let gate = classifier_gate(classifier, FallbackMode::AllowList);

    let decision = gate
        .validate("what is a quadratic equation?", "mathematics")
        .await
        .expect("fallback should decide");
    assert!(decision.is_accepted());

    let decision = gate
        .validate("who won the battle of hastings?", "history")
        .await
        .expect("fallback should decide");
    assert_eq!(
        decision,
        GateDecision::Reject(RejectReason::SubjectNotSupported)
    );
}

#[tokio::test]
async fn stage_two_outage_applies_the_fallback_policy() {
    let classifier = Arc::new(ScriptedClassifier::new(Some(0.95), None));
    let gate = classifier_gate(Arc::clone(&classifier), FallbackMode::Reject);

    let decision = gate
        .validate("what is a quadratic equation?", "mathematics")
        .await
        .expect("outage degrades to a decision");

    assert_eq!(
        decision,
        GateDecision::Reject(RejectReason::ClassifierUnavailable)
    );
    assert_eq!(classifier.subject_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn gate_from_config_selects_the_strategy() {
    let mut config = crate::config::Config::default();
    config.gate.strategy = GateStrategy::AllowList;
    config.gate.subjects = vec!["physics".to_string()];

    let gate = gate_from_config(&config).expect("should build gate");
    let decision = gate
        .validate("why is the sky blue?", "physics")
        .await
        .expect("allow-list never errors");
    assert!(decision.is_accepted());

    config.gate.strategy = GateStrategy::Classifier;
    assert!(gate_from_config(&config).is_ok());
}
