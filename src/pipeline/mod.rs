// Pipeline module
// Composes the admission gate and retriever for a single question


use tracing::{debug, info};

use crate::Result;
use crate::gate::{AdmissionGate, GateDecision, RejectReason};
use crate::retriever::Retriever;

/// Outcome of a gated retrieval request.
///
/// `OutOfScope` is the expected low-severity rejection path; infrastructure
/// failures surface as errors so callers and operators can tell them apart.
#[derive(Debug)]
pub enum QueryOutcome {
    InScope(Vec<String>),
    OutOfScope(RejectReason),
}

/// Runs the admission gate, then retrieval, for each question.
pub struct QueryPipeline {
    gate: Box<dyn AdmissionGate>,
    retriever: Retriever,
}

impl QueryPipeline {
    #[inline]
    pub fn new(gate: Box<dyn AdmissionGate>, retriever: Retriever) -> Self {
        Self { gate, retriever }
    }

    /// Retrieve the context chunks for `question` within `subject`.
    ///
    /// The gate always runs first: a rejection returns before the index or
    /// the embedding service is touched.
    #[inline]
    pub async fn scoped_context(
        &self,
        question: &str,
        subject: &str,
        k: usize,
    ) -> Result<QueryOutcome> {
        match self.gate.validate(question, subject).await? {
            GateDecision::Reject(reason) => {
                info!("Question rejected as out of scope: {}", reason.describe());
                Ok(QueryOutcome::OutOfScope(reason))
            }
            GateDecision::Accept => {
                debug!("Question admitted for subject {}", subject);
                let chunks = self.retriever.query(question, subject, k).await?;
                Ok(QueryOutcome::InScope(chunks))
            }
        }
    }
}
