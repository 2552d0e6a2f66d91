pub mod coordinator;
pub mod copy;
pub mod extract;
pub mod prompts;
pub mod schedule;
pub mod types;
pub mod verify;

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use coordinator::{BatchLimits, VerificationCoordinator};
use copy::{CopyReviewer, ReviewModel};
use types::Report;
use verify::{PageAnalyzer, PageVerifier, VerdictPolicy};

/// Per-run knobs, copied out of the shared config before each review.
#[derive(Debug, Clone, Copy)]
pub struct ReviewLimits {
    pub batch: BatchLimits,
    pub copy_timeout: Duration,
}

/// Extracts claims, checks links and reviews copy, then assembles the report.
pub struct ReviewEngine {
    coordinator: VerificationCoordinator,
    copy_reviewer: CopyReviewer,
}

impl ReviewEngine {
    pub fn new(
        analyzer: Arc<dyn PageAnalyzer>,
        policy: Arc<dyn VerdictPolicy>,
        model: Arc<dyn ReviewModel>,
    ) -> Self {
        let verifier = Arc::new(PageVerifier::new(analyzer, policy));
        Self {
            coordinator: VerificationCoordinator::new(verifier),
            copy_reviewer: CopyReviewer::new(model),
        }
    }

    /// Review one message body. Always produces a report; failures show up
    /// as `Failed` results or a missing copy review.
    pub async fn review(&self, text: &str, limits: ReviewLimits) -> Report {
        let extraction = extract::extract(text);
        info!(
            links = extraction.pairs.len(),
            remainder_len = extraction.remainder.len(),
            "claims extracted"
        );

        let (results, copy_review) = tokio::join!(
            self.coordinator.verify_all(&extraction.pairs, limits.batch),
            self.copy_reviewer
                .review(&extraction.remainder, limits.copy_timeout),
        );

        let report = Report::assemble(&extraction.pairs, results, copy_review);
        let tally = report.tally();
        info!(
            aligned = tally.aligned,
            questionable = tally.questionable,
            failed = tally.failed,
            copy_score = report.copy_review.as_ref().map(|c| c.score),
            "review complete"
        );
        report
    }
}
