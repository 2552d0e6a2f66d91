use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::schedule::Schedule;

/// What a link's surrounding text promises the page will be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimKind {
    /// "Apply now", "We're hiring", careers pages.
    Application,
    /// A person's profile (speaker lists, LinkedIn links).
    SpeakerProfile,
    /// An event listing (Luma, Eventbrite, Meetup) or copy that names a date or time.
    Event,
    Generic,
}

/// A link and the text that describes it, as found in the source message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimLinkPair {
    pub claim: String,
    pub url: String,
    /// Zero-based order of the URL in the source message.
    pub position: usize,
    pub kind: ClaimKind,
    /// Expected person for speaker profiles, when a name could be read off the claim.
    #[serde(default)]
    pub subject: Option<String>,
    /// When an event claim says the event happens.
    #[serde(default)]
    pub schedule: Option<Schedule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Aligned,
    /// Page loaded but does not clearly match the claim.
    Questionable,
    /// The verification attempt itself errored.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub pair: ClaimLinkPair,
    pub verdict: Verdict,
    pub explanation: String,
    #[serde(default)]
    pub page_title: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl VerificationResult {
    pub fn failed(pair: ClaimLinkPair, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            pair,
            verdict: Verdict::Failed,
            explanation: format!("Could not verify: {}", error),
            page_title: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionCategory {
    Spelling,
    Grammar,
    Wording,
}

/// A concrete wording change: replace `original` with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub original: String,
    pub replacement: String,
    pub reason: String,
    pub category: SuggestionCategory,
}

/// Conflicting details inside the copy itself (dates, days, times).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyIssue {
    pub description: String,
    #[serde(default)]
    pub conflicting: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyReview {
    /// 0-100, 100 being flawless copy.
    pub score: u8,
    pub summary: String,
    /// Ordered by first appearance in the reviewed text.
    pub suggestions: Vec<Suggestion>,
    #[serde(default)]
    pub consistency: Vec<ConsistencyIssue>,
}

/// Counts per verdict, derived from a report on demand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub aligned: usize,
    pub questionable: usize,
    pub failed: usize,
}

/// Final output of one review run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub results: Vec<VerificationResult>,
    pub copy_review: Option<CopyReview>,
    pub link_failure_count: usize,
    pub reviewed_at: DateTime<Utc>,
}

impl Report {
    /// Build a report from already-resolved branches.
    ///
    /// Panics if `results` does not hold exactly one entry per extracted pair
    /// in position order; that can only happen through a bug in the coordinator.
    pub fn assemble(
        pairs: &[ClaimLinkPair],
        results: Vec<VerificationResult>,
        copy_review: Option<CopyReview>,
    ) -> Self {
        assert_eq!(
            results.len(),
            pairs.len(),
            "verification produced {} results for {} pairs",
            results.len(),
            pairs.len()
        );
        for (pair, result) in pairs.iter().zip(&results) {
            assert_eq!(
                pair.position, result.pair.position,
                "verification results out of position order"
            );
        }

        let link_failure_count = results
            .iter()
            .filter(|r| r.verdict == Verdict::Failed)
            .count();

        Self {
            results,
            copy_review,
            link_failure_count,
            reviewed_at: Utc::now(),
        }
    }

    pub fn tally(&self) -> Tally {
        let mut tally = Tally::default();
        for result in &self.results {
            match result.verdict {
                Verdict::Aligned => tally.aligned += 1,
                Verdict::Questionable => tally.questionable += 1,
                Verdict::Failed => tally.failed += 1,
            }
        }
        tally
    }

    /// True when a human should look at something before the copy ships.
    pub fn needs_attention(&self) -> bool {
        let tally = self.tally();
        tally.questionable > 0
            || tally.failed > 0
            || self
                .copy_review
                .as_ref()
                .is_some_and(|c| !c.suggestions.is_empty() || !c.consistency.is_empty())
    }
}
