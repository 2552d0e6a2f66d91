use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::types::{ConsistencyIssue, CopyReview, Suggestion, SuggestionCategory};

/// External language model asked for a structured copy assessment.
/// Returns the raw model output; parsing happens in [`parse_review`].
#[async_trait]
pub trait ReviewModel: Send + Sync {
    async fn review(&self, text: &str) -> Result<String>;
}

const SCORE_KEYS: &[&str] = &["score", "overall_score", "quality_score"];
const ORIGINAL_KEYS: &[&str] = &["original", "original_phrase", "original_text"];
const REPLACEMENT_KEYS: &[&str] = &["replacement", "suggestion", "suggested_phrase", "suggested"];
const REASON_KEYS: &[&str] = &["reason", "rationale", "explanation"];

/// Suggestion lists, in the order they are read, with the category each implies.
const SUGGESTION_LISTS: &[(&str, SuggestionCategory)] = &[
    ("spelling", SuggestionCategory::Spelling),
    ("spelling_issues", SuggestionCategory::Spelling),
    ("grammar", SuggestionCategory::Grammar),
    ("grammar_issues", SuggestionCategory::Grammar),
    ("wording", SuggestionCategory::Wording),
    ("wording_suggestions", SuggestionCategory::Wording),
    ("suggestions", SuggestionCategory::Wording),
];

pub struct CopyReviewer {
    model: Arc<dyn ReviewModel>,
}

impl CopyReviewer {
    pub fn new(model: Arc<dyn ReviewModel>) -> Self {
        Self { model }
    }

    /// Review `text`, or return `None` when there is nothing to review or
    /// the model could not produce a usable answer in time.
    pub async fn review(&self, text: &str, timeout: Duration) -> Option<CopyReview> {
        if text.trim().is_empty() {
            debug!("no prose left to review");
            return None;
        }

        let raw = match tokio::time::timeout(timeout, self.model.review(text)).await {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!(error = %e, "copy review request failed");
                return None;
            }
            Err(_) => {
                warn!(?timeout, "copy review timed out");
                return None;
            }
        };

        match parse_review(&raw, text) {
            Some(review) => {
                info!(
                    score = review.score,
                    suggestions = review.suggestions.len(),
                    consistency = review.consistency.len(),
                    "copy reviewed"
                );
                Some(review)
            }
            None => {
                warn!(raw_len = raw.len(), "copy review response could not be parsed");
                debug!("unparsed review: {}", raw.chars().take(500).collect::<String>());
                None
            }
        }
    }
}

/// Pull a `CopyReview` out of loosely structured model output.
///
/// Tolerates code fences, surrounding chatter, alternate field names and
/// string-typed scores. Returns `None` when no JSON object with a score
/// can be found.
pub fn parse_review(raw: &str, source: &str) -> Option<CopyReview> {
    let value = json_object(raw)?;
    let obj = value.as_object()?;

    let score = SCORE_KEYS
        .iter()
        .find_map(|k| obj.get(*k).and_then(as_score))?;

    let summary = obj
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string();

    let mut seen = HashSet::new();
    let mut suggestions: Vec<Suggestion> = SUGGESTION_LISTS
        .iter()
        .filter_map(|(key, category)| Some((obj.get(*key)?.as_array()?, *category)))
        .flat_map(|(items, category)| {
            items
                .iter()
                .filter_map(Value::as_object)
                .filter_map(move |item| suggestion(item, category))
        })
        .filter(|s| seen.insert((s.original.clone(), s.replacement.clone())))
        .collect();

    // Stable: ties and unlocatable suggestions keep the model's order.
    suggestions.sort_by_key(|s| first_occurrence(source, &s.original).unwrap_or(usize::MAX));

    let consistency = ["consistency", "consistency_issues"]
        .iter()
        .filter_map(|k| obj.get(*k)?.as_array())
        .flatten()
        .filter_map(Value::as_object)
        .filter_map(consistency_issue)
        .collect();

    Some(CopyReview {
        score,
        summary,
        suggestions,
        consistency,
    })
}

/// The outermost `{...}` in `raw`, parsed.
pub(crate) fn json_object(raw: &str) -> Option<Value> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}

fn as_score(value: &Value) -> Option<u8> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches("/100").trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !n.is_finite() {
        return None;
    }
    Some(n.round().clamp(0.0, 100.0) as u8)
}

fn first_str(obj: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str))
        .unwrap_or("")
        .trim()
        .to_string()
}

fn suggestion(item: &Map<String, Value>, category: SuggestionCategory) -> Option<Suggestion> {
    let original = first_str(item, ORIGINAL_KEYS);
    let replacement = first_str(item, REPLACEMENT_KEYS);
    if original.is_empty() || original == replacement {
        return None;
    }
    Some(Suggestion {
        original,
        replacement,
        reason: first_str(item, REASON_KEYS),
        category,
    })
}

fn consistency_issue(item: &Map<String, Value>) -> Option<ConsistencyIssue> {
    let description = first_str(item, &["description", "issue"]);
    if description.is_empty() {
        return None;
    }
    let conflicting = ["conflicting", "conflicting_items"]
        .iter()
        .find_map(|k| item.get(*k)?.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    Some(ConsistencyIssue {
        description,
        conflicting,
    })
}

fn first_occurrence(source: &str, needle: &str) -> Option<usize> {
    source
        .find(needle)
        .or_else(|| source.to_lowercase().find(&needle.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const COPY: &str = "Join us on Saturday Jan 29 for our anual hackathon. Their will be pizza.";

    struct Canned(Result<String, String>);

    #[async_trait]
    impl ReviewModel for Canned {
        async fn review(&self, _text: &str) -> Result<String> {
            self.0.clone().map_err(|e| anyhow::anyhow!(e))
        }
    }

    #[test]
    fn test_parse_orders_by_appearance() {
        let raw = r#"{
            "score": 72,
            "summary": "Friendly but sloppy.",
            "spelling": [
                {"original": "Their will", "replacement": "There will", "reason": "wrong word"}
            ],
            "wording": [
                {"original": "Join us", "replacement": "Come join us", "reason": "warmer"},
                {"original": "anual", "replacement": "annual", "reason": "typo"}
            ]
        }"#;
        let review = parse_review(raw, COPY).unwrap();
        assert_eq!(review.score, 72);
        assert_eq!(review.summary, "Friendly but sloppy.");
        let originals: Vec<_> = review.suggestions.iter().map(|s| s.original.as_str()).collect();
        assert_eq!(originals, vec!["Join us", "anual", "Their will"]);
        assert_eq!(review.suggestions[2].category, SuggestionCategory::Spelling);
    }

    #[test]
    fn test_parse_tolerates_fences_and_legacy_names() {
        let raw = r#"Here you go:
```json
{"overall_score": "88/100", "summary": "ok",
 "wording_suggestions": [{"original_phrase": "pizza", "suggested_phrase": "free pizza"}],
 "consistency_issues": [
   {"description": "Jan 29 is not a Saturday", "conflicting_items": ["Saturday", "Jan 29"]}
 ]}
```"#;
        let review = parse_review(raw, COPY).unwrap();
        assert_eq!(review.score, 88);
        assert_eq!(review.suggestions.len(), 1);
        assert_eq!(review.suggestions[0].replacement, "free pizza");
        assert_eq!(review.consistency.len(), 1);
        assert_eq!(review.consistency[0].conflicting, vec!["Saturday", "Jan 29"]);
    }

    #[test]
    fn test_parse_clamps_score_and_drops_empty_items() {
        let raw = r#"{"score": 140, "wording": [
            {"original": "", "replacement": "x"},
            {"original": "pizza", "replacement": "pizza"},
            "junk"
        ]}"#;
        let review = parse_review(raw, COPY).unwrap();
        assert_eq!(review.score, 100);
        assert!(review.suggestions.is_empty());
        assert_eq!(review.summary, "");
    }

    #[test]
    fn test_parse_unlocatable_suggestions_go_last() {
        let raw = r#"{"score": 60, "wording": [
            {"original": "not in the copy", "replacement": "a"},
            {"original": "pizza", "replacement": "snacks"}
        ]}"#;
        let review = parse_review(raw, COPY).unwrap();
        assert_eq!(review.suggestions[0].original, "pizza");
        assert_eq!(review.suggestions[1].original, "not in the copy");
    }

    #[test]
    fn test_parse_failures() {
        assert!(parse_review("I could not review this.", COPY).is_none());
        assert!(parse_review("{not json}", COPY).is_none());
        assert!(parse_review(r#"{"summary": "no score"}"#, COPY).is_none());
    }

    #[tokio::test]
    async fn test_review_error_is_absent() {
        let reviewer = CopyReviewer::new(Arc::new(Canned(Err("503".into()))));
        assert!(reviewer.review(COPY, Duration::from_secs(1)).await.is_none());
    }

    #[tokio::test]
    async fn test_empty_text_skips_model() {
        let reviewer = CopyReviewer::new(Arc::new(Canned(Err("should not be called".into()))));
        assert!(reviewer.review("  \n ", Duration::from_secs(1)).await.is_none());
    }

    #[tokio::test]
    async fn test_review_success() {
        let canned = Canned(Ok(r#"{"score": 90, "summary": "Clean."}"#.into()));
        let reviewer = CopyReviewer::new(Arc::new(canned));
        let review = reviewer.review(COPY, Duration::from_secs(1)).await.unwrap();
        assert_eq!(review.score, 90);
        assert!(review.suggestions.is_empty());
    }
}
