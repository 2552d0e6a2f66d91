use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::types::{ClaimKind, ClaimLinkPair, Verdict, VerificationResult};

/// What the page-analysis service is asked about one link.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRequest {
    pub url: String,
    pub claim: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl AnalysisRequest {
    pub fn for_pair(pair: &ClaimLinkPair) -> Self {
        Self {
            url: pair.url.clone(),
            claim: pair.claim.clone(),
            instructions: instructions(pair),
        }
    }
}

/// The service's answer to "does the page match the claim?".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Judgment {
    /// A yes/no answer.
    Flag(bool),
    /// A categorical answer such as "aligned" or "partial match".
    Label(String),
    /// No judgment field; only the explanation carries the answer.
    Absent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResponse {
    pub judgment: Judgment,
    pub explanation: String,
    pub page_title: Option<String>,
    /// Event date and start time as the page shows them, when asked for.
    pub event_date: Option<String>,
    pub event_time: Option<String>,
}

impl AnalysisResponse {
    /// Parse the loosely structured JSON both analysis backends return.
    ///
    /// Accepts `matches`, `aligned`, `is_relevant` or `verdict` as the
    /// judgment and `explanation` or `reason` as the explanation.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| anyhow::anyhow!("analysis response is not a JSON object"))?;

        let judgment = ["matches", "aligned", "is_relevant", "verdict"]
            .iter()
            .find_map(|key| match obj.get(*key)? {
                Value::Bool(b) => Some(Judgment::Flag(*b)),
                Value::String(s) if !s.trim().is_empty() => {
                    Some(Judgment::Label(s.trim().to_string()))
                }
                _ => None,
            })
            .unwrap_or(Judgment::Absent);

        let explanation = ["explanation", "reason", "reasoning"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_str))
            .unwrap_or("")
            .trim()
            .to_string();

        let text_field = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
        };

        if judgment == Judgment::Absent && explanation.is_empty() {
            anyhow::bail!("analysis response carries neither a judgment nor an explanation");
        }

        Ok(Self {
            judgment,
            explanation,
            page_title: text_field("page_title"),
            event_date: text_field("event_date"),
            event_time: text_field("event_time"),
        })
    }
}

/// External service that loads a page and judges it against a claim.
#[async_trait]
pub trait PageAnalyzer: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse>;
}

/// Turns a successful analysis into `Aligned` or `Questionable`.
///
/// Implementations must never return `Failed`; that verdict is reserved
/// for attempts that did not produce an answer at all.
pub trait VerdictPolicy: Send + Sync {
    fn classify(&self, response: &AnalysisResponse) -> Verdict;
}

/// Words that confirm a match.
const CONFIRMATIONS: &[&str] = &[
    "yes", "true", "aligned", "align", "aligns", "match", "matches", "matched", "matching",
    "confirmed", "confirms", "confirm", "correct", "consistent", "relevant", "valid",
];

/// Words that hedge, negate or point at a mismatch. Any of these wins over a confirmation.
const DOUBTS: &[&str] = &[
    "no", "not", "false", "never", "none", "isn't", "doesn't", "don't", "cannot", "can't",
    "unable", "mismatch", "mismatched", "misaligned", "different", "differs", "unrelated",
    "irrelevant", "generic", "partial", "partially", "somewhat", "maybe", "may", "might",
    "possibly", "probably", "perhaps", "unclear", "uncertain", "unsure", "ambiguous", "likely",
    "appears", "seems", "questionable", "however", "but", "instead", "wrong", "incorrect",
    "error", "404", "unavailable", "broken",
];

/// Confirmation language with no hedge is `Aligned`; everything else is `Questionable`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LanguagePolicy;

impl LanguagePolicy {
    fn words(text: &str) -> Vec<String> {
        text.to_lowercase()
            .replace('’', "'")
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn confirms(text: &str) -> bool {
        let words = Self::words(text);
        words.iter().any(|w| CONFIRMATIONS.contains(&w.as_str()))
            && !words.iter().any(|w| DOUBTS.contains(&w.as_str()))
    }
}

impl VerdictPolicy for LanguagePolicy {
    fn classify(&self, response: &AnalysisResponse) -> Verdict {
        let aligned = match &response.judgment {
            Judgment::Flag(flag) => *flag,
            Judgment::Label(label) => Self::confirms(label),
            Judgment::Absent => Self::confirms(&response.explanation),
        };
        if aligned {
            Verdict::Aligned
        } else {
            Verdict::Questionable
        }
    }
}

/// Checks one link against its claim, converting every failure into a `Failed` verdict.
pub struct PageVerifier {
    analyzer: Arc<dyn PageAnalyzer>,
    policy: Arc<dyn VerdictPolicy>,
}

impl PageVerifier {
    pub fn new(analyzer: Arc<dyn PageAnalyzer>, policy: Arc<dyn VerdictPolicy>) -> Self {
        Self { analyzer, policy }
    }

    pub async fn verify(&self, pair: ClaimLinkPair, timeout: Duration) -> VerificationResult {
        let request = AnalysisRequest::for_pair(&pair);

        let response = match tokio::time::timeout(timeout, self.analyzer.analyze(&request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(
                    url = %pair.url,
                    position = pair.position,
                    error = %e,
                    "page analysis failed"
                );
                return VerificationResult::failed(pair, diagnostic(&format!("{:#}", e)));
            }
            Err(_) => {
                warn!(
                    url = %pair.url,
                    position = pair.position,
                    ?timeout,
                    "page analysis timed out"
                );
                return VerificationResult::failed(
                    pair,
                    format!("timed out after {}s", timeout.as_secs_f32()),
                );
            }
        };

        let mut verdict = self.policy.classify(&response);
        debug!(url = %pair.url, position = pair.position, ?verdict, "page analyzed");

        let mismatch = pair.schedule.as_ref().and_then(|s| {
            s.mismatch(response.event_date.as_deref(), response.event_time.as_deref())
        });
        let explanation = if let Some(detail) = mismatch {
            debug!(url = %pair.url, position = pair.position, %detail, "event schedule differs");
            verdict = Verdict::Questionable;
            detail
        } else if response.explanation.is_empty() {
            match &response.judgment {
                Judgment::Label(label) => label.clone(),
                _ => String::new(),
            }
        } else {
            response.explanation
        };

        VerificationResult {
            pair,
            verdict,
            explanation,
            page_title: response.page_title,
            error: None,
        }
    }
}

/// Keep error text short enough to show next to a link.
fn diagnostic(error: &str) -> String {
    let flat = error.replace('\n', " ");
    let trimmed = flat.trim();
    if trimmed.chars().count() <= 120 {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(117).collect();
    out.push_str("...");
    out
}

fn instructions(pair: &ClaimLinkPair) -> Option<String> {
    match pair.kind {
        ClaimKind::Application => Some(
            "Is this an application form or job application page? Look for form fields, \
             submit buttons and application instructions."
                .to_string(),
        ),
        ClaimKind::SpeakerProfile => {
            let who = pair.subject.as_deref().unwrap_or("the person named in the claim");
            Some(format!(
                "Is this page a profile of {}? Look for their name, biography, job title and \
                 photo (LinkedIn, company bio, personal site).",
                who
            ))
        }
        ClaimKind::Event => {
            let mut text = "This should be an event page. Report the event's date and start \
                            time exactly as the page shows them in `event_date` and \
                            `event_time`; do not guess."
                .to_string();
            if let Some(schedule) = &pair.schedule {
                text.push_str(&format!(" The copy gives {}.", schedule.describe()));
            }
            Some(text)
        }
        ClaimKind::Generic if pair.claim.is_empty() => Some(
            "No description accompanies this link. Judge only whether the page loads with \
             real, plausible content."
                .to_string(),
        ),
        ClaimKind::Generic => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::schedule::Schedule;
    use serde_json::json;

    fn response(judgment: Judgment, explanation: &str) -> AnalysisResponse {
        AnalysisResponse {
            judgment,
            explanation: explanation.to_string(),
            page_title: None,
            event_date: None,
            event_time: None,
        }
    }

    fn pair(claim: &str, url: &str) -> ClaimLinkPair {
        ClaimLinkPair {
            claim: claim.to_string(),
            url: url.to_string(),
            position: 0,
            kind: ClaimKind::Generic,
            subject: None,
            schedule: None,
        }
    }

    struct Fixed(Result<AnalysisResponse, String>);

    #[async_trait]
    impl PageAnalyzer for Fixed {
        async fn analyze(&self, _request: &AnalysisRequest) -> Result<AnalysisResponse> {
            self.0.clone().map_err(|e| anyhow::anyhow!(e))
        }
    }

    struct Slow;

    #[async_trait]
    impl PageAnalyzer for Slow {
        async fn analyze(&self, _request: &AnalysisRequest) -> Result<AnalysisResponse> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(response(Judgment::Flag(true), "late"))
        }
    }

    fn verifier(analyzer: impl PageAnalyzer + 'static) -> PageVerifier {
        PageVerifier::new(Arc::new(analyzer), Arc::new(LanguagePolicy))
    }

    #[test]
    fn test_policy_flag_is_authoritative() {
        let p = LanguagePolicy;
        let flagged = response(Judgment::Flag(true), "not a blog, a job form");
        assert_eq!(p.classify(&flagged), Verdict::Aligned);
        let refused = response(Judgment::Flag(false), "matches");
        assert_eq!(p.classify(&refused), Verdict::Questionable);
    }

    #[test]
    fn test_policy_explanation_language() {
        let p = LanguagePolicy;
        let plain = response(Judgment::Absent, "matches description");
        assert_eq!(p.classify(&plain), Verdict::Aligned);
        assert_eq!(
            p.classify(&response(
                Judgment::Absent,
                "this is a generic team directory, not a specific profile"
            )),
            Verdict::Questionable
        );
        assert_eq!(p.classify(&response(Judgment::Absent, "It's a page.")), Verdict::Questionable);
        assert_eq!(
            p.classify(&response(Judgment::Absent, "Probably matches the event")),
            Verdict::Questionable
        );
    }

    #[test]
    fn test_policy_labels() {
        let p = LanguagePolicy;
        let label = |text: &str| p.classify(&response(Judgment::Label(text.into()), ""));
        assert_eq!(label("Aligned"), Verdict::Aligned);
        assert_eq!(label("partial match"), Verdict::Questionable);
        assert_eq!(label("misaligned"), Verdict::Questionable);
    }

    #[test]
    fn test_from_json_variants() {
        let r = AnalysisResponse::from_json(&json!({
            "matches": true,
            "explanation": "Job form",
            "page_title": "Careers"
        }))
        .unwrap();
        assert_eq!(r.judgment, Judgment::Flag(true));
        assert_eq!(r.page_title.as_deref(), Some("Careers"));

        let r =
            AnalysisResponse::from_json(&json!({"verdict": "questionable", "reason": "Old event"}))
                .unwrap();
        assert_eq!(r.judgment, Judgment::Label("questionable".into()));
        assert_eq!(r.explanation, "Old event");

        let r = AnalysisResponse::from_json(&json!({"explanation": "matches"})).unwrap();
        assert_eq!(r.judgment, Judgment::Absent);
    }

    #[test]
    fn test_from_json_rejects_empty() {
        assert!(AnalysisResponse::from_json(&json!({})).is_err());
        assert!(AnalysisResponse::from_json(&json!("matches")).is_err());
        let blank = json!({"matches": null, "explanation": "  "});
        assert!(AnalysisResponse::from_json(&blank).is_err());
    }

    #[tokio::test]
    async fn test_verify_service_error_becomes_failed() {
        let v = verifier(Fixed(Err("connection refused".into())));
        let r = v.verify(pair("Docs", "https://example.com"), Duration::from_secs(1)).await;
        assert_eq!(r.verdict, Verdict::Failed);
        assert_eq!(r.error.as_deref(), Some("connection refused"));
    }

    #[tokio::test]
    async fn test_verify_timeout_becomes_failed() {
        let v = verifier(Slow);
        let r = v.verify(pair("Docs", "https://example.com"), Duration::from_millis(20)).await;
        assert_eq!(r.verdict, Verdict::Failed);
        assert!(r.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_verify_label_used_when_explanation_missing() {
        let v = verifier(Fixed(Ok(response(Judgment::Label("aligned".into()), ""))));
        let r = v.verify(pair("Docs", "https://example.com"), Duration::from_secs(1)).await;
        assert_eq!(r.verdict, Verdict::Aligned);
        assert_eq!(r.explanation, "aligned");
        assert!(r.error.is_none());
    }

    #[test]
    fn test_instructions_name_the_subject() {
        let mut p = pair("Jane Doe", "https://linkedin.com/in/janedoe");
        p.kind = ClaimKind::SpeakerProfile;
        p.subject = Some("Jane Doe".into());
        let req = AnalysisRequest::for_pair(&p);
        assert!(req.instructions.unwrap().contains("Jane Doe"));
    }

    fn event_pair(claim: &str) -> ClaimLinkPair {
        let mut p = pair(claim, "https://lu.ma/openhouse");
        p.kind = ClaimKind::Event;
        p.schedule = Schedule::parse(claim);
        p
    }

    fn event_response(date: &str, time: &str) -> AnalysisResponse {
        let mut r = response(Judgment::Flag(true), "Open house listing");
        r.event_date = Some(date.to_string());
        r.event_time = Some(time.to_string());
        r
    }

    #[tokio::test]
    async fn test_event_schedule_mismatch_is_questionable() {
        let v = verifier(Fixed(Ok(event_response("Tuesday, January 20", "6:00 PM"))));
        let r = v
            .verify(event_pair("Open house Jan 18, 6 PM"), Duration::from_secs(1))
            .await;
        assert_eq!(r.verdict, Verdict::Questionable);
        assert!(r.explanation.contains("jan 18"));
        assert!(r.explanation.contains("January 20"));
        assert!(r.error.is_none());
    }

    #[tokio::test]
    async fn test_event_schedule_match_keeps_verdict() {
        let v = verifier(Fixed(Ok(event_response("Sun, Jan 18, 2026", "6:00 PM EST"))));
        let r = v
            .verify(event_pair("Open house Jan 18, 6 PM"), Duration::from_secs(1))
            .await;
        assert_eq!(r.verdict, Verdict::Aligned);
        assert_eq!(r.explanation, "Open house listing");
    }

    #[test]
    fn test_event_instructions_carry_schedule() {
        let req = AnalysisRequest::for_pair(&event_pair("Open house Jan 18, 6 PM"));
        let text = req.instructions.unwrap();
        assert!(text.contains("event_date"));
        assert!(text.contains("\"jan 18\""));
        assert!(text.contains("\"6 pm\""));
    }

    #[test]
    fn test_from_json_reads_event_fields() {
        let r = AnalysisResponse::from_json(&json!({
            "matches": true,
            "explanation": "Event page",
            "event_date": "January 18",
            "event_time": " "
        }))
        .unwrap();
        assert_eq!(r.event_date.as_deref(), Some("January 18"));
        assert_eq!(r.event_time, None);
    }

    #[test]
    fn test_diagnostic_truncates() {
        let long = "x".repeat(300);
        assert_eq!(diagnostic(&long).chars().count(), 120);
    }
}
