//! Discord markdown for review reports.

use crate::review::types::{
    ClaimKind, CopyReview, Report, SuggestionCategory, Verdict, VerificationResult,
};

/// Discord rejects messages over 2000 characters; leave some headroom.
pub const MAX_CHUNK: usize = 1990;

pub const WORKING: &str =
    "🔍 Reviewing your copy and checking its links... this can take a minute.";

pub const USAGE: &str = "Mention me with the copy you want reviewed, or use `/copybot review`. \
I'll check that every link matches the text around it and suggest copy edits.";

pub fn render_report(report: &Report) -> String {
    let mut out = String::new();

    let tally = report.tally();
    if report.results.is_empty() {
        out.push_str("**📋 Link check**: no links found.\n");
    } else {
        let mut parts = Vec::new();
        if tally.aligned > 0 {
            parts.push(format!("✅ {} aligned", tally.aligned));
        }
        if tally.questionable > 0 {
            parts.push(format!("⚠️ {} need review", tally.questionable));
        }
        if tally.failed > 0 {
            parts.push(format!("❌ {} could not be checked", tally.failed));
        }
        out.push_str(&format!(
            "**📋 Link check**: {} link(s), {}\n\n",
            report.results.len(),
            parts.join(", ")
        ));
        for (i, result) in report.results.iter().enumerate() {
            out.push_str(&render_result(i + 1, result));
        }
    }

    out.push('\n');
    match &report.copy_review {
        Some(review) => out.push_str(&render_copy_review(review)),
        None => out.push_str("**✍️ Copy review**: unavailable.\n"),
    }

    out
}

fn render_result(index: usize, result: &VerificationResult) -> String {
    let (emoji, status) = match result.verdict {
        Verdict::Aligned => ("✅", "Aligned"),
        Verdict::Questionable => ("⚠️", "Needs review"),
        Verdict::Failed => ("❌", "Failed"),
    };
    let check = match result.pair.kind {
        ClaimKind::Application => "application page",
        ClaimKind::SpeakerProfile => "speaker profile",
        ClaimKind::Event => "event details",
        ClaimKind::Generic => "content",
    };

    let mut line = format!("**{}.** <{}> ({})\n", index, result.pair.url, check);
    if !result.pair.claim.is_empty() {
        line.push_str(&format!("> {}\n", ellipsize(&result.pair.claim, 120)));
    }
    line.push_str(&format!("{} **{}**: {}\n", emoji, status, result.explanation));
    let title = result
        .page_title
        .as_deref()
        .filter(|_| result.verdict != Verdict::Failed);
    if let Some(title) = title {
        line.push_str(&format!("_Page: \"{}\"_\n", title));
    }
    line
}

fn render_copy_review(review: &CopyReview) -> String {
    let badge = match review.score {
        90..=100 => "🌟",
        70..=89 => "👍",
        50..=69 => "⚠️",
        _ => "❌",
    };
    let mut out = format!("**✍️ Copy review**: {} **{}/100**\n", badge, review.score);
    if !review.summary.is_empty() {
        out.push_str(&review.summary);
        out.push('\n');
    }

    if !review.suggestions.is_empty() {
        out.push_str("\n**Suggestions**\n");
        for s in &review.suggestions {
            let category = match s.category {
                SuggestionCategory::Spelling => "spelling",
                SuggestionCategory::Grammar => "grammar",
                SuggestionCategory::Wording => "wording",
            };
            out.push_str(&format!(
                "• \"{}\" → \"{}\" ({})",
                s.original, s.replacement, category
            ));
            if !s.reason.is_empty() {
                out.push_str(&format!(": {}", s.reason));
            }
            out.push('\n');
        }
    }

    if !review.consistency.is_empty() {
        out.push_str("\n**Consistency**\n");
        for issue in &review.consistency {
            out.push_str(&format!("• {}", issue.description));
            if !issue.conflicting.is_empty() {
                let quoted: Vec<String> = issue
                    .conflicting
                    .iter()
                    .map(|c| format!("\"{}\"", c))
                    .collect();
                out.push_str(&format!(" ({})", quoted.join(" vs ")));
            }
            out.push('\n');
        }
    }
    out
}

fn ellipsize(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars - 3).collect();
    out.push_str("...");
    out
}

/// Split `text` into Discord-sized pieces, preferring line then word breaks.
pub fn chunk(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut remaining = text;
    while !remaining.is_empty() {
        if remaining.len() <= MAX_CHUNK {
            chunks.push(remaining.to_string());
            break;
        }
        let mut limit = MAX_CHUNK;
        while !remaining.is_char_boundary(limit) {
            limit -= 1;
        }
        let split_at = remaining[..limit]
            .rfind('\n')
            .or_else(|| remaining[..limit].rfind(' '))
            .map(|i| i + 1)
            .unwrap_or(limit);
        chunks.push(remaining[..split_at].to_string());
        remaining = &remaining[split_at..];
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::types::{ClaimLinkPair, ConsistencyIssue, Suggestion};

    fn result(position: usize, verdict: Verdict, explanation: &str) -> VerificationResult {
        VerificationResult {
            pair: ClaimLinkPair {
                claim: "Apply now".into(),
                url: format!("https://example.com/{}", position),
                position,
                kind: ClaimKind::Application,
                subject: None,
                schedule: None,
            },
            verdict,
            explanation: explanation.into(),
            page_title: Some("Careers".into()),
            error: None,
        }
    }

    fn report(results: Vec<VerificationResult>, copy_review: Option<CopyReview>) -> Report {
        let pairs: Vec<_> = results.iter().map(|r| r.pair.clone()).collect();
        Report::assemble(&pairs, results, copy_review)
    }

    #[test]
    fn test_render_links_in_order() {
        let r = report(
            vec![
                result(0, Verdict::Aligned, "Job form"),
                result(1, Verdict::Questionable, "Generic directory"),
            ],
            None,
        );
        let text = render_report(&r);
        assert!(text.contains("2 link(s), ✅ 1 aligned, ⚠️ 1 need review"));
        let first = text.find("<https://example.com/0>").unwrap();
        let second = text.find("<https://example.com/1>").unwrap();
        assert!(first < second);
        assert!(text.contains("**Aligned**: Job form"));
        assert!(text.contains("_Page: \"Careers\"_"));
        assert!(text.contains("Copy review**: unavailable"));
    }

    #[test]
    fn test_render_copy_review() {
        let review = CopyReview {
            score: 72,
            summary: "Mostly fine.".into(),
            suggestions: vec![Suggestion {
                original: "anual".into(),
                replacement: "annual".into(),
                reason: "typo".into(),
                category: SuggestionCategory::Spelling,
            }],
            consistency: vec![ConsistencyIssue {
                description: "Weekday does not match date".into(),
                conflicting: vec!["Saturday".into(), "Jan 29".into()],
            }],
        };
        let text = render_report(&report(vec![], Some(review)));
        assert!(text.contains("no links found"));
        assert!(text.contains("👍 **72/100**"));
        assert!(text.contains("• \"anual\" → \"annual\" (spelling): typo"));
        assert!(text.contains("(\"Saturday\" vs \"Jan 29\")"));
    }

    #[test]
    fn test_failed_hides_page_title() {
        let mut failed = result(0, Verdict::Failed, "Could not verify: timed out");
        failed.error = Some("timed out".into());
        let text = render_report(&report(vec![failed], None));
        assert!(text.contains("❌ could not be checked"));
        assert!(!text.contains("_Page:"));
    }

    #[test]
    fn test_chunk_respects_limit_and_lines() {
        let line = "é".repeat(50) + "\n";
        let text = line.repeat(60);
        let chunks = chunk(&text);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.len() <= MAX_CHUNK));
        assert!(chunks[..chunks.len() - 1].iter().all(|c| c.ends_with('\n')));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_chunk_short_and_empty() {
        assert_eq!(chunk("hi"), vec!["hi".to_string()]);
        assert!(chunk("").is_empty());
    }
}
