/// System prompt for the copy review model call.
pub const COPY_REVIEW_SYSTEM: &str =
    "You are an expert copywriter and editor. Respond only with valid JSON.";

/// User prompt for the copy review; `{text}` is replaced with the copy.
pub const COPY_REVIEW_PROMPT: &str = r#"Review the following marketing copy.
Links have already been removed; do not comment on them.

Look for:
1. Spelling errors: typos and misspellings.
2. Grammar issues: incorrect grammar or punctuation.
3. Wording: changes that make the copy clearer, more engaging or more professional.
4. Internal consistency: details that contradict each other, such as a header date range
   that disagrees with the body, a weekday that does not match its date, or times and
   places that differ between sections.

Copy to review:
---
{text}
---

Respond with a JSON object in exactly this shape:
{
  "score": 85,
  "summary": "One or two sentences on overall quality",
  "spelling": [
    {"original": "exact misspelled text", "replacement": "corrected text", "reason": "why"}
  ],
  "grammar": [
    {"original": "exact original text", "replacement": "corrected text", "reason": "why"}
  ],
  "wording": [
    {"original": "exact original phrase", "replacement": "improved phrase", "reason": "why"}
  ],
  "consistency": [
    {"description": "what conflicts", "conflicting": ["first text", "second text"]}
  ]
}

Rules:
- "original" must be copied verbatim from the copy so it can be located.
- Only report real issues, not nitpicks. Emojis and a casual tone are fine for marketing.
- Score from 0 to 100, where 100 is flawless.
- Use empty arrays when there is nothing to report."#;

/// System prompt for judging a fetched page against its claim.
pub const PAGE_JUDGE_SYSTEM: &str = "You check whether web pages match the marketing claims \
that link to them. Respond only with valid JSON.";

/// User prompt for the page judgment. Placeholders: `{url}`, `{claim}`,
/// `{instructions}`, `{title}`, `{content}`.
pub const PAGE_JUDGE_PROMPT: &str = r#"A piece of marketing copy links to {url}.
The text around the link says: "{claim}"
{instructions}

Page title: {title}
Page content (truncated):
---
{content}
---

Does the live page match what the copy claims about it? Focus on the page title and main
heading. Event registration pages with a matching title count as a match even when the body
text is sparse.

If the page lists an event, copy its date and start time exactly as shown; otherwise use null.

Respond with a JSON object:
{"matches": true or false, "explanation": "one sentence", "page_title": "the page's title",
 "event_date": "date as shown or null", "event_time": "start time as shown or null"}"#;
