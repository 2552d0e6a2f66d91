use super::schedule::Schedule;
use super::types::{ClaimKind, ClaimLinkPair};

/// Characters that end a URL token outright.
const URL_TERMINATORS: &[char] = &['<', '>', '"', '|', '`', '[', ']'];
/// Punctuation that usually belongs to the sentence, not the URL.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '*', '_'];
/// Separators that split one line into independent claims.
const SEGMENT_DELIMITERS: &[char] = &['|', ';', ',', '•'];

const CLAIM_LEAD_TRIM: &[char] = &['-', '*', '•', '–', '—', '>', ':', '|', ';', ',', ' '];
const CLAIM_TRAIL_TRIM: &[char] = &[':', '-', '–', '—', '|', ';', ',', '(', '[', ' '];

const HONORIFICS: &[&str] = &["Dr.", "Mr.", "Ms.", "Mrs.", "Prof."];
const NAME_TERMINATORS: &[char] = &[':', ',', '(', '-', '–', '—'];
/// Words that introduce a name mid-sentence ("talk by Jane Doe").
const NAME_LEAD_WORDS: &[&str] = &["by", "from", "with", "featuring"];
/// Capitalised words that show up in call-to-action text but never in names.
const NOT_A_NAME: &[&str] = &[
    "apply", "now", "learn", "more", "read", "click", "here", "sign", "up", "register", "join",
    "our", "the", "meet", "check", "out", "visit", "see", "about", "event", "team", "speaker",
    "speakers", "today", "details", "info", "website", "link", "page", "home", "careers", "jobs",
    "watch", "get", "tickets", "rsvp", "save", "date", "free", "new",
];

const SPEAKER_PHRASES: &[&str] = &[
    "speaker",
    "presenter",
    "panelist",
    "keynote",
    "featured guest",
    "meet the",
    "about the author",
    "moderator",
    "host",
];

const APPLICATION_PHRASES: &[&str] = &[
    "apply now",
    "apply here",
    "apply today",
    "applications are open",
    "applications open",
    "applications due",
    "applications close",
    "submit your application",
    "submit an application",
    "join our team",
    "join the team",
    "we're hiring",
    "we are hiring",
    "careers page",
    "career opportunit",
    "job posting",
    "job opening",
    "job listing",
];

const PROFILE_PHRASES: &[&str] = &["bio", "profile", "about me"];

/// URL fragments of event listing sites and event landing pages.
const EVENT_URL_MARKERS: &[&str] = &[
    "lu.ma/",
    "luma.com/",
    "eventbrite.",
    "meetup.com/",
    "event",
    "kickoff",
    "open-house",
];

/// Links and their claims, plus the prose left once links are removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub pairs: Vec<ClaimLinkPair>,
    pub remainder: String,
}

/// A URL found in the text. `start..end` is the span removed from the
/// prose (wrapper included) and `label` is what replaces it.
#[derive(Debug, Clone)]
struct Link {
    url: String,
    start: usize,
    end: usize,
    label: String,
}

/// Split a message into `(claim, url)` pairs and the link-free remainder.
///
/// Never fails: text that does not parse as a link is treated as prose.
pub fn extract(text: &str) -> Extraction {
    let links = find_links(text);
    if links.is_empty() {
        return Extraction {
            pairs: Vec::new(),
            remainder: text.to_string(),
        };
    }

    let mut pairs = Vec::with_capacity(links.len());
    let mut i = 0;
    while i < links.len() {
        let (line_start, line_end) = line_bounds(text, links[i].start, links[i].end);
        let mut j = i + 1;
        while j < links.len() && links[j].start < line_end {
            j += 1;
        }
        let line_links = &links[i..j];

        for (seg_start, seg_end, seg_links) in segments(text, line_start, line_end, line_links) {
            let mut claim = clean_claim(&render_span(text, seg_start, seg_end, seg_links));
            if claim.is_empty() && line_links.len() == 1 {
                claim = lead_in_claim(text, line_start, &links).unwrap_or_default();
            }
            for link in seg_links {
                let (kind, subject) = classify(&claim, &link.url);
                let schedule = match kind {
                    ClaimKind::Event => Schedule::parse(&claim),
                    _ => None,
                };
                pairs.push(ClaimLinkPair {
                    claim: claim.clone(),
                    url: link.url.clone(),
                    position: pairs.len(),
                    kind,
                    subject,
                    schedule,
                });
            }
        }
        i = j;
    }

    Extraction {
        pairs,
        remainder: elide_links(text, &links),
    }
}

fn find_links(text: &str) -> Vec<Link> {
    let lower = text.to_ascii_lowercase();
    let mut links: Vec<Link> = Vec::new();
    let mut cursor = 0;

    while let Some(found) = lower[cursor..].find("http") {
        let start = cursor + found;
        let rest = &lower[start..];
        let scheme_len = if rest.starts_with("https://") {
            8
        } else if rest.starts_with("http://") {
            7
        } else {
            cursor = start + 4;
            continue;
        };

        // "xhttp://" is not a link
        if text[..start]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric())
        {
            cursor = start + scheme_len;
            continue;
        }

        let host_start = start + scheme_len;
        let raw_end = text[host_start..]
            .find(|c: char| c.is_whitespace() || URL_TERMINATORS.contains(&c))
            .map(|i| host_start + i)
            .unwrap_or(text.len());
        let end = start + trim_url(&text[start..raw_end]).len();

        let has_host = end > host_start
            && text[host_start..end]
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric());
        if !has_host {
            cursor = host_start;
            continue;
        }

        let mut link = wrap(text, start, end);
        // A markdown link whose label holds URLs swallows those earlier matches.
        while links.last().is_some_and(|prev| link.start < prev.end) {
            links.pop();
            link.label.clear();
        }
        cursor = link.end;
        links.push(link);
    }

    links
}

fn trim_url(url: &str) -> &str {
    let mut url = url;
    while let Some(last) = url.chars().next_back() {
        let unbalanced = match last {
            ')' => url.matches('(').count() < url.matches(')').count(),
            _ => false,
        };
        if TRAILING_PUNCTUATION.contains(&last) || unbalanced {
            url = &url[..url.len() - last.len_utf8()];
        } else {
            break;
        }
    }
    url
}

/// Widen a bare URL span to cover chat wrappers: `<url>`, `<url|label>`, `[label](url)`.
fn wrap(text: &str, start: usize, end: usize) -> Link {
    let url = text[start..end].to_string();
    let before = &text[..start];
    let after = &text[end..];

    if before.ends_with('<') {
        if after.starts_with('>') {
            return Link {
                url,
                start: start - 1,
                end: end + 1,
                label: String::new(),
            };
        }
        if let Some(rest) = after.strip_prefix('|') {
            if let Some(close) = rest.find('>') {
                let label = &rest[..close];
                if !label.contains('\n') {
                    return Link {
                        url,
                        start: start - 1,
                        end: end + 1 + close + 1,
                        label: label.to_string(),
                    };
                }
            }
        }
    }

    if before.ends_with("](") && after.starts_with(')') {
        let head = &before[..before.len() - 2];
        if let Some(open) = head.rfind('[') {
            let label = &head[open + 1..];
            if !label.contains('\n') {
                return Link {
                    url,
                    start: open,
                    end: end + 1,
                    label: label.to_string(),
                };
            }
        }
    }

    Link {
        url,
        start,
        end,
        label: String::new(),
    }
}

fn line_bounds(text: &str, start: usize, end: usize) -> (usize, usize) {
    let line_start = text[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = text[end..]
        .find('\n')
        .map(|i| end + i)
        .unwrap_or(text.len());
    (line_start, line_end)
}

/// Split a line's links into groups separated by a delimiter. Links with
/// no delimiter between them share one segment and therefore one claim.
fn segments<'a>(
    text: &str,
    line_start: usize,
    line_end: usize,
    links: &'a [Link],
) -> Vec<(usize, usize, &'a [Link])> {
    let mut out = Vec::new();
    let mut seg_start = line_start;
    let mut first = 0;

    for i in 0..links.len().saturating_sub(1) {
        let gap_start = links[i].end;
        let between = &text[gap_start..links[i + 1].start];
        if let Some(offset) = between.find(SEGMENT_DELIMITERS) {
            let boundary = gap_start + offset;
            out.push((seg_start, boundary, &links[first..=i]));
            let delim_len = between[offset..].chars().next().map_or(1, char::len_utf8);
            seg_start = boundary + delim_len;
            first = i + 1;
        }
    }
    out.push((seg_start, line_end, &links[first..]));
    out
}

/// The span's text with every link replaced by its label.
fn render_span(text: &str, start: usize, end: usize, links: &[Link]) -> String {
    let mut out = String::new();
    let mut cursor = start;
    for link in links {
        out.push_str(&text[cursor..link.start]);
        out.push(' ');
        out.push_str(&link.label);
        out.push(' ');
        cursor = link.end;
    }
    out.push_str(&text[cursor..end]);
    out
}

fn clean_claim(raw: &str) -> String {
    let collapsed = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace("()", "")
        .replace("[]", "")
        .replace("<>", "");
    let tightened = [".", ",", "!", "?", ";"]
        .iter()
        .fold(collapsed, |acc, p| acc.replace(&format!(" {}", p), p));
    let trimmed = strip_list_marker(tightened.trim_matches(' '))
        .trim_start_matches(CLAIM_LEAD_TRIM)
        .trim_end_matches(CLAIM_TRAIL_TRIM);
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drop a leading "1." / "2)" list number.
fn strip_list_marker(s: &str) -> &str {
    let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return s;
    }
    let rest = &s[digits..];
    match rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
        Some(after) if after.starts_with(' ') => after,
        _ => s,
    }
}

/// A bare URL on its own line takes its claim from a preceding "Apply here:" line.
fn lead_in_claim(text: &str, line_start: usize, links: &[Link]) -> Option<String> {
    let before = text[..line_start].trim_end_matches('\n');
    let prev_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let prev = before[prev_start..].trim();
    let has_link = links
        .iter()
        .any(|l| l.start >= prev_start && l.start < before.len());
    if prev.is_empty() || has_link || !prev.ends_with(':') {
        return None;
    }
    Some(clean_claim(prev)).filter(|c| !c.is_empty())
}

fn elide_links(text: &str, links: &[Link]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for link in links {
        out.push_str(&text[cursor..link.start]);
        out.push_str(&link.label);
        cursor = link.end;
    }
    out.push_str(&text[cursor..]);
    out.lines().map(str::trim_end).collect::<Vec<_>>().join("\n")
}

fn host(url: &str) -> String {
    let after_scheme = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    let end = after_scheme
        .find(|c: char| matches!(c, '/' | '?' | '#'))
        .unwrap_or(after_scheme.len());
    let host = after_scheme[..end].to_ascii_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}

/// Guess what kind of page the claim promises and, for profiles, whose.
fn classify(claim: &str, url: &str) -> (ClaimKind, Option<String>) {
    let url_lower = url.to_ascii_lowercase();
    let claim_lower = claim.to_lowercase().replace('’', "'");
    let host = host(url);

    if url_lower.contains("linkedin.com/in/") || host == "twitter.com" || host == "x.com" {
        return (ClaimKind::SpeakerProfile, person_name(claim));
    }
    if ["/apply", "/application", "/careers"]
        .iter()
        .any(|p| url_lower.contains(p))
    {
        return (ClaimKind::Application, None);
    }
    if SPEAKER_PHRASES.iter().any(|p| claim_lower.contains(p)) {
        return (ClaimKind::SpeakerProfile, person_name(claim));
    }
    if let Some(name) = name_run(&claim.split_whitespace().collect::<Vec<_>>(), false) {
        return (ClaimKind::SpeakerProfile, Some(name));
    }
    if APPLICATION_PHRASES.iter().any(|p| claim_lower.contains(p)) {
        return (ClaimKind::Application, None);
    }
    if PROFILE_PHRASES.iter().any(|p| claim_lower.contains(p)) {
        if let Some(name) = person_name(claim) {
            return (ClaimKind::SpeakerProfile, Some(name));
        }
    }
    if EVENT_URL_MARKERS.iter().any(|m| url_lower.contains(m)) || Schedule::parse(claim).is_some() {
        return (ClaimKind::Event, None);
    }
    (ClaimKind::Generic, None)
}

fn person_name(claim: &str) -> Option<String> {
    let words: Vec<&str> = claim.split_whitespace().collect();
    (0..words.len()).find_map(|i| {
        let after_lead = i > 0 && NAME_LEAD_WORDS.contains(&words[i - 1].to_lowercase().as_str());
        name_run(&words[i..], after_lead)
    })
}

/// Two to four capitalised words at the start of `words`, ending at a
/// separator or the end of the claim (or anywhere, if `open_ended`).
fn name_run(words: &[&str], open_ended: bool) -> Option<String> {
    let skip = usize::from(words.first().is_some_and(|w| HONORIFICS.contains(w)));
    let mut parts: Vec<&str> = Vec::new();
    let mut at_boundary = true;

    for word in &words[skip..] {
        let cut = word.find(NAME_TERMINATORS).unwrap_or(word.len());
        let core = &word[..cut];
        if core.is_empty() || !is_name_word(core) {
            at_boundary = core.is_empty();
            break;
        }
        parts.push(core);
        if cut < word.len() {
            break;
        }
    }

    if !(2..=4).contains(&parts.len()) || !(at_boundary || open_ended) {
        return None;
    }
    if parts
        .iter()
        .any(|p| NOT_A_NAME.contains(&p.to_lowercase().as_str()))
    {
        return None;
    }
    Some(parts.join(" "))
}

fn is_name_word(word: &str) -> bool {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let rest: Vec<char> = chars.collect();
    first.is_uppercase()
        && !rest.is_empty()
        && rest.iter().any(|c| c.is_lowercase())
        && rest
            .iter()
            .all(|c| c.is_alphabetic() || *c == '\'' || *c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_urls() {
        let text = "Big news!\nOur summit is back this spring.";
        let out = extract(text);
        assert!(out.pairs.is_empty());
        assert_eq!(out.remainder, text);
    }

    #[test]
    fn test_apply_now() {
        let out = extract("Apply now: https://careers.example.com/apply");
        assert_eq!(out.pairs.len(), 1);
        let pair = &out.pairs[0];
        assert_eq!(pair.claim, "Apply now");
        assert_eq!(pair.url, "https://careers.example.com/apply");
        assert_eq!(pair.position, 0);
        assert_eq!(pair.kind, ClaimKind::Application);
        assert_eq!(out.remainder, "Apply now:");
    }

    #[test]
    fn test_speaker_lines() {
        let out = extract(
            "Jane Doe: https://linkedin.com/in/janedoe\nJohn Smith: https://example.com/team/john",
        );
        assert_eq!(out.pairs.len(), 2);
        assert_eq!(out.pairs[0].claim, "Jane Doe");
        assert_eq!(out.pairs[0].kind, ClaimKind::SpeakerProfile);
        assert_eq!(out.pairs[0].subject.as_deref(), Some("Jane Doe"));
        assert_eq!(out.pairs[1].claim, "John Smith");
        assert_eq!(out.pairs[1].subject.as_deref(), Some("John Smith"));
        assert_eq!(out.pairs[1].position, 1);
    }

    #[test]
    fn test_bulleted_speaker_with_title() {
        let out = extract("Meet our speakers:\n- Dr. Jane Smith (Keynote): https://janesmith.dev");
        assert_eq!(out.pairs.len(), 1);
        assert_eq!(out.pairs[0].claim, "Dr. Jane Smith (Keynote)");
        assert_eq!(out.pairs[0].kind, ClaimKind::SpeakerProfile);
        assert_eq!(out.pairs[0].subject.as_deref(), Some("Jane Smith"));
    }

    #[test]
    fn test_trailing_punctuation_trimmed() {
        let out = extract("Read the recap at https://example.com/recap.");
        assert_eq!(out.pairs[0].url, "https://example.com/recap");
        assert_eq!(out.pairs[0].claim, "Read the recap at.");
    }

    #[test]
    fn test_balanced_parens_kept() {
        let out = extract("Background (see https://en.wikipedia.org/wiki/Rust_(language))");
        assert_eq!(out.pairs[0].url, "https://en.wikipedia.org/wiki/Rust_(language)");
    }

    #[test]
    fn test_shared_claim_without_delimiter() {
        let out = extract("Slides and recording: https://a.example.com and https://b.example.com");
        assert_eq!(out.pairs.len(), 2);
        assert_eq!(out.pairs[0].claim, out.pairs[1].claim);
        assert_eq!(out.pairs[0].claim, "Slides and recording: and");
    }

    #[test]
    fn test_delimiter_splits_claims() {
        let out = extract("Register: https://a.example.com/reg | Agenda: https://a.example.com/x");
        assert_eq!(out.pairs.len(), 2);
        assert_eq!(out.pairs[0].claim, "Register");
        assert_eq!(out.pairs[1].claim, "Agenda");
        assert_eq!(out.pairs[1].position, 1);
    }

    #[test]
    fn test_comma_splits_claims() {
        let out = extract("Docs https://docs.example.com, slides https://slides.example.com");
        assert_eq!(out.pairs.len(), 2);
        assert_eq!(out.pairs[0].claim, "Docs");
        assert_eq!(out.pairs[1].claim, "slides");
    }

    #[test]
    fn test_bare_url_has_empty_claim() {
        let out = extract("https://example.com");
        assert_eq!(out.pairs.len(), 1);
        assert_eq!(out.pairs[0].claim, "");
        assert_eq!(out.pairs[0].kind, ClaimKind::Generic);
        assert_eq!(out.remainder, "");
    }

    #[test]
    fn test_lead_in_line_supplies_claim() {
        let out = extract("Apply to join our team:\nhttps://example.com/jobs");
        assert_eq!(out.pairs[0].claim, "Apply to join our team");
        assert_eq!(out.pairs[0].kind, ClaimKind::Application);
    }

    #[test]
    fn test_angle_and_slack_wrappers() {
        let out = extract("Tickets <https://lu.ma/summit> or <https://lu.ma/vip|VIP passes>");
        assert_eq!(out.pairs.len(), 2);
        assert_eq!(out.pairs[0].url, "https://lu.ma/summit");
        assert_eq!(out.pairs[1].url, "https://lu.ma/vip");
        assert_eq!(out.remainder, "Tickets  or VIP passes");
    }

    #[test]
    fn test_markdown_link_keeps_label() {
        let out = extract("Save your seat: [RSVP here](https://lu.ma/summit)!");
        assert_eq!(out.pairs.len(), 1);
        assert_eq!(out.pairs[0].url, "https://lu.ma/summit");
        assert_eq!(out.pairs[0].claim, "Save your seat: RSVP here!");
        assert_eq!(out.remainder, "Save your seat: RSVP here!");
    }

    #[test]
    fn test_markdown_label_with_several_urls() {
        let out = extract("[https://a.com https://c.com](https://b.com)");
        assert_eq!(out.pairs.len(), 1);
        assert_eq!(out.pairs[0].url, "https://b.com");
        assert_eq!(out.remainder, "");

        let out = extract("See https://x.com [https://a.com https://c.com](https://b.com)");
        let urls: Vec<_> = out.pairs.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["https://x.com", "https://b.com"]);
        assert_eq!(out.pairs[1].position, 1);
        assert_eq!(out.remainder, "See");
    }

    #[test]
    fn test_event_claim_carries_schedule() {
        let out = extract("Open house Jan 18, 6-8 PM: https://lu.ma/openhouse");
        assert_eq!(out.pairs[0].kind, ClaimKind::Event);
        let schedule = out.pairs[0].schedule.as_ref().unwrap();
        assert_eq!(schedule.date.as_ref().map(|d| d.day), Some(18));
        assert_eq!(schedule.time.as_ref().map(|t| t.start_hour), Some(18));

        let out = extract("RSVP: https://www.eventbrite.com/e/summit-123");
        assert_eq!(out.pairs[0].kind, ClaimKind::Event);
        assert_eq!(out.pairs[0].schedule, None);

        let out = extract("Docs: https://docs.example.com/guide");
        assert_eq!(out.pairs[0].kind, ClaimKind::Generic);
        assert_eq!(out.pairs[0].schedule, None);
    }

    #[test]
    fn test_malformed_scheme_is_prose() {
        let text = "Visit https:// soon or xhttp://nope.example";
        let out = extract(text);
        assert!(out.pairs.is_empty());
        assert_eq!(out.remainder, text);
    }

    #[test]
    fn test_call_to_action_is_not_a_name() {
        let out = extract("Learn More: https://example.com/about");
        assert_eq!(out.pairs[0].kind, ClaimKind::Generic);
        assert_eq!(out.pairs[0].subject, None);
    }

    #[test]
    fn test_x_profile_host() {
        let (kind, _) = classify("", "https://x.com/sarahjtech");
        assert_eq!(kind, ClaimKind::SpeakerProfile);
        let (kind, _) = classify("", "https://dropbox.com/s/abc");
        assert_eq!(kind, ClaimKind::Generic);
    }

    #[test]
    fn test_name_after_lead_word() {
        assert_eq!(
            person_name("A fireside chat with Ada Lovelace and friends"),
            Some("Ada Lovelace".to_string())
        );
    }
}
