//! Event dates and start times mentioned in copy, compared with what an
//! event page shows.

use serde::{Deserialize, Serialize};

const MONTHS: &[&str] = &[
    "january", "jan", "february", "feb", "march", "mar", "april", "apr", "may", "june", "jun",
    "july", "jul", "august", "aug", "september", "sept", "sep", "october", "oct", "november",
    "nov", "december", "dec",
];

const DAY_SUFFIXES: &[&str] = &["", "st", "nd", "rd", "th"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateMention {
    /// As written, lowercased ("jan 18th").
    pub text: String,
    pub day: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeMention {
    pub text: String,
    /// 0-23.
    pub start_hour: u32,
}

/// When the copy says an event happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub date: Option<DateMention>,
    pub time: Option<TimeMention>,
}

impl Schedule {
    /// The first date and first start time in `text`, if either is present.
    pub fn parse(text: &str) -> Option<Self> {
        let date = find_date(text);
        let time = find_time(text);
        if date.is_none() && time.is_none() {
            return None;
        }
        Some(Self { date, time })
    }

    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(date) = &self.date {
            parts.push(format!("date \"{}\"", date.text));
        }
        if let Some(time) = &self.time {
            parts.push(format!("start time \"{}\"", time.text));
        }
        parts.join(" and ")
    }

    /// Describe where the page disagrees with the copy. Only a different
    /// day of the month or a different start hour counts; anything on the
    /// page that cannot be read is not a mismatch.
    pub fn mismatch(&self, page_date: Option<&str>, page_time: Option<&str>) -> Option<String> {
        let mut details = Vec::new();

        if let (Some(ours), Some(shown)) = (&self.date, page_date) {
            if find_date(shown).is_some_and(|theirs| theirs.day != ours.day) {
                details.push(format!(
                    "copy says {} but the page shows {}",
                    ours.text,
                    shown.trim()
                ));
            }
        }
        if let (Some(ours), Some(shown)) = (&self.time, page_time) {
            if find_time(shown).is_some_and(|theirs| theirs.start_hour != ours.start_hour) {
                details.push(format!(
                    "copy says {} but the page shows {}",
                    ours.text,
                    shown.trim()
                ));
            }
        }

        (!details.is_empty()).then(|| format!("Schedule mismatch: {}", details.join("; ")))
    }
}

fn find_date(text: &str) -> Option<DateMention> {
    let lower = text.to_lowercase();
    let tokens: Vec<&str> = lower
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | '(' | ')'))
        .filter(|t| !t.is_empty())
        .collect();

    for (i, token) in tokens.iter().enumerate() {
        let next = tokens.get(i + 1).copied();
        if is_month(token) {
            if let Some(day) = next.and_then(day_number) {
                return Some(DateMention {
                    text: format!("{} {}", token, next.unwrap_or_default()),
                    day,
                });
            }
        }
        if let Some(day) = day_number(token).filter(|_| next.is_some_and(is_month)) {
            return Some(DateMention {
                text: format!("{} {}", token, next.unwrap_or_default()),
                day,
            });
        }
        if let Some(day) = numeric_date(token) {
            return Some(DateMention {
                text: token.to_string(),
                day,
            });
        }
    }
    None
}

fn is_month(token: &str) -> bool {
    MONTHS.contains(&token.trim_end_matches('.'))
}

/// "18", "18th", "5-7" (a day range starts on its first day).
fn day_number(token: &str) -> Option<u32> {
    let digits = token.chars().take_while(char::is_ascii_digit).count();
    if !(1..=2).contains(&digits) {
        return None;
    }
    let suffix = token[digits..].trim_end_matches('.');
    let ranged = suffix.starts_with('-') || suffix.starts_with('–');
    if !ranged && !DAY_SUFFIXES.contains(&suffix) {
        return None;
    }
    token[..digits].parse().ok().filter(|d| (1..=31).contains(d))
}

/// "1/18", "1/18/2026", "01-18-2026" (month first) or "2026-01-18".
fn numeric_date(token: &str) -> Option<u32> {
    let token = token.trim_end_matches('.');
    let slashed = token.contains('/');
    let parts: Vec<&str> = token.split(['/', '-']).collect();
    if parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    let (month, day) = match parts.as_slice() {
        [y, m, d] if y.len() == 4 => (m, d),
        [m, d, y] if m.len() <= 2 && d.len() <= 2 && matches!(y.len(), 2 | 4) => (m, d),
        [m, d] if slashed && m.len() <= 2 && d.len() <= 2 => (m, d),
        _ => return None,
    };
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    ((1..=12).contains(&month) && (1..=31).contains(&day)).then_some(day)
}

fn find_time(text: &str) -> Option<TimeMention> {
    let chars: Vec<char> = text.to_lowercase().chars().collect();
    (0..chars.len())
        .filter(|&i| chars[i].is_ascii_digit() && (i == 0 || !chars[i - 1].is_alphanumeric()))
        .find_map(|i| {
            let (start_hour, end) = time_at(&chars, i)?;
            let text: String = chars[i..end].iter().collect();
            Some(TimeMention {
                text: text.trim().to_string(),
                start_hour,
            })
        })
}

/// A clock reading at `start`: "6pm", "6:30 p.m.", "5-7 pm", "18:00".
/// Returns the 24h start hour and the index just past the reading.
fn time_at(chars: &[char], start: usize) -> Option<(u32, usize)> {
    let (hour, has_minutes, end) = clock(chars, start)?;
    let next = skip_spaces(chars, end);

    if let Some((pm, after)) = meridiem(chars, next) {
        return Some((to_24h(hour, pm)?, after));
    }

    if matches!(chars.get(next), Some('-' | '–')) {
        let (until, _, range_end) = clock(chars, skip_spaces(chars, next + 1))?;
        let (pm, after) = meridiem(chars, skip_spaces(chars, range_end))?;
        // "11-1 pm" starts in the morning
        let start_pm = if pm && hour > until && hour != 12 { false } else { pm };
        return Some((to_24h(hour, start_pm)?, after));
    }

    (has_minutes && hour <= 23).then_some((hour, end))
}

fn clock(chars: &[char], start: usize) -> Option<(u32, bool, usize)> {
    let (hour, mut end) = two_digits(chars, start)?;
    let mut has_minutes = false;
    if chars.get(end) == Some(&':') {
        if let Some((minutes, after)) = two_digits(chars, end + 1) {
            if after == end + 3 && minutes < 60 {
                has_minutes = true;
                end = after;
            }
        }
    }
    Some((hour, has_minutes, end))
}

/// One or two digits not followed by a third.
fn two_digits(chars: &[char], start: usize) -> Option<(u32, usize)> {
    let len = chars[start..]
        .iter()
        .take_while(|c| c.is_ascii_digit())
        .count();
    if !(1..=2).contains(&len) {
        return None;
    }
    let value = chars[start..start + len]
        .iter()
        .filter_map(|c| c.to_digit(10))
        .fold(0, |acc, d| acc * 10 + d);
    Some((value, start + len))
}

fn skip_spaces(chars: &[char], mut i: usize) -> usize {
    while chars.get(i).is_some_and(|c| *c == ' ') {
        i += 1;
    }
    i
}

fn meridiem(chars: &[char], start: usize) -> Option<(bool, usize)> {
    for (form, pm) in [("a.m.", false), ("p.m.", true), ("am", false), ("pm", true)] {
        let len = form.chars().count();
        let matches = chars.len() >= start + len
            && chars[start..start + len].iter().copied().eq(form.chars());
        if matches && !chars.get(start + len).is_some_and(|c| c.is_alphabetic()) {
            return Some((pm, start + len));
        }
    }
    None
}

fn to_24h(hour: u32, pm: bool) -> Option<u32> {
    match (hour, pm) {
        (1..=11, false) => Some(hour),
        (12, false) => Some(0),
        (1..=11, true) => Some(hour + 12),
        (12, true) => Some(12),
        _ => None,
    }
}
