//! Text helpers: char-safe truncation and summary bullet normalization

use crate::utils::constants::{
    BULLET_MIN_CHARS, EXTRACTIVE_MAX_BULLETS, EXTRACTIVE_MIN_WORDS, MAX_SUMMARY_BULLETS,
    SENTENCE_MIN_CHARS,
};

const BULLET: &str = "•";

/// Truncate to at most `max_chars` characters, never splitting a code point
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[inline]
fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Does this line look like a list item (bullet or `1.`..`9.`)?
fn is_list_item(line: &str) -> bool {
    if line.starts_with('•') || line.starts_with('-') || line.starts_with('*') {
        return true;
    }
    let mut chars = line.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some('1'..='9'), Some('.'))
    )
}

/// Split on '.' and keep the first `take` sentences that are long enough.
/// Length is judged on the trimmed sentence; inner whitespace is collapsed after.
fn sentence_bullets(text: &str, take: usize) -> Vec<String> {
    text.split('.')
        .take(take)
        .map(str::trim)
        .filter(|s| char_len(s) > SENTENCE_MIN_CHARS)
        .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
        .map(|s| format!("{} {}", BULLET, s))
        .collect()
}

/// Normalize LLM output into 2-4 `• ` bullets.
///
/// List-looking lines are kept and re-bulleted. When fewer than two survive,
/// the text is re-read as prose and its first sentences become bullets.
pub fn clean_and_format_summary(summary_text: &str) -> String {
    let mut bullets: Vec<String> = summary_text
        .lines()
        .map(str::trim)
        .filter(|line| is_list_item(line))
        .map(|line| {
            line.trim_start_matches(|c: char| {
                c == '•' || c == '-' || c == '*' || c == '.' || c == ' ' || c.is_ascii_digit()
            })
            .trim()
        })
        .filter(|item| char_len(item) > BULLET_MIN_CHARS)
        .map(|item| format!("{} {}", BULLET, item))
        .collect();

    if bullets.len() < 2 {
        bullets = sentence_bullets(&summary_text.replace('\n', " "), MAX_SUMMARY_BULLETS);
    }

    bullets.truncate(MAX_SUMMARY_BULLETS);
    bullets.join("\n")
}

/// Summary from the article's own sentences when every provider failed
pub fn extractive_summary(content: &str, title: &str) -> String {
    if content.split_whitespace().count() < EXTRACTIVE_MIN_WORDS {
        return format!(
            "{b} {}\n{b} Content too short for detailed summary",
            title,
            b = BULLET
        );
    }

    let mut bullets = sentence_bullets(content, EXTRACTIVE_MAX_BULLETS);
    bullets.truncate(EXTRACTIVE_MAX_BULLETS);
    bullets.join("\n")
}
