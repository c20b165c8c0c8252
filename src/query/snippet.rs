//! Snippet extraction and highlighting
//!
//! Search results quote the first sentence matching the query, with the
//! matched words emphasized in the caller's markup flavor and the whole
//! snippet clipped to a display length.

use regex::Regex;

/// Markup flavor for highlighted snippets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// `**bold**`
    Markdown,

    /// `<b>bold</b>`
    Html,
}

/// Display limit for snippets, in characters
pub const SNIPPET_LIMIT: usize = 300;

/// Clips text to `limit` characters, ellipsizing when it overflows
///
/// Limits count characters, not bytes, so multibyte text clips cleanly.
pub fn trim(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let keep = limit.saturating_sub(3);
    let clipped: String = text.chars().take(keep).collect();
    format!("{}...", clipped)
}

/// Emphasizes every query word in the sentence
///
/// Matching is case-insensitive per word; the replacement wraps
/// whatever the sentence actually contained, preserving its case.
pub fn highlight(sentence: &str, query: &str, style: Style) -> String {
    let mut output = sentence.to_string();

    for word in query.split_whitespace() {
        let pattern = match Regex::new(&format!("(?i){}", regex::escape(word))) {
            Ok(pattern) => pattern,
            Err(_) => continue,
        };

        output = pattern
            .replace_all(&output, |caps: &regex::Captures| match style {
                Style::Markdown => format!("**{}**", &caps[0]),
                Style::Html => format!("<b>{}</b>", &caps[0]),
            })
            .into_owned();
    }

    output.trim().to_string()
}

/// Picks the best sentence for a query and returns it highlighted
///
/// Preference order: the first sentence containing the whole query,
/// then the first sentence containing any query word. Matching is
/// case-insensitive and substring-based.
///
/// # Arguments
///
/// * `text` - Article text to quote from
/// * `query` - The search query
/// * `style` - Markup flavor for the emphasis
///
/// # Returns
///
/// * `Some(snippet)` - Highlighted and clipped to [`SNIPPET_LIMIT`]
/// * `None` - No sentence mentions the query at all
pub fn matching_sentence(text: &str, query: &str, style: Style) -> Option<String> {
    let sentences = split_sentences(text);
    let query_lower = query.to_lowercase();

    if let Some(sentence) = sentences
        .iter()
        .copied()
        .find(|sentence| sentence.to_lowercase().contains(&query_lower))
    {
        return Some(trim(&highlight(sentence, query, style), SNIPPET_LIMIT));
    }

    let words: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();

    sentences
        .iter()
        .copied()
        .find(|sentence| {
            let lower = sentence.to_lowercase();
            words.iter().any(|word| lower.contains(word))
        })
        .map(|sentence| trim(&highlight(sentence, query, style), SNIPPET_LIMIT))
}

/// Splits text into sentences at terminal punctuation
///
/// A boundary is a whitespace run directly after '.', '!' or '?'; the
/// punctuation stays with its sentence.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut prev_terminal = false;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if prev_terminal && ch.is_whitespace() {
            sentences.push(&text[start..idx]);

            let mut next_start = idx + ch.len_utf8();
            while let Some(&(peek_idx, peek_ch)) = chars.peek() {
                if peek_ch.is_whitespace() {
                    chars.next();
                    next_start = peek_idx + peek_ch.len_utf8();
                } else {
                    break;
                }
            }

            start = next_start;
            prev_terminal = false;
            continue;
        }

        prev_terminal = matches!(ch, '.' | '!' | '?');
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
}
