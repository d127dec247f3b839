//! Plain-text helpers for deriving summaries from stored HTML bodies.

use html_escape::decode_html_entities;

pub const META_DESCRIPTION_LIMIT: usize = 157;
pub const DEFAULT_EXCERPT_WORDS: usize = 30;

const DECODE_PASSES: usize = 3;
const BULLETS: &[char] = &['•', '·', '■', '▪', '◦', '‣', '⁃'];

/// Remove markup, keeping text content. Whitespace runs collapse to one space.
pub fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut last_was_space = false;

    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                if !last_was_space && !text.is_empty() {
                    text.push(' ');
                    last_was_space = true;
                }
            }
            _ if in_tag => {}
            c if c.is_whitespace() => {
                if !last_was_space && !text.is_empty() {
                    text.push(' ');
                }
                last_was_space = true;
            }
            c => {
                text.push(c);
                last_was_space = false;
            }
        }
    }

    text.trim().to_string()
}

/// Decode HTML entities, repeating for double-encoded input.
pub fn decode_entities(text: &str) -> String {
    let mut current = text.to_string();
    for _ in 0..DECODE_PASSES {
        let decoded = decode_html_entities(&current).into_owned();
        if decoded == current {
            break;
        }
        current = decoded;
    }
    current
}

/// Truncate to `limit` characters and mark the cut with `...`.
pub fn truncate_with_ellipsis(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(limit).collect();
    truncated.push_str("...");
    truncated
}

/// Meta description fallback derived from a body: tags removed, capped at
/// 157 characters.
pub fn meta_description_from_body(body: &str) -> String {
    truncate_with_ellipsis(&strip_tags(body), META_DESCRIPTION_LIMIT)
}

/// Word-bounded plain-text excerpt of an HTML body.
pub fn excerpt(body: &str, word_count: usize) -> String {
    let text = decode_entities(&strip_tags(body))
        .replace(['\u{a0}', '\r', '\n', '\t'], " ")
        .replace('\u{200b}', "")
        .replace(BULLETS, "");

    let mut words: Vec<&str> = text.split_whitespace().collect();
    let leading_punctuation = words
        .first()
        .is_some_and(|first| first.chars().all(|c| ".,;:".contains(c)));
    if leading_punctuation {
        words.remove(0);
    }

    if words.len() <= word_count {
        return words.join(" ");
    }

    let mut cut = words[..word_count].join(" ");
    if cut.ends_with(['.', ',', ';', ':']) {
        cut.pop();
    }
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_tags_keeps_text_between_blocks() {
        let text = strip_tags("<p>Hola</p><p>mundo  <b>feliz</b></p>");
        assert_eq!(text, "Hola mundo feliz");
    }

    #[test]
    fn meta_description_truncates_at_157_characters() {
        let body = format!("<p>{}</p>", "a".repeat(200));
        let meta = meta_description_from_body(&body);
        assert_eq!(meta.chars().count(), 160);
        assert!(meta.ends_with("..."));

        assert_eq!(meta_description_from_body("<p>Corto</p>"), "Corto");
    }

    #[test]
    fn excerpt_decodes_entities_and_cuts_words() {
        let body = "<p>Uno &amp;amp; dos tres cuatro.</p>";
        assert_eq!(excerpt(body, 3), "Uno & dos...");
        assert_eq!(excerpt(body, 10), "Uno & dos tres cuatro.");
    }

    #[test]
    fn excerpt_drops_list_bullets() {
        let body = "<ul><li>• Primero</li><li>• Segundo</li></ul>";
        assert_eq!(excerpt(body, 30), "Primero Segundo");
    }
}
