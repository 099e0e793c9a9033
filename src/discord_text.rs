use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Longest chunk sent in one Discord message. Discord allows 2000 characters;
/// the rest is headroom for decorations.
pub const DISCORD_CHUNK_LIMIT: usize = 1900;

static KEY_VALUE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\w+)=([^\s=]+)").unwrap());

/// Splits a long reply into Discord-sized chunks.
///
/// Paragraphs (separated by a blank line) that fit are kept verbatim, one per
/// chunk. Longer paragraphs are wrapped at whitespace, with runs of whitespace
/// collapsing to a single space. Words are never broken unless a single word
/// is longer than `max_len`. Lengths are counted in characters.
///
/// Empty paragraphs produce empty chunks; senders skip them.
pub fn chunk_response(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut chunks = Vec::new();

    for paragraph in text.split("\n\n") {
        if paragraph.chars().count() <= max_len {
            chunks.push(paragraph.to_string());
        } else {
            chunks.extend(wrap_paragraph(paragraph, max_len));
        }
    }

    chunks
}

fn wrap_paragraph(paragraph: &str, max_len: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in paragraph.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_len {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            lines.extend(chars.chunks(max_len).map(|piece| piece.iter().collect::<String>()));
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_len {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Parses `key=value` pairs out of command arguments. Later keys win.
pub fn parse_key_values(text: &str) -> HashMap<String, String> {
    KEY_VALUE
        .captures_iter(text)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect()
}

/// First `max_chars` characters of `text`, with `...` when truncated.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
