//! Handling of `<think>` reasoning blocks emitted by reasoning models.

use regex::Regex;
use std::sync::LazyLock;

static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>(.*?)</think>").unwrap());

/// Strips reasoning blocks, or with `show_thoughts` renders them as a quoted
/// "Thoughts" section ahead of the answer.
pub fn render(text: &str, show_thoughts: bool) -> String {
    let answer = THINK_BLOCK.replace_all(text, "").trim().to_string();
    if !show_thoughts {
        return answer;
    }

    let thoughts: Vec<&str> = THINK_BLOCK
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|t| !t.is_empty())
        .collect();
    if thoughts.is_empty() {
        return answer;
    }

    let quoted = thoughts
        .join("\n\n")
        .lines()
        .map(|line| format!("> {}", line))
        .collect::<Vec<_>>()
        .join("\n");
    format!("**Thoughts**\n{}\n\n{}", quoted, answer)
}

/// Wraps separately delivered reasoning in `<think>` tags so it renders the
/// same way as inline reasoning.
pub fn wrap(thinking: Option<&str>, answer: &str) -> String {
    match thinking.map(str::trim).filter(|t| !t.is_empty()) {
        Some(thinking) => format!("<think>{}</think>{}", thinking, answer),
        None => answer.to_string(),
    }
}
