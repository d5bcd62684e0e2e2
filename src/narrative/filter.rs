//! JSON-noise filter.
//!
//! Generated analyses sometimes leak the raw data payload they were written
//! from: fenced ```json blocks, a JSON object dumped after the prose, or the
//! dangling `},` / `]` lines of a half-printed structure. Those fragments are
//! full of `$` amounts, percentages and `GATE`-like keys that would confuse
//! the regex extractors, so they are removed before any extraction runs.

use std::sync::LazyLock;

use regex::Regex;

/// Tagged ```json fences opened and closed on the same line.
static RE_INLINE_JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)```[ \t]*json\b[^\n]*?```").unwrap());

/// Three or more newlines, allowing whitespace-only lines in between.
static RE_BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").unwrap());

/// Remove embedded JSON fragments from narrative text.
///
/// The pass is applied until it reaches a fixpoint, so the function is
/// idempotent: removing one fragment can expose another (a trailing object
/// that was followed by a stray `]`, for example) and both go in one call.
pub fn filter_json_from_markdown(text: &str) -> String {
    let mut current = filter_pass(text);
    loop {
        // Every pass that changes the text also shortens it, so this ends.
        let next = filter_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn filter_pass(text: &str) -> String {
    let text = RE_INLINE_JSON_FENCE.replace_all(text, "");
    let text = strip_fenced_blocks(&text);
    let text = strip_trailing_json(&text);
    let text = drop_punctuation_lines(text);
    RE_BLANK_RUN.replace_all(&text, "\n\n").trim().to_string()
}

/// Drop line-fenced blocks that hold JSON: ```json blocks, and untagged
/// fences whose body starts with `{` or `[`.
///
/// Only a bare fence line closes a block. A ```json block left open by a
/// truncated reply ends at its first blank line, or at the next fence, so the
/// prose after it survives.
fn strip_fenced_blocks(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let Some(info) = fence_info(lines[i]) else {
            out.push(lines[i]);
            i += 1;
            continue;
        };
        let tagged_json = info.eq_ignore_ascii_case("json");
        let next_fence = lines[i + 1..]
            .iter()
            .position(|l| fence_info(l).is_some())
            .map(|offset| i + 1 + offset);

        match next_fence {
            Some(close) if fence_info(lines[close]) == Some("") => {
                let block = &lines[i..=close];
                if !(tagged_json || body_is_json(block)) {
                    out.extend_from_slice(block);
                }
                i = close + 1;
            }
            _ if tagged_json => {
                let blank = lines[i + 1..]
                    .iter()
                    .position(|l| l.trim().is_empty())
                    .map(|offset| i + 1 + offset);
                let end = [blank, next_fence].into_iter().flatten().min();
                tracing::debug!(line = i, "dropping unterminated json fence");
                i = end.unwrap_or(lines.len());
            }
            _ => {
                out.push(lines[i]);
                i += 1;
            }
        }
    }

    out.join("\n")
}

/// Info string of a fence line (` ```json ` gives `json`), or `None`.
fn fence_info(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    trimmed
        .starts_with("```")
        .then(|| trimmed.trim_start_matches('`').trim())
}

fn body_is_json(fenced: &[&str]) -> bool {
    let info_is_empty = fenced
        .first()
        .is_some_and(|open| open.trim().trim_start_matches('`').is_empty());
    let body_start = fenced
        .iter()
        .skip(1)
        .take(fenced.len().saturating_sub(2))
        .map(|l| l.trim())
        .find(|l| !l.is_empty());
    info_is_empty && body_start.is_some_and(|l| l.starts_with('{') || l.starts_with('['))
}

/// Cut from the earliest line starting with `{` whose remainder is valid JSON.
fn strip_trailing_json(text: &str) -> &str {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim_start().starts_with('{') {
            let tail = text[offset..].trim();
            if serde_json::from_str::<serde_json::Value>(tail).is_ok() {
                tracing::debug!(removed = tail.len(), "stripped trailing JSON object");
                return &text[..offset];
            }
        }
        offset += line.len();
    }
    text
}

fn is_punctuation_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && trimmed.chars().all(|c| {
            c.is_ascii_digit()
                || c.is_whitespace()
                || matches!(c, '{' | '}' | '[' | ']' | ',' | ':' | '"' | '.')
        })
}

fn drop_punctuation_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !is_punctuation_line(line))
        .collect::<Vec<_>>()
        .join("\n")
}
