//! Small line-level helpers shared by the extractors.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::Extracted;

/// Recommendation markers: the bare uppercase words, or any-case label form
/// such as `Recommended path:`.
static RE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i:\b(?:recommended|recommendation|verdict|optimal)\b[^:\n]{0,30}:)|\b(?:RECOMMENDED|RECOMMENDATION|VERDICT|OPTIMAL)\b",
    )
    .unwrap()
});

/// A dollar amount: optional sign, digits, optional magnitude suffix.
/// Groups: sign, amount, suffix. Compile with `(?i)` so `5k` and `5 Million` match.
pub(crate) const MONEY_PATTERN: &str =
    r"([+\-−])?\$\s?(\d[\d,]*(?:\.\d+)?)(?:\s*(thousand|million|billion|[KMB])\b)?";

/// Characters that form decorative rules between report sections.
const BORDER_CHARS: &[char] = &['=', '-', '─', '━', '═', '*', '_', '~', '#'];

/// A line made of one border character repeated at least three times.
pub(crate) fn is_border_line(line: &str) -> bool {
    let trimmed = line.trim();
    let mut chars = trimmed.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    BORDER_CHARS.contains(&first) && trimmed.chars().count() >= 3 && chars.all(|c| c == first)
}

/// Body of a bullet line (`•`, `✓`, `-`, `*`), without the marker.
///
/// `-` and `*` need trailing whitespace so rules and `**bold**` don't count.
pub(crate) fn bullet_body(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let mut chars = trimmed.chars();
    let marker = chars.next()?;
    let rest = chars.as_str();
    let body = match marker {
        '•' | '✓' => rest,
        '-' | '*' if rest.starts_with(char::is_whitespace) => rest,
        _ => return None,
    };
    let body = body.trim();
    (!body.is_empty()).then_some(body)
}

/// Up to `max_chars` characters of `text` starting at byte offset `start`.
///
/// `start` must be a char boundary (regex match offsets always are).
pub(crate) fn window(text: &str, start: usize, max_chars: usize) -> &str {
    let rest = &text[start..];
    match rest.char_indices().nth(max_chars) {
        Some((end, _)) => &rest[..end],
        None => rest,
    }
}

/// Strip markdown emphasis, heading hashes and stray separators from both ends.
pub(crate) fn clean_label(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '_' | '#' | ':' | '`'))
}

/// Text following the first recommendation marker that says anything.
///
/// The rest of the marker's line is used. A label with nothing after it
/// (`RECOMMENDED PATH:` on a line of its own) takes the next non-blank line;
/// a bare trailing tag (`BRANCH 1: PROCEED NOW (RECOMMENDED)`) takes the
/// text before it.
pub(crate) fn marker_text(text: &str) -> Extracted<String> {
    for m in RE_MARKER.find_iter(text) {
        let rest = &text[m.end()..];
        let (same_line, following) = rest.split_once('\n').unwrap_or((rest, ""));
        let candidate = clean_label(trim_separator(same_line));
        if has_letters(candidate) {
            return Extracted::Found(candidate.to_string());
        }

        let is_label = m.as_str().ends_with(':') || same_line.trim_start().starts_with(':');
        let fallback = if is_label {
            following
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty() && !is_border_line(l))
                .map(|l| clean_label(bullet_body(l).unwrap_or(l)))
        } else {
            let line_start = text[..m.start()].rfind('\n').map_or(0, |i| i + 1);
            let before = text[line_start..m.start()]
                .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '(' | '[' | '-' | '–' | '—'));
            Some(clean_label(before))
        };
        if let Some(found) = fallback.filter(|l| has_letters(l)) {
            return Extracted::Found(found.to_string());
        }
    }
    Extracted::NotFound
}

/// Render the money groups starting at `first` as `$500K` / `-$20K`,
/// or with an explicit `+` on positive amounts when `signed` is set.
pub(crate) fn money_from_captures(caps: &Captures<'_>, first: usize, signed: bool) -> String {
    let negative = matches!(caps.get(first).map(|m| m.as_str()), Some("-" | "−"));
    let sign = match (negative, signed) {
        (true, _) => "-",
        (false, true) => "+",
        (false, false) => "",
    };
    let amount = caps
        .get(first + 1)
        .map_or("0", |m| m.as_str().trim_end_matches(','));
    let suffix = caps
        .get(first + 2)
        .map_or("", |m| magnitude_suffix(m.as_str()));
    format!("{sign}${amount}{suffix}")
}

fn magnitude_suffix(raw: &str) -> &'static str {
    match raw.to_ascii_lowercase().as_str() {
        "k" | "thousand" => "K",
        "m" | "million" => "M",
        "b" | "billion" => "B",
        _ => "",
    }
}

fn has_letters(s: &str) -> bool {
    s.chars().any(char::is_alphabetic)
}

fn trim_separator(s: &str) -> &str {
    s.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '-' | '–' | '—' | '*' | '='))
}
