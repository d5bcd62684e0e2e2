//! Section segmenter.
//!
//! Splits a narrative into titled sections for the report page. Four heading
//! shapes are recognized:
//!
//! - numbered markdown headings: `## 3. Market Validation`
//! - branch headings: `BRANCH 2: PROCEED WITH MODIFICATIONS`
//! - decision blocks: `DECISION TREE`, `DECISION GATES`, `DECISION MATRIX`
//! - an all-caps line directly under a border rule (`════`)
//!
//! Text before the first heading belongs to no section. A narrative without
//! any heading yields no sections, which callers treat as "unsegmented".

use std::sync::LazyLock;

use regex::Regex;

use super::text::{clean_label, is_border_line};
use super::{Section, SectionKind};

static RE_NUMBERED_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#+\s*(\d+)\.\s+(.+)$").unwrap());

static RE_BRANCH_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:#+\s*)?(?:\*\*)?BRANCH\s+(\d+)\s*[:.\-–—]\s*(.+)$").unwrap()
});

static RE_DECISION_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:#+\s*)?(?:\*\*)?(DECISION\s+(?:TREE|GATES?|MATRIX)\b.*)$").unwrap()
});

struct Heading {
    number: Option<u32>,
    title: String,
}

struct OpenSection {
    number: u32,
    title: String,
    lines: Vec<String>,
}

impl OpenSection {
    fn close(self) -> Option<Section> {
        if self.lines.is_empty() {
            return None;
        }
        let mut kind = classify_title(&self.title);
        if self.lines.iter().any(|l| l.starts_with('|')) {
            kind = SectionKind::Table;
        }
        Some(Section {
            number: self.number,
            title: self.title,
            content: self.lines.join("\n"),
            kind,
        })
    }
}

/// Split `text` into sections. Sections with no content are dropped.
pub fn segment_sections(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current: Option<OpenSection> = None;
    let mut last_number: u32 = 0;
    let mut after_border = false;

    for raw in text.lines() {
        let line = raw.trim();
        if is_border_line(line) {
            after_border = true;
            continue;
        }
        if line.is_empty() {
            after_border = false;
            continue;
        }

        if let Some(heading) = match_heading(line, after_border) {
            let number = heading
                .number
                .unwrap_or_else(|| last_number.saturating_add(1));
            last_number = number;
            if let Some(section) = current.take().and_then(OpenSection::close) {
                sections.push(section);
            }
            current = Some(OpenSection {
                number,
                title: heading.title,
                lines: Vec::new(),
            });
        } else if let Some(open) = current.as_mut() {
            open.lines.push(line.to_string());
        }
        after_border = false;
    }

    if let Some(section) = current.and_then(OpenSection::close) {
        sections.push(section);
    }
    sections
}

fn match_heading(line: &str, after_border: bool) -> Option<Heading> {
    if let Some(caps) = RE_NUMBERED_HEADING.captures(line) {
        return Some(Heading {
            number: caps[1].parse().ok(),
            title: clean_label(&caps[2]).to_string(),
        });
    }
    if let Some(caps) = RE_BRANCH_HEADING.captures(line) {
        return Some(Heading {
            number: caps[1].parse().ok(),
            title: clean_label(line).to_string(),
        });
    }
    if let Some(caps) = RE_DECISION_HEADING.captures(line) {
        return Some(Heading {
            number: None,
            title: clean_label(&caps[1]).to_string(),
        });
    }
    if after_border && is_caps_title(line) {
        return Some(Heading {
            number: None,
            title: clean_label(line).to_string(),
        });
    }
    None
}

fn is_caps_title(line: &str) -> bool {
    let label = clean_label(line);
    label.chars().count() >= 3
        && label.chars().any(char::is_alphabetic)
        && !label.chars().any(char::is_lowercase)
}

fn classify_title(title: &str) -> SectionKind {
    let lower = title.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| lower.contains(w));
    if mentions(&["branch", "path", "proceed"]) {
        SectionKind::Path
    } else if mentions(&["decision", "gate", "matrix", "summary"]) {
        SectionKind::Decision
    } else {
        SectionKind::Text
    }
}
