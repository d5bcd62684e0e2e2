//! Headline metric and recommendation extractors.

use std::sync::LazyLock;

use regex::Regex;

use super::text::{
    MONEY_PATTERN, bullet_body, clean_label, is_border_line, marker_text, money_from_captures,
};
use super::{DecisionMetric, MetricKind, Recommendation};
use crate::config::ExtractorConfig;

// ── Metric patterns ─────────────────────────────────────────────────────

fn labelled_money(label: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b{label}\b[^$\n]{{0,24}}?{MONEY_PATTERN}")).unwrap()
}

static RE_EXPECTED_VALUE: LazyLock<Regex> =
    LazyLock::new(|| labelled_money(r"expected\s+value"));

static RE_WORST_CASE: LazyLock<Regex> = LazyLock::new(|| labelled_money(r"worst[\s\-]+case"));

static RE_BEST_CASE: LazyLock<Regex> = LazyLock::new(|| labelled_money(r"best[\s\-]+case"));

static RE_ROI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bROI\b[^%\d\n]{0,24}?([+\-−]?\d+(?:\.\d+)?)\s*%").unwrap()
});

// ── Recommendation patterns ─────────────────────────────────────────────

static RE_RATIONALE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:\*\*)?(?:rationale|reasoning)\b[^:\n]{0,20}:(?:\*\*)?\s*(.*)$").unwrap()
});

static RE_BECAUSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^because\b").unwrap());

pub const GENERIC_RATIONALE: [&str; 2] = [
    "Risk-adjusted return supports this path",
    "Aligns with stated objectives and constraints",
];

// ── Metrics ─────────────────────────────────────────────────────────────

/// At most one each of Expected Value, Worst Case, Best Case and ROI, in that order.
pub fn extract_metrics(text: &str) -> Vec<DecisionMetric> {
    let mut metrics = Vec::new();

    let money_metrics: [(&str, &LazyLock<Regex>, MetricKind); 3] = [
        ("Expected Value", &RE_EXPECTED_VALUE, MetricKind::Good),
        ("Worst Case", &RE_WORST_CASE, MetricKind::Bad),
        ("Best Case", &RE_BEST_CASE, MetricKind::Good),
    ];
    for (label, re, kind) in money_metrics {
        if let Some(caps) = re.captures(text) {
            let value = money_from_captures(&caps, 1, false);
            let kind = if label == "Expected Value" && value.starts_with('-') {
                MetricKind::Bad
            } else {
                kind
            };
            metrics.push(DecisionMetric {
                label: label.to_string(),
                value,
                kind,
            });
        }
    }

    if let Some(caps) = RE_ROI.captures(text) {
        let raw = caps[1].replace('−', "-");
        let negative = raw.starts_with('-');
        metrics.push(DecisionMetric {
            label: "ROI".to_string(),
            value: format!("{}%", raw.trim_start_matches('+')),
            kind: if negative {
                MetricKind::Bad
            } else {
                MetricKind::Good
            },
        });
    }

    metrics
}

// ── Recommendation ──────────────────────────────────────────────────────

/// The headline recommendation plus up to `rationale_target` supporting lines.
///
/// Explicit `Rationale:` / `Reasoning:` / `Because …` lines come first; a
/// label with nothing after it takes the next non-blank line. Short
/// bullets backfill the list when fewer were found, and two generic lines
/// stand in when the narrative offers nothing at all.
pub fn extract_recommendation(text: &str, config: &ExtractorConfig) -> Recommendation {
    let branch = marker_text(text).unwrap_or(String::new());

    let mut rationale: Vec<String> = Vec::new();

    let lines: Vec<&str> = text.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        let body = bullet_body(line).unwrap_or_else(|| line.trim());
        if let Some(caps) = RE_RATIONALE_LABEL.captures(body) {
            let inline = clean_label(&caps[1]);
            if !inline.is_empty() {
                push_unique(&mut rationale, inline);
            } else if let Some(next) = lines[i + 1..]
                .iter()
                .map(|l| l.trim())
                .find(|l| !l.is_empty() && !is_border_line(l))
            {
                push_unique(&mut rationale, bullet_body(next).unwrap_or(next));
            }
        } else if RE_BECAUSE.is_match(body) {
            push_unique(&mut rationale, body);
        }
    }

    if rationale.len() < config.rationale_target {
        let eligible = |body: &&str| {
            let len = body.chars().count();
            (config.bullet_min_chars..config.bullet_max_chars).contains(&len)
        };
        for body in text.lines().filter_map(bullet_body).filter(eligible) {
            if rationale.len() >= config.rationale_target {
                break;
            }
            push_unique(&mut rationale, body);
        }
    }

    if rationale.is_empty() {
        rationale = GENERIC_RATIONALE.iter().map(|s| s.to_string()).collect();
    }

    Recommendation { branch, rationale }
}

fn push_unique(rationale: &mut Vec<String>, line: &str) {
    let line = clean_label(line);
    if !line.is_empty() && !rationale.iter().any(|r| r == line) {
        rationale.push(line.to_string());
    }
}
