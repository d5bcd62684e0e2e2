//! Decision-branch extractor.
//!
//! Each of the three fixed branches has a dedicated pattern. A branch is
//! reported only when its pattern occurs somewhere in the narrative; its
//! expected value, strength and conditions are then read from the text that
//! follows the mention, stopping at the next branch.
//!
//! When none of the dedicated patterns occur, broader uppercase keyword
//! groups synthesize placeholder branches so the decision card still renders.

use std::sync::LazyLock;

use regex::{Match, Regex};

use super::text::{MONEY_PATTERN, bullet_body, marker_text, money_from_captures, window};
use super::{BranchName, DecisionBranch, Extracted};
use crate::config::ExtractorConfig;

// ── Regex patterns ──────────────────────────────────────────────────────

static RE_PROCEED_NOW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bproceed[\s_]+(?:now|immediately)\b").unwrap()
});

static RE_PROCEED_MODIFIED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bproceed[\s_]+(?:with[\s_]+)?modif").unwrap()
});

static RE_DO_NOT_PROCEED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bdo[\s_]+not[\s_]+proceed\b|\babort|\breject").unwrap()
});

static RE_BRANCH_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bBRANCH\s+(\d+)\b").unwrap());

/// Text ending in a negation, e.g. the `do not ` before `proceed now`.
static RE_NEGATED_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:\b|_)not[\s_]+$").unwrap());

static RE_MONEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("(?i){MONEY_PATTERN}")).unwrap());

static RE_LABELLED_PERCENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:probability|likelihood|confidence|strength|chance|success)\b[^%\n]{0,30}?\b(\d{1,3}(?:\.\d+)?)\s*%",
    )
    .unwrap()
});

static RE_PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,3}(?:\.\d+)?)\s*%").unwrap());

static RE_FALLBACK_POSITIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:PROCEED|APPROVE|EXECUTE)").unwrap());

static RE_FALLBACK_NEGATIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bDO\s+NOT\b|\b(?:REJECT|ABORT|AVOID)").unwrap());

static RE_FALLBACK_MODIFIED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"MODIF|CONDITION|CONTINGENT").unwrap());

// ── Constants ───────────────────────────────────────────────────────────

pub const DEFAULT_EXPECTED_VALUE: &str = "+$0";
pub const DEFAULT_STRENGTH: f64 = 0.5;
pub const RECOMMENDED_VERDICT: &str = "Recommended strategic path based on analysis";

fn pattern(name: BranchName) -> &'static Regex {
    match name {
        BranchName::ProceedNow => &RE_PROCEED_NOW,
        BranchName::ProceedModified => &RE_PROCEED_MODIFIED,
        BranchName::DoNotProceed => &RE_DO_NOT_PROCEED,
    }
}

/// Matches of `name`'s pattern in `text`. A `proceed …` match directly after
/// `not` belongs to the negative branch and is skipped.
fn matches<'t>(name: BranchName, text: &'t str) -> impl Iterator<Item = Match<'t>> {
    pattern(name).find_iter(text).filter(move |m| {
        name == BranchName::DoNotProceed || !RE_NEGATED_TAIL.is_match(&text[..m.start()])
    })
}

/// A `BRANCH n` block: from its token to the next token or markdown heading.
struct Block {
    start: usize,
    end: usize,
    owner: Option<BranchName>,
}

/// Split `text` at its `BRANCH n` tokens. A block belongs to the branch its
/// header line names, or failing that to the branch with ordinal `n`.
fn branch_blocks(text: &str) -> Vec<Block> {
    let tokens: Vec<(usize, Option<u32>)> = RE_BRANCH_TOKEN
        .captures_iter(text)
        .filter_map(|c| Some((c.get(0)?.start(), c[1].parse::<u32>().ok())))
        .collect();

    tokens
        .iter()
        .enumerate()
        .map(|(i, &(start, ordinal))| {
            let limit = tokens.get(i + 1).map_or(text.len(), |&(next, _)| next);
            let end = text[start..limit]
                .find("\n#")
                .map_or(limit, |offset| start + offset + 1);
            let header = text[start..end].lines().next().unwrap_or("");
            let named = BranchName::ALL
                .into_iter()
                .filter_map(|name| matches(name, header).next().map(|m| (m.start(), name)))
                .min_by_key(|&(pos, _)| pos)
                .map(|(_, name)| name);
            let owner = named.or_else(|| {
                BranchName::ALL
                    .into_iter()
                    .find(|name| Some(name.ordinal()) == ordinal)
            });
            Block { start, end, owner }
        })
        .collect()
}

/// Mentions of `name` outside blocks owned by a different branch, so an
/// "abort if …" condition under BRANCH 2 is not read as DO NOT PROCEED.
fn mentions<'t>(
    name: BranchName,
    text: &'t str,
    blocks: &[Block],
) -> impl Iterator<Item = Match<'t>> {
    matches(name, text).filter(move |m| {
        blocks
            .iter()
            .find(|b| (b.start..b.end).contains(&m.start()))
            .and_then(|b| b.owner)
            .is_none_or(|owner| owner == name)
    })
}

/// Placeholder content for a keyword-synthesized branch.
struct Placeholder {
    name: BranchName,
    expected_value: &'static str,
    strength: f64,
    conditions: &'static [&'static str],
    verdict: &'static str,
}

const PLACEHOLDERS: [Placeholder; 3] = [
    Placeholder {
        name: BranchName::ProceedNow,
        expected_value: "+$500K",
        strength: 0.7,
        conditions: &["Market conditions remain favorable", "Financing is secured"],
        verdict: "Viable if conditions hold",
    },
    Placeholder {
        name: BranchName::ProceedModified,
        expected_value: "+$350K",
        strength: 0.6,
        conditions: &["Renegotiate key terms", "Complete additional due diligence"],
        verdict: "Viable with adjustments",
    },
    Placeholder {
        name: BranchName::DoNotProceed,
        expected_value: "$0",
        strength: 0.3,
        conditions: &["Risk exceeds acceptable threshold"],
        verdict: "Preserve capital for better opportunities",
    },
];

// ── Extraction ──────────────────────────────────────────────────────────

/// Extract up to three decision branches from `text`.
pub fn extract_branches(text: &str, config: &ExtractorConfig) -> Vec<DecisionBranch> {
    let marker = marker_text(text);
    let blocks = branch_blocks(text);
    let branches: Vec<DecisionBranch> = BranchName::ALL
        .into_iter()
        .filter(|&name| mentions(name, text, &blocks).next().is_some())
        .map(|name| build_branch(text, name, &blocks, marker.clone(), config))
        .collect();

    if branches.is_empty() {
        return keyword_fallback(text);
    }
    branches
}

/// First branch flagged as recommended, in `BranchName::ALL` order.
pub fn recommended_branch(branches: &[DecisionBranch]) -> Option<&DecisionBranch> {
    branches.iter().find(|b| b.is_recommended)
}

fn build_branch(
    text: &str,
    name: BranchName,
    blocks: &[Block],
    marker: Extracted<String>,
    config: &ExtractorConfig,
) -> DecisionBranch {
    let windows = branch_windows(text, name, blocks, config);

    let expected_value = windows
        .iter()
        .map(|w| probe_expected_value(w))
        .find(Extracted::is_found)
        .unwrap_or(Extracted::NotFound);
    let strength = windows
        .iter()
        .map(|w| probe_strength(w))
        .find(Extracted::is_found)
        .unwrap_or(Extracted::NotFound);
    let conditions = windows
        .iter()
        .map(|w| collect_conditions(w, config.max_conditions))
        .find(|c| !c.is_empty())
        .unwrap_or_default();

    if !expected_value.is_found() || !strength.is_found() {
        tracing::debug!(
            branch = %name,
            value_found = expected_value.is_found(),
            strength_found = strength.is_found(),
            "branch figures defaulted"
        );
    }

    let is_recommended = marker
        .found()
        .is_some_and(|marker| marker_recommends(&marker, name));

    DecisionBranch {
        name,
        display_name: name.display_name().to_string(),
        expected_value: expected_value.unwrap_or(DEFAULT_EXPECTED_VALUE.to_string()),
        strength: strength.unwrap_or(DEFAULT_STRENGTH),
        conditions,
        verdict: if is_recommended {
            RECOMMENDED_VERDICT.to_string()
        } else {
            String::new()
        },
        is_recommended,
    }
}

/// Text regions that describe `name`: one after every mention of the branch,
/// then one after its `BRANCH <ordinal>` token.
fn branch_windows<'a>(
    text: &'a str,
    name: BranchName,
    blocks: &[Block],
    config: &ExtractorConfig,
) -> Vec<&'a str> {
    let mut windows: Vec<&str> = mentions(name, text, blocks)
        .map(|m| bounded_window(text, m.start(), m.end(), name, blocks, config))
        .collect();

    let ordinal_token = RE_BRANCH_TOKEN
        .captures_iter(text)
        .filter(|c| c[1].parse::<u32>().ok() == Some(name.ordinal()))
        .find_map(|c| c.get(0));
    if let Some(token) = ordinal_token {
        windows.push(bounded_window(text, token.start(), token.end(), name, blocks, config));
    }
    windows
}

/// The window starting at `start`, cut at the configured length, the next
/// `BRANCH n` token, or the next mention of a different branch.
fn bounded_window<'a>(
    text: &'a str,
    start: usize,
    end: usize,
    own: BranchName,
    blocks: &[Block],
    config: &ExtractorConfig,
) -> &'a str {
    let mut cut = start + window(text, start, config.branch_window_chars).len();
    if let Some(m) = RE_BRANCH_TOKEN.find_at(text, end) {
        cut = cut.min(m.start());
    }
    for other in BranchName::ALL.into_iter().filter(|&n| n != own) {
        if let Some(m) = mentions(other, text, blocks).find(|m| m.start() >= end) {
            cut = cut.min(m.start());
        }
    }
    &text[start..cut.max(end)]
}

/// First dollar amount in `window`, rendered with an explicit sign.
pub(crate) fn probe_expected_value(window: &str) -> Extracted<String> {
    RE_MONEY
        .captures(window)
        .map(|caps| money_from_captures(&caps, 1, true))
        .into()
}

/// Percentage in `window` as a fraction in `[0, 1]`, preferring one labelled
/// as a probability or confidence over the first bare percentage.
pub(crate) fn probe_strength(window: &str) -> Extracted<f64> {
    RE_LABELLED_PERCENT
        .captures(window)
        .or_else(|| RE_PERCENT.captures(window))
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .map(|pct| (pct / 100.0).clamp(0.0, 1.0))
        .into()
}

fn collect_conditions(window: &str, max: usize) -> Vec<String> {
    window
        .lines()
        .filter_map(bullet_body)
        .take(max)
        .map(str::to_string)
        .collect()
}

/// Whether the recommendation text names `name`.
fn marker_recommends(marker: &str, name: BranchName) -> bool {
    if matches(name, marker).next().is_some() {
        return true;
    }
    let lower = marker.to_lowercase();
    // A bare "proceed" that names no other branch means proceed now.
    name == BranchName::ProceedNow
        && lower.contains("proceed")
        && !RE_PROCEED_MODIFIED.is_match(marker)
        && !RE_DO_NOT_PROCEED.is_match(marker)
}

fn keyword_fallback(text: &str) -> Vec<DecisionBranch> {
    let positive = RE_FALLBACK_POSITIVE.is_match(text);
    let negative = RE_FALLBACK_NEGATIVE.is_match(text);
    let modified = RE_FALLBACK_MODIFIED.is_match(text);
    if !(positive || negative || modified) {
        return Vec::new();
    }
    tracing::debug!(positive, negative, modified, "synthesizing branches from keywords");

    let recommended = if modified {
        BranchName::ProceedModified
    } else {
        BranchName::ProceedNow
    };

    PLACEHOLDERS
        .iter()
        .filter(|p| match p.name {
            BranchName::ProceedNow => positive,
            BranchName::ProceedModified => modified,
            BranchName::DoNotProceed => negative,
        })
        .map(|p| {
            let is_recommended = p.name == recommended;
            DecisionBranch {
                name: p.name,
                display_name: p.name.display_name().to_string(),
                expected_value: p.expected_value.to_string(),
                strength: p.strength,
                conditions: p.conditions.iter().map(|c| c.to_string()).collect(),
                verdict: if is_recommended {
                    RECOMMENDED_VERDICT.to_string()
                } else {
                    p.verdict.to_string()
                },
                is_recommended,
            }
        })
        .collect()
}
