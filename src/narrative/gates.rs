//! Decision-gate extractor.
//!
//! Two timeline notations are recognized and appended into one sequence:
//! `GATE n: check` (weekly cadence, `day = n * 7` by default) followed by
//! `DAY n: check` (`day = n`). Gate numbers run across both. The same event
//! written both ways yields two gates; nothing is de-duplicated.

use std::sync::LazyLock;

use regex::Regex;

use super::DecisionGate;
use super::text::clean_label;
use crate::config::ExtractorConfig;

static RE_GATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bGATE\s+(\d+)\s*[:.\-–—]\s*([^\n]+)").unwrap()
});

static RE_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bDAY\s+(\d+)\s*[:\-–—]\s*([^\n]+)").unwrap()
});

static RE_TOPIC_INSPECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\binspect|\bdue\s+diligence\b").unwrap());

static RE_TOPIC_NEGOTIATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bnegotiat|\bcontract").unwrap());

static RE_TOPIC_CLOSING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bclosing\b|\bexecution\b").unwrap());

const GATE_IF_PASS: &str = "Continue to next phase";
const GATE_IF_FAIL: &str = "Reassess or abort";
const DAY_IF_PASS: &str = "Proceed as planned";
const DAY_IF_FAIL: &str = "Evaluate alternatives";

struct Topic {
    pattern: &'static LazyLock<Regex>,
    check: &'static str,
    if_pass: &'static str,
    if_fail: &'static str,
}

/// Keyword-fallback gates, in timeline order. Days come from the config.
const TOPICS: [Topic; 3] = [
    Topic {
        pattern: &RE_TOPIC_INSPECTION,
        check: "Complete inspection and due diligence",
        if_pass: "Move to negotiation",
        if_fail: "Renegotiate price or walk away",
    },
    Topic {
        pattern: &RE_TOPIC_NEGOTIATION,
        check: "Finalize negotiation and contract terms",
        if_pass: "Schedule closing",
        if_fail: "Revisit terms or withdraw",
    },
    Topic {
        pattern: &RE_TOPIC_CLOSING,
        check: "Close and execute the transaction",
        if_pass: "Begin post-close monitoring",
        if_fail: "Extend timeline or exit",
    },
];

/// Extract decision gates from `text`, in extraction order.
pub fn extract_gates(text: &str, config: &ExtractorConfig) -> Vec<DecisionGate> {
    let mut gates = Vec::new();

    for caps in RE_GATE.captures_iter(text) {
        let Ok(n) = caps[1].parse::<u32>() else {
            tracing::debug!(raw = &caps[1], "skipping gate with unparseable number");
            continue;
        };
        push_gate(
            &mut gates,
            n.saturating_mul(config.gate_cadence_days),
            &caps[2],
            GATE_IF_PASS,
            GATE_IF_FAIL,
        );
    }

    for caps in RE_DAY.captures_iter(text) {
        let Ok(day) = caps[1].parse::<u32>() else {
            tracing::debug!(raw = &caps[1], "skipping day with unparseable number");
            continue;
        };
        push_gate(&mut gates, day, &caps[2], DAY_IF_PASS, DAY_IF_FAIL);
    }

    if gates.is_empty() {
        return topic_fallback(text, config);
    }
    gates
}

fn push_gate(gates: &mut Vec<DecisionGate>, day: u32, check: &str, if_pass: &str, if_fail: &str) {
    let check = clean_label(check);
    if check.is_empty() {
        return;
    }
    gates.push(DecisionGate {
        gate_number: next_gate_number(gates),
        day,
        check: check.to_string(),
        if_pass: if_pass.to_string(),
        if_fail: if_fail.to_string(),
    });
}

fn next_gate_number(gates: &[DecisionGate]) -> u32 {
    u32::try_from(gates.len()).map_or(u32::MAX, |n| n.saturating_add(1))
}

fn topic_fallback(text: &str, config: &ExtractorConfig) -> Vec<DecisionGate> {
    let mut gates = Vec::new();
    for (topic, &day) in TOPICS.iter().zip(config.fallback_gate_days.iter()) {
        if topic.pattern.is_match(text) {
            gates.push(DecisionGate {
                gate_number: next_gate_number(&gates),
                day,
                check: topic.check.to_string(),
                if_pass: topic.if_pass.to_string(),
                if_fail: topic.if_fail.to_string(),
            });
        }
    }
    if !gates.is_empty() {
        tracing::debug!(count = gates.len(), "synthesized gates from topic keywords");
    }
    gates
}
