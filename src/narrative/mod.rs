//! Narrative fallback: structure recovery from free-form analysis text.
//!
//! When the upstream analysis service returns prose instead of its structured
//! JSON, the report page still needs decision branches, gates, key metrics and
//! a recommendation to render. This module recovers them heuristically:
//!
//! ```text
//! raw text ─► filter (strip JSON noise) ─► sections
//!                                       ├► branches
//!                                       ├► gates
//!                                       ├► metrics
//!                                       └► recommendation
//! ```
//!
//! Every extractor is a total function over `&str`. Nothing here returns an
//! error: "nothing found" is an empty `Vec` or [`Extracted::NotFound`], and
//! the caller decides what to show instead.

pub mod branches;
pub mod filter;
pub mod gates;
pub mod metrics;
pub mod sections;
mod text;

use serde::{Deserialize, Serialize};

use crate::config::ExtractorConfig;

pub use branches::recommended_branch;
pub use filter::filter_json_from_markdown;
pub use sections::segment_sections;

// ── Probe result ────────────────────────────────────────────────────────

/// Outcome of a single-value heuristic probe.
///
/// Probes never substitute a default themselves; the caller picks one with
/// [`Extracted::unwrap_or`] so "absent" and "defaulted" stay distinguishable.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted<T> {
    Found(T),
    NotFound,
}

impl<T> Extracted<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(v) => Some(v),
            Self::NotFound => None,
        }
    }

    pub fn unwrap_or(self, default: T) -> T {
        self.found().unwrap_or(default)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Extracted<U> {
        match self {
            Self::Found(v) => Extracted::Found(f(v)),
            Self::NotFound => Extracted::NotFound,
        }
    }

    /// Try `other` only when this probe came up empty.
    pub fn or_else(self, other: impl FnOnce() -> Extracted<T>) -> Extracted<T> {
        match self {
            Self::Found(v) => Self::Found(v),
            Self::NotFound => other(),
        }
    }
}

impl<T> From<Option<T>> for Extracted<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Found(v),
            None => Self::NotFound,
        }
    }
}

// ── Records ─────────────────────────────────────────────────────────────

/// The three fixed strategic branches of a decision tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BranchName {
    ProceedNow,
    ProceedModified,
    DoNotProceed,
}

impl BranchName {
    pub const ALL: [BranchName; 3] = [
        BranchName::ProceedNow,
        BranchName::ProceedModified,
        BranchName::DoNotProceed,
    ];

    /// Wire identifier, e.g. `PROCEED_NOW`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProceedNow => "PROCEED_NOW",
            Self::ProceedModified => "PROCEED_MODIFIED",
            Self::DoNotProceed => "DO_NOT_PROCEED",
        }
    }

    /// Human-facing label shown on the report card.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::ProceedNow => "Proceed Now",
            Self::ProceedModified => "Proceed with Modifications",
            Self::DoNotProceed => "Do Not Proceed",
        }
    }

    /// 1-based position in the conventional `BRANCH n` ordering.
    pub fn ordinal(self) -> u32 {
        match self {
            Self::ProceedNow => 1,
            Self::ProceedModified => 2,
            Self::DoNotProceed => 3,
        }
    }

    /// Parse a wire identifier or display name, ignoring case and separators.
    pub fn parse(s: &str) -> Option<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "proceednow" | "proceedimmediately" => Some(Self::ProceedNow),
            "proceedmodified" | "proceedwithmodifications" | "proceedwithmodification" => {
                Some(Self::ProceedModified)
            }
            "donotproceed" | "abort" | "reject" => Some(Self::DoNotProceed),
            _ => None,
        }
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One strategic option in the decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionBranch {
    pub name: BranchName,
    pub display_name: String,
    /// Signed currency string, e.g. `+$500K`.
    pub expected_value: String,
    /// Likelihood / conviction in `[0, 1]`.
    pub strength: f64,
    pub conditions: Vec<String>,
    pub verdict: String,
    pub is_recommended: bool,
}

/// A timestamped checkpoint in the implementation timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionGate {
    pub gate_number: u32,
    /// Offset in days from the decision date.
    pub day: u32,
    pub check: String,
    pub if_pass: String,
    pub if_fail: String,
}

/// Tone of a headline metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Good,
    Bad,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionMetric {
    pub label: String,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: MetricKind,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Free-text headline, empty when the narrative names no recommendation.
    pub branch: String,
    pub rationale: Vec<String>,
}

/// Rendering class of a segmented section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Path,
    Decision,
    Text,
    Table,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub number: u32,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: SectionKind,
}

/// Everything recovered from one narrative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NarrativeReport {
    pub sections: Vec<Section>,
    pub branches: Vec<DecisionBranch>,
    pub gates: Vec<DecisionGate>,
    pub metrics: Vec<DecisionMetric>,
    pub recommendation: Recommendation,
}

// ── Facade ──────────────────────────────────────────────────────────────

/// Runs the full narrative fallback with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct NarrativeExtractor {
    config: ExtractorConfig,
}

impl NarrativeExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Filter JSON noise out of `raw`, then run every extractor over the result.
    pub fn extract(&self, raw: &str) -> NarrativeReport {
        let text = filter_json_from_markdown(raw);
        let report = NarrativeReport {
            sections: segment_sections(&text),
            branches: branches::extract_branches(&text, &self.config),
            gates: gates::extract_gates(&text, &self.config),
            metrics: metrics::extract_metrics(&text),
            recommendation: metrics::extract_recommendation(&text, &self.config),
        };
        tracing::debug!(
            input_len = raw.len(),
            filtered_len = text.len(),
            sections = report.sections.len(),
            branches = report.branches.len(),
            gates = report.gates.len(),
            metrics = report.metrics.len(),
            "narrative extracted"
        );
        report
    }
}

/// Extract decision branches with the default configuration.
pub fn extract_branches_from_narrative(text: &str) -> Vec<DecisionBranch> {
    branches::extract_branches(text, &ExtractorConfig::default())
}

/// Extract decision gates with the default configuration.
pub fn extract_gates_from_narrative(text: &str) -> Vec<DecisionGate> {
    gates::extract_gates(text, &ExtractorConfig::default())
}

/// Extract headline metrics.
pub fn extract_metrics_from_narrative(text: &str) -> Vec<DecisionMetric> {
    metrics::extract_metrics(text)
}

/// Extract the recommendation with the default configuration.
pub fn extract_recommendation_from_narrative(text: &str) -> Recommendation {
    metrics::extract_recommendation(text, &ExtractorConfig::default())
}
