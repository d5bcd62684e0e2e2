//! Structured analysis payloads and scenario-tree resolution.
//!
//! The analysis service normally answers with structured JSON: decision
//! branches, gates, a comparison matrix and a market-validation block. When
//! it could not produce those it sends only `raw_analysis` prose, and the
//! narrative fallback in [`crate::narrative`] recovers what it can.
//! [`resolve_scenario_tree`] picks the path and hands back one uniform
//! [`ScenarioTree`] either way.
//!
//! Field names are accepted in both `snake_case` and `camelCase`, since both
//! spellings have been observed from the service.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ExtractorConfig;
use crate::error::{PayloadError, PayloadResult};
use crate::format::format_compact_currency;
use crate::narrative::branches::{DEFAULT_EXPECTED_VALUE, DEFAULT_STRENGTH, RECOMMENDED_VERDICT};
use crate::narrative::metrics::GENERIC_RATIONALE;
use crate::narrative::{
    BranchName, DecisionBranch, DecisionGate, DecisionMetric, MetricKind, NarrativeExtractor,
    Recommendation, Section, recommended_branch,
};

// ── Payload model ───────────────────────────────────────────────────────

/// A number or a string, as the service sends either for amounts and values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

impl Scalar {
    fn display(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
        }
    }
}

/// The analysis service response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisPayload {
    pub branches: Vec<BranchPayload>,
    pub gates: Vec<GatePayload>,
    pub matrix: Vec<MatrixRow>,
    #[serde(alias = "marketValidation")]
    pub market_validation: Option<MarketValidation>,
    #[serde(alias = "rawAnalysis")]
    pub raw_analysis: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchPayload {
    /// Wire identifier (`PROCEED_NOW`) or a display name.
    pub name: String,
    #[serde(alias = "displayName")]
    pub display_name: Option<String>,
    #[serde(alias = "expectedValue")]
    pub expected_value: Option<Scalar>,
    /// Either a fraction in `[0, 1]` or a percentage.
    pub strength: Option<f64>,
    pub conditions: Vec<String>,
    pub verdict: Option<String>,
    #[serde(alias = "isRecommended", alias = "recommended")]
    pub is_recommended: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatePayload {
    #[serde(alias = "gateNumber", alias = "gate")]
    pub gate_number: Option<u32>,
    pub day: u32,
    #[serde(alias = "condition")]
    pub check: String,
    #[serde(alias = "ifPass")]
    pub if_pass: String,
    #[serde(alias = "ifFail")]
    pub if_fail: String,
}

/// One criterion of the comparison matrix, with a cell per option.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixRow {
    #[serde(alias = "label")]
    pub criterion: String,
    #[serde(alias = "values")]
    pub cells: BTreeMap<String, MatrixCell>,
}

/// A comparison-matrix cell in any of the shapes the service emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatrixCell {
    Number(f64),
    Text(String),
    Detail(CellDetail),
}

/// Object-shaped cell: `{"value": "High", "score": 8, "note": "…", "tone": "good"}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellDetail {
    #[serde(alias = "text", alias = "label")]
    pub value: Option<Scalar>,
    pub score: Option<f64>,
    #[serde(alias = "notes", alias = "detail")]
    pub note: Option<String>,
    #[serde(alias = "rating", alias = "status")]
    pub tone: Option<String>,
}

/// A matrix cell reduced to what the table renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedCell {
    pub text: String,
    pub score: Option<f64>,
    pub note: Option<String>,
    #[serde(rename = "type")]
    pub kind: MetricKind,
}

impl MatrixCell {
    pub fn normalize(&self) -> NormalizedCell {
        match self {
            Self::Number(n) => NormalizedCell {
                text: n.to_string(),
                score: Some(*n),
                note: None,
                kind: MetricKind::Neutral,
            },
            Self::Text(s) => {
                let text = s.trim();
                let kind = if text.starts_with(['-', '−']) {
                    MetricKind::Bad
                } else if text.starts_with('+') {
                    MetricKind::Good
                } else {
                    MetricKind::Neutral
                };
                NormalizedCell {
                    text: text.to_string(),
                    score: None,
                    note: None,
                    kind,
                }
            }
            Self::Detail(detail) => {
                let text = match (&detail.value, detail.score) {
                    (Some(value), _) => value.display(),
                    (None, Some(score)) => score.to_string(),
                    (None, None) => String::new(),
                };
                NormalizedCell {
                    text,
                    score: detail.score,
                    note: detail.note.clone().filter(|n| !n.trim().is_empty()),
                    kind: detail.tone.as_deref().map_or(MetricKind::Neutral, tone_kind),
                }
            }
        }
    }
}

fn tone_kind(tone: &str) -> MetricKind {
    match tone.trim().to_ascii_lowercase().as_str() {
        "good" | "positive" | "pass" | "favorable" | "high" => MetricKind::Good,
        "bad" | "negative" | "fail" | "unfavorable" | "low" => MetricKind::Bad,
        _ => MetricKind::Neutral,
    }
}

/// Upstream scoring label for an opportunity. Displayed, never computed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Juiciness {
    Juicy,
    Moderate,
    #[serde(alias = "FAR-FETCHED")]
    FarFetched,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketValidation {
    pub juiciness: Option<Juiciness>,
    pub score: Option<f64>,
    pub summary: Option<String>,
    pub comparables: Vec<String>,
}

impl AnalysisPayload {
    /// Interpret CLI or service input.
    ///
    /// Text that starts like JSON and parses as JSON must be an analysis
    /// object. Anything else is narrative prose and becomes `raw_analysis`.
    pub fn from_input(input: &str) -> PayloadResult<Self> {
        let trimmed = input.trim_start();
        if trimmed.starts_with(['{', '[']) {
            if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
                if !value.is_object() {
                    return Err(PayloadError::Shape {
                        message: "expected a JSON object at the top level".into(),
                    });
                }
                return serde_json::from_value(value).map_err(|e| PayloadError::Shape {
                    message: e.to_string(),
                });
            }
            tracing::debug!("input looks like JSON but does not parse, treating as narrative");
        }
        Ok(Self {
            raw_analysis: Some(input.to_string()),
            ..Default::default()
        })
    }

    pub fn has_structured_branches(&self) -> bool {
        !self.branches.is_empty()
    }
}

// ── Scenario tree ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeSource {
    Structured,
    Narrative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub criterion: String,
    pub cells: BTreeMap<String, NormalizedCell>,
}

/// What the scenario-tree section of the report renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioTree {
    pub source: TreeSource,
    pub branches: Vec<DecisionBranch>,
    pub gates: Vec<DecisionGate>,
    pub metrics: Vec<DecisionMetric>,
    pub recommendation: Recommendation,
    /// Only populated on the narrative path.
    pub sections: Vec<Section>,
    pub matrix: Vec<NormalizedRow>,
    pub market_validation: Option<MarketValidation>,
}

/// Build the scenario tree from structured data when present, else from prose.
///
/// Structured gates are kept on either path; the narrative gates are only
/// used when the payload has none.
pub fn resolve_scenario_tree(payload: &AnalysisPayload, config: &ExtractorConfig) -> ScenarioTree {
    let matrix = normalize_matrix(&payload.matrix);
    let structured_gates = convert_gates(&payload.gates);

    if payload.has_structured_branches() {
        let branches = convert_branches(&payload.branches);
        let recommendation = structured_recommendation(&branches, config);
        let metrics = structured_metrics(&branches);
        tracing::debug!(branches = branches.len(), "using structured scenario tree");
        return ScenarioTree {
            source: TreeSource::Structured,
            branches,
            gates: structured_gates,
            metrics,
            recommendation,
            sections: Vec::new(),
            matrix,
            market_validation: payload.market_validation.clone(),
        };
    }

    let raw = payload.raw_analysis.as_deref().unwrap_or_default();
    if raw.trim().is_empty() {
        tracing::warn!("payload has neither structured branches nor narrative text");
    }
    let report = NarrativeExtractor::new(config.clone()).extract(raw);
    ScenarioTree {
        source: TreeSource::Narrative,
        branches: report.branches,
        gates: if structured_gates.is_empty() {
            report.gates
        } else {
            structured_gates
        },
        metrics: report.metrics,
        recommendation: report.recommendation,
        sections: report.sections,
        matrix,
        market_validation: payload.market_validation.clone(),
    }
}

fn convert_branches(payloads: &[BranchPayload]) -> Vec<DecisionBranch> {
    let mut branches = Vec::new();
    for p in payloads {
        let name = BranchName::parse(&p.name)
            .or_else(|| p.display_name.as_deref().and_then(BranchName::parse));
        let Some(name) = name else {
            tracing::warn!(name = %p.name, "skipping structured branch with unknown name");
            continue;
        };

        let verdict = match p.verdict.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => v.to_string(),
            _ if p.is_recommended => RECOMMENDED_VERDICT.to_string(),
            _ => String::new(),
        };
        branches.push(DecisionBranch {
            name,
            display_name: p
                .display_name
                .clone()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| name.display_name().to_string()),
            expected_value: p
                .expected_value
                .as_ref()
                .map_or_else(|| DEFAULT_EXPECTED_VALUE.to_string(), display_amount),
            strength: p.strength.map_or(DEFAULT_STRENGTH, normalize_strength),
            conditions: p.conditions.clone(),
            verdict,
            is_recommended: p.is_recommended,
        });
    }
    branches
}

fn display_amount(amount: &Scalar) -> String {
    match amount {
        Scalar::Number(n) if *n > 0.0 => format!("+{}", format_compact_currency(*n)),
        Scalar::Number(n) => format_compact_currency(*n),
        Scalar::Text(s) => s.trim().to_string(),
    }
}

fn normalize_strength(raw: f64) -> f64 {
    if !raw.is_finite() {
        return DEFAULT_STRENGTH;
    }
    let fraction = if raw > 1.0 { raw / 100.0 } else { raw };
    fraction.clamp(0.0, 1.0)
}

fn convert_gates(payloads: &[GatePayload]) -> Vec<DecisionGate> {
    let mut gates: Vec<DecisionGate> = payloads
        .iter()
        .zip(1u32..)
        .map(|(p, position)| DecisionGate {
            gate_number: p.gate_number.unwrap_or(position),
            day: p.day,
            check: p.check.trim().to_string(),
            if_pass: p.if_pass.trim().to_string(),
            if_fail: p.if_fail.trim().to_string(),
        })
        .collect();
    gates.sort_by_key(|g| g.gate_number);
    gates
}

fn structured_recommendation(branches: &[DecisionBranch], config: &ExtractorConfig) -> Recommendation {
    let Some(branch) = recommended_branch(branches) else {
        return Recommendation::default();
    };
    let mut rationale: Vec<String> = branch
        .conditions
        .iter()
        .take(config.rationale_target)
        .cloned()
        .collect();
    if rationale.is_empty() {
        rationale = GENERIC_RATIONALE.iter().map(|s| s.to_string()).collect();
    }
    Recommendation {
        branch: branch.display_name.clone(),
        rationale,
    }
}

fn structured_metrics(branches: &[DecisionBranch]) -> Vec<DecisionMetric> {
    recommended_branch(branches)
        .map(|branch| DecisionMetric {
            label: "Expected Value".to_string(),
            value: branch.expected_value.trim_start_matches('+').to_string(),
            kind: if branch.expected_value.starts_with('-') {
                MetricKind::Bad
            } else {
                MetricKind::Good
            },
        })
        .into_iter()
        .collect()
}

fn normalize_matrix(rows: &[MatrixRow]) -> Vec<NormalizedRow> {
    rows.iter()
        .map(|row| NormalizedRow {
            criterion: row.criterion.trim().to_string(),
            cells: row
                .cells
                .iter()
                .map(|(option, cell)| (option.clone(), cell.normalize()))
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STRUCTURED: &str = r#"{
        "branches": [
            {"name": "PROCEED_NOW", "expectedValue": 500000, "strength": 70,
             "conditions": ["Financing pre-approved"]},
            {"name": "PROCEED_MODIFIED", "displayName": "Proceed with Modifications",
             "expected_value": "+$350K", "strength": 0.6, "isRecommended": true,
             "conditions": ["Negotiate 5% lower price", "Add inspection contingency"]},
            {"name": "DO_NOT_PROCEED", "expectedValue": 0}
        ],
        "gates": [
            {"gateNumber": 2, "day": 14, "check": "Contract signed", "ifPass": "Close", "ifFail": "Walk"},
            {"gateNumber": 1, "day": 7, "check": "Inspection", "ifPass": "Negotiate", "ifFail": "Walk"}
        ],
        "matrix": [
            {"criterion": "Risk", "cells": {"PROCEED_NOW": "High", "DO_NOT_PROCEED": 2,
             "PROCEED_MODIFIED": {"value": "Medium", "score": 5, "note": "hedged", "tone": "good"}}}
        ],
        "marketValidation": {"juiciness": "FAR-FETCHED", "score": 3.5}
    }"#;

    fn resolve(payload: &AnalysisPayload) -> ScenarioTree {
        resolve_scenario_tree(payload, &ExtractorConfig::default())
    }

    #[test]
    fn structured_payload_bypasses_extraction() {
        let payload = AnalysisPayload::from_input(STRUCTURED).unwrap();
        let tree = resolve(&payload);
        assert_eq!(tree.source, TreeSource::Structured);
        assert!(tree.sections.is_empty());
        assert_eq!(tree.branches.len(), 3);

        let now = &tree.branches[0];
        assert_eq!(now.display_name, "Proceed Now");
        assert_eq!(now.expected_value, "+$500K");
        assert_eq!(now.strength, 0.7);
        assert!(!now.is_recommended);
        assert!(now.verdict.is_empty());

        let modified = &tree.branches[1];
        assert_eq!(modified.expected_value, "+$350K");
        assert!(modified.is_recommended);
        assert_eq!(modified.verdict, RECOMMENDED_VERDICT);

        assert_eq!(tree.branches[2].expected_value, "$0");
        assert_eq!(tree.branches[2].strength, DEFAULT_STRENGTH);
    }

    #[test]
    fn structured_recommendation_and_metric() {
        let tree = resolve(&AnalysisPayload::from_input(STRUCTURED).unwrap());
        assert_eq!(tree.recommendation.branch, "Proceed with Modifications");
        assert_eq!(
            tree.recommendation.rationale,
            vec!["Negotiate 5% lower price", "Add inspection contingency"]
        );
        assert_eq!(tree.metrics.len(), 1);
        assert_eq!(tree.metrics[0].value, "$350K");
        assert_eq!(tree.metrics[0].kind, MetricKind::Good);
    }

    #[test]
    fn structured_gates_are_ordered() {
        let tree = resolve(&AnalysisPayload::from_input(STRUCTURED).unwrap());
        let numbers: Vec<u32> = tree.gates.iter().map(|g| g.gate_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(tree.gates[0].check, "Inspection");
    }

    #[test]
    fn matrix_cells_normalize_per_shape() {
        let tree = resolve(&AnalysisPayload::from_input(STRUCTURED).unwrap());
        let risk = &tree.matrix[0];
        assert_eq!(risk.criterion, "Risk");

        let text = &risk.cells["PROCEED_NOW"];
        assert_eq!(text.text, "High");
        assert_eq!(text.score, None);

        let number = &risk.cells["DO_NOT_PROCEED"];
        assert_eq!(number.text, "2");
        assert_eq!(number.score, Some(2.0));

        let detail = &risk.cells["PROCEED_MODIFIED"];
        assert_eq!(detail.text, "Medium");
        assert_eq!(detail.score, Some(5.0));
        assert_eq!(detail.note.as_deref(), Some("hedged"));
        assert_eq!(detail.kind, MetricKind::Good);
    }

    #[test]
    fn signed_text_cells_carry_tone() {
        assert_eq!(MatrixCell::Text("-$20K".into()).normalize().kind, MetricKind::Bad);
        assert_eq!(MatrixCell::Text("+12%".into()).normalize().kind, MetricKind::Good);
        let empty = MatrixCell::Detail(CellDetail::default()).normalize();
        assert!(empty.text.is_empty());
        assert_eq!(empty.kind, MetricKind::Neutral);
    }

    #[test]
    fn market_validation_juiciness() {
        let payload = AnalysisPayload::from_input(STRUCTURED).unwrap();
        let mv = payload.market_validation.unwrap();
        assert_eq!(mv.juiciness, Some(Juiciness::FarFetched));
        assert_eq!(mv.score, Some(3.5));
    }

    #[test]
    fn prose_input_becomes_raw_analysis() {
        let payload = AnalysisPayload::from_input("BRANCH 1: PROCEED NOW").unwrap();
        assert_eq!(payload.raw_analysis.as_deref(), Some("BRANCH 1: PROCEED NOW"));
        assert!(!payload.has_structured_branches());
    }

    #[test]
    fn broken_json_is_prose() {
        let payload = AnalysisPayload::from_input("{ this is not json").unwrap();
        assert_eq!(payload.raw_analysis.as_deref(), Some("{ this is not json"));
    }

    #[test]
    fn json_of_the_wrong_shape_is_an_error() {
        assert!(matches!(
            AnalysisPayload::from_input("[1, 2, 3]"),
            Err(PayloadError::Shape { .. })
        ));
        assert!(matches!(
            AnalysisPayload::from_input(r#"{"branches": 5}"#),
            Err(PayloadError::Shape { .. })
        ));
    }

    #[test]
    fn narrative_fallback_when_no_branches() {
        let payload = AnalysisPayload::from_input(
            r#"{"rawAnalysis": "BRANCH 1: PROCEED NOW\nExpected value $500K with 70% confidence\nGATE 1: Inspection"}"#,
        )
        .unwrap();
        let tree = resolve(&payload);
        assert_eq!(tree.source, TreeSource::Narrative);
        assert_eq!(tree.branches.len(), 1);
        assert_eq!(tree.branches[0].name, BranchName::ProceedNow);
        assert_eq!(tree.gates.len(), 1);
        assert_eq!(tree.gates[0].day, 7);
    }

    #[test]
    fn structured_gates_win_on_narrative_path() {
        let payload = AnalysisPayload {
            raw_analysis: Some("GATE 1: from prose".into()),
            gates: vec![GatePayload {
                gate_number: None,
                day: 3,
                check: "from payload".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let tree = resolve(&payload);
        assert_eq!(tree.gates.len(), 1);
        assert_eq!(tree.gates[0].gate_number, 1);
        assert_eq!(tree.gates[0].check, "from payload");
    }

    #[test]
    fn empty_payload_yields_empty_tree() {
        let tree = resolve(&AnalysisPayload::default());
        assert_eq!(tree.source, TreeSource::Narrative);
        assert!(tree.branches.is_empty());
        assert!(tree.gates.is_empty());
        assert_eq!(tree.recommendation.rationale, GENERIC_RATIONALE.to_vec());
    }

    #[test]
    fn unknown_branch_names_are_skipped() {
        let payload = AnalysisPayload {
            branches: vec![
                BranchPayload {
                    name: "WAIT_AND_SEE".into(),
                    ..Default::default()
                },
                BranchPayload {
                    name: "custom".into(),
                    display_name: Some("Do Not Proceed".into()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let tree = resolve(&payload);
        assert_eq!(tree.branches.len(), 1);
        assert_eq!(tree.branches[0].name, BranchName::DoNotProceed);
        assert_eq!(tree.branches[0].expected_value, DEFAULT_EXPECTED_VALUE);
        assert_eq!(tree.recommendation, Recommendation::default());
    }

    #[test]
    fn strength_normalization() {
        assert_eq!(normalize_strength(0.25), 0.25);
        assert_eq!(normalize_strength(85.0), 0.85);
        assert_eq!(normalize_strength(250.0), 1.0);
        assert_eq!(normalize_strength(-3.0), 0.0);
        assert_eq!(normalize_strength(f64::NAN), DEFAULT_STRENGTH);
    }
}
