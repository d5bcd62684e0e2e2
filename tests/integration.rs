//! End-to-end integration tests for narrative-intel.
//!
//! These tests run full analysis documents through the public API: payload
//! detection, JSON-noise filtering, every narrative extractor, and the
//! structured path, checking that the pieces agree with each other.

use narrative_intel::analysis::{AnalysisPayload, TreeSource, resolve_scenario_tree};
use narrative_intel::config::ExtractorConfig;
use narrative_intel::format::parse_money;
use narrative_intel::narrative::{
    BranchName, MetricKind, NarrativeExtractor, SectionKind, extract_branches_from_narrative,
    extract_gates_from_narrative, filter_json_from_markdown, recommended_branch,
};

const MEMO: &str = "\
# Investment Decision Memo

## 1. Executive Summary
The duplex at 14 Elm St is priced 8% below comparables.
RECOMMENDED: Proceed with modifications

## 2. Decision Tree
BRANCH 1: PROCEED NOW
Expected value: +$420K
Probability of success: 55%
- Close at asking price
BRANCH 2: PROCEED WITH MODIFICATIONS
Expected value: +$510K
Probability of success: 70%
- Negotiate a 5% price reduction
- Add an inspection contingency
BRANCH 3: DO NOT PROCEED
Expected value: $0
Probability of success: 100%

## 3. Timeline
GATE 1: Inspection report reviewed
GATE 2: Financing commitment letter received
DAY 45: Closing funds wired

## 4. Key Figures
Worst case: -$80K
Best case: $900K
ROI: 14%

```json
{\"branches\": [], \"gates\": []}
```
";

const STRUCTURED: &str = r#"{
    "branches": [
        {"name": "PROCEED_NOW", "expectedValue": 420000, "strength": 0.55},
        {"name": "PROCEED_MODIFIED", "expectedValue": 510000, "strength": 0.7, "isRecommended": true},
        {"name": "DO_NOT_PROCEED", "expectedValue": 0, "strength": 1.0}
    ],
    "gates": [
        {"gateNumber": 1, "day": 7, "check": "Inspection report reviewed"},
        {"gateNumber": 2, "day": 14, "check": "Financing commitment letter received"}
    ]
}"#;

fn report() -> narrative_intel::narrative::NarrativeReport {
    NarrativeExtractor::default().extract(MEMO)
}

#[test]
fn memo_branches_keep_their_own_figures() {
    let report = report();
    assert_eq!(report.branches.len(), 3);

    let now = &report.branches[0];
    assert_eq!(now.name, BranchName::ProceedNow);
    assert_eq!(now.expected_value, "+$420K");
    assert!((now.strength - 0.55).abs() < 1e-9);
    assert_eq!(now.conditions, vec!["Close at asking price"]);

    let modified = &report.branches[1];
    assert_eq!(modified.name, BranchName::ProceedModified);
    assert_eq!(modified.expected_value, "+$510K");
    assert!((modified.strength - 0.70).abs() < 1e-9);
    assert_eq!(
        modified.conditions,
        vec!["Negotiate a 5% price reduction", "Add an inspection contingency"]
    );

    let not = &report.branches[2];
    assert_eq!(not.name, BranchName::DoNotProceed);
    assert_eq!(not.expected_value, "+$0");
    assert_eq!(not.strength, 1.0);
}

#[test]
fn memo_has_exactly_one_recommendation() {
    let report = report();
    let recommended: Vec<_> = report.branches.iter().filter(|b| b.is_recommended).collect();
    assert_eq!(recommended.len(), 1);
    assert_eq!(recommended[0].name, BranchName::ProceedModified);
    assert_eq!(report.recommendation.branch, "Proceed with modifications");
    assert_eq!(
        report.recommendation.rationale,
        vec![
            "Close at asking price",
            "Negotiate a 5% price reduction",
            "Add an inspection contingency",
        ]
    );
}

#[test]
fn memo_gates_in_order() {
    let gates = report().gates;
    let summary: Vec<(u32, u32)> = gates.iter().map(|g| (g.gate_number, g.day)).collect();
    assert_eq!(summary, vec![(1, 7), (2, 14), (3, 45)]);
    assert_eq!(gates[2].check, "Closing funds wired");
}

#[test]
fn memo_metrics() {
    let metrics = report().metrics;
    let labels: Vec<&str> = metrics.iter().map(|m| m.label.as_str()).collect();
    assert_eq!(labels, vec!["Expected Value", "Worst Case", "Best Case", "ROI"]);
    assert_eq!(metrics[0].value, "$420K");
    assert_eq!(metrics[1].value, "-$80K");
    assert_eq!(metrics[1].kind, MetricKind::Bad);
    assert_eq!(metrics[2].value, "$900K");
    assert_eq!(metrics[3].value, "14%");
    assert_eq!(metrics[3].kind, MetricKind::Good);

    for m in &metrics[..3] {
        assert!(parse_money(&m.value).is_some(), "{} should parse", m.value);
    }
}

#[test]
fn memo_sections() {
    let sections = report().sections;
    let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
    // "Decision Tree" has no content of its own before BRANCH 1 and is dropped.
    assert_eq!(
        titles,
        vec![
            "Executive Summary",
            "BRANCH 1: PROCEED NOW",
            "BRANCH 2: PROCEED WITH MODIFICATIONS",
            "BRANCH 3: DO NOT PROCEED",
            "Timeline",
            "Key Figures",
        ]
    );
    assert_eq!(sections[0].kind, SectionKind::Decision);
    assert!(sections[1..4].iter().all(|s| s.kind == SectionKind::Path));
    assert_eq!(sections[5].kind, SectionKind::Text);
    assert!(!sections[5].content.contains("branches"));
}

#[test]
fn filter_strips_the_trailing_payload_only() {
    let filtered = filter_json_from_markdown(MEMO);
    assert!(!filtered.contains("```"));
    assert!(!filtered.contains("\"branches\""));
    assert!(filtered.starts_with("# Investment Decision Memo"));
    assert!(filtered.ends_with("ROI: 14%"));
    assert_eq!(filter_json_from_markdown(&filtered), filtered);
}

#[test]
fn structured_and_narrative_paths_agree_on_cardinality() {
    let config = ExtractorConfig::default();

    let structured = resolve_scenario_tree(&AnalysisPayload::from_input(STRUCTURED).unwrap(), &config);
    let narrative = resolve_scenario_tree(&AnalysisPayload::from_input(MEMO).unwrap(), &config);

    assert_eq!(structured.source, TreeSource::Structured);
    assert_eq!(narrative.source, TreeSource::Narrative);
    assert_eq!(structured.branches.len(), 3);
    assert_eq!(narrative.branches.len(), 3);
    assert_eq!(
        recommended_branch(&structured.branches).map(|b| b.name),
        recommended_branch(&narrative.branches).map(|b| b.name)
    );
    assert_eq!(structured.branches[1].expected_value, narrative.branches[1].expected_value);
}

#[test]
fn json_payload_with_raw_analysis_uses_fallback() {
    let wrapped = serde_json::json!({ "raw_analysis": MEMO }).to_string();
    let tree = resolve_scenario_tree(
        &AnalysisPayload::from_input(&wrapped).unwrap(),
        &ExtractorConfig::default(),
    );
    assert_eq!(tree.source, TreeSource::Narrative);
    assert_eq!(tree.branches.len(), 3);
    assert_eq!(tree.gates.len(), 3);
}

#[test]
fn scenario_tree_serializes_with_front_end_names() {
    let tree = resolve_scenario_tree(
        &AnalysisPayload::from_input(MEMO).unwrap(),
        &ExtractorConfig::default(),
    );
    let json = serde_json::to_value(&tree).unwrap();
    assert_eq!(json["source"], "narrative");
    assert_eq!(json["branches"][1]["name"], "PROCEED_MODIFIED");
    assert_eq!(json["branches"][1]["displayName"], "Proceed with Modifications");
    assert_eq!(json["branches"][1]["isRecommended"], true);
    assert_eq!(json["gates"][0]["gateNumber"], 1);
    assert_eq!(json["gates"][0]["ifPass"], "Continue to next phase");
    assert_eq!(json["metrics"][1]["type"], "bad");
    assert_eq!(json["sections"][0]["type"], "decision");
}

#[test]
fn cadence_config_flows_through_the_extractor() {
    let config = ExtractorConfig {
        gate_cadence_days: 10,
        ..Default::default()
    };
    let report = NarrativeExtractor::new(config).extract(MEMO);
    let days: Vec<u32> = report.gates.iter().map(|g| g.day).collect();
    assert_eq!(days, vec![10, 20, 45]);
}

#[test]
fn free_functions_match_the_facade_defaults() {
    let filtered = filter_json_from_markdown(MEMO);
    let report = report();
    assert_eq!(extract_branches_from_narrative(&filtered), report.branches);
    assert_eq!(extract_gates_from_narrative(&filtered), report.gates);
}

#[test]
fn unstructured_prose_renders_nothing_but_generic_rationale() {
    let tree = resolve_scenario_tree(
        &AnalysisPayload::from_input("The weather was pleasant all week.").unwrap(),
        &ExtractorConfig::default(),
    );
    assert!(tree.branches.is_empty());
    assert!(tree.gates.is_empty());
    assert!(tree.metrics.is_empty());
    assert!(tree.sections.is_empty());
    assert_eq!(tree.recommendation.rationale.len(), 2);
}
