//! Benchmarks for narrative extraction.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use narrative_intel::analysis::{AnalysisPayload, resolve_scenario_tree};
use narrative_intel::config::ExtractorConfig;
use narrative_intel::narrative::{NarrativeExtractor, filter_json_from_markdown};

fn memo(branch_blocks: usize) -> String {
    let mut text = String::from("## 1. Executive Summary\nRECOMMENDED: Proceed with modifications\n\n");
    for i in 0..branch_blocks {
        text.push_str(&format!(
            "BRANCH {}: PROCEED {}\nExpected value: +${}K\nProbability of success: {}%\n\
             - Negotiate seller credits for the roof\n- Lock the rate before closing\n",
            i % 3 + 1,
            ["NOW", "WITH MODIFICATIONS", "CAUTIOUSLY"][i % 3],
            100 + i,
            40 + i % 50,
        ));
    }
    text.push_str("\nGATE 1: Inspection\nGATE 2: Appraisal\nDAY 45: Closing\n");
    text.push_str("```json\n{\"branches\": [{\"name\": \"PROCEED_NOW\"}]}\n```\n");
    text
}

fn bench_filter(c: &mut Criterion) {
    let text = memo(30);
    c.bench_function("filter_30_blocks", |bench| {
        bench.iter(|| black_box(filter_json_from_markdown(&text)))
    });
}

fn bench_extract(c: &mut Criterion) {
    let extractor = NarrativeExtractor::default();
    let small = memo(3);
    let large = memo(300);

    c.bench_function("extract_3_blocks", |bench| {
        bench.iter(|| black_box(extractor.extract(&small)))
    });
    c.bench_function("extract_300_blocks", |bench| {
        bench.iter(|| black_box(extractor.extract(&large)))
    });
}

fn bench_resolve(c: &mut Criterion) {
    let payload = AnalysisPayload::from_input(&memo(30)).unwrap();
    let config = ExtractorConfig::default();
    c.bench_function("resolve_narrative_30_blocks", |bench| {
        bench.iter(|| black_box(resolve_scenario_tree(&payload, &config)))
    });
}

criterion_group!(benches, bench_filter, bench_extract, bench_resolve);
criterion_main!(benches);
