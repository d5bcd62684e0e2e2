// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # narrative-intel
//!
//! Recovers decision-memo structure (branches, gates, metrics, a
//! recommendation) from the analysis service's output, whether that output
//! is structured JSON or free-form narrative text.
//!
//! ## Architecture
//!
//! - **Narrative fallback** (`narrative`): regex heuristics over prose, all total
//! - **Structured path** (`analysis`): serde model of the service payload and
//!   the resolver that picks between it and the fallback
//! - **Formatting** (`format`): currency, percentages, bar widths
//! - **Preferences** (`storage`): injectable key/value port with memory and file backends
//! - **Configuration** (`config`, `paths`): TOML extractor tuning under XDG directories
//!
//! ## Library usage
//!
//! ```
//! use narrative_intel::analysis::{AnalysisPayload, TreeSource, resolve_scenario_tree};
//! use narrative_intel::config::ExtractorConfig;
//!
//! let text = "BRANCH 1: PROCEED NOW (RECOMMENDED)\nExpected value: +$500K, 70% confidence\nGATE 1: Inspection";
//! let payload = AnalysisPayload::from_input(text).unwrap();
//! let tree = resolve_scenario_tree(&payload, &ExtractorConfig::default());
//! assert_eq!(tree.source, TreeSource::Narrative);
//! assert_eq!(tree.branches[0].expected_value, "+$500K");
//! assert_eq!(tree.gates[0].day, 7);
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod format;
pub mod narrative;
pub mod paths;
pub mod storage;
