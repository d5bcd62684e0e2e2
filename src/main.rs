//! narrative-intel CLI: decision-memo extraction from analysis output.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use narrative_intel::analysis::{AnalysisPayload, ScenarioTree, resolve_scenario_tree};
use narrative_intel::config::ExtractorConfig;
use narrative_intel::error::{NarrativeError, PayloadError};
use narrative_intel::format::{bar_width, format_currency, format_percent, parse_money};
use narrative_intel::narrative::{filter_json_from_markdown, segment_sections};
use narrative_intel::paths::AppPaths;
use narrative_intel::storage::{FileStorage, StoragePort};

/// Preference key holding the default `extract --format`.
const OUTPUT_FORMAT_KEY: &str = "output.format";

/// Width of the strength bars in the summary view.
const BAR_CELLS: f64 = 20.0;

#[derive(Parser)]
#[command(
    name = "narrative-intel",
    version,
    about = "Extract decision branches, gates and metrics from analysis output"
)]
struct Cli {
    /// Extractor config file (TOML). Defaults to the XDG config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the preference store.
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the scenario tree from structured JSON or narrative text.
    Extract {
        /// Input file. Reads stdin when omitted.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Output format. Falls back to the `output.format` preference, then JSON.
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Strip JSON noise from narrative text and print the rest.
    Filter {
        /// Input file. Reads stdin when omitted.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Segment narrative text into titled sections (JSON).
    Sections {
        /// Input file. Reads stdin when omitted.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Inspect or create the extractor config.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Manage persisted preferences.
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective config as TOML.
    Show,

    /// Write the default config file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum PrefsAction {
    /// Print the value stored under a key.
    Get { key: String },

    /// Store a value under a key.
    Set { key: String, value: String },

    /// Remove a key.
    Unset { key: String },

    /// List all stored preferences.
    List,

    /// Remove all stored preferences.
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Summary,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Extract { file, format } => {
            let config = ExtractorConfig::load_or_default(&config_path(&cli)?)?;
            let input = read_input(file.as_deref())?;
            let payload = AnalysisPayload::from_input(&input)?;
            let tree = resolve_scenario_tree(&payload, &config);

            let format = match format {
                Some(f) => *f,
                None => preferred_format(&prefs_path(&cli)?).unwrap_or(OutputFormat::Json),
            };
            match format {
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&tree).map_err(|e| {
                        PayloadError::Serialize {
                            message: e.to_string(),
                        }
                    })?;
                    println!("{json}");
                }
                OutputFormat::Summary => print_summary(&tree),
            }
        }

        Commands::Filter { file } => {
            let input = read_input(file.as_deref())?;
            println!("{}", filter_json_from_markdown(&input));
        }

        Commands::Sections { file } => {
            let input = read_input(file.as_deref())?;
            let sections = segment_sections(&filter_json_from_markdown(&input));
            let json = serde_json::to_string_pretty(&sections).into_diagnostic()?;
            println!("{json}");
        }

        Commands::Config { action } => {
            let path = config_path(&cli)?;
            match action {
                ConfigAction::Show => {
                    let config = ExtractorConfig::load_or_default(&path)?;
                    let toml = toml::to_string_pretty(&config).into_diagnostic()?;
                    println!("# {}", path.display());
                    print!("{toml}");
                }
                ConfigAction::Init { force } => {
                    if path.exists() && !force {
                        miette::bail!(
                            help = "Pass --force to overwrite it.",
                            "config already exists at {}",
                            path.display()
                        );
                    }
                    ExtractorConfig::default().save(&path)?;
                    println!("Wrote default config to {}", path.display());
                }
            }
        }

        Commands::Prefs { action } => {
            let mut store = FileStorage::open(&prefs_path(&cli)?)?;
            match action {
                PrefsAction::Get { key } => match store.get(key)? {
                    Some(value) => println!("{value}"),
                    None => eprintln!("{key} is not set"),
                },
                PrefsAction::Set { key, value } => {
                    if key == OUTPUT_FORMAT_KEY && OutputFormat::from_str(value, true).is_err() {
                        miette::bail!(
                            help = "Use `json` or `summary`.",
                            "invalid value for {OUTPUT_FORMAT_KEY}: {value}"
                        );
                    }
                    store.set(key, value)?;
                    println!("{key} = {value}");
                }
                PrefsAction::Unset { key } => {
                    if store.remove(key)? {
                        println!("Removed {key}");
                    } else {
                        println!("{key} was not set");
                    }
                }
                PrefsAction::List => {
                    let keys = store.keys()?;
                    if keys.is_empty() {
                        println!("No preferences stored.");
                    }
                    for key in keys {
                        let value = store.get(&key)?.unwrap_or_default();
                        println!("{key} = {value}");
                    }
                }
                PrefsAction::Clear => {
                    store.clear()?;
                    println!("Cleared preferences in {}", store.path().display());
                }
            }
        }
    }

    Ok(())
}

fn config_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => Ok(AppPaths::resolve()?.config_file()),
    }
}

fn prefs_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.state_dir {
        Some(dir) => Ok(dir.join("prefs.json")),
        None => Ok(AppPaths::resolve()?.prefs_file()),
    }
}

fn read_input(file: Option<&Path>) -> std::result::Result<String, NarrativeError> {
    match file {
        Some(path) => std::fs::read_to_string(path).map_err(|e| NarrativeError::Input {
            path: path.display().to_string(),
            source: e,
        }),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| NarrativeError::Input {
                    path: "<stdin>".to_string(),
                    source: e,
                })?;
            Ok(buf)
        }
    }
}

/// The stored default format. A broken store or value only costs the preference.
fn preferred_format(prefs: &Path) -> Option<OutputFormat> {
    let stored = match FileStorage::open(prefs).and_then(|s| s.get(OUTPUT_FORMAT_KEY)) {
        Ok(value) => value?,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable preference store");
            return None;
        }
    };
    match OutputFormat::from_str(&stored, true) {
        Ok(format) => Some(format),
        Err(_) => {
            tracing::warn!(value = %stored, "ignoring invalid {OUTPUT_FORMAT_KEY} preference");
            None
        }
    }
}

fn print_summary(tree: &ScenarioTree) {
    println!("Source: {:?}", tree.source);

    let rec = &tree.recommendation;
    if rec.branch.is_empty() {
        println!("Recommendation: (none stated)");
    } else {
        println!("Recommendation: {}", rec.branch);
    }
    for line in &rec.rationale {
        println!("  - {line}");
    }

    if !tree.branches.is_empty() {
        let strongest = tree
            .branches
            .iter()
            .map(|b| b.strength)
            .fold(0.0_f64, f64::max);
        println!("\nBranches ({}):", tree.branches.len());
        for b in &tree.branches {
            let mark = if b.is_recommended { "*" } else { " " };
            let cells = (bar_width(b.strength, strongest) / 100.0 * BAR_CELLS).round() as usize;
            let exact = parse_money(&b.expected_value)
                .map(|v| format!(" ({})", format_currency(v)))
                .unwrap_or_default();
            println!(
                "  [{mark}] {:<28} EV {}{exact}  {:>4} {}",
                b.display_name,
                b.expected_value,
                format_percent(b.strength, 0),
                "█".repeat(cells)
            );
            for condition in &b.conditions {
                println!("        - {condition}");
            }
        }
    }

    if !tree.gates.is_empty() {
        println!("\nGates ({}):", tree.gates.len());
        for g in &tree.gates {
            println!(
                "  {}. day {:>3}  {}  (pass: {}; fail: {})",
                g.gate_number, g.day, g.check, g.if_pass, g.if_fail
            );
        }
    }

    if !tree.metrics.is_empty() {
        println!("\nMetrics:");
        for m in &tree.metrics {
            println!("  {}: {} [{:?}]", m.label, m.value, m.kind);
        }
    }

    if !tree.matrix.is_empty() {
        println!("\nComparison matrix:");
        for row in &tree.matrix {
            let cells: Vec<String> = row
                .cells
                .iter()
                .map(|(option, cell)| format!("{option}: {}", cell.text))
                .collect();
            println!("  {}: {}", row.criterion, cells.join(" | "));
        }
    }

    if let Some(mv) = &tree.market_validation {
        println!("\nMarket validation:");
        if let Some(juiciness) = mv.juiciness {
            println!("  juiciness: {juiciness:?}");
        }
        if let Some(score) = mv.score {
            println!("  score: {score}");
        }
        if let Some(summary) = &mv.summary {
            println!("  {summary}");
        }
    }

    if !tree.sections.is_empty() {
        println!("\nSections:");
        for s in &tree.sections {
            println!("  {}. {} [{:?}]", s.number, s.title, s.kind);
        }
    }
}
