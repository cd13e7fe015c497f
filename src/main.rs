use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use serde::Serialize;
use servicemap::candidates::{derive_candidates, ServiceCandidate};
use servicemap::cli::{log_directive, Cli, Commands, GranularityArg, OutputFormat};
use servicemap::community::{redetect, Detection, DetectionWarning, HierarchicalDetector};
use servicemap::config::{discover_config, load_config, ServicemapConfig};
use servicemap::graph::{CallGraph, CallGraphBuilder, CallObservation};
use servicemap::report::{render_graph, PartitionReport};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

struct DetectArgs {
    input: PathBuf,
    config: Option<PathBuf>,
    granularity: Option<GranularityArg>,
    prior: Option<PathBuf>,
    format: OutputFormat,
    output: Option<PathBuf>,
    show_graph: bool,
    plain: bool,
}

/// JSON output document
#[derive(Serialize)]
struct DetectionOutput<'a> {
    assignment: &'a BTreeMap<String, String>,
    candidates: Vec<ServiceCandidate>,
    levels: usize,
    modularity: f64,
    warnings: &'a [DetectionWarning],
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Detect {
            input,
            config,
            granularity,
            prior,
            format,
            output,
            show_graph,
            plain,
            verbosity,
        } => {
            init_tracing(verbosity);
            handle_detect(DetectArgs {
                input,
                config,
                granularity,
                prior,
                format,
                output,
                show_graph,
                plain,
            })
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&ServicemapConfig::default())?);
            Ok(())
        }
    }
}

/// Logs go to stderr; `RUST_LOG` takes precedence over `-v`.
fn init_tracing(verbosity: u8) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| log_directive(verbosity).into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn handle_detect(args: DetectArgs) -> Result<()> {
    let mut config = resolve_config(args.config.as_deref())?;
    if let Some(granularity) = args.granularity {
        config.detection.granularity = granularity.into();
    }
    config.detection.validate()?;

    let graph = read_graph(&args.input, &config)?;
    let detector = HierarchicalDetector::new(config.detection);

    let detection = match &args.prior {
        Some(path) => {
            let prior = read_json::<BTreeMap<String, String>>(path)?;
            redetect(&graph, &prior, &detector).with_context(|| {
                format!("Prior assignment {} does not fit the input", path.display())
            })?
        }
        None => detector.detect(&graph),
    };
    info!(
        communities = detection.community_count(),
        levels = detection.levels,
        modularity = detection.modularity,
        "Detection finished"
    );

    if args.plain || args.output.is_some() {
        colored::control::set_override(false);
    }
    let rendered = match args.format {
        OutputFormat::Json => render_json(&graph, &detection)?,
        OutputFormat::Text => render_text(&graph, &detection, args.show_graph),
    };

    match &args.output {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => print!("{rendered}"),
    }
    Ok(())
}

fn resolve_config(explicit: Option<&Path>) -> Result<ServicemapConfig> {
    match explicit {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load configuration {}", path.display())),
        None => Ok(discover_config(&std::env::current_dir()?)),
    }
}

fn read_graph(input: &Path, config: &ServicemapConfig) -> Result<CallGraph> {
    let observations = read_json::<Vec<CallObservation>>(input)?;
    let mut builder = CallGraphBuilder::new().with_granularity(config.detection.granularity);
    builder.observe_all(observations);

    let dropped = builder.dropped();
    if dropped.non_positive > 0 {
        warn!(
            count = dropped.non_positive,
            "Ignored observations with non-positive counts"
        );
    }
    builder
        .build()
        .with_context(|| format!("Failed to build call graph from {}", input.display()))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn render_json(graph: &CallGraph, detection: &Detection) -> Result<String> {
    let output = DetectionOutput {
        assignment: &detection.assignment,
        candidates: derive_candidates(graph, &detection.assignment),
        levels: detection.levels,
        modularity: detection.modularity,
        warnings: &detection.warnings,
    };
    let mut json = serde_json::to_string_pretty(&output)?;
    json.push('\n');
    Ok(json)
}

fn render_text(graph: &CallGraph, detection: &Detection, show_graph: bool) -> String {
    let mut out = String::new();
    if show_graph {
        out.push_str(&render_graph(graph).to_string());
        out.push('\n');
    }

    let title = format!(
        "Communities after {} level(s), modularity {:.4}",
        detection.levels, detection.modularity
    );
    let report = PartitionReport::new(title.bold().to_string(), graph, &detection.assignment);
    out.push_str(&report.to_string());

    for warning in &detection.warnings {
        out.push_str(&format!("{} {warning}\n", "warning:".yellow().bold()));
    }
    out
}
