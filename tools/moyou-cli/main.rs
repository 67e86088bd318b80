use clap::{Parser, ValueEnum};
use moyou::error::ConversionError;
use moyou::prelude::*;
use moyou::workflow::Position;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// --- JSON Deserialization Structs (Input Format Specific) ---
// These structs match the n8n workflow export format and are only used here for conversion.

#[derive(Deserialize)]
struct RawWorkflow {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    active: bool,
    #[serde(default)]
    nodes: Vec<RawNode>,
    /// `{source name: {port: [[{node, type, index}]]}}`
    #[serde(default)]
    connections: BTreeMap<String, BTreeMap<String, Vec<Vec<RawConnection>>>>,
    #[serde(default)]
    settings: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    meta: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Deserialize)]
struct RawNode {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default, alias = "typeVersion")]
    type_version: Option<f64>,
    #[serde(default)]
    position: Option<[f64; 2]>,
    #[serde(default)]
    parameters: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Deserialize)]
struct RawConnection {
    node: String,
    #[serde(default, rename = "type")]
    port: Option<String>,
}

/// A single export file holds either one workflow or an array of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawExport {
    Many(Vec<RawWorkflow>),
    One(Box<RawWorkflow>),
}

// --- Converter Implementation ---
// Connections in the export reference nodes by name; the canonical model uses ids.

impl IntoWorkflow for RawWorkflow {
    fn into_workflow(self) -> Result<WorkflowGraph, ConversionError> {
        let id = match self.id {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            Some(other) => {
                return Err(ConversionError::Validation(format!(
                    "workflow '{}' has an unsupported id: {}",
                    self.name, other
                )));
            }
            None => self.name.clone(),
        };

        let mut id_by_name: BTreeMap<String, String> = BTreeMap::new();
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for raw in self.nodes {
            let node_id = raw.id.unwrap_or_else(|| raw.name.clone());
            id_by_name.insert(raw.name.clone(), node_id.clone());
            let [x, y] = raw.position.unwrap_or([0.0, 0.0]);
            nodes.push(WorkflowNode {
                id: node_id,
                name: raw.name,
                node_type: raw.node_type,
                type_version: raw.type_version.unwrap_or(1.0),
                position: Position { x, y },
                parameters: raw
                    .parameters
                    .into_iter()
                    .map(|(k, v)| (k, ParameterValue::from(v)))
                    .collect(),
                notes: raw.notes,
            });
        }

        // Unknown names are passed through so they surface as dangling edges.
        let resolve = |name: &str| {
            id_by_name
                .get(name)
                .cloned()
                .unwrap_or_else(|| name.to_string())
        };

        let mut edges = Vec::new();
        for (source_name, ports) in &self.connections {
            let source = resolve(source_name);
            for (port, outputs) in ports {
                for (index, targets) in outputs.iter().enumerate() {
                    let source_port = if index == 0 {
                        port.clone()
                    } else {
                        format!("{}:{}", port, index)
                    };
                    for target in targets {
                        edges.push(WorkflowEdge::with_ports(
                            &source,
                            &source_port,
                            &resolve(&target.node),
                            target.port.as_deref().unwrap_or("main"),
                        ));
                    }
                }
            }
        }

        Ok(WorkflowGraph {
            id,
            name: self.name,
            active: self.active,
            nodes,
            edges,
            settings: self.settings,
            tags: Default::default(),
            meta: self.meta.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Summary,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CacheCli {
    None,
    Memory,
    Disk,
    Hybrid,
}

/// Discover frequent patterns in a corpus of n8n workflow exports
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Workflow export files or directories of `.json` exports
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Engine configuration file (JSON); flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Minimum support in [0, 1]
    #[arg(long)]
    min_support: Option<f64>,

    /// Minimum rule confidence in [0, 1]
    #[arg(long)]
    min_confidence: Option<f64>,

    /// Disable adaptive strategy selection and use the configured strategy
    #[arg(long)]
    no_adaptive: bool,

    /// Staging cache for extracted features
    #[arg(long, value_enum, default_value = "none")]
    cache: CacheCli,

    /// Directory for the disk and hybrid caches
    #[arg(long, default_value = ".moyou-cache")]
    cache_dir: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,

    /// Number of itemsets and rules shown in the summary
    #[arg(long, default_value_t = 20)]
    top: usize,

    /// Write the output here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        exit_with_error(&e.to_string());
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("moyou={}", default_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let total_start = Instant::now();

    // --- 1. Configuration ---
    let mut config = match &cli.config {
        Some(path) => PatternEngineConfig::from_file(path)?,
        None => PatternEngineConfig::default(),
    };
    if let Some(s) = cli.min_support {
        config.min_support = s;
    }
    if let Some(c) = cli.min_confidence {
        config.min_confidence = c;
    }
    if cli.no_adaptive {
        config.adaptive_selection = false;
    }

    let mut builder = PatternEngine::builder(config);
    match cli.cache {
        CacheCli::None => {}
        CacheCli::Memory => builder = builder.with_cache(Arc::new(MemoryStaging::new())),
        CacheCli::Disk => builder = builder.with_cache(Arc::new(DiskStaging::new(&cli.cache_dir)?)),
        CacheCli::Hybrid => {
            builder = builder.with_cache(Arc::new(HybridStaging::new(
                &cli.cache_dir,
                moyou::staging::DEFAULT_MEMORY_BUDGET,
            )?))
        }
    }
    let engine = builder.build()?;

    // --- 2. Loading and Conversion ---
    let load_start = Instant::now();
    let files = collect_files(&cli.inputs)?;
    let mut workflows = Vec::new();
    for file in &files {
        load_file(file, &mut workflows);
    }
    info!(
        files = files.len(),
        workflows = workflows.len(),
        elapsed = ?load_start.elapsed(),
        "workflows loaded"
    );

    // --- 3. Discovery ---
    let results = engine.discover_patterns(workflows);

    // --- 4. Output ---
    let rendered = match cli.format {
        OutputFormat::Json => results.to_json_pretty()?,
        OutputFormat::Summary => RuleFormatter::format_summary(&results, cli.top),
    };
    match &cli.output {
        Some(path) => fs::write(path, rendered)?,
        None => println!("{}", rendered),
    }
    info!(elapsed = ?total_start.elapsed(), "done");

    if results.is_error() {
        std::process::exit(2);
    }
    Ok(())
}

fn collect_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut entries: Vec<PathBuf> = fs::read_dir(input)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
                .collect();
            entries.sort();
            files.extend(entries);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

// Unreadable files are reported and skipped; the rest of the corpus still runs.
fn load_file(path: &Path, workflows: &mut Vec<WorkflowGraph>) {
    let parsed = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|json| serde_json::from_str::<RawExport>(&json).map_err(|e| e.to_string()));
    let raw = match parsed {
        Ok(RawExport::Many(raw)) => raw,
        Ok(RawExport::One(raw)) => vec![*raw],
        Err(e) => {
            warn!(file = %path.display(), "skipping file: {}", e);
            return;
        }
    };

    for workflow in raw {
        match workflow.into_workflow() {
            Ok(graph) => workflows.push(graph),
            Err(e) => warn!(file = %path.display(), "skipping workflow: {}", e),
        }
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
