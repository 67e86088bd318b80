use clap::Parser;
use rand::Rng;
use rand::rngs::ThreadRng;
use rand::seq::IndexedRandom;
use serde_json::{Map, Value, json};
use std::fs;

/// A CLI tool to generate synthetic n8n workflow exports for the moyou miner
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "generated_workflows.json")]
    output: String,

    /// Number of workflows to generate
    #[arg(short, long, default_value_t = 100)]
    count: usize,

    /// The minimum number of nodes per workflow
    #[arg(long, default_value_t = 2)]
    min: usize,

    /// The maximum number of nodes per workflow
    #[arg(long, default_value_t = 12)]
    max: usize,
}

const TRIGGERS: &[&str] = &[
    "n8n-nodes-base.webhook",
    "n8n-nodes-base.scheduleTrigger",
    "n8n-nodes-base.manualTrigger",
];

const STEPS: &[&str] = &[
    "n8n-nodes-base.httpRequest",
    "n8n-nodes-base.set",
    "n8n-nodes-base.code",
    "n8n-nodes-base.if",
    "n8n-nodes-base.merge",
    "n8n-nodes-base.postgres",
    "n8n-nodes-base.slack",
    "n8n-nodes-base.gmail",
    "n8n-nodes-base.splitInBatches",
    "n8n-nodes-base.respondToWebhook",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut rng = rand::rng();

    if cli.min == 0 || cli.min > cli.max {
        eprintln!(
            "Error: --min ({}) must be at least 1 and not greater than --max ({})",
            cli.min, cli.max
        );
        std::process::exit(1);
    }

    println!(
        "Generating {} workflows ({} to {} nodes each)...",
        cli.count, cli.min, cli.max
    );

    let workflows: Vec<Value> = (0..cli.count)
        .map(|i| generate_workflow(&mut rng, i, cli.min, cli.max))
        .collect();

    let json_output = serde_json::to_string_pretty(&workflows)?;
    fs::write(&cli.output, json_output)?;

    println!(
        "Successfully generated and saved {} workflows to '{}'",
        workflows.len(),
        cli.output
    );

    Ok(())
}

/// A trigger followed by a mostly linear chain, with the occasional fan-out
/// from an `if` node.
fn generate_workflow(rng: &mut ThreadRng, index: usize, min: usize, max: usize) -> Value {
    let node_count = rng.random_range(min..=max);
    let mut nodes = Vec::with_capacity(node_count);
    let mut names = Vec::with_capacity(node_count);

    for n in 0..node_count {
        let node_type = if n == 0 {
            TRIGGERS.choose(rng).copied().unwrap_or(TRIGGERS[0])
        } else {
            STEPS.choose(rng).copied().unwrap_or(STEPS[0])
        };
        let short = node_type.rsplit('.').next().unwrap_or(node_type);
        let name = format!("{} {}", short, n + 1);
        nodes.push(json!({
            "id": format!("{}-{}", index, n + 1),
            "name": name,
            "type": node_type,
            "typeVersion": rng.random_range(1..=3),
            "position": [240.0 * n as f64, rng.random_range(-200.0..200.0)],
            "parameters": generate_parameters(rng, short),
        }));
        names.push(name);
    }

    let mut connections = Map::new();
    for n in 1..names.len() {
        // Attach to the previous node most of the time, otherwise to an earlier one.
        let parent = if rng.random_bool(0.8) {
            n - 1
        } else {
            rng.random_range(0..n)
        };
        let entry = connections
            .entry(names[parent].clone())
            .or_insert_with(|| json!({ "main": [[]] }));
        if let Some(Value::Array(targets)) = entry.pointer_mut("/main/0") {
            targets.push(json!({ "node": names[n], "type": "main", "index": 0 }));
        }
    }

    json!({
        "id": format!("wf-{}", index),
        "name": format!("Generated workflow {}", index),
        "active": rng.random_bool(0.5),
        "nodes": nodes,
        "connections": connections,
        "settings": { "executionOrder": "v1" },
    })
}

fn generate_parameters(rng: &mut ThreadRng, short_type: &str) -> Value {
    match short_type {
        "httpRequest" => json!({
            "url": "https://api.example.com/items",
            "method": ["GET", "POST"].choose(rng).copied().unwrap_or("GET"),
            "options": { "timeout": rng.random_range(1000..30000) },
        }),
        "if" => json!({
            "conditions": {
                "number": [{ "value1": "={{$json.total}}", "operation": "larger", "value2": rng.random_range(0..100) }]
            }
        }),
        "set" => json!({
            "keepOnlySet": rng.random_bool(0.3),
            "values": { "string": [{ "name": "status", "value": "processed" }] },
        }),
        "code" => json!({ "jsCode": "return items;" }),
        "postgres" => json!({ "operation": "insert", "table": "events" }),
        _ => json!({}),
    }
}
