//! Common test utilities for building workflow graphs and transactions.
use moyou::prelude::*;

/// A linear workflow whose nodes carry the given types in order.
///
/// Node ids are `n1..nk`, laid out left to right on the canvas.
#[allow(dead_code)]
pub fn chain_workflow(id: &str, types: &[&str]) -> WorkflowGraph {
    let mut graph = WorkflowGraph::new(id, &format!("Chain {}", id));
    for (i, node_type) in types.iter().enumerate() {
        graph = graph.with_node(
            WorkflowNode::new(&format!("n{}", i + 1), &format!("Step number {}", i + 1), node_type)
                .at(200.0 * i as f64, 0.0),
        );
    }
    for i in 1..types.len() {
        graph = graph.with_edge(WorkflowEdge::new(&format!("n{}", i), &format!("n{}", i + 1)));
    }
    graph
}

/// `webhook -> set -> respondToWebhook`: three nodes, two edges.
#[allow(dead_code)]
pub fn webhook_workflow(id: &str) -> WorkflowGraph {
    chain_workflow(
        id,
        &[
            "n8n-nodes-base.webhook",
            "n8n-nodes-base.set",
            "n8n-nodes-base.respondToWebhook",
        ],
    )
}

/// A chain of `len` nodes alternating between a handful of types.
#[allow(dead_code)]
pub fn long_workflow(id: &str, len: usize) -> WorkflowGraph {
    const TYPES: [&str; 4] = [
        "n8n-nodes-base.httpRequest",
        "n8n-nodes-base.set",
        "n8n-nodes-base.code",
        "n8n-nodes-base.postgres",
    ];
    let types: Vec<&str> = (0..len).map(|i| TYPES[i % TYPES.len()]).collect();
    chain_workflow(id, &types)
}

/// A switch node `s` fanning out to three handlers, each reporting to a
/// shared merge node. `s` has out-degree 3 and `m` has in-degree 3.
#[allow(dead_code)]
pub fn fan_workflow(id: &str) -> WorkflowGraph {
    WorkflowGraph::new(id, "Fan out")
        .with_node(WorkflowNode::new("t", "Trigger", "n8n-nodes-base.manualTrigger").at(0.0, 0.0))
        .with_node(WorkflowNode::new("s", "Route", "n8n-nodes-base.switch").at(200.0, 0.0))
        .with_node(WorkflowNode::new("a", "Email", "n8n-nodes-base.gmail").at(400.0, -100.0))
        .with_node(WorkflowNode::new("b", "Chat", "n8n-nodes-base.slack").at(400.0, 0.0))
        .with_node(WorkflowNode::new("c", "Store", "n8n-nodes-base.postgres").at(400.0, 100.0))
        .with_node(WorkflowNode::new("m", "Join", "n8n-nodes-base.merge").at(600.0, 0.0))
        .with_edge(WorkflowEdge::new("t", "s"))
        .with_edge(WorkflowEdge::with_ports("s", "output0", "a", "main"))
        .with_edge(WorkflowEdge::with_ports("s", "output1", "b", "main"))
        .with_edge(WorkflowEdge::with_ports("s", "output2", "c", "main"))
        .with_edge(WorkflowEdge::new("a", "m"))
        .with_edge(WorkflowEdge::new("b", "m"))
        .with_edge(WorkflowEdge::new("c", "m"))
}

/// Builds transactions from literal item lists, ids `t0..tn`.
#[allow(dead_code)]
pub fn transactions(rows: &[&[&str]]) -> Vec<Transaction> {
    rows.iter()
        .enumerate()
        .map(|(i, items)| Transaction::from_items(&format!("t{}", i), items.iter().copied()))
        .collect()
}

/// A small corpus with overlapping items, useful for rule properties.
#[allow(dead_code)]
pub fn market_basket() -> Vec<Transaction> {
    transactions(&[
        &["type:webhook", "type:set", "type:slack"],
        &["type:webhook", "type:set"],
        &["type:webhook", "type:code", "type:slack"],
        &["type:set", "type:code"],
        &["type:webhook", "type:set", "type:code", "type:slack"],
        &["type:cron", "type:set"],
    ])
}
