use super::graph::{Adjacency, LongestPaths};
use crate::workflow::WorkflowGraph;
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

pub const SEQUENCE_PREFIX: &str = "seq:";
pub const FAN_PREFIX: &str = "fan:";
pub const COMPLEX_PREFIX: &str = "complex:";

/// Type reported for edge endpoints that are not nodes of the workflow.
pub const UNKNOWN_TYPE: &str = "Unknown";

/// A named multi-stage integration shape, e.g. webhook → anything → respond.
///
/// Each stage is a list of keywords matched case-insensitively as substrings
/// of the node type. An empty stage matches any node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationTemplate {
    pub name: String,
    pub stages: Vec<Vec<String>>,
}

impl IntegrationTemplate {
    pub fn new(name: &str, stages: &[&[&str]]) -> Self {
        Self {
            name: name.to_string(),
            stages: stages
                .iter()
                .map(|stage| stage.iter().map(|k| k.to_lowercase()).collect())
                .collect(),
        }
    }

    fn stage_matches(&self, stage: usize, node_type: &str) -> bool {
        match self.stages.get(stage) {
            Some(keywords) if keywords.is_empty() => true,
            Some(keywords) => {
                let lowered = node_type.to_lowercase();
                keywords.iter().any(|k| lowered.contains(&k.to_lowercase()))
            }
            None => false,
        }
    }
}

/// The built-in integration templates.
pub fn default_templates() -> Vec<IntegrationTemplate> {
    vec![
        IntegrationTemplate::new(
            "webhook-process-response",
            &[&["webhook"], &[], &["respond", "return"]],
        ),
        IntegrationTemplate::new(
            "schedule-fetch-store",
            &[&["schedule", "cron"], &["http", "request"], &[]],
        ),
        IntegrationTemplate::new(
            "error-trigger-notify",
            &[
                &["errortrigger"],
                &[],
                &["slack", "email", "telegram", "discord"],
            ],
        ),
    ]
}

/// Resolves node ids to node types; ids that are not nodes map to `Unknown`.
pub(crate) struct TypeLookup<'a> {
    types: AHashMap<&'a str, &'a str>,
}

impl<'a> TypeLookup<'a> {
    pub(crate) fn of(workflow: &'a WorkflowGraph) -> Self {
        let types = workflow
            .node_index()
            .into_iter()
            .map(|(id, node)| (id, node.node_type.as_str()))
            .collect();
        Self { types }
    }

    pub(crate) fn type_of(&self, node_id: &str) -> &'a str {
        self.types.get(node_id).copied().unwrap_or(UNKNOWN_TYPE)
    }
}

pub(crate) struct PatternContext<'w, 'g, 'a> {
    pub(crate) workflow: &'a WorkflowGraph,
    pub(crate) adjacency: &'g Adjacency<'a>,
    pub(crate) types: &'w TypeLookup<'a>,
    pub(crate) templates: &'w [IntegrationTemplate],
}

pub(crate) fn extract_patterns<'a>(
    ctx: &PatternContext<'_, '_, 'a>,
    paths: &mut LongestPaths<'_, 'a>,
) -> Vec<String> {
    let mut patterns = sequential_patterns(ctx, paths);
    patterns.extend(fan_patterns(ctx));
    patterns.extend(complex_patterns(ctx));
    patterns
}

fn sequential_patterns<'a>(
    ctx: &PatternContext<'_, '_, 'a>,
    paths: &mut LongestPaths<'_, 'a>,
) -> Vec<String> {
    let adjacency = ctx.adjacency;
    let roots = ctx
        .workflow
        .nodes
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| !adjacency.has_predecessors(id));
    let candidates: Vec<&'a str> = roots
        .chain(adjacency.sources().iter().copied())
        .unique()
        .collect();

    let mut visited: AHashSet<&'a str> = AHashSet::new();
    let mut patterns = Vec::new();
    for start in candidates {
        if visited.contains(start) || adjacency.successors(start).is_empty() {
            continue;
        }
        let path = paths.path_from(start);
        if path.len() < 2 {
            visited.insert(start);
            continue;
        }
        let chain = path.iter().map(|id| ctx.types.type_of(id)).join("→");
        patterns.push(format!("{}{}", SEQUENCE_PREFIX, chain));
        visited.extend(path);
    }
    patterns
}

fn fan_patterns(ctx: &PatternContext<'_, '_, '_>) -> Vec<String> {
    let adjacency = ctx.adjacency;
    let type_set = |ids: Vec<&str>| -> String {
        ids.into_iter()
            .map(|id| ctx.types.type_of(id))
            .sorted()
            .dedup()
            .join(",")
    };

    let mut patterns = Vec::new();
    for &source in adjacency.sources() {
        let successors = adjacency.distinct_successors(source);
        if successors.len() > 2 {
            patterns.push(format!(
                "{}{}→{{{}}}",
                FAN_PREFIX,
                ctx.types.type_of(source),
                type_set(successors)
            ));
        }
    }
    for &target in adjacency.targets() {
        let predecessors = adjacency.distinct_predecessors(target);
        if predecessors.len() > 2 {
            patterns.push(format!(
                "{}{{{}}}→{}",
                FAN_PREFIX,
                type_set(predecessors),
                ctx.types.type_of(target)
            ));
        }
    }
    patterns
}

fn complex_patterns(ctx: &PatternContext<'_, '_, '_>) -> Vec<String> {
    let mut patterns = Vec::new();
    for template in ctx.templates {
        if template.stages.len() < 2 {
            continue;
        }
        for node in &ctx.workflow.nodes {
            if !template.stage_matches(0, &node.node_type) {
                continue;
            }
            let mut path = vec![node.id.as_str()];
            walk_template(ctx, template, &mut path, &mut patterns);
        }
    }
    patterns.into_iter().unique().collect()
}

fn walk_template<'a>(
    ctx: &PatternContext<'_, '_, 'a>,
    template: &IntegrationTemplate,
    path: &mut Vec<&'a str>,
    out: &mut Vec<String>,
) {
    if path.len() == template.stages.len() {
        let chain = path.iter().map(|id| ctx.types.type_of(id)).join("→");
        out.push(format!("{}{}:{}", COMPLEX_PREFIX, template.name, chain));
        return;
    }
    let Some(&last) = path.last() else {
        return;
    };
    for next in ctx.adjacency.distinct_successors(last) {
        if path.contains(&next) || !template.stage_matches(path.len(), ctx.types.type_of(next)) {
            continue;
        }
        path.push(next);
        walk_template(ctx, template, path, out);
        path.pop();
    }
}
