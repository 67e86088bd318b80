//! Structural detector tests: hubs, cycles, branches and recurring chains.
mod common;
use common::*;
use moyou::prelude::*;
use moyou::structural::WorkflowTopology;

#[cfg(test)]
mod structural_tests {
    use super::*;

    #[test]
    fn test_hub_detection_is_strict() {
        let patterns = StructuralGraphAnalyzer::default().analyze_workflows(&[fan_workflow("f")]);

        // s touches 4 edges; m touches exactly 3 and is not a hub.
        assert_eq!(patterns.hub_patterns.len(), 1);
        let hub = &patterns.hub_patterns[0];
        assert_eq!(hub.node_id, "s");
        assert_eq!(hub.node_type, "n8n-nodes-base.switch");
        assert_eq!((hub.in_degree, hub.out_degree, hub.connections), (1, 3, 4));

        let lenient = StructuralGraphAnalyzer::new()
            .with_hub_threshold(2)
            .analyze_workflows(&[fan_workflow("f")]);
        let ids: Vec<&str> = lenient.hub_patterns.iter().map(|h| h.node_id.as_str()).collect();
        assert_eq!(ids, vec!["s", "m"]);
    }

    #[test]
    fn test_branch_detection() {
        let patterns = StructuralGraphAnalyzer::default().analyze_workflows(&[fan_workflow("f")]);
        assert_eq!(patterns.branch_patterns.len(), 1);
        let branch = &patterns.branch_patterns[0];
        assert_eq!(branch.node_id, "s");
        assert_eq!(branch.branch_count, 3);
        assert_eq!(branch.output_ports, vec!["output0", "output1", "output2"]);
        assert_eq!(
            branch.successor_types,
            vec!["n8n-nodes-base.gmail", "n8n-nodes-base.slack", "n8n-nodes-base.postgres"]
        );
    }

    #[test]
    fn test_cycle_detection() {
        let looped = chain_workflow("loop", &["a", "b", "c"]).with_edge(WorkflowEdge::new("n3", "n2"));
        let self_loop = chain_workflow("self", &["x"]).with_edge(WorkflowEdge::new("n1", "n1"));
        let patterns = StructuralGraphAnalyzer::default().analyze_workflows(&[
            looped,
            self_loop,
            webhook_workflow("acyclic"),
        ]);

        assert_eq!(patterns.cycle_patterns.len(), 2);
        assert_eq!(patterns.cycle_patterns[0].workflow_id, "loop");
        assert_eq!(patterns.cycle_patterns[0].node_ids, vec!["n2", "n3"]);
        assert_eq!(patterns.cycle_patterns[0].node_types, vec!["b", "c"]);
        assert_eq!(patterns.cycle_patterns[1].workflow_id, "self");
        assert_eq!(patterns.cycle_patterns[1].node_ids, vec!["n1"]);
    }

    #[test]
    fn test_recurring_chains_aggregate_across_workflows() {
        let patterns = StructuralGraphAnalyzer::default().analyze_workflows(&[
            webhook_workflow("a"),
            webhook_workflow("b"),
            fan_workflow("f"),
        ]);

        let top = &patterns.sequential_patterns[0];
        assert_eq!(
            top.type_chain,
            vec![
                "n8n-nodes-base.webhook",
                "n8n-nodes-base.set",
                "n8n-nodes-base.respondToWebhook"
            ]
        );
        assert_eq!(top.occurrences, 2);
        assert_eq!(top.workflow_count, 2);
        // three switch -> handler -> merge chains from the fan workflow
        assert_eq!(patterns.sequential_patterns.len(), 4);
        assert!(patterns.sequential_patterns[1..].iter().all(|p| p.occurrences == 1));
    }

    #[test]
    fn test_min_chain_length() {
        let analyzer = StructuralGraphAnalyzer::new().with_min_chain_length(4);
        let patterns = analyzer.analyze_workflows(&[webhook_workflow("a")]);
        assert!(patterns.sequential_patterns.is_empty());

        let patterns = analyzer.analyze_workflows(&[long_workflow("l", 4)]);
        assert_eq!(patterns.sequential_patterns.len(), 1);
        assert_eq!(patterns.sequential_patterns[0].type_chain.len(), 4);
    }

    #[test]
    fn test_dangling_edges_are_ignored() {
        let workflow = webhook_workflow("d")
            .with_edge(WorkflowEdge::new("n1", "ghost"))
            .with_edge(WorkflowEdge::new("ghost", "n3"));
        let topology = WorkflowTopology::from(&workflow);
        let patterns = StructuralGraphAnalyzer::default().analyze(&[topology]);
        assert!(patterns.hub_patterns.is_empty());
        assert!(patterns.cycle_patterns.is_empty());
        assert!(patterns.branch_patterns.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let patterns = StructuralGraphAnalyzer::default().analyze(&[]);
        assert_eq!(patterns.total(), 0);
    }
}
