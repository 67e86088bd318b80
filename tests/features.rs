//! Feature extraction tests: node, connection and workflow layers.
mod common;
use common::*;
use moyou::error::ExtractionError;
use moyou::features::{FAN_PREFIX, MAX_PARAMETER_DEPTH};
use moyou::prelude::*;
use std::collections::BTreeMap;

#[cfg(test)]
mod feature_tests {
    use super::*;

    #[test]
    fn test_empty_workflow_extracts_cleanly() {
        let workflow = WorkflowGraph::new("empty", "Nothing here");
        let features = FeatureExtractor::default()
            .extract(&workflow)
            .expect("Empty workflow should extract");

        let wf = &features.workflow_features;
        assert_eq!(wf.node_count, 0);
        assert_eq!(wf.density, 0.0);
        assert_eq!(wf.max_depth, 0);
        assert_eq!(wf.type_diversity, 0.0);
        assert_eq!(wf.dominant_node_type, "none");
        assert!(features.node_features.is_empty());
        assert!(features.connection_patterns.is_empty());
    }

    #[test]
    fn test_nesting_depth_weighs_into_complexity() {
        let mut inner = BTreeMap::new();
        inner.insert("c".to_string(), ParameterValue::Number(1.0));
        let mut middle = BTreeMap::new();
        middle.insert("b".to_string(), ParameterValue::Object(inner));

        let workflow = WorkflowGraph::new("nested", "Nested").with_node(
            WorkflowNode::new("1", "Deep config", "n8n-nodes-base.set")
                .with_parameter("a", ParameterValue::Object(middle)),
        );
        let features = FeatureExtractor::default().extract_node_features(&workflow);

        assert_eq!(features.len(), 1);
        let node = &features[0];
        assert_eq!(node.parameter_count, 1);
        assert_eq!(node.nesting_depth, 3);
        // 1 parameter * 1.0 + depth 3 * 2.0
        assert_eq!(node.complexity_score, 7.0);
    }

    #[test]
    fn test_custom_weights_apply_to_score() {
        let workflow = WorkflowGraph::new("w", "Weights").with_node(
            WorkflowNode::new("1", "Flat config", "n8n-nodes-base.set")
                .with_parameter("a", "x")
                .with_parameter("b", "y"),
        );
        let extractor = FeatureExtractor::builder().with_weights(0.5, 10.0).build();
        let features = extractor.extract_node_features(&workflow);
        // 2 parameters * 0.5 + depth 1 * 10.0
        assert_eq!(features[0].complexity_score, 11.0);
    }

    #[test]
    fn test_signature_ignores_values_but_not_shape() {
        let a = WorkflowNode::new("a", "A", "t")
            .with_parameter("url", "https://one.example")
            .with_parameter("retry", true);
        let b = WorkflowNode::new("b", "B", "t")
            .with_parameter("url", "https://two.example")
            .with_parameter("retry", false);
        let c = WorkflowNode::new("c", "C", "t")
            .with_parameter("url", "https://one.example")
            .with_parameter("retry", 3.0);

        let sig = |node: &WorkflowNode| {
            moyou::features::parameter_structure_signature(&node.parameters)
        };
        assert_eq!(sig(&a), sig(&b));
        assert_ne!(sig(&a), sig(&c));
    }

    #[test]
    fn test_density_bounds() {
        let single = chain_workflow("one", &["t"]);
        let dense = WorkflowGraph::new("dense", "Dense")
            .with_node(WorkflowNode::new("a", "Alpha", "t"))
            .with_node(WorkflowNode::new("b", "Bravo", "t"))
            .with_edge(WorkflowEdge::new("a", "b"))
            .with_edge(WorkflowEdge::new("b", "a"))
            .with_edge(WorkflowEdge::new("a", "b"));

        let extractor = FeatureExtractor::default();
        for workflow in [single, dense, fan_workflow("fan"), long_workflow("long", 30)] {
            let wf = extractor
                .extract_workflow_features(&workflow)
                .expect("Extraction should succeed");
            assert!((0.0..=1.0).contains(&wf.density), "density {}", wf.density);
            if wf.node_count < 2 {
                assert_eq!(wf.density, 0.0);
            }
        }

        let fan = extractor
            .extract_workflow_features(&fan_workflow("fan"))
            .expect("Extraction should succeed");
        assert!((fan.density - 7.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_type_diversity_entropy() {
        let extractor = FeatureExtractor::default();

        let uniform = extractor
            .extract_workflow_features(&chain_workflow("u", &["t", "t", "t", "t"]))
            .expect("Extraction should succeed");
        assert_eq!(uniform.type_diversity, 0.0);
        assert_eq!(uniform.dominant_node_type, "t");

        let spread = extractor
            .extract_workflow_features(&chain_workflow("s", &["a", "b", "c", "d"]))
            .expect("Extraction should succeed");
        assert!((spread.type_diversity - 2.0).abs() < 1e-12);

        let skewed = extractor
            .extract_workflow_features(&chain_workflow("k", &["a", "a", "a", "b"]))
            .expect("Extraction should succeed");
        assert!(skewed.type_diversity > 0.0 && skewed.type_diversity < 1.0);
    }

    #[test]
    fn test_depth_and_branching() {
        let extractor = FeatureExtractor::default();
        let chain = extractor
            .extract_workflow_features(&webhook_workflow("w"))
            .expect("Extraction should succeed");
        assert_eq!(chain.max_depth, 3);
        assert_eq!(chain.branching_factor, 1.0);

        let fan = extractor
            .extract_workflow_features(&fan_workflow("f"))
            .expect("Extraction should succeed");
        // t -> s -> {a,b,c} -> m
        assert_eq!(fan.max_depth, 4);
        // out-degrees: t=1, s=3, a=1, b=1, c=1
        assert!((fan.branching_factor - 7.0 / 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_cycle_does_not_hang_depth_search() {
        let workflow = chain_workflow("loop", &["a", "b", "c"])
            .with_edge(WorkflowEdge::new("n3", "n2"));
        let wf = FeatureExtractor::default()
            .extract_workflow_features(&workflow)
            .expect("Extraction should succeed");
        assert_eq!(wf.max_depth, 3);
    }

    fn looping_workflow(node_order: &[&str]) -> WorkflowGraph {
        let edges = [
            ("s1", "b"),
            ("b", "a"),
            ("a", "b"),
            ("a", "z"),
            ("b", "y1"),
            ("y1", "y2"),
            ("y2", "y3"),
            ("r", "a"),
        ];
        let mut workflow = WorkflowGraph::new("loops", "Retry loop");
        for id in node_order {
            workflow = workflow.with_node(WorkflowNode::new(id, id, &format!("type_{}", id)));
        }
        for (source, target) in edges {
            workflow = workflow.with_edge(WorkflowEdge::new(source, target));
        }
        workflow
    }

    #[test]
    fn test_depth_and_sequences_ignore_node_order_in_cycles() {
        let extractor = FeatureExtractor::default();
        let forward = extractor
            .extract(&looping_workflow(&["s1", "b", "a", "z", "y1", "y2", "y3", "r"]))
            .expect("Extraction should succeed");
        let backward = extractor
            .extract(&looping_workflow(&["r", "y3", "y2", "y1", "z", "a", "b", "s1"]))
            .expect("Extraction should succeed");

        assert_eq!(forward.workflow_features.max_depth, 6);
        assert_eq!(backward.workflow_features.max_depth, 6);

        let sequences = |features: &ExtractedFeatures| {
            let mut seqs: Vec<String> = features
                .connection_patterns
                .iter()
                .filter(|p| p.starts_with("seq:"))
                .cloned()
                .collect();
            seqs.sort();
            seqs
        };
        assert!(
            sequences(&backward)
                .contains(&"seq:type_r→type_a→type_b→type_y1→type_y2→type_y3".to_string())
        );
        assert_eq!(sequences(&forward), sequences(&backward));
    }

    #[test]
    fn test_quality_sub_scores() {
        let workflow = WorkflowGraph::new("q", "Quality")
            .with_node(
                WorkflowNode::new("1", "Fetch invoices", "n8n-nodes-base.httpRequest")
                    .with_parameter("continueOnFail", true),
            )
            .with_node(WorkflowNode::new("2", "Node", "n8n-nodes-base.set"))
            .with_edge(WorkflowEdge::new("1", "2"));
        let wf = FeatureExtractor::default()
            .extract_workflow_features(&workflow)
            .expect("Extraction should succeed");

        assert_eq!(wf.error_handling_coverage, 0.5);
        assert_eq!(wf.naming_quality, 0.5);
        assert_eq!(wf.structure_quality, 1.0);
        assert_eq!(wf.parameter_completeness, 0.5);
        let expected = 0.3 * 0.5 + 0.2 * 0.5 + 0.3 * 1.0 + 0.2 * 0.5;
        assert!((wf.quality_score - expected).abs() < 1e-12);
    }

    #[test]
    fn test_sequence_and_template_patterns() {
        let patterns = FeatureExtractor::default().extract_connection_patterns(&webhook_workflow("w"));
        let chain = "n8n-nodes-base.webhook→n8n-nodes-base.set→n8n-nodes-base.respondToWebhook";
        assert_eq!(
            patterns,
            vec![
                format!("seq:{}", chain),
                format!("complex:webhook-process-response:{}", chain),
            ]
        );
    }

    #[test]
    fn test_fan_patterns() {
        let patterns = FeatureExtractor::default().extract_connection_patterns(&fan_workflow("f"));
        let fans: Vec<&String> = patterns.iter().filter(|p| p.starts_with(FAN_PREFIX)).collect();
        assert_eq!(
            fans,
            vec![
                "fan:n8n-nodes-base.switch→{n8n-nodes-base.gmail,n8n-nodes-base.postgres,n8n-nodes-base.slack}",
                "fan:{n8n-nodes-base.gmail,n8n-nodes-base.postgres,n8n-nodes-base.slack}→n8n-nodes-base.merge",
            ]
        );
    }

    #[test]
    fn test_custom_template() {
        let extractor = FeatureExtractor::builder()
            .with_templates(Vec::new())
            .with_template(IntegrationTemplate::new("set-then-reply", &[&["set"], &["respond"]]))
            .build();
        let patterns = extractor.extract_connection_patterns(&webhook_workflow("w"));
        assert!(patterns.contains(
            &"complex:set-then-reply:n8n-nodes-base.set→n8n-nodes-base.respondToWebhook".to_string()
        ));
        assert!(!patterns.iter().any(|p| p.contains("webhook-process-response")));
    }

    #[test]
    fn test_bad_node_is_skipped_not_fatal() {
        let workflow = webhook_workflow("w")
            .with_node(WorkflowNode::new("bad", "Broken", "n8n-nodes-base.code").at(f64::NAN, 0.0));
        let features = FeatureExtractor::default()
            .extract(&workflow)
            .expect("A single bad node should not fail extraction");

        assert_eq!(features.node_features.len(), 3);
        assert_eq!(features.skipped_nodes, vec!["bad".to_string()]);
    }

    #[test]
    fn test_parameter_depth_limit() {
        let mut value = ParameterValue::Number(1.0);
        for _ in 0..MAX_PARAMETER_DEPTH + 5 {
            value = ParameterValue::Array(vec![value]);
        }
        let workflow = WorkflowGraph::new("deep", "Deep")
            .with_node(WorkflowNode::new("1", "Pathological", "t").with_parameter("x", value))
            .with_node(WorkflowNode::new("2", "Ordinary", "t"));
        let features = FeatureExtractor::default()
            .extract(&workflow)
            .expect("Extraction should succeed");
        assert_eq!(features.skipped_nodes, vec!["1".to_string()]);
    }

    #[test]
    fn test_node_limit_is_an_error() {
        let extractor = FeatureExtractor::builder().with_max_nodes(2).build();
        let err = extractor
            .extract(&webhook_workflow("big"))
            .expect_err("Three nodes should exceed a limit of two");
        assert!(matches!(err, ExtractionError::TooManyNodes { limit: 2, .. }));
    }

    #[test]
    fn test_dangling_edges_use_unknown_type() {
        let workflow = chain_workflow("d", &["a", "b"]).with_edge(WorkflowEdge::new("n2", "ghost"));
        let issues = workflow.structural_issues();
        assert_eq!(issues.len(), 1);

        let patterns = FeatureExtractor::default().extract_connection_patterns(&workflow);
        assert_eq!(patterns, vec!["seq:a→b→Unknown".to_string()]);
    }
}
