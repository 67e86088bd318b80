//! Transaction encoding tests.
mod common;
use common::*;
use moyou::prelude::*;

#[cfg(test)]
mod transaction_tests {
    use super::*;

    fn encode(workflow: &WorkflowGraph) -> Transaction {
        let features = FeatureExtractor::default()
            .extract(workflow)
            .expect("Extraction should succeed");
        TransactionEncoder::default().encode(
            workflow,
            &features.node_features,
            &features.connection_patterns,
            &features.workflow_features,
        )
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let workflow = fan_workflow("f");
        let first = encode(&workflow);
        for _ in 0..5 {
            assert_eq!(encode(&workflow).items, first.items);
        }
    }

    #[test]
    fn test_webhook_transaction_items() {
        let transaction = encode(&webhook_workflow("w"));
        assert_eq!(transaction.workflow_id, "w");
        assert_eq!(
            &transaction.items[..6],
            &[
                "type:n8n-nodes-base.webhook",
                "type:n8n-nodes-base.webhook:single",
                "type:n8n-nodes-base.set",
                "type:n8n-nodes-base.set:single",
                "type:n8n-nodes-base.respondToWebhook",
                "type:n8n-nodes-base.respondToWebhook:single",
            ]
        );
        assert!(transaction.contains(
            "pattern:n8n-nodes-base.webhook→n8n-nodes-base.set→n8n-nodes-base.respondToWebhook"
        ));
        assert!(transaction.items.iter().any(|i| i.starts_with("pattern:complex:webhook-process-response:")));
        for item in [
            "complexity:Low",
            "quality:Medium",
            "structure:Small",
            "structure:Dense",
            "structure:Shallow",
        ] {
            assert!(transaction.contains(item), "missing {}", item);
        }
    }

    #[test]
    fn test_frequent_type_marker() {
        let transaction = encode(&chain_workflow("c", &["x", "x", "x", "x", "y"]));
        assert!(transaction.contains("type:x"));
        assert!(transaction.contains("type:x:frequent"));
        assert!(!transaction.contains("type:x:single"));
        assert!(transaction.contains("type:y:single"));

        // Exactly three of a type is neither frequent nor single.
        let transaction = encode(&chain_workflow("c", &["x", "x", "x"]));
        assert!(!transaction.contains("type:x:frequent"));
        assert!(!transaction.contains("type:x:single"));
    }

    #[test]
    fn test_empty_workflow_still_has_buckets() {
        let transaction = encode(&WorkflowGraph::new("empty", "Empty"));
        assert_eq!(
            transaction.items,
            vec![
                "complexity:Low",
                "quality:Low",
                "structure:Small",
                "structure:Sparse",
                "structure:Shallow",
            ]
        );
    }

    #[test]
    fn test_encode_features_matches_encode() {
        let workflow = fan_workflow("f");
        let features = FeatureExtractor::default()
            .extract(&workflow)
            .expect("Extraction should succeed");
        let via_features = TransactionEncoder::new().encode_features(&features);
        assert_eq!(via_features, encode(&workflow));
    }

    #[test]
    fn test_items_are_unique() {
        let transaction = encode(&long_workflow("l", 25));
        let mut seen = std::collections::HashSet::new();
        assert!(transaction.items.iter().all(|item| seen.insert(item.clone())));
        assert!(transaction.contains("structure:Large"));
        assert!(transaction.contains("structure:Deep"));
    }
}
