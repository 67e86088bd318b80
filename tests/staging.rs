//! Staging cache tests for the memory, disk and hybrid stores.
mod common;
use common::*;
use moyou::prelude::*;
use moyou::staging::{StagingStats, StorageLocation};
use std::sync::Arc;
use std::thread;

fn features(id: &str) -> ExtractedFeatures {
    FeatureExtractor::default()
        .extract(&webhook_workflow(id))
        .expect("Extraction should succeed")
}

/// acquire, retrieve, overwrite, evict and clear against any store.
fn exercise_store(store: &dyn StagingCache) {
    let first = features("first");
    let second = features("second");

    assert_eq!(store.retrieve("first").expect("Lookup should succeed"), None);

    let handle = store.acquire("first", &first).expect("Store should succeed");
    assert_eq!(handle.key, "first");
    assert!(handle.size_bytes > 0);
    store.acquire("second", &second).expect("Store should succeed");

    assert_eq!(store.retrieve("first").expect("Lookup should succeed"), Some(first.clone()));
    assert_eq!(store.stats().total_entries(), 2);

    // Overwriting keeps one entry per key.
    store.acquire("first", &second).expect("Store should succeed");
    assert_eq!(store.retrieve("first").expect("Lookup should succeed"), Some(second.clone()));
    assert_eq!(store.stats().total_entries(), 2);

    assert!(store.evict("first").expect("Evict should succeed"));
    assert!(!store.evict("first").expect("Evict should succeed"));
    assert_eq!(store.retrieve("first").expect("Lookup should succeed"), None);
    // Evicting one key leaves the others readable.
    assert_eq!(store.retrieve("second").expect("Lookup should succeed"), Some(second));

    store.clear().expect("Clear should succeed");
    assert_eq!(store.stats(), StagingStats::default());
    assert_eq!(store.retrieve("second").expect("Lookup should succeed"), None);
}

/// Many threads each writing and reading back their own keys.
fn exercise_concurrently(store: Arc<dyn StagingCache>) {
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..10 {
                    let key = format!("wf-{}-{}", t, i);
                    let staged = features(&key);
                    store.acquire(&key, &staged).expect("Store should succeed");
                    let read = store.retrieve(&key).expect("Lookup should succeed");
                    assert_eq!(read, Some(staged));
                    if i % 2 == 0 {
                        assert!(store.evict(&key).expect("Evict should succeed"));
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Worker thread panicked");
    }
    assert_eq!(store.stats().total_entries(), 8 * 5);
}

#[cfg(test)]
mod staging_tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemoryStaging::new();
        exercise_store(&store);

        let handle = store.acquire("k", &features("k")).expect("Store should succeed");
        assert_eq!(handle.location, StorageLocation::Memory);
        assert_eq!(store.stats().memory_bytes, handle.size_bytes);
        assert_eq!(store.stats().disk_entries, 0);
    }

    #[test]
    fn test_disk_store() {
        let dir = tempfile::tempdir().expect("Temp dir");
        let store = DiskStaging::new(dir.path()).expect("Store should open");
        exercise_store(&store);

        let handle = store.acquire("k", &features("k")).expect("Store should succeed");
        assert_eq!(handle.location, StorageLocation::Disk(store.path_for("k")));
        assert!(store.path_for("k").exists());
        assert_eq!(store.stats().disk_entries, 1);
    }

    #[test]
    fn test_disk_store_survives_reopen() {
        let dir = tempfile::tempdir().expect("Temp dir");
        let staged = features("persisted");
        {
            let store = DiskStaging::new(dir.path()).expect("Store should open");
            store.acquire("persisted", &staged).expect("Store should succeed");
        }
        let reopened = DiskStaging::new(dir.path()).expect("Store should open");
        assert_eq!(
            reopened.retrieve("persisted").expect("Lookup should succeed"),
            Some(staged)
        );
    }

    #[test]
    fn test_reopened_disk_store_counts_and_clears_existing_entries() {
        let dir = tempfile::tempdir().expect("Temp dir");
        let staged = features("persisted");
        let handle = {
            let store = DiskStaging::new(dir.path()).expect("Store should open");
            store.acquire("persisted", &staged).expect("Store should succeed")
        };

        let reopened = DiskStaging::new(dir.path()).expect("Store should open");
        let stats = reopened.stats();
        assert_eq!(stats.disk_entries, 1);
        assert_eq!(stats.disk_bytes, handle.size_bytes);

        reopened.clear().expect("Clear should succeed");
        assert_eq!(reopened.retrieve("persisted").expect("Lookup should succeed"), None);
        assert_eq!(reopened.stats(), StagingStats::default());
    }

    #[test]
    fn test_clear_removes_entries_written_by_another_store() {
        let dir = tempfile::tempdir().expect("Temp dir");
        let reader = DiskStaging::new(dir.path()).expect("Store should open");
        let writer = DiskStaging::new(dir.path()).expect("Store should open");
        writer
            .acquire("shared", &features("shared"))
            .expect("Store should succeed");

        reader.clear().expect("Clear should succeed");
        assert_eq!(writer.retrieve("shared").expect("Lookup should succeed"), None);
    }

    #[test]
    fn test_disk_store_rejects_corrupt_entry() {
        let dir = tempfile::tempdir().expect("Temp dir");
        let store = DiskStaging::new(dir.path()).expect("Store should open");
        std::fs::write(store.path_for("broken"), b"not bincode").expect("Write should succeed");
        assert!(store.retrieve("broken").is_err());
    }

    #[test]
    fn test_hybrid_store() {
        let dir = tempfile::tempdir().expect("Temp dir");
        let store = HybridStaging::new(dir.path(), moyou::staging::DEFAULT_MEMORY_BUDGET)
            .expect("Store should open");
        exercise_store(&store);
    }

    #[test]
    fn test_hybrid_spills_past_budget() {
        let dir = tempfile::tempdir().expect("Temp dir");
        let probe = MemoryStaging::new()
            .acquire("probe", &features("a"))
            .expect("Store should succeed");
        // Room for exactly one entry of this size.
        let store = HybridStaging::new(dir.path(), probe.size_bytes).expect("Store should open");

        let a = store.acquire("a", &features("a")).expect("Store should succeed");
        let b = store.acquire("b", &features("b")).expect("Store should succeed");
        assert_eq!(a.location, StorageLocation::Memory);
        assert!(matches!(b.location, StorageLocation::Disk(_)));

        let stats = store.stats();
        assert_eq!((stats.memory_entries, stats.disk_entries), (1, 1));
        assert_eq!(store.retrieve("b").expect("Lookup should succeed"), Some(features("b")));

        // Freeing memory lets the next write land there again.
        assert!(store.evict("a").expect("Evict should succeed"));
        let c = store.acquire("c", &features("c")).expect("Store should succeed");
        assert_eq!(c.location, StorageLocation::Memory);
    }

    #[test]
    fn test_concurrent_memory_access() {
        exercise_concurrently(Arc::new(MemoryStaging::new()));
    }

    #[test]
    fn test_concurrent_disk_access() {
        let dir = tempfile::tempdir().expect("Temp dir");
        exercise_concurrently(Arc::new(DiskStaging::new(dir.path()).expect("Store should open")));
    }

    #[test]
    fn test_concurrent_hybrid_access() {
        let dir = tempfile::tempdir().expect("Temp dir");
        // A small budget so both tiers see traffic.
        let store = HybridStaging::new(dir.path(), 4096).expect("Store should open");
        exercise_concurrently(Arc::new(store));
    }
}
