use super::{StagingCache, StagingHandle, StagingStats, StorageLocation, encode};
use crate::error::StagingError;
use crate::features::ExtractedFeatures;
use ahash::AHashMap;
use chrono::Utc;
use parking_lot::RwLock;

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStaging {
    entries: RwLock<AHashMap<String, (ExtractedFeatures, usize)>>,
}

impl MemoryStaging {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_sized(&self, key: &str, features: &ExtractedFeatures, size_bytes: usize) {
        self.entries
            .write()
            .insert(key.to_string(), (features.clone(), size_bytes));
    }

    pub(crate) fn bytes(&self) -> usize {
        self.entries.read().values().map(|(_, size)| size).sum()
    }
}

impl StagingCache for MemoryStaging {
    fn acquire(
        &self,
        key: &str,
        features: &ExtractedFeatures,
    ) -> Result<StagingHandle, StagingError> {
        let size_bytes = encode(features)?.len();
        self.insert_sized(key, features, size_bytes);
        Ok(StagingHandle {
            key: key.to_string(),
            location: StorageLocation::Memory,
            size_bytes,
            created_at: Utc::now(),
        })
    }

    fn retrieve(&self, key: &str) -> Result<Option<ExtractedFeatures>, StagingError> {
        Ok(self.entries.read().get(key).map(|(f, _)| f.clone()))
    }

    fn evict(&self, key: &str) -> Result<bool, StagingError> {
        Ok(self.entries.write().remove(key).is_some())
    }

    fn clear(&self) -> Result<(), StagingError> {
        self.entries.write().clear();
        Ok(())
    }

    fn stats(&self) -> StagingStats {
        let entries = self.entries.read();
        StagingStats {
            memory_entries: entries.len(),
            memory_bytes: entries.values().map(|(_, size)| size).sum(),
            ..Default::default()
        }
    }
}
