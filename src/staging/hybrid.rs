use super::{
    DiskStaging, MemoryStaging, StagingCache, StagingHandle, StagingStats, StorageLocation, encode,
};
use crate::error::StagingError;
use crate::features::ExtractedFeatures;
use chrono::Utc;
use parking_lot::Mutex;
use std::path::Path;
use tracing::trace;

/// Default memory budget of the hybrid store (64 MiB).
pub const DEFAULT_MEMORY_BUDGET: usize = 64 * 1024 * 1024;

/// Keeps entries in memory until a byte budget is used up, then spills to
/// disk.
#[derive(Debug)]
pub struct HybridStaging {
    memory: MemoryStaging,
    disk: DiskStaging,
    budget: usize,
    // Serializes placement so the budget check and the insert agree.
    placement: Mutex<()>,
}

impl HybridStaging {
    pub fn new(dir: impl AsRef<Path>, memory_budget: usize) -> Result<Self, StagingError> {
        Ok(Self {
            memory: MemoryStaging::new(),
            disk: DiskStaging::new(dir)?,
            budget: memory_budget,
            placement: Mutex::new(()),
        })
    }

    pub fn budget(&self) -> usize {
        self.budget
    }
}

impl StagingCache for HybridStaging {
    fn acquire(
        &self,
        key: &str,
        features: &ExtractedFeatures,
    ) -> Result<StagingHandle, StagingError> {
        let size_bytes = encode(features)?.len();
        let _guard = self.placement.lock();

        self.memory.evict(key)?;
        self.disk.evict(key)?;

        let location = if self.memory.bytes() + size_bytes <= self.budget {
            self.memory.insert_sized(key, features, size_bytes);
            StorageLocation::Memory
        } else {
            let (path, _) = self.disk.write_entry(key, features)?;
            StorageLocation::Disk(path)
        };
        trace!(key, ?location, size_bytes, "staged features");

        Ok(StagingHandle {
            key: key.to_string(),
            location,
            size_bytes,
            created_at: Utc::now(),
        })
    }

    fn retrieve(&self, key: &str) -> Result<Option<ExtractedFeatures>, StagingError> {
        match self.memory.retrieve(key)? {
            Some(features) => Ok(Some(features)),
            None => self.disk.retrieve(key),
        }
    }

    fn evict(&self, key: &str) -> Result<bool, StagingError> {
        let in_memory = self.memory.evict(key)?;
        let on_disk = self.disk.evict(key)?;
        Ok(in_memory || on_disk)
    }

    fn clear(&self) -> Result<(), StagingError> {
        self.memory.clear()?;
        self.disk.clear()
    }

    fn stats(&self) -> StagingStats {
        let memory = self.memory.stats();
        let disk = self.disk.stats();
        StagingStats {
            memory_entries: memory.memory_entries,
            memory_bytes: memory.memory_bytes,
            disk_entries: disk.disk_entries,
            disk_bytes: disk.disk_bytes,
        }
    }
}
