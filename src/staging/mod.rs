//! Staging stores for extracted features.
//!
//! A [`StagingCache`] keeps [`ExtractedFeatures`] keyed by a caller-chosen
//! string so repeated runs over the same workflows can skip extraction.
//! All stores take `&self` and are safe to share between threads.

mod disk;
mod hybrid;
mod memory;

pub use disk::DiskStaging;
pub use hybrid::{DEFAULT_MEMORY_BUDGET, HybridStaging};
pub use memory::MemoryStaging;

use crate::error::StagingError;
use crate::features::ExtractedFeatures;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where a staged entry lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageLocation {
    Memory,
    Disk(PathBuf),
}

/// Receipt for a staged entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagingHandle {
    pub key: String,
    pub location: StorageLocation,
    /// Encoded size of the entry.
    pub size_bytes: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingStats {
    pub memory_entries: usize,
    pub disk_entries: usize,
    pub memory_bytes: usize,
    pub disk_bytes: usize,
}

impl StagingStats {
    pub fn total_entries(&self) -> usize {
        self.memory_entries + self.disk_entries
    }
}

pub trait StagingCache: Send + Sync {
    /// Stores `features` under `key`, replacing any previous entry.
    fn acquire(&self, key: &str, features: &ExtractedFeatures)
    -> Result<StagingHandle, StagingError>;

    fn retrieve(&self, key: &str) -> Result<Option<ExtractedFeatures>, StagingError>;

    /// Removes the entry for `key`. Returns whether an entry existed.
    fn evict(&self, key: &str) -> Result<bool, StagingError>;

    /// Removes every entry.
    fn clear(&self) -> Result<(), StagingError>;

    fn stats(&self) -> StagingStats;
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StagingError> {
    encode_to_vec(value, standard())
        .map_err(|e| StagingError::Serialization(format!("encoding failed: {}", e)))
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T, StagingError> {
    decode_from_slice(bytes, standard())
        .map(|(value, _)| value)
        .map_err(|e| StagingError::Serialization(format!("decoding failed: {}", e)))
}
