use super::{StagingCache, StagingHandle, StagingStats, StorageLocation, decode, encode};
use crate::error::StagingError;
use crate::features::ExtractedFeatures;
use ahash::AHashMap;
use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;
use xxhash_rust::xxh3::xxh3_64;

const ENTRY_EXTENSION: &str = "bin";

// The key is stored alongside the features so a hash collision reads as a miss.
#[derive(Deserialize)]
struct DiskEntry {
    key: String,
    features: ExtractedFeatures,
}

#[derive(Serialize)]
struct DiskEntryRef<'a> {
    key: &'a str,
    features: &'a ExtractedFeatures,
}

/// One bincode file per key under a directory.
///
/// Writes go to a unique temporary file that is then renamed over the entry,
/// so readers never observe a partial file and distinct keys never share a
/// file.
#[derive(Debug)]
pub struct DiskStaging {
    dir: PathBuf,
    index: RwLock<AHashMap<String, usize>>,
    next_temp: AtomicU64,
}

impl DiskStaging {
    /// Opens (and creates if needed) a staging directory.
    ///
    /// Entries already in the directory are indexed, so they count towards
    /// [`stats`](StagingCache::stats) and are removed by
    /// [`clear`](StagingCache::clear). Unreadable entries are left out of the
    /// index.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, StagingError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            StagingError::Io(format!("Could not create directory '{}': {}", dir.display(), e))
        })?;
        let store = Self {
            dir,
            index: RwLock::new(AHashMap::new()),
            next_temp: AtomicU64::new(0),
        };
        store.rebuild_index()?;
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{:016x}.{}", xxh3_64(key.as_bytes()), ENTRY_EXTENSION))
    }

    fn entry_files(&self) -> Result<Vec<PathBuf>, StagingError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            StagingError::Io(format!("Could not read directory '{}': {}", self.dir.display(), e))
        })?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| {
                    StagingError::Io(format!(
                        "Could not read directory '{}': {}",
                        self.dir.display(),
                        e
                    ))
                })?
                .path();
            if path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION) {
                files.push(path);
            }
        }
        Ok(files)
    }

    fn rebuild_index(&self) -> Result<(), StagingError> {
        let mut index = self.index.write();
        for path in self.entry_files()? {
            let entry = fs::read(&path)
                .map_err(|e| StagingError::Io(e.to_string()))
                .and_then(|bytes| decode::<DiskEntry>(&bytes));
            match entry {
                Ok(entry) => {
                    let size = encode(&entry.features)?.len();
                    index.insert(entry.key, size);
                }
                Err(e) => warn!(path = %path.display(), "not indexing staged entry: {}", e),
            }
        }
        Ok(())
    }

    pub(crate) fn write_entry(
        &self,
        key: &str,
        features: &ExtractedFeatures,
    ) -> Result<(PathBuf, usize), StagingError> {
        let bytes = encode(&DiskEntryRef { key, features })?;

        let path = self.path_for(key);
        let temp = self.dir.join(format!(
            "{}.tmp{}",
            path.file_name().and_then(|n| n.to_str()).unwrap_or("entry"),
            self.next_temp.fetch_add(1, Ordering::Relaxed)
        ));

        let mut file = fs::File::create(&temp).map_err(|e| {
            StagingError::Io(format!("Could not create file '{}': {}", temp.display(), e))
        })?;
        file.write_all(&bytes).map_err(|e| {
            StagingError::Io(format!("Could not write to file '{}': {}", temp.display(), e))
        })?;
        drop(file);
        fs::rename(&temp, &path).map_err(|e| {
            let _ = fs::remove_file(&temp);
            StagingError::Io(format!("Could not move '{}' into place: {}", temp.display(), e))
        })?;

        // Size reported as the payload size, comparable to the memory store.
        let size = encode(features)?.len();
        self.index.write().insert(key.to_string(), size);
        Ok((path, size))
    }
}

impl StagingCache for DiskStaging {
    fn acquire(
        &self,
        key: &str,
        features: &ExtractedFeatures,
    ) -> Result<StagingHandle, StagingError> {
        let (path, size_bytes) = self.write_entry(key, features)?;
        Ok(StagingHandle {
            key: key.to_string(),
            location: StorageLocation::Disk(path),
            size_bytes,
            created_at: Utc::now(),
        })
    }

    fn retrieve(&self, key: &str) -> Result<Option<ExtractedFeatures>, StagingError> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StagingError::Io(format!(
                    "Could not read file '{}': {}",
                    path.display(),
                    e
                )));
            }
        };
        let entry: DiskEntry = decode(&bytes)?;
        if entry.key != key {
            return Ok(None);
        }
        // Another store on the same directory may have written it.
        if !self.index.read().contains_key(key) {
            let size = encode(&entry.features)?.len();
            self.index.write().insert(entry.key, size);
        }
        Ok(Some(entry.features))
    }

    fn evict(&self, key: &str) -> Result<bool, StagingError> {
        self.index.write().remove(key);
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StagingError::Io(format!(
                "Could not remove file '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    // Removes every entry file in the directory, including ones this store
    // never indexed. In-flight temporary files are left alone.
    fn clear(&self) -> Result<(), StagingError> {
        let mut index = self.index.write();
        for path in self.entry_files()? {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(StagingError::Io(format!(
                        "Could not remove file '{}': {}",
                        path.display(),
                        e
                    )));
                }
            }
        }
        index.clear();
        Ok(())
    }

    fn stats(&self) -> StagingStats {
        let index = self.index.read();
        StagingStats {
            disk_entries: index.len(),
            disk_bytes: index.values().sum(),
            ..Default::default()
        }
    }
}
