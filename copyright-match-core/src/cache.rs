//! Content-addressed on-disk cache (§4.10, §6) for parsed reference
//! corpora, built indices, and the generic-title frequency model.
//!
//! One directory per artifact kind, each entry a `meta.json` (source
//! file paths, their modification times at write time, a schema
//! version, and a config fingerprint) plus a `blob.json` holding the
//! serialized value. Validity is mtime comparison, not a checksum of
//! the blob itself — matching the source's "recorded mtimes vs current
//! ones" rule. A cache entry that fails to parse is a miss, never a
//! fatal error, per the Cache error kind in §7.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::CacheConfig;
use crate::error::Result;

const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    ParsedRegistration,
    ParsedRenewal,
    Indices,
    GenericTitleModel,
}

impl ArtifactKind {
    fn dir_name(&self) -> &'static str {
        match self {
            ArtifactKind::ParsedRegistration => "parsed_registration",
            ArtifactKind::ParsedRenewal => "parsed_renewal",
            ArtifactKind::Indices => "indices",
            ArtifactKind::GenericTitleModel => "generic_title_model",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SourceFileStamp {
    path: PathBuf,
    modified_unix_secs: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactMeta {
    schema_version: u32,
    config_fingerprint: String,
    sources: Vec<SourceFileStamp>,
}

/// Per-component presence and size, returned by [`Cache::info`].
#[derive(Debug, Clone)]
pub struct ComponentInfo {
    pub kind: &'static str,
    pub entry_count: usize,
    pub total_bytes: u64,
}

pub struct Cache {
    cache_dir: PathBuf,
    force_refresh: bool,
    disabled: bool,
}

impl Cache {
    pub fn new(config: &CacheConfig) -> Self {
        Cache {
            cache_dir: config.cache_dir.clone(),
            force_refresh: config.force_refresh,
            disabled: config.disable_cache,
        }
    }

    fn entry_dir(&self, kind: ArtifactKind, key: &str) -> PathBuf {
        self.cache_dir.join(kind.dir_name()).join(key)
    }

    /// Load a cached artifact if present, valid, and not forced to
    /// refresh. Any I/O or deserialization failure, or any mismatch
    /// between recorded and current source-file mtimes, is treated as
    /// a cache miss.
    pub fn load<T: DeserializeOwned>(
        &self,
        kind: ArtifactKind,
        key: &str,
        sources: &[PathBuf],
        config_fingerprint: &str,
    ) -> Option<T> {
        if self.disabled || self.force_refresh {
            return None;
        }

        let dir = self.entry_dir(kind, key);
        let meta_text = fs::read_to_string(dir.join("meta.json")).ok()?;
        let meta: ArtifactMeta = match serde_json::from_str(&meta_text) {
            Ok(m) => m,
            Err(e) => {
                warn!("cache meta for {}/{key} is corrupt, treating as miss: {e}", kind.dir_name());
                return None;
            }
        };

        if meta.schema_version != SCHEMA_VERSION || meta.config_fingerprint != config_fingerprint {
            debug!("cache miss for {}/{key}: schema or config fingerprint changed", kind.dir_name());
            return None;
        }

        if meta.sources.len() != sources.len() {
            return None;
        }
        for (recorded, current_path) in meta.sources.iter().zip(sources) {
            if &recorded.path != current_path {
                return None;
            }
            match current_mtime_secs(current_path) {
                Some(secs) if secs == recorded.modified_unix_secs => {}
                _ => {
                    debug!("cache miss for {}/{key}: {} mtime changed", kind.dir_name(), current_path.display());
                    return None;
                }
            }
        }

        let blob_text = fs::read_to_string(dir.join("blob.json")).ok()?;
        match serde_json::from_str(&blob_text) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("cache blob for {}/{key} is corrupt, treating as miss: {e}", kind.dir_name());
                None
            }
        }
    }

    /// Write an artifact and its metadata. Never fatal to the caller:
    /// a write failure is logged and the run proceeds without a cache
    /// hit next time, consistent with the cache being a pure
    /// optimization.
    pub fn store<T: Serialize>(
        &self,
        kind: ArtifactKind,
        key: &str,
        sources: &[PathBuf],
        config_fingerprint: &str,
        value: &T,
    ) {
        if self.disabled {
            return;
        }

        let dir = self.entry_dir(kind, key);
        if let Err(e) = fs::create_dir_all(&dir) {
            warn!("cannot create cache dir {}: {e}", dir.display());
            return;
        }

        let stamps: Vec<SourceFileStamp> = sources
            .iter()
            .filter_map(|p| {
                current_mtime_secs(p).map(|secs| SourceFileStamp { path: p.clone(), modified_unix_secs: secs })
            })
            .collect();

        let meta = ArtifactMeta {
            schema_version: SCHEMA_VERSION,
            config_fingerprint: config_fingerprint.to_string(),
            sources: stamps,
        };

        if let Err(e) = write_json(&dir.join("meta.json"), &meta) {
            warn!("cannot write cache meta for {}/{key}: {e}", kind.dir_name());
            return;
        }
        if let Err(e) = write_json(&dir.join("blob.json"), value) {
            warn!("cannot write cache blob for {}/{key}: {e}", kind.dir_name());
        }
    }

    /// Delete every cached entry under the cache directory.
    pub fn clear_all(&self) -> Result<()> {
        if self.cache_dir.exists() {
            fs::remove_dir_all(&self.cache_dir)?;
        }
        Ok(())
    }

    /// Presence and on-disk size of each artifact kind.
    pub fn info(&self) -> Vec<ComponentInfo> {
        [
            ArtifactKind::ParsedRegistration,
            ArtifactKind::ParsedRenewal,
            ArtifactKind::Indices,
            ArtifactKind::GenericTitleModel,
        ]
        .into_iter()
        .map(|kind| {
            let dir = self.cache_dir.join(kind.dir_name());
            let (entry_count, total_bytes) = dir_stats(&dir);
            ComponentInfo { kind: kind.dir_name(), entry_count, total_bytes }
        })
        .collect()
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string(value)?;
    fs::write(path, text)?;
    Ok(())
}

fn current_mtime_secs(path: &Path) -> Option<u64> {
    let meta = fs::metadata(path).ok()?;
    let modified = meta.modified().ok()?;
    modified.duration_since(SystemTime::UNIX_EPOCH).ok().map(|d| d.as_secs())
}

fn dir_stats(dir: &Path) -> (usize, u64) {
    let Ok(entries) = fs::read_dir(dir) else {
        return (0, 0);
    };
    let mut count = 0usize;
    let mut bytes = 0u64;
    for entry in entries.flatten() {
        count += 1;
        bytes += dir_size(&entry.path());
    }
    (count, bytes)
}

fn dir_size(path: &Path) -> u64 {
    let Ok(meta) = fs::metadata(path) else {
        return 0;
    };
    if meta.is_file() {
        return meta.len();
    }
    let Ok(entries) = fs::read_dir(path) else {
        return 0;
    };
    entries.flatten().map(|e| dir_size(&e.path())).sum()
}

/// A fingerprint over the effective configuration, used so a cache
/// entry built under one scoring/threshold configuration is never
/// handed back under a different one.
pub fn config_fingerprint(serialized_config: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(serialized_config.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        value: u32,
    }

    fn config() -> CacheConfig {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.into_path();
        CacheConfig { cache_dir: path, force_refresh: false, disable_cache: false }
    }

    #[test]
    fn store_then_load_round_trips() {
        let cache = Cache::new(&config());
        let mut source_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(source_file, "hello").unwrap();
        let sources = vec![source_file.path().to_path_buf()];

        let value = Sample { value: 42 };
        cache.store(ArtifactKind::Indices, "key1", &sources, "fp1", &value);

        let loaded: Option<Sample> = cache.load(ArtifactKind::Indices, "key1", &sources, "fp1");
        assert_eq!(loaded, Some(Sample { value: 42 }));
    }

    #[test]
    fn fingerprint_mismatch_is_a_miss() {
        let cache = Cache::new(&config());
        let source_file = tempfile::NamedTempFile::new().unwrap();
        let sources = vec![source_file.path().to_path_buf()];

        cache.store(ArtifactKind::Indices, "key1", &sources, "fp1", &Sample { value: 1 });
        let loaded: Option<Sample> = cache.load(ArtifactKind::Indices, "key1", &sources, "fp2");
        assert!(loaded.is_none());
    }

    #[test]
    fn disabled_cache_never_hits() {
        let mut cfg = config();
        cfg.disable_cache = true;
        let cache = Cache::new(&cfg);
        let sources: Vec<PathBuf> = vec![];
        cache.store(ArtifactKind::GenericTitleModel, "key1", &sources, "fp1", &Sample { value: 7 });
        let loaded: Option<Sample> = cache.load(ArtifactKind::GenericTitleModel, "key1", &sources, "fp1");
        assert!(loaded.is_none());
    }

    #[test]
    fn clear_all_removes_entries() {
        let cache = Cache::new(&config());
        let sources: Vec<PathBuf> = vec![];
        cache.store(ArtifactKind::Indices, "key1", &sources, "fp1", &Sample { value: 1 });
        cache.clear_all().unwrap();
        let loaded: Option<Sample> = cache.load(ArtifactKind::Indices, "key1", &sources, "fp1");
        assert!(loaded.is_none());
    }
}
