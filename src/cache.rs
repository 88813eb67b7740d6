//! Resolved documents cached by file path and content.
//!
//! One entry per path hash; an entry whose content hash differs is a miss
//! and is overwritten on the next store.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};

use crate::document::RootDocument;
use crate::error::{Error, Result};

/// SHA-512 of the document path and of its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    pub path_hash: [u8; 64],
    pub content_hash: [u8; 64],
}

impl CacheKey {
    pub fn new(path: &Path, content: &[u8]) -> Self {
        Self {
            path_hash: sha512(path.to_string_lossy().as_bytes()),
            content_hash: sha512(content),
        }
    }

    /// File name of the entry: hex of the first 16 bytes of the path hash.
    pub fn file_name(&self) -> String {
        format!("{}.json", hex::encode(&self.path_hash[..16]))
    }
}

fn sha512(bytes: &[u8]) -> [u8; 64] {
    let mut out = [0u8; 64];
    out.copy_from_slice(&Sha512::digest(bytes));
    out
}

pub trait DocumentCache: Send + Sync {
    /// The stored document for `key`, if its content hash matches.
    fn load(&self, key: &CacheKey) -> Result<Option<RootDocument>>;
    fn store(&self, key: &CacheKey, document: &RootDocument) -> Result<()>;
}

/// Entries as JSON files in one directory.
///
/// The key covers only the root file. An edited library or include, or a
/// different `ParserConfig`, still hits the entry stored for that root;
/// clear the directory when those change.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Entry {
    content_hash: String,
    /// Unix seconds.
    cached_at: i64,
    document: RootDocument,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }
}

impl DocumentCache for DiskCache {
    fn load(&self, key: &CacheKey) -> Result<Option<RootDocument>> {
        let path = self.entry_path(key);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::io(path, e)),
        };
        let entry: Entry = match serde_json::from_slice(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "unreadable cache entry");
                return Ok(None);
            }
        };
        if entry.content_hash != hex::encode(key.content_hash) {
            tracing::debug!(path = %path.display(), "cache entry is stale");
            return Ok(None);
        }
        tracing::debug!(path = %path.display(), cached_at = entry.cached_at, "cache hit");
        Ok(Some(entry.document))
    }

    fn store(&self, key: &CacheKey, document: &RootDocument) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
        let entry = Entry {
            content_hash: hex::encode(key.content_hash),
            cached_at: chrono::Utc::now().timestamp(),
            document: document.clone(),
        };
        let json = serde_json::to_vec(&entry).map_err(|e| Error::Cache { message: e.to_string() })?;
        let path = self.entry_path(key);
        std::fs::write(&path, json).map_err(|e| Error::io(path, e))
    }
}
