//! The between-runs content cache.
//!
//! A cache entry says "this exact content was clean under this exact
//! configuration", so unchanged files can be skipped wholesale. The file
//! carries the configuration signature; when the signature moves on (new
//! engine version, different rules or whitespace), every entry is stale
//! and the whole cache is discarded rather than migrated.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hex SHA-256 of file contents, the unit the cache stores.
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    signature: String,
    hashes: BTreeMap<String, String>,
}

/// Known-clean content hashes from earlier runs of one configuration.
#[derive(Debug, Clone)]
pub struct Cache {
    signature: String,
    hashes: BTreeMap<String, String>,
}

impl Cache {
    /// An empty cache for the given configuration signature.
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            hashes: BTreeMap::new(),
        }
    }

    /// Reads the cache at `path`. A missing or unreadable file, a file
    /// that does not parse, or one written under a different signature all
    /// come back as an empty cache; staleness is never an error.
    pub fn load(path: &Path, signature: &str) -> Self {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(_) => return Self::new(signature),
        };
        let file: CacheFile = match serde_json::from_slice(&bytes) {
            Ok(file) => file,
            Err(_) => return Self::new(signature),
        };
        if file.signature != signature {
            return Self::new(signature);
        }
        Self {
            signature: file.signature,
            hashes: file.hashes,
        }
    }

    pub fn save(&self, path: &Path) -> io::Result<()> {
        let file = CacheFile {
            signature: self.signature.clone(),
            hashes: self.hashes.clone(),
        };
        let json = serde_json::to_vec(&file)
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
        fs::write(path, json)
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// True when `content` is exactly what was recorded clean for `key`.
    pub fn is_clean(&self, key: &str, content: &[u8]) -> bool {
        self.hashes
            .get(key)
            .is_some_and(|hash| *hash == content_hash(content))
    }

    pub fn record(&mut self, key: impl Into<String>, hash: impl Into<String>) {
        self.hashes.insert(key.into(), hash.into());
    }
}
