//! Persistent build cache
//!
//! One gzip-compressed file per build, `{dir}/{id}.json.gz`, holding the JSON
//! body exactly as the CI service served it. Only finished builds are stored,
//! and a finished build never changes, so entries are never invalidated.

use buildscope_core::BuildId;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{ClientError, Result};

const CACHE_SUFFIX: &str = "json.gz";

/// On-disk cache of raw build bodies
#[derive(Debug, Clone)]
pub struct BuildCache {
    dir: PathBuf,
}

impl BuildCache {
    /// Creates a cache rooted at `dir`; the directory is created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of the entry for a build
    pub fn path_for(&self, id: BuildId) -> PathBuf {
        self.dir.join(format!("{}.{}", id, CACHE_SUFFIX))
    }

    /// Check whether an entry exists for a build
    pub async fn has(&self, id: BuildId) -> bool {
        fs::try_exists(self.path_for(id)).await.unwrap_or(false)
    }

    /// Read the raw body cached for a build
    ///
    /// Missing and unreadable entries both yield `None`.
    pub async fn get(&self, id: BuildId) -> Option<Vec<u8>> {
        let path = self.path_for(id);

        let compressed = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Cache miss for build {}", id);
                return None;
            }
            Err(e) => {
                warn!("Failed to read cache entry {}: {}", path.display(), e);
                return None;
            }
        };

        let mut body = Vec::new();
        if let Err(e) = GzDecoder::new(compressed.as_slice()).read_to_end(&mut body) {
            warn!("Ignoring corrupt cache entry {}: {}", path.display(), e);
            return None;
        }

        debug!("Cache hit for build {}", id);
        Some(body)
    }

    /// Store the raw body of a build, replacing any previous entry
    ///
    /// The entry is written to a temporary file first and renamed into place,
    /// so readers never observe a partial file.
    pub async fn put(&self, id: BuildId, body: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| self.write_error(&self.dir, e))?;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(body)
            .map_err(|e| self.write_error(&self.dir, e))?;
        let compressed = encoder.finish().map_err(|e| self.write_error(&self.dir, e))?;

        let path = self.path_for(id);
        let staging = self
            .dir
            .join(format!(".{}.{}.tmp", id, uuid::Uuid::new_v4()));

        fs::write(&staging, compressed)
            .await
            .map_err(|e| self.write_error(&staging, e))?;

        if let Err(e) = fs::rename(&staging, &path).await {
            let _ = fs::remove_file(&staging).await;
            return Err(self.write_error(&path, e));
        }

        debug!("Cached build {} at {}", id, path.display());
        Ok(())
    }

    fn write_error(&self, path: &Path, source: std::io::Error) -> ClientError {
        ClientError::Cache {
            path: path.to_path_buf(),
            source,
        }
    }
}
