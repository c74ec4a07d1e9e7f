// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content-addressed artifact directory.
//
// Each signed document is stored as `<sha256>.pdf`. Files are written under
// a temporary name and renamed into place, so a reader never sees a
// partially written document.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use docguard_core::DocumentId;
use docguard_core::error::{DocguardError, Result};
use docguard_security::hash_bytes;
use tracing::{debug, info, instrument};

use crate::contracts::ArtifactStore;

/// Stores signed documents in one directory, named by content hash.
pub struct DirectoryArtifactStore {
    root: PathBuf,
}

impl DirectoryArtifactStore {
    /// Use `root`, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a document with this content is (or would be) stored at.
    pub fn path_for(&self, document: &[u8]) -> PathBuf {
        self.root.join(format!("{}.pdf", hash_bytes(document)))
    }

    /// Read back a stored document by its content hash.
    pub async fn load(&self, hash: &str) -> Result<Vec<u8>> {
        if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DocguardError::malformed("hash", "expected 64 hex characters"));
        }
        Ok(tokio::fs::read(self.root.join(format!("{}.pdf", hash.to_ascii_lowercase()))).await?)
    }
}

#[async_trait]
impl ArtifactStore for DirectoryArtifactStore {
    #[instrument(skip(self, document), fields(%document_id, bytes = document.len()))]
    async fn publish(&self, document_id: DocumentId, document: &[u8]) -> Result<String> {
        let path = self.path_for(document);
        if tokio::fs::try_exists(&path).await? {
            debug!(path = %path.display(), "artifact already stored");
            return Ok(path.display().to_string());
        }

        let staging = self.root.join(format!(".{document_id}.partial"));
        tokio::fs::write(&staging, document)
            .await
            .map_err(|e| DocguardError::Publish(format!("write {}: {e}", staging.display())))?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|e| DocguardError::Publish(format!("rename into {}: {e}", path.display())))?;

        info!(path = %path.display(), "artifact published");
        Ok(path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_is_content_addressed_and_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryArtifactStore::open(dir.path().join("artifacts")).unwrap();
        let doc = b"%PDF-1.7 signed".to_vec();

        let first = store.publish(DocumentId::new(), &doc).await.unwrap();
        let second = store.publish(DocumentId::new(), &doc).await.unwrap();
        assert_eq!(first, second);
        assert!(first.ends_with(&format!("{}.pdf", hash_bytes(&doc))));

        let entries = std::fs::read_dir(store.root()).unwrap().count();
        assert_eq!(entries, 1, "no staging files left behind");
        assert_eq!(store.load(&hash_bytes(&doc)).await.unwrap(), doc);
    }

    #[tokio::test]
    async fn load_rejects_path_like_hashes() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryArtifactStore::open(dir.path()).unwrap();
        assert!(store.load("../../etc/passwd").await.is_err());
    }
}
