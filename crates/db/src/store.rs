//! File-backed clip document store.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use testimony_core::error::CoreError;

use crate::error::DbError;
use crate::models::clip::ClipDocument;

/// In-memory view of the clip collection plus the file it persists to.
///
/// Documents keep their stored order; validation reports follow it.
#[derive(Debug, Clone)]
pub struct ClipStore {
    path: PathBuf,
    pub(crate) documents: Vec<ClipDocument>,
}

impl ClipStore {
    /// Load the store from a JSON array of clip documents.
    ///
    /// Fails on a missing or unreadable file, on invalid JSON, and on
    /// duplicate clip ids.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let path = path.as_ref().to_path_buf();
        let bytes = tokio::fs::read(&path).await.map_err(|source| DbError::Io {
            path: path.clone(),
            source,
        })?;
        let documents: Vec<ClipDocument> =
            serde_json::from_slice(&bytes).map_err(|source| DbError::Json {
                path: path.clone(),
                source,
            })?;

        let store = Self::from_documents(path, documents)?;
        tracing::info!(
            path = %store.path.display(),
            clips = store.documents.len(),
            "Loaded clip store",
        );
        Ok(store)
    }

    /// Build a store from documents already in memory.
    pub fn from_documents(
        path: impl Into<PathBuf>,
        documents: Vec<ClipDocument>,
    ) -> Result<Self, DbError> {
        let mut seen = HashSet::with_capacity(documents.len());
        for document in &documents {
            if !seen.insert(document.id.as_str()) {
                return Err(CoreError::Conflict(format!(
                    "duplicate clip id '{}' in store",
                    document.id
                ))
                .into());
            }
        }
        Ok(Self {
            path: path.into(),
            documents,
        })
    }

    /// Persist all documents.
    ///
    /// Writes to a sibling temp file and renames it over the store, so a
    /// failed write never leaves a truncated file behind.
    pub async fn save(&self) -> Result<(), DbError> {
        let data = serde_json::to_vec_pretty(&self.documents).map_err(|source| DbError::Json {
            path: self.path.clone(),
            source,
        })?;

        let tmp_path = self.tmp_path();
        tokio::fs::write(&tmp_path, &data)
            .await
            .map_err(|source| DbError::Io {
                path: tmp_path.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|source| DbError::Io {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!(
            path = %self.path.display(),
            clips = self.documents.len(),
            "Saved clip store",
        );
        Ok(())
    }

    pub fn documents(&self) -> &[ClipDocument] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn position(&self, id: &str) -> Option<usize> {
        self.documents.iter().position(|d| d.id == id)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "clips.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
