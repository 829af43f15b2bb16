//! Local filesystem store.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::error::TurnError;
use crate::traits::FileStore;

/// A [`FileStore`] rooted at one directory.
///
/// Paths are resolved relative to the root; absolute paths and paths
/// containing `..` are rejected so a turn can only touch its own app's
/// files. Writes create missing parent directories.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, String> {
        let rel = Path::new(path);
        if rel.is_absolute()
            || rel
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            return Err("path escapes the store root".to_string());
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn read(&self, path: &str) -> Result<String, TurnError> {
        let full = self.resolve(path).map_err(|message| TurnError::FileRead {
            path: path.to_string(),
            message,
        })?;
        tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| TurnError::FileRead {
                path: path.to_string(),
                message: e.to_string(),
            })
    }

    async fn write(&self, path: &str, contents: &str) -> Result<(), TurnError> {
        let full = self.resolve(path).map_err(|message| TurnError::FileWrite {
            path: path.to_string(),
            message,
        })?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TurnError::FileWrite {
                    path: path.to_string(),
                    message: e.to_string(),
                })?;
        }
        tokio::fs::write(&full, contents)
            .await
            .map_err(|e| TurnError::FileWrite {
                path: path.to_string(),
                message: e.to_string(),
            })
    }
}
