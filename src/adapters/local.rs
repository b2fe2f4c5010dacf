use crate::domain::ports::{CatalogStore, Storage};
use crate::utils::error::{EstimatorError, PersistenceFailure, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Archive storage rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        Ok(tokio::fs::read(full_path).await?)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(full_path, data).await?;
        Ok(())
    }
}

/// Catalog kept as one JSON file per group in a directory.
///
/// File names are the percent-encoded identifier, so `:` and `/` in ids are
/// safe on every platform and the mapping stays reversible.
#[derive(Debug, Clone)]
pub struct LocalCatalogStore {
    dir: PathBuf,
}

impl LocalCatalogStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        let encoded: String = url::form_urlencoded::byte_serialize(id.as_bytes()).collect();
        self.dir.join(format!("{}.json", encoded))
    }
}

fn classify(kind: ErrorKind) -> PersistenceFailure {
    match kind {
        ErrorKind::NotFound => PersistenceFailure::NotFound,
        ErrorKind::AlreadyExists => PersistenceFailure::Conflict,
        _ => PersistenceFailure::Internal,
    }
}

fn persistence_error(id: &str, e: std::io::Error) -> EstimatorError {
    EstimatorError::PersistenceError {
        id: id.to_string(),
        reason: classify(e.kind()),
        message: e.to_string(),
    }
}

impl CatalogStore for LocalCatalogStore {
    async fn get(&self, id: &str) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path_for(id)).await {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(persistence_error(id, e)),
        }
    }

    async fn put(&self, id: &str, blob: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| persistence_error(id, e))?;

        // 先寫暫存檔再改名，避免中斷時留下半個檔案
        let path = self.path_for(id);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, blob)
            .await
            .map_err(|e| persistence_error(id, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                tracing::warn!(path = %tmp.display(), error = %cleanup, "Failed to remove temp file");
            }
            return Err(persistence_error(id, e));
        }
        Ok(())
    }
}
