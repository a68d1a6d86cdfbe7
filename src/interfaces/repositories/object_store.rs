use std::{io, path::{Component, Path, PathBuf}};

use async_trait::async_trait;
use derive_more::Display;
use tokio::fs;

use crate::repositories::local_store::LocalObjectStore;

#[derive(Debug, Display)]
pub enum StorageError {
    #[display("Object not found: {_0}")]
    NotFound(String),

    #[display("Invalid object path: {_0}")]
    InvalidPath(String),

    #[display("Storage IO error: {_0}")]
    Io(String),

    #[display("URL resolution failed: {_0}")]
    UrlResolution(String),
}

/// Handle returned by a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHandle {
    pub path: String,
    pub size: u64,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Writes `bytes` at `path`, replacing anything already there
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<ObjectHandle, StorageError>;

    /// Resolves the durable public URL of a stored object
    async fn get_url(&self, handle: &ObjectHandle) -> Result<String, StorageError>;

    /// Reads the object stored at `path`
    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    /// Removes the object stored at `path`
    async fn delete(&self, path: &str) -> Result<(), StorageError>;
}

impl LocalObjectStore {
    /// Maps an object path onto the storage root, refusing anything that
    /// could escape it.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        if path.is_empty() || path.contains('\\') {
            return Err(StorageError::InvalidPath(path.to_string()));
        }

        let relative = Path::new(path);
        let only_normal = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));

        let bad_segment = path
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");

        if !only_normal || bad_segment {
            return Err(StorageError::InvalidPath(path.to_string()));
        }

        Ok(self.root.join(relative))
    }
}

fn map_io(path: &str, err: io::Error) -> StorageError {
    match err.kind() {
        io::ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
        _ => StorageError::Io(format!("{}: {}", path, err)),
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<ObjectHandle, StorageError> {
        let target = self.resolve(path)?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| map_io(path, e))?;
        }

        fs::write(&target, bytes)
            .await
            .map_err(|e| map_io(path, e))?;

        tracing::debug!("Stored {} bytes at {}", bytes.len(), path);

        Ok(ObjectHandle {
            path: path.to_string(),
            size: bytes.len() as u64,
        })
    }

    async fn get_url(&self, handle: &ObjectHandle) -> Result<String, StorageError> {
        let target = self.resolve(&handle.path)?;

        let exists = fs::try_exists(&target)
            .await
            .map_err(|e| map_io(&handle.path, e))?;
        if !exists {
            return Err(StorageError::NotFound(handle.path.clone()));
        }

        self.public_base_url
            .join(&handle.path)
            .map(|url| url.to_string())
            .map_err(|e| StorageError::UrlResolution(e.to_string()))
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let target = self.resolve(path)?;

        fs::read(&target)
            .await
            .map_err(|e| map_io(path, e))
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        let target = self.resolve(path)?;

        fs::remove_file(&target)
            .await
            .map_err(|e| map_io(path, e))
    }
}
