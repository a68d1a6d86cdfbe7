use std::path::PathBuf;

use url::Url;

use crate::repositories::object_store::StorageError;

/// Object store backed by a directory on the local filesystem.
#[derive(Clone, Debug)]
pub struct LocalObjectStore {
    pub root: PathBuf,
    pub public_base_url: Url,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Result<Self, StorageError> {
        // Url::join drops the last segment unless the base ends with a slash
        let mut base = public_base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        let public_base_url = Url::parse(&base)
            .map_err(|e| StorageError::UrlResolution(format!("{}: {}", base, e)))?;

        Ok(LocalObjectStore {
            root: root.into(),
            public_base_url,
        })
    }
}
