//! Filesystem-backed layout source.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::application::ports::{LayoutSource, SourceError};

/// Reads the layout file on every request so edits on disk show up without a restart.
#[derive(Debug, Clone)]
pub struct FileLayoutSource {
    path: PathBuf,
}

impl FileLayoutSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LayoutSource for FileLayoutSource {
    async fn load_layout(&self) -> Result<String, SourceError> {
        let location = self.path.display().to_string();
        let bytes = fs::read(&self.path)
            .await
            .map_err(|source| SourceError::Unavailable {
                location: location.clone(),
                source,
            })?;
        String::from_utf8(bytes).map_err(|_| SourceError::Encoding { location })
    }
}
