//! Traits describing the collaborators around the renderer.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::sections::SectionConfig;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("layout `{location}` is unavailable")]
    Unavailable {
        location: String,
        #[source]
        source: std::io::Error,
    },
    #[error("layout `{location}` is not valid UTF-8")]
    Encoding { location: String },
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("configuration could not be recorded: {0}")]
    Rejected(String),
}

/// Supplies the current layout template.
#[async_trait]
pub trait LayoutSource: Send + Sync {
    async fn load_layout(&self) -> Result<String, SourceError>;
}

/// Accepts saved configurations. Acknowledgement implies receipt only.
#[async_trait]
pub trait ConfigSink: Send + Sync {
    async fn save(&self, config: &SectionConfig) -> Result<(), SinkError>;
}
