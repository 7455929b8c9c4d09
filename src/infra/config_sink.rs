//! Configuration sink that records saved configurations in the log.

use async_trait::async_trait;
use metrics::counter;
use tracing::info;

use crate::application::ports::{ConfigSink, SinkError};
use crate::domain::sections::SectionConfig;

#[derive(Debug, Clone, Default)]
pub struct LoggingConfigSink;

impl LoggingConfigSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConfigSink for LoggingConfigSink {
    async fn save(&self, config: &SectionConfig) -> Result<(), SinkError> {
        let encoded =
            serde_json::to_string(config).map_err(|err| SinkError::Rejected(err.to_string()))?;
        info!(
            target = "mailcraft::config",
            sections = config.len(),
            config = %encoded,
            "email configuration saved"
        );
        counter!("mailcraft_config_saved_total").increment(1);
        Ok(())
    }
}
