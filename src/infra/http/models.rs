//! Request and response bodies exchanged with the browser editor.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::application::render::{RenderError, Substitutions};
use crate::domain::sections::{Section, SectionConfig};

/// `config` in a render request: the editor's section list, or a flat object
/// mapping keys straight to content.
///
/// The list is taken as sent. Rendering only reads `type` and `content`, so
/// repeated ids are not an error here.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ConfigPayload {
    Sections(Vec<Section>),
    Mapping(Map<String, Value>),
}

impl ConfigPayload {
    pub fn substitutions(&self) -> Result<Substitutions, RenderError> {
        match self {
            ConfigPayload::Sections(sections) => Ok(Substitutions::from(sections.as_slice())),
            ConfigPayload::Mapping(values) => values
                .iter()
                .map(|(key, value)| scalar_text(value).map(|text| (key.as_str(), text)))
                .collect(),
        }
    }
}

fn scalar_text(value: &Value) -> Result<String, RenderError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        Value::Null => Ok("null".to_string()),
        Value::Array(_) | Value::Object(_) => Err(RenderError::InvalidInput(
            "config values must be strings, numbers or booleans",
        )),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RenderRequest {
    pub layout: Option<String>,
    pub config: Option<ConfigPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RenderQuery {
    pub download: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderResponse {
    #[serde(rename = "renderedHTML")]
    pub rendered_html: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveConfigRequest {
    pub sections: Option<SectionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}
