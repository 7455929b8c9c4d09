//! Editable email sections and the ordered configuration that holds them.
//!
//! A [`SectionConfig`] is a value: every edit returns a new revision and leaves
//! the receiver untouched. Sections are addressed by [`SectionId`] for editing
//! and reordering, while their `type` key is what the renderer substitutes.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::error::DomainError;

/// Style attribute carrying the section text color.
pub const STYLE_COLOR: &str = "color";

/// Style attribute carrying the section text alignment.
pub const STYLE_TEXT_ALIGN: &str = "textAlign";

/// Opaque editor identifier. The browser editor sends numbers, other clients may send strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionId {
    Number(u64),
    Text(String),
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionId::Number(value) => write!(f, "{value}"),
            SectionId::Text(value) => f.write_str(value),
        }
    }
}

impl From<u64> for SectionId {
    fn from(value: u64) -> Self {
        SectionId::Number(value)
    }
}

impl From<&str> for SectionId {
    fn from(value: &str) -> Self {
        SectionId::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

impl FromStr for TextAlign {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "left" => Ok(TextAlign::Left),
            "center" => Ok(TextAlign::Center),
            "right" => Ok(TextAlign::Right),
            other => Err(DomainError::validation(format!(
                "unsupported text alignment `{other}`"
            ))),
        }
    }
}

/// Inline style attributes picked in the editor, kept as the client sent them.
///
/// Rendering never reads style, so any JSON object is accepted and a `null`,
/// missing or non-object style is empty. Values are only checked when an edit
/// goes through [`SectionConfig::with_style`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SectionStyle {
    attributes: BTreeMap<String, Value>,
}

impl<'de> Deserialize<'de> for SectionStyle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let attributes = match Value::deserialize(deserializer)? {
            Value::Object(map) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        };
        Ok(Self { attributes })
    }
}

impl SectionStyle {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    pub fn color(&self) -> Option<&str> {
        self.get(STYLE_COLOR).and_then(Value::as_str)
    }

    /// `None` when unset or when the stored value is not a known alignment.
    pub fn text_align(&self) -> Option<TextAlign> {
        self.get(STYLE_TEXT_ALIGN)
            .and_then(Value::as_str)
            .and_then(|value| value.parse().ok())
    }

    fn with_attribute(&self, attribute: &str, value: &str) -> Result<Self, DomainError> {
        let stored = match attribute {
            "" => return Err(DomainError::validation("style attribute name is empty")),
            STYLE_TEXT_ALIGN => value.parse::<TextAlign>()?.as_str(),
            _ => value,
        };
        let mut next = self.clone();
        next.attributes.insert(attribute.to_string(), Value::from(stored));
        Ok(next)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    /// Substitution key: `{{type}}` in the layout is replaced by `content`.
    #[serde(rename = "type")]
    pub key: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub style: SectionStyle,
}

impl Section {
    pub fn new(id: impl Into<SectionId>, key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            content: String::new(),
            style: SectionStyle::default(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

/// Adjacent-swap direction, `-1`/`+1` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

impl MoveDirection {
    pub fn from_offset(offset: i64) -> Option<Self> {
        match offset {
            -1 => Some(MoveDirection::Up),
            1 => Some(MoveDirection::Down),
            _ => None,
        }
    }
}

/// Ordered sequence of sections with unique ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Section>", into = "Vec<Section>")]
pub struct SectionConfig {
    sections: Vec<Section>,
}

impl SectionConfig {
    pub fn new(sections: Vec<Section>) -> Result<Self, DomainError> {
        let mut seen = HashSet::with_capacity(sections.len());
        for section in &sections {
            if !seen.insert(&section.id) {
                return Err(DomainError::validation(format!(
                    "duplicate section id `{}`",
                    section.id
                )));
            }
        }
        Ok(Self { sections })
    }

    /// The three sections a fresh editing session starts with.
    pub fn seeded() -> Self {
        Self {
            sections: vec![
                Section::new(1, "title"),
                Section::new(2, "content"),
                Section::new(3, "footer"),
            ],
        }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn find(&self, id: &SectionId) -> Option<&Section> {
        self.sections.iter().find(|section| &section.id == id)
    }

    pub fn with_content(
        &self,
        id: &SectionId,
        content: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let content = content.into();
        self.map_section(id, |section| {
            Ok(Section {
                content,
                ..section.clone()
            })
        })
    }

    pub fn with_style(
        &self,
        id: &SectionId,
        attribute: &str,
        value: &str,
    ) -> Result<Self, DomainError> {
        self.map_section(id, |section| {
            Ok(Section {
                style: section.style.with_attribute(attribute, value)?,
                ..section.clone()
            })
        })
    }

    /// Swap the section at `index` with its neighbour. Moving past either end
    /// returns an unchanged copy.
    pub fn moved(&self, index: usize, direction: MoveDirection) -> Self {
        let target = match direction {
            MoveDirection::Up => index.checked_sub(1),
            MoveDirection::Down => index.checked_add(1),
        };

        let mut next = self.clone();
        match target {
            Some(target) if index < self.len() && target < self.len() => {
                next.sections.swap(index, target);
            }
            _ => {}
        }
        next
    }

    fn map_section<F>(&self, id: &SectionId, edit: F) -> Result<Self, DomainError>
    where
        F: FnOnce(&Section) -> Result<Section, DomainError>,
    {
        let position = self
            .sections
            .iter()
            .position(|section| &section.id == id)
            .ok_or_else(|| DomainError::section_not_found(id))?;

        let mut next = self.clone();
        next.sections[position] = edit(&self.sections[position])?;
        Ok(next)
    }
}

impl TryFrom<Vec<Section>> for SectionConfig {
    type Error = DomainError;

    fn try_from(sections: Vec<Section>) -> Result<Self, Self::Error> {
        Self::new(sections)
    }
}

impl From<SectionConfig> for Vec<Section> {
    fn from(config: SectionConfig) -> Self {
        config.sections
    }
}
