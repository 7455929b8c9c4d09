//! Layout placeholder substitution.
//!
//! Rendering is a single scan over the layout: each `{{key}}` token is looked
//! up in a [`Substitutions`] map built once from the configuration. Inserted
//! content is never rescanned, so a section whose content itself looks like a
//! placeholder is emitted literally. Section styles are not applied.

use std::collections::{BTreeSet, HashMap};

use metrics::counter;
use thiserror::Error;
use tracing::debug;

use crate::domain::layout::{LayoutTemplate, Segment};
use crate::domain::sections::{Section, SectionConfig};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
}

/// Key to content lookup. Later insertions for the same key replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitutions {
    values: HashMap<String, String>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, content: impl Into<String>) {
        self.values.insert(key.into(), content.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Substitutions
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut substitutions = Substitutions::new();
        for (key, value) in iter {
            substitutions.insert(key, value);
        }
        substitutions
    }
}

impl From<&[Section]> for Substitutions {
    fn from(sections: &[Section]) -> Self {
        sections
            .iter()
            .map(|section| (section.key.as_str(), section.content.as_str()))
            .collect()
    }
}

impl From<&SectionConfig> for Substitutions {
    fn from(config: &SectionConfig) -> Self {
        Self::from(config.sections())
    }
}

/// Render `layout` with the content of `sections`.
///
/// Fails when the layout is empty or no configuration was supplied.
pub fn render(layout: &str, sections: Option<&SectionConfig>) -> Result<String, RenderError> {
    let sections = sections.ok_or(RenderError::InvalidInput("sections are required"))?;
    let layout = parse_layout(layout)?;
    Ok(substitute(&layout, &Substitutions::from(sections)))
}

pub fn parse_layout(layout: &str) -> Result<LayoutTemplate, RenderError> {
    LayoutTemplate::new(layout).map_err(|_| RenderError::InvalidInput("layout must not be empty"))
}

/// Replace every resolvable placeholder in `layout`; unknown ones are kept verbatim.
pub fn substitute(layout: &LayoutTemplate, substitutions: &Substitutions) -> String {
    let mut output = String::with_capacity(layout.as_str().len());
    for segment in layout.segments() {
        match segment {
            Segment::Text(text) => output.push_str(text),
            Segment::Placeholder { key, raw } => {
                output.push_str(substitutions.get(key).unwrap_or(raw));
            }
        }
    }
    output
}

/// Placeholder keys in `layout` that `substitutions` leaves untouched.
pub fn unresolved<'a>(
    layout: &'a LayoutTemplate,
    substitutions: &Substitutions,
) -> BTreeSet<&'a str> {
    layout
        .placeholders()
        .into_iter()
        .filter(|key| substitutions.get(key).is_none())
        .collect()
}

/// Rendering entry point used by the HTTP surface and the CLI.
#[derive(Debug, Clone, Default)]
pub struct RenderService;

impl RenderService {
    pub fn new() -> Self {
        Self
    }

    pub fn render(
        &self,
        layout: Option<&str>,
        substitutions: Option<&Substitutions>,
    ) -> Result<String, RenderError> {
        let result = self.render_inner(layout, substitutions);
        match &result {
            Ok(_) => counter!("mailcraft_render_total").increment(1),
            Err(_) => counter!("mailcraft_render_failed_total").increment(1),
        }
        result
    }

    fn render_inner(
        &self,
        layout: Option<&str>,
        substitutions: Option<&Substitutions>,
    ) -> Result<String, RenderError> {
        let layout = parse_layout(layout.unwrap_or_default())?;
        let substitutions =
            substitutions.ok_or(RenderError::InvalidInput("sections are required"))?;

        let missing = unresolved(&layout, substitutions);
        if !missing.is_empty() {
            debug!(
                target = "mailcraft::render",
                unresolved = ?missing,
                "layout placeholders left unresolved"
            );
        }

        Ok(substitute(&layout, substitutions))
    }
}
