//! Layout templates and their `{{key}}` placeholder syntax.

use std::collections::BTreeSet;

use crate::domain::error::DomainError;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// A non-empty layout document holding `{{key}}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutTemplate {
    source: String,
}

impl LayoutTemplate {
    pub fn new(source: impl Into<String>) -> Result<Self, DomainError> {
        let source = source.into();
        if source.is_empty() {
            return Err(DomainError::validation("layout must not be empty"));
        }
        Ok(Self { source })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> Segments<'_> {
        Segments::new(&self.source)
    }

    /// Distinct placeholder keys, sorted.
    pub fn placeholders(&self) -> BTreeSet<&str> {
        self.segments()
            .filter_map(|segment| match segment {
                Segment::Placeholder { key, .. } => Some(key),
                Segment::Text(_) => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    /// `raw` is the full `{{key}}` token as written.
    Placeholder { key: &'a str, raw: &'a str },
}

/// Left-to-right tokenizer over a layout.
///
/// A placeholder opens at the innermost `{{` of a brace run, so `{{{x}}}`
/// yields `{`, `{{x}}`, `}`. An unterminated `{{` is plain text.
#[derive(Debug, Clone)]
pub struct Segments<'a> {
    rest: &'a str,
}

impl<'a> Segments<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { rest: source }
    }

    fn take_text(&mut self, len: usize) -> Segment<'a> {
        let (text, rest) = self.rest.split_at(len);
        self.rest = rest;
        Segment::Text(text)
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }

        let start = match self.rest.find(OPEN) {
            Some(0) => 0,
            Some(start) => return Some(self.take_text(start)),
            None => return Some(self.take_text(self.rest.len())),
        };
        debug_assert_eq!(start, 0);

        let after_open = &self.rest[OPEN.len()..];
        if after_open.starts_with('{') {
            return Some(self.take_text(1));
        }

        let Some(end) = after_open.find(CLOSE) else {
            return Some(self.take_text(self.rest.len()));
        };

        let key = &after_open[..end];
        if let Some(inner) = key.find(OPEN) {
            return Some(self.take_text(OPEN.len() + inner));
        }

        let raw_len = OPEN.len() + end + CLOSE.len();
        let (raw, rest) = self.rest.split_at(raw_len);
        self.rest = rest;
        Some(Segment::Placeholder { key, raw })
    }
}
