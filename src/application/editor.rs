//! Revision history for an editing session.

use crate::domain::error::DomainError;
use crate::domain::sections::{MoveDirection, SectionConfig, SectionId};

/// A single editor action.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    Content {
        id: SectionId,
        content: String,
    },
    Style {
        id: SectionId,
        attribute: String,
        value: String,
    },
    Move {
        index: usize,
        direction: MoveDirection,
    },
}

impl Edit {
    /// Build a move from the editor's `-1`/`+1` offset.
    pub fn move_by(index: usize, offset: i64) -> Result<Self, DomainError> {
        let direction = MoveDirection::from_offset(offset).ok_or_else(|| {
            DomainError::validation(format!("move offset must be -1 or 1, got {offset}"))
        })?;
        Ok(Edit::Move { index, direction })
    }

    pub fn apply(&self, config: &SectionConfig) -> Result<SectionConfig, DomainError> {
        match self {
            Edit::Content { id, content } => config.with_content(id, content.as_str()),
            Edit::Style {
                id,
                attribute,
                value,
            } => config.with_style(id, attribute, value),
            Edit::Move { index, direction } => Ok(config.moved(*index, *direction)),
        }
    }
}

/// Current configuration plus undo and redo stacks.
#[derive(Debug, Clone)]
pub struct EditHistory {
    current: SectionConfig,
    undo: Vec<SectionConfig>,
    redo: Vec<SectionConfig>,
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new(SectionConfig::seeded())
    }
}

impl EditHistory {
    pub fn new(initial: SectionConfig) -> Self {
        Self {
            current: initial,
            undo: Vec::new(),
            redo: Vec::new(),
        }
    }

    pub fn current(&self) -> &SectionConfig {
        &self.current
    }

    /// Apply `edit`. Returns `Ok(false)` when the edit produced no change, in
    /// which case nothing is recorded.
    pub fn apply(&mut self, edit: &Edit) -> Result<bool, DomainError> {
        let next = edit.apply(&self.current)?;
        if next == self.current {
            return Ok(false);
        }
        let previous = std::mem::replace(&mut self.current, next);
        self.undo.push(previous);
        self.redo.clear();
        Ok(true)
    }

    pub fn undo(&mut self) -> bool {
        match self.undo.pop() {
            Some(previous) => {
                let current = std::mem::replace(&mut self.current, previous);
                self.redo.push(current);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.redo.pop() {
            Some(next) => {
                let current = std::mem::replace(&mut self.current, next);
                self.undo.push(current);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
}
