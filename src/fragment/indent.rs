//! Indentation prefix tracking for line emission

use thiserror::Error;

/// Popping more indent units than were pushed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("indent stack underflow")]
pub struct IndentUnderflow;

/// Stack of indent units whose concatenation prefixes every emitted line
#[derive(Debug, Clone, Default)]
pub struct IndentTracker {
    units: Vec<String>,
    prefix: String,
}

impl IndentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, unit: impl Into<String>) {
        let unit = unit.into();
        self.prefix.push_str(&unit);
        self.units.push(unit);
    }

    /// Remove the innermost unit. Underflow means a template imbalance.
    pub fn pop(&mut self) -> Result<(), IndentUnderflow> {
        let unit = self.units.pop().ok_or(IndentUnderflow)?;
        self.prefix.truncate(self.prefix.len() - unit.len());
        Ok(())
    }

    pub fn current(&self) -> &str {
        &self.prefix
    }

    pub fn depth(&self) -> usize {
        self.units.len()
    }
}
