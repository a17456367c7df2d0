//! Candidate filtering and de-duplication for series fragments

use std::collections::HashSet;
use std::fmt;

use tracing::warn;

use super::Pattern;
use crate::model::{Focus, StoryModel};

/// Attribute a series filter matches against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterBy {
    None,
    Name,
    Slot,
}

impl fmt::Display for FilterBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterBy::None => write!(f, "none"),
            FilterBy::Name => write!(f, "name"),
            FilterBy::Slot => write!(f, "slot"),
        }
    }
}

impl std::str::FromStr for FilterBy {
    type Err = super::UnknownDirective;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(FilterBy::None),
            "name" => Ok(FilterBy::Name),
            "slot" => Ok(FilterBy::Slot),
            _ => Err(super::UnknownDirective {
                category: "filter",
                keyword: s.to_string(),
            }),
        }
    }
}

/// Regex filter over series candidates
///
/// `Name` matches the display name (the text itself for text candidates).
/// `Slot` keeps an entity when any of its slots matches; entities without
/// slots and text candidates are excluded.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesFilter {
    by: FilterBy,
    pattern: Option<Pattern>,
}

impl Default for SeriesFilter {
    fn default() -> Self {
        Self::none()
    }
}

impl SeriesFilter {
    pub fn none() -> Self {
        Self {
            by: FilterBy::None,
            pattern: None,
        }
    }

    pub fn name(pattern: impl Into<String>) -> Self {
        Self {
            by: FilterBy::Name,
            pattern: Some(Pattern::new(pattern)),
        }
    }

    pub fn slot(pattern: impl Into<String>) -> Self {
        Self {
            by: FilterBy::Slot,
            pattern: Some(Pattern::new(pattern)),
        }
    }

    pub fn new(by: FilterBy, pattern: impl Into<String>) -> Self {
        match by {
            FilterBy::None => Self::none(),
            FilterBy::Name => Self::name(pattern),
            FilterBy::Slot => Self::slot(pattern),
        }
    }

    pub fn by(&self) -> FilterBy {
        self.by
    }

    pub fn pattern(&self) -> Option<&Pattern> {
        self.pattern.as_ref()
    }

    pub fn is_none(&self) -> bool {
        self.by == FilterBy::None
    }

    /// Keep the candidates the filter accepts, in input order
    pub fn apply(&self, candidates: Vec<Focus>, model: &dyn StoryModel) -> Vec<Focus> {
        let pattern = match (&self.by, &self.pattern) {
            (FilterBy::None, _) | (_, None) => return candidates,
            (_, Some(p)) => p,
        };

        if let Some(err) = pattern.error() {
            warn!(
                filter = %self.by,
                pattern = pattern.source(),
                "invalid series filter regex, rejecting all candidates: {}",
                err
            );
            return Vec::new();
        }

        candidates
            .into_iter()
            .filter(|candidate| self.accepts(pattern, candidate, model))
            .collect()
    }

    fn accepts(&self, pattern: &Pattern, candidate: &Focus, model: &dyn StoryModel) -> bool {
        match (self.by, candidate) {
            (FilterBy::None, _) => true,
            (FilterBy::Name, Focus::Text(text)) => pattern.matches(text),
            (FilterBy::Name, Focus::Entity(id)) => model
                .display_name(*id)
                .map(|name| pattern.matches(&name))
                .unwrap_or(false),
            (FilterBy::Slot, Focus::Text(_)) => false,
            (FilterBy::Slot, Focus::Entity(id)) => {
                model.slots(*id).iter().any(|slot| pattern.matches(slot))
            }
        }
    }
}

/// Drop repeated candidates, keeping the first occurrence of each
pub fn uniquify(candidates: Vec<Focus>) -> Vec<Focus> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.clone()))
        .collect()
}
