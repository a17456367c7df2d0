//! Read-only query interface onto the story model
//!
//! The code generator never owns the story graph. It sees it through
//! [`StoryModel`], a narrow set of queries keyed by [`EntityId`]: single-entity
//! scopes, ordered series, boolean predicates and named attributes.

mod graph;

pub use graph::{GraphError, StoryGraph};

use std::fmt;

use crate::fragment::{PredicateKind, ScopeKind, SeriesKind};

/// Opaque handle to an entity of the story model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a context is currently focused on
///
/// Series can yield plain strings (include files, for example) as well as
/// model entities, so the focus is one of the two.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Focus {
    Entity(EntityId),
    Text(String),
}

impl Focus {
    pub fn entity(&self) -> Option<EntityId> {
        match self {
            Focus::Entity(id) => Some(*id),
            Focus::Text(_) => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Focus::Text(s) => Some(s.as_str()),
            Focus::Entity(_) => None,
        }
    }
}

impl From<EntityId> for Focus {
    fn from(id: EntityId) -> Self {
        Focus::Entity(id)
    }
}

impl From<&str> for Focus {
    fn from(text: &str) -> Self {
        Focus::Text(text.to_string())
    }
}

/// Queries the generator issues against the story model
///
/// Implementations must be side-effect free: the same query against the same
/// entity returns the same answer for the duration of a generation run.
pub trait StoryModel {
    /// Human-readable name of the entity, used by name filters and identifiers
    fn display_name(&self, entity: EntityId) -> Option<String>;

    /// Kind tag of the entity (e.g. "script_it", "know_it")
    fn kind(&self, entity: EntityId) -> Option<String>;

    /// Slot tags attached to the entity; empty when it has none
    fn slots(&self, entity: EntityId) -> Vec<String>;

    /// Named scalar attribute of the entity
    fn attribute(&self, entity: EntityId, key: &str) -> Option<String>;

    /// Single related entity; `name_ref` qualifies kinds such as `parameter`
    fn scope(&self, entity: EntityId, kind: ScopeKind, name_ref: Option<&str>) -> Option<Focus>;

    /// Ordered related entities; an unknown relation is an empty series
    fn series(&self, entity: EntityId, kind: SeriesKind) -> Vec<Focus>;

    /// Boolean query about the entity
    fn predicate(&self, entity: EntityId, kind: PredicateKind) -> bool;
}
