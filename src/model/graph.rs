//! In-memory story model loaded from TOML
//!
//! ```toml
//! root = "gate"
//!
//! [[entity]]
//! id = "gate"
//! kind = "script_it"
//! name = "Open Gate"
//! slots = ["onUse"]
//! attributes.text = "gate is open"
//! scopes.condition = "cond"
//! series.children = ["a", "b"]
//! text_series.includes = ["stdio.h"]
//! predicates.is_last_task = true
//! ```
//!
//! Entity ids are strings in the file and [`EntityId`]s, assigned in
//! declaration order, once loaded. Every referenced id must be declared.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use super::{EntityId, Focus, StoryModel};
use crate::fragment::{PredicateKind, ScopeKind, SeriesKind, UnknownDirective};

/// Errors that can occur when loading a story graph
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Failed to read story model file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse story model TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("story model has no entities")]
    Empty,
    #[error("duplicate entity id: {id}")]
    DuplicateEntity { id: String },
    #[error("entity '{entity}' references undefined entity '{id}'")]
    UnknownEntity { entity: String, id: String },
    #[error("root entity '{id}' is not defined")]
    UnknownRoot { id: String },
    #[error("entity '{entity}': {source}")]
    InvalidKey {
        entity: String,
        #[source]
        source: UnknownDirective,
    },
}

#[derive(Deserialize)]
struct TomlGraph {
    root: Option<String>,
    #[serde(default)]
    entity: Vec<TomlEntity>,
}

#[derive(Deserialize)]
struct TomlEntity {
    id: String,
    kind: Option<String>,
    name: Option<String>,
    #[serde(default)]
    slots: Vec<String>,
    #[serde(default)]
    attributes: HashMap<String, String>,
    #[serde(default)]
    scopes: HashMap<String, String>,
    #[serde(default)]
    series: HashMap<String, Vec<String>>,
    #[serde(default)]
    text_series: HashMap<String, Vec<String>>,
    #[serde(default)]
    predicates: HashMap<String, bool>,
}

#[derive(Debug, Clone)]
struct Entity {
    key: String,
    kind: Option<String>,
    name: Option<String>,
    slots: Vec<String>,
    attributes: HashMap<String, String>,
    scopes: HashMap<ScopeKind, EntityId>,
    series: HashMap<SeriesKind, Vec<Focus>>,
    predicates: HashMap<PredicateKind, bool>,
}

/// A story model held entirely in memory
#[derive(Debug, Clone)]
pub struct StoryGraph {
    root: EntityId,
    ids: HashMap<String, EntityId>,
    entities: Vec<Entity>,
}

impl StoryGraph {
    /// Load a story graph from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, GraphError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load a story graph from a TOML string
    pub fn from_str(content: &str) -> Result<Self, GraphError> {
        let parsed: TomlGraph = toml::from_str(content)?;
        if parsed.entity.is_empty() {
            return Err(GraphError::Empty);
        }

        let mut ids = HashMap::new();
        for (index, entity) in parsed.entity.iter().enumerate() {
            if ids.insert(entity.id.clone(), EntityId(index as u64)).is_some() {
                return Err(GraphError::DuplicateEntity {
                    id: entity.id.clone(),
                });
            }
        }

        let entities = parsed
            .entity
            .into_iter()
            .map(|e| convert_entity(e, &ids))
            .collect::<Result<Vec<_>, _>>()?;

        let root = match parsed.root {
            Some(id) => *ids.get(&id).ok_or(GraphError::UnknownRoot { id })?,
            None => EntityId(0),
        };

        Ok(Self {
            root,
            ids,
            entities,
        })
    }

    /// Entity generation starts from unless told otherwise
    pub fn root(&self) -> EntityId {
        self.root
    }

    /// Loaded id of the entity declared as `key`
    pub fn entity_id(&self, key: &str) -> Option<EntityId> {
        self.ids.get(key).copied()
    }

    /// Declared string id of a loaded entity
    pub fn key(&self, entity: EntityId) -> Option<&str> {
        self.entity(entity).map(|e| e.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.0 as usize)
    }

    fn find_named(&self, entity: EntityId, source: SeriesKind, name: &str) -> Option<Focus> {
        self.series(entity, source).into_iter().find(|candidate| match candidate {
            Focus::Entity(id) => self
                .display_name(*id)
                .map(|n| n.eq_ignore_ascii_case(name))
                .unwrap_or(false),
            Focus::Text(text) => text.eq_ignore_ascii_case(name),
        })
    }
}

fn convert_entity(e: TomlEntity, ids: &HashMap<String, EntityId>) -> Result<Entity, GraphError> {
    let lookup = |id: &str| {
        ids.get(id).copied().ok_or_else(|| GraphError::UnknownEntity {
            entity: e.id.clone(),
            id: id.to_string(),
        })
    };
    let invalid = |source| GraphError::InvalidKey {
        entity: e.id.clone(),
        source,
    };

    let mut scopes = HashMap::new();
    for (kind, target) in &e.scopes {
        scopes.insert(kind.parse::<ScopeKind>().map_err(invalid)?, lookup(target)?);
    }

    let mut series: HashMap<SeriesKind, Vec<Focus>> = HashMap::new();
    for (kind, targets) in &e.series {
        let items = targets
            .iter()
            .map(|t| lookup(t).map(Focus::Entity))
            .collect::<Result<Vec<_>, _>>()?;
        series
            .entry(kind.parse().map_err(invalid)?)
            .or_default()
            .extend(items);
    }
    // text items follow entity items of the same series
    for (kind, texts) in &e.text_series {
        series
            .entry(kind.parse().map_err(invalid)?)
            .or_default()
            .extend(texts.iter().map(|t| Focus::Text(t.clone())));
    }

    let mut predicates = HashMap::new();
    for (kind, value) in &e.predicates {
        predicates.insert(kind.parse::<PredicateKind>().map_err(invalid)?, *value);
    }

    Ok(Entity {
        key: e.id.clone(),
        kind: e.kind.clone(),
        name: e.name.clone(),
        slots: e.slots.clone(),
        attributes: e.attributes.clone(),
        scopes,
        series,
        predicates,
    })
}

impl StoryModel for StoryGraph {
    fn display_name(&self, entity: EntityId) -> Option<String> {
        self.entity(entity).and_then(|e| e.name.clone())
    }

    fn kind(&self, entity: EntityId) -> Option<String> {
        self.entity(entity).and_then(|e| e.kind.clone())
    }

    fn slots(&self, entity: EntityId) -> Vec<String> {
        self.entity(entity).map(|e| e.slots.clone()).unwrap_or_default()
    }

    fn attribute(&self, entity: EntityId, key: &str) -> Option<String> {
        let e = self.entity(entity)?;
        e.attributes
            .get(key)
            .or_else(|| {
                e.attributes
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(key))
                    .map(|(_, v)| v)
            })
            .cloned()
    }

    fn scope(&self, entity: EntityId, kind: ScopeKind, name_ref: Option<&str>) -> Option<Focus> {
        let e = self.entity(entity)?;
        if let Some(target) = e.scopes.get(&kind) {
            return Some(Focus::Entity(*target));
        }
        match (kind.named_source(), name_ref) {
            (Some(source), Some(name)) => self.find_named(entity, source, name),
            _ => None,
        }
    }

    fn series(&self, entity: EntityId, kind: SeriesKind) -> Vec<Focus> {
        self.entity(entity)
            .and_then(|e| e.series.get(&kind).cloned())
            .unwrap_or_default()
    }

    fn predicate(&self, entity: EntityId, kind: PredicateKind) -> bool {
        self.entity(entity)
            .and_then(|e| e.predicates.get(&kind).copied())
            .unwrap_or(false)
    }
}
