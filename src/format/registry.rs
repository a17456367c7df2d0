//! Frozen table of named formats

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::fragment::{Fragment, FormatDefinition};

/// Errors raised while building or querying a registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Entry not found in registry
    #[error("format not found: {name}")]
    NotFound { name: String },

    /// Two entries whose names differ only in case, or not at all
    #[error("duplicate definition: {name}")]
    Duplicate { name: String },

    /// Formats that reference each other in a loop
    #[error("circular format reference detected: {chain}")]
    CircularReference { chain: String },
}

/// Named formats, keyed case-insensitively
///
/// Only [`FormatRegistryBuilder::build`] produces one, so a registry handed
/// to the generator is read-only and free of reference cycles.
#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    formats: HashMap<String, FormatDefinition>,
}

impl FormatRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&FormatDefinition> {
        self.formats.get(&name.to_lowercase())
    }

    /// Like [`get`](Self::get), but a miss is an error
    pub fn require(&self, name: &str) -> Result<&FormatDefinition, RegistryError> {
        self.get(name).ok_or_else(|| RegistryError::NotFound {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.formats.contains_key(&name.to_lowercase())
    }

    /// Format names as written in their definitions, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.formats.values().map(|f| f.name.as_str()).collect();
        names.sort_by_key(|n| n.to_lowercase());
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = &FormatDefinition> {
        self.formats.values()
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}

/// Load-phase collector for [`FormatRegistry`]
#[derive(Debug, Default)]
pub struct FormatRegistryBuilder {
    formats: HashMap<String, FormatDefinition>,
}

impl FormatRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, format: FormatDefinition) -> Result<Self, RegistryError> {
        let key = format.name.to_lowercase();
        if self.formats.contains_key(&key) {
            return Err(RegistryError::Duplicate { name: format.name });
        }
        self.formats.insert(key, format);
        Ok(self)
    }

    /// Freeze the registry, rejecting reference cycles
    pub fn build(self) -> Result<FormatRegistry, RegistryError> {
        if let Some(cycle) = find_cycle(&self.formats) {
            return Err(RegistryError::CircularReference {
                chain: cycle.join(" -> "),
            });
        }
        Ok(FormatRegistry {
            formats: self.formats,
        })
    }
}

/// Names of the formats referenced anywhere inside `format`
pub(crate) fn references(format: &FormatDefinition) -> Vec<&str> {
    let mut names = Vec::new();
    for fragment in &format.fragments {
        fragment.walk(&mut |f| {
            if let Fragment::Reference(r) = f {
                names.push(r.name.as_str());
            }
        });
    }
    names
}

fn find_cycle(formats: &HashMap<String, FormatDefinition>) -> Option<Vec<String>> {
    let mut keys: Vec<&String> = formats.keys().collect();
    keys.sort();

    let mut done = HashSet::new();
    for key in keys {
        let mut path = Vec::new();
        if let Some(cycle) = visit(key, formats, &mut path, &mut done) {
            return Some(cycle);
        }
    }
    None
}

fn visit<'a>(
    key: &'a str,
    formats: &'a HashMap<String, FormatDefinition>,
    path: &mut Vec<&'a str>,
    done: &mut HashSet<&'a str>,
) -> Option<Vec<String>> {
    if let Some(start) = path.iter().position(|k| *k == key) {
        let mut chain: Vec<String> = path[start..]
            .iter()
            .map(|k| formats[*k].name.clone())
            .collect();
        chain.push(formats[key].name.clone());
        return Some(chain);
    }
    if done.contains(key) {
        return None;
    }

    // Missing targets are reported by lint, not here
    let format = formats.get(key)?;
    path.push(key);
    for target in references(format) {
        if let Some((target_key, _)) = formats.get_key_value(&target.to_lowercase()) {
            if let Some(cycle) = visit(target_key, formats, path, done) {
                return Some(cycle);
            }
        }
    }
    path.pop();
    done.insert(key);
    None
}
