//! Named string -> string maps consulted by lookup fragments

use std::collections::HashMap;

use super::RegistryError;

/// A key -> value table with an optional fallback value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapDefinition {
    pub name: String,
    entries: HashMap<String, String>,
    default: Option<String>,
}

impl MapDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
            default: None,
        }
    }

    pub fn with_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Exact-key lookup without the default
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|s| s.as_str())
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Value for `key`, else the default, else the empty string
    pub fn lookup(&self, key: &str) -> &str {
        self.get(key).or(self.default_value()).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Named maps, keyed case-insensitively
#[derive(Debug, Clone, Default)]
pub struct MapRegistry {
    maps: HashMap<String, MapDefinition>,
}

impl MapRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&MapDefinition> {
        self.maps.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.maps.contains_key(&name.to_lowercase())
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.maps.values().map(|m| m.name.as_str()).collect();
        names.sort_by_key(|n| n.to_lowercase());
        names
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

/// Load-phase collector for [`MapRegistry`]
#[derive(Debug, Default)]
pub struct MapRegistryBuilder {
    maps: HashMap<String, MapDefinition>,
}

impl MapRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, map: MapDefinition) -> Result<Self, RegistryError> {
        let key = map.name.to_lowercase();
        if self.maps.contains_key(&key) {
            return Err(RegistryError::Duplicate { name: map.name });
        }
        self.maps.insert(key, map);
        Ok(self)
    }

    pub fn build(self) -> MapRegistry {
        MapRegistry { maps: self.maps }
    }
}
