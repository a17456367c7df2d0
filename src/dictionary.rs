//! Load phase: dictionary source to frozen registries

use std::path::Path;

use tracing::{debug, warn};

use crate::format::{
    lint, FormatRegistry, FormatRegistryBuilder, LintWarning, MapDefinition, MapRegistry,
    MapRegistryBuilder,
};
use crate::parser::{self, DictionaryFile, Item};
use crate::LoadError;

/// The formats and maps of one dictionary, frozen for generation
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    formats: FormatRegistry,
    maps: MapRegistry,
}

impl Dictionary {
    /// Parse dictionary source and build its registries
    ///
    /// Lint warnings do not fail the load; each one is logged.
    pub fn parse(source: &str) -> Result<Self, LoadError> {
        let file = parser::parse(source)?;
        let dictionary = Self::from_ast(file)?;

        for warning in dictionary.lint() {
            warn!(category = %warning.category, format = %warning.format, "{}", warning.message);
        }
        debug!(
            formats = dictionary.formats.len(),
            maps = dictionary.maps.len(),
            "dictionary loaded"
        );
        Ok(dictionary)
    }

    /// Read and parse a dictionary file
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let source = std::fs::read_to_string(path)?;
        Self::parse(&source)
    }

    /// Build registries from an already parsed file
    pub fn from_ast(file: DictionaryFile) -> Result<Self, LoadError> {
        let mut formats = FormatRegistryBuilder::new();
        let mut maps = MapRegistryBuilder::new();

        for item in file.items {
            match item.node {
                Item::Format(format) => formats = formats.insert(format)?,
                Item::Map(decl) => {
                    let mut map = MapDefinition::new(decl.name);
                    for (key, value) in decl.entries {
                        map = map.with_entry(key, value);
                    }
                    if let Some(default) = decl.default {
                        map = map.with_default(default);
                    }
                    maps = maps.insert(map)?;
                }
            }
        }

        Ok(Self {
            formats: formats.build()?,
            maps: maps.build(),
        })
    }

    pub fn from_parts(formats: FormatRegistry, maps: MapRegistry) -> Self {
        Self { formats, maps }
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    pub fn maps(&self) -> &MapRegistry {
        &self.maps
    }

    /// Static checks over every format
    pub fn lint(&self) -> Vec<LintWarning> {
        lint::check(&self.formats, &self.maps)
    }

    pub fn into_parts(self) -> (FormatRegistry, MapRegistry) {
        (self.formats, self.maps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::RegistryError;

    #[test]
    fn test_load_formats_and_maps() {
        let dictionary = Dictionary::parse(
            r#"
            format Main { ref helper }
            format helper { lookup types by kind }
            map types default "object" { "int" => "integer" }
            "#,
        )
        .expect("Should load");

        assert_eq!(dictionary.formats().names(), vec!["helper", "Main"]);
        let types = dictionary.maps().get("types").expect("map");
        assert_eq!(types.lookup("int"), "integer");
        assert_eq!(types.lookup("float"), "object");
        assert!(dictionary.lint().is_empty());
    }

    #[test]
    fn test_duplicate_format_is_load_error() {
        let result = Dictionary::parse("format a { } format A { }");
        assert!(matches!(
            result,
            Err(LoadError::Registry(RegistryError::Duplicate { .. }))
        ));
    }

    #[test]
    fn test_cycle_is_load_error() {
        let result = Dictionary::parse("format a { ref b } format b { line { ref a } }");
        match result {
            Err(LoadError::Registry(RegistryError::CircularReference { chain })) => {
                assert_eq!(chain, "a -> b -> a")
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_reference_loads_with_lint() {
        let dictionary = Dictionary::parse("format a { ref nowhere }").expect("Should load");
        assert_eq!(dictionary.lint().len(), 1);
    }

    #[test]
    fn test_syntax_error_is_load_error() {
        let result = Dictionary::parse("format a { line }");
        assert!(matches!(result, Err(LoadError::Parse(ref errs)) if !errs.is_empty()));
    }
}
