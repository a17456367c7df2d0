//! Target language definition
//!
//! The generator knows nothing about the language it emits. The indent unit,
//! the line terminator and the reserved words that generated identifiers must
//! avoid all come from a [`LanguageDefinition`], passed explicitly to every
//! run so that several languages can be generated side by side.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading a language definition
#[derive(Error, Debug)]
pub enum LanguageError {
    #[error("Failed to read language file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse language TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LanguageDefinition {
    name: String,
    indent_unit: String,
    line_terminator: String,
    reserved_words: HashSet<String>,
}

/// TOML structure for deserializing language definitions
#[derive(Deserialize)]
struct TomlLanguageFile {
    language: TomlLanguage,
}

#[derive(Deserialize)]
struct TomlLanguage {
    name: Option<String>,
    indent: Option<String>,
    line_terminator: Option<String>,
    #[serde(default)]
    reserved_words: Vec<String>,
}

impl Default for LanguageDefinition {
    fn default() -> Self {
        Self {
            name: "generic".to_string(),
            indent_unit: "\t".to_string(),
            line_terminator: "\n".to_string(),
            reserved_words: HashSet::new(),
        }
    }
}

impl LanguageDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Load a language definition from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, LanguageError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load a language definition from a TOML string
    ///
    /// Missing keys keep their defaults.
    pub fn from_str(content: &str) -> Result<Self, LanguageError> {
        let parsed: TomlLanguageFile = toml::from_str(content)?;
        let lang = parsed.language;
        let defaults = Self::default();

        Ok(Self {
            name: lang.name.unwrap_or(defaults.name),
            indent_unit: lang.indent.unwrap_or(defaults.indent_unit),
            line_terminator: lang.line_terminator.unwrap_or(defaults.line_terminator),
            reserved_words: lang.reserved_words.into_iter().collect(),
        })
    }

    pub fn with_indent(mut self, unit: impl Into<String>) -> Self {
        self.indent_unit = unit.into();
        self
    }

    pub fn with_line_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.line_terminator = terminator.into();
        self
    }

    pub fn with_reserved_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_words.extend(words.into_iter().map(Into::into));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn indent_unit(&self) -> &str {
        &self.indent_unit
    }

    pub fn line_terminator(&self) -> &str {
        &self.line_terminator
    }

    pub fn reserved_words(&self) -> &HashSet<String> {
        &self.reserved_words
    }

    pub fn is_reserved(&self, word: &str) -> bool {
        self.reserved_words.contains(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_language() {
        let lang = LanguageDefinition::default();
        assert_eq!(lang.name(), "generic");
        assert_eq!(lang.indent_unit(), "\t");
        assert_eq!(lang.line_terminator(), "\n");
        assert!(lang.reserved_words().is_empty());
    }

    #[test]
    fn test_builder_methods() {
        let lang = LanguageDefinition::new("nwscript")
            .with_indent("    ")
            .with_line_terminator("\r\n")
            .with_reserved_words(["int", "void"]);
        assert_eq!(lang.name(), "nwscript");
        assert_eq!(lang.indent_unit(), "    ");
        assert_eq!(lang.line_terminator(), "\r\n");
        assert!(lang.is_reserved("int"));
        assert!(!lang.is_reserved("door"));
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[language]
name = "nwscript"
indent = "  "
reserved_words = ["int", "object", "void"]
"#;
        let lang = LanguageDefinition::from_str(toml_str).expect("Should parse");
        assert_eq!(lang.name(), "nwscript");
        assert_eq!(lang.indent_unit(), "  ");
        assert_eq!(lang.line_terminator(), "\n");
        assert_eq!(lang.reserved_words().len(), 3);
    }

    #[test]
    fn test_invalid_toml_error() {
        assert!(LanguageDefinition::from_str("[language\nname = ").is_err());
        assert!(LanguageDefinition::from_str("name = \"no table\"").is_err());
    }
}
