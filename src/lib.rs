//! Story Codegen - template-driven code generation from story models
//!
//! This library turns an abstract story graph into scripting code by walking
//! a tree of format directives (a [`Fragment`] tree) alongside the model.
//! Formats and maps are written in a small dictionary language, loaded once
//! into frozen registries, and then resolved against any number of models.
//!
//! # Example
//!
//! ```rust
//! use story_codegen::{generate, LanguageDefinition, StoryGraph};
//!
//! let dictionary = r##"
//!     format main {
//!         series includes { line { "#include \"" data value "\"" } }
//!     }
//! "##;
//! let model = StoryGraph::from_str(r#"
//!     [[entity]]
//!     id = "module"
//!     text_series.includes = ["stdio.h", "ai.h"]
//! "#).unwrap();
//!
//! let code = generate(dictionary, &model, model.root(), "main", LanguageDefinition::default()).unwrap();
//! assert_eq!(code, "#include \"stdio.h\"\n#include \"ai.h\"\n");
//! ```

pub mod context;
pub mod dictionary;
pub mod error;
pub mod format;
pub mod fragment;
pub mod generator;
pub mod language;
pub mod model;
pub mod namify;
pub mod parser;

pub use context::{Context, ContextFactory};
pub use dictionary::Dictionary;
pub use error::ParseError;
pub use format::{FormatRegistry, LintWarning, MapRegistry, RegistryError};
pub use fragment::{Fragment, ResolveError};
pub use generator::{GenerateError, Generator, Session};
pub use language::{LanguageDefinition, LanguageError};
pub use model::{EntityId, Focus, GraphError, StoryGraph, StoryModel};
pub use parser::parse;

use thiserror::Error;

/// Errors that can occur while loading a dictionary
#[derive(Debug, Error)]
pub enum LoadError {
    /// Error reading the dictionary file
    #[error("failed to read dictionary: {0}")]
    Io(#[from] std::io::Error),

    /// Error during parsing
    #[error("parse errors: {}", format_parse_errors(.0))]
    Parse(Vec<ParseError>),

    /// Duplicate or cyclic definitions
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
}

impl From<Vec<ParseError>> for LoadError {
    fn from(errors: Vec<ParseError>) -> Self {
        LoadError::Parse(errors)
    }
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors of the one-shot [`generate`] pipeline
#[derive(Debug, Error)]
pub enum CodegenError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Generate(#[from] GenerateError),
}

/// Load a dictionary and generate one format in a single call
///
/// Long-lived callers should build a [`Generator`] once instead, so the
/// dictionary is parsed only once.
pub fn generate(
    dictionary: &str,
    model: &dyn StoryModel,
    root: impl Into<Focus>,
    format: &str,
    language: LanguageDefinition,
) -> Result<String, CodegenError> {
    let dictionary = Dictionary::parse(dictionary)?;
    let generator = Generator::new(dictionary, language);
    Ok(generator.generate(model, root, format)?)
}
