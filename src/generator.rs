//! Generation driver
//!
//! A [`Generator`] owns the frozen registries and the language definition
//! behind `Arc`s, so one instance can serve any number of runs, including
//! concurrent ones. Each run gets its own [`Session`] (indent stack and
//! identifier table) and its own root [`Context`](crate::context::Context).

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error};

use crate::context::ContextFactory;
use crate::format::{FormatRegistry, MapRegistry, RegistryError};
use crate::fragment::{resolve_all, Fragment, IndentTracker, ResolveError};
use crate::language::LanguageDefinition;
use crate::model::{Focus, StoryModel};
use crate::namify::Namifier;
use crate::Dictionary;

/// Errors that end a generation run
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The requested entry format does not exist
    #[error("unknown entry point: {0}")]
    UnknownFormat(#[from] RegistryError),

    /// A structural fault inside the templates
    #[error("generation of '{entry}' aborted: {source}")]
    Aborted {
        entry: String,
        #[source]
        source: ResolveError,
    },
}

/// Mutable state of one generation run
///
/// Registries and language are borrowed read-only; the indent stack and the
/// identifier table belong to this run alone.
#[derive(Debug)]
pub struct Session<'r> {
    pub(crate) formats: &'r FormatRegistry,
    pub(crate) maps: &'r MapRegistry,
    pub(crate) language: &'r LanguageDefinition,
    pub(crate) indent: IndentTracker,
    pub(crate) names: Namifier,
}

impl<'r> Session<'r> {
    pub fn new(
        formats: &'r FormatRegistry,
        maps: &'r MapRegistry,
        language: &'r LanguageDefinition,
    ) -> Self {
        Self {
            formats,
            maps,
            language,
            indent: IndentTracker::new(),
            names: Namifier::new(),
        }
    }

    pub fn indent(&self) -> &IndentTracker {
        &self.indent
    }

    pub fn language(&self) -> &LanguageDefinition {
        self.language
    }
}

#[derive(Debug, Clone)]
pub struct Generator {
    formats: Arc<FormatRegistry>,
    maps: Arc<MapRegistry>,
    language: Arc<LanguageDefinition>,
}

impl Generator {
    pub fn new(dictionary: Dictionary, language: LanguageDefinition) -> Self {
        let (formats, maps) = dictionary.into_parts();
        Self {
            formats: Arc::new(formats),
            maps: Arc::new(maps),
            language: Arc::new(language),
        }
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    pub fn maps(&self) -> &MapRegistry {
        &self.maps
    }

    pub fn language(&self) -> &LanguageDefinition {
        &self.language
    }

    /// Generate the text of format `format_name` for `root`
    pub fn generate(
        &self,
        model: &dyn StoryModel,
        root: impl Into<Focus>,
        format_name: &str,
    ) -> Result<String, GenerateError> {
        let format = self.formats.require(format_name)?;
        self.run(model, root.into(), &format.name, &format.fragments)
    }

    /// Generate the text of an ad-hoc fragment list for `root`
    pub fn generate_fragments(
        &self,
        model: &dyn StoryModel,
        root: impl Into<Focus>,
        fragments: &[Fragment],
    ) -> Result<String, GenerateError> {
        self.run(model, root.into(), "<fragments>", fragments)
    }

    fn run(
        &self,
        model: &dyn StoryModel,
        root: Focus,
        entry: &str,
        fragments: &[Fragment],
    ) -> Result<String, GenerateError> {
        debug!(entry, language = self.language.name(), root = ?root, "starting generation");

        let mut session = Session::new(&self.formats, &self.maps, &self.language);
        let ctx = ContextFactory::root(model, root);
        let text = resolve_all(fragments, &ctx, &mut session).map_err(|source| {
            error!(entry, "generation aborted: {}", source);
            GenerateError::Aborted {
                entry: entry.to_string(),
                source,
            }
        })?;

        debug!(entry, bytes = text.len(), names = session.names.len(), "generation finished");
        Ok(text)
    }
}
