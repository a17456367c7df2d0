//! Whole-string regular expressions used by series filters and legal ranges

use regex::Regex;

/// A regex that must match the entire candidate string
///
/// The source text is kept so fragments stay comparable and printable. A
/// pattern that fails to compile is kept too: it never matches, and callers
/// report [`Pattern::error`] through the diagnostic channel.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    compiled: Result<Regex, regex::Error>,
}

impl Pattern {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let compiled = Regex::new(&format!("^(?:{})$", source));
        Self { source, compiled }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_valid(&self) -> bool {
        self.compiled.is_ok()
    }

    /// Compilation error, if the source is not a valid regex
    pub fn error(&self) -> Option<String> {
        self.compiled.as_ref().err().map(|e| e.to_string())
    }

    /// True when the whole of `text` matches; always false for invalid patterns
    pub fn matches(&self, text: &str) -> bool {
        match &self.compiled {
            Ok(re) => re.is_match(text),
            Err(_) => false,
        }
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}
