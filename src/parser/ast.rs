//! Syntax tree of a format-dictionary file
//!
//! Format bodies parse straight into [`Fragment`] trees; the file level keeps
//! spans so load errors can point back into the source.

use crate::fragment::FormatDefinition;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// A node with its source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// A parsed dictionary file
#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryFile {
    pub items: Vec<Spanned<Item>>,
}

impl DictionaryFile {
    pub fn formats(&self) -> impl Iterator<Item = &FormatDefinition> {
        self.items.iter().filter_map(|item| match &item.node {
            Item::Format(format) => Some(format),
            Item::Map(_) => None,
        })
    }

    pub fn maps(&self) -> impl Iterator<Item = &MapDecl> {
        self.items.iter().filter_map(|item| match &item.node {
            Item::Map(map) => Some(map),
            Item::Format(_) => None,
        })
    }
}

/// Top-level declaration
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// `format NAME { fragments }`
    Format(FormatDefinition),
    /// `map NAME default "x" { "k" => "v", ... }`
    Map(MapDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapDecl {
    pub name: String,
    pub default: Option<String>,
    /// Entries in source order; keys are unique
    pub entries: Vec<(String, String)>,
}
