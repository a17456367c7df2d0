//! Resolution contexts
//!
//! A [`Context`] is the current focus of generation plus the named bindings
//! inherited from enclosing scopes. Contexts are immutable: narrowing the
//! focus always produces a new value through [`ContextFactory`], so sibling
//! branches of a scope or series can never observe each other's focus.
//! Bindings are a persistent linked list shared between parent and child, so
//! creating a child context is cheap.

mod factory;

pub use factory::ContextFactory;

use std::fmt;
use std::rc::Rc;

use crate::fragment::{DataKey, PredicateKind, ScopeKind, SeriesKind};
use crate::model::{Focus, StoryModel};

/// Position of a context's focus within the series that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesPosition {
    pub index: usize,
    pub len: usize,
}

impl SeriesPosition {
    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.len
    }
}

#[derive(Debug)]
struct BindingFrame {
    name: String,
    value: Focus,
    next: Option<Rc<BindingFrame>>,
}

/// Persistent name -> focus environment; inner bindings shadow outer ones
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    head: Option<Rc<BindingFrame>>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// New environment with `name` bound to `value`; `self` is unchanged
    pub fn with(&self, name: impl Into<String>, value: Focus) -> Self {
        Self {
            head: Some(Rc::new(BindingFrame {
                name: name.into(),
                value,
                next: self.head.clone(),
            })),
        }
    }

    /// Innermost binding for `name`, compared case-insensitively
    pub fn get(&self, name: &str) -> Option<&Focus> {
        let mut frame = self.head.as_deref();
        while let Some(f) = frame {
            if f.name.eq_ignore_ascii_case(name) {
                return Some(&f.value);
            }
            frame = f.next.as_deref();
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Bound names, innermost first (shadowed names repeat)
    pub fn names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        let mut frame = self.head.as_deref();
        while let Some(f) = frame {
            names.push(f.name.as_str());
            frame = f.next.as_deref();
        }
        names
    }
}

/// Current focus of generation
#[derive(Clone)]
pub struct Context<'m> {
    model: &'m dyn StoryModel,
    focus: Focus,
    bindings: Bindings,
    position: Option<SeriesPosition>,
    depth: usize,
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("focus", &self.focus)
            .field("bindings", &self.bindings.names())
            .field("position", &self.position)
            .field("depth", &self.depth)
            .finish()
    }
}

impl<'m> Context<'m> {
    pub fn model(&self) -> &'m dyn StoryModel {
        self.model
    }

    pub fn focus(&self) -> &Focus {
        &self.focus
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn position(&self) -> Option<SeriesPosition> {
        self.position
    }

    /// Number of narrowing steps between this context and the root
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn binding(&self, name: &str) -> Option<&Focus> {
        self.bindings.get(name)
    }

    pub fn display_name(&self) -> Option<String> {
        match &self.focus {
            Focus::Entity(id) => self.model.display_name(*id),
            Focus::Text(text) => Some(text.clone()),
        }
    }

    pub fn kind(&self) -> Option<String> {
        match &self.focus {
            Focus::Entity(id) => self.model.kind(*id),
            Focus::Text(_) => Some("text".to_string()),
        }
    }

    pub fn slots(&self) -> Vec<String> {
        match &self.focus {
            Focus::Entity(id) => self.model.slots(*id),
            Focus::Text(_) => Vec::new(),
        }
    }

    /// Entity a scope directive narrows to, if any
    pub fn scope(&self, kind: ScopeKind, name_ref: Option<&str>) -> Option<Focus> {
        if kind == ScopeKind::Bound {
            return name_ref.and_then(|name| self.binding(name)).cloned();
        }
        match &self.focus {
            Focus::Entity(id) => self.model.scope(*id, kind, name_ref),
            Focus::Text(_) => None,
        }
    }

    /// Candidates a series directive iterates, in model order
    pub fn series(&self, kind: SeriesKind) -> Vec<Focus> {
        match &self.focus {
            Focus::Entity(id) => self.model.series(*id, kind),
            Focus::Text(_) => Vec::new(),
        }
    }

    pub fn predicate(&self, kind: PredicateKind) -> bool {
        match kind {
            PredicateKind::IsFirst => self.position.map(|p| p.is_first()).unwrap_or(false),
            PredicateKind::IsLast => self.position.map(|p| p.is_last()).unwrap_or(false),
            PredicateKind::HasMultipleChildren => self.series(SeriesKind::Children).len() > 1,
            PredicateKind::IsLastTask => match &self.focus {
                Focus::Entity(id) => self.model.predicate(*id, kind),
                Focus::Text(_) => false,
            },
        }
    }

    /// Plain value lookup; identifier keys return the raw display name
    pub fn data(&self, key: &DataKey) -> Option<String> {
        match key {
            DataKey::Name | DataKey::Unique32CharName | DataKey::DisplayName => self.display_name(),
            DataKey::Kind => self.kind(),
            DataKey::UniqueId => self.focus.entity().map(|id| id.to_string()),
            DataKey::Attribute(name) => match &self.focus {
                Focus::Entity(id) => self.model.attribute(*id, name),
                Focus::Text(text) => {
                    let name = name.to_ascii_lowercase();
                    matches!(name.as_str(), "text" | "value" | "include").then(|| text.clone())
                }
            },
        }
    }
}
