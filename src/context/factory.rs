//! Construction of child contexts

use super::{Bindings, Context, SeriesPosition};
use crate::model::{Focus, StoryModel};

/// Builds contexts from a parent plus a newly focused entity
///
/// Every constructor is pure: the parent is borrowed immutably and its
/// bindings are shared, never copied or dropped.
pub struct ContextFactory;

impl ContextFactory {
    /// Root context for a generation run
    pub fn root<'m>(model: &'m dyn StoryModel, focus: Focus) -> Context<'m> {
        Context {
            model,
            focus,
            bindings: Bindings::new(),
            position: None,
            depth: 0,
        }
    }

    /// Narrow the parent to `focus`, inheriting its bindings
    pub fn create<'m>(parent: &Context<'m>, focus: Focus) -> Context<'m> {
        Context {
            model: parent.model,
            focus,
            bindings: parent.bindings.clone(),
            position: None,
            depth: parent.depth + 1,
        }
    }

    /// Narrow the parent to `focus` and bind `name` to it for the subtree
    pub fn create_bound<'m>(parent: &Context<'m>, focus: Focus, name: &str) -> Context<'m> {
        let bindings = parent.bindings.with(name, focus.clone());
        Context {
            bindings,
            ..Self::create(parent, focus)
        }
    }

    /// Context for one item of a series
    pub fn create_in_series<'m>(
        parent: &Context<'m>,
        focus: Focus,
        position: SeriesPosition,
        bind_as: Option<&str>,
    ) -> Context<'m> {
        let ctx = match bind_as {
            Some(name) => Self::create_bound(parent, focus, name),
            None => Self::create(parent, focus),
        };
        Context {
            position: Some(position),
            ..ctx
        }
    }
}
