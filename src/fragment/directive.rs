//! Directive keywords understood by scope, series, conditional and data fragments
//!
//! Keywords are matched case-insensitively and ignore `_` and `-`, so
//! `codeBlocks`, `code_blocks` and `CODE-BLOCKS` all name the same series.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A directive keyword that is not part of the fixed vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {category} '{keyword}'")]
pub struct UnknownDirective {
    pub category: &'static str,
    pub keyword: String,
}

fn normalize(keyword: &str) -> String {
    keyword
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

macro_rules! keyword_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $category:literal {
            $($variant:ident => $canonical:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every keyword of this vocabulary, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Canonical snake_case spelling
            pub fn key(&self) -> &'static str {
                match self {
                    $($name::$variant => $canonical),+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownDirective;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = normalize(s.trim());
                $name::ALL
                    .iter()
                    .copied()
                    .find(|k| normalize(k.key()) == wanted)
                    .ok_or_else(|| UnknownDirective {
                        category: $category,
                        keyword: s.to_string(),
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.key())
            }
        }
    };
}

keyword_enum! {
    /// Single-entity narrowing performed by a scope fragment
    ScopeKind, "scope" {
        Subject => "subject",
        Owner => "owner",
        Parameter => "parameter",
        SlotParameter => "slot_parameter",
        MainCodeBlock => "main_code_block",
        ScriptIt => "script_it",
        AskIt => "ask_it",
        IfChild => "if_child",
        ElseChild => "else_child",
        Binding => "binding",
        Start => "start",
        ActiveChild => "active_child",
        InactiveChild => "inactive_child",
        AlwaysChild => "always_child",
        Cause => "cause",
        Resource => "resource",
        Condition => "condition",
        Bound => "bound",
    }
}

impl ScopeKind {
    /// Kinds that need a name reference to pick their target
    pub fn takes_name(&self) -> bool {
        matches!(
            self,
            ScopeKind::Parameter | ScopeKind::SlotParameter | ScopeKind::ScriptIt | ScopeKind::Bound
        )
    }

    /// Series searched by display name when a named scope has no direct entry
    pub fn named_source(&self) -> Option<SeriesKind> {
        match self {
            ScopeKind::Parameter => Some(SeriesKind::Parameters),
            ScopeKind::SlotParameter => Some(SeriesKind::SlotParameters),
            ScopeKind::ScriptIt => Some(SeriesKind::ScriptIts),
            _ => None,
        }
    }
}

keyword_enum! {
    /// Ordered collection iterated by a series fragment
    SeriesKind, "series" {
        Includes => "includes",
        CodeBlocks => "code_blocks",
        Causes => "causes",
        Effects => "effects",
        Arguments => "arguments",
        Parameters => "parameters",
        ParametersWithSlot => "parameters_with_slot",
        SlotParameters => "slot_parameters",
        Variables => "variables",
        Implicits => "implicits",
        Children => "children",
        ScriptIts => "script_its",
        StoryPoints => "story_points",
        OrderedStoryPoints => "ordered_story_points",
        ParentNodes => "parent_nodes",
        ChildrenNodes => "children_nodes",
        IdenticalCauses => "identical_causes",
    }
}

keyword_enum! {
    /// Boolean test evaluated by a conditional fragment
    PredicateKind, "predicate" {
        IsLastTask => "is_last_task",
        HasMultipleChildren => "has_multiple_children",
        IsFirst => "is_first",
        IsLast => "is_last",
    }
}

/// Value requested by a simple data fragment
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataKey {
    /// Unique, code-legal identifier for the focus
    Name,
    /// Unique identifier limited to 32 characters
    Unique32CharName,
    /// Model identity of the focused entity
    UniqueId,
    DisplayName,
    Kind,
    /// Any other attribute, answered by the model
    Attribute(String),
}

impl DataKey {
    pub fn parse(directive: &str) -> Self {
        match normalize(directive.trim()).as_str() {
            "name" => DataKey::Name,
            "unique32charname" => DataKey::Unique32CharName,
            "uniqueid" => DataKey::UniqueId,
            "displayname" => DataKey::DisplayName,
            "kind" => DataKey::Kind,
            _ => DataKey::Attribute(directive.trim().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_kind_spellings() {
        assert_eq!("subject".parse::<ScopeKind>(), Ok(ScopeKind::Subject));
        assert_eq!("MAINCODEBLOCK".parse::<ScopeKind>(), Ok(ScopeKind::MainCodeBlock));
        assert_eq!("main_code_block".parse::<ScopeKind>(), Ok(ScopeKind::MainCodeBlock));
        assert_eq!("ifChild".parse::<ScopeKind>(), Ok(ScopeKind::IfChild));
    }

    #[test]
    fn test_unknown_series_kind() {
        let err = "siblings".parse::<SeriesKind>().unwrap_err();
        assert_eq!(err.category, "series");
        assert_eq!(err.keyword, "siblings");
        assert_eq!(err.to_string(), "unknown series 'siblings'");
    }

    #[test]
    fn test_series_kind_round_trips_through_key() {
        for kind in SeriesKind::ALL {
            assert_eq!(kind.key().parse::<SeriesKind>(), Ok(*kind));
        }
    }

    #[test]
    fn test_predicate_kind_spellings() {
        assert_eq!("isLastTask".parse::<PredicateKind>(), Ok(PredicateKind::IsLastTask));
        assert_eq!(
            "has-multiple-children".parse::<PredicateKind>(),
            Ok(PredicateKind::HasMultipleChildren)
        );
        assert!("is_tuesday".parse::<PredicateKind>().is_err());
    }

    #[test]
    fn test_data_key_parse() {
        assert_eq!(DataKey::parse("Name"), DataKey::Name);
        assert_eq!(DataKey::parse("unique32CharName"), DataKey::Unique32CharName);
        assert_eq!(DataKey::parse("unique_id"), DataKey::UniqueId);
        assert_eq!(DataKey::parse("text"), DataKey::Attribute("text".to_string()));
    }

    #[test]
    fn test_named_scope_sources() {
        assert!(ScopeKind::Parameter.takes_name());
        assert!(!ScopeKind::Subject.takes_name());
        assert_eq!(ScopeKind::ScriptIt.named_source(), Some(SeriesKind::ScriptIts));
        assert_eq!(ScopeKind::Bound.named_source(), None);
    }
}
