//! Format directive tree
//!
//! A [`Fragment`] is one node of a format: a leaf that emits text from the
//! current [`Context`], or a container that resolves its children, possibly
//! against a narrower context. Fragments are immutable after loading and are
//! shared by every generation run; all run state lives in the [`Context`]
//! chain and the per-run [`Session`].
//!
//! Resolution never fails on missing data. A lookup that cannot be answered
//! renders an inline marker (see [`unresolved`]) and logs a warning, so the
//! rest of the document is still generated. Only structural faults such as an
//! indent imbalance surface as [`ResolveError`].

mod directive;
mod indent;
mod pattern;
mod series;

pub use directive::{DataKey, PredicateKind, ScopeKind, SeriesKind, UnknownDirective};
pub use indent::{IndentTracker, IndentUnderflow};
pub use pattern::Pattern;
pub use series::{uniquify, FilterBy, SeriesFilter};

use thiserror::Error;
use tracing::{debug, warn};

use crate::context::{Context, ContextFactory, SeriesPosition};
use crate::generator::Session;

/// Structural failure that aborts a generation run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Indent(#[from] IndentUnderflow),
}

/// Inline marker emitted in place of a value that could not be resolved
pub fn unresolved(kind: &str, directive: &str) -> String {
    format!("<? unresolved {}: {} ?>", kind, directive)
}

/// One node of a format
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Fixed text, emitted verbatim
    Literal(String),
    /// A single value looked up on the current context
    SimpleData(DataFragment),
    /// Call of another format against the current context
    Reference(ReferenceFragment),
    /// Value translated through a named map
    MapLookup(MapLookupFragment),
    /// Children on one line: indent prefix, children, line terminator
    Line(Vec<Fragment>),
    /// Children resolved one indent unit deeper
    IndentBlock(Vec<Fragment>),
    Scope(ScopeFragment),
    Series(SeriesFragment),
    Conditional(ConditionalFragment),
    /// Registry entry; reached only through a reference
    FormatDefinition(FormatDefinition),
}

/// `data` directive
#[derive(Debug, Clone, PartialEq)]
pub struct DataFragment {
    pub directive: String,
    /// Legal identifier pattern, used by the `name` keys
    pub legal: Option<Pattern>,
    /// Text emitted instead of the marker when the lookup fails
    pub default: Option<String>,
}

impl DataFragment {
    pub fn new(directive: impl Into<String>) -> Self {
        Self {
            directive: directive.into(),
            legal: None,
            default: None,
        }
    }

    pub fn with_legal(mut self, pattern: impl Into<String>) -> Self {
        self.legal = Some(Pattern::new(pattern));
        self
    }

    pub fn with_default(mut self, text: impl Into<String>) -> Self {
        self.default = Some(text.into());
        self
    }

    fn resolve(&self, ctx: &Context<'_>, session: &mut Session<'_>) -> String {
        let key = DataKey::parse(&self.directive);
        let value = match key {
            DataKey::Name | DataKey::Unique32CharName => {
                let max_len = (key == DataKey::Unique32CharName).then_some(32);
                ctx.display_name().and_then(|display| {
                    session.names.unique_name(
                        ctx.focus(),
                        &display,
                        self.legal.as_ref(),
                        max_len,
                        session.language.reserved_words(),
                    )
                })
            }
            _ => ctx.data(&key),
        };

        match (value, &self.default) {
            (Some(value), _) => value,
            (None, Some(default)) => default.clone(),
            (None, None) => {
                warn!(directive = %self.directive, focus = ?ctx.focus(), "unresolved data lookup");
                unresolved("data", &self.directive)
            }
        }
    }
}

/// `ref` directive
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceFragment {
    pub name: String,
    /// Entity kind the focus must have for the reference to apply
    pub when: Option<String>,
}

impl ReferenceFragment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            when: None,
        }
    }

    pub fn when(mut self, kind: impl Into<String>) -> Self {
        self.when = Some(kind.into());
        self
    }

    fn resolve(&self, ctx: &Context<'_>, session: &mut Session<'_>) -> Result<String, ResolveError> {
        let formats = session.formats;
        let Some(format) = formats.get(&self.name) else {
            warn!(format = %self.name, "reference to unknown format");
            return Ok(unresolved("format", &self.name));
        };

        if let Some(kind) = &self.when {
            let applies = ctx
                .kind()
                .map(|k| k.eq_ignore_ascii_case(kind))
                .unwrap_or(false);
            if !applies {
                return Ok(String::new());
            }
        }

        debug!(format = %format.name, depth = ctx.depth(), "resolving reference");
        resolve_all(&format.fragments, ctx, session)
    }
}

/// `lookup` directive: translate a context value through a named map
#[derive(Debug, Clone, PartialEq)]
pub struct MapLookupFragment {
    pub map: String,
    /// Data directive producing the lookup key
    pub key: String,
}

impl MapLookupFragment {
    pub fn new(map: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            map: map.into(),
            key: key.into(),
        }
    }

    fn resolve(&self, ctx: &Context<'_>, session: &Session<'_>) -> String {
        let Some(map) = session.maps.get(&self.map) else {
            warn!(map = %self.map, "lookup in unknown map");
            return unresolved("map", &self.map);
        };
        let Some(key) = ctx.data(&DataKey::parse(&self.key)) else {
            warn!(map = %self.map, key = %self.key, "lookup key did not resolve");
            return unresolved("data", &self.key);
        };
        map.lookup(&key).to_string()
    }
}

/// `scope` directive
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeFragment {
    pub directive: String,
    /// Name qualifying kinds such as `parameter` or `bound`
    pub name_ref: Option<String>,
    pub bind_as: Option<String>,
    pub fragments: Vec<Fragment>,
}

impl ScopeFragment {
    pub fn new(directive: impl Into<String>, fragments: Vec<Fragment>) -> Self {
        Self {
            directive: directive.into(),
            name_ref: None,
            bind_as: None,
            fragments,
        }
    }

    pub fn with_name_ref(mut self, name: impl Into<String>) -> Self {
        self.name_ref = Some(name.into());
        self
    }

    pub fn bind_as(mut self, name: impl Into<String>) -> Self {
        self.bind_as = Some(name.into());
        self
    }

    fn describe(&self) -> String {
        match &self.name_ref {
            Some(name) => format!("{} \"{}\"", self.directive, name),
            None => self.directive.clone(),
        }
    }

    fn resolve(&self, ctx: &Context<'_>, session: &mut Session<'_>) -> Result<String, ResolveError> {
        let kind = match self.directive.parse::<ScopeKind>() {
            Ok(kind) => kind,
            Err(err) => {
                warn!("{}", err);
                return Ok(unresolved("scope", &self.directive));
            }
        };

        let Some(focus) = ctx.scope(kind, self.name_ref.as_deref()) else {
            warn!(scope = %self.describe(), focus = ?ctx.focus(), "scope did not resolve");
            return Ok(unresolved("scope", &self.describe()));
        };

        let child = match &self.bind_as {
            Some(name) => ContextFactory::create_bound(ctx, focus, name),
            None => ContextFactory::create(ctx, focus),
        };
        resolve_all(&self.fragments, &child, session)
    }
}

/// `series` directive
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesFragment {
    pub directive: String,
    pub separator: String,
    pub unique: bool,
    pub filter: SeriesFilter,
    pub bind_as: Option<String>,
    pub fragments: Vec<Fragment>,
}

impl SeriesFragment {
    pub fn new(
        directive: impl Into<String>,
        separator: impl Into<String>,
        fragments: Vec<Fragment>,
    ) -> Self {
        Self {
            directive: directive.into(),
            separator: separator.into(),
            unique: false,
            filter: SeriesFilter::none(),
            bind_as: None,
            fragments,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_filter(mut self, filter: SeriesFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn bind_as(mut self, name: impl Into<String>) -> Self {
        self.bind_as = Some(name.into());
        self
    }

    fn resolve(&self, ctx: &Context<'_>, session: &mut Session<'_>) -> Result<String, ResolveError> {
        let kind = match self.directive.parse::<SeriesKind>() {
            Ok(kind) => kind,
            Err(err) => {
                warn!("{}", err);
                return Ok(String::new());
            }
        };

        let mut candidates = ctx.series(kind);
        if self.unique {
            candidates = uniquify(candidates);
        }
        let candidates = self.filter.apply(candidates, ctx.model());

        let len = candidates.len();
        let mut items = Vec::with_capacity(len);
        for (index, focus) in candidates.into_iter().enumerate() {
            let child = ContextFactory::create_in_series(
                ctx,
                focus,
                SeriesPosition { index, len },
                self.bind_as.as_deref(),
            );
            items.push(resolve_all(&self.fragments, &child, session)?);
        }
        Ok(items.join(&self.separator))
    }
}

/// `if` directive; a leading `!` negates the predicate
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalFragment {
    pub directive: String,
    pub fragments: Vec<Fragment>,
}

impl ConditionalFragment {
    pub fn new(directive: impl Into<String>, fragments: Vec<Fragment>) -> Self {
        Self {
            directive: directive.into(),
            fragments,
        }
    }

    /// Predicate name and whether it is negated
    pub fn predicate(&self) -> (&str, bool) {
        let directive = self.directive.trim();
        match directive.strip_prefix('!') {
            Some(rest) => (rest.trim_start(), true),
            None => (directive, false),
        }
    }

    fn resolve(&self, ctx: &Context<'_>, session: &mut Session<'_>) -> Result<String, ResolveError> {
        let (name, negated) = self.predicate();
        let kind = match name.parse::<PredicateKind>() {
            Ok(kind) => kind,
            Err(err) => {
                warn!("{}", err);
                return Ok(String::new());
            }
        };

        if ctx.predicate(kind) == negated {
            return Ok(String::new());
        }
        let prefix = session.indent.current().to_string();
        Ok(prefix + &resolve_all(&self.fragments, ctx, session)?)
    }
}

/// A named format, the unit stored in the format registry
#[derive(Debug, Clone, PartialEq)]
pub struct FormatDefinition {
    pub name: String,
    pub fragments: Vec<Fragment>,
}

impl FormatDefinition {
    pub fn new(name: impl Into<String>, fragments: Vec<Fragment>) -> Self {
        Self {
            name: name.into(),
            fragments,
        }
    }
}

impl Fragment {
    pub fn literal(text: impl Into<String>) -> Self {
        Fragment::Literal(text.into())
    }

    pub fn data(directive: impl Into<String>) -> Self {
        Fragment::SimpleData(DataFragment::new(directive))
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Fragment::Reference(ReferenceFragment::new(name))
    }

    pub fn lookup(map: impl Into<String>, key: impl Into<String>) -> Self {
        Fragment::MapLookup(MapLookupFragment::new(map, key))
    }

    pub fn line(children: Vec<Fragment>) -> Self {
        Fragment::Line(children)
    }

    pub fn indent(children: Vec<Fragment>) -> Self {
        Fragment::IndentBlock(children)
    }

    pub fn scope(directive: impl Into<String>, children: Vec<Fragment>) -> Self {
        Fragment::Scope(ScopeFragment::new(directive, children))
    }

    pub fn series(
        directive: impl Into<String>,
        separator: impl Into<String>,
        children: Vec<Fragment>,
    ) -> Self {
        Fragment::Series(SeriesFragment::new(directive, separator, children))
    }

    pub fn conditional(directive: impl Into<String>, children: Vec<Fragment>) -> Self {
        Fragment::Conditional(ConditionalFragment::new(directive, children))
    }

    /// Direct children of a container; empty for leaves
    pub fn children(&self) -> &[Fragment] {
        match self {
            Fragment::Line(children) | Fragment::IndentBlock(children) => children,
            Fragment::Scope(s) => &s.fragments,
            Fragment::Series(s) => &s.fragments,
            Fragment::Conditional(c) => &c.fragments,
            Fragment::FormatDefinition(f) => &f.fragments,
            Fragment::Literal(_)
            | Fragment::SimpleData(_)
            | Fragment::Reference(_)
            | Fragment::MapLookup(_) => &[],
        }
    }

    /// Visit this fragment and every descendant, parents first
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Fragment)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// Resolve this fragment against `ctx`
    pub fn resolve(&self, ctx: &Context<'_>, session: &mut Session<'_>) -> Result<String, ResolveError> {
        match self {
            Fragment::Literal(text) => Ok(text.clone()),
            Fragment::SimpleData(data) => Ok(data.resolve(ctx, session)),
            Fragment::Reference(reference) => reference.resolve(ctx, session),
            Fragment::MapLookup(lookup) => Ok(lookup.resolve(ctx, session)),
            Fragment::Line(children) => {
                let prefix = session.indent.current().to_string();
                let body = resolve_all(children, ctx, session)?;
                Ok(format!(
                    "{}{}{}",
                    prefix,
                    body,
                    session.language.line_terminator()
                ))
            }
            Fragment::IndentBlock(children) => {
                session.indent.push(session.language.indent_unit());
                let body = resolve_all(children, ctx, session)?;
                session.indent.pop()?;
                Ok(body)
            }
            Fragment::Scope(scope) => scope.resolve(ctx, session),
            Fragment::Series(series) => series.resolve(ctx, session),
            Fragment::Conditional(conditional) => conditional.resolve(ctx, session),
            Fragment::FormatDefinition(format) => {
                debug!(format = %format.name, "format definitions only resolve through references");
                Ok(String::new())
            }
        }
    }
}

impl From<DataFragment> for Fragment {
    fn from(f: DataFragment) -> Self {
        Fragment::SimpleData(f)
    }
}

impl From<ReferenceFragment> for Fragment {
    fn from(f: ReferenceFragment) -> Self {
        Fragment::Reference(f)
    }
}

impl From<ScopeFragment> for Fragment {
    fn from(f: ScopeFragment) -> Self {
        Fragment::Scope(f)
    }
}

impl From<SeriesFragment> for Fragment {
    fn from(f: SeriesFragment) -> Self {
        Fragment::Series(f)
    }
}

/// Resolve `fragments` in order and concatenate the results
pub fn resolve_all(
    fragments: &[Fragment],
    ctx: &Context<'_>,
    session: &mut Session<'_>,
) -> Result<String, ResolveError> {
    let mut out = String::new();
    for fragment in fragments {
        out.push_str(&fragment.resolve(ctx, session)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{FormatRegistry, FormatRegistryBuilder, MapDefinition, MapRegistry, MapRegistryBuilder};
    use crate::language::LanguageDefinition;
    use crate::model::{Focus, StoryGraph};

    const GRAPH: &str = r#"
        root = "task"

        [[entity]]
        id = "task"
        kind = "task"
        name = "Open Gate"
        scopes.condition = "cond"
        series.children = ["a", "b", "a"]
        text_series.includes = ["stdio.h", "ai.h"]
        predicates.is_last_task = true

        [[entity]]
        id = "cond"
        kind = "condition"
        name = "cond"
        attributes.text = "x>0"

        [[entity]]
        id = "a"
        kind = "effect"
        name = "a"
        attributes.text = "a"

        [[entity]]
        id = "b"
        kind = "effect"
        name = "b"
        attributes.text = "b"
    "#;

    struct Fixture {
        graph: StoryGraph,
        formats: FormatRegistry,
        maps: MapRegistry,
        language: LanguageDefinition,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_formats(FormatRegistry::empty())
        }

        fn with_formats(formats: FormatRegistry) -> Self {
            let maps = MapRegistryBuilder::new()
                .insert(
                    MapDefinition::new("kinds")
                        .with_entry("task", "Task")
                        .with_default("Thing"),
                )
                .unwrap()
                .build();
            Self {
                graph: StoryGraph::from_str(GRAPH).unwrap(),
                formats,
                maps,
                language: LanguageDefinition::default(),
            }
        }

        fn resolve(&self, fragments: &[Fragment]) -> String {
            let mut session = Session::new(&self.formats, &self.maps, &self.language);
            let ctx = ContextFactory::root(&self.graph, Focus::Entity(self.graph.root()));
            let out = resolve_all(fragments, &ctx, &mut session).expect("Should resolve");
            assert_eq!(session.indent().depth(), 0);
            out
        }
    }

    #[test]
    fn test_literal_identity() {
        let fx = Fixture::new();
        assert_eq!(fx.resolve(&[Fragment::literal("int x;")]), "int x;");
    }

    #[test]
    fn test_line_and_nested_indent() {
        let fx = Fixture::new();
        let tree = vec![Fragment::indent(vec![Fragment::indent(vec![
            Fragment::line(vec![Fragment::literal("x")]),
        ])])];
        assert_eq!(fx.resolve(&tree), "\t\tx\n");
    }

    #[test]
    fn test_scope_narrows_without_mutating_parent() {
        let fx = Fixture::new();
        let tree = vec![
            Fragment::scope("condition", vec![Fragment::data("text")]),
            Fragment::literal("|"),
            Fragment::data("display_name"),
        ];
        assert_eq!(fx.resolve(&tree), "x>0|Open Gate");
    }

    #[test]
    fn test_unresolved_scope_renders_marker() {
        let fx = Fixture::new();
        let out = fx.resolve(&[Fragment::scope("subject", vec![Fragment::data("text")])]);
        assert_eq!(out, "<? unresolved scope: subject ?>");
    }

    #[test]
    fn test_series_join_and_empty() {
        let fx = Fixture::new();
        let joined = fx.resolve(&[Fragment::series("children", ", ", vec![Fragment::data("text")])]);
        assert_eq!(joined, "a, b, a");

        let empty = fx.resolve(&[Fragment::series("causes", ", ", vec![Fragment::data("text")])]);
        assert_eq!(empty, "");
    }

    #[test]
    fn test_series_unique_before_filter() {
        let fx = Fixture::new();
        let series = SeriesFragment::new("children", ",", vec![Fragment::data("text")])
            .unique()
            .with_filter(SeriesFilter::name("a"));
        assert_eq!(fx.resolve(&[series.into()]), "a");
    }

    #[test]
    fn test_unknown_series_is_empty() {
        let fx = Fixture::new();
        let out = fx.resolve(&[Fragment::series("siblings", ",", vec![Fragment::literal("x")])]);
        assert_eq!(out, "");
    }

    #[test]
    fn test_text_series() {
        let fx = Fixture::new();
        let tree = vec![Fragment::series(
            "includes",
            "",
            vec![Fragment::line(vec![
                Fragment::literal("#include \""),
                Fragment::data("value"),
                Fragment::literal("\""),
            ])],
        )];
        assert_eq!(fx.resolve(&tree), "#include \"stdio.h\"\n#include \"ai.h\"\n");
    }

    #[test]
    fn test_series_position_predicates() {
        let fx = Fixture::new();
        let tree = vec![Fragment::series(
            "children",
            "",
            vec![
                Fragment::data("text"),
                Fragment::conditional("!is_last", vec![Fragment::literal(";")]),
            ],
        )];
        assert_eq!(fx.resolve(&tree), "a;b;a");
    }

    #[test]
    fn test_conditional_negation() {
        let fx = Fixture::new();
        let tree = vec![Fragment::indent(vec![
            Fragment::conditional("is_last_task", vec![Fragment::literal("done")]),
            Fragment::conditional("!is_last_task", vec![Fragment::literal("more")]),
        ])];
        assert_eq!(fx.resolve(&tree), "\tdone");
    }

    #[test]
    fn test_unknown_predicate_is_empty() {
        let fx = Fixture::new();
        let out = fx.resolve(&[Fragment::conditional("is_tuesday", vec![Fragment::literal("x")])]);
        assert_eq!(out, "");
    }

    #[test]
    fn test_missing_data_is_non_fatal() {
        let fx = Fixture::new();
        let out = fx.resolve(&[Fragment::line(vec![Fragment::data("colour")])]);
        assert_eq!(out, "<? unresolved data: colour ?>\n");

        let defaulted = DataFragment::new("colour").with_default("none");
        assert_eq!(fx.resolve(&[defaulted.into()]), "none");
    }

    #[test]
    fn test_reference_indirection_and_guard() {
        let formats = FormatRegistryBuilder::new()
            .insert(FormatDefinition::new(
                "Label",
                vec![Fragment::data("display_name")],
            ))
            .unwrap()
            .build()
            .unwrap();
        let fx = Fixture::with_formats(formats);

        assert_eq!(fx.resolve(&[Fragment::reference("label")]), "Open Gate");
        assert_eq!(fx.resolve(&[ReferenceFragment::new("LABEL").when("TASK").into()]), "Open Gate");
        assert_eq!(fx.resolve(&[ReferenceFragment::new("label").when("effect").into()]), "");
        assert_eq!(
            fx.resolve(&[Fragment::reference("missing")]),
            "<? unresolved format: missing ?>"
        );
    }

    #[test]
    fn test_map_lookup_with_default() {
        let fx = Fixture::new();
        assert_eq!(fx.resolve(&[Fragment::lookup("kinds", "kind")]), "Task");

        let tree = vec![Fragment::scope("condition", vec![Fragment::lookup("kinds", "kind")])];
        assert_eq!(fx.resolve(&tree), "Thing");

        assert_eq!(
            fx.resolve(&[Fragment::lookup("colours", "kind")]),
            "<? unresolved map: colours ?>"
        );
    }

    #[test]
    fn test_unique_names_are_stable_per_focus() {
        let fx = Fixture::new();
        let tree = vec![
            Fragment::data("name"),
            Fragment::literal(" "),
            Fragment::data("name"),
            Fragment::literal(" "),
            Fragment::series("children", " ", vec![Fragment::data("name")]),
        ];
        assert_eq!(fx.resolve(&tree), "OpenGate OpenGate a b a");
    }

    #[test]
    fn test_name_keys_agree_on_one_entity() {
        let fx = Fixture::new();
        let tree = vec![
            Fragment::data("name"),
            Fragment::literal(" "),
            Fragment::data("unique32charname"),
            Fragment::literal(" "),
            Fragment::data("name"),
        ];
        assert_eq!(fx.resolve(&tree), "OpenGate OpenGate OpenGate");
    }

    #[test]
    fn test_series_binding_visible_in_nested_scope() {
        let fx = Fixture::new();
        let series = SeriesFragment::new(
            "children",
            ",",
            vec![Fragment::Scope(
                ScopeFragment::new("bound", vec![Fragment::data("text")]).with_name_ref("item"),
            )],
        )
        .bind_as("item");
        assert_eq!(fx.resolve(&[series.into()]), "a,b,a");
    }

    #[test]
    fn test_conditional_predicate_parsing() {
        let c = ConditionalFragment::new(" !isLast ", vec![]);
        assert_eq!(c.predicate(), ("isLast", true));
        let c = ConditionalFragment::new("is_first", vec![]);
        assert_eq!(c.predicate(), ("is_first", false));
    }

    #[test]
    fn test_walk_visits_every_node() {
        let tree = Fragment::line(vec![
            Fragment::literal("a"),
            Fragment::scope("subject", vec![Fragment::reference("x")]),
        ]);
        let mut count = 0;
        tree.walk(&mut |_| count += 1);
        assert_eq!(count, 4);
    }
}
