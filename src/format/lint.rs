//! Lint pass for loaded formats.
//!
//! Resolution tolerates unknown directives and missing targets (they become
//! markers or empty text), so these defects otherwise only show up in the
//! generated code. Lint finds them right after loading.

use std::fmt;

use crate::fragment::{ConditionalFragment, FormatDefinition, Fragment, PredicateKind, ScopeKind, SeriesKind};

use super::{FormatRegistry, MapRegistry};

/// A lint warning about a format defect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintWarning {
    pub category: LintCategory,
    /// Format the defect was found in
    pub format: String,
    pub message: String,
}

impl fmt::Display for LintWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.category, self.format, self.message)
    }
}

/// Category of lint defect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintCategory {
    UnknownScope,
    UnknownSeries,
    UnknownPredicate,
    InvalidRegex,
    MissingFormat,
    MissingMap,
}

impl fmt::Display for LintCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LintCategory::UnknownScope => write!(f, "unknown-scope"),
            LintCategory::UnknownSeries => write!(f, "unknown-series"),
            LintCategory::UnknownPredicate => write!(f, "unknown-predicate"),
            LintCategory::InvalidRegex => write!(f, "invalid-regex"),
            LintCategory::MissingFormat => write!(f, "missing-format"),
            LintCategory::MissingMap => write!(f, "missing-map"),
        }
    }
}

/// Run all lint checks over every loaded format, in name order.
pub fn check(formats: &FormatRegistry, maps: &MapRegistry) -> Vec<LintWarning> {
    let mut warnings = Vec::new();
    for name in formats.names() {
        if let Some(format) = formats.get(name) {
            check_format(format, formats, maps, &mut warnings);
        }
    }
    warnings
}

fn check_format(
    format: &FormatDefinition,
    formats: &FormatRegistry,
    maps: &MapRegistry,
    warnings: &mut Vec<LintWarning>,
) {
    let mut warn = |category, message: String| {
        warnings.push(LintWarning {
            category,
            format: format.name.clone(),
            message,
        })
    };

    for fragment in &format.fragments {
        fragment.walk(&mut |f| match f {
            Fragment::Scope(scope) => {
                if let Err(e) = scope.directive.parse::<ScopeKind>() {
                    warn(LintCategory::UnknownScope, e.to_string());
                }
            }
            Fragment::Series(series) => {
                if let Err(e) = series.directive.parse::<SeriesKind>() {
                    warn(LintCategory::UnknownSeries, e.to_string());
                }
                if let Some(err) = series.filter.pattern().and_then(|p| p.error()) {
                    warn(
                        LintCategory::InvalidRegex,
                        format!("series '{}' filter: {}", series.directive, err),
                    );
                }
            }
            Fragment::Conditional(conditional) => check_conditional(conditional, &mut warn),
            Fragment::SimpleData(data) => {
                if let Some(err) = data.legal.as_ref().and_then(|p| p.error()) {
                    warn(
                        LintCategory::InvalidRegex,
                        format!("data '{}' legal range: {}", data.directive, err),
                    );
                }
            }
            Fragment::Reference(reference) if !formats.contains(&reference.name) => {
                warn(
                    LintCategory::MissingFormat,
                    format!("reference to undefined format '{}'", reference.name),
                );
            }
            Fragment::MapLookup(lookup) if !maps.contains(&lookup.map) => {
                warn(
                    LintCategory::MissingMap,
                    format!("lookup in undefined map '{}'", lookup.map),
                );
            }
            _ => {}
        });
    }
}

fn check_conditional(conditional: &ConditionalFragment, warn: &mut impl FnMut(LintCategory, String)) {
    let (name, _) = conditional.predicate();
    if let Err(e) = name.parse::<PredicateKind>() {
        warn(LintCategory::UnknownPredicate, e.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{FormatRegistryBuilder, MapDefinition, MapRegistryBuilder};
    use crate::fragment::{DataFragment, SeriesFilter, SeriesFragment};

    fn registries(fragments: Vec<Fragment>) -> (FormatRegistry, MapRegistry) {
        let formats = FormatRegistryBuilder::new()
            .insert(FormatDefinition::new("main", fragments))
            .unwrap()
            .build()
            .unwrap();
        let maps = MapRegistryBuilder::new()
            .insert(MapDefinition::new("types"))
            .unwrap()
            .build();
        (formats, maps)
    }

    fn categories(warnings: &[LintWarning]) -> Vec<LintCategory> {
        warnings.iter().map(|w| w.category).collect()
    }

    #[test]
    fn test_clean_format_has_no_warnings() {
        let (formats, maps) = registries(vec![Fragment::line(vec![
            Fragment::scope("subject", vec![Fragment::data("name")]),
            Fragment::series("children", ",", vec![Fragment::lookup("TYPES", "kind")]),
            Fragment::conditional("!is_last", vec![]),
        ])]);
        assert!(check(&formats, &maps).is_empty());
    }

    #[test]
    fn test_unknown_directives() {
        let (formats, maps) = registries(vec![
            Fragment::scope("sibling", vec![]),
            Fragment::series("cousins", ",", vec![]),
            Fragment::conditional("!is_tuesday", vec![]),
        ]);
        let warnings = check(&formats, &maps);
        assert_eq!(
            categories(&warnings),
            vec![
                LintCategory::UnknownScope,
                LintCategory::UnknownSeries,
                LintCategory::UnknownPredicate
            ]
        );
        assert_eq!(warnings[0].format, "main");
        assert_eq!(warnings[2].message, "unknown predicate 'is_tuesday'");
    }

    #[test]
    fn test_missing_targets() {
        let (formats, maps) = registries(vec![Fragment::line(vec![
            Fragment::reference("helper"),
            Fragment::lookup("colours", "kind"),
        ])]);
        let warnings = check(&formats, &maps);
        assert_eq!(
            categories(&warnings),
            vec![LintCategory::MissingFormat, LintCategory::MissingMap]
        );
        assert_eq!(
            warnings[0].to_string(),
            "[missing-format] main: reference to undefined format 'helper'"
        );
    }

    #[test]
    fn test_invalid_regexes() {
        let series = SeriesFragment::new("causes", ",", vec![]).with_filter(SeriesFilter::slot("("));
        let data = DataFragment::new("name").with_legal("[a-");
        let (formats, maps) = registries(vec![series.into(), data.into()]);
        let warnings = check(&formats, &maps);
        assert_eq!(
            categories(&warnings),
            vec![LintCategory::InvalidRegex, LintCategory::InvalidRegex]
        );
    }
}
