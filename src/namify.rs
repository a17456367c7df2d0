//! Code-legal unique identifiers for story entities
//!
//! Display names are free text ("Open the Gate!"), but generated code needs
//! identifiers that are legal in the target language, unique within the
//! generated artifact and never a reserved word. A [`Namifier`] hands those
//! out for one generation run and remembers them, so the same entity is named
//! identically everywhere it is referenced.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::fragment::Pattern;
use crate::model::Focus;

/// Pattern used when a data fragment names no legal range
pub const DEFAULT_LEGAL: &str = "[a-zA-Z]+[0-9a-zA-Z_]*";

const MAX_ATTEMPTS: u32 = 10_000;

#[derive(Debug)]
pub struct Namifier {
    default_legal: Pattern,
    assigned: HashMap<(Focus, Option<usize>), String>,
    /// Every name handed out, with the focus it belongs to
    owners: HashMap<String, Focus>,
}

impl Default for Namifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Namifier {
    pub fn new() -> Self {
        Self {
            default_legal: Pattern::new(DEFAULT_LEGAL),
            assigned: HashMap::new(),
            owners: HashMap::new(),
        }
    }

    /// Unique legal name for `focus`, derived from `display_name`
    ///
    /// A name only collides with names of other foci, so the plain and the
    /// length-limited form of one entity agree whenever the limit allows.
    /// Returns `None` when nothing of `display_name` survives legalisation or
    /// every suffixed variant is already taken.
    pub fn unique_name(
        &mut self,
        focus: &Focus,
        display_name: &str,
        legal: Option<&Pattern>,
        max_len: Option<usize>,
        reserved: &HashSet<String>,
    ) -> Option<String> {
        let key = (focus.clone(), max_len);
        if let Some(name) = self.assigned.get(&key) {
            return Some(name.clone());
        }

        let legal = match legal {
            Some(p) if p.is_valid() => p,
            Some(p) => {
                warn!(
                    pattern = p.source(),
                    "invalid legal range, using {}", DEFAULT_LEGAL
                );
                &self.default_legal
            }
            None => &self.default_legal,
        };

        let base = legalize(display_name, legal)?;
        let mut candidate = truncate(&base, max_len);
        let mut counter = 0;
        while candidate.is_empty()
            || !legal.matches(&candidate)
            || self.owners.get(&candidate).is_some_and(|owner| owner != focus)
            || reserved.contains(&candidate)
        {
            if counter >= MAX_ATTEMPTS {
                warn!(
                    entity = display_name,
                    "gave up finding a unique name after {} attempts", MAX_ATTEMPTS
                );
                return None;
            }
            let suffix = format!("_{}", to_base36(counter));
            counter += 1;
            let stem = truncate(&base, max_len.map(|m| m.saturating_sub(suffix.len())));
            candidate = legalize(&(stem + &suffix), legal).unwrap_or_default();
        }

        self.owners.insert(candidate.clone(), focus.clone());
        self.assigned.insert(key, candidate.clone());
        Some(candidate)
    }

    /// Number of names handed out so far
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

/// Drop characters until `text` matches `legal`
fn legalize(text: &str, legal: &Pattern) -> Option<String> {
    if legal.matches(text) {
        return Some(text.to_string());
    }

    let mut kept = String::new();
    for c in text.chars() {
        kept.push(c);
        if !legal.matches(&kept) {
            kept.pop();
        }
    }

    let kept = kept.trim_start_matches(|c: char| !c.is_alphabetic());
    (!kept.is_empty()).then(|| kept.to_string())
}

fn truncate(text: &str, max_len: Option<usize>) -> String {
    match max_len {
        Some(max) => text.chars().take(max).collect(),
        None => text.to_string(),
    }
}

fn to_base36(mut n: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
    let mut out = Vec::new();
    loop {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
        if n == 0 {
            break;
        }
    }
    out.iter().rev().map(|b| *b as char).collect()
}
