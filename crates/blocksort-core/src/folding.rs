//! Bracket folding families and per-family nesting depth.
//!
//! A [`FoldingTable`] is compiled from the configured [`FoldingMarker`]s. Families are
//! ordered by ascending priority; a [`FoldingState`] stores one signed depth per family
//! in that order.

use std::collections::BTreeMap;

use blocksort_lang::FoldingMarker;
use fancy_regex::Regex;

use crate::error::ConfigError;

/// How closing brackets are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FoldingMode {
    /// `opens - closes` per family; depths may become negative.
    #[default]
    Raw,
    /// Matches are walked in text order and a close without a matching open is ignored.
    Validated,
}

/// Signed nesting depth per folding family.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FoldingState {
    levels: Vec<i32>,
}

impl FoldingState {
    /// A closed state for `families` families.
    pub fn closed(families: usize) -> Self {
        Self {
            levels: vec![0; families],
        }
    }

    /// Depth of the family at `index` (0 if unknown).
    pub fn level(&self, index: usize) -> i32 {
        self.levels.get(index).copied().unwrap_or(0)
    }

    /// All depths, in family order.
    pub fn levels(&self) -> &[i32] {
        &self.levels
    }

    /// Add `other` component-wise.
    pub fn merge(&mut self, other: &FoldingState) {
        if self.levels.len() < other.levels.len() {
            self.levels.resize(other.levels.len(), 0);
        }
        for (level, delta) in self.levels.iter_mut().zip(&other.levels) {
            *level += delta;
        }
    }

    /// Component-wise sum of two states.
    pub fn merged(&self, other: &FoldingState) -> FoldingState {
        let mut result = self.clone();
        result.merge(other);
        result
    }

    /// Returns `true` if any family is not balanced.
    pub fn has_open(&self) -> bool {
        self.levels.iter().any(|&level| level != 0)
    }

    /// Returns `true` if any family has more opens than closes.
    pub fn has_positive(&self) -> bool {
        self.levels.iter().any(|&level| level > 0)
    }

    /// Returns `true` if any family has more closes than opens.
    pub fn has_negative(&self) -> bool {
        self.levels.iter().any(|&level| level < 0)
    }

    /// Sum over all families.
    pub fn total_open(&self) -> i32 {
        self.levels.iter().sum()
    }
}

#[derive(Debug)]
struct FoldingFamily {
    key: String,
    start: Regex,
    end: Regex,
    abort_on: Option<usize>,
}

/// Compiled folding families.
#[derive(Debug, Default)]
pub struct FoldingTable {
    families: Vec<FoldingFamily>,
}

impl FoldingTable {
    /// Compile `markers`, skipping (and reporting) families whose patterns are invalid.
    pub fn compile(
        markers: &BTreeMap<String, FoldingMarker>,
        errors: &mut Vec<ConfigError>,
    ) -> Self {
        let mut ordered: Vec<(&String, &FoldingMarker)> = markers.iter().collect();
        ordered.sort_by_key(|(_, marker)| marker.priority);

        let mut families = Vec::with_capacity(ordered.len());
        let mut abort_keys = Vec::with_capacity(ordered.len());
        for (key, marker) in ordered {
            let start = compile_family_pattern(key, &marker.start, errors);
            let end = compile_family_pattern(key, &marker.end, errors);
            let (Some(start), Some(end)) = (start, end) else {
                continue;
            };
            families.push(FoldingFamily {
                key: key.clone(),
                start,
                end,
                abort_on: None,
            });
            abort_keys.push(marker.abort_on.clone());
        }

        for index in 0..families.len() {
            let Some(abort_key) = abort_keys[index].as_deref() else {
                continue;
            };
            match families.iter().position(|family| family.key == abort_key) {
                Some(target) => families[index].abort_on = Some(target),
                None => {
                    let error = ConfigError::UnknownFoldingFamily {
                        family: families[index].key.clone(),
                        key: abort_key.to_string(),
                    };
                    tracing::warn!(%error, "ignoring folding abort rule");
                    errors.push(error);
                }
            }
        }

        Self { families }
    }

    /// Number of families.
    pub fn len(&self) -> usize {
        self.families.len()
    }

    /// Returns `true` if no family is configured.
    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Family keys in state order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.families.iter().map(|family| family.key.as_str())
    }

    /// A closed state sized for this table.
    pub fn closed(&self) -> FoldingState {
        FoldingState::closed(self.families.len())
    }

    /// Fold `sanitized` (one line, strings and comments already removed) onto `initial`.
    pub fn count(&self, sanitized: &str, initial: &FoldingState, mode: FoldingMode) -> FoldingState {
        let mut result = self.closed();
        result.merge(initial);

        let matches: Vec<(Vec<usize>, Vec<usize>)> = self
            .families
            .iter()
            .map(|family| {
                (
                    match_starts(&family.start, sanitized),
                    match_starts(&family.end, sanitized),
                )
            })
            .collect();

        for (index, family) in self.families.iter().enumerate() {
            let (opens, closes) = &matches[index];
            let before = result.levels[index];
            let after = match mode {
                FoldingMode::Raw => before + opens.len() as i32 - closes.len() as i32,
                FoldingMode::Validated => validated_level(before, opens, closes),
            };

            let aborted = family
                .abort_on
                .is_some_and(|target| !matches[target].0.is_empty());
            result.levels[index] = if aborted && after > before {
                before
            } else {
                after
            };
        }

        result
    }
}

fn compile_family_pattern(key: &str, pattern: &str, errors: &mut Vec<ConfigError>) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(err) => {
            let error = ConfigError::InvalidRegex {
                rule: format!("foldingMarkers.{key}"),
                pattern: pattern.to_string(),
                message: err.to_string(),
            };
            tracing::warn!(%error, "skipping folding family");
            errors.push(error);
            None
        }
    }
}

/// Byte offsets of all matches; a matcher error ends the scan.
fn match_starts(regex: &Regex, text: &str) -> Vec<usize> {
    regex
        .find_iter(text)
        .map_while(Result::ok)
        .map(|found| found.start())
        .collect()
}

fn validated_level(mut level: i32, opens: &[usize], closes: &[usize]) -> i32 {
    let (mut o, mut c) = (0, 0);
    while o < opens.len() || c < closes.len() {
        let take_open = match (opens.get(o), closes.get(c)) {
            (Some(open), Some(close)) => open <= close,
            (Some(_), None) => true,
            _ => false,
        };
        if take_open {
            level += 1;
            o += 1;
        } else {
            if level > 0 {
                level -= 1;
            }
            c += 1;
        }
    }
    level
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> FoldingTable {
        let mut errors = Vec::new();
        let table = FoldingTable::compile(&blocksort_lang::default_folding_markers(), &mut errors);
        assert!(errors.is_empty());
        table
    }

    fn index_of(table: &FoldingTable, key: &str) -> usize {
        table.keys().position(|k| k == key).unwrap()
    }

    #[test]
    fn test_curly_braces_are_last() {
        let table = table();
        assert_eq!(table.keys().last(), Some("{}"));
    }

    #[test]
    fn test_raw_count() {
        let table = table();
        let state = table.count("foo(a, [b", &table.closed(), FoldingMode::Raw);
        assert_eq!(state.level(index_of(&table, "()")), 1);
        assert_eq!(state.level(index_of(&table, "[]")), 1);
        assert_eq!(state.total_open(), 2);

        let closing = table.count("])}", &table.closed(), FoldingMode::Raw);
        assert!(closing.has_negative());
        assert_eq!(state.merged(&closing).total_open(), -1);
    }

    #[test]
    fn test_validated_count_never_goes_negative() {
        let table = table();
        let paren = index_of(&table, "()");
        let state = table.count(") (", &table.closed(), FoldingMode::Validated);
        assert_eq!(state.level(paren), 1);

        let raw = table.count(") (", &table.closed(), FoldingMode::Raw);
        assert_eq!(raw.level(paren), 0);
    }

    #[test]
    fn test_angle_brackets_abort_on_curly_brace() {
        let table = table();
        let angle = index_of(&table, "<>");
        let state = table.count("if (a < b) {", &table.closed(), FoldingMode::Raw);
        assert_eq!(state.level(angle), 0);
        assert_eq!(state.level(index_of(&table, "{}")), 1);

        let generic = table.count("let x: Vec<Option<u8", &table.closed(), FoldingMode::Raw);
        assert_eq!(generic.level(angle), 2);
    }

    #[test]
    fn test_arrow_is_not_a_closing_angle_bracket() {
        let table = table();
        let state = table.count("a => b -> c", &table.closed(), FoldingMode::Raw);
        assert!(!state.has_open());
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let mut markers = BTreeMap::new();
        markers.insert("bad".to_string(), FoldingMarker::new("(", r"\)"));
        markers.insert(
            "ok".to_string(),
            FoldingMarker::new(r"\[", r"\]").aborted_by("missing"),
        );
        let mut errors = Vec::new();
        let table = FoldingTable::compile(&markers, &mut errors);
        assert_eq!(table.len(), 1);
        assert_eq!(errors.len(), 2);
    }
}
