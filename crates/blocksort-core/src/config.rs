//! User configuration.
//!
//! [`BlockSortConfig`] is plain serde data; it is compiled into a
//! [`Classifier`](crate::Classifier) once per session. List-valued markers are
//! *additional* to the built-in defaults of `blocksort-lang`; folding families are merged
//! by key, and a `null` entry removes a default family.

use std::collections::BTreeMap;

use blocksort_lang::{
    DEFAULT_COMPLETE_BLOCK_MARKERS, DEFAULT_FORCE_LAST_REGEX, DEFAULT_INCOMPLETE_BLOCK_REGEX,
    DEFAULT_INDENT_IGNORE_MARKERS, DEFAULT_MULTI_BLOCK_HEADER_REGEX, FoldingMarker,
    LanguageMarkers,
};
use serde::{Deserialize, Serialize};

use crate::compare::CollatorOptions;
use crate::expand::ExpandSelection;

/// Default tab width used to convert leading whitespace into indentation levels.
pub const DEFAULT_TAB_SIZE: usize = 4;

/// Default trailing separator characters reconciled between sorted blocks.
pub const DEFAULT_SEPARATOR_CHARACTERS: &str = ",;";

/// Block sorting configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BlockSortConfig {
    /// Columns per indentation level.
    pub tab_size: usize,
    /// Extra regex sources for lines whose indentation is ignored (e.g. a lone `{`).
    pub indent_ignore_markers: Vec<String>,
    /// Extra regex sources for lines that complete a block (e.g. `}`).
    pub complete_block_markers: Vec<String>,
    /// Folding family overrides by key; `None` disables a default family.
    pub folding_markers: BTreeMap<String, Option<FoldingMarker>>,
    /// Pattern for lines that continue into the next line.
    pub incomplete_block_regex: Option<String>,
    /// Pattern for a single `case`/`when` style header line.
    pub multi_block_header_regex: Option<String>,
    /// Pattern for blocks that always sort first (no rule by default).
    pub force_block_header_first_regex: Option<String>,
    /// Pattern for blocks that always sort last.
    pub force_block_header_last_regex: Option<String>,
    /// Sort runs of consecutive header lines at the start of each block.
    pub sort_consecutive_block_headers: bool,
    /// Keep each position's trailing newline when blocks are reordered.
    pub keep_appended_newlines: bool,
    /// Depth used by hosts that do not ask for one (`-1` = unbounded).
    pub default_multilevel_depth: i64,
    /// Skip-parents count used by `@blocksort` directives.
    pub default_skip_parents: usize,
    /// Expansion applied to an empty selection (cursor).
    pub expand_cursor: ExpandSelection,
    /// Expansion applied to a non-empty selection.
    pub expand_selection: ExpandSelection,
    /// Options of the built-in collator.
    pub collator_options: CollatorOptions,
    /// Characters recognized as trailing block separators.
    pub separator_characters: String,
    /// Per-language marker overrides, keyed by language id.
    pub languages: BTreeMap<String, LanguageMarkers>,
}

impl Default for BlockSortConfig {
    fn default() -> Self {
        Self {
            tab_size: DEFAULT_TAB_SIZE,
            indent_ignore_markers: Vec::new(),
            complete_block_markers: Vec::new(),
            folding_markers: BTreeMap::new(),
            incomplete_block_regex: None,
            multi_block_header_regex: None,
            force_block_header_first_regex: None,
            force_block_header_last_regex: None,
            sort_consecutive_block_headers: true,
            keep_appended_newlines: true,
            default_multilevel_depth: -1,
            default_skip_parents: 0,
            expand_cursor: ExpandSelection::Full,
            expand_selection: ExpandSelection::Disabled,
            collator_options: CollatorOptions::default(),
            separator_characters: DEFAULT_SEPARATOR_CHARACTERS.to_string(),
            languages: BTreeMap::new(),
        }
    }
}

impl BlockSortConfig {
    /// Comment/string/decorator markers for `language_id`, honoring overrides.
    pub fn language_markers(&self, language_id: &str) -> LanguageMarkers {
        self.languages
            .get(language_id)
            .cloned()
            .unwrap_or_else(|| blocksort_lang::language_markers(language_id))
    }

    /// Effective folding families: defaults merged with the configured overrides.
    pub fn folding_markers(&self) -> BTreeMap<String, FoldingMarker> {
        let mut markers = blocksort_lang::default_folding_markers();
        for (key, marker) in &self.folding_markers {
            match marker {
                Some(marker) => {
                    markers.insert(key.clone(), marker.clone());
                }
                None => {
                    markers.remove(key);
                }
            }
        }
        markers
    }

    /// Configured indent-ignore markers followed by the defaults.
    pub fn indent_ignore_markers(&self) -> Vec<String> {
        with_defaults(&self.indent_ignore_markers, DEFAULT_INDENT_IGNORE_MARKERS)
    }

    /// Configured complete-block markers followed by the defaults.
    pub fn complete_block_markers(&self) -> Vec<String> {
        with_defaults(&self.complete_block_markers, DEFAULT_COMPLETE_BLOCK_MARKERS)
    }

    /// Effective incomplete-block pattern.
    pub fn incomplete_block_regex(&self) -> &str {
        non_empty(&self.incomplete_block_regex).unwrap_or(DEFAULT_INCOMPLETE_BLOCK_REGEX)
    }

    /// Effective multi-block header pattern.
    pub fn multi_block_header_regex(&self) -> &str {
        non_empty(&self.multi_block_header_regex).unwrap_or(DEFAULT_MULTI_BLOCK_HEADER_REGEX)
    }

    /// Effective force-first pattern, if any.
    pub fn force_first_regex(&self) -> Option<&str> {
        non_empty(&self.force_block_header_first_regex)
    }

    /// Effective force-last pattern.
    pub fn force_last_regex(&self) -> &str {
        non_empty(&self.force_block_header_last_regex).unwrap_or(DEFAULT_FORCE_LAST_REGEX)
    }

    /// Separator characters, falling back to `,;` when unset.
    pub fn separator_characters(&self) -> Vec<char> {
        let source = if self.separator_characters.is_empty() {
            DEFAULT_SEPARATOR_CHARACTERS
        } else {
            &self.separator_characters
        };
        source.chars().collect()
    }
}

fn with_defaults(configured: &[String], defaults: &[&str]) -> Vec<String> {
    configured
        .iter()
        .filter(|marker| !marker.is_empty())
        .cloned()
        .chain(defaults.iter().map(|marker| marker.to_string()))
        .collect()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BlockSortConfig::default();
        assert_eq!(config.tab_size, 4);
        assert!(config.sort_consecutive_block_headers);
        assert!(config.keep_appended_newlines);
        assert_eq!(config.default_multilevel_depth, -1);
        assert_eq!(config.separator_characters(), vec![',', ';']);
        assert!(config.force_first_regex().is_none());
        assert_eq!(config.folding_markers().len(), 4);
    }

    #[test]
    fn test_folding_overrides_merge_by_key() {
        let mut config = BlockSortConfig::default();
        config.folding_markers.insert("<>".to_string(), None);
        config.folding_markers.insert(
            "begin/end".to_string(),
            Some(FoldingMarker::new(r"\bbegin\b", r"\bend\b")),
        );

        let markers = config.folding_markers();
        assert!(!markers.contains_key("<>"));
        assert!(markers.contains_key("begin/end"));
        assert!(markers.contains_key("{}"));
    }

    #[test]
    fn test_configured_markers_come_first() {
        let config = BlockSortConfig {
            complete_block_markers: vec!["end".to_string(), String::new()],
            ..Default::default()
        };
        let markers = config.complete_block_markers();
        assert_eq!(markers[0], "end");
        assert_eq!(markers.len(), 1 + DEFAULT_COMPLETE_BLOCK_MARKERS.len());
    }
}
