//! Per-document sessions.
//!
//! A [`Session`] owns everything the engine keeps between calls for one document: the
//! configuration, the compiled [`Classifier`] and the [`LineMetaCache`]. Every public
//! method takes the current [`Document`] snapshot and a [`CancellationToken`]; a cancelled
//! call returns an empty result (or the unchanged input) and leaves no partial state
//! behind.

use crate::cancel::CancellationToken;
use crate::classifier::Classifier;
use crate::compare::{Direction, StringSortProvider};
use crate::config::BlockSortConfig;
use crate::document::Document;
use crate::edit::{PendingEdits, TextEdit};
use crate::error::{Cancelled, ConfigError, DirectiveError};
use crate::expand::ExpandSelection;
use crate::line_meta::{LineMeta, LineMetaCache};
use crate::marker::{BlockSortMarker, MarkerOptions, parse_directive};
use crate::position::Range;
use crate::sort::{SortDepth, SortOptions};

/// The borrowed state one engine call runs against.
pub(crate) struct Engine<'a> {
    pub(crate) document: &'a dyn Document,
    pub(crate) classifier: &'a Classifier,
    pub(crate) cache: &'a mut LineMetaCache,
    pub(crate) config: &'a BlockSortConfig,
    pub(crate) token: &'a CancellationToken,
}

impl Engine<'_> {
    /// Compute (or refresh) line metadata for `start..=end`.
    pub(crate) fn ensure(&mut self, start: usize, end: usize) -> Result<(), Cancelled> {
        self.cache
            .ensure(self.document, self.classifier, start, end, self.token)
    }

    /// Whole-line range `start..=end`, clamped to the document.
    pub(crate) fn line_range(&self, start: usize, end: usize) -> Range {
        self.document.validate_range(Range::lines(start, end))
    }
}

/// Block sorting state of one open document.
#[derive(Debug)]
pub struct Session {
    config: BlockSortConfig,
    classifier: Classifier,
    cache: LineMetaCache,
    errors: Vec<ConfigError>,
    language_id: String,
}

impl Session {
    /// Open a session for a document in `language_id`.
    ///
    /// Invalid configured patterns are replaced by their defaults and reported through
    /// [`Session::config_errors`].
    pub fn open(config: BlockSortConfig, language_id: impl Into<String>) -> Self {
        let language_id = language_id.into();
        let (classifier, errors) = Classifier::new(&config, &language_id);
        tracing::debug!(
            language = %language_id,
            config_errors = errors.len(),
            "opened blocksort session"
        );

        Self {
            config,
            classifier,
            cache: LineMetaCache::new(),
            errors,
            language_id,
        }
    }

    /// The session configuration.
    pub fn config(&self) -> &BlockSortConfig {
        &self.config
    }

    /// The document's language id.
    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    /// The compiled classifier.
    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// The line metadata cache.
    pub fn cache(&self) -> &LineMetaCache {
        &self.cache
    }

    /// Configuration problems found when the session was opened.
    pub fn config_errors(&self) -> &[ConfigError] {
        &self.errors
    }

    /// Account for `edit` having been applied to the document.
    ///
    /// Cached lines inside the edit are dropped and later spans shift by the edit's line
    /// delta.
    pub fn on_edit(&mut self, edit: &TextEdit) {
        self.cache.invalidate(
            edit.range.start.line,
            edit.range.end.line,
            edit.new_line_count(),
        );
    }

    /// Drop all cached state.
    pub fn close(&mut self) {
        self.cache.clear();
        tracing::debug!(language = %self.language_id, "closed blocksort session");
    }

    fn engine<'a>(
        &'a mut self,
        document: &'a dyn Document,
        token: &'a CancellationToken,
    ) -> Engine<'a> {
        Engine {
            document,
            classifier: &self.classifier,
            cache: &mut self.cache,
            config: &self.config,
            token,
        }
    }

    /// Sort options for `direction`, from the session configuration.
    pub fn sort_options(&self, direction: Direction) -> SortOptions {
        SortOptions::new(StringSortProvider::new(
            &self.config.collator_options,
            direction,
        ))
    }

    /// [`Session::sort_options`] at the configured `default_multilevel_depth`.
    pub fn multilevel_sort_options(&self, direction: Direction) -> SortOptions {
        self.sort_options(direction)
            .with_depth(SortDepth::from_i64(self.config.default_multilevel_depth))
    }

    /// Compute line metadata for `ranges` (the whole document if `None`).
    ///
    /// Returns the metadata of the requested lines in order, or nothing when cancelled.
    pub fn compute_line_meta(
        &mut self,
        document: &dyn Document,
        ranges: Option<&[Range]>,
        token: &CancellationToken,
    ) -> Vec<LineMeta> {
        let whole = [Range::lines(0, document.line_count().saturating_sub(1))];
        let ranges = ranges.unwrap_or(&whole);

        let mut engine = self.engine(document, token);
        let mut lines = Vec::new();
        for range in ranges {
            let range = document.validate_range(*range);
            let (start, end) = (range.start.line, range.end.line);
            if engine.ensure(start, end).is_err() {
                return Vec::new();
            }
            lines.extend((start..=end).filter_map(|line| engine.cache.get(line).cloned()));
        }
        lines
    }

    /// Split `range` into sibling blocks.
    pub fn get_blocks(
        &mut self,
        document: &dyn Document,
        range: Range,
        token: &CancellationToken,
    ) -> Vec<Range> {
        self.engine(document, token)
            .get_blocks(range)
            .unwrap_or_default()
    }

    /// Blocks one indentation level inside `block`.
    pub fn get_inner_blocks(
        &mut self,
        document: &dyn Document,
        block: Range,
        token: &CancellationToken,
    ) -> Vec<Range> {
        self.engine(document, token)
            .get_inner_blocks(block)
            .unwrap_or_default()
    }

    /// Grow `selection` to whole sibling blocks.
    ///
    /// Returns `selection` (clamped) when cancelled.
    pub fn expand_range(
        &mut self,
        document: &dyn Document,
        selection: Range,
        expand: ExpandSelection,
        token: &CancellationToken,
    ) -> Range {
        self.engine(document, token)
            .expand_range(selection, expand)
            .unwrap_or_else(|Cancelled| document.validate_range(selection))
    }

    /// Shrink `selection` over leading and trailing blank lines.
    pub fn trim_range(&mut self, document: &dyn Document, selection: Range) -> Range {
        let token = CancellationToken::new();
        self.engine(document, &token).trim_range(selection)
    }

    /// Expand and trim `selection` with the configured cursor or selection expansion.
    pub fn expand_selection(
        &mut self,
        document: &dyn Document,
        selection: Range,
        token: &CancellationToken,
    ) -> Range {
        let expand = if selection.is_empty() {
            self.config.expand_cursor
        } else {
            self.config.expand_selection
        };
        self.engine(document, token)
            .expand_selection(selection, expand)
            .unwrap_or_else(|Cancelled| document.validate_range(selection))
    }

    /// Sort `blocks` and return their texts in the new order.
    ///
    /// Pending edits inside the sorted blocks are merged and removed from `pending`. When
    /// cancelled, `pending` is left untouched and nothing is returned.
    pub fn sort_blocks(
        &mut self,
        document: &dyn Document,
        blocks: &[Range],
        options: &SortOptions,
        pending: &mut PendingEdits,
        token: &CancellationToken,
    ) -> Vec<String> {
        let snapshot = pending.clone();
        match self.engine(document, token).sort_blocks(blocks, options, pending) {
            Ok(sorted) => sorted,
            Err(Cancelled) => {
                *pending = snapshot;
                Vec::new()
            }
        }
    }

    /// The edit that sorts the blocks around `selection`.
    pub fn block_sort_edit(
        &mut self,
        document: &dyn Document,
        selection: Range,
        options: &SortOptions,
        pending: &mut PendingEdits,
        token: &CancellationToken,
    ) -> Option<TextEdit> {
        let snapshot = pending.clone();
        match self
            .engine(document, token)
            .block_sort_edit(selection, options, pending)
        {
            Ok(edit) => Some(edit),
            Err(Cancelled) => {
                *pending = snapshot;
                None
            }
        }
    }

    /// Parse the `@blocksort` directive on `line`.
    pub fn marker_at(
        &self,
        document: &dyn Document,
        line: usize,
    ) -> Result<MarkerOptions, DirectiveError> {
        let text = document
            .line_text(line)
            .ok_or(DirectiveError::Missing(line))?;
        parse_directive(&text, line, self.config.default_skip_parents)
    }

    /// Directive comments inside `range` (the whole document if `None`).
    pub fn block_sort_markers(
        &mut self,
        document: &dyn Document,
        range: Option<Range>,
        token: &CancellationToken,
    ) -> Vec<BlockSortMarker> {
        self.engine(document, token)
            .block_sort_markers(range)
            .unwrap_or_default()
    }

    /// One edit per directive whose target lies in `range` (the whole document if `None`).
    ///
    /// Edits are non-overlapping and ordered by position.
    pub fn format_edits(
        &mut self,
        document: &dyn Document,
        range: Option<Range>,
        token: &CancellationToken,
    ) -> Vec<TextEdit> {
        self.engine(document, token)
            .format_edits(range)
            .unwrap_or_default()
    }
}
