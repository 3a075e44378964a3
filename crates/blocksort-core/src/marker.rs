//! `@blocksort` directives and the edits they produce.
//!
//! A directive is a comment line of the form
//!
//! ```text
//! // @blocksort [asc|desc] [N|inf|infinite]
//! ```
//!
//! It annotates the first following non-blank line indented deeper than itself; the
//! blocks around that line are sorted when the document is formatted.

use std::sync::LazyLock;

use regex::Regex;

use crate::compare::{Direction, StringSortProvider};
use crate::config::BlockSortConfig;
use crate::edit::{PendingEdits, TextEdit};
use crate::error::{Cancelled, DirectiveError};
use crate::position::{Position, Range};
use crate::session::Engine;
use crate::sort::{SortDepth, SortOptions};

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@blocksort ?(asc|desc)? ?(\d+|inf(?:inite)?)?").expect("valid directive regex")
});

/// Options carried by a directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerOptions {
    /// Sort direction (`asc` when omitted).
    pub direction: Direction,
    /// Nesting depth (`0` when omitted).
    pub depth: SortDepth,
    /// Outer levels left unsorted.
    pub skip_parents: usize,
}

impl MarkerOptions {
    /// Sort options for this directive, with full expansion.
    pub fn sort_options(&self, config: &BlockSortConfig) -> SortOptions {
        SortOptions::new(StringSortProvider::new(
            &config.collator_options,
            self.direction,
        ))
        .with_depth(self.depth)
        .with_skip_parents(self.skip_parents)
    }
}

/// A directive found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSortMarker {
    /// Line of the directive comment.
    pub line: usize,
    /// First non-whitespace position of the annotated line, if there is one.
    pub position: Option<Position>,
    /// Parsed options.
    pub options: MarkerOptions,
}

/// Parse the directive in `text` (the content of `line`).
pub(crate) fn parse_directive(
    text: &str,
    line: usize,
    skip_parents: usize,
) -> Result<MarkerOptions, DirectiveError> {
    let captures = DIRECTIVE
        .captures(text)
        .ok_or(DirectiveError::Missing(line))?;

    let direction = match captures.get(1).map(|m| m.as_str()) {
        Some("desc") => Direction::Desc,
        _ => Direction::Asc,
    };
    let depth = match captures.get(2).map(|m| m.as_str()) {
        None => SortDepth::Limited(0),
        Some(depth) if depth.starts_with("inf") => SortDepth::Unbounded,
        Some(depth) => depth
            .parse()
            .map(SortDepth::Limited)
            .map_err(|_| DirectiveError::InvalidDepth(depth.to_string()))?,
    };

    Ok(MarkerOptions {
        direction,
        depth,
        skip_parents,
    })
}

fn leading_whitespace(text: &str) -> usize {
    text.chars().take_while(|c| c.is_whitespace()).count()
}

impl Engine<'_> {
    /// Expand `selection`, segment it and sort the blocks into one replacement edit.
    pub(crate) fn block_sort_edit(
        &mut self,
        selection: Range,
        options: &SortOptions,
        pending: &mut PendingEdits,
    ) -> Result<TextEdit, Cancelled> {
        let range = self.expand_selection(selection, options.expand)?;
        let blocks = self.get_blocks(range)?;
        if blocks.is_empty() {
            return Ok(TextEdit::new(range, self.document.text_in_range(range)));
        }

        let sorted = self.sort_blocks(&blocks, options, pending)?;
        tracing::debug!(
            start = range.start.line,
            end = range.end.line,
            blocks = blocks.len(),
            "computed block sort edit"
        );
        Ok(TextEdit::new(range, sorted.join("\n")))
    }

    /// Directive comments inside `range` (the whole document if `None`).
    pub(crate) fn block_sort_markers(
        &mut self,
        range: Option<Range>,
    ) -> Result<Vec<BlockSortMarker>, Cancelled> {
        let last_line = self.document.line_count().saturating_sub(1);
        let range = self
            .document
            .validate_range(range.unwrap_or(Range::lines(0, last_line)));

        let mut markers = Vec::new();
        for line in range.start.line..=range.end.line {
            self.token.check()?;
            let Some(text) = self.document.line_text(line) else {
                break;
            };
            if !self.classifier.is_directive_line(&text) {
                continue;
            }
            match parse_directive(&text, line, self.config.default_skip_parents) {
                Ok(options) => markers.push(BlockSortMarker {
                    line,
                    position: self.next_block_position(line, &text),
                    options,
                }),
                Err(error) => tracing::warn!(line, %error, "ignoring @blocksort directive"),
            }
        }

        tracing::debug!(markers = markers.len(), "found @blocksort directives");
        Ok(markers)
    }

    fn next_block_position(&self, line: usize, text: &str) -> Option<Position> {
        let indent = leading_whitespace(text);
        (line + 1..self.document.line_count()).find_map(|next| {
            let text = self.document.line_text(next)?;
            let next_indent = leading_whitespace(&text);
            (!text.trim().is_empty() && next_indent > indent)
                .then(|| Position::new(next, next_indent))
        })
    }

    /// One edit per directive whose annotated line lies in `range`.
    ///
    /// Directives are applied innermost first; an inner edit inside a block of an enclosing
    /// sort is merged into that sort's output. Remaining edits overlapping a larger one are
    /// dropped.
    pub(crate) fn format_edits(&mut self, range: Option<Range>) -> Result<Vec<TextEdit>, Cancelled> {
        let range = range.map(|range| self.document.validate_range(range));
        let mut targets = Vec::new();
        for marker in self.block_sort_markers(None)? {
            let Some(position) = marker.position else {
                continue;
            };
            if range.is_some_and(|range| !range.contains_position(position)) {
                continue;
            }
            let options = marker.options.sort_options(self.config);
            let target = self.expand_selection(Range::caret(position), options.expand)?;
            targets.push((target, position, options));
        }
        targets.sort_by_key(|(target, position, _)| (target.line_count(), *position));

        let mut pending = PendingEdits::new();
        for (_, position, options) in &targets {
            let edit = self.block_sort_edit(Range::caret(*position), options, &mut pending)?;
            pending.push(edit);
        }

        let mut candidates = pending.into_vec();
        candidates.sort_by_key(|edit| std::cmp::Reverse(edit.range.line_count()));
        let mut edits: Vec<TextEdit> = Vec::with_capacity(candidates.len());
        for edit in candidates {
            if let Some(outer) = edits.iter().find(|kept| kept.range.overlaps(&edit.range)) {
                tracing::debug!(
                    line = edit.range.start.line,
                    outer = outer.range.start.line,
                    "dropping directive edit overlapping an enclosing sort"
                );
                continue;
            }
            edits.push(edit);
        }
        edits.sort_by_key(|edit| edit.range.start);

        tracing::debug!(directives = targets.len(), edits = edits.len(), "formatted directives");
        Ok(edits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_directive_defaults() {
        let options = parse_directive("// @blocksort", 3, 0).unwrap();
        assert_eq!(options.direction, Direction::Asc);
        assert_eq!(options.depth, SortDepth::Limited(0));
        assert_eq!(options.skip_parents, 0);
    }

    #[test]
    fn test_parse_directive_arguments() {
        let options = parse_directive("  # @blocksort desc 2", 0, 1).unwrap();
        assert_eq!(options.direction, Direction::Desc);
        assert_eq!(options.depth, SortDepth::Limited(2));
        assert_eq!(options.skip_parents, 1);

        let options = parse_directive("// @blocksort inf", 0, 0).unwrap();
        assert_eq!(options.depth, SortDepth::Unbounded);
        let options = parse_directive("// @blocksort asc infinite", 0, 0).unwrap();
        assert_eq!(options.depth, SortDepth::Unbounded);
    }

    #[test]
    fn test_parse_directive_errors() {
        assert_eq!(
            parse_directive("// sort me", 7, 0),
            Err(DirectiveError::Missing(7))
        );
        assert!(matches!(
            parse_directive("// @blocksort 99999999999999999999999", 0, 0),
            Err(DirectiveError::InvalidDepth(_))
        ));
    }
}
