//! Growing a cursor or selection to whole sibling blocks.

use serde::{Deserialize, Serialize};

use crate::error::Cancelled;
use crate::folding::FoldingState;
use crate::line_meta::{LineMeta, indent_range};
use crate::position::Range;
use crate::session::Engine;

/// Expansion toggles, OR-combined per candidate line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExpandOptions {
    /// Absorb content lines indented at least as deep as the selection.
    pub expand_locally: bool,
    /// Absorb lines without content.
    pub expand_over_empty_lines: bool,
    /// Absorb lines while the accumulated folding is not balanced.
    pub folding_complete: bool,
    /// Absorb lines indented deeper than the selection.
    pub indentation_complete: bool,
}

impl ExpandOptions {
    /// Every toggle enabled.
    pub const FULL: Self = Self {
        expand_locally: true,
        expand_over_empty_lines: true,
        folding_complete: true,
        indentation_complete: true,
    };
}

/// Expansion applied before sorting.
///
/// Deserializes from `false`, `true` or an [`ExpandOptions`] object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "ExpandSetting", into = "ExpandSetting")]
pub enum ExpandSelection {
    /// Whole lines plus folding repair only.
    #[default]
    Disabled,
    /// Every toggle of [`ExpandOptions`].
    Full,
    /// The given toggles.
    Custom(ExpandOptions),
}

impl ExpandSelection {
    fn options(self) -> Option<ExpandOptions> {
        match self {
            Self::Disabled => None,
            Self::Full => Some(ExpandOptions::FULL),
            Self::Custom(options) => Some(options),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ExpandSetting {
    Flag(bool),
    Options(ExpandOptions),
}

impl From<ExpandSetting> for ExpandSelection {
    fn from(setting: ExpandSetting) -> Self {
        match setting {
            ExpandSetting::Flag(false) => Self::Disabled,
            ExpandSetting::Flag(true) => Self::Full,
            ExpandSetting::Options(options) => Self::Custom(options),
        }
    }
}

impl From<ExpandSelection> for ExpandSetting {
    fn from(selection: ExpandSelection) -> Self {
        match selection {
            ExpandSelection::Disabled => Self::Flag(false),
            ExpandSelection::Full => Self::Flag(true),
            ExpandSelection::Custom(options) => Self::Options(options),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

fn is_expand_line(
    meta: &LineMeta,
    folding: &FoldingState,
    min_indent: f64,
    last_indent: f64,
    options: &ExpandOptions,
) -> bool {
    (options.expand_locally && meta.has_content && meta.indent >= min_indent)
        || (options.expand_over_empty_lines && !meta.has_content)
        || (options.indentation_complete
            && (meta.indent > min_indent || (last_indent > min_indent && !meta.has_content)))
        || (options.folding_complete && folding.total_open() != 0)
}

impl Engine<'_> {
    /// Grow `selection` to whole lines, repair its folding and expand it per `expand`.
    pub(crate) fn expand_range(
        &mut self,
        selection: Range,
        expand: ExpandSelection,
    ) -> Result<Range, Cancelled> {
        let selection = self.document.validate_range(selection);
        let last_line = self.document.line_count().saturating_sub(1);
        let (mut start, mut end) = (selection.start.line, selection.end.line);

        self.ensure(start, end)?;
        let mut folding = self.classifier.folding_table().closed();
        for line in start..=end {
            self.token.check()?;
            if let Some(meta) = self.cache.get(line) {
                folding.merge(&meta.folding);
            }
        }

        loop {
            self.token.check()?;
            if folding.has_positive() && end < last_line {
                end += 1;
                self.merge_line_folding(end, &mut folding)?;
            } else if folding.has_negative() && start > 0 {
                start -= 1;
                self.merge_line_folding(start, &mut folding)?;
            } else {
                break;
            }
        }

        let mut range = self.line_range(start, end);
        let Some(options) = expand.options() else {
            return Ok(range);
        };

        let min_indent = {
            let metas: Vec<&LineMeta> = (start..=end).filter_map(|line| self.cache.get(line)).collect();
            indent_range(&metas, true).map_or(0.0, |indent| indent.min)
        };

        let order = if folding.total_open() > 0 {
            [Direction::Down, Direction::Up]
        } else {
            [Direction::Up, Direction::Down]
        };
        for direction in order {
            (range, folding) = self.expand_in_direction(range, folding, min_indent, direction, &options)?;
        }

        tracing::debug!(
            from = selection.start.line,
            to = selection.end.line,
            start = range.start.line,
            end = range.end.line,
            "expanded range"
        );
        Ok(self.document.validate_range(range))
    }

    fn expand_in_direction(
        &mut self,
        mut range: Range,
        mut folding: FoldingState,
        min_indent: f64,
        direction: Direction,
        options: &ExpandOptions,
    ) -> Result<(Range, FoldingState), Cancelled> {
        let line_count = self.document.line_count();
        let mut line = match direction {
            Direction::Up => range.start.line,
            Direction::Down => range.end.line,
        };
        self.ensure(line, line)?;
        let mut last_indent = self.cache.get(line).map_or(0.0, |meta| meta.indent);
        let mut previous = (range, folding.clone());

        loop {
            let next = match direction {
                Direction::Up if line > 0 => line - 1,
                Direction::Down if line + 1 < line_count => line + 1,
                _ => break,
            };
            self.token.check()?;
            self.ensure(next, next)?;
            let Some(meta) = self.cache.get(next) else {
                break;
            };
            if !is_expand_line(meta, &folding, min_indent, last_indent, options) {
                break;
            }

            previous = (range, folding.clone());
            line = next;
            range = range.union(&Range::lines(line, line));
            folding.merge(&meta.folding);
            if meta.has_content {
                last_indent = meta.indent;
            }
        }

        if line == 0 && folding.total_open() > 0 {
            return Ok(previous);
        }
        Ok((range, folding))
    }

    /// [`Engine::expand_range`] followed by [`Engine::trim_range`].
    pub(crate) fn expand_selection(
        &mut self,
        selection: Range,
        expand: ExpandSelection,
    ) -> Result<Range, Cancelled> {
        let expanded = self.expand_range(selection, expand)?;
        Ok(self.trim_range(expanded))
    }

    /// Shrink `selection` over leading and trailing blank lines.
    pub(crate) fn trim_range(&self, selection: Range) -> Range {
        let selection = self.document.validate_range(selection);
        let (mut start, mut end) = (selection.start.line, selection.end.line);
        while start < end && self.document.is_blank_line(start) {
            start += 1;
        }
        while end > start && self.document.is_blank_line(end) {
            end -= 1;
        }
        self.line_range(start, end)
    }

    fn merge_line_folding(&mut self, line: usize, folding: &mut FoldingState) -> Result<(), Cancelled> {
        self.ensure(line, line)?;
        if let Some(meta) = self.cache.get(line) {
            folding.merge(&meta.folding);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_selection_serde_forms() {
        let disabled: ExpandSelection = serde_yaml::from_str("false").unwrap();
        assert_eq!(disabled, ExpandSelection::Disabled);
        let full: ExpandSelection = serde_yaml::from_str("true").unwrap();
        assert_eq!(full, ExpandSelection::Full);

        let custom: ExpandSelection =
            serde_yaml::from_str("expandOverEmptyLines: true\nfoldingComplete: true").unwrap();
        assert_eq!(
            custom,
            ExpandSelection::Custom(ExpandOptions {
                expand_over_empty_lines: true,
                folding_complete: true,
                ..Default::default()
            })
        );
    }
}
