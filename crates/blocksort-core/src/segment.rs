//! Block segmentation.
//!
//! A line starts a new block when the accumulated block has seen a valid and a content
//! line, the line itself is not blank, the last content line was not incomplete, the
//! line is not indent-ignorable (unless the last content line was complete), its indent
//! equals the first line's indent, and all folding is closed. Trailing blank lines belong
//! to the previous block.

use crate::error::Cancelled;
use crate::line_meta::{LineMeta, indent_range};
use crate::position::Range;
use crate::session::Engine;

impl Engine<'_> {
    /// Split `range` into sibling blocks.
    pub(crate) fn get_blocks(&mut self, range: Range) -> Result<Vec<Range>, Cancelled> {
        self.token.check()?;
        let range = self.document.validate_range(range);
        let (first, last) = (range.start.line, range.end.line);
        self.ensure(first, last)?;

        let Some(start) = self.cache.get(first) else {
            return Ok(Vec::new());
        };
        let indent = start.indent;
        let mut valid = start.valid;
        let mut has_content = start.has_content;
        let mut complete = start.complete;
        let mut incomplete = start.incomplete;
        let mut folding = start.folding.clone();

        let mut blocks = Vec::new();
        let mut block_start = first;
        for line in first + 1..=last {
            self.token.check()?;
            let Some(meta) = self.cache.get(line) else {
                break;
            };

            let starts_block = valid
                && has_content
                && !meta.is_blank()
                && !incomplete
                && (!meta.ignore_indent || complete)
                && meta.indent == indent
                && !folding.has_open();
            if starts_block {
                blocks.push(self.line_range(block_start, line - 1));
                block_start = line;
                valid = false;
                has_content = false;
                complete = false;
                incomplete = false;
            }

            valid |= meta.valid;
            if meta.has_content {
                has_content = true;
                complete = meta.complete;
                incomplete = meta.incomplete;
            }
            folding.merge(&meta.folding);
        }

        let remaining = self.line_range(block_start, last);
        let remaining_blank = (block_start..=last)
            .all(|line| self.cache.get(line).is_none_or(LineMeta::is_blank));
        if !remaining_blank {
            blocks.push(remaining);
        } else if let Some(previous) = blocks.last_mut() {
            previous.end = remaining.end;
        }

        tracing::trace!(first, last, blocks = blocks.len(), "segmented range");
        Ok(blocks)
    }

    /// Blocks one indentation level inside `block` (empty for leaf blocks).
    ///
    /// Header lines at the block's minimum indent are skipped; the contiguous run of
    /// deeper lines after them (blank lines included) is segmented. The run ends at the
    /// next line at minimum indent.
    pub(crate) fn get_inner_blocks(&mut self, block: Range) -> Result<Vec<Range>, Cancelled> {
        let block = self.document.validate_range(block);
        let (first, last) = (block.start.line, block.end.line);
        self.ensure(first, last)?;

        let metas: Vec<&LineMeta> = (first..=last)
            .filter_map(|line| self.cache.get(line))
            .collect();
        let Some(indent) = indent_range(&metas, true) else {
            return Ok(Vec::new());
        };

        let mut run: Option<(usize, usize)> = None;
        for (offset, meta) in metas.iter().enumerate() {
            self.token.check()?;
            let line = first + offset;
            if meta.is_blank() {
                continue;
            }
            if meta.indent <= indent.min {
                if run.is_some() {
                    break;
                }
                continue;
            }
            run = Some(run.map_or((line, line), |(start, _)| (start, line)));
        }

        match run {
            Some((start, end)) => self.get_blocks(Range::lines(start, end)),
            None => Ok(Vec::new()),
        }
    }
}
