//! Text replacements and the pending-edit list threaded through a sort.
//!
//! A [`TextEdit`] is what the engine hands back to the host. [`PendingEdits`] holds edits
//! that were computed earlier (for example by an inner `@blocksort` directive) but not yet
//! applied to the document. The sort orchestrator merges every pending edit that lies
//! inside a block it copies verbatim and removes it from the list, so each edit ends up in
//! exactly one block's output.

use crate::document::Document;
use crate::position::{Position, Range};
use ropey::Rope;

/// A replacement of `range` with `new_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// The replaced range.
    pub range: Range,
    /// The replacement text (lines separated by `'\n'`).
    pub new_text: String,
}

impl TextEdit {
    /// Create a replacement edit.
    pub fn new(range: Range, new_text: impl Into<String>) -> Self {
        Self {
            range,
            new_text: new_text.into(),
        }
    }

    /// Number of lines the replacement text spans.
    pub fn new_line_count(&self) -> usize {
        self.new_text.split('\n').count()
    }
}

/// Edits waiting to be merged into a sort result.
///
/// Consumption is single-owner: [`PendingEdits::take_contained`] removes what it returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingEdits {
    edits: Vec<TextEdit>,
}

impl PendingEdits {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edit.
    pub fn push(&mut self, edit: TextEdit) {
        self.edits.push(edit);
    }

    /// Number of edits still pending.
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Returns `true` if no edits are pending.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Iterate over the pending edits.
    pub fn iter(&self) -> impl Iterator<Item = &TextEdit> {
        self.edits.iter()
    }

    /// Consume the list.
    pub fn into_vec(self) -> Vec<TextEdit> {
        self.edits
    }

    /// Keep only the edits for which `keep` returns `true`.
    pub fn retain(&mut self, keep: impl FnMut(&TextEdit) -> bool) {
        self.edits.retain(keep);
    }

    /// Remove and return every edit lying completely inside `block`, in ascending order.
    ///
    /// Edit ranges are clamped to `document` before the containment test so end-of-line
    /// sentinels compare equal to real line ends.
    pub fn take_contained(&mut self, document: &dyn Document, block: Range) -> Vec<TextEdit> {
        let block = document.validate_range(block);
        let mut taken = Vec::new();
        let mut i = 0;
        while i < self.edits.len() {
            let range = document.validate_range(self.edits[i].range);
            if block.contains(&range) {
                let mut edit = self.edits.remove(i);
                edit.range = range;
                taken.push(edit);
            } else {
                i += 1;
            }
        }
        taken.sort_by_key(|edit| edit.range.start);
        taken
    }

    /// Put back edits that could not be applied.
    pub fn restore(&mut self, edits: impl IntoIterator<Item = TextEdit>) {
        self.edits.extend(edits);
    }
}

impl From<Vec<TextEdit>> for PendingEdits {
    fn from(edits: Vec<TextEdit>) -> Self {
        Self { edits }
    }
}

/// Apply `edits` (ascending, non-overlapping, inside `block`) to `block_text`.
///
/// `block_text` must be the document text of `block`. Returns the edited text and the
/// edits that overlap an earlier one and were therefore left unapplied.
pub fn merge_edits(
    block: Range,
    block_text: &str,
    edits: Vec<TextEdit>,
) -> (String, Vec<TextEdit>) {
    if edits.is_empty() {
        return (block_text.to_string(), edits);
    }

    let original = Rope::from_str(block_text);
    let offset_of = |position: Position| -> usize {
        let line = position.line.saturating_sub(block.start.line);
        if line >= original.len_lines() {
            return original.len_chars();
        }
        let line_start = original.line_to_char(line);
        let slice = original.line(line);
        let mut line_len = slice.len_chars();
        if line_len > 0 && slice.char(line_len - 1) == '\n' {
            line_len -= 1;
        }
        let column = if line == 0 {
            position.character.saturating_sub(block.start.character)
        } else {
            position.character
        };
        line_start + column.min(line_len)
    };

    let mut rope = original.clone();
    let mut rejected = Vec::new();
    let mut applied_end = 0usize;
    let mut shift: isize = 0;

    for (index, edit) in edits.into_iter().enumerate() {
        let start = offset_of(edit.range.start);
        let end = offset_of(edit.range.end).max(start);
        if index > 0 && start < applied_end {
            rejected.push(edit);
            continue;
        }

        let from = start.saturating_add_signed(shift);
        let to = end.saturating_add_signed(shift);
        if from < to {
            rope.remove(from..to);
        }
        rope.insert(from, &edit.new_text);

        let inserted = edit.new_text.chars().count() as isize;
        shift += inserted - (end - start) as isize;
        applied_end = end;
    }

    (rope.to_string(), rejected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TextDocument;

    #[test]
    fn test_take_contained_consumes_edits() {
        let doc = TextDocument::new("a\nb\nc\nd");
        let mut pending = PendingEdits::from(vec![
            TextEdit::new(Range::lines(2, 2), "C"),
            TextEdit::new(Range::lines(0, 0), "A"),
            TextEdit::new(Range::lines(3, 3), "D"),
        ]);

        let taken = pending.take_contained(&doc, Range::lines(0, 2));
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[0].new_text, "A");
        assert_eq!(taken[1].new_text, "C");
        assert_eq!(pending.len(), 1);

        assert!(pending.take_contained(&doc, Range::lines(0, 2)).is_empty());
    }

    #[test]
    fn test_merge_edits_tracks_offsets() {
        let block = Range::from_coords(1, 0, 3, 1);
        let edits = vec![
            TextEdit::new(Range::from_coords(1, 0, 1, 1), "xx\nyy"),
            TextEdit::new(Range::from_coords(3, 0, 3, 1), "z"),
        ];
        let (text, rejected) = merge_edits(block, "a\nb\nc", edits);
        assert_eq!(text, "xx\nyy\nb\nz");
        assert!(rejected.is_empty());
    }

    #[test]
    fn test_merge_edits_rejects_overlap() {
        let block = Range::lines(0, 1);
        let edits = vec![
            TextEdit::new(Range::from_coords(0, 0, 1, 1), "X"),
            TextEdit::new(Range::from_coords(1, 0, 1, 1), "Y"),
        ];
        let (text, rejected) = merge_edits(block, "a\nb", edits);
        assert_eq!(text, "X");
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].new_text, "Y");
    }
}
