//! Read-only document access.
//!
//! The engine never mutates a document: it reads lines through the [`Document`] trait and
//! returns `(range, text)` replacements for the host to apply. [`TextDocument`] is a
//! rope-backed implementation for hosts (and tests) that do not bring their own buffer.

use crate::edit::TextEdit;
use crate::line_ending::LineEnding;
use crate::position::{Position, Range};
use ropey::Rope;

/// A line-addressed text snapshot.
pub trait Document {
    /// Number of lines (an empty document has one empty line).
    fn line_count(&self) -> usize;

    /// Text of `line` without its line break, or `None` if out of bounds.
    fn line_text(&self, line: usize) -> Option<String>;

    /// Length of `line` in characters (0 if out of bounds).
    fn line_len(&self, line: usize) -> usize {
        self.line_text(line).map_or(0, |text| text.chars().count())
    }

    /// Returns `true` if `line` is empty or whitespace-only (or out of bounds).
    fn is_blank_line(&self, line: usize) -> bool {
        self.line_text(line)
            .is_none_or(|text| text.trim().is_empty())
    }

    /// Clamp a position to the document.
    fn validate_position(&self, position: Position) -> Position {
        let line_count = self.line_count();
        if line_count == 0 {
            return Position::new(0, 0);
        }
        if position.line >= line_count {
            let last = line_count - 1;
            return Position::new(last, self.line_len(last));
        }
        Position::new(
            position.line,
            position.character.min(self.line_len(position.line)),
        )
    }

    /// Clamp a range to the document.
    fn validate_range(&self, range: Range) -> Range {
        Range::new(
            self.validate_position(range.start),
            self.validate_position(range.end),
        )
    }

    /// Text covered by `range`, lines joined with `'\n'`.
    fn text_in_range(&self, range: Range) -> String {
        let range = self.validate_range(range);
        let mut out = String::new();
        for line in range.start.line..=range.end.line {
            let Some(text) = self.line_text(line) else {
                break;
            };
            let from = if line == range.start.line {
                range.start.character
            } else {
                0
            };
            let to = if line == range.end.line {
                range.end.character
            } else {
                usize::MAX
            };
            if line > range.start.line {
                out.push('\n');
            }
            out.extend(text.chars().skip(from).take(to.saturating_sub(from)));
        }
        out
    }
}

/// Rope-backed [`Document`] implementation.
///
/// Text is normalized to LF on load; the detected [`LineEnding`] is kept for saving.
#[derive(Debug, Clone)]
pub struct TextDocument {
    rope: Rope,
    line_ending: LineEnding,
    language_id: String,
}

impl TextDocument {
    /// Build a plain-text document.
    pub fn new(text: &str) -> Self {
        Self::with_language(text, "plaintext")
    }

    /// Build a document tagged with a language id (e.g. `typescript`).
    pub fn with_language(text: &str, language_id: impl Into<String>) -> Self {
        Self {
            rope: Rope::from_str(&LineEnding::normalize(text)),
            line_ending: LineEnding::detect_in_text(text),
            language_id: language_id.into(),
        }
    }

    /// The language id used to select marker tables.
    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    /// The line ending detected when the document was loaded.
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Complete LF-normalized text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Complete text converted back to the detected line ending.
    pub fn text_for_saving(&self) -> String {
        self.line_ending.apply_to_text(&self.text())
    }

    /// Get character offset from a (clamped) position.
    pub fn position_to_char_offset(&self, position: Position) -> usize {
        let position = self.validate_position(position);
        if position.line >= self.rope.len_lines() {
            return self.rope.len_chars();
        }
        self.rope.line_to_char(position.line) + position.character
    }

    /// Apply a replacement, returning the number of lines the edited region now spans.
    pub fn apply_edit(&mut self, edit: &TextEdit) -> usize {
        let start = self.position_to_char_offset(edit.range.start);
        let end = self.position_to_char_offset(edit.range.end);
        let text = LineEnding::normalize(&edit.new_text);

        if start < end {
            self.rope.remove(start..end);
        }
        self.rope.insert(start, &text);
        text.split('\n').count()
    }
}

impl Document for TextDocument {
    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn line_text(&self, line: usize) -> Option<String> {
        if line >= self.rope.len_lines() {
            return None;
        }

        let mut text = self.rope.line(line).to_string();
        // Rope's line() includes the trailing newline
        if text.ends_with('\n') {
            text.pop();
        }
        Some(text)
    }

    fn line_len(&self, line: usize) -> usize {
        if line >= self.rope.len_lines() {
            return 0;
        }
        let slice = self.rope.line(line);
        let len = slice.len_chars();
        if len > 0 && slice.char(len - 1) == '\n' {
            len - 1
        } else {
            len
        }
    }
}
