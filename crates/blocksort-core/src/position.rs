//! Line/character coordinates.
//!
//! All offsets are zero-based and expressed in characters (Unicode scalar values).
//! [`Position::EOL`] as a character offset means "end of line"; documents clamp it to the
//! real line length in [`Document::validate_range`](crate::Document::validate_range).

use std::cmp::Ordering;

/// Position coordinates (line and character offset)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// Zero-based line index.
    pub line: usize,
    /// Zero-based character offset within the line.
    pub character: usize,
}

impl Position {
    /// Sentinel character offset meaning "end of line".
    pub const EOL: usize = usize::MAX;

    /// Create a new position.
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }

    /// Position at the end of `line`.
    pub fn end_of_line(line: usize) -> Self {
        Self::new(line, Self::EOL)
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then_with(|| self.character.cmp(&other.character))
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// An ordered pair of positions (`start <= end`), half-open in the character dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    /// Inclusive start position.
    pub start: Position,
    /// Exclusive end position.
    pub end: Position,
}

impl Range {
    /// Create a range, swapping the endpoints if they are out of order.
    pub fn new(a: Position, b: Position) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// Shorthand for `Range::new(Position::new(..), Position::new(..))`.
    pub fn from_coords(
        start_line: usize,
        start_character: usize,
        end_line: usize,
        end_character: usize,
    ) -> Self {
        Self::new(
            Position::new(start_line, start_character),
            Position::new(end_line, end_character),
        )
    }

    /// A range covering whole lines `start_line..=end_line`.
    pub fn lines(start_line: usize, end_line: usize) -> Self {
        Self::new(
            Position::new(start_line, 0),
            Position::end_of_line(end_line),
        )
    }

    /// An empty range at `position` (a cursor).
    pub fn caret(position: Position) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    /// Returns `true` if start and end are the same position.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns `true` if the range covers a single line.
    pub fn is_single_line(&self) -> bool {
        self.start.line == self.end.line
    }

    /// Number of lines touched by the range.
    pub fn line_count(&self) -> usize {
        self.end.line - self.start.line + 1
    }

    /// Returns `true` if `other` lies completely inside this range.
    pub fn contains(&self, other: &Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Returns `true` if `position` lies inside this range (end inclusive).
    pub fn contains_position(&self, position: Position) -> bool {
        self.start <= position && position <= self.end
    }

    /// The overlapping part of two ranges, if any (touching ranges intersect empty).
    pub fn intersection(&self, other: &Range) -> Option<Range> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(Range { start, end })
    }

    /// The smallest range containing both ranges.
    pub fn union(&self, other: &Range) -> Range {
        Range {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Returns `true` if the two ranges share at least one character.
    pub fn overlaps(&self, other: &Range) -> bool {
        self.start < other.end && other.start < self.end
    }
}
