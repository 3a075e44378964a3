//! Per-line metadata and its incremental cache.
//!
//! [`LineMetaCache`] memoizes a [`LineMeta`] per document line together with a sorted,
//! disjoint list of computed line spans. Lines inside a computed span are trusted as-is;
//! edits must be reported through [`LineMetaCache::invalidate`], which splices the cache
//! and shifts later spans.

use crate::cancel::CancellationToken;
use crate::classifier::Classifier;
use crate::document::Document;
use crate::error::Cancelled;
use crate::folding::FoldingState;

/// Facts about a single line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineMeta {
    /// Indentation in tab-width units.
    pub indent: f64,
    /// Folding delta of this line alone.
    pub folding: FoldingState,
    /// The line may separate blocks.
    pub valid: bool,
    /// The line has non-comment, non-whitespace content.
    pub has_content: bool,
    /// The line's indentation is ignored for boundary decisions.
    pub ignore_indent: bool,
    /// The line closes a structurally complete block.
    pub complete: bool,
    /// The line continues into the next one.
    pub incomplete: bool,
    /// The line is one label of a `case`/`when` cluster.
    pub multi_block_header: bool,
    /// Raw text the facts were computed from.
    pub text: String,
}

impl LineMeta {
    /// Classify `text`.
    pub fn compute(classifier: &Classifier, text: &str) -> Self {
        Self {
            indent: classifier.indent(text),
            folding: classifier.line_folding(text),
            valid: classifier.is_valid_line(text),
            has_content: classifier.has_content(text),
            ignore_indent: classifier.is_indent_ignore_line(text),
            complete: classifier.is_complete_block(text),
            incomplete: classifier.is_incomplete_block(text),
            multi_block_header: classifier.is_multi_block_header(text),
            text: text.to_string(),
        }
    }

    /// Returns `true` if the line is empty or whitespace-only.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Minimum and maximum indentation of a set of lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndentRange {
    /// Smallest indentation.
    pub min: f64,
    /// Largest indentation.
    pub max: f64,
}

/// Indent range over `lines`.
///
/// Blank lines never count. With `check_ignore`, indent-ignore lines are skipped unless
/// they are the first or last line of the set. Returns `None` when nothing counts.
pub fn indent_range(lines: &[&LineMeta], check_ignore: bool) -> Option<IndentRange> {
    let last = lines.len().checked_sub(1)?;
    let mut range: Option<IndentRange> = None;
    for (index, meta) in lines.iter().enumerate() {
        if meta.is_blank() {
            continue;
        }
        if check_ignore && meta.ignore_indent && index != 0 && index != last {
            continue;
        }
        range = Some(match range {
            None => IndentRange {
                min: meta.indent,
                max: meta.indent,
            },
            Some(current) => IndentRange {
                min: current.min.min(meta.indent),
                max: current.max.max(meta.indent),
            },
        });
    }
    range
}

/// An inclusive span of line numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    /// First line.
    pub start: usize,
    /// Last line (inclusive).
    pub end: usize,
}

impl LineSpan {
    /// Create a span, swapping the bounds if needed.
    pub fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Check if this span contains `other`.
    pub fn contains(&self, other: &LineSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Check if two spans overlap or touch.
    pub fn touches(&self, other: &LineSpan) -> bool {
        self.start <= other.end.saturating_add(1) && other.start <= self.end.saturating_add(1)
    }
}

/// Sorted, disjoint, coalesced list of computed line spans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputedLines {
    spans: Vec<LineSpan>,
}

impl ComputedLines {
    /// The computed spans in ascending order.
    pub fn spans(&self) -> &[LineSpan] {
        &self.spans
    }

    /// Returns `true` if a single span contains `span`.
    pub fn contains(&self, span: LineSpan) -> bool {
        self.spans.iter().any(|computed| computed.contains(&span))
    }

    /// Mark `span` as computed, merging it with overlapping or adjacent spans.
    pub fn add(&mut self, span: LineSpan) {
        let mut merged = span;
        let mut result = Vec::with_capacity(self.spans.len() + 1);
        let mut inserted = false;
        for computed in self.spans.drain(..) {
            if computed.touches(&merged) {
                merged = LineSpan::new(merged.start.min(computed.start), merged.end.max(computed.end));
            } else if computed.end < merged.start {
                result.push(computed);
            } else {
                if !inserted {
                    result.push(merged);
                    inserted = true;
                }
                result.push(computed);
            }
        }
        if !inserted {
            result.push(merged);
        }
        self.spans = result;
    }

    /// Forget lines `start..=end` and shift later spans by `delta` lines.
    pub fn remove_and_shift(&mut self, start: usize, end: usize, delta: isize) {
        let shift = |line: usize| line.saturating_add_signed(delta);
        let mut result = Vec::with_capacity(self.spans.len() + 1);
        for span in self.spans.drain(..) {
            if span.end < start {
                result.push(span);
            } else if span.start > end {
                result.push(LineSpan::new(shift(span.start), shift(span.end)));
            } else {
                if span.start < start {
                    result.push(LineSpan::new(span.start, start - 1));
                }
                if span.end > end {
                    result.push(LineSpan::new(shift(end + 1), shift(span.end)));
                }
            }
        }
        self.spans = result;
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.spans.clear();
    }
}

/// Lazily computed line metadata of one document.
#[derive(Debug, Default)]
pub struct LineMetaCache {
    lines: Vec<Option<LineMeta>>,
    computed: ComputedLines,
}

impl LineMetaCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The computed line spans.
    pub fn computed(&self) -> &ComputedLines {
        &self.computed
    }

    /// Returns `true` if lines `start..=end` were computed and not invalidated since.
    pub fn is_computed(&self, start: usize, end: usize) -> bool {
        self.computed.contains(LineSpan::new(start, end))
    }

    /// Cached metadata of `line`, if present.
    pub fn get(&self, line: usize) -> Option<&LineMeta> {
        self.lines.get(line).and_then(Option::as_ref)
    }

    /// Make sure lines `start..=end` (clamped) are computed.
    ///
    /// Only lines outside the computed spans are read from `document`. On cancellation
    /// nothing computed by this call is stored.
    pub fn ensure(
        &mut self,
        document: &dyn Document,
        classifier: &Classifier,
        start: usize,
        end: usize,
        token: &CancellationToken,
    ) -> Result<(), Cancelled> {
        let line_count = document.line_count();
        if line_count == 0 {
            return Ok(());
        }
        if self.lines.len() != line_count {
            self.lines.resize(line_count, None);
        }
        let end = end.min(line_count - 1);
        let start = start.min(end);
        let span = LineSpan::new(start, end);
        if self.computed.contains(span) {
            return Ok(());
        }

        let mut fresh = Vec::new();
        for line in start..=end {
            token.check()?;
            if self.lines[line].is_some() && self.computed.contains(LineSpan::new(line, line)) {
                continue;
            }
            let text = document.line_text(line).unwrap_or_default();
            fresh.push((line, LineMeta::compute(classifier, &text)));
        }

        if !fresh.is_empty() {
            tracing::trace!(start, end, recomputed = fresh.len(), "computed line meta");
        }
        for (line, meta) in fresh {
            self.lines[line] = Some(meta);
        }
        self.computed.add(span);
        Ok(())
    }

    /// Ensure and return the metadata of `start..=end` (clamped).
    pub fn range(
        &mut self,
        document: &dyn Document,
        classifier: &Classifier,
        start: usize,
        end: usize,
        token: &CancellationToken,
    ) -> Result<Vec<&LineMeta>, Cancelled> {
        self.ensure(document, classifier, start, end, token)?;
        let end = end.min(self.lines.len().saturating_sub(1));
        Ok((start.min(end)..=end).filter_map(|line| self.get(line)).collect())
    }

    /// Account for an edit replacing lines `first..=last` with `new_line_count` lines.
    pub fn invalidate(&mut self, first: usize, last: usize, new_line_count: usize) {
        let (first, last) = (first.min(last), first.max(last));
        let old_line_count = last - first + 1;
        let delta = new_line_count as isize - old_line_count as isize;

        if first < self.lines.len() {
            let end = (last + 1).min(self.lines.len());
            self.lines
                .splice(first..end, std::iter::repeat_n(None, new_line_count));
        }
        self.computed.remove_and_shift(first, last, delta);
        tracing::trace!(first, last, new_line_count, "invalidated line meta");
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.computed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BlockSortConfig;
    use crate::document::TextDocument;

    fn classifier() -> Classifier {
        Classifier::new(&BlockSortConfig::default(), "typescript").0
    }

    #[test]
    fn test_computed_lines_coalesce() {
        let mut computed = ComputedLines::default();
        computed.add(LineSpan::new(5, 7));
        computed.add(LineSpan::new(0, 1));
        computed.add(LineSpan::new(10, 12));
        assert_eq!(computed.spans().len(), 3);

        computed.add(LineSpan::new(2, 4));
        assert_eq!(
            computed.spans(),
            &[LineSpan::new(0, 7), LineSpan::new(10, 12)]
        );
        assert!(computed.contains(LineSpan::new(3, 6)));
        assert!(!computed.contains(LineSpan::new(6, 10)));
    }

    #[test]
    fn test_remove_and_shift_splits_spans() {
        let mut computed = ComputedLines::default();
        computed.add(LineSpan::new(0, 9));
        computed.add(LineSpan::new(20, 25));

        // Lines 4..=5 replaced by four lines.
        computed.remove_and_shift(4, 5, 2);
        assert_eq!(
            computed.spans(),
            &[
                LineSpan::new(0, 3),
                LineSpan::new(8, 11),
                LineSpan::new(22, 27)
            ]
        );
    }

    #[test]
    fn test_indent_range_skips_blank_and_ignored_lines() {
        let c = classifier();
        let metas: Vec<LineMeta> = ["  a", "{", "", "        b", "  }"]
            .iter()
            .map(|line| LineMeta::compute(&c, line))
            .collect();
        let refs: Vec<&LineMeta> = metas.iter().collect();

        let range = indent_range(&refs, true).unwrap();
        assert_eq!(range.min, 0.5);
        assert_eq!(range.max, 2.0);

        let unchecked = indent_range(&refs, false).unwrap();
        assert_eq!(unchecked.min, 0.0);
        assert!(indent_range(&[], true).is_none());
    }

    #[test]
    fn test_cache_recomputes_only_invalidated_lines() {
        let c = classifier();
        let token = CancellationToken::new();
        let mut cache = LineMetaCache::new();
        let mut doc = TextDocument::new("a\nif x\nb");

        cache.ensure(&doc, &c, 0, 2, &token).unwrap();
        assert!(cache.is_computed(0, 2));
        assert!(cache.get(1).unwrap().incomplete);

        let edit = crate::edit::TextEdit::new(crate::position::Range::lines(1, 1), "y");
        doc.apply_edit(&edit);

        // Computed lines are served from the cache until the edit is reported.
        let metas = cache.range(&doc, &c, 1, 1, &token).unwrap();
        assert_eq!(metas[0].text, "if x");

        cache.invalidate(1, 1, 1);
        assert!(!cache.is_computed(0, 2));
        let metas = cache.range(&doc, &c, 0, 2, &token).unwrap();
        assert!(!metas[1].incomplete);
        assert_eq!(metas[1].text, "y");
        assert_eq!(metas[0].text, "a");
        assert!(cache.is_computed(0, 2));
    }

    #[test]
    fn test_invalidate_splices_lines() {
        let c = classifier();
        let token = CancellationToken::new();
        let mut cache = LineMetaCache::new();
        let doc = TextDocument::new("a\nb\nc\nd");
        cache.ensure(&doc, &c, 0, 3, &token).unwrap();

        cache.invalidate(1, 2, 3);
        assert!(cache.get(1).is_none());
        assert!(cache.get(3).is_none());
        assert_eq!(cache.get(4).map(|meta| meta.text.as_str()), Some("d"));
        assert!(cache.is_computed(0, 0));
        assert!(cache.is_computed(4, 4));
        assert!(!cache.is_computed(0, 4));
    }

    #[test]
    fn test_cancelled_ensure_stores_nothing() {
        let c = classifier();
        let token = CancellationToken::new();
        token.cancel();
        let mut cache = LineMetaCache::new();
        let doc = TextDocument::new("a\nb");

        assert!(cache.ensure(&doc, &c, 0, 1, &token).is_err());
        assert!(cache.get(0).is_none());
        assert!(!cache.is_computed(0, 1));
    }
}
