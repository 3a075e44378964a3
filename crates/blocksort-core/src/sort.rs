//! Recursive block sorting.
//!
//! Each level turns its blocks into texts (recursing into inner blocks while the depth
//! budget lasts), then sorts them:
//!
//! 1. leading `case`/`when` header lines of every block are sorted on their own;
//! 2. trailing newlines are taken off and later re-appended by position;
//! 3. the separator shared by all blocks but the last is removed, and a different
//!    separator on the last block is floated aside;
//! 4. blocks are stable-sorted by force rank (first, normal, last) and then by the
//!    comparator, or shuffled for [`Direction::Rand`];
//! 5. separators are re-applied to all blocks but the new last one, which gets the
//!    floated separator back.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::compare::{Direction, StringSortProvider};
use crate::edit::{PendingEdits, merge_edits};
use crate::error::Cancelled;
use crate::expand::ExpandSelection;
use crate::line_ending::split_newline_suffix;
use crate::position::Range;
use crate::session::Engine;

/// How deep nested blocks are sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDepth {
    /// Sort this many levels of children (`0` sorts only the given blocks).
    Limited(usize),
    /// Recurse until blocks stop subdividing.
    Unbounded,
}

impl SortDepth {
    /// Convert the `-1 = unbounded` integer convention.
    pub fn from_i64(depth: i64) -> Self {
        usize::try_from(depth).map_or(Self::Unbounded, Self::Limited)
    }

    /// Returns `true` if children are not sorted.
    pub fn is_zero(self) -> bool {
        self == Self::Limited(0)
    }

    /// The depth budget one level down.
    pub fn decrement(self) -> Self {
        match self {
            Self::Limited(depth) => Self::Limited(depth.saturating_sub(1)),
            Self::Unbounded => Self::Unbounded,
        }
    }
}

impl Default for SortDepth {
    fn default() -> Self {
        Self::Limited(0)
    }
}

/// Options of a sort call.
#[derive(Debug, Clone)]
pub struct SortOptions {
    /// Comparator, including the sort direction.
    pub sorter: StringSortProvider,
    /// Depth of nested sorting.
    pub depth: SortDepth,
    /// Number of outer levels left unsorted.
    pub skip_parents: usize,
    /// Expansion applied by [`Session::block_sort_edit`](crate::Session::block_sort_edit).
    pub expand: ExpandSelection,
    /// Seed for [`Direction::Rand`]; `None` uses entropy.
    pub seed: Option<u64>,
}

impl SortOptions {
    /// Top-level-only sort with full expansion.
    pub fn new(sorter: StringSortProvider) -> Self {
        Self {
            sorter,
            depth: SortDepth::default(),
            skip_parents: 0,
            expand: ExpandSelection::Full,
            seed: None,
        }
    }

    /// Set the nesting depth.
    pub fn with_depth(mut self, depth: SortDepth) -> Self {
        self.depth = depth;
        self
    }

    /// Set the number of skipped outer levels.
    pub fn with_skip_parents(mut self, skip_parents: usize) -> Self {
        self.skip_parents = skip_parents;
        self
    }

    /// Set the expansion mode.
    pub fn with_expand(mut self, expand: ExpandSelection) -> Self {
        self.expand = expand;
        self
    }

    /// Set the shuffle seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Force rank: force-first blocks, normal blocks, force-last blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Rank {
    First,
    Normal,
    Last,
}

struct Entry {
    rank: Rank,
    key: String,
    text: String,
}

struct Level {
    depth: SortDepth,
    skip_parents: usize,
    nesting: usize,
}

impl Engine<'_> {
    /// Sort `blocks` and return their texts in the new order.
    pub(crate) fn sort_blocks(
        &mut self,
        blocks: &[Range],
        options: &SortOptions,
        pending: &mut PendingEdits,
    ) -> Result<Vec<String>, Cancelled> {
        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let level = Level {
            depth: options.depth,
            skip_parents: options.skip_parents,
            nesting: 0,
        };
        let sorted = self.sort_level(blocks, options, &level, pending, &mut rng)?;
        tracing::debug!(
            blocks = blocks.len(),
            direction = %options.sorter.direction(),
            depth = ?options.depth,
            skip_parents = options.skip_parents,
            "sorted blocks"
        );
        Ok(sorted)
    }

    fn sort_level(
        &mut self,
        blocks: &[Range],
        options: &SortOptions,
        level: &Level,
        pending: &mut PendingEdits,
        rng: &mut StdRng,
    ) -> Result<Vec<String>, Cancelled> {
        let mut texts = Vec::with_capacity(blocks.len());
        for block in blocks {
            self.token.check()?;
            texts.push(self.sort_inner_blocks(*block, options, level, pending, rng)?);
        }

        if level.skip_parents > 0 {
            return Ok(texts);
        }

        if self.config.sort_consecutive_block_headers {
            for text in &mut texts {
                self.token.check()?;
                *text = self.sort_block_headers(text, options, rng);
            }
        }

        let suffixes: Vec<&'static str> = if self.config.keep_appended_newlines {
            texts.iter_mut().map(take_newline_suffix).collect()
        } else {
            vec![""; texts.len()]
        };

        let mut separator = if texts.len() > 1 {
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            self.classifier.block_separator(&refs, true)
        } else {
            None
        };
        let mut floated = None;
        if let (Some(sep), Some(last)) = (separator, texts.last_mut()) {
            if last.ends_with(sep) {
                separator = None;
            } else if let Some(other) = last.chars().last().filter(|c| self.classifier.is_separator(*c)) {
                last.pop();
                floated = Some(other);
            }
        }
        if let Some(sep) = separator {
            let count = texts.len() - 1;
            for text in &mut texts[..count] {
                if text.ends_with(sep) {
                    text.pop();
                }
            }
        }

        self.token.check()?;
        self.apply_sort(&mut texts, options, rng);

        if let Some(sep) = separator {
            let count = texts.len() - 1;
            for text in &mut texts[..count] {
                text.push(sep);
            }
        }
        if let (Some(other), Some(last)) = (floated, texts.last_mut()) {
            last.push(other);
        }
        for (text, suffix) in texts.iter_mut().zip(suffixes) {
            text.push_str(suffix);
        }

        tracing::trace!(
            nesting = level.nesting,
            blocks = texts.len(),
            separator = ?separator,
            floated = ?floated,
            "sorted level"
        );
        Ok(texts)
    }

    fn sort_inner_blocks(
        &mut self,
        block: Range,
        options: &SortOptions,
        level: &Level,
        pending: &mut PendingEdits,
        rng: &mut StdRng,
    ) -> Result<String, Cancelled> {
        let block = self.document.validate_range(block);
        if level.depth.is_zero()
            || block.is_single_line()
            || level.nesting >= self.document.line_count()
        {
            return self.edited_text(block, pending);
        }

        let mut inner = self.get_inner_blocks(block)?;
        if let Some(first) = inner.first_mut() {
            first.start = first.start.max(block.start);
        }
        if let Some(last) = inner.last_mut() {
            last.end = last.end.min(block.end);
        }
        let (Some(first), Some(last)) = (inner.first(), inner.last()) else {
            return self.edited_text(block, pending);
        };
        let head = Range::new(block.start, first.start);
        let tail = Range::new(last.end, block.end);

        let child = Level {
            depth: level.depth.decrement(),
            skip_parents: level.skip_parents.saturating_sub(1),
            nesting: level.nesting + 1,
        };
        let head_text = self.edited_text(head, pending)?;
        let sorted = self.sort_level(&inner, options, &child, pending, rng)?;
        let tail_text = self.edited_text(tail, pending)?;

        Ok(format!("{head_text}{}{tail_text}", sorted.join("\n")))
    }

    /// Text of `range` with every pending edit inside it applied (and consumed).
    fn edited_text(&mut self, range: Range, pending: &mut PendingEdits) -> Result<String, Cancelled> {
        self.token.check()?;
        let text = self.document.text_in_range(range);
        let edits = pending.take_contained(self.document, range);
        if edits.is_empty() {
            return Ok(text);
        }

        let applied = edits.len();
        let range = self.document.validate_range(range);
        let (merged, rejected) = merge_edits(range, &text, edits);
        if !rejected.is_empty() {
            tracing::debug!(
                line = range.start.line,
                rejected = rejected.len(),
                "overlapping pending edits left unapplied"
            );
            pending.restore(rejected);
        }
        tracing::trace!(line = range.start.line, applied, "merged pending edits");
        Ok(merged)
    }

    fn sort_block_headers(&self, text: &str, options: &SortOptions, rng: &mut StdRng) -> String {
        let lines: Vec<&str> = text.split('\n').collect();
        let count = lines
            .iter()
            .take_while(|line| !line.is_empty() && self.classifier.is_multi_block_header(line))
            .count();
        if count < 2 {
            return text.to_string();
        }

        let mut headers: Vec<String> = lines[..count].iter().map(|line| line.to_string()).collect();
        self.apply_sort(&mut headers, options, rng);
        headers.extend(lines[count..].iter().map(|line| line.to_string()));
        headers.join("\n")
    }

    fn apply_sort(&self, texts: &mut Vec<String>, options: &SortOptions, rng: &mut StdRng) {
        let mut entries: Vec<Entry> = texts
            .drain(..)
            .map(|text| {
                let rank = if self.classifier.is_force_first_block(&text) {
                    Rank::First
                } else if self.classifier.is_force_last_block(&text) {
                    Rank::Last
                } else {
                    Rank::Normal
                };
                Entry {
                    rank,
                    key: self.classifier.sort_key(&text),
                    text,
                }
            })
            .collect();

        if options.sorter.direction() == Direction::Rand {
            entries.shuffle(rng);
        }
        entries.sort_by(|a, b| {
            a.rank.cmp(&b.rank).then_with(|| {
                if a.rank == Rank::Normal {
                    options.sorter.compare(&a.key, &b.key)
                } else {
                    std::cmp::Ordering::Equal
                }
            })
        });

        texts.extend(entries.into_iter().map(|entry| entry.text));
    }
}

fn take_newline_suffix(text: &mut String) -> &'static str {
    let suffix = match split_newline_suffix(text).1 {
        "\r\n" => "\r\n",
        "\n" => "\n",
        _ => "",
    };
    text.truncate(text.len() - suffix.len());
    suffix
}
