#![warn(missing_docs)]
//! Blocksort Core - Heuristic Block Sorting Engine
//!
//! # Overview
//!
//! `blocksort-core` sorts *blocks* of source text instead of single lines. A block is a
//! line together with everything that structurally belongs to it: deeper-indented
//! children, continuation lines, closing brackets, leading comments and decorators.
//! Blocks are found from indentation and bracket balance alone, so the engine works for
//! any language without a parser.
//!
//! The engine is headless: it reads a [`Document`] snapshot and returns replacement
//! [`TextEdit`]s for the host to apply.
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Session (per-document entry points)        │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  Directives (@blocksort, formatting edits)  │
//! ├─────────────────────────────────────────────┤
//! │  Sort Orchestrator + Comparator             │
//! ├─────────────────────────────────────────────┤
//! │  Segmentation + Range Expansion             │
//! ├─────────────────────────────────────────────┤
//! │  Line Metadata Cache                        │
//! ├─────────────────────────────────────────────┤
//! │  Classifier (comments, strings, folding)    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use blocksort_core::{
//!     BlockSortConfig, CancellationToken, Direction, PendingEdits, Position, Range, Session,
//!     TextDocument,
//! };
//!
//! let document = TextDocument::with_language("b,\na,\nc", "typescript");
//! let mut session = Session::open(BlockSortConfig::default(), "typescript");
//! let token = CancellationToken::new();
//!
//! let options = session.sort_options(Direction::Asc);
//! let edit = session
//!     .block_sort_edit(
//!         &document,
//!         Range::caret(Position::new(0, 0)),
//!         &options,
//!         &mut PendingEdits::new(),
//!         &token,
//!     )
//!     .unwrap();
//! assert_eq!(edit.new_text, "a,\nb,\nc");
//! ```
//!
//! # Module Description
//!
//! - [`classifier`] - comment/string stripping and line heuristics
//! - [`line_meta`] - per-line metadata and its incremental cache
//! - [`expand`] - growing a selection to whole blocks
//! - [`sort`] - recursive block sorting
//! - [`compare`] - the block comparator
//! - [`marker`] - `@blocksort` directives
//! - [`session`] - per-document entry points

mod cancel;
pub mod classifier;
pub mod compare;
pub mod config;
pub mod document;
pub mod edit;
mod error;
pub mod expand;
pub mod folding;
pub mod line_ending;
pub mod line_meta;
pub mod marker;
pub mod position;
mod segment;
pub mod session;
pub mod sort;

pub use cancel::CancellationToken;
pub use classifier::Classifier;
pub use compare::{
    CaseFirst, Collate, Collator, CollatorOptions, Direction, Sensitivity, StringSortProvider,
};
pub use config::BlockSortConfig;
pub use document::{Document, TextDocument};
pub use edit::{PendingEdits, TextEdit, merge_edits};
pub use error::{Cancelled, ConfigError, DirectiveError};
pub use expand::{ExpandOptions, ExpandSelection};
pub use folding::{FoldingMode, FoldingState, FoldingTable};
pub use line_ending::LineEnding;
pub use line_meta::{IndentRange, LineMeta, LineMetaCache};
pub use marker::{BlockSortMarker, MarkerOptions};
pub use position::{Position, Range};
pub use session::Session;
pub use sort::{SortDepth, SortOptions};
