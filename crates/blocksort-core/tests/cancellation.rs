use blocksort_core::{
    BlockSortConfig, CancellationToken, Direction, ExpandSelection, PendingEdits, Position, Range,
    Session, TextDocument, TextEdit,
};
use pretty_assertions::assert_eq;

const TEXT: &str = "b,\na,\nc";

fn cancelled() -> CancellationToken {
    let token = CancellationToken::new();
    token.cancel();
    token
}

#[test]
fn test_cancelled_get_blocks_returns_nothing() {
    let document = TextDocument::with_language(TEXT, "typescript");
    let mut session = Session::open(BlockSortConfig::default(), "typescript");

    assert!(session.get_blocks(&document, Range::lines(0, 2), &cancelled()).is_empty());
    assert!(session.compute_line_meta(&document, None, &cancelled()).is_empty());
    assert!(!session.cache().is_computed(0, 0));
}

#[test]
fn test_cancelled_sort_leaves_pending_edits_alone() {
    let document = TextDocument::with_language(TEXT, "typescript");
    let mut session = Session::open(BlockSortConfig::default(), "typescript");
    let blocks = session.get_blocks(&document, Range::lines(0, 2), &CancellationToken::new());
    assert_eq!(blocks.len(), 3);

    let edit = TextEdit::new(Range::lines(1, 1), "aa,");
    let mut pending = PendingEdits::from(vec![edit.clone()]);
    let options = session.sort_options(Direction::Asc);

    let sorted = session.sort_blocks(&document, &blocks, &options, &mut pending, &cancelled());
    assert!(sorted.is_empty());
    assert_eq!(pending.into_vec(), vec![edit]);
}

#[test]
fn test_cancelled_edit_and_expansion() {
    let document = TextDocument::with_language(TEXT, "typescript");
    let mut session = Session::open(BlockSortConfig::default(), "typescript");
    let options = session.sort_options(Direction::Asc);
    let caret = Range::caret(Position::new(1, 1));

    let edit = session.block_sort_edit(
        &document,
        caret,
        &options,
        &mut PendingEdits::new(),
        &cancelled(),
    );
    assert_eq!(edit, None);

    let range = session.expand_range(&document, caret, ExpandSelection::Full, &cancelled());
    assert_eq!(range, caret);

    assert!(session.format_edits(&document, None, &cancelled()).is_empty());
}

#[test]
fn test_token_is_shared_between_clones() {
    let token = CancellationToken::new();
    let clone = token.clone();
    assert!(!token.is_cancelled());

    clone.cancel();
    assert!(token.is_cancelled());
}
