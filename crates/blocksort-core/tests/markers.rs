use blocksort_core::{
    BlockSortConfig, CancellationToken, Direction, DirectiveError, Position, Range, Session,
    SortDepth, TextDocument,
};
use pretty_assertions::assert_eq;

const LIST: &str = "// @blocksort\nconst list = [\n  'b',\n  'a',\n];";

const NESTED: &str = "\
// @blocksort
const groups = {
  beta: [
    'z',
    'x',
  ],
  // @blocksort desc
  alpha: [
    'a',
    'b',
  ],
};";

fn open(text: &str) -> (TextDocument, Session) {
    (
        TextDocument::with_language(text, "typescript"),
        Session::open(BlockSortConfig::default(), "typescript"),
    )
}

#[test]
fn test_marker_at_parses_directive() {
    let (document, session) = open(NESTED);

    let outer = session.marker_at(&document, 0).unwrap();
    assert_eq!(outer.direction, Direction::Asc);
    assert_eq!(outer.depth, SortDepth::Limited(0));

    let inner = session.marker_at(&document, 6).unwrap();
    assert_eq!(inner.direction, Direction::Desc);

    assert_eq!(
        session.marker_at(&document, 1),
        Err(DirectiveError::Missing(1))
    );
}

#[test]
fn test_markers_annotate_next_deeper_line() {
    let (document, mut session) = open(NESTED);
    let token = CancellationToken::new();

    let markers = session.block_sort_markers(&document, None, &token);
    let found: Vec<(usize, Option<Position>)> = markers
        .iter()
        .map(|marker| (marker.line, marker.position))
        .collect();
    assert_eq!(
        found,
        vec![(0, Some(Position::new(2, 2))), (6, Some(Position::new(8, 4)))]
    );
}

#[test]
fn test_marker_without_deeper_line_has_no_target() {
    let (document, mut session) = open("a\n// @blocksort\nb");
    let token = CancellationToken::new();

    let markers = session.block_sort_markers(&document, None, &token);
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].position, None);
    assert!(session.format_edits(&document, None, &token).is_empty());
}

#[test]
fn test_format_edits_sorts_annotated_list() {
    let (mut document, mut session) = open(LIST);
    let token = CancellationToken::new();

    let edits = session.format_edits(&document, None, &token);
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].range, Range::from_coords(2, 0, 3, 6));
    assert_eq!(edits[0].new_text, "  'a',\n  'b',");

    document.apply_edit(&edits[0]);
    session.on_edit(&edits[0]);
    assert_eq!(document.text(), "// @blocksort\nconst list = [\n  'a',\n  'b',\n];");

    // Already sorted: formatting again is a no-op.
    let again = session.format_edits(&document, None, &token);
    assert_eq!(again[0].new_text, "  'a',\n  'b',");
}

#[test]
fn test_inner_directive_is_merged_into_outer_sort() {
    let (document, mut session) = open(NESTED);
    let token = CancellationToken::new();

    let edits = session.format_edits(&document, None, &token);
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].range, Range::from_coords(2, 0, 10, 4));
    assert_eq!(
        edits[0].new_text,
        "  // @blocksort desc\n  alpha: [\n    'b',\n    'a',\n  ],\n  beta: [\n    'z',\n    'x',\n  ],"
    );
}

#[test]
fn test_format_edits_in_range_only() {
    let (document, mut session) = open(NESTED);
    let token = CancellationToken::new();

    let edits = session.format_edits(&document, Some(Range::lines(7, 10)), &token);
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].range, Range::from_coords(8, 0, 9, 8));
    assert_eq!(edits[0].new_text, "    'b',\n    'a',");
}
