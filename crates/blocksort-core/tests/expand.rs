use blocksort_core::{
    BlockSortConfig, CancellationToken, Document, ExpandOptions, ExpandSelection, FoldingMode,
    Position, Range, Session, TextDocument,
};
use pretty_assertions::assert_eq;

const SOURCE: &str = "const a = 1;\nfunction foo() {\n  bar();\n  baz();\n}\nconst b = 2;";

fn open(text: &str) -> (TextDocument, Session) {
    (
        TextDocument::with_language(text, "typescript"),
        Session::open(BlockSortConfig::default(), "typescript"),
    )
}

#[test]
fn test_disabled_expansion_repairs_open_folding() {
    let (document, mut session) = open(SOURCE);
    let token = CancellationToken::new();

    let range = session.expand_range(
        &document,
        Range::caret(Position::new(1, 3)),
        ExpandSelection::Disabled,
        &token,
    );
    assert_eq!(range, Range::from_coords(1, 0, 4, 1));
}

#[test]
fn test_disabled_expansion_repairs_closing_folding_upwards() {
    let (document, mut session) = open(SOURCE);
    let token = CancellationToken::new();

    let range = session.expand_range(
        &document,
        Range::lines(3, 4),
        ExpandSelection::Disabled,
        &token,
    );
    assert_eq!(range, Range::from_coords(1, 0, 4, 1));
}

#[test]
fn test_full_expansion_stays_inside_parent() {
    let (document, mut session) = open(SOURCE);
    let token = CancellationToken::new();

    let range = session.expand_range(
        &document,
        Range::caret(Position::new(2, 2)),
        ExpandSelection::Full,
        &token,
    );
    assert_eq!(range, Range::from_coords(2, 0, 3, 8));
}

#[test]
fn test_full_expansion_covers_siblings() {
    let (document, mut session) = open(SOURCE);
    let token = CancellationToken::new();

    let range = session.expand_range(
        &document,
        Range::caret(Position::new(1, 0)),
        ExpandSelection::Full,
        &token,
    );
    assert_eq!(range, Range::from_coords(0, 0, 5, 12));
}

#[test]
fn test_custom_expansion_over_empty_lines_only() {
    let (document, mut session) = open("a\n\nb\n\nc");
    let token = CancellationToken::new();

    let options = ExpandOptions {
        expand_over_empty_lines: true,
        ..Default::default()
    };
    let range = session.expand_range(
        &document,
        Range::caret(Position::new(2, 0)),
        ExpandSelection::Custom(options),
        &token,
    );
    assert_eq!(range, Range::from_coords(1, 0, 3, 0));
}

#[test]
fn test_expanded_ranges_are_folding_balanced() {
    let (document, mut session) = open(SOURCE);
    let token = CancellationToken::new();

    for line in 0..document.line_count() {
        let range = session.expand_range(
            &document,
            Range::caret(Position::new(line, 0)),
            ExpandSelection::Full,
            &token,
        );
        let classifier = session.classifier();
        let folding = classifier.folding(
            &document.text_in_range(range),
            &classifier.folding_table().closed(),
            FoldingMode::Raw,
        );
        assert!(!folding.has_open(), "line {line}: {range:?}");
    }
}

#[test]
fn test_trim_range_skips_blank_lines() {
    let (document, mut session) = open("\n\nx\ny\n\n");
    assert_eq!(
        session.trim_range(&document, Range::lines(0, 5)),
        Range::from_coords(2, 0, 3, 1)
    );
}

#[test]
fn test_expand_selection_uses_cursor_and_selection_settings() {
    let (document, mut session) = open(SOURCE);
    let token = CancellationToken::new();

    let cursor = session.expand_selection(&document, Range::caret(Position::new(2, 2)), &token);
    assert_eq!(cursor, Range::from_coords(2, 0, 3, 8));

    let selection = session.expand_selection(&document, Range::from_coords(2, 0, 2, 3), &token);
    assert_eq!(selection, Range::from_coords(2, 0, 2, 8));
}

#[test]
fn test_expansion_reverts_at_document_start() {
    let token = CancellationToken::new();

    let (document, mut session) = open("  a();\n  b();\n}\nc();");
    let range = session.expand_range(
        &document,
        Range::caret(Position::new(1, 2)),
        ExpandSelection::Full,
        &token,
    );
    assert_eq!(range, Range::from_coords(0, 0, 1, 6));

    // Reaching line 0 with `foo(` still open undoes the last step.
    let (document, mut session) = open("  foo(\n  a();\n  b();");
    let range = session.expand_range(
        &document,
        Range::caret(Position::new(2, 2)),
        ExpandSelection::Full,
        &token,
    );
    assert_eq!(range, Range::from_coords(1, 0, 2, 6));
}

#[test]
fn test_unbalanced_folding_stops_at_document_end() {
    let (document, mut session) = open("x {\n  y();");
    let token = CancellationToken::new();

    let range = session.expand_range(
        &document,
        Range::caret(Position::new(0, 1)),
        ExpandSelection::Full,
        &token,
    );
    assert_eq!(range, Range::from_coords(0, 0, 1, 6));
}
