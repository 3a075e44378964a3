//! Blocksort command line tool.
//!
//! Sorts blocks of a source file and writes the result to stdout (or back to the file).
//!
//! # Usage
//!
//! ```bash
//! # Sort a whole file, nested blocks as deep as `defaultMultilevelDepth` allows
//! blocksort src/routes.ts
//!
//! # Only the top-level blocks
//! blocksort --depth 0 src/routes.ts
//!
//! # Sort the blocks around line 12, children included, descending
//! blocksort --line 12 --depth -1 --direction desc src/routes.ts
//!
//! # Apply every `// @blocksort` directive in place
//! blocksort --format --in-place src/routes.ts
//! ```
//!
//! Set `RUST_LOG=blocksort_core=debug` to see what the engine does.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use blocksort_core::{
    BlockSortConfig, CancellationToken, Direction, Document, ExpandSelection, PendingEdits,
    Position, Range, Session, SortDepth, TextDocument, TextEdit,
};

/// Sort blocks of code by indentation and bracket structure.
#[derive(Parser, Debug)]
#[command(name = "blocksort")]
#[command(about = "Sort blocks of code by indentation and bracket structure")]
#[command(allow_negative_numbers = true)]
struct Args {
    /// File to sort
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// YAML (or JSON) configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Language id (derived from the file extension by default)
    #[arg(short, long)]
    language: Option<String>,

    /// Sort the blocks in this 1-based line range, e.g. `10:24`
    #[arg(long, value_name = "START:END", value_parser = parse_line_range)]
    lines: Option<(usize, usize)>,

    /// Sort the blocks around this 1-based line
    #[arg(long, value_name = "N", value_parser = parse_line, conflicts_with = "lines")]
    line: Option<usize>,

    /// Sort direction: asc, desc or rand
    #[arg(short, long, default_value = "asc")]
    direction: Direction,

    /// Levels of nested blocks to sort as well (-1 = all, default from the config)
    #[arg(long)]
    depth: Option<i64>,

    /// Outer levels to leave unsorted
    #[arg(long, default_value_t = 0)]
    skip_parents: usize,

    /// Seed for `--direction rand`
    #[arg(long)]
    seed: Option<u64>,

    /// Apply the file's `@blocksort` directives instead of sorting a range
    #[arg(long, conflicts_with_all = ["lines", "line"])]
    format: bool,

    /// Write the result back to FILE
    #[arg(short, long)]
    in_place: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_tracing(args.verbose);
    run(&args)
}

fn setup_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("blocksort_core=debug,blocksort=debug,info")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<()> {
    let text = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => BlockSortConfig::default(),
    };
    let language = args
        .language
        .clone()
        .unwrap_or_else(|| language_for_path(&args.file));

    let mut document = TextDocument::with_language(&text, language.as_str());
    let mut session = Session::open(config, language.as_str());
    let token = CancellationToken::new();
    tracing::info!(
        file = %args.file.display(),
        language = %language,
        lines = document.line_count(),
        "loaded document"
    );

    let mut edits = if args.format {
        session.format_edits(&document, None, &token)
    } else {
        vec![sort_edit(args, &mut session, &document, &token)?]
    };

    edits.sort_by_key(|edit| std::cmp::Reverse(edit.range.start));
    for edit in &edits {
        document.apply_edit(edit);
    }
    tracing::info!(edits = edits.len(), "applied edits");

    let output = document.text_for_saving();
    if args.in_place {
        fs::write(&args.file, output)
            .with_context(|| format!("failed to write {}", args.file.display()))?;
    } else {
        std::io::stdout()
            .write_all(output.as_bytes())
            .context("failed to write to stdout")?;
    }
    Ok(())
}

fn sort_edit(
    args: &Args,
    session: &mut Session,
    document: &TextDocument,
    token: &CancellationToken,
) -> Result<TextEdit> {
    let last_line = document.line_count().saturating_sub(1);
    let (selection, expand) = match (args.lines, args.line) {
        (Some((start, end)), _) => {
            if start - 1 > last_line {
                bail!("line {start} is past the end of the file ({} lines)", last_line + 1);
            }
            (
                Range::lines(start - 1, end - 1),
                session.config().expand_selection,
            )
        }
        (None, Some(line)) => {
            if line - 1 > last_line {
                bail!("line {line} is past the end of the file ({} lines)", last_line + 1);
            }
            (
                Range::caret(Position::new(line - 1, 0)),
                session.config().expand_cursor,
            )
        }
        (None, None) => (Range::lines(0, last_line), ExpandSelection::Disabled),
    };

    let options = match args.depth {
        Some(depth) => session
            .sort_options(args.direction)
            .with_depth(SortDepth::from_i64(depth)),
        None => session.multilevel_sort_options(args.direction),
    };
    let mut options = options
        .with_skip_parents(args.skip_parents)
        .with_expand(expand);
    if let Some(seed) = args.seed {
        options = options.with_seed(seed);
    }

    session
        .block_sort_edit(document, selection, &options, &mut PendingEdits::new(), token)
        .context("sort was cancelled")
}

fn load_config(path: &Path) -> Result<BlockSortConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}

fn language_for_path(path: &Path) -> String {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map_or("plaintext", blocksort_lang::language_for_extension)
        .to_string()
}

fn parse_line(value: &str) -> Result<usize, String> {
    match value.trim().parse::<usize>() {
        Ok(0) => Err("line numbers start at 1".to_string()),
        Ok(line) => Ok(line),
        Err(err) => Err(format!("invalid line number '{value}': {err}")),
    }
}

fn parse_line_range(value: &str) -> Result<(usize, usize), String> {
    let (start, end) = value
        .split_once(':')
        .ok_or_else(|| format!("expected START:END, got '{value}'"))?;
    let (start, end) = (parse_line(start)?, parse_line(end)?);
    if start > end {
        return Err(format!("range start {start} is after its end {end}"));
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line_range() {
        assert_eq!(parse_line_range("3:7"), Ok((3, 7)));
        assert!(parse_line_range("0:7").is_err());
        assert!(parse_line_range("7:3").is_err());
        assert!(parse_line_range("7").is_err());
    }

    #[test]
    fn test_args_accept_negative_depth() {
        let args = Args::try_parse_from(["blocksort", "--depth", "-1", "a.ts"]).unwrap();
        assert_eq!(args.depth, Some(-1));
        let args = Args::try_parse_from(["blocksort", "a.ts"]).unwrap();
        assert_eq!(args.depth, None);
        assert_eq!(args.direction, Direction::Asc);
        assert!(Args::try_parse_from(["blocksort", "--format", "--line", "2", "a.ts"]).is_err());
    }

    #[test]
    fn test_depth_defaults_to_config() {
        let document =
            TextDocument::with_language("b {\n  y();\n  x();\n}\na {\n  z();\n}", "typescript");
        let token = CancellationToken::new();
        let sort = |argv: &[&str], default_multilevel_depth: i64| {
            let args = Args::try_parse_from(argv).unwrap();
            let config = BlockSortConfig {
                default_multilevel_depth,
                ..Default::default()
            };
            let mut session = Session::open(config, "typescript");
            sort_edit(&args, &mut session, &document, &token).unwrap().new_text
        };

        let nested = "a {\n  z();\n}\nb {\n  x();\n  y();\n}";
        let top_only = "a {\n  z();\n}\nb {\n  y();\n  x();\n}";
        assert_eq!(sort(&["blocksort", "a.ts"], -1), nested);
        assert_eq!(sort(&["blocksort", "a.ts"], 0), top_only);
        assert_eq!(sort(&["blocksort", "--depth", "1", "a.ts"], 0), nested);
    }

    #[test]
    fn test_language_for_path() {
        assert_eq!(language_for_path(Path::new("src/app.ts")), "typescript");
        assert_eq!(language_for_path(Path::new("Makefile")), "plaintext");
    }
}
