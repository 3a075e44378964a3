#![warn(missing_docs)]
//! `blocksort-lang` - data-driven marker tables for `blocksort-core`.
//!
//! This crate intentionally stays lightweight and does **not** know anything about block
//! segmentation. It only describes, per language id, which spans of text are comments,
//! strings or decorators, which bracket families nest, and which regex patterns the
//! classifier uses by default. All patterns are regex *sources*; compiling them (and
//! reporting invalid ones) is the job of `blocksort-core`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A delimited span of text (comment, string literal, ...).
///
/// `start` and `end` are regex sources. When `end` is `None` the span runs to the end of
/// the line, which is how line comments are described.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlockDefinition {
    /// Regex source matching the opening delimiter.
    pub start: String,
    /// Regex source matching the closing delimiter (`None` = end of line).
    #[serde(default)]
    pub end: Option<String>,
    /// Escape character that prevents the closing delimiter from ending the span.
    ///
    /// Only used for string markers; `blocksort-core` falls back to `\` when unset.
    #[serde(default)]
    pub escape: Option<char>,
}

impl TextBlockDefinition {
    /// A span that runs from `start` to the end of the line (e.g. `//`, `#`).
    pub fn line(start: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: None,
            escape: None,
        }
    }

    /// A span delimited by `start` and `end` (e.g. `/\*` and `\*/`).
    pub fn block(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: Some(end.into()),
            escape: None,
        }
    }

    /// A string literal opened and closed by the same delimiter, escaped with `\`.
    pub fn quoted(delimiter: impl Into<String>) -> Self {
        let delimiter = delimiter.into();
        Self {
            start: delimiter.clone(),
            end: Some(delimiter),
            escape: Some('\\'),
        }
    }

    /// Returns `true` if the span ends at the end of the line.
    pub fn is_line(&self) -> bool {
        self.end.as_deref().is_none_or(str::is_empty)
    }
}

/// A nesting bracket family, e.g. `()` or `{}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoldingMarker {
    /// Regex source matching an opening bracket.
    pub start: String,
    /// Regex source matching a closing bracket.
    pub end: String,
    /// Families are processed in ascending priority order.
    #[serde(default)]
    pub priority: i32,
    /// Key of another family whose opening discards this family's unclosed openings on
    /// the same line (used so `<` in `if (a < b) {` does not nest across the block).
    #[serde(default)]
    pub abort_on: Option<String>,
}

impl FoldingMarker {
    /// Create a folding family with default priority and no abort rule.
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            priority: 0,
            abort_on: None,
        }
    }

    /// Set the processing priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Discard this family's openings on lines where `key` opens.
    pub fn aborted_by(mut self, key: impl Into<String>) -> Self {
        self.abort_on = Some(key.into());
        self
    }
}

/// Comment, string and decorator markers of a single language.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LanguageMarkers {
    /// Comment spans, stripped before content/folding checks.
    #[serde(default)]
    pub comments: Vec<TextBlockDefinition>,
    /// String literal spans, stripped before folding is counted.
    #[serde(default)]
    pub strings: Vec<TextBlockDefinition>,
    /// Regex sources matching decorator/annotation text (e.g. `@Component(...)`).
    #[serde(default)]
    pub decorators: Vec<String>,
}

/// Key of the curly brace folding family.
pub const CURLY_BRACES: &str = "{}";

/// Default markers for lines that close a structurally complete block.
pub const DEFAULT_COMPLETE_BLOCK_MARKERS: &[&str] = &[r"\}", r"</[a-zA-Z0-9\-_=\s]+>?"];

/// Default markers for lines whose indentation must not decide block boundaries.
pub const DEFAULT_INDENT_IGNORE_MARKERS: &[&str] = &[
    r"\{",
    r#"end(?:for(?:each)?|if|while|case|def)?(?:\s*[.\[\->|]\s*(?:[$\w+\-*/^%<>=!?:]*|'[^']*'|"[^"]*"|`[^`]*`)\s*[\]|]?)*"#,
    r"esac|fi",
];

/// Default pattern for lines that continue into the next line (`if`, `case`, `def`, ...).
pub const DEFAULT_INCOMPLETE_BLOCK_REGEX: &str = r"\b(?:if|when|else|case|for|foreach|elsif|while|def|then|default)\b\s*(?:[A-Za-z_+\-*/%<>\d.,\s]*|.*:)?$";

/// Default pattern for one line of a cluster of consecutive `case`/`when` labels.
pub const DEFAULT_MULTI_BLOCK_HEADER_REGEX: &str = r#"^(?:when|case|default|else)\b(?:'[^']*'|"[^"]*"|`[^`]*`|[A-Za-z_+\-*/%<>\d.,\s])*(?:.*:)?$"#;

/// Default pattern for blocks that always sort last (`default:` clauses, `else`).
pub const DEFAULT_FORCE_LAST_REGEX: &str =
    r"^(?:\s*(?:when|case)\b.*\r?\n)*\s*default\b|^\s*else\b(?!\s?if)\s*:?$";

/// Default decorator pattern.
pub const DEFAULT_DECORATOR: &str = r"^\s*@.*";

/// Default bracket families: `()`, `[]`, `{}` and `<>`.
///
/// `{}` has the highest priority so it is processed last, which lets `<>` be aborted by
/// a curly brace on the same line.
pub fn default_folding_markers() -> BTreeMap<String, FoldingMarker> {
    let mut markers = BTreeMap::new();
    markers.insert("()".to_string(), FoldingMarker::new(r"\(", r"\)"));
    markers.insert("[]".to_string(), FoldingMarker::new(r"\[", r"\]"));
    markers.insert(
        CURLY_BRACES.to_string(),
        FoldingMarker::new(r"\{", r"\}").with_priority(100),
    );
    markers.insert(
        "<>".to_string(),
        FoldingMarker::new("<", r"(?<![=\-])>").aborted_by(CURLY_BRACES),
    );
    markers
}

fn c_comments() -> Vec<TextBlockDefinition> {
    vec![
        TextBlockDefinition::line("//"),
        TextBlockDefinition::block(r"/\*", r"\*/"),
    ]
}

fn hash_comments() -> Vec<TextBlockDefinition> {
    vec![TextBlockDefinition::line("#")]
}

fn quotes(delimiters: &[&str]) -> Vec<TextBlockDefinition> {
    delimiters
        .iter()
        .map(|d| TextBlockDefinition::quoted(*d))
        .collect()
}

/// Comment markers for a language id (VS Code style ids, e.g. `typescript`).
pub fn comment_markers(language_id: &str) -> Vec<TextBlockDefinition> {
    match language_id {
        "c" | "cpp" | "csharp" | "dart" | "go" | "groovy" | "java" | "javascript"
        | "javascriptreact" | "json" | "jsonc" | "jsx" | "kotlin" | "less" | "objective-c"
        | "objective-cpp" | "rust" | "scala" | "scss" | "stylus" | "swift" | "typescript"
        | "typescriptreact" | "vue" => c_comments(),
        "php" => {
            let mut comments = c_comments();
            comments.push(TextBlockDefinition::line("#"));
            comments
        }
        "css" => vec![TextBlockDefinition::block(r"/\*", r"\*/")],
        "coffeescript" => vec![
            TextBlockDefinition::block("###", "###"),
            TextBlockDefinition::line("#"),
        ],
        "ruby" => vec![
            TextBlockDefinition::block("^=begin", "^=end"),
            TextBlockDefinition::line("#"),
        ],
        "powershell" => vec![
            TextBlockDefinition::block("<#", "#>"),
            TextBlockDefinition::line("#"),
        ],
        "dockerfile" | "elixir" | "makefile" | "nim" | "perl" | "python" | "r"
        | "shellscript" | "toml" | "yaml" => hash_comments(),
        "ini" => vec![
            TextBlockDefinition::line(";"),
            TextBlockDefinition::line("#"),
        ],
        "html" | "markdown" | "svg" | "vue-html" | "xml" | "xsl" => {
            vec![TextBlockDefinition::block("<!--", "-->")]
        }
        "sql" => vec![
            TextBlockDefinition::line("--"),
            TextBlockDefinition::block(r"/\*", r"\*/"),
        ],
        "lua" => vec![
            TextBlockDefinition::block(r"--\[\[", r"\]\]"),
            TextBlockDefinition::line("--"),
        ],
        "haskell" => vec![
            TextBlockDefinition::block(r"\{-", r"-\}"),
            TextBlockDefinition::line("--"),
        ],
        "erlang" | "latex" | "matlab" | "tex" => vec![TextBlockDefinition::line("%")],
        "vb" => vec![TextBlockDefinition::line("'")],
        "clojure" | "lisp" | "scheme" => vec![TextBlockDefinition::line(";")],
        _ => {
            let mut comments = c_comments();
            comments.push(TextBlockDefinition::line("#"));
            comments
        }
    }
}

/// String literal markers for a language id.
pub fn string_markers(language_id: &str) -> Vec<TextBlockDefinition> {
    match language_id {
        "html" | "jsx" | "sql" | "vue-html" | "xml" | "yaml" => quotes(&["\"", "'"]),
        "python" => {
            let mut strings = quotes(&["\"\"\"", "'''"]);
            strings.extend(quotes(&["\"", "'"]));
            strings
        }
        // Single quotes are lifetimes as often as char literals.
        "rust" => quotes(&["\""]),
        "markdown" | "plaintext" => Vec::new(),
        _ => quotes(&["\"", "'", "`"]),
    }
}

/// Decorator markers for a language id.
pub fn decorator_markers(language_id: &str) -> Vec<String> {
    let mut decorators = vec![DEFAULT_DECORATOR.to_string()];
    match language_id {
        "csharp" => decorators.push(r"^\s*\[[^\]]*\]\s*$".to_string()),
        "rust" => decorators.push(r"^\s*#!?\[.*".to_string()),
        _ => {}
    }
    decorators
}

/// All markers of a language id.
pub fn language_markers(language_id: &str) -> LanguageMarkers {
    LanguageMarkers {
        comments: comment_markers(language_id),
        strings: string_markers(language_id),
        decorators: decorator_markers(language_id),
    }
}

/// Best-effort language id for a file extension (without the leading dot).
pub fn language_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" | "hh" => "cpp",
        "cs" => "csharp",
        "css" => "css",
        "dart" => "dart",
        "go" => "go",
        "htm" | "html" => "html",
        "ini" | "cfg" => "ini",
        "java" => "java",
        "js" | "mjs" | "cjs" => "javascript",
        "json" => "json",
        "jsonc" | "json5" => "jsonc",
        "jsx" => "javascriptreact",
        "kt" | "kts" => "kotlin",
        "less" => "less",
        "lua" => "lua",
        "md" | "markdown" => "markdown",
        "php" => "php",
        "ps1" => "powershell",
        "py" | "pyi" => "python",
        "rb" => "ruby",
        "rs" => "rust",
        "scss" => "scss",
        "sh" | "bash" | "zsh" => "shellscript",
        "sql" => "sql",
        "swift" => "swift",
        "toml" => "toml",
        "ts" | "mts" | "cts" => "typescript",
        "tsx" => "typescriptreact",
        "vue" => "vue",
        "xml" | "xsl" | "svg" => "xml",
        "yaml" | "yml" => "yaml",
        _ => "plaintext",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_and_block_definitions() {
        assert!(TextBlockDefinition::line("//").is_line());
        assert!(!TextBlockDefinition::block(r"/\*", r"\*/").is_line());
        assert_eq!(TextBlockDefinition::quoted("\"").escape, Some('\\'));
    }

    #[test]
    fn test_curly_braces_are_processed_last() {
        let markers = default_folding_markers();
        let max = markers.values().map(|m| m.priority).max().unwrap();
        assert_eq!(markers[CURLY_BRACES].priority, max);
        assert_eq!(markers["<>"].abort_on.as_deref(), Some(CURLY_BRACES));
    }

    #[test]
    fn test_unknown_language_uses_default_tables() {
        let markers = language_markers("unknown-language");
        assert_eq!(markers.comments.len(), 3);
        assert_eq!(markers.strings.len(), 3);
        assert_eq!(markers.decorators, vec![DEFAULT_DECORATOR.to_string()]);
    }

    #[test]
    fn test_language_for_extension() {
        assert_eq!(language_for_extension("TS"), "typescript");
        assert_eq!(language_for_extension("yml"), "yaml");
        assert_eq!(language_for_extension("txt"), "plaintext");
    }
}
