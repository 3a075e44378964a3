//! Text classification over lines and block texts.
//!
//! The [`Classifier`] owns every compiled pattern of a session: comment, string and
//! decorator spans, folding families, and the block heuristics (indent-ignore,
//! complete, incomplete, multi-block header, force first/last). All functions are pure
//! with respect to the text they are given.
//!
//! Regex rules whose source starts with `^` or ends with `$` are extended so the anchors
//! tolerate comment-only text and whitespace around the match.

use fancy_regex::Regex;

use crate::config::BlockSortConfig;
use crate::error::ConfigError;
use crate::folding::{FoldingMode, FoldingState, FoldingTable};
use blocksort_lang::TextBlockDefinition;

/// Compiled marker tables and heuristics for one language.
#[derive(Debug)]
pub struct Classifier {
    tab_size: usize,
    comments: Vec<Regex>,
    strings: Vec<Regex>,
    decorators: Vec<Regex>,
    directive_prefixes: Vec<Regex>,
    folding: FoldingTable,
    indent_ignore: Option<Regex>,
    complete: Option<Regex>,
    incomplete: Option<Regex>,
    multi_block_header: Option<Regex>,
    force_first: Option<Regex>,
    force_last: Option<Regex>,
    separators: Vec<char>,
}

/// How a trailing `$` anchor is extended.
#[derive(Clone, Copy, PartialEq, Eq)]
enum AnchorEnd {
    /// `$` stays the end of the text.
    Text,
    /// `$` also matches before the first line break (block-level rules).
    FirstLine,
}

/// Directive keyword recognized after a comment start.
pub(crate) const DIRECTIVE_KEYWORD: &str = "@blocksort";

impl Classifier {
    /// Compile `config` for `language_id`.
    ///
    /// Invalid patterns are logged, collected in the returned list and replaced by the
    /// default pattern of their rule (or skipped when there is none).
    pub fn new(config: &BlockSortConfig, language_id: &str) -> (Self, Vec<ConfigError>) {
        let mut errors = Vec::new();
        let markers = config.language_markers(language_id);

        let tab_size = if config.tab_size == 0 {
            let error = ConfigError::InvalidTabSize(0);
            tracing::warn!(%error, "invalid tab size");
            errors.push(error);
            crate::config::DEFAULT_TAB_SIZE
        } else {
            config.tab_size
        };

        let mut comment_sources = Vec::new();
        let mut comments = Vec::new();
        let mut directive_prefixes = Vec::new();
        for definition in &markers.comments {
            let strip = comment_strip_source(definition);
            let Some(regex) = compile_rule("languages.comments", &strip, None, &mut errors) else {
                continue;
            };
            comments.push(regex);
            comment_sources.push(comment_match_source(definition));

            let prefix = format!(
                "^(?:{}) {}",
                definition.start,
                regex::escape(DIRECTIVE_KEYWORD)
            );
            if let Some(regex) = compile_rule("languages.comments", &prefix, None, &mut errors) {
                directive_prefixes.push(regex);
            }
        }

        let strings: Vec<Regex> = markers
            .strings
            .iter()
            .filter_map(|definition| {
                compile_rule(
                    "languages.strings",
                    &string_strip_source(definition),
                    None,
                    &mut errors,
                )
            })
            .collect();

        let decorators: Vec<Regex> = markers
            .decorators
            .iter()
            .filter_map(|source| {
                compile_rule("languages.decorators", &format!("(?m){source}"), None, &mut errors)
            })
            .collect();

        let folding = FoldingTable::compile(&config.folding_markers(), &mut errors);

        let comment = if comment_sources.is_empty() {
            r"\s".to_string()
        } else {
            format!(r"{}|\s", comment_sources.join("|"))
        };

        let indent_ignore = compile_marker_rule(
            "indentIgnoreMarkers",
            &config.indent_ignore_markers(),
            blocksort_lang::DEFAULT_INDENT_IGNORE_MARKERS,
            |markers| format!(r"^\s*(?:{markers})(?:{comment})*$"),
            &mut errors,
        );
        let complete = compile_marker_rule(
            "completeBlockMarkers",
            &config.complete_block_markers(),
            blocksort_lang::DEFAULT_COMPLETE_BLOCK_MARKERS,
            |markers| format!(r"(?:{markers})[,;]?(?:{comment})*[,;]?$"),
            &mut errors,
        );

        let incomplete = compile_rule(
            "incompleteBlockRegex",
            &extend_anchors(config.incomplete_block_regex(), &comment, AnchorEnd::Text),
            Some(&extend_anchors(
                blocksort_lang::DEFAULT_INCOMPLETE_BLOCK_REGEX,
                &comment,
                AnchorEnd::Text,
            )),
            &mut errors,
        );
        let multi_block_header = compile_rule(
            "multiBlockHeaderRegex",
            &extend_anchors(config.multi_block_header_regex(), &comment, AnchorEnd::Text),
            Some(&extend_anchors(
                blocksort_lang::DEFAULT_MULTI_BLOCK_HEADER_REGEX,
                &comment,
                AnchorEnd::Text,
            )),
            &mut errors,
        );
        let force_first = config.force_first_regex().and_then(|source| {
            compile_rule(
                "forceBlockHeaderFirstRegex",
                &extend_anchors(source, &comment, AnchorEnd::FirstLine),
                None,
                &mut errors,
            )
        });
        let force_last = compile_rule(
            "forceBlockHeaderLastRegex",
            &extend_anchors(config.force_last_regex(), &comment, AnchorEnd::FirstLine),
            Some(&extend_anchors(
                blocksort_lang::DEFAULT_FORCE_LAST_REGEX,
                &comment,
                AnchorEnd::FirstLine,
            )),
            &mut errors,
        );

        tracing::debug!(
            language_id,
            comments = comments.len(),
            strings = strings.len(),
            folding_families = folding.len(),
            errors = errors.len(),
            "compiled classifier"
        );

        let classifier = Self {
            tab_size,
            comments,
            strings,
            decorators,
            directive_prefixes,
            folding,
            indent_ignore,
            complete,
            incomplete,
            multi_block_header,
            force_first,
            force_last,
            separators: config.separator_characters(),
        };
        (classifier, errors)
    }

    /// Columns per indentation level.
    pub fn tab_size(&self) -> usize {
        self.tab_size
    }

    /// The compiled folding families.
    pub fn folding_table(&self) -> &FoldingTable {
        &self.folding
    }

    /// Remove comment spans.
    pub fn strip_comments(&self, text: &str) -> String {
        strip_spans(text, &self.comments)
    }

    /// Remove string literal spans.
    pub fn strip_strings(&self, text: &str) -> String {
        strip_spans(text, &self.strings)
    }

    /// Remove comments and strings in a single left-to-right pass.
    ///
    /// Whichever span starts first wins, so `"http://x"` is a string and not a comment.
    pub fn strip_comments_and_strings(&self, text: &str) -> String {
        let patterns: Vec<&Regex> = self.comments.iter().chain(&self.strings).collect();
        strip_spans(text, patterns)
    }

    /// Remove decorator spans; `^` and `$` in decorator patterns match at every line.
    pub fn strip_decorators(&self, text: &str) -> String {
        let mut result = text.to_string();
        for decorator in &self.decorators {
            result = remove_all(&result, decorator);
        }
        result
    }

    /// Indentation of `line` in tab-width units.
    pub fn indent(&self, line: &str) -> f64 {
        let width = line.chars().take_while(|c| c.is_whitespace()).count();
        width as f64 / self.tab_size as f64
    }

    /// Folding of `text` (any number of lines) on top of `initial`.
    pub fn folding(&self, text: &str, initial: &FoldingState, mode: FoldingMode) -> FoldingState {
        let mut state = initial.clone();
        for line in text.split('\n') {
            let sanitized = self.strip_comments_and_strings(line);
            state = self.folding.count(&sanitized, &state, mode);
        }
        state
    }

    /// Folding delta contributed by a single line.
    pub fn line_folding(&self, line: &str) -> FoldingState {
        self.folding(line, &self.folding.closed(), FoldingMode::Raw)
    }

    /// Returns `true` if `line` has content besides comments and whitespace.
    pub fn has_content(&self, line: &str) -> bool {
        !self.strip_comments(line).trim().is_empty()
    }

    /// Returns `true` if `line` may separate blocks.
    ///
    /// Blank lines, decorator-only lines, comment-only lines, a `{` line that opens
    /// folding and an orphan closing line (`}`, `)];`, ...) are not valid.
    pub fn is_valid_line(&self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.is_empty() || !self.has_content(line) {
            return false;
        }
        if self.strip_decorators(line).trim().is_empty() {
            return false;
        }

        let folding = self.line_folding(line);
        if trimmed.starts_with('{') && folding.has_open() {
            return false;
        }
        !(is_closing_only(trimmed) && folding.has_negative())
    }

    /// Returns `true` if the indentation of `line` must not decide block boundaries.
    pub fn is_indent_ignore_line(&self, line: &str) -> bool {
        self.test_line(&self.indent_ignore, line)
    }

    /// Returns `true` if `line` closes a structurally complete block.
    pub fn is_complete_block(&self, line: &str) -> bool {
        self.test_line(&self.complete, line)
    }

    /// Returns `true` if `line` continues into the next line (`if`, `case`, ...).
    pub fn is_incomplete_block(&self, line: &str) -> bool {
        self.test_line(&self.incomplete, line)
    }

    /// Returns `true` if `line` is one label of a `case`/`when` cluster.
    pub fn is_multi_block_header(&self, line: &str) -> bool {
        self.test_line(&self.multi_block_header, line)
    }

    /// Returns `true` if `block` always sorts first.
    pub fn is_force_first_block(&self, block: &str) -> bool {
        is_match(self.force_first.as_ref(), block)
    }

    /// Returns `true` if `block` always sorts last.
    pub fn is_force_last_block(&self, block: &str) -> bool {
        is_match(self.force_last.as_ref(), block)
    }

    /// Returns `true` if the trimmed `line` starts with a `@blocksort` directive comment.
    pub fn is_directive_line(&self, line: &str) -> bool {
        let trimmed = line.trim();
        self.directive_prefixes
            .iter()
            .any(|prefix| is_match(Some(prefix), trimmed))
    }

    /// The separator character every considered block ends with.
    ///
    /// With `ignore_last` the last block is not considered. Returns `None` when the
    /// considered blocks disagree, when one of them has no separator, or when no block is
    /// considered.
    pub fn block_separator(&self, blocks: &[&str], ignore_last: bool) -> Option<char> {
        let considered = if ignore_last {
            blocks.split_last().map_or(&[][..], |(_, rest)| rest)
        } else {
            blocks
        };

        let mut separator = None;
        for block in considered {
            let last = block.chars().last().filter(|c| self.separators.contains(c))?;
            match separator {
                None => separator = Some(last),
                Some(current) if current != last => return None,
                Some(_) => {}
            }
        }
        separator
    }

    /// Returns `true` if `c` is a configured separator character.
    pub fn is_separator(&self, c: char) -> bool {
        self.separators.contains(&c)
    }

    /// Sort key of a block: comments and decorators removed, trimmed.
    ///
    /// Falls back to the trimmed raw text when stripping leaves nothing.
    pub fn sort_key(&self, block: &str) -> String {
        let sanitized = self.strip_decorators(&self.strip_comments(block));
        let sanitized = sanitized.trim();
        if sanitized.is_empty() {
            block.trim().to_string()
        } else {
            sanitized.to_string()
        }
    }

    fn test_line(&self, rule: &Option<Regex>, line: &str) -> bool {
        if rule.is_none() {
            return false;
        }
        let stripped = self.strip_decorators(&self.strip_comments(line));
        is_match(rule.as_ref(), &stripped)
    }
}

fn is_match(regex: Option<&Regex>, text: &str) -> bool {
    regex.is_some_and(|regex| regex.is_match(text).unwrap_or(false))
}

fn is_closing_only(trimmed: &str) -> bool {
    let body = trimmed
        .strip_suffix([',', ';'])
        .unwrap_or(trimmed)
        .trim_end();
    !body.is_empty() && body.chars().all(|c| matches!(c, ')' | ']' | '}'))
}

fn strip_spans<'a>(text: &str, patterns: impl IntoIterator<Item = &'a Regex> + Clone) -> String {
    let mut result = text.to_string();
    loop {
        let mut earliest: Option<(usize, usize)> = None;
        for pattern in patterns.clone() {
            let Ok(Some(found)) = pattern.find(&result) else {
                continue;
            };
            if found.start() == found.end() {
                continue;
            }
            if earliest.is_none_or(|(start, _)| found.start() < start) {
                earliest = Some((found.start(), found.end()));
            }
        }
        let Some((start, end)) = earliest else {
            return result;
        };
        result.replace_range(start..end, "");
    }
}

fn remove_all(text: &str, pattern: &Regex) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last = 0;
    for found in pattern.find_iter(text).map_while(Result::ok) {
        result.push_str(&text[last..found.start()]);
        last = found.end();
    }
    result.push_str(&text[last..]);
    result
}

fn comment_strip_source(definition: &TextBlockDefinition) -> String {
    match definition.end.as_deref().filter(|end| !end.is_empty()) {
        None => format!("(?:{}).*", definition.start),
        Some(end) => format!(r"(?:{})[\s\S]*?(?:(?:{})|$)", definition.start, end),
    }
}

fn comment_match_source(definition: &TextBlockDefinition) -> String {
    match definition.end.as_deref().filter(|end| !end.is_empty()) {
        None => format!("(?:{}).*", definition.start),
        Some(end) => format!(r"(?:{})[\s\S]*?(?:{})", definition.start, end),
    }
}

fn string_strip_source(definition: &TextBlockDefinition) -> String {
    let escape = regex::escape(&definition.escape.unwrap_or('\\').to_string());
    match definition.end.as_deref().filter(|end| !end.is_empty()) {
        None => format!("(?:{}).*", definition.start),
        Some(end) => format!(
            r"(?:{})(?:{escape}[\s\S]|[\s\S])*?(?:(?:{end})|$)",
            definition.start
        ),
    }
}

fn extend_anchors(source: &str, comment: &str, end: AnchorEnd) -> String {
    let mut result = source.to_string();
    if let Some(rest) = result.strip_prefix('^') {
        result = format!("^(?:{comment})*{rest}");
    }
    if result.ends_with('$') && !result.ends_with(r"\$") {
        result.pop();
        match end {
            AnchorEnd::Text => result.push_str(&format!("(?:{comment})*$")),
            AnchorEnd::FirstLine => result.push_str(&format!(r"(?:{comment})*(?:\r?\n|$)")),
        }
    }
    result
}

fn compile_rule(
    rule: &str,
    source: &str,
    fallback: Option<&str>,
    errors: &mut Vec<ConfigError>,
) -> Option<Regex> {
    match Regex::new(source) {
        Ok(regex) => Some(regex),
        Err(err) => {
            let error = ConfigError::InvalidRegex {
                rule: rule.to_string(),
                pattern: source.to_string(),
                message: err.to_string(),
            };
            tracing::warn!(%error, "falling back to default pattern");
            errors.push(error);
            fallback.and_then(|fallback| Regex::new(fallback).ok())
        }
    }
}

fn compile_marker_rule(
    rule: &str,
    markers: &[String],
    defaults: &[&str],
    build: impl Fn(&str) -> String,
    errors: &mut Vec<ConfigError>,
) -> Option<Regex> {
    let fallback = build(&defaults.join("|"));
    compile_rule(rule, &build(&markers.join("|")), Some(&fallback), errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier(language_id: &str) -> Classifier {
        let (classifier, errors) = Classifier::new(&BlockSortConfig::default(), language_id);
        assert!(errors.is_empty(), "{errors:?}");
        classifier
    }

    #[test]
    fn test_strip_comments() {
        let c = classifier("typescript");
        assert_eq!(c.strip_comments("a(); // b()"), "a(); ");
        assert_eq!(c.strip_comments("a /* x */ b /* y"), "a  b ");
    }

    #[test]
    fn test_strip_strings_honors_escapes() {
        let c = classifier("typescript");
        assert_eq!(c.strip_strings(r#"f("a\"(", 'b')"#), "f(, )");
        assert_eq!(c.strip_strings("f(\"open"), "f(");
    }

    #[test]
    fn test_string_wins_over_comment_start() {
        let c = classifier("typescript");
        assert_eq!(c.strip_comments_and_strings(r#"f("http://x") // c"#), "f() ");
        assert!(!c.line_folding(r#"f("http://x")"#).has_open());
    }

    #[test]
    fn test_indent_in_tab_units() {
        let c = classifier("typescript");
        assert_eq!(c.indent("    a"), 1.0);
        assert_eq!(c.indent("  a"), 0.5);
        assert_eq!(c.indent("\ta"), 0.25);
    }

    #[test]
    fn test_folding_ignores_strings_and_comments() {
        let c = classifier("typescript");
        assert!(!c.line_folding("a = '{'; // (").has_open());
        assert_eq!(c.line_folding("foo({").total_open(), 2);
    }

    #[test]
    fn test_valid_lines() {
        let c = classifier("typescript");
        assert!(c.is_valid_line("const a = 1;"));
        assert!(!c.is_valid_line("   "));
        assert!(!c.is_valid_line("// comment"));
        assert!(!c.is_valid_line("@Input()"));
        assert!(!c.is_valid_line("{"));
        assert!(!c.is_valid_line("});"));
        assert!(!c.is_valid_line("}"));
        assert!(c.is_valid_line("} else {"));
    }

    #[test]
    fn test_block_heuristics() {
        let c = classifier("typescript");
        assert!(c.is_indent_ignore_line("  { // open"));
        assert!(c.is_complete_block("  },"));
        assert!(c.is_complete_block("</div>"));
        assert!(c.is_incomplete_block("if x > 0"));
        assert!(c.is_incomplete_block("  case 'a':"));
        assert!(!c.is_incomplete_block("return 1;"));
        assert!(c.is_multi_block_header("  case 1:"));
        assert!(!c.is_multi_block_header("  foo();"));
    }

    #[test]
    fn test_force_last_rules() {
        let c = classifier("python");
        assert!(c.is_force_last_block("else:\n    pass"));
        assert!(!c.is_force_last_block("elif x:\n    pass"));
        assert!(c.is_force_last_block("case 1:\ndefault:\n  break;"));
        assert!(!c.is_force_first_block("anything"));
    }

    #[test]
    fn test_block_separator() {
        let c = classifier("typescript");
        assert_eq!(c.block_separator(&["b,", "a,", "c"], true), Some(','));
        assert_eq!(c.block_separator(&["b,", "a;", "c"], true), None);
        assert_eq!(c.block_separator(&["b", "a,", "c"], true), None);
        assert_eq!(c.block_separator(&["c"], true), None);
        assert_eq!(c.block_separator(&["a;", "b;"], false), Some(';'));
    }

    #[test]
    fn test_sort_key_strips_comments_and_decorators() {
        let c = classifier("typescript");
        assert_eq!(c.sort_key("@Input()\n// x\nb: string;"), "b: string;");
        assert_eq!(c.sort_key("// only a comment"), "// only a comment");
    }

    #[test]
    fn test_strip_decorators_per_language() {
        let cases = [
            ("typescript", "@Input()\n@Output()\nname: string;", "name: string;"),
            ("rust", "#[derive(Debug)]\n#[serde(default)]\nstruct Config;", "struct Config;"),
            ("rust", "#![allow(dead_code)]\nmod a;", "mod a;"),
            ("csharp", "[Serializable]\n[Obsolete(\"x\")]\nclass Legacy {}", "class Legacy {}"),
        ];
        for (language, block, key) in cases {
            assert_eq!(classifier(language).sort_key(block), key, "{language}: {block:?}");
        }
        assert!(!classifier("rust").is_valid_line("  #[test]"));
    }

    #[test]
    fn test_directive_lines() {
        let c = classifier("typescript");
        assert!(c.is_directive_line("  // @blocksort asc"));
        assert!(c.is_directive_line("/* @blocksort */"));
        assert!(!c.is_directive_line("// blocksort"));
        assert!(!c.is_directive_line("foo(); // @blocksort"));
    }

    #[test]
    fn test_invalid_rule_falls_back_to_default() {
        let config = BlockSortConfig {
            incomplete_block_regex: Some("(unclosed".to_string()),
            ..Default::default()
        };
        let (c, errors) = Classifier::new(&config, "typescript");
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            ConfigError::InvalidRegex { rule, .. } if rule == "incompleteBlockRegex"
        ));
        assert!(c.is_incomplete_block("if x"));
    }
}
