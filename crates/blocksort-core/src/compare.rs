//! Sort-key comparison.
//!
//! [`StringSortProvider`] wraps an injected [`Collate`] implementation with a direction, an
//! optional custom character order and an optional set of ignored characters. The
//! built-in [`Collator`] covers the collator options blocksort exposes: numeric digit
//! runs, case ordering and comparison sensitivity.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A string comparator.
pub trait Collate: fmt::Debug + Send + Sync {
    /// Compare two sort keys.
    fn compare(&self, a: &str, b: &str) -> Ordering;
}

/// Which case sorts first when two keys differ only in case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseFirst {
    /// Uppercase before lowercase.
    Upper,
    /// Lowercase before uppercase.
    Lower,
    /// Locale default (lowercase first); custom sort orders compare case-insensitively.
    #[default]
    False,
}

/// Which differences make two keys unequal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    /// Only base letters differ (`a = A`).
    #[default]
    Base,
    /// Base letters and accents differ; accents are not decomposed, so this behaves like
    /// [`Sensitivity::Base`].
    Accent,
    /// Base letters and case differ.
    Case,
    /// Every difference counts.
    Variant,
}

/// Options of the built-in [`Collator`] and of [`StringSortProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CollatorOptions {
    /// Accepted for compatibility; comparison is locale independent.
    pub locales: Option<String>,
    /// Compare digit runs by numeric value.
    pub numeric: bool,
    /// Case ordering.
    pub case_first: CaseFirst,
    /// Comparison sensitivity.
    pub sensitivity: Sensitivity,
    /// Characters in the order they should sort.
    pub custom_sort_order: Option<String>,
    /// Characters removed from keys before comparing.
    pub custom_ignore_characters: Option<String>,
}

impl Default for CollatorOptions {
    fn default() -> Self {
        Self {
            locales: None,
            numeric: true,
            case_first: CaseFirst::False,
            sensitivity: Sensitivity::Base,
            custom_sort_order: None,
            custom_ignore_characters: None,
        }
    }
}

/// Locale-independent collator.
///
/// Whitespace sorts before punctuation, punctuation before digits and digits before
/// letters. Letters compare case-insensitively first; case only breaks ties under
/// [`Sensitivity::Case`] and [`Sensitivity::Variant`].
#[derive(Debug, Clone, Default)]
pub struct Collator {
    numeric: bool,
    case_first: CaseFirst,
    sensitivity: Sensitivity,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Primary<'a> {
    Whitespace,
    Punctuation(char),
    Number(&'a str),
    Letter(char),
}

impl Collator {
    /// Create a collator from options.
    pub fn new(options: &CollatorOptions) -> Self {
        Self {
            numeric: options.numeric,
            case_first: options.case_first,
            sensitivity: options.sensitivity,
        }
    }

    fn primary_keys<'a>(&self, text: &'a str) -> Vec<Primary<'a>> {
        let mut keys = Vec::with_capacity(text.len());
        let mut chars = text.char_indices().peekable();
        while let Some((index, c)) = chars.next() {
            if self.numeric && c.is_ascii_digit() {
                let mut end = index + c.len_utf8();
                while let Some(&(next, d)) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    end = next + d.len_utf8();
                    chars.next();
                }
                keys.push(Primary::Number(&text[index..end]));
            } else if c.is_whitespace() {
                keys.push(Primary::Whitespace);
            } else if c.is_alphanumeric() {
                keys.push(Primary::Letter(fold_case(c)));
            } else {
                keys.push(Primary::Punctuation(c));
            }
        }
        keys
    }

    fn compare_case(&self, a: &str, b: &str) -> Ordering {
        for (x, y) in a.chars().zip(b.chars()) {
            if x == y || fold_case(x) != fold_case(y) {
                continue;
            }
            let upper_first = x.is_uppercase() && !y.is_uppercase();
            let ordering = if upper_first {
                Ordering::Less
            } else {
                Ordering::Greater
            };
            return match self.case_first {
                CaseFirst::Upper => ordering,
                CaseFirst::Lower | CaseFirst::False => ordering.reverse(),
            };
        }
        Ordering::Equal
    }
}

impl Collate for Collator {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        let primary = compare_primary(&self.primary_keys(a), &self.primary_keys(b));
        if primary != Ordering::Equal {
            return primary;
        }
        match self.sensitivity {
            Sensitivity::Base | Sensitivity::Accent => Ordering::Equal,
            Sensitivity::Case => self.compare_case(a, b),
            Sensitivity::Variant => self.compare_case(a, b).then_with(|| a.cmp(b)),
        }
    }
}

fn compare_primary(a: &[Primary<'_>], b: &[Primary<'_>]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        let ordering = match (x, y) {
            (Primary::Number(x), Primary::Number(y)) => compare_numeric(x, y),
            _ => x.cmp(y),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.len().cmp(&b.len())
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a_digits = a.trim_start_matches('0');
    let b_digits = b.trim_start_matches('0');
    a_digits
        .len()
        .cmp(&b_digits.len())
        .then_with(|| a_digits.cmp(b_digits))
        .then_with(|| a.len().cmp(&b.len()))
}

fn fold_case(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
    /// Shuffle.
    Rand,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            "rand" | "random" => Ok(Self::Rand),
            other => Err(format!("unknown sort direction '{other}'")),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
            Self::Rand => "rand",
        })
    }
}

/// Comparator used by the sort orchestrator.
#[derive(Debug, Clone)]
pub struct StringSortProvider {
    collator: Arc<dyn Collate>,
    direction: Direction,
    custom_sort_order: Option<Vec<char>>,
    ignore_characters: Option<Vec<char>>,
    ignore_case: bool,
}

impl StringSortProvider {
    /// Build a provider over the built-in [`Collator`].
    pub fn new(options: &CollatorOptions, direction: Direction) -> Self {
        Self::with_collator(Arc::new(Collator::new(options)), options, direction)
    }

    /// Build a provider over an injected collator.
    pub fn with_collator(
        collator: Arc<dyn Collate>,
        options: &CollatorOptions,
        direction: Direction,
    ) -> Self {
        let custom_sort_order = options
            .custom_sort_order
            .as_deref()
            .filter(|order| !order.is_empty())
            .map(|order| expand_sort_order(order, options.case_first));
        let ignore_characters = options
            .custom_ignore_characters
            .as_deref()
            .filter(|chars| !chars.is_empty())
            .map(|chars| chars.chars().collect());

        Self {
            collator,
            direction,
            custom_sort_order,
            ignore_characters,
            ignore_case: options.case_first == CaseFirst::False,
        }
    }

    /// The sort direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// A copy of this provider with another direction.
    pub fn with_direction(&self, direction: Direction) -> Self {
        Self {
            direction,
            ..self.clone()
        }
    }

    /// Compare two sort keys. Always `Equal` for [`Direction::Rand`].
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let signed = |ordering: Ordering| match self.direction {
            Direction::Desc => ordering.reverse(),
            _ => ordering,
        };
        if self.direction == Direction::Rand {
            return Ordering::Equal;
        }

        let (a, b) = match &self.ignore_characters {
            Some(ignored) => (
                a.chars().filter(|c| !ignored.contains(c)).collect::<String>(),
                b.chars().filter(|c| !ignored.contains(c)).collect::<String>(),
            ),
            None => (a.to_string(), b.to_string()),
        };

        if let Some(order) = &self.custom_sort_order {
            let a_chars: Vec<char> = a.chars().collect();
            let b_chars: Vec<char> = b.chars().collect();
            let min_len = a_chars.len().min(b_chars.len());
            for i in 0..min_len {
                let a_index = self.order_index(order, a_chars[i]);
                let b_index = self.order_index(order, b_chars[i]);
                match (a_index, b_index) {
                    (Some(x), Some(y)) if x != y => return signed(x.cmp(&y)),
                    (Some(_), Some(_)) => {
                        if i == min_len - 1 {
                            return signed(a_chars.len().cmp(&b_chars.len()));
                        }
                    }
                    _ => {
                        let diff = self.collator.compare(
                            a_chars[i].encode_utf8(&mut [0; 4]),
                            b_chars[i].encode_utf8(&mut [0; 4]),
                        );
                        if diff != Ordering::Equal {
                            return signed(diff);
                        }
                    }
                }
            }
        }

        signed(self.collator.compare(&a, &b))
    }

    fn order_index(&self, order: &[char], c: char) -> Option<usize> {
        let c = if self.ignore_case { fold_case(c) } else { c };
        order.iter().position(|&o| o == c)
    }
}

fn expand_sort_order(order: &str, case_first: CaseFirst) -> Vec<char> {
    let mut expanded = Vec::with_capacity(order.len() * 2);
    for c in order.chars() {
        let upper = c.to_uppercase().next().unwrap_or(c);
        let lower = c.to_lowercase().next().unwrap_or(c);
        match case_first {
            _ if upper == lower => expanded.push(c),
            CaseFirst::Upper => expanded.extend([upper, lower]),
            CaseFirst::Lower => expanded.extend([lower, upper]),
            CaseFirst::False => expanded.push(c),
        }
    }
    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(provider: &StringSortProvider, items: &[&str]) -> Vec<String> {
        let mut items: Vec<String> = items.iter().map(|s| s.to_string()).collect();
        items.sort_by(|a, b| provider.compare(a, b));
        items
    }

    #[test]
    fn test_numeric_collation() {
        let provider = StringSortProvider::new(&CollatorOptions::default(), Direction::Asc);
        assert_eq!(
            sorted(&provider, &["item10", "item9", "item1"]),
            vec!["item1", "item9", "item10"]
        );

        let options = CollatorOptions {
            numeric: false,
            ..Default::default()
        };
        let plain = StringSortProvider::new(&options, Direction::Asc);
        assert_eq!(
            sorted(&plain, &["item10", "item9"]),
            vec!["item10", "item9"]
        );
    }

    #[test]
    fn test_direction() {
        let asc = StringSortProvider::new(&CollatorOptions::default(), Direction::Asc);
        let desc = asc.with_direction(Direction::Desc);
        assert_eq!(sorted(&asc, &["zebra", "apple"]), vec!["apple", "zebra"]);
        assert_eq!(sorted(&desc, &["zebra", "apple"]), vec!["zebra", "apple"]);
        assert_eq!(
            sorted(&asc, &["3", "0", "1", "2"]),
            vec!["0", "1", "2", "3"]
        );
        assert_eq!(
            sorted(&desc, &["3", "0", "1", "2"]),
            vec!["3", "2", "1", "0"]
        );
        let rand = asc.with_direction(Direction::Rand);
        assert_eq!(rand.compare("a", "b"), Ordering::Equal);
    }

    #[test]
    fn test_base_sensitivity_ignores_case() {
        let provider = StringSortProvider::new(&CollatorOptions::default(), Direction::Asc);
        assert_eq!(provider.compare("Apple", "apple"), Ordering::Equal);
        assert_eq!(provider.compare("apple", "Banana"), Ordering::Less);
    }

    #[test]
    fn test_case_first() {
        let options = CollatorOptions {
            case_first: CaseFirst::Upper,
            sensitivity: Sensitivity::Case,
            ..Default::default()
        };
        let upper = StringSortProvider::new(&options, Direction::Asc);
        assert_eq!(upper.compare("Apple", "apple"), Ordering::Less);

        let options = CollatorOptions {
            case_first: CaseFirst::Lower,
            sensitivity: Sensitivity::Case,
            ..Default::default()
        };
        let lower = StringSortProvider::new(&options, Direction::Asc);
        assert_eq!(lower.compare("Apple", "apple"), Ordering::Greater);
    }

    #[test]
    fn test_custom_sort_order() {
        let options = CollatorOptions {
            custom_sort_order: Some("zyx".to_string()),
            ..Default::default()
        };
        let provider = StringSortProvider::new(&options, Direction::Asc);
        assert_eq!(sorted(&provider, &["x", "z", "y"]), vec!["z", "y", "x"]);
        assert_eq!(provider.compare("Z", "y"), Ordering::Less);
        assert_eq!(provider.compare("zy", "z"), Ordering::Greater);
    }

    #[test]
    fn test_custom_sort_order_case_expansion() {
        assert_eq!(expand_sort_order("a1", CaseFirst::Upper), vec!['A', 'a', '1']);
        assert_eq!(expand_sort_order("a1", CaseFirst::Lower), vec!['a', 'A', '1']);
        assert_eq!(expand_sort_order("a1", CaseFirst::False), vec!['a', '1']);
    }

    #[test]
    fn test_ignore_characters() {
        let options = CollatorOptions {
            custom_ignore_characters: Some("_$".to_string()),
            ..Default::default()
        };
        let provider = StringSortProvider::new(&options, Direction::Asc);
        assert_eq!(sorted(&provider, &["_b", "$c", "a"]), vec!["a", "_b", "$c"]);
    }

    #[test]
    fn test_punctuation_before_digits_before_letters() {
        let collator = Collator::new(&CollatorOptions::default());
        assert_eq!(collator.compare(" a", "-a"), Ordering::Less);
        assert_eq!(collator.compare("-a", "1a"), Ordering::Less);
        assert_eq!(collator.compare("9", "a"), Ordering::Less);
    }

    #[test]
    fn test_direction_from_str() {
        assert_eq!("DESC".parse::<Direction>(), Ok(Direction::Desc));
        assert!("sideways".parse::<Direction>().is_err());
    }
}
