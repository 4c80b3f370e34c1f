//! String normalization, casefolding and punctuation handling.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use super::{NormalizeConfig, UnicodeForm};

/// Characters removed by [`strip_leading_punctuation`].
pub const DEFAULT_LEADING_PUNCTUATION: &str = " \t\\#*!¡?/:;.,=(['\"´`” \u{308}";

const TRAILING_PUNCTUATION: &[char] = &[' ', '/', ':', ';', ',', '=', '(', '['];

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ID_SORT_KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w*?(\d+)$").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static XML_INTER_TAG_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static DIGIT_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static MULTI_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static COORDINATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([eEwWnNsS])(\d{3})(\d{2})(\d{2})").expect("valid regex")
});

fn transliterate(c: char) -> Option<&'static str> {
    let s = match c {
        'Š' => "S",
        'š' => "s",
        'Ž' => "Z",
        'ž' => "z",
        'À' | 'Á' | 'Â' | 'Ã' | 'Æ' => "A",
        'Ç' => "C",
        'È' | 'É' | 'Ê' | 'Ë' => "E",
        'Ì' | 'Í' | 'Î' | 'Ï' => "I",
        'Ñ' => "N",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ø' => "O",
        'Ù' | 'Ú' | 'Û' | 'Ü' => "U",
        'Ý' => "Y",
        'Þ' => "B",
        'ß' => "Ss",
        'à' | 'á' | 'â' | 'ã' | 'æ' => "a",
        'ç' => "c",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ð' | 'ò' | 'ó' | 'ô' | 'õ' | 'ø' => "o",
        'ñ' => "n",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'ý' | 'ÿ' => "y",
        'þ' => "b",
        _ => return None,
    };
    Some(s)
}

/// Characters that survive [`normalize`]: ASCII digits, the ASCII range
/// `A..=z` and the Nordic letters Ä Å Ö ä å ö.
fn is_key_char(c: char) -> bool {
    c.is_ascii_digit() || ('A'..='z').contains(&c) || matches!(c, 'Ä' | 'Å' | 'Ö' | 'ä' | 'å' | 'ö')
}

/// Normalize a string for comparison.
///
/// Accented Latin letters are folded to ASCII, everything that is not a
/// letter or digit is dropped and the result is lowercased.
///
/// # Examples
/// ```
/// use lido_indexer::normalize::normalize;
///
/// assert_eq!(normalize("  Café Müller, 1920! "), "cafemuller1920");
/// assert_eq!(normalize("Åbo Ödemark"), "åboödemark");
/// ```
pub fn normalize(s: &str) -> String {
    let mut folded = String::with_capacity(s.len());
    for c in s.chars() {
        match transliterate(c) {
            Some(t) => folded.push_str(t),
            None => folded.push(c),
        }
    }
    folded
        .chars()
        .filter(|c| is_key_char(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Check whether two author names plausibly refer to the same person.
///
/// Names are `LastName FirstName`. The first word must match exactly, later
/// words need at least the same initial letter.
pub fn author_match(a1: &str, a2: &str) -> bool {
    if a1 == a2 {
        return true;
    }
    let l1 = a1.chars().count();
    let l2 = a2.chars().count();
    if l1 < 6 || l2 < 6 {
        return false;
    }

    let shorter = l1.min(l2);
    if a1.chars().take(shorter).eq(a2.chars().take(shorter)) {
        return true;
    }

    for (i, (w1, w2)) in a1.split(' ').zip(a2.split(' ')).enumerate() {
        if w1 != w2 && (i == 0 || w1.chars().next() != w2.chars().next()) {
            return false;
        }
    }
    true
}

/// Check whether the string ends in punctuation that
/// [`strip_trailing_punctuation`] would consider removing.
pub fn has_trailing_punctuation(s: &str) -> bool {
    let trimmed = s.trim_end_matches(' ');
    let Some(last) = trimmed.chars().last() else {
        return false;
    };
    if "/:;,=([".contains(last) {
        return true;
    }
    s.ends_with('.') && !third_last_is_space(s)
}

fn third_last_is_space(s: &str) -> bool {
    let chars: Vec<char> = s.chars().collect();
    let idx = chars.len().saturating_sub(3);
    chars.get(idx) == Some(&' ')
}

fn is_numeric(word: &str) -> bool {
    word.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+')
        && word.parse::<f64>().is_ok()
}

/// Strip trailing spaces and punctuation characters from a string.
///
/// A final period is kept after initials (`Smith, A.`), numbers and
/// configured abbreviations. Unbalanced closing brackets are removed.
///
/// # Examples
/// ```
/// use lido_indexer::normalize::{strip_trailing_punctuation, NormalizeConfig};
///
/// let config = NormalizeConfig::default();
/// assert_eq!(strip_trailing_punctuation("Die Brücke. /", &config), "Die Brücke");
/// assert_eq!(strip_trailing_punctuation("Smith, A.", &config), "Smith, A.");
/// ```
pub fn strip_trailing_punctuation(s: &str, config: &NormalizeConfig) -> String {
    let mut out = s.trim_end_matches(TRAILING_PUNCTUATION).to_string();

    if out.ends_with('.') && !third_last_is_space(&out) {
        let last_word = match out.rfind(' ') {
            Some(p) if p > 0 => &out[p + 1..],
            _ => out.as_str(),
        };
        let lower = last_word.to_lowercase();
        if !is_numeric(last_word) && !config.abbreviations.iter().any(|a| *a == lower) {
            out.pop();
        }
    }
    if out.ends_with(". -") {
        out.truncate(out.len() - 3);
    }
    if (out.ends_with(')') && !out.contains('(')) || (out.ends_with(']') && !out.contains('[')) {
        out.pop();
    }

    out
}

/// Strip leading spaces and punctuation characters from a string.
pub fn strip_leading_punctuation(s: &str) -> &str {
    s.trim_start_matches(|c: char| DEFAULT_LEADING_PUNCTUATION.contains(c))
}

/// Strip the first matching leading article, compared case-insensitively.
///
/// # Examples
/// ```
/// use lido_indexer::normalize::{strip_leading_article, NormalizeConfig};
///
/// let config = NormalizeConfig::default();
/// assert_eq!(strip_leading_article("Der blaue Reiter", &config), "blaue Reiter");
/// assert_eq!(strip_leading_article("Dessert", &config), "Dessert");
/// ```
pub fn strip_leading_article<'a>(s: &'a str, config: &NormalizeConfig) -> &'a str {
    for article in &config.articles {
        let len = article.len();
        if s.len() >= len
            && s.is_char_boundary(len)
            && s[..len].to_lowercase() == article.to_lowercase()
        {
            return &s[len..];
        }
    }
    s
}

/// Remove case-insensitive duplicates, keeping the first spelling seen.
pub fn iunique<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    values
        .into_iter()
        .map(Into::into)
        .filter(|v: &String| seen.insert(v.to_lowercase()))
        .collect()
}

/// Remove exact duplicates, keeping first-seen order.
///
/// # Examples
/// ```
/// use lido_indexer::normalize::unique_preserving_order;
///
/// let names = ["Smith, A.", "Smith, A.", "Jones, B."];
/// assert_eq!(unique_preserving_order(names), vec!["Smith, A.", "Jones, B."]);
/// ```
pub fn unique_preserving_order<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    values
        .into_iter()
        .map(Into::into)
        .filter(|v: &String| seen.insert(v.clone()))
        .collect()
}

/// Find the trailing numeric part of a record id to sort by.
pub fn create_id_sort_key(id: &str) -> String {
    ID_SORT_KEY_PATTERN
        .captures(id)
        .and_then(|c| c.get(1))
        .map_or_else(|| id.to_string(), |m| m.as_str().to_string())
}

/// Remove whitespace between tags, leaving text content alone.
pub fn trim_xml_whitespace(xml: &str) -> String {
    XML_INTER_TAG_WHITESPACE
        .replace_all(xml.trim(), "><")
        .into_owned()
}

/// Uppercase the first character.
pub fn uc_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Apply the configured Unicode normalization form, if any.
pub fn normalize_unicode(s: &str, config: &NormalizeConfig) -> String {
    match config.unicode_form {
        Some(UnicodeForm::Nfc) => s.nfc().collect(),
        Some(UnicodeForm::Nfd) => s.nfd().collect(),
        Some(UnicodeForm::Nfkc) => s.nfkc().collect(),
        Some(UnicodeForm::Nfkd) => s.nfkd().collect(),
        None => s.to_string(),
    }
}

/// Trim the given characters from both ends of every value.
pub fn array_trim(values: &[String], chars: &[char]) -> Vec<String> {
    values
        .iter()
        .map(|v| v.trim_matches(chars).to_string())
        .collect()
}

/// Make a string numerically sortable.
///
/// Every digit run is prefixed with the length of its numeric value, so
/// `Nr. 10` sorts after `Nr. 9`.
///
/// # Examples
/// ```
/// use lido_indexer::normalize::create_sortable_string;
///
/// assert_eq!(create_sortable_string("Nr. 9"), "NR. 19");
/// assert_eq!(create_sortable_string("Nr.  10"), "NR. 210");
/// ```
pub fn create_sortable_string(s: &str) -> String {
    let upper = s.to_uppercase();
    let numbered = DIGIT_RUN.replace_all(&upper, |caps: &regex::Captures<'_>| {
        let digits = &caps[0];
        let significant = digits.trim_start_matches('0').len().max(1);
        format!("{significant}{digits}")
    });
    MULTI_WHITESPACE.replace_all(&numbered, " ").into_owned()
}

/// Remove carriage returns, line feeds and tabs.
pub fn strip_control_characters(s: &str) -> String {
    s.chars().filter(|c| !matches!(c, '\r' | '\n' | '\t')).collect()
}

/// Convert a coordinate in `[EWSN]DDDMMSS` form, or a plain decimal, to a
/// decimal degree value.
///
/// # Examples
/// ```
/// use lido_indexer::normalize::coordinate_to_decimal;
///
/// assert_eq!(coordinate_to_decimal("E0123000"), Some(12.5));
/// assert_eq!(coordinate_to_decimal("W0123000"), Some(-12.5));
/// assert_eq!(coordinate_to_decimal(""), None);
/// ```
pub fn coordinate_to_decimal(value: &str) -> Option<f64> {
    if value.is_empty() {
        return None;
    }
    if let Some(caps) = COORDINATE_PATTERN.captures(value) {
        let deg: f64 = caps[2].parse().ok()?;
        let min: f64 = caps[3].parse().ok()?;
        let sec: f64 = caps[4].parse().ok()?;
        let dec = deg + min / 60.0 + sec / 3600.0;
        return Some(if matches!(&caps[1], "w" | "W" | "s" | "S") {
            -dec
        } else {
            dec
        });
    }
    value.trim().parse().ok()
}
