//! Title heuristics: dedup keys and main-title splitting.

use std::sync::LazyLock;

use regex::Regex;

use super::text::{normalize, strip_leading_punctuation, strip_trailing_punctuation};
use super::NormalizeConfig;

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static YEAR_WITH_PERIOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}\.$").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static HYPHEN_ABBREVIATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r".+-\w{1,2}\.$").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static INITIALS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w\.\w\.$").expect("valid regex"));

/// Create a normalized title key for deduplication.
///
/// Words are collected until more than three long words or more than 35
/// characters are seen. Titles starting with a configured full-title prefix
/// keep up to 100 characters.
///
/// # Examples
/// ```
/// use lido_indexer::normalize::{create_title_key, NormalizeConfig};
///
/// let config = NormalizeConfig::default();
/// assert_eq!(
///     create_title_key("Bildnis einer jungen Frau mit Perlenohrring", &config),
///     "bildniseinerjungenfrau"
/// );
/// ```
pub fn create_title_key(title: &str, config: &NormalizeConfig) -> String {
    let normal_title = normalize(title);
    let full = config
        .full_title_prefixes
        .iter()
        .any(|prefix| normal_title.starts_with(prefix.as_str()));

    let mut key = String::new();
    let mut long_words = 0;
    let mut key_len = 0;
    for word in title.split(' ') {
        key.push_str(word);
        let word_len = word.chars().count();
        if word_len > 3 {
            long_words += 1;
        }
        key_len += word_len;
        if (!full && (long_words > 3 || key_len > 35)) || (full && key_len > 100) {
            break;
        }
    }

    normalize(&key)
}

/// Split a title into its main part at the first plausible sentence break.
///
/// # Returns
/// The main title with trailing punctuation stripped, or `None` when no
/// break was found.
///
/// # Examples
/// ```
/// use lido_indexer::normalize::{split_title, NormalizeConfig};
///
/// let config = NormalizeConfig::default();
/// assert_eq!(
///     split_title("Landschaft mit Mühle. Studie in Öl", &config).as_deref(),
///     Some("Landschaft mit Mühle")
/// );
/// assert_eq!(split_title("Landschaft mit Mühle", &config), None);
/// ```
pub fn split_title(title: &str, config: &NormalizeConfig) -> Option<String> {
    let title = WHITESPACE.replace_all(title, " ");
    let words: Vec<&str> = title.split(' ').collect();

    let mut paren_level: i32 = 0;
    let mut bracket_level: i32 = 0;
    for (idx, word) in words.iter().enumerate() {
        let position = idx + 1;
        paren_level += count_char(word, '(') - count_char(word, ')');
        bracket_level += count_char(word, '[') - count_char(word, ']');
        if paren_level != 0 || bracket_level != 0 {
            continue;
        }
        // Avoid splitting at short words or the very beginning
        if !(word.ends_with('.') && word.len() > 2 && (position > 1 || word.len() > 4)) {
            continue;
        }

        let lead_stripped = strip_leading_punctuation(word);
        let stripped = strip_trailing_punctuation(lead_stripped, config);
        let Some(next_first) = words.get(position).and_then(|w| w.chars().next()) else {
            continue;
        };

        let strippable = lead_stripped != stripped || YEAR_WITH_PERIOD.is_match(word);
        let capital_or_digit = next_first.is_ascii_digit() || !next_first.is_lowercase();
        if strippable
            && capital_or_digit
            && !HYPHEN_ABBREVIATION.is_match(word)
            && !INITIALS.is_match(word)
        {
            return Some(strip_trailing_punctuation(&words[..position].join(" "), config));
        }
    }

    None
}

fn count_char(word: &str, c: char) -> i32 {
    i32::try_from(word.matches(c).count()).unwrap_or(i32::MAX)
}
