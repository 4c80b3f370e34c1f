//! ISBN helpers.

use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ISBN10_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{9})[0-9xX]$").expect("valid regex"));

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ISBN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]{9,12}[0-9xX])").expect("valid regex"));

/// Convert an ISBN-10 (without dashes) to ISBN-13.
///
/// Returns `None` when the input is not nine digits followed by a digit or `X`.
///
/// # Examples
/// ```
/// use lido_indexer::normalize::isbn10_to_13;
///
/// assert_eq!(isbn10_to_13("0306406152").as_deref(), Some("9780306406157"));
/// assert_eq!(isbn10_to_13("03064O6152"), None);
/// ```
pub fn isbn10_to_13(isbn: &str) -> Option<String> {
    let caps = ISBN10_PATTERN.captures(isbn)?;
    let body = caps.get(1)?.as_str();

    let digits: Vec<u32> = body.chars().filter_map(|c| c.to_digit(10)).collect();
    // 978 prefix contributes 9 + 3*7 + 8
    let sum: u32 = 38
        + digits
            .iter()
            .enumerate()
            .map(|(i, d)| if i % 2 == 0 { 3 * d } else { *d })
            .sum::<u32>();
    let check = (10 - sum % 10) % 10;

    Some(format!("978{body}{check}"))
}

/// Normalize an ISBN to ISBN-13 without dashes.
///
/// Returns an empty string when no ISBN-like digit run is found.
pub fn normalize_isbn(isbn: &str) -> String {
    let compact = isbn.replace('-', "");
    let Some(found) = ISBN_PATTERN.captures(&compact).and_then(|c| c.get(1)) else {
        return String::new();
    };
    let found = found.as_str();
    if found.len() == 10 {
        return isbn10_to_13(found).unwrap_or_default();
    }
    found.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isbn10_to_13_published_example() {
        assert_eq!(isbn10_to_13("0306406152").as_deref(), Some("9780306406157"));
    }

    #[test]
    fn test_isbn10_to_13_x_check_digit() {
        // The ISBN-10 check digit is dropped and recomputed.
        assert_eq!(isbn10_to_13("080442957X").as_deref(), Some("9780804429573"));
    }

    #[test]
    fn test_isbn10_to_13_invalid() {
        assert_eq!(isbn10_to_13("ABCDEFGHIJ"), None);
        assert_eq!(isbn10_to_13("030640615"), None);
        assert_eq!(isbn10_to_13("03064061521"), None);
        assert_eq!(isbn10_to_13(""), None);
    }

    #[test]
    fn test_normalize_isbn() {
        assert_eq!(normalize_isbn("0-306-40615-2"), "9780306406157");
        assert_eq!(normalize_isbn("978-0-306-40615-7"), "9780306406157");
        assert_eq!(normalize_isbn("ISBN 978-0-306-40615-7 (pbk.)"), "9780306406157");
        assert_eq!(normalize_isbn("no isbn"), "");
    }
}
