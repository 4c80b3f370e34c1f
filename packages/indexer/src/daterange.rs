//! Date range resolution for LIDO events.
//!
//! LIDO carries dates as partial point dates (`earliestDate`/`latestDate`),
//! free display text or period names. The resolver turns point dates into a
//! pair of full ISO 8601 instants and passes display and period text through
//! unchanged, unless a [`TextRangeParser`] is installed.

use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};

use crate::error::{LidoError, Result};
use crate::normalize::extract_year;

/// Raw date values harvested from the events of one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateValues {
    pub start: String,
    pub end: String,
    pub display: String,
    pub period: String,
}

/// Two full ISO 8601 instants with `start <= end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

/// A resolved date: a proper range or text passed through as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateSpan {
    Range(DateRange),
    Text(String),
}

impl DateSpan {
    /// Year used for sorting: the year of the range start, or the first year
    /// mentioned in the text.
    #[must_use]
    pub fn sort_year(&self) -> String {
        match self {
            Self::Range(range) => extract_year(&range.start),
            Self::Text(text) => extract_year(text),
        }
    }
}

/// Best-effort parser for free-text dates such as `um 1900` or `19. Jh.`.
pub trait TextRangeParser: Send + Sync {
    /// Return a range for the text, or `None` to keep it as text.
    fn parse(&self, text: &str) -> Option<DateRange>;
}

/// Resolves harvested date values to a [`DateSpan`].
#[derive(Clone, Default)]
pub struct DateRangeResolver {
    text_parser: Option<Arc<dyn TextRangeParser>>,
}

impl fmt::Debug for DateRangeResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DateRangeResolver")
            .field("text_parser", &self.text_parser.is_some())
            .finish()
    }
}

impl DateRangeResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a parser for display dates and period names.
    #[must_use]
    pub fn with_text_parser(mut self, parser: Arc<dyn TextRangeParser>) -> Self {
        self.text_parser = Some(parser);
        self
    }

    /// Resolve date values harvested from a record.
    ///
    /// # Arguments
    /// * `values` - Point dates, display text and period name
    /// * `source_id` - Source of the record, for error messages
    /// * `record_id` - Native id of the record, for error messages
    ///
    /// # Returns
    /// * `Ok(Some(DateSpan::Range))` when both point dates are present
    /// * `Ok(Some(DateSpan::Text))` for display text or a period name
    /// * `Ok(None)` when there is no date information, or a month cannot be
    ///   completed
    /// * `Err(LidoError::InvalidDateRange)` when the end lies before the start
    ///
    /// # Examples
    /// ```
    /// use lido_indexer::daterange::{DateRange, DateRangeResolver, DateSpan, DateValues};
    ///
    /// let values = DateValues {
    ///     start: "1900".into(),
    ///     end: "1902".into(),
    ///     ..DateValues::default()
    /// };
    /// let span = DateRangeResolver::new().resolve(&values, "", "x").unwrap();
    /// assert_eq!(
    ///     span,
    ///     Some(DateSpan::Range(DateRange {
    ///         start: "1900-01-01T00:00:00Z".into(),
    ///         end: "1902-12-31T23:59:59Z".into(),
    ///     }))
    /// );
    /// ```
    pub fn resolve(
        &self,
        values: &DateValues,
        source_id: &str,
        record_id: &str,
    ) -> Result<Option<DateSpan>> {
        if !values.start.is_empty() && !values.end.is_empty() {
            if ends_before_start(&values.start, &values.end) {
                return Err(LidoError::InvalidDateRange {
                    start: values.start.clone(),
                    end: values.end.clone(),
                    source_id: source_id.to_string(),
                    record_id: record_id.to_string(),
                });
            }
            let (Some(start), Some(end)) = (
                complete_date(&values.start, false),
                complete_date(&values.end, true),
            ) else {
                tracing::debug!(
                    start = %values.start,
                    end = %values.end,
                    record = %record_id,
                    "date range cannot be completed"
                );
                return Ok(None);
            };
            return Ok(Some(DateSpan::Range(DateRange { start, end })));
        }

        for text in [&values.display, &values.period] {
            if !text.is_empty() {
                return Ok(Some(self.resolve_text(text)));
            }
        }

        Ok(None)
    }

    fn resolve_text(&self, text: &str) -> DateSpan {
        self.text_parser
            .as_ref()
            .and_then(|parser| parser.parse(text))
            .map_or_else(|| DateSpan::Text(text.to_string()), DateSpan::Range)
    }
}

/// Bounds that are both plain integers (years, possibly negative) compare
/// numerically; anything else compares as text.
fn ends_before_start(start: &str, end: &str) -> bool {
    match (start.parse::<i64>(), end.parse::<i64>()) {
        (Ok(start), Ok(end)) => end < start,
        _ => end < start,
    }
}

/// Complete a partial date to a full ISO 8601 instant.
///
/// A leading `-` is kept aside and re-attached. Lengths outside
/// 1, 2, 3, 4, 7 and 10 are returned unmodified.
///
/// # Returns
/// `None` only for a `YYYY-MM` end bound whose month is not a real month.
///
/// # Examples
/// ```
/// use lido_indexer::daterange::complete_date;
///
/// assert_eq!(complete_date("1975-06-12", false).as_deref(), Some("1975-06-12T00:00:00Z"));
/// assert_eq!(complete_date("1900-02", true).as_deref(), Some("1900-02-28T23:59:59Z"));
/// assert_eq!(complete_date("-5", false).as_deref(), Some("-0005-01-01T00:00:00Z"));
/// ```
pub fn complete_date(date: &str, end: bool) -> Option<String> {
    let (negative, date) = match date.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, date),
    };

    let completed = match (date.len(), end) {
        (1..=3, false) => format!("{date:0>4}-01-01T00:00:00Z"),
        (4, false) => format!("{date}-01-01T00:00:00Z"),
        (7, false) => format!("{date}-01T00:00:00Z"),
        (10, false) => format!("{date}T00:00:00Z"),
        (1, true) => format!("{date:0>3}-12-31T23:59:59Z"),
        (2..=3, true) => format!("{date:0>4}-12-31T23:59:59Z"),
        (4, true) => format!("{date}-12-31T23:59:59Z"),
        (7, true) => format!("{}T23:59:59Z", last_day_of_month(date)?),
        (10, true) => format!("{date}T23:59:59Z"),
        _ => date.to_string(),
    };

    Some(if negative {
        format!("-{completed}")
    } else {
        completed
    })
}

fn last_day_of_month(year_month: &str) -> Option<String> {
    let first = NaiveDate::parse_from_str(&format!("{year_month}-01"), "%Y-%m-%d").ok()?;
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)?
    };
    let last = next.pred_opt()?;
    Some(format!("{year_month}-{:02}", last.day()))
}

/// List every year covered by a range, inclusive.
///
/// # Examples
/// ```
/// use lido_indexer::daterange::{years_in_range, DateRange};
///
/// let range = DateRange {
///     start: "1900-01-01T00:00:00Z".into(),
///     end: "1902-12-31T23:59:59Z".into(),
/// };
/// assert_eq!(years_in_range(&range), vec![1900, 1901, 1902]);
/// ```
pub fn years_in_range(range: &DateRange) -> Vec<i64> {
    let year = |s: &str| extract_year(s).parse::<i64>().ok();
    match (year(&range.start), year(&range.end)) {
        (Some(start), Some(end)) if start <= end => (start..=end).collect(),
        _ => Vec::new(),
    }
}
