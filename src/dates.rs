//! Publication date resolution.
//!
//! Dates come from page metadata in whatever shape the site publishes them
//! (`2024-01-05T10:00:00Z`, `March 3, 2024`, `Tue, 05 Mar 2024 ...`). A
//! [`DateParser`] turns those into calendar dates; when metadata yields
//! nothing, a `/YYYY/` segment in the URL is used as a year-only fallback.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt;
use tracing::debug;

static ORDINAL_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").unwrap());
static ISO_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4}-\d{2}-\d{2})").unwrap());
static URL_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(\d{4})/").unwrap());

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%b. %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%d %B, %Y",
    "%A, %B %d, %Y",
    "%a, %b %d, %Y",
    "%A %d %B %Y",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%Y%m%d",
];

const MONTH_FORMATS: &[&str] = &["%B %Y", "%b %Y", "%Y-%m"];

/// `%Y` accepts any digit count, so `%B %d %Y` reads "March 2024" as day 20
/// of year 24. Years below this are treated as misparses.
const MIN_PLAUSIBLE_YEAR: i32 = 1000;

fn plausible(date: NaiveDate) -> Option<NaiveDate> {
    (date.year() >= MIN_PLAUSIBLE_YEAR).then_some(date)
}

/// Raised when a date string matches none of the known shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParseError(pub String);

impl fmt::Display for DateParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized date: {:?}", self.0)
    }
}

impl Error for DateParseError {}

/// Turns an arbitrary date string into a calendar date.
pub trait DateParser {
    fn parse(&self, raw: &str) -> Result<NaiveDate, Box<dyn Error>>;
}

/// [`DateParser`] backed by chrono's structured and `strftime` parsers.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChronoDateParser;

impl DateParser for ChronoDateParser {
    fn parse(&self, raw: &str) -> Result<NaiveDate, Box<dyn Error>> {
        let cleaned = raw.trim();
        if cleaned.is_empty() {
            return Err(Box::new(DateParseError(raw.to_string())));
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(cleaned) {
            return Ok(dt.date_naive());
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(cleaned) {
            return Ok(dt.date_naive());
        }
        for format in DATETIME_FORMATS {
            if let Some(date) = NaiveDateTime::parse_from_str(cleaned, format)
                .ok()
                .and_then(|dt| plausible(dt.date()))
            {
                return Ok(date);
            }
        }

        let cleaned = ORDINAL_SUFFIX.replace_all(cleaned, "$1");
        let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
        for format in DATE_FORMATS {
            if let Some(date) = NaiveDate::parse_from_str(&cleaned, format)
                .ok()
                .and_then(plausible)
            {
                return Ok(date);
            }
        }
        for format in MONTH_FORMATS {
            let padded = format!("{cleaned} 01");
            if let Some(date) = NaiveDate::parse_from_str(&padded, &format!("{format} %d"))
                .ok()
                .and_then(plausible)
            {
                return Ok(date);
            }
        }

        // Timestamps with offsets chrono rejects still start with a usable date.
        if let Some(caps) = ISO_PREFIX.captures(&cleaned) {
            if let Ok(date) = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d") {
                return Ok(date);
            }
        }

        Err(Box::new(DateParseError(raw.to_string())))
    }
}

/// Interpret a metadata date; any parse failure is treated as "no date".
///
/// # Arguments
///
/// * `parser` - The date parser to delegate to
/// * `raw` - The raw metadata value, if the page had one
///
/// # Returns
///
/// The calendar date, or `None` when `raw` is absent or unparseable. Failures
/// are logged at debug level and never propagated.
pub fn normalize_date<P: DateParser>(parser: &P, raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?;
    match parser.parse(raw) {
        Ok(date) => Some(date),
        Err(e) => {
            debug!(raw, error = %e, "Discarding unparseable date");
            None
        }
    }
}

/// January 1st of the first `/YYYY/` path segment in `url`, if any.
pub fn year_from_url(url: &str) -> Option<NaiveDate> {
    let caps = URL_YEAR.captures(url)?;
    let year: i32 = caps[1].parse().ok()?;
    NaiveDate::from_ymd_opt(year, 1, 1)
}

/// Metadata date first, then the URL-embedded year.
pub fn resolve_date<P: DateParser>(parser: &P, raw: Option<&str>, url: &str) -> Option<NaiveDate> {
    normalize_date(parser, raw).or_else(|| year_from_url(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn parse(raw: &str) -> Option<NaiveDate> {
        normalize_date(&ChronoDateParser, Some(raw))
    }

    #[test]
    fn test_human_dates() {
        assert_eq!(parse("March 3, 2024"), Some(ymd(2024, 3, 3)));
        assert_eq!(parse("Mar 3, 2024"), Some(ymd(2024, 3, 3)));
        assert_eq!(parse("3 March 2024"), Some(ymd(2024, 3, 3)));
        assert_eq!(parse("March 3rd, 2024"), Some(ymd(2024, 3, 3)));
        assert_eq!(parse("Sunday, March 3, 2024"), Some(ymd(2024, 3, 3)));
        assert_eq!(parse("March 2024"), Some(ymd(2024, 3, 1)));
    }

    #[test]
    fn test_month_and_year_keep_four_digit_year() {
        assert_eq!(parse("Jan 2025"), Some(ymd(2025, 1, 1)));
        assert_eq!(parse("September 2023"), Some(ymd(2023, 9, 1)));
        assert_eq!(parse("2023-09"), Some(ymd(2023, 9, 1)));
        assert_eq!(parse("March 3 2024"), Some(ymd(2024, 3, 3)));
    }

    #[test]
    fn test_structured_dates() {
        assert_eq!(parse("2024-01-05"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse("2024-01-05T10:30:00Z"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse("2024-01-05T10:30:00.123+02:00"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse("2024-01-05T10:30:00"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse("Fri, 05 Jan 2024 10:30:00 GMT"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse("2024/01/05"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse("2024-01-05T10:30:00+0200"), Some(ymd(2024, 1, 5)));
    }

    #[test]
    fn test_unparseable_is_none() {
        assert_eq!(parse("yesterday-ish"), None);
        assert_eq!(parse(""), None);
        assert_eq!(parse("2024-13-45"), None);
        assert_eq!(normalize_date(&ChronoDateParser, None), None);
    }

    #[test]
    fn test_year_from_url() {
        assert_eq!(year_from_url("https://x.com/2021/foo"), Some(ymd(2021, 1, 1)));
        assert_eq!(year_from_url("https://x.com/blog/2021"), None);
        assert_eq!(year_from_url("https://x.com/blog/20211/foo"), None);
    }

    #[test]
    fn test_resolve_date_precedence() {
        let parser = ChronoDateParser;
        assert_eq!(
            resolve_date(&parser, Some("March 3, 2024"), "https://x.com/2021/foo"),
            Some(ymd(2024, 3, 3))
        );
        assert_eq!(
            resolve_date(&parser, None, "https://x.com/2021/foo"),
            Some(ymd(2021, 1, 1))
        );
        assert_eq!(
            resolve_date(&parser, Some("garbage"), "https://x.com/2021/foo"),
            Some(ymd(2021, 1, 1))
        );
        assert_eq!(resolve_date(&parser, None, "https://x.com/blog/foo"), None);
    }

    struct FailingParser;

    impl DateParser for FailingParser {
        fn parse(&self, raw: &str) -> Result<NaiveDate, Box<dyn Error>> {
            Err(Box::new(DateParseError(raw.to_string())))
        }
    }

    #[test]
    fn test_parser_errors_never_propagate() {
        assert_eq!(normalize_date(&FailingParser, Some("2024-01-05")), None);
    }
}
