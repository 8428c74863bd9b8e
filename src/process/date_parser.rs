use chrono::{
    format::{Item, StrftimeItems},
    Months, NaiveDate, NaiveDateTime,
};
use std::fmt::Write;

use crate::error::{PipelineError, Result};

/// Storefront month headers, e.g. `"Jan 2023"`.
pub const MONTH_LABEL_FORMAT: &str = "%b %Y";
/// Canonical rendering for App Store dates. Zero padded, so string order is
/// date order.
pub const YMD_SLASH: &str = "%Y/%m/%d";

/// Parse `"Mon YYYY"` into the first day of that month.
pub fn parse_month_label(label: &str) -> Result<NaiveDate> {
    let padded = format!("01 {}", label.trim());
    NaiveDate::parse_from_str(&padded, "%d %b %Y")
        .map_err(|_| PipelineError::InvalidMonthLabel(label.to_string()))
}

/// `"YYYY/MM/DD"`
pub fn render_ymd(date: NaiveDate) -> String {
    date.format(YMD_SLASH).to_string()
}

/// `count` consecutive month labels starting at `first` (`"Jan 2023"`, …).
pub fn month_labels(first: &str, count: usize) -> Result<Vec<String>> {
    let start = parse_month_label(first)?;
    (0..count)
        .map(|i| {
            start
                .checked_add_months(Months::new(i as u32))
                .map(|d| d.format(MONTH_LABEL_FORMAT).to_string())
                .ok_or_else(|| PipelineError::InvalidMonthLabel(first.to_string()))
        })
        .collect()
}

/// A caller-declared strftime pattern, checked once so that parsing and
/// rendering with it can no longer fail on the pattern itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    pattern: String,
}

impl DateFormat {
    pub fn new(pattern: &str) -> Result<Self> {
        let invalid = || PipelineError::InvalidDateFormat(pattern.to_string());
        if pattern.trim().is_empty() {
            return Err(invalid());
        }
        if StrftimeItems::new(pattern).any(|i| matches!(i, Item::Error)) {
            return Err(invalid());
        }
        // Patterns needing an offset (%z, %Z, ...) cannot render a naive value.
        let probe = NaiveDate::from_ymd_opt(2000, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(invalid)?;
        let mut sink = String::new();
        write!(sink, "{}", probe.format(pattern)).map_err(|_| invalid())?;

        Ok(DateFormat {
            pattern: pattern.to_string(),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// `None` when `raw` does not match the pattern. Date-only patterns yield
    /// midnight.
    pub fn parse(&self, raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        NaiveDateTime::parse_from_str(raw, &self.pattern)
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(raw, &self.pattern)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    }

    pub fn render(&self, value: &NaiveDateTime) -> String {
        value.format(&self.pattern).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_label_renders_as_first_of_month() {
        let d = parse_month_label("Jan 2023").unwrap();
        assert_eq!(render_ymd(d), "2023/01/01");
        assert_eq!(render_ymd(parse_month_label(" Dec 2023").unwrap()), "2023/12/01");
        assert!(parse_month_label("Total").is_err());
    }

    #[test]
    fn month_labels_roll_over_years() {
        let labels = month_labels("Nov 2023", 4).unwrap();
        assert_eq!(labels, vec!["Nov 2023", "Dec 2023", "Jan 2024", "Feb 2024"]);
        assert_eq!(month_labels("Jan 2023", 17).unwrap().last().unwrap(), "May 2024");
    }

    #[test]
    fn play_format_round_trips() {
        let f = DateFormat::new("%b %d, %Y").unwrap();
        for raw in ["Jan 01, 2023", "Feb 28, 2024", "Dec 31, 1999"] {
            let parsed = f.parse(raw).unwrap();
            assert_eq!(f.render(&parsed), raw);
        }
        assert!(f.parse("2023-01-01").is_none());
        assert!(f.parse("").is_none());
    }

    #[test]
    fn datetime_patterns_parse_too() {
        let f = DateFormat::new("%Y-%m-%d %H:%M").unwrap();
        let parsed = f.parse("2023-05-06 07:08").unwrap();
        assert_eq!(f.render(&parsed), "2023-05-06 07:08");
    }

    #[test]
    fn broken_patterns_are_rejected() {
        assert!(DateFormat::new("%Q").is_err());
        assert!(DateFormat::new("%Y %z").is_err());
        assert!(DateFormat::new("  ").is_err());
        assert!(DateFormat::new("%Y/%m/%d").is_ok());
    }
}
