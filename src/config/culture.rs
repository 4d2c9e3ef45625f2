//! Number and date conventions used when reading and rendering values

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Order of the day, month and year parts in a short date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateOrder {
    DayMonthYear,
    MonthDayYear,
    YearMonthDay,
}

/// Culture settings for literal parsing and date rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Culture {
    pub decimal_separator: char,
    pub date_separator: char,
    pub date_order: DateOrder,
    /// chrono format strings tried in order after RFC 3339
    pub date_formats: Vec<String>,
}

impl Default for Culture {
    fn default() -> Self {
        Self {
            decimal_separator: '.',
            date_separator: '.',
            date_order: DateOrder::DayMonthYear,
            date_formats: vec![
                "%Y-%m-%d %H:%M:%S%.f".to_string(),
                "%Y-%m-%dT%H:%M:%S%.f".to_string(),
                "%Y-%m-%d".to_string(),
                "%d.%m.%Y %H:%M:%S".to_string(),
                "%d.%m.%Y".to_string(),
                "%Y/%m/%d %H:%M:%S".to_string(),
                "%Y/%m/%d".to_string(),
            ],
        }
    }
}

impl Culture {
    /// Parse a date/time literal, date-only formats yield midnight
    pub fn parse_date_time(&self, text: &str) -> Option<NaiveDateTime> {
        let text = text.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(dt.naive_local());
        }

        for format in &self.date_formats {
            if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
                return Some(dt);
            }
            if let Ok(date) = NaiveDate::parse_from_str(text, format) {
                return date.and_hms_opt(0, 0, 0);
            }
        }

        None
    }

    /// Normalize a numeric token so that Rust's float parser accepts it
    pub fn normalize_number<'a>(&self, token: &'a str) -> Cow<'a, str> {
        if self.decimal_separator == '.' {
            Cow::Borrowed(token)
        } else {
            Cow::Owned(token.replace(self.decimal_separator, "."))
        }
    }

    /// Whether a numeric token carries a fractional part
    pub fn has_decimal_separator(&self, token: &str) -> bool {
        token.contains(self.decimal_separator) || token.contains('.')
    }

    /// Render the date part of `value` without leading zeros, e.g. `12.6.2024`
    pub fn format_date_parts(&self, value: &NaiveDateTime) -> String {
        let (day, month, year) = (value.day(), value.month(), value.year());
        let sep = self.date_separator;
        match self.date_order {
            DateOrder::DayMonthYear => format!("{}{}{}{}{}", day, sep, month, sep, year),
            DateOrder::MonthDayYear => format!("{}{}{}{}{}", month, sep, day, sep, year),
            DateOrder::YearMonthDay => format!("{}{}{}{}{}", year, sep, month, sep, day),
        }
    }

    /// Strip the leading zeros of every date segment so a typed fragment
    /// lines up with [`Culture::format_date_parts`]
    pub fn normalize_date_fragment(&self, fragment: &str) -> String {
        let sep = self.date_separator.to_string();
        fragment
            .split(self.date_separator)
            .map(|segment| match segment.trim_start_matches('0') {
                "" if !segment.is_empty() => "0",
                trimmed => trimmed,
            })
            .collect::<Vec<_>>()
            .join(&sep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_time_formats() {
        let culture = Culture::default();
        let expected = NaiveDate::from_ymd_opt(2024, 6, 12)
            .unwrap()
            .and_hms_opt(13, 45, 0)
            .unwrap();

        assert_eq!(culture.parse_date_time("2024-06-12 13:45:00"), Some(expected));
        assert_eq!(culture.parse_date_time("2024-06-12T13:45:00"), Some(expected));
        assert_eq!(culture.parse_date_time("12.06.2024 13:45:00"), Some(expected));
        assert_eq!(
            culture.parse_date_time("2024-06-12"),
            NaiveDate::from_ymd_opt(2024, 6, 12).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(culture.parse_date_time("not a date"), None);
    }

    #[test]
    fn test_rfc3339_keeps_wall_clock() {
        let culture = Culture::default();
        let parsed = culture.parse_date_time("2024-06-12T08:00:00+02:00").unwrap();
        assert_eq!(parsed.to_string(), "2024-06-12 08:00:00");
    }

    #[test]
    fn test_format_date_parts() {
        let value = NaiveDate::from_ymd_opt(2024, 6, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();

        let culture = Culture::default();
        assert_eq!(culture.format_date_parts(&value), "2.6.2024");

        let us = Culture {
            date_separator: '/',
            date_order: DateOrder::MonthDayYear,
            ..Culture::default()
        };
        assert_eq!(us.format_date_parts(&value), "6/2/2024");
    }

    #[test]
    fn test_normalize_date_fragment() {
        let culture = Culture::default();
        assert_eq!(culture.normalize_date_fragment("02.06.2024"), "2.6.2024");
        assert_eq!(culture.normalize_date_fragment("12.06"), "12.6");
        assert_eq!(culture.normalize_date_fragment("2024"), "2024");
        assert_eq!(culture.normalize_date_fragment("0"), "0");
        assert_eq!(culture.normalize_date_fragment("00.06"), "0.6");
        assert_eq!(culture.normalize_date_fragment("12."), "12.");
    }

    #[test]
    fn test_normalize_number() {
        let comma = Culture {
            decimal_separator: ',',
            ..Culture::default()
        };
        assert_eq!(comma.normalize_number("5,5"), "5.5");
        assert!(comma.has_decimal_separator("5,5"));
        assert_eq!(Culture::default().normalize_number("5.5"), "5.5");
    }
}
