// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Failed to compile date regex"));

const DATE_FORMAT: &str = "%Y-%m-%d";

/// 闭区间日期范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// 严格解析 `YYYY-MM-DD`
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    if !DATE_PATTERN.is_match(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

pub fn is_valid_date(value: &str) -> bool {
    parse_date(value).is_some()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn next_day(date: NaiveDate) -> NaiveDate {
    date.checked_add_days(Days::new(1)).unwrap_or(date)
}

/// 将 `[start, end]` 切分为连续的 `days_per_range` 天区间，最后一段截断到 `end`
pub fn split_date_ranges(start: NaiveDate, end: NaiveDate, days_per_range: u32) -> Vec<DateRange> {
    let span = u64::from(days_per_range.max(1)) - 1;
    let mut ranges = Vec::new();
    let mut current = start;

    while current <= end {
        let range_end = current
            .checked_add_days(Days::new(span))
            .map_or(end, |d| d.min(end));
        ranges.push(DateRange {
            start: current,
            end: range_end,
        });
        match range_end.checked_add_days(Days::new(1)) {
            Some(next) => current = next,
            None => break,
        }
    }

    ranges
}
