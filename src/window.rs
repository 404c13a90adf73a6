use chrono::{Duration, NaiveDate};

use crate::domain::{DateRange, MonthDay};

/// Length of the lookback window preceding a record's collection date.
pub const LOOKBACK_DAYS: i64 = 30;

/// The month/day span of the 30 days ending on a record's collection
/// date, replayed against arbitrary target years.
///
/// The window is derived once from the real collection date (so the 30-day
/// subtraction respects actual month lengths and leap years), then only its
/// month/day endpoints are kept. When the span crosses Dec 31 -> Jan 1,
/// replaying it into target year `y` yields two ranges: the tail of `y - 1`
/// and the head of `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookbackWindow {
    start_day: MonthDay,
    end_day: MonthDay,
}

impl LookbackWindow {
    pub fn from_collection_date(date: NaiveDate) -> Self {
        let start = date - Duration::days(LOOKBACK_DAYS);
        Self {
            start_day: MonthDay::of(start),
            end_day: MonthDay::of(date),
        }
    }

    pub fn crosses_year_boundary(&self) -> bool {
        self.start_day > self.end_day
    }

    /// Date ranges to query for one target year. Two contiguous ranges when
    /// the window wraps the year boundary, one otherwise.
    pub fn ranges_for_year(&self, year: i32) -> Vec<DateRange> {
        if self.crosses_year_boundary() {
            vec![
                DateRange {
                    year: year - 1,
                    start: self.start_day,
                    end: MonthDay::DEC_31,
                },
                DateRange {
                    year,
                    start: MonthDay::JAN_1,
                    end: self.end_day,
                },
            ]
        } else {
            vec![DateRange {
                year,
                start: self.start_day,
                end: self.end_day,
            }]
        }
    }

    pub fn end_day(&self) -> MonthDay {
        self.end_day
    }
}
