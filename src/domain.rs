use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::PrecipError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TaxonName(String);

impl TaxonName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaxonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaxonName {
    type Err = PrecipError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_string();
        if normalized.is_empty() {
            return Err(PrecipError::InvalidTaxonName(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, PrecipError> {
        let in_bounds = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if !in_bounds {
            return Err(PrecipError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// One row of the input table, validated. `collected_raw` keeps the
/// original `MM/DD/YYYY` text because the output echoes it verbatim in
/// the `desired_end_date` column.
#[derive(Debug, Clone)]
pub struct LocationRecord {
    pub taxon: TaxonName,
    pub coordinates: Coordinates,
    pub collected_raw: String,
    pub collection_date: NaiveDate,
}

/// A calendar (month, day) pair without a year. Ordering is lexicographic
/// on (month, day), which is how a 30-day window is detected to cross the
/// Dec 31 -> Jan 1 boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl MonthDay {
    pub const JAN_1: MonthDay = MonthDay { month: 1, day: 1 };
    pub const DEC_31: MonthDay = MonthDay { month: 12, day: 31 };

    pub fn of(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self {
            month: date.month(),
            day: date.day(),
        }
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

/// An inclusive date span within a single reference year, ready to be
/// rendered as ISO `YYYY-MM-DD` endpoints for an archive query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub year: i32,
    pub start: MonthDay,
    pub end: MonthDay,
}

impl DateRange {
    pub fn start_date(&self) -> String {
        format!("{:04}-{}", self.year, self.start)
    }

    pub fn end_date(&self) -> String {
        format!("{:04}-{}", self.year, self.end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start_date(), self.end_date())
    }
}

/// One day of archive output. `precip_mm` is `None` when the archive
/// reports null for that day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyPrecipitation {
    pub date: NaiveDate,
    pub precip_mm: Option<f64>,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_taxon_name_trims() {
        let taxon: TaxonName = "  Acer saccharum ".parse().unwrap();
        assert_eq!(taxon.as_str(), "Acer saccharum");
    }

    #[test]
    fn parse_taxon_name_empty() {
        let err = "   ".parse::<TaxonName>().unwrap_err();
        assert_matches!(err, PrecipError::InvalidTaxonName(_));
    }

    #[test]
    fn coordinates_in_bounds() {
        let coords = Coordinates::new(43.0731, -89.4012).unwrap();
        assert_eq!(coords.latitude, 43.0731);
        assert_eq!(coords.longitude, -89.4012);
    }

    #[test]
    fn coordinates_out_of_bounds() {
        let err = Coordinates::new(91.0, 0.0).unwrap_err();
        assert_matches!(err, PrecipError::InvalidCoordinates { .. });
        let err = Coordinates::new(0.0, f64::NAN).unwrap_err();
        assert_matches!(err, PrecipError::InvalidCoordinates { .. });
    }

    #[test]
    fn month_day_ordering() {
        let december = MonthDay { month: 12, day: 11 };
        let january = MonthDay { month: 1, day: 10 };
        assert!(december > january);
        assert!(MonthDay { month: 5, day: 16 } < MonthDay { month: 6, day: 15 });
    }

    #[test]
    fn month_day_display_pads() {
        let day = MonthDay { month: 1, day: 9 };
        assert_eq!(day.to_string(), "01-09");
    }

    #[test]
    fn date_range_iso_endpoints() {
        let range = DateRange {
            year: 2000,
            start: MonthDay { month: 5, day: 16 },
            end: MonthDay { month: 6, day: 15 },
        };
        assert_eq!(range.start_date(), "2000-05-16");
        assert_eq!(range.end_date(), "2000-06-15");
    }
}
