use camino::Utf8Path;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::domain::{Coordinates, LocationRecord};
use crate::error::PrecipError;

/// Column layout of the input table. Header names follow the herbarium
/// export this tool consumes.
#[derive(Debug, Deserialize)]
pub struct RawLocationRow {
    #[serde(rename = "species")]
    pub species: String,
    #[serde(rename = "Lat_machine_readable")]
    pub latitude: f64,
    #[serde(rename = "Long_machine_readable")]
    pub longitude: f64,
    #[serde(rename = "Date_collected_cleaned_machine_readable")]
    pub collected: String,
}

/// One input row, either validated or carrying the error that makes it
/// unusable. Bad rows are reported alongside good ones so the caller can
/// log and skip them without aborting the batch.
#[derive(Debug)]
pub struct RowOutcome {
    /// 1-based data row number (the header is row 0).
    pub line: usize,
    pub record: Result<LocationRecord, PrecipError>,
}

/// Loads the input table. Failure to open or read the file is fatal;
/// everything row-scoped is isolated into the returned outcomes.
pub fn load_rows(path: &Utf8Path) -> Result<Vec<RowOutcome>, PrecipError> {
    let mut reader = csv::Reader::from_path(path.as_std_path())
        .map_err(|_| PrecipError::InputRead(path.to_owned()))?;

    let mut rows = Vec::new();
    for (index, result) in reader.deserialize::<RawLocationRow>().enumerate() {
        let line = index + 1;
        let record = match result {
            Ok(raw) => parse_row(raw),
            Err(err) => Err(PrecipError::MalformedRow {
                line,
                message: err.to_string(),
            }),
        };
        rows.push(RowOutcome { line, record });
    }
    Ok(rows)
}

fn parse_row(raw: RawLocationRow) -> Result<LocationRecord, PrecipError> {
    let taxon = raw.species.parse()?;
    let coordinates = Coordinates::new(raw.latitude, raw.longitude)?;
    let collection_date = parse_collection_date(&raw.collected)?;
    Ok(LocationRecord {
        taxon,
        coordinates,
        collected_raw: raw.collected,
        collection_date,
    })
}

/// Collection dates arrive as `MM/DD/YYYY`, with or without zero padding.
pub fn parse_collection_date(value: &str) -> Result<NaiveDate, PrecipError> {
    NaiveDate::parse_from_str(value.trim(), "%m/%d/%Y")
        .map_err(|_| PrecipError::InvalidCollectionDate(value.to_string()))
}
