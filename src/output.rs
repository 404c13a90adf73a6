use std::fs::{File, OpenOptions};

use camino::Utf8Path;
use tracing::debug;

use crate::domain::{DailyPrecipitation, LocationRecord};
use crate::error::PrecipError;

pub const OUTPUT_HEADER: [&str; 7] = [
    "taxa_name",
    "desired_end_date",
    "latitude",
    "longitude",
    "year",
    "date",
    "precip_mm",
];

/// Append-only CSV sink for daily precipitation rows. The file is opened
/// once per run; the header is written only when the file is created, and
/// rows from earlier runs are never rewritten. Every append is flushed
/// immediately so an interrupted run keeps everything written so far.
pub struct PrecipWriter {
    writer: csv::Writer<File>,
}

impl PrecipWriter {
    pub fn open(path: &Utf8Path) -> Result<Self, PrecipError> {
        let needs_header = !path.exists();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_std_path())
            .map_err(|err| PrecipError::Filesystem(format!("open {path}: {err}")))?;
        let mut writer = csv::Writer::from_writer(file);

        if needs_header {
            writer
                .write_record(OUTPUT_HEADER)
                .map_err(|err| PrecipError::OutputAppend(err.to_string()))?;
            writer
                .flush()
                .map_err(|err| PrecipError::OutputAppend(err.to_string()))?;
        }

        Ok(Self { writer })
    }

    /// Appends one daily row and flushes it to disk.
    pub fn append(
        &mut self,
        record: &LocationRecord,
        year: i32,
        day: &DailyPrecipitation,
    ) -> Result<(), PrecipError> {
        let latitude = record.coordinates.latitude.to_string();
        let longitude = record.coordinates.longitude.to_string();
        let year_field = year.to_string();
        let date = day.date.format("%Y-%m-%d").to_string();
        let precip = day.precip_mm.map_or(String::new(), |v| v.to_string());
        self.writer
            .write_record([
                record.taxon.as_str(),
                record.collected_raw.as_str(),
                latitude.as_str(),
                longitude.as_str(),
                year_field.as_str(),
                date.as_str(),
                precip.as_str(),
            ])
            .map_err(|err| PrecipError::OutputAppend(err.to_string()))?;
        self.writer
            .flush()
            .map_err(|err| PrecipError::OutputAppend(err.to_string()))?;
        debug!(
            taxon = %record.taxon,
            year,
            date = %day.date,
            precip_mm = ?day.precip_mm,
            "appended output row"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::Coordinates;

    fn sample_record() -> LocationRecord {
        LocationRecord {
            taxon: "Acer saccharum".parse().unwrap(),
            coordinates: Coordinates::new(43.0731, -89.4012).unwrap(),
            collected_raw: "06/15/1805".to_string(),
            collection_date: NaiveDate::from_ymd_opt(1805, 6, 15).unwrap(),
        }
    }

    fn sample_day(precip_mm: Option<f64>) -> DailyPrecipitation {
        DailyPrecipitation {
            date: NaiveDate::from_ymd_opt(2000, 5, 16).unwrap(),
            precip_mm,
        }
    }

    fn output_path(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join("precipitation_data.csv")).unwrap()
    }

    #[test]
    fn creates_file_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = output_path(&dir);

        let mut writer = PrecipWriter::open(&path).unwrap();
        writer.append(&sample_record(), 2000, &sample_day(Some(3.4))).unwrap();
        drop(writer);

        let contents = std::fs::read_to_string(path.as_std_path()).unwrap();
        let mut lines = contents.lines();
        assert_eq!(
            lines.next().unwrap(),
            "taxa_name,desired_end_date,latitude,longitude,year,date,precip_mm"
        );
        assert_eq!(
            lines.next().unwrap(),
            "Acer saccharum,06/15/1805,43.0731,-89.4012,2000,2000-05-16,3.4"
        );
    }

    #[test]
    fn null_precipitation_writes_empty_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = output_path(&dir);

        let mut writer = PrecipWriter::open(&path).unwrap();
        writer.append(&sample_record(), 2000, &sample_day(None)).unwrap();
        drop(writer);

        let contents = std::fs::read_to_string(path.as_std_path()).unwrap();
        assert!(contents.lines().nth(1).unwrap().ends_with("2000-05-16,"));
    }

    #[test]
    fn reopening_appends_without_second_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = output_path(&dir);

        let mut writer = PrecipWriter::open(&path).unwrap();
        writer.append(&sample_record(), 2000, &sample_day(Some(1.0))).unwrap();
        drop(writer);

        let mut writer = PrecipWriter::open(&path).unwrap();
        writer.append(&sample_record(), 2001, &sample_day(Some(2.0))).unwrap();
        drop(writer);

        let contents = std::fs::read_to_string(path.as_std_path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("taxa_name"));
        assert!(lines[1].contains(",2000,"));
        assert!(lines[2].contains(",2001,"));
    }
}
