use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::RunConfig;
use crate::domain::LocationRecord;
use crate::error::PrecipError;
use crate::input;
use crate::ledger::RunLedger;
use crate::open_meteo::ArchiveClient;
use crate::output::PrecipWriter;
use crate::window::LookbackWindow;

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RunSummary {
    pub records_processed: usize,
    pub records_skipped: usize,
    pub years_resumed: usize,
    pub ranges_fetched: usize,
    pub ranges_failed: usize,
    pub rows_appended: usize,
}

/// The batch pipeline: input table -> lookback windows -> archive queries
/// -> append-only output, one record at a time, one request in flight at a
/// time.
pub struct App<C: ArchiveClient> {
    config: RunConfig,
    client: C,
}

impl<C: ArchiveClient> App<C> {
    pub fn new(config: RunConfig, client: C) -> Self {
        Self { config, client }
    }

    /// Runs the whole batch. Only input-table and output-file setup
    /// failures are fatal; everything scoped to a row or a date range is
    /// logged, counted, and skipped.
    pub fn run(&self) -> Result<RunSummary, PrecipError> {
        let rows = input::load_rows(&self.config.input_csv)?;
        info!(
            input = %self.config.input_csv,
            rows = rows.len(),
            "loaded input table"
        );

        let mut writer = PrecipWriter::open(&self.config.output_csv)?;
        let mut ledger = RunLedger::load(self.config.ledger.clone())?;

        let mut summary = RunSummary::default();
        for row in rows {
            match row.record {
                Ok(record) => {
                    match self.process_record(&record, &mut writer, &mut ledger, &mut summary) {
                        Ok(()) => summary.records_processed += 1,
                        Err(err) => {
                            error!(line = row.line, error = %err, "failed to process record");
                            summary.records_skipped += 1;
                        }
                    }
                }
                Err(err) => {
                    warn!(line = row.line, error = %err, "skipping malformed input row");
                    summary.records_skipped += 1;
                }
            }
        }

        info!(
            records_processed = summary.records_processed,
            records_skipped = summary.records_skipped,
            years_resumed = summary.years_resumed,
            ranges_failed = summary.ranges_failed,
            rows_appended = summary.rows_appended,
            "run complete"
        );
        Ok(summary)
    }

    fn process_record(
        &self,
        record: &LocationRecord,
        writer: &mut PrecipWriter,
        ledger: &mut RunLedger,
        summary: &mut RunSummary,
    ) -> Result<(), PrecipError> {
        let window = LookbackWindow::from_collection_date(record.collection_date);
        info!(
            taxon = %record.taxon,
            coordinates = %record.coordinates,
            collected = %record.collected_raw,
            "processing record"
        );

        for year in self.config.target_years() {
            if ledger.is_complete(record, year) {
                summary.years_resumed += 1;
                continue;
            }

            let mut year_complete = true;
            for range in window.ranges_for_year(year) {
                match self.client.daily_precipitation(&record.coordinates, &range) {
                    Ok(days) => {
                        summary.ranges_fetched += 1;
                        for day in &days {
                            writer.append(record, range.year, day)?;
                            summary.rows_appended += 1;
                        }
                    }
                    Err(err) => {
                        error!(
                            taxon = %record.taxon,
                            %range,
                            error = %err,
                            "giving up on range after retries"
                        );
                        summary.ranges_failed += 1;
                        year_complete = false;
                    }
                }
            }

            if year_complete {
                ledger.mark_complete(record, year);
                ledger.save()?;
            }
        }

        info!(taxon = %record.taxon, "finished record");
        Ok(())
    }
}
