use std::collections::BTreeSet;
use std::fs;

use camino::Utf8PathBuf;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::LocationRecord;
use crate::error::PrecipError;

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerState {
    /// Keys of fully-fetched (record, target-year) pairs.
    #[serde(default)]
    completed: BTreeSet<String>,
    /// ISO 8601 timestamp of the last save.
    last_update: Option<String>,
}

/// Resume marker for interrupted runs: a JSON file recording which
/// (record, target-year) pairs have been fetched and appended in full.
/// A year is only marked once every one of its ranges succeeded, so a
/// partially-failed year is retried whole on the next run.
pub struct RunLedger {
    path: Option<Utf8PathBuf>,
    state: LedgerState,
}

impl RunLedger {
    /// Loads the ledger, starting empty when the file does not exist yet.
    pub fn load(path: Option<Utf8PathBuf>) -> Result<Self, PrecipError> {
        let Some(path) = path else {
            return Ok(Self::disabled());
        };

        let state = if path.exists() {
            let contents = fs::read_to_string(path.as_std_path())
                .map_err(|err| PrecipError::Filesystem(format!("read {path}: {err}")))?;
            let state: LedgerState = serde_json::from_str(&contents)
                .map_err(|err| PrecipError::Filesystem(format!("parse {path}: {err}")))?;
            info!(
                ledger = %path,
                completed = state.completed.len(),
                last_update = ?state.last_update,
                "loaded resume ledger"
            );
            state
        } else {
            LedgerState::default()
        };

        Ok(Self {
            path: Some(path),
            state,
        })
    }

    /// A ledger that tracks nothing and never touches disk. Re-runs then
    /// re-fetch everything, appending duplicate rows exactly like the
    /// ledger-less design.
    pub fn disabled() -> Self {
        Self {
            path: None,
            state: LedgerState::default(),
        }
    }

    pub fn is_complete(&self, record: &LocationRecord, year: i32) -> bool {
        self.state.completed.contains(&Self::key(record, year))
    }

    pub fn mark_complete(&mut self, record: &LocationRecord, year: i32) {
        self.state.completed.insert(Self::key(record, year));
    }

    pub fn save(&mut self) -> Result<(), PrecipError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        self.state.last_update = Some(Utc::now().to_rfc3339());
        let json = serde_json::to_string_pretty(&self.state)
            .map_err(|err| PrecipError::Filesystem(err.to_string()))?;
        fs::write(path.as_std_path(), json)
            .map_err(|err| PrecipError::Filesystem(format!("write {path}: {err}")))?;
        Ok(())
    }

    fn key(record: &LocationRecord, year: i32) -> String {
        format!(
            "{}|{}|{}|{}|{year}",
            record.taxon,
            record.collected_raw,
            record.coordinates.latitude,
            record.coordinates.longitude
        )
    }
}
