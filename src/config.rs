use std::time::Duration;

use camino::Utf8PathBuf;

pub const DEFAULT_INPUT_CSV: &str = "Location_Date.csv";
pub const DEFAULT_OUTPUT_CSV: &str = "precipitation_data.csv";
pub const DEFAULT_LEDGER_FILE: &str = "precip_fetch_state.json";
pub const DEFAULT_LOG_FILE: &str = "precip_fetch.log";

/// Every record's lookback window is replayed across this fixed span of
/// years, independent of the record's own collection year.
pub const FIRST_TARGET_YEAR: i32 = 2000;
pub const LAST_TARGET_YEAR: i32 = 2024;

/// Attempt budget for one archive query. All failure classes (timeout,
/// transport error, non-success status, undecodable body) are retried until
/// the budget runs out; there is no delay between attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Run parameters. There are no command-line flags; changing any of these
/// means editing the defaults here.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input_csv: Utf8PathBuf,
    pub output_csv: Utf8PathBuf,
    /// Checkpoint ledger path. `None` disables resume tracking, restoring
    /// plain append-only re-runs.
    pub ledger: Option<Utf8PathBuf>,
    pub first_year: i32,
    pub last_year: i32,
    pub retry: RetryPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_csv: Utf8PathBuf::from(DEFAULT_INPUT_CSV),
            output_csv: Utf8PathBuf::from(DEFAULT_OUTPUT_CSV),
            ledger: Some(Utf8PathBuf::from(DEFAULT_LEDGER_FILE)),
            first_year: FIRST_TARGET_YEAR,
            last_year: LAST_TARGET_YEAR,
            retry: RetryPolicy::default(),
        }
    }
}

impl RunConfig {
    pub fn target_years(&self) -> std::ops::RangeInclusive<i32> {
        self.first_year..=self.last_year
    }
}
