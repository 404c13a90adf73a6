use chrono::NaiveDate;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::RetryPolicy;
use crate::domain::{Coordinates, DailyPrecipitation, DateRange};
use crate::error::PrecipError;

const ARCHIVE_BASE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";
const DAILY_VARIABLE: &str = "precipitation_sum";

/// The seam between the pipeline and the archive service. The production
/// implementation talks HTTP; tests substitute their own.
pub trait ArchiveClient {
    fn daily_precipitation(
        &self,
        coordinates: &Coordinates,
        range: &DateRange,
    ) -> Result<Vec<DailyPrecipitation>, PrecipError>;
}

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    daily: ArchiveDaily,
}

#[derive(Debug, Deserialize)]
struct ArchiveDaily {
    time: Vec<String>,
    precipitation_sum: Vec<Option<f64>>,
}

#[derive(Clone)]
pub struct OpenMeteoHttpClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl OpenMeteoHttpClient {
    pub fn new(retry: RetryPolicy) -> Result<Self, PrecipError> {
        Self::new_with_base_url(retry, ARCHIVE_BASE_URL.to_string())
    }

    pub fn new_with_base_url(retry: RetryPolicy, base_url: String) -> Result<Self, PrecipError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("herbarium-precip/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| PrecipError::ArchiveHttp(err.to_string()))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(retry.timeout)
            .build()
            .map_err(|err| PrecipError::ArchiveHttp(err.to_string()))?;

        Ok(Self {
            client,
            base_url,
            retry,
        })
    }

    fn query_once(
        &self,
        coordinates: &Coordinates,
        range: &DateRange,
    ) -> Result<Vec<DailyPrecipitation>, PrecipError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", coordinates.latitude.to_string()),
                ("longitude", coordinates.longitude.to_string()),
                ("start_date", range.start_date()),
                ("end_date", range.end_date()),
                ("daily", DAILY_VARIABLE.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .map_err(|err| PrecipError::ArchiveHttp(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .unwrap_or_else(|_| "archive request failed".to_string());
            return Err(PrecipError::ArchiveStatus {
                status: status.as_u16(),
                message,
            });
        }

        let body: ArchiveResponse = response
            .json()
            .map_err(|err| PrecipError::ArchiveDecode(err.to_string()))?;
        pair_daily_series(body.daily)
    }
}

impl ArchiveClient for OpenMeteoHttpClient {
    fn daily_precipitation(
        &self,
        coordinates: &Coordinates,
        range: &DateRange,
    ) -> Result<Vec<DailyPrecipitation>, PrecipError> {
        run_with_retries(&self.retry, |attempt| {
            info!(
                %range,
                latitude = coordinates.latitude,
                longitude = coordinates.longitude,
                attempt,
                "querying archive"
            );
            self.query_once(coordinates, range)
        })
    }
}

/// Runs `attempt` until it succeeds or the policy's budget is spent,
/// returning the last error. Every failure class is retryable and there is
/// no delay between attempts; pacing comes from request latency alone.
pub fn run_with_retries<T, F>(policy: &RetryPolicy, mut attempt: F) -> Result<T, PrecipError>
where
    F: FnMut(u32) -> Result<T, PrecipError>,
{
    let mut last_error = None;
    for n in 1..=policy.max_attempts {
        match attempt(n) {
            Ok(value) => return Ok(value),
            Err(err) => {
                warn!(
                    attempt = n,
                    max_attempts = policy.max_attempts,
                    error = %err,
                    "archive query attempt failed"
                );
                last_error = Some(err);
            }
        }
    }
    Err(last_error
        .unwrap_or_else(|| PrecipError::ArchiveHttp("retry budget allows no attempts".to_string())))
}

/// Pairs the index-aligned `time` and `precipitation_sum` arrays. Extra
/// entries on either side are dropped, matching the upstream contract that
/// both arrays describe the same days.
fn pair_daily_series(daily: ArchiveDaily) -> Result<Vec<DailyPrecipitation>, PrecipError> {
    daily
        .time
        .into_iter()
        .zip(daily.precipitation_sum)
        .map(|(date, precip_mm)| {
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|_| {
                PrecipError::ArchiveDecode(format!("unparseable date in daily series: {date:?}"))
            })?;
            Ok(DailyPrecipitation { date, precip_mm })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn retry_returns_success_on_third_attempt() {
        let mut calls = 0u32;
        let result = run_with_retries(&policy(3), |_| {
            calls += 1;
            if calls < 3 {
                Err(PrecipError::ArchiveStatus {
                    status: 500,
                    message: "server error".to_string(),
                })
            } else {
                Ok(vec![41.0])
            }
        });
        assert_eq!(calls, 3);
        assert_eq!(result.unwrap(), vec![41.0]);
    }

    #[test]
    fn retry_stops_at_budget_and_keeps_last_error() {
        let mut calls = 0u32;
        let result: Result<(), _> = run_with_retries(&policy(3), |_| {
            calls += 1;
            Err(PrecipError::ArchiveStatus {
                status: 500,
                message: format!("failure {calls}"),
            })
        });
        assert_eq!(calls, 3);
        assert_matches!(
            result.unwrap_err(),
            PrecipError::ArchiveStatus { status: 500, message } if message == "failure 3"
        );
    }

    #[test]
    fn retry_short_circuits_on_first_success() {
        let mut calls = 0u32;
        let result = run_with_retries(&policy(3), |_| {
            calls += 1;
            Ok(7)
        });
        assert_eq!(calls, 1);
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn pairs_dates_with_values() {
        let daily = ArchiveDaily {
            time: vec!["2000-05-16".to_string(), "2000-05-17".to_string()],
            precipitation_sum: vec![Some(1.2), None],
        };
        let days = pair_daily_series(daily).unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].precip_mm, Some(1.2));
        assert_eq!(days[1].precip_mm, None);
        assert_eq!(
            days[1].date,
            NaiveDate::from_ymd_opt(2000, 5, 17).unwrap()
        );
    }

    #[test]
    fn mismatched_series_lengths_truncate() {
        let daily = ArchiveDaily {
            time: vec!["2000-05-16".to_string(), "2000-05-17".to_string()],
            precipitation_sum: vec![Some(0.0)],
        };
        let days = pair_daily_series(daily).unwrap();
        assert_eq!(days.len(), 1);
    }

    #[test]
    fn unparseable_series_date_is_a_decode_error() {
        let daily = ArchiveDaily {
            time: vec!["garbage".to_string()],
            precipitation_sum: vec![Some(0.0)],
        };
        let err = pair_daily_series(daily).unwrap_err();
        assert_matches!(err, PrecipError::ArchiveDecode(_));
    }
}
