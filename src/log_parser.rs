//! Parsing of health-check report lines (`<timestamp>,<outcome>`)

use crate::errors::{ReportError, Result};
use crate::status::Outcome;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::debug;

/// One parsed health-check line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CheckRecord {
    pub checked_at: DateTime<Utc>,
    pub outcome: Outcome,
}

impl CheckRecord {
    /// Calendar date of the check as seen from `offset`.
    pub fn calendar_date(&self, offset: &FixedOffset) -> NaiveDate {
        self.checked_at.with_timezone(offset).date_naive()
    }
}

/// Trait for turning raw report lines into check records
pub trait LogParser: Send + Sync {
    /// `Ok(None)` for lines that carry nothing (blank lines).
    fn parse_line(&self, line: &str) -> Result<Option<CheckRecord>>;
}

/// Parser for the comma separated `<timestamp>,<token>` report format.
#[derive(Debug, Default, Clone, Copy)]
pub struct CheckLogParser;

impl CheckLogParser {
    pub fn new() -> Self {
        Self
    }
}

impl LogParser for CheckLogParser {
    fn parse_line(&self, line: &str) -> Result<Option<CheckRecord>> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Ok(None);
        }

        let (timestamp, token) = line
            .split_once(',')
            .ok_or_else(|| ReportError::LogParse(format!("missing ',' in line: {}", line)))?;

        let checked_at = parse_timestamp(timestamp.trim()).ok_or_else(|| {
            ReportError::LogParse(format!("unrecognised timestamp: {}", timestamp.trim()))
        })?;

        // Anything after a second comma is ignored.
        let token = token.split(',').next().unwrap_or_default();

        Ok(Some(CheckRecord {
            checked_at,
            outcome: Outcome::from(token),
        }))
    }
}

/// All records of one report plus the number of lines that were dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedLog {
    pub records: Vec<CheckRecord>,
    pub skipped_lines: usize,
}

/// Parse a whole report. Malformed lines are skipped, never fatal.
pub fn parse_report(parser: &dyn LogParser, text: &str) -> ParsedLog {
    let mut parsed = ParsedLog::default();

    for (index, line) in text.lines().enumerate() {
        match parser.parse_line(line) {
            Ok(Some(record)) => parsed.records.push(record),
            Ok(None) => {}
            Err(e) => {
                debug!("Skipping report line {}: {}", index + 1, e);
                parsed.skipped_lines += 1;
            }
        }
    }

    parsed
}

/// Parse the timestamp formats health checks are written with.
///
/// Values without an explicit offset are GMT.
pub fn parse_timestamp(ts_str: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts_str) {
        return Some(dt.with_timezone(&Utc));
    }

    let formats = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];

    for format in &formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(ts_str, format) {
            return Some(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(ts_str, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
