//! Per-day bucketing of health-check outcomes and overall uptime

use crate::log_parser::CheckRecord;
use crate::status::{DayStatus, Outcome};
use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Number of distinct days a service keeps by default.
pub const MAX_DAYS: usize = 30;

/// Uptime text shown when no checks were parsed.
pub const NO_UPTIME: &str = "--%";

/// How many distinct calendar days a service may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BucketCap {
    /// Keep at most `max_days` buckets, evicting the oldest date on overflow.
    #[default]
    Enforce,
    /// Keep every date; only the display window limits what is shown.
    Unbounded,
}

impl From<&str> for BucketCap {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "unbounded" | "none" | "off" => BucketCap::Unbounded,
            _ => BucketCap::Enforce,
        }
    }
}

/// Running uptime over every parsed check, independent of bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UptimeSummary {
    sum: f64,
    count: usize,
}

impl UptimeSummary {
    pub fn record(&mut self, outcome: Outcome) {
        self.sum += outcome.value();
        self.count += 1;
    }

    pub fn checks(&self) -> usize {
        self.count
    }

    /// Uptime in percent, `None` without any checks.
    pub fn percentage(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64 * 100.0)
        }
    }

    /// `75.00%`, or `--%` without any checks. Ties round half up.
    pub fn formatted(&self) -> String {
        match self.percentage() {
            Some(pct) => format!("{:.2}%", (pct * 100.0).round() / 100.0),
            None => NO_UPTIME.to_string(),
        }
    }
}

/// Reduce one day's outcomes: any failure wins, then any warning, else success.
pub fn reduce_day(outcomes: &[Outcome]) -> DayStatus {
    outcomes.iter().copied().min()
}

/// Outcomes grouped by calendar date for one service.
#[derive(Debug, Clone)]
pub struct DayBuckets {
    buckets: BTreeMap<NaiveDate, Vec<Outcome>>,
    uptime: UptimeSummary,
    cap: BucketCap,
    max_days: usize,
    evicted_days: usize,
}

impl DayBuckets {
    pub fn new(cap: BucketCap, max_days: usize) -> Self {
        Self {
            buckets: BTreeMap::new(),
            uptime: UptimeSummary::default(),
            cap,
            max_days,
            evicted_days: 0,
        }
    }

    /// Bucket parsed records by their calendar date in `offset`.
    pub fn from_records(
        records: &[CheckRecord],
        offset: &FixedOffset,
        cap: BucketCap,
        max_days: usize,
    ) -> Self {
        let mut buckets = Self::new(cap, max_days);
        for record in records {
            buckets.add(record.calendar_date(offset), record.outcome);
        }

        if buckets.evicted_days > 0 {
            warn!(
                "Bucket cap of {} days reached, evicted {} older days",
                max_days, buckets.evicted_days
            );
        }

        buckets
    }

    /// Add an outcome. Uptime always counts it, even if its day is evicted.
    pub fn add(&mut self, date: NaiveDate, outcome: Outcome) {
        self.uptime.record(outcome);
        self.buckets.entry(date).or_default().push(outcome);

        if self.cap == BucketCap::Enforce && self.buckets.len() > self.max_days {
            if let Some((oldest, outcomes)) = self.buckets.pop_first() {
                debug!("Evicting day {} with {} checks", oldest, outcomes.len());
                self.evicted_days += 1;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn outcomes(&self, date: &NaiveDate) -> Option<&[Outcome]> {
        self.buckets.get(date).map(Vec::as_slice)
    }

    pub fn uptime(&self) -> &UptimeSummary {
        &self.uptime
    }

    pub fn evicted_days(&self) -> usize {
        self.evicted_days
    }

    /// Reduced status per calendar date, oldest first.
    pub fn day_statuses(&self) -> impl Iterator<Item = (NaiveDate, DayStatus)> + '_ {
        self.buckets
            .iter()
            .map(|(date, outcomes)| (*date, reduce_day(outcomes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_parser::{CheckLogParser, parse_report};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_reduce_day() {
        use crate::status::Outcome::*;

        assert_eq!(reduce_day(&[]), None);
        assert_eq!(reduce_day(&[Success, Success]), Some(Success));
        assert_eq!(reduce_day(&[Success, Partial, Success]), Some(Partial));
        assert_eq!(reduce_day(&[Success, Partial, Failure, Success]), Some(Failure));
        assert_eq!(reduce_day(&[Failure]), Some(Failure));
    }

    #[test]
    fn test_failure_dominates_many_successes() {
        let mut outcomes = vec![Outcome::Success; 200];
        outcomes.push(Outcome::Partial);
        outcomes.insert(57, Outcome::Failure);
        assert_eq!(reduce_day(&outcomes), Some(Outcome::Failure));
    }

    #[test]
    fn test_single_day_example() {
        let text = "2024-01-01 10:00:00,success\n2024-01-01 14:00:00,warn\n";
        let parsed = parse_report(&CheckLogParser::new(), text);
        let buckets = DayBuckets::from_records(&parsed.records, &utc(), BucketCap::Enforce, MAX_DAYS);

        assert_eq!(buckets.len(), 1);
        let statuses: Vec<_> = buckets.day_statuses().collect();
        assert_eq!(statuses, vec![(day(1), Some(Outcome::Partial))]);
        assert_eq!(buckets.uptime().formatted(), "75.00%");
    }

    #[test]
    fn test_no_lines_means_no_uptime() {
        let buckets = DayBuckets::from_records(&[], &utc(), BucketCap::Enforce, MAX_DAYS);
        assert!(buckets.is_empty());
        assert_eq!(buckets.uptime().percentage(), None);
        assert_eq!(buckets.uptime().formatted(), "--%");
    }

    #[test]
    fn test_uptime_is_order_independent() {
        let lines = [
            "2024-01-01 10:00:00,success",
            "2024-01-02 10:00:00,warn",
            "2024-01-02 11:00:00,error",
            "2024-01-03 10:00:00,success",
            "2024-01-03 12:00:00,success",
            "2024-01-04 10:00:00,warn",
        ];
        let forward = lines.join("\n");
        let backward = lines.iter().rev().copied().collect::<Vec<_>>().join("\n");
        let shuffled = [lines[3], lines[0], lines[5], lines[1], lines[4], lines[2]].join("\n");

        let uptime = |text: &str| {
            let parsed = parse_report(&CheckLogParser::new(), text);
            DayBuckets::from_records(&parsed.records, &utc(), BucketCap::Enforce, MAX_DAYS)
                .uptime()
                .formatted()
        };

        assert_eq!(uptime(&forward), "66.67%");
        assert_eq!(uptime(&backward), uptime(&forward));
        assert_eq!(uptime(&shuffled), uptime(&forward));
    }

    #[test]
    fn test_enforced_cap_keeps_latest_days() {
        let mut buckets = DayBuckets::new(BucketCap::Enforce, MAX_DAYS);
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        for offset in 0..40 {
            let date = start + chrono::Days::new(offset);
            buckets.add(date, Outcome::Success);
        }

        assert_eq!(buckets.len(), MAX_DAYS);
        assert_eq!(buckets.evicted_days(), 10);
        assert!(buckets.outcomes(&start).is_none());
        assert!(buckets.outcomes(&(start + chrono::Days::new(39))).is_some());
        // Evicted days still count toward uptime.
        assert_eq!(buckets.uptime().checks(), 40);
    }

    #[test]
    fn test_uptime_rounds_ties_up() {
        let summary = |successes: usize, failures: usize| {
            let mut summary = UptimeSummary::default();
            for _ in 0..successes {
                summary.record(Outcome::Success);
            }
            for _ in 0..failures {
                summary.record(Outcome::Failure);
            }
            summary.formatted()
        };

        assert_eq!(summary(1, 31), "3.13%");
        assert_eq!(summary(5, 27), "15.63%");
        assert_eq!(summary(2, 1), "66.67%");
        assert_eq!(summary(1, 2), "33.33%");
        assert_eq!(summary(1, 0), "100.00%");
        assert_eq!(summary(0, 4), "0.00%");
    }

    #[test]
    fn test_enforced_cap_evicts_oldest_on_31st_day() {
        let mut buckets = DayBuckets::new(BucketCap::Enforce, MAX_DAYS);
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        for offset in 0..31 {
            buckets.add(start + chrono::Days::new(offset), Outcome::Success);
        }

        assert_eq!(buckets.len(), MAX_DAYS);
        assert_eq!(buckets.evicted_days(), 1);
        assert!(buckets.outcomes(&start).is_none());
        assert!(buckets.outcomes(&(start + chrono::Days::new(1))).is_some());
        assert!(buckets.outcomes(&(start + chrono::Days::new(30))).is_some());
    }

    #[test]
    fn test_enforced_cap_ignores_arrival_order() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut forward = DayBuckets::new(BucketCap::Enforce, 5);
        let mut backward = DayBuckets::new(BucketCap::Enforce, 5);

        for offset in 0..8 {
            forward.add(start + chrono::Days::new(offset), Outcome::Success);
            backward.add(start + chrono::Days::new(7 - offset), Outcome::Success);
        }

        let dates = |b: &DayBuckets| b.day_statuses().map(|(d, _)| d).collect::<Vec<_>>();
        assert_eq!(dates(&forward), dates(&backward));
        assert_eq!(forward.len(), 5);
    }

    #[test]
    fn test_unbounded_keeps_every_day() {
        let mut buckets = DayBuckets::new(BucketCap::Unbounded, MAX_DAYS);
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        for offset in 0..45 {
            buckets.add(start + chrono::Days::new(offset), Outcome::Partial);
        }

        assert_eq!(buckets.len(), 45);
        assert_eq!(buckets.evicted_days(), 0);
    }

    #[test]
    fn test_existing_day_never_triggers_eviction() {
        let mut buckets = DayBuckets::new(BucketCap::Enforce, 2);
        buckets.add(day(1), Outcome::Success);
        buckets.add(day(2), Outcome::Success);
        buckets.add(day(1), Outcome::Failure);

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets.outcomes(&day(1)), Some(&[Outcome::Success, Outcome::Failure][..]));
    }

    #[test]
    fn test_bucket_cap_from_str() {
        assert_eq!(BucketCap::from("unbounded"), BucketCap::Unbounded);
        assert_eq!(BucketCap::from("ENFORCE"), BucketCap::Enforce);
        assert_eq!(BucketCap::from("whatever"), BucketCap::Enforce);
    }
}
