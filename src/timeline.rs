//! Relative-day indexing: calendar dates become "days before now" slots

use crate::buckets::{BucketCap, DayBuckets, MAX_DAYS, NO_UPTIME};
use crate::log_parser::{LogParser, parse_report};
use crate::status::{DayStatus, StatusColor, worst_of};
use chrono::{DateTime, Days, FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use serde::Serialize;
use tracing::debug;

const MILLIS_PER_DAY: i64 = 24 * 3600 * 1000;

/// The fixed display window a whole dashboard pass is computed against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportWindow {
    pub now: DateTime<Utc>,
    pub offset: FixedOffset,
    pub days: usize,
}

impl ReportWindow {
    pub fn new(now: DateTime<Utc>, offset: FixedOffset, days: usize) -> Self {
        Self { now, offset, days }
    }

    /// Thirty days ending at `now`, in UTC.
    pub fn utc(now: DateTime<Utc>) -> Self {
        Self::new(now, Utc.fix(), MAX_DAYS)
    }

    /// Whole days between `now` and the start of `date`, in either direction.
    pub fn relative_day(&self, date: NaiveDate) -> Option<usize> {
        let start = self
            .offset
            .from_local_datetime(&date.and_hms_opt(0, 0, 0)?)
            .single()?;
        let millis = (self.now - start.with_timezone(&Utc)).num_milliseconds().abs();
        usize::try_from(millis / MILLIS_PER_DAY).ok()
    }

    /// Calendar date shown for a slot; slot 0 is today.
    pub fn date_for(&self, relative_day: usize) -> NaiveDate {
        let today = self.now.with_timezone(&self.offset).date_naive();
        today
            .checked_sub_days(Days::new(relative_day as u64))
            .unwrap_or(NaiveDate::MIN)
    }
}

/// One optional status per relative day, today first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusTimeline {
    days: Vec<DayStatus>,
}

impl StatusTimeline {
    /// A timeline with no data on any day.
    pub fn empty(days: usize) -> Self {
        Self {
            days: vec![None; days],
        }
    }

    /// Re-key bucketed days onto the window. Days outside it are dropped.
    pub fn from_buckets(buckets: &DayBuckets, window: &ReportWindow) -> Self {
        let mut timeline = Self::empty(window.days);

        for (date, status) in buckets.day_statuses() {
            match window.relative_day(date) {
                Some(day) if day < window.days => {
                    // Only future dates can collide with another slot.
                    timeline.days[day] = worst_of(timeline.days[day], status);
                }
                _ => debug!("Day {} is outside the {}-day window", date, window.days),
            }
        }

        timeline
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Status of a relative day; out-of-window days have no data.
    pub fn get(&self, day: usize) -> DayStatus {
        self.days.get(day).copied().flatten()
    }

    pub fn set(&mut self, day: usize, status: DayStatus) {
        if let Some(slot) = self.days.get_mut(day) {
            *slot = status;
        }
    }

    pub fn statuses(&self) -> &[DayStatus] {
        &self.days
    }

    pub fn colors(&self) -> Vec<StatusColor> {
        self.days.iter().map(|status| StatusColor::from(*status)).collect()
    }

    /// Color of today's slot.
    pub fn current(&self) -> StatusColor {
        StatusColor::from(self.get(0))
    }
}

/// Status history and uptime of one service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceReport {
    pub timeline: StatusTimeline,
    pub up_time: String,
    pub checks: usize,
    pub skipped_lines: usize,
}

impl ServiceReport {
    /// Report for a service whose log could not be read.
    pub fn unavailable(window: &ReportWindow) -> Self {
        Self {
            timeline: StatusTimeline::empty(window.days),
            up_time: NO_UPTIME.to_string(),
            checks: 0,
            skipped_lines: 0,
        }
    }

    /// Parse, bucket and index one service's raw report text.
    pub fn build(
        parser: &dyn LogParser,
        text: &str,
        window: &ReportWindow,
        cap: BucketCap,
    ) -> Self {
        let parsed = parse_report(parser, text);
        let buckets = DayBuckets::from_records(&parsed.records, &window.offset, cap, MAX_DAYS);

        Self {
            timeline: StatusTimeline::from_buckets(&buckets, window),
            up_time: buckets.uptime().formatted(),
            checks: buckets.uptime().checks(),
            skipped_lines: parsed.skipped_lines,
        }
    }
}
