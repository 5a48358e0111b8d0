//! Dashboard assembly: fetch every report, build rows, render

use crate::buckets::BucketCap;
use crate::config::{Config, Environment};
use crate::errors::{ReportError, Result};
use crate::groups::{GroupReport, MergePolicy};
use crate::log_parser::CheckLogParser;
use crate::services::{Section, ServiceCatalog, ServiceDescriptor};
use crate::source::{CATALOG_PATH, LogSource, open_source};
use crate::status::{StatusColor, tooltip};
use crate::timeline::{ReportWindow, ServiceReport, StatusTimeline};

use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Builds dashboards from a catalog and log source
pub struct Dashboard {
    config: Config,
    source: Arc<dyn LogSource>,
    parser: CheckLogParser,
}

/// One square of a status row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCell {
    pub relative_day: usize,
    pub date: NaiveDate,
    pub color: StatusColor,
    pub status: String,
    pub description: String,
    pub tooltip: String,
}

/// One rendered service or group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusRow {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub up_time: String,
    pub color: StatusColor,
    pub status: String,
    /// Today first.
    pub days: Vec<DayCell>,
}

impl StatusRow {
    pub fn new(
        key: &str,
        label: &str,
        kind: &str,
        up_time: &str,
        timeline: &StatusTimeline,
        window: &ReportWindow,
    ) -> Self {
        let days = timeline
            .colors()
            .into_iter()
            .enumerate()
            .map(|(relative_day, color)| {
                let date = window.date_for(relative_day);
                DayCell {
                    relative_day,
                    date,
                    color,
                    status: color.label().to_string(),
                    description: color.description().to_string(),
                    tooltip: tooltip(key, date, color),
                }
            })
            .collect();

        let color = timeline.current();
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: kind.to_string(),
            up_time: up_time.to_string(),
            color,
            status: color.label().to_string(),
            days,
        }
    }

    pub fn colors(&self) -> Vec<StatusColor> {
        self.days.iter().map(|cell| cell.color).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionReport {
    pub section: Section,
    pub title: String,
    pub rows: Vec<StatusRow>,
}

/// Everything the rendering layer needs for one refresh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub environment: Environment,
    pub partner_id: String,
    pub generated_at: DateTime<Utc>,
    pub window_days: usize,
    pub sections: Vec<SectionReport>,
}

impl DashboardReport {
    pub fn rows(&self) -> impl Iterator<Item = &StatusRow> {
        self.sections.iter().flat_map(|s| s.rows.iter())
    }

    pub fn row(&self, key: &str) -> Option<&StatusRow> {
        self.rows().find(|row| row.key == key)
    }

    /// Plain-text grid, oldest day on the left.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{} / {} ({} days to {})",
            self.environment,
            self.partner_id,
            self.window_days,
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        );

        for section in &self.sections {
            let _ = writeln!(out, "\n{}", section.title);
            for row in &section.rows {
                let grid: String = row.days.iter().rev().map(|cell| symbol(cell.color)).collect();
                let _ = writeln!(
                    out,
                    "  {:<20} {:>8}  {}  {}",
                    row.label, row.up_time, grid, row.status
                );
            }
        }

        out
    }
}

fn symbol(color: StatusColor) -> char {
    match color {
        StatusColor::NoData => '.',
        StatusColor::Success => '#',
        StatusColor::Partial => '~',
        StatusColor::Failure => 'x',
    }
}

impl Dashboard {
    /// Create a dashboard reading from the configured source
    pub fn new(config: Config) -> Result<Self> {
        let source = open_source(&config.source, config.http_timeout)?;
        Self::with_source(config, source)
    }

    pub fn with_source(config: Config, source: Arc<dyn LogSource>) -> Result<Self> {
        config.validate().map_err(ReportError::Config)?;

        Ok(Self {
            config,
            source,
            parser: CheckLogParser::new(),
        })
    }

    /// Window for a pass computed at `now`.
    pub fn window(&self, now: DateTime<Utc>) -> Result<ReportWindow> {
        let offset = self.config.display_offset().ok_or_else(|| {
            ReportError::Config(format!(
                "utc_offset_minutes {} is out of range",
                self.config.utc_offset_minutes
            ))
        })?;
        Ok(ReportWindow::new(now, offset, self.config.window_days))
    }

    /// Fetch and parse the service catalog. A missing catalog is fatal.
    #[instrument(skip(self))]
    pub async fn load_catalog(&self) -> Result<ServiceCatalog> {
        let text = self.source.fetch_text(CATALOG_PATH).await?;
        let catalog = ServiceCatalog::from_json(&text)?;
        info!(
            "Loaded {} services from {}",
            catalog.len(),
            self.source.describe()
        );
        Ok(catalog)
    }

    /// Build the whole dashboard as of `now`.
    #[instrument(skip(self))]
    pub async fn build(&self, now: DateTime<Utc>) -> Result<DashboardReport> {
        let catalog = self.load_catalog().await?;
        self.build_from_catalog(&catalog, now).await
    }

    /// Build the dashboard for an already loaded catalog.
    pub async fn build_from_catalog(
        &self,
        catalog: &ServiceCatalog,
        now: DateTime<Utc>,
    ) -> Result<DashboardReport> {
        let window = self.window(now)?;
        let env = self.config.env;
        let mut sections = Vec::new();

        for section in Section::ALL {
            // Headers follow the whole catalog; rows follow the environment.
            if !catalog.has_section(section) {
                continue;
            }

            let rows = match section {
                Section::Web => self.build_web_rows(catalog, &window).await,
                Section::Api => self
                    .build_groups(catalog, &window)
                    .await
                    .iter()
                    .map(|group| {
                        StatusRow::new(
                            &group.group.key,
                            &group.group.label,
                            &group.group.kind,
                            &group.up_time,
                            &group.timeline,
                            &window,
                        )
                    })
                    .collect(),
            };

            sections.push(SectionReport {
                section,
                title: section.title(),
                rows,
            });
        }

        info!(
            "Built dashboard for {} with {} sections",
            env,
            sections.len()
        );

        Ok(DashboardReport {
            environment: env,
            partner_id: self.config.partner_id.clone(),
            generated_at: now,
            window_days: window.days,
            sections,
        })
    }

    /// One row per web service of the selected environment.
    pub async fn build_web_rows(
        &self,
        catalog: &ServiceCatalog,
        window: &ReportWindow,
    ) -> Vec<StatusRow> {
        let web = catalog.section(Section::Web, self.config.env);
        let reports = self.fetch_reports(&web, window).await;

        web.iter()
            .zip(reports.iter())
            .map(|(service, report)| {
                StatusRow::new(
                    &service.key,
                    &service.label,
                    &service.kind,
                    &report.up_time,
                    &report.timeline,
                    window,
                )
            })
            .collect()
    }

    /// Group reports for every api group, in group order.
    pub async fn build_groups(
        &self,
        catalog: &ServiceCatalog,
        window: &ReportWindow,
    ) -> Vec<GroupReport> {
        let groups = catalog.groups(self.config.env);
        let members: Vec<&ServiceDescriptor> = groups
            .iter()
            .flat_map(|(_, members)| members.iter().copied())
            .collect();

        // One concurrent fetch for all groups; results come back in member order.
        let mut reports = self.fetch_reports(&members, window).await.into_iter();

        groups
            .iter()
            .map(|(kind, services)| {
                let member_reports: Vec<(String, ServiceReport)> = services
                    .iter()
                    .map(|service| {
                        let report = reports
                            .next()
                            .unwrap_or_else(|| ServiceReport::unavailable(window));
                        (service.key.clone(), report)
                    })
                    .collect();

                debug!("Reducing {:?} group over {} services", kind, member_reports.len());
                GroupReport::build(
                    kind.descriptor(),
                    &member_reports,
                    window.days,
                    self.merge_policy(),
                )
            })
            .collect()
    }

    /// Fetch and build service reports concurrently, returned in input order.
    pub async fn fetch_reports(
        &self,
        services: &[&ServiceDescriptor],
        window: &ReportWindow,
    ) -> Vec<ServiceReport> {
        let fetches = services.iter().map(|service| self.fetch_report(service, window));
        join_all(fetches).await
    }

    /// Report for one service; an unreadable log counts as an empty one.
    async fn fetch_report(&self, service: &ServiceDescriptor, window: &ReportWindow) -> ServiceReport {
        let path = service.log_path(self.config.env);

        match self.source.fetch_text(&path).await {
            Ok(text) => {
                let report = ServiceReport::build(&self.parser, &text, window, self.bucket_cap());
                if report.skipped_lines > 0 {
                    warn!(
                        "Skipped {} malformed lines in report for {}",
                        report.skipped_lines, service.key
                    );
                }
                debug!(
                    "Service {} uptime {} over {} checks",
                    service.key, report.up_time, report.checks
                );
                report
            }
            Err(e) => {
                warn!("No report for service {} ({}): {}", service.key, path, e);
                ServiceReport::unavailable(window)
            }
        }
    }

    fn bucket_cap(&self) -> BucketCap {
        self.config.bucket_cap
    }

    fn merge_policy(&self) -> MergePolicy {
        self.config.merge_policy
    }
}
