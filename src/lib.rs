//! Uptime Reporter Library
//!
//! Turns per-service health-check logs into 30-day status grids, folds api
//! services into composite groups and computes uptime percentages for a
//! status dashboard.

pub mod buckets;
pub mod config;
pub mod dashboard;
pub mod errors;
pub mod groups;
pub mod log_parser;
pub mod services;
pub mod source;
pub mod status;
pub mod timeline;

pub use buckets::{BucketCap, DayBuckets, UptimeSummary};
pub use config::{Config, Environment};
pub use dashboard::{Dashboard, DashboardReport, StatusRow};
pub use errors::{ReportError, Result};
pub use groups::{GroupReport, MergePolicy};
pub use log_parser::{CheckLogParser, CheckRecord, LogParser};
pub use services::{GroupKind, ServiceCatalog, ServiceDescriptor};
pub use source::LogSource;
pub use status::{DayStatus, Outcome, StatusColor};
pub use timeline::{ReportWindow, ServiceReport, StatusTimeline};
