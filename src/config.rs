//! Configuration management for the uptime reporter

use crate::buckets::{BucketCap, MAX_DAYS};
use crate::groups::MergePolicy;
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use tracing::warn;

/// Partners a dashboard may be rendered for.
pub const ALLOWED_PARTNERS: [&str; 2] = ["palla.app", "test.partner"];

pub const DEFAULT_PARTNER: &str = "palla.app";

/// Deployment environment whose logs are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Environment {
    #[default]
    Production,
    Sandbox,
    LiveTest,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Sandbox => "sandbox",
            Environment::LiveTest => "live-test",
        }
    }

    /// Case-insensitive lookup against the allow-list.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "production" => Some(Environment::Production),
            "sandbox" => Some(Environment::Sandbox),
            "live-test" => Some(Environment::LiveTest),
            _ => None,
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive partner allow-list check.
pub fn is_valid_partner(id: &str) -> bool {
    let id = id.trim().to_lowercase();
    ALLOWED_PARTNERS.contains(&id.as_str())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL or directory holding `config.json` and `logs/`
    pub source: String,

    /// Environment whose services are reported
    pub env: Environment,

    /// Partner the dashboard is rendered for
    pub partner_id: String,

    /// Number of days shown per service
    pub window_days: usize,

    /// Day bucket retention policy
    pub bucket_cap: BucketCap,

    /// How member services combine into a group
    pub merge_policy: MergePolicy,

    /// Offset of the calendar days are displayed in, in minutes east of UTC
    pub utc_offset_minutes: i32,

    /// HTTP timeout for remote sources
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: ".".to_string(),
            env: Environment::Production,
            partner_id: DEFAULT_PARTNER.to_string(),
            window_days: MAX_DAYS,
            bucket_cap: BucketCap::Enforce,
            merge_policy: MergePolicy::WorstOf,
            utc_offset_minutes: 0,
            http_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key/value lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(source) = lookup("STATUS_SOURCE") {
            config.source = source;
        }

        if let Some(env) = lookup("STATUS_ENV") {
            config.set_env(&env);
        }

        if let Some(partner_id) = lookup("PARTNER_ID") {
            config.set_partner(&partner_id);
        }

        if let Some(window) = lookup("WINDOW_DAYS") {
            if let Ok(days) = window.parse() {
                config.window_days = days;
            }
        }

        if let Some(cap) = lookup("BUCKET_CAP") {
            config.bucket_cap = BucketCap::from(cap.as_str());
        }

        if let Some(policy) = lookup("MERGE_POLICY") {
            config.merge_policy = MergePolicy::from(policy.as_str());
        }

        if let Some(offset) = lookup("DISPLAY_UTC_OFFSET_MINUTES") {
            if let Ok(minutes) = offset.parse() {
                config.utc_offset_minutes = minutes;
            }
        }

        if let Some(timeout) = lookup("HTTP_TIMEOUT_SECONDS") {
            if let Ok(seconds) = timeout.parse::<u64>() {
                config.http_timeout = Duration::from_secs(seconds);
            }
        }

        config
    }

    /// Select an environment; unknown names keep the current one.
    pub fn set_env(&mut self, value: &str) {
        match Environment::parse(value) {
            Some(env) => self.env = env,
            None => warn!("Ignoring unknown environment '{}', using {}", value, self.env),
        }
    }

    /// Select a partner; ids outside the allow-list keep the current one.
    pub fn set_partner(&mut self, value: &str) {
        if is_valid_partner(value) {
            self.partner_id = value.trim().to_lowercase();
        } else {
            warn!("Ignoring unknown partner '{}', using {}", value, self.partner_id);
        }
    }

    /// Offset of the display calendar.
    pub fn display_offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes.checked_mul(60)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.source.is_empty() {
            return Err("source cannot be empty".to_string());
        }

        if !is_valid_partner(&self.partner_id) {
            return Err(format!("partner_id '{}' is not allowed", self.partner_id));
        }

        if self.window_days == 0 {
            return Err("window_days must be greater than 0".to_string());
        }

        if self.display_offset().is_none() {
            return Err(format!(
                "utc_offset_minutes {} is out of range",
                self.utc_offset_minutes
            ));
        }

        Ok(())
    }
}
