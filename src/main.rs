//! Uptime Reporter Binary

use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uptime_reporter::{Config, Dashboard, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

/// Render the uptime dashboard for one environment
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Base URL or directory holding config.json and logs/
    #[arg(long)]
    source: Option<String>,

    /// Environment: production, sandbox or live-test
    #[arg(long)]
    env: Option<String>,

    /// Partner id: palla.app or test.partner
    #[arg(long)]
    partner_id: Option<String>,

    /// Day bucket retention: enforce or unbounded
    #[arg(long)]
    bucket_cap: Option<String>,

    /// Group merge policy: worst-of or sticky-failure
    #[arg(long)]
    merge_policy: Option<String>,

    /// Display calendar offset in minutes east of UTC
    #[arg(long, allow_hyphen_values = true)]
    utc_offset_minutes: Option<i32>,

    #[arg(long, value_enum, env = "STATUS_FORMAT", default_value = "json")]
    format: OutputFormat,
}

impl Args {
    /// Flags win over environment variables.
    fn apply(&self, config: &mut Config) {
        if let Some(source) = &self.source {
            config.source = source.clone();
        }
        if let Some(env) = &self.env {
            config.set_env(env);
        }
        if let Some(partner_id) = &self.partner_id {
            config.set_partner(partner_id);
        }
        if let Some(cap) = &self.bucket_cap {
            config.bucket_cap = cap.as_str().into();
        }
        if let Some(policy) = &self.merge_policy {
            config.merge_policy = policy.as_str().into();
        }
        if let Some(minutes) = self.utc_offset_minutes {
            config.utc_offset_minutes = minutes;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    initialize_tracing();

    let args = Args::parse();
    info!("Starting uptime reporter v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::from_env();
    args.apply(&mut config);

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    info!(
        "Reporter configuration - Source: {}, Env: {}, Partner: {}, Cap: {:?}, Merge: {:?}",
        config.source, config.env, config.partner_id, config.bucket_cap, config.merge_policy
    );

    let dashboard = Dashboard::new(config)?;
    let report = match dashboard.build(chrono::Utc::now()).await {
        Ok(report) => report,
        Err(e) => {
            error!("Failed to build dashboard: {}", e);
            std::process::exit(1);
        }
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", report.to_text()),
    }

    Ok(())
}

/// Initialize structured logging on stderr
fn initialize_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .json();

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
