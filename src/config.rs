use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;
use crate::rate_limit::QuotaWindow;
use crate::riot::Region;

#[derive(Debug, Clone)]
pub struct Config {
    pub riot_api_key: String,
    pub database_url: String,
    pub riot_region: Region,
    pub sync_interval: Duration,
    pub run_on_startup: bool,
    pub short_window: QuotaWindow,
    pub long_window: QuotaWindow,
    pub match_page_size: u32,
    pub sync_concurrency: usize,
    pub metrics_log_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        const DEFAULT_SYNC_INTERVAL_SECS: u64 = 300;
        // Kept under Riot's 20/s and 100/2min development limits.
        const DEFAULT_SHORT_CAPACITY: u32 = 15;
        const DEFAULT_SHORT_PERIOD_SECS: u64 = 1;
        const DEFAULT_LONG_CAPACITY: u32 = 80;
        const DEFAULT_LONG_PERIOD_SECS: u64 = 120;
        const DEFAULT_MATCH_PAGE_SIZE: u32 = 100;
        const DEFAULT_SYNC_CONCURRENCY: usize = 4;
        const DEFAULT_METRICS_LOG_INTERVAL_SECS: u64 = 60;

        let riot_api_key = lookup("RIOT_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AppError::Config("RIOT_API_KEY must be set".into()))?;

        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| "sqlite:matchsync.db".into());

        let riot_region = match lookup("RIOT_REGION") {
            Some(r) => r.parse()?,
            None => Region::Europe,
        };

        let sync_interval_secs: u64 =
            parse_or(&lookup, "SYNC_INTERVAL_SECS", DEFAULT_SYNC_INTERVAL_SECS)?;
        if sync_interval_secs == 0 {
            return Err(AppError::Config(
                "SYNC_INTERVAL_SECS must be greater than zero".into(),
            ));
        }

        let run_on_startup = match lookup("SYNC_RUN_ON_STARTUP") {
            Some(v) => parse_bool(&v).ok_or_else(|| {
                AppError::Config(format!("SYNC_RUN_ON_STARTUP is not a boolean: {v}"))
            })?,
            None => true,
        };

        // Zero capacity or period is rejected by the limiter itself.
        let short_window = QuotaWindow::new(
            parse_or(&lookup, "RATE_LIMIT_SHORT_CAPACITY", DEFAULT_SHORT_CAPACITY)?,
            Duration::from_secs(parse_or(
                &lookup,
                "RATE_LIMIT_SHORT_PERIOD_SECS",
                DEFAULT_SHORT_PERIOD_SECS,
            )?),
        );
        let long_window = QuotaWindow::new(
            parse_or(&lookup, "RATE_LIMIT_LONG_CAPACITY", DEFAULT_LONG_CAPACITY)?,
            Duration::from_secs(parse_or(
                &lookup,
                "RATE_LIMIT_LONG_PERIOD_SECS",
                DEFAULT_LONG_PERIOD_SECS,
            )?),
        );

        let match_page_size = parse_or(&lookup, "MATCH_PAGE_SIZE", DEFAULT_MATCH_PAGE_SIZE)?;
        let sync_concurrency: usize =
            parse_or(&lookup, "SYNC_CONCURRENCY", DEFAULT_SYNC_CONCURRENCY)?;
        let metrics_log_interval_secs: u64 = parse_or(
            &lookup,
            "METRICS_LOG_INTERVAL_SECS",
            DEFAULT_METRICS_LOG_INTERVAL_SECS,
        )?;

        Ok(Self {
            riot_api_key,
            database_url,
            riot_region,
            sync_interval: Duration::from_secs(sync_interval_secs),
            run_on_startup,
            short_window,
            long_window,
            match_page_size: match_page_size.max(1),
            sync_concurrency: sync_concurrency.max(1),
            metrics_log_interval: Duration::from_secs(metrics_log_interval_secs.max(1)),
        })
    }
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, AppError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{key} has an invalid value: {raw}"))),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
