use anyhow::Context;
use chrono::{NaiveTime, Weekday};
use std::path::PathBuf;

const DEFAULT_REGIONS: &[&str] = &["US"];
const DEFAULT_KEYWORDS: &[&str] = &[
    "Tesla stock",
    "Bitcoin",
    "Ethereum",
    "Stock market",
    "Cryptocurrency",
    "Investment trends",
];
const DEFAULT_OUTPUT_DIR: &str = "reports";
const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Settings {
    pub trends_provider_base_url: Option<String>,
    pub trends_provider_api_key: Option<String>,
    pub trends_provider_timeout_secs: u64,
    pub regions: Vec<String>,
    pub keywords: Vec<String>,
    pub output_dir: PathBuf,
    pub include_charts: bool,
    pub email_sender: Option<String>,
    pub email_password: Option<String>,
    pub email_recipient: Option<String>,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub daily_report_time: NaiveTime,
    pub weekly_report_day: Weekday,
    pub weekly_report_time: NaiveTime,
    pub monthly_report_day: u32,
    pub monthly_report_time: NaiveTime,
    pub sentry_dsn: Option<String>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let trends_provider_timeout_secs = match get("TRENDS_PROVIDER_TIMEOUT_SECS") {
            Some(s) => s
                .trim()
                .parse::<u64>()
                .with_context(|| format!("TRENDS_PROVIDER_TIMEOUT_SECS is not a number: {s}"))?,
            None => DEFAULT_PROVIDER_TIMEOUT_SECS,
        };

        let smtp_port = match get("SMTP_PORT") {
            Some(s) => s
                .trim()
                .parse::<u16>()
                .with_context(|| format!("SMTP_PORT is not a valid port: {s}"))?,
            None => DEFAULT_SMTP_PORT,
        };

        let include_charts = match get("INCLUDE_CHARTS") {
            Some(s) => parse_bool(&s).with_context(|| format!("INCLUDE_CHARTS is not a boolean: {s}"))?,
            None => true,
        };

        let weekly_report_day = match get("WEEKLY_REPORT_DAY") {
            Some(s) => s
                .trim()
                .parse::<Weekday>()
                .map_err(|_| anyhow::anyhow!("WEEKLY_REPORT_DAY is not a weekday: {s}"))?,
            None => Weekday::Mon,
        };

        let monthly_report_day = match get("MONTHLY_REPORT_DAY") {
            Some(s) => s
                .trim()
                .parse::<u32>()
                .with_context(|| format!("MONTHLY_REPORT_DAY is not a number: {s}"))?,
            None => 1,
        };
        anyhow::ensure!(
            (1..=31).contains(&monthly_report_day),
            "MONTHLY_REPORT_DAY must be 1..=31 (got {monthly_report_day})"
        );

        Ok(Self {
            trends_provider_base_url: get("TRENDS_PROVIDER_BASE_URL"),
            trends_provider_api_key: get("TRENDS_PROVIDER_API_KEY"),
            trends_provider_timeout_secs,
            regions: get("TRENDS_REGIONS")
                .map(|s| split_list(&s))
                .unwrap_or_else(|| to_owned_list(DEFAULT_REGIONS)),
            keywords: get("TRENDS_KEYWORDS")
                .map(|s| split_list(&s))
                .unwrap_or_else(|| to_owned_list(DEFAULT_KEYWORDS)),
            output_dir: get("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            include_charts,
            email_sender: get("EMAIL_SENDER"),
            email_password: get("EMAIL_PASSWORD"),
            email_recipient: get("EMAIL_RECIPIENT"),
            smtp_server: get("SMTP_SERVER").unwrap_or_else(|| DEFAULT_SMTP_SERVER.to_string()),
            smtp_port,
            daily_report_time: parse_time(get("DAILY_REPORT_TIME"), "DAILY_REPORT_TIME", "08:00")?,
            weekly_report_day,
            weekly_report_time: parse_time(get("WEEKLY_REPORT_TIME"), "WEEKLY_REPORT_TIME", "09:00")?,
            monthly_report_day,
            monthly_report_time: parse_time(get("MONTHLY_REPORT_TIME"), "MONTHLY_REPORT_TIME", "10:00")?,
            sentry_dsn: get("SENTRY_DSN"),
        })
    }

    pub fn require_trends_provider_base_url(&self) -> anyhow::Result<&str> {
        self.trends_provider_base_url
            .as_deref()
            .context("TRENDS_PROVIDER_BASE_URL is required")
    }
}

fn parse_time(value: Option<String>, key: &str, default: &str) -> anyhow::Result<NaiveTime> {
    let s = value.unwrap_or_else(|| default.to_string());
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .with_context(|| format!("{key} must be HH:MM (got {s})"))
}

fn parse_bool(s: &str) -> anyhow::Result<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("expected true/false"),
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
