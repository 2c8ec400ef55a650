//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration. Invalid numeric inputs are never errors: they are clamped
//! to safe defaults when an `Opt` is turned into a `Config`.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Days, Months, Utc};
use clap::{ArgAction, Parser, ValueEnum};

use crate::config::constants::{
    DEFAULT_CONCURRENCY, DEFAULT_HOSTS_FILE, DEFAULT_SCAN_INTERVAL_HOURS, DEFAULT_WARN_DAYS,
    DEFAULT_WEBHOOK_URL, TCP_CONNECT_TIMEOUT_SECS, TLS_HANDSHAKE_TIMEOUT_SECS, TOKEN_ENV_VAR,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// How far ahead of "now" a certificate expiry is reported.
///
/// The window is the calendar sum of `years`, `months` and `days`. A window
/// where all three parts are zero is never used: it falls back to
/// [`DEFAULT_WARN_DAYS`] days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryWindow {
    /// Whole years added to "now"
    pub years: u32,
    /// Whole months added to "now"
    pub months: u32,
    /// Days added to "now"
    pub days: u32,
}

impl Default for ExpiryWindow {
    fn default() -> Self {
        Self {
            years: 0,
            months: 0,
            days: DEFAULT_WARN_DAYS,
        }
    }
}

impl ExpiryWindow {
    /// Builds a window from raw (possibly negative) user input.
    ///
    /// Negative parts are clamped to zero before the all-zero default is applied.
    pub fn from_signed(years: i64, months: i64, days: i64) -> Self {
        let clamp = |value: i64| u32::try_from(value.max(0)).unwrap_or(u32::MAX);
        Self {
            years: clamp(years),
            months: clamp(months),
            days: clamp(days),
        }
        .normalized()
    }

    /// Returns the window with the all-zero case replaced by the default.
    pub fn normalized(self) -> Self {
        if self.years == 0 && self.months == 0 && self.days == 0 {
            Self::default()
        } else {
            self
        }
    }

    /// Computes `now + years + months + days`.
    ///
    /// Years and months are applied together as calendar months (day-of-month is
    /// clamped to the end of shorter months), then days are added. Saturates at
    /// the maximum representable instant.
    pub fn threshold_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let months = self.years.saturating_mul(12).saturating_add(self.months);
        now.checked_add_months(Months::new(months))
            .and_then(|t| t.checked_add_days(Days::new(u64::from(self.days))))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Library configuration (no CLI dependencies).
///
/// This is the core configuration struct used by the library. It can be
/// constructed programmatically without any CLI dependencies.
///
/// # Examples
///
/// ```no_run
/// use cert_status::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     hosts_file: PathBuf::from("hosts"),
///     concurrency: 8,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// File to read hosts from
    pub hosts_file: PathBuf,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,

    /// Expiry warning window
    pub window: ExpiryWindow,

    /// Check non-root certificates for sunset signature algorithms
    pub check_signature_algorithm: bool,

    /// Number of concurrent probe workers
    pub concurrency: usize,

    /// TCP connect timeout
    pub connect_timeout: Duration,

    /// TLS handshake timeout
    pub handshake_timeout: Duration,

    /// Extra PEM bundle of trusted roots, evaluated whole when a path ends at one
    pub ca_file: Option<PathBuf>,

    /// Webhook access token; `None` logs notifications instead of posting them
    pub token: Option<String>,

    /// Webhook endpoint prefix the token is appended to
    pub webhook_url: String,

    /// Pause between two scan passes
    pub scan_interval: Duration,

    /// Run a single pass and exit
    pub run_once: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hosts_file: PathBuf::from(DEFAULT_HOSTS_FILE),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            window: ExpiryWindow::default(),
            check_signature_algorithm: true,
            concurrency: DEFAULT_CONCURRENCY,
            connect_timeout: Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS),
            handshake_timeout: Duration::from_secs(TLS_HANDSHAKE_TIMEOUT_SECS),
            ca_file: None,
            token: None,
            webhook_url: DEFAULT_WEBHOOK_URL.to_string(),
            scan_interval: Duration::from_secs(DEFAULT_SCAN_INTERVAL_HOURS * 3600),
            run_once: false,
        }
    }
}

impl Config {
    /// Replaces out-of-range values with safe defaults.
    ///
    /// Zero concurrency becomes [`DEFAULT_CONCURRENCY`], an all-zero window becomes
    /// the default window, zero timeouts and a zero interval fall back to the
    /// built-in values, and a blank token disables the webhook.
    pub fn normalized(mut self) -> Self {
        if self.concurrency == 0 {
            self.concurrency = DEFAULT_CONCURRENCY;
        }
        self.window = self.window.normalized();
        if self.connect_timeout.is_zero() {
            self.connect_timeout = Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS);
        }
        if self.handshake_timeout.is_zero() {
            self.handshake_timeout = Duration::from_secs(TLS_HANDSHAKE_TIMEOUT_SECS);
        }
        if self.scan_interval.is_zero() {
            self.scan_interval = Duration::from_secs(DEFAULT_SCAN_INTERVAL_HOURS * 3600);
        }
        if self.token.as_deref().is_some_and(|t| t.trim().is_empty()) {
            self.token = None;
        }
        self
    }
}

/// Command-line options.
///
/// This struct is automatically generated by `clap` from the field attributes.
/// Numeric options accept negative values so they can be clamped rather than
/// rejected.
///
/// # Examples
///
/// ```bash
/// # Daily scan, warn 30 days ahead, 8 workers
/// cert_status --hosts ./hosts --days 30 --concurrency 8 --token abc123
///
/// # Single pass without the signature algorithm check
/// cert_status --hosts ./hosts --once --check-sig-alg false
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "cert_status",
    about = "Checks TLS certificate chains for upcoming expiry and sunset signature algorithms."
)]
pub struct Opt {
    /// The path to the file containing a list of hosts to check
    #[arg(long, value_parser, default_value = DEFAULT_HOSTS_FILE)]
    pub hosts: PathBuf,

    /// Warn if the certificate will expire within this many years
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub years: i64,

    /// Warn if the certificate will expire within this many months
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub months: i64,

    /// Warn if the certificate will expire within this many days
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub days: i64,

    /// Verify that non-root certificates are using a good signature algorithm
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    pub check_sig_alg: bool,

    /// Maximum number of hosts to check at once
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY as i64, allow_negative_numbers = true)]
    pub concurrency: i64,

    /// PEM bundle of additional trusted root certificates
    #[arg(long, value_parser)]
    pub ca_file: Option<PathBuf>,

    /// Webhook access token (notifications are only logged when empty)
    #[arg(long, env = TOKEN_ENV_VAR, default_value = "", hide_env_values = true)]
    pub token: String,

    /// Webhook endpoint the token is appended to
    #[arg(long, default_value = DEFAULT_WEBHOOK_URL)]
    pub webhook_url: String,

    /// Hours to wait between scan passes
    #[arg(long, default_value_t = DEFAULT_SCAN_INTERVAL_HOURS)]
    pub interval_hours: u64,

    /// Run a single scan pass and exit
    #[arg(long)]
    pub once: bool,

    /// TCP connect timeout in seconds
    #[arg(long, default_value_t = TCP_CONNECT_TIMEOUT_SECS)]
    pub connect_timeout_secs: u64,

    /// TLS handshake timeout in seconds
    #[arg(long, default_value_t = TLS_HANDSHAKE_TIMEOUT_SECS)]
    pub handshake_timeout_secs: u64,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl From<Opt> for Config {
    fn from(opt: Opt) -> Self {
        let concurrency = usize::try_from(opt.concurrency)
            .ok()
            .filter(|&c| c > 0)
            .unwrap_or(DEFAULT_CONCURRENCY);

        Config {
            hosts_file: opt.hosts,
            log_level: opt.log_level,
            log_format: opt.log_format,
            window: ExpiryWindow::from_signed(opt.years, opt.months, opt.days),
            check_signature_algorithm: opt.check_sig_alg,
            concurrency,
            connect_timeout: Duration::from_secs(opt.connect_timeout_secs),
            handshake_timeout: Duration::from_secs(opt.handshake_timeout_secs),
            ca_file: opt.ca_file,
            token: Some(opt.token),
            webhook_url: opt.webhook_url,
            scan_interval: Duration::from_secs(opt.interval_hours.saturating_mul(3600)),
            run_once: opt.once,
        }
        .normalized()
    }
}
