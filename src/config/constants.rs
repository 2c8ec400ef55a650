//! Configuration constants.
//!
//! This module defines the defaults and operational limits used throughout the
//! checker: timeouts, worker counts, expiry windows and notification settings.

use std::time::Duration;

/// Default number of concurrent probe workers.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Days in the warning window when no years, months or days were configured.
pub const DEFAULT_WARN_DAYS: u32 = 20;

/// Certificates with this many hours (or fewer) remaining get the urgent message.
pub const URGENT_EXPIRY_HOURS: i64 = 48;

/// Default hosts file path.
pub const DEFAULT_HOSTS_FILE: &str = "hosts";

/// Port assumed when a host line does not carry one.
pub const DEFAULT_TLS_PORT: u16 = 443;

// Network operation timeouts
/// TCP connection timeout in seconds
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 5;
/// TLS handshake timeout in seconds
pub const TLS_HANDSHAKE_TIMEOUT_SECS: u64 = 5;

// Scan cadence
/// Hours between two scan passes.
pub const DEFAULT_SCAN_INTERVAL_HOURS: u64 = 24;

// Notification
/// DingTalk robot endpoint; the access token is appended verbatim.
pub const DEFAULT_WEBHOOK_URL: &str = "https://oapi.dingtalk.com/robot/send?access_token=";
/// Webhook request timeout.
pub const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

/// Environment variable consulted for the webhook token.
pub const TOKEN_ENV_VAR: &str = "CERT_STATUS_TOKEN";
