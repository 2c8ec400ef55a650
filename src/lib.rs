//! cert_status library: TLS certificate health checks
//!
//! This library connects to a list of `address:port` hosts, walks the
//! certificate chains verified during the TLS handshake and reports
//! certificates that expire within a configurable window or that are signed
//! with an algorithm past its sunset date. Findings are grouped by certificate
//! common name so one notification covers every host serving that certificate.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cert_status::initialization::{init_crypto_provider, init_tls_connector, init_trust_store};
//! use cert_status::{run_scan, Config, TlsProber};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! init_crypto_provider();
//!
//! let config = Config {
//!     hosts_file: std::path::PathBuf::from("hosts"),
//!     concurrency: 8,
//!     ..Default::default()
//! }
//! .normalized();
//!
//! let trust = init_trust_store(None)?;
//! let connector = init_tls_connector(&trust)?;
//! let prober = Arc::new(TlsProber::from_config(connector, Arc::new(trust), &config));
//! let report = run_scan(&config, prober, CancellationToken::new()).await;
//! println!(
//!     "Probed {} hosts ({} failed), {} subject(s) with findings",
//!     report.hosts_probed,
//!     report.hosts_failed,
//!     report.aggregation.len()
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

#![warn(missing_docs)]

mod aggregate;
pub mod config;
mod dispatch;
pub mod error_handling;
mod hosts;
pub mod initialization;
mod models;
pub mod notify;
mod probe;
mod run;
pub mod sunset;
pub mod tls;

// Re-export public API
pub use aggregate::{AggregationMap, Aggregator};
pub use config::{Config, ExpiryWindow, LogFormat, LogLevel, Opt};
pub use dispatch::{dispatch, ScanStream};
pub use hosts::{parse_hosts, HostSource};
pub use models::{CertificateFinding, Host, HostResult};
pub use notify::{LogNotifier, Notifier, WebhookNotifier};
pub use probe::{evaluate_chains, Probe, ProbeSettings, TlsProber};
pub use run::{run_scan, run_schedule, ScanReport};
pub use sunset::{SunsetEntry, SunsetPolicy};
