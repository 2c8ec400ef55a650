//! Scan passes and the periodic driver.

use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};
use tokio_util::sync::CancellationToken;

use crate::aggregate::{AggregationMap, Aggregator};
use crate::config::Config;
use crate::dispatch::dispatch;
use crate::error_handling::{print_scan_statistics, ScanStats};
use crate::hosts::HostSource;
use crate::notify::Notifier;
use crate::probe::Probe;

/// Results of one scan pass.
#[derive(Debug, Clone)]
pub struct ScanReport {
    /// Finding messages grouped by certificate common name
    pub aggregation: AggregationMap,
    /// Hosts that produced a result
    pub hosts_probed: usize,
    /// Hosts whose probe failed
    pub hosts_failed: usize,
    /// Elapsed time in seconds
    pub elapsed_seconds: f64,
}

/// Runs one scan pass over the hosts file named in `config`.
///
/// Reads the hosts file, probes every host with `config.concurrency` workers
/// and aggregates the findings. Host-level failures are logged and counted,
/// never returned. A missing or unreadable hosts file yields an empty pass.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use cert_status::initialization::{init_crypto_provider, init_tls_connector, init_trust_store};
/// use cert_status::{run_scan, Config, TlsProber};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// init_crypto_provider();
/// let config = Config::default();
/// let trust = init_trust_store(None)?;
/// let connector = init_tls_connector(&trust)?;
/// let prober = Arc::new(TlsProber::from_config(connector, Arc::new(trust), &config));
/// let report = run_scan(&config, prober, CancellationToken::new()).await;
/// for (subject, messages) in &report.aggregation {
///     println!("{subject}: {} finding(s)", messages.len());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn run_scan<P>(config: &Config, prober: Arc<P>, cancel: CancellationToken) -> ScanReport
where
    P: Probe + ?Sized + 'static,
{
    let start_time = Instant::now();
    info!(
        "Starting scan of {} with {} worker(s)",
        config.hosts_file.display(),
        config.concurrency
    );

    let source = HostSource::from_file(config.hosts_file.clone(), cancel.clone());
    let results = dispatch(source, prober, config.concurrency, cancel);

    let stats = Arc::new(ScanStats::new());
    let aggregation = Aggregator::new(Arc::clone(&stats)).drain(results).await;

    let elapsed_seconds = start_time.elapsed().as_secs_f64();
    print_scan_statistics(&stats, elapsed_seconds);

    ScanReport {
        aggregation,
        hosts_probed: stats.hosts_probed(),
        hosts_failed: stats.hosts_failed(),
        elapsed_seconds,
    }
}

/// Runs scan passes until cancelled, notifying after each completed pass.
///
/// Every pass starts with a fresh `AggregationMap`. A pass interrupted by
/// cancellation is not notified. With `config.run_once` the driver returns
/// after the first pass. Returns the number of completed passes.
pub async fn run_schedule<P, N>(
    config: &Config,
    prober: Arc<P>,
    notifier: &N,
    cancel: CancellationToken,
) -> usize
where
    P: Probe + ?Sized + 'static,
    N: Notifier + ?Sized,
{
    let mut passes = 0;
    loop {
        let report = run_scan(config, Arc::clone(&prober), cancel.clone()).await;
        if cancel.is_cancelled() {
            info!("Scan interrupted, skipping notification");
            break;
        }
        passes += 1;

        if let Err(e) = notifier.notify(&report.aggregation).await {
            warn!("Notification failed: {e}");
        }

        if config.run_once {
            break;
        }

        info!(
            "Next scan in {:.1}h",
            config.scan_interval.as_secs_f64() / 3600.0
        );
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Shutdown requested, stopping scheduler");
                break;
            }
            _ = tokio::time::sleep(config.scan_interval) => {}
        }
    }
    passes
}
