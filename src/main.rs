//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `cert_status` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger and TLS initialization
//! - Ctrl-C handling
//!
//! All core functionality is implemented in the library crate.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use cert_status::initialization::{
    init_crypto_provider, init_logger_with, init_tls_connector, init_trust_store,
    init_webhook_client,
};
use cert_status::{run_schedule, Config, LogNotifier, Notifier, Opt, TlsProber, WebhookNotifier};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    // so the webhook token can live there instead of on the command line
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let config = Config::from(Opt::parse());

    init_logger_with(config.log_level.clone().into(), config.log_format.clone())
        .context("Failed to initialize logger")?;

    // Initialize crypto provider for TLS operations
    init_crypto_provider();

    let trust = init_trust_store(config.ca_file.as_deref()).context("Failed to load trust store")?;
    let connector = init_tls_connector(&trust).context("Failed to initialize TLS connector")?;
    let prober = Arc::new(TlsProber::from_config(connector, Arc::new(trust), &config));

    let notifier: Box<dyn Notifier> = match config.token.as_deref() {
        Some(token) => {
            let client = init_webhook_client().context("Failed to initialize webhook client")?;
            Box::new(WebhookNotifier::new(client, &config.webhook_url, token))
        }
        None => {
            warn!("No webhook token configured, findings will only be logged");
            Box::new(LogNotifier)
        }
    };

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl-C, finishing in-flight probes");
                    cancel.cancel();
                }
                Err(e) => warn!("Failed to listen for Ctrl-C: {e}"),
            }
        });
    }

    let passes = run_schedule(&config, prober, notifier.as_ref(), cancel).await;
    info!("Completed {passes} scan pass(es)");
    Ok(())
}
