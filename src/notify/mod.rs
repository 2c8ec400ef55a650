//! Delivery of a pass's findings.
//!
//! A `Notifier` receives the whole `AggregationMap` once per pass. Each
//! subject becomes one text message made of its finding lines.

mod webhook;

use async_trait::async_trait;
use log::warn;

use crate::aggregate::AggregationMap;
use crate::error_handling::NotifyError;

pub use webhook::WebhookNotifier;

/// Sink for the findings of one scan pass.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers every subject of `map`. An empty map delivers nothing.
    async fn notify(&self, map: &AggregationMap) -> Result<(), NotifyError>;
}

/// Builds the text body for one subject: a leading newline, then one line
/// per message.
pub fn compose_message(messages: &[String]) -> String {
    let mut text = String::from("\n");
    for message in messages {
        text.push_str(message);
        text.push('\n');
    }
    text
}

/// Writes findings to the log instead of an external service.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, map: &AggregationMap) -> Result<(), NotifyError> {
        for (subject, messages) in map {
            warn!("[{subject}]{}", compose_message(messages).trim_end());
        }
        Ok(())
    }
}
