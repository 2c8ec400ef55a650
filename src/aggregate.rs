//! Result aggregation.
//!
//! Folds the results of one scan pass into an `AggregationMap` keyed by
//! certificate common name. Host-level failures are logged and counted but
//! never reach the map.

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use log::{debug, warn};

use crate::error_handling::ScanStats;
use crate::models::HostResult;

/// Finding messages of one scan pass, grouped by certificate common name.
///
/// Within a subject, messages keep the order in which they were recorded.
/// Subjects iterate in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationMap {
    subjects: BTreeMap<String, Vec<String>>,
}

impl AggregationMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one message to `subject`, creating the entry if absent.
    pub fn record(&mut self, subject: &str, message: impl Into<String>) {
        self.subjects
            .entry(subject.to_string())
            .or_default()
            .push(message.into());
    }

    /// Messages recorded for `subject`.
    pub fn get(&self, subject: &str) -> Option<&[String]> {
        self.subjects.get(subject).map(Vec::as_slice)
    }

    /// Iterates subjects and their messages in subject order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Vec<String>> {
        self.subjects.iter()
    }

    /// Number of subjects.
    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    /// Returns `true` when no message was recorded.
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    /// Total number of messages across all subjects.
    pub fn message_count(&self) -> usize {
        self.subjects.values().map(Vec::len).sum()
    }

    /// Removes every subject.
    pub fn clear(&mut self) {
        self.subjects.clear();
    }

    /// Returns the current contents and leaves the map empty.
    pub fn take(&mut self) -> AggregationMap {
        std::mem::take(self)
    }
}

impl<'a> IntoIterator for &'a AggregationMap {
    type Item = (&'a String, &'a Vec<String>);
    type IntoIter = btree_map::Iter<'a, String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Consumes `HostResult`s and builds the pass's `AggregationMap`.
pub struct Aggregator {
    map: AggregationMap,
    stats: Arc<ScanStats>,
}

impl Aggregator {
    /// Creates an aggregator that reports counters into `stats`.
    pub fn new(stats: Arc<ScanStats>) -> Self {
        Self {
            map: AggregationMap::new(),
            stats,
        }
    }

    /// Folds one host result into the map.
    pub fn absorb(&mut self, result: HostResult) {
        let HostResult { host, outcome } = result;
        match outcome {
            Err(e) => {
                let cause = e.to_string();
                warn!(host = host.as_str(), cause = cause.as_str(); "{host}: {cause}");
                self.stats.record_host(true);
                self.stats.increment_error(e.error_type());
            }
            Ok(findings) => {
                self.stats.record_host(false);
                for finding in findings {
                    self.stats.record_certificate(finding.issues.len());
                    for issue in finding.issues {
                        self.map.record(&finding.common_name, issue);
                    }
                }
            }
        }
    }

    /// Consumes `results` until it ends and returns the map.
    pub async fn drain<S>(mut self, mut results: S) -> AggregationMap
    where
        S: Stream<Item = HostResult> + Unpin,
    {
        while let Some(result) = results.next().await {
            self.absorb(result);
        }
        debug!(
            "Aggregated {} message(s) for {} subject(s)",
            self.map.message_count(),
            self.map.len()
        );
        self.map
    }

    /// The map built so far.
    pub fn into_map(self) -> AggregationMap {
        self.map
    }
}
