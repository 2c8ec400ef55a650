//! Worker pool dispatcher.
//!
//! Runs a fixed number of probe workers over one `HostSource`. Workers pull
//! hosts from a shared queue and push every `HostResult` onto one results
//! channel. A watcher task joins all workers and only then closes the results
//! channel, so the consumer sees the end of the stream exactly when the pass
//! is complete. Results arrive in completion order.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use log::{debug, error};
use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

use crate::hosts::HostSource;
use crate::models::{Host, HostResult};
use crate::probe::Probe;

/// Stream of results for one scan pass.
///
/// Ends once every worker has finished. Dropping it early makes the workers
/// stop after their current probe.
pub struct ScanStream {
    results: mpsc::Receiver<HostResult>,
    watcher: JoinHandle<()>,
}

impl ScanStream {
    /// Receives the next result, or `None` once the pass is complete.
    pub async fn recv(&mut self) -> Option<HostResult> {
        self.results.recv().await
    }

    /// Drains the stream and waits for the watcher to finish.
    pub async fn collect_all(mut self) -> Vec<HostResult> {
        let mut all = Vec::new();
        while let Some(result) = self.results.recv().await {
            all.push(result);
        }
        if let Err(e) = self.watcher.await {
            error!("Scan watcher failed: {e}");
        }
        all
    }
}

impl Stream for ScanStream {
    type Item = HostResult;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().results.poll_recv(cx)
    }
}

/// Starts `concurrency` workers probing the hosts of `source`.
///
/// Cancelling `cancel` stops the host producer and makes every worker exit
/// before its next host; probes already in flight run to completion (bounded
/// by the prober's own timeouts) and their results are still delivered.
///
/// # Arguments
///
/// * `source` - Host producer for this pass
/// * `prober` - Shared prober invoked once per host
/// * `concurrency` - Number of workers; callers normalize it to at least 1
/// * `cancel` - Shared cancellation signal
pub fn dispatch<P>(
    source: HostSource,
    prober: Arc<P>,
    concurrency: usize,
    cancel: CancellationToken,
) -> ScanStream
where
    P: Probe + ?Sized + 'static,
{
    let concurrency = concurrency.max(1);
    let (hosts, producer) = source.into_parts();
    let hosts = Arc::new(Mutex::new(hosts));
    let (results_tx, results) = mpsc::channel(concurrency);

    let mut workers = JoinSet::new();
    for id in 0..concurrency {
        workers.spawn(worker(
            id,
            Arc::clone(&hosts),
            Arc::clone(&prober),
            results_tx.clone(),
            cancel.clone(),
        ));
    }
    drop(hosts);

    let watcher = tokio::spawn(async move {
        let mut probed = 0usize;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(count) => probed += count,
                Err(e) => error!("Scan worker failed: {e}"),
            }
        }
        match producer.await {
            Ok(queued) => debug!("All workers done: {probed} of {queued} queued host(s) probed"),
            Err(e) => error!("Host producer failed: {e}"),
        }
        // Last sender: the stream ends here
        drop(results_tx);
    });

    ScanStream { results, watcher }
}

async fn worker<P>(
    id: usize,
    hosts: Arc<Mutex<mpsc::Receiver<Host>>>,
    prober: Arc<P>,
    results: mpsc::Sender<HostResult>,
    cancel: CancellationToken,
) -> usize
where
    P: Probe + ?Sized,
{
    let mut probed = 0;
    loop {
        if cancel.is_cancelled() {
            debug!("Worker {id} observed cancellation");
            break;
        }

        let next = {
            let mut hosts = hosts.lock().await;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                host = hosts.recv() => host,
            }
        };
        let Some(host) = next else {
            break;
        };

        let result = prober.probe(&host).await;
        probed += 1;

        if results.send(result).await.is_err() {
            debug!("Result consumer gone, worker {id} stopping");
            break;
        }
    }
    probed
}
