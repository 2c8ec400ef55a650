//! Host list parsing and the host producer task.
//!
//! The host list is newline-delimited text. Lines are trimmed; blank lines and
//! lines starting with `#` are skipped. The producer hands hosts to the workers
//! through a small bounded channel, so a long host list never piles up in
//! memory ahead of the probes.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::models::Host;

/// Capacity of the host handoff channel.
const HOST_QUEUE_CAPACITY: usize = 1;

/// Lazily yields the hosts in `content`, in order.
///
/// # Examples
///
/// ```
/// let hosts: Vec<String> = cert_status::parse_hosts("a.com:443\n# b.com:443\n\n c.com:8443 ").collect();
/// assert_eq!(hosts, vec!["a.com:443", "c.com:8443"]);
/// ```
pub fn parse_hosts(content: &str) -> impl Iterator<Item = Host> + '_ {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
}

/// Receiving side of a running host producer.
///
/// The sequence is finite and can be consumed once. Dropping the source (or
/// cancelling its token) stops the producer.
pub struct HostSource {
    receiver: mpsc::Receiver<Host>,
    producer: JoinHandle<usize>,
}

impl HostSource {
    /// Starts a producer over already-loaded host list text.
    pub fn from_content(content: String, cancel: CancellationToken) -> Self {
        let (tx, receiver) = mpsc::channel(HOST_QUEUE_CAPACITY);
        let producer = tokio::spawn(async move { produce(&content, tx, cancel).await });
        Self { receiver, producer }
    }

    /// Starts a producer that reads the host list from `path` (`-` for stdin).
    ///
    /// A missing or unreadable file yields zero hosts; the failure is logged,
    /// not returned.
    pub fn from_file(path: PathBuf, cancel: CancellationToken) -> Self {
        let (tx, receiver) = mpsc::channel(HOST_QUEUE_CAPACITY);
        let producer = tokio::spawn(async move {
            match read_host_list(&path).await {
                Ok(content) => produce(&content, tx, cancel).await,
                Err(e) => {
                    warn!("Failed to read host list {}: {e}", path.display());
                    0
                }
            }
        });
        Self { receiver, producer }
    }

    /// Pulls the next host, or `None` once the producer is done.
    pub async fn recv(&mut self) -> Option<Host> {
        self.receiver.recv().await
    }

    /// Splits the source into its channel and the producer handle.
    ///
    /// The handle resolves to the number of hosts handed out.
    pub fn into_parts(self) -> (mpsc::Receiver<Host>, JoinHandle<usize>) {
        (self.receiver, self.producer)
    }
}

async fn read_host_list(path: &Path) -> std::io::Result<String> {
    let bytes = if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        tokio::io::stdin().read_to_end(&mut buf).await?;
        buf
    } else {
        tokio::fs::read(path).await?
    };
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

async fn produce(content: &str, tx: mpsc::Sender<Host>, cancel: CancellationToken) -> usize {
    let mut queued = 0;
    for host in parse_hosts(content) {
        if cancel.is_cancelled() {
            break;
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            sent = tx.send(host) => {
                // All receivers gone: nobody will probe further hosts
                if sent.is_err() {
                    break;
                }
                queued += 1;
            }
        }
    }
    debug!("Host producer finished after {queued} host(s)");
    queued
}
