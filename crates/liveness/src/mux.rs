//! Event multiplexing over probe output streams.

use crate::types::ProbeId;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::ChildStdout;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::trace;

/// Capacity of the event channel. Probes emit roughly one line per
/// second, so the channel never fills in practice.
const EVENT_CAPACITY: usize = 1024;

/// An event observed on one probe's output stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeEvent {
    /// One complete output line.
    Line { id: ProbeId, line: String },
    /// The stream closed: the owning process has exited or is exiting.
    Eof { id: ProbeId },
}

/// Single-consumer wait over the output streams of all live probes.
///
/// Spawning a probe with this multiplexer's sender is the registration;
/// a stream unregisters itself by emitting [`ProbeEvent::Eof`] and
/// ending its reader task. One event is dispatched per wake.
pub struct EventMux {
    tx: mpsc::Sender<ProbeEvent>,
    rx: mpsc::Receiver<ProbeEvent>,
}

impl EventMux {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(EVENT_CAPACITY);
        Self { tx, rx }
    }

    /// Sender handle for registering a probe stream.
    pub fn sender(&self) -> mpsc::Sender<ProbeEvent> {
        self.tx.clone()
    }

    /// Wait for the next event, bounded by `wait`.
    ///
    /// Returns `None` on timeout so the caller can run exit detection
    /// and tick scheduling even under sustained output silence.
    pub async fn wake(&mut self, wait: Duration) -> Option<ProbeEvent> {
        match timeout(wait, self.rx.recv()).await {
            // recv cannot observe a closed channel: we hold a sender.
            Ok(event) => event,
            Err(_) => None,
        }
    }
}

impl Default for EventMux {
    fn default() -> Self {
        Self::new()
    }
}

/// Forward complete lines from a probe's stdout into the event channel,
/// then signal EOF. One task per probe stream; partial-line buffering
/// belongs to the reader.
pub(crate) fn spawn_reader(id: ProbeId, stdout: ChildStdout, tx: mpsc::Sender<ProbeEvent>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            trace!(id, line = %line, "probe output");
            if tx.send(ProbeEvent::Line { id, line }).await.is_err() {
                return;
            }
        }
        let _ = tx.send(ProbeEvent::Eof { id }).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Stdio;
    use tokio::process::Command;

    #[tokio::test]
    async fn reader_forwards_lines_then_eof() {
        let mut mux = EventMux::new();

        let mut child = Command::new("sh")
            .arg("-c")
            .arg("echo one; echo two")
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();
        let stdout = child.stdout.take().unwrap();
        spawn_reader(7, stdout, mux.sender());

        let wait = Duration::from_secs(2);
        assert_eq!(
            mux.wake(wait).await,
            Some(ProbeEvent::Line {
                id: 7,
                line: "one".to_string()
            })
        );
        assert_eq!(
            mux.wake(wait).await,
            Some(ProbeEvent::Line {
                id: 7,
                line: "two".to_string()
            })
        );
        assert_eq!(mux.wake(wait).await, Some(ProbeEvent::Eof { id: 7 }));

        let _ = child.wait().await;
    }

    #[tokio::test]
    async fn wake_times_out_when_no_stream_is_ready() {
        let mut mux = EventMux::new();
        assert_eq!(mux.wake(Duration::from_millis(20)).await, None);
    }
}
