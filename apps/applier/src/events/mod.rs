//! Progress reporting.
//!
//! Components report human-readable progress through an `EventSink` handed to
//! them at construction. The worker side pushes timestamped lines onto an
//! unbounded queue; a display task drains it on its own timer into a
//! `LogBuffer` that the control panel reads.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Latest lines kept for display.
pub const DISPLAY_WINDOW: usize = 100;
/// Lines served by the on-demand history view.
pub const HISTORY_TAIL: usize = 50;

/// Single-method progress capability.
pub trait EventSink: Send + Sync {
    fn emit(&self, line: &str);
}

/// Sends lines to `tracing` only. Used by the `ask` command and as a default.
#[derive(Debug, Clone, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, line: &str) {
        info!(target: "applier::events", "{line}");
    }
}

/// Timestamps lines and pushes them onto the display queue. Never blocks.
#[derive(Debug, Clone)]
pub struct QueueSink {
    tx: UnboundedSender<String>,
}

impl QueueSink {
    pub fn new(tx: UnboundedSender<String>) -> Self {
        Self { tx }
    }

    /// Creates a sink together with the receiving end of its queue.
    pub fn channel() -> (Self, UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl EventSink for QueueSink {
    fn emit(&self, line: &str) {
        debug!(target: "applier::events", "{line}");
        let stamped = format!("[{}] {}", chrono::Local::now().format("%H:%M:%S"), line);
        // A closed display just means nobody is watching.
        let _ = self.tx.send(stamped);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LogBuffer
// ────────────────────────────────────────────────────────────────────────────

/// Bounded display window plus unbounded history.
#[derive(Debug, Default)]
pub struct LogBuffer {
    recent: VecDeque<String>,
    history: Vec<String>,
}

pub type SharedLogBuffer = Arc<RwLock<LogBuffer>>;

impl LogBuffer {
    pub fn shared() -> SharedLogBuffer {
        Arc::new(RwLock::new(Self::default()))
    }

    pub fn push(&mut self, line: String) {
        if self.recent.len() == DISPLAY_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back(line.clone());
        self.history.push(line);
    }

    pub fn recent(&self) -> Vec<String> {
        self.recent.iter().cloned().collect()
    }

    pub fn history_tail(&self, n: usize) -> Vec<String> {
        let start = self.history.len().saturating_sub(n);
        self.history[start..].to_vec()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

/// Drains `rx` into `buffer` every `period`, optionally echoing to stdout.
///
/// Returns once every sender is dropped and the queue is empty.
pub fn spawn_display(
    mut rx: UnboundedReceiver<String>,
    buffer: SharedLogBuffer,
    period: Duration,
    echo: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;

            let mut drained = Vec::new();
            let closed = loop {
                match rx.try_recv() {
                    Ok(line) => drained.push(line),
                    Err(TryRecvError::Empty) => break false,
                    Err(TryRecvError::Disconnected) => break true,
                }
            };

            if !drained.is_empty() {
                let mut guard = buffer.write().await;
                for line in drained {
                    if echo {
                        println!("{line}");
                    }
                    guard.push(line);
                }
            }

            if closed {
                debug!("Log queue closed, display task exiting");
                break;
            }
        }
    })
}
