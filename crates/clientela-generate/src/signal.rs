//! Worker-to-foreground signalling: a one-way cancellation flag and a
//! bounded FIFO channel of progress events.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

use crate::model::RunSummary;

/// Cooperative cancellation flag. Clones share the flag; it only ever goes
/// from unset to set.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Messages sent from the worker, in production order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationEvent {
    Started {
        run_id: String,
        target: Option<u64>,
        destination: PathBuf,
        seed: u64,
    },
    /// Per-record count for a bounded run. Display hint only; dropped when
    /// the channel is full.
    Tick { produced: u64, target: u64 },
    /// Emitted every `progress_every` records.
    Progress { produced: u64 },
    /// Always the last event of a run.
    Finished(RunSummary),
}

impl GenerationEvent {
    /// Human-readable log line. Ticks have none.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Started {
                target,
                destination,
                seed,
                ..
            } => Some(match target {
                Some(target) => format!(
                    "generating {target} records into {} (seed {seed})",
                    destination.display()
                ),
                None => format!(
                    "generating records into {} until cancelled (seed {seed})",
                    destination.display()
                ),
            }),
            Self::Tick { .. } => None,
            Self::Progress { produced } => Some(format!("generated: {produced} ...")),
            Self::Finished(summary) => Some(summary.message()),
        }
    }
}

/// Sending half held by the worker.
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: SyncSender<GenerationEvent>,
}

impl ProgressSender {
    /// Blocking send for events the foreground must see. A dropped receiver
    /// is ignored so the run can finish on its own.
    pub fn send(&self, event: GenerationEvent) {
        let _ = self.tx.send(event);
    }

    /// Non-blocking send; the event is discarded when the channel is full.
    pub fn hint(&self, event: GenerationEvent) {
        if let Err(TrySendError::Disconnected(_)) = self.tx.try_send(event) {
            tracing::trace!("progress receiver dropped");
        }
    }
}

/// Bounded channel carrying [`GenerationEvent`]s.
pub fn progress_channel(capacity: usize) -> (ProgressSender, Receiver<GenerationEvent>) {
    let (tx, rx) = mpsc::sync_channel(capacity);
    (ProgressSender { tx }, rx)
}
