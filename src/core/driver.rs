//! # Session Driver
//!
//! Wraps the pipeline in a dedicated tokio task so the FIFO and
//! non-reentrancy guarantees are enforced by structure instead of
//! convention: exactly one task ever touches the pipeline, and it drains a
//! bounded command channel one input at a time.
//!
//! ```text
//! SessionHandle::submit ──► bounded channel ──► driver task ──► pipeline
//!        (immediate ack)                          │
//! SessionHandle::snapshot ◄── oneshot ────────────┤
//!                                                 ▼
//!                                     outcome channel (to the UI loop)
//! ```
//!
//! `submit` never blocks: it acknowledges `Accepted`, `Queued` (busy, will
//! run in order) or `Rejected` (queue full) immediately. There is no
//! preemptive cancellation of an in-flight input.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use log::{debug, info, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::core::pipeline::{InputOutcome, InputPipeline, PipelineSnapshot};

/// Immediate acknowledgment for a submitted input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitStatus {
    /// Picked up for processing right away.
    Accepted,
    /// An input is in flight; this one is queued behind it, FIFO.
    Queued { depth: usize },
    /// The bounded queue is full; the input was dropped.
    Rejected,
}

/// Renderer/diagnostics queries answered by the driver task.
enum Query {
    Snapshot(oneshot::Sender<PipelineSnapshot>),
}

/// Cheap cloneable handle to the driver task.
#[derive(Clone)]
pub struct SessionHandle {
    input_tx: mpsc::Sender<String>,
    query_tx: mpsc::UnboundedSender<Query>,
    busy: Arc<AtomicBool>,
    queued: Arc<AtomicUsize>,
}

impl SessionHandle {
    /// Hand a raw input to the session. Never blocks; the returned status is
    /// the immediate ack, the processed [`InputOutcome`] arrives later on
    /// the outcome channel.
    pub fn submit(&self, raw: &str) -> SubmitStatus {
        let was_busy = self.busy.swap(true, Ordering::SeqCst);
        match self.input_tx.try_send(raw.to_string()) {
            Ok(()) => {
                if was_busy {
                    let depth = self.queued.fetch_add(1, Ordering::SeqCst) + 1;
                    debug!("Input {:?} queued at depth {}", raw, depth);
                    SubmitStatus::Queued { depth }
                } else {
                    SubmitStatus::Accepted
                }
            }
            Err(_) => {
                warn!("Input queue full, dropping {:?}", raw);
                if !was_busy {
                    self.busy.store(false, Ordering::SeqCst);
                }
                SubmitStatus::Rejected
            }
        }
    }

    /// Current queue depth as seen by the ack counter (advisory).
    pub fn queue_depth(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    /// Pull a read-only view of session state. The renderer draws from
    /// this instead of reaching into the pipeline. `None` once the driver
    /// task has shut down.
    pub async fn snapshot(&self) -> Option<PipelineSnapshot> {
        let (tx, rx) = oneshot::channel();
        if self.query_tx.send(Query::Snapshot(tx)).is_err() {
            return None;
        }
        rx.await.ok()
    }
}

/// Spawn the driver task that exclusively owns `pipeline`. Every processed
/// outcome is forwarded to `outcome_tx` in processing order. The task ends
/// when all handles are dropped.
pub fn spawn(
    pipeline: InputPipeline,
    queue_capacity: usize,
    outcome_tx: mpsc::UnboundedSender<InputOutcome>,
) -> (SessionHandle, JoinHandle<()>) {
    let (input_tx, input_rx) = mpsc::channel(queue_capacity.max(1));
    let (query_tx, query_rx) = mpsc::unbounded_channel();
    let busy = Arc::new(AtomicBool::new(false));
    let queued = Arc::new(AtomicUsize::new(0));

    let handle = SessionHandle {
        input_tx,
        query_tx,
        busy: busy.clone(),
        queued: queued.clone(),
    };

    let task = tokio::spawn(drive(pipeline, input_rx, query_rx, busy, queued, outcome_tx));
    (handle, task)
}

async fn drive(
    mut pipeline: InputPipeline,
    mut input_rx: mpsc::Receiver<String>,
    mut query_rx: mpsc::UnboundedReceiver<Query>,
    busy: Arc<AtomicBool>,
    queued: Arc<AtomicUsize>,
    outcome_tx: mpsc::UnboundedSender<InputOutcome>,
) {
    info!("Session driver started");
    loop {
        tokio::select! {
            // Queries are answered between inputs, never mid-pipeline.
            Some(query) = query_rx.recv() => match query {
                Query::Snapshot(reply) => {
                    let _ = reply.send(pipeline.snapshot());
                }
            },
            maybe_raw = input_rx.recv() => {
                let Some(raw) = maybe_raw else { break };
                let outcome = pipeline.process_input(&raw).await;
                forward(&outcome_tx, outcome);
                // Defensive drain: the driver is the only writer, but the
                // pipeline's own queue stays authoritative if one appears.
                while let Some(extra) = pipeline.drain_one().await {
                    forward(&outcome_tx, extra);
                }
                if queued.load(Ordering::SeqCst) > 0 {
                    queued.fetch_sub(1, Ordering::SeqCst);
                } else {
                    busy.store(false, Ordering::SeqCst);
                }
            },
            else => break,
        }
    }
    info!("Session driver stopped");
}

fn forward(tx: &mpsc::UnboundedSender<InputOutcome>, outcome: InputOutcome) {
    if tx.send(outcome).is_err() {
        warn!("Outcome receiver dropped; discarding result");
    }
}
