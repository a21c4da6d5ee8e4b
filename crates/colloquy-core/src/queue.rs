//! Work queue between a transport front end and the workflow.
//!
//! The transport submits input text and returns immediately; a single worker
//! runs each item through the workflow and persists the result. Storage
//! failures are logged and the worker keeps going.

use std::sync::Arc;

use colloquy_store::FeedbackStore;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::domain::{ColloquyError, Result};
use crate::metrics::METRICS;
use crate::workflow::Workflow;

/// One submitted input.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub text: String,
}

/// Sending half of the queue. Clone it to submit from several places.
#[derive(Debug, Clone)]
pub struct WorkQueue {
    tx: mpsc::Sender<WorkItem>,
}

impl WorkQueue {
    /// Start the worker. The handle resolves to the number of processed items
    /// once every `WorkQueue` clone has been dropped and the queue is drained.
    pub fn spawn(
        workflow: Arc<Workflow>,
        store: Arc<dyn FeedbackStore>,
        capacity: usize,
    ) -> (Self, JoinHandle<usize>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(worker(workflow, store, rx));
        (Self { tx }, handle)
    }

    /// Enqueue `text`, waiting for room if the queue is full.
    pub async fn submit(&self, text: impl Into<String>) -> Result<()> {
        self.tx
            .send(WorkItem { text: text.into() })
            .await
            .map_err(|_| ColloquyError::QueueClosed)
    }

    /// Stop accepting work from this handle.
    pub fn shutdown(self) {
        drop(self.tx);
    }
}

async fn worker(
    workflow: Arc<Workflow>,
    store: Arc<dyn FeedbackStore>,
    mut rx: mpsc::Receiver<WorkItem>,
) -> usize {
    let mut processed = 0;
    while let Some(item) = rx.recv().await {
        let timed = workflow.run_timed(&item.text).await;
        match timed.to_record(&item.text) {
            Ok(record) => {
                let id = record.id;
                match store.save(&record).await {
                    Ok(()) => info!(id = %id, total_score = record.total_score, "feedback stored"),
                    Err(e) => warn!(id = %id, error = %e, "failed to store feedback"),
                }
            }
            Err(e) => warn!(error = %e, "failed to build feedback record"),
        }
        processed += 1;
    }
    info!(processed, "work queue drained");
    METRICS.flush();
    processed
}
