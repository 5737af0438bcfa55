//! Fan-out of captured audit events to every configured sink.
//!
//! Sinks are called synchronously from the response path, so they must not
//! block. The on-disk log is fed through a bounded channel and written by a
//! dedicated blocking task; when that channel is full the event is dropped
//! from the log (it still reaches the in-memory ring).

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use netmon_core::AuditEvent;

use crate::ring::AuditRing;
use crate::store::AuditLog;

/// Destination for captured audit events.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent);
}

impl AuditSink for AuditRing {
    fn record(&self, event: &AuditEvent) {
        self.push(event.clone());
    }
}

/// Sending half of the background log writer.
#[derive(Debug, Clone)]
pub struct LogWriterHandle {
    tx: mpsc::Sender<AuditEvent>,
}

impl AuditSink for LogWriterHandle {
    fn record(&self, event: &AuditEvent) {
        match self.tx.try_send(event.clone()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                metrics::counter!("audit_log_dropped_total").increment(1);
                tracing::warn!(event_id = %dropped.id, "Audit log queue full, event not persisted");
            }
            Err(mpsc::error::TrySendError::Closed(dropped)) => {
                tracing::warn!(event_id = %dropped.id, "Audit log writer stopped, event not persisted");
            }
        }
    }
}

/// Start the blocking task that drains events into `log`.
///
/// The task ends once every [`LogWriterHandle`] clone has been dropped and
/// the queue is empty.
pub fn spawn_log_writer(mut log: AuditLog, capacity: usize) -> (LogWriterHandle, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<AuditEvent>(capacity.max(1));
    let handle = tokio::task::spawn_blocking(move || {
        tracing::info!(dir = %log.dir().display(), "Audit log writer started");
        while let Some(event) = rx.blocking_recv() {
            if let Err(e) = log.append(&event) {
                tracing::warn!(event_id = %event.id, error = %e, "Failed to persist audit event");
            }
        }
        tracing::info!("Audit log writer stopped");
    });
    (LogWriterHandle { tx }, handle)
}

/// Ordered set of sinks receiving every captured event.
#[derive(Clone, Default)]
pub struct AuditPipeline {
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl AuditPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Deliver one event to every sink.
    pub fn emit(&self, event: &AuditEvent) {
        tracing::debug!(
            event_id = %event.id,
            subject = %event.subject,
            action = %event.action(),
            status = event.response_status,
            "Audit event captured"
        );
        for sink in &self.sinks {
            sink.record(event);
        }
    }
}

impl std::fmt::Debug for AuditPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditPipeline")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}
