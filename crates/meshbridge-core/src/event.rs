// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Event records and the sink they are published to.
//!
//! An [`EventRecord`] is the unit of caller-visible status: one terminal
//! record per dispatched operation, or a sequence of records for the
//! streaming verification task. Records are created with placeholder text at
//! dispatch time and finalized exactly once by the handler that owns them.
//!
//! The [`EventSink`] trait is the outbound boundary. It must tolerate
//! concurrent publishes from simultaneously running operation tasks;
//! per-operation ordering is preserved because each operation owns exactly
//! one task.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::{AdapterError, Classify};

/// Status classification of an event record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Progress or success information.
    Info,
    /// A non-fatal issue worth the caller's attention.
    Warning,
    /// A failure, carrying an error envelope.
    Error,
}

impl EventStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// A unit of status streamed back to the caller.
///
/// Mutable only during construction; once published to the sink it is
/// treated as a value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Correlation token copied from the originating request.
    pub operation_id: String,
    /// Status classification.
    pub status: EventStatus,
    /// Short human-readable summary.
    pub summary: String,
    /// Long human-readable details or raw error text.
    pub details: String,
    /// Originating component tag, e.g. the mesh type this adapter manages.
    pub component: String,
    /// Originating component instance name.
    pub component_name: String,
    /// Machine-readable error code, set when status is not `Info`.
    pub error_code: Option<String>,
    /// Probable cause, set when status is not `Info`.
    pub probable_cause: Option<String>,
    /// Suggested remediation, set when status is not `Info`.
    pub suggested_remediation: Option<String>,
    /// When the record was finalized.
    pub emitted_at: DateTime<Utc>,
}

impl EventRecord {
    /// Seed a record for a freshly dispatched operation.
    ///
    /// Carries the placeholder summary until a handler finalizes it.
    pub fn pending(operation_id: &str, component: &str, component_name: &str) -> Self {
        Self {
            operation_id: operation_id.to_string(),
            status: EventStatus::Info,
            summary: "Deploying".to_string(),
            details: "Operation is not supported".to_string(),
            component: component.to_string(),
            component_name: component_name.to_string(),
            error_code: None,
            probable_cause: None,
            suggested_remediation: None,
            emitted_at: Utc::now(),
        }
    }

    /// Finalize as an informational record.
    pub fn info(mut self, summary: impl Into<String>, details: impl Into<String>) -> Self {
        self.status = EventStatus::Info;
        self.summary = summary.into();
        self.details = details.into();
        self.emitted_at = Utc::now();
        self
    }

    /// Finalize as a warning, attaching the failure's envelope.
    pub fn warning(self, summary: impl Into<String>, err: &AdapterError) -> Self {
        self.enriched(EventStatus::Warning, summary.into(), err)
    }

    /// Finalize as an error, attaching the failure's envelope.
    ///
    /// Details carry the raw failure message; the envelope's code, cause and
    /// remediation are copied onto the record.
    pub fn error(self, summary: impl Into<String>, err: &AdapterError) -> Self {
        self.enriched(EventStatus::Error, summary.into(), err)
    }

    fn enriched(mut self, status: EventStatus, summary: String, err: &AdapterError) -> Self {
        let envelope = err.envelope();
        self.status = status;
        self.summary = summary;
        self.details = err.to_string();
        self.error_code = Some(envelope.code);
        self.probable_cause = Some(envelope.cause);
        self.suggested_remediation = Some(envelope.remediation);
        self.emitted_at = Utc::now();
        self
    }
}

/// Outbound sink for event records.
///
/// Append-only from the engine's perspective. Implementations must accept
/// publishes from multiple concurrently running tasks.
pub trait EventSink: Send + Sync {
    /// Publish one record. Failures to deliver are the sink's concern;
    /// handlers never block on the caller reading the stream.
    fn publish(&self, record: EventRecord);
}

/// Sink backed by an unbounded channel, for wiring the engine to a transport.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<EventRecord>,
}

impl ChannelSink {
    /// Create the sink and the receiving half the transport drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<EventRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn publish(&self, record: EventRecord) {
        // A closed receiver means the caller abandoned the stream; records
        // are dropped, not errored, per the append-only contract.
        let _ = self.tx.send(record);
    }
}

/// Sink that collects records in memory, for tests and embedding.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<EventRecord>>,
}

impl MemorySink {
    /// Create an empty collecting sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record published so far, in publish order.
    pub fn records(&self) -> Vec<EventRecord> {
        self.records.lock().expect("sink lock poisoned").clone()
    }

    /// Number of records published so far.
    pub fn len(&self) -> usize {
        self.records.lock().expect("sink lock poisoned").len()
    }

    /// True if nothing has been published yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MemorySink {
    fn publish(&self, record: EventRecord) {
        self.records.lock().expect("sink lock poisoned").push(record);
    }
}
