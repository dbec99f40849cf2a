// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Consumer side of the streaming verification task.
//!
//! The producer (a [`MeshClient`](crate::client::MeshClient) implementation)
//! emits findings for as long as the scan runs. This consumer forwards each
//! finding to the sink in production order, reclassified by its declared
//! severity: error and warning findings get an envelope derived from their
//! details text, everything else passes through as info. The consumer stops
//! when the feed closes or its cancellation token fires; it never reorders
//! records and never terminates the producer - on cancellation the dropped
//! receiver closes the channel and a well-behaved producer winds down on its
//! next send.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::client::VerificationFinding;
use crate::error::AdapterError;
use crate::event::{EventRecord, EventSink, EventStatus};

/// Forward findings from `feed` to `sink` until the feed closes.
///
/// `seed` carries the operation id and component tags every forwarded record
/// inherits.
pub(crate) async fn forward_findings(
    seed: &EventRecord,
    mut feed: mpsc::Receiver<VerificationFinding>,
    sink: &Arc<dyn EventSink>,
    cancel: &CancellationToken,
) {
    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!(operation_id = %seed.operation_id, "verification consumer cancelled");
                break;
            }

            finding = feed.recv() => {
                let Some(finding) = finding else { break };

                let record = match finding.severity {
                    EventStatus::Error => seed.clone().error(
                        finding.summary,
                        &AdapterError::Verification { details: finding.details },
                    ),
                    EventStatus::Warning => seed.clone().warning(
                        finding.summary,
                        &AdapterError::Verification { details: finding.details },
                    ),
                    EventStatus::Info => seed.clone().info(finding.summary, finding.details),
                };
                sink.publish(record);
            }
        }
    }

    info!(operation_id = %seed.operation_id, "verification feed done");
}
