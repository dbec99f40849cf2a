// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The collaborator seam: everything that actually mutates a cluster.
//!
//! The engine never talks to a cluster directly; every mutation goes through
//! [`MeshClient`]. Implementations wrap the real rendering/apply machinery
//! and must surface failures as [`AdapterError`] so every failure classifies
//! into an error envelope at this boundary.
//!
//! Mutation methods return the past-tense verb used in event summaries
//! ("installed", "removed", "deployed", "patched").

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::mpsc;

use meshbridge_oam::{Component, Configuration};

use crate::error::AdapterError;
use crate::event::EventStatus;
use crate::kubeconfig::CredentialSet;

/// Options for one conformance test run.
#[derive(Debug, Clone, Default)]
pub struct ConformanceOptions {
    /// Correlation token of the owning operation.
    pub operation_id: String,
    /// Namespace the suite runs against.
    pub namespace: String,
    /// Manifest of the test harness.
    pub manifest: String,
    /// Labels stamped onto the harness namespace.
    pub labels: BTreeMap<String, String>,
    /// Annotations stamped onto the harness namespace.
    pub annotations: BTreeMap<String, String>,
}

/// Outcome of a conformance test run that completed.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    /// Whether every check passed.
    pub passed: bool,
    /// Harness output for the caller.
    pub details: String,
}

/// One finding emitted by the long-running verification scan.
#[derive(Debug, Clone)]
pub struct VerificationFinding {
    /// Severity the producer declared for this finding.
    pub severity: EventStatus,
    /// Short description.
    pub summary: String,
    /// Raw finding text; for non-info findings the error envelope is
    /// derived from this.
    pub details: String,
}

/// Cluster-mutation collaborator consumed by the dispatch engine.
#[async_trait]
pub trait MeshClient: Send + Sync {
    /// Install (or uninstall, when `delete`) the control plane at `version`.
    async fn apply_control_plane(
        &self,
        version: &str,
        namespace: &str,
        delete: bool,
        credentials: &CredentialSet,
    ) -> Result<String, AdapterError>;

    /// Install or uninstall a bundled demo workload from its templates.
    async fn apply_sample_app(
        &self,
        namespace: &str,
        delete: bool,
        templates: &[String],
        credentials: &CredentialSet,
    ) -> Result<String, AdapterError>;

    /// Apply or remove a named security policy from its templates.
    async fn apply_policy(
        &self,
        namespace: &str,
        delete: bool,
        templates: &[String],
        credentials: &CredentialSet,
    ) -> Result<String, AdapterError>;

    /// Apply or remove caller-supplied manifest text.
    async fn apply_custom_manifest(
        &self,
        namespace: &str,
        manifest: &str,
        delete: bool,
        credentials: &CredentialSet,
    ) -> Result<String, AdapterError>;

    /// Install or uninstall an auxiliary service, patching `service` with
    /// the given patch payloads.
    async fn apply_addon(
        &self,
        namespace: &str,
        delete: bool,
        service: &str,
        patches: &[String],
        templates: &[String],
        credentials: &CredentialSet,
    ) -> Result<String, AdapterError>;

    /// Apply or remove a traffic-filter patch to the named workload.
    async fn apply_filter_patch(
        &self,
        namespace: &str,
        delete: bool,
        app: &str,
        templates: &[String],
        patch_file: &str,
        credentials: &CredentialSet,
    ) -> Result<String, AdapterError>;

    /// Add or remove the mesh-membership label on `namespace`.
    async fn label_namespace(
        &self,
        namespace: &str,
        delete: bool,
        credentials: &CredentialSet,
    ) -> Result<(), AdapterError>;

    /// Run a conformance suite to completion.
    async fn run_conformance_test(
        &self,
        options: ConformanceOptions,
        credentials: &CredentialSet,
    ) -> Result<ConformanceReport, AdapterError>;

    /// Start the verification scan and return its finding feed.
    ///
    /// The producer owns the sending half; closing it ends the feed. The
    /// engine consumes findings in production order and never signals the
    /// producer to stop.
    async fn run_verification(
        &self,
        credentials: &CredentialSet,
    ) -> mpsc::Receiver<VerificationFinding>;

    /// Process one application component.
    async fn apply_component(
        &self,
        component: &Component,
        delete: bool,
        credentials: &CredentialSet,
    ) -> Result<String, AdapterError>;

    /// Process the application configuration.
    async fn apply_configuration(
        &self,
        configuration: &Configuration,
        delete: bool,
        credentials: &CredentialSet,
    ) -> Result<String, AdapterError>;
}
