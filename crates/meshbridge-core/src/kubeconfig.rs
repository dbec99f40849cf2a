// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Kubeconfig ingestion and credential merging.
//!
//! A request may carry several raw kubeconfig payloads. Each is parsed
//! independently and merged into one [`CredentialSet`]: later payloads
//! overwrite the scalar fields, the four collections accumulate in input
//! order. A payload that fails to parse contributes an error and nothing
//! else - one bad kubeconfig among several must not block an operation that
//! only needs one valid cluster context, and successful merges are never
//! rolled back.

use serde::Deserialize;
use serde_yaml_ng::Mapping;

use crate::error::AdapterError;

/// A parsed kubeconfig payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Kubeconfig {
    /// Object kind, `Config` for well-formed input.
    #[serde(default)]
    pub kind: String,
    /// Kubeconfig API version.
    #[serde(rename = "apiVersion", default)]
    pub api_version: String,
    /// Name of the context the payload selects.
    #[serde(rename = "current-context", default)]
    pub current_context: String,
    /// Client preferences, shape left to the client.
    #[serde(default)]
    pub preferences: Mapping,
    /// Named cluster endpoints.
    #[serde(default)]
    pub clusters: Vec<NamedCluster>,
    /// Named user credentials.
    #[serde(default)]
    pub users: Vec<NamedUser>,
    /// Named cluster/user pairings.
    #[serde(default)]
    pub contexts: Vec<NamedContext>,
}

/// A named cluster entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NamedCluster {
    /// Entry name referenced by contexts.
    #[serde(default)]
    pub name: String,
    /// Endpoint description.
    #[serde(default)]
    pub cluster: ClusterInfo,
}

/// Endpoint description of a [`NamedCluster`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClusterInfo {
    /// API server URL.
    #[serde(default)]
    pub server: String,
    /// Base64-encoded CA bundle, when inline.
    #[serde(rename = "certificate-authority-data", default)]
    pub certificate_authority_data: Option<String>,
    /// Whether TLS verification is disabled for this cluster.
    #[serde(rename = "insecure-skip-tls-verify", default)]
    pub insecure_skip_tls_verify: bool,
}

/// A named user entry. Auth shapes vary too much to type; the payload is
/// kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NamedUser {
    /// Entry name referenced by contexts.
    #[serde(default)]
    pub name: String,
    /// Raw credential mapping.
    #[serde(default)]
    pub user: Mapping,
}

/// A named context entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NamedContext {
    /// Entry name, matched against `current-context`.
    #[serde(default)]
    pub name: String,
    /// The cluster/user pairing.
    #[serde(default)]
    pub context: ContextInfo,
}

/// Pairing inside a [`NamedContext`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ContextInfo {
    /// Referenced cluster entry name.
    #[serde(default)]
    pub cluster: String,
    /// Referenced user entry name.
    #[serde(default)]
    pub user: String,
    /// Default namespace for the context.
    #[serde(default)]
    pub namespace: Option<String>,
}

/// Normalized cluster-access data merged from one or more payloads.
///
/// Exclusively owned by the request's task tree; never shared across
/// requests.
#[derive(Debug, Clone, Default)]
pub struct CredentialSet {
    /// Object kind from the most recent payload.
    pub kind: String,
    /// API version from the most recent payload.
    pub api_version: String,
    /// Selected context name from the most recent payload.
    pub current_context: String,
    /// Accumulated client preferences.
    pub preferences: Mapping,
    /// Accumulated cluster entries, in input order.
    pub clusters: Vec<NamedCluster>,
    /// Accumulated user entries, in input order.
    pub users: Vec<NamedUser>,
    /// Accumulated context entries, in input order.
    pub contexts: Vec<NamedContext>,
}

impl CredentialSet {
    /// Parse and merge an ordered sequence of raw kubeconfig payloads.
    ///
    /// Returns the merged set together with one error per payload that
    /// failed to parse. The set reflects the union, in input order, of every
    /// payload that parsed; failures are recorded and skipped.
    pub fn ingest(payloads: &[String]) -> (Self, Vec<AdapterError>) {
        let mut set = Self::default();
        let mut failures = Vec::new();

        for (index, raw) in payloads.iter().enumerate() {
            match serde_yaml_ng::from_str::<Kubeconfig>(raw) {
                Ok(config) => set.merge(config),
                Err(err) => failures.push(AdapterError::KubeconfigParse {
                    index,
                    reason: err.to_string(),
                }),
            }
        }

        (set, failures)
    }

    /// Merge one parsed payload: scalars overwrite, collections accumulate.
    pub fn merge(&mut self, config: Kubeconfig) {
        self.kind = config.kind;
        self.api_version = config.api_version;
        self.current_context = config.current_context;
        self.preferences.extend(config.preferences);
        self.clusters.extend(config.clusters);
        self.users.extend(config.users);
        self.contexts.extend(config.contexts);
    }

    /// Resolve the context entry selected by `current-context`, if any.
    pub fn selected_context(&self) -> Option<&NamedContext> {
        self.contexts.iter().find(|c| c.name == self.current_context)
    }
}
