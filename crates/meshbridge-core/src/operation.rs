// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Operation names as a closed set.
//!
//! Inbound requests carry the operation as a string; it resolves into
//! [`Operation`] exactly once, at dispatch time. Handlers match on the enum
//! exhaustively - there is no fallback branch to hide an unhandled kind.

use serde::{Deserialize, Serialize};

/// One inbound operation request, immutable for its lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRequest {
    /// Operation name, resolved against [`Operation::parse`] and the catalog.
    pub operation: String,
    /// Target namespace for the mutation.
    #[serde(default)]
    pub namespace: String,
    /// True for teardown, false for install/apply.
    #[serde(default)]
    pub delete: bool,
    /// Requested version, when the operation is version-bearing.
    #[serde(default)]
    pub version: Option<String>,
    /// Raw kubeconfig payloads for the target clusters.
    #[serde(default)]
    pub kubeconfigs: Vec<String>,
    /// Caller-supplied manifest text for the ad-hoc operation.
    #[serde(default)]
    pub custom_body: String,
    /// Caller-supplied correlation token copied onto every event record.
    pub operation_id: String,
}

/// Bundled demo workloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleApp {
    /// The canonical four-service bookstore demo.
    BookInfo,
    /// Request/response echo service.
    HttpBin,
    /// Container registry demo workload.
    ImageHub,
    /// Emoji voting demo workload.
    EmojiVoto,
}

/// Named security policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    /// Deny all traffic in the target namespace.
    DenyAll,
    /// Require mutual TLS strictly.
    StrictMtls,
    /// Permit both plaintext and mutual TLS.
    MutualMtls,
    /// Disable mutual TLS.
    DisableMtls,
}

/// Auxiliary services installable next to the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddonKind {
    /// Metrics collection.
    Prometheus,
    /// Metrics dashboards.
    Grafana,
    /// Mesh topology console.
    Kiali,
    /// Distributed tracing.
    Jaeger,
    /// Distributed tracing, zipkin flavor.
    Zipkin,
}

/// The closed set of operations this adapter implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Install or uninstall the control plane at a resolved version.
    InstallMesh,
    /// Install or uninstall a bundled demo workload.
    SampleApp(SampleApp),
    /// Run a conformance test suite against the target namespace.
    Conformance,
    /// Apply or remove a named security policy.
    Policy(PolicyKind),
    /// Apply or remove caller-supplied manifest text.
    CustomManifest,
    /// Add or remove the mesh-membership label on a namespace.
    LabelNamespace,
    /// Install or uninstall an auxiliary service, with an optional patch.
    Addon(AddonKind),
    /// Apply or remove a traffic-filter patch to a named workload.
    FilterPatch,
    /// Long-running verification scan streaming many records.
    Verify,
}

impl Operation {
    /// Resolve an operation name. Unknown names return `None`; the
    /// dispatcher turns that into a terminal "invalid operation" record.
    pub fn parse(name: &str) -> Option<Self> {
        let op = match name {
            "install-mesh" => Self::InstallMesh,
            "bookinfo-app" => Self::SampleApp(SampleApp::BookInfo),
            "httpbin-app" => Self::SampleApp(SampleApp::HttpBin),
            "imagehub-app" => Self::SampleApp(SampleApp::ImageHub),
            "emojivoto-app" => Self::SampleApp(SampleApp::EmojiVoto),
            "conformance-test" => Self::Conformance,
            "deny-all-policy" => Self::Policy(PolicyKind::DenyAll),
            "strict-mtls-policy" => Self::Policy(PolicyKind::StrictMtls),
            "mutual-mtls-policy" => Self::Policy(PolicyKind::MutualMtls),
            "disable-mtls-policy" => Self::Policy(PolicyKind::DisableMtls),
            "custom-manifest" => Self::CustomManifest,
            "label-namespace" => Self::LabelNamespace,
            "prometheus-addon" => Self::Addon(AddonKind::Prometheus),
            "grafana-addon" => Self::Addon(AddonKind::Grafana),
            "kiali-addon" => Self::Addon(AddonKind::Kiali),
            "jaeger-addon" => Self::Addon(AddonKind::Jaeger),
            "zipkin-addon" => Self::Addon(AddonKind::Zipkin),
            "envoy-filter" => Self::FilterPatch,
            "mesh-verify" => Self::Verify,
            _ => return None,
        };
        Some(op)
    }

    /// The canonical catalog name of this operation.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InstallMesh => "install-mesh",
            Self::SampleApp(SampleApp::BookInfo) => "bookinfo-app",
            Self::SampleApp(SampleApp::HttpBin) => "httpbin-app",
            Self::SampleApp(SampleApp::ImageHub) => "imagehub-app",
            Self::SampleApp(SampleApp::EmojiVoto) => "emojivoto-app",
            Self::Conformance => "conformance-test",
            Self::Policy(PolicyKind::DenyAll) => "deny-all-policy",
            Self::Policy(PolicyKind::StrictMtls) => "strict-mtls-policy",
            Self::Policy(PolicyKind::MutualMtls) => "mutual-mtls-policy",
            Self::Policy(PolicyKind::DisableMtls) => "disable-mtls-policy",
            Self::CustomManifest => "custom-manifest",
            Self::LabelNamespace => "label-namespace",
            Self::Addon(AddonKind::Prometheus) => "prometheus-addon",
            Self::Addon(AddonKind::Grafana) => "grafana-addon",
            Self::Addon(AddonKind::Kiali) => "kiali-addon",
            Self::Addon(AddonKind::Jaeger) => "jaeger-addon",
            Self::Addon(AddonKind::Zipkin) => "zipkin-addon",
            Self::FilterPatch => "envoy-filter",
            Self::Verify => "mesh-verify",
        }
    }

    /// Whether the operation requires a resolvable version.
    pub fn is_version_bearing(&self) -> bool {
        matches!(self, Self::InstallMesh)
    }
}
