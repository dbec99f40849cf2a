// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for meshbridge-core.
//!
//! Provides a unified error type whose every variant classifies into an
//! [`ErrorEnvelope`] - the `{code, cause, remediation}` view that event
//! records carry to the caller. Collaborators that surface failures not
//! already in this shape wrap them via [`AdapterError::unclassified`] so no
//! failure is ever dropped or delivered raw.

use std::fmt;

/// Result type using AdapterError
pub type Result<T> = std::result::Result<T, AdapterError>;

/// The normalized view of any failure: a machine-readable code, why it
/// happened, and what the caller should try.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ErrorEnvelope {
    /// Machine-readable classification, e.g. `KUBECONFIG_PARSE_FAILED`.
    pub code: String,
    /// Probable cause of the failure.
    pub cause: String,
    /// Suggested remediation the caller can act on.
    pub remediation: String,
}

/// Anything that can derive an [`ErrorEnvelope`] from itself.
///
/// Every collaborator-facing boundary passes failures through this before
/// they reach an event record. [`AdapterError`] implements it exhaustively;
/// foreign error values get the generic fallback via
/// [`AdapterError::unclassified`].
pub trait Classify {
    /// Derive the `{code, cause, remediation}` envelope for this failure.
    fn envelope(&self) -> ErrorEnvelope;
}

/// Errors raised by the dispatch engine and its collaborators.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum AdapterError {
    /// The requested operation name is not recognized.
    #[error("{name} is an invalid operation")]
    InvalidOperation {
        /// The unrecognized operation name.
        name: String,
    },

    /// A recognized operation has no descriptor in the catalog.
    #[error("operation '{name}' is not present in the catalog")]
    OperationNotFound {
        /// The operation name missing from the catalog.
        name: String,
    },

    /// A version-bearing operation's descriptor carries no versions.
    #[error("no versions available for operation '{name}'")]
    NoVersionsAvailable {
        /// The operation whose descriptor has an empty version list.
        name: String,
    },

    /// A kubeconfig payload failed to parse.
    #[error("kubeconfig payload {index} failed to parse: {reason}")]
    KubeconfigParse {
        /// Zero-based position of the payload in the request.
        index: usize,
        /// Parser error text.
        reason: String,
    },

    /// The operation catalog file could not be loaded.
    #[error("failed to load operation catalog from '{path}': {reason}")]
    CatalogLoad {
        /// Path the catalog was read from.
        path: String,
        /// Reader or parser error text.
        reason: String,
    },

    /// Control-plane install/uninstall failed.
    #[error("control plane {version} could not be applied: {reason}")]
    ControlPlaneApply {
        /// The resolved control-plane version.
        version: String,
        /// Collaborator error text.
        reason: String,
    },

    /// A manifest-backed mutation (app, policy, addon, filter, ad-hoc) failed.
    #[error("failed to apply manifest for '{target}': {reason}")]
    ManifestApply {
        /// What the manifest was for (app name, policy, addon, ...).
        target: String,
        /// Collaborator error text.
        reason: String,
    },

    /// Namespace labeling failed.
    #[error("failed to update label on namespace '{namespace}': {reason}")]
    NamespaceLabel {
        /// The target namespace.
        namespace: String,
        /// Collaborator error text.
        reason: String,
    },

    /// A conformance test run failed.
    #[error("conformance test run failed: {reason}")]
    ConformanceRun {
        /// Collaborator error text.
        reason: String,
    },

    /// The verification scan reported an issue.
    #[error("{details}")]
    Verification {
        /// Raw details text of the reported finding.
        details: String,
    },

    /// Composite application processing failed.
    #[error("application processing failed: {reason}")]
    ApplicationProcess {
        /// Messages from the phases that did run.
        message: String,
        /// Aggregated phase error text.
        reason: String,
    },

    /// Several sub-failures rolled into one. Every constituent message is
    /// preserved, newline-separated, in input order.
    #[error("{}", join_messages(.0))]
    Aggregate(Vec<AdapterError>),

    /// A failure that carries no classification of its own.
    #[error("{message}")]
    Unclassified {
        /// Raw failure text.
        message: String,
    },
}

fn join_messages(errors: &[AdapterError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

impl AdapterError {
    /// Wrap an arbitrary failure value that is not already classifiable.
    pub fn unclassified(err: impl fmt::Display) -> Self {
        Self::Unclassified {
            message: err.to_string(),
        }
    }

    /// Roll a list of failures into one aggregate.
    ///
    /// Returns `None` for an empty list and the error itself for a single
    /// entry, so callers never see a one-element aggregate.
    pub fn aggregate(mut errors: Vec<AdapterError>) -> Option<AdapterError> {
        match errors.len() {
            0 => None,
            1 => Some(errors.remove(0)),
            _ => Some(AdapterError::Aggregate(errors)),
        }
    }

    /// Get the error code string for this error type.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidOperation { .. } => "INVALID_OPERATION",
            Self::OperationNotFound { .. } => "OPERATION_NOT_IN_CATALOG",
            Self::NoVersionsAvailable { .. } => "NO_VERSIONS_AVAILABLE",
            Self::KubeconfigParse { .. } => "KUBECONFIG_PARSE_FAILED",
            Self::CatalogLoad { .. } => "CATALOG_LOAD_FAILED",
            Self::ControlPlaneApply { .. } => "CONTROL_PLANE_APPLY_FAILED",
            Self::ManifestApply { .. } => "MANIFEST_APPLY_FAILED",
            Self::NamespaceLabel { .. } => "NAMESPACE_LABEL_FAILED",
            Self::ConformanceRun { .. } => "CONFORMANCE_RUN_FAILED",
            Self::Verification { .. } => "VERIFICATION_FINDING",
            Self::ApplicationProcess { .. } => "APPLICATION_PROCESS_FAILED",
            Self::Aggregate(..) => "AGGREGATE_FAILURE",
            Self::Unclassified { .. } => "MESHBRIDGE_UNKNOWN",
        }
    }

    /// Probable cause text for this error type.
    pub fn probable_cause(&self) -> String {
        match self {
            Self::InvalidOperation { name } => {
                format!("operation '{name}' is not one this adapter implements")
            }
            Self::OperationNotFound { name } => {
                format!("the catalog configuration has no entry for '{name}'")
            }
            Self::NoVersionsAvailable { .. } => {
                "the catalog descriptor lists no supported versions".to_string()
            }
            Self::KubeconfigParse { .. } => {
                "the kubeconfig payload is not valid YAML or has an unexpected shape".to_string()
            }
            Self::CatalogLoad { .. } => {
                "the catalog file is missing, unreadable, or malformed".to_string()
            }
            Self::ControlPlaneApply { .. }
            | Self::ManifestApply { .. }
            | Self::NamespaceLabel { .. } => {
                "the cluster rejected the mutation or was unreachable".to_string()
            }
            Self::ConformanceRun { .. } => {
                "the test harness could not run to completion in the target namespace".to_string()
            }
            Self::Verification { details } => details.clone(),
            Self::ApplicationProcess { reason, .. } => reason.clone(),
            Self::Aggregate(errors) => format!("{} sub-operations failed", errors.len()),
            Self::Unclassified { .. } => "an unclassified failure was reported".to_string(),
        }
    }

    /// Suggested remediation text for this error type.
    pub fn suggested_remediation(&self) -> String {
        match self {
            Self::InvalidOperation { .. } => {
                "check the operation name against the adapter's capabilities".to_string()
            }
            Self::OperationNotFound { .. } | Self::NoVersionsAvailable { .. } => {
                "update the operation catalog configuration and redeploy the adapter".to_string()
            }
            Self::KubeconfigParse { .. } => {
                "verify the uploaded kubeconfig is complete and valid YAML".to_string()
            }
            Self::CatalogLoad { .. } => {
                "check the catalog path and file contents".to_string()
            }
            Self::ControlPlaneApply { .. }
            | Self::ManifestApply { .. }
            | Self::NamespaceLabel { .. } => {
                "check cluster connectivity and permissions, then retry the operation".to_string()
            }
            Self::ConformanceRun { .. } => {
                "ensure the target namespace exists and sidecar injection is enabled".to_string()
            }
            Self::Verification { .. } => {
                "review the reported finding and adjust the mesh configuration".to_string()
            }
            Self::ApplicationProcess { .. } => {
                "inspect the per-component failures and reapply the deployment".to_string()
            }
            Self::Aggregate(..) => {
                "inspect each reported sub-failure; successes were not rolled back".to_string()
            }
            Self::Unclassified { .. } => {
                "inspect the raw error text and adapter logs".to_string()
            }
        }
    }
}

impl Classify for AdapterError {
    fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            code: self.error_code().to_string(),
            cause: self.probable_cause(),
            remediation: self.suggested_remediation(),
        }
    }
}
