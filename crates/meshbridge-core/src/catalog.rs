// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The operation catalog: what this adapter can do, and how.
//!
//! Loaded once from a YAML or JSON file and injected into the dispatcher's
//! builder. Read-only for the lifetime of every request; all tasks share the
//! loaded catalog without locking.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AdapterError;

/// Descriptor property: display/service name of the operation's workload.
pub const SERVICE_NAME: &str = "service-name";
/// Descriptor property: patch file applied when exposing an addon service.
pub const SERVICE_PATCH_FILE: &str = "service-patch-file";
/// Descriptor property: patch file applied by the traffic-filter operation.
pub const FILTER_PATCH_FILE: &str = "filter-patch-file";

/// What the catalog records about one operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationDescriptor {
    /// Supported versions, oldest first. The last entry is the default.
    #[serde(default)]
    pub versions: Vec<String>,
    /// Named manifest templates the operation renders.
    #[serde(default)]
    pub templates: Vec<String>,
    /// Named additional string properties (service name, patch files, ...).
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    /// Human description, also used as the display name for test runs.
    #[serde(default)]
    pub description: String,
}

impl OperationDescriptor {
    /// Look up a named property, empty when absent.
    pub fn property(&self, key: &str) -> String {
        self.properties.get(key).cloned().unwrap_or_default()
    }
}

/// Mapping from operation name to its descriptor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperationCatalog {
    #[serde(default)]
    operations: BTreeMap<String, OperationDescriptor>,
}

impl OperationCatalog {
    /// Build a catalog directly from descriptor entries.
    pub fn new(operations: BTreeMap<String, OperationDescriptor>) -> Self {
        Self { operations }
    }

    /// Load a catalog file. `.yaml`/`.yml` parse as YAML, anything else as
    /// JSON, since operators hand both around.
    pub fn from_path(path: &Path) -> Result<Self, AdapterError> {
        let load_err = |reason: String| AdapterError::CatalogLoad {
            path: path.display().to_string(),
            reason,
        };

        let raw = std::fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&raw),
            _ => Self::from_json(&raw),
        }
        .map_err(|e| load_err(e.to_string()))
    }

    /// Parse a catalog from YAML text.
    pub fn from_yaml(raw: &str) -> Result<Self, AdapterError> {
        serde_yaml_ng::from_str(raw).map_err(AdapterError::unclassified)
    }

    /// Parse a catalog from JSON text.
    pub fn from_json(raw: &str) -> Result<Self, AdapterError> {
        serde_json::from_str(raw).map_err(AdapterError::unclassified)
    }

    /// Look up an operation's descriptor.
    ///
    /// An absent name is always an error, never a silent no-op.
    pub fn get(&self, name: &str) -> Result<&OperationDescriptor, AdapterError> {
        self.operations
            .get(name)
            .ok_or_else(|| AdapterError::OperationNotFound {
                name: name.to_string(),
            })
    }

    /// Resolve the effective version for a version-bearing operation.
    ///
    /// The caller-requested version wins when the descriptor supports it;
    /// otherwise the last entry of the supported list is the default. An
    /// empty list is an error.
    pub fn resolve_version(
        &self,
        name: &str,
        requested: Option<&str>,
    ) -> Result<String, AdapterError> {
        let descriptor = self.get(name)?;
        let latest = descriptor
            .versions
            .last()
            .ok_or_else(|| AdapterError::NoVersionsAvailable {
                name: name.to_string(),
            })?;

        match requested {
            Some(v) if !v.is_empty() && descriptor.versions.iter().any(|s| s == v) => {
                Ok(v.to_string())
            }
            _ => Ok(latest.clone()),
        }
    }

    /// Number of catalogued operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// True when the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
