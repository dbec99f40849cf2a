// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Application-model descriptor types - single source of truth
//!
//! This crate defines the application-model (OAM) descriptor shapes consumed
//! by the meshbridge engine:
//! - Runtime deserialization of component and configuration JSON
//! - Type-safe access to descriptor structure for the composite orchestrator
//!
//! A deployment request carries many component descriptors and one
//! configuration descriptor. Components describe workloads and mesh objects
//! (control plane, virtual services, filters); the configuration binds traits
//! to those components. Parsing is per-descriptor: a malformed component never
//! prevents its siblings from being parsed.

#![deny(missing_docs)]

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Errors produced while parsing application-model descriptors.
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    /// A component descriptor could not be deserialized.
    #[error("failed to parse application component: {0}")]
    Component(#[source] serde_json::Error),

    /// A configuration descriptor could not be deserialized.
    #[error("failed to parse application configuration: {0}")]
    Configuration(#[source] serde_json::Error),
}

/// Common object metadata carried by every descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Object name, unique within a deployment request.
    pub name: String,
    /// Free-form annotations propagated to rendered objects.
    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

/// A single application component descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Descriptor API version, e.g. `core.oam.dev/v1alpha1`.
    #[serde(default)]
    pub api_version: String,
    /// Descriptor kind, `Component` for well-formed input.
    #[serde(default)]
    pub kind: String,
    /// Object metadata.
    #[serde(default)]
    pub metadata: Metadata,
    /// Component workload definition.
    #[serde(default)]
    pub spec: ComponentSpec,
}

/// Workload definition of a [`Component`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    /// Workload type tag, e.g. `IstioInstall` or `VirtualService`.
    #[serde(rename = "type", default)]
    pub workload_type: String,
    /// Requested workload version.
    #[serde(default)]
    pub version: String,
    /// Workload-specific settings, passed through to the renderer untouched.
    #[serde(default)]
    pub settings: serde_json::Value,
}

/// The application configuration descriptor binding traits to components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Descriptor API version.
    #[serde(default)]
    pub api_version: String,
    /// Descriptor kind, `ApplicationConfiguration` for well-formed input.
    #[serde(default)]
    pub kind: String,
    /// Object metadata.
    #[serde(default)]
    pub metadata: Metadata,
    /// Per-component trait bindings.
    #[serde(default)]
    pub spec: ConfigurationSpec,
}

/// Spec section of a [`Configuration`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationSpec {
    /// Components this configuration applies to.
    #[serde(default)]
    pub components: Vec<ConfigurationComponent>,
}

/// Trait bindings for one component inside a [`Configuration`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationComponent {
    /// Name of the component the traits attach to.
    #[serde(default)]
    pub component_name: String,
    /// Trait payloads, passed through untouched.
    #[serde(default)]
    pub traits: serde_json::Value,
}

/// Parse a raw component descriptor.
pub fn parse_component(raw: &str) -> Result<Component, DescriptorError> {
    serde_json::from_str(raw).map_err(DescriptorError::Component)
}

/// Parse a raw application configuration descriptor.
pub fn parse_configuration(raw: &str) -> Result<Configuration, DescriptorError> {
    serde_json::from_str(raw).map_err(DescriptorError::Configuration)
}
