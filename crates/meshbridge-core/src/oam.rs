// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Composite orchestration for application-model deployments.
//!
//! A deployment request carries many component descriptors and one
//! configuration descriptor. Processing is two-phase: components then
//! configuration on create, reversed on delete - teardown must release
//! configuration-level bindings before the components they reference go
//! away. The combined message keeps the "components\nconfiguration" shape
//! regardless of the execution order.
//!
//! Partial failure is deliberate at both levels: a component descriptor that
//! fails to parse is logged and skipped without touching its siblings, and a
//! component whose mutation fails is recorded in the aggregate while the
//! rest of the phase continues. Nothing already applied is rolled back.

use meshbridge_oam::{Component, Configuration};
use tracing::{error, info, instrument};

use crate::dispatch::Dispatcher;
use crate::error::AdapterError;
use crate::kubeconfig::CredentialSet;

/// One application-model deployment request.
#[derive(Debug, Clone, Default)]
pub struct ApplicationRequest {
    /// Raw component descriptors, parsed independently.
    pub components: Vec<String>,
    /// Raw configuration descriptor.
    pub configuration: String,
    /// True for teardown.
    pub delete: bool,
    /// Raw kubeconfig payloads for the target clusters.
    pub kubeconfigs: Vec<String>,
}

impl Dispatcher {
    /// Process an application-model deployment synchronously.
    ///
    /// Returns the concatenated phase messages. On failure the error's
    /// `ApplicationProcess` variant still carries the messages of whatever
    /// did run; already-applied phases are not rolled back.
    #[instrument(skip(self, request), fields(components = request.components.len(), delete = request.delete))]
    pub async fn process_application(
        &self,
        request: ApplicationRequest,
    ) -> Result<String, AdapterError> {
        let (credentials, failures) = CredentialSet::ingest(&request.kubeconfigs);
        if let Some(err) = AdapterError::aggregate(failures) {
            return Err(err);
        }

        // Malformed component descriptors are skipped, never fatal for the
        // batch.
        let mut components = Vec::new();
        for raw in &request.components {
            match meshbridge_oam::parse_component(raw) {
                Ok(component) => components.push(component),
                Err(err) => error!(error = %err, "skipping malformed application component"),
            }
        }

        let configuration = match meshbridge_oam::parse_configuration(&request.configuration) {
            Ok(configuration) => Some(configuration),
            Err(err) => {
                error!(error = %err, "application configuration did not parse");
                None
            }
        };

        if request.delete {
            // Teardown releases configuration bindings first.
            let (config_msg, config_err) = self
                .configuration_phase(configuration.as_ref(), true, &credentials)
                .await;
            if let Some(err) = config_err {
                return Err(AdapterError::ApplicationProcess {
                    message: config_msg,
                    reason: err.to_string(),
                });
            }

            let (component_msg, component_err) =
                self.component_phase(&components, true, &credentials).await;
            let combined = format!("{component_msg}\n{config_msg}");
            if let Some(err) = component_err {
                return Err(AdapterError::ApplicationProcess {
                    message: combined,
                    reason: err.to_string(),
                });
            }

            info!("application teardown processed");
            return Ok(combined);
        }

        let (component_msg, component_err) =
            self.component_phase(&components, false, &credentials).await;
        if let Some(err) = component_err {
            return Err(AdapterError::ApplicationProcess {
                message: component_msg,
                reason: err.to_string(),
            });
        }

        let (config_msg, config_err) = self
            .configuration_phase(configuration.as_ref(), false, &credentials)
            .await;
        let combined = format!("{component_msg}\n{config_msg}");
        if let Some(err) = config_err {
            return Err(AdapterError::ApplicationProcess {
                message: combined,
                reason: err.to_string(),
            });
        }

        info!("application deployment processed");
        Ok(combined)
    }

    /// Run every component through the collaborator, best effort.
    async fn component_phase(
        &self,
        components: &[Component],
        delete: bool,
        credentials: &CredentialSet,
    ) -> (String, Option<AdapterError>) {
        let mut messages = Vec::new();
        let mut failures = Vec::new();

        for component in components {
            match self.client.apply_component(component, delete, credentials).await {
                Ok(message) => messages.push(message),
                Err(err) => {
                    error!(component = %component.metadata.name, error = %err, "component processing failed");
                    failures.push(err);
                }
            }
        }

        (messages.join("\n"), AdapterError::aggregate(failures))
    }

    async fn configuration_phase(
        &self,
        configuration: Option<&Configuration>,
        delete: bool,
        credentials: &CredentialSet,
    ) -> (String, Option<AdapterError>) {
        let Some(configuration) = configuration else {
            // An unparseable configuration was already logged; there is
            // nothing to bind.
            return (String::new(), None);
        };

        match self
            .client
            .apply_configuration(configuration, delete, credentials)
            .await
        {
            Ok(message) => (message, None),
            Err(err) => (String::new(), Some(err)),
        }
    }
}
