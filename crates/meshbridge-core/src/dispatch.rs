// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! The operation dispatcher.
//!
//! [`Dispatcher::dispatch`] routes an inbound request to its handler and
//! launches the handler as an independent concurrent task; the call returns
//! as soon as the task is spawned. Only dispatch-time failures (malformed
//! kubeconfigs, an unresolvable catalog entry, a missing version list) are
//! returned synchronously - everything a handler does, success or failure,
//! reaches the caller through the event sink, never through this return
//! value.
//!
//! Handlers end in exactly one terminal event record, except the streaming
//! verification task, which forwards a record per finding until its feed
//! closes.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::catalog::{
    FILTER_PATCH_FILE, OperationCatalog, OperationDescriptor, SERVICE_NAME, SERVICE_PATCH_FILE,
};
use crate::client::{ConformanceOptions, MeshClient};
use crate::config::Config;
use crate::error::AdapterError;
use crate::event::{EventRecord, EventSink};
use crate::kubeconfig::CredentialSet;
use crate::operation::{Operation, OperationRequest};
use crate::registry::TaskRegistry;
use crate::verify;

/// Builder for creating a [`Dispatcher`].
#[derive(Default)]
pub struct DispatcherBuilder {
    catalog: Option<Arc<OperationCatalog>>,
    client: Option<Arc<dyn MeshClient>>,
    sink: Option<Arc<dyn EventSink>>,
    component: Option<String>,
    component_name: Option<String>,
}

impl std::fmt::Debug for DispatcherBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatcherBuilder")
            .field("catalog", &self.catalog.as_ref().map(|c| c.len()))
            .field("client", &self.client.as_ref().map(|_| "..."))
            .field("sink", &self.sink.as_ref().map(|_| "..."))
            .field("component", &self.component)
            .field("component_name", &self.component_name)
            .finish()
    }
}

impl DispatcherBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the builder from loaded configuration: reads the catalog file
    /// and takes the component tags.
    pub fn from_config(config: &Config) -> Result<Self, AdapterError> {
        let catalog = OperationCatalog::from_path(&config.catalog_path)?;
        Ok(Self::new()
            .catalog(Arc::new(catalog))
            .component(&config.component)
            .component_name(&config.component_name))
    }

    /// Set the operation catalog (required).
    pub fn catalog(mut self, catalog: Arc<OperationCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Set the cluster-mutation collaborator (required).
    pub fn client(mut self, client: Arc<dyn MeshClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the outbound event sink (required).
    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Set the component tag stamped onto event records.
    ///
    /// Default: `istio`
    pub fn component(mut self, component: &str) -> Self {
        self.component = Some(component.to_string());
        self
    }

    /// Set the component instance name stamped onto event records.
    ///
    /// Default: `meshbridge-istio`
    pub fn component_name(mut self, component_name: &str) -> Self {
        self.component_name = Some(component_name.to_string());
        self
    }

    /// Build the dispatcher.
    ///
    /// Returns an error if required fields are missing.
    pub fn build(self) -> anyhow::Result<Dispatcher> {
        let catalog = self
            .catalog
            .ok_or_else(|| anyhow::anyhow!("catalog is required"))?;
        let client = self
            .client
            .ok_or_else(|| anyhow::anyhow!("client is required"))?;
        let sink = self.sink.ok_or_else(|| anyhow::anyhow!("sink is required"))?;

        Ok(Dispatcher {
            catalog,
            client,
            sink,
            tasks: TaskRegistry::new(),
            component: self.component.unwrap_or_else(|| "istio".to_string()),
            component_name: self
                .component_name
                .unwrap_or_else(|| "meshbridge-istio".to_string()),
        })
    }
}

/// Routes operation requests to handlers running as concurrent tasks.
///
/// Shares nothing mutable between tasks beyond the read-only catalog and the
/// sink; the credential set built for a request is owned by that request's
/// task alone.
pub struct Dispatcher {
    pub(crate) catalog: Arc<OperationCatalog>,
    pub(crate) client: Arc<dyn MeshClient>,
    pub(crate) sink: Arc<dyn EventSink>,
    pub(crate) tasks: TaskRegistry,
    pub(crate) component: String,
    pub(crate) component_name: String,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("component", &self.component)
            .field("component_name", &self.component_name)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a new builder for configuring the dispatcher.
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// The registry of in-flight operation tasks.
    pub fn tasks(&self) -> &TaskRegistry {
        &self.tasks
    }

    /// Dispatch one operation request.
    ///
    /// Returns as soon as the handler task is launched. A returned error is
    /// always a dispatch-time failure; handler outcomes arrive on the sink.
    #[instrument(skip(self, request), fields(operation = %request.operation, operation_id = %request.operation_id))]
    pub async fn dispatch(&self, request: OperationRequest) -> Result<(), AdapterError> {
        // 1. Normalize credentials; an aggregated parse failure is
        //    synchronous and no task is launched.
        let (credentials, failures) = CredentialSet::ingest(&request.kubeconfigs);
        if let Some(err) = AdapterError::aggregate(failures) {
            return Err(err);
        }

        let seed = EventRecord::pending(&request.operation_id, &self.component, &self.component_name);

        // 2. Resolve the operation name into the closed set. Unknown names
        //    produce one terminal error record, pushed synchronously.
        let Some(operation) = Operation::parse(&request.operation) else {
            warn!("unrecognized operation name");
            let err = AdapterError::InvalidOperation {
                name: request.operation.clone(),
            };
            self.sink.publish(seed.error(
                format!("{} is an invalid operation", request.operation),
                &err,
            ));
            return Ok(());
        };

        // 3. Catalog lookup; an absent descriptor is a dispatch-time error.
        let descriptor = self.catalog.get(&request.operation)?.clone();

        // 4. Effective version: requested-if-supported, else the last entry.
        let version = if operation.is_version_bearing() {
            Some(
                self.catalog
                    .resolve_version(&request.operation, request.version.as_deref())?,
            )
        } else {
            None
        };

        // 5. Launch the handler; the dispatcher does not wait for it.
        let task = HandlerTask {
            operation,
            descriptor,
            version,
            request,
            credentials,
            client: Arc::clone(&self.client),
            sink: Arc::clone(&self.sink),
            seed,
        };
        let operation_id = task.request.operation_id.clone();
        self.tasks
            .spawn(&operation_id, move |cancel| task.run(cancel));

        info!("operation task launched");
        Ok(())
    }
}

/// Everything one handler task owns.
struct HandlerTask {
    operation: Operation,
    descriptor: OperationDescriptor,
    version: Option<String>,
    request: OperationRequest,
    credentials: CredentialSet,
    client: Arc<dyn MeshClient>,
    sink: Arc<dyn EventSink>,
    seed: EventRecord,
}

impl HandlerTask {
    async fn run(self, cancel: CancellationToken) {
        let HandlerTask {
            operation,
            descriptor,
            version,
            request,
            credentials,
            client,
            sink,
            seed,
        } = self;
        let namespace = &request.namespace;
        let delete = request.delete;

        match operation {
            Operation::InstallMesh => {
                // Guaranteed by dispatch-time version resolution.
                let version = version.unwrap_or_default();
                let doing = if delete { "removing" } else { "installing" };
                match client
                    .apply_control_plane(&version, namespace, delete, &credentials)
                    .await
                {
                    Ok(done) => sink.publish(seed.info(
                        format!("Mesh {version} {done} successfully"),
                        format!("The service mesh control plane {version} is now {done}."),
                    )),
                    Err(err) => sink.publish(
                        seed.error(format!("Error while {doing} mesh {version}"), &err),
                    ),
                }
            }

            Operation::SampleApp(_) => {
                let app = descriptor.property(SERVICE_NAME);
                let doing = if delete { "removing" } else { "deploying" };
                match client
                    .apply_sample_app(namespace, delete, &descriptor.templates, &credentials)
                    .await
                {
                    Ok(done) => sink.publish(seed.info(
                        format!("{app} application {done} successfully"),
                        format!("The {app} application is now {done}."),
                    )),
                    Err(err) => sink.publish(
                        seed.error(format!("Error while {doing} {app} application"), &err),
                    ),
                }
            }

            Operation::Conformance => {
                let name = descriptor.description.clone();
                let options = ConformanceOptions {
                    operation_id: request.operation_id.clone(),
                    namespace: namespace.clone(),
                    manifest: descriptor.templates.first().cloned().unwrap_or_default(),
                    labels: [("istio-injection".to_string(), "enabled".to_string())]
                        .into_iter()
                        .collect(),
                    annotations: Default::default(),
                };
                match client.run_conformance_test(options, &credentials).await {
                    Ok(report) => sink.publish(seed.info(
                        format!("{name} test completed successfully"),
                        report.details,
                    )),
                    Err(err) => sink
                        .publish(seed.error(format!("Error while running {name} test"), &err)),
                }
            }

            Operation::Policy(_) => {
                let doing = if delete { "removing" } else { "deploying" };
                match client
                    .apply_policy(namespace, delete, &descriptor.templates, &credentials)
                    .await
                {
                    Ok(_) => sink.publish(seed.info("Policy deployed successfully", "")),
                    Err(err) => {
                        sink.publish(seed.error(format!("Error while {doing} policy"), &err))
                    }
                }
            }

            Operation::CustomManifest => {
                let doing = if delete { "removing" } else { "deploying" };
                match client
                    .apply_custom_manifest(namespace, &request.custom_body, delete, &credentials)
                    .await
                {
                    Ok(_) => sink.publish(seed.info("Manifest deployed successfully", "")),
                    Err(err) => {
                        sink.publish(seed.error(format!("Error while {doing} manifest"), &err))
                    }
                }
            }

            Operation::LabelNamespace => {
                let state = if delete { "removed" } else { "enabled" };
                match client.label_namespace(namespace, delete, &credentials).await {
                    Ok(()) => sink.publish(seed.info(
                        format!("Label updated on {namespace} namespace"),
                        format!("Sidecar injection label {state} on {namespace} namespace"),
                    )),
                    Err(err) => sink
                        .publish(seed.error(format!("Error while labeling {namespace}"), &err)),
                }
            }

            Operation::Addon(_) => {
                let service = descriptor.property(SERVICE_NAME);
                let patches = vec![descriptor.property(SERVICE_PATCH_FILE)];
                let verb = if delete { "uninstall" } else { "install" };
                match client
                    .apply_addon(
                        namespace,
                        delete,
                        &service,
                        &patches,
                        &descriptor.templates,
                        &credentials,
                    )
                    .await
                {
                    Ok(_) => sink.publish(seed.info(
                        format!("Successfully {verb}ed {}", request.operation),
                        format!(
                            "Successfully {verb}ed {} in the {namespace} namespace",
                            request.operation
                        ),
                    )),
                    Err(err) => sink.publish(seed.error(
                        format!("Error while {verb}ing {}", request.operation),
                        &err,
                    )),
                }
            }

            Operation::FilterPatch => {
                let app = descriptor.property(SERVICE_NAME);
                let patch_file = descriptor.property(FILTER_PATCH_FILE);
                match client
                    .apply_filter_patch(
                        namespace,
                        delete,
                        &app,
                        &descriptor.templates,
                        &patch_file,
                        &credentials,
                    )
                    .await
                {
                    Ok(done) => sink.publish(seed.info(
                        format!("{app} application {done} successfully"),
                        format!("The {app} application is now {done}."),
                    )),
                    Err(err) => sink.publish(
                        seed.error(format!("Error while patching {app} application"), &err),
                    ),
                }
            }

            Operation::Verify => {
                let feed = client.run_verification(&credentials).await;
                verify::forward_findings(&seed, feed, &sink, &cancel).await;
            }
        }
    }
}
