// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Shared test fixtures: a call-recording mesh client, a canned catalog,
//! and helpers for building dispatchers and waiting on async outcomes.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use meshbridge_core::catalog::{
    FILTER_PATCH_FILE, OperationCatalog, OperationDescriptor, SERVICE_NAME, SERVICE_PATCH_FILE,
};
use meshbridge_core::client::{ConformanceOptions, ConformanceReport, VerificationFinding};
use meshbridge_core::error::AdapterError;
use meshbridge_core::event::{EventStatus, MemorySink};
use meshbridge_core::kubeconfig::CredentialSet;
use meshbridge_core::operation::OperationRequest;
use meshbridge_core::{Dispatcher, MeshClient};

/// A kubeconfig payload that parses.
pub const GOOD_KUBECONFIG: &str = r#"
kind: Config
apiVersion: v1
current-context: test
clusters:
  - name: test
    cluster:
      server: https://10.0.0.1:6443
contexts:
  - name: test
    context:
      cluster: test
      user: admin
users:
  - name: admin
    user: {}
"#;

/// Mesh client that records every call in order and fails on demand.
pub struct RecordingClient {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    findings: Mutex<Vec<VerificationFinding>>,
}

impl RecordingClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
            findings: Mutex::new(Vec::new()),
        })
    }

    /// Make calls matching `key` fail. Keys are method names
    /// (`apply_control_plane`) or per-object (`apply_component:reviews`).
    pub fn fail_on(&self, key: &str) {
        self.failing.lock().unwrap().insert(key.to_string());
    }

    /// Queue the findings the verification feed will produce.
    pub fn set_findings(&self, findings: Vec<VerificationFinding>) {
        *self.findings.lock().unwrap() = findings;
    }

    /// Every recorded call, in invocation order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn fails(&self, key: &str) -> bool {
        self.failing.lock().unwrap().contains(key)
    }
}

#[async_trait]
impl MeshClient for RecordingClient {
    async fn apply_control_plane(
        &self,
        version: &str,
        namespace: &str,
        delete: bool,
        _credentials: &CredentialSet,
    ) -> Result<String, AdapterError> {
        self.record(format!("apply_control_plane {version} {namespace} delete={delete}"));
        if self.fails("apply_control_plane") {
            return Err(AdapterError::ControlPlaneApply {
                version: version.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        Ok(if delete { "removed" } else { "installed" }.to_string())
    }

    async fn apply_sample_app(
        &self,
        namespace: &str,
        delete: bool,
        templates: &[String],
        _credentials: &CredentialSet,
    ) -> Result<String, AdapterError> {
        self.record(format!(
            "apply_sample_app {namespace} delete={delete} templates={}",
            templates.len()
        ));
        if self.fails("apply_sample_app") {
            return Err(AdapterError::ManifestApply {
                target: "sample app".to_string(),
                reason: "injected failure".to_string(),
            });
        }
        Ok(if delete { "removed" } else { "deployed" }.to_string())
    }

    async fn apply_policy(
        &self,
        namespace: &str,
        delete: bool,
        _templates: &[String],
        _credentials: &CredentialSet,
    ) -> Result<String, AdapterError> {
        self.record(format!("apply_policy {namespace} delete={delete}"));
        if self.fails("apply_policy") {
            return Err(AdapterError::ManifestApply {
                target: "policy".to_string(),
                reason: "injected failure".to_string(),
            });
        }
        Ok("deployed".to_string())
    }

    async fn apply_custom_manifest(
        &self,
        namespace: &str,
        manifest: &str,
        delete: bool,
        _credentials: &CredentialSet,
    ) -> Result<String, AdapterError> {
        self.record(format!(
            "apply_custom_manifest {namespace} delete={delete} bytes={}",
            manifest.len()
        ));
        if self.fails("apply_custom_manifest") {
            return Err(AdapterError::ManifestApply {
                target: "custom manifest".to_string(),
                reason: "injected failure".to_string(),
            });
        }
        Ok("deployed".to_string())
    }

    async fn apply_addon(
        &self,
        namespace: &str,
        delete: bool,
        service: &str,
        _patches: &[String],
        _templates: &[String],
        _credentials: &CredentialSet,
    ) -> Result<String, AdapterError> {
        self.record(format!("apply_addon {service} {namespace} delete={delete}"));
        if self.fails("apply_addon") {
            return Err(AdapterError::ManifestApply {
                target: service.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        Ok(if delete { "removed" } else { "installed" }.to_string())
    }

    async fn apply_filter_patch(
        &self,
        namespace: &str,
        delete: bool,
        app: &str,
        _templates: &[String],
        patch_file: &str,
        _credentials: &CredentialSet,
    ) -> Result<String, AdapterError> {
        self.record(format!(
            "apply_filter_patch {app} {namespace} patch={patch_file} delete={delete}"
        ));
        if self.fails("apply_filter_patch") {
            return Err(AdapterError::ManifestApply {
                target: app.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        Ok("patched".to_string())
    }

    async fn label_namespace(
        &self,
        namespace: &str,
        delete: bool,
        _credentials: &CredentialSet,
    ) -> Result<(), AdapterError> {
        self.record(format!("label_namespace {namespace} delete={delete}"));
        if self.fails("label_namespace") {
            return Err(AdapterError::NamespaceLabel {
                namespace: namespace.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    async fn run_conformance_test(
        &self,
        options: ConformanceOptions,
        _credentials: &CredentialSet,
    ) -> Result<ConformanceReport, AdapterError> {
        self.record(format!("run_conformance_test {}", options.namespace));
        if self.fails("run_conformance_test") {
            return Err(AdapterError::ConformanceRun {
                reason: "injected failure".to_string(),
            });
        }
        Ok(ConformanceReport {
            passed: true,
            details: "all checks passed".to_string(),
        })
    }

    async fn run_verification(
        &self,
        _credentials: &CredentialSet,
    ) -> mpsc::Receiver<VerificationFinding> {
        self.record("run_verification".to_string());
        let findings = std::mem::take(&mut *self.findings.lock().unwrap());
        let (tx, rx) = mpsc::channel(4);
        tokio::spawn(async move {
            for finding in findings {
                if tx.send(finding).await.is_err() {
                    break;
                }
            }
            // Sender drops here; the feed closes.
        });
        rx
    }

    async fn apply_component(
        &self,
        component: &meshbridge_oam::Component,
        delete: bool,
        _credentials: &CredentialSet,
    ) -> Result<String, AdapterError> {
        let name = component.metadata.name.clone();
        self.record(format!("apply_component {name} delete={delete}"));
        if self.fails("apply_component") || self.fails(&format!("apply_component:{name}")) {
            return Err(AdapterError::ManifestApply {
                target: name,
                reason: "injected failure".to_string(),
            });
        }
        Ok(format!(
            "{} component {name}",
            if delete { "Deleted" } else { "Deployed" }
        ))
    }

    async fn apply_configuration(
        &self,
        configuration: &meshbridge_oam::Configuration,
        delete: bool,
        _credentials: &CredentialSet,
    ) -> Result<String, AdapterError> {
        let name = configuration.metadata.name.clone();
        self.record(format!("apply_configuration {name} delete={delete}"));
        if self.fails("apply_configuration") {
            return Err(AdapterError::ManifestApply {
                target: name,
                reason: "injected failure".to_string(),
            });
        }
        Ok(format!(
            "{} configuration {name}",
            if delete { "Deleted" } else { "Deployed" }
        ))
    }
}

/// Catalog covering one operation per dispatch class.
pub fn sample_catalog() -> Arc<OperationCatalog> {
    let mut operations = BTreeMap::new();

    operations.insert(
        "install-mesh".to_string(),
        OperationDescriptor {
            versions: vec!["1.1".to_string(), "1.2".to_string()],
            description: "Istio control plane".to_string(),
            ..Default::default()
        },
    );
    operations.insert(
        "bookinfo-app".to_string(),
        OperationDescriptor {
            templates: vec!["bookinfo.yaml".to_string()],
            properties: BTreeMap::from([(SERVICE_NAME.to_string(), "BookInfo".to_string())]),
            description: "BookInfo sample application".to_string(),
            ..Default::default()
        },
    );
    operations.insert(
        "conformance-test".to_string(),
        OperationDescriptor {
            templates: vec!["conformance.yaml".to_string()],
            description: "SMI conformance".to_string(),
            ..Default::default()
        },
    );
    operations.insert(
        "deny-all-policy".to_string(),
        OperationDescriptor {
            templates: vec!["deny-all.yaml".to_string()],
            ..Default::default()
        },
    );
    operations.insert(
        "custom-manifest".to_string(),
        OperationDescriptor::default(),
    );
    operations.insert(
        "label-namespace".to_string(),
        OperationDescriptor::default(),
    );
    operations.insert(
        "grafana-addon".to_string(),
        OperationDescriptor {
            templates: vec!["grafana.yaml".to_string()],
            properties: BTreeMap::from([
                (SERVICE_NAME.to_string(), "grafana".to_string()),
                (SERVICE_PATCH_FILE.to_string(), "grafana-patch.json".to_string()),
            ]),
            ..Default::default()
        },
    );
    operations.insert(
        "envoy-filter".to_string(),
        OperationDescriptor {
            templates: vec!["filter.yaml".to_string()],
            properties: BTreeMap::from([
                (SERVICE_NAME.to_string(), "productpage".to_string()),
                (FILTER_PATCH_FILE.to_string(), "filter-patch.json".to_string()),
            ]),
            ..Default::default()
        },
    );
    operations.insert("mesh-verify".to_string(), OperationDescriptor::default());

    Arc::new(OperationCatalog::new(operations))
}

/// Install the test tracing subscriber once.
pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Dispatcher wired to the recording client and a fresh memory sink.
pub fn dispatcher(client: Arc<RecordingClient>) -> (Dispatcher, Arc<MemorySink>) {
    init_tracing();
    let sink = Arc::new(MemorySink::new());
    let dispatcher = Dispatcher::builder()
        .catalog(sample_catalog())
        .client(client)
        .sink(sink.clone())
        .build()
        .expect("dispatcher should build");
    (dispatcher, sink)
}

/// A request for `operation` with a fresh operation id and no kubeconfigs.
pub fn request(operation: &str) -> OperationRequest {
    OperationRequest {
        operation: operation.to_string(),
        namespace: "demo".to_string(),
        delete: false,
        version: None,
        kubeconfigs: Vec::new(),
        custom_body: String::new(),
        operation_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// Convenience constructor for verification findings.
pub fn finding(severity: EventStatus, summary: &str, details: &str) -> VerificationFinding {
    VerificationFinding {
        severity,
        summary: summary.to_string(),
        details: details.to_string(),
    }
}

/// Poll until `done` returns true or two seconds elapse.
pub async fn wait_until(done: impl Fn() -> bool) {
    for _ in 0..200 {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within two seconds");
}
