// Copyright (c) 2025 The mongo-operator Authors
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) for MongoDB cluster management.
//!
//! This module defines the Kubernetes Custom Resource Definitions used by the
//! operator to manage replicated MongoDB deployments declaratively.
//!
//! # Resource Types
//!
//! - [`MongoDBCluster`] - A replicated MongoDB deployment backed by a
//!   StatefulSet, a headless service for stable member identity, and an
//!   optional metrics service for the exporter sidecar
//!
//! # Example: Declaring a cluster
//!
//! ```rust,no_run
//! use mongo_operator::crd::{KubernetesConfig, MongoDBClusterSpec, MongoDBSecurity, SecretRef};
//!
//! let spec = MongoDBClusterSpec {
//!     cluster_size: 3,
//!     arbiter: None,
//!     kubernetes_config: KubernetesConfig {
//!         image: "mongo:7.0".to_string(),
//!         ..KubernetesConfig::default()
//!     },
//!     mongo_db_security: MongoDBSecurity {
//!         mongo_db_admin_user: "admin".to_string(),
//!         secret_ref: SecretRef {
//!             name: "my-cluster-admin".to_string(),
//!             key: "password".to_string(),
//!         },
//!         tls: None,
//!     },
//!     storage: None,
//!     mongo_db_monitoring: None,
//!     pod_disruption_budget: None,
//!     mongo_db_additional_config: None,
//! };
//! ```

use k8s_openapi::api::core::v1::{LocalObjectReference, ResourceRequirements};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Reference to a single key within a Secret in the same namespace.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretRef {
    /// Name of the secret.
    pub name: String,

    /// Key within the secret holding the value.
    pub key: String,
}

/// Container-level configuration for the mongod pods.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesConfig {
    /// Container image for mongod (e.g. "mongo:7.0").
    pub image: String,

    /// Image pull policy. Defaults to the cluster default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<String>,

    /// Image pull secrets for private registries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_pull_secrets: Option<Vec<LocalObjectReference>>,

    /// Compute resources for the mongod container.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,

    /// Node selector applied to the pod spec.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_selector: Option<BTreeMap<String, String>>,

    /// Priority class name applied to the pod spec.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority_class_name: Option<String>,
}

/// Persistent storage configuration.
///
/// When set, the StatefulSet carries a volume claim template and the data
/// directory is backed by a PersistentVolumeClaim per replica. Growing
/// `storageSize` on an existing cluster triggers the in-place expansion path.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    /// Requested volume size as a Kubernetes quantity (e.g. "20Gi").
    pub storage_size: String,

    /// Storage class for the claims. Cluster default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class_name: Option<String>,

    /// Access modes for the claims. Defaults to `["ReadWriteOnce"]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_modes: Option<Vec<String>>,
}

/// TLS configuration for member and client connections.
///
/// The CA certificate comes from either `caCertificateSecret` or
/// `caConfigMap` under the key `ca.crt`; the secret takes precedence when
/// both are set. The server certificate secret must hold either `tls.pem`
/// or the `tls.crt`/`tls.key` pair.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TlsConfig {
    /// Whether TLS is enabled for this cluster.
    #[serde(default)]
    pub enabled: bool,

    /// Allow plaintext connections alongside TLS (mongod `allowTLS`/`preferTLS`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,

    /// Secret holding the server certificate (`tls.pem` or `tls.crt` + `tls.key`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_key_secret: Option<String>,

    /// Secret holding the CA certificate under `ca.crt`. Takes precedence
    /// over `caConfigMap`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_certificate_secret: Option<String>,

    /// ConfigMap holding the CA certificate under `ca.crt`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_config_map: Option<String>,
}

/// Security configuration: admin credentials and TLS.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MongoDBSecurity {
    /// Name of the administrative database user.
    #[serde(rename = "mongoDBAdminUser")]
    pub mongo_db_admin_user: String,

    /// Reference to the secret key holding the admin password.
    pub secret_ref: SecretRef,

    /// TLS settings. Disabled when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsConfig>,
}

/// Monitoring exporter sidecar configuration.
///
/// When present, every pod gets an exporter container connected to the
/// database with the operator-generated `monitoring` user.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringConfig {
    /// Exporter container image (e.g. "percona/mongodb_exporter:0.40").
    pub image: String,

    /// Image pull policy for the exporter container.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_pull_policy: Option<String>,

    /// Compute resources for the exporter container.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,
}

/// PodDisruptionBudget configuration.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PodDisruptionConfig {
    /// Whether a PodDisruptionBudget is managed for this cluster.
    #[serde(default)]
    pub enabled: bool,

    /// Minimum number of pods that must stay available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_available: Option<i32>,

    /// Maximum number of pods that may be unavailable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_unavailable: Option<i32>,
}

/// Lifecycle phase of a [`MongoDBCluster`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ClusterPhase {
    /// Workload objects are being created; the StatefulSet is not yet reporting.
    Creating,
    /// Waiting on an external precondition (unreachable database, missing TLS input).
    Pending,
    /// Replica set membership is being reconfigured to match the declared size.
    Scaling,
    /// In-place storage expansion is in progress.
    Expanding,
    /// The replica set is initiated, healthy, and at the declared size.
    Running,
    /// A terminal error that requires a user edit to clear.
    Failed,
}

impl fmt::Display for ClusterPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClusterPhase::Creating => "Creating",
            ClusterPhase::Pending => "Pending",
            ClusterPhase::Scaling => "Scaling",
            ClusterPhase::Expanding => "Expanding",
            ClusterPhase::Running => "Running",
            ClusterPhase::Failed => "Failed",
        };
        f.write_str(s)
    }
}

/// `MongoDBCluster` declares a replicated MongoDB deployment.
///
/// The operator renders it into a StatefulSet, a headless service providing
/// stable per-member DNS identity, an optional metrics service, and the
/// secrets the deployment needs, then drives the replica set itself
/// (initiate, reconfigure, monitoring user) through the database protocol.
#[derive(Clone, Debug, CustomResource, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "mongodb.operator.dev",
    version = "v1alpha1",
    kind = "MongoDBCluster",
    namespaced,
    doc = "MongoDBCluster represents a replicated MongoDB deployment. The operator manages the workload objects and the replica set configuration inside the database."
)]
#[kube(status = "MongoDBClusterStatus")]
#[serde(rename_all = "camelCase")]
pub struct MongoDBClusterSpec {
    /// Number of replica set members.
    #[schemars(range(min = 1))]
    pub cluster_size: i32,

    /// When true, the last member joins as a non-voting arbiter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arbiter: Option<bool>,

    /// Container-level configuration for the mongod pods.
    pub kubernetes_config: KubernetesConfig,

    /// Persistent storage. Ephemeral (emptyDir) when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageConfig>,

    /// Admin credentials and TLS settings.
    #[serde(rename = "mongoDBSecurity")]
    pub mongo_db_security: MongoDBSecurity,

    /// Monitoring exporter sidecar. Disabled when unset.
    #[serde(rename = "mongoDBMonitoring", skip_serializing_if = "Option::is_none")]
    pub mongo_db_monitoring: Option<MonitoringConfig>,

    /// PodDisruptionBudget settings. Managed only when `enabled` is true.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod_disruption_budget: Option<PodDisruptionConfig>,

    /// Name of a ConfigMap with an extra mongod configuration file, mounted
    /// at `/etc/mongo.d/extra/mongo.yaml`.
    #[serde(
        rename = "mongoDBAdditionalConfig",
        skip_serializing_if = "Option::is_none"
    )]
    pub mongo_db_additional_config: Option<String>,
}

/// `MongoDBCluster` status subresource.
#[derive(Clone, Debug, Serialize, Deserialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MongoDBClusterStatus {
    /// Current lifecycle phase.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<ClusterPhase>,

    /// Human-readable detail for the current phase.
    #[serde(default)]
    pub message: String,

    /// Observed replica set configuration version, once the replica set
    /// has answered a status query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Last time the status was written (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<String>,
}

impl MongoDBCluster {
    /// Current phase, if the status has ever been written.
    pub fn phase(&self) -> Option<ClusterPhase> {
        self.status.as_ref().and_then(|s| s.state)
    }

    /// TLS configuration, present or not.
    pub fn tls(&self) -> Option<&TlsConfig> {
        self.spec.mongo_db_security.tls.as_ref()
    }
}
