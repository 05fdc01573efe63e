// Copyright (c) 2025 The mongo-operator Authors
// SPDX-License-Identifier: MIT

//! Global constants for the MongoDB operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for the MongoDB CRDs
pub const API_GROUP: &str = "mongodb.operator.dev";

/// API version for the MongoDB CRDs
pub const API_VERSION: &str = "v1alpha1";

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "mongodb.operator.dev/v1alpha1";

/// Kind name for the `MongoDBCluster` resource
pub const KIND_MONGODB_CLUSTER: &str = "MongoDBCluster";

/// Field manager name used for server-side apply
pub const FIELD_MANAGER: &str = "mongo-operator";

// ============================================================================
// MongoDB Ports
// ============================================================================

/// Port mongod listens on
pub const MONGODB_PORT: i32 = 27017;

/// Port the monitoring exporter sidecar listens on
pub const MONGODB_MONITORING_PORT: i32 = 9216;

// ============================================================================
// Naming conventions
// ============================================================================
//
// These suffixes are a wire contract: the headless service name and the
// StatefulSet name together determine the stable per-replica DNS identity
// used in replica set configuration documents.

/// Suffix appended to the cluster name for all workload objects
pub const CLUSTER_SUFFIX: &str = "cluster";

/// Suffix for the operator-generated monitoring credential secret
pub const MONITORING_SECRET_SUFFIX: &str = "cluster-monitoring";

/// Suffix for the metrics service fronting the exporter sidecar
pub const METRICS_SERVICE_SUFFIX: &str = "metrics";

/// Suffix for the operator-owned CA certificate secret
pub const CA_SECRET_SUFFIX: &str = "ca-certificate";

/// Suffix for the operator-owned concatenated certificate/key secret
pub const SERVER_CERT_SECRET_SUFFIX: &str = "server-certificate-key";

// ============================================================================
// Secret key names (contract with the container images)
// ============================================================================

/// Key under which the monitoring password is stored
pub const MONITORING_PASSWORD_KEY: &str = "password";

/// Key for the CA certificate in the CA secret or config map
pub const TLS_CA_CERT_KEY: &str = "ca.crt";

/// Key for the certificate in the user-provided TLS secret
pub const TLS_CERT_KEY: &str = "tls.crt";

/// Key for the private key in the user-provided TLS secret
pub const TLS_KEY_KEY: &str = "tls.key";

/// Key for the combined PEM in the user-provided TLS secret
pub const TLS_PEM_KEY: &str = "tls.pem";

// ============================================================================
// Container wiring
// ============================================================================

/// Name of the mongod container
pub const CONTAINER_NAME_MONGO: &str = "mongo";

/// Name of the monitoring exporter sidecar container
pub const CONTAINER_NAME_EXPORTER: &str = "mongo-exporter";

/// Database user created for the exporter sidecar
pub const MONITORING_USER: &str = "monitoring";

/// Admin database every administrative command runs against
pub const ADMIN_DATABASE: &str = "admin";

/// Mount path for the data volume
pub const DATA_MOUNT_PATH: &str = "/data/db";

/// Mount path for the additional mongod configuration
pub const ADDITIONAL_CONFIG_MOUNT_PATH: &str = "/etc/mongo.d/extra";

/// Mount path for the operator CA secret
pub const TLS_CA_MOUNT_PATH: &str = "/var/lib/tls/ca/";

/// Mount path for the operator server certificate secret
pub const TLS_SERVER_MOUNT_PATH: &str = "/var/lib/tls/server/";

/// Volume name for the CA mount
pub const TLS_CA_VOLUME: &str = "tls-ca";

/// Volume name for the server certificate mount
pub const TLS_CERT_VOLUME: &str = "tls-secret";

// ============================================================================
// Timing
// ============================================================================

/// Connect timeout for administrative MongoDB connections (seconds)
pub const MONGO_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Interval between storage-expansion poll attempts (seconds)
pub const EXPANSION_POLL_INTERVAL_SECS: u64 = 2;

/// Upper bound on a single storage-expansion wait loop (seconds)
pub const EXPANSION_WAIT_LIMIT_SECS: u64 = 2 * 60 * 60;

/// Default requeue delay for transient reconciliation failures (seconds)
pub const REQUEUE_TRANSIENT_SECS: u64 = 10;

/// Requeue delay while waiting for replicas to become ready (seconds)
pub const REQUEUE_REPLICAS_SECS: u64 = 30;

/// Requeue delay while the expansion path is engaged (seconds)
pub const REQUEUE_EXPANDING_SECS: u64 = 5;

/// Requeue delay when the database is unreachable (seconds)
pub const REQUEUE_CONNECT_ERROR_SECS: u64 = 5;

/// Length of generated monitoring passwords
pub const GENERATED_PASSWORD_LEN: usize = 16;
