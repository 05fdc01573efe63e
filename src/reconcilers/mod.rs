// Copyright (c) 2025 The mongo-operator Authors
// SPDX-License-Identifier: MIT

//! Kubernetes reconciliation controllers for MongoDB clusters.
//!
//! This module contains the reconciliation logic for the `MongoDBCluster`
//! Custom Resource. The controller watches for changes and drives the
//! observed cluster toward the declared spec.
//!
//! # Reconciliation Architecture
//!
//! The operator follows the standard Kubernetes controller pattern:
//!
//! 1. **Watch** - Monitor resource changes via Kubernetes API
//! 2. **Reconcile** - Compare desired state (CRD spec) with actual state
//! 3. **Update** - Create or patch workload resources and administer the
//!    replica set over the wire
//! 4. **Status** - Report the cluster phase back to Kubernetes
//!
//! # Modules
//!
//! - [`cluster`] - The per-resource reconciliation pass and error policy
//! - [`resources`] - Create-or-apply helpers for owned Kubernetes objects
//! - [`status`] - Phase transitions and the phase-to-requeue table

pub mod cluster;
pub mod resources;
pub mod status;

pub use cluster::{error_policy, reconcile};
