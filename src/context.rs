// Copyright (c) 2025 The mongo-operator Authors
// SPDX-License-Identifier: MIT

//! Shared context for the cluster controller.
//!
//! Every reconciliation receives an `Arc<Context>` holding the Kubernetes
//! client plus typed `Api` constructors for the object kinds the operator
//! manages.

use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim, Pod, Secret, Service};
use k8s_openapi::api::policy::v1::PodDisruptionBudget;
use kube::{Api, Client};

use crate::crd::MongoDBCluster;

/// Shared context passed to the controller.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client for API operations
    pub client: Client,
}

impl Context {
    /// Create a new context from a connected client.
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Typed API for `MongoDBCluster` resources in a namespace.
    #[must_use]
    pub fn clusters(&self, namespace: &str) -> Api<MongoDBCluster> {
        Api::namespaced(self.client.clone(), namespace)
    }

    /// Typed API for StatefulSets in a namespace.
    #[must_use]
    pub fn statefulsets(&self, namespace: &str) -> Api<StatefulSet> {
        Api::namespaced(self.client.clone(), namespace)
    }

    /// Typed API for Services in a namespace.
    #[must_use]
    pub fn services(&self, namespace: &str) -> Api<Service> {
        Api::namespaced(self.client.clone(), namespace)
    }

    /// Typed API for Secrets in a namespace.
    #[must_use]
    pub fn secrets(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }

    /// Typed API for ConfigMaps in a namespace.
    #[must_use]
    pub fn config_maps(&self, namespace: &str) -> Api<ConfigMap> {
        Api::namespaced(self.client.clone(), namespace)
    }

    /// Typed API for Pods in a namespace.
    #[must_use]
    pub fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    /// Typed API for PersistentVolumeClaims in a namespace.
    #[must_use]
    pub fn pvcs(&self, namespace: &str) -> Api<PersistentVolumeClaim> {
        Api::namespaced(self.client.clone(), namespace)
    }

    /// Typed API for PodDisruptionBudgets in a namespace.
    #[must_use]
    pub fn pdbs(&self, namespace: &str) -> Api<PodDisruptionBudget> {
        Api::namespaced(self.client.clone(), namespace)
    }
}
