// Copyright (c) 2025 The mongo-operator Authors
// SPDX-License-Identifier: MIT

//! # mongo-operator - MongoDB Replica Set Operator for Kubernetes
//!
//! A Kubernetes operator written in Rust that manages MongoDB replica set
//! clusters through a Custom Resource Definition.
//!
//! ## Overview
//!
//! This library provides the core functionality for the operator, including:
//!
//! - The `MongoDBCluster` Custom Resource Definition
//! - Reconciliation logic driving StatefulSets, Services, Secrets and
//!   PodDisruptionBudgets
//! - Replica set administration over the MongoDB wire protocol
//! - Online volume expansion for cluster storage
//!
//! ## Modules
//!
//! - [`crd`] - Custom Resource Definition types
//! - [`reconcilers`] - Reconciliation logic and phase transitions
//! - [`context`] - Shared context wrapping the Kubernetes client
//! - [`resources`] - Builders for owned Kubernetes workload objects
//! - [`mongo`] - Replica set administration over the MongoDB driver
//! - [`expansion`] - Persistent volume expansion orchestration
//! - [`secrets`] - Credential generation and secret access
//! - [`tls`] - TLS input validation and operator-managed TLS secrets

pub mod constants;
pub mod context;
pub mod crd;
pub mod errors;
pub mod expansion;
pub mod mongo;
pub mod reconcilers;
pub mod resources;
pub mod secrets;
pub mod tls;
