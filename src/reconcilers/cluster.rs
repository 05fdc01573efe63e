// Copyright (c) 2025 The mongo-operator Authors
// SPDX-License-Identifier: MIT

//! Reconciliation state machine for `MongoDBCluster`.
//!
//! One pass per trigger, steps in a fixed order: credentials before
//! workload, workload before database administration, database
//! administration before declaring success. Each step short-circuits the
//! pass with a phase transition and requeue on its first unmet
//! precondition; later steps are simply not reached until earlier ones
//! hold. A pass with nothing to do reproduces the same phase without
//! mutating anything.
//!
//! Phase graph: unset → `Creating` → `Running`, with `Pending` for
//! external waits (TLS inputs, unreachable database), `Scaling` while
//! membership is repaired, `Expanding` while storage is rewritten, and
//! `Failed` for malformed input that only a user edit can clear.

use std::sync::Arc;
use std::time::Duration;

use kube::runtime::controller::Action;
use tracing::{debug, info, warn};

use crate::constants::{
    REQUEUE_CONNECT_ERROR_SECS, REQUEUE_EXPANDING_SECS, REQUEUE_REPLICAS_SECS,
    REQUEUE_TRANSIENT_SECS,
};
use crate::context::Context;
use crate::crd::{ClusterPhase, MongoDBCluster};
use crate::errors::{Error, Result};
use crate::expansion::expand_storage;
use crate::mongo::{derive_members, ReplicaSetManager, ReplicaSetObservation};
use crate::reconcilers::status::{transition, transition_observed, transition_with_delay};
use crate::resources::{
    apply_pdb, apply_services, apply_statefulset, cluster_object_name, WorkloadOutcome,
};
use crate::secrets::{admin_password, ensure_monitoring_secret, monitoring_password};
use crate::tls::{self, TlsValidity};

/// Reconcile one `MongoDBCluster`.
pub async fn reconcile(cluster: Arc<MongoDBCluster>, ctx: Arc<Context>) -> Result<Action> {
    let name = cluster
        .metadata
        .name
        .as_deref()
        .ok_or_else(|| Error::MissingField {
            object: "MongoDBCluster".to_string(),
            field: "metadata.name".to_string(),
        })?;
    let namespace = cluster
        .metadata
        .namespace
        .as_deref()
        .ok_or_else(|| Error::MissingField {
            object: format!("MongoDBCluster/{name}"),
            field: "metadata.namespace".to_string(),
        })?;

    debug!(cluster = %name, namespace, phase = ?cluster.phase(), "reconciling");

    ensure_monitoring_secret(&ctx, &cluster, name, namespace).await?;

    match tls::validate(&ctx, &cluster, namespace).await {
        Ok(TlsValidity::Valid) => {}
        Ok(TlsValidity::NotReady(reason)) => {
            return transition(
                &ctx,
                &cluster,
                name,
                namespace,
                ClusterPhase::Pending,
                &format!("TLS config is not yet valid: {reason}"),
            )
            .await;
        }
        Err(e) => {
            return transition(
                &ctx,
                &cluster,
                name,
                namespace,
                ClusterPhase::Failed,
                &format!("error validating TLS config: {e}"),
            )
            .await;
        }
    }
    if let Err(e) = tls::ensure(&ctx, &cluster, name, namespace).await {
        return transition(
            &ctx,
            &cluster,
            name,
            namespace,
            ClusterPhase::Failed,
            &format!("error ensuring TLS resources: {e}"),
        )
        .await;
    }

    match apply_statefulset(&ctx, &cluster, name, namespace).await? {
        WorkloadOutcome::Converged => {}
        WorkloadOutcome::ExpansionRequired => {
            if cluster.phase() != Some(ClusterPhase::Expanding) {
                return transition_with_delay(
                    &ctx,
                    &cluster,
                    name,
                    namespace,
                    ClusterPhase::Expanding,
                    "expanding storage",
                    REQUEUE_EXPANDING_SECS,
                )
                .await;
            }
            expand_storage(&ctx, &cluster, name, namespace).await?;
        }
    }

    apply_pdb(&ctx, &cluster, name, namespace).await?;
    apply_services(&ctx, &cluster, name, namespace).await?;

    if cluster.phase().is_none() {
        return transition(
            &ctx,
            &cluster,
            name,
            namespace,
            ClusterPhase::Creating,
            "creating cluster workload",
        )
        .await;
    }

    let sts = ctx
        .statefulsets(namespace)
        .get(&cluster_object_name(name))
        .await
        .map_err(Error::Kube)?;
    let ready = sts.status.as_ref().and_then(|s| s.ready_replicas).unwrap_or(0);
    if ready != cluster.spec.cluster_size {
        debug!(
            cluster = %name,
            ready,
            declared = cluster.spec.cluster_size,
            "waiting for replicas"
        );
        return Ok(Action::requeue(Duration::from_secs(REQUEUE_REPLICAS_SECS)));
    }

    let password = admin_password(&ctx, &cluster, namespace).await?;
    let manager = ReplicaSetManager::new(
        name,
        namespace,
        &cluster.spec.mongo_db_security.mongo_db_admin_user,
        &password,
        cluster.spec.cluster_size,
    );
    let members = derive_members(
        name,
        namespace,
        cluster.spec.cluster_size,
        cluster.spec.arbiter.unwrap_or(false),
    );

    let term = match manager.observe().await? {
        ReplicaSetObservation::Uninitialized => {
            manager.initiate(&members).await?;
            return Ok(Action::requeue(Duration::from_secs(REQUEUE_TRANSIENT_SECS)));
        }
        ReplicaSetObservation::ConnectError { reason } => {
            return transition_with_delay(
                &ctx,
                &cluster,
                name,
                namespace,
                ClusterPhase::Pending,
                &format!("error connecting to mongodb: {reason}"),
                REQUEUE_CONNECT_ERROR_SECS,
            )
            .await;
        }
        ReplicaSetObservation::Reachable { member_count, term } => {
            if member_count != members.len() {
                // First pass records the intent; the reconfig happens on
                // the next pass, so a crash in between leaves the phase
                // telling the truth.
                if cluster.phase() != Some(ClusterPhase::Scaling) {
                    return transition(
                        &ctx,
                        &cluster,
                        name,
                        namespace,
                        ClusterPhase::Scaling,
                        &format!(
                            "scaling replica set from {member_count} to {} members",
                            members.len()
                        ),
                    )
                    .await;
                }
                manager.reconfigure(&members, member_count, term).await?;
                return Ok(Action::requeue(Duration::from_secs(REQUEUE_TRANSIENT_SECS)));
            }
            debug!(cluster = %name, member_count, "replica set is healthy");
            term
        }
    };

    if !manager.monitoring_user_exists().await? {
        let monitoring_pass = monitoring_password(&ctx, name, namespace).await?;
        manager.create_monitoring_user(&monitoring_pass).await?;
    }

    info!(cluster = %name, namespace, "cluster is running");
    transition_observed(
        &ctx,
        &cluster,
        name,
        namespace,
        ClusterPhase::Running,
        "done",
        &term.to_string(),
    )
    .await
}

/// Requeue policy for reconciliation errors.
///
/// Everything that reaches here is treated as transient; terminal
/// conditions were already converted into the `Failed` phase inside
/// [`reconcile`].
pub fn error_policy(cluster: Arc<MongoDBCluster>, error: &Error, _ctx: Arc<Context>) -> Action {
    warn!(
        cluster = ?cluster.metadata.name,
        namespace = ?cluster.metadata.namespace,
        %error,
        "reconciliation failed, requeueing"
    );
    Action::requeue(Duration::from_secs(REQUEUE_TRANSIENT_SECS))
}

#[cfg(test)]
#[path = "cluster_tests.rs"]
mod cluster_tests;
