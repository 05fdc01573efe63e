// Copyright (c) 2025 The mongo-operator Authors
// SPDX-License-Identifier: MIT

//! Status writing and the phase to requeue-delay mapping.
//!
//! Every phase transition goes through [`transition`]: it patches the status
//! subresource (state, message, timestamp) and returns the controller
//! `Action` for that phase. The mapping is a single exhaustive table;
//! call sites that need a tighter retry pass an explicit delay through
//! [`transition_with_delay`].

use std::time::Duration;

use chrono::Utc;
use kube::api::{Patch, PatchParams};
use kube::runtime::controller::Action;
use serde_json::json;
use tracing::{debug, error, info};

use crate::constants::{REQUEUE_EXPANDING_SECS, REQUEUE_TRANSIENT_SECS};
use crate::context::Context;
use crate::crd::{ClusterPhase, MongoDBCluster, MongoDBClusterStatus};
use crate::errors::{Error, Result};

/// Default controller action for a phase.
///
/// Terminal phases wait for the next watch event; everything else polls.
#[must_use]
pub fn phase_action(phase: ClusterPhase) -> Action {
    match phase {
        ClusterPhase::Creating | ClusterPhase::Pending | ClusterPhase::Scaling => {
            Action::requeue(Duration::from_secs(REQUEUE_TRANSIENT_SECS))
        }
        ClusterPhase::Expanding => Action::requeue(Duration::from_secs(REQUEUE_EXPANDING_SECS)),
        ClusterPhase::Running | ClusterPhase::Failed => Action::await_change(),
    }
}

/// Whether a transition would change the persisted status.
///
/// The timestamp is deliberately left out of the comparison: refreshing it
/// alone would bump the object's resourceVersion and wake the controller
/// right back up on its own write. A `None` version leaves the stored
/// version untouched under the merge patch, so it is ignored the same way.
fn status_changed(
    current: Option<&MongoDBClusterStatus>,
    phase: ClusterPhase,
    message: &str,
    version: Option<&str>,
) -> bool {
    let Some(current) = current else {
        return true;
    };
    current.state != Some(phase)
        || current.message != message
        || version.is_some_and(|v| current.version.as_deref() != Some(v))
}

/// Write a phase transition and return the default action for the phase.
pub async fn transition(
    ctx: &Context,
    cluster: &MongoDBCluster,
    name: &str,
    namespace: &str,
    phase: ClusterPhase,
    message: &str,
) -> Result<Action> {
    write_status(ctx, cluster, name, namespace, phase, message, None).await?;
    Ok(phase_action(phase))
}

/// Write a phase transition with an explicit requeue delay.
pub async fn transition_with_delay(
    ctx: &Context,
    cluster: &MongoDBCluster,
    name: &str,
    namespace: &str,
    phase: ClusterPhase,
    message: &str,
    delay_secs: u64,
) -> Result<Action> {
    write_status(ctx, cluster, name, namespace, phase, message, None).await?;
    Ok(Action::requeue(Duration::from_secs(delay_secs)))
}

/// Write a phase transition carrying the observed replica set version.
pub async fn transition_observed(
    ctx: &Context,
    cluster: &MongoDBCluster,
    name: &str,
    namespace: &str,
    phase: ClusterPhase,
    message: &str,
    version: &str,
) -> Result<Action> {
    write_status(ctx, cluster, name, namespace, phase, message, Some(version)).await?;
    Ok(phase_action(phase))
}

/// Patch the status subresource of a cluster.
///
/// A status that already records the same state, message and version is
/// left alone, so a settled cluster issues no writes.
pub async fn write_status(
    ctx: &Context,
    cluster: &MongoDBCluster,
    name: &str,
    namespace: &str,
    phase: ClusterPhase,
    message: &str,
    version: Option<&str>,
) -> Result<()> {
    if !status_changed(cluster.status.as_ref(), phase, message, version) {
        debug!(cluster = %name, namespace, phase = %phase, "status already current");
        return Ok(());
    }

    if phase == ClusterPhase::Failed {
        error!(cluster = %name, namespace, phase = %phase, message, "cluster failed");
    } else {
        info!(cluster = %name, namespace, phase = %phase, message, "phase transition");
    }

    let status = MongoDBClusterStatus {
        state: Some(phase),
        message: message.to_string(),
        version: version.map(str::to_string),
        last_update_time: Some(Utc::now().to_rfc3339()),
    };
    ctx.clusters(namespace)
        .patch_status(
            name,
            &PatchParams::default(),
            &Patch::Merge(json!({ "status": status })),
        )
        .await
        .map_err(Error::Kube)?;
    Ok(())
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
