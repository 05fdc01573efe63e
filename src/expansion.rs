// Copyright (c) 2025 The mongo-operator Authors
// SPDX-License-Identifier: MIT

//! In-place storage expansion.
//!
//! StatefulSet volume claim templates are immutable, so growing the storage
//! request takes a rewrite: delete the StatefulSet while orphaning its pods,
//! then per replica resize the claim and recycle the pod, and finally
//! recreate the StatefulSet with the new template. Pods keep serving during
//! the claim resize because deletion is sequenced one replica at a time.
//!
//! The whole path is guarded: it refuses to run unless the cluster phase
//! already records the expansion intent, so a stray call can never delete a
//! healthy workload. All waits are explicit bounded loops with a 2 second
//! interval and an overall limit per wait.

use std::time::Duration;

use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod};
use kube::api::{DeleteParams, ListParams, Patch, PatchParams, PostParams, PropagationPolicy};
use serde_json::json;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::constants::{EXPANSION_POLL_INTERVAL_SECS, EXPANSION_WAIT_LIMIT_SECS};
use crate::context::Context;
use crate::crd::{ClusterPhase, MongoDBCluster};
use crate::errors::{Error, Result};
use crate::resources::{build_statefulset, cluster_labels, cluster_object_name};

/// Parse a Kubernetes quantity string into a byte count.
///
/// Supports plain integers, decimal fractions, binary suffixes (Ki..Ei) and
/// decimal suffixes (k..E). Storage sizes never carry the milli suffix; it
/// is rejected.
pub fn parse_quantity(input: &str) -> Result<i128> {
    let input = input.trim();
    let split = input
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(input.len());
    let (number, suffix) = input.split_at(split);

    let multiplier: i128 = match suffix {
        "" => 1,
        "k" => 1_000,
        "M" => 1_000_000,
        "G" => 1_000_000_000,
        "T" => 1_000_000_000_000,
        "P" => 1_000_000_000_000_000,
        "E" => 1_000_000_000_000_000_000,
        "Ki" => 1 << 10,
        "Mi" => 1 << 20,
        "Gi" => 1 << 30,
        "Ti" => 1 << 40,
        "Pi" => 1 << 50,
        "Ei" => 1 << 60,
        _ => {
            return Err(Error::Other(anyhow::anyhow!(
                "unsupported quantity suffix {suffix:?} in {input:?}"
            )))
        }
    };

    let (int_part, frac_part) = match number.split_once('.') {
        Some((i, f)) => (i, f),
        None => (number, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(Error::Other(anyhow::anyhow!(
            "invalid quantity {input:?}"
        )));
    }

    let whole: i128 = if int_part.is_empty() {
        0
    } else {
        int_part
            .parse()
            .map_err(|_| Error::Other(anyhow::anyhow!("invalid quantity {input:?}")))?
    };
    let mut value = whole * multiplier;
    if !frac_part.is_empty() {
        let frac: i128 = frac_part
            .parse()
            .map_err(|_| Error::Other(anyhow::anyhow!("invalid quantity {input:?}")))?;
        let scale = 10_i128.pow(frac_part.len() as u32);
        value += frac * multiplier / scale;
    }
    Ok(value)
}

/// Whether `new` declares strictly more storage than `old`.
///
/// Equal sizes in different units (1024Mi vs 1Gi) do not count as growth.
pub fn quantity_grew(old: &str, new: &str) -> Result<bool> {
    Ok(parse_quantity(new)? > parse_quantity(old)?)
}

/// Rewrite the cluster's storage in place to the declared size.
///
/// Precondition: the cluster phase must be `Expanding`. Steps, per pass:
/// 1. delete the StatefulSet with orphan propagation (pods keep running)
/// 2. for each replica pod: delete it, grow its claim, wait for the resize,
///    recreate the pod and wait for readiness
/// 3. recreate the StatefulSet from the current spec
pub async fn expand_storage(
    ctx: &Context,
    cluster: &MongoDBCluster,
    name: &str,
    namespace: &str,
) -> Result<()> {
    if cluster.phase() != Some(ClusterPhase::Expanding) {
        return Err(Error::ExpansionGuard {
            phase: cluster.phase(),
        });
    }

    let sts_name = cluster_object_name(name);
    let sts_api = ctx.statefulsets(namespace);
    let desired = build_statefulset(cluster, name, namespace)?;
    let target_size = cluster
        .spec
        .storage
        .as_ref()
        .map(|s| s.storage_size.clone())
        .ok_or_else(|| Error::MissingField {
            object: format!("MongoDBCluster/{name}"),
            field: "spec.storage".to_string(),
        })?;

    // Orphan the pods so they keep serving while claims are resized.
    match sts_api
        .delete(
            &sts_name,
            &DeleteParams {
                propagation_policy: Some(PropagationPolicy::Orphan),
                ..Default::default()
            },
        )
        .await
    {
        Ok(_) => info!(statefulset = %sts_name, "deleted statefulset with orphaned pods"),
        // Already gone from an earlier partial pass; continue with the pods.
        Err(kube::Error::Api(ae)) if ae.code == 404 => {
            debug!(statefulset = %sts_name, "statefulset already deleted");
        }
        Err(e) => return Err(Error::Kube(e)),
    }

    let pod_api = ctx.pods(namespace);
    let selector = cluster_labels(name)
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",");
    let pods = pod_api
        .list(&ListParams::default().labels(&selector))
        .await
        .map_err(Error::Kube)?;

    for pod in pods.items {
        let pod_name = pod.metadata.name.clone().ok_or_else(|| Error::MissingField {
            object: "Pod".to_string(),
            field: "metadata.name".to_string(),
        })?;
        let pvc_name = format!("{sts_name}-{pod_name}");

        pod_api
            .delete(&pod_name, &DeleteParams::default())
            .await
            .map_err(Error::Kube)?;
        info!(pod = %pod_name, "deleted pod for claim resize");

        grow_claim(ctx, namespace, &pvc_name, &target_size).await?;
        rebuild_pod(ctx, namespace, &pod).await?;
    }

    sts_api
        .create(&PostParams::default(), &desired)
        .await
        .map_err(Error::Kube)?;
    info!(statefulset = %sts_name, "recreated statefulset after expansion");
    Ok(())
}

/// Grow one claim and wait until the resize has landed.
async fn grow_claim(ctx: &Context, namespace: &str, pvc_name: &str, size: &str) -> Result<()> {
    let api = ctx.pvcs(namespace);
    info!(pvc = %pvc_name, size = %size, "growing persistent volume claim");

    api.patch(
        pvc_name,
        &PatchParams::default(),
        &Patch::Merge(json!({
            "spec": { "resources": { "requests": { "storage": size } } }
        })),
    )
    .await
    .map_err(Error::Kube)?;

    let interval = Duration::from_secs(EXPANSION_POLL_INTERVAL_SECS);
    let mut waited = 0u64;
    loop {
        let pvc = api.get(pvc_name).await.map_err(Error::Kube)?;
        if claim_resize_done(&pvc, size)? {
            info!(pvc = %pvc_name, "claim resize complete");
            return Ok(());
        }
        if waited >= EXPANSION_WAIT_LIMIT_SECS {
            return Err(Error::WaitTimeout {
                condition: format!("resize of claim {pvc_name}"),
                waited_secs: waited,
            });
        }
        sleep(interval).await;
        waited += EXPANSION_POLL_INTERVAL_SECS;
    }
}

/// Whether the claim has finished resizing.
///
/// No conditions means the resize either has not started or is already
/// complete; the capacity disambiguates. A claim created fresh at the new
/// size (replica added mid-expansion) counts as done. A pending filesystem
/// resize completes once the pod mounts the volume, so it also counts.
fn claim_resize_done(pvc: &PersistentVolumeClaim, target: &str) -> Result<bool> {
    let status = pvc.status.as_ref();
    let conditions = status.and_then(|s| s.conditions.as_deref()).unwrap_or(&[]);
    if conditions.is_empty() {
        let capacity = status
            .and_then(|s| s.capacity.as_ref())
            .and_then(|c| c.get("storage"));
        return match capacity {
            Some(q) => Ok(parse_quantity(&q.0)? >= parse_quantity(target)?),
            None => Ok(false),
        };
    }
    Ok(conditions[0].type_ == "FileSystemResizePending")
}

/// Recreate an orphaned pod from its saved definition and wait for readiness.
async fn rebuild_pod(ctx: &Context, namespace: &str, saved: &Pod) -> Result<()> {
    let api = ctx.pods(namespace);
    let pod_name = saved.metadata.name.clone().unwrap_or_default();

    let mut pod = saved.clone();
    pod.metadata.annotations = None;
    pod.metadata.resource_version = None;
    pod.metadata.uid = None;
    pod.metadata.deletion_timestamp = None;
    pod.metadata.owner_references = None;
    pod.metadata.managed_fields = None;
    pod.metadata.creation_timestamp = None;
    pod.status = None;

    api.create(&PostParams::default(), &pod)
        .await
        .map_err(Error::Kube)?;
    info!(pod = %pod_name, "recreated pod");

    let interval = Duration::from_secs(EXPANSION_POLL_INTERVAL_SECS);
    let mut waited = 0u64;
    loop {
        // NotFound is tolerated: the old pod may still be terminating.
        match api.get_opt(&pod_name).await.map_err(Error::Kube)? {
            Some(current) if pod_ready(&current) => {
                info!(pod = %pod_name, "pod is ready");
                return Ok(());
            }
            _ => debug!(pod = %pod_name, "pod not ready yet"),
        }
        if waited >= EXPANSION_WAIT_LIMIT_SECS {
            return Err(Error::WaitTimeout {
                condition: format!("readiness of pod {pod_name}"),
                waited_secs: waited,
            });
        }
        sleep(interval).await;
        waited += EXPANSION_POLL_INTERVAL_SECS;
    }
}

fn pod_ready(pod: &Pod) -> bool {
    let Some(status) = &pod.status else {
        return false;
    };
    if status.phase.as_deref() != Some("Running") {
        return false;
    }
    status
        .container_statuses
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .all(|c| c.ready)
}

#[cfg(test)]
#[path = "expansion_tests.rs"]
mod expansion_tests;
