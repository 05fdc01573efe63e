// Copyright (c) 2025 The mongo-operator Authors
// SPDX-License-Identifier: MIT

//! Credential store adapter.
//!
//! Thin layer over Kubernetes Secrets: key lookups with decoding, idempotent
//! creation of the operator-generated monitoring credential, and
//! overwrite-or-create apply for the operator-owned TLS secrets.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;
use kube::api::{Patch, PatchParams, PostParams};
use kube::Api;
use rand::distr::Alphanumeric;
use rand::RngExt;
use tracing::{debug, info};

use crate::constants::{
    FIELD_MANAGER, GENERATED_PASSWORD_LEN, MONITORING_PASSWORD_KEY, MONITORING_SECRET_SUFFIX,
};
use crate::context::Context;
use crate::crd::MongoDBCluster;
use crate::errors::{Error, Result};
use crate::resources::{cluster_labels, owner_reference};

/// Name of the operator-generated monitoring credential secret.
#[must_use]
pub fn monitoring_secret_name(cluster_name: &str) -> String {
    format!("{cluster_name}-{MONITORING_SECRET_SUFFIX}")
}

/// Generate a random alphanumeric password for operator-created users.
#[must_use]
pub fn generate_password() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

/// Read a single key out of a secret, decoding it as UTF-8.
///
/// Returns `Ok(None)` when the secret does not exist; a present secret
/// without the key is a [`Error::MissingField`].
pub async fn read_secret_key(
    api: &Api<Secret>,
    secret_name: &str,
    key: &str,
) -> Result<Option<String>> {
    let secret = match api.get(secret_name).await {
        Ok(s) => s,
        Err(kube::Error::Api(ae)) if ae.code == 404 => return Ok(None),
        Err(e) => return Err(Error::Kube(e)),
    };
    decode_key(&secret, secret_name, key).map(Some)
}

/// Decode one key from an already-fetched secret.
///
/// Checks `stringData` first, then base64-decoded `data`.
pub fn decode_key(secret: &Secret, secret_name: &str, key: &str) -> Result<String> {
    if let Some(value) = secret.string_data.as_ref().and_then(|d| d.get(key)) {
        return Ok(value.clone());
    }
    let bytes = secret
        .data
        .as_ref()
        .and_then(|d| d.get(key))
        .ok_or_else(|| Error::MissingField {
            object: format!("secret/{secret_name}"),
            field: format!("key {key:?}"),
        })?;
    String::from_utf8(bytes.0.clone()).map_err(|_| Error::MissingField {
        object: format!("secret/{secret_name}"),
        field: format!("utf-8 value for key {key:?}"),
    })
}

/// All decoded string entries of a secret, or `None` when it does not exist.
pub async fn read_secret_data(
    api: &Api<Secret>,
    secret_name: &str,
) -> Result<Option<BTreeMap<String, String>>> {
    let secret = match api.get(secret_name).await {
        Ok(s) => s,
        Err(kube::Error::Api(ae)) if ae.code == 404 => return Ok(None),
        Err(e) => return Err(Error::Kube(e)),
    };
    let mut out = BTreeMap::new();
    if let Some(data) = &secret.data {
        for (k, v) in data {
            if let Ok(s) = String::from_utf8(v.0.clone()) {
                out.insert(k.clone(), s);
            }
        }
    }
    if let Some(string_data) = &secret.string_data {
        for (k, v) in string_data {
            out.insert(k.clone(), v.clone());
        }
    }
    Ok(Some(out))
}

/// Fetch the admin password through the `secretRef` declared on the cluster.
pub async fn admin_password(ctx: &Context, cluster: &MongoDBCluster, namespace: &str) -> Result<String> {
    let secret_ref = &cluster.spec.mongo_db_security.secret_ref;
    let api = ctx.secrets(namespace);
    read_secret_key(&api, &secret_ref.name, &secret_ref.key)
        .await?
        .ok_or_else(|| Error::MissingField {
            object: format!("secret/{}", secret_ref.name),
            field: "admin password secret".to_string(),
        })
}

/// Fetch the generated monitoring password for the exporter user.
pub async fn monitoring_password(
    ctx: &Context,
    cluster_name: &str,
    namespace: &str,
) -> Result<String> {
    let api = ctx.secrets(namespace);
    let name = monitoring_secret_name(cluster_name);
    read_secret_key(&api, &name, MONITORING_PASSWORD_KEY)
        .await?
        .ok_or_else(|| Error::MissingField {
            object: format!("secret/{name}"),
            field: "monitoring password secret".to_string(),
        })
}

/// Ensure the monitoring credential secret exists.
///
/// Create-only: an existing secret is never overwritten, so the generated
/// password stays stable across reconciliations.
pub async fn ensure_monitoring_secret(
    ctx: &Context,
    cluster: &MongoDBCluster,
    name: &str,
    namespace: &str,
) -> Result<()> {
    let api = ctx.secrets(namespace);
    let secret_name = monitoring_secret_name(name);

    if api
        .get_opt(&secret_name)
        .await
        .map_err(Error::Kube)?
        .is_some()
    {
        debug!(secret = %secret_name, "monitoring secret already exists");
        return Ok(());
    }

    let mut string_data = BTreeMap::new();
    string_data.insert(MONITORING_PASSWORD_KEY.to_string(), generate_password());

    let secret = Secret {
        metadata: kube::api::ObjectMeta {
            name: Some(secret_name.clone()),
            namespace: Some(namespace.to_string()),
            labels: Some(cluster_labels(name)),
            owner_references: Some(vec![owner_reference(cluster)?]),
            ..Default::default()
        },
        string_data: Some(string_data),
        ..Default::default()
    };

    match api.create(&PostParams::default(), &secret).await {
        Ok(_) => {
            info!(secret = %secret_name, "created monitoring secret");
            Ok(())
        }
        // Lost a race with a concurrent pass; the existing secret wins.
        Err(kube::Error::Api(ae)) if ae.code == 409 => Ok(()),
        Err(e) => Err(Error::Kube(e)),
    }
}

/// Overwrite-or-create an operator-owned secret holding a single key.
///
/// Used for the TLS material secrets, which must follow rotations of the
/// user-provided sources. Server-side apply keeps this idempotent.
pub async fn apply_owned_secret(
    ctx: &Context,
    cluster: &MongoDBCluster,
    namespace: &str,
    secret_name: &str,
    key: &str,
    value: &str,
) -> Result<()> {
    let api = ctx.secrets(namespace);
    let cluster_name = cluster.metadata.name.as_deref().unwrap_or_default();

    let mut string_data = BTreeMap::new();
    string_data.insert(key.to_string(), value.to_string());

    let secret = Secret {
        metadata: kube::api::ObjectMeta {
            name: Some(secret_name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(cluster_labels(cluster_name)),
            owner_references: Some(vec![owner_reference(cluster)?]),
            ..Default::default()
        },
        string_data: Some(string_data),
        ..Default::default()
    };

    api.patch(
        secret_name,
        &PatchParams::apply(FIELD_MANAGER).force(),
        &Patch::Apply(&secret),
    )
    .await
    .map_err(Error::Kube)?;
    debug!(secret = %secret_name, "applied operator-owned secret");
    Ok(())
}

#[cfg(test)]
#[path = "secrets_tests.rs"]
mod secrets_tests;
