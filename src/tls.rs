// Copyright (c) 2025 The mongo-operator Authors
// SPDX-License-Identifier: MIT

//! TLS input validation and operator-owned secret materialization.
//!
//! The user supplies a CA (secret or config map, key `ca.crt`) and a server
//! certificate secret (`tls.pem`, or `tls.crt` plus `tls.key`). Validation
//! distinguishes three outcomes:
//!
//! - everything resolves → valid, reconciliation continues
//! - a referenced object does not exist yet → not ready (the user may still
//!   be creating it), fed into the `Pending` phase
//! - material is present but malformed or inconsistent → hard error, fed
//!   into the `Failed` phase
//!
//! `ensure` then rewrites the two operator-owned secrets from the user
//! inputs every pass, so certificate rotations propagate.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::constants::{TLS_CA_CERT_KEY, TLS_CERT_KEY, TLS_KEY_KEY, TLS_PEM_KEY};
use crate::context::Context;
use crate::crd::{MongoDBCluster, TlsConfig};
use crate::errors::{Error, Result};
use crate::resources::{ca_secret_name, server_cert_secret_name};
use crate::secrets::{apply_owned_secret, read_secret_data};

/// Outcome of TLS input validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsValidity {
    /// TLS is disabled or all inputs resolve and agree.
    Valid,
    /// A referenced secret or config map does not exist yet.
    NotReady(String),
}

/// Validate the TLS inputs declared on the cluster.
///
/// Returns `Err` only for malformed-but-present material; missing referenced
/// objects come back as [`TlsValidity::NotReady`].
pub async fn validate(ctx: &Context, cluster: &MongoDBCluster, namespace: &str) -> Result<TlsValidity> {
    let Some(tls) = cluster.tls().filter(|t| t.enabled) else {
        return Ok(TlsValidity::Valid);
    };

    debug!("validating TLS configuration");

    match ca_certificate(ctx, tls, namespace).await? {
        Some(_) => {}
        None => {
            return Ok(TlsValidity::NotReady(
                "CA certificate source not found".to_string(),
            ))
        }
    }

    let secret_name = certificate_key_secret(tls)?;
    let Some(data) = read_secret_data(&ctx.secrets(namespace), secret_name).await? else {
        return Ok(TlsValidity::NotReady(format!(
            "certificate secret {secret_name:?} not found"
        )));
    };
    pem_or_concatenated(&data, secret_name)?;

    debug!("TLS configuration is valid");
    Ok(TlsValidity::Valid)
}

/// Materialize the two operator-owned TLS secrets from the user inputs.
///
/// Overwrite-or-create; runs every pass so rotations of the source material
/// flow through. No-op when TLS is disabled.
pub async fn ensure(
    ctx: &Context,
    cluster: &MongoDBCluster,
    name: &str,
    namespace: &str,
) -> Result<()> {
    let Some(tls) = cluster.tls().filter(|t| t.enabled) else {
        return Ok(());
    };

    let ca = ca_certificate(ctx, tls, namespace)
        .await?
        .ok_or_else(|| Error::TlsValidation {
            reason: "CA certificate source disappeared during reconciliation".to_string(),
        })?;
    apply_owned_secret(
        ctx,
        cluster,
        namespace,
        &ca_secret_name(name),
        TLS_CA_CERT_KEY,
        &ca,
    )
    .await?;

    let secret_name = certificate_key_secret(tls)?;
    let data = read_secret_data(&ctx.secrets(namespace), secret_name)
        .await?
        .ok_or_else(|| Error::TlsValidation {
            reason: format!("certificate secret {secret_name:?} disappeared during reconciliation"),
        })?;
    let pem = pem_or_concatenated(&data, secret_name)?;
    apply_owned_secret(
        ctx,
        cluster,
        namespace,
        &server_cert_secret_name(name),
        TLS_CERT_KEY,
        &pem,
    )
    .await?;

    info!("TLS secrets are in place");
    Ok(())
}

/// Resolve the CA certificate from the configured source.
///
/// The secret takes precedence over the config map. `Ok(None)` means the
/// referenced object does not exist; an existing object without a non-empty
/// `ca.crt` is a hard error, as is a spec naming neither source.
async fn ca_certificate(
    ctx: &Context,
    tls: &TlsConfig,
    namespace: &str,
) -> Result<Option<String>> {
    let data = if let Some(secret_name) = &tls.ca_certificate_secret {
        read_secret_data(&ctx.secrets(namespace), secret_name).await?
    } else if let Some(config_map_name) = &tls.ca_config_map {
        match ctx.config_maps(namespace).get(config_map_name).await {
            Ok(cm) => Some(cm.data.unwrap_or_default()),
            Err(kube::Error::Api(ae)) if ae.code == 404 => None,
            Err(e) => return Err(Error::Kube(e)),
        }
    } else {
        return Err(Error::TlsValidation {
            reason: "TLS is enabled but neither caCertificateSecret nor caConfigMap is set"
                .to_string(),
        });
    };

    let Some(data) = data else {
        return Ok(None);
    };
    match data.get(TLS_CA_CERT_KEY) {
        Some(cert) if !cert.is_empty() => Ok(Some(cert.clone())),
        _ => Err(Error::TlsValidation {
            reason: format!("CA certificate source has no {TLS_CA_CERT_KEY:?} entry"),
        }),
    }
}

fn certificate_key_secret(tls: &TlsConfig) -> Result<&str> {
    tls.certificate_key_secret
        .as_deref()
        .ok_or_else(|| Error::TlsValidation {
            reason: "TLS is enabled but certificateKeySecret is not set".to_string(),
        })
}

/// Extract the final PEM from the user-provided secret data.
///
/// This is either the `tls.pem` entry, or the concatenation of `tls.crt`
/// and `tls.key`. When all three are present, the pem entry must equal the
/// concatenation exactly (after trailing-newline trim); a mismatch is a
/// hard error, never auto-resolved.
pub fn pem_or_concatenated(data: &BTreeMap<String, String>, secret_name: &str) -> Result<String> {
    let cert_key = match (data.get(TLS_CERT_KEY), data.get(TLS_KEY_KEY)) {
        (Some(cert), Some(key)) => Some(combine_cert_and_key(cert, key)),
        _ => None,
    };
    let pem = data.get(TLS_PEM_KEY);

    match (cert_key, pem) {
        (None, None) => Err(Error::TlsValidation {
            reason: format!(
                "neither {TLS_PEM_KEY:?} nor the pair {TLS_CERT_KEY:?}/{TLS_KEY_KEY:?} present in secret {secret_name:?}"
            ),
        }),
        (None, Some(pem)) => Ok(pem.clone()),
        (Some(cert_key), None) => Ok(cert_key),
        (Some(cert_key), Some(pem)) if cert_key == *pem => Ok(cert_key),
        (Some(_), Some(_)) => Err(Error::TlsValidation {
            reason: format!(
                "in secret {secret_name:?} the {TLS_PEM_KEY:?} entry must be equal to the concatenation of {TLS_CERT_KEY:?} with {TLS_KEY_KEY:?}"
            ),
        }),
    }
}

/// Concatenate certificate and key, trimming trailing newlines first.
#[must_use]
pub fn combine_cert_and_key(cert: &str, key: &str) -> String {
    format!(
        "{}\n{}",
        cert.trim_end_matches('\n'),
        key.trim_end_matches('\n')
    )
}

#[cfg(test)]
#[path = "tls_tests.rs"]
mod tls_tests;
