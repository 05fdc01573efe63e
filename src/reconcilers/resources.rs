// Copyright (c) 2025 The mongo-operator Authors
// SPDX-License-Identifier: MIT

//! Generic resource creation and update helpers.
//!
//! Server-side apply keeps the managed Services and PodDisruptionBudgets in
//! sync without hand-rolled diffing. The StatefulSet deliberately does not go
//! through here; its apply lives in [`crate::resources`] because it has to
//! detect immutable volume claim template growth first.

use kube::api::{Patch, PatchParams, PostParams};
use kube::core::NamespaceResourceScope;
use kube::{Api, Client, Resource, ResourceExt};
use tracing::{debug, info};

use crate::constants::FIELD_MANAGER;
use crate::errors::{Error, Result};

/// Create a resource, or patch it into shape when it already exists.
///
/// Uses server-side apply for the update path so repeated reconciliations
/// converge without conflicts.
pub async fn create_or_apply<T>(client: &Client, namespace: &str, resource: &T) -> Result<()>
where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + ResourceExt
        + Clone
        + std::fmt::Debug
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>,
{
    let name = resource
        .meta()
        .name
        .as_ref()
        .ok_or_else(|| Error::MissingField {
            object: T::kind(&()).to_string(),
            field: "metadata.name".to_string(),
        })?;

    let api: Api<T> = Api::namespaced(client.clone(), namespace);

    match api.create(&PostParams::default(), resource).await {
        Ok(_) => {
            info!(kind = %T::kind(&()), namespace, name = %name, "created resource");
            Ok(())
        }
        Err(kube::Error::Api(ae)) if ae.code == 409 => {
            debug!(kind = %T::kind(&()), namespace, name = %name, "resource exists, applying");
            api.patch(
                name,
                &PatchParams::apply(FIELD_MANAGER).force(),
                &Patch::Apply(resource),
            )
            .await
            .map_err(Error::Kube)?;
            Ok(())
        }
        Err(e) => Err(Error::Kube(e)),
    }
}
