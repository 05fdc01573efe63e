// Copyright (c) 2025 The mongo-operator Authors
// SPDX-License-Identifier: MIT

use anyhow::Result;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::{Secret, Service};
use kube::{
    runtime::{watcher::Config, Controller},
    Api, Client,
};
use mongo_operator::{
    context::Context,
    crd::MongoDBCluster,
    reconcilers::{error_policy, reconcile},
};
use std::sync::Arc;
use tracing::{debug, error, info};

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .thread_name("mongo-operator")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    // Respects RUST_LOG for filtering and RUST_LOG_FORMAT for json/text output
    // Example: RUST_LOG=debug RUST_LOG_FORMAT=json cargo run
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!("Starting MongoDB Cluster Controller");

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");

    let clusters = Api::<MongoDBCluster>::all(client.clone());
    let statefulsets = Api::<StatefulSet>::all(client.clone());
    let services = Api::<Service>::all(client.clone());
    let secrets = Api::<Secret>::all(client.clone());

    let context = Arc::new(Context::new(client));

    Controller::new(clusters, Config::default())
        .owns(statefulsets, Config::default())
        .owns(services, Config::default())
        .owns(secrets, Config::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, context)
        .for_each(|result| async move {
            match result {
                Ok((obj, _action)) => debug!(object = %obj.name, "reconciled"),
                Err(e) => error!(error = %e, "reconciliation error"),
            }
        })
        .await;

    info!("MongoDB Cluster Controller terminated");
    Ok(())
}
