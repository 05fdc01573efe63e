// Copyright (c) 2025 The mongo-operator Authors
// SPDX-License-Identifier: MIT

//! CRD YAML Generator
//!
//! Generates the Kubernetes CRD YAML file from the Rust types defined in
//! src/crd.rs, keeping deploy/crds/ in sync with the code.
//!
//! Usage:
//!   cargo run --bin crdgen

use kube::CustomResourceExt;
use mongo_operator::crd::MongoDBCluster;
use std::fs;
use std::path::Path;

const COPYRIGHT_HEADER: &str = "# Copyright (c) 2025 The mongo-operator Authors
# SPDX-License-Identifier: MIT
#
# This file is AUTO-GENERATED from src/crd.rs
# DO NOT EDIT MANUALLY - Run `cargo run --bin crdgen` to regenerate
#
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = Path::new("deploy/crds");
    fs::create_dir_all(output_dir)?;

    println!("Generating CRD YAML files from src/crd.rs...");

    let crd = MongoDBCluster::crd();
    let yaml = serde_yaml::to_string(&crd)?;
    let content = format!("{COPYRIGHT_HEADER}{yaml}");

    let output_path = output_dir.join("mongodbclusters.crd.yaml");
    fs::write(&output_path, content)?;
    println!("  ✓ Generated mongodbclusters.crd.yaml");

    println!("✓ Successfully generated CRD YAML files in deploy/crds/");
    println!("\nDeploy with: kubectl apply -f deploy/crds/");

    Ok(())
}
