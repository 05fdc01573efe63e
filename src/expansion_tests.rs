// Copyright (c) 2025 The mongo-operator Authors
// SPDX-License-Identifier: MIT

//! Unit tests for `expansion.rs`

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use k8s_openapi::api::core::v1::{
        ContainerStatus, PersistentVolumeClaim, PersistentVolumeClaimCondition,
        PersistentVolumeClaimStatus, Pod, PodStatus,
    };
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

    use crate::context::Context;
    use crate::crd::{
        ClusterPhase, KubernetesConfig, MongoDBCluster, MongoDBClusterSpec, MongoDBClusterStatus,
        MongoDBSecurity, SecretRef, StorageConfig,
    };
    use crate::errors::Error;
    use crate::expansion::{
        claim_resize_done, expand_storage, parse_quantity, pod_ready, quantity_grew,
    };

    #[test]
    fn test_parse_quantity_plain_integer() {
        assert_eq!(parse_quantity("1024").unwrap(), 1024);
        assert_eq!(parse_quantity("0").unwrap(), 0);
    }

    #[test]
    fn test_parse_quantity_binary_suffixes() {
        assert_eq!(parse_quantity("1Ki").unwrap(), 1024);
        assert_eq!(parse_quantity("1Mi").unwrap(), 1 << 20);
        assert_eq!(parse_quantity("20Gi").unwrap(), 20 * (1_i128 << 30));
        assert_eq!(parse_quantity("1Ti").unwrap(), 1_i128 << 40);
    }

    #[test]
    fn test_parse_quantity_decimal_suffixes() {
        assert_eq!(parse_quantity("1k").unwrap(), 1_000);
        assert_eq!(parse_quantity("5M").unwrap(), 5_000_000);
        assert_eq!(parse_quantity("2G").unwrap(), 2_000_000_000);
    }

    #[test]
    fn test_parse_quantity_fraction() {
        assert_eq!(parse_quantity("1.5Gi").unwrap(), 3 * (1_i128 << 29));
        assert_eq!(parse_quantity("0.5k").unwrap(), 500);
        assert_eq!(parse_quantity(".5k").unwrap(), 500);
    }

    #[test]
    fn test_parse_quantity_trims_whitespace() {
        assert_eq!(parse_quantity(" 1Gi ").unwrap(), 1_i128 << 30);
    }

    #[test]
    fn test_parse_quantity_rejects_garbage() {
        assert!(parse_quantity("10Qx").is_err());
        assert!(parse_quantity("Gi").is_err());
        assert!(parse_quantity("").is_err());
        assert!(parse_quantity("10m").is_err());
    }

    #[test]
    fn test_quantity_grew_detects_growth() {
        assert!(quantity_grew("20Gi", "30Gi").unwrap());
        assert!(quantity_grew("1Gi", "1025Mi").unwrap());
    }

    #[test]
    fn test_quantity_grew_equal_sizes_across_units() {
        assert!(!quantity_grew("1Gi", "1024Mi").unwrap());
        assert!(!quantity_grew("1024Mi", "1Gi").unwrap());
    }

    #[test]
    fn test_quantity_grew_shrink_is_not_growth() {
        assert!(!quantity_grew("30Gi", "20Gi").unwrap());
    }

    fn pvc_with_status(status: Option<PersistentVolumeClaimStatus>) -> PersistentVolumeClaim {
        PersistentVolumeClaim {
            status,
            ..Default::default()
        }
    }

    #[test]
    fn test_claim_resize_done_no_status_means_not_done() {
        let pvc = pvc_with_status(None);
        assert!(!claim_resize_done(&pvc, "30Gi").unwrap());
    }

    #[test]
    fn test_claim_resize_done_capacity_reached() {
        let pvc = pvc_with_status(Some(PersistentVolumeClaimStatus {
            capacity: Some(BTreeMap::from([(
                "storage".to_string(),
                Quantity("30Gi".to_string()),
            )])),
            ..Default::default()
        }));
        assert!(claim_resize_done(&pvc, "30Gi").unwrap());
        assert!(claim_resize_done(&pvc, "20Gi").unwrap());
        assert!(!claim_resize_done(&pvc, "40Gi").unwrap());
    }

    #[test]
    fn test_claim_resize_done_filesystem_resize_pending() {
        let pvc = pvc_with_status(Some(PersistentVolumeClaimStatus {
            conditions: Some(vec![PersistentVolumeClaimCondition {
                type_: "FileSystemResizePending".to_string(),
                status: "True".to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        }));
        assert!(claim_resize_done(&pvc, "30Gi").unwrap());
    }

    #[test]
    fn test_claim_resize_done_other_condition_means_in_progress() {
        let pvc = pvc_with_status(Some(PersistentVolumeClaimStatus {
            conditions: Some(vec![PersistentVolumeClaimCondition {
                type_: "Resizing".to_string(),
                status: "True".to_string(),
                ..Default::default()
            }]),
            capacity: Some(BTreeMap::from([(
                "storage".to_string(),
                Quantity("30Gi".to_string()),
            )])),
            ..Default::default()
        }));
        assert!(!claim_resize_done(&pvc, "30Gi").unwrap());
    }

    fn pod_with_status(status: Option<PodStatus>) -> Pod {
        Pod {
            status,
            ..Default::default()
        }
    }

    fn container_status(ready: bool) -> ContainerStatus {
        ContainerStatus {
            ready,
            ..Default::default()
        }
    }

    #[test]
    fn test_pod_ready_requires_status() {
        assert!(!pod_ready(&pod_with_status(None)));
    }

    #[test]
    fn test_pod_ready_requires_running_phase() {
        let pod = pod_with_status(Some(PodStatus {
            phase: Some("Pending".to_string()),
            container_statuses: Some(vec![container_status(true)]),
            ..Default::default()
        }));
        assert!(!pod_ready(&pod));
    }

    #[test]
    fn test_pod_ready_requires_all_containers_ready() {
        let pod = pod_with_status(Some(PodStatus {
            phase: Some("Running".to_string()),
            container_statuses: Some(vec![container_status(true), container_status(false)]),
            ..Default::default()
        }));
        assert!(!pod_ready(&pod));

        let pod = pod_with_status(Some(PodStatus {
            phase: Some("Running".to_string()),
            container_statuses: Some(vec![container_status(true), container_status(true)]),
            ..Default::default()
        }));
        assert!(pod_ready(&pod));
    }

    // A client pointed at an unroutable endpoint; the guard must return
    // before any request is issued, so the address is never contacted.
    fn offline_context() -> Context {
        let config = kube::Config::new("http://127.0.0.1:9".parse().unwrap());
        Context::new(kube::Client::try_from(config).unwrap())
    }

    fn cluster_with_storage() -> MongoDBCluster {
        let spec = MongoDBClusterSpec {
            cluster_size: 3,
            arbiter: None,
            kubernetes_config: KubernetesConfig {
                image: "mongo:7.0".to_string(),
                ..Default::default()
            },
            storage: Some(StorageConfig {
                storage_size: "30Gi".to_string(),
                storage_class_name: None,
                access_modes: None,
            }),
            mongo_db_security: MongoDBSecurity {
                mongo_db_admin_user: "admin".to_string(),
                secret_ref: SecretRef {
                    name: "admin-secret".to_string(),
                    key: "password".to_string(),
                },
                tls: None,
            },
            mongo_db_monitoring: None,
            pod_disruption_budget: None,
            mongo_db_additional_config: None,
        };
        MongoDBCluster::new("mydb", spec)
    }

    #[tokio::test]
    async fn test_expand_storage_refuses_without_recorded_intent() {
        let ctx = offline_context();
        let cluster = cluster_with_storage();

        let err = expand_storage(&ctx, &cluster, "mydb", "default")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ExpansionGuard { phase: None }));
    }

    #[tokio::test]
    async fn test_expand_storage_refuses_in_settled_phase() {
        let ctx = offline_context();
        let mut cluster = cluster_with_storage();
        cluster.status = Some(MongoDBClusterStatus {
            state: Some(ClusterPhase::Running),
            ..Default::default()
        });

        let err = expand_storage(&ctx, &cluster, "mydb", "default")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ExpansionGuard {
                phase: Some(ClusterPhase::Running)
            }
        ));
    }
}
