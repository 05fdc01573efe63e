// Copyright (c) 2025 The mongo-operator Authors
// SPDX-License-Identifier: MIT

//! Unit tests for `status.rs`

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use kube::runtime::controller::Action;

    use crate::crd::{ClusterPhase, MongoDBClusterStatus};
    use crate::reconcilers::status::{phase_action, status_changed};

    #[test]
    fn test_transient_phases_poll() {
        for phase in [
            ClusterPhase::Creating,
            ClusterPhase::Pending,
            ClusterPhase::Scaling,
        ] {
            assert_eq!(
                phase_action(phase),
                Action::requeue(Duration::from_secs(10)),
                "phase {phase} should requeue"
            );
        }
    }

    #[test]
    fn test_expanding_polls_tightly() {
        assert_eq!(
            phase_action(ClusterPhase::Expanding),
            Action::requeue(Duration::from_secs(5))
        );
    }

    #[test]
    fn test_settled_phases_wait_for_changes() {
        assert_eq!(phase_action(ClusterPhase::Running), Action::await_change());
        assert_eq!(phase_action(ClusterPhase::Failed), Action::await_change());
    }

    fn running_status() -> MongoDBClusterStatus {
        MongoDBClusterStatus {
            state: Some(ClusterPhase::Running),
            message: "done".to_string(),
            version: Some("7".to_string()),
            last_update_time: Some("2026-08-01T00:00:00+00:00".to_string()),
        }
    }

    #[test]
    fn test_status_changed_when_never_written() {
        assert!(status_changed(None, ClusterPhase::Creating, "creating cluster workload", None));
    }

    #[test]
    fn test_status_unchanged_skips_the_write() {
        // A settled cluster must not keep touching its own status; the
        // write would bump the resourceVersion and retrigger the watch.
        let current = running_status();
        assert!(!status_changed(
            Some(&current),
            ClusterPhase::Running,
            "done",
            Some("7")
        ));
    }

    #[test]
    fn test_status_changed_on_new_phase_or_message() {
        let current = running_status();
        assert!(status_changed(
            Some(&current),
            ClusterPhase::Pending,
            "done",
            None
        ));
        assert!(status_changed(
            Some(&current),
            ClusterPhase::Running,
            "scaling replica set from 3 to 5 members",
            None
        ));
    }

    #[test]
    fn test_status_changed_on_new_version() {
        let current = running_status();
        assert!(status_changed(
            Some(&current),
            ClusterPhase::Running,
            "done",
            Some("8")
        ));
    }

    #[test]
    fn test_status_comparison_ignores_timestamp_and_absent_version() {
        // A `None` version leaves the stored one in place under the merge
        // patch, so it does not count as a difference either.
        let mut current = running_status();
        current.last_update_time = None;
        assert!(!status_changed(
            Some(&current),
            ClusterPhase::Running,
            "done",
            None
        ));
    }

    #[test]
    fn test_phase_display_matches_api_values() {
        assert_eq!(ClusterPhase::Creating.to_string(), "Creating");
        assert_eq!(ClusterPhase::Pending.to_string(), "Pending");
        assert_eq!(ClusterPhase::Scaling.to_string(), "Scaling");
        assert_eq!(ClusterPhase::Expanding.to_string(), "Expanding");
        assert_eq!(ClusterPhase::Running.to_string(), "Running");
        assert_eq!(ClusterPhase::Failed.to_string(), "Failed");
    }
}
