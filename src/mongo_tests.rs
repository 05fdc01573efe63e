// Copyright (c) 2025 The mongo-operator Authors
// SPDX-License-Identifier: MIT

//! Unit tests for `mongo.rs`

#[cfg(test)]
mod tests {
    use mongodb::bson::{doc, Bson};

    use crate::mongo::{
        derive_members, direct_uri, member_host, members_bson, parse_status, replica_set_uri,
        ReplicaSetManager, ReplicaSetObservation,
    };

    #[test]
    fn test_member_host_follows_headless_service_scheme() {
        assert_eq!(
            member_host("mydb", "databases", 0),
            "mydb-cluster-0.mydb-cluster.databases:27017"
        );
        assert_eq!(
            member_host("mydb", "databases", 4),
            "mydb-cluster-4.mydb-cluster.databases:27017"
        );
    }

    #[test]
    fn test_member_host_is_deterministic() {
        assert_eq!(
            member_host("a", "ns", 2),
            member_host("a", "ns", 2)
        );
    }

    #[test]
    fn test_derive_members_single_member() {
        let members = derive_members("mydb", "default", 1, false);
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].id, 0);
        assert_eq!(members[0].priority, 2);
        assert!(!members[0].arbiter_only);
    }

    #[test]
    fn test_derive_members_first_member_wins_election() {
        for size in 1..=7 {
            let members = derive_members("mydb", "default", size, false);
            assert_eq!(members.len(), size as usize);
            assert_eq!(members[0].priority, 2);
            for m in &members[1..] {
                assert_eq!(m.priority, 1);
                assert!(!m.arbiter_only);
            }
        }
    }

    #[test]
    fn test_derive_members_ids_and_hosts_are_sequential() {
        let members = derive_members("mydb", "prod", 3, false);
        for (i, m) in members.iter().enumerate() {
            assert_eq!(m.id, i as i32);
            assert_eq!(m.host, member_host("mydb", "prod", i as i32));
        }
    }

    #[test]
    fn test_derive_members_arbiter_takes_last_slot() {
        let members = derive_members("mydb", "default", 4, true);
        assert_eq!(members.len(), 4);
        assert_eq!(members[0].priority, 2);
        assert_eq!(members[1].priority, 1);
        assert_eq!(members[2].priority, 1);
        assert_eq!(members[3].priority, 0);
        assert!(members[3].arbiter_only);
        assert!(members[..3].iter().all(|m| !m.arbiter_only));
    }

    #[test]
    fn test_derive_members_no_arbiter_for_single_member() {
        let members = derive_members("mydb", "default", 1, true);
        assert_eq!(members.len(), 1);
        assert!(!members[0].arbiter_only);
        assert_eq!(members[0].priority, 2);
    }

    #[test]
    fn test_direct_uri_shape() {
        assert_eq!(
            direct_uri("mydb-cluster-0.mydb-cluster.ns:27017"),
            "mongodb://mydb-cluster-0.mydb-cluster.ns:27017/"
        );
    }

    #[test]
    fn test_replica_set_uri_joins_hosts() {
        let hosts = vec!["h0:27017".to_string(), "h1:27017".to_string()];
        assert_eq!(
            replica_set_uri(&hosts, "mydb"),
            "mongodb://h0:27017,h1:27017/?replicaSet=mydb"
        );
    }

    #[test]
    fn test_uris_never_carry_credentials() {
        let hosts = vec!["h0:27017".to_string()];
        assert!(!direct_uri("h0:27017").contains('@'));
        assert!(!replica_set_uri(&hosts, "mydb").contains('@'));
    }

    #[test]
    fn test_credential_keeps_password_verbatim() {
        // URI metacharacters in the password must survive untouched;
        // the credential never passes through connection string parsing.
        let manager = ReplicaSetManager::new("mydb", "ns", "admin", "p@ss/w%rd:1", 3);
        let credential = manager.credential();
        assert_eq!(credential.username.as_deref(), Some("admin"));
        assert_eq!(credential.password.as_deref(), Some("p@ss/w%rd:1"));
    }

    #[test]
    fn test_members_bson_omits_arbiter_flag_for_data_members() {
        let members = derive_members("mydb", "ns", 3, false);
        let docs = members_bson(&members);
        assert_eq!(docs.len(), 3);
        for d in &docs {
            assert!(!d.contains_key("arbiterOnly"));
            assert!(d.contains_key("host"));
            assert!(d.contains_key("priority"));
        }
        assert_eq!(docs[0].get_i32("priority").unwrap(), 2);
    }

    #[test]
    fn test_members_bson_marks_arbiter() {
        let members = derive_members("mydb", "ns", 3, true);
        let docs = members_bson(&members);
        assert_eq!(docs[2].get_bool("arbiterOnly").unwrap(), true);
        assert_eq!(docs[2].get_i32("priority").unwrap(), 0);
        assert!(!docs[0].contains_key("arbiterOnly"));
    }

    #[test]
    fn test_parse_status_reachable() {
        let status = doc! {
            "ok": 1.0,
            "members": [ {"_id": 0}, {"_id": 1}, {"_id": 2} ],
            "term": 7_i64,
        };
        assert_eq!(
            parse_status(&status).unwrap(),
            ReplicaSetObservation::Reachable {
                member_count: 3,
                term: 7
            }
        );
    }

    #[test]
    fn test_parse_status_accepts_integer_ok_and_term() {
        let status = doc! {
            "ok": 1_i32,
            "members": [ {"_id": 0} ],
            "term": 2_i32,
        };
        assert_eq!(
            parse_status(&status).unwrap(),
            ReplicaSetObservation::Reachable {
                member_count: 1,
                term: 2
            }
        );
    }

    #[test]
    fn test_parse_status_not_ok_means_uninitialized() {
        let status = doc! { "ok": 0.0, "errmsg": "no replset config has been received" };
        assert_eq!(
            parse_status(&status).unwrap(),
            ReplicaSetObservation::Uninitialized
        );
    }

    #[test]
    fn test_parse_status_missing_ok_is_an_error() {
        let status = doc! { "members": [] };
        assert!(parse_status(&status).is_err());
    }

    #[test]
    fn test_parse_status_missing_members_is_an_error() {
        let status = doc! { "ok": 1.0, "term": 1_i64 };
        assert!(parse_status(&status).is_err());
    }

    #[test]
    fn test_parse_status_missing_term_is_an_error() {
        let status = doc! { "ok": 1.0, "members": [ {"_id": 0} ] };
        assert!(parse_status(&status).is_err());
    }

    #[test]
    fn test_parse_status_rejects_non_numeric_ok() {
        let status = doc! { "ok": Bson::String("yes".to_string()), "members": [] };
        assert!(parse_status(&status).is_err());
    }
}
