// Copyright (c) 2025 The mongo-operator Authors
// SPDX-License-Identifier: MIT

//! Database control client for replica set administration.
//!
//! Everything the operator does inside MongoDB goes through
//! [`ReplicaSetManager`]: observing replica set state, `replSetInitiate`,
//! `replSetReconfig`, and monitoring user management. Member identity is
//! derived deterministically from the cluster name and namespace via the
//! headless service DNS scheme, never discovered.
//!
//! Driver errors are classified into typed outcomes; in particular the
//! server codes 94 (`NotYetInitialized`) and 93 (`InvalidReplicaSetConfig`)
//! both mean "proceed with initiation", and every connectivity failure
//! collapses into a single connect-error signal.

use std::time::Duration;

use mongodb::bson::{doc, Bson, Document};
use mongodb::error::ErrorKind;
use mongodb::options::{ClientOptions, Credential};
use mongodb::Client;
use tracing::{debug, info};

use crate::constants::{
    ADMIN_DATABASE, CLUSTER_SUFFIX, MONGODB_PORT, MONGO_CONNECT_TIMEOUT_SECS, MONITORING_USER,
};
use crate::errors::DbError;

/// Server code for `NotYetInitialized`.
const CODE_NOT_YET_INITIALIZED: i32 = 94;
/// Server code for `InvalidReplicaSetConfig`.
const CODE_INVALID_REPLSET_CONFIG: i32 = 93;

/// One member of the desired replica set configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicaSetMember {
    /// Member `_id` within the replica set configuration.
    pub id: i32,
    /// Stable DNS address `{name}-cluster-{id}.{name}-cluster.{namespace}:27017`.
    pub host: String,
    /// Election priority. Member 0 gets 2 so it wins the first election.
    pub priority: i32,
    /// Non-voting arbiter member.
    pub arbiter_only: bool,
}

/// What the operator observed about the live replica set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicaSetObservation {
    /// The server answered but no replica set has been initiated yet.
    Uninitialized,
    /// The replica set answered `replSetGetStatus`.
    Reachable {
        /// Number of members in the live configuration.
        member_count: usize,
        /// Current raft term, used as the base for reconfig versions.
        term: i64,
    },
    /// The database could not be reached at all.
    ConnectError {
        /// Driver-reported reason, for the status message.
        reason: String,
    },
}

/// Stable DNS address of one replica set member.
#[must_use]
pub fn member_host(cluster_name: &str, namespace: &str, index: i32) -> String {
    format!(
        "{cluster_name}-{CLUSTER_SUFFIX}-{index}.{cluster_name}-{CLUSTER_SUFFIX}.{namespace}:{MONGODB_PORT}"
    )
}

/// Derive the desired replica set members for a cluster.
///
/// Member 0 carries priority 2, the rest priority 1. With the arbiter flag
/// set and more than one member, the last member joins as a non-voting
/// arbiter with priority 0.
#[must_use]
pub fn derive_members(
    cluster_name: &str,
    namespace: &str,
    size: i32,
    arbiter: bool,
) -> Vec<ReplicaSetMember> {
    (0..size)
        .map(|i| {
            let is_arbiter = arbiter && size > 1 && i == size - 1;
            ReplicaSetMember {
                id: i,
                host: member_host(cluster_name, namespace, i),
                priority: match (i, is_arbiter) {
                    (_, true) => 0,
                    (0, false) => 2,
                    _ => 1,
                },
                arbiter_only: is_arbiter,
            }
        })
        .collect()
}

/// Connection string for a direct connection to a single member.
///
/// Credentials travel in the typed client options, never in the string, so
/// a password full of URI metacharacters needs no escaping and the string
/// is safe to log.
#[must_use]
pub fn direct_uri(host: &str) -> String {
    format!("mongodb://{host}/")
}

/// Connection string addressing the whole replica set.
#[must_use]
pub fn replica_set_uri(hosts: &[String], replica_set: &str) -> String {
    format!("mongodb://{}/?replicaSet={replica_set}", hosts.join(","))
}

/// Administrative client bound to one cluster.
pub struct ReplicaSetManager {
    cluster_name: String,
    namespace: String,
    admin_user: String,
    admin_password: String,
    cluster_size: i32,
}

impl ReplicaSetManager {
    /// Bind a manager to a cluster's identity and admin credentials.
    #[must_use]
    pub fn new(
        cluster_name: &str,
        namespace: &str,
        admin_user: &str,
        admin_password: &str,
        cluster_size: i32,
    ) -> Self {
        Self {
            cluster_name: cluster_name.to_string(),
            namespace: namespace.to_string(),
            admin_user: admin_user.to_string(),
            admin_password: admin_password.to_string(),
            cluster_size,
        }
    }

    fn member_hosts(&self, count: i32) -> Vec<String> {
        (0..count)
            .map(|i| member_host(&self.cluster_name, &self.namespace, i))
            .collect()
    }

    /// Admin credential for the client options, taken verbatim.
    fn credential(&self) -> Credential {
        let mut credential = Credential::default();
        credential.username = Some(self.admin_user.clone());
        credential.password = Some(self.admin_password.clone());
        credential
    }

    /// Connect directly to member 0, bypassing replica set discovery.
    ///
    /// Required for `replSetGetStatus` and `replSetInitiate`, which must
    /// work before any replica set exists.
    async fn connect_direct(&self) -> Result<Client, DbError> {
        let host = member_host(&self.cluster_name, &self.namespace, 0);
        let uri = direct_uri(&host);
        let mut opts = ClientOptions::parse(&uri)
            .await
            .map_err(|e| classify_connect(&host, e))?;
        opts.credential = Some(self.credential());
        opts.direct_connection = Some(true);
        opts.connect_timeout = Some(Duration::from_secs(MONGO_CONNECT_TIMEOUT_SECS));
        opts.server_selection_timeout = Some(Duration::from_secs(MONGO_CONNECT_TIMEOUT_SECS));
        Client::with_options(opts).map_err(|e| classify_connect(&host, e))
    }

    /// Connect through replica set discovery across the declared members.
    async fn connect_replica_set(&self, member_count: i32) -> Result<Client, DbError> {
        let hosts = self.member_hosts(member_count);
        let uri = replica_set_uri(&hosts, &self.cluster_name);
        let target = hosts.join(",");
        let mut opts = ClientOptions::parse(&uri)
            .await
            .map_err(|e| classify_connect(&target, e))?;
        opts.credential = Some(self.credential());
        opts.connect_timeout = Some(Duration::from_secs(MONGO_CONNECT_TIMEOUT_SECS));
        opts.server_selection_timeout = Some(Duration::from_secs(MONGO_CONNECT_TIMEOUT_SECS));
        Client::with_options(opts).map_err(|e| classify_connect(&target, e))
    }

    /// Run `replSetGetStatus` and classify the result.
    pub async fn observe(&self) -> Result<ReplicaSetObservation, DbError> {
        let host = member_host(&self.cluster_name, &self.namespace, 0);
        let client = match self.connect_direct().await {
            Ok(c) => c,
            Err(DbError::Connect { reason, .. }) => {
                return Ok(ReplicaSetObservation::ConnectError { reason })
            }
            Err(e) => return Err(e),
        };
        let result = client
            .database(ADMIN_DATABASE)
            .run_command(doc! { "replSetGetStatus": 1 })
            .await;
        client.shutdown().await;

        let status = match result {
            Ok(doc) => doc,
            Err(e) => {
                return match classify_connect(&host, e) {
                    DbError::Connect { reason, .. } => {
                        Ok(ReplicaSetObservation::ConnectError { reason })
                    }
                    DbError::NotInitialized { .. } => Ok(ReplicaSetObservation::Uninitialized),
                    other => Err(other),
                }
            }
        };

        parse_status(&status).map_err(|reason| DbError::UnexpectedResponse {
            command: "replSetGetStatus",
            reason,
        })
    }

    /// Initiate the replica set with the given member configuration.
    ///
    /// Issued over a direct connection to member 0; the other members learn
    /// the configuration through the replication protocol.
    pub async fn initiate(&self, members: &[ReplicaSetMember]) -> Result<(), DbError> {
        let config = doc! {
            "_id": &self.cluster_name,
            "members": members_bson(members),
        };
        let client = self.connect_direct().await?;
        let result = client
            .database(ADMIN_DATABASE)
            .run_command(doc! { "replSetInitiate": config })
            .await;
        client.shutdown().await;
        result?;
        info!(
            replica_set = %self.cluster_name,
            members = members.len(),
            "initiated replica set"
        );
        Ok(())
    }

    /// Reconfigure the replica set to the given member list.
    ///
    /// The config version must move strictly forward; it is derived from
    /// the observed term as `term + 1`. The connection goes through the
    /// members of the live configuration, not the desired one, so the
    /// primary can always be found.
    pub async fn reconfigure(
        &self,
        members: &[ReplicaSetMember],
        live_member_count: usize,
        term: i64,
    ) -> Result<(), DbError> {
        let config = doc! {
            "_id": &self.cluster_name,
            "version": term + 1,
            "members": members_bson(members),
        };
        let count = i32::try_from(live_member_count).unwrap_or(self.cluster_size);
        let client = self.connect_replica_set(count).await?;
        let result = client
            .database(ADMIN_DATABASE)
            .run_command(doc! { "replSetReconfig": config })
            .await;
        client.shutdown().await;
        result?;
        info!(
            replica_set = %self.cluster_name,
            members = members.len(),
            version = term + 1,
            "reconfigured replica set"
        );
        Ok(())
    }

    /// Check whether the monitoring user exists in `admin.system.users`.
    pub async fn monitoring_user_exists(&self) -> Result<bool, DbError> {
        let client = self.connect_replica_set(self.cluster_size).await?;
        let result = client
            .database(ADMIN_DATABASE)
            .collection::<Document>("system.users")
            .count_documents(doc! { "user": MONITORING_USER })
            .await;
        client.shutdown().await;
        Ok(result? > 0)
    }

    /// Create the monitoring user for the exporter sidecar.
    pub async fn create_monitoring_user(&self, password: &str) -> Result<(), DbError> {
        let client = self.connect_replica_set(self.cluster_size).await?;
        let result = client
            .database(ADMIN_DATABASE)
            .run_command(doc! {
                "createUser": MONITORING_USER,
                "pwd": password,
                "roles": [
                    { "role": "clusterMonitor", "db": "admin" },
                    { "role": "read", "db": "local" },
                ],
            })
            .await;
        client.shutdown().await;
        result?;
        info!(user = MONITORING_USER, "created monitoring user");
        Ok(())
    }
}

fn members_bson(members: &[ReplicaSetMember]) -> Vec<Document> {
    members
        .iter()
        .map(|m| {
            let mut d = doc! {
                "_id": m.id,
                "host": &m.host,
                "priority": m.priority,
            };
            if m.arbiter_only {
                d.insert("arbiterOnly", true);
            }
            d
        })
        .collect()
}

/// Extract member count and term from a `replSetGetStatus` reply.
fn parse_status(status: &Document) -> Result<ReplicaSetObservation, String> {
    let ok = match status.get("ok") {
        Some(Bson::Double(v)) => *v,
        Some(Bson::Int32(v)) => f64::from(*v),
        Some(Bson::Int64(v)) => *v as f64,
        _ => return Err("missing numeric \"ok\" field".to_string()),
    };
    if ok != 1.0 {
        return Ok(ReplicaSetObservation::Uninitialized);
    }
    let member_count = status
        .get_array("members")
        .map_err(|_| "missing \"members\" array".to_string())?
        .len();
    let term = match status.get("term") {
        Some(Bson::Int64(v)) => *v,
        Some(Bson::Int32(v)) => i64::from(*v),
        _ => return Err("missing numeric \"term\" field".to_string()),
    };
    debug!(member_count, term, "observed replica set status");
    Ok(ReplicaSetObservation::Reachable { member_count, term })
}

/// Classify a driver error against a known target address.
fn classify_connect(target: &str, err: mongodb::error::Error) -> DbError {
    match err.kind.as_ref() {
        ErrorKind::Command(ce)
            if ce.code == CODE_NOT_YET_INITIALIZED || ce.code == CODE_INVALID_REPLSET_CONFIG =>
        {
            DbError::NotInitialized { code: ce.code }
        }
        ErrorKind::ServerSelection { message, .. } => DbError::Connect {
            target: target.to_string(),
            reason: message.clone(),
        },
        ErrorKind::Io(io) => DbError::Connect {
            target: target.to_string(),
            reason: io.to_string(),
        },
        ErrorKind::DnsResolve { message, .. } => DbError::Connect {
            target: target.to_string(),
            reason: message.clone(),
        },
        _ => DbError::Driver(err),
    }
}

#[cfg(test)]
#[path = "mongo_tests.rs"]
mod mongo_tests;
