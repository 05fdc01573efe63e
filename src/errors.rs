// Copyright (c) 2025 The mongo-operator Authors
// SPDX-License-Identifier: MIT

//! Error types for MongoDB cluster reconciliation.
//!
//! This module provides specialized error types for:
//! - Kubernetes API operations (typed, so callers can match on NotFound)
//! - Database control-plane operations (replica set admin commands)
//! - TLS input validation
//! - Storage expansion sequencing
//!
//! Every branch decision the reconciler takes is driven by a typed variant
//! here, never by matching on error message strings.

use thiserror::Error;

use crate::crd::ClusterPhase;

/// Errors from database control-plane operations.
///
/// These classify failures of the administrative commands the operator runs
/// against the replica set (initiate, status, reconfig, user management).
#[derive(Error, Debug)]
pub enum DbError {
    /// The database is unreachable (server selection, I/O, DNS, timeout).
    ///
    /// All connectivity failures collapse into this one variant; the
    /// reconciler treats them uniformly as a transient wait.
    #[error("cannot reach {target}: {reason}")]
    Connect {
        /// The target address (never carries credentials)
        target: String,
        /// Driver-reported reason for the failure
        reason: String,
    },

    /// The replica set has not been initiated yet.
    ///
    /// Mapped from server error codes 94 (`NotYetInitialized`) and
    /// 93 (`InvalidReplicaSetConfig`). Both mean the same thing to the
    /// reconciler: proceed with `replSetInitiate`.
    #[error("replica set not initiated (server code {code})")]
    NotInitialized {
        /// The server error code that signalled the state
        code: i32,
    },

    /// A command succeeded at the wire level but returned a document the
    /// operator cannot interpret (missing `ok`, missing `members`, etc).
    #[error("unexpected response to {command}: {reason}")]
    UnexpectedResponse {
        /// The admin command that was issued
        command: &'static str,
        /// What was missing or malformed
        reason: String,
    },

    /// Any other driver error (authentication, command failures with
    /// unrecognized codes, BSON access).
    #[error("database driver error: {0}")]
    Driver(#[from] mongodb::error::Error),
}

impl DbError {
    /// Returns true if this error means the database could not be reached
    /// at all, as opposed to reaching it and being told something.
    #[must_use]
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Connect { .. })
    }
}

/// Composite error type for reconciliation.
///
/// This is the error type the reconciler and its helpers return. The
/// controller's error policy only logs and requeues; the variants exist so
/// intermediate code can branch without string inspection.
#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error.
    #[error("kubernetes api error: {0}")]
    Kube(#[from] kube::Error),

    /// Database control-plane error.
    #[error(transparent)]
    Db(#[from] DbError),

    /// The storage expansion coordinator was invoked outside the
    /// `Expanding` phase. The expansion path rewrites pods and claims in
    /// place and must only run once the phase records that intent.
    #[error("storage expansion requires phase Expanding, current phase is {phase:?}")]
    ExpansionGuard {
        /// The phase the cluster was actually in
        phase: Option<ClusterPhase>,
    },

    /// User-provided TLS input is present but malformed (terminal until
    /// the user edits the referenced secret or config map).
    #[error("invalid TLS configuration: {reason}")]
    TlsValidation {
        /// Explanation of what is invalid
        reason: String,
    },

    /// A referenced object exists but lacks a key or field the operator
    /// needs (e.g. a secret without the expected key).
    #[error("{object} is missing required {field}")]
    MissingField {
        /// The object that was inspected
        object: String,
        /// The key or field that was absent
        field: String,
    },

    /// Waited longer than the configured limit for an external condition.
    #[error("timed out after {waited_secs}s waiting for {condition}")]
    WaitTimeout {
        /// What was being waited on
        condition: String,
        /// How long the loop ran before giving up
        waited_secs: u64,
    },

    /// Generic error for operations that don't fit other categories.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Returns true when the error is a Kubernetes NotFound.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Kube(kube::Error::Api(ae)) if ae.code == 404)
    }
}

/// Convenience alias used throughout the reconcilers.
pub type Result<T, E = Error> = std::result::Result<T, E>;
