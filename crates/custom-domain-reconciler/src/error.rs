//! Reconciliation errors
//!
//! Every variant names the association it concerns so a caller holding many
//! associations can attribute the failure without extra bookkeeping.

use crate::client::ClientError;
use crate::wait::Observation;
use custom_domain_common::{AssociationId, AssociationStatus, IdentityError};
use std::time::Duration;
use thiserror::Error;

/// Remote call that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
    Associating,
    Describing,
    Disassociating,
}

/// Which transition a wait was driving
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    Creation,
    Deletion,
}

/// Failure of a create, read or delete
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Identity string could not be decoded; retrying will not help
    #[error(transparent)]
    MalformedIdentity(#[from] IdentityError),

    /// Remote call failed; the whole operation may be retried
    #[error("{operation} App Runner custom domain association ({id}): {source}")]
    Remote {
        id: AssociationId,
        operation: Operation,
        #[source]
        source: ClientError,
    },

    /// Describe reported nothing right after the creation wait succeeded
    #[error("reading App Runner custom domain association ({id}): not found after creation")]
    PostCreateNotFound { id: AssociationId },

    /// Remote side reported `create_failed` or `delete_failed`
    #[error("App Runner custom domain association ({id}) {phase} failed: status {status}")]
    TerminalFailure {
        id: AssociationId,
        phase: Phase,
        status: AssociationStatus,
    },

    /// Deadline passed; the remote operation may still complete
    #[error(
        "timeout waiting for App Runner custom domain association ({id}) {phase} after {timeout:?} (last observed: {})",
        describe_last(.last_observed)
    )]
    Timeout {
        id: AssociationId,
        phase: Phase,
        last_observed: Option<Observation<AssociationStatus>>,
        timeout: Duration,
    },

    /// Describe failed while waiting
    #[error(
        "waiting for App Runner custom domain association ({id}) {phase} (last observed: {}): {source}",
        describe_last(.last_observed)
    )]
    Probe {
        id: AssociationId,
        phase: Phase,
        last_observed: Option<Observation<AssociationStatus>>,
        #[source]
        source: ClientError,
    },

    /// Wait cancelled by the caller; outcome unknown
    #[error("waiting for App Runner custom domain association ({id}) {phase} cancelled")]
    Cancelled {
        id: AssociationId,
        phase: Phase,
        last_observed: Option<Observation<AssociationStatus>>,
    },
}

fn describe_last(last: &Option<Observation<AssociationStatus>>) -> String {
    last.as_ref()
        .map_or_else(|| "nothing".to_string(), ToString::to_string)
}

impl ReconcileError {
    /// Association the error concerns, if the identity could be decoded
    pub fn identity(&self) -> Option<&AssociationId> {
        match self {
            ReconcileError::MalformedIdentity(_) => None,
            ReconcileError::Remote { id, .. }
            | ReconcileError::PostCreateNotFound { id }
            | ReconcileError::TerminalFailure { id, .. }
            | ReconcileError::Timeout { id, .. }
            | ReconcileError::Probe { id, .. }
            | ReconcileError::Cancelled { id, .. } => Some(id),
        }
    }

    /// Whether re-running the whole operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReconcileError::Remote { .. }
                | ReconcileError::Timeout { .. }
                | ReconcileError::Probe { .. }
                | ReconcileError::Cancelled { .. }
        )
    }

    /// Whether the remote outcome is unknown (it may still complete later)
    pub fn is_outcome_unknown(&self) -> bool {
        matches!(
            self,
            ReconcileError::Timeout { .. } | ReconcileError::Cancelled { .. }
        )
    }

    /// Last status seen while waiting, for wait-related failures
    pub fn last_observed(&self) -> Option<&Observation<AssociationStatus>> {
        match self {
            ReconcileError::Timeout { last_observed, .. }
            | ReconcileError::Probe { last_observed, .. }
            | ReconcileError::Cancelled { last_observed, .. } => last_observed.as_ref(),
            _ => None,
        }
    }
}

/// State recorded once an associate call has been accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub id: AssociationId,
    pub dns_target: String,
}

/// Failure of a create.
///
/// When `accepted` is set the association exists remotely in some state and
/// the caller should keep the identity, so that a later read or delete can
/// reach it. Nothing is rolled back.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct CreateError {
    pub accepted: Option<Accepted>,
    pub error: ReconcileError,
}

impl CreateError {
    /// Associate itself failed; nothing exists remotely
    pub(crate) fn rejected(error: ReconcileError) -> Self {
        Self {
            accepted: None,
            error,
        }
    }

    /// Associate was accepted but the association did not settle
    pub(crate) fn after_accept(accepted: Accepted, error: ReconcileError) -> Self {
        Self {
            accepted: Some(accepted),
            error,
        }
    }

    /// Identity the caller should keep in state, if any
    pub fn recorded_identity(&self) -> Option<&AssociationId> {
        self.accepted.as_ref().map(|a| &a.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> AssociationId {
        AssociationId::new("example.com", "svc-1")
    }

    #[test]
    fn test_remote_error_display() {
        let err = ReconcileError::Remote {
            id: id(),
            operation: Operation::Associating,
            source: ClientError::remote("InvalidRequestException: bad arn"),
        };
        assert_eq!(
            err.to_string(),
            "associating App Runner custom domain association (example.com,svc-1): InvalidRequestException: bad arn"
        );
        assert!(err.is_retryable());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_timeout_reports_last_observation() {
        let err = ReconcileError::Timeout {
            id: id(),
            phase: Phase::Creation,
            last_observed: Some(Observation::Status(AssociationStatus::Creating)),
            timeout: Duration::from_secs(300),
        };
        let msg = err.to_string();
        assert!(msg.contains("example.com,svc-1"));
        assert!(msg.contains("creation"));
        assert!(msg.contains("last observed: creating"));
        assert!(err.is_outcome_unknown());
        assert_eq!(
            err.last_observed(),
            Some(&Observation::Status(AssociationStatus::Creating))
        );
    }

    #[test]
    fn test_probe_error_without_observation() {
        let err = ReconcileError::Probe {
            id: id(),
            phase: Phase::Deletion,
            last_observed: None,
            source: ClientError::remote("connection reset"),
        };
        assert!(err.to_string().contains("last observed: nothing"));
        assert!(err.to_string().ends_with("connection reset"));
    }

    #[test]
    fn test_terminal_failure_is_not_retryable() {
        let err = ReconcileError::TerminalFailure {
            id: id(),
            phase: Phase::Deletion,
            status: AssociationStatus::DeleteFailed,
        };
        assert!(!err.is_retryable());
        assert!(!err.is_outcome_unknown());
        assert!(err.to_string().contains("deletion failed: status delete_failed"));
    }

    #[test]
    fn test_identity() {
        let malformed: ReconcileError = "nope".parse::<AssociationId>().unwrap_err().into();
        assert!(malformed.identity().is_none());
        assert!(!malformed.is_retryable());

        let err = ReconcileError::PostCreateNotFound { id: id() };
        assert_eq!(err.identity(), Some(&id()));
    }

    #[test]
    fn test_create_error_records_identity_only_after_accept() {
        let rejected = CreateError::rejected(ReconcileError::Remote {
            id: id(),
            operation: Operation::Associating,
            source: ClientError::remote("denied"),
        });
        assert!(rejected.recorded_identity().is_none());

        let accepted = CreateError::after_accept(
            Accepted {
                id: id(),
                dns_target: "abc.awsapprunner.com".to_string(),
            },
            ReconcileError::PostCreateNotFound { id: id() },
        );
        assert_eq!(accepted.recorded_identity(), Some(&id()));
        assert_eq!(accepted.to_string(), accepted.error.to_string());
    }
}
