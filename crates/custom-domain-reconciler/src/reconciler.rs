//! Create, read and delete of custom domain associations
//!
//! The remote API accepts associate and disassociate calls long before they
//! take effect, so create and delete each pair the remote call with a
//! [`Waiter`] that polls describe until the association settles.

use crate::client::{AssociationClient, ClientError, CustomDomain};
use crate::config::ReconcilerConfig;
use crate::error::{Accepted, CreateError, Operation, Phase, ReconcileError};
use crate::wait::{Observation, WaitConfig, WaitError, Waiter};
use custom_domain_common::{Association, AssociationId, AssociationRequest, AssociationStatus};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Why a read is happening
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadContext {
    /// Refreshing an association known from earlier state
    Refresh,
    /// Reading back an association whose creation wait just succeeded
    AfterCreate,
}

/// Result of a read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Found(Association),
    /// Remote side has no record; drop local state
    Absent,
}

impl ReadOutcome {
    pub fn into_association(self) -> Option<Association> {
        match self {
            ReadOutcome::Found(association) => Some(association),
            ReadOutcome::Absent => None,
        }
    }
}

/// How a delete confirmed absence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Disassociate was accepted and the deletion wait saw the association vanish
    Deleted,
    /// Disassociate reported the association was already gone
    AlreadyAbsent,
}

/// Drives custom domain associations through the remote API.
///
/// Holds no cache; every observation is a fresh describe call, so one
/// reconciler may serve concurrent operations on different associations.
#[derive(Debug)]
pub struct Reconciler<C> {
    client: C,
    create_wait: WaitConfig,
    delete_wait: WaitConfig,
    cancel: Option<CancellationToken>,
}

impl<C: AssociationClient> Reconciler<C> {
    pub fn new(client: C) -> Self {
        Self::with_config(client, &ReconcilerConfig::default())
    }

    pub fn with_config(client: C, config: &ReconcilerConfig) -> Self {
        Self {
            client,
            create_wait: config.create.wait_config(),
            delete_wait: config.delete.wait_config(),
            cancel: None,
        }
    }

    pub fn with_create_wait(mut self, config: WaitConfig) -> Self {
        self.create_wait = config;
        self
    }

    pub fn with_delete_wait(mut self, config: WaitConfig) -> Self {
        self.delete_wait = config;
        self
    }

    /// Cancel in-flight waits when `token` fires
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Associate a domain with a service and wait for it to become active.
    ///
    /// On a wait failure the returned [`CreateError`] still carries the
    /// identity and DNS target; the association is not rolled back.
    pub async fn create(&self, request: &AssociationRequest) -> Result<Association, CreateError> {
        let id = request.id();
        info!(
            id = %id,
            enable_www_subdomain = request.enable_www_subdomain,
            "Associating App Runner custom domain"
        );

        let output = self.client.associate(request).await.map_err(|source| {
            CreateError::rejected(ReconcileError::Remote {
                id: id.clone(),
                operation: Operation::Associating,
                source,
            })
        })?;
        debug!(id = %id, dns_target = %output.dns_target, status = %output.status, "Associate accepted");

        let accepted = Accepted {
            id: id.clone(),
            dns_target: output.dns_target,
        };

        let waiter = self
            .waiter(&id, Phase::Creation)
            .succeed_on(AssociationStatus::Active)
            .fail_on(AssociationStatus::CreateFailed);
        let (this, id_ref) = (self, &id);
        if let Err(e) = waiter.wait(move || this.observe(id_ref)).await {
            return Err(CreateError::after_accept(
                accepted,
                wait_error(&id, Phase::Creation, e),
            ));
        }

        match self.read_id(&id, ReadContext::AfterCreate).await {
            Ok(ReadOutcome::Found(mut association)) => {
                association.dns_target = Some(accepted.dns_target);
                Ok(association)
            }
            Ok(ReadOutcome::Absent) => Err(CreateError::after_accept(
                accepted,
                ReconcileError::PostCreateNotFound { id },
            )),
            Err(e) => Err(CreateError::after_accept(accepted, e)),
        }
    }

    /// Read the current remote state of the association named by `id`.
    pub async fn read(&self, id: &str, context: ReadContext) -> Result<ReadOutcome, ReconcileError> {
        let id: AssociationId = id.parse()?;
        self.read_id(&id, context).await
    }

    /// Disassociate and wait until the association is gone.
    ///
    /// Idempotent: an association that is already absent is a success.
    pub async fn delete(&self, id: &str) -> Result<DeleteOutcome, ReconcileError> {
        let id: AssociationId = id.parse()?;
        info!(id = %id, "Disassociating App Runner custom domain");

        match self
            .client
            .disassociate(id.domain_name(), id.service_arn())
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                info!(id = %id, "App Runner custom domain association already gone");
                return Ok(DeleteOutcome::AlreadyAbsent);
            }
            Err(source) => {
                return Err(ReconcileError::Remote {
                    id,
                    operation: Operation::Disassociating,
                    source,
                });
            }
        }

        let waiter = self
            .waiter(&id, Phase::Deletion)
            .succeed_on_absent()
            .fail_on(AssociationStatus::DeleteFailed);
        let (this, id_ref) = (self, &id);
        waiter
            .wait(move || this.observe(id_ref))
            .await
            .map_err(|e| wait_error(&id, Phase::Deletion, e))?;

        Ok(DeleteOutcome::Deleted)
    }

    async fn read_id(
        &self,
        id: &AssociationId,
        context: ReadContext,
    ) -> Result<ReadOutcome, ReconcileError> {
        match self.client.describe(id.domain_name(), id.service_arn()).await {
            Ok(domain) => Ok(ReadOutcome::Found(to_association(id, domain))),
            Err(e) if e.is_not_found() => match context {
                ReadContext::AfterCreate => {
                    Err(ReconcileError::PostCreateNotFound { id: id.clone() })
                }
                ReadContext::Refresh => {
                    warn!(id = %id, "App Runner custom domain association not found, removing from state");
                    Ok(ReadOutcome::Absent)
                }
            },
            Err(source) => Err(ReconcileError::Remote {
                id: id.clone(),
                operation: Operation::Describing,
                source,
            }),
        }
    }

    /// Describe as a wait observation; "not found" is [`Observation::Absent`]
    async fn observe(
        &self,
        id: &AssociationId,
    ) -> Result<Observation<AssociationStatus>, ClientError> {
        match self.client.describe(id.domain_name(), id.service_arn()).await {
            Ok(domain) => Ok(Observation::Status(domain.status)),
            Err(e) if e.is_not_found() => Ok(Observation::Absent),
            Err(e) => Err(e),
        }
    }

    fn waiter(&self, id: &AssociationId, phase: Phase) -> Waiter<AssociationStatus> {
        let config = match phase {
            Phase::Creation => self.create_wait.clone(),
            Phase::Deletion => self.delete_wait.clone(),
        };
        let waiter = Waiter::new(
            format!("App Runner custom domain association ({id}) {phase}"),
            config,
        );
        match &self.cancel {
            Some(token) => waiter.with_cancellation(token.clone()),
            None => waiter,
        }
    }
}

/// Map the remote view onto the entity. The identity comes from the caller,
/// never from the response; `dns_target` is only known at creation.
fn to_association(id: &AssociationId, domain: CustomDomain) -> Association {
    Association {
        id: id.clone(),
        dns_target: None,
        enable_www_subdomain: domain.enable_www_subdomain,
        status: domain.status,
        validation_records: domain.validation_records,
    }
}

fn wait_error(
    id: &AssociationId,
    phase: Phase,
    err: WaitError<AssociationStatus, ClientError>,
) -> ReconcileError {
    let id = id.clone();
    match err {
        WaitError::Failed { status, .. } => ReconcileError::TerminalFailure { id, phase, status },
        WaitError::TimedOut { last, timeout, .. } => ReconcileError::Timeout {
            id,
            phase,
            last_observed: last,
            timeout,
        },
        WaitError::Probe { source, last, .. } => ReconcileError::Probe {
            id,
            phase,
            last_observed: last,
            source,
        },
        WaitError::Cancelled { last, .. } => ReconcileError::Cancelled {
            id,
            phase,
            last_observed: last,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, DescribeStep, ScriptedClient};
    use custom_domain_common::{ValidationRecord, ValidationRecordStatus};
    use std::collections::BTreeSet;
    use std::time::Duration;
    use AssociationStatus::*;

    const ID: &str = "example.com,svc-1";

    fn reconciler(client: ScriptedClient) -> Reconciler<ScriptedClient> {
        let wait = WaitConfig::fixed(Duration::from_secs(1), Duration::from_secs(60));
        Reconciler::new(client)
            .with_create_wait(wait.clone())
            .with_delete_wait(wait)
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_maps_remote_fields() {
        let record = ValidationRecord {
            name: "_x1.example.com.".to_string(),
            kind: "CNAME".to_string(),
            value: "_y2.acm-validations.aws.".to_string(),
            status: ValidationRecordStatus::PendingValidation,
        };
        let client = ScriptedClient::new()
            .with_statuses([PendingCertificateDnsValidation])
            .with_validation_records([record.clone()]);

        let outcome = reconciler(client).read(ID, ReadContext::Refresh).await.unwrap();

        let association = outcome.into_association().unwrap();
        assert_eq!(association.id.to_string(), ID);
        assert_eq!(association.status, PendingCertificateDnsValidation);
        assert_eq!(association.dns_target, None);
        assert_eq!(association.validation_records, BTreeSet::from([record]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_not_found_depends_on_context() {
        let r = reconciler(ScriptedClient::new().with_describe([DescribeStep::NotFound]));

        assert_eq!(
            r.read(ID, ReadContext::Refresh).await.unwrap(),
            ReadOutcome::Absent
        );
        let err = r.read(ID, ReadContext::AfterCreate).await.unwrap_err();
        assert!(matches!(err, ReconcileError::PostCreateNotFound { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_surfaces_remote_errors() {
        let r = reconciler(
            ScriptedClient::new().with_describe([DescribeStep::Fail("AccessDenied".into())]),
        );

        let err = r.read(ID, ReadContext::Refresh).await.unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::Remote {
                operation: Operation::Describing,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_identity_makes_no_remote_calls() {
        let r = reconciler(ScriptedClient::new());

        let read = r.read("no-delimiter", ReadContext::Refresh).await.unwrap_err();
        let delete = r.delete("a,b,c").await.unwrap_err();

        assert!(matches!(read, ReconcileError::MalformedIdentity(_)));
        assert!(matches!(delete, ReconcileError::MalformedIdentity(_)));
        assert!(r.client().calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_reads_back_after_wait() {
        let client = ScriptedClient::new()
            .with_dns_target("abc.awsapprunner.com")
            .with_statuses([Creating, Active]);
        let r = reconciler(client);
        let request = AssociationRequest::new("example.com", "svc-1").with_www_subdomain(false);

        let association = r.create(&request).await.unwrap();

        assert_eq!(association.status, Active);
        assert!(!association.enable_www_subdomain);
        let id = AssociationId::new("example.com", "svc-1");
        assert_eq!(
            r.client().calls(),
            vec![
                Call::Associate(request),
                Call::Describe(id.clone()),
                Call::Describe(id.clone()),
                Call::Describe(id),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_vanishing_after_wait_is_post_create_not_found() {
        let client = ScriptedClient::new().with_describe([
            DescribeStep::Status(Active),
            DescribeStep::NotFound,
        ]);

        let err = reconciler(client)
            .create(&AssociationRequest::new("example.com", "svc-1"))
            .await
            .unwrap_err();

        assert!(matches!(err.error, ReconcileError::PostCreateNotFound { .. }));
        assert_eq!(err.recorded_identity().map(ToString::to_string).as_deref(), Some(ID));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_waits_through_deleting() {
        let client = ScriptedClient::new().with_describe([
            DescribeStep::Status(Deleting),
            DescribeStep::Status(Deleting),
            DescribeStep::NotFound,
        ]);
        let r = reconciler(client);

        assert_eq!(r.delete(ID).await.unwrap(), DeleteOutcome::Deleted);
        assert_eq!(r.client().describe_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_failed_status_is_terminal() {
        let client = ScriptedClient::new().with_statuses([Deleting, DeleteFailed]);

        let err = reconciler(client).delete(ID).await.unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::TerminalFailure {
                phase: Phase::Deletion,
                status: DeleteFailed,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_timeout_reports_last_status() {
        let client = ScriptedClient::new().with_statuses([Deleting]);
        let r = reconciler(client);

        let err = r.delete(ID).await.unwrap_err();

        match &err {
            ReconcileError::Timeout {
                id,
                phase,
                last_observed,
                timeout,
            } => {
                assert_eq!(id.to_string(), ID);
                assert_eq!(*phase, Phase::Deletion);
                assert_eq!(last_observed, &Some(Observation::Status(Deleting)));
                assert_eq!(*timeout, Duration::from_secs(60));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        assert!(err.is_outcome_unknown());
        // floor(60s / 1s) + 1
        assert_eq!(r.client().describe_count(), 61);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_describe_failure_during_wait() {
        let client = ScriptedClient::new().with_describe([
            DescribeStep::Status(Deleting),
            DescribeStep::Fail("InternalServiceErrorException".into()),
        ]);

        let err = reconciler(client).delete(ID).await.unwrap_err();

        match &err {
            ReconcileError::Probe {
                phase,
                last_observed,
                source,
                ..
            } => {
                assert_eq!(*phase, Phase::Deletion);
                assert_eq!(last_observed, &Some(Observation::Status(Deleting)));
                assert_eq!(source.to_string(), "InternalServiceErrorException");
            }
            other => panic!("expected describe failure, got {other:?}"),
        }
        assert!(err.is_retryable());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_config_times_out_create() {
        let config = ReconcilerConfig::from_json(
            r#"{"create": {"backoff": "exponential", "poll_interval_secs": 1, "max_poll_interval_secs": 18446744073709551615, "timeout_secs": 18446744073709551615}}"#,
        )
        .unwrap();
        let r = Reconciler::with_config(ScriptedClient::new().with_statuses([Creating]), &config);

        let err = r
            .create(&AssociationRequest::new("example.com", "svc-1"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.error,
            ReconcileError::Timeout {
                phase: Phase::Creation,
                ..
            }
        ));
        assert!(err.accepted.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_surfaces_disassociate_errors() {
        let client = ScriptedClient::new().failing_disassociate(ClientError::remote("throttled"));

        let err = reconciler(client).delete(ID).await.unwrap_err();

        assert!(matches!(
            err,
            ReconcileError::Remote {
                operation: Operation::Disassociating,
                ..
            }
        ));
        assert!(err.is_retryable());
    }
}
