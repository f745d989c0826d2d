//! Scripted in-memory [`AssociationClient`] for tests

use crate::client::{AssociateOutput, AssociationClient, ClientError, CustomDomain};
use custom_domain_common::{
    AssociationId, AssociationRequest, AssociationStatus, ValidationRecord,
};
use std::collections::{BTreeSet, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// One scripted describe response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescribeStep {
    Status(AssociationStatus),
    NotFound,
    /// Non-"not found" failure with this message
    Fail(String),
}

/// A remote call as the client received it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Associate(AssociationRequest),
    Describe(AssociationId),
    Disassociate(AssociationId),
}

#[derive(Debug)]
struct Script {
    dns_target: String,
    associate_error: Option<ClientError>,
    disassociate_error: Option<ClientError>,
    describe: VecDeque<DescribeStep>,
    after_disassociate: Option<VecDeque<DescribeStep>>,
    validation_records: BTreeSet<ValidationRecord>,
    enable_www_subdomain: bool,
    calls: Vec<Call>,
}

/// Client whose describe responses follow a fixed script.
///
/// Describe pops one step per call and keeps repeating the last step once
/// the script runs dry; an empty script answers "not found".
#[derive(Debug)]
pub struct ScriptedClient {
    script: Mutex<Script>,
}

impl Default for ScriptedClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script {
                dns_target: "test-target.awsapprunner.com".to_string(),
                associate_error: None,
                disassociate_error: None,
                describe: VecDeque::new(),
                after_disassociate: None,
                validation_records: BTreeSet::new(),
                enable_www_subdomain: true,
                calls: Vec::new(),
            }),
        }
    }

    pub fn with_dns_target(self, dns_target: impl Into<String>) -> Self {
        self.lock().dns_target = dns_target.into();
        self
    }

    pub fn with_describe(self, steps: impl IntoIterator<Item = DescribeStep>) -> Self {
        self.lock().describe = steps.into_iter().collect();
        self
    }

    /// Describe script swapped in once a disassociate succeeds
    pub fn with_describe_after_disassociate(
        self,
        steps: impl IntoIterator<Item = DescribeStep>,
    ) -> Self {
        self.lock().after_disassociate = Some(steps.into_iter().collect());
        self
    }

    /// Shorthand for a describe script made only of statuses
    pub fn with_statuses(self, statuses: impl IntoIterator<Item = AssociationStatus>) -> Self {
        self.with_describe(statuses.into_iter().map(DescribeStep::Status))
    }

    pub fn with_validation_records(
        self,
        records: impl IntoIterator<Item = ValidationRecord>,
    ) -> Self {
        self.lock().validation_records = records.into_iter().collect();
        self
    }

    pub fn failing_associate(self, error: ClientError) -> Self {
        self.lock().associate_error = Some(error);
        self
    }

    pub fn failing_disassociate(self, error: ClientError) -> Self {
        self.lock().disassociate_error = Some(error);
        self
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn describe_count(&self) -> usize {
        self.count(|c| matches!(c, Call::Describe(_)))
    }

    pub fn disassociate_count(&self) -> usize {
        self.count(|c| matches!(c, Call::Disassociate(_)))
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| pred(c)).count()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl AssociationClient for ScriptedClient {
    async fn associate(&self, request: &AssociationRequest) -> Result<AssociateOutput, ClientError> {
        let mut script = self.lock();
        script.calls.push(Call::Associate(request.clone()));
        if let Some(e) = &script.associate_error {
            return Err(e.clone());
        }
        script.enable_www_subdomain = request.enable_www_subdomain;
        Ok(AssociateOutput {
            dns_target: script.dns_target.clone(),
            status: AssociationStatus::Creating,
        })
    }

    async fn describe(
        &self,
        domain_name: &str,
        service_arn: &str,
    ) -> Result<CustomDomain, ClientError> {
        let mut script = self.lock();
        script
            .calls
            .push(Call::Describe(AssociationId::new(domain_name, service_arn)));

        let step = if script.describe.len() > 1 {
            script.describe.pop_front()
        } else {
            script.describe.front().cloned()
        };

        match step {
            Some(DescribeStep::Status(status)) => Ok(CustomDomain {
                domain_name: domain_name.to_string(),
                enable_www_subdomain: script.enable_www_subdomain,
                status,
                validation_records: script.validation_records.clone(),
            }),
            Some(DescribeStep::Fail(message)) => Err(ClientError::remote(message)),
            Some(DescribeStep::NotFound) | None => Err(ClientError::not_found(format!(
                "no custom domain {domain_name} on {service_arn}"
            ))),
        }
    }

    async fn disassociate(&self, domain_name: &str, service_arn: &str) -> Result<(), ClientError> {
        let mut script = self.lock();
        script
            .calls
            .push(Call::Disassociate(AssociationId::new(domain_name, service_arn)));
        if let Some(e) = &script.disassociate_error {
            return Err(e.clone());
        }
        if let Some(steps) = script.after_disassociate.take() {
            script.describe = steps;
        }
        Ok(())
    }
}
