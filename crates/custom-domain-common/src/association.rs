//! Custom domain association entity and its persisted attribute surface

use crate::defaults::default_enable_www_subdomain;
use crate::identity::AssociationId;
use crate::status::{AssociationStatus, ValidationRecordStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// DNS record the domain owner must publish so the certificate can be issued
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub name: String,
    /// Record type, e.g. `CNAME`
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
    pub status: ValidationRecordStatus,
}

/// Inputs for creating an association
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationRequest {
    pub domain_name: String,
    pub service_arn: String,
    /// Also associate `www.<domain_name>`
    #[serde(default = "default_enable_www_subdomain")]
    pub enable_www_subdomain: bool,
}

impl AssociationRequest {
    pub fn new(domain_name: impl Into<String>, service_arn: impl Into<String>) -> Self {
        Self {
            domain_name: domain_name.into(),
            service_arn: service_arn.into(),
            enable_www_subdomain: default_enable_www_subdomain(),
        }
    }

    pub fn with_www_subdomain(mut self, enable: bool) -> Self {
        self.enable_www_subdomain = enable;
        self
    }

    pub fn id(&self) -> AssociationId {
        AssociationId::new(&self.domain_name, &self.service_arn)
    }
}

/// Binding between a domain name and an App Runner service.
///
/// Every field except `id` and `dns_target` mirrors the last remote
/// observation. `dns_target` comes from the associate response only and is
/// `None` for associations that were read but never created here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    pub id: AssociationId,
    pub dns_target: Option<String>,
    pub enable_www_subdomain: bool,
    pub status: AssociationStatus,
    #[serde(rename = "certificate_validation_records", default)]
    pub validation_records: BTreeSet<ValidationRecord>,
}

impl Association {
    pub fn domain_name(&self) -> &str {
        self.id.domain_name()
    }

    pub fn service_arn(&self) -> &str {
        self.id.service_arn()
    }

    /// Replace observed attributes with a newer observation of the same
    /// association, keeping identity and `dns_target`.
    ///
    /// Returns `false` and leaves `self` untouched if `observed` belongs to a
    /// different association.
    pub fn refresh(&mut self, observed: Association) -> bool {
        if observed.id != self.id {
            return false;
        }
        self.enable_www_subdomain = observed.enable_www_subdomain;
        self.status = observed.status;
        self.validation_records = observed.validation_records;
        if self.dns_target.is_none() {
            self.dns_target = observed.dns_target;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, status: ValidationRecordStatus) -> ValidationRecord {
        ValidationRecord {
            name: name.to_string(),
            kind: "CNAME".to_string(),
            value: format!("{name}.acm-validations.aws."),
            status,
        }
    }

    fn association(status: AssociationStatus) -> Association {
        Association {
            id: AssociationId::new("example.com", "svc-1"),
            dns_target: Some("abc.awsapprunner.com".to_string()),
            enable_www_subdomain: true,
            status,
            validation_records: BTreeSet::from([record(
                "_a1.example.com",
                ValidationRecordStatus::PendingValidation,
            )]),
        }
    }

    #[test]
    fn test_request_defaults_to_www_subdomain() {
        let request: AssociationRequest =
            serde_json::from_str(r#"{"domain_name": "example.com", "service_arn": "svc-1"}"#)
                .unwrap();
        assert!(request.enable_www_subdomain);
        assert_eq!(request, AssociationRequest::new("example.com", "svc-1"));
        assert_eq!(request.id().to_string(), "example.com,svc-1");
    }

    #[test]
    fn test_refresh_keeps_dns_target_and_replaces_records() {
        let mut stored = association(AssociationStatus::PendingCertificateDnsValidation);

        let mut observed = association(AssociationStatus::Active);
        observed.dns_target = None;
        observed.validation_records = BTreeSet::from([
            record("_a1.example.com", ValidationRecordStatus::Success),
            record("_b2.www.example.com", ValidationRecordStatus::Success),
        ]);

        assert!(stored.refresh(observed));
        assert_eq!(stored.status, AssociationStatus::Active);
        assert_eq!(stored.dns_target.as_deref(), Some("abc.awsapprunner.com"));
        assert_eq!(stored.validation_records.len(), 2);
    }

    #[test]
    fn test_refresh_ignores_other_identity() {
        let mut stored = association(AssociationStatus::Creating);
        let mut other = association(AssociationStatus::Active);
        other.id = AssociationId::new("other.com", "svc-1");

        assert!(!stored.refresh(other));
        assert_eq!(stored.status, AssociationStatus::Creating);
    }

    #[test]
    fn test_validation_records_compare_as_set() {
        let a = BTreeSet::from([
            record("x", ValidationRecordStatus::Success),
            record("y", ValidationRecordStatus::Failed),
        ]);
        let b = BTreeSet::from([
            record("y", ValidationRecordStatus::Failed),
            record("x", ValidationRecordStatus::Success),
        ]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_persisted_attribute_names() {
        let json = serde_json::to_value(association(AssociationStatus::Active)).unwrap();
        assert_eq!(json["id"], "example.com,svc-1");
        assert_eq!(json["dns_target"], "abc.awsapprunner.com");
        assert_eq!(json["status"], "active");
        assert_eq!(json["enable_www_subdomain"], true);
        let records = json["certificate_validation_records"].as_array().unwrap();
        assert_eq!(records[0]["type"], "CNAME");
        assert_eq!(records[0]["status"], "PENDING_VALIDATION");
    }
}
