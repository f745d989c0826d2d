//! Test fixtures
//!
//! Provides unique run IDs and sample associations so that tests running
//! concurrently never share a domain name.

use chrono::Utc;
use custom_domain_common::{AssociationRequest, ValidationRecord, ValidationRecordStatus};

/// Service ARN used by fixtures
pub const TEST_SERVICE_ARN: &str =
    "arn:aws:apprunner:us-east-2:123456789012:service/test-svc/8fe1e10304f84fd2b0df550fe98a71fa";

/// Generate a unique run ID for test resources.
///
/// Format: `test-{timestamp_ms}-{counter}`.
///
/// # Example
///
/// ```
/// use custom_domain_test_utils::fixtures::test_run_id;
///
/// let run_id = test_run_id();
/// assert!(run_id.starts_with("test-"));
/// ```
pub fn test_run_id() -> String {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    let ts = Utc::now().timestamp_millis();
    let counter = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("test-{}-{}", ts, counter)
}

/// Unique domain name under `example.com`
pub fn test_domain() -> String {
    format!("{}.example.com", test_run_id())
}

/// Association request for a fresh domain on [`TEST_SERVICE_ARN`]
pub fn test_request() -> AssociationRequest {
    AssociationRequest::new(test_domain(), TEST_SERVICE_ARN)
}

/// CNAME validation record for `domain_name` still awaiting DNS
pub fn pending_validation_record(domain_name: &str) -> ValidationRecord {
    ValidationRecord {
        name: format!("_a79865eb4cd1a6ab990a45779b4e0b96.{domain_name}."),
        kind: "CNAME".to_string(),
        value: "_1bf5d4a1a2ae7bc2a6b8f6c6b2d7b4e0.mhbtsbpdnt.acm-validations.aws.".to_string(),
        status: ValidationRecordStatus::PendingValidation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_id_format() {
        let run_id = test_run_id();
        let parts: Vec<&str> = run_id.strip_prefix("test-").unwrap().split('-').collect();
        assert_eq!(parts.len(), 2);
        parts[0].parse::<i64>().expect("Should be valid timestamp");
        parts[1].parse::<u32>().expect("Should be valid counter");
    }

    #[test]
    fn test_domains_are_unique() {
        assert_ne!(test_domain(), test_domain());
    }

    #[test]
    fn test_request_identity() {
        let request = test_request();
        let id = request.id();
        assert_eq!(id.service_arn(), TEST_SERVICE_ARN);
        assert!(id.domain_name().ends_with(".example.com"));
        assert!(request.enable_www_subdomain);
    }

    #[test]
    fn test_validation_record_targets_domain() {
        let record = pending_validation_record("app.example.com");
        assert!(record.name.ends_with(".app.example.com."));
        assert_eq!(record.status, ValidationRecordStatus::PendingValidation);
    }
}
