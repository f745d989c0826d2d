//! Contract for the remote custom domain API
//!
//! The reconciler never builds wire requests itself. A transport implements
//! [`AssociationClient`] and maps its failures onto [`ClientError`], using
//! [`classify_remote_error`] so "not found" is recognised by kind.

use custom_domain_common::{AssociationRequest, AssociationStatus, ValidationRecord};
use std::collections::BTreeSet;
use std::future::Future;
use thiserror::Error;

/// Failure of a single remote call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The remote side has no record of the association
    #[error("custom domain association not found: {message}")]
    NotFound { message: String },

    /// Any other transport or API failure, surfaced verbatim
    #[error("{message}")]
    Remote {
        code: Option<String>,
        message: String,
    },
}

impl ClientError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            code: None,
            message: message.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound { .. })
    }

    /// API error code, if the transport reported one
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::NotFound { .. } => None,
            ClientError::Remote { code, .. } => code.as_deref(),
        }
    }
}

/// Known API error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &["ResourceNotFoundException", "ResourceNotFound"];

/// Classify a remote API error using its error code.
pub fn classify_remote_error(code: Option<&str>, message: Option<&str>) -> ClientError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => ClientError::NotFound { message },
        _ => ClientError::Remote {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Response to an accepted associate call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociateOutput {
    /// Hostname the domain owner points their CNAME at
    pub dns_target: String,
    pub status: AssociationStatus,
}

/// Remote view of one custom domain on a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomDomain {
    pub domain_name: String,
    pub enable_www_subdomain: bool,
    pub status: AssociationStatus,
    pub validation_records: BTreeSet<ValidationRecord>,
}

/// Remote operations on custom domain associations.
///
/// Implementations must not retry internally on behalf of the reconciler
/// beyond what the transport already does for transient failures.
pub trait AssociationClient: Send + Sync {
    /// Start associating `request.domain_name` with `request.service_arn`
    fn associate(
        &self,
        request: &AssociationRequest,
    ) -> impl Future<Output = Result<AssociateOutput, ClientError>> + Send;

    /// Fetch the current remote view; `NotFound` if there is none
    fn describe(
        &self,
        domain_name: &str,
        service_arn: &str,
    ) -> impl Future<Output = Result<CustomDomain, ClientError>> + Send;

    /// Start removing the association; `NotFound` if it is already gone
    fn disassociate(
        &self,
        domain_name: &str,
        service_arn: &str,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}
