//! Composite identity for custom domain associations
//!
//! An association is named by the pair (domain name, service ARN). State
//! stores that pair as a single string joined with [`IDENTITY_DELIMITER`],
//! e.g. `example.com,arn:aws:apprunner:us-east-1:123456789012:service/web/abc`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Separator between the domain name and the service ARN
pub const IDENTITY_DELIMITER: char = ',';

/// Error returned when an identity string cannot be decoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Split did not produce exactly two segments
    #[error("malformed custom domain association id '{id}': expected DOMAIN_NAME,SERVICE_ARN")]
    WrongSegmentCount { id: String },

    /// One of the two segments is empty
    #[error("malformed custom domain association id '{id}': {segment} is empty")]
    EmptySegment { id: String, segment: &'static str },
}

/// Encode the two key fields into an identity string.
pub fn encode(domain_name: &str, service_arn: &str) -> String {
    format!("{domain_name}{IDENTITY_DELIMITER}{service_arn}")
}

/// Decode an identity string into `(domain_name, service_arn)`.
///
/// Fails unless the string splits into exactly two non-empty segments. The
/// segments themselves are not validated.
pub fn decode(id: &str) -> Result<(&str, &str), IdentityError> {
    let mut parts = id.split(IDENTITY_DELIMITER);
    let (Some(domain_name), Some(service_arn), None) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(IdentityError::WrongSegmentCount { id: id.to_string() });
    };

    if domain_name.is_empty() {
        return Err(IdentityError::EmptySegment {
            id: id.to_string(),
            segment: "domain name",
        });
    }
    if service_arn.is_empty() {
        return Err(IdentityError::EmptySegment {
            id: id.to_string(),
            segment: "service ARN",
        });
    }

    Ok((domain_name, service_arn))
}

/// Decoded identity of a custom domain association.
///
/// Immutable once constructed; a different domain or service is a different
/// association.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssociationId {
    domain_name: String,
    service_arn: String,
}

impl AssociationId {
    pub fn new(domain_name: impl Into<String>, service_arn: impl Into<String>) -> Self {
        Self {
            domain_name: domain_name.into(),
            service_arn: service_arn.into(),
        }
    }

    pub fn domain_name(&self) -> &str {
        &self.domain_name
    }

    pub fn service_arn(&self) -> &str {
        &self.service_arn
    }

    /// Encoded form as persisted in state
    pub fn encode(&self) -> String {
        encode(&self.domain_name, &self.service_arn)
    }
}

impl fmt::Display for AssociationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{IDENTITY_DELIMITER}{}", self.domain_name, self.service_arn)
    }
}

impl FromStr for AssociationId {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (domain_name, service_arn) = decode(s)?;
        Ok(Self::new(domain_name, service_arn))
    }
}

impl Serialize for AssociationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AssociationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
