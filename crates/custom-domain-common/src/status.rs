//! Remote lifecycle statuses
//!
//! Spellings match the App Runner API so values read from the remote side and
//! values persisted in state compare equal.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a custom domain association as reported remotely
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum AssociationStatus {
    /// Associate accepted, not yet usable
    Creating,
    /// Creation failed remotely
    CreateFailed,
    /// Usable
    Active,
    /// Disassociate accepted, not yet gone
    Deleting,
    /// Deletion failed remotely
    DeleteFailed,
    /// Waiting for the certificate validation records to appear in DNS
    PendingCertificateDnsValidation,
    /// Certificate validated, being attached
    BindingCertificate,
}

/// Verification status of a single certificate validation record
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ValidationRecordStatus {
    PendingValidation,
    Success,
    Failed,
}
