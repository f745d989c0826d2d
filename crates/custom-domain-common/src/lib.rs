//! custom-domain-common - Shared types for custom domain associations
//!
//! Identity codec and entity types used by the reconciler and by anything
//! persisting association state, without async or transport dependencies.
//!
//! ## Modules
//!
//! - [`association`]: The association entity, creation request and validation records
//! - [`defaults`]: Default configuration values
//! - [`identity`]: Composite `DOMAIN_NAME,SERVICE_ARN` identity codec
//! - [`status`]: Remote lifecycle statuses

pub mod association;
pub mod defaults;
pub mod identity;
pub mod status;

// Re-export commonly used types
pub use association::{Association, AssociationRequest, ValidationRecord};
pub use identity::{AssociationId, IDENTITY_DELIMITER, IdentityError};
pub use status::{AssociationStatus, ValidationRecordStatus};
