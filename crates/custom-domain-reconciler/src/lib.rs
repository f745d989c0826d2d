//! custom-domain-reconciler - Lifecycle management of App Runner custom domain associations
//!
//! Drives an association between a domain name and a service through its
//! asynchronous remote lifecycle: create and wait until active, refresh,
//! and delete and wait until gone.
//!
//! ## Modules
//!
//! - [`client`]: Remote API contract implemented by a transport
//! - [`config`]: JSON configuration of wait timing
//! - [`error`]: Reconciliation error taxonomy
//! - [`reconciler`]: Create, read and delete operations
//! - [`wait`]: Generic status-polling waiter

pub mod client;
pub mod config;
pub mod error;
pub mod reconciler;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod wait;

// Re-export commonly used types
pub use client::{AssociateOutput, AssociationClient, ClientError, CustomDomain};
pub use config::{ConfigError, ReconcilerConfig, WaitSettings};
pub use error::{Accepted, CreateError, Operation, Phase, ReconcileError};
pub use reconciler::{DeleteOutcome, ReadContext, ReadOutcome, Reconciler};
pub use wait::{Backoff, Observation, WaitConfig, WaitError, Waiter};
