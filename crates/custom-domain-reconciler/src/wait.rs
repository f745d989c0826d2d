//! Polling a remote resource until it settles.
//!
//! [`Waiter`] repeatedly calls a probe that reports either a status or
//! [`Observation::Absent`] and stops when the observation lands in its success
//! set, its failure set, or the deadline would be crossed by the next poll.
//!
//! Probe errors are returned immediately; retrying individual remote calls is
//! the transport's job, not the waiter's.

use backon::{BackoffBuilder, ExponentialBackoff, ExponentialBuilder};
use custom_domain_common::defaults::{DEFAULT_CREATE_TIMEOUT_SECS, DEFAULT_POLL_INTERVAL_SECS};
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// One look at the remote resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Observation<S> {
    /// Resource exists with this status
    Status(S),
    /// Remote side has no record of the resource
    Absent,
}

impl<S> Observation<S> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Observation::Absent)
    }
}

impl<S: fmt::Display> fmt::Display for Observation<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observation::Status(status) => status.fmt(f),
            Observation::Absent => f.write_str("absent"),
        }
    }
}

/// How the delay between polls evolves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Always wait `poll_interval`
    Fixed,
    /// Start at `poll_interval`, double up to `max_delay`
    Exponential { max_delay: Duration, jitter: bool },
}

/// Timing for a single wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitConfig {
    /// Delay between polls (initial delay under exponential backoff)
    pub poll_interval: Duration,
    /// Maximum total time to wait before timing out
    pub timeout: Duration,
    pub backoff: Backoff,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self::fixed(
            Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            Duration::from_secs(DEFAULT_CREATE_TIMEOUT_SECS),
        )
    }
}

impl WaitConfig {
    pub fn fixed(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval,
            timeout,
            backoff: Backoff::Fixed,
        }
    }

    pub fn exponential(initial_delay: Duration, max_delay: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval: initial_delay,
            timeout,
            backoff: Backoff::Exponential {
                max_delay,
                jitter: true,
            },
        }
    }
}

/// Delay schedule for one wait
enum Delays {
    Fixed(Duration),
    Exponential {
        backoff: ExponentialBackoff,
        cap: Duration,
    },
}

impl Delays {
    fn new(config: &WaitConfig) -> Self {
        match config.backoff {
            Backoff::Fixed => Delays::Fixed(config.poll_interval),
            Backoff::Exponential { max_delay, jitter } => {
                let mut builder = ExponentialBuilder::default()
                    .with_min_delay(config.poll_interval)
                    .with_max_delay(max_delay)
                    .with_factor(2.0);
                if jitter {
                    builder = builder.with_jitter();
                }
                Delays::Exponential {
                    backoff: builder.build(),
                    cap: max_delay,
                }
            }
        }
    }

    fn next_delay(&mut self) -> Duration {
        match self {
            Delays::Fixed(delay) => *delay,
            // The builder gives up after a few steps; keep polling at the cap.
            Delays::Exponential { backoff, cap } => backoff.next().unwrap_or(*cap),
        }
    }
}

/// Where a wait stands after an observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitState<S> {
    /// Not settled, poll again if the deadline allows
    Polling,
    /// Observation is in the success set
    Succeeded,
    /// Observation is a terminal failure status
    Failed(S),
}

/// Successful end of a wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitOutcome<S> {
    /// The observation that satisfied the success set
    pub observation: Observation<S>,
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Unsuccessful end of a wait
#[derive(Debug, Error)]
pub enum WaitError<S, E> {
    /// Remote side reported a terminal failure status
    #[error("{resource} entered failure status {status} after {attempts} attempts")]
    Failed {
        resource: String,
        status: S,
        attempts: u32,
    },

    /// Deadline reached; the remote operation may still complete later
    #[error("timeout waiting for {resource} after {timeout:?} ({attempts} attempts)")]
    TimedOut {
        resource: String,
        last: Option<Observation<S>>,
        attempts: u32,
        timeout: Duration,
    },

    /// Probe itself failed
    #[error("checking {resource} failed after {attempts} attempts")]
    Probe {
        resource: String,
        #[source]
        source: E,
        last: Option<Observation<S>>,
        attempts: u32,
    },

    /// Cancellation token fired
    #[error("wait for {resource} cancelled after {attempts} attempts")]
    Cancelled {
        resource: String,
        last: Option<Observation<S>>,
        attempts: u32,
    },
}

impl<S, E> WaitError<S, E> {
    /// Number of probes issued before the wait ended
    pub fn attempts(&self) -> u32 {
        match self {
            WaitError::Failed { attempts, .. }
            | WaitError::TimedOut { attempts, .. }
            | WaitError::Probe { attempts, .. }
            | WaitError::Cancelled { attempts, .. } => *attempts,
        }
    }
}

/// Polling state machine: `Polling` until `Succeeded`, `Failed` or the deadline.
///
/// # Example
/// ```ignore
/// let outcome = Waiter::new("custom domain example.com", WaitConfig::default())
///     .succeed_on(AssociationStatus::Active)
///     .fail_on(AssociationStatus::CreateFailed)
///     .wait(|| async { client.observe().await })
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct Waiter<S> {
    resource: String,
    config: WaitConfig,
    success: HashSet<Observation<S>>,
    failure: HashSet<S>,
    cancel: Option<CancellationToken>,
}

impl<S> Waiter<S>
where
    S: Clone + Eq + Hash + fmt::Display + fmt::Debug,
{
    /// `resource` names the waited-on thing in errors and logs
    pub fn new(resource: impl Into<String>, config: WaitConfig) -> Self {
        Self {
            resource: resource.into(),
            config,
            success: HashSet::new(),
            failure: HashSet::new(),
            cancel: None,
        }
    }

    pub fn succeed_on(mut self, status: S) -> Self {
        self.success.insert(Observation::Status(status));
        self
    }

    pub fn succeed_on_absent(mut self) -> Self {
        self.success.insert(Observation::Absent);
        self
    }

    pub fn fail_on(mut self, status: S) -> Self {
        self.failure.insert(status);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Classify one observation; the deadline is checked by [`Waiter::wait`].
    pub fn classify(&self, observation: &Observation<S>) -> WaitState<S> {
        if self.success.contains(observation) {
            return WaitState::Succeeded;
        }
        match observation {
            Observation::Status(status) if self.failure.contains(status) => {
                WaitState::Failed(status.clone())
            }
            _ => WaitState::Polling,
        }
    }

    /// Poll `probe` until the wait settles.
    ///
    /// The waiter never sleeps past the deadline: once the next poll would
    /// land after it, the wait ends with [`WaitError::TimedOut`]. With a fixed
    /// interval that is `floor(timeout / poll_interval) + 1` probes.
    pub async fn wait<F, Fut, E>(&self, mut probe: F) -> Result<WaitOutcome<S>, WaitError<S, E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Observation<S>, E>>,
        E: fmt::Display,
    {
        let start = Instant::now();
        let mut delays = Delays::new(&self.config);
        let mut attempts = 0u32;
        let mut last: Option<Observation<S>> = None;

        loop {
            if self.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
                return Err(WaitError::Cancelled {
                    resource: self.resource.clone(),
                    last,
                    attempts,
                });
            }

            attempts += 1;
            let observation = match probe().await {
                Ok(observation) => observation,
                Err(e) => {
                    warn!(resource = %self.resource, attempts, error = %e, "Status check failed");
                    return Err(WaitError::Probe {
                        resource: self.resource.clone(),
                        source: e,
                        last,
                        attempts,
                    });
                }
            };

            match self.classify(&observation) {
                WaitState::Succeeded => {
                    debug!(resource = %self.resource, attempts, observed = %observation, "Resource settled");
                    return Ok(WaitOutcome {
                        observation,
                        attempts,
                        elapsed: start.elapsed(),
                    });
                }
                WaitState::Failed(status) => {
                    warn!(resource = %self.resource, attempts, status = %status, "Resource entered failure status");
                    return Err(WaitError::Failed {
                        resource: self.resource.clone(),
                        status,
                        attempts,
                    });
                }
                WaitState::Polling => {}
            }

            let delay = delays.next_delay();
            if start
                .elapsed()
                .checked_add(delay)
                .is_none_or(|next| next > self.config.timeout)
            {
                warn!(
                    resource = %self.resource,
                    attempts,
                    observed = %observation,
                    timeout_ms = self.config.timeout.as_millis(),
                    "Timeout waiting for resource"
                );
                return Err(WaitError::TimedOut {
                    resource: self.resource.clone(),
                    last: Some(observation),
                    attempts,
                    timeout: self.config.timeout,
                });
            }

            debug!(
                resource = %self.resource,
                attempt = attempts,
                observed = %observation,
                delay_ms = delay.as_millis(),
                "Resource not settled, polling again"
            );
            last = Some(observation);

            match &self.cancel {
                Some(token) => {
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = token.cancelled() => {
                            return Err(WaitError::Cancelled {
                                resource: self.resource.clone(),
                                last,
                                attempts,
                            });
                        }
                    }
                }
                None => tokio::time::sleep(delay).await,
            }
        }
    }
}
