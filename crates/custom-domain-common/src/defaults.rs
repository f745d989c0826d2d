//! Default configuration values shared across the workspace

/// Default interval between status polls, in seconds
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Default upper bound for the poll interval under exponential backoff, in seconds
pub const DEFAULT_MAX_POLL_INTERVAL_SECS: u64 = 30;

/// Default deadline for an association to become active, in seconds (5 minutes)
pub const DEFAULT_CREATE_TIMEOUT_SECS: u64 = 300;

/// Default deadline for an association to disappear, in seconds (5 minutes)
pub const DEFAULT_DELETE_TIMEOUT_SECS: u64 = 300;

/// `www.` subdomain is associated unless the caller opts out
pub const DEFAULT_ENABLE_WWW_SUBDOMAIN: bool = true;

// Serde default functions for struct field defaults

/// Returns the default poll interval
pub fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

/// Returns the default exponential backoff cap
pub fn default_max_poll_interval_secs() -> u64 {
    DEFAULT_MAX_POLL_INTERVAL_SECS
}

/// Returns the default create timeout
pub fn default_create_timeout_secs() -> u64 {
    DEFAULT_CREATE_TIMEOUT_SECS
}

/// Returns the default delete timeout
pub fn default_delete_timeout_secs() -> u64 {
    DEFAULT_DELETE_TIMEOUT_SECS
}

/// Returns the default `enable_www_subdomain` value
pub fn default_enable_www_subdomain() -> bool {
    DEFAULT_ENABLE_WWW_SUBDOMAIN
}
