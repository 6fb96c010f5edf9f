use std::time::Duration;

/// Port used when none is configured.
pub const DEFAULT_PORT: u16 = 4440;

/// Host servers listen on by default (every interface).
pub const DEFAULT_SERVER_HOST: &str = "*";

/// Host clients dial by default.
pub const DEFAULT_CLIENT_HOST: &str = "localhost";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Pause between client reconnection attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Ceiling applied to exponential reconnection backoff.
pub const DEFAULT_MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);

/// Default log filter expression used by the binaries.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub(crate) fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Compact
}
