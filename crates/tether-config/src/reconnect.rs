use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::defaults::{DEFAULT_MAX_RECONNECT_DELAY, DEFAULT_RECONNECT_DELAY};

/// Growth applied to the delay between reconnection attempts.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Backoff {
    /// Every attempt waits the base delay.
    #[default]
    Fixed,
    /// The delay doubles per attempt up to the configured ceiling.
    Exponential,
}

/// How a client paces attempts to reach an unavailable server.
///
/// The default retries forever with a one second pause, so a call only
/// returns once the server answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReconnectPolicy {
    /// Base pause between attempts.
    pub delay: Duration,
    /// Growth strategy for the pause.
    pub backoff: Backoff,
    /// Upper bound for exponential growth.
    pub max_delay: Duration,
    /// Number of failed attempts tolerated before giving up; `None` retries
    /// forever.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_RECONNECT_DELAY)
    }
}

impl ReconnectPolicy {
    /// Unbounded retries with a constant pause.
    #[must_use]
    pub const fn fixed(delay: Duration) -> Self {
        Self {
            delay,
            backoff: Backoff::Fixed,
            max_delay: DEFAULT_MAX_RECONNECT_DELAY,
            max_attempts: None,
        }
    }

    /// Unbounded retries whose pause doubles up to `max_delay`.
    #[must_use]
    pub const fn exponential(initial: Duration, max_delay: Duration) -> Self {
        Self {
            delay: initial,
            backoff: Backoff::Exponential,
            max_delay,
            max_attempts: None,
        }
    }

    /// Caps the number of failed attempts.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Pause to observe after the given zero-based failed attempt.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential => {
                let factor = 1_u32.checked_shl(attempt).unwrap_or(u32::MAX);
                self.delay.saturating_mul(factor).min(self.max_delay)
            }
        }
    }

    /// Whether another attempt is permitted after `failures` failed ones.
    #[must_use]
    pub fn allows(&self, failures: u32) -> bool {
        self.max_attempts.is_none_or(|max| failures < max)
    }
}
