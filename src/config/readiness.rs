use std::time::Duration;

use serde::Deserialize;

/// Readiness-probe polling policy.
///
/// Daemons start asynchronously; their control plane answers only after an
/// unpredictable warm-up. The probe polls on a short fixed interval and
/// reports a diagnostic every `log_every_failures` consecutive misses so a
/// hung cluster is observable rather than silently stuck.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ReadinessPolicy {
    #[serde(default = "default_poll_interval_in_ms")]
    pub poll_interval_in_ms: u64,

    #[serde(default = "default_log_every_failures")]
    pub log_every_failures: u64,

    /// Maximum total wait (unit: milliseconds, 0 means unlimited).
    #[serde(default = "default_max_wait_in_ms")]
    pub max_wait_in_ms: u64,
}

impl ReadinessPolicy {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_in_ms)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        if self.max_wait_in_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.max_wait_in_ms))
        }
    }
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            poll_interval_in_ms: default_poll_interval_in_ms(),
            log_every_failures: default_log_every_failures(),
            max_wait_in_ms: default_max_wait_in_ms(),
        }
    }
}

fn default_poll_interval_in_ms() -> u64 {
    100
}
fn default_log_every_failures() -> u64 {
    40
}
fn default_max_wait_in_ms() -> u64 {
    0
}
