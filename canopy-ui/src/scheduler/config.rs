use std::time::Duration;

use tracing::warn;

pub const DEFAULT_MAX_COMMIT_ATTEMPTS: usize = 1024;
pub const DEFAULT_TELEMETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Tunables shared by every surface of a scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    max_commit_attempts: usize,
    telemetry_interval: Duration,
    enable_state_reconciliation: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_commit_attempts: DEFAULT_MAX_COMMIT_ATTEMPTS,
            telemetry_interval: DEFAULT_TELEMETRY_INTERVAL,
            enable_state_reconciliation: true,
        }
    }
}

impl SchedulerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `CANOPY_MAX_COMMIT_ATTEMPTS`,
    /// `CANOPY_TELEMETRY_INTERVAL_MS` and `CANOPY_STATE_RECONCILIATION`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with a custom variable source.
    /// Unparseable values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(value) = lookup("CANOPY_MAX_COMMIT_ATTEMPTS") {
            match value.trim().parse::<usize>() {
                Ok(attempts) if attempts > 0 => config.max_commit_attempts = attempts,
                _ => warn!(value = %value, "CANOPY_MAX_COMMIT_ATTEMPTS must be a positive integer"),
            }
        }

        if let Some(value) = lookup("CANOPY_TELEMETRY_INTERVAL_MS") {
            match value.trim().parse::<u64>() {
                Ok(millis) => config.telemetry_interval = Duration::from_millis(millis),
                Err(_) => warn!(value = %value, "CANOPY_TELEMETRY_INTERVAL_MS must be milliseconds"),
            }
        }

        if let Some(value) = lookup("CANOPY_STATE_RECONCILIATION") {
            match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => config.enable_state_reconciliation = true,
                "0" | "false" | "no" | "off" => config.enable_state_reconciliation = false,
                _ => warn!(value = %value, "CANOPY_STATE_RECONCILIATION must be a boolean"),
            }
        }

        config
    }

    pub fn max_commit_attempts(&self) -> usize {
        self.max_commit_attempts
    }

    pub fn telemetry_interval(&self) -> Duration {
        self.telemetry_interval
    }

    pub fn state_reconciliation_enabled(&self) -> bool {
        self.enable_state_reconciliation
    }

    /// Upper bound on how often one commit reruns after losing a race. At least 1.
    pub fn with_max_commit_attempts(mut self, attempts: usize) -> Self {
        self.max_commit_attempts = attempts.max(1);
        self
    }

    pub fn with_telemetry_interval(mut self, interval: Duration) -> Self {
        self.telemetry_interval = interval;
        self
    }

    pub fn with_state_reconciliation(mut self, enabled: bool) -> Self {
        self.enable_state_reconciliation = enabled;
        self
    }
}
