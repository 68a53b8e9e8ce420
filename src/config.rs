use std::time::Duration;

pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:8080";
pub const DEFAULT_GATEWAY_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_RETENTION_SECS: u64 = 24 * 60 * 60;

const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub gateway_url: String,
    pub gateway_timeout_ms: u64,
    pub idempotency_retention_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            gateway_timeout_ms: DEFAULT_GATEWAY_TIMEOUT_MS,
            idempotency_retention_secs: DEFAULT_RETENTION_SECS,
        }
    }
}

impl AppConfig {
    /// Reads `GATEWAY_URL`, `GATEWAY_TIMEOUT_MS` and `IDEMPOTENCY_RETENTION_SECS`,
    /// falling back to defaults for unset or unparsable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            gateway_url: std::env::var("GATEWAY_URL").unwrap_or(defaults.gateway_url),
            gateway_timeout_ms: env_u64("GATEWAY_TIMEOUT_MS")
                .unwrap_or(defaults.gateway_timeout_ms),
            idempotency_retention_secs: env_u64("IDEMPOTENCY_RETENTION_SECS")
                .unwrap_or(defaults.idempotency_retention_secs),
        }
    }

    /// Idempotency retention, never shorter than the gateway ceiling.
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.idempotency_retention_secs).max(self.gateway_timeout())
    }

    /// How often expired idempotency keys are swept: the retention window,
    /// bounded to between one second and one minute.
    pub fn sweep_interval(&self) -> Duration {
        self.retention().clamp(MIN_SWEEP_INTERVAL, MAX_SWEEP_INTERVAL)
    }

    fn gateway_timeout(&self) -> Duration {
        Duration::from_millis(self.gateway_timeout_ms)
    }

    pub fn orchestrator(&self) -> OrchestratorConfig {
        let gateway_timeout = self.gateway_timeout();
        OrchestratorConfig {
            gateway_timeout,
            still_processing_retry_after: gateway_timeout,
        }
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|s| s.parse::<u64>().ok())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Upper bound on any single gateway call, applied on top of the caller's deadline.
    pub gateway_timeout: Duration,
    /// Back-off suggested to callers that hit an in-flight duplicate.
    pub still_processing_retry_after: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        AppConfig::default().orchestrator()
    }
}
