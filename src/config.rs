//! Service configuration loaded from environment variables

use std::time::Duration;

/// Runtime configuration for the judge service
#[derive(Debug, Clone)]
pub struct JudgeConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Wall-clock deadline for one test-case process, in milliseconds
    pub run_timeout_ms: u64,
    /// Wall-clock deadline for a compile step, in milliseconds
    pub build_timeout_ms: u64,
    /// Maximum number of submissions graded concurrently
    pub max_concurrent: usize,
}

impl JudgeConfig {
    /// Load configuration from the environment, falling back to defaults
    /// for unset or unparseable variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: std::env::var("JUDGE_BIND_ADDR").unwrap_or(defaults.bind_addr),
            run_timeout_ms: env_parse("JUDGE_RUN_TIMEOUT_MS", defaults.run_timeout_ms),
            build_timeout_ms: env_parse("JUDGE_BUILD_TIMEOUT_MS", defaults.build_timeout_ms),
            max_concurrent: env_parse("JUDGE_MAX_CONCURRENT", defaults.max_concurrent),
        }
    }

    pub fn run_deadline(&self) -> Duration {
        Duration::from_millis(self.run_timeout_ms)
    }

    pub fn build_deadline(&self) -> Duration {
        Duration::from_millis(self.build_timeout_ms)
    }
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".into(),
            run_timeout_ms: 5_000,
            build_timeout_ms: 30_000,
            max_concurrent: 8,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
