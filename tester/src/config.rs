use std::time::Duration;

use clap::{Parser, ValueEnum};
use load_test_util::endpoints::ApiEndpoints;
use load_test_util::users::{DEFAULT_REAL_USER_PROBABILITY, DEFAULT_SYNTHETIC_USERS};

use crate::client::ClientOptions;
use crate::runner::RunConfig;
use crate::scenario::{Pacing, ScenarioConfig};

pub const DEFAULT_BASE_URL: &str = "https://localhost:8000/api/v1";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("at least one virtual user is required")]
    NoVirtualUsers,
    #[error("real user probability must be within [0, 1], got {0}")]
    Probability(f64),
    #[error("think time minimum {min_ms}ms exceeds maximum {max_ms}ms")]
    ThinkTime { min_ms: u64, max_ms: u64 },
    #[error("invalid base url {url:?}: {reason}")]
    BaseUrl { url: String, reason: String },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Virtual-user load test against the EduCode API.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct TesterArgs {
    /// Versioned API root, e.g. https://host:8000/api/v1
    #[arg(long, env = "EDUCODE_API_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, env = "EDUCODE_VUS", default_value_t = 10)]
    pub virtual_users: usize,

    /// Iterations per virtual user.
    #[arg(long, env = "EDUCODE_ITERATIONS", default_value_t = 10)]
    pub iterations: usize,

    /// Stop starting iterations after this many seconds.
    #[arg(long, env = "EDUCODE_DURATION_SECS")]
    pub duration_secs: Option<u64>,

    #[arg(long, env = "EDUCODE_SYNTHETIC_USERS", default_value_t = DEFAULT_SYNTHETIC_USERS)]
    pub synthetic_users: usize,

    /// Chance of logging in as one of the known accounts.
    #[arg(long, env = "EDUCODE_REAL_USER_PROBABILITY", default_value_t = DEFAULT_REAL_USER_PROBABILITY)]
    pub real_user_probability: f64,

    #[arg(long, env = "EDUCODE_STEP_PAUSE_MS", default_value_t = 1000)]
    pub step_pause_ms: u64,

    #[arg(long, env = "EDUCODE_THINK_MIN_MS", default_value_t = 1000)]
    pub think_min_ms: u64,

    #[arg(long, env = "EDUCODE_THINK_MAX_MS", default_value_t = 3000)]
    pub think_max_ms: u64,

    #[arg(long, env = "EDUCODE_REQUEST_TIMEOUT_SECS", default_value_t = 60)]
    pub request_timeout_secs: u64,

    /// Validate server certificates. Off by default so self-signed test deployments work.
    #[arg(long, env = "EDUCODE_VERIFY_TLS")]
    pub verify_tls: bool,

    /// Makes user selection and generated payloads reproducible.
    #[arg(long, env = "EDUCODE_SEED")]
    pub seed: Option<u64>,

    #[arg(long, env = "EDUCODE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl TesterArgs {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.virtual_users == 0 {
            return Err(ConfigError::NoVirtualUsers);
        }
        if !(0.0..=1.0).contains(&self.real_user_probability) {
            return Err(ConfigError::Probability(self.real_user_probability));
        }
        if self.think_min_ms > self.think_max_ms {
            return Err(ConfigError::ThinkTime {
                min_ms: self.think_min_ms,
                max_ms: self.think_max_ms,
            });
        }
        let url = url::Url::parse(&self.base_url).map_err(|e| ConfigError::BaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::BaseUrl {
                url: self.base_url.clone(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn pacing(&self) -> Pacing {
        Pacing {
            step_pause: Duration::from_millis(self.step_pause_ms),
            think_min: Duration::from_millis(self.think_min_ms),
            think_max: Duration::from_millis(self.think_max_ms),
        }
    }

    #[must_use]
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            verify_tls: self.verify_tls,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    #[must_use]
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            virtual_users: self.virtual_users,
            iterations: self.iterations,
            duration: self.duration_secs.map(Duration::from_secs),
            seed: self.seed,
            scenario: ScenarioConfig {
                endpoints: ApiEndpoints::new(self.base_url.as_str()),
                pacing: self.pacing(),
                real_user_probability: self.real_user_probability,
            },
        }
    }
}
