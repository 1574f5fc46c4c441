//! Process configuration, read once from the environment at startup.
//!
//! Malformed values fail startup with the variable named in the error.
//! Missing upstream coordinates do not: the service starts and each
//! generation request fails with a configuration error until they are set.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use llm::{CompleteDevConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use pipeline::{RateLimitPolicies, RateLimitPolicy};

const DEFAULT_BIND: &str = "0.0.0.0:3000";
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub format: LogFormat,
    /// OTLP collector endpoint; `None` disables trace export.
    pub otlp_endpoint: Option<String>,
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub jwt_secret: String,
    pub upstream: CompleteDevConfig,
    pub rate_limits: RateLimitPolicies,
    /// `None` disables the rate-limit sweep.
    pub sweep_interval: Option<Duration>,
    pub telemetry: TelemetryConfig,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind", &self.bind)
            .field("jwt_secret", &"<redacted>")
            .field("upstream", &self.upstream)
            .field("rate_limits", &self.rate_limits)
            .field("sweep_interval", &self.sweep_interval)
            .field("telemetry", &self.telemetry)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind = get("COPILOT_BIND")
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse::<SocketAddr>()
            .context("COPILOT_BIND must be a socket address such as 0.0.0.0:3000")?;

        let jwt_secret = get("JWT_SECRET").context("JWT_SECRET must be set")?;

        let timeout = match get("COMPLETE_DEV_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.trim()
                    .parse()
                    .context("COMPLETE_DEV_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            None => DEFAULT_TIMEOUT,
        };
        let upstream = CompleteDevConfig {
            api_key: get("COMPLETE_DEV_API_KEY"),
            base_url: get("COMPLETE_DEV_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            space_id: get("COMPLETE_DEV_SPACE_ID"),
            channel_id: get("COMPLETE_DEV_CHANNEL_ID"),
            timeout,
        };

        let defaults = RateLimitPolicies::default();
        let policy = |key: &str, default: RateLimitPolicy| -> Result<RateLimitPolicy> {
            match get(key) {
                Some(raw) => parse_policy(&raw).with_context(|| format!("invalid {key}")),
                None => Ok(default),
            }
        };
        let rate_limits = RateLimitPolicies {
            general: policy("COPILOT_RATE_LIMIT_GENERAL", defaults.general)?,
            auth: policy("COPILOT_RATE_LIMIT_AUTH", defaults.auth)?,
            tool_generation: policy("COPILOT_RATE_LIMIT_TOOL_GENERATION", defaults.tool_generation)?,
        };

        let sweep_interval = match get("COPILOT_RATE_LIMIT_SWEEP_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .context("COPILOT_RATE_LIMIT_SWEEP_SECS must be a whole number of seconds")?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => Some(DEFAULT_SWEEP_INTERVAL),
        };

        let format = match get("COPILOT_LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("json") => LogFormat::Json,
            Some("pretty") => LogFormat::Pretty,
            Some(other) => bail!("COPILOT_LOG_FORMAT must be 'json' or 'pretty', got '{other}'"),
        };

        Ok(Self {
            bind,
            jwt_secret,
            upstream,
            rate_limits,
            sweep_interval,
            telemetry: TelemetryConfig {
                format,
                otlp_endpoint: get("OTEL_EXPORTER_OTLP_ENDPOINT"),
            },
        })
    }
}

/// Parses `"{max_requests}/{window_secs}"`.
fn parse_policy(raw: &str) -> Result<RateLimitPolicy> {
    let (max, window) = raw
        .trim()
        .split_once('/')
        .context("expected '<max_requests>/<window_secs>'")?;
    let max: u32 = max.trim().parse().context("max_requests is not a number")?;
    let window: u64 = window.trim().parse().context("window_secs is not a number")?;
    if max == 0 || window == 0 {
        bail!("max_requests and window_secs must both be positive");
    }
    Ok(RateLimitPolicy::new(max, Duration::from_secs(window)))
}
