//! Tracing Subscriber Initialization
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and either a
//! JSON or a human-readable formatting layer.

use std::fmt;
use std::str::FromStr;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use agentnet_core::ConfigError;

use crate::config::{parse_flag, parse_var, EnvSource, ProcessEnv};
use crate::error::{RpcError, RpcResult};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(ConfigError::InvalidValue {
                field: "log_format".to_string(),
                value: other.to_string(),
                reason: "expected 'json' or 'pretty'".to_string(),
            }),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Json => f.write_str("json"),
            LogFormat::Pretty => f.write_str("pretty"),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to startup logs
    pub service_name: String,
    /// Default filter directive when `RUST_LOG` is unset
    pub log_level: String,
    /// Output format
    pub log_format: LogFormat,
    /// Expose and record Prometheus metrics
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "agentnet-api".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            metrics_enabled: true,
        }
    }
}

impl TelemetryConfig {
    /// Environment variables:
    /// - `AGENTNET_SERVICE_NAME` (default: agentnet-api)
    /// - `AGENTNET_LOG_LEVEL` (default: info)
    /// - `AGENTNET_LOG_FORMAT`: `json` or `pretty` (default: json)
    /// - `AGENTNET_METRICS_ENABLED` (default: true)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(&ProcessEnv)
    }

    pub fn from_source(env: &dyn EnvSource) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            service_name: env
                .get("AGENTNET_SERVICE_NAME")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.service_name),
            log_level: env
                .get("AGENTNET_LOG_LEVEL")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.log_level),
            log_format: parse_var(env, "AGENTNET_LOG_FORMAT", defaults.log_format)?,
            metrics_enabled: parse_flag(env, "AGENTNET_METRICS_ENABLED", defaults.metrics_enabled)?,
        })
    }

    /// Filter directive used when `RUST_LOG` is unset.
    pub fn default_directive(&self) -> String {
        format!(
            "agentnet_api={level},agentnet_agents={level},agentnet_threads={level},tower_http=info,{level}",
            level = self.log_level
        )
    }
}

/// Initialize the global tracing subscriber.
///
/// Call once at startup. A second call fails because a global subscriber
/// is already installed.
pub fn init_tracing(config: &TelemetryConfig) -> RpcResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.default_directive()))
        .map_err(|e| RpcError::internal_error(format!("Invalid log filter: {}", e)))?;

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().pretty()).try_init(),
    };
    result.map_err(|e| RpcError::internal_error(format!("Failed to init subscriber: {}", e)))?;

    tracing::info!(
        service_name = %config.service_name,
        log_format = %config.log_format,
        "Telemetry initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_from_source() {
        let env = |key: &str| match key {
            "AGENTNET_LOG_LEVEL" => Some("debug".to_string()),
            "AGENTNET_LOG_FORMAT" => Some("pretty".to_string()),
            _ => None,
        };
        let config = TelemetryConfig::from_source(&env).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.service_name, "agentnet-api");
        assert!(config.metrics_enabled);
    }

    #[test]
    fn test_default_directive_is_valid_filter() {
        let config = TelemetryConfig::default();
        assert!(EnvFilter::try_new(config.default_directive()).is_ok());
    }
}
