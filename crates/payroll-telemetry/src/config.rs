//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,

    /// Whether to enable console output (for development)
    pub console_output: bool,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Prometheus metrics port
    pub metrics_port: u16,

    /// Network identifier (e.g. base-sepolia, base-mainnet)
    pub network: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "payroll-indexer".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            metrics_port: 9100,
            network: "base-sepolia".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OTEL_SERVICE_NAME`: Service name (default: payroll-indexer)
    /// - `PAYROLL_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `PAYROLL_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `PAYROLL_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    /// - `PAYROLL_METRICS_PORT`: Prometheus metrics port (default: 9100)
    /// - `PAYROLL_NETWORK`: Network name (default: base-sepolia)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("OTEL_SERVICE_NAME")
                .unwrap_or_else(|_| "payroll-indexer".to_string()),

            log_level: env::var("PAYROLL_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("PAYROLL_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v, true))
                .unwrap_or(true),

            json_logs: env::var("PAYROLL_JSON_LOGS")
                .map(|v| parse_flag(&v, false))
                .unwrap_or(is_container),

            metrics_port: env::var("PAYROLL_METRICS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(9100),

            network: env::var("PAYROLL_NETWORK").unwrap_or_else(|_| "base-sepolia".to_string()),
        }
    }

    /// Service name qualified by network, e.g. `payroll-indexer@base-sepolia`.
    pub fn full_service_name(&self) -> String {
        if self.network.is_empty() {
            self.service_name.clone()
        } else {
            format!("{}@{}", self.service_name, self.network)
        }
    }
}

/// Interpret a boolean environment flag. Unrecognised values keep `default`.
pub(crate) fn parse_flag(value: &str, default: bool) -> bool {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}
