//! Configuration module for environment variable parsing.
//!
//! Everything is read once at startup into [`Config`]. Missing values degrade
//! to empty strings or defaults, they never abort the process.

use std::env;
use std::fmt;
use std::str::FromStr;

use tracing::warn;

/// What happens when the audit sink rejects a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuditDurability {
    /// Log the failure and still acknowledge the webhook.
    #[default]
    BestEffort,
    /// Fail the request so the sender retries the delivery.
    Required,
}

impl FromStr for AuditDurability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "best_effort" | "besteffort" => Ok(AuditDurability::BestEffort),
            "required" => Ok(AuditDurability::Required),
            other => Err(format!("unknown audit durability: {}", other)),
        }
    }
}

impl fmt::Display for AuditDurability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditDurability::BestEffort => f.write_str("best_effort"),
            AuditDurability::Required => f.write_str("required"),
        }
    }
}

/// Which store backs the audit sink and the query endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// PostgREST endpoint under `SUPABASE_URL`
    #[default]
    Rest,
    /// Process-local tables, lost on restart
    Memory,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(BackendKind::Rest),
            "memory" => Ok(BackendKind::Memory),
            other => Err(format!("unknown backend: {}", other)),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the managed backend
    pub backend_url: String,

    /// Privileged key, bypasses row level security
    pub service_role_key: String,

    /// Public key, used together with a caller's own token
    pub anon_key: String,

    /// Shared secret for webhook HMAC signatures
    pub webhook_secret: String,

    /// Reject unsigned webhooks even when no secret is configured
    pub require_signature: bool,

    /// Whether a failed audit write fails the webhook request
    pub audit_durability: AuditDurability,

    /// Table receiving audit records
    pub audit_table: String,

    /// Table read by the query endpoint
    pub query_table: String,

    /// Maximum rows returned by the query endpoint
    pub query_limit: usize,

    /// Include internal error messages in 5xx response bodies
    pub expose_error_details: bool,

    /// Store backing the audit sink and the query endpoint
    pub backend: BackendKind,

    /// HTTP timeout for backend calls in milliseconds
    pub backend_timeout_ms: u64,

    /// Port for the web server to listen on
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend_url: String::new(),
            service_role_key: String::new(),
            anon_key: String::new(),
            webhook_secret: String::new(),
            require_signature: true,
            audit_durability: AuditDurability::BestEffort,
            audit_table: "webhook_logs".to_string(),
            query_table: "your_table".to_string(),
            query_limit: 10,
            expose_error_details: false,
            backend: BackendKind::Rest,
            backend_timeout_ms: 10_000,
            port: 8080,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            backend_url: env_string("SUPABASE_URL"),

            service_role_key: env_string("SUPABASE_SERVICE_ROLE_KEY"),

            anon_key: env_string("SUPABASE_ANON_KEY"),

            webhook_secret: env_string("WEBHOOK_SECRET"),

            require_signature: parse_bool("REQUIRE_SIGNATURE", defaults.require_signature),

            audit_durability: parse_or("AUDIT_DURABILITY", defaults.audit_durability),

            audit_table: env::var("AUDIT_TABLE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.audit_table),

            query_table: env::var("QUERY_TABLE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.query_table),

            query_limit: parse_or("QUERY_LIMIT", defaults.query_limit),

            expose_error_details: parse_bool(
                "EXPOSE_ERROR_DETAILS",
                defaults.expose_error_details,
            ),

            backend: parse_or("BACKEND", defaults.backend),

            backend_timeout_ms: parse_or("BACKEND_TIMEOUT_MS", defaults.backend_timeout_ms),

            port: parse_or("PORT", defaults.port),
        }
    }
}

/// Read a variable, treating absence as an empty string.
fn env_string(name: &str) -> String {
    env::var(name).unwrap_or_default()
}

/// Parse a variable with `FromStr`, falling back to `default` when unset or invalid.
fn parse_or<T>(name: &str, default: T) -> T
where
    T: FromStr,
{
    let raw = match env::var(name) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => return default,
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

/// Parse a boolean flag. Accepts true/false, 1/0, yes/no, on/off.
fn parse_bool(name: &str, default: bool) -> bool {
    let raw = match env::var(name) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => return default,
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => {
            warn!(env_var = name, value = %raw, "Invalid boolean, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_variants() {
        env::set_var("TEST_CFG_BOOL_ON", "yes");
        env::set_var("TEST_CFG_BOOL_OFF", "0");
        env::set_var("TEST_CFG_BOOL_BAD", "maybe");

        assert!(parse_bool("TEST_CFG_BOOL_ON", false));
        assert!(!parse_bool("TEST_CFG_BOOL_OFF", true));
        assert!(parse_bool("TEST_CFG_BOOL_BAD", true));
        assert!(!parse_bool("TEST_CFG_BOOL_UNSET", false));

        env::remove_var("TEST_CFG_BOOL_ON");
        env::remove_var("TEST_CFG_BOOL_OFF");
        env::remove_var("TEST_CFG_BOOL_BAD");
    }

    #[test]
    fn test_parse_or_default() {
        let result: u16 = parse_or("NONEXISTENT_CFG_VAR", 8080);
        assert_eq!(result, 8080);

        env::set_var("TEST_CFG_LIMIT", "not-a-number");
        let result: usize = parse_or("TEST_CFG_LIMIT", 10);
        assert_eq!(result, 10);
        env::remove_var("TEST_CFG_LIMIT");
    }

    #[test]
    fn test_parse_durability() {
        assert_eq!(
            "required".parse::<AuditDurability>(),
            Ok(AuditDurability::Required)
        );
        assert_eq!(
            "best-effort".parse::<AuditDurability>(),
            Ok(AuditDurability::BestEffort)
        );
        assert!("sometimes".parse::<AuditDurability>().is_err());
        assert_eq!(AuditDurability::Required.to_string(), "required");
    }

    #[test]
    fn test_parse_backend_kind() {
        assert_eq!("memory".parse::<BackendKind>(), Ok(BackendKind::Memory));
        assert_eq!("REST".parse::<BackendKind>(), Ok(BackendKind::Rest));
        assert!("redis".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_missing_keys_degrade_to_empty() {
        assert_eq!(env_string("NONEXISTENT_CFG_KEY"), "");
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.require_signature);
        assert_eq!(config.audit_durability, AuditDurability::BestEffort);
        assert_eq!(config.audit_table, "webhook_logs");
        assert_eq!(config.query_limit, 10);
        assert!(!config.expose_error_details);
        assert!(config.webhook_secret.is_empty());
    }
}
