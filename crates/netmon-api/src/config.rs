//! Configuration for the netmon API server.
//!
//! Loaded from `netmon.toml` (optional) and `NETMON__<SECTION>__<KEY>`
//! environment variables, e.g. `NETMON__AUTH__JWT_SECRET`.

use std::path::PathBuf;

use serde::Deserialize;

use netmon_audit::RetentionPolicy;
use netmon_discover::ScannerConfig;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub rbac: RbacConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

impl AppConfig {
    /// Layer the config file `file_prefix` (any supported extension) under
    /// the `NETMON` environment.
    pub fn load(file_prefix: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("NETMON")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("rbac.exempt_paths")
                    .with_list_parse_key("audit.redact_fields")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Reject configurations the server cannot start with.
    pub fn validate(&self) -> Result<(), String> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err("auth.jwt_secret must be set".to_string());
        }
        if self.auth.token_ttl_secs == 0 {
            return Err("auth.token_ttl_secs must be positive".to_string());
        }
        if !self.rbac.admin_prefix.starts_with('/') {
            return Err(format!(
                "rbac.admin_prefix must start with '/': {}",
                self.rbac.admin_prefix
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Listen address (default: "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret. Required.
    #[serde(default)]
    pub jwt_secret: String,

    /// Lifetime of issued tokens (default: 3600).
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,

    /// Admin account created at start-up when set.
    #[serde(default)]
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_secs: default_token_ttl_secs(),
            bootstrap_admin: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RbacConfig {
    /// Paths any authenticated caller may reach regardless of role.
    #[serde(default)]
    pub exempt_paths: Vec<String>,

    /// Paths under this prefix are Admin-only (default: "/admin").
    #[serde(default = "default_admin_prefix")]
    pub admin_prefix: String,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            exempt_paths: Vec::new(),
            admin_prefix: default_admin_prefix(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Capacity of the in-memory ring served by `GET /events`.
    #[serde(default = "default_max_events")]
    pub max_events: usize,

    /// Requests with larger bodies are rejected with 413.
    #[serde(default = "default_max_request_body_bytes")]
    pub max_request_body_bytes: usize,

    /// Response bytes retained per event; the rest is forwarded only.
    #[serde(default = "default_response_capture_bytes")]
    pub response_capture_bytes: usize,

    /// JSON request fields replaced with `"[REDACTED]"`.
    #[serde(default = "default_redact_fields")]
    pub redact_fields: Vec<String>,

    /// Directory for the durable log. Disabled when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    #[serde(default = "default_max_total_bytes")]
    pub max_total_bytes: u64,

    /// Events queued for the log writer before new ones are dropped.
    #[serde(default = "default_log_queue_capacity")]
    pub log_queue_capacity: usize,
}

impl AuditConfig {
    pub fn retention(&self) -> RetentionPolicy {
        RetentionPolicy {
            max_age_days: self.retention_days,
            max_total_bytes: self.max_total_bytes,
            ..RetentionPolicy::default()
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_events: default_max_events(),
            max_request_body_bytes: default_max_request_body_bytes(),
            response_capture_bytes: default_response_capture_bytes(),
            redact_fields: default_redact_fields(),
            log_dir: None,
            retention_days: default_retention_days(),
            max_total_bytes: default_max_total_bytes(),
            log_queue_capacity: default_log_queue_capacity(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_token_ttl_secs() -> u64 {
    3600
}

fn default_admin_prefix() -> String {
    "/admin".to_string()
}

fn default_max_events() -> usize {
    netmon_audit::ring::DEFAULT_MAX_EVENTS
}

fn default_max_request_body_bytes() -> usize {
    1024 * 1024
}

fn default_response_capture_bytes() -> usize {
    64 * 1024
}

fn default_redact_fields() -> Vec<String> {
    vec!["password".to_string()]
}

fn default_retention_days() -> u32 {
    RetentionPolicy::default().max_age_days
}

fn default_max_total_bytes() -> u64 {
    RetentionPolicy::default().max_total_bytes
}

fn default_log_queue_capacity() -> usize {
    1024
}
