//! Server configuration, loaded from environment variables at startup.

/// Runtime configuration for solace-server.
///
/// Every field has a default so the server starts without any environment
/// variables set, using the in-memory backend.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// Postgres connection string. When unset the server falls back to the
    /// REST backend if configured, otherwise to the in-memory backend.
    pub database_url: Option<String>,

    /// Upper bound on pooled Postgres connections.
    pub db_max_connections: u32,

    /// PostgREST root URL, e.g. `https://project.example/rest/v1`.
    pub rest_url: Option<String>,

    /// API key sent to the REST backend.
    pub rest_key: Option<String>,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Directory for daily-rolling log files; stdout only when unset.
    pub log_dir: Option<String>,

    /// Comma-separated list of allowed CORS origins; any origin when unset.
    pub cors_allowed_origins: Option<String>,

    /// Serve Swagger UI and the OpenAPI document.
    pub enable_swagger: bool,

    /// Accept messages whose sender and recipient are the same user.
    pub allow_self_messages: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_owned(),
            database_url: None,
            db_max_connections: 5,
            rest_url: None,
            rest_key: None,
            log_level: "info".to_owned(),
            log_json: false,
            log_dir: None,
            cors_allowed_origins: None,
            enable_swagger: true,
            allow_self_messages: true,
        }
    }
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_address: env_or("SOLACE_BIND", &defaults.bind_address),
            database_url: env_opt("SOLACE_DATABASE_URL"),
            db_max_connections: parse_env(
                "SOLACE_DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            ),
            rest_url: env_opt("SOLACE_REST_URL"),
            rest_key: env_opt("SOLACE_REST_KEY"),
            log_level: env_or("SOLACE_LOG", &defaults.log_level),
            log_json: flag_env("SOLACE_LOG_JSON", defaults.log_json),
            log_dir: env_opt("SOLACE_LOG_DIR"),
            cors_allowed_origins: env_opt("SOLACE_CORS_ORIGINS"),
            enable_swagger: flag_env("SOLACE_ENABLE_SWAGGER", defaults.enable_swagger),
            allow_self_messages: flag_env(
                "SOLACE_ALLOW_SELF_MESSAGES",
                defaults.allow_self_messages,
            ),
        }
    }

    /// Which storage the message chain writes to.
    pub fn storage_mode(&self) -> &'static str {
        match (&self.database_url, &self.rest_url) {
            (Some(_), Some(_)) => "postgres+rest",
            (Some(_), None) => "postgres",
            (None, _) => "memory",
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn flag_env(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| parse_flag(&v).unwrap_or(default))
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
