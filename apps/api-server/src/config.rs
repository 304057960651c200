//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use inkwell_core::domain::LikePolicy;
use inkwell_core::ports::Quota;
use inkwell_infra::TaskQueueConfig;
use inkwell_infra::rate_limit::DEFAULT_SWEEP_THRESHOLD;

#[cfg(feature = "postgres")]
use inkwell_infra::database::DatabaseConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    #[cfg(feature = "postgres")]
    pub database: Option<DatabaseConfig>,
    /// Raw `ADMIN_API_KEYS` value; parsed by the key verifier.
    pub admin_api_keys: String,
    pub rate_limits: RateLimitConfig,
    /// Exact-match CORS allow-list. Empty means any origin.
    pub allowed_origins: Vec<String>,
    /// Take the client identity from `Forwarded` / `X-Forwarded-For`.
    pub trust_proxy_headers: bool,
    pub like_policy: LikePolicy,
    pub view_queue: TaskQueueConfig,
    /// Periodic rate limiter sweeps.
    pub scheduler_enabled: bool,
}

/// Quotas for the admin limiter and the three public tiers.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub admin_per_window: u32,
    pub public_enabled: bool,
    pub public_get_per_window: u32,
    pub public_social_per_window: u32,
    pub public_default_per_window: u32,
    pub window: Duration,
    pub sweep_threshold: usize,
}

impl RateLimitConfig {
    pub fn admin_quota(&self) -> Quota {
        Quota::new(self.admin_per_window, self.window)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            admin_per_window: 30,
            public_enabled: false,
            public_get_per_window: 120,
            public_social_per_window: 60,
            public_default_per_window: 100,
            window: Duration::from_secs(60),
            sweep_threshold: DEFAULT_SWEEP_THRESHOLD,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Unparseable values fall
    /// back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse = |key: &str| lookup(key).map(|v| v.trim().to_string());
        let flag = |key: &str, default: bool| -> bool {
            parse(key)
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
                .unwrap_or(default)
        };

        let defaults = RateLimitConfig::default();
        let rate_limits = RateLimitConfig {
            admin_per_window: number_or(parse("ADMIN_RATE_LIMIT_PER_MINUTE"), 30),
            public_enabled: flag("PUBLIC_RATE_LIMIT_ENABLED", false),
            public_get_per_window: number_or(parse("PUBLIC_GET_RATE_LIMIT_PER_MINUTE"), 120),
            public_social_per_window: number_or(parse("PUBLIC_SOCIAL_RATE_LIMIT_PER_MINUTE"), 60),
            public_default_per_window: number_or(parse("PUBLIC_DEFAULT_RATE_LIMIT_PER_MINUTE"), 100),
            window: Duration::from_secs(number_or(parse("RATE_LIMIT_WINDOW_SECS"), 60u64).max(1)),
            sweep_threshold: number_or(parse("RATE_LIMIT_SWEEP_THRESHOLD"), defaults.sweep_threshold),
        };

        let like_policy = match parse("LIKE_POLICY").filter(|v| !v.is_empty()) {
            None => LikePolicy::default(),
            Some(raw) => LikePolicy::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Invalid LIKE_POLICY, using default");
                LikePolicy::default()
            }),
        };

        #[cfg(feature = "postgres")]
        let database = parse("DATABASE_URL")
            .filter(|url| !url.is_empty())
            .map(|url| DatabaseConfig {
                url,
                max_connections: number_or(parse("DB_MAX_CONNECTIONS"), 20),
                min_connections: number_or(parse("DB_MIN_CONNECTIONS"), 2),
                connect_timeout: Duration::from_secs(
                    number_or(parse("DB_CONNECT_TIMEOUT_SECS"), 15u64).max(1),
                ),
            });

        Self {
            host: parse("HOST")
                .filter(|h| !h.is_empty())
                .unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse("PORT").and_then(|p| p.parse().ok()).unwrap_or(8080),
            #[cfg(feature = "postgres")]
            database,
            admin_api_keys: lookup("ADMIN_API_KEYS").unwrap_or_default(),
            rate_limits,
            allowed_origins: split_list(parse("ALLOWED_ORIGINS").as_deref().unwrap_or("")),
            trust_proxy_headers: flag("TRUST_PROXY_HEADERS", false),
            like_policy,
            view_queue: TaskQueueConfig {
                max_size: number_or(parse("VIEW_QUEUE_SIZE"), 10000usize).max(1),
                workers: number_or(parse("VIEW_WORKERS"), 4usize).max(1),
            },
            scheduler_enabled: parse("SCHEDULER_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        }
    }
}

/// Parse as the target type; absent, malformed or out-of-range values give `default`.
fn number_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
