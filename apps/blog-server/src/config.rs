//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use blog_infra::database::DatabaseConfig;

#[cfg(feature = "rate-limit")]
use blog_infra::RateLimitConfig;

/// Where outgoing mail goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MailBackend {
    /// Log messages instead of sending them.
    #[default]
    Console,
    Smtp,
    /// Keep messages in memory.
    Memory,
}

impl FromStr for MailBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "console" => Ok(Self::Console),
            "smtp" => Ok(Self::Smtp),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown mail backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub backend: MailBackend,
    /// Sender address for shared posts.
    pub from: String,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    /// JSON fixtures loaded into the in-memory store when no database is used.
    pub fixtures: Option<PathBuf>,
    pub mail: MailConfig,
    #[cfg(feature = "rate-limit")]
    pub rate_limit: RateLimitConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| {
            let mut config = DatabaseConfig::new(url);
            if let Some(max) = env::var("DB_MAX_CONNECTIONS").ok().and_then(|s| s.parse().ok()) {
                config.max_connections = max;
            }
            if let Some(min) = env::var("DB_MIN_CONNECTIONS").ok().and_then(|s| s.parse().ok()) {
                config.min_connections = min;
            }
            config
        });

        let backend = match env::var("MAIL_BACKEND") {
            Ok(value) => value.parse::<MailBackend>().unwrap_or_else(|e| {
                tracing::warn!("{e}, falling back to console");
                MailBackend::Console
            }),
            Err(_) => MailBackend::default(),
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database,
            fixtures: env::var("BLOG_FIXTURES").ok().map(PathBuf::from),
            mail: MailConfig {
                backend,
                from: env::var("MAIL_FROM").unwrap_or_else(|_| "blog@localhost".to_string()),
            },
            #[cfg(feature = "rate-limit")]
            rate_limit: RateLimitConfig::from_env(),
        }
    }
}
