//! Configuration module for the blog backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log line format
    pub log_format: LogFormat,
    /// Serve the authenticated variant (register/login plus bearer gate)
    pub auth_enabled: bool,
    /// HMAC key for session tokens; generated per process when absent
    pub token_secret: Option<String>,
    /// Token lifetime in seconds; tokens never expire when absent
    pub token_ttl_secs: Option<i64>,
    /// Start with the sample posts
    pub seed_posts: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let bind_addr = env::var("BLOG_BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:5002".to_string())
            .parse()
            .expect("Invalid BLOG_BIND_ADDR format");

        let log_level = env::var("BLOG_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_format = env::var("BLOG_LOG_FORMAT")
            .ok()
            .and_then(|v| LogFormat::parse(&v))
            .unwrap_or(LogFormat::Pretty);

        let auth_enabled = env_flag("BLOG_AUTH_ENABLED", false);

        let token_secret = env::var("BLOG_TOKEN_SECRET")
            .ok()
            .filter(|s| !s.is_empty());

        let token_ttl_secs = env::var("BLOG_TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|ttl| *ttl > 0);

        let seed_posts = env_flag("BLOG_SEED_POSTS", true);

        Self {
            bind_addr,
            log_level,
            log_format,
            auth_enabled,
            token_secret,
            token_ttl_secs,
            seed_posts,
        }
    }
}

/// Read a boolean flag, accepting the usual spellings.
fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(v) => match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
