//! Configuration loading and management

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};

/// Main configuration for the guestbook service
///
/// Built once at startup and treated as read-only afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    /// Cross-origin policy for the HTTP API
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// Listen address; `bind` may be an IPv4 or IPv6 literal
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .bind
            .parse()
            .with_context(|| format!("Invalid bind address: {}", self.bind))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    /// Keep entries in memory instead of SQLite (lost on restart)
    #[serde(default)]
    pub in_memory: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            in_memory: false,
        }
    }
}

fn default_database_path() -> PathBuf {
    PathBuf::from("guestbook.db")
}

/// Allowed origins and methods. Allowed headers are always "any".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Methods allowed on `/api/**`; `/actuator/**` always allows GET and POST
    #[serde(default = "default_allowed_methods")]
    pub allowed_methods: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
            allowed_methods: default_allowed_methods(),
        }
    }
}

fn default_allowed_origins() -> Vec<String> {
    split_list("https://t1324.p.ssafy.io,http://localhost:3000")
}

fn default_allowed_methods() -> Vec<String> {
    split_list("GET,POST,PUT,DELETE,OPTIONS")
}

/// Split a comma-separated setting, trimming entries and dropping empty ones.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Command-line flags and environment variables layered over the config file
#[derive(Args, Debug, Default)]
pub struct Overrides {
    /// Port to listen on
    #[arg(long, env = "GUESTBOOK_PORT")]
    pub port: Option<u16>,

    /// Address to bind to
    #[arg(long, env = "GUESTBOOK_BIND")]
    pub bind: Option<String>,

    /// SQLite database file
    #[arg(long, env = "GUESTBOOK_DATABASE")]
    pub database: Option<PathBuf>,

    /// Keep entries in memory only
    #[arg(long, env = "GUESTBOOK_MEMORY")]
    pub memory: bool,

    /// Comma-separated list of allowed CORS origins
    #[arg(long, env = "CORS_ALLOWED_ORIGINS")]
    pub allowed_origins: Option<String>,

    /// Comma-separated list of allowed CORS methods for /api
    #[arg(long, env = "CORS_ALLOWED_METHODS")]
    pub allowed_methods: Option<String>,
}

impl Config {
    /// Load configuration from an optional JSON file, falling back to defaults
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let Some(config_file) = config_file else {
            return Ok(Config::default());
        };

        if config_file.exists() {
            let content = std::fs::read_to_string(config_file)
                .with_context(|| format!("Failed to read config file: {:?}", config_file))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", config_file))?;
            tracing::info!("Loaded configuration from {:?}", config_file);
            Ok(config)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_file
            );
            Ok(Config::default())
        }
    }

    /// Apply flag/env values on top of whatever was loaded
    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(bind) = overrides.bind {
            self.server.bind = bind;
        }
        if let Some(database) = overrides.database {
            self.database.path = database;
        }
        if overrides.memory {
            self.database.in_memory = true;
        }
        if let Some(origins) = overrides.allowed_origins {
            self.cors.allowed_origins = split_list(&origins);
        }
        if let Some(methods) = overrides.allowed_methods {
            self.cors.allowed_methods = split_list(&methods);
        }
    }
}
