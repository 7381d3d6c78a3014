//! Recetario configuration system.
//!
//! Settings come from a TOML file (every field optional) and are then
//! overridden by environment variables, so the same binary runs from a
//! config file locally and from plain env vars on a hosting platform.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{RecetarioError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecetarioConfig {
    /// Shared secret the scheduler presents as `Authorization: Bearer <secret>`.
    #[serde(default)]
    pub cron_secret: Option<String>,
    /// Deployment label, echoed by status and debug endpoints.
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub reminders: RemindersConfig,
}

fn default_environment() -> String { "development".into() }

impl Default for RecetarioConfig {
    fn default() -> Self {
        Self {
            cron_secret: None,
            environment: default_environment(),
            gateway: GatewayConfig::default(),
            database: DatabaseConfig::default(),
            email: EmailConfig::default(),
            reminders: RemindersConfig::default(),
        }
    }
}

impl RecetarioConfig {
    /// Load config from the default path (~/.recetario/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RecetarioError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| RecetarioError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Apply environment overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup. Empty values count as unset.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("CRON_SECRET") {
            self.cron_secret = Some(v);
        }
        if let Some(v) = get("APP_ENV") {
            self.environment = v;
        }
        if let Some(v) = get("RESEND_API_KEY") {
            self.email.api_key = v;
        }
        if let Some(v) = get("SMTP_PASSWORD") {
            self.email.smtp_password = v;
        }
        if let Some(v) = get("EMAIL_FROM") {
            self.email.from = v;
        }
        if let Some(v) = get("APP_URL") {
            self.reminders.app_url = v;
        }
        if let Some(v) = get("RECETARIO_HOST") {
            self.gateway.host = v;
        }
        if let Some(v) = get("RECETARIO_PORT") {
            match v.parse() {
                Ok(port) => self.gateway.port = port,
                Err(_) => tracing::warn!("⚠️ Ignoring invalid RECETARIO_PORT: {v}"),
            }
        }
        if let Some(v) = get("RECETARIO_DB") {
            self.database.path = v;
        }
    }

    /// The configured cron secret, if present and non-empty.
    pub fn cron_secret(&self) -> Option<&str> {
        self.cron_secret.as_deref().filter(|s| !s.is_empty())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the Recetario home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".recetario")
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 { 3000 }
fn default_host() -> String { "127.0.0.1".into() }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Document store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String { "~/.recetario/recetario.db".into() }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path() }
    }
}

/// Which transport carries outbound email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmailProvider {
    /// Transactional email HTTP API (Resend-compatible).
    #[default]
    Resend,
    /// Plain SMTP relay with STARTTLS.
    Smtp,
}

/// Outbound email configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub provider: EmailProvider,
    /// API key for the HTTP provider.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_from")]
    pub from: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_user: String,
    #[serde(default)]
    pub smtp_password: String,
}

fn default_api_base_url() -> String { "https://api.resend.com".into() }
fn default_from() -> String { "recordatorios@recetario.local".into() }
fn default_smtp_port() -> u16 { 587 }

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            provider: EmailProvider::default(),
            api_key: String::new(),
            api_base_url: default_api_base_url(),
            from: default_from(),
            display_name: None,
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            smtp_user: String::new(),
            smtp_password: String::new(),
        }
    }
}

impl EmailConfig {
    /// Whether the selected provider has the credential it needs.
    pub fn has_credential(&self) -> bool {
        match self.provider {
            EmailProvider::Resend => !self.api_key.trim().is_empty(),
            EmailProvider::Smtp => {
                !self.smtp_host.trim().is_empty() && !self.smtp_password.trim().is_empty()
            }
        }
    }
}

/// Reminder content and pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemindersConfig {
    /// Public base URL used in the call-to-action link.
    #[serde(default = "default_app_url")]
    pub app_url: String,
    /// Label used when a bulk request omits `frequency`.
    #[serde(default = "default_frequency")]
    pub default_frequency: String,
    /// Pause between consecutive sends in a bulk run.
    #[serde(default = "default_send_delay_ms")]
    pub send_delay_ms: u64,
}

fn default_app_url() -> String { "http://localhost:3000".into() }
fn default_frequency() -> String { "weekly".into() }
fn default_send_delay_ms() -> u64 { 100 }

impl Default for RemindersConfig {
    fn default() -> Self {
        Self {
            app_url: default_app_url(),
            default_frequency: default_frequency(),
            send_delay_ms: default_send_delay_ms(),
        }
    }
}
