use super::ConfigError;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub publisher: PublisherConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public base URL used when rendering links in notifications and reports.
    #[serde(default)]
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// HMAC key for bearer token signatures.
    pub token_secret: SecretString,
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub max_connections: Option<u32>,
    #[serde(default)]
    pub min_connections: Option<u32>,
}

impl DatabaseConfig {
    pub fn db_type(&self) -> DbType {
        let url = self.connection_string();
        if url.starts_with("sqlite://") {
            DbType::Sqlite
        } else {
            DbType::Postgres
        }
    }

    pub fn connection_string(&self) -> String {
        if let Some(ref url) = self.url {
            url.clone()
        } else if let Some(ref file) = self.filename {
            format!("sqlite://{}", file)
        } else {
            String::new()
        }
    }

    pub fn sqlite_path(&self) -> Option<String> {
        if let DbType::Sqlite = self.db_type() {
            let url = self.connection_string();
            Some(url.strip_prefix("sqlite://").unwrap_or(&url).to_string())
        } else {
            None
        }
    }

    pub fn max_connections(&self) -> Option<u32> {
        match self.db_type() {
            DbType::Postgres => self.max_connections,
            DbType::Sqlite => Some(1),
        }
    }

    pub fn min_connections(&self) -> Option<u32> {
        match self.db_type() {
            DbType::Postgres => self.min_connections,
            DbType::Sqlite => Some(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbType {
    Postgres,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_ai_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub api_key: Option<SecretString>,
    #[serde(default = "default_ai_model")]
    pub model: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_base: default_ai_api_base(),
            api_key: None,
            model: default_ai_model(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublisherConfig {
    /// n8n webhook that receives composed blog posts.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainConfig {
    #[serde(default)]
    pub kyc_contract_address: String,
    #[serde(default)]
    pub kyb_contract_address: String,
    #[serde(default)]
    pub project_registry_address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
    #[serde(default = "default_message_page_size")]
    pub message_page_size: i64,
    #[serde(default = "default_room_event_buffer")]
    pub room_event_buffer: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_message_length: default_max_message_length(),
            message_page_size: default_message_page_size(),
            room_event_buffer: default_room_event_buffer(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

        Self::load_from_file(&config_path)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidConfig(
                "server.port must be between 1 and 65535".to_string(),
            ));
        }

        if self.auth.token_secret.expose_secret().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "auth.token_secret cannot be empty".to_string(),
            ));
        }

        if self.database.connection_string().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "database connection string cannot be empty".to_string(),
            ));
        }

        if self.limits.max_message_length == 0 {
            return Err(ConfigError::InvalidConfig(
                "limits.max_message_length must be positive".to_string(),
            ));
        }

        if self.limits.message_page_size <= 0 {
            return Err(ConfigError::InvalidConfig(
                "limits.message_page_size must be positive".to_string(),
            ));
        }

        if let Some(ref webhook) = self.publisher.webhook_url {
            url::Url::parse(webhook).map_err(|e| {
                ConfigError::InvalidConfig(format!("publisher.webhook_url is not a valid URL: {e}"))
            })?;
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("CRYPTORAFTS_AUTH_TOKEN_SECRET") {
            self.auth.token_secret = SecretString::from(value);
        }
        if let Ok(value) = std::env::var("CRYPTORAFTS_DATABASE_URL") {
            self.database.url = Some(value);
        }
        if let Ok(value) = std::env::var("OPENAI_API_KEY") {
            self.ai.api_key = Some(SecretString::from(value));
        }
        if let Ok(value) = std::env::var("N8N_WEBHOOK_URL") {
            self.publisher.webhook_url = Some(value);
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_token_ttl_minutes() -> i64 {
    12 * 60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_ai_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_ai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_message_length() -> usize {
    4000
}

fn default_message_page_size() -> i64 {
    50
}

fn default_room_event_buffer() -> usize {
    256
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_yaml() -> &'static str {
        r#"
server:
  port: 8090
auth:
  token_secret: "unit-test-secret"
database:
  filename: "/tmp/cryptorafts.db"
"#
    }

    #[test]
    fn parses_minimal_config_with_defaults() {
        let config: Config = serde_yaml::from_str(minimal_yaml()).expect("config parses");
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(config.server.port, 8090);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.ai.model, "gpt-4o-mini");
        assert_eq!(config.limits.message_page_size, 50);
        config.validate().expect("minimal config is valid");
    }

    #[test]
    fn sqlite_filename_maps_to_sqlite_backend() {
        let config: Config = serde_yaml::from_str(minimal_yaml()).expect("config parses");
        assert_eq!(config.database.db_type(), DbType::Sqlite);
        assert_eq!(
            config.database.sqlite_path().as_deref(),
            Some("/tmp/cryptorafts.db")
        );
        assert_eq!(config.database.max_connections(), Some(1));
    }

    #[test]
    fn rejects_empty_token_secret() {
        let yaml = r#"
server:
  port: 8090
auth:
  token_secret: ""
database:
  filename: "/tmp/cryptorafts.db"
"#;
        let config: Config = serde_yaml::from_str(yaml).expect("config parses");
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_malformed_webhook_url() {
        let yaml = r#"
server:
  port: 8090
auth:
  token_secret: "s"
database:
  filename: "/tmp/cryptorafts.db"
publisher:
  webhook_url: "not a url"
"#;
        let config: Config = serde_yaml::from_str(yaml).expect("config parses");
        assert!(config.validate().is_err());
    }
}
