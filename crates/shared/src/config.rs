//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtSettings,
    /// Currency allow-list and fallback rate.
    #[serde(default)]
    pub currency: CurrencyConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    15
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration as loaded from config sources.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    86_400 // 24 hours
}

/// Currency settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyConfig {
    /// Currency codes accepted for accounts and transactions.
    #[serde(default = "default_allowed_currencies")]
    pub allowed: Vec<String>,
    /// Base currency assigned to new families.
    #[serde(default = "default_base_currency")]
    pub default_base: String,
    /// Source currency of the fallback pair.
    #[serde(default = "default_fallback_from")]
    pub fallback_from: String,
    /// Target currency of the fallback pair.
    #[serde(default = "default_fallback_to")]
    pub fallback_to: String,
    /// Rate used by reporting and conversion when no stored rate exists.
    #[serde(default = "default_fallback_rate")]
    pub fallback_rate: Decimal,
}

fn default_allowed_currencies() -> Vec<String> {
    vec!["RSD".to_string(), "EUR".to_string()]
}

fn default_base_currency() -> String {
    "RSD".to_string()
}

fn default_fallback_from() -> String {
    "EUR".to_string()
}

fn default_fallback_to() -> String {
    "RSD".to_string()
}

fn default_fallback_rate() -> Decimal {
    Decimal::new(1175, 1) // 117.5
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            allowed: default_allowed_currencies(),
            default_base: default_base_currency(),
            fallback_from: default_fallback_from(),
            fallback_to: default_fallback_to(),
            fallback_rate: default_fallback_rate(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, later ones winning: `config/default`, `config/{RUN_MODE}`,
    /// then `FAMLEDGER__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("FAMLEDGER")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("currency.allowed")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
