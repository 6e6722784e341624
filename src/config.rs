use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Top-level application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Recipe provider settings
    #[serde(default)]
    pub provider: ProviderSettings,
    /// Backend REST API settings
    #[serde(default)]
    pub backend: BackendSettings,
    /// Results shown per page (12 for the discover grid, 10 for lists)
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Search/detail cache time-to-live in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

/// Settings for the third-party recipe APIs
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderSettings {
    /// Spoonacular API key (can also be set via RECIPES__PROVIDER__API_KEY
    /// or the SPOONACULAR_API_KEY environment variable)
    pub api_key: Option<String>,
    /// Base URL for the Spoonacular API
    #[serde(default = "default_spoonacular_url")]
    pub spoonacular_url: String,
    /// Base URL for TheMealDB API
    #[serde(default = "default_mealdb_url")]
    pub mealdb_url: String,
    /// Maximum results requested per keyword search
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
    /// Maximum results requested per ingredient search
    #[serde(default = "default_ingredient_limit")]
    pub ingredient_limit: u32,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            spoonacular_url: default_spoonacular_url(),
            mealdb_url: default_mealdb_url(),
            search_limit: default_search_limit(),
            ingredient_limit: default_ingredient_limit(),
        }
    }
}

/// Settings for the persistence backend
#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    /// Base URL of the backend REST API
    #[serde(default = "default_backend_url")]
    pub base_url: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
        }
    }
}

// Default value functions
fn default_page_size() -> usize {
    12
}

fn default_cache_ttl_secs() -> u64 {
    600
}

fn default_timeout() -> u64 {
    30
}

fn default_spoonacular_url() -> String {
    "https://api.spoonacular.com".to_string()
}

fn default_mealdb_url() -> String {
    "https://www.themealdb.com/api/json/v1/1".to_string()
}

fn default_search_limit() -> u32 {
    100
}

fn default_ingredient_limit() -> u32 {
    50
}

fn default_backend_url() -> String {
    "http://localhost:5000/api".to_string()
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPES__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPES__PROVIDER__API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            // Optional config file (can be missing)
            .add_source(File::with_name("config").required(false))
            // Use double underscore for nested: RECIPES__PROVIDER__API_KEY
            .add_source(
                Environment::with_prefix("RECIPES")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Cache entry lifetime for search and detail results
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Timeout applied to every outgoing HTTP request
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl ProviderSettings {
    /// Resolved provider API key: config first, then SPOONACULAR_API_KEY
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("SPOONACULAR_API_KEY").ok())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderSettings::default(),
            backend: BackendSettings::default(),
            page_size: default_page_size(),
            cache_ttl_secs: default_cache_ttl_secs(),
            timeout: default_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        assert_eq!(default_page_size(), 12);
        assert_eq!(default_cache_ttl_secs(), 600);
        assert_eq!(default_timeout(), 30);
        assert_eq!(default_search_limit(), 100);
        assert_eq!(default_ingredient_limit(), 50);
    }

    #[test]
    fn test_provider_settings_default() {
        let settings = ProviderSettings::default();
        assert!(settings.api_key.is_none());
        assert_eq!(settings.spoonacular_url, "https://api.spoonacular.com");
        assert!(settings.mealdb_url.contains("themealdb.com"));
    }

    #[test]
    fn test_app_config_default_ttl_is_ten_minutes() {
        let config = AppConfig::default();
        assert_eq!(config.cache_ttl(), Duration::from_secs(10 * 60));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_configured_api_key_wins_over_environment() {
        let settings = ProviderSettings {
            api_key: Some("from-config".to_string()),
            ..ProviderSettings::default()
        };
        assert_eq!(settings.resolved_api_key().as_deref(), Some("from-config"));
    }
}
