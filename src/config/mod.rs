use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub sanitize: SanitizeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub rest: RestConfig,
    pub documents: DocumentsConfig,
}

/// Public content API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    /// Reject/drop query and body keys that are not recognized
    pub strict_params: bool,
    pub max_limit: Option<u64>,
}

/// Programmatic document service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsConfig {
    pub strict_params: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizeConfig {
    pub debug_logging: bool,
    pub max_populate_depth: Option<usize>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Ok(v) = env::var("API_REST_STRICT_PARAMS") {
            self.api.rest.strict_params = v.parse().unwrap_or(self.api.rest.strict_params);
        }
        if let Ok(v) = env::var("API_REST_MAX_LIMIT") {
            self.api.rest.max_limit = v.parse().ok();
        }
        if let Ok(v) = env::var("API_DOCUMENTS_STRICT_PARAMS") {
            self.api.documents.strict_params = v.parse().unwrap_or(self.api.documents.strict_params);
        }

        // Sanitize overrides
        if let Ok(v) = env::var("SANITIZE_DEBUG_LOGGING") {
            self.sanitize.debug_logging = v.parse().unwrap_or(self.sanitize.debug_logging);
        }
        if let Ok(v) = env::var("SANITIZE_MAX_POPULATE_DEPTH") {
            self.sanitize.max_populate_depth = v.parse().ok();
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                rest: RestConfig {
                    strict_params: false,
                    max_limit: Some(1000),
                },
                documents: DocumentsConfig { strict_params: false },
            },
            sanitize: SanitizeConfig {
                debug_logging: true,
                max_populate_depth: Some(10),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                rest: RestConfig {
                    strict_params: true,
                    max_limit: Some(500),
                },
                documents: DocumentsConfig { strict_params: false },
            },
            sanitize: SanitizeConfig {
                debug_logging: false,
                max_populate_depth: Some(6),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                rest: RestConfig {
                    strict_params: true,
                    max_limit: Some(100),
                },
                documents: DocumentsConfig { strict_params: false },
            },
            sanitize: SanitizeConfig {
                debug_logging: false,
                max_populate_depth: Some(5),
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(!config.api.rest.strict_params);
        assert_eq!(config.api.rest.max_limit, Some(1000));
        assert!(config.sanitize.debug_logging);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.api.rest.strict_params);
        assert!(!config.api.documents.strict_params);
        assert_eq!(config.sanitize.max_populate_depth, Some(5));
    }
}
