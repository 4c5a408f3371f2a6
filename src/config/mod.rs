use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub keycloak: KeycloakConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeycloakConfig {
    pub base_url: String,
    pub realm: String,
    pub audience: String,
}

impl KeycloakConfig {
    /// Required token issuer: the realm URL.
    pub fn issuer(&self) -> String {
        format!("{}/realms/{}", self.base_url.trim_end_matches('/'), self.realm)
    }

    /// The realm's published key-set endpoint.
    pub fn jwks_url(&self) -> String {
        format!("{}/protocol/openid-connect/certs", self.issuer())
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            _ => Environment::Development,
        };

        // Environment presets, then specific env var overrides
        match environment {
            Environment::Production => Self::production(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("KEYCLOAK_BASE_URL") {
            self.keycloak.base_url = v;
        }
        if let Ok(v) = env::var("KEYCLOAK_REALM") {
            self.keycloak.realm = v;
        }
        if let Ok(v) = env::var("KEYCLOAK_AUDIENCE") {
            self.keycloak.audience = v;
        }
        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            keycloak: KeycloakConfig {
                base_url: "http://localhost:8080".to_string(),
                realm: "marquei".to_string(),
                audience: "marquei-api".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 3000 },
            keycloak: KeycloakConfig {
                base_url: "https://auth.marquei.app".to_string(),
                realm: "marquei".to_string(),
                audience: "marquei-api".to_string(),
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
