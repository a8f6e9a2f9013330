use serde::{Deserialize, Serialize};
use shared::FeatureScale;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const DEFAULT_CONFIG_PATH: &str = "config/service.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("Invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub auth: AuthConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
    pub feature_scale: FeatureScale,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_body_bytes: usize,
    pub max_image_dimension: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8081,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("model/clf.json"),
            feature_scale: FeatureScale::default(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "password123".to_string(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 1024 * 1024,
            max_image_dimension: 4096,
        }
    }
}

impl ServiceConfig {
    /// Reads the YAML file named by `DIGITS_CONFIG` (or the default path) and
    /// applies environment overrides on top. A missing file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("DIGITS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = if Path::new(&path).exists() {
            Self::from_file(&path)?
        } else {
            log::warn!("Config file {} not found, using defaults", path);
            Self::default()
        };
        config.apply_overrides(|name| env::var(name).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("BIND_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = parse_env("PORT", port)?;
        }
        if let Some(path) = lookup("MODEL_PATH") {
            self.model.path = PathBuf::from(path);
        }
        if let Some(scale) = lookup("FEATURE_SCALE") {
            self.model.feature_scale = FeatureScale::from_str(&scale)
                .map_err(|_| ConfigError::InvalidEnv {
                    name: "FEATURE_SCALE",
                    value: scale,
                })?;
        }
        if let Some(username) = lookup("BASIC_AUTH_USERNAME") {
            self.auth.username = username;
        }
        if let Some(password) = lookup("BASIC_AUTH_PASSWORD") {
            self.auth.password = password;
        }
        if let Some(bytes) = lookup("MAX_BODY_BYTES") {
            self.limits.max_body_bytes = parse_env("MAX_BODY_BYTES", bytes)?;
        }
        if let Some(dim) = lookup("MAX_IMAGE_DIMENSION") {
            self.limits.max_image_dimension = parse_env("MAX_IMAGE_DIMENSION", dim)?;
        }
        Ok(())
    }
}

fn parse_env<T: FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { name, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = ServiceConfig::from_yaml("server:\n  port: 9000\nmodel:\n  feature_scale: raw\n")
            .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.model.feature_scale, FeatureScale::Raw);
        assert_eq!(config.model.path, PathBuf::from("model/clf.json"));
        assert_eq!(config.auth.username, "admin");
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let mut config = ServiceConfig::from_yaml("server:\n  port: 9000\n").unwrap();
        let vars: HashMap<&str, &str> = HashMap::from([
            ("PORT", "7000"),
            ("FEATURE_SCALE", "raw"),
            ("BASIC_AUTH_USERNAME", "ops"),
            ("MODEL_PATH", "/srv/model.json"),
        ]);
        config
            .apply_overrides(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.model.feature_scale, FeatureScale::Raw);
        assert_eq!(config.auth.username, "ops");
        assert_eq!(config.auth.password, "password123");
        assert_eq!(config.model.path, PathBuf::from("/srv/model.json"));
        assert_eq!(config.bind_address(), "0.0.0.0:7000");
    }

    #[test]
    fn bad_env_value_is_rejected() {
        let mut config = ServiceConfig::default();
        let err = config
            .apply_overrides(|name| (name == "PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name: "PORT", .. }));

        let err = config
            .apply_overrides(|name| (name == "FEATURE_SCALE").then(|| "0-16".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { name: "FEATURE_SCALE", .. }));
    }

    #[test]
    fn shipped_config_file_parses() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../config/service.yaml");
        let config = ServiceConfig::from_file(path).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8081");
        assert_eq!(config.model.path, PathBuf::from("model/clf.json"));
        assert_eq!(config.model.feature_scale, FeatureScale::Digits16);
        assert_eq!(config.limits.max_body_bytes, 1024 * 1024);
        assert_eq!(config.limits.max_image_dimension, 4096);
    }

    #[test]
    fn unreadable_or_invalid_files_are_reported() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("missing.yaml");
        assert!(matches!(
            ServiceConfig::from_file(missing.to_str().unwrap()),
            Err(ConfigError::Read { .. })
        ));

        let broken = dir.path().join("broken.yaml");
        std::fs::write(&broken, "server: [1, 2").unwrap();
        assert!(matches!(
            ServiceConfig::from_file(broken.to_str().unwrap()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn debug_output_hides_password() {
        let rendered = format!("{:?}", ServiceConfig::default());
        assert!(!rendered.contains("password123"));
    }
}
