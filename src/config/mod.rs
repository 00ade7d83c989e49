mod file_config;

pub use file_config::{CatalogConfig, FileConfig};

use anyhow::{bail, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::catalog::{CatalogAuth, CatalogEndpoints, DEFAULT_SEARCH_LIMIT};
use crate::classifier::ClassifierSettings;

pub const ENV_SPOTIFY_TOKEN: &str = "EMOTUNE_SPOTIFY_TOKEN";
pub const ENV_SPOTIFY_CLIENT_ID: &str = "EMOTUNE_SPOTIFY_CLIENT_ID";
pub const ENV_SPOTIFY_CLIENT_SECRET: &str = "EMOTUNE_SPOTIFY_CLIENT_SECRET";

pub const DEFAULT_PORT: u16 = 8384;
pub const DEFAULT_CATALOG_TIMEOUT_SECS: u64 = 30;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub model_dir: Option<PathBuf>,
    pub max_length: usize,
    pub search_limit: u32,
    pub port: u16,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            model_dir: None,
            max_length: ClassifierSettings::default().max_length,
            search_limit: DEFAULT_SEARCH_LIMIT,
            port: DEFAULT_PORT,
        }
    }
}

/// Settings for the external playlist catalog
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub auth: Option<CatalogAuth>,
    pub endpoints: CatalogEndpoints,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model_dir: Option<PathBuf>,
    pub classifier: ClassifierSettings,
    pub search_limit: u32,
    pub port: u16,
    pub server_token: Option<String>,
    pub catalog: CatalogSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present. Catalog secrets come
    /// from the environment first.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        Self::resolve_with_env(cli, file_config, |key| std::env::var(key).ok())
    }

    pub fn resolve_with_env<F>(cli: &CliConfig, file_config: Option<FileConfig>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = file_config.unwrap_or_default();

        let model_dir = file
            .model_dir
            .map(PathBuf::from)
            .or_else(|| cli.model_dir.clone());

        let max_length = file.max_length.unwrap_or(cli.max_length);
        if max_length == 0 {
            bail!("max_length must be greater than zero");
        }

        let search_limit = file.search_limit.unwrap_or(cli.search_limit);
        if !(1..=50).contains(&search_limit) {
            bail!("search_limit must be between 1 and 50, got {}", search_limit);
        }

        let classifier = ClassifierSettings {
            max_length,
            intra_threads: file
                .intra_threads
                .unwrap_or(ClassifierSettings::default().intra_threads)
                .max(1),
        };

        let catalog_file = file.catalog.unwrap_or_default();
        let defaults = CatalogEndpoints::default();
        let endpoints = CatalogEndpoints {
            api_base: catalog_file.api_base.unwrap_or(defaults.api_base),
            accounts_base: catalog_file.accounts_base.unwrap_or(defaults.accounts_base),
        };
        let auth = CatalogAuth::resolve(
            env(ENV_SPOTIFY_TOKEN).or(catalog_file.access_token),
            env(ENV_SPOTIFY_CLIENT_ID).or(catalog_file.client_id),
            env(ENV_SPOTIFY_CLIENT_SECRET).or(catalog_file.client_secret),
        );
        let timeout = Duration::from_secs(
            catalog_file
                .timeout_secs
                .unwrap_or(DEFAULT_CATALOG_TIMEOUT_SECS),
        );

        Ok(AppConfig {
            model_dir,
            classifier,
            search_limit,
            port: file.port.unwrap_or(cli.port),
            server_token: file.server_token.filter(|t| !t.is_empty()),
            catalog: CatalogSettings {
                auth,
                endpoints,
                timeout,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_file() {
        let config = AppConfig::resolve_with_env(&CliConfig::default(), None, no_env).unwrap();
        assert_eq!(config.search_limit, 5);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.classifier.max_length, 128);
        assert!(config.model_dir.is_none());
        assert!(config.catalog.auth.is_none());
        assert_eq!(config.catalog.endpoints.api_base, "https://api.spotify.com/v1");
        assert_eq!(config.catalog.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_file_overrides_cli() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
model_dir = "/models/goemotions"
search_limit = 10
port = 9000

[catalog]
access_token = "file-token"
api_base = "http://localhost:1234/v1"
timeout_secs = 3
"#
        )
        .unwrap();

        let cli = CliConfig {
            model_dir: Some(PathBuf::from("/cli/model")),
            search_limit: 2,
            ..Default::default()
        };
        let file_config = FileConfig::load(file.path()).unwrap();
        let config = AppConfig::resolve_with_env(&cli, Some(file_config), no_env).unwrap();

        assert_eq!(config.model_dir, Some(PathBuf::from("/models/goemotions")));
        assert_eq!(config.search_limit, 10);
        assert_eq!(config.port, 9000);
        assert_eq!(config.catalog.auth, Some(CatalogAuth::Token("file-token".to_string())));
        assert_eq!(config.catalog.endpoints.api_base, "http://localhost:1234/v1");
        assert_eq!(config.catalog.endpoints.accounts_base, "https://accounts.spotify.com");
        assert_eq!(config.catalog.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_env_credentials_win_over_file() {
        let file_config = FileConfig {
            catalog: Some(CatalogConfig {
                client_id: Some("file-id".to_string()),
                client_secret: Some("file-secret".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let env = |key: &str| match key {
            ENV_SPOTIFY_CLIENT_ID => Some("env-id".to_string()),
            _ => None,
        };

        let config = AppConfig::resolve_with_env(&CliConfig::default(), Some(file_config), env).unwrap();
        assert_eq!(
            config.catalog.auth,
            Some(CatalogAuth::ClientCredentials {
                client_id: "env-id".to_string(),
                client_secret: "file-secret".to_string(),
            })
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let cli = CliConfig {
            search_limit: 0,
            ..Default::default()
        };
        assert!(AppConfig::resolve_with_env(&cli, None, no_env).is_err());

        let file_config = FileConfig {
            max_length: Some(0),
            ..Default::default()
        };
        assert!(AppConfig::resolve_with_env(&CliConfig::default(), Some(file_config), no_env).is_err());
    }

    #[test]
    fn test_unparseable_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "search_limit = \"lots\"").unwrap();
        assert!(FileConfig::load(file.path()).is_err());
        assert!(FileConfig::load(std::path::Path::new("/does/not/exist.toml")).is_err());
    }
}
