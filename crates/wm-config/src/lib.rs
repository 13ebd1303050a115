//! Configuration management for multi-website view resolution.
//!
//! Parses `wm.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `websites.default_namespace`
//! - `validation.grammar_version_threshold`
//! - `bundle.path`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override site bundle path.
    pub bundle_path: Option<PathBuf>,
    /// Override cache enabled flag.
    pub cache_enabled: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "wm.toml";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Website lookup configuration.
    pub websites: WebsitesConfig,
    /// Resolution cache configuration.
    pub cache: CacheConfig,
    /// View validation configuration.
    pub validation: ValidationConfig,
    /// Site bundle configuration (path as a relative string from TOML).
    bundle: BundleConfigRaw,

    /// Resolved site bundle path (set after loading).
    #[serde(skip)]
    pub bundle_path: PathBuf,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Website lookup configuration.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WebsitesConfig {
    /// Website used when no website matches the request host.
    pub default_website_id: u64,
    /// Module prefix for bare template names.
    pub default_namespace: String,
}

impl Default for WebsitesConfig {
    fn default() -> Self {
        Self {
            default_website_id: 1,
            default_namespace: "website".to_owned(),
        }
    }
}

/// Resolution cache configuration.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// View validation configuration.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidationConfig {
    /// Root `version` at or above which structured views skip the legacy
    /// grammar check.
    pub grammar_version_threshold: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            grammar_version_threshold: "7.0".to_owned(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct BundleConfigRaw {
    path: Option<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`bundle.path`").
        field: String,
        /// Error message (e.g., "${`SITE_DIR`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `wm.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(bundle_path) = &settings.bundle_path {
            self.bundle_path.clone_from(bundle_path);
        }
        if let Some(cache_enabled) = settings.cache_enabled {
            self.cache.enabled = cache_enabled;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            websites: WebsitesConfig::default(),
            cache: CacheConfig::default(),
            validation: ValidationConfig::default(),
            bundle: BundleConfigRaw::default(),
            bundle_path: base.join("site.yaml"),
            config_path: None,
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.websites.default_website_id == 0 {
            return Err(ConfigError::Validation(
                "websites.default_website_id cannot be 0".to_owned(),
            ));
        }

        let namespace = &self.websites.default_namespace;
        require_non_empty(namespace, "websites.default_namespace")?;
        if namespace.contains('.') {
            return Err(ConfigError::Validation(
                "websites.default_namespace cannot contain '.'".to_owned(),
            ));
        }

        let threshold = &self.validation.grammar_version_threshold;
        require_non_empty(threshold, "validation.grammar_version_threshold")?;
        if threshold.split('.').any(|part| part.parse::<u32>().is_err()) {
            return Err(ConfigError::Validation(format!(
                "validation.grammar_version_threshold must be a dotted version, got {threshold:?}"
            )));
        }

        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.websites.default_namespace = expand::expand_env(
            &self.websites.default_namespace,
            "websites.default_namespace",
        )?;
        self.validation.grammar_version_threshold = expand::expand_env(
            &self.validation.grammar_version_threshold,
            "validation.grammar_version_threshold",
        )?;
        if let Some(path) = &self.bundle.path {
            self.bundle.path = Some(expand::expand_env(path, "bundle.path")?);
        }
        Ok(())
    }

    /// Resolve relative paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.bundle_path = config_dir.join(self.bundle.path.as_deref().unwrap_or("site.yaml"));
    }
}
