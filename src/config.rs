//! Configuration management for buildsmith
//!
//! Settings are read from `BUILDSMITH_*` environment variables with sensible
//! defaults. The CLI layers `--set KEY=VALUE` overrides on top of the environment,
//! using the same key names with or without the `BUILDSMITH_` prefix.
//!
//! # Environment Variables
//!
//! ## Global settings
//! - `BUILDSMITH_ENABLE_DYNAMIC_INSTALL`: Install missing platform versions at build time - default: "false"
//! - `BUILDSMITH_ENABLE_MULTIPLATFORM_BUILD`: Build every detected platform - default: "false"
//! - `BUILDSMITH_PLATFORM_NAME`: Only consider this platform
//! - `BUILDSMITH_PLATFORM_VERSION`: Explicit version for `BUILDSMITH_PLATFORM_NAME`
//! - `BUILDSMITH_SDK_STORAGE_BASE_URL`: Base URL of the SDK storage listing
//! - `BUILDSMITH_OS_FLAVOR`: OS flavor used to select SDK blobs - default: "bullseye"
//! - `BUILDSMITH_PLATFORMS_ROOT`: Root of pre-installed platforms - default: "/opt"
//! - `BUILDSMITH_DYNAMIC_INSTALL_ROOT`: Target root for dynamic installs - default: "/tmp/buildsmith/platforms"
//! - `BUILDSMITH_INSTALLER_SCRIPT`: Installer invoked by generated scripts - default: "/opt/buildsmith/install-platform"
//! - `BUILDSMITH_ENABLE_EXTERNAL_SDK_PROVIDER`: Try the external SDK source first - default: "false"
//! - `BUILDSMITH_EXTERNAL_SDK_DIR`: Directory served by the external SDK source - default: "/var/buildsmith/sdks"
//! - `BUILDSMITH_REQUEST_TIMEOUT`: HTTP timeout in seconds - default: "30"
//! - `BUILDSMITH_PARALLEL_DETECTION`: Run detectors concurrently - default: "true"
//! - `BUILDSMITH_DISABLE_RECURSIVE_LOOKUP`: Only look at the top level for pattern signals - default: "false"
//!
//! ## Per-platform settings
//! `<KEY>` is the platform's option key (`PYTHON`, `NODE`, `GO`, `DOTNET`, ...):
//! - `BUILDSMITH_<KEY>_VERSION`: Explicit version
//! - `BUILDSMITH_<KEY>_DEFAULT_VERSION`: Version used when the repository pins none
//! - `BUILDSMITH_DISABLE_<KEY>_BUILD`: Skip the platform even if detected
//! - `BUILDSMITH_<KEY>_PROJECT`: Explicit project file, relative to the source directory
//! - `BUILDSMITH_<KEY>_SUPPORTED_VERSIONS`: Comma separated list replacing the on-disk scan
//!
//! # Example
//!
//! ```
//! use buildsmith::BuildOptions;
//!
//! let options = BuildOptions::from_pairs([
//!     ("ENABLE_DYNAMIC_INSTALL", "true"),
//!     ("SDK_STORAGE_BASE_URL", "https://sdks.example.com"),
//!     ("PYTHON_DEFAULT_VERSION", "3.11"),
//! ])
//! .unwrap();
//!
//! options.validate().unwrap();
//! assert!(options.enable_dynamic_install);
//! assert_eq!(
//!     options.platform_options("PYTHON").default_version.as_deref(),
//!     Some("3.11")
//! );
//! ```

use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Prefix shared by every environment variable
pub const ENV_PREFIX: &str = "BUILDSMITH_";

/// Default values for configuration
const DEFAULT_OS_FLAVOR: &str = "bullseye";
const DEFAULT_PLATFORMS_ROOT: &str = "/opt";
const DEFAULT_DYNAMIC_INSTALL_ROOT: &str = "/tmp/buildsmith/platforms";
const DEFAULT_INSTALLER_SCRIPT: &str = "/opt/buildsmith/install-platform";
const DEFAULT_EXTERNAL_SDK_DIR: &str = "/var/buildsmith/sdks";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A setting could not be parsed
    #[error("Invalid value for BUILDSMITH_{key}: '{value}' ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// A `KEY=VALUE` override was not in that form
    #[error("Invalid setting '{0}', expected KEY=VALUE")]
    MalformedSetting(String),

    /// Dynamic installation needs a storage URL
    #[error("SDK storage base URL is not configured. Set BUILDSMITH_SDK_STORAGE_BASE_URL")]
    MissingSdkStorageUrl,

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Options for a single platform, looked up by its option key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformOptions {
    pub version: Option<String>,
    pub default_version: Option<String>,
    pub disabled: bool,
    pub project: Option<String>,
    pub supported_versions: Option<Vec<String>>,
}

/// Options for one build invocation
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub enable_dynamic_install: bool,
    pub enable_multi_platform: bool,
    pub platform_name: Option<String>,
    pub platform_version: Option<String>,
    pub sdk_storage_base_url: Option<String>,
    pub os_flavor: String,
    pub platforms_root: PathBuf,
    pub dynamic_install_root: PathBuf,
    pub installer_script: PathBuf,
    pub enable_external_sdk_provider: bool,
    pub external_sdk_dir: PathBuf,
    pub request_timeout: Duration,
    pub parallel_detection: bool,
    pub disable_recursive_lookup: bool,
    settings: BTreeMap<String, String>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            enable_dynamic_install: false,
            enable_multi_platform: false,
            platform_name: None,
            platform_version: None,
            sdk_storage_base_url: None,
            os_flavor: DEFAULT_OS_FLAVOR.to_string(),
            platforms_root: PathBuf::from(DEFAULT_PLATFORMS_ROOT),
            dynamic_install_root: PathBuf::from(DEFAULT_DYNAMIC_INSTALL_ROOT),
            installer_script: PathBuf::from(DEFAULT_INSTALLER_SCRIPT),
            enable_external_sdk_provider: false,
            external_sdk_dir: PathBuf::from(DEFAULT_EXTERNAL_SDK_DIR),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            parallel_detection: true,
            disable_recursive_lookup: false,
            settings: BTreeMap::new(),
        }
    }
}

impl BuildOptions {
    /// Loads options from `BUILDSMITH_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_settings(collect_env_settings(), &[])
    }

    /// Loads options from the environment, then applies `KEY=VALUE` overrides
    pub fn from_env_with_overrides(overrides: &[String]) -> Result<Self, ConfigError> {
        Self::from_settings(collect_env_settings(), overrides)
    }

    /// Builds options from explicit key/value pairs, ignoring the environment
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self, ConfigError>
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let settings = pairs
            .into_iter()
            .map(|(k, v)| (normalize_key(k.as_ref()), v.into()))
            .collect();
        Self::from_settings(settings, &[])
    }

    fn from_settings(
        mut settings: BTreeMap<String, String>,
        overrides: &[String],
    ) -> Result<Self, ConfigError> {
        for entry in overrides {
            let (key, value) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::MalformedSetting(entry.clone()))?;
            settings.insert(normalize_key(key), value.trim().to_string());
        }

        let defaults = Self::default();
        let request_timeout = match non_empty(&settings, "REQUEST_TIMEOUT") {
            Some(raw) => Duration::from_secs(raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidValue {
                    key: "REQUEST_TIMEOUT".to_string(),
                    value: raw.to_string(),
                    reason: e.to_string(),
                }
            })?),
            None => defaults.request_timeout,
        };

        Ok(Self {
            enable_dynamic_install: flag(&settings, "ENABLE_DYNAMIC_INSTALL", false)?,
            enable_multi_platform: flag(&settings, "ENABLE_MULTIPLATFORM_BUILD", false)?,
            platform_name: non_empty(&settings, "PLATFORM_NAME").map(str::to_lowercase),
            platform_version: non_empty(&settings, "PLATFORM_VERSION").map(str::to_string),
            sdk_storage_base_url: non_empty(&settings, "SDK_STORAGE_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
            os_flavor: non_empty(&settings, "OS_FLAVOR")
                .map(str::to_string)
                .unwrap_or(defaults.os_flavor),
            platforms_root: non_empty(&settings, "PLATFORMS_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.platforms_root),
            dynamic_install_root: non_empty(&settings, "DYNAMIC_INSTALL_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.dynamic_install_root),
            installer_script: non_empty(&settings, "INSTALLER_SCRIPT")
                .map(PathBuf::from)
                .unwrap_or(defaults.installer_script),
            enable_external_sdk_provider: flag(&settings, "ENABLE_EXTERNAL_SDK_PROVIDER", false)?,
            external_sdk_dir: non_empty(&settings, "EXTERNAL_SDK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.external_sdk_dir),
            request_timeout,
            parallel_detection: flag(&settings, "PARALLEL_DETECTION", true)?,
            disable_recursive_lookup: flag(&settings, "DISABLE_RECURSIVE_LOOKUP", false)?,
            settings,
        })
    }

    /// Adds or replaces a setting and re-derives every option from the result
    pub fn with_setting(self, key: &str, value: impl Into<String>) -> Result<Self, ConfigError> {
        let mut settings = self.settings;
        settings.insert(normalize_key(key), value.into());
        Self::from_settings(settings, &[])
    }

    /// Returns the options of the platform with the given option key
    pub fn platform_options(&self, key: &str) -> PlatformOptions {
        let key = key.to_uppercase();
        PlatformOptions {
            version: non_empty(&self.settings, &format!("{key}_VERSION")).map(str::to_string),
            default_version: non_empty(&self.settings, &format!("{key}_DEFAULT_VERSION"))
                .map(str::to_string),
            disabled: non_empty(&self.settings, &format!("DISABLE_{key}_BUILD"))
                .and_then(parse_bool)
                .unwrap_or(false),
            project: non_empty(&self.settings, &format!("{key}_PROJECT")).map(str::to_string),
            supported_versions: non_empty(&self.settings, &format!("{key}_SUPPORTED_VERSIONS"))
                .map(|list| {
                    list.split(',')
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(str::to_string)
                        .collect()
                }),
        }
    }

    /// Returns the SDK storage URL, failing when it is not configured
    pub fn require_sdk_storage_url(&self) -> Result<&str, ConfigError> {
        self.sdk_storage_base_url
            .as_deref()
            .ok_or(ConfigError::MissingSdkStorageUrl)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if let Some(url) = &self.sdk_storage_base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::ValidationFailed(format!(
                    "SDK storage base URL must start with http:// or https://: {}",
                    url
                )));
            }
        }

        if self.platform_version.is_some() && self.platform_name.is_none() {
            return Err(ConfigError::ValidationFailed(
                "A platform version was given without a platform name".to_string(),
            ));
        }

        for (key, value) in &self.settings {
            if key.starts_with("DISABLE_") && key.ends_with("_BUILD") && parse_bool(value).is_none()
            {
                return Err(ConfigError::InvalidValue {
                    key: key.clone(),
                    value: value.clone(),
                    reason: "expected true or false".to_string(),
                });
            }
        }

        Ok(())
    }
}

fn collect_env_settings() -> BTreeMap<String, String> {
    env::vars()
        .filter(|(k, _)| k.starts_with(ENV_PREFIX))
        .map(|(k, v)| (normalize_key(&k), v))
        .collect()
}

fn normalize_key(key: &str) -> String {
    let key = key.trim().to_uppercase();
    key.strip_prefix(ENV_PREFIX)
        .map(str::to_string)
        .unwrap_or(key)
}

fn non_empty<'a>(settings: &'a BTreeMap<String, String>, key: &str) -> Option<&'a str> {
    settings
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn flag(settings: &BTreeMap<String, String>, key: &str, default: bool) -> Result<bool, ConfigError> {
    match non_empty(settings, key) {
        None => Ok(default),
        Some(raw) => parse_bool(raw).ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
