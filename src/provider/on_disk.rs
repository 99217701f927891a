use super::{Memo, PlatformVersionInfo, ProviderError, VersionOrigin, VersionProvider};
use crate::version::{match_supported, VersionInfo};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// How installed versions are named under a platform's installation root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionLayout {
    /// Any name that parses as a version (`3.11.4`, `18.17.1`, `3.9.0b1`)
    SemVer,
    /// Only `major.minor` names (`1.18`)
    MajorMinor,
}

impl VersionLayout {
    pub fn accepts(&self, name: &str) -> bool {
        match self {
            VersionLayout::SemVer => VersionInfo::parse(name).is_ok(),
            VersionLayout::MajorMinor => major_minor_pattern().is_match(name),
        }
    }
}

fn major_minor_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+\.\d+$").expect("static regex is valid"))
}

/// Versions pre-installed in the build image
pub struct OnDiskVersionProvider {
    platform: String,
    install_dir: PathBuf,
    layout: VersionLayout,
    default_version: Option<String>,
    configured_versions: Option<Vec<String>>,
    cache: Memo<PlatformVersionInfo>,
}

impl OnDiskVersionProvider {
    pub fn new(
        platform: &str,
        install_dir: impl Into<PathBuf>,
        layout: VersionLayout,
        default_version: Option<&str>,
    ) -> Self {
        Self {
            platform: platform.to_string(),
            install_dir: install_dir.into(),
            layout,
            default_version: default_version.map(str::to_string),
            configured_versions: None,
            cache: Memo::new(),
        }
    }

    /// Replaces the directory scan with an explicit list
    pub fn with_configured_versions(mut self, versions: Option<Vec<String>>) -> Self {
        self.configured_versions = versions;
        self
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    fn scan(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.install_dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(
                    platform = %self.platform,
                    dir = %self.install_dir.display(),
                    error = %e,
                    "Installation root not readable"
                );
                return Vec::new();
            }
        };

        let mut versions: Vec<VersionInfo> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|name| self.layout.accepts(name))
            .filter_map(|name| VersionInfo::parse(&name).ok())
            .collect();
        versions.sort();
        versions.into_iter().map(|v| v.display().to_string()).collect()
    }

    fn compute(&self) -> Result<PlatformVersionInfo, ProviderError> {
        let supported = match &self.configured_versions {
            Some(configured) => configured.clone(),
            None => self.scan(),
        };

        if supported.is_empty() {
            return Err(ProviderError::Unavailable {
                platform: self.platform.clone(),
                reason: format!("nothing installed under {}", self.install_dir.display()),
            });
        }

        let default_version = match &self.default_version {
            Some(default) if match_supported(default, &supported).is_some() => Some(default.clone()),
            Some(default) => {
                let highest = supported.last().cloned();
                warn!(
                    platform = %self.platform,
                    default = %default,
                    fallback = ?highest,
                    "Configured default version is not installed, using the highest installed version"
                );
                highest
            }
            None => supported.last().cloned(),
        };

        PlatformVersionInfo::new(&self.platform, supported, default_version, VersionOrigin::OnDisk)
    }
}

impl VersionProvider for OnDiskVersionProvider {
    fn platform(&self) -> &str {
        &self.platform
    }

    fn version_info(&self) -> Result<PlatformVersionInfo, ProviderError> {
        self.cache.get_or_try_init(|| self.compute()).cloned()
    }
}
