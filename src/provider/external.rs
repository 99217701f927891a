use super::listing::{
    blob_name, default_version_file, parse_default_version, parse_listing, Listing,
};
use super::{Memo, PlatformVersionInfo, ProviderError, VersionOrigin, VersionProvider};
use anyhow::{Context, Result};
use sha2::{Digest, Sha512};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// SDK source delegated to the host, such as an artifact cache populated on demand
pub trait ExternalSdkSource: Send + Sync {
    /// Raw listing document of a platform
    fn platform_metadata(&self, platform: &str) -> Result<String>;

    /// Text content of a small blob, such as the default-version file
    fn blob_text(&self, platform: &str, blob: &str) -> Result<String>;

    /// Path of a cached blob whose checksum matches, if present
    fn cached_blob(&self, platform: &str, blob: &str, checksum: &str) -> Option<PathBuf>;
}

/// External source backed by a directory the host agent fills
///
/// Layout: `<root>/<platform>/<platform>` holds the listing and
/// `<root>/<platform>/<blob>` holds each downloaded blob.
#[derive(Debug, Clone)]
pub struct DirectoryExternalSource {
    root: PathBuf,
}

impl DirectoryExternalSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ExternalSdkSource for DirectoryExternalSource {
    fn platform_metadata(&self, platform: &str) -> Result<String> {
        let path = self.root.join(platform).join(platform);
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read SDK metadata: {}", path.display()))
    }

    fn blob_text(&self, platform: &str, blob: &str) -> Result<String> {
        let path = self.root.join(platform).join(blob);
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read SDK blob: {}", path.display()))
    }

    fn cached_blob(&self, platform: &str, blob: &str, checksum: &str) -> Option<PathBuf> {
        let path = self.root.join(platform).join(blob);
        let bytes = fs::read(&path).ok()?;
        let actual = hex::encode(Sha512::digest(&bytes));
        if actual.eq_ignore_ascii_case(checksum.trim()) {
            Some(path)
        } else {
            warn!(
                platform,
                blob,
                path = %path.display(),
                "Cached SDK blob checksum does not match, treating it as corrupted"
            );
            None
        }
    }
}

struct ExternalListing {
    info: PlatformVersionInfo,
    listing: Listing,
}

/// Versions listed by an [`ExternalSdkSource`]
pub struct ExternalVersionProvider {
    platform: String,
    os_flavor: String,
    source: Arc<dyn ExternalSdkSource>,
    cache: Memo<ExternalListing>,
}

impl ExternalVersionProvider {
    pub fn new(platform: &str, os_flavor: &str, source: Arc<dyn ExternalSdkSource>) -> Self {
        Self {
            platform: platform.to_string(),
            os_flavor: os_flavor.to_string(),
            source,
            cache: Memo::new(),
        }
    }

    fn load(&self) -> Result<ExternalListing, ProviderError> {
        info!(platform = %self.platform, "Getting supported versions from the external SDK source");

        let metadata = self
            .source
            .platform_metadata(&self.platform)
            .map_err(|e| self.failure(format!("{:#}", e)))?;
        let listing = parse_listing(&metadata).map_err(|details| self.failure(details))?;

        let default_version = match listing.default_version.clone() {
            Some(default) => Some(default),
            None => {
                let text = self
                    .source
                    .blob_text(&self.platform, &default_version_file(&self.os_flavor))
                    .map_err(|e| self.failure(format!("{:#}", e)))?;
                parse_default_version(&text)
            }
        };

        let info = PlatformVersionInfo::new(
            &self.platform,
            listing.supported_versions(&self.os_flavor),
            default_version,
            VersionOrigin::External,
        )?;
        Ok(ExternalListing { info, listing })
    }

    /// Locally cached SDK archive for a version, verified against the listing checksum
    pub fn cached_archive(&self, version: &str) -> Option<PathBuf> {
        let loaded = self.cache.get_or_try_init(|| self.load()).ok()?;
        let blob = loaded.listing.blob_for_version(&self.os_flavor, version);
        let (name, checksum) = match blob {
            Some(blob) => (blob.name.clone(), blob.checksum()?.to_string()),
            None => return None,
        };
        let name = if name.is_empty() {
            blob_name(&self.platform, &self.os_flavor, version)
        } else {
            name
        };
        self.source.cached_blob(&self.platform, &name, &checksum)
    }

    fn failure(&self, details: String) -> ProviderError {
        ProviderError::External {
            platform: self.platform.clone(),
            details,
        }
    }
}

impl VersionProvider for ExternalVersionProvider {
    fn platform(&self) -> &str {
        &self.platform
    }

    fn version_info(&self) -> Result<PlatformVersionInfo, ProviderError> {
        self.cache
            .get_or_try_init(|| self.load())
            .map(|loaded| loaded.info.clone())
    }
}
