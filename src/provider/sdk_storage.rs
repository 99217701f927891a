use super::listing::{default_version_file, parse_default_version, parse_listing};
use super::{
    ListingTransport, Memo, PlatformVersionInfo, ProviderError, VersionOrigin, VersionProvider,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Versions installable from the remote SDK storage
pub struct SdkStorageVersionProvider {
    platform: String,
    base_url: Option<String>,
    os_flavor: String,
    transport: Arc<dyn ListingTransport>,
    cache: Memo<PlatformVersionInfo>,
}

impl SdkStorageVersionProvider {
    pub fn new(
        platform: &str,
        base_url: Option<String>,
        os_flavor: &str,
        transport: Arc<dyn ListingTransport>,
    ) -> Self {
        Self {
            platform: platform.to_string(),
            base_url,
            os_flavor: os_flavor.to_string(),
            transport,
            cache: Memo::new(),
        }
    }

    pub fn listing_url(base_url: &str, platform: &str) -> String {
        format!(
            "{}/{}?restype=container&comp=list&include=metadata",
            base_url, platform
        )
    }

    /// Fetches and parses the listing; a single request per document, no retry
    pub fn fetch_version_manifest(&self) -> Result<PlatformVersionInfo, ProviderError> {
        let base_url =
            self.base_url
                .as_deref()
                .ok_or_else(|| ProviderError::StorageNotConfigured {
                    platform: self.platform.clone(),
                })?;

        let url = Self::listing_url(base_url, &self.platform);
        info!(platform = %self.platform, url = %url, "Fetching supported versions from SDK storage");

        let body = self
            .transport
            .get_text(&url)
            .map_err(|e| self.unreachable(&url, e.to_string()))?;
        let listing = parse_listing(&body).map_err(|details| self.unreachable(&url, details))?;
        let supported = listing.supported_versions(&self.os_flavor);

        let default_version = match listing.default_version.clone() {
            Some(default) => Some(default),
            None => {
                let default_url = format!(
                    "{}/{}/{}",
                    base_url,
                    self.platform,
                    default_version_file(&self.os_flavor)
                );
                let text = self
                    .transport
                    .get_text(&default_url)
                    .map_err(|e| self.unreachable(&default_url, e.to_string()))?;
                parse_default_version(&text)
            }
        };

        debug!(
            platform = %self.platform,
            count = supported.len(),
            default = ?default_version,
            "Parsed SDK storage listing"
        );

        PlatformVersionInfo::new(
            &self.platform,
            supported,
            default_version,
            VersionOrigin::SdkStorage,
        )
    }

    fn unreachable(&self, url: &str, details: String) -> ProviderError {
        ProviderError::RemoteListingUnreachable {
            platform: self.platform.clone(),
            url: url.to_string(),
            details,
        }
    }
}

impl VersionProvider for SdkStorageVersionProvider {
    fn platform(&self) -> &str {
        &self.platform
    }

    fn version_info(&self) -> Result<PlatformVersionInfo, ProviderError> {
        self.cache
            .get_or_try_init(|| self.fetch_version_manifest())
            .cloned()
    }
}
