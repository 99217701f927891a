//! Version providers: where the supported versions of a platform come from
//!
//! Every platform has one effective provider, a [`CompositeVersionProvider`]
//! that picks between:
//!
//! - [`OnDiskVersionProvider`]: versions pre-installed in the build image
//! - [`SdkStorageVersionProvider`]: a remote listing of installable SDKs
//! - [`ExternalVersionProvider`]: an SDK source delegated to the host
//!
//! Each provider computes its [`PlatformVersionInfo`] once and serves the cached
//! value afterwards (see [`memo::Memo`]).

pub mod composite;
pub mod external;
pub mod listing;
pub mod memo;
pub mod on_disk;
pub mod sdk_storage;
pub mod transport;

pub use composite::CompositeVersionProvider;
pub use external::{DirectoryExternalSource, ExternalSdkSource, ExternalVersionProvider};
pub use memo::Memo;
pub use on_disk::{OnDiskVersionProvider, VersionLayout};
pub use sdk_storage::SdkStorageVersionProvider;
pub use transport::{HttpTransport, ListingTransport, TransportError};

use crate::error::ErrorKind;
use crate::version::match_supported;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("No versions of platform '{platform}' are available: {reason}")]
    Unavailable { platform: String, reason: String },

    #[error("Version listing for platform '{platform}' at {url} is unreachable: {details}")]
    RemoteListingUnreachable {
        platform: String,
        url: String,
        details: String,
    },

    #[error("SDK storage is not configured for platform '{platform}'. Set BUILDSMITH_SDK_STORAGE_BASE_URL")]
    StorageNotConfigured { platform: String },

    #[error("External SDK source failed for platform '{platform}': {details}")]
    External { platform: String, details: String },

    #[error("Default version '{default}' of platform '{platform}' is not among its supported versions")]
    InvalidDefault { platform: String, default: String },
}

impl ProviderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::Unavailable { .. } | ProviderError::StorageNotConfigured { .. } => {
                ErrorKind::Usage
            }
            ProviderError::RemoteListingUnreachable { .. } | ProviderError::External { .. } => {
                ErrorKind::TransientProvider
            }
            ProviderError::InvalidDefault { .. } => ErrorKind::Internal,
        }
    }
}

/// Where a [`PlatformVersionInfo`] was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VersionOrigin {
    OnDisk,
    SdkStorage,
    External,
}

/// Supported versions and default version of one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformVersionInfo {
    pub supported_versions: Vec<String>,
    pub default_version: Option<String>,
    pub origin: VersionOrigin,
}

impl PlatformVersionInfo {
    /// Deduplicates the supported list and checks that the default belongs to it
    pub fn new(
        platform: &str,
        supported_versions: Vec<String>,
        default_version: Option<String>,
        origin: VersionOrigin,
    ) -> Result<Self, ProviderError> {
        let mut unique: Vec<String> = Vec::with_capacity(supported_versions.len());
        for version in supported_versions {
            let version = version.trim().to_string();
            if !version.is_empty() && !unique.contains(&version) {
                unique.push(version);
            }
        }

        let default_version = default_version
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        if let Some(default) = &default_version {
            if match_supported(default, &unique).is_none() {
                return Err(ProviderError::InvalidDefault {
                    platform: platform.to_string(),
                    default: default.clone(),
                });
            }
        }

        Ok(Self {
            supported_versions: unique,
            default_version,
            origin,
        })
    }
}

/// Yields the supported versions and default version of one platform
pub trait VersionProvider: Send + Sync {
    fn platform(&self) -> &str;

    fn version_info(&self) -> Result<PlatformVersionInfo, ProviderError>;
}
