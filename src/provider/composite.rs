use super::{Memo, PlatformVersionInfo, ProviderError, VersionProvider};
use std::sync::Arc;
use tracing::{debug, warn};

/// Effective provider of a platform
///
/// - dynamic install disabled: pre-installed versions only
/// - external source configured: external first, SDK storage if it fails
/// - otherwise: SDK storage
///
/// External failures are logged and absorbed; SDK storage failures propagate.
pub struct CompositeVersionProvider {
    platform: String,
    dynamic_install: bool,
    on_disk: Arc<dyn VersionProvider>,
    external: Option<Arc<dyn VersionProvider>>,
    remote: Arc<dyn VersionProvider>,
    cache: Memo<PlatformVersionInfo>,
}

impl CompositeVersionProvider {
    pub fn new(
        platform: &str,
        dynamic_install: bool,
        on_disk: Arc<dyn VersionProvider>,
        external: Option<Arc<dyn VersionProvider>>,
        remote: Arc<dyn VersionProvider>,
    ) -> Self {
        Self {
            platform: platform.to_string(),
            dynamic_install,
            on_disk,
            external,
            remote,
            cache: Memo::new(),
        }
    }

    fn select(&self) -> Result<PlatformVersionInfo, ProviderError> {
        if !self.dynamic_install {
            debug!(platform = %self.platform, "Dynamic install disabled, using installed versions");
            return self.on_disk.version_info();
        }

        if let Some(external) = &self.external {
            match external.version_info() {
                Ok(info) => return Ok(info),
                Err(e) => warn!(
                    platform = %self.platform,
                    error = %e,
                    "External SDK source failed, falling back to SDK storage"
                ),
            }
        }

        self.remote.version_info()
    }
}

impl VersionProvider for CompositeVersionProvider {
    fn platform(&self) -> &str {
        &self.platform
    }

    fn version_info(&self) -> Result<PlatformVersionInfo, ProviderError> {
        self.cache.get_or_try_init(|| self.select()).cloned()
    }
}
