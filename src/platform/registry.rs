use super::{GenericPlatform, PlatformPlugin, PlatformSpec};
use crate::config::BuildOptions;
use crate::error::BuildError;
use crate::platforms;
use crate::provider::{
    CompositeVersionProvider, DirectoryExternalSource, ExternalSdkSource,
    ExternalVersionProvider, HttpTransport, ListingTransport, OnDiskVersionProvider,
    SdkStorageVersionProvider, VersionProvider,
};
use std::sync::Arc;
use tracing::debug;

/// Ordered set of platform plugins
///
/// Registration order is the order of detection results, script snippets and
/// manifest values.
#[derive(Clone, Default)]
pub struct PlatformRegistry {
    plugins: Vec<Arc<dyn PlatformPlugin>>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in platforms, fetching remote listings over HTTP
    ///
    /// Uses a blocking HTTP client; call it from a blocking context.
    pub fn with_defaults(options: &BuildOptions) -> Result<Self, BuildError> {
        let transport = HttpTransport::new(options.request_timeout)
            .map_err(|e| BuildError::Internal(e.to_string()))?;
        let external: Arc<dyn ExternalSdkSource> =
            Arc::new(DirectoryExternalSource::new(&options.external_sdk_dir));
        Ok(Self::with_sources(options, Arc::new(transport), external))
    }

    /// Built-in platforms with explicit remote and external sources
    pub fn with_sources(
        options: &BuildOptions,
        transport: Arc<dyn ListingTransport>,
        external_source: Arc<dyn ExternalSdkSource>,
    ) -> Self {
        let mut registry = Self::new();
        for spec in platforms::all() {
            registry.register(Arc::new(build_plugin(
                spec,
                options,
                transport.clone(),
                external_source.clone(),
            )));
        }
        debug!(count = registry.plugins.len(), "Registered platforms");
        registry
    }

    pub fn register(&mut self, plugin: Arc<dyn PlatformPlugin>) {
        self.plugins.push(plugin);
    }

    pub fn plugins(&self) -> &[Arc<dyn PlatformPlugin>] {
        &self.plugins
    }

    /// Looks a plugin up by name or alias
    pub fn find(&self, name: &str) -> Option<&Arc<dyn PlatformPlugin>> {
        self.plugins.iter().find(|p| p.matches_name(name))
    }

    pub fn names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name().to_string()).collect()
    }
}

fn build_plugin(
    spec: &'static PlatformSpec,
    options: &BuildOptions,
    transport: Arc<dyn ListingTransport>,
    external_source: Arc<dyn ExternalSdkSource>,
) -> GenericPlatform {
    let platform_options = options.platform_options(spec.option_key);

    let on_disk = OnDiskVersionProvider::new(
        spec.name,
        options.platforms_root.join(spec.install.install_dir),
        spec.install.layout,
        spec.install.default_version,
    )
    .with_configured_versions(platform_options.supported_versions);
    let remote = SdkStorageVersionProvider::new(
        spec.name,
        options.sdk_storage_base_url.clone(),
        &options.os_flavor,
        transport,
    );
    let external = options.enable_external_sdk_provider.then(|| {
        Arc::new(ExternalVersionProvider::new(
            spec.name,
            &options.os_flavor,
            external_source,
        ))
    });

    let composite = CompositeVersionProvider::new(
        spec.name,
        options.enable_dynamic_install,
        Arc::new(on_disk),
        external
            .clone()
            .map(|provider| provider as Arc<dyn VersionProvider>),
        Arc::new(remote),
    );

    let plugin = GenericPlatform::new(spec, Arc::new(composite), options);
    match external {
        Some(provider) => plugin.with_external(provider),
        None => plugin,
    }
}
