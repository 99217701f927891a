//! Platform plugins and their registry

mod generic;
mod registry;
mod spec;

pub use generic::{GenericPlatform, SDK_DOWNLOAD_SENTINEL};
pub use registry::PlatformRegistry;
pub use spec::{BuildRecipe, InstallSpec, PlatformSpec, SdkSelection};

use crate::config::BuildOptions;
use crate::detector::{Detection, DetectionResult};
use crate::error::BuildError;
use crate::provider::PlatformVersionInfo;
use crate::repo::SourceRepo;
use crate::version::ResolvedVersion;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Bash text contributed by one platform plus the manifest entries it implies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildScriptSnippet {
    pub bash_text: String,
    pub manifest_properties: BTreeMap<String, String>,
}

/// Inputs shared by every build snippet of one run
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub source_dir: PathBuf,
    /// `-p KEY=VALUE` build properties
    pub properties: BTreeMap<String, String>,
    pub operation_id: String,
    pub revision: String,
}

impl BuildContext {
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            properties: BTreeMap::new(),
            operation_id: String::new(),
            revision: String::new(),
        }
    }

    pub fn with_properties(mut self, properties: BTreeMap<String, String>) -> Self {
        self.properties = properties;
        self
    }
}

pub trait PlatformPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// True for the canonical name or any alias, case-insensitively
    fn matches_name(&self, name: &str) -> bool {
        self.name().eq_ignore_ascii_case(name)
    }

    fn detect(&self, repo: &dyn SourceRepo) -> Result<Detection, BuildError>;

    fn is_enabled(&self, options: &BuildOptions) -> bool;

    /// Version requested explicitly for this platform, if any
    fn explicit_version(&self, options: &BuildOptions) -> Option<String>;

    fn resolve_version(
        &self,
        detection: &DetectionResult,
        options: &BuildOptions,
    ) -> Result<ResolvedVersion, BuildError>;

    /// True when the version is neither pre-installed nor already downloaded
    fn needs_installation(&self, resolved: &ResolvedVersion) -> bool;

    /// `None` when nothing has to be installed or dynamic install is off
    fn installer_snippet(
        &self,
        resolved: &ResolvedVersion,
        options: &BuildOptions,
    ) -> Result<Option<BuildScriptSnippet>, BuildError>;

    fn build_snippet(
        &self,
        context: &BuildContext,
        detection: &DetectionResult,
        resolved: &ResolvedVersion,
    ) -> BuildScriptSnippet;

    fn supported_versions(&self) -> Result<PlatformVersionInfo, BuildError>;
}
