//! State accumulated while a build plan is assembled

use crate::detector::DetectionResult;
use crate::platform::{BuildContext, BuildScriptSnippet, PlatformPlugin};
use crate::repo::SourceRepo;
use crate::version::ResolvedVersion;
use std::sync::Arc;

/// One detected platform as it moves through the phases
pub struct PlatformState {
    pub plugin: Arc<dyn PlatformPlugin>,
    pub detection: DetectionResult,
    pub resolved: Option<ResolvedVersion>,
    pub installer: Option<BuildScriptSnippet>,
    pub build: Option<BuildScriptSnippet>,
}

impl PlatformState {
    pub fn new(plugin: Arc<dyn PlatformPlugin>, detection: DetectionResult) -> Self {
        Self {
            plugin,
            detection,
            resolved: None,
            installer: None,
            build: None,
        }
    }
}

pub struct OrchestrationContext<'a> {
    pub repo: &'a dyn SourceRepo,
    pub build: &'a BuildContext,
    /// Detected platforms in registration order
    pub platforms: Vec<PlatformState>,
}

impl<'a> OrchestrationContext<'a> {
    pub fn new(repo: &'a dyn SourceRepo, build: &'a BuildContext) -> Self {
        Self {
            repo,
            build,
            platforms: Vec::new(),
        }
    }
}
