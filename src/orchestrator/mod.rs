//! Build orchestration: detect, resolve, install, assemble
//!
//! [`BuildOrchestrator::plan`] walks the phases of [`BuildPhase`] in order.
//! Any error moves the orchestrator to `Failed` and nothing is emitted.

mod context;

pub use context::{OrchestrationContext, PlatformState};

use crate::config::BuildOptions;
use crate::detector::{Detection, DetectionResult};
use crate::error::BuildError;
use crate::manifest::{
    BuildManifest, OPERATION_ID_KEY, PLATFORM_NAME_KEY, PLATFORM_VERSION_KEY, SOURCE_REVISION_KEY,
};
use crate::platform::{BuildContext, PlatformPlugin, PlatformRegistry};
use crate::repo::SourceRepo;
use crate::runner::revision::current_revision;
use crate::script::{shell_quote, ScriptBuilder, SCRIPT_HEADER};
use crate::version::{ResolvedVersion, VersionSource};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BuildPhase {
    Init,
    Detecting,
    Resolving,
    Installing,
    ScriptAssembly,
    Done,
    Failed,
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildPhase::Init => "Init",
            BuildPhase::Detecting => "Detecting",
            BuildPhase::Resolving => "Resolving",
            BuildPhase::Installing => "Installing",
            BuildPhase::ScriptAssembly => "ScriptAssembly",
            BuildPhase::Done => "Done",
            BuildPhase::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// A platform selected for the build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedPlatform {
    pub name: String,
    pub version: String,
    pub source: VersionSource,
    pub app_directory: String,
    /// True when the script installs the version before building
    pub installs_sdk: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    pub script: String,
    pub manifest: BuildManifest,
    pub platforms: Vec<PlannedPlatform>,
}

pub struct BuildOrchestrator {
    registry: PlatformRegistry,
    options: BuildOptions,
    phase: Mutex<BuildPhase>,
}

impl BuildOrchestrator {
    pub fn new(registry: PlatformRegistry, options: BuildOptions) -> Self {
        Self {
            registry,
            options,
            phase: Mutex::new(BuildPhase::Init),
        }
    }

    pub fn registry(&self) -> &PlatformRegistry {
        &self.registry
    }

    /// Phase reached by the last run
    pub fn phase(&self) -> BuildPhase {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn transition(&self, next: BuildPhase) {
        let mut phase = self.phase.lock().unwrap_or_else(|e| e.into_inner());
        debug!(from = %*phase, to = %next, "Build phase transition");
        *phase = next;
    }

    /// Produces the build script and manifest for `repo`
    pub fn plan(&self, repo: &dyn SourceRepo, build: &BuildContext) -> Result<BuildPlan, BuildError> {
        let start = Instant::now();
        info!(source = %build.source_dir.display(), "Planning build");
        self.transition(BuildPhase::Init);

        let mut context = OrchestrationContext::new(repo, build);
        let phases = [
            BuildPhase::Detecting,
            BuildPhase::Resolving,
            BuildPhase::Installing,
            BuildPhase::ScriptAssembly,
        ];

        let mut plan = None;
        for phase in phases {
            self.transition(phase);
            let phase_start = Instant::now();
            let result = match phase {
                BuildPhase::Detecting => self.detect(&mut context),
                BuildPhase::Resolving => self.resolve(&mut context),
                BuildPhase::Installing => self.install(&mut context),
                _ => self.assemble(&mut context).map(|assembled| {
                    plan = Some(assembled);
                }),
            };
            if let Err(e) = result {
                warn!(phase = %phase, error = %e, "Build planning failed");
                self.transition(BuildPhase::Failed);
                return Err(e);
            }
            debug!(phase = %phase, elapsed = ?phase_start.elapsed(), "Phase complete");
        }

        let plan = plan.ok_or_else(|| BuildError::Internal("script assembly produced no plan".to_string()))?;
        self.transition(BuildPhase::Done);
        info!(
            platforms = %plan.platforms.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(","),
            elapsed = ?start.elapsed(),
            "Build plan ready"
        );
        Ok(plan)
    }

    /// Runs detection only, reporting every applicable platform
    pub fn detect_platforms(&self, repo: &dyn SourceRepo) -> Result<Vec<DetectionResult>, BuildError> {
        let enabled: Vec<Arc<dyn PlatformPlugin>> = self
            .registry
            .plugins()
            .iter()
            .filter(|p| p.is_enabled(&self.options))
            .cloned()
            .collect();
        let outcomes = self.run_detectors(&enabled, repo);

        let mut results = Vec::new();
        for (plugin, outcome) in enabled.iter().zip(outcomes) {
            match outcome? {
                Detection::Applicable(result) => results.push(result),
                Detection::NotApplicable => {}
                Detection::Malformed { reason } => {
                    return Err(BuildError::MalformedProject {
                        platform: plugin.name().to_string(),
                        reason,
                    })
                }
            }
        }
        Ok(results)
    }

    fn run_detectors(
        &self,
        plugins: &[Arc<dyn PlatformPlugin>],
        repo: &dyn SourceRepo,
    ) -> Vec<Result<Detection, BuildError>> {
        if !self.options.parallel_detection || plugins.len() < 2 {
            return plugins.iter().map(|p| p.detect(repo)).collect();
        }

        thread::scope(|scope| {
            let handles: Vec<_> = plugins
                .iter()
                .map(|plugin| (plugin.name(), scope.spawn(move || plugin.detect(repo))))
                .collect();
            handles
                .into_iter()
                .map(|(name, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        Err(BuildError::Internal(format!("detector for '{}' panicked", name)))
                    })
                })
                .collect()
        })
    }

    fn detect(&self, context: &mut OrchestrationContext<'_>) -> Result<(), BuildError> {
        if let Some(name) = self.options.platform_name.clone() {
            let plugin = self.named_plugin(&name)?;
            let detection = match plugin.detect(context.repo)? {
                Detection::Applicable(result) => result,
                Detection::Malformed { reason } => {
                    return Err(BuildError::MalformedProject {
                        platform: plugin.name().to_string(),
                        reason,
                    })
                }
                Detection::NotApplicable if plugin.explicit_version(&self.options).is_some() => {
                    info!(platform = plugin.name(), "Platform not detected, building with the explicit version");
                    DetectionResult::new(plugin.name(), "")
                }
                Detection::NotApplicable => {
                    return Err(BuildError::PlatformNotDetected {
                        platform: plugin.name().to_string(),
                    })
                }
            };
            context.platforms.push(PlatformState::new(plugin, detection));
            return Ok(());
        }

        let detections = self.detect_platforms(context.repo)?;
        for detection in detections {
            let plugin = self
                .registry
                .find(&detection.platform)
                .cloned()
                .ok_or_else(|| BuildError::Internal(format!("no plugin named '{}'", detection.platform)))?;
            context.platforms.push(PlatformState::new(plugin, detection));
        }

        let names: Vec<String> = context
            .platforms
            .iter()
            .map(|p| p.detection.platform.clone())
            .collect();
        info!(platforms = %names.join(","), "Detection complete");

        match names.len() {
            0 => Err(BuildError::NoApplicablePlatform),
            1 => Ok(()),
            _ if self.options.enable_multi_platform => Ok(()),
            _ => Err(BuildError::AmbiguousPlatform { platforms: names }),
        }
    }

    fn named_plugin(&self, name: &str) -> Result<Arc<dyn PlatformPlugin>, BuildError> {
        let enabled = |p: &&Arc<dyn PlatformPlugin>| p.is_enabled(&self.options);
        self.registry
            .plugins()
            .iter()
            .filter(enabled)
            .find(|p| p.matches_name(name))
            .cloned()
            .ok_or_else(|| BuildError::UnsupportedPlatform {
                name: name.to_string(),
                supported: self
                    .registry
                    .plugins()
                    .iter()
                    .filter(enabled)
                    .map(|p| p.name().to_string())
                    .collect(),
            })
    }

    fn resolve(&self, context: &mut OrchestrationContext<'_>) -> Result<(), BuildError> {
        for state in &mut context.platforms {
            let resolved = state.plugin.resolve_version(&state.detection, &self.options)?;
            state.resolved = Some(resolved);
        }
        Ok(())
    }

    fn install(&self, context: &mut OrchestrationContext<'_>) -> Result<(), BuildError> {
        for state in &mut context.platforms {
            let resolved = resolved_of(state)?;
            if !state.plugin.needs_installation(resolved) {
                continue;
            }
            if !self.options.enable_dynamic_install {
                return Err(BuildError::MissingPreinstalledVersion {
                    platform: resolved.platform.clone(),
                    version: resolved.version.clone(),
                });
            }
            state.installer = state.plugin.installer_snippet(resolved, &self.options)?;
        }
        Ok(())
    }

    fn assemble(&self, context: &mut OrchestrationContext<'_>) -> Result<BuildPlan, BuildError> {
        let build = context.build;
        for state in &mut context.platforms {
            let snippet = state
                .plugin
                .build_snippet(build, &state.detection, resolved_of(state)?);
            state.build = Some(snippet);
        }

        let mut script = ScriptBuilder::new();
        script.block(SCRIPT_HEADER).blank().line(format!(
            "SOURCE_DIR={}",
            shell_quote(&build.source_dir.display().to_string())
        ));
        script.line("cd \"$SOURCE_DIR\"");
        let snippets = context
            .platforms
            .iter()
            .filter_map(|s| s.installer.as_ref())
            .chain(context.platforms.iter().filter_map(|s| s.build.as_ref()));
        for snippet in snippets {
            script.blank().block(&snippet.bash_text);
        }

        let mut manifest = BuildManifest::new();
        let mut platforms = Vec::with_capacity(context.platforms.len());
        for state in &context.platforms {
            if let Some(installer) = &state.installer {
                manifest.merge(&installer.manifest_properties);
            }
            if let Some(snippet) = &state.build {
                manifest.merge(&snippet.manifest_properties);
            }
            let resolved = resolved_of(state)?;
            platforms.push(PlannedPlatform {
                name: resolved.platform.clone(),
                version: resolved.version.clone(),
                source: resolved.source,
                app_directory: state.detection.app_directory.clone(),
                installs_sdk: state.installer.is_some(),
            });
        }

        let names: Vec<&str> = platforms.iter().map(|p| p.name.as_str()).collect();
        let versions: Vec<&str> = platforms.iter().map(|p| p.version.as_str()).collect();
        manifest.set(PLATFORM_NAME_KEY, names.join(","));
        manifest.set(PLATFORM_VERSION_KEY, versions.join(","));
        let operation_id = if build.operation_id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            build.operation_id.clone()
        };
        manifest.set(OPERATION_ID_KEY, operation_id);
        let revision = if build.revision.is_empty() {
            current_revision(&build.source_dir)
        } else {
            build.revision.clone()
        };
        manifest.set(SOURCE_REVISION_KEY, revision);

        Ok(BuildPlan {
            script: script.build(),
            manifest,
            platforms,
        })
    }
}

fn resolved_of(state: &PlatformState) -> Result<&ResolvedVersion, BuildError> {
    state.resolved.as_ref().ok_or_else(|| {
        BuildError::Internal(format!(
            "platform '{}' reached a later phase without a resolved version",
            state.plugin.name()
        ))
    })
}
