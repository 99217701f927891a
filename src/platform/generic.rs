use super::{BuildContext, BuildScriptSnippet, PlatformPlugin, PlatformSpec, SdkSelection};
use crate::config::BuildOptions;
use crate::detector::{
    Detection, DetectionResult, DetectorSettings, FlagValue, PlatformDetector, SpecDetector,
};
use crate::error::BuildError;
use crate::provider::{ExternalVersionProvider, PlatformVersionInfo, VersionProvider};
use crate::repo::SourceRepo;
use crate::script::{render_template, shell_quote, ScriptBuilder};
use crate::version::{
    ResolvedVersion, RollForward, SdkPin, VersionInfo, VersionResolver, VersionSource,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Marker the installer writes once an SDK download is complete
pub const SDK_DOWNLOAD_SENTINEL: &str = ".buildsmith-sdk-download-sentinel";

/// The one [`PlatformPlugin`] implementation, parameterized by a [`PlatformSpec`]
pub struct GenericPlatform {
    spec: &'static PlatformSpec,
    detector: SpecDetector,
    provider: Arc<dyn VersionProvider>,
    external: Option<Arc<ExternalVersionProvider>>,
    platforms_root: PathBuf,
    dynamic_install_root: PathBuf,
}

impl GenericPlatform {
    pub fn new(
        spec: &'static PlatformSpec,
        provider: Arc<dyn VersionProvider>,
        options: &BuildOptions,
    ) -> Self {
        let settings = DetectorSettings {
            project: options.platform_options(spec.option_key).project,
            disable_recursive_lookup: options.disable_recursive_lookup,
        };
        Self {
            spec,
            detector: SpecDetector::new(spec.name, &spec.detector, settings),
            provider,
            external: None,
            platforms_root: options.platforms_root.clone(),
            dynamic_install_root: options.dynamic_install_root.clone(),
        }
    }

    /// External source consulted for verified cached archives
    pub fn with_external(mut self, external: Arc<ExternalVersionProvider>) -> Self {
        self.external = Some(external);
        self
    }

    pub fn spec(&self) -> &'static PlatformSpec {
        self.spec
    }

    fn target_dir(&self) -> PathBuf {
        self.dynamic_install_root.join(self.spec.name)
    }

    /// Values for recipe templates, lowest precedence first: recipe defaults,
    /// build properties, text flags, built-ins
    ///
    /// With `for_script`, values read from the repository (text flags, the app
    /// and source directories) are shell-quoted; manifest values stay raw.
    fn template_values(
        &self,
        context: &BuildContext,
        detection: &DetectionResult,
        resolved: &ResolvedVersion,
        for_script: bool,
    ) -> BTreeMap<String, String> {
        let quote = |value: &str| {
            if for_script {
                shell_quote(value)
            } else {
                value.to_string()
            }
        };
        let major_minor = VersionInfo::parse(&resolved.version)
            .map(|v| v.major_minor())
            .unwrap_or_else(|_| resolved.version.clone());
        let app_dir = if detection.app_directory.is_empty() {
            "."
        } else {
            detection.app_directory.as_str()
        };

        let mut builtins = BTreeMap::new();
        builtins.insert("version".to_string(), resolved.version.clone());
        builtins.insert("major_minor".to_string(), major_minor);
        builtins.insert("app_dir".to_string(), quote(app_dir));
        builtins.insert("platform".to_string(), self.spec.name.to_string());
        builtins.insert(
            "source_dir".to_string(),
            quote(&context.source_dir.display().to_string()),
        );

        let mut values: BTreeMap<String, String> = self
            .spec
            .build
            .defaults
            .iter()
            .map(|(name, template)| (name.to_string(), render_template(template, &builtins)))
            .collect();
        values.extend(context.properties.clone());
        for (name, value) in &detection.flags {
            if let FlagValue::Text(text) = value {
                let text = if text.is_empty() { String::new() } else { quote(text) };
                values.insert(name.clone(), text);
            }
        }
        values.extend(builtins);
        values
    }

    /// SDK picked through global.json or the detected runtime, for platforms
    /// whose installed versions are SDKs. `None` falls back to direct matching.
    fn select_sdk(
        &self,
        detection: &DetectionResult,
    ) -> Result<Option<ResolvedVersion>, BuildError> {
        let SdkSelection::GlobalJson {
            version_flag,
            roll_forward_flag,
            allow_prerelease_flag,
        } = self.spec.sdk_selection
        else {
            return Ok(None);
        };
        let non_empty = |flag: &str| {
            detection
                .flag_text(flag)
                .map(str::trim)
                .filter(|text| !text.is_empty())
        };

        let pin = match non_empty(version_flag) {
            Some(pinned) => {
                let roll_forward = match non_empty(roll_forward_flag).map(RollForward::from_str) {
                    Some(Ok(policy)) => policy,
                    Some(Err(e)) => {
                        warn!(
                            platform = self.spec.name,
                            error = %e,
                            "Using the default roll-forward policy"
                        );
                        RollForward::default()
                    }
                    None => RollForward::default(),
                };
                let allow_prerelease =
                    non_empty(allow_prerelease_flag).and_then(|text| text.parse::<bool>().ok());
                match SdkPin::new(pinned, roll_forward, allow_prerelease) {
                    Ok(pin) => pin,
                    Err(e) => {
                        warn!(
                            platform = self.spec.name,
                            error = %e,
                            "Ignoring global.json SDK version"
                        );
                        return Ok(None);
                    }
                }
            }
            None => {
                let runtime = detection
                    .detected_version
                    .as_deref()
                    .and_then(|v| VersionInfo::parse(v).ok());
                match runtime {
                    Some(runtime) => {
                        SdkPin::for_runtime(runtime.semantic().major, runtime.semantic().minor)
                    }
                    None => return Ok(None),
                }
            }
        };

        let supported = self.provider.version_info()?.supported_versions;
        let pinned_by_file = non_empty(version_flag).is_some();
        match pin.resolve(&supported) {
            Some(version) => {
                debug!(
                    platform = self.spec.name,
                    requested = %pin.version,
                    roll_forward = ?pin.roll_forward,
                    version = %version,
                    "Selected SDK"
                );
                Ok(Some(ResolvedVersion {
                    platform: self.spec.name.to_string(),
                    version,
                    source: VersionSource::RepoDetected,
                }))
            }
            None if pinned_by_file => Err(BuildError::UnsupportedVersion {
                platform: self.spec.name.to_string(),
                attempted: pin.version.to_string(),
                supported,
            }),
            None => Ok(None),
        }
    }
}

impl PlatformPlugin for GenericPlatform {
    fn name(&self) -> &str {
        self.spec.name
    }

    fn matches_name(&self, name: &str) -> bool {
        self.spec.matches_name(name)
    }

    fn detect(&self, repo: &dyn SourceRepo) -> Result<Detection, BuildError> {
        self.detector.detect(repo)
    }

    fn is_enabled(&self, options: &BuildOptions) -> bool {
        !options.platform_options(self.spec.option_key).disabled
    }

    /// `--platform-version` applies to the platform named by `--platform`;
    /// otherwise the per-platform setting is the explicit version.
    fn explicit_version(&self, options: &BuildOptions) -> Option<String> {
        let from_cli = options
            .platform_name
            .as_deref()
            .filter(|name| self.spec.matches_name(name))
            .and(options.platform_version.clone());
        from_cli.or_else(|| options.platform_options(self.spec.option_key).version)
    }

    fn resolve_version(
        &self,
        detection: &DetectionResult,
        options: &BuildOptions,
    ) -> Result<ResolvedVersion, BuildError> {
        let explicit = self
            .explicit_version(options)
            .filter(|version| !version.trim().is_empty());
        let selected = match explicit {
            Some(_) => None,
            None => self.select_sdk(detection)?,
        };
        let resolved = match selected {
            Some(resolved) => resolved,
            None => {
                let configured_default = options
                    .platform_options(self.spec.option_key)
                    .default_version;
                VersionResolver::resolve(
                    explicit.as_deref(),
                    detection,
                    configured_default.as_deref(),
                    self.provider.as_ref(),
                )?
            }
        };
        info!(
            platform = self.spec.name,
            version = %resolved.version,
            source = %resolved.source,
            "Resolved platform version"
        );
        Ok(resolved)
    }

    fn needs_installation(&self, resolved: &ResolvedVersion) -> bool {
        let preinstalled = self
            .platforms_root
            .join(self.spec.install.install_dir)
            .join(&resolved.version);
        let downloaded = self
            .target_dir()
            .join(&resolved.version)
            .join(SDK_DOWNLOAD_SENTINEL);
        let installed = preinstalled.exists() || downloaded.exists();
        debug!(
            platform = self.spec.name,
            version = %resolved.version,
            preinstalled = %preinstalled.display(),
            installed,
            "Checked installation state"
        );
        !installed
    }

    fn installer_snippet(
        &self,
        resolved: &ResolvedVersion,
        options: &BuildOptions,
    ) -> Result<Option<BuildScriptSnippet>, BuildError> {
        if !options.enable_dynamic_install || !self.needs_installation(resolved) {
            return Ok(None);
        }
        let base_url = options.require_sdk_storage_url()?;
        let target_dir = self.target_dir();

        let mut command = format!(
            "{} --platform {} --platform-version {} --base-target-dir {} --base-download-url {}",
            shell_quote(&options.installer_script.display().to_string()),
            self.spec.name,
            shell_quote(&resolved.version),
            shell_quote(&target_dir.display().to_string()),
            shell_quote(base_url),
        );
        let cached = self
            .external
            .as_ref()
            .filter(|_| options.enable_external_sdk_provider)
            .and_then(|external| external.cached_archive(&resolved.version));
        if let Some(archive) = &cached {
            info!(
                platform = self.spec.name,
                archive = %archive.display(),
                "Using verified cached SDK archive"
            );
            command.push_str(" --local-archive ");
            command.push_str(&shell_quote(&archive.display().to_string()));
        }

        let install_path = target_dir.join(&resolved.version);
        let bin_path = match self.spec.install.bin_subdir {
            "" => install_path.clone(),
            subdir => install_path.join(subdir),
        };

        let mut script = ScriptBuilder::new();
        script
            .comment(&format!(
                "Install {} {}",
                self.spec.display_name, resolved.version
            ))
            .line(command)
            .line(format!(
                "export PATH={}:\"$PATH\"",
                shell_quote(&bin_path.display().to_string())
            ));

        let mut manifest_properties = BTreeMap::new();
        manifest_properties.insert(self.spec.version_key(), resolved.version.clone());
        manifest_properties.insert(
            format!("{}SdkDir", self.spec.manifest_prefix),
            install_path.display().to_string(),
        );

        Ok(Some(BuildScriptSnippet {
            bash_text: script.build(),
            manifest_properties,
        }))
    }

    fn build_snippet(
        &self,
        context: &BuildContext,
        detection: &DetectionResult,
        resolved: &ResolvedVersion,
    ) -> BuildScriptSnippet {
        let values = self.template_values(context, detection, resolved, true);

        let mut script = ScriptBuilder::new();
        script.comment(&format!(
            "Build {} {}",
            self.spec.display_name, resolved.version
        ));
        for step in self.spec.build.steps {
            if step.when.holds(|flag| detection.flag_is_set(flag)) {
                script.line(render_template(step.command, &values));
            }
        }

        let values = self.template_values(context, detection, resolved, false);
        let mut manifest_properties = BTreeMap::new();
        manifest_properties.insert(self.spec.version_key(), resolved.version.clone());
        for (key, template) in self.spec.build.manifest {
            let value = render_template(template, &values);
            if !value.is_empty() {
                manifest_properties.insert(key.to_string(), value);
            }
        }
        if let Some(frameworks) = detection.flag_text("frameworks").filter(|f| !f.is_empty()) {
            manifest_properties.insert("Frameworks".to_string(), frameworks.to_string());
        }

        BuildScriptSnippet {
            bash_text: script.build(),
            manifest_properties,
        }
    }

    fn supported_versions(&self) -> Result<PlatformVersionInfo, BuildError> {
        Ok(self.provider.version_info()?)
    }
}
