//! Table-driven detector shared by every platform
//!
//! A platform describes its signals and version hints in a static
//! [`DetectorSpec`]; [`SpecDetector`] evaluates that table against a repository.

use super::manifests::{
    ComposerJson, CondaEnvironment, GlobalJson, GlobalJsonSdk, PackageJson, Pyproject,
};
use super::{Detection, DetectionResult, FlagValue, PlatformDetector};
use crate::error::BuildError;
use crate::repo::{join_segments, parent_dir, SourceRepo};
use crate::version::is_version_hint;
use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Where a platform pins its version inside the repository
#[derive(Debug, Clone, Copy)]
pub enum VersionRule {
    /// First line of `file` starting with `prefix`; the rest of the line
    LinePrefix {
        file: &'static str,
        prefix: &'static str,
    },
    /// First capture group of a multi-line regex over `file`
    Pattern {
        file: &'static str,
        pattern: &'static str,
    },
    /// `engines.<engine>` in package.json
    PackageJsonEngine { engine: &'static str },
    /// `require.<package>` in composer.json
    ComposerRequire { package: &'static str },
    /// `project.requires-python` in pyproject.toml
    PyprojectRequiresPython,
    /// `sdk.version` in global.json
    GlobalJsonSdk,
    /// `<TargetFramework>` of the project file, `net6.0` read as `6.0`
    TargetFramework,
}

/// Platform-specific facts recorded on a detection result
#[derive(Debug, Clone, Copy)]
pub enum FlagRule {
    FileExists {
        flag: &'static str,
        file: &'static str,
    },
    /// Some top-level file matches the glob
    PatternExists {
        flag: &'static str,
        pattern: &'static str,
    },
    /// First capture group of a multi-line regex over `file`, as text
    Capture {
        flag: &'static str,
        file: &'static str,
        pattern: &'static str,
    },
    /// One of the files is a conda environment definition
    CondaEnvironment {
        flag: &'static str,
        files: &'static [&'static str],
    },
    /// Relative path of the project file, as text
    ProjectFile { flag: &'static str },
    /// Text of the first `element` in the XML project file
    ProjectElement {
        flag: &'static str,
        element: &'static str,
    },
    /// Version rule evaluated as a flag
    Version {
        flag: &'static str,
        rule: VersionRule,
    },
    /// `sdk.rollForward` in global.json, as text
    GlobalJsonRollForward { flag: &'static str },
    /// `sdk.allowPrerelease` in global.json, as text ("true"/"false")
    GlobalJsonAllowPrerelease { flag: &'static str },
}

/// Framework names reported in the build manifest
#[derive(Debug, Clone, Copy)]
pub enum FrameworkHint {
    PackageDependency {
        name: &'static str,
        package: &'static str,
    },
    ComposerDependency {
        name: &'static str,
        package: &'static str,
    },
    /// Some line of `file` starts with `needle`, case-insensitively
    FileLine {
        name: &'static str,
        file: &'static str,
        needle: &'static str,
    },
}

/// Project files that anchor the app directory
#[derive(Debug, Clone, Copy)]
pub struct ProjectFileRule {
    pub patterns: &'static [&'static str],
    /// Project files must be well-formed XML; a broken one is `Malformed`
    pub require_xml: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct DetectorSpec {
    /// Any of these at the top level makes the platform applicable
    pub signal_files: &'static [&'static str],
    /// Globs searched (recursively unless disabled) when no signal file exists
    pub signal_patterns: &'static [&'static str],
    /// Applicable only when none of `conflicting_files` is present
    pub weak_signal_files: &'static [&'static str],
    pub conflicting_files: &'static [&'static str],
    pub project_files: Option<ProjectFileRule>,
    /// Evaluated in order, first hit wins
    pub version_rules: &'static [VersionRule],
    pub flags: &'static [FlagRule],
    pub frameworks: &'static [FrameworkHint],
}

impl DetectorSpec {
    pub const EMPTY: DetectorSpec = DetectorSpec {
        signal_files: &[],
        signal_patterns: &[],
        weak_signal_files: &[],
        conflicting_files: &[],
        project_files: None,
        version_rules: &[],
        flags: &[],
        frameworks: &[],
    };
}

/// Run-time knobs of a detector, taken from the build options
#[derive(Debug, Clone, Default)]
pub struct DetectorSettings {
    /// Explicit project file, relative to the repository root
    pub project: Option<String>,
    pub disable_recursive_lookup: bool,
}

pub struct SpecDetector {
    platform: &'static str,
    spec: &'static DetectorSpec,
    settings: DetectorSettings,
}

struct Scope<'a> {
    repo: &'a dyn SourceRepo,
    platform: &'static str,
    project: Option<&'a str>,
}

impl<'a> Scope<'a> {
    fn read(&self, file: &str) -> Option<String> {
        if !self.repo.file_exists(&[file]) {
            return None;
        }
        match self.repo.read_file(&[file]) {
            Ok(content) => Some(content),
            Err(e) => {
                warn!(platform = self.platform, file, error = %e, "Failed to read file");
                None
            }
        }
    }

    fn parse_json<T: DeserializeOwned>(&self, file: &str) -> Option<T> {
        let content = self.read(file)?;
        serde_json::from_str(&content)
            .map_err(|e| {
                warn!(platform = self.platform, file, error = %e, "Ignoring malformed JSON metadata");
            })
            .ok()
    }

    fn project_xml_element(&self, element: &str) -> Option<String> {
        let project = self.project?;
        let content = self.read(project)?;
        let doc = roxmltree::Document::parse(&content).ok()?;
        let value = doc
            .descendants()
            .find(|n| n.has_tag_name(element))
            .and_then(|n| n.text())?
            .trim()
            .to_string();
        (!value.is_empty()).then_some(value)
    }

    fn version(&self, rule: &VersionRule) -> Option<String> {
        let found = match *rule {
            VersionRule::LinePrefix { file, prefix } => self.read(file).and_then(|content| {
                content
                    .lines()
                    .map(str::trim)
                    .find_map(|line| line.strip_prefix(prefix))
                    .map(|rest| rest.trim().to_string())
            }),
            VersionRule::Pattern { file, pattern } => self
                .read(file)
                .and_then(|content| capture(self.platform, pattern, &content)),
            VersionRule::PackageJsonEngine { engine } => self
                .parse_json::<PackageJson>("package.json")
                .and_then(|manifest| manifest.engine(engine).map(str::to_string)),
            VersionRule::ComposerRequire { package } => self
                .parse_json::<ComposerJson>("composer.json")
                .and_then(|manifest| manifest.requirement(package).map(str::to_string)),
            VersionRule::GlobalJsonSdk => self.global_json_sdk().and_then(|sdk| sdk.version),
            VersionRule::PyprojectRequiresPython => {
                self.read("pyproject.toml").and_then(|content| {
                    toml::from_str::<Pyproject>(&content)
                        .map_err(|e| {
                            warn!(platform = self.platform, error = %e, "Ignoring malformed pyproject.toml");
                        })
                        .ok()
                        .and_then(|doc| doc.project)
                        .and_then(|project| project.requires_python)
                })
            }
            VersionRule::TargetFramework => self
                .project_xml_element("TargetFramework")
                .or_else(|| {
                    self.project_xml_element("TargetFrameworks")
                        .and_then(|list| list.split(';').next().map(str::to_string))
                })
                .and_then(|tfm| runtime_from_target_framework(&tfm)),
        };
        found.filter(|v| !v.is_empty()).filter(|v| {
            let usable = is_version_hint(v);
            if !usable {
                warn!(
                    platform = self.platform,
                    rule = ?rule,
                    value = %v,
                    "Ignoring version hint that is not a version or range"
                );
            }
            usable
        })
    }

    fn global_json_sdk(&self) -> Option<GlobalJsonSdk> {
        self.parse_json::<GlobalJson>("global.json")
            .and_then(|manifest| manifest.sdk)
    }

    fn flag(&self, rule: &FlagRule) -> (&'static str, FlagValue) {
        match *rule {
            FlagRule::FileExists { flag, file } => {
                (flag, FlagValue::Bool(self.repo.file_exists(&[file])))
            }
            FlagRule::PatternExists { flag, pattern } => (
                flag,
                FlagValue::Bool(!self.repo.enumerate_files(pattern, false, None).is_empty()),
            ),
            FlagRule::Capture {
                flag,
                file,
                pattern,
            } => (
                flag,
                FlagValue::Text(
                    self.read(file)
                        .and_then(|content| capture(self.platform, pattern, &content))
                        .unwrap_or_default(),
                ),
            ),
            FlagRule::CondaEnvironment { flag, files } => {
                let is_conda = files.iter().any(|file| {
                    self.read(file)
                        .and_then(|content| {
                            serde_yaml::from_str::<CondaEnvironment>(&content)
                                .map_err(|e| {
                                    debug!(file = *file, error = %e, "Not a conda environment file");
                                })
                                .ok()
                        })
                        .is_some_and(|env| env.is_conda())
                });
                (flag, FlagValue::Bool(is_conda))
            }
            FlagRule::ProjectFile { flag } => (
                flag,
                FlagValue::Text(self.project.unwrap_or_default().to_string()),
            ),
            FlagRule::ProjectElement { flag, element } => (
                flag,
                FlagValue::Text(self.project_xml_element(element).unwrap_or_default()),
            ),
            FlagRule::Version { flag, rule } => {
                (flag, FlagValue::Text(self.version(&rule).unwrap_or_default()))
            }
            FlagRule::GlobalJsonRollForward { flag } => (
                flag,
                FlagValue::Text(
                    self.global_json_sdk()
                        .and_then(|sdk| sdk.roll_forward)
                        .unwrap_or_default(),
                ),
            ),
            FlagRule::GlobalJsonAllowPrerelease { flag } => (
                flag,
                FlagValue::Text(
                    self.global_json_sdk()
                        .and_then(|sdk| sdk.allow_prerelease)
                        .map(|allow| allow.to_string())
                        .unwrap_or_default(),
                ),
            ),
        }
    }

    fn framework(&self, hint: &FrameworkHint) -> Option<&'static str> {
        match *hint {
            FrameworkHint::PackageDependency { name, package } => self
                .parse_json::<PackageJson>("package.json")
                .filter(|manifest| manifest.depends_on(package))
                .map(|_| name),
            FrameworkHint::ComposerDependency { name, package } => self
                .parse_json::<ComposerJson>("composer.json")
                .filter(|manifest| manifest.require.contains_key(package))
                .map(|_| name),
            FrameworkHint::FileLine { name, file, needle } => self
                .read(file)
                .filter(|content| {
                    content
                        .lines()
                        .any(|line| line.trim().to_lowercase().starts_with(needle))
                })
                .map(|_| name),
        }
    }
}

fn capture(platform: &str, pattern: &str, content: &str) -> Option<String> {
    let regex = match Regex::new(&format!("(?m){}", pattern)) {
        Ok(regex) => regex,
        Err(e) => {
            warn!(platform, pattern, error = %e, "Invalid version pattern");
            return None;
        }
    };
    regex
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// `net6.0` -> `6.0`, `netcoreapp3.1` -> `3.1`; .NET Framework monikers yield nothing
fn runtime_from_target_framework(moniker: &str) -> Option<String> {
    let moniker = moniker.trim().to_lowercase();
    let version = moniker
        .strip_prefix("netcoreapp")
        .or_else(|| moniker.strip_prefix("net"))?;
    let version = version.split('-').next().unwrap_or(version);
    version.contains('.').then(|| version.to_string())
}

impl SpecDetector {
    pub fn new(
        platform: &'static str,
        spec: &'static DetectorSpec,
        settings: DetectorSettings,
    ) -> Self {
        Self {
            platform,
            spec,
            settings,
        }
    }

    fn recursive(&self) -> bool {
        !self.settings.disable_recursive_lookup
    }

    fn locate_project(&self, repo: &dyn SourceRepo) -> Result<Option<String>, BuildError> {
        if let Some(explicit) = &self.settings.project {
            let relative = join_segments(&[explicit.as_str()]);
            if !repo.file_exists(&[relative.as_str()]) {
                return Err(BuildError::InvalidProjectReference {
                    platform: self.platform.to_string(),
                    path: explicit.clone(),
                });
            }
            return Ok(Some(relative));
        }

        let Some(rule) = &self.spec.project_files else {
            return Ok(None);
        };

        let mut candidates: Vec<String> = rule
            .patterns
            .iter()
            .flat_map(|pattern| repo.enumerate_files(pattern, self.recursive(), None))
            .collect();
        // Shallowest project wins, ties broken by path
        candidates.sort_by(|a, b| {
            a.matches('/')
                .count()
                .cmp(&b.matches('/').count())
                .then_with(|| a.cmp(b))
        });
        Ok(candidates.into_iter().next())
    }

    fn has_signal(&self, repo: &dyn SourceRepo) -> bool {
        let spec = self.spec;
        if spec.signal_files.iter().any(|file| repo.file_exists(&[*file])) {
            return true;
        }
        if spec
            .signal_patterns
            .iter()
            .any(|pattern| !repo.enumerate_files(pattern, self.recursive(), None).is_empty())
        {
            return true;
        }
        spec.weak_signal_files.iter().any(|file| repo.file_exists(&[*file]))
            && !spec.conflicting_files.iter().any(|file| repo.file_exists(&[*file]))
    }
}

impl PlatformDetector for SpecDetector {
    fn detect(&self, repo: &dyn SourceRepo) -> Result<Detection, BuildError> {
        let project = self.locate_project(repo)?;

        if project.is_none() && !self.has_signal(repo) {
            debug!(platform = self.platform, "No signal files found");
            return Ok(Detection::NotApplicable);
        }

        if let (Some(project), Some(rule)) = (&project, &self.spec.project_files) {
            if rule.require_xml {
                let content = repo.read_file(&[project.as_str()]).map_err(|e| {
                    BuildError::Internal(format!("Failed to read project file {}: {}", project, e))
                })?;
                if let Err(e) = roxmltree::Document::parse(&content) {
                    return Ok(Detection::Malformed {
                        reason: format!("project file {} is not valid XML: {}", project, e),
                    });
                }
            }
        }

        let scope = Scope {
            repo,
            platform: self.platform,
            project: project.as_deref(),
        };

        let mut result =
            DetectionResult::new(self.platform, project.as_deref().map(parent_dir).unwrap_or(""));
        result.detected_version = self
            .spec
            .version_rules
            .iter()
            .find_map(|rule| scope.version(rule));

        for rule in self.spec.flags {
            let (name, value) = scope.flag(rule);
            result.flags.insert(name.to_string(), value);
        }

        let mut frameworks: Vec<&str> = Vec::new();
        for name in self.spec.frameworks.iter().filter_map(|hint| scope.framework(hint)) {
            if !frameworks.contains(&name) {
                frameworks.push(name);
            }
        }
        if !frameworks.is_empty() {
            result
                .flags
                .insert("frameworks".to_string(), FlagValue::Text(frameworks.join(",")));
        }

        debug!(
            platform = self.platform,
            version = ?result.detected_version,
            app_directory = %result.app_directory,
            "Platform detected"
        );
        Ok(Detection::Applicable(result))
    }
}
