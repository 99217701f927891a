//! Typed partial schemas of the platform manifests detectors read
//!
//! Each struct names only the fields detection needs; everything else in the
//! document is ignored. Missing fields default to empty.

use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageJson {
    #[serde(default)]
    pub engines: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, serde_json::Value>,
}

impl PackageJson {
    pub fn engine(&self, name: &str) -> Option<&str> {
        self.engines.get(name).and_then(|v| v.as_str())
    }

    pub fn depends_on(&self, package: &str) -> bool {
        self.dependencies.contains_key(package) || self.dev_dependencies.contains_key(package)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct GlobalJson {
    #[serde(default, alias = "Sdk", alias = "SDK")]
    pub sdk: Option<GlobalJsonSdk>,
}

/// The `sdk` section; the dotnet host reads its keys case-insensitively
#[derive(Debug, Default, Deserialize)]
pub struct GlobalJsonSdk {
    #[serde(default, alias = "Version")]
    pub version: Option<String>,
    #[serde(
        default,
        rename = "rollForward",
        alias = "rollforward",
        alias = "RollForward"
    )]
    pub roll_forward: Option<String>,
    #[serde(
        default,
        rename = "allowPrerelease",
        alias = "allowprerelease",
        alias = "AllowPrerelease",
        alias = "allowPreRelease",
        alias = "AllowPreRelease"
    )]
    pub allow_prerelease: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ComposerJson {
    #[serde(default)]
    pub require: BTreeMap<String, serde_json::Value>,
}

impl ComposerJson {
    pub fn requirement(&self, package: &str) -> Option<&str> {
        self.require.get(package).and_then(|v| v.as_str())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Pyproject {
    #[serde(default)]
    pub project: Option<PyprojectProject>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PyprojectProject {
    #[serde(default)]
    pub requires_python: Option<String>,
}

/// A conda environment file is recognized by either of these keys
#[derive(Debug, Default, Deserialize)]
pub struct CondaEnvironment {
    #[serde(default)]
    pub channels: Option<serde_yaml::Value>,
    #[serde(default)]
    pub dependencies: Option<serde_yaml::Value>,
}

impl CondaEnvironment {
    pub fn is_conda(&self) -> bool {
        self.channels.is_some() || self.dependencies.is_some()
    }
}
