//! Build manifest: the `key=value` record of what a build used

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE_NAME: &str = "build-manifest.txt";

pub const PLATFORM_NAME_KEY: &str = "PlatformName";
pub const PLATFORM_VERSION_KEY: &str = "PlatformVersion";
pub const OPERATION_ID_KEY: &str = "OperationId";
pub const SOURCE_REVISION_KEY: &str = "SourceRevision";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildManifest {
    properties: BTreeMap<String, String>,
}

impl BuildManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one property; a later write of the same key wins
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn merge(&mut self, properties: &BTreeMap<String, String>) {
        for (key, value) in properties {
            self.set(key.clone(), value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// One `key=value` line per property, sorted by key
    pub fn to_text(&self) -> String {
        self.properties
            .iter()
            .map(|(key, value)| format!("{}={}\n", key, value.replace('\n', " ")))
            .collect()
    }

    pub fn parse(text: &str) -> Self {
        let properties = text
            .lines()
            .filter_map(|line| line.split_once('='))
            .map(|(key, value)| (key.trim().to_string(), value.to_string()))
            .filter(|(key, _)| !key.is_empty())
            .collect();
        Self { properties }
    }

    /// Writes `build-manifest.txt` into `dir`, creating the directory
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create manifest directory: {}", dir.display()))?;
        let path = dir.join(MANIFEST_FILE_NAME);
        fs::write(&path, self.to_text())
            .with_context(|| format!("Failed to write manifest: {}", path.display()))?;
        Ok(path)
    }
}
