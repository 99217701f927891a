//! Platform detection against a [`SourceRepo`]
//!
//! A detector answers with one of three outcomes (see [`Detection`]):
//!
//! - `Applicable`: the platform's signals are present; the result carries the
//!   version pinned in the repository (if any), the app directory and flags
//! - `NotApplicable`: no signal files at all, the normal negative outcome
//! - `Malformed`: signals are present but a file whose parseability is part of
//!   the signal cannot be parsed
//!
//! Optional metadata that fails to parse never produces `Malformed`; it only
//! leaves `detected_version` empty.

pub mod engine;
pub mod manifests;

pub use engine::{
    DetectorSettings, DetectorSpec, FlagRule, FrameworkHint, ProjectFileRule, SpecDetector,
    VersionRule,
};

use crate::error::BuildError;
use crate::repo::SourceRepo;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Value of a platform-specific detection flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Text(String),
}

impl FlagValue {
    /// True for `Bool(true)` and non-empty text
    pub fn is_set(&self) -> bool {
        match self {
            FlagValue::Bool(value) => *value,
            FlagValue::Text(text) => !text.is_empty(),
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagValue::Bool(value) => write!(f, "{}", value),
            FlagValue::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionResult {
    pub platform: String,
    pub detected_version: Option<String>,
    pub app_directory: String,
    pub flags: BTreeMap<String, FlagValue>,
}

impl DetectionResult {
    pub fn new(platform: &str, app_directory: &str) -> Self {
        Self {
            platform: platform.to_string(),
            detected_version: None,
            app_directory: app_directory.to_string(),
            flags: BTreeMap::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.detected_version = Some(version.into());
        self
    }

    pub fn with_flag(mut self, name: &str, value: FlagValue) -> Self {
        self.flags.insert(name.to_string(), value);
        self
    }

    pub fn flag_is_set(&self, name: &str) -> bool {
        self.flags.get(name).is_some_and(FlagValue::is_set)
    }

    pub fn flag_text(&self, name: &str) -> Option<&str> {
        match self.flags.get(name) {
            Some(FlagValue::Text(text)) => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    Applicable(DetectionResult),
    NotApplicable,
    Malformed { reason: String },
}

impl Detection {
    pub fn into_result(self) -> Option<DetectionResult> {
        match self {
            Detection::Applicable(result) => Some(result),
            _ => None,
        }
    }
}

pub trait PlatformDetector: Send + Sync {
    /// Inspects the repository. Must only read through `repo`.
    fn detect(&self, repo: &dyn SourceRepo) -> Result<Detection, BuildError>;
}
