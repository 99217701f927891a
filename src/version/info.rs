use semver::Version;
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("'{input}' is not a valid version: {reason}")]
pub struct VersionParseError {
    pub input: String,
    pub reason: String,
}

/// A version as written by a user or a provider, plus its semantic form
///
/// Platform feeds write pre-releases without a separating hyphen (`3.9.0b1`) and
/// often omit trailing components (`16`, `3.9`). Both are normalized before
/// parsing, so `3.9.0b1` compares as a pre-release of `3.9.0`.
#[derive(Debug, Clone)]
pub struct VersionInfo {
    display: String,
    semantic: Version,
}

impl VersionInfo {
    pub fn parse(input: &str) -> Result<Self, VersionParseError> {
        let display = input.trim();
        let normalized = normalize(display);
        let semantic = Version::parse(&normalized).map_err(|e| VersionParseError {
            input: input.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            display: display.to_string(),
            semantic,
        })
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn semantic(&self) -> &Version {
        &self.semantic
    }

    pub fn is_preview(&self) -> bool {
        !self.semantic.pre.is_empty()
    }

    /// `major.minor` of the semantic version, e.g. "3.11" for "3.11.4"
    pub fn major_minor(&self) -> String {
        format!("{}.{}", self.semantic.major, self.semantic.minor)
    }
}

/// Rewrites a loosely formatted version into strict semver syntax
///
/// - strips a leading `v`
/// - inserts a hyphen before the first letter of the core (`3.9.0b1` -> `3.9.0-b1`)
/// - pads the numeric core to three components (`16` -> `16.0.0`)
pub fn normalize(input: &str) -> String {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);

    let (rest, build) = match trimmed.split_once('+') {
        Some((rest, build)) => (rest, Some(build)),
        None => (trimmed, None),
    };

    let (core, pre) = match rest.split_once('-') {
        Some((core, pre)) => (core, Some(pre.to_string())),
        None => match rest.find(|c: char| c.is_ascii_alphabetic()) {
            Some(idx) => (&rest[..idx], Some(rest[idx..].to_string())),
            None => (rest, None),
        },
    };

    let core = core.trim_end_matches('.');
    let mut parts: Vec<&str> = core.split('.').collect();
    while parts.len() < 3 {
        parts.push("0");
    }

    let mut normalized = parts.join(".");
    if let Some(pre) = pre.filter(|p| !p.is_empty()) {
        normalized.push('-');
        normalized.push_str(&pre);
    }
    if let Some(build) = build.filter(|b| !b.is_empty()) {
        normalized.push('+');
        normalized.push_str(build);
    }
    normalized
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

impl PartialEq for VersionInfo {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionInfo {}

impl PartialOrd for VersionInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.semantic
            .cmp(&other.semantic)
            .then_with(|| self.display.cmp(&other.display))
    }
}
