//! .NET SDK selection from a global.json pin
//!
//! SDK versions are `major.minor.FPP`: the hundreds of the third component are
//! the feature band and the rest is the patch (`6.0.413` is band 4, patch 13).
//! A pin names a version plus a roll-forward policy deciding which installed
//! SDKs may stand in for it.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SdkPinError {
    #[error("'{0}' is not an SDK version (expected major.minor.feature like 6.0.100)")]
    Version(String),

    #[error("'{0}' is not a roll-forward policy")]
    RollForward(String),
}

/// One parsed SDK version, ordered by major, minor, band, patch, then pre-release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkVersion {
    pub major: u64,
    pub minor: u64,
    pub feature: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
    raw: String,
}

impl SdkVersion {
    pub fn parse(input: &str) -> Result<Self, SdkPinError> {
        let raw = input.trim();
        let (core, prerelease) = match raw.split_once('-') {
            Some((core, pre)) => (core, Some(pre.to_string())),
            None => (raw, None),
        };

        let parts: Vec<u64> = core
            .split('.')
            .map(|part| part.parse::<u64>())
            .collect::<Result<_, _>>()
            .map_err(|_| SdkPinError::Version(raw.to_string()))?;
        let &[major, minor, feature_patch] = parts.as_slice() else {
            return Err(SdkPinError::Version(raw.to_string()));
        };

        Ok(Self {
            major,
            minor,
            feature: feature_patch / 100,
            patch: feature_patch % 100,
            prerelease,
            raw: raw.to_string(),
        })
    }

    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn same_band(&self, other: &Self) -> bool {
        self.major == other.major && self.minor == other.minor && self.feature == other.feature
    }
}

impl Ord for SdkVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.feature, self.patch)
            .cmp(&(other.major, other.minor, other.feature, other.patch))
            .then_with(|| match (&self.prerelease, &other.prerelease) {
                (None, None) => Ordering::Equal,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            })
    }
}

impl PartialOrd for SdkVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SdkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// `sdk.rollForward` of global.json
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RollForward {
    Disable,
    Patch,
    Feature,
    Minor,
    Major,
    #[default]
    LatestPatch,
    LatestFeature,
    LatestMinor,
    LatestMajor,
}

impl FromStr for RollForward {
    type Err = SdkPinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disable" => Ok(RollForward::Disable),
            "patch" => Ok(RollForward::Patch),
            "feature" => Ok(RollForward::Feature),
            "minor" => Ok(RollForward::Minor),
            "major" => Ok(RollForward::Major),
            "latestpatch" => Ok(RollForward::LatestPatch),
            "latestfeature" => Ok(RollForward::LatestFeature),
            "latestminor" => Ok(RollForward::LatestMinor),
            "latestmajor" => Ok(RollForward::LatestMajor),
            _ => Err(SdkPinError::RollForward(s.to_string())),
        }
    }
}

/// A requested SDK version and the rules for standing in for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkPin {
    pub version: SdkVersion,
    pub roll_forward: RollForward,
    pub allow_prerelease: bool,
}

impl SdkPin {
    /// Pin written in global.json. Pre-releases are allowed unless it says otherwise.
    pub fn new(
        version: &str,
        roll_forward: RollForward,
        allow_prerelease: Option<bool>,
    ) -> Result<Self, SdkPinError> {
        Ok(Self {
            version: SdkVersion::parse(version)?,
            roll_forward,
            allow_prerelease: allow_prerelease.unwrap_or(true),
        })
    }

    /// Pin used without global.json: the newest band and patch of the runtime's
    /// `major.minor`, starting from band 1
    pub fn for_runtime(major: u64, minor: u64) -> Self {
        Self {
            version: SdkVersion {
                major,
                minor,
                feature: 1,
                patch: 0,
                prerelease: None,
                raw: format!("{}.{}.100", major, minor),
            },
            roll_forward: RollForward::LatestFeature,
            allow_prerelease: true,
        }
    }

    /// The available SDK this pin selects, if any
    pub fn resolve(&self, available: &[String]) -> Option<String> {
        let candidates: Vec<SdkVersion> = available
            .iter()
            .filter_map(|v| SdkVersion::parse(v).ok())
            .filter(|v| self.allow_prerelease || !v.is_prerelease())
            .collect();
        let wanted = &self.version;

        let found = match self.roll_forward {
            RollForward::Disable => candidates.iter().find(|v| *v == wanted),
            RollForward::Patch => candidates
                .iter()
                .find(|v| *v == wanted)
                .or_else(|| latest_patch(&candidates, wanted)),
            RollForward::Feature => feature(&candidates, wanted),
            RollForward::Minor => minor(&candidates, wanted),
            RollForward::Major => major(&candidates, wanted),
            RollForward::LatestPatch => latest_patch(&candidates, wanted),
            RollForward::LatestFeature => candidates
                .iter()
                .filter(|v| {
                    v.major == wanted.major && v.minor == wanted.minor && v.feature >= wanted.feature
                })
                .max(),
            RollForward::LatestMinor => candidates
                .iter()
                .filter(|v| v.major == wanted.major && v.minor >= wanted.minor)
                .max(),
            RollForward::LatestMajor => candidates.iter().filter(|v| v.major >= wanted.major).max(),
        };
        found.map(|v| v.as_str().to_string())
    }
}

fn latest_patch<'a>(candidates: &'a [SdkVersion], wanted: &SdkVersion) -> Option<&'a SdkVersion> {
    candidates
        .iter()
        .filter(|v| v.same_band(wanted) && v.patch >= wanted.patch)
        .max()
}

/// Latest patch of the requested band, else of the next higher band in the same `major.minor`
fn feature<'a>(candidates: &'a [SdkVersion], wanted: &SdkVersion) -> Option<&'a SdkVersion> {
    let same_minor = || {
        candidates
            .iter()
            .filter(move |v| v.major == wanted.major && v.minor == wanted.minor)
    };

    if same_minor().any(|v| v.feature == wanted.feature) {
        return latest_patch(candidates, wanted);
    }
    let next = same_minor().filter(|v| v.feature > wanted.feature).min()?;
    latest_patch(candidates, next)
}

/// [`feature`], else the lowest higher minor of the same major
fn minor<'a>(candidates: &'a [SdkVersion], wanted: &SdkVersion) -> Option<&'a SdkVersion> {
    if let Some(found) = feature(candidates, wanted) {
        return Some(found);
    }
    let next = candidates
        .iter()
        .filter(|v| v.major == wanted.major && v.minor > wanted.minor)
        .min()?;
    feature(candidates, next)
}

/// [`minor`], else the lowest higher major
fn major<'a>(candidates: &'a [SdkVersion], wanted: &SdkVersion) -> Option<&'a SdkVersion> {
    if let Some(found) = minor(candidates, wanted) {
        return Some(found);
    }
    let next = candidates.iter().filter(|v| v.major > wanted.major).min()?;
    minor(candidates, next)
}
