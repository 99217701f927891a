//! Error taxonomy for detection, resolution and script assembly
//!
//! Every failure that can abort a build is a [`BuildError`]. Errors fall into
//! three kinds (see [`ErrorKind`]) which drive the process exit code:
//!
//! - **Usage** errors are caused by the repository or the invocation and carry an
//!   actionable message listing the valid options.
//! - **Transient provider** errors come from an unreachable remote version listing.
//! - **Internal** errors indicate a broken invariant and are never recovered from.

use crate::config::ConfigError;
use crate::provider::ProviderError;
use std::path::PathBuf;
use thiserror::Error;

/// Exit code for a successful run
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for unexpected internal failures
pub const EXIT_INTERNAL_ERROR: i32 = 1;
/// Exit code for user and usage errors
pub const EXIT_USAGE_ERROR: i32 = 2;
/// Exit code for an unreachable remote version listing
pub const EXIT_PROVIDER_ERROR: i32 = 3;

/// Broad classification of a [`BuildError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Usage,
    TransientProvider,
    Internal,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Platform '{name}' is not supported. Supported platforms: {}", supported.join(", "))]
    UnsupportedPlatform { name: String, supported: Vec<String> },

    #[error("Platform '{platform}' version '{attempted}' is unsupported. Supported versions: {}", supported.join(", "))]
    UnsupportedVersion {
        platform: String,
        attempted: String,
        supported: Vec<String>,
    },

    #[error("No version could be determined for platform '{platform}'")]
    NoVersionAvailable { platform: String },

    #[error("Could not detect any platform in the source directory")]
    NoApplicablePlatform,

    #[error("Platform '{platform}' was requested but could not be detected in the source directory")]
    PlatformNotDetected { platform: String },

    #[error("Multiple platforms detected: {}. Enable multi-platform builds or pick one with --platform", platforms.join(", "))]
    AmbiguousPlatform { platforms: Vec<String> },

    #[error("Platform '{platform}' version '{version}' is not installed and dynamic installation is disabled")]
    MissingPreinstalledVersion { platform: String, version: String },

    #[error("Project file '{path}' referenced for platform '{platform}' does not exist")]
    InvalidProjectReference { platform: String, path: String },

    #[error("Malformed {platform} project: {reason}")]
    MalformedProject { platform: String, reason: String },

    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BuildError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BuildError::UnsupportedPlatform { .. }
            | BuildError::UnsupportedVersion { .. }
            | BuildError::NoVersionAvailable { .. }
            | BuildError::NoApplicablePlatform
            | BuildError::PlatformNotDetected { .. }
            | BuildError::AmbiguousPlatform { .. }
            | BuildError::MissingPreinstalledVersion { .. }
            | BuildError::InvalidProjectReference { .. }
            | BuildError::MalformedProject { .. }
            | BuildError::SourceNotFound(_)
            | BuildError::Config(_) => ErrorKind::Usage,
            BuildError::Provider(err) => err.kind(),
            BuildError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Usage => EXIT_USAGE_ERROR,
            ErrorKind::TransientProvider => EXIT_PROVIDER_ERROR,
            ErrorKind::Internal => EXIT_INTERNAL_ERROR,
        }
    }

    /// Returns a user-friendly error message with troubleshooting hints
    pub fn help_message(&self) -> String {
        match self {
            BuildError::UnsupportedVersion {
                platform, supported, ..
            } => format!(
                "Error: {}\n\n\
                Help: Pick one of the supported versions, for example:\n\
                - buildsmith build <SOURCE> --platform {} --platform-version {}\n\
                - BUILDSMITH_<KEY>_VERSION=<version>, e.g. BUILDSMITH_NODE_VERSION",
                self,
                platform,
                supported.last().map(String::as_str).unwrap_or("<version>"),
            ),
            BuildError::AmbiguousPlatform { platforms } => format!(
                "Error: {}\n\n\
                Help: The source directory matches several platforms. Either:\n\
                - build one of them with --platform {}\n\
                - enable multi-platform builds with --multi-platform \
                (BUILDSMITH_ENABLE_MULTIPLATFORM_BUILD=true)",
                self,
                platforms.first().map(String::as_str).unwrap_or("<name>")
            ),
            BuildError::NoApplicablePlatform => format!(
                "Error: {}\n\n\
                Help: No signal files were found. Check that the source directory is correct,\n\
                or name the platform explicitly with --platform and --platform-version.\n\
                Run `buildsmith platforms` to list the supported platforms.",
                self
            ),
            BuildError::MissingPreinstalledVersion { platform, version } => format!(
                "Error: {}\n\n\
                Help: Either:\n\
                - enable dynamic installation with --dynamic-install \
                (BUILDSMITH_ENABLE_DYNAMIC_INSTALL=true)\n\
                - pick a pre-installed version; run `buildsmith platforms` to list them\n\
                - install {} {} into the build image",
                self, platform, version
            ),
            BuildError::InvalidProjectReference { platform, .. } => format!(
                "Error: {}\n\n\
                Help: The project path configured for {} is relative to the source directory.\n\
                Fix the path or unset the variable to let the project be discovered.",
                self, platform
            ),
            BuildError::Provider(ProviderError::RemoteListingUnreachable { url, .. }) => format!(
                "Error: {}\n\n\
                Help: The SDK storage listing at {} could not be read. Check network access\n\
                and BUILDSMITH_SDK_STORAGE_BASE_URL, or disable dynamic installation.",
                self, url
            ),
            BuildError::Internal(_) => format!(
                "Error: {}\n\n\
                This is a bug. Re-run with --verbose and report the log output.",
                self
            ),
            _ => format!("Error: {}", self),
        }
    }
}
