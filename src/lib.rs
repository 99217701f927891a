//! buildsmith - platform detection and build script generation
//!
//! This library inspects a source directory, decides which language platforms
//! it targets, resolves the platform versions to build with and produces a
//! deterministic bash build script together with a build manifest.
//!
//! # Core Concepts
//!
//! - **Platforms**: pluggable [`PlatformPlugin`]s (dotnet, nodejs, python, php,
//!   ruby, java, golang) described by static [`PlatformSpec`] tables
//! - **Detection**: reading signal files through a [`SourceRepo`] to produce a
//!   [`DetectionResult`] per applicable platform
//! - **Version providers**: on-disk, SDK storage and external sources of the
//!   supported versions, composed per platform
//! - **Orchestration**: [`BuildOrchestrator`] walks detect, resolve, install and
//!   assemble, producing a [`BuildPlan`]
//!
//! # Example Usage
//!
//! ```no_run
//! use buildsmith::{BuildContext, BuildOptions, BuildOrchestrator, LocalSourceRepo, PlatformRegistry};
//!
//! fn plan(source: &str) -> Result<String, buildsmith::BuildError> {
//!     let options = BuildOptions::from_env()?;
//!     let registry = PlatformRegistry::with_defaults(&options)?;
//!     let orchestrator = BuildOrchestrator::new(registry, options);
//!
//!     let repo = LocalSourceRepo::new(source);
//!     let plan = orchestrator.plan(&repo, &BuildContext::new(source))?;
//!     Ok(plan.script)
//! }
//! ```
//!
//! # Project Structure
//!
//! - [`detector`]: detection outcomes and the table-driven detector engine
//! - [`version`]: version parsing, range matching and precedence resolution
//! - [`provider`]: supported-version providers and their composition
//! - [`platform`] / [`platforms`]: the plugin trait, registry and catalog
//! - [`orchestrator`]: the build phases and script assembly
//! - [`runner`]: background execution of generated scripts

// Public modules
pub mod cli;
pub mod config;
pub mod detector;
pub mod error;
pub mod manifest;
pub mod orchestrator;
pub mod platform;
pub mod platforms;
pub mod provider;
pub mod repo;
pub mod runner;
pub mod script;
pub mod util;
pub mod version;

// Re-export key types for convenient access
pub use config::{BuildOptions, ConfigError, PlatformOptions};
pub use detector::{Detection, DetectionResult, FlagValue, PlatformDetector};
pub use error::{BuildError, ErrorKind};
pub use manifest::BuildManifest;
pub use orchestrator::{BuildOrchestrator, BuildPhase, BuildPlan, PlannedPlatform};
pub use platform::{BuildContext, BuildScriptSnippet, PlatformPlugin, PlatformRegistry, PlatformSpec};
pub use provider::{PlatformVersionInfo, ProviderError, VersionProvider};
pub use repo::{LocalSourceRepo, MemorySourceRepo, SourceRepo};
pub use runner::{JobId, JobRunner, JobStatus};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};
pub use version::{max_satisfying, ResolvedVersion, VersionResolver, VersionSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
