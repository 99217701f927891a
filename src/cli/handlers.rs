//! Command handlers for the buildsmith binary
//!
//! Each handler returns the process exit code. Planning and anything touching
//! the version providers runs on the blocking pool, since the HTTP transport
//! uses a blocking client.

use super::commands::{
    BuildArgs, BuildScriptArgs, DetectArgs, PlanArgs, PlatformsArgs, ResolveVersionArgs,
};
use super::output::{OutputFormatter, PlatformListing};
use crate::config::{BuildOptions, ConfigError};
use crate::error::{BuildError, EXIT_INTERNAL_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
use crate::orchestrator::{BuildOrchestrator, BuildPlan};
use crate::platform::{BuildContext, PlatformRegistry};
use crate::repo::LocalSourceRepo;
use crate::runner::revision::current_revision;
use crate::runner::{JobRunner, JobStatus};
use crate::version::max_satisfying;
use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Name of the script written by `build`
pub const BUILD_SCRIPT_FILE_NAME: &str = "build.sh";

pub async fn handle_build_script(args: &BuildScriptArgs) -> i32 {
    let source = match canonical_source(&args.source) {
        Ok(source) => source,
        Err(e) => return report(&e),
    };
    let plan = match plan_build(&args.plan, BuildContext::new(&source)).await {
        Ok(plan) => plan,
        Err(e) => return report(&e),
    };

    match write_build_script_outputs(args, &plan) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_INTERNAL_ERROR
        }
    }
}

fn write_build_script_outputs(args: &BuildScriptArgs, plan: &BuildPlan) -> Result<()> {
    match &args.output {
        Some(path) => {
            fs::write(path, &plan.script)
                .with_context(|| format!("Failed to write script: {}", path.display()))?;
            info!(path = %path.display(), "Build script written");
        }
        None => print!("{}", plan.script),
    }
    if let Some(dir) = &args.manifest_dir {
        let path = plan.manifest.write_to_dir(dir)?;
        info!(path = %path.display(), "Build manifest written");
    }
    Ok(())
}

pub async fn handle_build(args: &BuildArgs) -> i32 {
    let source = match canonical_source(&args.source) {
        Ok(source) => source,
        Err(e) => return report(&e),
    };

    let (build_dir, revision) =
        match prepare_build_dir(source, args.intermediate_dir.clone()).await {
            Ok(prepared) => prepared,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                return EXIT_INTERNAL_ERROR;
            }
        };

    let mut context = BuildContext::new(&build_dir);
    context.revision = revision;
    let plan = match plan_build(&args.plan, context).await {
        Ok(plan) => plan,
        Err(e) => return report(&e),
    };

    let script_path = match write_build_outputs(&args.output_dir, &plan) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return EXIT_INTERNAL_ERROR;
        }
    };

    let runner = JobRunner::new();
    let job = runner.submit(plan.script.clone(), &build_dir);
    info!(job = %job, script = %script_path.display(), "Build started");

    match runner.wait(&job).await {
        Some(JobStatus::Succeeded) => EXIT_SUCCESS,
        Some(JobStatus::Failed { exit_code, message }) => {
            eprintln!("Error: build script failed: {}", message);
            exit_code.filter(|code| *code != EXIT_SUCCESS).unwrap_or(EXIT_INTERNAL_ERROR)
        }
        Some(JobStatus::Running) | None => {
            eprintln!("Error: build job {} was lost", job);
            EXIT_INTERNAL_ERROR
        }
    }
}

fn write_build_outputs(output_dir: &Path, plan: &BuildPlan) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;
    let script_path = output_dir.join(BUILD_SCRIPT_FILE_NAME);
    fs::write(&script_path, &plan.script)
        .with_context(|| format!("Failed to write script: {}", script_path.display()))?;
    plan.manifest.write_to_dir(output_dir)?;
    Ok(script_path)
}

/// Reads the source revision and copies the tree to the intermediate directory,
/// if one is given. Returns the directory to build in and the revision.
async fn prepare_build_dir(
    source: PathBuf,
    intermediate: Option<PathBuf>,
) -> Result<(PathBuf, String)> {
    tokio::task::spawn_blocking(move || {
        let revision = current_revision(&source);
        let build_dir = match intermediate {
            Some(dir) => {
                copy_tree(&source, &dir)?;
                dir
            }
            None => source,
        };
        Ok((build_dir, revision))
    })
    .await
    .context("Source preparation task failed")?
}

/// Copies `source` into `target`, skipping `.git`
fn copy_tree(source: &Path, target: &Path) -> Result<()> {
    let walker = WalkBuilder::new(source)
        .standard_filters(false)
        .filter_entry(|entry| entry.file_name() != ".git")
        .build();

    for entry in walker {
        let entry = entry.context("Failed to walk source directory")?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .context("Walked outside the source directory")?;
        let destination = target.join(relative);
        if entry.file_type().is_some_and(|t| t.is_dir()) {
            fs::create_dir_all(&destination)
                .with_context(|| format!("Failed to create {}", destination.display()))?;
        } else {
            fs::copy(entry.path(), &destination)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
        }
    }
    debug!(from = %source.display(), to = %target.display(), "Copied source tree");
    Ok(())
}

pub async fn handle_detect(args: &DetectArgs) -> i32 {
    let source = match canonical_source(&args.source) {
        Ok(source) => source,
        Err(e) => return report(&e),
    };
    let options = match load_options(&args.settings) {
        Ok(options) => options,
        Err(e) => return report(&e),
    };

    let detections = tokio::task::spawn_blocking(move || {
        let registry = PlatformRegistry::with_defaults(&options)?;
        let orchestrator = BuildOrchestrator::new(registry, options);
        orchestrator.detect_platforms(&LocalSourceRepo::new(source))
    })
    .await
    .unwrap_or_else(|e| Err(BuildError::Internal(format!("detection task failed: {}", e))));

    let detections = match detections {
        Ok(detections) => detections,
        Err(e) => return report(&e),
    };
    print_formatted(OutputFormatter::new(args.format.into()).format_detections(&detections))
}

pub async fn handle_platforms(args: &PlatformsArgs) -> i32 {
    let options = match load_options(&args.settings) {
        Ok(options) => options,
        Err(e) => return report(&e),
    };

    let listings = tokio::task::spawn_blocking(move || {
        let registry = PlatformRegistry::with_defaults(&options)?;
        let listings = registry
            .plugins()
            .iter()
            .map(|plugin| match plugin.supported_versions() {
                Ok(info) => PlatformListing {
                    name: plugin.name().to_string(),
                    versions: Some(info),
                    error: None,
                },
                Err(e) => PlatformListing {
                    name: plugin.name().to_string(),
                    versions: None,
                    error: Some(e.to_string()),
                },
            })
            .collect::<Vec<_>>();
        Ok::<_, BuildError>(listings)
    })
    .await
    .unwrap_or_else(|e| Err(BuildError::Internal(format!("listing task failed: {}", e))));

    let listings = match listings {
        Ok(listings) => listings,
        Err(e) => return report(&e),
    };
    print_formatted(OutputFormatter::new(args.format.into()).format_platforms(&listings))
}

pub fn handle_resolve_version(args: &ResolveVersionArgs) -> i32 {
    match max_satisfying(&args.range, &args.supported) {
        Some(version) => {
            println!("{}", version);
            EXIT_SUCCESS
        }
        None => {
            eprintln!(
                "Error: No version satisfies '{}'. Candidates: {}",
                args.range,
                args.supported.join(", ")
            );
            EXIT_USAGE_ERROR
        }
    }
}

/// Loads options from the environment with the command-line overrides on top
fn load_options(overrides: &[String]) -> Result<BuildOptions, BuildError> {
    let options = BuildOptions::from_env_with_overrides(overrides)?;
    options.validate()?;
    debug!(?options, "Loaded build options");
    Ok(options)
}

async fn plan_build(args: &PlanArgs, context: BuildContext) -> Result<BuildPlan, BuildError> {
    let options = load_options(&args.setting_overrides())?;
    let context = context.with_properties(parse_properties(&args.properties)?);

    tokio::task::spawn_blocking(move || {
        let registry = PlatformRegistry::with_defaults(&options)?;
        let repo = LocalSourceRepo::new(&context.source_dir);
        BuildOrchestrator::new(registry, options).plan(&repo, &context)
    })
    .await
    .unwrap_or_else(|e| Err(BuildError::Internal(format!("planning task failed: {}", e))))
}

/// Parses `-p KEY=VALUE` build properties
pub fn parse_properties(entries: &[String]) -> Result<BTreeMap<String, String>, ConfigError> {
    entries
        .iter()
        .map(|entry| match entry.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.to_string()))
            }
            _ => Err(ConfigError::MalformedSetting(entry.clone())),
        })
        .collect()
}

fn canonical_source(source: &Path) -> Result<PathBuf, BuildError> {
    if !source.is_dir() {
        return Err(BuildError::SourceNotFound(source.to_path_buf()));
    }
    source
        .canonicalize()
        .map_err(|_| BuildError::SourceNotFound(source.to_path_buf()))
}

fn print_formatted(formatted: Result<String>) -> i32 {
    match formatted {
        Ok(output) => {
            println!("{}", output);
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_INTERNAL_ERROR
        }
    }
}

fn report(err: &BuildError) -> i32 {
    error!(kind = ?err.kind(), "{}", err);
    eprintln!("{}", err.help_message());
    err.exit_code()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_properties() {
        let properties = parse_properties(&[
            "virtualenv_name=venv".to_string(),
            "extra= --flag=1".to_string(),
        ])
        .unwrap();
        assert_eq!(properties["virtualenv_name"], "venv");
        assert_eq!(properties["extra"], " --flag=1");

        assert!(parse_properties(&["novalue".to_string()]).is_err());
        assert!(parse_properties(&["=value".to_string()]).is_err());
    }

    #[test]
    fn test_missing_source_is_usage_error() {
        let err = canonical_source(Path::new("/definitely/not/here")).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_USAGE_ERROR);
    }

    #[test]
    fn test_copy_tree_skips_git() {
        let source = TempDir::new().unwrap();
        fs::create_dir_all(source.path().join("src")).unwrap();
        fs::create_dir_all(source.path().join(".git")).unwrap();
        fs::write(source.path().join("src/app.py"), "print(1)").unwrap();
        fs::write(source.path().join(".git/HEAD"), "ref").unwrap();
        fs::write(source.path().join(".env"), "A=1").unwrap();

        let target = TempDir::new().unwrap();
        copy_tree(source.path(), target.path()).unwrap();

        assert!(target.path().join("src/app.py").is_file());
        assert!(target.path().join(".env").is_file());
        assert!(!target.path().join(".git").exists());
    }

    #[tokio::test]
    async fn test_prepare_build_dir() {
        let source = TempDir::new().unwrap();
        fs::write(source.path().join("requirements.txt"), "flask").unwrap();

        let (dir, revision) = prepare_build_dir(source.path().to_path_buf(), None)
            .await
            .unwrap();
        assert_eq!(dir, source.path());
        assert!(!revision.is_empty());

        let target = TempDir::new().unwrap();
        let intermediate = target.path().join("build");
        let (dir, _) = prepare_build_dir(source.path().to_path_buf(), Some(intermediate.clone()))
            .await
            .unwrap();
        assert_eq!(dir, intermediate);
        assert!(intermediate.join("requirements.txt").is_file());
    }

    #[test]
    fn test_resolve_version_exit_codes() {
        let ok = ResolveVersionArgs {
            range: "^18.0.0".to_string(),
            supported: vec!["16.20.1".to_string(), "18.17.1".to_string()],
        };
        assert_eq!(handle_resolve_version(&ok), EXIT_SUCCESS);

        let none = ResolveVersionArgs {
            range: "^21".to_string(),
            supported: vec!["18.17.1".to_string()],
        };
        assert_eq!(handle_resolve_version(&none), EXIT_USAGE_ERROR);
    }
}
