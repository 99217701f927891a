use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Platform detection and build script generation
#[derive(Parser, Debug)]
#[command(
    name = "buildsmith",
    about = "Detect a repository's platforms and generate a build script for them",
    version,
    author,
    long_about = "buildsmith inspects a source directory, detects which platforms it targets \
                  (.NET, Node.js, Python, PHP, Ruby, Java, Go), resolves the platform versions \
                  to build with and generates a bash build script plus a build manifest. \
                  Settings are read from BUILDSMITH_* environment variables and can be \
                  overridden with --set KEY=VALUE."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - only log errors"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Generate the build script for a source directory",
        long_about = "Detects platforms, resolves versions and prints the generated build script.\n\n\
                      Examples:\n  \
                      buildsmith build-script ./app\n  \
                      buildsmith build-script ./app --platform python --platform-version 3.11\n  \
                      buildsmith build-script ./app --output build.sh --manifest-dir ./out\n  \
                      buildsmith build-script ./app -p virtualenv_name=venv"
    )]
    BuildScript(BuildScriptArgs),

    #[command(
        about = "Generate and run the build script",
        long_about = "Writes build.sh and the build manifest to the output directory, then runs \
                      the script and waits for it to finish.\n\n\
                      Examples:\n  \
                      buildsmith build ./app --output-dir ./out\n  \
                      buildsmith build ./app --output-dir ./out --dynamic-install"
    )]
    Build(BuildArgs),

    #[command(
        about = "Detect platforms in a source directory",
        long_about = "Runs detection only and reports every applicable platform with the \
                      version and flags found in the repository.\n\n\
                      Examples:\n  \
                      buildsmith detect ./app\n  \
                      buildsmith detect ./app --format json"
    )]
    Detect(DetectArgs),

    #[command(
        about = "List supported platforms and versions",
        long_about = "Lists every registered platform with its supported versions and default \
                      version, as seen by the configured version providers.\n\n\
                      Examples:\n  \
                      buildsmith platforms\n  \
                      buildsmith platforms --format yaml"
    )]
    Platforms(PlatformsArgs),

    #[command(
        about = "Pick the highest version satisfying a range",
        long_about = "Resolves an npm-style range against a list of versions.\n\n\
                      Examples:\n  \
                      buildsmith resolve-version --range '^18.0.0' --supported 16.20.1,18.17.1,20.5.0\n  \
                      buildsmith resolve-version --range '>=3.9 <3.12' --supported 3.9.17,3.11.4,3.12.0"
    )]
    ResolveVersion(ResolveVersionArgs),
}

/// Options shared by the commands that plan a build
#[derive(Args, Debug, Clone, Default)]
pub struct PlanArgs {
    #[arg(long, value_name = "NAME", help = "Build this platform only")]
    pub platform: Option<String>,

    #[arg(
        long,
        value_name = "VERSION",
        requires = "platform",
        help = "Version of the platform given with --platform"
    )]
    pub platform_version: Option<String>,

    #[arg(long, help = "Install missing platform versions while building")]
    pub dynamic_install: bool,

    #[arg(
        long,
        conflicts_with = "dynamic_install",
        help = "Only use pre-installed platform versions"
    )]
    pub no_dynamic_install: bool,

    #[arg(long, help = "Build every detected platform")]
    pub multi_platform: bool,

    #[arg(
        short = 'p',
        long = "property",
        value_name = "KEY=VALUE",
        help = "Build property passed to the script templates"
    )]
    pub properties: Vec<String>,

    #[arg(
        long = "set",
        value_name = "KEY=VALUE",
        help = "Override a BUILDSMITH_* setting"
    )]
    pub settings: Vec<String>,
}

impl PlanArgs {
    /// The flags expressed as setting overrides, applied after `--set`
    pub fn setting_overrides(&self) -> Vec<String> {
        let mut overrides = self.settings.clone();
        if let Some(platform) = &self.platform {
            overrides.push(format!("PLATFORM_NAME={}", platform));
        }
        if let Some(version) = &self.platform_version {
            overrides.push(format!("PLATFORM_VERSION={}", version));
        }
        if self.dynamic_install {
            overrides.push("ENABLE_DYNAMIC_INSTALL=true".to_string());
        }
        if self.no_dynamic_install {
            overrides.push("ENABLE_DYNAMIC_INSTALL=false".to_string());
        }
        if self.multi_platform {
            overrides.push("ENABLE_MULTIPLATFORM_BUILD=true".to_string());
        }
        overrides
    }
}

#[derive(Parser, Debug, Clone)]
pub struct BuildScriptArgs {
    #[arg(value_name = "SOURCE", help = "Source directory")]
    pub source: PathBuf,

    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        help = "Write the script to a file instead of stdout"
    )]
    pub output: Option<PathBuf>,

    #[arg(long, value_name = "DIR", help = "Write build-manifest.txt to this directory")]
    pub manifest_dir: Option<PathBuf>,

    #[command(flatten)]
    pub plan: PlanArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    #[arg(value_name = "SOURCE", help = "Source directory")]
    pub source: PathBuf,

    #[arg(long, value_name = "DIR", help = "Directory receiving build.sh and the manifest")]
    pub output_dir: PathBuf,

    #[arg(
        long,
        value_name = "DIR",
        help = "Copy of the source to build in, leaving the source untouched"
    )]
    pub intermediate_dir: Option<PathBuf>,

    #[command(flatten)]
    pub plan: PlanArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct DetectArgs {
    #[arg(value_name = "SOURCE", help = "Source directory")]
    pub source: PathBuf,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(long = "set", value_name = "KEY=VALUE", help = "Override a BUILDSMITH_* setting")]
    pub settings: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct PlatformsArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(long = "set", value_name = "KEY=VALUE", help = "Override a BUILDSMITH_* setting")]
    pub settings: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct ResolveVersionArgs {
    #[arg(long, value_name = "RANGE", help = "Version range, e.g. '^18.0.0' or '>=3.9 <3.12'")]
    pub range: String,

    #[arg(
        long,
        value_name = "VERSIONS",
        value_delimiter = ',',
        required = true,
        help = "Comma-separated candidate versions"
    )]
    pub supported: Vec<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
