pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{
    BuildArgs, BuildScriptArgs, CliArgs, Commands, DetectArgs, PlanArgs, PlatformsArgs,
    ResolveVersionArgs,
};
pub use output::{OutputFormat, OutputFormatter, PlatformListing};
