use buildsmith::cli::commands::{CliArgs, Commands};
use buildsmith::cli::handlers::{
    handle_build, handle_build_script, handle_detect, handle_platforms, handle_resolve_version,
};
use buildsmith::util::logging::{init_logging, LoggingConfig};
use buildsmith::VERSION;

use clap::Parser;
use tracing::debug;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging(LoggingConfig::from_cli(
        args.log_level.as_deref(),
        args.verbose,
        args.quiet,
    ));

    debug!("buildsmith v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::BuildScript(script_args) => handle_build_script(script_args).await,
        Commands::Build(build_args) => handle_build(build_args).await,
        Commands::Detect(detect_args) => handle_detect(detect_args).await,
        Commands::Platforms(platforms_args) => handle_platforms(platforms_args).await,
        Commands::ResolveVersion(resolve_args) => handle_resolve_version(resolve_args),
    };

    std::process::exit(exit_code);
}
