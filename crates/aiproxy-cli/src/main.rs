//! CLI entry point - the composition root.

use std::process::ExitCode;

use aiproxy_cli::{
    Cli, CliError, Commands, handlers, init_logging, server_config, validated_server_config,
};
use clap::{CommandFactory, Parser};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load environment variables before clap reads its env fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    let result: Result<(), CliError> = match command {
        Commands::Serve(args) => match validated_server_config(&args) {
            Ok(config) => handlers::serve::execute(config).await,
            Err(e) => Err(e),
        },
        Commands::Config(args) => {
            server_config(&args).and_then(|config| handlers::config::execute(&config))
        }
    };

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("Error: {e}");
            Ok(ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1)))
        }
    }
}
