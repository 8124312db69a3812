//! Main CLI parser and top-level argument handling.
//!
//! This module defines the root CLI structure with global options.

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for the realtime AI proxy.
#[derive(Parser)]
#[command(name = "aiproxy")]
#[command(about = "Bridge websocket clients to realtime AI sessions")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Commands;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        // Verify the CLI parser can be constructed
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from(["aiproxy", "config", "--verbose"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Some(Commands::Config(_))));
    }

    #[test]
    fn test_serve_flags() {
        let cli = Cli::parse_from([
            "aiproxy",
            "serve",
            "--host",
            "127.0.0.1",
            "--port",
            "9100",
            "--cors-origin",
            "http://a.test,http://b.test",
            "--model",
            "models/gemini-live",
            "--code-execution",
            "--temperature",
            "0.4",
        ]);

        let Some(Commands::Serve(args)) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.host, "127.0.0.1");
        assert_eq!(args.port, 9100);
        assert_eq!(args.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(args.model.as_deref(), Some("models/gemini-live"));
        assert!(args.code_execution);
        assert!(!args.google_search);
        assert_eq!(args.temperature, Some(0.4));
    }

    #[test]
    fn test_rejects_bad_port() {
        assert!(Cli::try_parse_from(["aiproxy", "serve", "--port", "not-a-port"]).is_err());
    }
}
