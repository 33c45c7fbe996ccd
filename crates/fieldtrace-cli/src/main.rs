//! Fieldtrace CLI - command-line interface for the dependency tracker
//!
//! Tracks marker-designated bindings through JavaScript/TypeScript sources
//! and prints their field dependencies.

mod commands;
mod output;

use clap::Parser;
use commands::Commands;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "fieldtrace",
    author,
    version,
    about = "Cross-file data-flow dependency tracker for JavaScript and TypeScript",
    long_about = "Fieldtrace follows comment-marked bindings through member accesses,\n\
                  destructuring, calls, iteration callbacks, and JSX attributes, across\n\
                  files when imports resolve, and reports the fields each binding feeds."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Track(args) => args.run(),
        Commands::Init(args) => args.run(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_track_command() {
        let cli = Cli::try_parse_from(["fieldtrace", "track", "./src"]).unwrap();
        match cli.command {
            Commands::Track(args) => {
                assert_eq!(args.path.to_str().unwrap(), "./src");
            }
            _ => panic!("Expected Track command"),
        }
    }

    #[test]
    fn cli_parses_track_with_format() {
        let cli =
            Cli::try_parse_from(["fieldtrace", "track", "app.tsx", "--format", "json"]).unwrap();
        match cli.command {
            Commands::Track(args) => {
                assert_eq!(args.format, "json");
            }
            _ => panic!("Expected Track command"),
        }
    }

    #[test]
    fn cli_parses_track_with_base() {
        let cli =
            Cli::try_parse_from(["fieldtrace", "track", "app.tsx", "--base", "./web"]).unwrap();
        match cli.command {
            Commands::Track(args) => {
                assert_eq!(args.base.unwrap().to_str().unwrap(), "./web");
            }
            _ => panic!("Expected Track command"),
        }
    }

    #[test]
    fn cli_parses_init_command() {
        let cli = Cli::try_parse_from(["fieldtrace", "init"]).unwrap();
        assert!(matches!(cli.command, Commands::Init(_)));
    }

    #[test]
    fn cli_requires_a_path_for_track() {
        assert!(Cli::try_parse_from(["fieldtrace", "track"]).is_err());
    }

    #[test]
    fn cli_version_is_set() {
        let cmd = Cli::command();
        assert_eq!(cmd.get_version(), Some("0.1.0"));
    }

    #[test]
    fn cli_command_structure_is_valid() {
        Cli::command().debug_assert();
    }
}
