use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Conflib Developers",
    version,
    about = "conflib CLI - model-guided search over molecular configurations driven by an external scoring command.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a random-search loop over raw coordinate samples.
    Run(RunArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the search description in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Override the number of search steps from the config file.
    #[arg(short = 'n', long, value_name = "INT")]
    pub steps: Option<u64>,

    /// Override the path the search history CSV is written to.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Override the random seed of the search model.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_arguments_parse_with_global_flags() {
        let cli = Cli::try_parse_from([
            "conflib", "-vv", "run", "--config", "search.toml", "--steps", "5", "-o", "out.csv",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        let Commands::Run(args) = cli.command;
        assert_eq!(args.config, PathBuf::from("search.toml"));
        assert_eq!(args.steps, Some(5));
        assert_eq!(args.output, Some(PathBuf::from("out.csv")));
        assert_eq!(args.seed, None);
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["conflib", "-q", "-v", "run", "-c", "search.toml"]);
        assert!(result.is_err());
    }

    #[test]
    fn config_is_required() {
        assert!(Cli::try_parse_from(["conflib", "run"]).is_err());
    }
}
