//! wamopacker cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    /// Relative lookup files resolve against the final directory.
    ///
    /// This is equivalent to running { cd <directory>; wamopacker ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Evaluate an expression against the configuration
    ///
    /// Example: wamopacker eval '(( vm_name ))-(( virtualbox_cpus ))'
    #[command(alias = "eval")]
    Evaluate(EvaluateCommand),

    /// Print the resolved value of a single key
    Get(GetCommand),

    /// Print all keys with their resolved values
    Dump(DumpCommand),
}

#[derive(Parser, Debug)]
pub struct EvaluateCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    /// Expression to evaluate
    pub expression: String,
}

#[derive(Parser, Debug)]
pub struct GetCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,

    /// Key to resolve
    pub key: String,
}

#[derive(Parser, Debug)]
pub struct DumpCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    /// Load a yaml configuration file
    #[clap(short = 'c', long = "config", conflicts_with("config_string"))]
    pub config_file: Option<PathBuf>,

    /// Use an inline yaml configuration document
    #[clap(long = "config-string")]
    pub config_string: Option<String>,

    /// Override a value, NAME=VALUE
    ///
    /// Can be specified multiple times. Overrides take precedence
    /// over the configuration document and WAMOPACKER_* variables.
    #[clap(short = 'o', long = "override")]
    pub overrides: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    Json,
    #[default]
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn repeated_overrides() {
        let cli = Cli::parse_from([
            "wamopacker",
            "get",
            "-o",
            "a=1",
            "--override",
            "b=2",
            "-F",
            "json",
            "a",
        ]);

        let Command::Get(get) = cli.command else {
            panic!("expected get command");
        };
        assert_eq!(get.input.overrides, vec!["a=1", "b=2"]);
        assert_eq!(get.key, "a");
        assert!(matches!(get.output.format, OutputFormat::Json));
    }

    #[test]
    fn config_file_conflicts_with_string() {
        let result = Cli::try_parse_from([
            "wamopacker",
            "dump",
            "-c",
            "build.yml",
            "--config-string",
            "a: 1",
        ]);
        assert!(result.is_err());
    }
}
