use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::graph::Granularity;

#[derive(Parser, Debug)]
#[command(name = "servicemap")]
#[command(about = "Service boundary recovery from call graphs", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect communities in a call graph
    Detect {
        /// JSON array of {"caller", "callee", "count"} observations
        input: PathBuf,

        /// Configuration file (defaults to .servicemap.toml in this or a parent directory)
        #[arg(short, long, env = "SERVICEMAP_CONFIG")]
        config: Option<PathBuf>,

        /// Vertex identity resolution, overriding the configuration
        #[arg(long, value_enum)]
        granularity: Option<GranularityArg>,

        /// Previous assignment (JSON object vertex -> community) to continue from
        #[arg(long)]
        prior: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also print the input call graph (text format only)
        #[arg(long = "show-graph")]
        show_graph: bool,

        /// Disable colored output
        #[arg(long)]
        plain: bool,

        /// Increase verbosity level (can be repeated: -v, -vv)
        /// -v: Log each aggregation round
        /// -vv: Log every vertex move
        #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
        verbosity: u8,
    },

    /// Print the default configuration as TOML
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GranularityArg {
    /// One vertex per method
    Method,
    /// One vertex per class
    Class,
}

impl From<GranularityArg> for Granularity {
    fn from(arg: GranularityArg) -> Self {
        match arg {
            GranularityArg::Method => Granularity::Method,
            GranularityArg::Class => Granularity::Class,
        }
    }
}

/// Log filter directive for a `-v` count.
pub fn log_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "servicemap=warn",
        1 => "servicemap=debug",
        _ => "servicemap=trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_detect_arguments_parse() {
        let cli = Cli::parse_from([
            "servicemap",
            "detect",
            "calls.json",
            "--granularity",
            "class",
            "--format",
            "json",
            "-vv",
        ]);
        match cli.command {
            Commands::Detect {
                input,
                granularity,
                format,
                verbosity,
                prior,
                ..
            } => {
                assert_eq!(input, PathBuf::from("calls.json"));
                assert_eq!(granularity.map(Granularity::from), Some(Granularity::Class));
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(verbosity, 2);
                assert!(prior.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_log_directive_escalates() {
        assert_eq!(log_directive(0), "servicemap=warn");
        assert_eq!(log_directive(5), "servicemap=trace");
    }
}
