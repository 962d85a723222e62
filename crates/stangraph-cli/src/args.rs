//! Command-line argument definitions for the stangraph CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control the input model, the variables to
//! squish, label and output options, configuration file selection, and
//! logging verbosity.

use clap::Parser;

use stangraph::config::OutputFormat;

/// Command-line arguments for the stangraph tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input Stan file
    #[arg(help = "Path to the input Stan model")]
    pub input: String,

    /// Variables to squish out of the graph, applied in order
    #[arg(short, long, num_args = 1.., value_name = "NAME")]
    pub squish: Vec<String>,

    /// Label file mapping variable names to display labels
    #[arg(short, long, value_name = "FILE")]
    pub labels: Option<String>,

    /// Show full right-hand side expressions in labels
    #[arg(short, long)]
    pub explicit: bool,

    /// Log per-block parse results (sets the log level to debug)
    #[arg(short, long)]
    pub verbose: bool,

    /// Output base name, without extension
    #[arg(short, long, default_value = "dependencies")]
    pub output: String,

    /// Output format (svg, dot, png); may be repeated
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Vec<OutputFormat>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["stangraph", "model.stan"]).unwrap();

        assert_eq!(args.input, "model.stan");
        assert!(args.squish.is_empty());
        assert!(!args.explicit);
        assert_eq!(args.output, "dependencies");
        assert!(args.format.is_empty());
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn test_squish_and_formats() {
        let args = Args::try_parse_from([
            "stangraph", "model.stan", "-s", "theta", "mu", "-f", "svg", "-f", "dot", "-e",
        ])
        .unwrap();

        assert_eq!(args.squish, vec!["theta", "mu"]);
        assert_eq!(args.format, vec![OutputFormat::Svg, OutputFormat::Dot]);
        assert!(args.explicit);
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(Args::try_parse_from(["stangraph", "model.stan", "-f", "pdf"]).is_err());
    }
}
