//! CLI argument parsing using clap.

use clap::Parser;
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sz")]
#[command(author, version, long_about = None)]
#[command(
    about = "Compress files and directories into Snappy streams, and restore them",
    after_help = "Compressed inputs are decompressed (and extracted if they hold a tar \
                  archive), directories are archived and compressed, and any other file \
                  is compressed. Existing files are never overwritten."
)]
pub struct Cli {
    /// Files or directories to process, in order
    #[arg(value_name = "PATH", required_unless_present = "completions")]
    pub paths: Vec<PathBuf>,

    /// Suppress all output
    #[arg(short, long)]
    pub quiet: bool,

    /// Print one JSON object per input
    #[arg(short, long, conflicts_with = "quiet")]
    pub json: bool,

    /// Print shell completions for SHELL and exit
    #[arg(long, value_name = "SHELL", exclusive = true)]
    pub completions: Option<Shell>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_paths_and_flags() {
        let cli = Cli::try_parse_from(["sz", "-q", "a.txt", "dir"]).unwrap();
        assert!(cli.quiet);
        assert!(!cli.json);
        assert_eq!(cli.paths, vec![PathBuf::from("a.txt"), PathBuf::from("dir")]);
    }

    #[test]
    fn test_paths_required() {
        assert!(Cli::try_parse_from(["sz"]).is_err());
        assert!(Cli::try_parse_from(["sz", "--json"]).is_err());
    }

    #[test]
    fn test_json_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["sz", "-q", "-j", "a"]).is_err());
    }

    #[test]
    fn test_completions_without_paths() {
        let cli = Cli::try_parse_from(["sz", "--completions", "bash"]).unwrap();
        assert_eq!(cli.completions, Some(Shell::Bash));
        assert!(cli.paths.is_empty());
    }
}
