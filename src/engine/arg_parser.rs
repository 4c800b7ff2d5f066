use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::utils::config::PackagePaths;

/// Bridge a directory of files and a stream of record groups.
#[derive(Clone, Parser)]
#[command(name = "filebridge")]
#[command(about = "Publish files from a directory as record groups, or write received groups to files.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Config file. Default: `filebridge.toml` in the working directory, if present.
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Subcommand)]
pub enum Commands {
    /// Scan a directory and write one JSON line per record group to stdout.
    Pub(PubArgs),
    /// Read JSON lines from stdin and write each payload to a numbered file.
    Sub(SubArgs),
}

#[derive(Clone, Args)]
pub struct PubArgs {
    /// Directory to scan.
    #[arg(long, short = 'p')]
    pub path: Option<String>,

    /// Full-match regex for file names (not paths).
    #[arg(long, short = 'r')]
    pub pattern: Option<String>,

    /// Files per second. 0 or less: as fast as possible.
    #[arg(long)]
    pub rate: Option<f64>,

    /// Extra scan cycles. Negative: repeat until interrupted.
    #[arg(long, allow_negative_numbers = true, value_parser = clap::value_parser!(i64))]
    pub repeat: Option<i64>,

    /// Records per emitted group.
    #[arg(long, short = 'b', value_parser = clap::value_parser!(usize))]
    pub block_size: Option<usize>,

    /// Emit transactional groups.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub transactional: Option<bool>,

    /// Records use the upsert opcode instead of insert.
    #[arg(long, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub upsert: Option<bool>,

    /// Add a third `path` field carrying the source file path.
    #[arg(long)]
    pub with_path: bool,

    /// Carry file content as a string field instead of binary.
    #[arg(long)]
    pub text: bool,

    /// Pause between scan cycles, in milliseconds.
    #[arg(long, value_parser = clap::value_parser!(u64))]
    pub rescan_delay: Option<u64>,
}

#[derive(Clone, Args)]
pub struct SubArgs {
    /// Output template; `out/frame.jpg` writes `out/frame1.jpg`, `out/frame2.jpg`, ...
    #[arg(long, short = 'f')]
    pub filename: Option<String>,

    /// Schema field holding the payload. Default: `data`.
    #[arg(long)]
    pub field: Option<String>,
}

impl Cli {
    /// Explicit `--config`, else the package config file in the working directory.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(PackagePaths::get().config_filename()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pub_accepts_negative_repeat() {
        let cli = Cli::try_parse_from([
            "filebridge", "pub", "--path", "/in", "--pattern", ".*", "--repeat", "-1", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Commands::Pub(args) = &cli.command else {
            panic!("expected pub");
        };
        assert_eq!(args.repeat, Some(-1));
        assert_eq!(args.transactional, None);
    }

    #[test]
    fn sub_uses_default_config_file() {
        let cli = Cli::try_parse_from(["filebridge", "sub", "--filename", "out/f.bin"]).unwrap();
        let Commands::Sub(args) = &cli.command else {
            panic!("expected sub");
        };
        assert_eq!(args.field, None);
        assert_eq!(cli.config_path(), PathBuf::from("filebridge.toml"));
    }
}
