//! Command-line surface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use spritefetch_core::Config;

#[derive(Debug, Parser)]
#[command(name = "spritefetch", version, about = "Fetch numbered images concurrently, then run them through a filter chain")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Configuration file (TOML). Defaults apply when omitted.
    #[arg(long, global = true, env = "SPRITEFETCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of items to fetch (identifiers 1..=count).
    #[arg(long, global = true)]
    pub count: Option<u32>,

    /// Maximum concurrent requests.
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// Directory receiving fetched images.
    #[arg(long, global = true)]
    pub fetch_dir: Option<PathBuf>,

    /// Directory receiving processed images.
    #[arg(long, global = true)]
    pub process_dir: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Base address images are fetched from.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Write the run summary as JSON to this file.
    #[arg(long, global = true)]
    pub summary_json: Option<PathBuf>,

    /// Only print the final summary.
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Fetch, then transform (default).
    Run,
    /// Fetch only.
    Fetch,
    /// Transform what is already in the fetch directory.
    Transform,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Run)
    }

    /// Applies command-line overrides on top of file and environment values.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(count) = self.count {
            config.fetch.count = count;
        }
        if let Some(concurrency) = self.concurrency {
            config.fetch.concurrency = concurrency;
        }
        if let Some(ref dir) = self.fetch_dir {
            config.fetch.output_dir = dir.clone();
        }
        if let Some(ref dir) = self.process_dir {
            config.transform.output_dir = dir.clone();
        }
        if let Some(timeout) = self.timeout_secs {
            config.fetch.timeout_secs = timeout;
        }
        if let Some(ref base_url) = self.base_url {
            config.fetch.base_url = base_url.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_run() {
        let cli = Cli::try_parse_from(["spritefetch"]).unwrap();
        assert_eq!(cli.command(), Command::Run);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "spritefetch",
            "fetch",
            "--count",
            "5",
            "--concurrency",
            "2",
            "--timeout-secs",
            "3",
            "--fetch-dir",
            "/tmp/raw",
        ])
        .unwrap();
        assert_eq!(cli.command(), Command::Fetch);

        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.fetch.count, 5);
        assert_eq!(config.fetch.concurrency, 2);
        assert_eq!(config.fetch.timeout_secs, 3);
        assert_eq!(config.fetch.output_dir, PathBuf::from("/tmp/raw"));
        assert_eq!(config.transform.output_dir, PathBuf::from("pokemon_processed"));
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let cli = Cli::try_parse_from(["spritefetch", "transform", "--quiet"]).unwrap();
        let mut config = Config::default();
        config.fetch.count = 42;
        cli.apply_overrides(&mut config);
        assert_eq!(config.fetch.count, 42);
        assert!(cli.quiet);
    }

    #[test]
    fn test_invalid_count_rejected_by_parser() {
        assert!(Cli::try_parse_from(["spritefetch", "--count", "many"]).is_err());
    }
}
