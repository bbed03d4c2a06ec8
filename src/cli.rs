//! Command-line interface definitions.
//!
//! Paths can be given as flags or environment variables and override the
//! values from the optional YAML config file.

use crate::config::Config;
use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;

/// Crawl AI research blogs into dated, categorized Markdown sources.
///
/// # Examples
///
/// ```sh
/// # Crawl every site listed in urls.txt
/// notebook_ingest crawl
///
/// # Ingest one page by hand
/// notebook_ingest grab https://www.anthropic.com/news/some-post
///
/// # Review and delete noisy files
/// notebook_ingest --output-dir ./NotebookLM_Sources clean-noise
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, global = true, env = "NOTEBOOK_INGEST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root directory for saved articles
    #[arg(long, global = true, env = "NOTEBOOK_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Seed list: one site URL per line
    #[arg(long, global = true)]
    pub seed_file: Option<PathBuf>,

    /// Append-only log of processed URLs
    #[arg(long, global = true)]
    pub ledger_file: Option<PathBuf>,

    /// File that receives a copy of the log output
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Crawl every site in the seed list
    Crawl,
    /// Ingest a single URL (prompts for it when omitted)
    Grab {
        /// Page to ingest
        url: Option<String>,
    },
    /// Find and delete index, pagination and social-media files
    CleanNoise,
}

impl Cli {
    /// Defaults, then the YAML file, then command-line overrides.
    pub fn build_config(&self) -> Result<Config, Box<dyn Error>> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(p) = &self.output_dir {
            config.output_dir = p.clone();
        }
        if let Some(p) = &self.seed_file {
            config.seed_file = p.clone();
        }
        if let Some(p) = &self.ledger_file {
            config.ledger_file = p.clone();
        }
        if let Some(p) = &self.log_file {
            config.log_file = p.clone();
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawl_takes_no_arguments() {
        let cli = Cli::parse_from(["notebook_ingest", "crawl"]);
        assert_eq!(cli.command, Command::Crawl);
        assert!(Cli::try_parse_from(["notebook_ingest", "crawl", "extra"]).is_err());
    }

    #[test]
    fn test_grab_optional_url() {
        let cli = Cli::parse_from(["notebook_ingest", "grab", "https://x.com/a"]);
        assert_eq!(
            cli.command,
            Command::Grab {
                url: Some("https://x.com/a".to_string())
            }
        );
        let cli = Cli::parse_from(["notebook_ingest", "grab"]);
        assert_eq!(cli.command, Command::Grab { url: None });
    }

    #[test]
    fn test_clean_noise_subcommand() {
        let cli = Cli::parse_from(["notebook_ingest", "clean-noise"]);
        assert_eq!(cli.command, Command::CleanNoise);
    }

    #[test]
    fn test_path_overrides() {
        let cli = Cli::parse_from([
            "notebook_ingest",
            "crawl",
            "--output-dir",
            "/tmp/out",
            "--seed-file",
            "/tmp/seeds.txt",
            "--ledger-file",
            "/tmp/done.log",
        ]);
        let config = cli.build_config().unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.seed_file, PathBuf::from("/tmp/seeds.txt"));
        assert_eq!(config.ledger_file, PathBuf::from("/tmp/done.log"));
        assert_eq!(config.log_file, PathBuf::from("crawler.log"));
    }

    #[test]
    fn test_config_file_then_flags() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "min_year: 2025\noutput_dir: /from/yaml\n").unwrap();
        let cli = Cli::parse_from([
            "notebook_ingest",
            "-c",
            path.to_str().unwrap(),
            "--output-dir",
            "/from/flag",
            "clean-noise",
        ]);
        let config = cli.build_config().unwrap();
        assert_eq!(config.min_year, 2025);
        assert_eq!(config.output_dir, PathBuf::from("/from/flag"));
    }
}
