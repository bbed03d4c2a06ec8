//! # Notebook Ingest
//!
//! Crawls AI research and industry blogs and turns their articles into
//! clean, dated, categorized Markdown files ready to be uploaded as
//! NotebookLM sources.
//!
//! ## Features
//!
//! - Discovers article links from a seed list of blog front pages
//! - Filters out off-site, archive, social and already-processed links
//! - Extracts readable Markdown and resolves each article's title and date
//! - Files articles under `Category/Subcategory/Year/` by keyword scoring
//! - Remembers processed URLs in an append-only ledger so reruns skip them
//! - Audits the output tree for index pages and other noise
//!
//! ## Usage
//!
//! ```sh
//! notebook_ingest crawl
//! notebook_ingest grab https://openai.com/index/some-post/
//! notebook_ingest clean-noise
//! ```
//!
//! ## Architecture
//!
//! 1. **Discovery**: load each seed page, harvest and filter links
//! 2. **Extraction**: fetch each candidate and convert it to Markdown
//! 3. **Resolution**: date, classification and filename
//! 4. **Output**: write the file and record the URL in the ledger

use clap::Parser;
use std::error::Error;
use std::fs::OpenOptions;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, error, info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod classify;
mod cli;
mod config;
mod dates;
mod discovery;
mod ledger;
mod models;
mod noise;
mod outputs;
mod pipeline;
mod scrapers;
mod utils;

use cli::{Cli, Command};
use dates::ChronoDateParser;
use noise::StdinConfirm;
use scrapers::extract::ReadableExtractor;
use scrapers::http::HttpFetcher;

/// Log to stderr and append a plain-text copy to `log_file`.
fn init_tracing(log_file: &Path) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = tfmt::layer()
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(UtcTime::rfc_3339())
        .with_writer(io::stderr);

    let (file_layer, file_error) = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
    {
        Ok(file) => (
            Some(
                tfmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_timer(UtcTime::rfc_3339())
                    .with_writer(Mutex::new(file)),
            ),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    if let Some(e) = file_error {
        warn!(path = %log_file.display(), error = %e, "Could not open log file; logging to stderr only");
    }
}

fn prompt_for_url() -> io::Result<String> {
    print!("URL to ingest: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();
    let config = args.build_config()?;
    init_tracing(&config.log_file);

    let start_time = std::time::Instant::now();
    info!("notebook_ingest starting up");
    debug!(
        output_dir = %config.output_dir.display(),
        seed_file = %config.seed_file.display(),
        ledger_file = %config.ledger_file.display(),
        "Resolved configuration"
    );

    match args.command {
        Command::Crawl => {
            let fetcher = HttpFetcher::new()?;
            pipeline::crawl(&config, fetcher, ReadableExtractor, ChronoDateParser).await?;
        }
        Command::Grab { url } => {
            let url = match url {
                Some(url) => url.trim().to_string(),
                None => prompt_for_url()?,
            };
            if url.is_empty() {
                info!("No URL given; nothing to do");
                return Ok(());
            }
            let fetcher = HttpFetcher::new()?;
            match pipeline::grab_one(&config, &url, fetcher, ReadableExtractor, ChronoDateParser)
                .await
            {
                Ok(Some(path)) => info!(path = %path.display(), "Saved"),
                Ok(None) => warn!(%url, "Nothing saved"),
                Err(e) => error!(%url, error = %e, "Grab failed"),
            }
        }
        Command::CleanNoise => {
            if let Err(e) = noise::clean_noise(&config, &mut StdinConfirm) {
                error!(error = %e, "Noise audit aborted");
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}
