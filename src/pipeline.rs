//! Ingestion pipeline: seed page → candidate links → validated, classified,
//! dated article files.
//!
//! Sites are crawled strictly one after another, and candidates within a site
//! one at a time with a random pause between them. For each candidate:
//!
//! 1. Load the page and extract a Markdown body and metadata
//! 2. Skip it if the body is shorter than the minimum length
//! 3. Resolve the date (metadata, then `/YYYY/` in the URL); skip it if older
//!    than the minimum year
//! 4. Classify, slugify the title; skip it if the slug looks like a listing
//! 5. Write the file and record the URL
//!
//! Skips are recorded in the ledger so they are never fetched again. Errors
//! on a single candidate are logged and the next candidate is tried; errors on
//! a seed page abandon that site only.

use crate::classify::classify;
use crate::config::Config;
use crate::dates::{resolve_date, DateParser};
use crate::discovery::{extract_links, filter_candidates};
use crate::ledger::Ledger;
use crate::models::{Article, Outcome, PageMetadata, SiteReport, SkipReason};
use crate::outputs::article::write_article;
use crate::scrapers::{load_more, ContentExtractor, FetchError, PageFetcher};
use crate::utils::{parse_seed_list, site_name, slugify, title_from_url, truncate_for_log};
use chrono::Datelike;
use rand::{rng, Rng};
use std::error::Error;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, instrument, warn};

/// Drives one page fetcher through the seed list.
pub struct Ingestor<'a, F, E, D> {
    config: &'a Config,
    fetcher: F,
    extractor: E,
    dates: D,
    ledger: Ledger,
}

impl<'a, F, E, D> Ingestor<'a, F, E, D>
where
    F: PageFetcher,
    E: ContentExtractor,
    D: DateParser,
{
    pub fn new(config: &'a Config, fetcher: F, extractor: E, dates: D, ledger: Ledger) -> Self {
        Self {
            config,
            fetcher,
            extractor,
            dates,
            ledger,
        }
    }

    /// Navigate to `url`, bounded by `limit` whatever the fetcher does.
    async fn goto_bounded(&mut self, url: &str, limit: Duration) -> Result<(), Box<dyn Error>> {
        match timeout(limit, self.fetcher.goto(url, limit)).await {
            Ok(result) => result,
            Err(_) => Err(Box::new(FetchError::Timeout {
                url: url.to_string(),
                after: limit,
            })),
        }
    }

    /// Crawl every seed in order, cooling down between sites.
    #[instrument(level = "info", skip_all, fields(sites = seeds.len()))]
    pub async fn run(&mut self, seeds: &[String]) -> SiteReport {
        let mut total = SiteReport::default();

        for base_url in seeds {
            match self.process_site(base_url).await {
                Ok(report) => {
                    info!(
                        site = %base_url,
                        candidates = report.candidates,
                        saved = report.saved,
                        skipped = report.skipped,
                        failed = report.failed,
                        "Finished site"
                    );
                    total.absorb(&report);
                }
                Err(e) => error!(site = %base_url, error = %e, "Error crawling site"),
            }
            info!("Cooling down between sites");
            sleep(self.config.timing.site_cooldown).await;
        }
        total
    }

    /// Discover candidates on one seed page and ingest them up to the page budget.
    #[instrument(level = "info", skip_all, fields(site = %base_url))]
    pub async fn process_site(&mut self, base_url: &str) -> Result<SiteReport, Box<dyn Error>> {
        info!("Connecting");
        let timing = self.config.timing.clone();

        self.goto_bounded(base_url, timing.base_timeout).await?;
        sleep(timing.settle).await;
        load_more(&mut self.fetcher, timing.max_scroll_rounds, timing.scroll_wait).await?;
        let html = self.fetcher.content().await?;

        let links = extract_links(&html, base_url);
        let candidates = filter_candidates(self.config, &links, base_url, self.ledger.processed());
        info!(count = candidates.len(), "Found potential links");

        let mut report = SiteReport {
            candidates: candidates.len(),
            ..Default::default()
        };

        for link in &candidates {
            // Only written articles consume the budget.
            if report.saved >= self.config.max_pages_per_site {
                info!(budget = self.config.max_pages_per_site, "Page budget reached");
                break;
            }
            if self.ledger.contains(link) {
                continue;
            }

            self.jitter().await;

            match self.process_candidate(link).await {
                Ok(Outcome::Saved(path)) => {
                    debug!(url = %link, path = %path.display(), "Candidate saved");
                    report.saved += 1;
                }
                Ok(Outcome::Skipped(reason)) => {
                    debug!(url = %link, %reason, "Candidate skipped");
                    report.skipped += 1;
                }
                Err(e) => {
                    error!(url = %link, error = %e, "Failed to process");
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    async fn jitter(&self) {
        let timing = &self.config.timing;
        let min = timing.jitter_min.as_millis() as u64;
        let max = timing.jitter_max.as_millis() as u64;
        if max == 0 {
            return;
        }
        let ms = rng().random_range(min.min(max)..=max);
        sleep(Duration::from_millis(ms)).await;
    }

    /// Fetch, validate and write one candidate. Skips are recorded; errors are not.
    #[instrument(level = "debug", skip(self))]
    pub async fn process_candidate(&mut self, link: &str) -> Result<Outcome, Box<dyn Error>> {
        let config = self.config;
        self.goto_bounded(link, config.timing.candidate_timeout).await?;
        let html = self.fetcher.content().await?;
        let body = self.extractor.extract(&html);
        let metadata = self.extractor.extract_metadata(&html);

        let body = match body {
            Some(b) if b.chars().count() >= config.min_content_chars => b,
            other => {
                let len = other.map_or(0, |b| b.chars().count());
                debug!(url = %link, len, "Skipped (too short)");
                return Ok(self.skip(link, SkipReason::TooShort(len)));
            }
        };

        let article = self.build_article(link, body, &metadata);

        if let Some(date) = article.date {
            if date.year() < config.min_year {
                info!(url = %link, year = date.year(), "Skipped (too old)");
                return Ok(self.skip(link, SkipReason::TooOld(date.year())));
            }
        }

        if let Some(marker) = config
            .noise_title_markers
            .iter()
            .find(|m| article.slug.contains(m.as_str()))
        {
            info!(url = %link, title = %article.slug, "Skipped (title noise)");
            return Ok(self.skip(link, SkipReason::NoiseTitle(marker.clone())));
        }

        let path = write_article(&article, &config.output_dir).await?;
        info!(
            category = %article.classification.label(),
            file = %article.filename(),
            "Saved"
        );
        self.ledger.record(link);
        Ok(Outcome::Saved(path))
    }

    fn skip(&mut self, link: &str, reason: SkipReason) -> Outcome {
        self.ledger.record(link);
        Outcome::Skipped(reason)
    }

    /// Resolve date, classification and identity for an extracted page.
    fn build_article(&self, link: &str, body: String, metadata: &PageMetadata) -> Article {
        let date = resolve_date(&self.dates, metadata.date.as_deref(), link);
        let classification = classify(&self.config.taxonomy, &body);
        let title = match metadata.title.as_deref() {
            Some(t) if !t.trim().is_empty() => t.to_string(),
            _ => title_from_url(link),
        };

        Article {
            url: link.to_string(),
            date,
            classification,
            site: site_name(link),
            slug: slugify(Some(title.as_str())),
            body,
        }
    }

    /// Ingest a single page by hand: no length, age or title checks.
    ///
    /// Returns the written path, or `None` when no text could be extracted.
    #[instrument(level = "info", skip(self))]
    pub async fn grab(&mut self, url: &str) -> Result<Option<PathBuf>, Box<dyn Error>> {
        let timing = self.config.timing.clone();
        info!("Loading page");
        self.goto_bounded(url, timing.base_timeout).await?;
        sleep(timing.manual_settle).await;
        load_more(&mut self.fetcher, 1, timing.scroll_wait).await?;
        let html = self.fetcher.content().await?;

        let Some(body) = self.extractor.extract(&html).filter(|b| !b.trim().is_empty()) else {
            error!("Could not extract any readable text");
            return Ok(None);
        };
        let metadata = self.extractor.extract_metadata(&html);
        let article = self.build_article(url, body, &metadata);
        debug!(preview = %truncate_for_log(&article.body, 120), "Extracted");

        let path = write_article(&article, &self.config.output_dir).await?;
        if !self.ledger.contains(url) {
            self.ledger.record(url);
        }
        info!(path = %path.display(), category = %article.classification.label(), "File created");
        Ok(Some(path))
    }
}

/// Read the seed list; `None` (after logging) when it cannot be read.
async fn read_seeds(config: &Config) -> Option<Vec<String>> {
    match tokio::fs::read_to_string(&config.seed_file).await {
        Ok(raw) => Some(parse_seed_list(&raw)),
        Err(e) => {
            error!(path = %config.seed_file.display(), error = %e, "Seed file not found");
            None
        }
    }
}

/// Full crawl over the configured seed list.
#[instrument(level = "info", skip_all)]
pub async fn crawl<F, E, D>(
    config: &Config,
    fetcher: F,
    extractor: E,
    dates: D,
) -> Result<SiteReport, Box<dyn Error>>
where
    F: PageFetcher,
    E: ContentExtractor,
    D: DateParser,
{
    let t0 = Instant::now();
    crate::utils::ensure_writable_dir(&config.output_dir).await?;
    let ledger = Ledger::open(&config.ledger_file, &config.output_dir)?;

    let Some(seeds) = read_seeds(config).await else {
        return Ok(SiteReport::default());
    };
    if seeds.is_empty() {
        warn!(path = %config.seed_file.display(), "Seed file lists no URLs");
    }

    info!(sites = seeds.len(), known_urls = ledger.len(), "Starting crawl");
    let mut ingestor = Ingestor::new(config, fetcher, extractor, dates, ledger);
    let report = ingestor.run(&seeds).await;

    let elapsed = t0.elapsed();
    info!(
        sites = seeds.len(),
        saved = report.saved,
        skipped = report.skipped,
        failed = report.failed,
        secs = elapsed.as_secs(),
        "Crawl complete"
    );
    Ok(report)
}

/// Manual ingestion of one URL.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn grab_one<F, E, D>(
    config: &Config,
    url: &str,
    fetcher: F,
    extractor: E,
    dates: D,
) -> Result<Option<PathBuf>, Box<dyn Error>>
where
    F: PageFetcher,
    E: ContentExtractor,
    D: DateParser,
{
    let ledger = Ledger::open(&config.ledger_file, &config.output_dir)?;
    let mut ingestor = Ingestor::new(config, fetcher, extractor, dates, ledger);
    ingestor.grab(url).await
}
