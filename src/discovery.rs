//! Link discovery: pull anchors out of a rendered seed page and keep the ones
//! that plausibly point at articles.
//!
//! A link survives when it is HTTP(S), matches no skip pattern, is not a bare
//! year archive (`/blog/2023`), is not the seed page itself, has not been
//! processed before, and either lives under the seed URL or contains one of
//! the configured article path keywords (`/blog/`, `/research/`, ...).

use crate::config::Config;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;
use url::Url;

static YEAR_ARCHIVE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d{4}/?$").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Why a discovered link was not kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rejection {
    NotHttp,
    SkipPattern,
    YearArchive,
    SelfLink,
    AlreadyProcessed,
    OffSite,
}

/// Collect every anchor target on the page as an absolute URL.
///
/// Relative hrefs are resolved against `page_url`; hrefs that cannot be
/// resolved are dropped. Document order is preserved.
pub fn extract_links(html: &str, page_url: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let base = Url::parse(page_url).ok();

    document
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| match &base {
            Some(base) => base.join(href.trim()).ok().map(|u| u.to_string()),
            None => Url::parse(href.trim()).ok().map(|u| u.to_string()),
        })
        .collect()
}

/// Decide whether a single link is worth a visit.
///
/// Checks run in order and the first failure is reported: scheme, skip
/// patterns, year archive (`.../2023` or `.../2023/`), self link (trailing
/// slash ignored), already processed, then the same-site or include-keyword
/// gate.
pub fn check_link(
    config: &Config,
    link: &str,
    base_url: &str,
    processed: &HashSet<String>,
) -> Result<(), Rejection> {
    let lower = link.to_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        return Err(Rejection::NotHttp);
    }
    if config
        .skip_patterns
        .iter()
        .any(|p| lower.contains(&p.to_lowercase()))
    {
        return Err(Rejection::SkipPattern);
    }
    if YEAR_ARCHIVE.is_match(link) {
        return Err(Rejection::YearArchive);
    }
    if link.trim_end_matches('/') == base_url.trim_end_matches('/') {
        return Err(Rejection::SelfLink);
    }
    if processed.contains(link) {
        return Err(Rejection::AlreadyProcessed);
    }
    let same_site = link.contains(base_url);
    let looks_like_article = config.include_keywords.iter().any(|k| link.contains(k.as_str()));
    if !(same_site || looks_like_article) {
        return Err(Rejection::OffSite);
    }
    Ok(())
}

/// Reduce raw page links to the unique, ordered set of candidates to visit.
///
/// # Arguments
///
/// * `config` - Supplies the skip patterns and include keywords
/// * `raw_links` - Absolute URLs harvested by [`extract_links`]
/// * `base_url` - The seed page the links were found on
/// * `processed` - URLs already in the ledger
///
/// # Returns
///
/// Links accepted by [`check_link`], first occurrence order, duplicates
/// collapsed. Rejection counts per reason are logged at debug level.
///
/// # Examples
///
/// ```ignore
/// let links = vec![
///     "https://example.com/blog/llm-update".to_string(),
///     "https://example.com/blog/2023".to_string(),
/// ];
/// let kept = filter_candidates(&config, &links, "https://example.com/blog", &HashSet::new());
/// assert_eq!(kept, vec!["https://example.com/blog/llm-update".to_string()]);
/// ```
pub fn filter_candidates(
    config: &Config,
    raw_links: &[String],
    base_url: &str,
    processed: &HashSet<String>,
) -> Vec<String> {
    let mut rejected: BTreeMap<Rejection, usize> = BTreeMap::new();

    let candidates: Vec<String> = raw_links
        .iter()
        .filter(|link| match check_link(config, link, base_url, processed) {
            Ok(()) => true,
            Err(reason) => {
                *rejected.entry(reason).or_default() += 1;
                false
            }
        })
        .unique()
        .cloned()
        .collect();

    debug!(
        %base_url,
        raw = raw_links.len(),
        kept = candidates.len(),
        ?rejected,
        "Filtered discovered links"
    );
    candidates
}
