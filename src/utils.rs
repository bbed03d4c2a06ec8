//! Identity helpers and small filesystem utilities.
//!
//! - Site identifiers and title slugs used to build article filenames
//! - Seed list parsing
//! - Output directory validation
//! - String truncation for logging

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Slug used when an article has no usable title.
pub const UNTITLED_SLUG: &str = "sans_titre";

/// Site identifier used when the URL host cannot be determined.
pub const FALLBACK_SITE: &str = "web";

static NON_SLUG_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Well-known hosts mapped to friendlier names; checked in order.
const KNOWN_SITES: &[(&[&str], &str)] = &[
    (&["openai"], "openai"),
    (&["google"], "google_research"),
    (&["meta"], "meta_ai"),
    (&["anthropic"], "anthropic"),
    (&["nvidia"], "nvidia"),
    (&["amazon", "aws"], "aws"),
    (&["huggingface"], "huggingface"),
];

/// Derive a short, readable site identifier from a URL.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(site_name("https://www.anthropic.com/news/x"), "anthropic");
/// assert_eq!(site_name("https://blog.example.org/post"), "blog");
/// assert_eq!(site_name("not a url"), "web");
/// ```
pub fn site_name(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return FALLBACK_SITE.to_string();
    };
    let Some(host) = parsed.host_str() else {
        return FALLBACK_SITE.to_string();
    };
    let host = host.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    for (needles, name) in KNOWN_SITES {
        if needles.iter().any(|n| host.contains(n)) {
            return name.to_string();
        }
    }

    match host.split('.').next() {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => FALLBACK_SITE.to_string(),
    }
}

/// Convert a title into a lower-case, underscore-delimited filename fragment.
///
/// Each run of characters outside `[a-z0-9]` collapses to a single `_`, and
/// leading/trailing underscores are trimmed. A missing or empty title yields
/// [`UNTITLED_SLUG`].
pub fn slugify(text: Option<&str>) -> String {
    match text {
        None | Some("") => UNTITLED_SLUG.to_string(),
        Some(t) => NON_SLUG_RUN
            .replace_all(&t.to_lowercase(), "_")
            .trim_matches('_')
            .to_string(),
    }
}

/// The last path segment of a URL, percent-decoded; used as a title fallback.
pub fn title_from_url(url: &str) -> String {
    let last = url.rsplit('/').next().unwrap_or_default();
    urlencoding::decode(last)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| last.to_string())
}

/// Parse a seed list: one URL per line, `#` comments and blank lines ignored.
pub fn parse_seed_list(raw: &str) -> Vec<String> {
    raw.lines()
        .filter(|l| !l.starts_with('#'))
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a char boundary) with an
/// ellipsis and byte count appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
