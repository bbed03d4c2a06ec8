//! Data models shared across the pipeline.
//!
//! - [`PageMetadata`]: title and raw date string found in a page's markup
//! - [`Article`]: a resolved article, ready to be written once
//! - [`Outcome`] and [`SiteReport`]: per-candidate results and per-site tallies

use crate::classify::Classification;
use chrono::NaiveDate;

/// Metadata pulled from a rendered page. Values are raw, unnormalized strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub date: Option<String>,
}

/// A fully resolved article. Rendering and placement live in
/// [`crate::outputs::article`].
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    /// The URL the article was fetched from.
    pub url: String,
    /// Extracted Markdown body.
    pub body: String,
    pub date: Option<NaiveDate>,
    pub classification: Classification,
    /// Short site identifier, e.g. `openai`.
    pub site: String,
    /// Filesystem-safe title fragment.
    pub slug: String,
}

/// Why a candidate was deliberately not written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Nothing extracted, or fewer characters than the configured minimum.
    TooShort(usize),
    /// Published before the configured minimum year.
    TooOld(i32),
    /// The slugified title looks like a listing page.
    NoiseTitle(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::TooShort(len) => write!(f, "too short ({len} chars)"),
            SkipReason::TooOld(year) => write!(f, "too old ({year})"),
            SkipReason::NoiseTitle(marker) => write!(f, "title looks like a listing ({marker})"),
        }
    }
}

/// Result of processing one candidate link.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Saved(std::path::PathBuf),
    Skipped(SkipReason),
}

/// Per-site tallies, logged when the site is done.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteReport {
    pub candidates: usize,
    pub saved: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl SiteReport {
    pub fn absorb(&mut self, other: &SiteReport) {
        self.candidates += other.candidates;
        self.saved += other.saved;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}
