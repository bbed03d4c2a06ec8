//! Article rendering and placement.
//!
//! The file body starts with a fixed source block that downstream tools
//! (and [`super::scan`]) rely on:
//!
//! ```text
//! --- SOURCE INFO ---
//! URL: https://example.com/blog/llm-update
//! DATE: 2024-01-05
//! CATEGORY: Generative AI/LLMs
//! ---
//!
//! <markdown body>
//! ```

use super::scan::read_url_header;
use crate::models::Article;
use chrono::Datelike;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument, warn};

pub const SOURCE_INFO_HEADER: &str = "--- SOURCE INFO ---";
pub const URL_PREFIX: &str = "URL:";
pub const UNDATED: &str = "Undated";
pub const UNKNOWN_DATE: &str = "Unknown";

impl Article {
    /// `YYYY-MM-DD`, or `Undated` when no date was resolved.
    pub fn date_label(&self) -> String {
        self.date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| UNDATED.to_string())
    }

    /// Year directory name, or `Undated`.
    pub fn year_dir(&self) -> String {
        self.date
            .map(|d| d.year().to_string())
            .unwrap_or_else(|| UNDATED.to_string())
    }

    /// `{date|Undated}_{site}_{slug}.md`
    pub fn filename(&self) -> String {
        format!("{}_{}_{}.md", self.date_label(), self.site, self.slug)
    }

    /// `output_dir/category/subcategory/year/`
    pub fn directory(&self, output_dir: &Path) -> PathBuf {
        output_dir
            .join(&self.classification.category)
            .join(&self.classification.subcategory)
            .join(self.year_dir())
    }

    pub fn destination(&self, output_dir: &Path) -> PathBuf {
        self.directory(output_dir).join(self.filename())
    }

    /// Source header followed by the body.
    pub fn render(&self) -> String {
        let date = self
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| UNKNOWN_DATE.to_string());
        format!(
            "{SOURCE_INFO_HEADER}\n{URL_PREFIX} {}\nDATE: {}\nCATEGORY: {}\n---\n\n{}",
            self.url,
            date,
            self.classification.label(),
            self.body
        )
    }
}

/// URL recorded in the article already stored at `path`, when it differs
/// from `url`. Missing or headerless files never collide.
pub fn colliding_source(path: &Path, url: &str) -> Option<String> {
    match read_url_header(path) {
        Ok(Some(existing)) if existing != url => Some(existing),
        _ => None,
    }
}

/// Write `article` under `output_dir`, creating directories as needed.
///
/// # Arguments
///
/// * `article` - The resolved article; its date, classification, site and
///   slug decide the path.
/// * `output_dir` - Root of the output tree.
///
/// # Returns
///
/// The path of the written file. An existing file with the same name is
/// overwritten; when that file came from another URL a warning is logged.
///
/// # Examples
///
/// ```ignore
/// let path = write_article(&article, Path::new("NotebookLM_Sources")).await?;
/// // NotebookLM_Sources/Generative AI/LLMs/2024/2024-01-05_example_llm_update.md
/// ```
#[instrument(level = "debug", skip_all, fields(url = %article.url))]
pub async fn write_article(article: &Article, output_dir: &Path) -> Result<PathBuf, Box<dyn Error>> {
    let dir = article.directory(output_dir);
    if let Err(e) = fs::create_dir_all(&dir).await {
        error!(dir = %dir.display(), error = %e, "Failed to create article dir");
        return Err(e.into());
    }

    let path = article.destination(output_dir);
    if let Some(previous) = colliding_source(&path, &article.url) {
        warn!(
            path = %path.display(),
            %previous,
            "Overwriting an article saved from a different URL"
        );
    }
    fs::write(&path, article.render()).await?;
    info!(path = %path.display(), bytes = article.body.len(), "Wrote article");
    Ok(path)
}
