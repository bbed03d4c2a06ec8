//! Noise auditor: find saved files that are really index pages, pagination or
//! social artifacts, and delete them after confirmation.
//!
//! A file is flagged when its name contains a configured noise keyword, or
//! when its `URL:` header points at a label/tag/category/page listing or a
//! share link. Fewer than [`ONE_BY_ONE_LIMIT`] hits are confirmed one at a
//! time; larger sets are confirmed in batches of [`BATCH_SIZE`], and a batch
//! answer applies to every file in it.

use crate::config::Config;
use crate::outputs::scan::{markdown_files, read_url_header};
use std::error::Error;
use std::fmt;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument, warn};

pub const ONE_BY_ONE_LIMIT: usize = 30;
pub const BATCH_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoiseReason {
    /// The filename contains this noise keyword.
    Filename(String),
    /// The `URL:` header points at an index or pagination page.
    IndexUrl,
}

impl fmt::Display for NoiseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoiseReason::Filename(keyword) => write!(f, "suspicious name ({keyword})"),
            NoiseReason::IndexUrl => write!(f, "index/pagination URL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoiseHit {
    pub path: PathBuf,
    pub reason: NoiseReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    pub scanned: usize,
    pub flagged: usize,
    pub deleted: usize,
}

/// Yes/no decisions for the auditor.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Reads answers from stdin; `y` (any case) means yes.
#[derive(Debug, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        print!("{prompt}");
        let _ = io::stdout().flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        answer.trim().eq_ignore_ascii_case("y")
    }
}

/// Decide whether a saved file is noise.
pub fn is_noise(config: &Config, path: &Path) -> Option<NoiseReason> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if let Some(keyword) = config
        .noise_keywords
        .iter()
        .find(|k| filename.contains(k.as_str()))
    {
        return Some(NoiseReason::Filename(keyword.clone()));
    }

    match read_url_header(path) {
        Ok(Some(url)) => {
            let url = url.to_lowercase();
            if config
                .noise_url_markers
                .iter()
                .any(|m| url.contains(m.as_str()))
            {
                return Some(NoiseReason::IndexUrl);
            }
        }
        Ok(None) => {}
        Err(e) => warn!(file = %path.display(), error = %e, "Could not read header"),
    }
    None
}

/// Scan the output tree. Returns the number of files examined and the hits.
pub fn scan(config: &Config, root: &Path) -> (usize, Vec<NoiseHit>) {
    let files = markdown_files(root);
    let hits = files
        .iter()
        .filter_map(|path| {
            is_noise(config, path).map(|reason| NoiseHit {
                path: path.clone(),
                reason,
            })
        })
        .collect();
    (files.len(), hits)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn delete(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) => {
            error!(file = %path.display(), error = %e, "Failed to delete");
            false
        }
    }
}

/// Ask for confirmation and delete accordingly. Returns the number deleted.
pub fn review<C: Confirm>(hits: &[NoiseHit], confirm: &mut C) -> usize {
    let mut deleted = 0;

    if hits.len() < ONE_BY_ONE_LIMIT {
        info!("Reviewing one by one (< {ONE_BY_ONE_LIMIT} files)");
        for hit in hits {
            println!("\n{}\n   reason: {}", file_label(&hit.path), hit.reason);
            if confirm.confirm("   Delete? (y/n): ") {
                if delete(&hit.path) {
                    println!("   deleted.");
                    deleted += 1;
                }
            } else {
                println!("   kept.");
            }
        }
        return deleted;
    }

    info!("Reviewing in batches of {BATCH_SIZE} (>= {ONE_BY_ONE_LIMIT} files)");
    for (i, batch) in hits.chunks(BATCH_SIZE).enumerate() {
        let start = i * BATCH_SIZE;
        println!(
            "\n--- Batch {} to {} of {} ---",
            start + 1,
            start + batch.len(),
            hits.len()
        );
        for hit in batch {
            println!("  • {} ({})", file_label(&hit.path), hit.reason);
        }
        if confirm.confirm("Delete this batch? (y/n): ") {
            deleted += batch.iter().filter(|hit| delete(&hit.path)).count();
            println!("   batch deleted.");
        } else {
            println!("   batch kept.");
        }
    }
    deleted
}

/// Interactive cleanup of the configured output directory.
///
/// # Arguments
///
/// * `config` - Supplies the output directory and the noise markers
/// * `confirm` - Source of yes/no answers ([`StdinConfirm`] on the CLI)
///
/// # Returns
///
/// Counts of scanned, flagged and deleted files.
///
/// # Errors
///
/// Fails when the output directory does not exist.
#[instrument(level = "info", skip_all, fields(output = %config.output_dir.display()))]
pub fn clean_noise<C: Confirm>(config: &Config, confirm: &mut C) -> Result<AuditReport, Box<dyn Error>> {
    if !config.output_dir.is_dir() {
        error!("Output directory not found");
        return Err(format!("output directory not found: {}", config.output_dir.display()).into());
    }

    info!("Scanning for noise");
    let (scanned, hits) = scan(config, &config.output_dir);
    info!(scanned, flagged = hits.len(), "Scan complete");

    let mut report = AuditReport {
        scanned,
        flagged: hits.len(),
        deleted: 0,
    };
    if hits.is_empty() {
        info!("Nothing to clean");
        return Ok(report);
    }

    report.deleted = review(&hits, confirm);
    info!(
        scanned = report.scanned,
        flagged = report.flagged,
        deleted = report.deleted,
        "Cleanup finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays scripted answers and counts prompts.
    struct Scripted {
        answers: VecDeque<bool>,
        asked: usize,
    }

    impl Scripted {
        fn new(answers: &[bool]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                asked: 0,
            }
        }
    }

    impl Confirm for Scripted {
        fn confirm(&mut self, _prompt: &str) -> bool {
            self.asked += 1;
            self.answers.pop_front().unwrap_or(false)
        }
    }

    fn article(dir: &Path, name: &str, url: &str) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        fs::write(
            &path,
            format!("--- SOURCE INFO ---\nURL: {url}\nDATE: Unknown\nCATEGORY: A/B\n---\n\nbody"),
        )
        .unwrap();
        path
    }

    #[test]
    fn test_is_noise_by_filename() {
        let tmp = tempfile::tempdir().unwrap();
        let path = article(tmp.path(), "Undated_x_Latest_News.md", "https://x.com/a");
        assert_eq!(
            is_noise(&Config::default(), &path),
            Some(NoiseReason::Filename("latest_news".to_string()))
        );
    }

    #[test]
    fn test_is_noise_by_url_header() {
        let tmp = tempfile::tempdir().unwrap();
        let path = article(tmp.path(), "2024-01-01_x_post.md", "https://x.com/blog/Tag/ai");
        assert_eq!(is_noise(&Config::default(), &path), Some(NoiseReason::IndexUrl));
        let share = article(tmp.path(), "2024-01-01_x_other.md", "https://x.com/p?share=1");
        assert_eq!(is_noise(&Config::default(), &share), Some(NoiseReason::IndexUrl));
    }

    #[test]
    fn test_clean_file_is_not_noise() {
        let tmp = tempfile::tempdir().unwrap();
        let path = article(tmp.path(), "2024-01-01_x_gpt_update.md", "https://x.com/blog/gpt");
        assert_eq!(is_noise(&Config::default(), &path), None);
    }

    #[test]
    fn test_one_by_one_review() {
        let tmp = tempfile::tempdir().unwrap();
        let a = article(tmp.path(), "tag_a.md", "https://x.com/a");
        let b = article(tmp.path(), "tag_b.md", "https://x.com/b");
        let (scanned, mut hits) = scan(&Config::default(), tmp.path());
        hits.sort_by(|x, y| x.path.cmp(&y.path));
        assert_eq!(scanned, 2);

        let mut confirm = Scripted::new(&[true, false]);
        let deleted = review(&hits, &mut confirm);
        assert_eq!(deleted, 1);
        assert_eq!(confirm.asked, 2);
        assert!(!a.exists());
        assert!(b.exists());
    }

    #[test]
    fn test_batch_review_applies_to_whole_batch() {
        let tmp = tempfile::tempdir().unwrap();
        for i in 0..ONE_BY_ONE_LIMIT {
            article(tmp.path(), &format!("page_{i:02}.md"), "https://x.com/a");
        }
        let (_, mut hits) = scan(&Config::default(), tmp.path());
        hits.sort_by(|x, y| x.path.cmp(&y.path));
        assert_eq!(hits.len(), 30);

        // Six batches: delete the first, keep the rest.
        let mut confirm = Scripted::new(&[true]);
        let deleted = review(&hits, &mut confirm);
        assert_eq!(deleted, BATCH_SIZE);
        assert_eq!(confirm.asked, 6);
        for hit in &hits[..BATCH_SIZE] {
            assert!(!hit.path.exists());
        }
        for hit in &hits[BATCH_SIZE..] {
            assert!(hit.path.exists());
        }
    }

    #[test]
    fn test_clean_noise_missing_dir() {
        let config = Config {
            output_dir: PathBuf::from("/definitely/not/here"),
            ..Config::default()
        };
        assert!(clean_noise(&config, &mut Scripted::new(&[])).is_err());
    }

    #[test]
    fn test_clean_noise_report() {
        let tmp = tempfile::tempdir().unwrap();
        article(&tmp.path().join("A/B/2024"), "2024-01-01_x_login.md", "https://x.com/a");
        article(&tmp.path().join("A/B/2024"), "2024-01-01_x_fine.md", "https://x.com/b");
        let config = Config {
            output_dir: tmp.path().to_path_buf(),
            ..Config::default()
        };
        let report = clean_noise(&config, &mut Scripted::new(&[true])).unwrap();
        assert_eq!(
            report,
            AuditReport {
                scanned: 2,
                flagged: 1,
                deleted: 1
            }
        );
    }
}
