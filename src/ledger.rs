//! Processed-URL ledger: the single authority on "already done".
//!
//! Two physical stores back one logical set:
//!
//! - the append-only ledger file (one URL per line)
//! - the `URL:` header of every article already in the output tree
//!
//! [`Ledger::open`] unions both; afterwards the pipeline only calls
//! [`Ledger::contains`] and [`Ledger::record`].

use crate::outputs::scan::{markdown_files, read_url_header};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    processed: HashSet<String>,
}

impl Ledger {
    /// Load the ledger file and reconcile it with the output tree.
    #[instrument(level = "info", skip_all, fields(ledger = %path.display(), output = %output_dir.display()))]
    pub fn open(path: &Path, output_dir: &Path) -> io::Result<Self> {
        let mut processed = Self::load(path)?;
        let logged = processed.len();
        let recovered = Self::recover_from_output(output_dir);
        let recovered_count = recovered.len();
        processed.extend(recovered);

        info!(
            logged,
            recovered = recovered_count,
            total = processed.len(),
            "Loaded processed URLs"
        );
        Ok(Self {
            path: path.to_path_buf(),
            processed,
        })
    }

    /// Every URL in the ledger file.
    ///
    /// # Arguments
    ///
    /// * `path` - The append-only ledger, one URL per line.
    ///
    /// # Returns
    ///
    /// The set of non-blank, trimmed lines. A missing file is an empty ledger,
    /// and bytes that are not UTF-8 are decoded lossily so one bad line never
    /// hides the rest.
    pub fn load(path: &Path) -> io::Result<HashSet<String>> {
        match fs::read(path) {
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes)
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(HashSet::new()),
            Err(e) => Err(e),
        }
    }

    /// URLs named in the headers of articles already on disk.
    pub fn recover_from_output(output_dir: &Path) -> HashSet<String> {
        let mut found = HashSet::new();
        if !output_dir.exists() {
            return found;
        }
        info!(dir = %output_dir.display(), "Scanning existing files");
        for file in markdown_files(output_dir) {
            match read_url_header(&file) {
                Ok(Some(url)) => {
                    found.insert(url);
                }
                Ok(None) => debug!(file = %file.display(), "No URL header"),
                Err(e) => warn!(file = %file.display(), error = %e, "Unreadable article file"),
            }
        }
        info!(count = found.len(), "URLs recovered from output");
        found
    }

    pub fn contains(&self, url: &str) -> bool {
        self.processed.contains(url)
    }

    pub fn processed(&self) -> &HashSet<String> {
        &self.processed
    }

    pub fn len(&self) -> usize {
        self.processed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }

    /// Mark `url` as done, in memory and in the ledger file.
    ///
    /// A failed append is logged and swallowed; the URL stays marked for the
    /// rest of this run either way.
    pub fn record(&mut self, url: &str) {
        self.processed.insert(url.to_string());
        if let Err(e) = self.append(url) {
            error!(url, ledger = %self.path.display(), error = %e, "Error saving URL to ledger");
        }
    }

    fn append(&self, url: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{url}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_ledger_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let ledger = Ledger::open(&tmp.path().join("none.log"), &tmp.path().join("out")).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_record_persists_across_opens() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("processed_urls.log");
        let out = tmp.path().join("out");

        let mut ledger = Ledger::open(&path, &out).unwrap();
        ledger.record("https://a.com/blog/1");
        ledger.record("https://a.com/blog/2");
        assert!(ledger.contains("https://a.com/blog/1"));

        let reopened = Ledger::open(&path, &out).unwrap();
        assert!(reopened.contains("https://a.com/blog/1"));
        assert!(reopened.contains("https://a.com/blog/2"));
        assert_eq!(reopened.len(), 2);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "https://a.com/blog/1\nhttps://a.com/blog/2\n"
        );
    }

    #[test]
    fn test_open_unions_output_headers() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("processed_urls.log");
        let out = tmp.path().join("out");
        let dir = out.join("Robotics/Physical AI/2024");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("2024-02-02_x_robots.md"),
            "--- SOURCE INFO ---\nURL: https://x.com/robots\nDATE: 2024-02-02\n---\n\nbody",
        )
        .unwrap();
        fs::write(&path, "https://a.com/blog/1\n\n").unwrap();

        let ledger = Ledger::open(&path, &out).unwrap();
        assert!(ledger.contains("https://a.com/blog/1"));
        assert!(ledger.contains("https://x.com/robots"));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_non_utf8_ledger_still_loads() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("processed_urls.log");
        fs::write(&path, b"https://a.com/caf\xe9\nhttps://a.com/blog/1\n").unwrap();

        let ledger = Ledger::open(&path, &tmp.path().join("out")).unwrap();
        assert_eq!(ledger.len(), 2);
        assert!(!ledger.is_empty());
        assert!(ledger.contains("https://a.com/blog/1"));
        assert!(ledger.contains("https://a.com/caf\u{FFFD}"));
    }

    #[test]
    fn test_record_failure_is_swallowed() {
        let tmp = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending.
        let mut ledger = Ledger {
            path: tmp.path().to_path_buf(),
            processed: HashSet::new(),
        };
        ledger.record("https://a.com/blog/1");
        assert!(ledger.contains("https://a.com/blog/1"));
    }
}
