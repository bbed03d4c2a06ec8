//! Reading back what earlier runs wrote.

use super::article::URL_PREFIX;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// How many leading lines are searched for the `URL:` header.
pub const HEADER_SCAN_LINES: usize = 10;

/// Every `*.md` file below `root`, in walk order. A missing root yields nothing.
pub fn markdown_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "md"))
        .map(|e| e.into_path())
        .collect()
}

/// The source URL recorded in an article's header, if present in the first
/// [`HEADER_SCAN_LINES`] lines. Invalid UTF-8 is decoded lossily.
pub fn read_url_header(path: &Path) -> io::Result<Option<String>> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut buf = Vec::new();

    for _ in 0..HEADER_SCAN_LINES {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        if let Some(rest) = line.strip_prefix(URL_PREFIX) {
            return Ok(Some(rest.trim().to_string()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_markdown_files_recurse() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("A/B/2024");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("one.md"), "x").unwrap();
        fs::write(tmp.path().join("two.md"), "x").unwrap();
        fs::write(tmp.path().join("notes.txt"), "x").unwrap();

        let mut files = markdown_files(tmp.path());
        files.sort();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|p| p.extension().unwrap() == "md"));
    }

    #[test]
    fn test_markdown_files_missing_root() {
        assert!(markdown_files(Path::new("/definitely/not/here")).is_empty());
    }

    #[test]
    fn test_read_url_header() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("a.md");
        fs::write(
            &path,
            "--- SOURCE INFO ---\nURL: https://x.com/post  \nDATE: Unknown\n---\n\nbody",
        )
        .unwrap();
        assert_eq!(read_url_header(&path).unwrap(), Some("https://x.com/post".to_string()));
    }

    #[test]
    fn test_read_url_header_only_first_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("late.md");
        let mut content = "filler\n".repeat(HEADER_SCAN_LINES);
        content.push_str("URL: https://x.com/too-late\n");
        fs::write(&path, content).unwrap();
        assert_eq!(read_url_header(&path).unwrap(), None);
    }

    #[test]
    fn test_read_url_header_lossy_utf8() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bin.md");
        fs::write(&path, b"\xff\xfe junk\nURL: https://x.com/ok\n").unwrap();
        assert_eq!(read_url_header(&path).unwrap(), Some("https://x.com/ok".to_string()));
    }
}
