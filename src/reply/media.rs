//! Media references embedded in reply text.
//!
//! Commands attach media by writing `MEDIA:<source>` tokens into their
//! output. Sources are `http(s)://` URLs or local paths. Local files can be
//! capped by size; remote URLs are never fetched and always kept.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

static MEDIA_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bMEDIA:\s*(\S+)").expect("Invalid media token regex")
});

static REMOTE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://").expect("Invalid remote URL regex"));

static TRAILING_BLANKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+\n").expect("Invalid trailing blank regex"));

static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("Invalid blank run regex"));

/// Longest accepted media source.
const MAX_SOURCE_LEN: usize = 1024;

/// Reply text with media tokens split out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaSplit {
    pub text: String,
    pub media_urls: Vec<String>,
}

/// Remove accepted `MEDIA:` tokens from `text` and collect their sources.
///
/// Tokens whose source is not a URL or an explicit path are left in place.
pub fn split_media_from_output(text: &str) -> MediaSplit {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return MediaSplit::default();
    }

    let mut media_urls = Vec::new();
    let cleaned = MEDIA_TOKEN.replace_all(trimmed, |caps: &regex::Captures<'_>| {
        let source = normalize_source(clean_candidate(&caps[1]));
        if is_valid_source(source) {
            media_urls.push(source.to_string());
            String::new()
        } else {
            caps[0].to_string()
        }
    });

    let text = if media_urls.is_empty() {
        trimmed.to_string()
    } else {
        let tidy = TRAILING_BLANKS.replace_all(&cleaned, "\n");
        BLANK_RUNS.replace_all(&tidy, "\n\n").trim().to_string()
    };

    MediaSplit { text, media_urls }
}

/// Whether a media source is a remote `http(s)` URL.
pub fn is_remote_url(source: &str) -> bool {
    REMOTE_URL.is_match(source)
}

/// Drop local media files larger than `max_bytes`.
///
/// Remote URLs are kept without being fetched. Relative paths resolve against
/// the current directory. A local file that cannot be stat'd is kept.
pub fn filter_media_by_size(media_urls: &[String], max_bytes: u64) -> Vec<String> {
    media_urls
        .iter()
        .filter(|source| keep_media(source, max_bytes))
        .cloned()
        .collect()
}

fn keep_media(source: &str, max_bytes: u64) -> bool {
    if is_remote_url(source) {
        return true;
    }

    let path = absolute_path(Path::new(source));
    match std::fs::metadata(&path) {
        Ok(meta) if meta.len() <= max_bytes => true,
        Ok(meta) => {
            debug!(
                "Skipping media {} ({:.2}MB) over cap {:.2}MB",
                source,
                meta.len() as f64 / (1024.0 * 1024.0),
                max_bytes as f64 / (1024.0 * 1024.0)
            );
            false
        }
        Err(e) => {
            debug!("Keeping media {} despite stat failure: {}", source, e);
            true
        }
    }
}

fn absolute_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Strip wrapping quotes/brackets and trailing punctuation.
fn clean_candidate(raw: &str) -> &str {
    raw.trim_start_matches(['`', '"', '\'', '[', '{', '('])
        .trim_end_matches(['`', '"', '\'', '\\', '}', ')', ']', ',', '.', ';'])
}

fn normalize_source(source: &str) -> &str {
    source.strip_prefix("file://").unwrap_or(source)
}

fn is_valid_source(source: &str) -> bool {
    if source.is_empty() || source.len() > MAX_SOURCE_LEN {
        return false;
    }
    is_remote_url(source)
        || source.starts_with('/')
        || source.starts_with("./")
        || source.starts_with("~/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::DirGuard;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_no_token_keeps_text() {
        let split = split_media_from_output("  just words  ");
        assert_eq!(split.text, "just words");
        assert!(split.media_urls.is_empty());
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(split_media_from_output(" \n "), MediaSplit::default());
    }

    #[test]
    fn test_extracts_url_and_path() {
        let split = split_media_from_output(
            "Here you go\nMEDIA:https://example.com/cat.png\nand MEDIA: /tmp/report.pdf",
        );
        assert_eq!(
            split.media_urls,
            vec!["https://example.com/cat.png", "/tmp/report.pdf"]
        );
        assert_eq!(split.text, "Here you go\n\nand");
    }

    #[test]
    fn test_token_is_case_insensitive_and_cleaned() {
        let split = split_media_from_output("see media:\"./out/chart.png\".");
        assert_eq!(split.media_urls, vec!["./out/chart.png"]);
        assert_eq!(split.text, "see");
    }

    #[test]
    fn test_file_scheme_stripped() {
        let split = split_media_from_output("MEDIA:file:///var/tmp/a.jpg");
        assert_eq!(split.media_urls, vec!["/var/tmp/a.jpg"]);
        assert_eq!(split.text, "");
    }

    #[test]
    fn test_invalid_source_left_in_text() {
        let split = split_media_from_output("MEDIA:relative.png stays");
        assert!(split.media_urls.is_empty());
        assert_eq!(split.text, "MEDIA:relative.png stays");
    }

    #[test]
    fn test_overlong_source_rejected() {
        let long = format!("MEDIA:/{}", "a".repeat(MAX_SOURCE_LEN + 1));
        assert!(split_media_from_output(&long).media_urls.is_empty());
    }

    #[test]
    fn test_remote_urls_always_kept() {
        let urls = vec![
            "https://example.com/huge.mp4".to_string(),
            "HTTP://EXAMPLE.COM/X.PNG".to_string(),
        ];
        assert_eq!(filter_media_by_size(&urls, 0), urls);
    }

    #[test]
    fn test_local_files_filtered_by_size() {
        let temp_dir = TempDir::new().unwrap();
        let small = temp_dir.path().join("small.bin");
        let big = temp_dir.path().join("big.bin");
        std::fs::write(&small, vec![0u8; 10]).unwrap();
        std::fs::write(&big, vec![0u8; 2048]).unwrap();

        let urls = vec![
            small.to_string_lossy().to_string(),
            big.to_string_lossy().to_string(),
        ];
        assert_eq!(filter_media_by_size(&urls, 1024), vec![urls[0].clone()]);
    }

    #[test]
    fn test_size_equal_to_cap_is_kept() {
        let temp_dir = TempDir::new().unwrap();
        let exact = temp_dir.path().join("exact.bin");
        std::fs::write(&exact, vec![0u8; 1024]).unwrap();

        let urls = vec![exact.to_string_lossy().to_string()];
        assert_eq!(filter_media_by_size(&urls, 1024), urls);
    }

    #[test]
    fn test_missing_file_is_kept() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("gone.png").to_string_lossy().to_string();
        assert_eq!(filter_media_by_size(&[missing.clone()], 1), vec![missing]);
    }

    #[test]
    #[serial]
    fn test_relative_paths_resolved_against_cwd() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("big.bin"), vec![0u8; 4096]).unwrap();
        let _guard = DirGuard::new(temp_dir.path());

        let urls = vec!["./big.bin".to_string()];
        assert!(filter_media_by_size(&urls, 1024).is_empty());
        assert_eq!(filter_media_by_size(&urls, 8192), urls);
    }
}
