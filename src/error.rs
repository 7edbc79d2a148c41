//! Error types for the edgequake-segment library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SegmentError`]: **Fatal**: segmentation cannot start or its result
//!   cannot be delivered (bad configuration, unreadable input, output write
//!   failure). Returned as `Err(SegmentError)` from the top-level entry points.
//!
//! * [`LineError`]: **Non-fatal**: a single line could not be processed
//!   (malformed value, decoding slip). The line is dropped, counted in
//!   [`crate::output::SegmentationStats`], and the rest of the document
//!   continues.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-segment library.
#[derive(Debug, Error)]
pub enum SegmentError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The input was read but its page structure could not be parsed.
    #[error("Could not parse pages from '{input}': {detail}")]
    MalformedInput { input: String, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not serialise the output records.
    #[error("Failed to serialise output: {0}")]
    Serialisation(#[from] serde_json::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder or profile validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A profile file could not be read or parsed.
    #[error("Failed to load profile '{path}': {detail}")]
    ProfileLoadFailed { path: PathBuf, detail: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single line.
///
/// Reported to [`crate::progress::SegmentProgressCallback::on_line_error`]
/// and counted in the run statistics. The line never becomes an entry.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum LineError {
    /// The line supplier produced a value that is not text.
    #[error("Page {page}, line {line}: expected text, found {found}")]
    Malformed {
        page: usize,
        line: usize,
        found: String,
    },

    /// The line contains a Unicode replacement character left by lossy decoding.
    #[error("Page {page}, line {line}: undecodable bytes in line")]
    Decoding { page: usize, line: usize },
}

impl LineError {
    /// Page number the failing line belongs to.
    pub fn page(&self) -> usize {
        match self {
            LineError::Malformed { page, .. } | LineError::Decoding { page, .. } => *page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_display() {
        let e = SegmentError::InvalidConfig("keyword set is empty".into());
        assert!(e.to_string().contains("keyword set is empty"));
    }

    #[test]
    fn malformed_line_display() {
        let e = LineError::Malformed {
            page: 4,
            line: 2,
            found: "number".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Page 4"), "got: {msg}");
        assert!(msg.contains("number"), "got: {msg}");
        assert_eq!(e.page(), 4);
    }

    #[test]
    fn download_timeout_display() {
        let e = SegmentError::DownloadTimeout {
            url: "https://example.org/book.txt".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
    }

    #[test]
    fn line_error_serialises() {
        let e = LineError::Decoding { page: 1, line: 7 };
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("Decoding"));
    }
}
