//! Input resolution: turn a user-supplied path or URL into page-structured lines.
//!
//! Text extraction from the PDF itself happens upstream (pdftotext, PyMuPDF,
//! pdfium …). This module only reads what those tools emit:
//!
//! | Extension | Layout |
//! |-----------|--------|
//! | `.json`   | `{"source": "...", "pages": [{"page": 1, "lines": ["…"]}]}` or a bare array of pages |
//! | `.jsonl`  | one page object per line |
//! | anything else | plain text, pages separated by form feed (`\f`) |
//!
//! Lines inside a JSON page that are not strings survive parsing as
//! [`RawLine::Other`] so the engine can drop them one by one instead of
//! rejecting the whole document.

use crate::error::SegmentError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// One raw line as produced by the line supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawLine {
    Text(String),
    /// Any non-string JSON value found where a line was expected.
    Other(serde_json::Value),
}

impl From<&str> for RawLine {
    fn from(s: &str) -> Self {
        RawLine::Text(s.to_string())
    }
}

impl From<String> for RawLine {
    fn from(s: String) -> Self {
        RawLine::Text(s)
    }
}

/// An ordered sequence of lines belonging to one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// 1-indexed page number.
    pub page: usize,
    #[serde(default)]
    pub lines: Vec<RawLine>,
}

impl Page {
    pub fn new<I, L>(page: usize, lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<RawLine>,
    {
        Self {
            page,
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

/// A parsed document, pages in reading order.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Source label embedded in a JSON document, if any.
    pub source: Option<String>,
    pub pages: Vec<Page>,
    /// Page records that could not be parsed as a page.
    pub skipped_pages: usize,
}

impl Document {
    pub fn line_count(&self) -> usize {
        self.pages.iter().map(|p| p.lines.len()).sum()
    }
}

/// How the input bytes are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Jsonl,
    Text,
}

impl InputFormat {
    /// Pick a format from the file name or URL path.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        let path = lower.split(['?', '#']).next().unwrap_or("");
        if path.ends_with(".jsonl") || path.ends_with(".ndjson") {
            InputFormat::Jsonl
        } else if path.ends_with(".json") {
            InputFormat::Json
        } else {
            InputFormat::Text
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Read and parse the input, downloading it first when it is a URL.
pub async fn load_document(input: &str, timeout_secs: u64) -> Result<Document, SegmentError> {
    if input.trim().is_empty() {
        return Err(SegmentError::InvalidInput {
            input: input.to_string(),
        });
    }

    let bytes = if is_url(input) {
        download_url(input, timeout_secs).await?
    } else {
        read_local(input).await?
    };

    parse_document(&bytes, InputFormat::from_name(input), input)
}

async fn read_local(path_str: &str) -> Result<Vec<u8>, SegmentError> {
    let path = PathBuf::from(path_str);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            debug!("Read {} bytes from {}", bytes.len(), path.display());
            Ok(bytes)
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(SegmentError::PermissionDenied { path })
        }
        Err(_) => Err(SegmentError::FileNotFound { path }),
    }
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<Vec<u8>, SegmentError> {
    info!("Downloading pages from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| SegmentError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            SegmentError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            SegmentError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(SegmentError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| SegmentError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes", bytes.len());
    Ok(bytes.to_vec())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonDocument {
    Wrapped {
        #[serde(default)]
        source: Option<String>,
        pages: Vec<serde_json::Value>,
    },
    Bare(Vec<serde_json::Value>),
}

/// Parse raw bytes into a [`Document`].
///
/// Bytes that are not valid UTF-8 are replaced with U+FFFD, so a damaged line
/// fails on its own during normalisation. A page record that does not match
/// the page layout is skipped and counted in `skipped_pages`.
///
/// `input` is only used in error messages.
pub fn parse_document(
    bytes: &[u8],
    format: InputFormat,
    input: &str,
) -> Result<Document, SegmentError> {
    match format {
        InputFormat::Json => {
            let text = String::from_utf8_lossy(bytes);
            let doc: JsonDocument =
                serde_json::from_str(&text).map_err(|e| SegmentError::MalformedInput {
                    input: input.to_string(),
                    detail: e.to_string(),
                })?;
            let (source, records) = match doc {
                JsonDocument::Wrapped { source, pages } => (source, pages),
                JsonDocument::Bare(pages) => (None, pages),
            };

            let mut doc = Document {
                source,
                ..Document::default()
            };
            for (n, record) in records.into_iter().enumerate() {
                match serde_json::from_value::<Page>(record) {
                    Ok(page) => doc.pages.push(page),
                    Err(e) => {
                        warn!("Skipping page record {} of '{}': {}", n + 1, input, e);
                        doc.skipped_pages += 1;
                    }
                }
            }
            Ok(doc)
        }
        InputFormat::Jsonl => {
            let text = String::from_utf8_lossy(bytes);
            let mut doc = Document::default();
            for (n, record) in text.lines().enumerate() {
                if record.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Page>(record) {
                    Ok(page) => doc.pages.push(page),
                    Err(e) => {
                        warn!("Skipping record {} of '{}': {}", n + 1, input, e);
                        doc.skipped_pages += 1;
                    }
                }
            }
            Ok(doc)
        }
        InputFormat::Text => Ok(Document {
            source: None,
            pages: split_text_pages(&String::from_utf8_lossy(bytes)),
            skipped_pages: 0,
        }),
    }
}

/// Split form-feed separated text into pages numbered from 1.
///
/// A trailing page that holds only whitespace (pdftotext ends every document
/// with `\f`) is not kept.
pub fn split_text_pages(text: &str) -> Vec<Page> {
    let mut pages: Vec<Page> = text
        .split('\x0c')
        .enumerate()
        .map(|(i, body)| Page::new(i + 1, body.split('\n')))
        .collect();

    if let Some(last) = pages.last() {
        let blank = last
            .lines
            .iter()
            .all(|l| matches!(l, RawLine::Text(s) if s.trim().is_empty()));
        if blank && pages.len() > 1 {
            pages.pop();
        }
    }
    pages
}
