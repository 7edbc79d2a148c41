//! Eager (whole-document) segmentation entry points.
//!
//! These wait for the whole document, then return every entry at once. Use
//! [`crate::stream::segment_stream`] instead to receive entries page by page.

use crate::config::SegmentConfig;
use crate::engine::Segmenter;
use crate::error::SegmentError;
use crate::output::{InputSummary, OutputFormat, SegmentationOutput, SegmentationStats};
use crate::pipeline::input::{self, Page};
use std::path::Path;
use tracing::{debug, info};

/// Default download timeout for URL inputs, in seconds.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 120;

/// Segment pages that are already in memory.
///
/// # Errors
/// Only configuration errors. Bad lines are counted in
/// `stats.line_errors` and skipped.
pub fn segment_pages(
    pages: &[Page],
    config: &SegmentConfig,
) -> Result<SegmentationOutput, SegmentError> {
    Ok(Segmenter::new(config)?.run(pages))
}

/// Load a page document from a file path or URL and segment it.
///
/// Entries are labelled with `config.source`; a label embedded in the input
/// document is reported by [`inspect`] but never overrides the configuration.
///
/// # Errors
/// Returns `Err(SegmentError)` only for fatal errors:
/// - invalid configuration (checked before the input is read)
/// - file not found, permission denied or download failure
/// - a JSON document that does not parse at all
pub async fn segment(
    input_str: impl AsRef<str>,
    config: &SegmentConfig,
) -> Result<SegmentationOutput, SegmentError> {
    let input_str = input_str.as_ref();
    info!("Starting segmentation: {}", input_str);

    let segmenter = Segmenter::new(config)?;
    let document = input::load_document(input_str, config.download_timeout_secs).await?;
    debug!(
        "Loaded {} pages ({} lines, {} skipped)",
        document.pages.len(),
        document.line_count(),
        document.skipped_pages
    );

    Ok(segmenter.run(&document.pages))
}

/// Segment an input and write the result directly to a file.
///
/// Uses atomic write (temp file + rename) so a failed run never leaves a
/// partial file behind.
pub async fn segment_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &SegmentConfig,
    format: OutputFormat,
) -> Result<SegmentationStats, SegmentError> {
    let output = segment(input_str, config).await?;
    let bytes = format.render(&output)?;
    write_atomic(output_path.as_ref(), &bytes).await?;
    Ok(output.stats)
}

/// Write `bytes` to `path` through a sibling `.tmp` file and a rename,
/// creating parent directories as needed.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SegmentError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| SegmentError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);

    tokio::fs::write(&tmp_path, bytes)
        .await
        .map_err(|e| SegmentError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| SegmentError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Synchronous wrapper around [`segment`].
///
/// Creates a temporary tokio runtime internally.
pub fn segment_sync(
    input_str: impl AsRef<str>,
    config: &SegmentConfig,
) -> Result<SegmentationOutput, SegmentError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SegmentError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(segment(input_str, config))
}

/// Count pages and lines without segmenting.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<InputSummary, SegmentError> {
    let document = input::load_document(input_str.as_ref(), DEFAULT_DOWNLOAD_TIMEOUT_SECS).await?;
    Ok(InputSummary {
        pages: document.pages.len(),
        lines: document.line_count(),
        source: document.source,
        skipped_pages: document.skipped_pages,
    })
}
