//! Progress-callback trait for segmentation events.
//!
//! Inject an [`Arc<dyn SegmentProgressCallback>`] via
//! [`crate::config::SegmentConfigBuilder::progress_callback`] to observe a run.
//! Events fire only at page boundaries and on line errors, never mid-line, so
//! a callback can never observe a half-formed caption merge.
//!
//! # Example
//!
//! ```rust
//! use edgequake_segment::{SegmentConfig, SegmentProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct EntryCounter {
//!     entries: AtomicUsize,
//! }
//!
//! impl SegmentProgressCallback for EntryCounter {
//!     fn on_page_complete(&self, _page_num: usize, entries_emitted: usize) {
//!         self.entries.fetch_add(entries_emitted, Ordering::SeqCst);
//!     }
//! }
//!
//! let counter = Arc::new(EntryCounter { entries: AtomicUsize::new(0) });
//!
//! let config = SegmentConfig::builder()
//!     .progress_callback(counter as Arc<dyn SegmentProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::LineError;
use crate::output::SegmentationStats;
use std::sync::Arc;

/// Called by the engine as it walks the document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync` because the
/// streaming API may move the engine across threads between pages.
pub trait SegmentProgressCallback: Send + Sync {
    /// Called once before the first page, when the page count is known.
    fn on_segmentation_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called before the first line of a page is processed.
    fn on_page_start(&self, page_num: usize) {
        let _ = page_num;
    }

    /// Called after the last line of a page.
    ///
    /// `entries_emitted` counts entries finalised while processing this page.
    fn on_page_complete(&self, page_num: usize, entries_emitted: usize) {
        let _ = (page_num, entries_emitted);
    }

    /// Called when a line is dropped because of a [`LineError`].
    fn on_line_error(&self, error: &LineError) {
        let _ = error;
    }

    /// Called once after the final flush.
    fn on_segmentation_complete(&self, stats: &SegmentationStats) {
        let _ = stats;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SegmentProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::SegmentConfig`].
pub type ProgressCallback = Arc<dyn SegmentProgressCallback>;
