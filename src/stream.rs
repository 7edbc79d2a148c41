//! Streaming segmentation API: emit entries page by page.
//!
//! Unlike the eager [`crate::convert::segment`], which returns only after the
//! last page, [`segment_stream`] yields each entry as soon as the page that
//! finalised it has been consumed. Order is always document order: pages are
//! processed strictly one after another because caption merging and the
//! context window depend on everything before them.
//!
//! A caption still held when the page stream ends is dropped, exactly as in
//! the eager path.

use crate::config::SegmentConfig;
use crate::engine::Segmenter;
use crate::error::SegmentError;
use crate::output::StructuredEntry;
use crate::pipeline::input::{self, Page};
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of finalised entries.
pub type EntryStream = Pin<Box<dyn Stream<Item = StructuredEntry> + Send>>;

/// Segment a stream of pages, yielding entries as they are finalised.
///
/// The page count is not known up front, so `on_segmentation_start` is not
/// fired; every other progress event is.
///
/// # Errors
/// Configuration errors, before the first page is polled.
pub fn segment_stream<S>(pages: S, config: &SegmentConfig) -> Result<EntryStream, SegmentError>
where
    S: Stream<Item = Page> + Send + 'static,
{
    let segmenter = Segmenter::new(config)?;

    // `None` marks end of input so the segmenter can be finished in-stream.
    let pages = pages.map(Some).chain(stream::once(async { None }));

    let s = pages
        .scan(Some(segmenter), |state, page| {
            let batch = match (page, state.take()) {
                (Some(page), Some(mut seg)) => {
                    let entries = seg.push_page(&page);
                    *state = Some(seg);
                    entries
                }
                (None, Some(seg)) => {
                    seg.finish();
                    Vec::new()
                }
                (_, None) => Vec::new(),
            };
            futures::future::ready(Some(stream::iter(batch)))
        })
        .flatten();

    Ok(Box::pin(s))
}

/// Load an input and stream its entries.
///
/// The input is read and parsed in full before the stream is returned; only
/// segmentation is incremental.
pub async fn segment_input_stream(
    input_str: impl AsRef<str>,
    config: &SegmentConfig,
) -> Result<EntryStream, SegmentError> {
    let input_str = input_str.as_ref();
    info!("Starting streaming segmentation: {}", input_str);

    // Fail on configuration before touching the input.
    config.validate()?;
    let document = input::load_document(input_str, config.download_timeout_secs).await?;
    segment_stream(stream::iter(document.pages), config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::segment_pages;

    fn pages() -> Vec<Page> {
        vec![
            Page::new(1, ["第一章 概述", "头肩顶是一种常见的顶部反转形态。", "图1 头肩顶"]),
            Page::new(2, ["价格跌破颈线后形态完成，应考虑卖出。", "图2 双顶"]),
        ]
    }

    #[test]
    fn stream_matches_eager() {
        let config = SegmentConfig::builder().length_bounds(4, 200).build().unwrap();
        let eager = segment_pages(&pages(), &config).unwrap().entries;

        let streamed: Vec<StructuredEntry> = tokio_test::block_on(
            segment_stream(stream::iter(pages()), &config)
                .unwrap()
                .collect(),
        );

        assert_eq!(streamed, eager);
        assert_eq!(streamed.len(), 2);
        assert!(streamed[1].from_figure_merge);
    }

    #[test]
    fn bad_config_fails_before_polling() {
        let config = SegmentConfig {
            keywords: Vec::new(),
            ..SegmentConfig::default()
        };
        assert!(segment_stream(stream::iter(pages()), &config).is_err());
    }
}
