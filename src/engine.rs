//! The segmentation engine: one sequential pass over the document.
//!
//! ## Per-line flow
//!
//! ```text
//! line ─▶ normalize ─▶ blank? ─▶ chapter? ─▶ section? ─▶ valid? ─▶ classify
//!            │           skip     consume     consume     drop        │
//!            └─ LineError: warn, count, continue                      │
//!                                              ┌──────────────────────┘
//!                    figure caption ◀──────────┤
//!                    hold (replace)            └──▶ caption held? merge : standalone
//! ```
//!
//! State (current chapter, current section, held caption, trailing window)
//! lives in one [`Segmenter`] value owned by the caller. Nothing is global,
//! so two documents can be segmented concurrently with two segmenters.

use crate::config::{PageSelection, SegmentConfig};
use crate::error::SegmentError;
use crate::output::{EntryType, SegmentationOutput, SegmentationStats, StructuredEntry};
use crate::pipeline::classify::Classifier;
use crate::pipeline::context::ContextTracker;
use crate::pipeline::input::Page;
use crate::pipeline::merge::{MergeBuffer, PendingCaption};
use crate::pipeline::normalize::{join_lines, normalize_line};
use crate::pipeline::validity::ValidityFilter;
use crate::pipeline::window::ContextWindow;
use crate::progress::ProgressCallback;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Stateful, single-document segmenter.
///
/// Feed pages in order with [`Segmenter::push_page`], then call
/// [`Segmenter::finish`]. Entries come back in exactly the order their
/// source lines were consumed.
pub struct Segmenter {
    filter: ValidityFilter,
    context: ContextTracker,
    classifier: Classifier,
    buffer: MergeBuffer,
    window: ContextWindow,
    source: String,
    join_lines: Option<usize>,
    pages: PageSelection,
    progress: Option<ProgressCallback>,
    stats: SegmentationStats,
    started: Instant,
}

impl Segmenter {
    /// Validate `config` and build a fresh segmenter.
    ///
    /// Every configuration error surfaces here, before any line is read.
    pub fn new(config: &SegmentConfig) -> Result<Self, SegmentError> {
        config.validate()?;
        Ok(Self {
            filter: ValidityFilter::from_config(config)?,
            context: ContextTracker::from_config(config)?,
            classifier: Classifier::from_config(config)?,
            buffer: MergeBuffer::default(),
            window: ContextWindow::default(),
            source: config.source.clone(),
            join_lines: config.join_lines,
            pages: config.pages.clone(),
            progress: config.progress_callback.clone(),
            stats: SegmentationStats::default(),
            started: Instant::now(),
        })
    }

    /// Announce the number of pages about to be pushed.
    pub fn begin(&self, total_pages: usize) {
        if let Some(ref cb) = self.progress {
            cb.on_segmentation_start(total_pages);
        }
    }

    /// Whether `page` falls inside the configured page selection.
    pub fn selects(&self, page: &Page) -> bool {
        self.pages.contains(page.page)
    }

    /// Process one page, returning the entries finalised while doing so.
    ///
    /// A caption at the end of the page stays held and may merge with the
    /// first paragraph of the next page. Unselected pages are skipped whole.
    pub fn push_page(&mut self, page: &Page) -> Vec<StructuredEntry> {
        if !self.selects(page) {
            debug!("Skipping unselected page {}", page.page);
            return Vec::new();
        }

        if let Some(ref cb) = self.progress {
            cb.on_page_start(page.page);
        }
        self.stats.pages += 1;

        let mut lines = Vec::with_capacity(page.lines.len());
        for (idx, raw) in page.lines.iter().enumerate() {
            self.stats.lines_seen += 1;
            match normalize_line(raw, page.page, idx + 1) {
                Ok(line) => lines.push(line),
                Err(e) => {
                    warn!("Dropping line: {}", e);
                    self.stats.line_errors += 1;
                    if let Some(ref cb) = self.progress {
                        cb.on_line_error(&e);
                    }
                }
            }
        }

        let paragraphs = match self.join_lines {
            Some(min_chars) => join_lines(&lines, min_chars),
            None => lines,
        };

        let mut emitted = Vec::new();
        for paragraph in &paragraphs {
            if let Some(entry) = self.process_line(paragraph, page.page) {
                emitted.push(entry);
            }
        }

        if let Some(ref cb) = self.progress {
            cb.on_page_complete(page.page, emitted.len());
        }
        emitted
    }

    /// Run one normalised line through the rule chain.
    fn process_line(&mut self, line: &str, page: usize) -> Option<StructuredEntry> {
        if line.is_empty() {
            self.stats.blank_lines += 1;
            return None;
        }

        if self.context.try_match_chapter(line).is_some() {
            self.stats.chapter_headings += 1;
            return None;
        }
        if self.context.try_match_section(line).is_some() {
            self.stats.section_headings += 1;
            return None;
        }

        if let Err(reason) = self.filter.check(line) {
            debug!("Rejected ({}) p{}: {}", reason, page, line);
            self.stats.invalid_lines += 1;
            return None;
        }

        let figure_ref = self.classifier.extract_figure(line);
        let entry_type = self.classifier.classify(line);

        if entry_type == EntryType::FigureCaption {
            let caption = PendingCaption {
                text: line.to_string(),
                figure_ref,
                page,
            };
            self.stats.captions_buffered += 1;
            if let Some(replaced) = self.buffer.hold(caption) {
                debug!("Caption replaced before continuation: {}", replaced.text);
                self.stats.captions_replaced += 1;
            }
            return None;
        }

        let entry = match self.buffer.take() {
            Some(caption) => {
                self.stats.merged_entries += 1;
                caption.merge(line, page, self.context.snapshot(), &self.source)
            }
            None => {
                self.stats.standalone_entries += 1;
                let snapshot = self.context.snapshot();
                StructuredEntry {
                    text: line.to_string(),
                    text_full: None,
                    page,
                    chapter: snapshot.chapter,
                    section_title: snapshot.section,
                    figure_ref,
                    entry_type: Some(entry_type),
                    context_window: self.window.current(),
                    from_figure_merge: false,
                    source: self.source.clone(),
                }
            }
        };

        self.window.record(&entry.text);
        Some(entry)
    }

    /// Counters so far.
    pub fn stats(&self) -> &SegmentationStats {
        &self.stats
    }

    /// Whether a caption is waiting for its continuation.
    pub fn has_pending_caption(&self) -> bool {
        self.buffer.is_holding()
    }

    /// End the document: discard any held caption and report.
    pub fn finish(mut self) -> SegmentationStats {
        if let Some(dangling) = self.buffer.take() {
            debug!("Dropping dangling caption: {}", dangling.text);
            self.stats.captions_dangling += 1;
        }
        self.stats.duration_ms = self.started.elapsed().as_millis() as u64;

        info!(
            "Segmentation complete: {} entries ({} merged) from {} pages",
            self.stats.entries(),
            self.stats.merged_entries,
            self.stats.pages
        );

        if let Some(ref cb) = self.progress {
            cb.on_segmentation_complete(&self.stats);
        }
        self.stats
    }

    /// Segment a whole page slice in one call.
    pub fn run(mut self, pages: &[Page]) -> SegmentationOutput {
        let selected = pages.iter().filter(|p| self.selects(p)).count();
        self.begin(selected);

        let mut entries = Vec::new();
        for page in pages {
            entries.extend(self.push_page(page));
        }

        let source = self.source.clone();
        let stats = self.finish();
        SegmentationOutput {
            source,
            entries,
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::input::RawLine;

    fn config() -> SegmentConfig {
        SegmentConfig::builder()
            .keywords(["形态", "突破", "头肩顶", "信号"])
            .length_bounds(5, 200)
            .source("test")
            .build()
            .unwrap()
    }

    fn page(n: usize, lines: &[&str]) -> Page {
        Page::new(n, lines.iter().copied())
    }

    #[test]
    fn headings_are_consumed_not_emitted() {
        let seg = Segmenter::new(&config()).unwrap();
        let out = seg.run(&[page(
            1,
            &["第一章 概述", "头肩顶形态", "价格向下突破颈线，头肩顶完成。"],
        )]);
        assert_eq!(out.entries.len(), 1);
        let e = &out.entries[0];
        assert_eq!(e.chapter.as_deref(), Some("第一章 概述"));
        assert_eq!(e.section_title.as_deref(), Some("头肩顶形态"));
        assert_eq!(out.stats.chapter_headings, 1);
        assert_eq!(out.stats.section_headings, 1);
    }

    #[test]
    fn caption_merges_across_page_boundary() {
        let mut seg = Segmenter::new(&config()).unwrap();
        let first = seg.push_page(&page(1, &["图2.1 头肩顶"]));
        assert!(first.is_empty());
        assert!(seg.has_pending_caption());

        let second = seg.push_page(&page(2, &["价格向下突破颈线，头肩顶完成。"]));
        assert_eq!(second.len(), 1);
        assert!(second[0].from_figure_merge);
        assert_eq!(second[0].page, 2);
        assert_eq!(second[0].figure_ref.as_deref(), Some("图2.1"));
        assert!(!seg.has_pending_caption());
    }

    #[test]
    fn bad_line_is_counted_and_skipped() {
        let mut seg = Segmenter::new(&config()).unwrap();
        let p = Page {
            page: 1,
            lines: vec![
                RawLine::Other(serde_json::json!(42)),
                RawLine::from("价格向下突破颈线，头肩顶完成。"),
            ],
        };
        let out = seg.push_page(&p);
        assert_eq!(out.len(), 1);
        assert_eq!(seg.stats().line_errors, 1);
        assert_eq!(seg.stats().lines_seen, 2);
    }

    #[test]
    fn unselected_page_is_skipped_whole() {
        let cfg = SegmentConfig::builder()
            .keywords(["形态"])
            .length_bounds(2, 100)
            .pages(PageSelection::Single(2))
            .build()
            .unwrap();
        let out = Segmenter::new(&cfg).unwrap().run(&[
            page(1, &["第一章 概述", "这是一个形态说明句子。"]),
            page(2, &["那是另一个形态说明句子。"]),
        ]);
        assert_eq!(out.entries.len(), 1);
        assert_eq!(out.entries[0].page, 2);
        assert_eq!(out.entries[0].chapter, None);
        assert_eq!(out.stats.pages, 1);
    }

    #[test]
    fn finish_counts_dangling_caption() {
        let mut seg = Segmenter::new(&config()).unwrap();
        seg.push_page(&page(1, &["图1 头肩顶"]));
        let stats = seg.finish();
        assert_eq!(stats.captions_dangling, 1);
        assert_eq!(stats.entries(), 0);
    }
}
